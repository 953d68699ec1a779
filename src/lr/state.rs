use std::collections::BTreeMap;

use crate::{Associativity, NonTerminal, Symbol, SymbolTable, Terminal};

use super::{Action, ActionRecord, ItemSet, LrError, LrResult, StateId};

/// A state of the LR(1) automaton.
///
/// The item set is the identity of the state. Candidate actions are kept
/// raw, per terminal, until they are resolved.
pub struct State<'g, V> {
    pub id: StateId,
    pub items: ItemSet<'g, V>,
    pub transitions: BTreeMap<Symbol, StateId>,
    records: BTreeMap<Terminal, Vec<ActionRecord<'g, V>>>,
}

impl<V> std::fmt::Debug for State<'_, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("State")
            .field("id", &self.id)
            .field("items", &self.items)
            .field("transitions", &self.transitions)
            .field("records", &self.records)
            .finish()
    }
}

impl<'g, V> State<'g, V> {
    pub(crate) fn new(id: StateId, items: ItemSet<'g, V>) -> Self {
        Self {
            id,
            items,
            transitions: BTreeMap::default(),
            records: BTreeMap::default(),
        }
    }

    pub(crate) fn push_record(&mut self, terminal: Terminal, record: ActionRecord<'g, V>) {
        self.records.entry(terminal).or_default().push(record);
    }

    /// Derive the candidate actions from the items, once transitions are known.
    pub(crate) fn derive_actions(&mut self, start: NonTerminal, eos: Terminal) {
        let mut derived = vec![];

        for &item in self.items.iter() {
            match item.symbol() {
                None if item.rule.lhs == start && item.lookahead == eos => {
                    derived.push((eos, ActionRecord::new(item, Action::Accept)));
                }
                None => {
                    derived.push((
                        item.lookahead,
                        ActionRecord::new(item, Action::Reduce(item.rule.id)),
                    ));
                }
                Some(Symbol::Terminal(terminal)) => {
                    if let Some(&to) = self.transitions.get(&Symbol::Terminal(terminal)) {
                        derived.push((terminal, ActionRecord::new(item, Action::Shift(to))));
                    }
                }
                Some(Symbol::NonTerminal(_)) => {}
            }
        }

        for (terminal, record) in derived {
            self.push_record(terminal, record);
        }
    }

    /// Terminals with at least one candidate action.
    pub fn iter_terminals(&self) -> impl Iterator<Item = Terminal> + '_ {
        self.records.keys().copied()
    }

    /// Iterate over the non-terminal transitions.
    pub fn iter_gotos(&self) -> impl Iterator<Item = (NonTerminal, StateId)> + '_ {
        self.transitions
            .iter()
            .filter_map(|(sym, &to)| sym.as_non_terminal().map(|nt| (nt, to)))
    }

    /// Returns true if a terminal has more than one distinct candidate action.
    pub fn has_conflicts(&self) -> bool {
        self.records
            .values()
            .any(|records| Self::merge(records).len() > 1)
    }

    /// Resolve the action for the terminal.
    ///
    /// Identical actions are merged, then only the highest priority survives
    /// if every candidate has one, then ties are broken by associativity:
    /// left picks the item with the greatest dot, right the least.
    ///
    /// Returns [Action::Error] if nothing was derived for the terminal.
    pub fn disambiguate(&self, terminal: Terminal, symbols: &SymbolTable) -> LrResult<Action> {
        let Some(records) = self.records.get(&terminal) else {
            return Ok(Action::Error);
        };

        let mut candidates = Self::merge(records);

        if let [record] = candidates.as_slice() {
            return Ok(record.action);
        }

        if candidates.iter().all(|record| record.priority().is_some()) {
            let max = candidates.iter().filter_map(ActionRecord::priority).max();
            candidates.retain(|record| record.priority() == max);

            if let [record] = candidates.as_slice() {
                log::trace!(
                    "state #{}, {}: {} wins by priority",
                    self.id,
                    symbols.name(terminal),
                    record.to_string_with(symbols)
                );
                return Ok(record.action);
            }
        }

        match Self::break_tie(&candidates) {
            Some(record) => {
                log::trace!(
                    "state #{}, {}: {} wins by associativity",
                    self.id,
                    symbols.name(terminal),
                    record.to_string_with(symbols)
                );
                Ok(record.action)
            }
            None => Err(LrError::UnresolvableAmbiguity {
                state: self.id,
                terminal: symbols.name(terminal).to_string(),
                candidates: candidates
                    .iter()
                    .map(|record| record.to_string_with(symbols))
                    .collect(),
            }),
        }
    }

    /// Merge the records proposing the same action, in first-seen order.
    fn merge(records: &[ActionRecord<'g, V>]) -> Vec<ActionRecord<'g, V>> {
        let mut merged: Vec<ActionRecord<'g, V>> = vec![];

        for record in records {
            match merged.iter_mut().find(|m| m.action == record.action) {
                Some(m) => {
                    m.duplicates.push(record.item);
                    m.duplicates.extend(record.duplicates.iter().copied());
                }
                None => merged.push(record.clone()),
            }
        }

        merged
    }

    fn break_tie<'r>(
        candidates: &'r [ActionRecord<'g, V>],
    ) -> Option<&'r ActionRecord<'g, V>> {
        let first = candidates.first()?;
        let priority = first.priority()?;
        let associativity = first.item.rule.associativity?;

        if candidates.iter().any(|record| {
            record.priority() != Some(priority)
                || record.item.rule.associativity != Some(associativity)
        }) {
            return None;
        }

        let positions = candidates.iter().map(|record| record.item.position);
        let best = match associativity {
            Associativity::Left => positions.max()?,
            Associativity::Right => positions.min()?,
        };

        let mut winners = candidates
            .iter()
            .filter(|record| record.item.position == best);

        match (winners.next(), winners.next()) {
            (Some(winner), None) => Some(winner),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        lr::{Action, ActionRecord, Item, ItemSet, LrError},
        Associativity, Grammar, GrammarBuilder,
    };

    use super::State;

    /// E -> E + E | E * E | n, with the given decorations on both operators.
    fn operator_grammar(
        plus: (Option<i32>, Option<Associativity>),
        star: (Option<i32>, Option<Associativity>),
    ) -> Grammar<()> {
        let mut builder = GrammarBuilder::<()>::new();
        for term in ["+", "*", "n"] {
            builder.terminal(term).expect("cannot add terminal");
        }
        builder.non_terminal("E").expect("cannot add E");
        builder.set_start("E").expect("cannot set start");

        for (op, (priority, associativity)) in [("+", plus), ("*", star)] {
            let mut rule = builder.add_rule("E", ["E", op, "E"]).expect("cannot add rule");
            if let Some(priority) = priority {
                rule = rule.priority(priority);
            }
            if let Some(associativity) = associativity {
                rule.associativity(associativity);
            }
        }
        builder.add_rule("E", ["n"]).expect("cannot add rule");

        builder.build()
    }

    /// The state reached after `E op E` with `next` pending: reduce `op`, or shift `next`.
    fn conflict_state<'g>(g: &'g Grammar<()>, reduce: usize, shift: usize) -> State<'g, ()> {
        let la = g.term(if shift == 1 { "+" } else { "*" });
        let mut state = State::new(7, ItemSet::default());

        state.push_record(
            la,
            ActionRecord::new(Item::new(g.rule(reduce), 3, la).unwrap(), Action::Reduce(reduce)),
        );
        state.push_record(
            la,
            ActionRecord::new(Item::new(g.rule(shift), 1, la).unwrap(), Action::Shift(4)),
        );
        state.push_record(
            la,
            ActionRecord::new(Item::new(g.rule(shift), 1, g.eos()).unwrap(), Action::Shift(4)),
        );

        state
    }

    #[test]
    fn test_001_left_associativity_reduces() {
        let g = operator_grammar(
            (Some(0), Some(Associativity::Left)),
            (Some(0), Some(Associativity::Left)),
        );
        let state = conflict_state(&g, 1, 1);

        assert!(state.has_conflicts());
        assert_eq!(
            state.disambiguate(g.term("+"), g.symbols()),
            Ok(Action::Reduce(1))
        );
    }

    #[test]
    fn test_002_right_associativity_shifts() {
        let g = operator_grammar(
            (Some(0), Some(Associativity::Right)),
            (Some(0), Some(Associativity::Right)),
        );
        let state = conflict_state(&g, 1, 1);

        assert_eq!(
            state.disambiguate(g.term("+"), g.symbols()),
            Ok(Action::Shift(4))
        );
    }

    #[test]
    fn test_003_highest_priority_wins() {
        let g = operator_grammar((Some(5), None), (Some(10), None));

        // E + E • with "*" pending: shift, "*" binds tighter.
        let state = conflict_state(&g, 1, 2);
        assert_eq!(
            state.disambiguate(g.term("*"), g.symbols()),
            Ok(Action::Shift(4))
        );

        // E * E • with "+" pending: reduce.
        let state = conflict_state(&g, 2, 1);
        assert_eq!(
            state.disambiguate(g.term("+"), g.symbols()),
            Ok(Action::Reduce(2))
        );
    }

    #[test]
    fn test_004_unresolvable_ambiguity() {
        let g = operator_grammar((Some(0), None), (Some(0), None));
        let state = conflict_state(&g, 1, 1);

        match state.disambiguate(g.term("+"), g.symbols()) {
            Err(LrError::UnresolvableAmbiguity {
                state,
                terminal,
                candidates,
            }) => {
                assert_eq!(state, 7);
                assert_eq!(terminal, "+");
                assert_eq!(
                    candidates,
                    vec![
                        "[(1) E -> E + E •, +] => r1".to_string(),
                        "[(1) E -> E • + E, +] => s4 (+1 duplicate)".to_string(),
                    ]
                );
            }
            other => panic!("expecting an ambiguity, got {other:?}"),
        }

        // Missing priority on one side skips the priority filter.
        let g = operator_grammar((None, Some(Associativity::Left)), (Some(10), None));
        let state = conflict_state(&g, 1, 2);
        assert!(state.disambiguate(g.term("*"), g.symbols()).is_err());
    }

    #[test]
    fn test_005_no_candidate_is_error() {
        let g = operator_grammar((None, None), (None, None));
        let state = State::<()>::new(0, ItemSet::default());

        assert_eq!(
            state.disambiguate(g.term("n"), g.symbols()),
            Ok(Action::Error)
        );
        assert!(!state.has_conflicts());
    }
}
