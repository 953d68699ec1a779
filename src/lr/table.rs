use prettytable::Table as PtTable;
use std::collections::BTreeMap;

use crate::{Grammar, NonTerminal, Terminal};

use super::{Action, Graph, LrResult, StateId, TableGenerator};

pub mod traits {
    use crate::{
        lr::{Action, StateId},
        NonTerminal, Terminal,
    };

    /// What a shift/reduce driver needs from a table.
    pub trait LrTable {
        fn initial_state(&self) -> StateId;
        fn action(&self, state: StateId, terminal: Terminal) -> Action;
        fn goto(&self, state: StateId, symbol: NonTerminal) -> Option<StateId>;
        /// Terminals with a non-error action in the state.
        fn expected(&self, state: StateId) -> Vec<Terminal>;
    }
}

#[derive(Debug, Default, PartialEq, Eq, Clone)]
pub struct Row {
    actions: BTreeMap<Terminal, Action>,
    goto: BTreeMap<NonTerminal, StateId>,
}

impl Row {
    pub fn new<A, G>(actions: A, goto: G) -> Self
    where
        A: IntoIterator<Item = (Terminal, Action)>,
        G: IntoIterator<Item = (NonTerminal, StateId)>,
    {
        Self {
            actions: actions.into_iter().collect(),
            goto: goto.into_iter().collect(),
        }
    }

    pub fn action(&self, terminal: Terminal) -> Action {
        self.actions.get(&terminal).copied().unwrap_or(Action::Error)
    }

    pub fn goto(&self, symbol: NonTerminal) -> Option<StateId> {
        self.goto.get(&symbol).copied()
    }

    pub fn iter_actions(&self) -> impl Iterator<Item = (Terminal, Action)> + '_ {
        self.actions.iter().map(|(&t, &a)| (t, a))
    }

    pub fn iter_gotos(&self) -> impl Iterator<Item = (NonTerminal, StateId)> + '_ {
        self.goto.iter().map(|(&nt, &to)| (nt, to))
    }
}

/// The generated parsing table.
///
/// Read-only once built. It keeps the names of the symbols so it can be
/// rendered without its grammar.
#[derive(PartialEq, Eq, Clone)]
pub struct LrTable {
    initial: StateId,
    rows: Vec<Row>,
    terminals: Vec<(Terminal, String)>,
    non_terminals: Vec<(NonTerminal, String)>,
}

impl std::fmt::Debug for LrTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f)?;
        <Self as std::fmt::Display>::fmt(self, f)
    }
}

impl std::fmt::Display for LrTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut table = PtTable::new();

        table.add_row(
            ["#"]
                .into_iter()
                .chain(
                    self.terminals
                        .iter()
                        .map(|(_, name)| name.as_str())
                        .chain(self.non_terminals.iter().map(|(_, name)| name.as_str())),
                )
                .collect(),
        );

        for (id, row) in self.rows.iter().enumerate() {
            table.add_row(
                [id.to_string()]
                    .into_iter()
                    .chain(self.terminals.iter().map(|&(sym, _)| {
                        match row.action(sym) {
                            Action::Error => String::default(),
                            action => action.to_string(),
                        }
                    }))
                    .chain(self.non_terminals.iter().map(|&(sym, _)| {
                        row.goto(sym).map(|to| to.to_string()).unwrap_or_default()
                    }))
                    .collect(),
            );
        }

        write!(f, "{}", table)
    }
}

impl traits::LrTable for LrTable {
    fn initial_state(&self) -> StateId {
        self.initial
    }

    fn action(&self, state: StateId, terminal: Terminal) -> Action {
        self.action(state, terminal)
    }

    fn goto(&self, state: StateId, symbol: NonTerminal) -> Option<StateId> {
        self.goto(state, symbol)
    }

    fn expected(&self, state: StateId) -> Vec<Terminal> {
        self.iter_terminals(state).collect()
    }
}

impl LrTable {
    pub fn initial_state(&self) -> StateId {
        self.initial
    }

    /// Iterate over the state ids.
    pub fn states(&self) -> impl Iterator<Item = StateId> {
        0..self.rows.len()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row(&self, state: StateId) -> Option<&Row> {
        self.rows.get(state)
    }

    /// Returns the action, [Action::Error] if the table has none.
    pub fn action(&self, state: StateId, terminal: Terminal) -> Action {
        self.rows
            .get(state)
            .map(|row| row.action(terminal))
            .unwrap_or(Action::Error)
    }

    pub fn goto(&self, state: StateId, symbol: NonTerminal) -> Option<StateId> {
        self.rows.get(state).and_then(|row| row.goto(symbol))
    }

    /// Terminals with an action in the state.
    pub fn iter_terminals(&self, state: StateId) -> impl Iterator<Item = Terminal> + '_ {
        self.rows
            .get(state)
            .into_iter()
            .flat_map(|row| row.actions.keys().copied())
    }

    /// Resolve every candidate action of the graph into a table.
    pub fn from_graph<V>(graph: &Graph<'_, V>) -> LrResult<Self> {
        let grammar = graph.grammar();
        let symbols = grammar.symbols();

        let rows = graph
            .states()
            .iter()
            .map(|state| {
                let actions = state
                    .iter_terminals()
                    .map(|terminal| {
                        state
                            .disambiguate(terminal, symbols)
                            .map(|action| (terminal, action))
                    })
                    .collect::<LrResult<Vec<_>>>()?;

                Ok(Row::new(
                    actions
                        .into_iter()
                        .filter(|(_, action)| *action != Action::Error),
                    state.iter_gotos(),
                ))
            })
            .collect::<LrResult<Vec<_>>>()?;

        // The start column only shows when a rule body refers to it.
        let start = grammar.start();
        let start_has_gotos = rows.iter().any(|row| row.goto(start).is_some());

        Ok(Self {
            initial: 0,
            terminals: grammar
                .iter_terminals()
                .map(|t| (t, grammar.name(t).to_string()))
                .collect(),
            non_terminals: grammar
                .iter_non_terminals()
                .filter(|&nt| nt != start || start_has_gotos)
                .map(|nt| (nt, grammar.name(nt).to_string()))
                .collect(),
            rows,
        })
    }

    /// Build a LR(1) table from a grammar.
    pub fn build<V>(grammar: &Grammar<V>) -> LrResult<Self> {
        TableGenerator::new(grammar).generate()
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        fixtures::{arithmetic_grammar, lr0_grammar},
        lr::{fixtures::operator_grammar, Action},
        GrammarBuilder,
    };

    use super::LrTable;

    #[test]
    fn test_001_simple_table() {
        let g = lr0_grammar().expect("Cannot create grammar");
        let table = LrTable::build(&g).expect("Cannot build table");

        assert_eq!(table.len(), 9);
        assert_eq!(table.initial_state(), 0);

        let accepting = table
            .states()
            .filter(|&state| table.action(state, g.eos()) == Action::Accept)
            .count();
        assert_eq!(accepting, 1);

        let Some(to) = table.goto(0, g.nterm("E")) else {
            panic!("missing goto on E from the initial state");
        };
        assert_eq!(table.action(to, g.eos()), Action::Accept);
        assert!(matches!(table.action(0, g.term("0")), Action::Shift(_)));
        assert_eq!(table.action(0, g.term("+")), Action::Error);
        assert_eq!(table.action(42, g.term("0")), Action::Error);
    }

    #[test]
    fn test_002_rendering() {
        let g = lr0_grammar().expect("Cannot create grammar");
        let table = LrTable::build(&g).expect("Cannot build table");
        let rendered = table.to_string();

        assert!(rendered.contains("acc"));
        assert!(rendered.contains("$"));
        assert!(rendered.lines().any(|line| line.contains('#')));
        assert!(format!("{table:?}").starts_with('\n'));
    }

    #[test]
    fn test_003_reduce_on_lookahead_only() {
        let g = arithmetic_grammar().expect("Cannot create grammar");
        let table = LrTable::build(&g).expect("Cannot build table");

        // After "n", T -> n is reduced on "-", ")" or "$", never on "(".
        let Action::Shift(after_n) = table.action(0, g.term("n")) else {
            panic!("expecting a shift on n");
        };
        assert_eq!(table.action(after_n, g.term("-")), Action::Reduce(3));
        assert_eq!(table.action(after_n, g.eos()), Action::Reduce(3));
        assert_eq!(table.action(after_n, g.term(")")), Action::Error);
        assert_eq!(table.action(after_n, g.term("(")), Action::Error);
    }

    #[test]
    fn test_004_operator_conflicts_are_resolved() {
        let g = operator_grammar().expect("Cannot create grammar");
        let table = LrTable::build(&g).expect("Cannot build table");

        for state in table.states() {
            let row = table.row(state).expect("missing row");
            for (_, action) in row.iter_actions() {
                assert_ne!(action, Action::Error);
            }
        }
    }

    #[test]
    fn test_005_start_column_when_referenced() {
        let g = lr0_grammar().expect("Cannot create grammar");
        let table = LrTable::build(&g).expect("Cannot build table");
        assert!(!table.to_string().contains("| S "));

        // E -> ( <start> ) | n
        let mut builder = GrammarBuilder::<()>::new();
        for term in ["(", ")", "n"] {
            builder.terminal(term).expect("cannot add terminal");
        }
        builder.non_terminal("E").expect("cannot add E");
        builder.set_start("E").expect("cannot set start");
        builder
            .add_rule("E", ["(", "<start>", ")"])
            .expect("cannot add rule");
        builder.add_rule("E", ["n"]).expect("cannot add rule");
        let g = builder.build();

        let table = LrTable::build(&g).expect("Cannot build table");
        let Action::Shift(after_open) = table.action(0, g.term("(")) else {
            panic!("expecting a shift on (");
        };
        let to = table
            .goto(after_open, g.start())
            .expect("missing goto on <start>");

        let rendered = table.to_string();
        assert!(rendered.contains("<start>"));
        assert!(rendered
            .lines()
            .any(|line| line.starts_with(&format!("| {after_open} "))
                && line.contains(&format!(" {to} "))));
    }
}
