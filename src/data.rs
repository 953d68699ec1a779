//! Nullable, FIRST and FOLLOW sets of a grammar.
//!
//! All three are computed by plain iteration until no set grows anymore.
use std::collections::{BTreeMap, BTreeSet};

use itertools::Itertools;

use crate::{NonTerminal, Rule, Symbol, SymbolTable, Terminal};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GrammarData {
    nullable: BTreeSet<NonTerminal>,
    first: BTreeMap<NonTerminal, BTreeSet<Terminal>>,
    follow: BTreeMap<NonTerminal, BTreeSet<Terminal>>,
}

impl GrammarData {
    pub(crate) fn compute<V>(
        symbols: &SymbolTable,
        rules: &[Rule<V>],
        start: NonTerminal,
        eos: Terminal,
    ) -> Self {
        let nullable = Self::compute_nullable(rules);
        let first = Self::compute_first(symbols, rules, &nullable);
        let follow = Self::compute_follow(symbols, rules, &nullable, &first, start, eos);

        log::debug!(
            "grammar analysis done: {} rules, nullable = {{{}}}",
            rules.len(),
            nullable.iter().map(|&nt| symbols.name(nt)).join(", ")
        );

        Self {
            nullable,
            first,
            follow,
        }
    }

    /// The non-terminal derives the empty string.
    pub fn is_nullable(&self, nt: NonTerminal) -> bool {
        self.nullable.contains(&nt)
    }

    /// Fetch the terminal symbols starting a derivation of the non-terminal.
    ///
    /// # Panics
    /// Panics if the non-terminal belongs to another grammar.
    pub fn first(&self, nt: NonTerminal) -> &BTreeSet<Terminal> {
        self.first
            .get(&nt)
            .unwrap_or_else(|| panic!("non-terminal #{} is not part of the grammar", nt.index))
    }

    /// Returns every terminal which can be located right after the non-terminal.
    ///
    /// # Panics
    /// Panics if the non-terminal belongs to another grammar.
    pub fn follow(&self, nt: NonTerminal) -> &BTreeSet<Terminal> {
        self.follow
            .get(&nt)
            .unwrap_or_else(|| panic!("non-terminal #{} is not part of the grammar", nt.index))
    }

    fn compute_nullable<V>(rules: &[Rule<V>]) -> BTreeSet<NonTerminal> {
        let mut nullable = BTreeSet::default();
        let mut changed = true;

        while changed {
            changed = false;
            for rule in rules {
                if nullable.contains(&rule.lhs) {
                    continue;
                }

                let derives_empty = rule.rhs.iter().all(|sym| match sym {
                    Symbol::Terminal(_) => false,
                    Symbol::NonTerminal(nt) => nullable.contains(nt),
                });

                if derives_empty {
                    nullable.insert(rule.lhs);
                    changed = true;
                }
            }
        }

        nullable
    }

    fn compute_first<V>(
        symbols: &SymbolTable,
        rules: &[Rule<V>],
        nullable: &BTreeSet<NonTerminal>,
    ) -> BTreeMap<NonTerminal, BTreeSet<Terminal>> {
        let mut first: BTreeMap<NonTerminal, BTreeSet<Terminal>> = symbols
            .iter_non_terminals()
            .map(|nt| (nt, BTreeSet::default()))
            .collect();

        let mut changed = true;
        while changed {
            changed = false;
            for rule in rules {
                let mut found = BTreeSet::<Terminal>::default();

                for sym in rule.rhs.iter() {
                    match sym {
                        Symbol::Terminal(t) => {
                            found.insert(*t);
                            break;
                        }
                        Symbol::NonTerminal(nt) => {
                            found.extend(first[nt].iter().copied());
                            if !nullable.contains(nt) {
                                break;
                            }
                        }
                    }
                }

                let set = first.entry(rule.lhs).or_default();
                let before = set.len();
                set.extend(found);
                changed |= set.len() != before;
            }
        }

        first
    }

    fn compute_follow<V>(
        symbols: &SymbolTable,
        rules: &[Rule<V>],
        nullable: &BTreeSet<NonTerminal>,
        first: &BTreeMap<NonTerminal, BTreeSet<Terminal>>,
        start: NonTerminal,
        eos: Terminal,
    ) -> BTreeMap<NonTerminal, BTreeSet<Terminal>> {
        let mut follow: BTreeMap<NonTerminal, BTreeSet<Terminal>> = symbols
            .iter_non_terminals()
            .map(|nt| (nt, BTreeSet::default()))
            .collect();

        follow.entry(start).or_default().insert(eos);

        let mut changed = true;
        while changed {
            changed = false;
            for rule in rules {
                for (pos, sym) in rule.rhs.iter().enumerate() {
                    let Symbol::NonTerminal(b) = sym else {
                        continue;
                    };

                    // A → α B β: FIRST(β), and FOLLOW(A) if β derives ε.
                    let mut found = BTreeSet::<Terminal>::default();
                    let mut trailing = true;

                    for next in rule.rhs[pos + 1..].iter() {
                        match next {
                            Symbol::Terminal(t) => {
                                found.insert(*t);
                                trailing = false;
                                break;
                            }
                            Symbol::NonTerminal(nt) => {
                                found.extend(first[nt].iter().copied());
                                if !nullable.contains(nt) {
                                    trailing = false;
                                    break;
                                }
                            }
                        }
                    }

                    if trailing {
                        found.extend(follow[&rule.lhs].iter().copied());
                    }

                    let set = follow.entry(*b).or_default();
                    let before = set.len();
                    set.extend(found);
                    changed |= set.len() != before;
                }
            }
        }

        follow
    }
}
