use thiserror::Error;

use crate::{Grammar, Symbol};

mod action;
mod graph;
mod item;
mod parser;
mod state;
mod table;

pub use action::*;
pub use graph::*;
pub use item::*;
pub use parser::*;
pub use state::*;
pub use table::*;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LrError {
    #[error("malformed grammar: {0}")]
    MalformedGrammar(String),

    #[error(
        "unresolvable ambiguity in state #{state} for symbol {terminal}: {}",
        .candidates.join("; ")
    )]
    UnresolvableAmbiguity {
        state: StateId,
        terminal: String,
        candidates: Vec<String>,
    },
}

pub type LrResult<T> = Result<T, LrError>;

/// Canonical LR(1) table generator.
///
/// # Example
/// ```ignore
/// let grammar = builder.build();
/// let table = TableGenerator::new(&grammar).generate()?;
/// ```
pub struct TableGenerator<'g, V> {
    grammar: &'g Grammar<V>,
}

impl<'g, V> TableGenerator<'g, V> {
    pub fn new(grammar: &'g Grammar<V>) -> Self {
        Self { grammar }
    }

    /// The start symbol must have exactly one rule, made of one non-terminal.
    pub fn check_start_rule(&self) -> LrResult<()> {
        let start = self.grammar.start();
        let name = self.grammar.name(start);
        let rules: Vec<_> = self.grammar.iter_by_symbol(start).collect();

        let rule = match rules.as_slice() {
            [rule] => rule,
            [] => {
                return Err(LrError::MalformedGrammar(format!(
                    "no rule for start symbol {name}"
                )))
            }
            _ => {
                return Err(LrError::MalformedGrammar(format!(
                    "start symbol {name} has {} rules, expecting one",
                    rules.len()
                )))
            }
        };

        match rule.rhs.as_slice() {
            [Symbol::NonTerminal(_)] => Ok(()),
            _ => Err(LrError::MalformedGrammar(format!(
                "start rule {} must derive a single non-terminal",
                rule.to_string_with(self.grammar.symbols())
            ))),
        }
    }

    /// Build the canonical collection.
    pub fn graph(&self) -> LrResult<Graph<'g, V>> {
        self.check_start_rule()?;

        let mut graph = Graph::new(self.grammar)?;
        graph.build();
        Ok(graph)
    }

    /// Generate the parsing table.
    ///
    /// Fails if the start rule is malformed, or if a conflict cannot be
    /// resolved by priority and associativity.
    pub fn generate(&self) -> LrResult<LrTable> {
        let graph = self.graph()?;
        let table = LrTable::from_graph(&graph)?;

        log::debug!("LR(1) table generated: {} states", table.len());
        Ok(table)
    }
}

#[cfg(test)]
pub mod fixtures {
    use crate::{fixtures::Value, Grammar, GrammarBuilder, GrammarResult};

    /// E -> E + E | E * E | n
    ///
    /// "+" is left associative, "*" is right associative and binds tighter.
    pub fn operator_grammar() -> GrammarResult<Grammar<Value>> {
        let mut builder = GrammarBuilder::<Value>::new();
        for term in ["+", "*", "n"] {
            builder.terminal(term)?;
        }
        builder.non_terminal("E")?;
        builder.set_start("E")?;

        builder
            .add_rule("E", ["E", "+", "E"])?
            .priority(1)
            .left()
            .handler(|values| {
                Value::leaf(format!("({}+{})", values[0].text(), values[2].text()))
            });

        builder
            .add_rule("E", ["E", "*", "E"])?
            .priority(2)
            .right()
            .handler(|values| {
                Value::leaf(format!("({}*{})", values[0].text(), values[2].text()))
            });

        builder
            .add_rule("E", ["n"])?
            .handler(|values| values[0].clone());

        Ok(builder.build())
    }
}
