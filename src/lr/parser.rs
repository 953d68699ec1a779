use itertools::Itertools as _;
use thiserror::Error;

use crate::{Grammar, SemanticValue, Terminal};

use super::{traits, Action, LrTable, StateId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpectedSymbols(Vec<String>);

impl std::fmt::Display for ExpectedSymbols {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.iter().join(", "))
    }
}

impl ExpectedSymbols {
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("unexpected symbol {got} in state #{state}, expecting {expecting}")]
    UnexpectedSymbol {
        state: StateId,
        got: String,
        expecting: ExpectedSymbols,
    },

    #[error("unexpected end of stream")]
    UnexpectedEndOfStream,

    #[error("no goto for {symbol} in state #{state}")]
    MissingGoto { state: StateId, symbol: String },

    #[error("unexpected symbol {got} after the end of stream")]
    TrailingSymbol { got: String },
}

pub type ParseResult<T> = Result<T, ParseError>;

/// A shift/reduce driver over a generated table.
///
/// Tokens are (terminal, value) pairs; the end of stream is implied, but
/// may also be given explicitly as the last token.
/// Rules without a handler reduce to the list of their values.
pub struct LrParser<'a, V, Table = LrTable>
where
    Table: traits::LrTable,
{
    grammar: &'a Grammar<V>,
    table: &'a Table,
}

impl<'a, V, Table> LrParser<'a, V, Table>
where
    Table: traits::LrTable,
    V: SemanticValue,
{
    pub fn new(grammar: &'a Grammar<V>, table: &'a Table) -> Self {
        Self { grammar, table }
    }

    pub fn parse<I>(&self, tokens: I) -> ParseResult<V>
    where
        I: IntoIterator<Item = (Terminal, V)>,
    {
        let mut tokens = tokens.into_iter();
        let mut states: Vec<StateId> = vec![self.table.initial_state()];
        let mut stack: Vec<V> = Vec::default();
        let mut cursor = tokens.next();

        loop {
            let state = states
                .last()
                .copied()
                .ok_or(ParseError::UnexpectedEndOfStream)?;

            let terminal = match &cursor {
                None => self.grammar.eos(),
                Some((terminal, _)) => self.check(state, *terminal)?,
            };

            let action = self.table.action(state, terminal);
            log::trace!(
                "state #{}, {}: {}",
                state,
                self.grammar.name(terminal),
                action
            );

            match action {
                // Push the value of the token, and move to the given state.
                Action::Shift(next) => {
                    let Some((_, value)) = cursor.take() else {
                        return Err(ParseError::UnexpectedEndOfStream);
                    };
                    stack.push(value);
                    states.push(next);
                    cursor = tokens.next();
                }

                // Pop the body's values, and go to the state after the head.
                Action::Reduce(rule_id) => {
                    let rule = self.grammar.rule(rule_id);
                    let at = stack
                        .len()
                        .checked_sub(rule.len())
                        .ok_or(ParseError::UnexpectedEndOfStream)?;

                    let values = stack.split_off(at);
                    states.truncate(states.len().saturating_sub(rule.len()));

                    let state = states
                        .last()
                        .copied()
                        .ok_or(ParseError::UnexpectedEndOfStream)?;

                    let next = self.table.goto(state, rule.lhs).ok_or_else(|| {
                        ParseError::MissingGoto {
                            state,
                            symbol: self.grammar.name(rule.lhs).to_string(),
                        }
                    })?;

                    let value = rule.reduce(&values).unwrap_or_else(|| V::vec(values));
                    stack.push(value);
                    states.push(next);
                }

                Action::Accept => {
                    if cursor.is_some() {
                        if let Some((trailing, _)) = tokens.next() {
                            return Err(ParseError::TrailingSymbol {
                                got: self.name_of(trailing),
                            });
                        }
                    }
                    return stack.pop().ok_or(ParseError::UnexpectedEndOfStream);
                }

                Action::Error if terminal == self.grammar.eos() => {
                    return Err(ParseError::UnexpectedEndOfStream);
                }

                Action::Error => {
                    return Err(self.unexpected(state, self.grammar.name(terminal)));
                }
            }
        }
    }

    /// Reject terminals coming from another grammar.
    fn check(&self, state: StateId, terminal: Terminal) -> ParseResult<Terminal> {
        self.grammar
            .symbols()
            .check(terminal.into())
            .map(|_| terminal)
            .map_err(|_| self.unexpected(state, &format!("#{}", terminal.index)))
    }

    fn name_of(&self, terminal: Terminal) -> String {
        match self.grammar.symbols().check(terminal.into()) {
            Ok(_) => self.grammar.name(terminal).to_string(),
            Err(_) => format!("#{}", terminal.index),
        }
    }

    fn unexpected(&self, state: StateId, got: &str) -> ParseError {
        ParseError::UnexpectedSymbol {
            state,
            got: got.to_string(),
            expecting: ExpectedSymbols(
                self.table
                    .expected(state)
                    .into_iter()
                    .map(|t| self.grammar.name(t).to_string())
                    .collect(),
            ),
        }
    }
}
