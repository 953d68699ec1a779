//! Grammar model and canonical LR(1) parser table generator.
//!
//! A grammar is authored with a [GrammarBuilder], frozen with
//! [GrammarBuilder::build], then turned into a [lr::LrTable] by
//! [lr::TableGenerator].
pub mod data;
pub mod grammar;
pub mod list;
pub mod lr;
pub mod rule;
pub mod sugar;
pub mod symbol;

pub use data::GrammarData;
pub use grammar::{Grammar, GrammarBuilder, GrammarConfig, GrammarError, GrammarResult};
pub use list::PersistentList;
pub use rule::*;
pub use sugar::SemanticValue;
pub use symbol::{GrammarId, NonTerminal, Symbol, SymbolKind, SymbolTable, Terminal};
