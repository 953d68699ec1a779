#![allow(dead_code)]

use lrkit::{Grammar, PersistentList, SemanticValue, Terminal};

/// A syntax tree made of the values the rules produce.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Ast {
    Empty,
    Token(String),
    List(PersistentList<Ast>),
    Node(Vec<Ast>),
}

impl Ast {
    pub fn token(text: impl Into<String>) -> Self {
        Self::Token(text.into())
    }

    /// Render the tree as a compact expression.
    pub fn text(&self) -> String {
        match self {
            Ast::Empty => String::default(),
            Ast::Token(text) => text.clone(),
            Ast::List(list) => list.iter().map(Ast::text).collect::<Vec<_>>().join(" "),
            Ast::Node(children) => format!(
                "[{}]",
                children.iter().map(Ast::text).collect::<Vec<_>>().join(" ")
            ),
        }
    }
}

impl SemanticValue for Ast {
    fn none() -> Self {
        Self::Empty
    }

    fn list(list: PersistentList<Self>) -> Self {
        Self::List(list)
    }

    fn as_list(&self) -> Option<&PersistentList<Self>> {
        match self {
            Ast::List(list) => Some(list),
            _ => None,
        }
    }

    fn vec(values: Vec<Self>) -> Self {
        Self::Node(values)
    }
}

pub fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// One token per whitespace separated terminal name.
pub fn lex<V>(grammar: &Grammar<V>, input: &str) -> Vec<(Terminal, Ast)> {
    input
        .split_whitespace()
        .map(|name| (grammar.term(name), Ast::token(name)))
        .collect()
}
