use std::sync::atomic::{AtomicUsize, Ordering};

use crate::{GrammarError, GrammarResult};

/// Identifier of the grammar owning a symbol.
///
/// Every grammar builder draws a fresh one, so handles coming from
/// another grammar can be told apart.
#[derive(Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Copy, Clone)]
pub struct GrammarId(usize);

impl GrammarId {
    pub(crate) fn next() -> Self {
        static NEXT: AtomicUsize = AtomicUsize::new(0);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

#[derive(Debug, Eq, PartialEq, Copy, Clone)]
pub enum SymbolKind {
    Terminal,
    NonTerminal,
    /// The distinguished end-of-input terminal.
    Eos,
    /// The distinguished start non-terminal.
    Start,
}

impl SymbolKind {
    #[inline(always)]
    pub fn is_terminal(&self) -> bool {
        matches!(self, SymbolKind::Terminal | SymbolKind::Eos)
    }
}

/// An atomic input token kind.
#[derive(Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Copy, Clone)]
pub struct Terminal {
    pub(crate) grammar: GrammarId,
    pub(crate) index: usize,
}

/// A syntactic category, produced by rules.
#[derive(Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Copy, Clone)]
pub struct NonTerminal {
    pub(crate) grammar: GrammarId,
    pub(crate) index: usize,
}

/// Any grammar symbol.
///
/// Terminals order before non-terminals, then by declaration order.
#[derive(Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Copy, Clone)]
pub enum Symbol {
    Terminal(Terminal),
    NonTerminal(NonTerminal),
}

impl From<Terminal> for Symbol {
    fn from(value: Terminal) -> Self {
        Self::Terminal(value)
    }
}

impl From<NonTerminal> for Symbol {
    fn from(value: NonTerminal) -> Self {
        Self::NonTerminal(value)
    }
}

impl Symbol {
    pub fn grammar(&self) -> GrammarId {
        match self {
            Symbol::Terminal(t) => t.grammar,
            Symbol::NonTerminal(nt) => nt.grammar,
        }
    }

    /// Position of the symbol in its grammar's declaration order.
    pub fn index(&self) -> usize {
        match self {
            Symbol::Terminal(t) => t.index,
            Symbol::NonTerminal(nt) => nt.index,
        }
    }

    #[inline(always)]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Symbol::Terminal(_))
    }

    pub fn as_terminal(&self) -> Option<Terminal> {
        match self {
            Symbol::Terminal(t) => Some(*t),
            Symbol::NonTerminal(_) => None,
        }
    }

    pub fn as_non_terminal(&self) -> Option<NonTerminal> {
        match self {
            Symbol::NonTerminal(nt) => Some(*nt),
            Symbol::Terminal(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SymbolDef {
    pub name: String,
    pub kind: SymbolKind,
}

/// The symbols declared by one grammar, in declaration order.
#[derive(Debug, Clone)]
pub struct SymbolTable {
    grammar: GrammarId,
    defs: Vec<SymbolDef>,
}

impl SymbolTable {
    pub(crate) fn new(grammar: GrammarId) -> Self {
        Self {
            grammar,
            defs: vec![],
        }
    }

    pub fn grammar(&self) -> GrammarId {
        self.grammar
    }

    /// Declare a new symbol.
    ///
    /// Returns an error if a symbol with the same name already exists.
    pub(crate) fn declare(&mut self, name: String, kind: SymbolKind) -> GrammarResult<Symbol> {
        if self.contains_name(&name) {
            return Err(GrammarError::DuplicateSymbolName(name));
        }

        let index = self.defs.len();
        self.defs.push(SymbolDef { name, kind });

        Ok(self.handle(index))
    }

    pub fn contains_name(&self, name: &str) -> bool {
        self.defs.iter().any(|def| def.name == name)
    }

    /// Get a symbol based on its name.
    pub fn get(&self, name: &str) -> Option<Symbol> {
        self.defs
            .iter()
            .position(|def| def.name == name)
            .map(|index| self.handle(index))
    }

    /// Returns the name of the symbol.
    ///
    /// # Panics
    /// Panics if the symbol belongs to another grammar.
    pub fn name(&self, symbol: impl Into<Symbol>) -> &str {
        let symbol = symbol.into();
        assert_eq!(
            symbol.grammar(),
            self.grammar,
            "symbol #{} does not belong to this grammar",
            symbol.index()
        );
        &self.defs[symbol.index()].name
    }

    /// Check the symbol was declared by this grammar.
    pub fn check(&self, symbol: Symbol) -> GrammarResult<Symbol> {
        if symbol.grammar() != self.grammar || symbol.index() >= self.defs.len() {
            return Err(GrammarError::OutOfGrammarSymbol(format!(
                "#{} of {:?}",
                symbol.index(),
                symbol.grammar()
            )));
        }
        Ok(symbol)
    }

    pub fn iter(&self) -> impl Iterator<Item = Symbol> + '_ {
        (0..self.defs.len()).map(|index| self.handle(index))
    }

    pub fn iter_terminals(&self) -> impl Iterator<Item = Terminal> + '_ {
        self.iter().filter_map(|sym| sym.as_terminal())
    }

    pub fn iter_non_terminals(&self) -> impl Iterator<Item = NonTerminal> + '_ {
        self.iter().filter_map(|sym| sym.as_non_terminal())
    }

    pub fn len(&self) -> usize {
        self.defs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }

    fn handle(&self, index: usize) -> Symbol {
        if self.defs[index].kind.is_terminal() {
            Terminal {
                grammar: self.grammar,
                index,
            }
            .into()
        } else {
            NonTerminal {
                grammar: self.grammar,
                index,
            }
            .into()
        }
    }
}

pub mod traits {
    use crate::{GrammarError, GrammarResult, NonTerminal, Symbol, SymbolTable, Terminal};

    /// Anything designating a symbol of a grammar: a handle or a name.
    pub trait SymbolRef {
        fn resolve(self, symbols: &SymbolTable) -> GrammarResult<Symbol>;

        /// Resolve the reference, and require a non-terminal.
        fn resolve_non_terminal(self, symbols: &SymbolTable) -> GrammarResult<NonTerminal>
        where
            Self: Sized,
        {
            let symbol = self.resolve(symbols)?;
            symbol
                .as_non_terminal()
                .ok_or_else(|| GrammarError::NotANonTerminal(symbols.name(symbol).to_string()))
        }
    }

    impl SymbolRef for Symbol {
        fn resolve(self, symbols: &SymbolTable) -> GrammarResult<Symbol> {
            symbols.check(self)
        }
    }

    impl SymbolRef for Terminal {
        fn resolve(self, symbols: &SymbolTable) -> GrammarResult<Symbol> {
            symbols.check(self.into())
        }
    }

    impl SymbolRef for NonTerminal {
        fn resolve(self, symbols: &SymbolTable) -> GrammarResult<Symbol> {
            symbols.check(self.into())
        }
    }

    impl SymbolRef for &str {
        fn resolve(self, symbols: &SymbolTable) -> GrammarResult<Symbol> {
            symbols
                .get(self)
                .ok_or_else(|| GrammarError::UnknownSymbol(self.to_string()))
        }
    }

    impl SymbolRef for &String {
        fn resolve(self, symbols: &SymbolTable) -> GrammarResult<Symbol> {
            self.as_str().resolve(symbols)
        }
    }
}
