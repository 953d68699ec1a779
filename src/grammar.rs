use std::collections::{BTreeMap, BTreeSet};

use thiserror::Error;

use crate::{
    data::GrammarData,
    symbol::{traits::SymbolRef, SymbolKind},
    GrammarId, NonTerminal, Rule, RuleId, RuleMut, Symbol, SymbolTable, Terminal,
};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GrammarError {
    #[error("a symbol with the same name already exists: {0}")]
    DuplicateSymbolName(String),

    #[error("unknown symbol {0}")]
    UnknownSymbol(String),

    #[error("symbol {0} belongs to another grammar")]
    OutOfGrammarSymbol(String),

    #[error("symbol {0} is not a non-terminal")]
    NotANonTerminal(String),

    #[error("end-of-input symbol {0} cannot appear in a rule")]
    EosInRule(String),
}

pub type GrammarResult<T> = Result<T, GrammarError>;

/// Names of the two symbols every grammar owns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrammarConfig {
    pub start: String,
    pub eos: String,
}

impl Default for GrammarConfig {
    fn default() -> Self {
        Self {
            start: "<start>".into(),
            eos: "<eos>".into(),
        }
    }
}

/// A grammar under construction.
///
/// The start non-terminal and the end-of-input terminal are created with
/// the builder; the start rule is added through [GrammarBuilder::set_start].
///
/// # Example
///
/// For the following grammar :
///
/// ```grammar
/// 1. <start> := E
/// 2. E := E * B
/// 3. E := E + B
/// 4. E := B
/// 5. B := 0
/// 6. B := 1
/// ```
///
/// ```ignore
/// let mut builder = GrammarBuilder::<Value>::new();
///
/// for term in ["*", "+", "0", "1"] {
///     builder.terminal(term)?;
/// }
/// builder.non_terminal("E")?;
/// builder.non_terminal("B")?;
///
/// builder.set_start("E")?;
/// builder.add_rule("E", ["E", "*", "B"])?;
/// builder.add_rule("E", ["E", "+", "B"])?;
/// builder.add_rule("E", ["B"])?;
/// builder.add_rule("B", ["0"])?;
/// builder.add_rule("B", ["1"])?;
///
/// let grammar = builder.build();
/// ```
pub struct GrammarBuilder<V> {
    symbols: SymbolTable,
    rules: Vec<Rule<V>>,
    start: NonTerminal,
    eos: Terminal,
}

impl<V> std::fmt::Debug for GrammarBuilder<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GrammarBuilder")
            .field("symbols", &self.symbols)
            .field("rules", &self.rules)
            .finish()
    }
}

impl<V> Default for GrammarBuilder<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> GrammarBuilder<V> {
    pub fn new() -> Self {
        Self::with_config(GrammarConfig::default())
            .unwrap_or_else(|_| unreachable!("the default configuration is valid"))
    }

    /// Creates a builder whose distinguished symbols use the configured names.
    ///
    /// Returns an error if both names are the same.
    pub fn with_config(config: GrammarConfig) -> GrammarResult<Self> {
        let mut symbols = SymbolTable::new(GrammarId::next());
        let start = symbols.declare(config.start, SymbolKind::Start)?;
        let eos = symbols.declare(config.eos, SymbolKind::Eos)?;

        match (start.as_non_terminal(), eos.as_terminal()) {
            (Some(start), Some(eos)) => Ok(Self {
                symbols,
                rules: vec![],
                start,
                eos,
            }),
            _ => unreachable!("start and eos kinds are fixed"),
        }
    }

    /// Returns the start symbol of the grammar.
    pub fn start(&self) -> NonTerminal {
        self.start
    }

    /// Returns the end-of-stream symbol of the grammar.
    pub fn eos(&self) -> Terminal {
        self.eos
    }

    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    /// Add a terminal symbol in the grammar.
    ///
    /// Returns an error if a symbol with the same name already exists.
    pub fn terminal(&mut self, name: impl Into<String>) -> GrammarResult<Terminal> {
        let symbol = self.symbols.declare(name.into(), SymbolKind::Terminal)?;
        Ok(symbol
            .as_terminal()
            .unwrap_or_else(|| unreachable!("declared as terminal")))
    }

    /// Add a non-terminal symbol in the grammar.
    ///
    /// Returns an error if a symbol with the same name already exists.
    pub fn non_terminal(&mut self, name: impl Into<String>) -> GrammarResult<NonTerminal> {
        let symbol = self.symbols.declare(name.into(), SymbolKind::NonTerminal)?;
        Ok(symbol
            .as_non_terminal()
            .unwrap_or_else(|| unreachable!("declared as non-terminal")))
    }

    /// Get a symbol based on its name.
    pub fn symbol(&self, name: &str) -> GrammarResult<Symbol> {
        name.resolve(&self.symbols)
    }

    /// Returns a name, starting with prefix, that no symbol uses yet.
    pub fn unique_name(&self, prefix: &str) -> String {
        if !self.symbols.contains_name(prefix) {
            return prefix.to_string();
        }

        (1..)
            .map(|n| format!("{prefix}#{n}"))
            .find(|name| !self.symbols.contains_name(name))
            .unwrap_or_else(|| unreachable!("the sequence of candidate names is infinite"))
    }

    /// Add a new rule
    ///
    /// Returns an error if a symbol of the rule does not belong to the grammar,
    /// if the left-hand side is not a non-terminal, or if the body holds the
    /// end-of-input symbol. Nothing is added on error.
    pub fn add_rule<L, I, R>(&mut self, lhs: L, rhs: I) -> GrammarResult<RuleMut<'_, V>>
    where
        L: SymbolRef,
        I: IntoIterator<Item = R>,
        R: SymbolRef,
    {
        let lhs = lhs.resolve_non_terminal(&self.symbols)?;
        let rhs = rhs
            .into_iter()
            .map(|sym| sym.resolve(&self.symbols))
            .collect::<GrammarResult<Vec<_>>>()?;

        let rule = Rule::new(self.rules.len(), lhs, rhs);
        if rule.contains(&self.eos.into()) {
            return Err(GrammarError::EosInRule(self.symbols.name(self.eos).to_string()));
        }

        let id = rule.id;
        self.rules.push(rule);

        Ok(RuleMut::new(&mut self.rules[id]))
    }

    /// Add the start rule (<start> -> symbol).
    pub fn set_start<S: SymbolRef>(&mut self, symbol: S) -> GrammarResult<RuleMut<'_, V>> {
        let symbol = symbol.resolve_non_terminal(&self.symbols)?;
        let start = self.start;
        self.add_rule(start, [symbol])
    }

    /// Freeze the grammar, and compute its analysis.
    pub fn build(self) -> Grammar<V> {
        let mut by_lhs = BTreeMap::<NonTerminal, Vec<RuleId>>::default();
        for nt in self.symbols.iter_non_terminals() {
            by_lhs.insert(nt, vec![]);
        }
        for rule in self.rules.iter() {
            by_lhs.entry(rule.lhs).or_default().push(rule.id);
        }

        let data = GrammarData::compute(&self.symbols, &self.rules, self.start, self.eos);

        Grammar {
            symbols: self.symbols,
            rules: self.rules,
            by_lhs,
            start: self.start,
            eos: self.eos,
            data,
        }
    }
}

/// A frozen grammar, with its nullable/FIRST/FOLLOW analysis.
pub struct Grammar<V> {
    symbols: SymbolTable,
    rules: Vec<Rule<V>>,
    by_lhs: BTreeMap<NonTerminal, Vec<RuleId>>,
    start: NonTerminal,
    eos: Terminal,
    data: GrammarData,
}

impl<V> std::fmt::Debug for Grammar<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Grammar")
            .field("symbols", &self.symbols)
            .field("rules", &self.rules)
            .field("data", &self.data)
            .finish()
    }
}

impl<V> std::fmt::Display for Grammar<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for rule in self.rules.iter() {
            writeln!(f, "{}", rule.to_string_with(&self.symbols))?;
        }
        Ok(())
    }
}

impl<V> Grammar<V> {
    /// Returns the start symbol of the grammar.
    pub fn start(&self) -> NonTerminal {
        self.start
    }

    /// Returns the end-of-stream symbol of the grammar.
    pub fn eos(&self) -> Terminal {
        self.eos
    }

    pub fn id(&self) -> GrammarId {
        self.symbols.grammar()
    }

    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    pub fn data(&self) -> &GrammarData {
        &self.data
    }

    /// Get a symbol based on its name.
    pub fn symbol(&self, name: &str) -> GrammarResult<Symbol> {
        name.resolve(&self.symbols)
    }

    /// Returns the symbol behind the name
    ///
    /// # Panics
    /// Panics if no symbol match the name.
    pub fn sym(&self, name: &str) -> Symbol {
        self.symbols
            .get(name)
            .unwrap_or_else(|| panic!("the grammar does not include symbol {name}"))
    }

    /// Returns the terminal behind the name
    ///
    /// # Panics
    /// Panics if no terminal match the name.
    pub fn term(&self, name: &str) -> Terminal {
        self.sym(name)
            .as_terminal()
            .unwrap_or_else(|| panic!("symbol {name} is not a terminal"))
    }

    /// Returns the non-terminal behind the name
    ///
    /// # Panics
    /// Panics if no non-terminal match the name.
    pub fn nterm(&self, name: &str) -> NonTerminal {
        self.sym(name)
            .as_non_terminal()
            .unwrap_or_else(|| panic!("symbol {name} is not a non-terminal"))
    }

    pub fn name(&self, symbol: impl Into<Symbol>) -> &str {
        self.symbols.name(symbol)
    }

    pub fn iter_symbols(&self) -> impl Iterator<Item = Symbol> + '_ {
        self.symbols.iter()
    }

    pub fn iter_terminals(&self) -> impl Iterator<Item = Terminal> + '_ {
        self.symbols.iter_terminals()
    }

    pub fn iter_non_terminals(&self) -> impl Iterator<Item = NonTerminal> + '_ {
        self.symbols.iter_non_terminals()
    }

    /// Iterate over all rules of the grammar
    pub fn iter_rules(&self) -> impl Iterator<Item = &Rule<V>> {
        self.rules.iter()
    }

    /// Returns the rule behind the id.
    ///
    /// # Panics
    /// Panics if the rule does not exist.
    pub fn rule(&self, id: RuleId) -> &Rule<V> {
        &self.rules[id]
    }

    /// Iterate over the rules producing the symbol, in insertion order.
    pub fn iter_by_symbol(&self, lhs: NonTerminal) -> impl Iterator<Item = &Rule<V>> {
        self.by_lhs
            .get(&lhs)
            .into_iter()
            .flatten()
            .map(|&id| &self.rules[id])
    }

    pub fn is_nullable(&self, nt: NonTerminal) -> bool {
        self.data.is_nullable(nt)
    }

    /// Syntactic FIRST of a string of symbols.
    pub fn first(&self, symbols: &[Symbol]) -> BTreeSet<Terminal> {
        self.first_of(symbols).0
    }

    /// FIRST(βa): FIRST of the string, plus the lookahead if the whole string is nullable.
    pub fn first_with(&self, symbols: &[Symbol], lookahead: Terminal) -> BTreeSet<Terminal> {
        let (mut set, nullable) = self.first_of(symbols);
        if nullable {
            set.insert(lookahead);
        }
        set
    }

    /// Returns FIRST of the string, and whether the string derives ε.
    fn first_of(&self, symbols: &[Symbol]) -> (BTreeSet<Terminal>, bool) {
        let mut set = BTreeSet::default();

        for symbol in symbols {
            match symbol {
                Symbol::Terminal(t) => {
                    set.insert(*t);
                    return (set, false);
                }
                Symbol::NonTerminal(nt) => {
                    set.extend(self.data.first(*nt).iter().copied());
                    if !self.data.is_nullable(*nt) {
                        return (set, false);
                    }
                }
            }
        }

        (set, true)
    }
}
