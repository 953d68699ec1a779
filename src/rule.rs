use itertools::Itertools;

use crate::{NonTerminal, Symbol, SymbolTable};

/// The rule's identifier in the grammar.
pub type RuleId = usize;

/// Semantic action invoked with the values of the matched right-hand side.
pub type RuleHandler<V> = Box<dyn Fn(&[V]) -> V>;

/// How equal-priority rules bind when they conflict.
#[derive(Debug, Eq, PartialEq, Hash, Copy, Clone)]
pub enum Associativity {
    Left,
    Right,
}

/// A grammar rule
///
/// X := A1..An
///
/// The body is fixed at creation; priority, associativity and the
/// handler are attached through [RuleMut] right after.
pub struct Rule<V> {
    pub id: RuleId,
    pub lhs: NonTerminal,
    pub rhs: Vec<Symbol>,
    pub priority: Option<i32>,
    pub associativity: Option<Associativity>,
    handler: Option<RuleHandler<V>>,
}

impl<V> std::fmt::Debug for Rule<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rule")
            .field("id", &self.id)
            .field("lhs", &self.lhs)
            .field("rhs", &self.rhs)
            .field("priority", &self.priority)
            .field("associativity", &self.associativity)
            .field("handler", &self.handler.is_some())
            .finish()
    }
}

impl<V> Rule<V> {
    pub(crate) fn new(id: RuleId, lhs: NonTerminal, rhs: Vec<Symbol>) -> Self {
        Self {
            id,
            lhs,
            rhs,
            priority: None,
            associativity: None,
            handler: None,
        }
    }

    /// Number of symbols in the body.
    #[inline(always)]
    pub fn len(&self) -> usize {
        self.rhs.len()
    }

    /// The rule derives the empty string directly (A -> ε).
    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.rhs.is_empty()
    }

    /// Check the rules contains a certain symbol in its RHS.
    #[inline(always)]
    pub fn contains(&self, sym: &Symbol) -> bool {
        self.rhs.contains(sym)
    }

    pub fn has_handler(&self) -> bool {
        self.handler.is_some()
    }

    /// Run the semantic action over the values of the body.
    ///
    /// Returns None if the rule has no handler.
    pub fn reduce(&self, values: &[V]) -> Option<V> {
        self.handler.as_ref().map(|handler| handler(values))
    }

    /// Render the rule with the names of its symbols.
    ///
    /// # Example
    /// (2) E -> E - T
    pub fn to_string_with(&self, symbols: &SymbolTable) -> String {
        let rhs = if self.rhs.is_empty() {
            "ε".to_string()
        } else {
            self.rhs.iter().map(|&sym| symbols.name(sym)).join(" ")
        };
        format!("({}) {} -> {}", self.id, symbols.name(self.lhs), rhs)
    }
}

/// Fluent step used to decorate a freshly added rule.
///
/// # Example
/// ```ignore
/// builder
///     .add_rule("E", ["E", "+", "E"])?
///     .priority(1)
///     .left()
///     .handler(|values| values[0].clone());
/// ```
pub struct RuleMut<'b, V> {
    rule: &'b mut Rule<V>,
}

impl<'b, V> RuleMut<'b, V> {
    pub(crate) fn new(rule: &'b mut Rule<V>) -> Self {
        Self { rule }
    }

    pub fn id(&self) -> RuleId {
        self.rule.id
    }

    /// Higher priority wins when resolving conflicts.
    pub fn priority(self, priority: i32) -> Self {
        self.rule.priority = Some(priority);
        self
    }

    pub fn associativity(self, associativity: Associativity) -> Self {
        self.rule.associativity = Some(associativity);
        self
    }

    pub fn left(self) -> Self {
        self.associativity(Associativity::Left)
    }

    pub fn right(self) -> Self {
        self.associativity(Associativity::Right)
    }

    pub fn handler<F>(self, handler: F) -> Self
    where
        F: Fn(&[V]) -> V + 'static,
    {
        self.rule.handler = Some(Box::new(handler));
        self
    }
}

#[cfg(test)]
mod tests {
    use crate::{Associativity, GrammarBuilder};

    #[test]
    fn test_001_rule_decoration() {
        let mut builder = GrammarBuilder::<i64>::new();
        builder.terminal("+").expect("cannot add +");
        builder.terminal("n").expect("cannot add n");
        builder.non_terminal("E").expect("cannot add E");

        let id = builder
            .add_rule("E", ["E", "+", "E"])
            .expect("cannot add rule")
            .priority(3)
            .left()
            .handler(|values| values[0] + values[2])
            .id();

        let grammar = builder.build();
        let rule = grammar.rule(id);

        assert_eq!(rule.priority, Some(3));
        assert_eq!(rule.associativity, Some(Associativity::Left));
        assert_eq!(rule.reduce(&[1, 0, 2]), Some(3));
        assert_eq!(rule.to_string_with(grammar.symbols()), "(0) E -> E + E");
    }

    #[test]
    fn test_002_empty_rule() {
        let mut builder = GrammarBuilder::<()>::new();
        builder.non_terminal("A").expect("cannot add A");
        let id = builder
            .add_rule("A", Vec::<&str>::new())
            .expect("cannot add rule")
            .id();

        let grammar = builder.build();
        let rule = grammar.rule(id);

        assert!(rule.is_empty());
        assert!(!rule.has_handler());
        assert_eq!(rule.reduce(&[]), None);
        assert_eq!(rule.to_string_with(grammar.symbols()), "(0) A -> ε");
    }
}
