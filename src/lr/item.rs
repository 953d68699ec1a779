use std::{
    cmp::Ordering,
    collections::{btree_set, BTreeSet},
    hash::Hash,
};

use itertools::Itertools;

use crate::{Grammar, Rule, Symbol, SymbolTable, Terminal};

/// A LR(1) item.
///
/// # Example
/// [E -> E • - T, $]
pub struct Item<'g, V> {
    pub rule: &'g Rule<V>,
    pub position: usize,
    pub lookahead: Terminal,
}

impl<V> Clone for Item<'_, V> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<V> Copy for Item<'_, V> {}

impl<V> Item<'_, V> {
    fn key(&self) -> (usize, usize, Terminal) {
        (self.rule.id, self.position, self.lookahead)
    }
}

impl<V> PartialEq for Item<'_, V> {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl<V> Eq for Item<'_, V> {}

impl<V> PartialOrd for Item<'_, V> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<V> Ord for Item<'_, V> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key().cmp(&other.key())
    }
}

impl<V> Hash for Item<'_, V> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

impl<V> std::fmt::Debug for Item<'_, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Item")
            .field("rule", &self.rule.id)
            .field("position", &self.position)
            .field("lookahead", &self.lookahead)
            .finish()
    }
}

impl<'g, V> Item<'g, V> {
    /// Creates a new item
    ///
    /// Returns None if the position is beyond the end of the rule.
    pub fn new(rule: &'g Rule<V>, position: usize, lookahead: Terminal) -> Option<Self> {
        if rule.rhs.len() >= position {
            Some(Self {
                rule,
                position,
                lookahead,
            })
        } else {
            None
        }
    }

    /// The dot is at the beginning of the rule.
    ///
    /// # Example
    /// A -> • w
    pub fn is_initial(&self) -> bool {
        self.position == 0
    }

    /// Check if we reached the end of a rule.
    ///
    /// # Example
    /// A -> w •
    pub fn is_exhausted(&self) -> bool {
        self.position >= self.rule.rhs.len()
    }

    /// Returns the current symbol.
    /// If A -> w •, then returns None.
    pub fn symbol(&self) -> Option<Symbol> {
        self.rule.rhs.get(self.position).copied()
    }

    /// Symbols located after the current one.
    ///
    /// # Example
    /// (A -> α • B β).remainder() -> β
    pub fn remainder(&self) -> &'g [Symbol] {
        self.rule.rhs.get(self.position + 1..).unwrap_or_default()
    }

    /// Returns the next rule's item.
    ///
    /// Returns None, if the current rule is exhausted.
    ///
    /// # Example
    /// (A -> • w eos).next() -> (A -> w • eos)
    pub fn next(&self) -> Option<Self> {
        if self.is_exhausted() {
            None
        } else {
            Self::new(self.rule, self.position + 1, self.lookahead)
        }
    }

    /// Render the item with the names of its symbols.
    ///
    /// # Example
    /// [(1) E -> E • - T, $]
    pub fn to_string_with(&self, symbols: &SymbolTable) -> String {
        let mut rhs = self
            .rule
            .rhs
            .iter()
            .map(|&sym| symbols.name(sym).to_string())
            .enumerate()
            .map(|(pos, mut s)| {
                if pos == self.position {
                    s.insert_str(0, "• ");
                }
                s
            })
            .join(" ");

        if self.is_exhausted() {
            if !rhs.is_empty() {
                rhs.push(' ');
            }
            rhs.push('•');
        }

        format!(
            "[({}) {} -> {}, {}]",
            self.rule.id,
            symbols.name(self.rule.lhs),
            rhs,
            symbols.name(self.lookahead)
        )
    }
}

/// A set of LR(1) items.
///
/// Two sets are equal if they hold the same items, which makes the set
/// its own canonical key when states are interned.
pub struct ItemSet<'g, V>(BTreeSet<Item<'g, V>>);

impl<V> Default for ItemSet<'_, V> {
    fn default() -> Self {
        Self(BTreeSet::default())
    }
}

impl<V> Clone for ItemSet<'_, V> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<V> PartialEq for ItemSet<'_, V> {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl<V> Eq for ItemSet<'_, V> {}

impl<V> Hash for ItemSet<'_, V> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

impl<V> std::fmt::Debug for ItemSet<'_, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.0.iter()).finish()
    }
}

impl<'g, V> FromIterator<Item<'g, V>> for ItemSet<'g, V> {
    fn from_iter<T: IntoIterator<Item = Item<'g, V>>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a, 'g, V> IntoIterator for &'a ItemSet<'g, V> {
    type Item = &'a Item<'g, V>;
    type IntoIter = btree_set::Iter<'a, Item<'g, V>>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl<'g, V> ItemSet<'g, V> {
    /// Iterate over all items within the set.
    pub fn iter(&self) -> impl Iterator<Item = &Item<'g, V>> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, item: &Item<'g, V>) -> bool {
        self.0.contains(item)
    }

    /// Symbols following the dot of any item, in symbol order.
    pub fn iter_next_symbols(&self) -> impl Iterator<Item = Symbol> {
        self.iter()
            .filter_map(Item::symbol)
            .collect::<BTreeSet<_>>()
            .into_iter()
    }

    /// Close the item set
    ///
    /// For every item A -> α • B β, a, adds B -> • γ, b for every rule of B
    /// and every b in FIRST(β a), until nothing new is added.
    pub fn close(&mut self, grammar: &'g Grammar<V>) {
        let mut stack: Vec<_> = self.0.iter().copied().collect();

        while let Some(item) = stack.pop() {
            let Some(Symbol::NonTerminal(sym)) = item.symbol() else {
                continue;
            };

            let lookaheads = grammar.first_with(item.remainder(), item.lookahead);

            for rule in grammar.iter_by_symbol(sym) {
                for &lookahead in lookaheads.iter() {
                    let item = Item {
                        rule,
                        position: 0,
                        lookahead,
                    };

                    if self.0.insert(item) {
                        stack.push(item);
                    }
                }
            }
        }
    }

    /// Returns the closed set reached by moving the dot over the symbol.
    ///
    /// The set is empty if no item expects the symbol.
    pub fn goto(&self, symbol: Symbol, grammar: &'g Grammar<V>) -> Self {
        let mut set: Self = self
            .iter()
            .filter(|item| item.symbol() == Some(symbol))
            .filter_map(Item::next)
            .collect();

        set.close(grammar);
        set
    }

    /// Render the set with the names of its symbols.
    pub fn to_string_with(&self, symbols: &SymbolTable) -> String {
        format!(
            "{{{}}}",
            self.iter().map(|item| item.to_string_with(symbols)).join(", ")
        )
    }
}

#[cfg(test)]
mod tests {
    use crate::fixtures::{arithmetic_grammar, lr0_grammar};

    use super::{Item, ItemSet};

    #[test]
    fn test_001_item_set_closure() {
        let g = lr0_grammar().expect("Cannot generate grammar");
        let eos = g.eos();

        let mut set: ItemSet<'_, ()> = [Item::new(g.rule(0), 0, eos).unwrap()]
            .into_iter()
            .collect();
        set.close(&g);

        let star = g.term("*");
        let plus = g.term("+");

        let mut expected: Vec<Item<'_, ()>> = vec![
            // S → • E, $
            Item::new(g.rule(0), 0, eos).unwrap(),
        ];
        for la in [eos, star, plus] {
            // E → • E * B | • E + B | • B
            expected.push(Item::new(g.rule(1), 0, la).unwrap());
            expected.push(Item::new(g.rule(2), 0, la).unwrap());
            expected.push(Item::new(g.rule(3), 0, la).unwrap());
            // B → • 0 | • 1
            expected.push(Item::new(g.rule(4), 0, la).unwrap());
            expected.push(Item::new(g.rule(5), 0, la).unwrap());
        }

        let expected: ItemSet<'_, ()> = expected.into_iter().collect();
        assert_eq!(set, expected);
    }

    #[test]
    fn test_002_closure_is_idempotent() {
        let g = arithmetic_grammar().expect("Cannot generate grammar");

        let mut set: ItemSet<'_, _> = [Item::new(g.rule(0), 0, g.eos()).unwrap()]
            .into_iter()
            .collect();
        set.close(&g);

        let mut again = set.clone();
        again.close(&g);

        assert_eq!(set, again);
    }

    #[test]
    fn test_003_goto() {
        let g = arithmetic_grammar().expect("Cannot generate grammar");

        let mut i0: ItemSet<'_, _> = [Item::new(g.rule(0), 0, g.eos()).unwrap()]
            .into_iter()
            .collect();
        i0.close(&g);

        // On "(", the inner E is closed again with ")" and "-" as lookaheads.
        let set = i0.goto(g.sym("("), &g);
        assert!(set.contains(&Item::new(g.rule(4), 1, g.eos()).unwrap()));
        assert!(set.contains(&Item::new(g.rule(1), 0, g.term(")")).unwrap()));
        assert!(set.contains(&Item::new(g.rule(1), 0, g.term("-")).unwrap()));
        assert!(!set.contains(&Item::new(g.rule(1), 0, g.eos()).unwrap()));

        assert!(i0.goto(g.sym(")"), &g).is_empty());
    }

    #[test]
    fn test_004_item_predicates() {
        let g = arithmetic_grammar().expect("Cannot generate grammar");

        let item = Item::new(g.rule(1), 0, g.eos()).unwrap();
        assert!(item.is_initial());
        assert_eq!(item.symbol(), Some(g.sym("E")));
        assert_eq!(item.remainder(), &[g.sym("-"), g.sym("T")]);

        let last = item.next().and_then(|i| i.next()).and_then(|i| i.next()).unwrap();
        assert!(last.is_exhausted());
        assert_eq!(last.symbol(), None);
        assert!(last.next().is_none());
        assert!(Item::new(g.rule(1), 4, g.eos()).is_none());

        assert_eq!(
            last.to_string_with(g.symbols()),
            "[(1) E -> E - T •, $]"
        );
        assert_eq!(
            item.to_string_with(g.symbols()),
            "[(1) E -> • E - T, $]"
        );
    }
}
