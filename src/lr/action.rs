use crate::{RuleId, SymbolTable};

use super::Item;

pub type StateId = usize;

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy)]
pub enum Action {
    Shift(StateId),
    Reduce(RuleId),
    Accept,
    Error,
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Action::Shift(to) => write!(f, "s{}", to),
            Action::Reduce(to) => write!(f, "r{}", to),
            Action::Accept => write!(f, "acc"),
            Action::Error => write!(f, "err"),
        }
    }
}

/// A candidate action, with the item proposing it.
///
/// Items proposing the very same action are kept as duplicates.
pub struct ActionRecord<'g, V> {
    pub item: Item<'g, V>,
    pub action: Action,
    pub duplicates: Vec<Item<'g, V>>,
}

impl<V> Clone for ActionRecord<'_, V> {
    fn clone(&self) -> Self {
        Self {
            item: self.item,
            action: self.action,
            duplicates: self.duplicates.clone(),
        }
    }
}

impl<V> std::fmt::Debug for ActionRecord<'_, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionRecord")
            .field("item", &self.item)
            .field("action", &self.action)
            .field("duplicates", &self.duplicates)
            .finish()
    }
}

impl<'g, V> ActionRecord<'g, V> {
    pub fn new(item: Item<'g, V>, action: Action) -> Self {
        Self {
            item,
            action,
            duplicates: vec![],
        }
    }

    /// Priority of the rule behind the record.
    pub fn priority(&self) -> Option<i32> {
        self.item.rule.priority
    }

    /// Render the record for diagnostics.
    ///
    /// # Example
    /// [(1) E -> E • + E, $] => s4 (+1 duplicate)
    pub fn to_string_with(&self, symbols: &SymbolTable) -> String {
        let mut s = format!("{} => {}", self.item.to_string_with(symbols), self.action);
        if !self.duplicates.is_empty() {
            s.push_str(&format!(" (+{} duplicate)", self.duplicates.len()));
        }
        s
    }
}
