use std::collections::{HashMap, VecDeque};

use crate::Grammar;

use super::{Item, ItemSet, LrError, LrResult, State, StateId};

/// The canonical collection of LR(1) item sets.
///
/// States are interned by item set, so equal sets always map to the same state.
pub struct Graph<'g, V> {
    grammar: &'g Grammar<V>,
    states: Vec<State<'g, V>>,
    index: HashMap<ItemSet<'g, V>, StateId>,
}

impl<'g, V> Graph<'g, V> {
    /// Create the graph holding the initial state, closure of [<start> -> • S, eos].
    pub fn new(grammar: &'g Grammar<V>) -> LrResult<Self> {
        let rule = grammar
            .iter_by_symbol(grammar.start())
            .next()
            .ok_or_else(|| LrError::MalformedGrammar("missing start rule".into()))?;

        let item = Item::new(rule, 0, grammar.eos())
            .ok_or_else(|| LrError::MalformedGrammar("invalid start rule".into()))?;

        let mut set: ItemSet<'g, V> = [item].into_iter().collect();
        set.close(grammar);

        let mut graph = Self {
            grammar,
            states: vec![],
            index: HashMap::default(),
        };
        graph.intern(set);

        Ok(graph)
    }

    /// Returns the state holding the item set, allocating it if needed.
    ///
    /// The boolean is true if the state was created.
    fn intern(&mut self, set: ItemSet<'g, V>) -> (StateId, bool) {
        if let Some(&id) = self.index.get(&set) {
            return (id, false);
        }

        let id = self.states.len();
        log::trace!(
            "state #{}: {}",
            id,
            set.to_string_with(self.grammar.symbols())
        );

        self.index.insert(set.clone(), id);
        self.states.push(State::new(id, set));
        (id, true)
    }

    /// Explore every state reachable from the initial one, breadth first.
    pub fn build(&mut self) {
        let grammar = self.grammar;
        let mut queue = VecDeque::from([0]);

        while let Some(from) = queue.pop_front() {
            let edges: Vec<_> = self.states[from]
                .items
                .iter_next_symbols()
                .map(|symbol| (symbol, self.states[from].items.goto(symbol, grammar)))
                .filter(|(_, set)| !set.is_empty())
                .collect();

            for (symbol, set) in edges {
                let (to, created) = self.intern(set);
                if created {
                    queue.push_back(to);
                }
                self.states[from].transitions.insert(symbol, to);
            }

            self.states[from].derive_actions(grammar.start(), grammar.eos());
        }

        log::debug!("canonical collection built: {} states", self.states.len());
    }

    pub fn grammar(&self) -> &'g Grammar<V> {
        self.grammar
    }

    pub fn states(&self) -> &[State<'g, V>] {
        &self.states
    }

    pub fn state(&self, id: StateId) -> Option<&State<'g, V>> {
        self.states.get(id)
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Returns the state holding exactly the item set.
    pub fn find(&self, set: &ItemSet<'g, V>) -> Option<StateId> {
        self.index.get(set).copied()
    }
}
