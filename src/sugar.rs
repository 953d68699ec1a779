//! EBNF combinators.
//!
//! Each combinator declares fresh non-terminals and the rules expanding the
//! construct, with handlers building the resulting value. Symbols passed in
//! are only referenced, never altered.
use crate::{
    symbol::traits::SymbolRef, GrammarBuilder, GrammarResult, NonTerminal, PersistentList,
    Symbol,
};

/// Values produced by the rules the combinators generate.
pub trait SemanticValue: Clone {
    /// Value of an absent optional.
    fn none() -> Self;
    /// Wrap a list, as built by repetitions.
    fn list(list: PersistentList<Self>) -> Self;
    fn as_list(&self) -> Option<&PersistentList<Self>>;
    /// Wrap an ordered sequence of values.
    fn vec(values: Vec<Self>) -> Self;
}

const EMPTY: [Symbol; 0] = [];

fn cons<V: SemanticValue>(head: &V, tail: &V) -> V {
    let tail = tail.as_list().cloned().unwrap_or_default();
    V::list(tail.cons(head.clone()))
}

fn values_of<V: SemanticValue>(list: &V) -> Vec<V> {
    list.as_list().map(PersistentList::to_vec).unwrap_or_default()
}

impl<V: SemanticValue + 'static> GrammarBuilder<V> {
    fn resolve_all<I, R>(&self, symbols: I) -> GrammarResult<Vec<Symbol>>
    where
        I: IntoIterator<Item = R>,
        R: SymbolRef,
    {
        symbols
            .into_iter()
            .map(|sym| sym.resolve(self.symbols()))
            .collect()
    }

    fn synthesize(&mut self, prefix: &str) -> GrammarResult<NonTerminal> {
        let name = self.unique_name(prefix);
        self.non_terminal(name)
    }

    /// A := s1 .. sn
    ///
    /// Rules without handler reduce to [SemanticValue::vec] of their values.
    pub fn seq<I, R>(&mut self, body: I) -> GrammarResult<NonTerminal>
    where
        I: IntoIterator<Item = R>,
        R: SymbolRef,
    {
        let body = self.resolve_all(body)?;
        let nt = self.synthesize("seq")?;
        self.add_rule(nt, body)?;
        Ok(nt)
    }

    /// A := s1 .. sn, reduced by the handler.
    pub fn seq_with<I, R, F>(&mut self, body: I, handler: F) -> GrammarResult<NonTerminal>
    where
        I: IntoIterator<Item = R>,
        R: SymbolRef,
        F: Fn(&[V]) -> V + 'static,
    {
        let body = self.resolve_all(body)?;
        let nt = self.synthesize("seq")?;
        self.add_rule(nt, body)?.handler(handler);
        Ok(nt)
    }

    /// A := ε | s
    pub fn optional<S: SymbolRef>(&mut self, symbol: S) -> GrammarResult<NonTerminal> {
        let symbol = symbol.resolve(self.symbols())?;
        let nt = self.synthesize("opt")?;

        self.add_rule(nt, EMPTY)?.handler(|_| V::none());
        self.add_rule(nt, [symbol])?.handler(|values| match values {
            [value] => value.clone(),
            _ => V::none(),
        });

        Ok(nt)
    }

    /// A := ε | s A
    pub fn star<S: SymbolRef>(&mut self, symbol: S) -> GrammarResult<NonTerminal> {
        let symbol = symbol.resolve(self.symbols())?;
        let nt = self.synthesize("star")?;

        self.add_rule(nt, EMPTY)?
            .handler(|_| V::list(PersistentList::new()));
        self.add_rule(nt, [symbol, nt.into()])?
            .handler(|values| match values {
                [head, tail] => cons(head, tail),
                _ => V::list(PersistentList::new()),
            });

        Ok(nt)
    }

    /// A := s s*
    pub fn plus<S: SymbolRef>(&mut self, symbol: S) -> GrammarResult<NonTerminal> {
        let symbol = symbol.resolve(self.symbols())?;
        let star = self.star(symbol)?;
        let nt = self.synthesize("plus")?;

        self.add_rule(nt, [symbol, star.into()])?
            .handler(|values| match values {
                [head, tail] => cons(head, tail),
                _ => V::list(PersistentList::new()),
            });

        Ok(nt)
    }

    /// A := s1 | .. | sn
    ///
    /// The value of the matched alternative is passed through.
    pub fn one_of<S, I>(&mut self, first: S, rest: I) -> GrammarResult<NonTerminal>
    where
        S: SymbolRef,
        I: IntoIterator<Item = S>,
    {
        let alternatives = self.resolve_all(std::iter::once(first).chain(rest))?;
        let nt = self.synthesize("one_of")?;

        for alternative in alternatives {
            self.add_rule(nt, [alternative])?
                .handler(|values| values.first().cloned().unwrap_or_else(V::none));
        }

        Ok(nt)
    }

    /// A := item (sep item)*, or ε unless at least one item is required.
    ///
    /// Reduces to the ordered items, separators dropped.
    pub fn separated<S, T>(
        &mut self,
        item: S,
        separator: T,
        at_least_one: bool,
    ) -> GrammarResult<NonTerminal>
    where
        S: SymbolRef,
        T: SymbolRef,
    {
        let item = item.resolve(self.symbols())?;
        let separator = separator.resolve(self.symbols())?;

        let tail = self.synthesize("sep_tail")?;
        self.add_rule(tail, EMPTY)?
            .handler(|_| V::list(PersistentList::new()));
        self.add_rule(tail, [separator, item, tail.into()])?
            .handler(|values| match values {
                [_, head, tail] => cons(head, tail),
                _ => V::list(PersistentList::new()),
            });

        let nt = self.synthesize("sep")?;
        self.add_rule(nt, [item, tail.into()])?
            .handler(|values| match values {
                [head, tail] => V::vec(
                    std::iter::once(head.clone())
                        .chain(values_of(tail))
                        .collect(),
                ),
                _ => V::vec(vec![]),
            });

        if !at_least_one {
            self.add_rule(nt, EMPTY)?.handler(|_| V::vec(vec![]));
        }

        Ok(nt)
    }

    /// A := item (sep item)* terminator
    ///
    /// The terminator may be made optional, and the sequence may be allowed
    /// to be empty (a lone terminator, or nothing at all if it is optional).
    /// Reduces to the ordered items.
    pub fn terminated<S, T, U>(
        &mut self,
        item: S,
        separator: T,
        terminator: U,
        terminator_optional: bool,
        allow_empty: bool,
    ) -> GrammarResult<NonTerminal>
    where
        S: SymbolRef,
        T: SymbolRef,
        U: SymbolRef,
    {
        let item = item.resolve(self.symbols())?;
        let separator = separator.resolve(self.symbols())?;
        let terminator = terminator.resolve(self.symbols())?;

        // Left recursive, the latest item is at the front.
        let acc = self.synthesize("term_acc")?;
        self.add_rule(acc, [item])?.handler(|values| match values {
            [head] => V::list(PersistentList::new().cons(head.clone())),
            _ => V::list(PersistentList::new()),
        });
        self.add_rule(acc, [acc.into(), separator, item])?
            .handler(|values| match values {
                [tail, _, head] => cons(head, tail),
                _ => V::list(PersistentList::new()),
            });

        let nt = self.synthesize("term")?;
        let reversed = |values: &[V]| {
            let items = values
                .first()
                .and_then(V::as_list)
                .map(|list| list.reversed().to_vec())
                .unwrap_or_default();
            V::vec(items)
        };

        self.add_rule(nt, [acc.into(), terminator])?
            .handler(reversed);
        if terminator_optional {
            self.add_rule(nt, [acc])?.handler(reversed);
        }

        if allow_empty {
            self.add_rule(nt, [terminator])?
                .handler(|_| V::vec(vec![]));
            if terminator_optional {
                self.add_rule(nt, EMPTY)?.handler(|_| V::vec(vec![]));
            }
        }

        Ok(nt)
    }
}
