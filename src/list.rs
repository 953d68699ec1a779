use std::rc::Rc;

/// An immutable singly-linked list.
///
/// Consing is O(1) and shares the tail, so one list can be part of many
/// semantic values at once. Size and indexed access walk the list.
pub struct PersistentList<T>(Option<Rc<Node<T>>>);

struct Node<T> {
    head: T,
    tail: PersistentList<T>,
}

impl<T> Default for PersistentList<T> {
    fn default() -> Self {
        Self(None)
    }
}

impl<T> Clone for PersistentList<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<T> Drop for PersistentList<T> {
    // Unlink the nodes we own one by one, long lists would overflow the
    // stack with the recursive drop.
    fn drop(&mut self) {
        let mut cursor = self.0.take();
        while let Some(node) = cursor {
            match Rc::try_unwrap(node) {
                Ok(mut node) => cursor = node.tail.0.take(),
                Err(_) => break,
            }
        }
    }
}

impl<T> PersistentList<T> {
    /// The empty list.
    pub fn new() -> Self {
        Self(None)
    }

    /// Returns a new list with the value in front of this one.
    pub fn cons(&self, head: T) -> Self {
        Self(Some(Rc::new(Node {
            head,
            tail: self.clone(),
        })))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_none()
    }

    pub fn head(&self) -> Option<&T> {
        self.0.as_ref().map(|node| &node.head)
    }

    pub fn tail(&self) -> Option<&Self> {
        self.0.as_ref().map(|node| &node.tail)
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.iter().nth(index)
    }

    pub fn iter(&self) -> Iter<'_, T> {
        Iter(self.0.as_deref())
    }
}

impl<T: Clone> PersistentList<T> {
    /// Returns the same values, in reverse order.
    pub fn reversed(&self) -> Self {
        self.iter()
            .fold(Self::new(), |acc, value| acc.cons(value.clone()))
    }

    pub fn to_vec(&self) -> Vec<T> {
        self.iter().cloned().collect()
    }
}

pub struct Iter<'a, T>(Option<&'a Node<T>>);

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        self.0.map(|node| {
            self.0 = node.tail.0.as_deref();
            &node.head
        })
    }
}

impl<'a, T> IntoIterator for &'a PersistentList<T> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<T> FromIterator<T> for PersistentList<T> {
    /// Collect the values, keeping their order.
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let values: Vec<T> = iter.into_iter().collect();
        values
            .into_iter()
            .rev()
            .fold(Self::new(), |acc, value| acc.cons(value))
    }
}

impl<T: PartialEq> PartialEq for PersistentList<T> {
    fn eq(&self, other: &Self) -> bool {
        self.iter().eq(other.iter())
    }
}

impl<T: Eq> Eq for PersistentList<T> {}

impl<T: std::fmt::Debug> std::fmt::Debug for PersistentList<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}
