//! Sparse set of state ids with O(1) clearing.
//!
//! Based on: https://research.swtch.com/sparse
//!
//! Epsilon closures are computed once per subset-construction step, so the
//! scratch set is cleared far more often than it is allocated.

use super::arena::StateId;

/// A set of `StateId`s below a capacity fixed at construction.
#[derive(Clone, Debug)]
pub(crate) struct StateSet {
    len: usize,
    /// Members in insertion order.
    dense: Vec<StateId>,
    /// Position of an id in `dense`; valid iff it points back at the id.
    sparse: Vec<usize>,
}

impl StateSet {
    pub fn new(capacity: usize) -> Self {
        StateSet {
            len: 0,
            dense: vec![StateId::NONE; capacity],
            sparse: vec![0; capacity],
        }
    }

    /// Returns true if the id was not already present.
    ///
    /// Panics if the id is at or beyond the capacity.
    #[inline]
    pub fn insert(&mut self, id: StateId) -> bool {
        if self.contains(id) {
            return false;
        }
        self.dense[self.len] = id;
        self.sparse[id.index()] = self.len;
        self.len += 1;
        true
    }

    #[inline]
    pub fn contains(&self, id: StateId) -> bool {
        let idx = self.sparse[id.index()];
        idx < self.len && self.dense[idx] == id
    }

    #[inline]
    pub fn clear(&mut self) {
        self.len = 0;
    }

    /// Members in insertion order.
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = StateId> + '_ {
        self.dense[..self.len].iter().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_clear() {
        let mut set = StateSet::new(8);
        assert!(set.insert(StateId::from_index(3)));
        assert!(!set.insert(StateId::from_index(3)));
        assert!(set.insert(StateId::from_index(0)));
        assert_eq!(
            set.iter().collect::<Vec<_>>(),
            vec![StateId::from_index(3), StateId::from_index(0)]
        );

        set.clear();
        assert_eq!(set.iter().count(), 0);
        assert!(!set.contains(StateId::from_index(3)));
        assert!(set.insert(StateId::from_index(3)));
    }
}
