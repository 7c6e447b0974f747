use thiserror::Error;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("table is full (capacity {capacity})")]
pub struct CapacityExceeded {
    pub capacity: usize,
}

/// Fixed number of slots, each starting at a caller-provided default.
/// The first `len` slots are populated, in insertion order.
#[derive(Clone, Debug, PartialEq)]
pub struct BoundedTable<T> {
    slots: Vec<T>,
    len: usize,
}

impl<T: Clone> BoundedTable<T> {
    pub fn with_default(capacity: usize, default: T) -> BoundedTable<T> {
        BoundedTable {
            slots: vec![default; capacity],
            len: 0,
        }
    }
}

impl<T: Clone + Default> BoundedTable<T> {
    pub fn new(capacity: usize) -> BoundedTable<T> {
        Self::with_default(capacity, T::default())
    }
}

impl<T> BoundedTable<T> {
    // every slot is a default; capacity is the number of slots given
    pub fn from_defaults(slots: Vec<T>) -> BoundedTable<T> {
        BoundedTable { slots, len: 0 }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_full(&self) -> bool {
        self.len == self.slots.len()
    }

    /// Overwrites the next free slot with `value`.
    pub fn push(&mut self, value: T) -> Result<usize, CapacityExceeded> {
        self.fill_next(|slot| *slot = value)
    }

    /// Hands the next free slot (still holding its default) to `fill`, then
    /// marks it populated. Returns the slot index.
    pub fn fill_next(&mut self, fill: impl FnOnce(&mut T)) -> Result<usize, CapacityExceeded> {
        if self.is_full() {
            return Err(CapacityExceeded {
                capacity: self.capacity(),
            });
        }
        let idx = self.len;
        fill(&mut self.slots[idx]);
        self.len += 1;
        Ok(idx)
    }

    pub fn populated(&self) -> &[T] {
        &self.slots[..self.len]
    }

    // all slots, including the unpopulated defaults
    pub fn slots(&self) -> &[T] {
        &self.slots
    }

    pub fn get(&self, idx: usize) -> Option<&T> {
        self.populated().get(idx)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.populated().iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_preserves_insertion_order() {
        let mut table = BoundedTable::new(4);
        table.push(3).unwrap();
        table.push(1).unwrap();
        table.push(2).unwrap();
        assert_eq!(table.populated(), &[3, 1, 2]);
        assert_eq!(table.slots(), &[3, 1, 2, 0]);
    }

    #[test]
    fn push_past_capacity_is_rejected() {
        let mut table = BoundedTable::with_default(2, 'x');
        assert_eq!(table.push('a'), Ok(0));
        assert_eq!(table.push('b'), Ok(1));
        assert_eq!(table.push('c'), Err(CapacityExceeded { capacity: 2 }));
        assert_eq!(table.len(), 2);
        assert!(table.is_full());
    }

    #[test]
    fn fill_next_starts_from_slot_default() {
        let mut table = BoundedTable::from_defaults(vec![(1, 1), (2, 2)]);
        table.fill_next(|slot| slot.1 = 9).unwrap();
        assert_eq!(table.populated(), &[(1, 9)]);
        assert_eq!(table.slots()[1], (2, 2));
        assert_eq!(table.get(1), None);
    }
}
