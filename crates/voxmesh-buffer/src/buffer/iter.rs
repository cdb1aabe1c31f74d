use std::collections::BTreeSet;
use std::iter::FusedIterator;

/// Iterator over the live rows of a buffer, skipping tombstoned slots.
pub struct TripleIter<'a, T> {
    slots: &'a [[T; 3]],
    free: &'a BTreeSet<usize>,
    slot: usize,
    remaining: usize,
}

impl<'a, T> TripleIter<'a, T> {
    pub(crate) fn new(slots: &'a [[T; 3]], free: &'a BTreeSet<usize>) -> Self {
        Self {
            slots,
            free,
            slot: 0,
            remaining: slots.len() - free.len(),
        }
    }
}

impl<T: Copy> Iterator for TripleIter<'_, T> {
    type Item = [T; 3];

    fn next(&mut self) -> Option<Self::Item> {
        while self.slot < self.slots.len() {
            let slot = self.slot;
            self.slot += 1;
            if !self.free.contains(&slot) {
                self.remaining -= 1;
                return Some(self.slots[slot]);
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T: Copy> ExactSizeIterator for TripleIter<'_, T> {}

impl<T: Copy> FusedIterator for TripleIter<'_, T> {}
