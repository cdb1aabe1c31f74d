use std::collections::BTreeSet;
use std::fmt::Debug;

use serde::{Deserialize, Serialize};
use voxmesh_core::{Result, VoxError};

use super::iter::TripleIter;
use crate::value_index::{IndexKey, ValueIndex};

/// Component type storable in a [`GeometryBuffer`].
pub trait Scalar: IndexKey + PartialEq + Default + Debug + Send + Sync + 'static {}

impl Scalar for f64 {}
impl Scalar for usize {}

/// Compacting store of 3-component rows addressed by a gap-free external index.
///
/// Rows live in one contiguous array. Removing a row tombstones its slot and records it in a
/// free list; later appends reuse free slots (lowest first) before growing the array. The
/// external index of a row is its slot minus the tombstones before it, so valid external
/// indices are always `0..len()`. [`optimize`](Self::optimize) squeezes the tombstones out.
///
/// An optional [`ValueIndex`] maps every component value to the rows containing it in any of
/// the three columns. It is patched on single-row edits and rebuilt after compaction.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeometryBuffer<T> {
    slots: Vec<[T; 3]>,
    free: BTreeSet<usize>,
    #[serde(skip)]
    index: Option<ValueIndex<T>>,
}

impl<T: Scalar> GeometryBuffer<T> {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: BTreeSet::new(),
            index: None,
        }
    }

    pub fn from_triples(triples: Vec<[T; 3]>) -> Self {
        Self {
            slots: triples,
            free: BTreeSet::new(),
            index: None,
        }
    }

    /// Build from a flat component list; its length must be a multiple of three.
    pub fn from_flat(values: &[T]) -> Result<Self> {
        if values.len() % 3 != 0 {
            return Err(VoxError::InvalidOperation(format!(
                "flat buffer of {} values is not a multiple of three",
                values.len()
            )));
        }
        let triples = values
            .chunks_exact(3)
            .map(|c| [c[0], c[1], c[2]])
            .collect();
        Ok(Self::from_triples(triples))
    }

    /// Number of live rows.
    pub fn len(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn in_range(&self, index: usize) -> bool {
        index < self.len()
    }

    /// True when no tombstones are pending.
    pub fn is_optimal(&self) -> bool {
        self.free.is_empty()
    }

    fn slot_of(&self, index: usize) -> Option<usize> {
        if index >= self.len() {
            return None;
        }
        let mut slot = index;
        for &tombstone in &self.free {
            if tombstone <= slot {
                slot += 1;
            } else {
                break;
            }
        }
        Some(slot)
    }

    fn external_of(&self, slot: usize) -> usize {
        slot - self.free.range(..slot).count()
    }

    pub fn get(&self, index: usize) -> Option<[T; 3]> {
        self.slot_of(index).map(|slot| self.slots[slot])
    }

    pub fn get_many(&self, indices: &[usize]) -> Vec<Option<[T; 3]>> {
        indices.iter().map(|&i| self.get(i)).collect()
    }

    /// Like [`get`](Self::get) but reports an out-of-range index as an error.
    pub fn triple(&self, index: usize) -> Result<[T; 3]> {
        self.get(index).ok_or(VoxError::OutOfRange {
            index,
            len: self.len(),
        })
    }

    /// Overwrite one row; returns `false` if `index` is out of range.
    pub fn update(&mut self, index: usize, triple: [T; 3]) -> bool {
        let Some(slot) = self.slot_of(index) else {
            return false;
        };
        if let Some(ix) = &mut self.index {
            for value in self.slots[slot] {
                ix.remove(value, slot);
            }
            for value in triple {
                ix.insert(value, slot);
            }
        }
        self.slots[slot] = triple;
        true
    }

    /// Like [`update`](Self::update) but reports an out-of-range index as an error.
    pub fn set(&mut self, index: usize, triple: [T; 3]) -> Result<()> {
        if self.update(index, triple) {
            Ok(())
        } else {
            Err(VoxError::OutOfRange {
                index,
                len: self.len(),
            })
        }
    }

    /// Add rows, filling tombstoned slots first. Returns the external index of each new row.
    pub fn append<I>(&mut self, triples: I) -> Vec<usize>
    where
        I: IntoIterator<Item = [T; 3]>,
    {
        let mut used = Vec::new();
        for triple in triples {
            let slot = match self.free.pop_first() {
                Some(slot) => {
                    self.slots[slot] = triple;
                    slot
                }
                None => {
                    self.slots.push(triple);
                    self.slots.len() - 1
                }
            };
            if let Some(ix) = &mut self.index {
                for value in triple {
                    ix.insert(value, slot);
                }
            }
            used.push(slot);
        }
        // Slots filled here are never preceded by a remaining tombstone, so resolving
        // external indices after the loop gives each row its final position.
        used.into_iter().map(|slot| self.external_of(slot)).collect()
    }

    /// Tombstone rows. Indices refer to the buffer as it was before the call; the result
    /// holds one flag per requested index, `false` for out-of-range or repeated indices.
    pub fn remove(&mut self, indices: &[usize]) -> Vec<bool> {
        let slots: Vec<Option<usize>> = indices.iter().map(|&i| self.slot_of(i)).collect();
        slots
            .into_iter()
            .map(|slot| match slot {
                Some(slot) if !self.free.contains(&slot) => {
                    if let Some(ix) = &mut self.index {
                        for value in self.slots[slot] {
                            ix.remove(value, slot);
                        }
                    }
                    self.slots[slot] = [T::default(); 3];
                    self.free.insert(slot);
                    true
                }
                _ => false,
            })
            .collect()
    }

    /// Remove rows and compact in one pass. Returns the number of rows removed.
    pub fn remove_and_compact(&mut self, indices: &[usize]) -> usize {
        let doomed: BTreeSet<usize> =
            indices.iter().copied().filter(|&i| self.in_range(i)).collect();
        let kept = self
            .iter()
            .enumerate()
            .filter(|(i, _)| !doomed.contains(i))
            .map(|(_, t)| t)
            .collect();
        self.replace_storage(kept);
        doomed.len()
    }

    /// Compact, then add `triples` at the end.
    pub fn append_and_compact<I>(&mut self, triples: I)
    where
        I: IntoIterator<Item = [T; 3]>,
    {
        let mut rows = self.to_vec();
        rows.extend(triples);
        self.replace_storage(rows);
    }

    /// Compact, then add the live rows of every buffer in `others`.
    pub fn merge(&mut self, others: &[&GeometryBuffer<T>]) {
        let mut rows = self.to_vec();
        for other in others {
            rows.extend(other.iter());
        }
        self.replace_storage(rows);
    }

    /// Discard tombstones and rebuild the index if there is one.
    /// Returns `false` if the buffer was already compact.
    pub fn optimize(&mut self) -> bool {
        if self.is_optimal() {
            return false;
        }
        let rows = self.to_vec();
        self.replace_storage(rows);
        true
    }

    /// Rewrite every live row in place.
    pub fn map_in_place<F>(&mut self, mut f: F)
    where
        F: FnMut([T; 3]) -> [T; 3],
    {
        for (slot, row) in self.slots.iter_mut().enumerate() {
            if !self.free.contains(&slot) {
                *row = f(*row);
            }
        }
        if self.index.is_some() {
            self.build_index();
        }
    }

    fn replace_storage(&mut self, rows: Vec<[T; 3]>) {
        self.slots = rows;
        self.free.clear();
        if self.index.is_some() {
            self.build_index();
        }
    }

    pub fn build_index(&mut self) {
        let mut index = ValueIndex::new();
        for (slot, row) in self.slots.iter().enumerate() {
            if self.free.contains(&slot) {
                continue;
            }
            for &value in row {
                index.insert(value, slot);
            }
        }
        self.index = Some(index);
    }

    pub fn remove_index(&mut self) {
        self.index = None;
    }

    pub fn is_indexed(&self) -> bool {
        self.index.is_some()
    }

    /// Ascending external indices of rows holding `value` in any column.
    /// Uses the index when built, a linear scan otherwise.
    pub fn locate(&self, value: T) -> Vec<usize> {
        match &self.index {
            Some(ix) => ix
                .positions(value)
                .map(|slots| slots.iter().map(|&s| self.external_of(s)).collect())
                .unwrap_or_default(),
            None => self
                .iter()
                .enumerate()
                .filter(|(_, row)| row.contains(&value))
                .map(|(i, _)| i)
                .collect(),
        }
    }

    pub fn contains(&self, value: T) -> bool {
        match &self.index {
            Some(ix) => ix.contains(value),
            None => self.iter().any(|row| row.contains(&value)),
        }
    }

    /// Live rows in external-index order.
    pub fn iter(&self) -> TripleIter<'_, T> {
        TripleIter::new(&self.slots, &self.free)
    }

    /// Live rows paired with their external index.
    pub fn iter_indexed(&self) -> std::iter::Enumerate<TripleIter<'_, T>> {
        self.iter().enumerate()
    }

    pub fn to_vec(&self) -> Vec<[T; 3]> {
        self.iter().collect()
    }

    pub fn to_flat(&self) -> Vec<T> {
        self.iter().flatten().collect()
    }
}

impl<T: Scalar> FromIterator<[T; 3]> for GeometryBuffer<T> {
    fn from_iter<I: IntoIterator<Item = [T; 3]>>(iter: I) -> Self {
        Self::from_triples(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> GeometryBuffer<f64> {
        GeometryBuffer::from_triples(vec![
            [0.0, 1.0, 2.0],
            [3.0, 4.0, 5.0],
            [6.0, 7.0, 8.0],
            [9.0, 10.0, 11.0],
        ])
    }

    #[test]
    fn test_from_flat_requires_triples() {
        assert!(GeometryBuffer::<usize>::from_flat(&[1, 2, 3, 4]).is_err());
        let buffer = GeometryBuffer::<usize>::from_flat(&[1, 2, 3, 4, 5, 6]).unwrap();
        assert_eq!(buffer.len(), 2);
        assert_eq!(buffer.get(1), Some([4, 5, 6]));
    }

    #[test]
    fn test_get_out_of_range() {
        let buffer = sample();
        assert_eq!(buffer.get(4), None);
        assert_eq!(
            buffer.get_many(&[3, 4, 0]),
            vec![Some([9.0, 10.0, 11.0]), None, Some([0.0, 1.0, 2.0])]
        );
        assert!(matches!(
            buffer.triple(9),
            Err(VoxError::OutOfRange { index: 9, len: 4 })
        ));
    }

    #[test]
    fn test_remove_keeps_indices_gap_free() {
        let mut buffer = sample();
        assert_eq!(buffer.remove(&[1]), vec![true]);
        assert_eq!(buffer.len(), 3);
        assert_eq!(buffer.get(1), Some([6.0, 7.0, 8.0]));
        assert_eq!(buffer.get(2), Some([9.0, 10.0, 11.0]));
        assert_eq!(buffer.get(3), None);
        assert!(!buffer.is_optimal());
    }

    #[test]
    fn test_remove_uses_original_indices() {
        let mut buffer = sample();
        assert_eq!(buffer.remove(&[0, 2, 2, 7]), vec![true, true, false, false]);
        assert_eq!(buffer.to_vec(), vec![[3.0, 4.0, 5.0], [9.0, 10.0, 11.0]]);
    }

    #[test]
    fn test_append_fills_tombstones_first() {
        let mut buffer = sample();
        buffer.remove(&[1]);
        let used = buffer.append([[42.0, 52.0, 62.0], [1.0, 1.0, 1.0]]);
        assert_eq!(used, vec![1, 4]);
        assert_eq!(buffer.get(1), Some([42.0, 52.0, 62.0]));
        assert_eq!(buffer.get(4), Some([1.0, 1.0, 1.0]));
        assert!(buffer.is_optimal());
    }

    #[test]
    fn test_append_into_several_tombstones() {
        let mut buffer = sample();
        buffer.remove(&[0, 2]);
        let used = buffer.append([[-1.0, -1.0, -1.0]]);
        assert_eq!(used, vec![0]);
        assert_eq!(buffer.len(), 3);
        assert_eq!(buffer.get(0), Some([-1.0, -1.0, -1.0]));
        assert_eq!(buffer.get(1), Some([3.0, 4.0, 5.0]));
    }

    #[test]
    fn test_optimize() {
        let mut buffer = sample();
        buffer.build_index();
        assert!(!buffer.optimize());
        buffer.remove(&[0, 3]);
        assert!(buffer.optimize());
        assert!(buffer.is_optimal());
        assert_eq!(buffer.to_vec(), vec![[3.0, 4.0, 5.0], [6.0, 7.0, 8.0]]);
        assert_eq!(buffer.locate(7.0), vec![1]);
        assert!(!buffer.contains(0.0));
    }

    #[test]
    fn test_index_follows_updates() {
        let mut buffer = sample();
        buffer.build_index();
        assert!(buffer.update(2, [100.0, 7.0, 200.0]));
        assert_eq!(buffer.locate(100.0), vec![2]);
        assert_eq!(buffer.locate(7.0), vec![2]);
        assert!(buffer.locate(6.0).is_empty());
        assert!(!buffer.update(10, [0.0, 0.0, 0.0]));
        assert!(buffer.set(10, [0.0, 0.0, 0.0]).is_err());
    }

    #[test]
    fn test_index_reports_external_indices_after_remove() {
        let mut buffer = sample();
        buffer.build_index();
        buffer.remove(&[0]);
        assert_eq!(buffer.locate(10.0), vec![2]);
        assert!(buffer.locate(1.0).is_empty());
    }

    #[test]
    fn test_linear_fallback_matches_index() {
        let mut buffer = GeometryBuffer::from_triples(vec![[1usize, 2, 3], [3, 4, 5], [5, 6, 1]]);
        let linear = buffer.locate(3);
        buffer.build_index();
        assert_eq!(linear, vec![0, 1]);
        assert_eq!(buffer.locate(3), linear);
        assert_eq!(buffer.locate(1), vec![0, 2]);
    }

    #[test]
    fn test_remove_and_compact() {
        let mut buffer = sample();
        buffer.build_index();
        assert_eq!(buffer.remove_and_compact(&[1, 3, 12]), 2);
        assert!(buffer.is_optimal());
        assert_eq!(buffer.to_vec(), vec![[0.0, 1.0, 2.0], [6.0, 7.0, 8.0]]);
        assert_eq!(buffer.locate(8.0), vec![1]);
    }

    #[test]
    fn test_merge_and_append_and_compact() {
        let mut a = GeometryBuffer::from_triples(vec![[0usize, 1, 2]]);
        let b = GeometryBuffer::from_triples(vec![[3usize, 4, 5], [6, 7, 8]]);
        a.merge(&[&b]);
        assert_eq!(a.len(), 3);
        a.remove(&[0]);
        a.append_and_compact([[9, 9, 9]]);
        assert!(a.is_optimal());
        assert_eq!(a.to_flat(), vec![3, 4, 5, 6, 7, 8, 9, 9, 9]);
    }

    #[test]
    fn test_map_in_place_reindexes() {
        let mut buffer = GeometryBuffer::from_triples(vec![[1usize, 2, 3], [4, 5, 6]]);
        buffer.build_index();
        buffer.map_in_place(|[a, b, c]| [a * 10, b * 10, c * 10]);
        assert_eq!(buffer.locate(50), vec![1]);
        assert!(buffer.locate(5).is_empty());
    }
}
