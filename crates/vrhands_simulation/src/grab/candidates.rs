//! Candidate Set: grabbable объекты, которых сейчас касаются grab volumes
//!
//! Reference counting: у одного grabbable может быть несколько коллайдеров,
//! каждый даёт свой enter/exit. Объект остаётся кандидатом пока net count > 0.
//!
//! BTreeMap (а не HashMap): порядок обхода детерминирован → tie-break при
//! равных дистанциях одинаковый между прогонами.

use std::collections::BTreeMap;

#[derive(Debug, Clone)]
pub struct GrabCandidates<K> {
    counts: BTreeMap<K, u32>,
}

impl<K> Default for GrabCandidates<K> {
    fn default() -> Self {
        Self {
            counts: BTreeMap::new(),
        }
    }
}

impl<K: Copy + Ord> GrabCandidates<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overlap begin: count += 1 (новая запись с 1)
    pub fn enter(&mut self, key: K) -> u32 {
        let count = self.counts.entry(key).or_insert(0);
        *count += 1;
        *count
    }

    /// Overlap end: count -= 1, удаление на нуле.
    ///
    /// Exit для неизвестного объекта: no-op, возвращает `None`.
    pub fn exit(&mut self, key: K) -> Option<u32> {
        let count = self.counts.get_mut(&key)?;
        if *count > 1 {
            *count -= 1;
            Some(*count)
        } else {
            self.counts.remove(&key);
            Some(0)
        }
    }

    pub fn count(&self, key: K) -> u32 {
        self.counts.get(&key).copied().unwrap_or(0)
    }

    pub fn contains(&self, key: K) -> bool {
        self.counts.contains_key(&key)
    }

    pub fn iter(&self) -> impl Iterator<Item = K> + '_ {
        self.counts.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn clear(&mut self) {
        self.counts.clear();
    }
}
