//! Handle allocation for breakpoints and watchpoints.

use std::collections::BTreeMap;

/// Sentinel handle meaning "unsupported" or "allocation failed".
pub const NULL_HANDLE: u32 = 0;

/// Active entries keyed by small non-zero handles.
///
/// Handles come from a wrapping counter that skips [`NULL_HANDLE`] and every
/// handle still in use, so no two active entries share one. An entry stays
/// active until [`HandleRegistry::remove`] is called with its handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandleRegistry<T> {
    entries: BTreeMap<u32, T>,
    next: u32,
    capacity: usize,
}

impl<T> HandleRegistry<T> {
    /// Creates an empty registry holding at most `capacity` entries.
    #[must_use]
    pub const fn new(capacity: usize) -> Self {
        Self {
            entries: BTreeMap::new(),
            next: 1,
            capacity,
        }
    }

    /// Stores `value` and returns its handle, or [`NULL_HANDLE`] when full.
    pub fn allocate(&mut self, value: T) -> u32 {
        if self.entries.len() >= self.capacity {
            return NULL_HANDLE;
        }
        let mut handle = self.next;
        while handle == NULL_HANDLE || self.entries.contains_key(&handle) {
            handle = handle.wrapping_add(1);
        }
        self.next = handle.wrapping_add(1);
        self.entries.insert(handle, value);
        handle
    }

    /// Releases `handle`, returning its entry if it was active.
    pub fn remove(&mut self, handle: u32) -> Option<T> {
        self.entries.remove(&handle)
    }

    /// Entry for `handle`, if active.
    #[must_use]
    pub fn get(&self, handle: u32) -> Option<&T> {
        self.entries.get(&handle)
    }

    /// First active entry (in handle order) satisfying `predicate`.
    pub fn find(&self, mut predicate: impl FnMut(&T) -> bool) -> Option<u32> {
        self.entries
            .iter()
            .find_map(|(&handle, value)| predicate(value).then_some(handle))
    }

    /// Active `(handle, entry)` pairs in handle order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, &T)> {
        self.entries.iter().map(|(&handle, value)| (handle, value))
    }

    /// Number of active entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no entries are active.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Maximum simultaneously active entries.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::{HandleRegistry, NULL_HANDLE};
    use proptest::prelude::*;

    #[test]
    fn handles_start_at_one_and_never_repeat_while_active() {
        let mut registry = HandleRegistry::new(4);
        let a = registry.allocate(0x8000u16);
        let b = registry.allocate(0x8001u16);
        assert_eq!(a, 1);
        assert_eq!(b, 2);
        assert_eq!(registry.remove(a), Some(0x8000));
        let c = registry.allocate(0x8002);
        assert_ne!(c, b);
        assert_ne!(c, NULL_HANDLE);
    }

    #[test]
    fn full_registry_returns_null_handle() {
        let mut registry = HandleRegistry::new(1);
        assert_ne!(registry.allocate(()), NULL_HANDLE);
        assert_eq!(registry.allocate(()), NULL_HANDLE);
    }

    #[test]
    fn zero_capacity_never_allocates() {
        let mut registry: HandleRegistry<u16> = HandleRegistry::new(0);
        assert_eq!(registry.allocate(1), NULL_HANDLE);
    }

    #[test]
    fn counter_wraps_past_zero() {
        let mut registry = HandleRegistry {
            entries: std::collections::BTreeMap::new(),
            next: u32::MAX,
            capacity: 4,
        };
        assert_eq!(registry.allocate('a'), u32::MAX);
        assert_eq!(registry.allocate('b'), 1);
    }

    #[test]
    fn find_matches_in_handle_order() {
        let mut registry = HandleRegistry::new(8);
        registry.allocate(10u16);
        let second = registry.allocate(20u16);
        registry.allocate(20u16);
        assert_eq!(registry.find(|&addr| addr == 20), Some(second));
        assert_eq!(registry.find(|&addr| addr == 30), None);
    }

    proptest! {
        #[test]
        fn active_handles_are_unique_and_nonzero(ops in proptest::collection::vec(any::<Option<u8>>(), 1..200)) {
            let mut registry = HandleRegistry::new(16);
            let mut active: Vec<u32> = Vec::new();
            for op in ops {
                match op {
                    Some(value) => {
                        let handle = registry.allocate(value);
                        if handle != NULL_HANDLE {
                            prop_assert!(!active.contains(&handle));
                            active.push(handle);
                        } else {
                            prop_assert_eq!(active.len(), 16);
                        }
                    }
                    None => {
                        if let Some(handle) = active.pop() {
                            prop_assert!(registry.remove(handle).is_some());
                        }
                    }
                }
                prop_assert_eq!(registry.len(), active.len());
            }
        }
    }
}
