//! `Pool`: free-list-backed slot arena for graph records
//!
//! Nodes, arcs and labels are stored in growable tables addressed by small
//! integer handles. Slot 0 is permanently reserved so that a raw handle of 0
//! can double as the in-band list terminator throughout the graph. Freed
//! slots are threaded into a per-pool free list and reused LIFO; capacity
//! grows by doubling. Handles are stable for the lifetime of the record,
//! backing addresses are not: never hold a reference across an allocation.

/// One table slot: either a live record or a link in the free list.
#[derive(Clone, Debug)]
enum Slot<T> {
    Free { next: u32 },
    Live(T),
}

/// A growable, free-list-backed table of records addressed by `u32` handles.
///
/// Handle 0 is reserved and never returned by [`Pool::allocate`].
#[derive(Clone, Debug)]
pub struct Pool<T> {
    slots: Vec<Slot<T>>,
    free_head: u32,
    live: usize,
}

impl<T: Default> Pool<T> {
    /// Creates a pool with the reserved slot 0 and one free slot, matching
    /// the smallest table the engine ever needs.
    pub fn new() -> Self {
        Pool {
            slots: vec![Slot::Free { next: 0 }, Slot::Free { next: 0 }],
            free_head: 1,
            live: 0,
        }
    }

    /// Number of live records.
    #[inline]
    pub fn len(&self) -> usize {
        self.live
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Total slot count, including slot 0 and freed slots. Useful for sizing
    /// dense visited-marker arrays indexed by raw handle.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Grows the table until at least `n` free slots exist, doubling capacity
    /// each round and threading the new slots into the free list.
    pub fn reserve(&mut self, n: usize) {
        while self.slots.len() - 1 - self.live < n {
            let old_len = self.slots.len();
            let new_len = old_len * 2;
            for i in old_len..new_len {
                let next = if i + 1 < new_len {
                    (i + 1) as u32
                } else {
                    self.free_head
                };
                self.slots.push(Slot::Free { next });
            }
            self.free_head = old_len as u32;
        }
    }

    /// Pops a slot off the free list (growing first if it is empty), places a
    /// default-initialized record there and returns its handle. Never 0.
    pub fn allocate(&mut self) -> u32 {
        if self.free_head == 0 {
            self.reserve(1);
        }
        let handle = self.free_head;
        self.free_head = match self.slots[handle as usize] {
            Slot::Free { next } => next,
            Slot::Live(_) => unreachable!("free list points at a live slot"),
        };
        self.slots[handle as usize] = Slot::Live(T::default());
        self.live += 1;
        handle
    }

    /// Returns `handle`'s slot to the free list. The caller must have cleared
    /// every inbound link to the record beforehand.
    pub fn release(&mut self, handle: u32) {
        debug_assert!(self.contains(handle), "release of a non-live handle");
        self.slots[handle as usize] = Slot::Free {
            next: self.free_head,
        };
        self.free_head = handle;
        self.live -= 1;
    }

    /// Whether `handle` addresses a live record.
    #[inline]
    pub fn contains(&self, handle: u32) -> bool {
        handle != 0
            && matches!(
                self.slots.get(handle as usize),
                Some(Slot::Live(_))
            )
    }

    #[inline]
    pub fn get(&self, handle: u32) -> Option<&T> {
        match self.slots.get(handle as usize) {
            Some(Slot::Live(record)) if handle != 0 => Some(record),
            _ => None,
        }
    }

    #[inline]
    pub fn get_mut(&mut self, handle: u32) -> Option<&mut T> {
        match self.slots.get_mut(handle as usize) {
            Some(Slot::Live(record)) if handle != 0 => Some(record),
            _ => None,
        }
    }

    /// Forward/backward cursor over live handles, skipping freed slots.
    pub fn iter_handles(&self) -> impl DoubleEndedIterator<Item = u32> + '_ {
        (1..self.slots.len() as u32).filter(move |&h| self.contains(h))
    }
}

impl<T: Default> Default for Pool<T> {
    fn default() -> Self {
        Pool::new()
    }
}

impl<T> std::ops::Index<u32> for Pool<T> {
    type Output = T;

    #[inline]
    fn index(&self, handle: u32) -> &T {
        match &self.slots[handle as usize] {
            Slot::Live(record) => record,
            Slot::Free { .. } => panic!("dereference of freed handle {handle}"),
        }
    }
}

impl<T> std::ops::IndexMut<u32> for Pool<T> {
    #[inline]
    fn index_mut(&mut self, handle: u32) -> &mut T {
        match &mut self.slots[handle as usize] {
            Slot::Live(record) => record,
            Slot::Free { .. } => panic!("dereference of freed handle {handle}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocate_never_returns_zero() {
        let mut pool: Pool<u64> = Pool::new();
        for _ in 0..100 {
            assert_ne!(pool.allocate(), 0);
        }
        assert_eq!(pool.len(), 100);
    }

    #[test]
    fn release_then_allocate_reuses_handle() {
        let mut pool: Pool<u64> = Pool::new();
        let a = pool.allocate();
        let b = pool.allocate();
        pool[b] = 42;
        pool.release(a);
        let c = pool.allocate();
        assert_eq!(c, a);
        assert_eq!(pool[c], 0, "reused slot is zero-initialized");
        assert_eq!(pool[b], 42);
    }

    #[test]
    fn growth_preserves_live_records() {
        let mut pool: Pool<u64> = Pool::new();
        let handles: Vec<u32> = (0..64).map(|i| {
            let h = pool.allocate();
            pool[h] = i;
            h
        }).collect();
        for (i, &h) in handles.iter().enumerate() {
            assert_eq!(pool[h], i as u64);
        }
    }

    #[test]
    fn iteration_skips_freed_slots() {
        let mut pool: Pool<u64> = Pool::new();
        let handles: Vec<u32> = (0..8).map(|_| pool.allocate()).collect();
        pool.release(handles[2]);
        pool.release(handles[5]);
        let live: Vec<u32> = pool.iter_handles().collect();
        assert_eq!(live.len(), 6);
        assert!(!live.contains(&handles[2]));
        assert!(!live.contains(&handles[5]));
        let backwards: Vec<u32> = pool.iter_handles().rev().collect();
        assert_eq!(backwards.len(), 6);
        assert_eq!(backwards.first(), live.last());
    }

    #[test]
    fn reserve_threads_free_list() {
        let mut pool: Pool<u64> = Pool::new();
        pool.reserve(16);
        let before = pool.capacity();
        for _ in 0..16 {
            pool.allocate();
        }
        assert_eq!(pool.capacity(), before, "reserve pre-created the slots");
    }

    #[test]
    fn get_rejects_sentinel_and_freed() {
        let mut pool: Pool<u64> = Pool::new();
        let h = pool.allocate();
        assert!(pool.get(0).is_none());
        assert!(pool.get(h).is_some());
        pool.release(h);
        assert!(pool.get(h).is_none());
        assert!(!pool.contains(h));
    }
}
