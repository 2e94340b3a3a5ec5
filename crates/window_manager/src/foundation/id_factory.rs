//! Recycling identifier allocator

/// Issues `u64` identifiers, reusing released ones before minting new ones.
///
/// Released ids are handed out again most-recent-first. Fresh ids count up
/// from zero.
///
/// The caller must only [`free`](Self::free) an id it currently holds. Freeing
/// an id twice, or one that was never issued, hands the same value to two
/// owners later on. Debug builds catch double frees; release builds do not
/// check.
#[derive(Debug, Default)]
pub struct IdFactory {
    next: u64,
    free_ids: Vec<u64>,
}

impl IdFactory {
    /// Create an empty factory whose first id is 0
    pub const fn new() -> Self {
        Self {
            next: 0,
            free_ids: Vec::new(),
        }
    }

    /// Allocate an id
    pub fn new_id(&mut self) -> u64 {
        if let Some(id) = self.free_ids.pop() {
            return id;
        }
        let id = self.next;
        self.next += 1;
        id
    }

    /// Return an id for reuse
    pub fn free(&mut self, id: u64) {
        debug_assert!(id < self.next, "freeing id {id} that was never issued");
        debug_assert!(!self.free_ids.contains(&id), "id {id} freed twice");
        self.free_ids.push(id);
    }

    /// Number of ids waiting to be reused
    pub fn free_count(&self) -> usize {
        self.free_ids.len()
    }
}
