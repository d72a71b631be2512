use crate::constants::RECENT_SEARCHES_CAPACITY;
use crate::models::PlaceResult;

/// Most-recently-used list of places the user picked from search.
#[derive(Debug, Clone)]
pub struct RecentSearches {
    entries: Vec<PlaceResult>,
    capacity: usize,
}

impl Default for RecentSearches {
    fn default() -> Self {
        RecentSearches::with_capacity(RECENT_SEARCHES_CAPACITY)
    }
}

impl RecentSearches {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        RecentSearches {
            entries: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Put `place` first, dropping any older entry with the same id.
    pub fn push(&mut self, place: PlaceResult) {
        self.entries.retain(|existing| existing.id != place.id);
        self.entries.insert(0, place);
        self.entries.truncate(self.capacity);
    }

    pub fn entries(&self) -> &[PlaceResult] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
