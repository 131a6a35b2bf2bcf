#![forbid(unsafe_code)]

//! Rotation memory: elements already used as stimuli in the current cycle.
//!
//! An append-only list. Entries are not deduplicated, so an element
//! decorated on every refresh appears once per refresh; only a rotation
//! step that runs out of fresh candidates clears it.
//!
//! Alongside the full list a distinct view is kept in first-use order. Scans
//! exclude against that view, so exclusion cost is bounded by the number of
//! distinct elements used this cycle rather than by the number of refreshes.

/// Ordered multiset of previously decorated elements.
#[derive(Debug, Clone, PartialEq)]
pub struct RotationMemory<E> {
    used: Vec<E>,
    distinct: Vec<E>,
}

impl<E> Default for RotationMemory<E> {
    fn default() -> Self {
        Self {
            used: Vec::new(),
            distinct: Vec::new(),
        }
    }
}

impl<E: Clone + PartialEq> RotationMemory<E> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `elements` in order.
    pub fn record(&mut self, elements: &[E]) {
        self.used.extend_from_slice(elements);
        for element in elements {
            if !self.distinct.contains(element) {
                self.distinct.push(element.clone());
            }
        }
    }

    /// Start a new cycle.
    pub fn reset(&mut self) {
        self.used.clear();
        self.distinct.clear();
    }

    /// The accumulated list, repeats included.
    #[must_use]
    pub fn snapshot(&self) -> &[E] {
        &self.used
    }

    /// Each used element once, in first-use order. This is the scan
    /// exclusion.
    #[must_use]
    pub fn distinct(&self) -> &[E] {
        &self.distinct
    }

    #[must_use]
    pub fn contains(&self, element: &E) -> bool {
        self.distinct.contains(element)
    }

    /// Number of entries, counting repeats.
    #[must_use]
    pub fn len(&self) -> usize {
        self.used.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.used.is_empty()
    }
}
