//! Session-local watched history.

use std::collections::HashSet;

use crate::ids::ContentId;

/// Ordered, append-only list of content visited during one session.
///
/// Used only as the exclusion set for the next feed fetch. Never truncated
/// while the session lives and never holds the same id twice.
#[derive(Debug, Clone, Default)]
pub struct SessionHistory {
    order: Vec<ContentId>,
    seen: HashSet<ContentId>,
}

impl SessionHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `id` unless it is already present. Returns whether it was added.
    pub fn record(&mut self, id: ContentId) -> bool {
        if !self.seen.insert(id) {
            return false;
        }
        self.order.push(id);
        true
    }

    pub fn contains(&self, id: ContentId) -> bool {
        self.seen.contains(&id)
    }

    pub fn ids(&self) -> &[ContentId] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_first_visit_order_without_duplicates() {
        let mut history = SessionHistory::new();
        assert!(history.record(ContentId::from_raw(3)));
        assert!(history.record(ContentId::from_raw(1)));
        assert!(!history.record(ContentId::from_raw(3)));

        assert_eq!(history.ids(), &[ContentId::from_raw(3), ContentId::from_raw(1)]);
        assert_eq!(history.len(), 2);
        assert!(history.contains(ContentId::from_raw(1)));
    }
}
