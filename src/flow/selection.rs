//! Bounded, ordered label selection with toggle semantics.

use serde::{Deserialize, Serialize};

/// What a toggle did to the selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    Added,
    Removed,
    /// The cap was hit; the selection is unchanged. Non-fatal, surfaced to
    /// the user as a message.
    LimitReached,
}

/// An ordered set of labels with a maximum cardinality.
///
/// Insertion order is kept for display; it carries no other meaning.
/// Duplicates are never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionSet {
    items: Vec<String>,
    limit: usize,
}

impl SelectionSet {
    pub fn new(limit: usize) -> Self {
        SelectionSet {
            items: Vec::new(),
            limit,
        }
    }

    /// Build from stored labels, dropping duplicates and anything past the cap.
    pub fn with_items(items: impl IntoIterator<Item = String>, limit: usize) -> Self {
        let mut selection = SelectionSet::new(limit);
        for item in items {
            if selection.items.len() == limit {
                break;
            }
            if !selection.contains(&item) {
                selection.items.push(item);
            }
        }
        selection
    }

    /// Remove the item if present (never limit-checked, order of the rest
    /// preserved); otherwise add it unless the cap is reached.
    pub fn toggle(&mut self, item: &str) -> ToggleOutcome {
        if let Some(position) = self.items.iter().position(|existing| existing == item) {
            self.items.remove(position);
            return ToggleOutcome::Removed;
        }
        if self.items.len() == self.limit {
            return ToggleOutcome::LimitReached;
        }
        self.items.push(item.to_string());
        ToggleOutcome::Added
    }

    pub fn contains(&self, item: &str) -> bool {
        self.items.iter().any(|existing| existing == item)
    }

    pub fn items(&self) -> &[String] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.items.len() == self.limit
    }

    pub fn limit(&self) -> usize {
        self.limit
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn selection_of(items: &[&str], limit: usize) -> SelectionSet {
        SelectionSet::with_items(items.iter().map(|s| s.to_string()), limit)
    }

    #[test]
    fn toggle_adds_while_below_the_cap() {
        let mut selection = selection_of(&["hiking", "jazz"], 5);
        assert_eq!(selection.toggle("baking"), ToggleOutcome::Added);
        assert_eq!(selection.len(), 3);
        assert!(selection.contains("baking"));
    }

    #[test]
    fn toggle_at_the_cap_leaves_the_selection_unchanged() {
        let mut selection = selection_of(&["a", "b", "c", "d", "e"], 5);
        let before = selection.clone();

        assert_eq!(selection.toggle("f"), ToggleOutcome::LimitReached);
        assert_eq!(selection, before);
    }

    #[test]
    fn toggle_removes_even_at_the_cap() {
        let mut selection = selection_of(&["a", "b", "c"], 3);
        assert_eq!(selection.toggle("b"), ToggleOutcome::Removed);
        assert_eq!(selection.items(), ["a", "c"]);
    }

    #[test]
    fn removal_preserves_the_order_of_the_rest() {
        let mut selection = selection_of(&["a", "b", "c", "d"], 5);
        selection.toggle("b");
        assert_eq!(selection.items(), ["a", "c", "d"]);
    }

    #[test]
    fn toggle_twice_restores_membership() {
        let mut selection = selection_of(&["a", "b", "c"], 5);
        selection.toggle("b");
        selection.toggle("b");
        assert!(selection.contains("b"));
        assert_eq!(selection.len(), 3);
    }

    #[test]
    fn with_items_drops_duplicates_and_truncates_to_the_cap() {
        let selection = selection_of(&["a", "a", "b", "c", "d"], 3);
        assert_eq!(selection.items(), ["a", "b", "c"]);
        assert!(selection.is_full());
    }
}
