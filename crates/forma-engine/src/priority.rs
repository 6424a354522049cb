//! Priority-ordered entry list shared by every registry.

/// Entries ordered by descending priority, ties in registration order.
#[derive(Debug)]
pub struct PriorityList<T: ?Sized> {
    entries: Vec<(i32, Box<T>)>,
}

impl<T: ?Sized> PriorityList<T> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Insert after every entry with a priority greater than or equal to
    /// `priority`.
    pub fn insert(&mut self, entry: Box<T>, priority: i32) {
        let at = self
            .entries
            .iter()
            .position(|(p, _)| *p < priority)
            .unwrap_or(self.entries.len());
        self.entries.insert(at, (priority, entry));
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.entries.iter().map(|(_, e)| e.as_ref())
    }

    pub fn iter_with_priority(&self) -> impl Iterator<Item = (i32, &T)> {
        self.entries.iter().map(|(p, e)| (*p, e.as_ref()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<T: ?Sized> Default for PriorityList<T> {
    fn default() -> Self {
        Self::new()
    }
}
