use std::collections::VecDeque;

/// Bounded ordered buffer that evicts its oldest entry once full
///
/// Used for the 1000-sample chart history and the 100-sample bot window.
/// `len() <= capacity()` holds after every call.
#[derive(Debug, Clone)]
pub struct RollingWindow<T> {
    data: VecDeque<T>,
    capacity: usize,
}

impl<T: Clone> RollingWindow<T> {
    /// Create a new window
    ///
    /// # Arguments
    /// * `capacity` - Maximum number of entries kept (0 is treated as 1)
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            data: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a value, dropping the oldest if the window overflows
    pub fn push(&mut self, value: T) {
        self.data.push_back(value);

        while self.data.len() > self.capacity {
            self.data.pop_front();
        }
    }

    /// Ordered copy of the current contents, oldest first
    pub fn snapshot(&self) -> Vec<T> {
        self.data.iter().cloned().collect()
    }

    /// The `n` most recent entries, oldest first
    pub fn recent(&self, n: usize) -> Vec<T> {
        let skip = self.data.len().saturating_sub(n);
        self.data.iter().skip(skip).cloned().collect()
    }

    pub fn last(&self) -> Option<&T> {
        self.data.back()
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.data.iter()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.data.clear();
    }
}
