//! Rolling window of recent samples for one signal
//!
//! The window keeps the last `capacity` values in arrival order. Appending to a
//! full window drops the oldest sample first, so the length never exceeds the
//! capacity.

use std::collections::VecDeque;

/// Number of samples kept per signal unless configured otherwise
pub const DEFAULT_WINDOW_CAPACITY: usize = 20;

/// Fixed-capacity FIFO buffer of numeric samples
#[derive(Debug, Clone, PartialEq)]
pub struct RollingWindow {
    /// Samples in arrival order, oldest at the front
    samples: VecDeque<f64>,
    /// Maximum number of samples retained
    capacity: usize,
}

impl RollingWindow {
    /// Create an empty window holding at most `capacity` samples
    ///
    /// A capacity of zero is raised to one; configuration validation rejects it
    /// before it gets here.
    ///
    /// # Examples
    ///
    /// ```
    /// use skywatch::window::RollingWindow;
    ///
    /// let mut window = RollingWindow::new(2);
    /// window.append(1.0);
    /// window.append(2.0);
    /// window.append(3.0);
    /// assert_eq!(window.snapshot(), vec![2.0, 3.0]);
    /// ```
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a sample, evicting the oldest one when the window is full
    pub fn append(&mut self, value: f64) {
        while self.samples.len() >= self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(value);
    }

    /// Copy of the current samples, oldest first
    pub fn snapshot(&self) -> Vec<f64> {
        self.samples.iter().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_full(&self) -> bool {
        self.samples.len() == self.capacity
    }

    /// Most recently appended sample
    pub fn latest(&self) -> Option<f64> {
        self.samples.back().copied()
    }
}

impl Default for RollingWindow {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_window_is_empty() {
        let window = RollingWindow::new(5);
        assert!(window.is_empty());
        assert_eq!(window.len(), 0);
        assert_eq!(window.capacity(), 5);
        assert_eq!(window.latest(), None);
        assert!(window.snapshot().is_empty());
    }

    #[test]
    fn test_default_capacity() {
        assert_eq!(RollingWindow::default().capacity(), 20);
    }

    #[test]
    fn test_zero_capacity_is_raised_to_one() {
        let mut window = RollingWindow::new(0);
        assert_eq!(window.capacity(), 1);
        window.append(1.0);
        window.append(2.0);
        assert_eq!(window.snapshot(), vec![2.0]);
    }

    #[test]
    fn test_append_preserves_arrival_order() {
        let mut window = RollingWindow::new(5);
        window.append(3.0);
        window.append(1.0);
        window.append(2.0);

        assert_eq!(window.snapshot(), vec![3.0, 1.0, 2.0]);
        assert_eq!(window.latest(), Some(2.0));
        assert!(!window.is_full());
    }

    #[test]
    fn test_oldest_sample_is_evicted_first() {
        let mut window = RollingWindow::new(3);
        for value in [10.0, 20.0, 30.0] {
            window.append(value);
        }
        assert!(window.is_full());

        window.append(40.0);
        assert_eq!(window.snapshot(), vec![20.0, 30.0, 40.0]);

        window.append(50.0);
        assert_eq!(window.snapshot(), vec![30.0, 40.0, 50.0]);
        assert_eq!(window.len(), 3);
    }

    #[test]
    fn test_snapshot_does_not_mutate() {
        let mut window = RollingWindow::new(4);
        window.append(1.0);
        window.append(2.0);

        let mut snapshot = window.snapshot();
        snapshot.push(99.0);

        assert_eq!(window.snapshot(), vec![1.0, 2.0]);
        assert_eq!(window.len(), 2);
    }
}

// Property-based tests
#[cfg(test)]
mod property_tests {
    use super::*;
    use quickcheck_macros::quickcheck;

    // Length never exceeds capacity, whatever the number of appends
    #[quickcheck]
    fn prop_length_bounded_by_capacity(capacity: u8, values: Vec<i32>) -> bool {
        let capacity = (capacity as usize % 32) + 1;
        let mut window = RollingWindow::new(capacity);

        values.iter().all(|&value| {
            window.append(value as f64);
            window.len() <= capacity
        })
    }

    // The window always holds exactly the most recent `capacity` values
    #[quickcheck]
    fn prop_window_keeps_most_recent_values(capacity: u8, values: Vec<i32>) -> bool {
        let capacity = (capacity as usize % 32) + 1;
        let mut window = RollingWindow::new(capacity);
        for &value in &values {
            window.append(value as f64);
        }

        let skip = values.len().saturating_sub(capacity);
        let expected: Vec<f64> = values[skip..].iter().map(|&v| v as f64).collect();
        window.snapshot() == expected
    }
}
