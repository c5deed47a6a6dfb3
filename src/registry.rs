//! Per-signal rolling state
//!
//! The registry owns one [`RollingWindow`] per configured signal. It is built
//! once at start-up and handed to the ingestion cycle, which is its only
//! writer.

use crate::signals::SignalType;
use crate::window::RollingWindow;
use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct SignalRegistry {
    windows: HashMap<SignalType, RollingWindow>,
    capacity: usize,
}

impl SignalRegistry {
    /// Create an empty window of `capacity` samples for each signal
    pub fn new(signals: impl IntoIterator<Item = SignalType>, capacity: usize) -> Self {
        let windows = signals
            .into_iter()
            .map(|signal| (signal, RollingWindow::new(capacity)))
            .collect();

        Self { windows, capacity }
    }

    /// Append a value to the signal's window and return the updated snapshot
    ///
    /// Returns `None` for a signal the registry was not built with.
    pub fn append(&mut self, signal: SignalType, value: f64) -> Option<Vec<f64>> {
        let window = self.windows.get_mut(&signal)?;
        window.append(value);
        Some(window.snapshot())
    }

    pub fn window(&self, signal: SignalType) -> Option<&RollingWindow> {
        self.windows.get(&signal)
    }

    /// Number of samples currently held for a signal (0 if unregistered)
    pub fn len_of(&self, signal: SignalType) -> usize {
        self.windows.get(&signal).map_or(0, RollingWindow::len)
    }

    pub fn contains(&self, signal: SignalType) -> bool {
        self.windows.contains_key(&signal)
    }

    /// Registered signals in a stable order
    pub fn signals(&self) -> Vec<SignalType> {
        let mut signals: Vec<SignalType> = self.windows.keys().copied().collect();
        signals.sort();
        signals
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_empty_window_per_signal() {
        let registry = SignalRegistry::new(SignalType::ALL, 20);

        assert_eq!(registry.signals(), SignalType::ALL.to_vec());
        for signal in SignalType::ALL {
            let window = registry.window(signal).unwrap();
            assert!(window.is_empty());
            assert_eq!(window.capacity(), 20);
        }
    }

    #[test]
    fn test_append_only_touches_own_window() {
        let mut registry = SignalRegistry::new(SignalType::ALL, 5);

        let snapshot = registry.append(SignalType::Radiation, 2.5).unwrap();
        assert_eq!(snapshot, vec![2.5]);

        assert_eq!(registry.len_of(SignalType::Radiation), 1);
        assert_eq!(registry.len_of(SignalType::SolarWind), 0);
        assert_eq!(registry.len_of(SignalType::PlanetaryIndex), 0);
    }

    #[test]
    fn test_snapshot_reflects_eviction() {
        let mut registry = SignalRegistry::new([SignalType::SolarWind], 2);
        registry.append(SignalType::SolarWind, 1.0);
        registry.append(SignalType::SolarWind, 2.0);
        let snapshot = registry.append(SignalType::SolarWind, 3.0).unwrap();
        assert_eq!(snapshot, vec![2.0, 3.0]);
    }

    #[test]
    fn test_unregistered_signal_is_refused() {
        let mut registry = SignalRegistry::new([SignalType::SolarWind], 5);
        assert!(registry.append(SignalType::Radiation, 1.0).is_none());
        assert!(!registry.contains(SignalType::Radiation));
        assert_eq!(registry.len_of(SignalType::Radiation), 0);
    }
}
