use crate::signals::{FetchOutcome, Reading, SignalType};
use crate::sources::SignalSource;
use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

/// Scripted source for testing and development
///
/// Each call to `fetch()` pops the next scripted value; `None` entries and an
/// exhausted script both produce `NoData`.
pub struct MockSource {
    signal: SignalType,
    script: Arc<Mutex<VecDeque<Option<f64>>>>,
    call_count: Arc<Mutex<usize>>,
}

impl MockSource {
    /// Create a source that replays `values` in order
    ///
    /// # Example
    /// ```
    /// use skywatch::signals::SignalType;
    /// use skywatch::sources::MockSource;
    ///
    /// let source = MockSource::scripted(SignalType::SolarWind, [Some(300.0), None, Some(310.0)]);
    /// ```
    pub fn scripted(signal: SignalType, values: impl IntoIterator<Item = Option<f64>>) -> Self {
        Self {
            signal,
            script: Arc::new(Mutex::new(values.into_iter().collect())),
            call_count: Arc::new(Mutex::new(0)),
        }
    }

    /// Create a source that replays `values`, all of them present
    pub fn with_values(signal: SignalType, values: impl IntoIterator<Item = f64>) -> Self {
        Self::scripted(signal, values.into_iter().map(Some))
    }

    /// Create a source that never has data
    pub fn no_data(signal: SignalType) -> Self {
        Self::scripted(signal, std::iter::empty())
    }

    /// Number of times `fetch()` has been called
    pub fn call_count(&self) -> usize {
        *self.call_count.lock().unwrap()
    }

    /// Scripted values not yet consumed
    pub fn remaining(&self) -> usize {
        self.script.lock().unwrap().len()
    }
}

impl SignalSource for MockSource {
    fn signal(&self) -> SignalType {
        self.signal
    }

    fn fetch<'a>(&'a self) -> Pin<Box<dyn Future<Output = FetchOutcome> + Send + 'a>> {
        Box::pin(async move {
            *self.call_count.lock().unwrap() += 1;

            let next = self.script.lock().unwrap().pop_front().flatten();
            match next {
                Some(value) => {
                    FetchOutcome::Data(Reading::new(self.signal, value, self.signal.unit()))
                }
                None => FetchOutcome::NoData,
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_source_replays_script() {
        let source = MockSource::scripted(SignalType::SolarWind, [Some(300.0), None, Some(310.0)]);

        match source.fetch().await {
            FetchOutcome::Data(reading) => {
                assert_eq!(reading.value, 300.0);
                assert_eq!(reading.unit, "km/s");
            }
            FetchOutcome::NoData => panic!("expected data"),
        }
        assert_eq!(source.fetch().await, FetchOutcome::NoData);
        assert!(matches!(source.fetch().await, FetchOutcome::Data(r) if r.value == 310.0));

        // Exhausted
        assert_eq!(source.fetch().await, FetchOutcome::NoData);
        assert_eq!(source.call_count(), 4);
        assert_eq!(source.remaining(), 0);
    }

    #[tokio::test]
    async fn test_no_data_source() {
        let source = MockSource::no_data(SignalType::Radiation);
        assert_eq!(source.signal(), SignalType::Radiation);
        assert_eq!(source.fetch().await, FetchOutcome::NoData);
    }
}
