//! Signal sources
//!
//! A source produces the latest value of one signal per call. Failures never
//! reach the caller: they are logged by the source and reported as
//! [`FetchOutcome::NoData`].

/// NOAA Space Weather Prediction Center feeds
pub mod noaa;

/// Scripted in-memory source
pub mod mock;

use crate::signals::{FetchOutcome, SignalType};
use std::future::Future;
use std::pin::Pin;

pub use mock::MockSource;
pub use noaa::NoaaSource;

/// Capability to fetch the latest reading of one signal
pub trait SignalSource: Send + Sync {
    /// The signal this source produces
    fn signal(&self) -> SignalType;

    /// Fetch the latest reading, or `NoData` on any transport or parse failure
    fn fetch<'a>(&'a self) -> Pin<Box<dyn Future<Output = FetchOutcome> + Send + 'a>>;
}
