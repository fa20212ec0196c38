//! Observer seam between the acquisition loop and the display layer.

use crate::acquire::data::AcquisitionUpdate;

/// Receives one callback per accepted measurement.
///
/// Observers run synchronously inside the poll cycle that produced the
/// update: a slow observer delays the next cycle instead of losing data, so
/// implementations must not block indefinitely.
pub trait UpdateObserver: Send {
    /// Called after the measurement has been persisted (best effort) and
    /// appended to the series.
    fn on_update(&mut self, update: &AcquisitionUpdate);
}

impl<F> UpdateObserver for F
where
    F: FnMut(&AcquisitionUpdate) + Send,
{
    fn on_update(&mut self, update: &AcquisitionUpdate) {
        self(update)
    }
}
