// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Collection options.

use std::time::Duration;

/// Default interval between two fault-revalidation passes.
pub const DEFAULT_POLLING_INTERVAL: Duration = Duration::from_millis(10_000);

/// Options of an [`EquipmentCollection`](super::EquipmentCollection).
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use circuit_sync::collection::CollectionOptions;
///
/// let options = CollectionOptions::default().with_polling_interval(Duration::from_secs(30));
/// assert_eq!(options.polling_interval(), Duration::from_secs(30));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollectionOptions {
    polling_interval: Duration,
}

impl CollectionOptions {
    /// Creates options with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the interval between two revalidation passes.
    ///
    /// A zero interval is raised to one millisecond so the poll loop never
    /// spins.
    #[must_use]
    pub fn with_polling_interval(mut self, interval: Duration) -> Self {
        self.polling_interval = interval.max(Duration::from_millis(1));
        self
    }

    /// Returns the interval between two revalidation passes.
    #[must_use]
    pub fn polling_interval(&self) -> Duration {
        self.polling_interval
    }
}

impl Default for CollectionOptions {
    fn default() -> Self {
        Self {
            polling_interval: DEFAULT_POLLING_INTERVAL,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_interval_is_ten_seconds() {
        assert_eq!(CollectionOptions::new().polling_interval(), Duration::from_secs(10));
    }

    #[test]
    fn zero_interval_is_raised() {
        let options = CollectionOptions::new().with_polling_interval(Duration::ZERO);
        assert_eq!(options.polling_interval(), Duration::from_millis(1));
    }
}
