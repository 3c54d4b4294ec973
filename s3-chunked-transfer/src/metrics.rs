/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::sync::atomic::{AtomicU64, Ordering};

/// Units of measurement
pub mod unit {
    use std::fmt;

    /// Binary byte units
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum ByteUnit {
        /// 1 byte
        Byte,
        /// 2<sup>10</sup> bytes.
        Kibibyte,
        /// 2<sup>20</sup> bytes.
        Mebibyte,
        /// 2<sup>30</sup> bytes.
        Gibibyte,
    }

    impl ByteUnit {
        /// Convert some number of bytes into this unit as an `f64`
        pub fn convert(&self, bytes: u64) -> f64 {
            bytes as f64 / self.as_bytes_u64() as f64
        }

        /// Figure out the best unit to display the given number of bytes in
        /// and return a [`ByteCountDisplayContext`] with the appropriate units set
        pub fn display(total_bytes: u64) -> ByteCountDisplayContext {
            let units = &[ByteUnit::Gibibyte, ByteUnit::Mebibyte, ByteUnit::Kibibyte];
            let unit = units
                .iter()
                .copied()
                .find(|u| total_bytes >= u.as_bytes_u64())
                .unwrap_or(ByteUnit::Byte);
            ByteCountDisplayContext::new(total_bytes, unit)
        }

        /// The number of bytes represented by this unit
        pub const fn as_bytes_u64(&self) -> u64 {
            match self {
                ByteUnit::Byte => 1,
                ByteUnit::Kibibyte => 1 << 10,
                ByteUnit::Mebibyte => 1 << 20,
                ByteUnit::Gibibyte => 1 << 30,
            }
        }

        pub(crate) const fn as_str(&self) -> &'static str {
            match self {
                ByteUnit::Byte => "B",
                ByteUnit::Kibibyte => "KiB",
                ByteUnit::Mebibyte => "MiB",
                ByteUnit::Gibibyte => "GiB",
            }
        }
    }

    impl AsRef<str> for ByteUnit {
        fn as_ref(&self) -> &str {
            self.as_str()
        }
    }

    /// Display context to format a value representing number of bytes in a particular unit
    #[derive(Debug)]
    pub struct ByteCountDisplayContext {
        /// The number of bytes to display
        pub total_bytes: u64,
        /// The precise unit to display the count as
        pub unit: ByteUnit,
    }

    impl ByteCountDisplayContext {
        /// Create a new display context for the number of bytes in a specific unit
        pub fn new(total_bytes: u64, unit: ByteUnit) -> Self {
            Self { total_bytes, unit }
        }
    }

    impl fmt::Display for ByteCountDisplayContext {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            if self.total_bytes % self.unit.as_bytes_u64() == 0 {
                let converted = self.total_bytes / self.unit.as_bytes_u64();
                return write!(f, "{converted} {}", self.unit.as_str());
            }
            let precision = f.precision().unwrap_or(3);
            write!(
                f,
                "{1:.*} {2:}",
                precision,
                self.unit.convert(self.total_bytes),
                self.unit.as_str()
            )
        }
    }
}

#[derive(Debug, Default)]
struct IncreasingCounter(AtomicU64);

impl IncreasingCounter {
    fn increment(&self, amount: u64) {
        self.0.fetch_add(amount, Ordering::Relaxed);
    }

    fn value(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
}

/// Counters aggregated across every transfer started from a client
#[derive(Debug, Default)]
pub struct ClientMetrics {
    transfers_initiated: IncreasingCounter,
    transfers_completed: IncreasingCounter,
    transfers_failed: IncreasingCounter,
    total_bytes_transferred: IncreasingCounter,
    parts_uploaded: IncreasingCounter,
}

impl ClientMetrics {
    /// Create new client metrics
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn increment_transfers_initiated(&self) {
        self.transfers_initiated.increment(1);
    }

    pub(crate) fn increment_transfers_completed(&self) {
        self.transfers_completed.increment(1);
    }

    pub(crate) fn increment_transfers_failed(&self) {
        self.transfers_failed.increment(1);
    }

    pub(crate) fn add_bytes_transferred(&self, bytes: u64) {
        self.total_bytes_transferred.increment(bytes);
    }

    pub(crate) fn increment_parts_uploaded(&self) {
        self.parts_uploaded.increment(1);
    }

    /// Get the number of transfers initiated
    pub fn transfers_initiated(&self) -> u64 {
        self.transfers_initiated.value()
    }

    /// Get the number of transfers completed
    pub fn transfers_completed(&self) -> u64 {
        self.transfers_completed.value()
    }

    /// Get the number of transfers failed
    pub fn transfers_failed(&self) -> u64 {
        self.transfers_failed.value()
    }

    /// Get the total bytes transferred by completed transfers
    pub fn total_bytes_transferred(&self) -> u64 {
        self.total_bytes_transferred.value()
    }

    /// Get the number of multipart upload parts accepted by the store
    pub fn parts_uploaded(&self) -> u64 {
        self.parts_uploaded.value()
    }

    /// Number of transfers that have neither completed nor failed yet
    pub fn active_transfers(&self) -> u64 {
        self.transfers_initiated()
            .saturating_sub(self.transfers_completed() + self.transfers_failed())
    }
}
