/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use crate::types::TransferStrategy;

/// Choose how a payload of `total_size` bytes is sent.
///
/// Payloads strictly smaller than `threshold` are sent with a single request, everything else
/// (including a payload of exactly `threshold` bytes) as a multipart upload.
pub fn decide(total_size: u64, threshold: u64) -> TransferStrategy {
    if total_size < threshold {
        TransferStrategy::Direct
    } else {
        TransferStrategy::Multipart
    }
}

#[cfg(test)]
mod tests {
    use super::decide;
    use crate::types::TransferStrategy;

    const MIB: u64 = 1024 * 1024;

    #[test]
    fn test_threshold_boundary() {
        assert_eq!(TransferStrategy::Direct, decide(0, 5 * MIB));
        assert_eq!(TransferStrategy::Direct, decide(5 * MIB - 1, 5 * MIB));
        assert_eq!(TransferStrategy::Multipart, decide(5 * MIB, 5 * MIB));
        assert_eq!(TransferStrategy::Multipart, decide(12 * MIB, 5 * MIB));
    }

    #[test]
    fn test_small_threshold() {
        assert_eq!(TransferStrategy::Direct, decide(0, 1));
        assert_eq!(TransferStrategy::Multipart, decide(1, 1));
    }
}
