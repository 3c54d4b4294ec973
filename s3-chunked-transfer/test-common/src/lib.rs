/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::io::Write;

use bytes::Bytes;
use tempfile::NamedTempFile;

/// 1 KiB
pub const KIB: usize = 1024;

/// 1 MiB
pub const MIB: usize = 1024 * KIB;

/// Generate `size` bytes of pseudo-random data.
///
/// The same `seed` always produces the same data so failures are reproducible.
pub fn random_bytes(size: usize, seed: u64) -> Bytes {
    let mut rng = fastrand::Rng::with_seed(seed);
    let mut data = vec![0u8; size];
    rng.fill(&mut data);
    Bytes::from(data)
}

/// Create a temporary file of `size` bytes and return it along with its content.
///
/// The file is removed when the returned handle is dropped.
pub fn create_test_file(size: usize, seed: u64) -> (NamedTempFile, Bytes) {
    let content = random_bytes(size, seed);
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(&content).unwrap();
    file.flush().unwrap();
    (file, content)
}
