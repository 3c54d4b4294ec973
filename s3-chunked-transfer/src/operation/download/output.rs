/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

/// Output from downloading an object to a local file
#[non_exhaustive]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DownloadOutput {
    pub(crate) bytes_written: u64,
    pub(crate) e_tag: Option<String>,
}

impl DownloadOutput {
    /// Number of bytes written to the destination
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    /// Entity tag of the downloaded object
    pub fn e_tag(&self) -> Option<&str> {
        self.e_tag.as_deref()
    }
}
