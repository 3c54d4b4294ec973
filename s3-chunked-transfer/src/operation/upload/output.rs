/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use crate::types::{CompletedPart, TransferStrategy};

/// Common response fields for uploading an object
#[non_exhaustive]
#[derive(Debug, Clone)]
pub struct UploadOutput {
    pub(crate) strategy: TransferStrategy,
    pub(crate) e_tag: Option<String>,
    pub(crate) upload_id: Option<String>,
    pub(crate) location: Option<String>,
    pub(crate) parts: Vec<CompletedPart>,
    pub(crate) bytes_transferred: u64,
}

impl UploadOutput {
    /// How the payload was sent
    pub fn strategy(&self) -> TransferStrategy {
        self.strategy
    }

    /// Entity tag of the stored object
    pub fn e_tag(&self) -> Option<&str> {
        self.e_tag.as_deref()
    }

    /// ID for the multipart upload, `None` for a direct upload
    pub fn upload_id(&self) -> Option<&str> {
        self.upload_id.as_deref()
    }

    /// Location of the object, when reported by the store
    pub fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }

    /// Parts the object was assembled from, empty for a direct upload
    pub fn parts(&self) -> &[CompletedPart] {
        &self.parts
    }

    /// Number of payload bytes sent to the store
    pub fn bytes_transferred(&self) -> u64 {
        self.bytes_transferred
    }
}
