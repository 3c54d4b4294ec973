/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

/// The way a payload is sent to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferStrategy {
    /// A single `PutObject` request carrying the whole payload.
    Direct,
    /// A multipart upload made of parts of at least the configured part size
    /// (except for the last one).
    Multipart,
}

/// A part that has been acknowledged by the store as part of a multipart upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletedPart {
    pub(crate) part_number: u64,
    pub(crate) e_tag: Option<String>,
}

impl CompletedPart {
    /// Create a new completed part record
    pub fn new(part_number: u64, e_tag: Option<String>) -> Self {
        Self { part_number, e_tag }
    }

    /// The 1-based part number
    pub fn part_number(&self) -> u64 {
        self.part_number
    }

    /// The entity tag returned by the store for this part
    pub fn e_tag(&self) -> Option<&str> {
        self.e_tag.as_deref()
    }
}

/// Policy for how to handle a failed multipart upload
///
/// Default is to abort the upload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum FailedMultipartUploadPolicy {
    /// Abort the upload on any failure after it has been created
    #[default]
    AbortUpload,
    /// Leave any uploaded parts on the store. The upload ID is logged so it can be cleaned up
    /// or inspected later.
    Retain,
}

/// Describes the result of aborting an in-progress upload.
#[derive(Debug, Default)]
pub struct AbortedUpload {
    pub(crate) upload_id: Option<String>,
}

impl AbortedUpload {
    /// Get the multipart upload ID that was cancelled
    ///
    /// Not present for uploads that did not utilize a multipart upload, or when the
    /// upload was retained on the store.
    pub fn upload_id(&self) -> Option<&str> {
        self.upload_id.as_deref()
    }
}
