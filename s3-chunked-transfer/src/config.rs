/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::sync::Arc;

use crate::error::{self, Error};
use crate::store::{ObjectStore, S3ObjectStore};
use crate::types::FailedMultipartUploadPolicy;
use crate::{DEFAULT_CHUNK_SIZE, DEFAULT_PART_SIZE};

/// Load configuration for an S3-compatible endpoint
pub mod loader;

/// Configuration for a [`Client`](crate::client::Client)
#[derive(Debug, Clone)]
pub struct Config {
    chunk_size: u64,
    part_size: u64,
    failed_multipart_upload_policy: FailedMultipartUploadPolicy,
    store: Arc<dyn ObjectStore>,
}

impl Config {
    /// Create a new `Config` builder
    pub fn builder() -> Builder {
        Builder::default()
    }

    /// Number of bytes read from a source at a time
    pub fn chunk_size(&self) -> u64 {
        self.chunk_size
    }

    /// Size a multipart buffer must reach before it is uploaded as a part.
    ///
    /// Also the threshold below which uploads are sent with a single `PutObject` request.
    pub fn part_size(&self) -> u64 {
        self.part_size
    }

    /// Minimum payload size that is sent as a multipart upload.
    ///
    /// Always equal to [`part_size`](Self::part_size).
    pub fn multipart_threshold(&self) -> u64 {
        self.part_size
    }

    /// What to do with a multipart upload that fails after it has been created
    pub fn failed_multipart_upload_policy(&self) -> &FailedMultipartUploadPolicy {
        &self.failed_multipart_upload_policy
    }

    /// The object store requests are sent to
    pub fn store(&self) -> &Arc<dyn ObjectStore> {
        &self.store
    }
}

/// Fluent style builder for [Config]
#[derive(Debug, Clone, Default)]
pub struct Builder {
    chunk_size: Option<u64>,
    part_size: Option<u64>,
    failed_multipart_upload_policy: FailedMultipartUploadPolicy,
    store: Option<Arc<dyn ObjectStore>>,
}

impl Builder {
    /// Number of bytes read from a source at a time.
    ///
    /// Default is 32 KiB.
    pub fn chunk_size(mut self, chunk_size: u64) -> Self {
        self.chunk_size = Some(chunk_size);
        self
    }

    /// Part size and multipart threshold in bytes.
    ///
    /// Payloads smaller than this are sent with a single `PutObject` request. Larger payloads
    /// are sent as a multipart upload whose parts are at least this large, except for the last.
    ///
    /// NOTE: Amazon S3 rejects non-final parts smaller than 5 MiB. Smaller values are accepted
    /// for stores that allow them.
    ///
    /// Default is 5 MiB.
    pub fn part_size(mut self, part_size: u64) -> Self {
        self.part_size = Some(part_size);
        self
    }

    /// Policy applied when a multipart upload fails after it was created.
    ///
    /// Default is [`FailedMultipartUploadPolicy::AbortUpload`].
    pub fn failed_multipart_upload_policy(mut self, policy: FailedMultipartUploadPolicy) -> Self {
        self.failed_multipart_upload_policy = policy;
        self
    }

    /// Set an explicit S3 client to use.
    pub fn client(self, client: aws_sdk_s3::Client) -> Self {
        self.store(S3ObjectStore::new(client))
    }

    /// Set the object store to send requests to.
    pub fn store(mut self, store: impl ObjectStore + 'static) -> Self {
        self.store = Some(Arc::new(store));
        self
    }

    /// Consumes the builder and constructs a [`Config`](crate::config::Config)
    ///
    /// Fails with `InputInvalid` if no store was set or a size is zero.
    pub fn build(self) -> Result<Config, Error> {
        let chunk_size = self.chunk_size.unwrap_or(DEFAULT_CHUNK_SIZE);
        if chunk_size == 0 || usize::try_from(chunk_size).is_err() {
            return Err(error::invalid_input(format!(
                "invalid chunk size {chunk_size}"
            )));
        }

        let part_size = self.part_size.unwrap_or(DEFAULT_PART_SIZE);
        if part_size == 0 || usize::try_from(part_size).is_err() {
            return Err(error::invalid_input(format!("invalid part size {part_size}")));
        }

        let store = self
            .store
            .ok_or_else(|| error::invalid_input("an S3 client or object store must be set"))?;

        Ok(Config {
            chunk_size,
            part_size,
            failed_multipart_upload_policy: self.failed_multipart_upload_policy,
            store,
        })
    }
}
