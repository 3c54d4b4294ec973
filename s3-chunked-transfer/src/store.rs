/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::stream::{BoxStream, Stream, StreamExt};

use crate::error::BoxError;
use crate::types::CompletedPart;

/// In-memory object store
pub mod in_memory;

/// Amazon S3 (and S3-compatible) object store
pub mod s3;

pub use self::in_memory::InMemoryStore;
pub use self::s3::S3ObjectStore;

/// The network facing object store API driven by transfer operations.
///
/// Implementations only need to forward each call to the store. Sequencing, buffering,
/// part numbering and failure policy are handled by the caller.
#[async_trait]
pub trait ObjectStore: Send + Sync + fmt::Debug {
    /// Store `body` as the object `bucket/key` in a single request
    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: Bytes,
    ) -> Result<PutObjectOutput, StoreError>;

    /// Start a multipart upload for `bucket/key` and return its upload ID
    async fn create_multipart_upload(&self, bucket: &str, key: &str)
        -> Result<String, StoreError>;

    /// Upload one part of an in-progress multipart upload
    async fn upload_part(
        &self,
        bucket: &str,
        key: &str,
        upload_id: &str,
        part_number: u64,
        body: Bytes,
    ) -> Result<CompletedPart, StoreError>;

    /// Assemble the uploaded parts into the final object.
    ///
    /// `parts` is in ascending part number order.
    async fn complete_multipart_upload(
        &self,
        bucket: &str,
        key: &str,
        upload_id: &str,
        parts: &[CompletedPart],
    ) -> Result<CompleteMultipartUploadOutput, StoreError>;

    /// Discard an in-progress multipart upload and any parts uploaded for it
    async fn abort_multipart_upload(
        &self,
        bucket: &str,
        key: &str,
        upload_id: &str,
    ) -> Result<(), StoreError>;

    /// Fetch the object `bucket/key` as a stream of bytes
    async fn get_object(&self, bucket: &str, key: &str) -> Result<GetObjectOutput, StoreError>;
}

#[async_trait]
impl<T> ObjectStore for Arc<T>
where
    T: ObjectStore + ?Sized,
{
    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: Bytes,
    ) -> Result<PutObjectOutput, StoreError> {
        (**self).put_object(bucket, key, body).await
    }

    async fn create_multipart_upload(
        &self,
        bucket: &str,
        key: &str,
    ) -> Result<String, StoreError> {
        (**self).create_multipart_upload(bucket, key).await
    }

    async fn upload_part(
        &self,
        bucket: &str,
        key: &str,
        upload_id: &str,
        part_number: u64,
        body: Bytes,
    ) -> Result<CompletedPart, StoreError> {
        (**self)
            .upload_part(bucket, key, upload_id, part_number, body)
            .await
    }

    async fn complete_multipart_upload(
        &self,
        bucket: &str,
        key: &str,
        upload_id: &str,
        parts: &[CompletedPart],
    ) -> Result<CompleteMultipartUploadOutput, StoreError> {
        (**self)
            .complete_multipart_upload(bucket, key, upload_id, parts)
            .await
    }

    async fn abort_multipart_upload(
        &self,
        bucket: &str,
        key: &str,
        upload_id: &str,
    ) -> Result<(), StoreError> {
        (**self).abort_multipart_upload(bucket, key, upload_id).await
    }

    async fn get_object(&self, bucket: &str, key: &str) -> Result<GetObjectOutput, StoreError> {
        (**self).get_object(bucket, key).await
    }
}

/// Error returned by an [`ObjectStore`] call.
///
/// Displays as the underlying store error.
#[derive(Debug)]
pub struct StoreError {
    not_found: bool,
    source: BoxError,
}

impl StoreError {
    /// Wrap an arbitrary store error
    pub fn new(err: impl Into<BoxError>) -> Self {
        Self {
            not_found: false,
            source: err.into(),
        }
    }

    /// Wrap an error signalling that the bucket, key or upload does not exist
    pub fn not_found(err: impl Into<BoxError>) -> Self {
        Self {
            not_found: true,
            source: err.into(),
        }
    }

    /// Whether the store reported a missing bucket, key or upload
    pub fn is_not_found(&self) -> bool {
        self.not_found
    }
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.source, f)
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source.source()
    }
}

/// Result of a successful `PutObject`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PutObjectOutput {
    /// Entity tag of the stored object
    pub e_tag: Option<String>,
}

/// Result of a successful `CompleteMultipartUpload`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompleteMultipartUploadOutput {
    /// Entity tag of the assembled object
    pub e_tag: Option<String>,
    /// URI identifying the newly created object
    pub location: Option<String>,
}

/// Result of a successful `GetObject`
#[derive(Debug)]
pub struct GetObjectOutput {
    /// Entity tag of the object
    pub e_tag: Option<String>,
    /// Size of the object in bytes, when reported by the store
    pub content_length: Option<u64>,
    /// The object content
    pub body: ObjectBody,
}

/// Stream of object content as delivered by the store.
pub struct ObjectBody {
    inner: BoxStream<'static, Result<Bytes, StoreError>>,
}

impl ObjectBody {
    /// Create a body from an arbitrary stream of byte chunks
    pub fn from_stream<S>(stream: S) -> Self
    where
        S: Stream<Item = Result<Bytes, StoreError>> + Send + 'static,
    {
        Self {
            inner: stream.boxed(),
        }
    }

    /// Create an empty body
    pub fn empty() -> Self {
        Self::from_stream(futures_util::stream::empty())
    }

    /// Pull the next chunk of data off the stream.
    ///
    /// Returns [None] when there is no more data.
    pub async fn next(&mut self) -> Option<Result<Bytes, StoreError>> {
        self.inner.next().await
    }
}

impl From<Bytes> for ObjectBody {
    fn from(value: Bytes) -> Self {
        Self::from_stream(futures_util::stream::once(async move { Ok(value) }))
    }
}

impl fmt::Debug for ObjectBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectBody").finish_non_exhaustive()
    }
}
