/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::sync::Arc;

use bytes::BytesMut;
use tracing::Instrument;

use crate::error::{self, Error, ErrorKind};
use crate::store::{CompleteMultipartUploadOutput, ObjectStore};
use crate::types::CompletedPart;

/// Lifecycle of a [`MultipartSession`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Created, no upload started on the store yet
    Uninitiated,
    /// The store returned an upload ID, parts can be uploaded
    Active,
    /// The upload was completed and the object exists on the store
    Completed,
    /// A store call failed or the upload was aborted. Terminal.
    Failed,
}

/// Streams a payload to the store as a multipart upload.
///
/// Chunks are appended to an internal buffer with [`accept`](Self::accept). Once the buffer
/// reaches the part size, [`maybe_flush`](Self::maybe_flush) uploads it as the next part and
/// starts a new one. Each part buffer is allocated once with room for `part_size + chunk_size`
/// bytes, so that is all a session holds at any time as long as chunks are at most
/// `chunk_size` bytes. Parts are numbered
/// consecutively from 1 in the order they are flushed and every part but the last is at least
/// `part_size` bytes long.
///
/// ```text
/// Uninitiated --initiate--> Active --finalize--> Completed
///      |                      |
///      +-------failure--------+-----failure/abort--> Failed
/// ```
///
/// Calling an operation the current state does not permit fails with `InvalidState` and leaves
/// the session unchanged.
#[derive(Debug)]
pub struct MultipartSession {
    store: Arc<dyn ObjectStore>,
    bucket: String,
    key: String,
    part_size: u64,
    buffer_capacity: usize,
    upload_id: Option<String>,
    buffer: BytesMut,
    next_part_number: u64,
    parts: Vec<CompletedPart>,
    bytes_uploaded: u64,
    state: SessionState,
}

impl MultipartSession {
    /// Create a session for `bucket/key` flushing parts of `part_size` bytes, fed with chunks of
    /// at most `chunk_size` bytes
    pub fn new(
        store: Arc<dyn ObjectStore>,
        bucket: impl Into<String>,
        key: impl Into<String>,
        part_size: u64,
        chunk_size: usize,
    ) -> Self {
        let buffer_capacity = usize::try_from(part_size)
            .unwrap_or(usize::MAX)
            .saturating_add(chunk_size);
        Self {
            store,
            bucket: bucket.into(),
            key: key.into(),
            part_size,
            buffer_capacity,
            upload_id: None,
            buffer: BytesMut::new(),
            next_part_number: 1,
            parts: Vec::new(),
            bytes_uploaded: 0,
            state: SessionState::Uninitiated,
        }
    }

    /// The current lifecycle state
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// The upload ID assigned by the store once initiated
    pub fn upload_id(&self) -> Option<&str> {
        self.upload_id.as_deref()
    }

    /// Parts acknowledged by the store so far, in part number order
    pub fn parts(&self) -> &[CompletedPart] {
        &self.parts
    }

    /// Number of bytes accepted but not yet uploaded
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Number of bytes acknowledged by the store across all parts
    pub fn bytes_uploaded(&self) -> u64 {
        self.bytes_uploaded
    }

    fn ensure_state(&self, expected: SessionState, operation: &str) -> Result<(), Error> {
        if self.state != expected {
            return Err(error::invalid_state(format!(
                "{operation} is not allowed while the session is {:?}",
                self.state
            )));
        }
        Ok(())
    }

    fn fail(&mut self) {
        self.state = SessionState::Failed;
        self.buffer = BytesMut::new();
    }

    /// Start the multipart upload on the store.
    ///
    /// On success the session is `Active`. A store failure leaves it `Failed` and returns
    /// `InitiateFailed`.
    pub async fn initiate(&mut self) -> Result<(), Error> {
        self.ensure_state(SessionState::Uninitiated, "initiate")?;

        match self
            .store
            .create_multipart_upload(&self.bucket, &self.key)
            .instrument(tracing::debug_span!("create-multipart-upload"))
            .await
        {
            Ok(upload_id) => {
                tracing::debug!("multipart upload started with upload id: {upload_id}");
                self.upload_id = Some(upload_id);
                self.state = SessionState::Active;
                Ok(())
            }
            Err(err) => {
                self.fail();
                Err(Error::new(ErrorKind::InitiateFailed, err))
            }
        }
    }

    /// Append a chunk to the part buffer. Nothing is sent to the store.
    pub fn accept(&mut self, chunk: &[u8]) -> Result<(), Error> {
        self.ensure_state(SessionState::Active, "accept")?;
        if self.buffer.capacity() == 0 {
            self.buffer.reserve(self.buffer_capacity);
        }
        self.buffer.extend_from_slice(chunk);
        Ok(())
    }

    /// Upload the buffer as the next part if it has reached the part size.
    ///
    /// With `is_final` set a non-empty buffer is uploaded regardless of its size. Returns the
    /// uploaded part, or `None` if nothing was flushed. A store failure leaves the session
    /// `Failed` and returns `PartUploadFailed` with the number of the rejected part.
    pub async fn maybe_flush(&mut self, is_final: bool) -> Result<Option<CompletedPart>, Error> {
        self.ensure_state(SessionState::Active, "flush")?;

        let buffered = self.buffer.len() as u64;
        let should_flush = buffered >= self.part_size || (is_final && buffered > 0);
        if !should_flush {
            return Ok(None);
        }

        let part_number = self.next_part_number;
        let upload_id = self.upload_id.as_deref().unwrap_or_default();
        // the next part allocates its own buffer on first accept
        let body = std::mem::take(&mut self.buffer).freeze();
        tracing::trace!("uploading part {part_number} ({buffered} bytes)");

        let result = self
            .store
            .upload_part(&self.bucket, &self.key, upload_id, part_number, body)
            .instrument(tracing::debug_span!("upload-part", part_number))
            .await;

        match result {
            Ok(part) => {
                self.parts.push(part.clone());
                self.next_part_number += 1;
                self.bytes_uploaded += buffered;
                Ok(Some(part))
            }
            Err(err) => {
                self.fail();
                Err(error::part_failed(part_number, err))
            }
        }
    }

    /// Ask the store to assemble the uploaded parts into the final object.
    ///
    /// The buffer must have been flushed. A store failure leaves the session `Failed` and
    /// returns `CompleteFailed`.
    pub async fn finalize(&mut self) -> Result<CompleteMultipartUploadOutput, Error> {
        self.ensure_state(SessionState::Active, "finalize")?;
        if !self.buffer.is_empty() {
            return Err(error::invalid_state(format!(
                "{} buffered bytes have not been flushed",
                self.buffer.len()
            )));
        }

        let upload_id = self.upload_id.as_deref().unwrap_or_default();
        let result = self
            .store
            .complete_multipart_upload(&self.bucket, &self.key, upload_id, &self.parts)
            .instrument(tracing::debug_span!(
                "complete-multipart-upload",
                parts = self.parts.len()
            ))
            .await;

        match result {
            Ok(output) => {
                self.state = SessionState::Completed;
                Ok(output)
            }
            Err(err) => {
                self.fail();
                Err(Error::new(ErrorKind::CompleteFailed, err))
            }
        }
    }

    /// Discard the upload and any parts already stored.
    ///
    /// Allowed while `Active` or after a failure once an upload ID exists. The session is
    /// `Failed` afterwards even if the store rejects the request, in which case `AbortFailed`
    /// is returned.
    pub async fn abort(&mut self) -> Result<(), Error> {
        let upload_id = match (&self.state, &self.upload_id) {
            (SessionState::Active | SessionState::Failed, Some(upload_id)) => upload_id.clone(),
            _ => {
                return Err(error::invalid_state(format!(
                    "abort is not allowed while the session is {:?}",
                    self.state
                )))
            }
        };

        self.fail();
        self.store
            .abort_multipart_upload(&self.bucket, &self.key, &upload_id)
            .instrument(tracing::debug_span!("abort-multipart-upload"))
            .await
            .map_err(error::from_kind(ErrorKind::AbortFailed))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::{MultipartSession, SessionState};
    use crate::error::ErrorKind;
    use crate::store::in_memory::{StoreCall, StoreOperation};
    use crate::store::InMemoryStore;

    fn session(store: &Arc<InMemoryStore>, part_size: u64) -> MultipartSession {
        MultipartSession::new(store.clone(), "bucket", "key", part_size, 4)
    }

    #[tokio::test]
    async fn test_parts_flush_at_part_size() {
        let store = Arc::new(InMemoryStore::new());
        let mut session = session(&store, 10);
        session.initiate().await.unwrap();
        assert_eq!(SessionState::Active, session.state());

        // 4 byte chunks: flushes after 12 and 24 bytes
        let mut flushed = Vec::new();
        for _ in 0..7 {
            session.accept(b"abcd").unwrap();
            if let Some(part) = session.maybe_flush(false).await.unwrap() {
                flushed.push(part.part_number());
            }
        }
        assert_eq!(vec![1, 2], flushed);
        assert_eq!(4, session.buffered());

        let last = session.maybe_flush(true).await.unwrap().unwrap();
        assert_eq!(3, last.part_number());
        assert_eq!(0, session.buffered());
        assert_eq!(28, session.bytes_uploaded());

        session.finalize().await.unwrap();
        assert_eq!(SessionState::Completed, session.state());

        let object = store.object("bucket", "key").await.unwrap();
        assert_eq!(b"abcd".repeat(7), object.to_vec());

        let part_sizes = store
            .calls()
            .into_iter()
            .filter_map(|call| match call {
                StoreCall::UploadPart { len, .. } => Some(len),
                _ => None,
            })
            .collect::<Vec<_>>();
        assert_eq!(vec![12, 12, 4], part_sizes);
    }

    #[tokio::test]
    async fn test_part_buffer_stays_within_part_and_chunk_size() {
        let part_size = 5 * 1024 * 1024;
        let chunk_size = 32 * 1024;
        let bound = part_size + chunk_size;
        let store = Arc::new(InMemoryStore::new());
        let mut session =
            MultipartSession::new(store.clone(), "bucket", "key", part_size as u64, chunk_size);
        session.initiate().await.unwrap();

        // two full parts and a short last one
        let chunk = vec![7u8; chunk_size];
        let mut parts = 0;
        for _ in 0..330 {
            session.accept(&chunk).unwrap();
            assert!(
                session.buffer.capacity() <= bound,
                "buffered={} capacity={} bound={bound}",
                session.buffered(),
                session.buffer.capacity()
            );
            if session.maybe_flush(false).await.unwrap().is_some() {
                parts += 1;
            }
        }
        session.accept(&chunk[..100]).unwrap();
        assert!(session.buffer.capacity() <= bound);
        session.maybe_flush(true).await.unwrap().unwrap();
        session.finalize().await.unwrap();

        assert_eq!(2, parts);
        assert_eq!(3, session.parts().len());
        assert_eq!((330 * chunk_size + 100) as u64, session.bytes_uploaded());
    }

    #[tokio::test]
    async fn test_no_flush_below_part_size() {
        let store = Arc::new(InMemoryStore::new());
        let mut session = session(&store, 10);
        session.initiate().await.unwrap();
        session.accept(b"abc").unwrap();
        assert!(session.maybe_flush(false).await.unwrap().is_none());
        // nothing to flush when final and empty
        session.maybe_flush(true).await.unwrap();
        assert!(session.maybe_flush(true).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_operations_require_active_session() {
        let store = Arc::new(InMemoryStore::new());
        let mut session = session(&store, 10);

        let err = session.accept(b"abc").unwrap_err();
        assert_eq!(&ErrorKind::InvalidState, err.kind());
        let err = session.maybe_flush(true).await.unwrap_err();
        assert_eq!(&ErrorKind::InvalidState, err.kind());
        let err = session.finalize().await.unwrap_err();
        assert_eq!(&ErrorKind::InvalidState, err.kind());
        let err = session.abort().await.unwrap_err();
        assert_eq!(&ErrorKind::InvalidState, err.kind());
        assert_eq!(SessionState::Uninitiated, session.state());
        assert!(store.calls().is_empty());

        session.initiate().await.unwrap();
        let err = session.initiate().await.unwrap_err();
        assert_eq!(&ErrorKind::InvalidState, err.kind());
        assert_eq!(SessionState::Active, session.state());
    }

    #[tokio::test]
    async fn test_finalize_with_unflushed_data() {
        let store = Arc::new(InMemoryStore::new());
        let mut session = session(&store, 10);
        session.initiate().await.unwrap();
        session.accept(b"abc").unwrap();

        let err = session.finalize().await.unwrap_err();
        assert_eq!(&ErrorKind::InvalidState, err.kind());
        assert_eq!(SessionState::Active, session.state());
        assert_eq!(3, session.buffered());
    }

    #[tokio::test]
    async fn test_initiate_failure() {
        let store = Arc::new(InMemoryStore::new());
        store.fail_on(StoreOperation::CreateMultipartUpload);
        let mut session = session(&store, 10);

        let err = session.initiate().await.unwrap_err();
        assert_eq!(&ErrorKind::InitiateFailed, err.kind());
        assert_eq!(SessionState::Failed, session.state());
        assert!(session.upload_id().is_none());
    }

    #[tokio::test]
    async fn test_part_failure_fails_session() {
        let store = Arc::new(InMemoryStore::new());
        store.fail_on(StoreOperation::UploadPart(2));
        let mut session = session(&store, 4);
        session.initiate().await.unwrap();

        session.accept(b"abcd").unwrap();
        session.maybe_flush(false).await.unwrap().unwrap();
        session.accept(b"efgh").unwrap();
        let err = session.maybe_flush(false).await.unwrap_err();
        match err.kind() {
            ErrorKind::PartUploadFailed(part) => assert_eq!(2, part.part_number()),
            other => panic!("unexpected error kind {other:?}"),
        }
        assert_eq!(SessionState::Failed, session.state());
        assert_eq!(0, session.buffered());
        assert_eq!(1, session.parts().len());

        let err = session.accept(b"ijkl").unwrap_err();
        assert_eq!(&ErrorKind::InvalidState, err.kind());

        // the upload can still be discarded
        session.abort().await.unwrap();
        assert_eq!(SessionState::Failed, session.state());
        assert_eq!(0, store.pending_uploads().await);
    }

    #[tokio::test]
    async fn test_complete_failure() {
        let store = Arc::new(InMemoryStore::new());
        store.fail_on(StoreOperation::CompleteMultipartUpload);
        let mut session = session(&store, 4);
        session.initiate().await.unwrap();
        session.accept(b"abcd").unwrap();
        session.maybe_flush(true).await.unwrap();

        let err = session.finalize().await.unwrap_err();
        assert_eq!(&ErrorKind::CompleteFailed, err.kind());
        assert_eq!(SessionState::Failed, session.state());
        assert!(store.object("bucket", "key").await.is_none());
    }

    #[tokio::test]
    async fn test_abort_failure() {
        let store = Arc::new(InMemoryStore::new());
        store.fail_on(StoreOperation::AbortMultipartUpload);
        let mut session = session(&store, 4);
        session.initiate().await.unwrap();

        let err = session.abort().await.unwrap_err();
        assert_eq!(&ErrorKind::AbortFailed, err.kind());
        assert_eq!(SessionState::Failed, session.state());
    }
}
