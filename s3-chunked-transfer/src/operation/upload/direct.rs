/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::sync::Arc;

use bytes::BytesMut;
use tokio::io::AsyncRead;
use tracing::Instrument;

use crate::error::{self, Error, ErrorKind};
use crate::io::ChunkReader;
use crate::store::{ObjectStore, PutObjectOutput};

/// Upper bound on the memory reserved before the payload is read. Larger payloads grow the
/// buffer as data arrives.
const MAX_INITIAL_CAPACITY: u64 = crate::DEFAULT_PART_SIZE;

/// Sends a small payload with a single `PutObject` request.
///
/// The whole payload is held in memory, so this is only meant for payloads below the multipart
/// threshold.
#[derive(Debug, Clone)]
pub struct DirectUploader {
    store: Arc<dyn ObjectStore>,
}

impl DirectUploader {
    /// Create an uploader sending requests to `store`
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }

    /// Read `total_size` bytes from `reader` and store them as `bucket/key`.
    ///
    /// Fails with `SourceUnavailable` if the source can't be read or ends before `total_size`
    /// bytes, and with `UploadFailed` if the store rejects the request. A store failure means no
    /// object was written.
    pub async fn upload<R>(
        &self,
        reader: &mut ChunkReader<R>,
        total_size: u64,
        bucket: &str,
        key: &str,
    ) -> Result<PutObjectOutput, Error>
    where
        R: AsyncRead + Unpin,
    {
        let capacity = usize::try_from(total_size.min(MAX_INITIAL_CAPACITY))
            .map_err(error::invalid_input)?;
        let mut body = BytesMut::with_capacity(capacity);
        while let Some(chunk) = reader.next_chunk().await? {
            body.extend_from_slice(chunk.data());
        }

        if (body.len() as u64) < total_size {
            return Err(error::source_unavailable(format!(
                "source ended after {} of {total_size} bytes",
                body.len()
            )));
        }

        tracing::debug!("sending {total_size} bytes as a single PutObject request");
        self.store
            .put_object(bucket, key, body.freeze())
            .instrument(tracing::debug_span!("put-object", bucket, key))
            .await
            .map_err(error::from_kind(ErrorKind::UploadFailed))
    }
}
