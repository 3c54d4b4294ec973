/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! In-memory implementation of the [`ObjectStore`] trait.

use std::collections::hash_map::DefaultHasher;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use tokio::sync::RwLock;

use super::{
    CompleteMultipartUploadOutput, GetObjectOutput, ObjectBody, ObjectStore, PutObjectOutput,
    StoreError,
};
use crate::types::CompletedPart;

/// Size of the chunks `get_object` bodies are split into
const BODY_CHUNK_SIZE: usize = 64 * 1024;

/// A store operation, used to inject failures into an [`InMemoryStore`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum StoreOperation {
    /// `put_object` for any key
    PutObject,
    /// `create_multipart_upload` for any key
    CreateMultipartUpload,
    /// `upload_part` for the given part number
    UploadPart(u64),
    /// `complete_multipart_upload` for any upload
    CompleteMultipartUpload,
    /// `abort_multipart_upload` for any upload
    AbortMultipartUpload,
    /// `get_object` for any key
    GetObject,
}

/// A call received by an [`InMemoryStore`], in the order it was received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    /// `put_object` with the payload size
    PutObject {
        /// object key
        key: String,
        /// payload size in bytes
        len: usize,
    },
    /// `create_multipart_upload`
    CreateMultipartUpload {
        /// object key
        key: String,
    },
    /// `upload_part` with the part size
    UploadPart {
        /// part number
        part_number: u64,
        /// part size in bytes
        len: usize,
    },
    /// `complete_multipart_upload` with the part numbers in the order given
    CompleteMultipartUpload {
        /// part numbers in the order they were submitted
        part_numbers: Vec<u64>,
    },
    /// `abort_multipart_upload`
    AbortMultipartUpload {
        /// the upload being aborted
        upload_id: String,
    },
    /// `get_object`
    GetObject {
        /// object key
        key: String,
    },
}

#[derive(Debug)]
struct PendingUpload {
    object: String,
    parts: HashMap<u64, (Option<String>, Bytes)>,
}

/// An [`ObjectStore`] that keeps objects and multipart uploads in memory.
///
/// Every call is recorded (see [`InMemoryStore::calls`]) and any operation can be made to fail
/// with [`InMemoryStore::fail_on`], which makes this store suitable for exercising transfer
/// behavior without a network. Completing an upload enforces the same rules S3 does: parts must
/// be listed in ascending order with no gaps and matching entity tags.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    // bucket/key -> (etag, content)
    objects: RwLock<HashMap<String, (String, Bytes)>>,
    // upload-id -> pending upload
    uploads: RwLock<HashMap<String, PendingUpload>>,
    next_upload_id: AtomicU64,
    failures: Mutex<HashSet<StoreOperation>>,
    calls: Mutex<Vec<StoreCall>>,
}

fn object_path(bucket: &str, key: &str) -> String {
    format!("{bucket}/{key}")
}

fn content_etag(content: &[u8]) -> String {
    let mut hasher = DefaultHasher::new();
    content.hash(&mut hasher);
    format!("\"{:016x}\"", hasher.finish())
}

impl InMemoryStore {
    /// Create a new, empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call matching `operation` fail
    pub fn fail_on(&self, operation: StoreOperation) {
        self.failures
            .lock()
            .expect("lock valid")
            .insert(operation);
    }

    /// All calls received so far, in order
    pub fn calls(&self) -> Vec<StoreCall> {
        self.calls.lock().expect("lock valid").clone()
    }

    /// The content of `bucket/key` if it exists
    pub async fn object(&self, bucket: &str, key: &str) -> Option<Bytes> {
        let objects = self.objects.read().await;
        objects
            .get(&object_path(bucket, key))
            .map(|(_, content)| content.clone())
    }

    /// Number of multipart uploads that have been created but neither completed nor aborted
    pub async fn pending_uploads(&self) -> usize {
        self.uploads.read().await.len()
    }

    fn record(&self, call: StoreCall) {
        self.calls.lock().expect("lock valid").push(call);
    }

    fn check_failure(&self, operation: StoreOperation) -> Result<(), StoreError> {
        if self
            .failures
            .lock()
            .expect("lock valid")
            .contains(&operation)
        {
            return Err(StoreError::new(format!(
                "InternalError: injected failure for {operation:?}"
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl ObjectStore for InMemoryStore {
    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: Bytes,
    ) -> Result<PutObjectOutput, StoreError> {
        self.record(StoreCall::PutObject {
            key: key.to_owned(),
            len: body.len(),
        });
        self.check_failure(StoreOperation::PutObject)?;

        let e_tag = content_etag(&body);
        let mut objects = self.objects.write().await;
        objects.insert(object_path(bucket, key), (e_tag.clone(), body));
        Ok(PutObjectOutput { e_tag: Some(e_tag) })
    }

    async fn create_multipart_upload(
        &self,
        bucket: &str,
        key: &str,
    ) -> Result<String, StoreError> {
        self.record(StoreCall::CreateMultipartUpload {
            key: key.to_owned(),
        });
        self.check_failure(StoreOperation::CreateMultipartUpload)?;

        let upload_id = format!(
            "upload-{}",
            self.next_upload_id.fetch_add(1, Ordering::Relaxed) + 1
        );
        let mut uploads = self.uploads.write().await;
        uploads.insert(
            upload_id.clone(),
            PendingUpload {
                object: object_path(bucket, key),
                parts: HashMap::new(),
            },
        );
        Ok(upload_id)
    }

    async fn upload_part(
        &self,
        _bucket: &str,
        _key: &str,
        upload_id: &str,
        part_number: u64,
        body: Bytes,
    ) -> Result<CompletedPart, StoreError> {
        self.record(StoreCall::UploadPart {
            part_number,
            len: body.len(),
        });
        self.check_failure(StoreOperation::UploadPart(part_number))?;

        let mut uploads = self.uploads.write().await;
        let upload = uploads
            .get_mut(upload_id)
            .ok_or_else(|| StoreError::not_found("NoSuchUpload"))?;
        let e_tag = content_etag(&body);
        upload
            .parts
            .insert(part_number, (Some(e_tag.clone()), body));
        Ok(CompletedPart::new(part_number, Some(e_tag)))
    }

    async fn complete_multipart_upload(
        &self,
        _bucket: &str,
        _key: &str,
        upload_id: &str,
        parts: &[CompletedPart],
    ) -> Result<CompleteMultipartUploadOutput, StoreError> {
        self.record(StoreCall::CompleteMultipartUpload {
            part_numbers: parts.iter().map(CompletedPart::part_number).collect(),
        });
        self.check_failure(StoreOperation::CompleteMultipartUpload)?;

        let mut uploads = self.uploads.write().await;
        let upload = uploads
            .get(upload_id)
            .ok_or_else(|| StoreError::not_found("NoSuchUpload"))?;

        if parts.is_empty() {
            return Err(StoreError::new(
                "MalformedXML: at least one part must be specified",
            ));
        }

        // part numbers must be exactly 1..=N in order
        let mut ordered = BTreeMap::new();
        for (idx, part) in parts.iter().enumerate() {
            if part.part_number != idx as u64 + 1 {
                return Err(StoreError::new(format!(
                    "InvalidPartOrder: expected part {} but got part {}",
                    idx + 1,
                    part.part_number
                )));
            }
            let (e_tag, content) = upload.parts.get(&part.part_number).ok_or_else(|| {
                StoreError::new(format!("InvalidPart: part {} not uploaded", part.part_number))
            })?;
            if e_tag != &part.e_tag {
                return Err(StoreError::new(format!(
                    "InvalidPart: entity tag mismatch for part {}",
                    part.part_number
                )));
            }
            ordered.insert(part.part_number, content.clone());
        }

        let mut combined = BytesMut::new();
        for content in ordered.values() {
            combined.extend_from_slice(content);
        }
        let combined = combined.freeze();

        let upload = uploads
            .remove(upload_id)
            .ok_or_else(|| StoreError::not_found("NoSuchUpload"))?;
        let e_tag = format!(
            "{}-{}\"",
            content_etag(&combined).trim_end_matches('"'),
            parts.len()
        );
        let location = format!("memory:///{}", upload.object);
        let mut objects = self.objects.write().await;
        objects.insert(upload.object, (e_tag.clone(), combined));

        Ok(CompleteMultipartUploadOutput {
            e_tag: Some(e_tag),
            location: Some(location),
        })
    }

    async fn abort_multipart_upload(
        &self,
        _bucket: &str,
        _key: &str,
        upload_id: &str,
    ) -> Result<(), StoreError> {
        self.record(StoreCall::AbortMultipartUpload {
            upload_id: upload_id.to_owned(),
        });
        self.check_failure(StoreOperation::AbortMultipartUpload)?;

        let mut uploads = self.uploads.write().await;
        if uploads.remove(upload_id).is_none() {
            return Err(StoreError::not_found("NoSuchUpload"));
        }
        Ok(())
    }

    async fn get_object(&self, bucket: &str, key: &str) -> Result<GetObjectOutput, StoreError> {
        self.record(StoreCall::GetObject {
            key: key.to_owned(),
        });
        self.check_failure(StoreOperation::GetObject)?;

        let objects = self.objects.read().await;
        let (e_tag, content) = objects
            .get(&object_path(bucket, key))
            .ok_or_else(|| StoreError::not_found("NoSuchKey"))?;

        let chunks: Vec<Result<Bytes, StoreError>> = content
            .chunks(BODY_CHUNK_SIZE)
            .map(|chunk| Ok(content.slice_ref(chunk)))
            .collect();

        Ok(GetObjectOutput {
            e_tag: Some(e_tag.clone()),
            content_length: Some(content.len() as u64),
            body: ObjectBody::from_stream(futures_util::stream::iter(chunks)),
        })
    }
}
