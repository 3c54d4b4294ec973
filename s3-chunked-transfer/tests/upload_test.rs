/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use aws_smithy_runtime::test_util::capture_test_logs::capture_test_logs;
use aws_smithy_types::error::display::DisplayErrorContext;
use bytes::Bytes;
use s3_chunked_transfer::error::ErrorKind;
use s3_chunked_transfer::io::{ChunkReader, InputStream};
use s3_chunked_transfer::operation::upload::MultipartSession;
use s3_chunked_transfer::store::in_memory::{StoreCall, StoreOperation};
use s3_chunked_transfer::store::{
    CompleteMultipartUploadOutput, GetObjectOutput, InMemoryStore, ObjectStore, PutObjectOutput,
    StoreError,
};
use s3_chunked_transfer::types::CompletedPart;
use s3_chunked_transfer::types::{FailedMultipartUploadPolicy, TransferStrategy};
use s3_chunked_transfer::{Client, Config};
use test_common::{create_test_file, random_bytes, KIB, MIB};
use tokio::io::AsyncWriteExt;

const BUCKET: &str = "test-bucket";
const CHUNK_SIZE: usize = 32 * KIB;
const PART_SIZE: usize = 5 * MIB;

fn test_client(store: &Arc<InMemoryStore>, part_size: usize) -> Client {
    let config = Config::builder()
        .store(store.clone())
        .part_size(part_size as u64)
        .build()
        .unwrap();
    Client::new(config)
}

fn uploaded_part_sizes(calls: &[StoreCall]) -> Vec<usize> {
    calls
        .iter()
        .filter_map(|call| match call {
            StoreCall::UploadPart { len, .. } => Some(*len),
            _ => None,
        })
        .collect()
}

fn completed(calls: &[StoreCall]) -> bool {
    calls
        .iter()
        .any(|call| matches!(call, StoreCall::CompleteMultipartUpload { .. }))
}

#[tokio::test]
async fn test_empty_source_uses_single_put() {
    let store = Arc::new(InMemoryStore::new());
    let client = test_client(&store, PART_SIZE);

    let output = client
        .upload()
        .bucket(BUCKET)
        .key("empty")
        .body(InputStream::from(Bytes::new()))
        .send()
        .await
        .unwrap()
        .join()
        .await
        .unwrap();

    assert_eq!(TransferStrategy::Direct, output.strategy());
    assert!(output.e_tag().is_some());
    assert_eq!(0, output.bytes_transferred());
    assert_eq!(
        vec![StoreCall::PutObject {
            key: "empty".to_owned(),
            len: 0
        }],
        store.calls()
    );
    assert_eq!(Some(Bytes::new()), store.object(BUCKET, "empty").await);
}

#[tokio::test]
async fn test_small_file_uses_single_put() {
    let (file, content) = create_test_file(1_000_000, 1);

    // 30 full chunks and one of 17,920 bytes
    let source = tokio::fs::File::open(file.path()).await.unwrap();
    let mut reader = ChunkReader::new(source, CHUNK_SIZE);
    let mut chunk_lens = Vec::new();
    while let Some(chunk) = reader.next_chunk().await.unwrap() {
        chunk_lens.push(chunk.len());
    }
    assert_eq!(31, chunk_lens.len());
    assert!(chunk_lens[..30].iter().all(|len| *len == CHUNK_SIZE));
    assert_eq!(17_920, chunk_lens[30]);

    let store = Arc::new(InMemoryStore::new());
    let client = test_client(&store, PART_SIZE);
    let output = client
        .upload()
        .bucket(BUCKET)
        .key("small.bin")
        .body(InputStream::from_path(file.path()))
        .send()
        .await
        .unwrap()
        .join()
        .await
        .unwrap();

    assert_eq!(TransferStrategy::Direct, output.strategy());
    assert!(output.upload_id().is_none());
    assert!(output.parts().is_empty());
    assert_eq!(
        vec![StoreCall::PutObject {
            key: "small.bin".to_owned(),
            len: 1_000_000
        }],
        store.calls()
    );
    assert_eq!(Some(content), store.object(BUCKET, "small.bin").await);
}

#[tokio::test]
async fn test_large_file_uses_multipart_upload() {
    let (file, content) = create_test_file(12 * MIB, 2);
    let store = Arc::new(InMemoryStore::new());
    let client = test_client(&store, PART_SIZE);

    let output = client
        .upload()
        .bucket(BUCKET)
        .key("large.bin")
        .body(InputStream::from_path(file.path()))
        .send()
        .await
        .unwrap()
        .join()
        .await
        .unwrap();

    assert_eq!(TransferStrategy::Multipart, output.strategy());
    assert_eq!((12 * MIB) as u64, output.bytes_transferred());
    let upload_id = output.upload_id().unwrap().to_owned();

    let part_numbers = output
        .parts()
        .iter()
        .map(|p| p.part_number())
        .collect::<Vec<_>>();
    assert_eq!(vec![1, 2, 3], part_numbers);

    let calls = store.calls();
    assert_eq!(
        StoreCall::CreateMultipartUpload {
            key: "large.bin".to_owned()
        },
        calls[0]
    );
    assert_eq!(vec![5 * MIB, 5 * MIB, 2 * MIB], uploaded_part_sizes(&calls));
    assert_eq!(
        Some(&StoreCall::CompleteMultipartUpload {
            part_numbers: vec![1, 2, 3]
        }),
        calls.last()
    );
    assert!(!calls
        .iter()
        .any(|call| matches!(call, StoreCall::AbortMultipartUpload { upload_id: id } if *id == upload_id)));

    assert_eq!(Some(content), store.object(BUCKET, "large.bin").await);
    assert_eq!(0, store.pending_uploads().await);
    assert_eq!(3, client.metrics().parts_uploaded());
}

#[tokio::test]
async fn test_payload_of_exactly_part_size_is_multipart() {
    let store = Arc::new(InMemoryStore::new());
    let client = test_client(&store, PART_SIZE);
    let content = random_bytes(PART_SIZE, 3);

    let output = client
        .upload()
        .bucket(BUCKET)
        .key("boundary.bin")
        .body(InputStream::from(content.clone()))
        .send()
        .await
        .unwrap()
        .join()
        .await
        .unwrap();

    assert_eq!(TransferStrategy::Multipart, output.strategy());
    assert_eq!(vec![PART_SIZE], uploaded_part_sizes(&store.calls()));
    assert_eq!(Some(content.clone()), store.object(BUCKET, "boundary.bin").await);

    // one byte less goes through a single put
    let output = client
        .upload()
        .bucket(BUCKET)
        .key("below-boundary.bin")
        .body(InputStream::from(content.slice(1..)))
        .send()
        .await
        .unwrap()
        .join()
        .await
        .unwrap();
    assert_eq!(TransferStrategy::Direct, output.strategy());
}

#[tokio::test]
async fn test_parts_accumulate_whole_chunks() {
    // part size not a multiple of the chunk size
    let part_size = 100_000;
    let total = 300_000;
    let store = Arc::new(InMemoryStore::new());
    let client = test_client(&store, part_size);
    let content = random_bytes(total, 4);

    client
        .upload()
        .bucket(BUCKET)
        .key("uneven.bin")
        .body(InputStream::from(content.clone()))
        .send()
        .await
        .unwrap()
        .join()
        .await
        .unwrap();

    let sizes = uploaded_part_sizes(&store.calls());
    assert_eq!(vec![4 * CHUNK_SIZE, 4 * CHUNK_SIZE, 37_856], sizes);
    assert_eq!(total, sizes.iter().sum::<usize>());
    for size in &sizes[..sizes.len() - 1] {
        assert!(*size >= part_size);
        assert!(*size < part_size + CHUNK_SIZE);
    }
    assert_eq!(Some(content), store.object(BUCKET, "uneven.bin").await);
}

#[tokio::test]
async fn test_part_failure_aborts_upload() {
    let store = Arc::new(InMemoryStore::new());
    store.fail_on(StoreOperation::UploadPart(2));
    let client = test_client(&store, PART_SIZE);

    let err = client
        .upload()
        .bucket(BUCKET)
        .key("large.bin")
        .body(InputStream::from(random_bytes(12 * MIB, 5)))
        .send()
        .await
        .unwrap()
        .join()
        .await
        .unwrap_err();

    match err.kind() {
        ErrorKind::PartUploadFailed(part) => assert_eq!(2, part.part_number()),
        other => panic!("unexpected error kind {other:?}"),
    }
    let rendered = format!("{}", DisplayErrorContext(&err));
    assert!(rendered.contains("failed to upload part 2"), "{rendered}");
    assert!(rendered.contains("injected failure"), "{rendered}");

    let calls = store.calls();
    assert!(!completed(&calls));
    assert!(matches!(
        calls.last(),
        Some(StoreCall::AbortMultipartUpload { .. })
    ));
    // no part after the failed one was attempted
    assert_eq!(vec![5 * MIB, 5 * MIB], uploaded_part_sizes(&calls));
    assert_eq!(0, store.pending_uploads().await);
    assert!(store.object(BUCKET, "large.bin").await.is_none());

    assert_eq!(1, client.metrics().transfers_failed());
    assert_eq!(0, client.metrics().transfers_completed());
}

#[tokio::test]
async fn test_retain_policy_leaves_upload_on_store() {
    let store = Arc::new(InMemoryStore::new());
    store.fail_on(StoreOperation::UploadPart(2));
    let client = test_client(&store, PART_SIZE);

    let err = client
        .upload()
        .bucket(BUCKET)
        .key("large.bin")
        .body(InputStream::from(random_bytes(12 * MIB, 6)))
        .failed_multipart_upload_policy(FailedMultipartUploadPolicy::Retain)
        .send()
        .await
        .unwrap()
        .join()
        .await
        .unwrap_err();

    assert!(matches!(err.kind(), ErrorKind::PartUploadFailed(_)));
    let calls = store.calls();
    assert!(!completed(&calls));
    assert!(!calls
        .iter()
        .any(|call| matches!(call, StoreCall::AbortMultipartUpload { .. })));
    assert_eq!(1, store.pending_uploads().await);
}

#[tokio::test]
async fn test_abort_failure_keeps_original_error() {
    let (_guard, rx) = capture_test_logs();

    let store = Arc::new(InMemoryStore::new());
    store.fail_on(StoreOperation::UploadPart(2));
    store.fail_on(StoreOperation::AbortMultipartUpload);
    let client = test_client(&store, PART_SIZE);

    let err = client
        .upload()
        .bucket(BUCKET)
        .key("large.bin")
        .body(InputStream::from(random_bytes(12 * MIB, 7)))
        .send()
        .await
        .unwrap()
        .join()
        .await
        .unwrap_err();

    assert!(matches!(err.kind(), ErrorKind::PartUploadFailed(_)));
    assert!(rx.contents().contains("failed to abort multipart upload"));
}

#[tokio::test]
async fn test_initiate_failure() {
    let store = Arc::new(InMemoryStore::new());
    store.fail_on(StoreOperation::CreateMultipartUpload);
    let client = test_client(&store, PART_SIZE);

    let err = client
        .upload()
        .bucket(BUCKET)
        .key("large.bin")
        .body(InputStream::from(random_bytes(6 * MIB, 8)))
        .send()
        .await
        .unwrap()
        .join()
        .await
        .unwrap_err();

    assert_eq!(&ErrorKind::InitiateFailed, err.kind());
    assert_eq!(
        vec![StoreCall::CreateMultipartUpload {
            key: "large.bin".to_owned()
        }],
        store.calls()
    );
}

#[tokio::test]
async fn test_complete_failure_aborts_upload() {
    let store = Arc::new(InMemoryStore::new());
    store.fail_on(StoreOperation::CompleteMultipartUpload);
    let client = test_client(&store, PART_SIZE);

    let err = client
        .upload()
        .bucket(BUCKET)
        .key("large.bin")
        .body(InputStream::from(random_bytes(6 * MIB, 9)))
        .send()
        .await
        .unwrap()
        .join()
        .await
        .unwrap_err();

    assert_eq!(&ErrorKind::CompleteFailed, err.kind());
    assert!(matches!(
        store.calls().last(),
        Some(StoreCall::AbortMultipartUpload { .. })
    ));
    assert!(store.object(BUCKET, "large.bin").await.is_none());
}

#[tokio::test]
async fn test_direct_upload_failure() {
    let store = Arc::new(InMemoryStore::new());
    store.fail_on(StoreOperation::PutObject);
    let client = test_client(&store, PART_SIZE);

    let err = client
        .upload()
        .bucket(BUCKET)
        .key("small.bin")
        .body(InputStream::from_static(b"hello world"))
        .send()
        .await
        .unwrap()
        .join()
        .await
        .unwrap_err();

    assert_eq!(&ErrorKind::UploadFailed, err.kind());
    assert!(store.object(BUCKET, "small.bin").await.is_none());
}

#[tokio::test]
async fn test_missing_source_makes_no_store_calls() {
    let store = Arc::new(InMemoryStore::new());
    let client = test_client(&store, PART_SIZE);
    let dir = tempfile::tempdir().unwrap();

    let err = client
        .upload()
        .bucket(BUCKET)
        .key("missing.bin")
        .body(InputStream::from_path(dir.path().join("missing.bin")))
        .send()
        .await
        .unwrap_err();

    assert_eq!(&ErrorKind::SourceUnavailable, err.kind());
    assert!(store.calls().is_empty());
    assert_eq!(0, client.metrics().transfers_initiated());
}

#[tokio::test]
async fn test_source_shorter_than_declared_fails_multipart() {
    let store = Arc::new(InMemoryStore::new());
    let client = test_client(&store, PART_SIZE);
    let data = random_bytes(MIB, 10);

    let err = client
        .upload()
        .bucket(BUCKET)
        .key("short.bin")
        .body(InputStream::from_reader(std::io::Cursor::new(data), 6 * MIB as u64))
        .send()
        .await
        .unwrap()
        .join()
        .await
        .unwrap_err();

    assert_eq!(&ErrorKind::SourceUnavailable, err.kind());
    let calls = store.calls();
    assert!(!completed(&calls));
    assert!(matches!(
        calls.last(),
        Some(StoreCall::AbortMultipartUpload { .. })
    ));
    assert!(store.object(BUCKET, "short.bin").await.is_none());
}

#[tokio::test]
async fn test_missing_bucket_or_key() {
    let store = Arc::new(InMemoryStore::new());
    let client = test_client(&store, PART_SIZE);

    let err = client
        .upload()
        .key("key")
        .body(InputStream::from_static(b"data"))
        .send()
        .await
        .unwrap_err();
    assert_eq!(&ErrorKind::InputInvalid, err.kind());

    let err = client
        .upload()
        .bucket(BUCKET)
        .body(InputStream::from_static(b"data"))
        .send()
        .await
        .unwrap_err();
    assert_eq!(&ErrorKind::InputInvalid, err.kind());
    assert!(store.calls().is_empty());
}

#[tokio::test]
async fn test_abort_in_progress_multipart_upload() {
    let part_size = 16 * KIB;
    let store = Arc::new(InMemoryStore::new());
    let client = test_client(&store, part_size);

    let (mut writer, reader) = tokio::io::duplex(64 * KIB);
    let handle = client
        .upload()
        .bucket(BUCKET)
        .key("streaming.bin")
        .body(InputStream::from_reader(reader, MIB as u64))
        .send()
        .await
        .unwrap();

    // one full chunk fills a part, the transfer then waits for more input
    writer.write_all(&random_bytes(CHUNK_SIZE, 11)).await.unwrap();
    while uploaded_part_sizes(&store.calls()).is_empty() {
        tokio::task::yield_now().await;
    }

    let aborted = handle.abort().await.unwrap();
    let upload_id = aborted.upload_id().unwrap().to_owned();

    assert_eq!(
        Some(&StoreCall::AbortMultipartUpload { upload_id }),
        store.calls().last()
    );
    assert_eq!(0, store.pending_uploads().await);
    assert!(store.object(BUCKET, "streaming.bin").await.is_none());
    assert_eq!(1, client.metrics().transfers_failed());
}

#[tokio::test]
async fn test_abort_completed_upload_keeps_object() {
    let store = Arc::new(InMemoryStore::new());
    let client = test_client(&store, PART_SIZE);

    let handle = client
        .upload()
        .bucket(BUCKET)
        .key("done.bin")
        .body(InputStream::from_static(b"hello world"))
        .send()
        .await
        .unwrap();

    while store.object(BUCKET, "done.bin").await.is_none() {
        tokio::task::yield_now().await;
    }

    let aborted = handle.abort().await.unwrap();
    assert!(aborted.upload_id().is_none());
    assert!(store.object(BUCKET, "done.bin").await.is_some());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_many_concurrent_uploads() {
    let store = Arc::new(InMemoryStore::new());
    let client = test_client(&store, 64 * KIB);

    let mut tasks = Vec::new();
    for i in 0..16u64 {
        let client = client.clone();
        let content = random_bytes(100 * KIB + i as usize, i);
        tasks.push(tokio::spawn(async move {
            let key = format!("object-{i}");
            let output = client
                .upload()
                .bucket(BUCKET)
                .key(&key)
                .body(InputStream::from(content.clone()))
                .send()
                .await
                .unwrap()
                .join()
                .await
                .unwrap();
            (key, content, output)
        }));
    }

    for task in tasks {
        let (key, content, output) = task.await.unwrap();
        assert_eq!(TransferStrategy::Multipart, output.strategy());
        assert_eq!(Some(content), store.object(BUCKET, &key).await);
    }

    let metrics = client.metrics();
    assert_eq!(16, metrics.transfers_initiated());
    assert_eq!(16, metrics.transfers_completed());
    assert_eq!(0, metrics.active_transfers());
}

#[tokio::test]
async fn test_random_sizes_reassemble_exactly() {
    let mut rng = fastrand::Rng::with_seed(0x5eed);
    for case in 0..300u64 {
        let len = rng.usize(0..20_000);
        let chunk_size = rng.usize(1..2_048);
        let part_size = rng.usize(1..8_192);
        let context = format!("case {case}: len={len} chunk={chunk_size} part={part_size}");
        let content = random_bytes(len, case);

        let store = Arc::new(InMemoryStore::new());
        let mut session =
            MultipartSession::new(store.clone(), BUCKET, "key", part_size as u64, chunk_size);
        session.initiate().await.unwrap();

        let mut reader = ChunkReader::new(&content[..], chunk_size);
        let mut joined = Vec::with_capacity(len);
        let mut chunk_lens = Vec::new();
        while let Some(chunk) = reader.next_chunk().await.unwrap() {
            assert_eq!(joined.len() as u64, chunk.offset(), "{context}");
            joined.extend_from_slice(chunk.data());
            chunk_lens.push(chunk.len());
            session.accept(chunk.data()).unwrap();
            session.maybe_flush(false).await.unwrap();
        }
        session.maybe_flush(true).await.unwrap();

        assert_eq!(&content[..], &joined[..], "{context}");
        assert_eq!(len.div_ceil(chunk_size), chunk_lens.len(), "{context}");
        if let Some((_, full_chunks)) = chunk_lens.split_last() {
            assert!(full_chunks.iter().all(|l| *l == chunk_size), "{context}");
        }

        if len == 0 {
            assert!(session.parts().is_empty(), "{context}");
            continue;
        }
        session.finalize().await.unwrap();

        let part_numbers = session
            .parts()
            .iter()
            .map(|p| p.part_number())
            .collect::<Vec<_>>();
        let expected = (1..=part_numbers.len() as u64).collect::<Vec<_>>();
        assert_eq!(expected, part_numbers, "{context}");

        let sizes = uploaded_part_sizes(&store.calls());
        let (last, full_parts) = sizes.split_last().unwrap();
        assert!(*last > 0 && *last < part_size + chunk_size, "{context}");
        for size in full_parts {
            assert!(*size >= part_size, "{context}");
            assert!(*size < part_size + chunk_size, "{context}");
        }
        assert_eq!(Some(content), store.object(BUCKET, "key").await, "{context}");
    }
}

/// Forwards to an [`InMemoryStore`], never returning from selected calls
#[derive(Debug, Default)]
struct StallingStore {
    inner: Arc<InMemoryStore>,
    stall_after_complete: bool,
    stall_next_abort: AtomicBool,
}

#[async_trait]
impl ObjectStore for StallingStore {
    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: Bytes,
    ) -> Result<PutObjectOutput, StoreError> {
        self.inner.put_object(bucket, key, body).await
    }

    async fn create_multipart_upload(
        &self,
        bucket: &str,
        key: &str,
    ) -> Result<String, StoreError> {
        self.inner.create_multipart_upload(bucket, key).await
    }

    async fn upload_part(
        &self,
        bucket: &str,
        key: &str,
        upload_id: &str,
        part_number: u64,
        body: Bytes,
    ) -> Result<CompletedPart, StoreError> {
        self.inner
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
        let output = self
            .inner
            .complete_multipart_upload(bucket, key, upload_id, parts)
            .await?;
        if self.stall_after_complete {
            std::future::pending::<()>().await;
        }
        Ok(output)
    }

    async fn abort_multipart_upload(
        &self,
        bucket: &str,
        key: &str,
        upload_id: &str,
    ) -> Result<(), StoreError> {
        if self.stall_next_abort.swap(false, Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        self.inner
            .abort_multipart_upload(bucket, key, upload_id)
            .await
    }

    async fn get_object(&self, bucket: &str, key: &str) -> Result<GetObjectOutput, StoreError> {
        self.inner.get_object(bucket, key).await
    }
}

fn stalling_client(store: &Arc<StallingStore>, part_size: usize) -> Client {
    let config = Config::builder()
        .store(store.clone())
        .part_size(part_size as u64)
        .build()
        .unwrap();
    Client::new(config)
}

#[tokio::test]
async fn test_abort_after_store_completed_upload() {
    let store = Arc::new(StallingStore {
        stall_after_complete: true,
        ..Default::default()
    });
    let client = stalling_client(&store, 64 * KIB);
    let content = random_bytes(100 * KIB, 12);

    let handle = client
        .upload()
        .bucket(BUCKET)
        .key("committed.bin")
        .body(InputStream::from(content.clone()))
        .send()
        .await
        .unwrap();

    // the object is committed but the transfer never sees the response
    while store.inner.object(BUCKET, "committed.bin").await.is_none() {
        tokio::task::yield_now().await;
    }

    let aborted = handle.abort().await.unwrap();
    assert!(aborted.upload_id().is_none());
    assert_eq!(Some(content), store.inner.object(BUCKET, "committed.bin").await);
}

#[tokio::test]
async fn test_abort_while_failed_upload_is_being_cleaned_up() {
    let store = Arc::new(StallingStore {
        stall_next_abort: AtomicBool::new(true),
        ..Default::default()
    });
    store.inner.fail_on(StoreOperation::UploadPart(2));
    let client = stalling_client(&store, 64 * KIB);

    let handle = client
        .upload()
        .bucket(BUCKET)
        .key("failed.bin")
        .body(InputStream::from(random_bytes(200 * KIB, 13)))
        .send()
        .await
        .unwrap();

    // part 2 failed and the transfer is stuck aborting the upload
    while store.stall_next_abort.load(Ordering::SeqCst) {
        tokio::task::yield_now().await;
    }

    let aborted = handle.abort().await.unwrap();
    let upload_id = aborted.upload_id().unwrap().to_owned();
    assert_eq!(
        Some(&StoreCall::AbortMultipartUpload { upload_id }),
        store.inner.calls().last()
    );
    assert_eq!(0, store.inner.pending_uploads().await);
    assert_eq!(1, client.metrics().transfers_failed());
}
