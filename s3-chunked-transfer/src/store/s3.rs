/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::fmt;

use async_trait::async_trait;
use aws_sdk_s3::error::{ProvideErrorMetadata, SdkError};
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{CompletedMultipartUpload, CompletedPart as S3CompletedPart};
use bytes::Bytes;
use tracing::Instrument;

use super::{
    CompleteMultipartUploadOutput, GetObjectOutput, ObjectBody, ObjectStore, PutObjectOutput,
    StoreError,
};
use crate::types::CompletedPart;

/// [`ObjectStore`] backed by the AWS SDK S3 client.
///
/// Works against Amazon S3 and S3-compatible stores (e.g. MinIO), depending on how the
/// underlying client is configured.
#[derive(Debug, Clone)]
pub struct S3ObjectStore {
    client: aws_sdk_s3::Client,
}

impl S3ObjectStore {
    /// Wrap an existing S3 client
    pub fn new(client: aws_sdk_s3::Client) -> Self {
        Self { client }
    }

    /// The S3 client used to send requests
    pub fn client(&self) -> &aws_sdk_s3::Client {
        &self.client
    }
}

fn sdk_error<E, R>(err: SdkError<E, R>) -> StoreError
where
    E: std::error::Error + ProvideErrorMetadata + Send + Sync + 'static,
    R: fmt::Debug + Send + Sync + 'static,
{
    match err.code() {
        Some("NotFound" | "NoSuchKey" | "NoSuchUpload" | "NoSuchBucket") => {
            StoreError::not_found(err)
        }
        _ => StoreError::new(err),
    }
}

fn s3_part_number(part_number: u64) -> Result<i32, StoreError> {
    i32::try_from(part_number)
        .map_err(|_| StoreError::new(format!("part number {part_number} is out of range")))
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: Bytes,
    ) -> Result<PutObjectOutput, StoreError> {
        let content_length = i64::try_from(body.len()).map_err(StoreError::new)?;
        let resp = self
            .client
            .put_object()
            .bucket(bucket)
            .key(key)
            .content_length(content_length)
            .body(ByteStream::from(body))
            .send()
            .instrument(tracing::debug_span!("send-put-object"))
            .await
            .map_err(sdk_error)?;

        Ok(PutObjectOutput { e_tag: resp.e_tag })
    }

    async fn create_multipart_upload(
        &self,
        bucket: &str,
        key: &str,
    ) -> Result<String, StoreError> {
        let resp = self
            .client
            .create_multipart_upload()
            .bucket(bucket)
            .key(key)
            .send()
            .instrument(tracing::debug_span!("send-create-multipart-upload"))
            .await
            .map_err(sdk_error)?;

        resp.upload_id.ok_or_else(|| {
            StoreError::new("CreateMultipartUpload response did not include an upload ID")
        })
    }

    async fn upload_part(
        &self,
        bucket: &str,
        key: &str,
        upload_id: &str,
        part_number: u64,
        body: Bytes,
    ) -> Result<CompletedPart, StoreError> {
        let content_length = i64::try_from(body.len()).map_err(StoreError::new)?;
        let resp = self
            .client
            .upload_part()
            .bucket(bucket)
            .key(key)
            .upload_id(upload_id)
            .part_number(s3_part_number(part_number)?)
            .content_length(content_length)
            .body(ByteStream::from(body))
            .send()
            .instrument(tracing::debug_span!("send-upload-part", part_number))
            .await
            .map_err(sdk_error)?;

        Ok(CompletedPart::new(part_number, resp.e_tag))
    }

    async fn complete_multipart_upload(
        &self,
        bucket: &str,
        key: &str,
        upload_id: &str,
        parts: &[CompletedPart],
    ) -> Result<CompleteMultipartUploadOutput, StoreError> {
        let mut completed = Vec::with_capacity(parts.len());
        for part in parts {
            completed.push(
                S3CompletedPart::builder()
                    .part_number(s3_part_number(part.part_number)?)
                    .set_e_tag(part.e_tag.clone())
                    .build(),
            );
        }

        let resp = self
            .client
            .complete_multipart_upload()
            .bucket(bucket)
            .key(key)
            .upload_id(upload_id)
            .multipart_upload(
                CompletedMultipartUpload::builder()
                    .set_parts(Some(completed))
                    .build(),
            )
            .send()
            .instrument(tracing::debug_span!("send-complete-multipart-upload"))
            .await
            .map_err(sdk_error)?;

        Ok(CompleteMultipartUploadOutput {
            e_tag: resp.e_tag,
            location: resp.location,
        })
    }

    async fn abort_multipart_upload(
        &self,
        bucket: &str,
        key: &str,
        upload_id: &str,
    ) -> Result<(), StoreError> {
        self.client
            .abort_multipart_upload()
            .bucket(bucket)
            .key(key)
            .upload_id(upload_id)
            .send()
            .instrument(tracing::debug_span!("send-abort-multipart-upload"))
            .await
            .map_err(sdk_error)?;
        Ok(())
    }

    async fn get_object(&self, bucket: &str, key: &str) -> Result<GetObjectOutput, StoreError> {
        let resp = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .instrument(tracing::debug_span!("send-get-object"))
            .await
            .map_err(sdk_error)?;

        let content_length = resp.content_length.and_then(|len| u64::try_from(len).ok());
        let body = futures_util::stream::unfold(resp.body, |mut body| async move {
            body.next()
                .await
                .map(|chunk| (chunk.map_err(StoreError::new), body))
        });

        Ok(GetObjectOutput {
            e_tag: resp.e_tag,
            content_length,
            body: ObjectBody::from_stream(body),
        })
    }
}
