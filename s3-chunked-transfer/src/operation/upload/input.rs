/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use aws_smithy_types::error::operation::BuildError;

use crate::io::InputStream;
use crate::types::FailedMultipartUploadPolicy;

/// Input type for uploading a single object
#[non_exhaustive]
#[derive(Debug)]
pub struct UploadInput {
    /// Object data.
    pub body: InputStream,

    /// The bucket the object is uploaded to.
    pub bucket: Option<String>,

    /// Object key for which the upload is initiated.
    pub key: Option<String>,

    /// Overrides the client's policy for a multipart upload that fails after it was created.
    pub failed_multipart_upload_policy: Option<FailedMultipartUploadPolicy>,
}

impl UploadInput {
    /// Creates a new builder-style object to manufacture [`UploadInput`](crate::operation::upload::UploadInput).
    pub fn builder() -> UploadInputBuilder {
        UploadInputBuilder::default()
    }

    /// Take the body, leaving an empty stream in its place
    pub(crate) fn take_body(&mut self) -> InputStream {
        std::mem::take(&mut self.body)
    }

    /// The bucket the object is uploaded to.
    pub fn bucket(&self) -> Option<&str> {
        self.bucket.as_deref()
    }

    /// Object key for which the upload is initiated.
    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    /// The policy override for a failed multipart upload, if any.
    pub fn failed_multipart_upload_policy(&self) -> Option<&FailedMultipartUploadPolicy> {
        self.failed_multipart_upload_policy.as_ref()
    }
}

/// A builder for [`UploadInput`](crate::operation::upload::UploadInput).
#[non_exhaustive]
#[derive(Debug, Default)]
pub struct UploadInputBuilder {
    pub(crate) body: Option<InputStream>,
    pub(crate) bucket: Option<String>,
    pub(crate) key: Option<String>,
    pub(crate) failed_multipart_upload_policy: Option<FailedMultipartUploadPolicy>,
}

impl UploadInputBuilder {
    /// Object data.
    pub fn body(mut self, input: InputStream) -> Self {
        self.body = Some(input);
        self
    }

    /// Object data.
    pub fn set_body(mut self, input: Option<InputStream>) -> Self {
        self.body = input;
        self
    }

    /// Object data.
    pub fn get_body(&self) -> &Option<InputStream> {
        &self.body
    }

    /// The bucket the object is uploaded to.
    ///
    /// This member is required.
    pub fn bucket(mut self, input: impl Into<String>) -> Self {
        self.bucket = Some(input.into());
        self
    }

    /// The bucket the object is uploaded to.
    pub fn set_bucket(mut self, input: Option<String>) -> Self {
        self.bucket = input;
        self
    }

    /// The bucket the object is uploaded to.
    pub fn get_bucket(&self) -> &Option<String> {
        &self.bucket
    }

    /// Object key for which the upload is initiated.
    ///
    /// This member is required.
    pub fn key(mut self, input: impl Into<String>) -> Self {
        self.key = Some(input.into());
        self
    }

    /// Object key for which the upload is initiated.
    pub fn set_key(mut self, input: Option<String>) -> Self {
        self.key = input;
        self
    }

    /// Object key for which the upload is initiated.
    pub fn get_key(&self) -> &Option<String> {
        &self.key
    }

    /// Policy for a multipart upload that fails after it was created.
    pub fn failed_multipart_upload_policy(mut self, policy: FailedMultipartUploadPolicy) -> Self {
        self.failed_multipart_upload_policy = Some(policy);
        self
    }

    /// Policy for a multipart upload that fails after it was created.
    pub fn set_failed_multipart_upload_policy(
        mut self,
        policy: Option<FailedMultipartUploadPolicy>,
    ) -> Self {
        self.failed_multipart_upload_policy = policy;
        self
    }

    /// Policy for a multipart upload that fails after it was created.
    pub fn get_failed_multipart_upload_policy(&self) -> &Option<FailedMultipartUploadPolicy> {
        &self.failed_multipart_upload_policy
    }

    /// Consumes the builder and constructs a [`UploadInput`](crate::operation::upload::UploadInput).
    ///
    /// Fails if the bucket or key is missing or empty.
    pub fn build(self) -> Result<UploadInput, BuildError> {
        let bucket = self.bucket.filter(|b| !b.is_empty()).ok_or_else(|| {
            BuildError::missing_field("bucket", "a bucket is required to upload an object")
        })?;
        let key = self.key.filter(|k| !k.is_empty()).ok_or_else(|| {
            BuildError::missing_field("key", "a key is required to upload an object")
        })?;

        Ok(UploadInput {
            body: self.body.unwrap_or_default(),
            bucket: Some(bucket),
            key: Some(key),
            failed_multipart_upload_policy: self.failed_multipart_upload_policy,
        })
    }
}
