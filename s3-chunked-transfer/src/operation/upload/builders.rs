/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::sync::Arc;

use crate::error::Error;
use crate::io::InputStream;
use crate::types::FailedMultipartUploadPolicy;

use super::{UploadHandle, UploadInputBuilder};

/// Fluent builder for constructing a single object upload transfer
#[derive(Debug)]
pub struct UploadFluentBuilder {
    handle: Arc<crate::client::Handle>,
    inner: UploadInputBuilder,
}

impl UploadFluentBuilder {
    pub(crate) fn new(handle: Arc<crate::client::Handle>) -> Self {
        Self {
            handle,
            inner: ::std::default::Default::default(),
        }
    }

    /// Initiate an upload transfer for a single object.
    ///
    /// Opens the source and starts the transfer in the background. A source that can't be
    /// opened fails here with `SourceUnavailable` before any request is sent to the store.
    pub async fn send(self) -> Result<UploadHandle, Error> {
        let input = self.inner.build()?;
        crate::operation::upload::Upload::orchestrate(self.handle, input).await
    }

    /// Object data.
    pub fn body(mut self, input: InputStream) -> Self {
        self.inner = self.inner.body(input);
        self
    }

    /// Object data.
    pub fn set_body(mut self, input: Option<InputStream>) -> Self {
        self.inner = self.inner.set_body(input);
        self
    }

    /// Object data.
    pub fn get_body(&self) -> &Option<InputStream> {
        self.inner.get_body()
    }

    /// The bucket the object is uploaded to.
    ///
    /// This member is required.
    pub fn bucket(mut self, input: impl Into<String>) -> Self {
        self.inner = self.inner.bucket(input);
        self
    }

    /// The bucket the object is uploaded to.
    pub fn set_bucket(mut self, input: Option<String>) -> Self {
        self.inner = self.inner.set_bucket(input);
        self
    }

    /// The bucket the object is uploaded to.
    pub fn get_bucket(&self) -> &Option<String> {
        self.inner.get_bucket()
    }

    /// Object key for which the upload is initiated.
    ///
    /// This member is required.
    pub fn key(mut self, input: impl Into<String>) -> Self {
        self.inner = self.inner.key(input);
        self
    }

    /// Object key for which the upload is initiated.
    pub fn set_key(mut self, input: Option<String>) -> Self {
        self.inner = self.inner.set_key(input);
        self
    }

    /// Object key for which the upload is initiated.
    pub fn get_key(&self) -> &Option<String> {
        self.inner.get_key()
    }

    /// Policy for a multipart upload that fails after it was created.
    ///
    /// Defaults to the client's configured policy.
    pub fn failed_multipart_upload_policy(mut self, policy: FailedMultipartUploadPolicy) -> Self {
        self.inner = self.inner.failed_multipart_upload_policy(policy);
        self
    }

    /// Policy for a multipart upload that fails after it was created.
    pub fn set_failed_multipart_upload_policy(
        mut self,
        policy: Option<FailedMultipartUploadPolicy>,
    ) -> Self {
        self.inner = self.inner.set_failed_multipart_upload_policy(policy);
        self
    }
}

impl crate::operation::upload::input::UploadInputBuilder {
    /// Initiate an upload transfer for a single object with this input using the given client.
    pub async fn send_with(self, client: &crate::Client) -> Result<UploadHandle, Error> {
        let mut fluent_builder = client.upload();
        fluent_builder.inner = self;
        fluent_builder.send().await
    }
}
