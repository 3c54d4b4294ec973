/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use crate::operation::upload::UploadInput;
use crate::store::ObjectStore;
use crate::types::FailedMultipartUploadPolicy;
use std::sync::{Arc, Mutex};

/// Internal context used to drive a single Upload operation
#[derive(Debug, Clone)]
pub(crate) struct UploadContext {
    /// reference to client handle used to do actual work
    pub(crate) handle: Arc<crate::client::Handle>,
    /// the original request (NOTE: the body will have been taken for processing, only the other fields remain)
    pub(crate) request: Arc<UploadInput>,
    /// the multipart upload ID while a multipart upload is in progress
    upload_id: Arc<Mutex<Option<String>>>,
}

impl UploadContext {
    pub(crate) fn new(handle: Arc<crate::client::Handle>, request: UploadInput) -> Self {
        Self {
            handle,
            request: Arc::new(request),
            upload_id: Default::default(),
        }
    }

    /// The store to send requests to
    pub(crate) fn store(&self) -> &Arc<dyn ObjectStore> {
        self.handle.store()
    }

    pub(crate) fn bucket(&self) -> &str {
        self.request.bucket().unwrap_or_default()
    }

    pub(crate) fn key(&self) -> &str {
        self.request.key().unwrap_or_default()
    }

    /// The request override if set, the client default otherwise
    pub(crate) fn failed_multipart_upload_policy(&self) -> FailedMultipartUploadPolicy {
        self.request
            .failed_multipart_upload_policy()
            .unwrap_or_else(|| self.handle.config.failed_multipart_upload_policy())
            .clone()
    }

    /// Record the upload ID of a multipart upload that has been created
    pub(crate) fn set_upload_id(&self, upload_id: &str) {
        *self.upload_id.lock().expect("lock valid") = Some(upload_id.to_owned());
    }

    /// The upload ID of a multipart upload that is still pending on the store
    pub(crate) fn upload_id(&self) -> Option<String> {
        self.upload_id.lock().expect("lock valid").clone()
    }

    /// Take the upload ID, if the multipart upload has been neither completed nor cleaned up yet
    pub(crate) fn take_upload_id(&self) -> Option<String> {
        self.upload_id.lock().expect("lock valid").take()
    }
}
