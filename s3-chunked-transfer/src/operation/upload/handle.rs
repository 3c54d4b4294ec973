/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use aws_smithy_types::error::display::DisplayErrorContext;
use tokio::task::JoinHandle;
use tracing::Instrument;

use crate::error::{self, ErrorKind};
use crate::operation::upload::context::UploadContext;
use crate::operation::upload::UploadOutput;
use crate::types::{AbortedUpload, FailedMultipartUploadPolicy};

/// Response type for a single upload object request.
///
/// # Cancellation
///
/// The operation can be cancelled either by dropping this handle or by calling
/// [`Self::abort`].
///
/// When the handle is dropped the transfer keeps running in the background until it completes
/// or fails, the result is discarded.
///
/// Calling [`Self::abort`] stops the transfer at its next await point and, unless the failed
/// upload policy is [`FailedMultipartUploadPolicy::Retain`], invokes `AbortMultipartUpload` for
/// a multipart upload that was started but not completed.
///
/// In either case, if the upload has already completed the object is not deleted. This includes
/// a transfer cancelled while the store was completing it: the store no longer knows the upload,
/// so the abort is treated as having nothing left to do.
#[derive(Debug)]
#[non_exhaustive]
pub struct UploadHandle {
    /// The task driving the transfer
    task: JoinHandle<Result<UploadOutput, crate::error::Error>>,
    /// The context used to drive an upload to completion
    pub(crate) ctx: UploadContext,
}

impl UploadHandle {
    pub(crate) fn new(
        ctx: UploadContext,
        task: JoinHandle<Result<UploadOutput, crate::error::Error>>,
    ) -> Self {
        Self { task, ctx }
    }

    /// Consume the handle and wait for upload to complete
    #[tracing::instrument(skip_all, level = "debug", name = "join-upload")]
    pub async fn join(self) -> Result<UploadOutput, crate::error::Error> {
        self.task.await?
    }

    /// Abort the upload and discard any parts already stored.
    #[tracing::instrument(skip_all, level = "debug", name = "abort-upload")]
    pub async fn abort(self) -> Result<AbortedUpload, crate::error::Error> {
        self.task.abort();
        match self.task.await {
            Ok(Ok(_)) => {
                tracing::debug!("upload already completed, nothing to abort");
                return Ok(AbortedUpload::default());
            }
            Ok(Err(err)) => {
                tracing::debug!("upload already failed: {}", DisplayErrorContext(&err));
            }
            Err(err) if err.is_cancelled() => {
                self.ctx.handle.metrics.increment_transfers_failed();
            }
            Err(err) => return Err(err.into()),
        }

        let Some(upload_id) = self.ctx.take_upload_id() else {
            return Ok(AbortedUpload::default());
        };

        match self.ctx.failed_multipart_upload_policy() {
            FailedMultipartUploadPolicy::Retain => {
                tracing::warn!("retaining parts of cancelled multipart upload {upload_id}");
                Ok(AbortedUpload::default())
            }
            FailedMultipartUploadPolicy::AbortUpload => {
                let result = self
                    .ctx
                    .store()
                    .abort_multipart_upload(self.ctx.bucket(), self.ctx.key(), &upload_id)
                    .instrument(tracing::debug_span!("abort-multipart-upload"))
                    .await;

                match result {
                    Ok(()) => Ok(AbortedUpload {
                        upload_id: Some(upload_id),
                    }),
                    // completed or cleaned up before the task stopped
                    Err(err) if err.is_not_found() => {
                        tracing::debug!(
                            "multipart upload {upload_id} no longer exists, nothing to abort"
                        );
                        Ok(AbortedUpload::default())
                    }
                    Err(err) => Err(error::Error::new(ErrorKind::AbortFailed, err)),
                }
            }
        }
    }
}
