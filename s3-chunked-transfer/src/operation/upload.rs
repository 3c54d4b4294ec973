/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

/// Operation builders
pub mod builders;
mod input;
mod output;

mod context;
mod direct;
mod handle;
mod multipart;
mod planner;

use std::sync::Arc;

use aws_smithy_types::error::display::DisplayErrorContext;
use tracing::Instrument;

use crate::error;
use crate::io::OpenedInput;
use crate::types::{FailedMultipartUploadPolicy, TransferStrategy};
use context::UploadContext;
pub use direct::DirectUploader;
pub use handle::UploadHandle;
/// Request type for uploads
pub use input::{UploadInput, UploadInputBuilder};
pub use multipart::{MultipartSession, SessionState};
/// Response type for uploads
pub use output::UploadOutput;
pub use planner::decide;

/// Operation struct for single object upload
#[derive(Clone, Default, Debug)]
pub(crate) struct Upload;

impl Upload {
    /// Execute a single `Upload` transfer operation
    pub(crate) async fn orchestrate(
        handle: Arc<crate::client::Handle>,
        mut input: UploadInput,
    ) -> Result<UploadHandle, error::Error> {
        let body = input.take_body().open(handle.chunk_size_bytes()).await?;
        let strategy = decide(body.content_length, handle.part_size_bytes());
        tracing::debug!(
            "uploading {} bytes to {}/{} using {strategy:?} strategy",
            body.content_length,
            input.bucket().unwrap_or_default(),
            input.key().unwrap_or_default(),
        );

        handle.metrics.increment_transfers_initiated();
        let ctx = UploadContext::new(handle, input);
        let task = tokio::spawn(
            upload(ctx.clone(), body, strategy).instrument(tracing::debug_span!("upload")),
        );
        Ok(UploadHandle::new(ctx, task))
    }
}

async fn upload(
    ctx: UploadContext,
    body: OpenedInput,
    strategy: TransferStrategy,
) -> Result<UploadOutput, error::Error> {
    let result = match strategy {
        TransferStrategy::Direct => upload_direct(&ctx, body).await,
        TransferStrategy::Multipart => upload_multipart(&ctx, body).await,
    };

    let metrics = &ctx.handle.metrics;
    match &result {
        Ok(output) => {
            metrics.increment_transfers_completed();
            metrics.add_bytes_transferred(output.bytes_transferred);
        }
        Err(err) => {
            tracing::error!("upload failed: {}", DisplayErrorContext(err));
            metrics.increment_transfers_failed();
        }
    }
    result
}

async fn upload_direct(
    ctx: &UploadContext,
    mut body: OpenedInput,
) -> Result<UploadOutput, error::Error> {
    let uploader = DirectUploader::new(ctx.store().clone());
    let resp = uploader
        .upload(
            &mut body.reader,
            body.content_length,
            ctx.bucket(),
            ctx.key(),
        )
        .await?;

    Ok(UploadOutput {
        strategy: TransferStrategy::Direct,
        e_tag: resp.e_tag,
        upload_id: None,
        location: None,
        parts: Vec::new(),
        bytes_transferred: body.content_length,
    })
}

async fn upload_multipart(
    ctx: &UploadContext,
    mut body: OpenedInput,
) -> Result<UploadOutput, error::Error> {
    let part_size = ctx.handle.part_size_bytes();
    tracing::trace!("upload request using multipart upload with part size: {part_size} bytes");

    let mut session = MultipartSession::new(
        ctx.store().clone(),
        ctx.bucket(),
        ctx.key(),
        part_size,
        ctx.handle.chunk_size_bytes(),
    );
    session.initiate().await?;
    if let Some(upload_id) = session.upload_id() {
        ctx.set_upload_id(upload_id);
    }

    match stream_parts(ctx, &mut session, &mut body).await {
        Ok(resp) => {
            let upload_id = ctx.take_upload_id();
            Ok(UploadOutput {
                strategy: TransferStrategy::Multipart,
                e_tag: resp.e_tag,
                upload_id,
                location: resp.location,
                bytes_transferred: session.bytes_uploaded(),
                parts: session.parts().to_vec(),
            })
        }
        Err(err) => {
            handle_failed_upload(ctx, &mut session).await;
            Err(err)
        }
    }
}

/// Read the source chunk by chunk, uploading a part whenever the buffer reaches the part size
async fn stream_parts(
    ctx: &UploadContext,
    session: &mut MultipartSession,
    body: &mut OpenedInput,
) -> Result<crate::store::CompleteMultipartUploadOutput, error::Error> {
    while let Some(chunk) = body.reader.next_chunk().await? {
        tracing::trace!(
            "read {} bytes ({}/{})",
            chunk.len(),
            body.reader.total_read(),
            body.content_length
        );
        session.accept(chunk.data())?;
        if session.maybe_flush(false).await?.is_some() {
            ctx.handle.metrics.increment_parts_uploaded();
        }
    }
    body.ensure_complete()?;

    if session.maybe_flush(true).await?.is_some() {
        ctx.handle.metrics.increment_parts_uploaded();
    }
    session.finalize().await
}

/// Apply the failed multipart upload policy.
///
/// Errors aborting the upload are logged, the original failure is what the caller sees. The
/// upload ID stays with the context until the abort request has returned, so a handle that
/// cancels the task mid-abort can still clean up.
async fn handle_failed_upload(ctx: &UploadContext, session: &mut MultipartSession) {
    let Some(upload_id) = ctx.upload_id() else {
        return;
    };

    match ctx.failed_multipart_upload_policy() {
        FailedMultipartUploadPolicy::Retain => {
            tracing::warn!(
                "multipart upload {upload_id} for {}/{} failed, uploaded parts are retained",
                ctx.bucket(),
                ctx.key()
            );
        }
        FailedMultipartUploadPolicy::AbortUpload => {
            if let Err(err) = session.abort().await {
                tracing::error!(
                    "failed to abort multipart upload {upload_id}: {}",
                    DisplayErrorContext(&err)
                );
            } else {
                tracing::debug!("aborted multipart upload {upload_id}");
            }
        }
    }
    ctx.take_upload_id();
}
