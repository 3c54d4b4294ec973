/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

/// Operation builders
pub mod builders;

mod input;
mod output;

use std::path::Path;
use std::sync::Arc;

use aws_smithy_types::error::display::DisplayErrorContext;
use tokio::io::AsyncWriteExt;
use tracing::Instrument;

use crate::error::{self, Error, ErrorKind};
use crate::store::{GetObjectOutput, StoreError};

/// Request type for downloads
pub use self::input::{DownloadInput, DownloadInputBuilder};
/// Response type for downloads
pub use self::output::DownloadOutput;

/// Operation struct for single object download
#[derive(Clone, Default, Debug)]
pub(crate) struct Download;

impl Download {
    /// Execute a single `Download` transfer operation
    pub(crate) async fn orchestrate(
        handle: Arc<crate::client::Handle>,
        input: DownloadInput,
    ) -> Result<DownloadOutput, Error> {
        let bucket = input.bucket().unwrap_or_default();
        let key = input.key().unwrap_or_default();
        let destination = input
            .destination()
            .ok_or_else(|| error::invalid_input("a destination path is required"))?;

        handle.metrics.increment_transfers_initiated();
        let result = download_to_file(&handle, bucket, key, destination)
            .instrument(tracing::debug_span!("download", bucket, key))
            .await;

        match &result {
            Ok(output) => {
                handle.metrics.increment_transfers_completed();
                handle.metrics.add_bytes_transferred(output.bytes_written);
            }
            Err(err) => {
                tracing::error!("download failed: {}", DisplayErrorContext(err));
                handle.metrics.increment_transfers_failed();
            }
        }
        result
    }
}

fn get_object_error(err: StoreError) -> Error {
    if err.is_not_found() {
        Error::new(ErrorKind::NotFound, err)
    } else {
        Error::new(ErrorKind::DownloadFailed, err)
    }
}

async fn download_to_file(
    handle: &crate::client::Handle,
    bucket: &str,
    key: &str,
    destination: &Path,
) -> Result<DownloadOutput, Error> {
    let resp = handle
        .store()
        .get_object(bucket, key)
        .instrument(tracing::debug_span!("get-object"))
        .await
        .map_err(get_object_error)?;

    // only created once the object is known to exist
    let mut file = tokio::fs::File::create(destination).await?;
    let e_tag = resp.e_tag.clone();
    match write_body(&mut file, resp).await {
        Ok(bytes_written) => {
            tracing::debug!(
                "wrote {bytes_written} bytes to {}",
                destination.display()
            );
            Ok(DownloadOutput {
                bytes_written,
                e_tag,
            })
        }
        Err(err) => {
            drop(file);
            if let Err(remove_err) = tokio::fs::remove_file(destination).await {
                tracing::warn!(
                    "failed to remove partially written {}: {remove_err}",
                    destination.display()
                );
            }
            Err(err)
        }
    }
}

/// Write the body to `file` as it arrives, returning the number of bytes written
async fn write_body(file: &mut tokio::fs::File, resp: GetObjectOutput) -> Result<u64, Error> {
    let GetObjectOutput {
        content_length,
        mut body,
        ..
    } = resp;

    let mut bytes_written = 0u64;
    while let Some(chunk) = body.next().await {
        let chunk = chunk.map_err(error::from_kind(ErrorKind::DownloadFailed))?;
        file.write_all(&chunk).await?;
        bytes_written += chunk.len() as u64;
        tracing::trace!("received {} bytes ({bytes_written} total)", chunk.len());
    }
    file.flush().await?;

    if let Some(expected) = content_length {
        if expected != bytes_written {
            return Err(Error::new(
                ErrorKind::DownloadFailed,
                format!("body ended after {bytes_written} of {expected} bytes"),
            ));
        }
    }
    Ok(bytes_written)
}
