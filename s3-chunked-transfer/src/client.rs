/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::sync::Arc;

use crate::metrics::unit::ByteUnit;
use crate::metrics::ClientMetrics;
use crate::store::ObjectStore;
use crate::Config;

/// Transfer client for S3-compatible object stores.
///
/// Cheap to clone, clones share configuration and metrics.
#[derive(Debug, Clone)]
pub struct Client {
    pub(crate) handle: Arc<Handle>,
}

/// Whatever is needed to carry out operations, e.g. config and metrics
#[derive(Debug)]
pub(crate) struct Handle {
    pub(crate) config: crate::Config,
    pub(crate) metrics: ClientMetrics,
}

impl Handle {
    /// The store to send requests to
    pub(crate) fn store(&self) -> &Arc<dyn ObjectStore> {
        self.config.store()
    }

    /// Number of bytes to read from a source at a time
    pub(crate) fn chunk_size_bytes(&self) -> usize {
        // validated to fit when the config was built
        self.config.chunk_size() as usize
    }

    /// Payload size at which uploads switch to multipart, also the part size
    pub(crate) fn part_size_bytes(&self) -> u64 {
        self.config.part_size()
    }
}

impl Drop for Handle {
    fn drop(&mut self) {
        tracing::debug!(
            "Client metrics summary - Transfers initiated: {}, completed: {}, failed: {}, parts uploaded: {}, total bytes: {}",
            self.metrics.transfers_initiated(),
            self.metrics.transfers_completed(),
            self.metrics.transfers_failed(),
            self.metrics.parts_uploaded(),
            ByteUnit::display(self.metrics.total_bytes_transferred())
        );
    }
}

impl Client {
    /// Creates a new client from a transfer config.
    pub fn new(config: Config) -> Client {
        let handle = Arc::new(Handle {
            config,
            metrics: ClientMetrics::new(),
        });
        Client { handle }
    }

    /// Returns the client's configuration
    pub fn config(&self) -> &Config {
        &self.handle.config
    }

    /// Returns the client's metrics
    pub fn metrics(&self) -> &ClientMetrics {
        &self.handle.metrics
    }

    /// Upload a single object.
    ///
    /// Payloads smaller than the configured part size are sent with one `PutObject` request,
    /// anything else is streamed as a multipart upload.
    ///
    /// Constructs a fluent builder for the
    /// [`Upload`](crate::operation::upload::builders::UploadFluentBuilder) operation.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use std::error::Error;
    /// use std::path::Path;
    /// use s3_chunked_transfer::io::InputStream;
    ///
    /// async fn upload_file(
    ///     client: &s3_chunked_transfer::Client,
    ///     path: impl AsRef<Path>
    /// ) -> Result<(), Box<dyn Error>> {
    ///     let handle = client.upload()
    ///         .bucket("my-bucket")
    ///         .key("my-key")
    ///         .body(InputStream::from_path(path))
    ///         .send()
    ///         .await?;
    ///
    ///     // send() returns once the source is open and the transfer has been started.
    ///     // Call `join()` on the returned handle to wait for the transfer to finish.
    ///     let response = handle.join().await?;
    ///     println!("uploaded {} bytes", response.bytes_transferred());
    ///     Ok(())
    /// }
    /// ```
    pub fn upload(&self) -> crate::operation::upload::builders::UploadFluentBuilder {
        crate::operation::upload::builders::UploadFluentBuilder::new(self.handle.clone())
    }

    /// Download a single object to a local file.
    ///
    /// Constructs a fluent builder for the
    /// [`Download`](crate::operation::download::builders::DownloadFluentBuilder) operation.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use std::error::Error;
    ///
    /// async fn get_object(client: &s3_chunked_transfer::Client) -> Result<(), Box<dyn Error>> {
    ///     let output = client
    ///         .download()
    ///         .bucket("my-bucket")
    ///         .key("my-key")
    ///         .destination("downloaded-my-key")
    ///         .send()
    ///         .await?;
    ///
    ///     println!("wrote {} bytes", output.bytes_written());
    ///     Ok(())
    /// }
    /// ```
    pub fn download(&self) -> crate::operation::download::builders::DownloadFluentBuilder {
        crate::operation::download::builders::DownloadFluentBuilder::new(self.handle.clone())
    }
}
