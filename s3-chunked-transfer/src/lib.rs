/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

/* Automatically managed default lints */
#![cfg_attr(docsrs, feature(doc_auto_cfg))]
/* End of automatically managed default lints */
#![warn(
    missing_debug_implementations,
    missing_docs,
    rustdoc::missing_crate_level_docs,
    unreachable_pub,
    rust_2018_idioms
)]

//! Streaming uploads and downloads for S3-compatible object stores.
//!
//! Local data is read in fixed-size chunks and never held in memory as a whole once it is large
//! enough to matter. Payloads smaller than the configured part size are sent with a single
//! `PutObject` request, everything else goes through a multipart upload whose part buffer is
//! bounded by `part_size + chunk_size` bytes regardless of the size of the source.
//!
//! # Examples
//!
//! Upload a file to a local MinIO server:
//!
//! ```no_run
//! # async fn example() -> Result<(), s3_chunked_transfer::error::Error> {
//! use s3_chunked_transfer::io::InputStream;
//!
//! let config = s3_chunked_transfer::from_env()
//!     .endpoint("localhost:9000")
//!     .credentials("minioadmin", "minioadmin")
//!     .use_tls(false)
//!     .load()
//!     .await?;
//! let client = s3_chunked_transfer::Client::new(config);
//!
//! let handle = client
//!     .upload()
//!     .bucket("video")
//!     .key("movie.mp4")
//!     .body(InputStream::from_path("movie.mp4"))
//!     .send()
//!     .await?;
//!
//! let output = handle.join().await?;
//! println!("uploaded with etag {:?}", output.e_tag());
//! # Ok(())
//! # }
//! ```
//!
//! See the documentation for each client operation for more information:
//!
//! * [`upload`](crate::Client::upload) - upload a single object
//! * [`download`](crate::Client::download) - download a single object to a local file

/// Number of bytes read from a source per chunk unless configured otherwise (32 KiB)
pub(crate) const DEFAULT_CHUNK_SIZE: u64 = 32 * 1024;

/// Multipart threshold and part size unless configured otherwise (5 MiB)
pub(crate) const DEFAULT_PART_SIZE: u64 = 5 * metrics::unit::ByteUnit::Mebibyte.as_bytes_u64();

/// Error types emitted by `s3-chunked-transfer`
pub mod error;

/// Common types used by `s3-chunked-transfer`
pub mod types;

/// Types and helpers for I/O
pub mod io;

/// Object store abstraction and implementations
pub mod store;

/// Transfer client
pub mod client;

/// Transfer operations
pub mod operation;

/// Transfer configuration
pub mod config;

/// Metrics
pub mod metrics;

pub use self::client::Client;
use self::config::loader::ConfigLoader;
pub use self::config::Config;

/// Create a config loader
pub fn from_env() -> ConfigLoader {
    ConfigLoader::default()
}
