/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::path::{Path, PathBuf};

use aws_smithy_types::error::operation::BuildError;

/// Request type for downloading a single object to a local file
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct DownloadInput {
    /// The bucket containing the object.
    pub bucket: Option<String>,

    /// Key of the object to download.
    pub key: Option<String>,

    /// Local file the object is written to. Created or truncated.
    pub destination: Option<PathBuf>,
}

impl DownloadInput {
    /// Creates a new builder-style object to manufacture [`DownloadInput`](crate::operation::download::DownloadInput).
    pub fn builder() -> DownloadInputBuilder {
        DownloadInputBuilder::default()
    }

    /// The bucket containing the object.
    pub fn bucket(&self) -> Option<&str> {
        self.bucket.as_deref()
    }

    /// Key of the object to download.
    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    /// Local file the object is written to.
    pub fn destination(&self) -> Option<&Path> {
        self.destination.as_deref()
    }
}

/// A builder for [`DownloadInput`](crate::operation::download::DownloadInput).
#[non_exhaustive]
#[derive(Debug, Clone, Default)]
pub struct DownloadInputBuilder {
    pub(crate) bucket: Option<String>,
    pub(crate) key: Option<String>,
    pub(crate) destination: Option<PathBuf>,
}

impl DownloadInputBuilder {
    /// The bucket containing the object.
    ///
    /// This member is required.
    pub fn bucket(mut self, input: impl Into<String>) -> Self {
        self.bucket = Some(input.into());
        self
    }

    /// The bucket containing the object.
    pub fn set_bucket(mut self, input: Option<String>) -> Self {
        self.bucket = input;
        self
    }

    /// The bucket containing the object.
    pub fn get_bucket(&self) -> &Option<String> {
        &self.bucket
    }

    /// Key of the object to download.
    ///
    /// This member is required.
    pub fn key(mut self, input: impl Into<String>) -> Self {
        self.key = Some(input.into());
        self
    }

    /// Key of the object to download.
    pub fn set_key(mut self, input: Option<String>) -> Self {
        self.key = input;
        self
    }

    /// Key of the object to download.
    pub fn get_key(&self) -> &Option<String> {
        &self.key
    }

    /// Local file the object is written to.
    ///
    /// This member is required.
    pub fn destination(mut self, input: impl AsRef<Path>) -> Self {
        self.destination = Some(input.as_ref().to_path_buf());
        self
    }

    /// Local file the object is written to.
    pub fn set_destination(mut self, input: Option<PathBuf>) -> Self {
        self.destination = input;
        self
    }

    /// Local file the object is written to.
    pub fn get_destination(&self) -> &Option<PathBuf> {
        &self.destination
    }

    /// Consumes the builder and constructs a [`DownloadInput`](crate::operation::download::DownloadInput).
    pub fn build(self) -> Result<DownloadInput, BuildError> {
        if self.bucket.as_deref().map_or(true, str::is_empty) {
            return Err(BuildError::missing_field(
                "bucket",
                "a bucket is required to download an object",
            ));
        }
        if self.key.as_deref().map_or(true, str::is_empty) {
            return Err(BuildError::missing_field(
                "key",
                "a key is required to download an object",
            ));
        }
        if self.destination.is_none() {
            return Err(BuildError::missing_field(
                "destination",
                "a destination path is required to download an object",
            ));
        }

        Ok(DownloadInput {
            bucket: self.bucket,
            key: self.key,
            destination: self.destination,
        })
    }
}
