/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::default::Default;
use std::fmt;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use bytes::Bytes;
use tokio::io::{AsyncRead, AsyncReadExt, Take};

use crate::error::{self, Error};
use crate::io::ChunkReader;

type BoxReader = Box<dyn AsyncRead + Send + Sync + Unpin>;

/// Reader type produced by opening an [`InputStream`]
pub(crate) type SourceReader = Take<BoxReader>;

/// Source of binary data with a size known up front.
///
/// Nothing is read until the transfer starts. File sources are opened (and their size looked up)
/// only when the upload is sent.
#[derive(Debug)]
pub struct InputStream {
    inner: RawInputStream,
}

impl InputStream {
    /// Create a new `InputStream` from a static byte slice
    pub fn from_static(bytes: &'static [u8]) -> Self {
        Self::from(Bytes::from_static(bytes))
    }

    /// Create a new `InputStream` that reads data from a given `path`.
    ///
    /// The file size is taken when the transfer starts. The contents of the file MUST NOT change
    /// while it is being uploaded.
    ///
    /// # Examples
    /// ```no_run
    /// use s3_chunked_transfer::io::InputStream;
    ///
    /// let stream = InputStream::from_path("docs/rows.csv");
    /// ```
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        Self {
            inner: RawInputStream::Fs(path.as_ref().to_path_buf()),
        }
    }

    /// Create a new `InputStream` from an arbitrary reader producing exactly `content_length`
    /// bytes.
    ///
    /// Bytes past `content_length` are never read. A reader that ends early fails the transfer
    /// with [`ErrorKind::SourceUnavailable`](crate::error::ErrorKind::SourceUnavailable).
    pub fn from_reader<R>(reader: R, content_length: u64) -> Self
    where
        R: AsyncRead + Send + Sync + Unpin + 'static,
    {
        Self {
            inner: RawInputStream::Dyn(DynReader {
                reader: Box::new(reader),
                content_length,
            }),
        }
    }

    /// Returns the size of the stream if it is known without touching the source
    pub fn content_length(&self) -> Option<u64> {
        match &self.inner {
            RawInputStream::Buf(bytes) => Some(bytes.len() as u64),
            RawInputStream::Fs(_) => None,
            RawInputStream::Dyn(dyn_reader) => Some(dyn_reader.content_length),
        }
    }

    /// Open the source and wrap it in a [`ChunkReader`].
    ///
    /// Fails with `SourceUnavailable` if the source can't be opened or its size can't be
    /// determined.
    pub(crate) async fn open(self, chunk_size: usize) -> Result<OpenedInput, Error> {
        let (reader, content_length) = match self.inner {
            RawInputStream::Buf(bytes) => {
                let len = bytes.len() as u64;
                (Box::new(Cursor::new(bytes)) as BoxReader, len)
            }
            RawInputStream::Fs(path) => {
                let file = tokio::fs::File::open(&path).await.map_err(|err| {
                    error::source_unavailable(format!("failed to open {}: {err}", path.display()))
                })?;
                let metadata = file.metadata().await.map_err(error::source_unavailable)?;
                if metadata.is_dir() {
                    return Err(error::source_unavailable(format!(
                        "{} is a directory",
                        path.display()
                    )));
                }
                (Box::new(file) as BoxReader, metadata.len())
            }
            RawInputStream::Dyn(dyn_reader) => (dyn_reader.reader, dyn_reader.content_length),
        };

        Ok(OpenedInput {
            reader: ChunkReader::new(reader.take(content_length), chunk_size),
            content_length,
        })
    }
}

/// An opened source ready to be read chunk by chunk
pub(crate) struct OpenedInput {
    pub(crate) reader: ChunkReader<SourceReader>,
    pub(crate) content_length: u64,
}

impl fmt::Debug for OpenedInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenedInput")
            .field("content_length", &self.content_length)
            .field("total_read", &self.reader.total_read())
            .finish_non_exhaustive()
    }
}

impl OpenedInput {
    /// Fails with `SourceUnavailable` if the source ended before `content_length` bytes were read
    pub(crate) fn ensure_complete(&self) -> Result<(), Error> {
        let read = self.reader.total_read();
        if read < self.content_length {
            return Err(error::source_unavailable(format!(
                "source ended after {read} of {} bytes",
                self.content_length
            )));
        }
        Ok(())
    }
}

#[derive(Debug)]
enum RawInputStream {
    /// In-memory buffer to read from
    Buf(Bytes),
    /// File based input
    Fs(PathBuf),
    /// User provided reader
    Dyn(DynReader),
}

struct DynReader {
    reader: BoxReader,
    content_length: u64,
}

impl fmt::Debug for DynReader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DynReader(dyn AsyncRead)")
            .field("content_length", &self.content_length)
            .finish()
    }
}

impl Default for InputStream {
    fn default() -> Self {
        Self::from(Bytes::default())
    }
}

impl From<Bytes> for InputStream {
    fn from(value: Bytes) -> Self {
        Self {
            inner: RawInputStream::Buf(value),
        }
    }
}

impl From<Vec<u8>> for InputStream {
    fn from(value: Vec<u8>) -> Self {
        Self::from(Bytes::from(value))
    }
}

impl From<&'static [u8]> for InputStream {
    fn from(slice: &'static [u8]) -> InputStream {
        Self::from(Bytes::from_static(slice))
    }
}

impl From<&'static str> for InputStream {
    fn from(slice: &'static str) -> InputStream {
        Self::from(Bytes::from_static(slice.as_bytes()))
    }
}
