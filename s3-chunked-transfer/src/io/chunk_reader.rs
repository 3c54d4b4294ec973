/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::future::poll_fn;
use std::pin::Pin;
use std::task::{ready, Context, Poll};

use bytes::{BufMut, Bytes, BytesMut};
use futures_util::Stream;
use pin_project_lite::pin_project;
use tokio::io::AsyncRead;
use tokio_util::io::poll_read_buf;

use crate::error::{self, Error};

/// A contiguous run of bytes read from a source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    data: Bytes,
    // number of bytes read from the source before this chunk
    offset: u64,
}

impl Chunk {
    /// The chunk contents
    pub fn data(&self) -> &Bytes {
        &self.data
    }

    /// Number of bytes in this chunk
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true if the chunk holds no bytes
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Position of the first byte of this chunk within the source
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Consume the chunk and return its contents
    pub fn into_bytes(self) -> Bytes {
        self.data
    }
}

pin_project! {
    /// Reads a finite byte source in fixed-size chunks.
    ///
    /// Every chunk is exactly `chunk_size` bytes long except for the last one, which holds
    /// whatever is left. Short reads from the underlying source are coalesced until a chunk is
    /// full or the source reports end of input. The sequence is finite and cannot be restarted.
    /// Only the chunk currently being filled is buffered.
    ///
    /// A read error from the source fails with [`ErrorKind::SourceUnavailable`] and ends the
    /// sequence.
    ///
    /// [`ErrorKind::SourceUnavailable`]: crate::error::ErrorKind::SourceUnavailable
    ///
    /// # Examples
    ///
    /// ```
    /// use s3_chunked_transfer::io::ChunkReader;
    ///
    /// # async fn example() -> Result<(), s3_chunked_transfer::error::Error> {
    /// let mut reader = ChunkReader::new(&b"a lep is a ball"[..], 4);
    /// while let Some(chunk) = reader.next_chunk().await? {
    ///     println!("read {} bytes at offset {}", chunk.len(), chunk.offset());
    /// }
    /// assert_eq!(15, reader.total_read());
    /// # Ok(())
    /// # }
    /// ```
    #[derive(Debug)]
    pub struct ChunkReader<R> {
        #[pin]
        inner: R,
        chunk_size: usize,
        buf: BytesMut,
        total_read: u64,
        done: bool,
    }
}

impl<R> ChunkReader<R> {
    /// Wrap a source, reading it `chunk_size` bytes at a time.
    ///
    /// # Panics
    ///
    /// Panics if `chunk_size` is zero.
    pub fn new(inner: R, chunk_size: usize) -> Self {
        assert!(chunk_size > 0, "chunk size must be greater than zero");
        Self {
            inner,
            chunk_size,
            buf: BytesMut::new(),
            total_read: 0,
            done: false,
        }
    }

    /// The configured chunk size
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Total number of bytes handed out in chunks so far
    pub fn total_read(&self) -> u64 {
        self.total_read
    }

    /// Returns true once end of input (or a read error) has been reached
    pub fn is_done(&self) -> bool {
        self.done
    }
}

impl<R> ChunkReader<R>
where
    R: AsyncRead,
{
    /// Attempt to read the next chunk.
    ///
    /// Returns `Ok(None)` once the source is exhausted.
    pub fn poll_next_chunk(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Result<Option<Chunk>, Error>> {
        let mut this = self.project();
        if *this.done {
            return Poll::Ready(Ok(None));
        }

        while this.buf.len() < *this.chunk_size {
            let want = *this.chunk_size - this.buf.len();
            this.buf.reserve(want);
            let mut dst = (&mut *this.buf).limit(want);
            match ready!(poll_read_buf(this.inner.as_mut(), cx, &mut dst)) {
                Ok(0) => {
                    *this.done = true;
                    break;
                }
                Ok(n) => tracing::trace!("read {n} bytes from source"),
                Err(err) => {
                    *this.done = true;
                    this.buf.clear();
                    return Poll::Ready(Err(error::source_unavailable(err)));
                }
            }
        }

        if this.buf.is_empty() {
            return Poll::Ready(Ok(None));
        }

        let data = this.buf.split().freeze();
        let offset = *this.total_read;
        *this.total_read += data.len() as u64;
        Poll::Ready(Ok(Some(Chunk { data, offset })))
    }

    /// Read the next chunk, or `None` at end of input.
    pub async fn next_chunk(&mut self) -> Result<Option<Chunk>, Error>
    where
        R: Unpin,
    {
        poll_fn(|cx| Pin::new(&mut *self).poll_next_chunk(cx)).await
    }
}

impl<R> Stream for ChunkReader<R>
where
    R: AsyncRead,
{
    type Item = Result<Chunk, Error>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.poll_next_chunk(cx).map(Result::transpose)
    }
}
