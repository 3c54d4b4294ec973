/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

/// Fixed-size chunked reading
mod chunk_reader;
mod stream;

// re-exports
pub use self::chunk_reader::Chunk;
pub use self::chunk_reader::ChunkReader;
pub(crate) use self::stream::OpenedInput;
pub use self::stream::InputStream;
