/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::fmt;

/// A boxed error that is `Send` and `Sync`.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors returned by this library
///
/// The kind names the operation that failed, the underlying store or I/O error is available
/// through [`std::error::Error::source`].
///
/// NOTE: Use [`aws_smithy_types::error::display::DisplayErrorContext`] or similar to display
/// the entire error cause/source chain.
#[derive(Debug)]
pub struct Error {
    kind: ErrorKind,
    source: BoxError,
}

/// General categories of transfer errors.
#[derive(Clone, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub enum ErrorKind {
    /// The local byte source could not be opened or read
    SourceUnavailable,

    /// A single `PutObject` request was rejected by the store
    UploadFailed,

    /// Uploading one part of a multipart upload failed
    PartUploadFailed(PartFailed),

    /// The store rejected the request to start a multipart upload
    InitiateFailed,

    /// The store rejected the request to complete a multipart upload
    CompleteFailed,

    /// The store rejected the request to abort a multipart upload
    AbortFailed,

    /// Fetching an object from the store failed
    DownloadFailed,

    /// Resource not found (e.g. bucket, key, multipart upload ID not found)
    NotFound,

    /// A multipart session was used in a way its current state does not permit
    InvalidState,

    /// Operation input validation issues
    InputInvalid,

    /// I/O errors on the local destination
    IOError,

    /// Some kind of internal runtime issue (e.g. task failure, poisoned mutex, etc)
    RuntimeError,

    /// The operation was cancelled through its handle
    OperationCancelled,
}

/// Stores information about a failed part upload
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PartFailed {
    part_number: u64,
}

impl PartFailed {
    /// The 1-based number of the part that was rejected
    pub fn part_number(&self) -> u64 {
        self.part_number
    }
}

impl Error {
    /// Creates a new transfer [`Error`] from a known kind of error as well as an arbitrary error
    /// source.
    pub fn new<E>(kind: ErrorKind, err: E) -> Error
    where
        E: Into<BoxError>,
    {
        Error {
            kind,
            source: err.into(),
        }
    }

    /// Returns the corresponding [`ErrorKind`] for this error.
    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ErrorKind::SourceUnavailable => write!(f, "source unavailable"),
            ErrorKind::UploadFailed => write!(f, "failed to upload object"),
            ErrorKind::PartUploadFailed(part) => {
                write!(f, "failed to upload part {}", part.part_number)
            }
            ErrorKind::InitiateFailed => write!(f, "failed to create multipart upload"),
            ErrorKind::CompleteFailed => write!(f, "failed to complete multipart upload"),
            ErrorKind::AbortFailed => write!(f, "failed to abort multipart upload"),
            ErrorKind::DownloadFailed => write!(f, "failed to download object"),
            ErrorKind::NotFound => write!(f, "resource not found"),
            ErrorKind::InvalidState => write!(f, "invalid multipart session state"),
            ErrorKind::InputInvalid => write!(f, "invalid input"),
            ErrorKind::IOError => write!(f, "I/O error"),
            ErrorKind::RuntimeError => write!(f, "runtime error"),
            ErrorKind::OperationCancelled => write!(f, "operation cancelled"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(self.source.as_ref())
    }
}

impl From<std::io::Error> for Error {
    fn from(value: std::io::Error) -> Self {
        Self::new(ErrorKind::IOError, value)
    }
}

impl From<tokio::task::JoinError> for Error {
    fn from(value: tokio::task::JoinError) -> Self {
        if value.is_cancelled() {
            return operation_cancelled();
        }
        Self::new(ErrorKind::RuntimeError, value)
    }
}

impl From<aws_smithy_types::error::operation::BuildError> for Error {
    fn from(value: aws_smithy_types::error::operation::BuildError) -> Self {
        Self::new(ErrorKind::InputInvalid, value)
    }
}

impl<T> From<std::sync::PoisonError<T>> for Error
where
    T: Send + Sync + 'static,
{
    fn from(value: std::sync::PoisonError<T>) -> Self {
        Self::new(ErrorKind::RuntimeError, value.to_string())
    }
}

pub(crate) fn invalid_input<E>(err: E) -> Error
where
    E: Into<BoxError>,
{
    Error::new(ErrorKind::InputInvalid, err)
}

pub(crate) fn source_unavailable<E>(err: E) -> Error
where
    E: Into<BoxError>,
{
    Error::new(ErrorKind::SourceUnavailable, err)
}

pub(crate) fn part_failed<E>(part_number: u64, err: E) -> Error
where
    E: Into<BoxError>,
{
    Error::new(ErrorKind::PartUploadFailed(PartFailed { part_number }), err)
}

pub(crate) fn invalid_state<E>(err: E) -> Error
where
    E: Into<BoxError>,
{
    Error::new(ErrorKind::InvalidState, err)
}

pub(crate) fn from_kind<E>(kind: ErrorKind) -> impl FnOnce(E) -> Error
where
    E: Into<BoxError>,
{
    |err| Error::new(kind, err)
}

static CANCELLATION_ERROR: &str = "the transfer was aborted through its handle";

pub(crate) fn operation_cancelled() -> Error {
    Error::new(ErrorKind::OperationCancelled, CANCELLATION_ERROR)
}
