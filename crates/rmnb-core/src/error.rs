//! Error types for the rmnb-core library.
//!
//! Every failure is fatal to the decode that raised it. Failures that happen while a
//! specific archive member is being processed are wrapped in [`Error::Member`], which
//! names the member and the role it was recognized as.

use crate::archive::Role;
use std::num::ParseIntError;
use std::path::PathBuf;
use thiserror::Error;
use zip::result::ZipError;

/// Result type alias for rmnb operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for all rmnb operations
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// Failed to read an input file from disk
    #[error("failed to read file '{path}': {source}")]
    FileRead {
        /// Path to the file that failed to read
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The input is not a readable zip archive
    #[error("invalid notebook archive: {0}")]
    Archive(#[source] ZipError),

    /// The archive contains no members, so no identifier can be derived
    #[error("notebook archive contains no files")]
    MissingArchiveFile,

    /// An archive member could not be opened or read
    #[error("failed to read archive member '{member}': {source}")]
    MemberOpen {
        /// Full name of the member inside the archive
        member: String,
        /// Underlying zip error
        #[source]
        source: ZipError,
    },

    /// The stroke data does not start with the expected header literal
    #[error("stroke data header mismatch: expected {expected:?}")]
    FormatMismatch {
        /// The header literal that was expected
        expected: &'static str,
    },

    /// Fewer bytes remain than a fixed-width field requires
    #[error("truncated input at offset {offset}: need {needed} bytes, {remaining} remaining")]
    TruncatedInput {
        /// Byte offset of the field that could not be read
        offset: usize,
        /// Width of the field
        needed: usize,
        /// Bytes left in the buffer
        remaining: usize,
    },

    /// The metadata member is not valid JSON for the metadata schema
    #[error("failed to decode notebook metadata: {0}")]
    MetadataDecode(#[from] serde_json::Error),

    /// A thumbnail member's base name is not a non-negative page index
    #[error("thumbnail '{member}' is not named after a page index: {source}")]
    ThumbnailIndex {
        /// Full name of the thumbnail member
        member: String,
        /// Parse failure for the base name
        #[source]
        source: ParseIntError,
    },

    /// A failure while processing a recognized archive member
    #[error("failed to decode {role} member '{member}': {source}")]
    Member {
        /// Role the member was recognized as
        role: Role,
        /// Full name of the member inside the archive
        member: String,
        /// The underlying failure
        #[source]
        source: Box<Error>,
    },
}

/// Coarse classification of an [`Error`], looking through member annotations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// See [`Error::FileRead`]
    FileRead,
    /// See [`Error::Archive`]
    Archive,
    /// See [`Error::MissingArchiveFile`]
    MissingArchiveFile,
    /// See [`Error::MemberOpen`]
    MemberOpenFailure,
    /// See [`Error::FormatMismatch`]
    FormatMismatch,
    /// See [`Error::TruncatedInput`]
    TruncatedInput,
    /// See [`Error::MetadataDecode`]
    MetadataDecodeFailure,
    /// See [`Error::ThumbnailIndex`]
    ThumbnailIndexFailure,
}

impl Error {
    /// Creates a new file read error
    pub fn file_read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::FileRead {
            path: path.into(),
            source,
        }
    }

    /// Creates a new member open error
    pub fn member_open(member: impl Into<String>, source: impl Into<ZipError>) -> Self {
        Self::MemberOpen {
            member: member.into(),
            source: source.into(),
        }
    }

    /// Creates a new truncated input error
    pub fn truncated(offset: usize, needed: usize, remaining: usize) -> Self {
        Self::TruncatedInput {
            offset,
            needed,
            remaining,
        }
    }

    /// Creates a new thumbnail index error
    pub fn thumbnail_index(member: impl Into<String>, source: ParseIntError) -> Self {
        Self::ThumbnailIndex {
            member: member.into(),
            source,
        }
    }

    /// Annotates this error with the member and role being processed
    pub fn in_member(self, role: Role, member: impl Into<String>) -> Self {
        Self::Member {
            role,
            member: member.into(),
            source: Box::new(self),
        }
    }

    /// Returns the kind of the underlying failure
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::FileRead { .. } => ErrorKind::FileRead,
            Self::Archive(_) => ErrorKind::Archive,
            Self::MissingArchiveFile => ErrorKind::MissingArchiveFile,
            Self::MemberOpen { .. } => ErrorKind::MemberOpenFailure,
            Self::FormatMismatch { .. } => ErrorKind::FormatMismatch,
            Self::TruncatedInput { .. } => ErrorKind::TruncatedInput,
            Self::MetadataDecode(_) => ErrorKind::MetadataDecodeFailure,
            Self::ThumbnailIndex { .. } => ErrorKind::ThumbnailIndexFailure,
            Self::Member { source, .. } => source.kind(),
        }
    }

    /// Returns the role of the member that failed, if the failure is tied to one
    pub fn role(&self) -> Option<Role> {
        match self {
            Self::Member { role, .. } => Some(*role),
            _ => None,
        }
    }
}
