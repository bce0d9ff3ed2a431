//! Error types that can be emitted from this library

use miette::Diagnostic;
use thiserror::Error;

/// Error type for library
#[derive(Error, Diagnostic, Debug)]
pub enum Error {
    /// Transparent wrapper for [`std::io::Error`]
    #[error(transparent)]
    IOError(#[from] std::io::Error),

    /// Transparent wrapper for [`binrw::Error`]
    #[error(transparent)]
    BinRWError(#[from] binrw::Error),

    /// file is an invalid vp archive
    #[error("file is an invalid vp archive")]
    InvalidArchive(#[from] FormatError),

    /// path {0} does not exist in the archive
    #[error("path {0} does not exist in the archive")]
    PathNotFound(String),

    /// entry name {0:?} does not fit in 31 bytes
    #[error("entry name {0:?} does not fit in 31 bytes")]
    NameTooLong(String),

    /// entry name {0:?} cannot be stored in a vp archive
    #[error("entry name {0:?} cannot be stored in a vp archive")]
    InvalidName(String),

    /// file {0} is empty and would be read back as a directory
    #[error("file {0} is empty and would be read back as a directory")]
    #[diagnostic(help("remove the file or pack with empty files skipped"))]
    EmptyFile(String),

    /// archive would exceed the 4 GiB offset range
    #[error("archive would exceed the 4 GiB offset range")]
    ArchiveTooLarge,

    /// {field} of {name} was planned as {expected} but is {actual}
    #[error("{field} of {name} was planned as {expected} but is {actual}")]
    LayoutMismatch {
        name: String,
        field: &'static str,
        expected: u32,
        actual: u64,
    },

    /// {0}
    #[error("{0}")]
    CustomError(String),
}

/// Error type to provide further information when an archive cannot be decoded
#[derive(Error, Diagnostic, Debug, PartialEq, Eq)]
pub enum FormatError {
    /// expected magic "VPVP", found {0:?}
    #[error("expected magic \"VPVP\", found {0:?}")]
    BadMagic([u8; 4]),

    /// archive is {0} bytes, too short for a header
    #[error("archive is {0} bytes, too short for a header")]
    TruncatedHeader(usize),

    /// directory offset {offset} lies outside the {len} byte archive
    #[error("directory offset {offset} lies outside the {len} byte archive")]
    DirectoryOutOfRange { offset: u32, len: usize },

    /// record at {position} runs past the end of the archive
    #[error("record at {position} runs past the end of the archive")]
    TruncatedRecord { position: usize },

    /// payload of {name} ({offset}+{size}) runs past the end of the archive
    #[error("payload of {name} ({offset}+{size}) runs past the end of the archive")]
    PayloadOutOfRange { name: String, offset: u32, size: u32 },

    /// directories nest deeper than {0} levels
    #[error("directories nest deeper than {0} levels")]
    NestingTooDeep(usize),

    /// entry name {0:?} is not safe to extract
    #[error("entry name {0:?} is not safe to extract")]
    UnsafeName(String),
}

/// Generic result type with crate's Error as its error variant
pub type Result<T> = core::result::Result<T, Error>;
