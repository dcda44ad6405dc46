//! Error types shared across the library.
//!
//! Per-class failures are values, never panics: the driver turns every
//! [`LoadError`], [`ClassFileError`] and [`EmitError`] into a
//! [`crate::report::Outcome::Failed`] entry. Only [`GenerateError`] aborts a
//! batch.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::report::FailureKind;

#[derive(Debug, Error)]
pub enum ClassFileError {
    #[error("unexpected end of class file at offset {offset} ({needed} more bytes needed)")]
    Truncated { offset: usize, needed: usize },

    #[error("bad magic number {0:#010x}")]
    BadMagic(u32),

    #[error("unknown constant pool tag {tag} at index {index}")]
    UnknownConstantTag { tag: u8, index: u16 },

    #[error("constant pool index {index} is not a {expected} entry")]
    BadConstant { index: u16, expected: &'static str },

    #[error("constant pool entry {index} is not valid modified UTF-8")]
    BadUtf8 { index: u16 },

    #[error("{0} trailing bytes after the end of the class file")]
    TrailingBytes(usize),

    #[error("constant pool is full")]
    PoolOverflow,

    #[error("malformed method descriptor `{0}`")]
    BadDescriptor(String),

    #[error("{what} too large for a class file ({len} > {max})")]
    TooLarge {
        what: &'static str,
        len: usize,
        max: usize,
    },
}

/// Failure to turn a discovered class name into a parsed class.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("class {0} not found on the classpath")]
    NotFound(String),

    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("malformed class file for {name}: {source}")]
    Malformed {
        name: String,
        #[source]
        source: ClassFileError,
    },

    #[error("{origin} declares class {found}, expected {expected}")]
    WrongName {
        origin: String,
        expected: String,
        found: String,
    },
}

impl LoadError {
    pub fn kind(&self) -> FailureKind {
        match self {
            LoadError::NotFound(_) => FailureKind::NotFound,
            LoadError::Read { .. } => FailureKind::IoError,
            LoadError::Malformed { .. } | LoadError::WrongName { .. } => FailureKind::RewriteError,
        }
    }
}

#[derive(Debug, Error)]
pub enum EmitError {
    #[error("failed to create directory {}: {source}", .path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("class root {} does not exist or is not a directory", .0.display())]
    RootMissing(PathBuf),

    #[error("failed to walk {}: {source}", .root.display())]
    Walk {
        root: PathBuf,
        #[source]
        source: ignore::Error,
    },
}

/// Batch-level failure. Per-class problems never surface here.
#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("failed to create output directory {}: {source}", .path.display())]
    Output {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Scan(#[from] ScanError),
}
