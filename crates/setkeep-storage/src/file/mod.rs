//! Backing file abstraction
//!
//! The persistence passes only sequence a handful of calls: open for
//! reading or writing, write bytes, read a line, close. They never see a
//! path or a handle, so the same code drives a file on a host filesystem, a
//! flash-backed file on a device, or an in-memory buffer in tests.

mod fs;
mod memory;

pub use fs::FsSettingsFile;
pub use memory::{MemoryFaults, MemorySettingsFile};

use std::fmt;

use thiserror::Error;

/// Open state of a backing file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FileStatus {
    /// Not open
    #[default]
    Closed,
    /// Open for line reads
    OpenForRead,
    /// Open for writes; the previous contents were discarded on open
    OpenForWrite,
}

impl fmt::Display for FileStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Closed => f.write_str("closed"),
            Self::OpenForRead => f.write_str("open for read"),
            Self::OpenForWrite => f.write_str("open for write"),
        }
    }
}

/// Errors reported by a backing file
#[derive(Debug, Error)]
pub enum FileError {
    /// Operation requires an open file
    #[error("File is not open")]
    NotOpen,

    /// Open requested while the file is already open
    #[error("File is already {0}")]
    AlreadyOpen(FileStatus),

    /// File is open in the other mode
    #[error("File is {0}")]
    WrongMode(FileStatus),

    /// Underlying I/O failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failure injected by a test double
    #[error("Injected failure in {0}")]
    Injected(&'static str),
}

/// Byte-oriented file used to persist settings
///
/// A write session is `open_for_write`, any number of `write`s, `close`. A
/// read session is `open_for_read`, `read_line` until it returns `None`,
/// `close`. `force_close` abandons either session without reporting errors
/// and is what the registry calls on failure paths and at teardown.
pub trait SettingsFile {
    /// Open for reading from the start of the file
    fn open_for_read(&mut self) -> Result<(), FileError>;

    /// Open for writing, discarding previous contents
    fn open_for_write(&mut self) -> Result<(), FileError>;

    /// Append bytes
    fn write(&mut self, data: &[u8]) -> Result<(), FileError>;

    /// Read the next line including its terminating line feed
    ///
    /// The last line may lack the line feed. Returns `None` at end of file.
    fn read_line(&mut self) -> Result<Option<Vec<u8>>, FileError>;

    /// Finish the current session, flushing pending writes
    fn close(&mut self) -> Result<(), FileError>;

    /// Abandon the current session, ignoring errors
    fn force_close(&mut self);

    /// Current open state
    fn status(&self) -> FileStatus;
}

impl<T: SettingsFile + ?Sized> SettingsFile for Box<T> {
    fn open_for_read(&mut self) -> Result<(), FileError> {
        (**self).open_for_read()
    }

    fn open_for_write(&mut self) -> Result<(), FileError> {
        (**self).open_for_write()
    }

    fn write(&mut self, data: &[u8]) -> Result<(), FileError> {
        (**self).write(data)
    }

    fn read_line(&mut self) -> Result<Option<Vec<u8>>, FileError> {
        (**self).read_line()
    }

    fn close(&mut self) -> Result<(), FileError> {
        (**self).close()
    }

    fn force_close(&mut self) {
        (**self).force_close();
    }

    fn status(&self) -> FileStatus {
        (**self).status()
    }
}
