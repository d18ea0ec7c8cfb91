//! Backing file on the host filesystem

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use super::{FileError, FileStatus, SettingsFile};

enum Session {
    Closed,
    Reading(BufReader<File>),
    Writing(BufWriter<File>),
}

/// Settings file stored at a filesystem path
///
/// Opening for write truncates the file. Closing a write session flushes
/// the buffer and syncs the file to disk.
pub struct FsSettingsFile {
    path: PathBuf,
    session: Session,
}

impl FsSettingsFile {
    /// Create a handle for `path`; nothing is opened until a session starts
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            session: Session::Closed,
        }
    }

    /// Path of the file
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn ensure_closed(&self) -> Result<(), FileError> {
        match self.status() {
            FileStatus::Closed => Ok(()),
            open => Err(FileError::AlreadyOpen(open)),
        }
    }
}

impl std::fmt::Debug for FsSettingsFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FsSettingsFile")
            .field("path", &self.path)
            .field("status", &self.status())
            .finish()
    }
}

impl SettingsFile for FsSettingsFile {
    fn open_for_read(&mut self) -> Result<(), FileError> {
        self.ensure_closed()?;
        let file = File::open(&self.path)?;
        debug!("Opened settings file for read: {}", self.path.display());
        self.session = Session::Reading(BufReader::new(file));
        Ok(())
    }

    fn open_for_write(&mut self) -> Result<(), FileError> {
        self.ensure_closed()?;
        let file = File::create(&self.path)?;
        debug!("Opened settings file for write: {}", self.path.display());
        self.session = Session::Writing(BufWriter::new(file));
        Ok(())
    }

    fn write(&mut self, data: &[u8]) -> Result<(), FileError> {
        match &mut self.session {
            Session::Writing(writer) => Ok(writer.write_all(data)?),
            Session::Reading(_) => Err(FileError::WrongMode(FileStatus::OpenForRead)),
            Session::Closed => Err(FileError::NotOpen),
        }
    }

    fn read_line(&mut self) -> Result<Option<Vec<u8>>, FileError> {
        match &mut self.session {
            Session::Reading(reader) => {
                let mut line = Vec::new();
                if reader.read_until(b'\n', &mut line)? == 0 {
                    return Ok(None);
                }
                Ok(Some(line))
            }
            Session::Writing(_) => Err(FileError::WrongMode(FileStatus::OpenForWrite)),
            Session::Closed => Err(FileError::NotOpen),
        }
    }

    fn close(&mut self) -> Result<(), FileError> {
        match std::mem::replace(&mut self.session, Session::Closed) {
            Session::Writing(mut writer) => {
                writer.flush()?;
                writer.get_ref().sync_all()?;
                Ok(())
            }
            Session::Reading(_) => Ok(()),
            Session::Closed => Err(FileError::NotOpen),
        }
    }

    fn force_close(&mut self) {
        // Dropping a BufWriter flushes and discards any error
        self.session = Session::Closed;
    }

    fn status(&self) -> FileStatus {
        match self.session {
            Session::Closed => FileStatus::Closed,
            Session::Reading(_) => FileStatus::OpenForRead,
            Session::Writing(_) => FileStatus::OpenForWrite,
        }
    }
}
