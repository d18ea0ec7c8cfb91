//! In-memory backing file with fault injection

use std::sync::Arc;

use parking_lot::Mutex;

use super::{FileError, FileStatus, SettingsFile};

/// Failures a [`MemorySettingsFile`] reports on demand
///
/// Each flag makes the matching operation fail with
/// [`FileError::Injected`] until it is cleared.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MemoryFaults {
    /// Fail `open_for_read`
    pub open_for_read: bool,
    /// Fail `open_for_write`
    pub open_for_write: bool,
    /// Fail every `read_line`
    pub read_line: bool,
    /// Fail every `write`
    pub write: bool,
    /// Fail `close`; the session is still ended
    pub close: bool,
    /// Accept this many writes per session, then fail the rest
    pub write_after: Option<usize>,
}

#[derive(Debug, Default)]
struct MemoryState {
    data: Vec<u8>,
    cursor: usize,
    writes: usize,
    status: FileStatus,
    faults: MemoryFaults,
}

/// Settings file held in memory
///
/// Clones share the same buffer, so a test can keep a handle after moving
/// another into a registry and inspect or corrupt what was stored.
#[derive(Debug, Clone, Default)]
pub struct MemorySettingsFile {
    shared: Arc<Mutex<MemoryState>>,
}

impl MemorySettingsFile {
    /// Create an empty file
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a file holding `contents`
    pub fn with_contents(contents: impl Into<Vec<u8>>) -> Self {
        let file = Self::new();
        file.set_contents(contents);
        file
    }

    /// Copy of the current contents
    pub fn contents(&self) -> Vec<u8> {
        self.shared.lock().data.clone()
    }

    /// Replace the contents
    pub fn set_contents(&self, contents: impl Into<Vec<u8>>) {
        let mut state = self.shared.lock();
        state.data = contents.into();
        state.cursor = 0;
    }

    /// Flip every bit of the byte at `offset`; returns false if out of range
    pub fn corrupt_byte(&self, offset: usize) -> bool {
        let mut state = self.shared.lock();
        match state.data.get_mut(offset) {
            Some(byte) => {
                *byte = !*byte;
                true
            }
            None => false,
        }
    }

    /// Install the failures to report from now on
    pub fn set_faults(&self, faults: MemoryFaults) {
        self.shared.lock().faults = faults;
    }

    /// Clear all injected failures
    pub fn clear_faults(&self) {
        self.set_faults(MemoryFaults::default());
    }
}

impl SettingsFile for MemorySettingsFile {
    fn open_for_read(&mut self) -> Result<(), FileError> {
        let mut state = self.shared.lock();
        if state.status != FileStatus::Closed {
            return Err(FileError::AlreadyOpen(state.status));
        }
        if state.faults.open_for_read {
            return Err(FileError::Injected("open_for_read"));
        }
        state.cursor = 0;
        state.status = FileStatus::OpenForRead;
        Ok(())
    }

    fn open_for_write(&mut self) -> Result<(), FileError> {
        let mut state = self.shared.lock();
        if state.status != FileStatus::Closed {
            return Err(FileError::AlreadyOpen(state.status));
        }
        if state.faults.open_for_write {
            return Err(FileError::Injected("open_for_write"));
        }
        state.data.clear();
        state.cursor = 0;
        state.writes = 0;
        state.status = FileStatus::OpenForWrite;
        Ok(())
    }

    fn write(&mut self, data: &[u8]) -> Result<(), FileError> {
        let mut state = self.shared.lock();
        match state.status {
            FileStatus::OpenForWrite => {}
            FileStatus::Closed => return Err(FileError::NotOpen),
            other => return Err(FileError::WrongMode(other)),
        }
        if state.faults.write {
            return Err(FileError::Injected("write"));
        }
        if state
            .faults
            .write_after
            .is_some_and(|budget| state.writes >= budget)
        {
            return Err(FileError::Injected("write"));
        }
        state.writes += 1;
        state.data.extend_from_slice(data);
        Ok(())
    }

    fn read_line(&mut self) -> Result<Option<Vec<u8>>, FileError> {
        let mut state = self.shared.lock();
        match state.status {
            FileStatus::OpenForRead => {}
            FileStatus::Closed => return Err(FileError::NotOpen),
            other => return Err(FileError::WrongMode(other)),
        }
        if state.faults.read_line {
            return Err(FileError::Injected("read_line"));
        }

        let start = state.cursor;
        if start >= state.data.len() {
            return Ok(None);
        }
        let end = state.data[start..]
            .iter()
            .position(|&b| b == b'\n')
            .map_or(state.data.len(), |pos| start + pos + 1);
        state.cursor = end;
        Ok(Some(state.data[start..end].to_vec()))
    }

    fn close(&mut self) -> Result<(), FileError> {
        let mut state = self.shared.lock();
        if state.status == FileStatus::Closed {
            return Err(FileError::NotOpen);
        }
        state.status = FileStatus::Closed;
        if state.faults.close {
            return Err(FileError::Injected("close"));
        }
        Ok(())
    }

    fn force_close(&mut self) {
        self.shared.lock().status = FileStatus::Closed;
    }

    fn status(&self) -> FileStatus {
        self.shared.lock().status
    }
}
