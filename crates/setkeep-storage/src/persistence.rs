//! Store, validate and load passes over a backing file
//!
//! Store writes one data line per non-volatile entry followed by a trailer
//! holding the checksum of every data byte. Validate recomputes that
//! checksum without touching any setting. Load runs validate first and only
//! then parses the file a second time, handing each line to the caller.
//!
//! Every pass ends its file session: `close` on success, `force_close` on
//! any error, so a failed pass never leaves the file open.

use thiserror::Error;
use tracing::{debug, info, warn};

use setkeep_checksum::RollingChecksum;
use setkeep_formats::{FormatError, SettingLine, Trailer, format_line, is_trailer};

use crate::SettingsError;
use crate::file::{FileError, SettingsFile};
use crate::map::{SettingsMap, Visit};

/// Errors raised by the persistence passes
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// Registry was built without a backing file
    #[error("No backing file configured")]
    NoBackingFile,

    /// Backing file operation failed
    #[error("Backing file error: {0}")]
    File(#[from] FileError),

    /// Line could not be parsed
    #[error("Line {line}: {source}")]
    Format {
        /// One-based line number
        line: usize,
        /// Parse failure
        #[source]
        source: FormatError,
    },

    /// Recomputed checksum differs from the trailer
    #[error("Checksum mismatch: computed {computed}, stored {stored}")]
    ChecksumMismatch {
        /// Checksum over the data lines read
        computed: u32,
        /// Checksum from the trailer, or 0 without a trailer
        stored: u32,
    },

    /// Registry refused a loaded line
    #[error("Setting {key} rejected: {source}")]
    Rejected {
        /// Key of the refused line
        key: String,
        /// Registry failure
        #[source]
        source: Box<SettingsError>,
    },
}

/// Outcome of a store pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreSummary {
    /// Data lines written
    pub written: usize,
    /// Volatile entries left out
    pub skipped_volatile: usize,
    /// Checksum written to the trailer
    pub checksum: u32,
}

/// Outcome of a load pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadSummary {
    /// Data lines handed to the caller
    pub applied: usize,
    /// Checksum the file validated against
    pub checksum: u32,
}

/// Write every non-volatile entry of `settings`, then the trailer
///
/// The previous file contents are discarded when the file is opened. If
/// any write fails the file holds an unspecified prefix of the output.
pub fn store<M: SettingsMap>(
    settings: &M,
    file: &mut dyn SettingsFile,
    checksum: &mut dyn RollingChecksum,
) -> Result<StoreSummary, PersistenceError> {
    checksum.reset();
    file.open_for_write()?;
    let result = write_entries(settings, file, checksum);
    let summary = finish(file, result)?;

    info!(
        "Stored {} settings ({} volatile skipped), checksum {}",
        summary.written, summary.skipped_volatile, summary.checksum
    );
    Ok(summary)
}

fn write_entries<M: SettingsMap>(
    settings: &M,
    file: &mut dyn SettingsFile,
    checksum: &mut dyn RollingChecksum,
) -> Result<StoreSummary, PersistenceError> {
    let mut summary = StoreSummary::default();

    settings.visit_all(|key, setting| -> Result<Visit, PersistenceError> {
        if setting.is_volatile() {
            summary.skipped_volatile += 1;
            return Ok(Visit::Continue);
        }
        if !setting.current().is_persistable() {
            warn!("Setting {key} holds a string that will not load back");
        }

        let line = format_line(key, setting.current());
        file.write(line.as_bytes())?;
        checksum.update(line.as_bytes());
        summary.written += 1;
        Ok(Visit::Continue)
    })?;

    summary.checksum = checksum.value();
    file.write(Trailer::new(summary.checksum).to_line().as_bytes())?;
    Ok(summary)
}

/// Recompute the checksum of `file` and compare it with its trailer
///
/// Returns the validated checksum. A file without a trailer is compared
/// against 0, so an empty file validates.
pub fn validate(
    file: &mut dyn SettingsFile,
    checksum: &mut dyn RollingChecksum,
) -> Result<u32, PersistenceError> {
    checksum.reset();
    file.open_for_read()?;
    let result = scan_checksum(file, checksum);
    finish(file, result)
}

fn scan_checksum(
    file: &mut dyn SettingsFile,
    checksum: &mut dyn RollingChecksum,
) -> Result<u32, PersistenceError> {
    let mut stored = None;
    let mut line_no = 0;

    while let Some(line) = file.read_line()? {
        line_no += 1;
        if is_trailer(&line) {
            let trailer =
                Trailer::parse(&line).map_err(|source| PersistenceError::Format {
                    line: line_no,
                    source,
                })?;
            stored = Some(trailer.checksum);
        } else {
            checksum.update(&line);
        }
    }

    let computed = checksum.value();
    let stored = stored.unwrap_or(0);
    if computed != stored {
        warn!("Settings checksum mismatch: computed {computed}, stored {stored}");
        return Err(PersistenceError::ChecksumMismatch { computed, stored });
    }

    debug!("Settings checksum {computed} valid over {line_no} lines");
    Ok(computed)
}

/// Validate `file`, then parse each data line and pass it to `apply`
///
/// Nothing reaches `apply` unless the whole file validates. The first
/// error from parsing or from `apply` ends the pass; lines applied before
/// it stay applied.
pub fn load<F>(
    file: &mut dyn SettingsFile,
    checksum: &mut dyn RollingChecksum,
    mut apply: F,
) -> Result<LoadSummary, PersistenceError>
where
    F: FnMut(SettingLine) -> Result<(), PersistenceError>,
{
    let validated = validate(file, checksum)?;

    file.open_for_read()?;
    let result = apply_lines(file, &mut apply);
    let applied = finish(file, result)?;

    info!("Loaded {applied} settings, checksum {validated}");
    Ok(LoadSummary {
        applied,
        checksum: validated,
    })
}

fn apply_lines<F>(file: &mut dyn SettingsFile, apply: &mut F) -> Result<usize, PersistenceError>
where
    F: FnMut(SettingLine) -> Result<(), PersistenceError>,
{
    let mut applied = 0;
    let mut line_no = 0;

    while let Some(line) = file.read_line()? {
        line_no += 1;
        if is_trailer(&line) {
            continue;
        }
        let parsed = SettingLine::parse(&line).map_err(|source| {
            warn!("Malformed settings line {line_no}: {source}");
            PersistenceError::Format {
                line: line_no,
                source,
            }
        })?;
        apply(parsed)?;
        applied += 1;
    }

    Ok(applied)
}

fn finish<T>(
    file: &mut dyn SettingsFile,
    result: Result<T, PersistenceError>,
) -> Result<T, PersistenceError> {
    match result {
        Ok(value) => {
            file.close()?;
            Ok(value)
        }
        Err(err) => {
            file.force_close();
            Err(err)
        }
    }
}
