//! Winner persistence
//!
//! Features:
//! - Versioned JSON envelope around the opaque decision function state
//! - Backup rotation (tmp → save, old save → backup)
//! - Falls back to the backup when the primary file is unreadable

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::PersistenceError;
use crate::optimizer::CandidateId;

/// Current envelope version
pub const WINNER_VERSION: u32 = 1;

/// Best decision function of a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WinnerRecord {
    pub version: u32,
    /// Generation the winner was scored in
    pub generation: u32,
    pub candidate: CandidateId,
    pub fitness: f32,
    /// Opaque decision function state
    pub blob: Vec<u8>,
}

impl WinnerRecord {
    pub fn new(generation: u32, candidate: CandidateId, fitness: f32, blob: Vec<u8>) -> Self {
        Self {
            version: WINNER_VERSION,
            generation,
            candidate,
            fitness,
            blob,
        }
    }
}

fn sibling(path: &Path, extension: &str) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".");
    name.push(extension);
    PathBuf::from(name)
}

/// Backup location for `path`
pub fn backup_path(path: &Path) -> PathBuf {
    sibling(path, "bak")
}

fn io_err(path: &Path) -> impl FnOnce(std::io::Error) -> PersistenceError + '_ {
    move |source| PersistenceError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Write `record` to `path`, keeping the previous file as a backup
pub fn save_winner(path: &Path, record: &WinnerRecord) -> Result<(), PersistenceError> {
    let json = serde_json::to_vec_pretty(record)?;
    let tmp = sibling(path, "tmp");
    fs::write(&tmp, json).map_err(io_err(&tmp))?;

    if path.exists() {
        let backup = backup_path(path);
        fs::rename(path, &backup).map_err(io_err(&backup))?;
    }
    fs::rename(&tmp, path).map_err(io_err(path))?;

    log::info!(
        "Winner saved to {} (generation {}, fitness {:.1})",
        path.display(),
        record.generation,
        record.fitness
    );
    Ok(())
}

fn read_record(path: &Path) -> Result<WinnerRecord, PersistenceError> {
    let json = fs::read(path).map_err(io_err(path))?;
    let record: WinnerRecord = serde_json::from_slice(&json)?;
    if record.version != WINNER_VERSION {
        return Err(PersistenceError::Version {
            found: record.version,
            expected: WINNER_VERSION,
        });
    }
    Ok(record)
}

/// Read the winner at `path`, falling back to its backup
pub fn load_winner(path: &Path) -> Result<WinnerRecord, PersistenceError> {
    match read_record(path) {
        Ok(record) => Ok(record),
        Err(primary) => {
            let backup = backup_path(path);
            log::warn!("Winner at {} unreadable ({primary}); trying backup", path.display());
            read_record(&backup).map_err(|_| PersistenceError::Missing(path.to_path_buf()))
        }
    }
}
