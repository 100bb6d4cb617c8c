//! The action-value table and its on-disk form.
//!
//! ## File Format
//!
//! All numeric values are little-endian; there is no padding.
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │ Magic        : u32 ("OTHQ")                  │
//! │ Version      : u32 (currently 1)             │
//! │ Entry count  : u64                           │
//! ├──────────────────────────────────────────────┤
//! │ Entry 0                                      │
//! │   Black      : u64 bitboard                  │
//! │   White      : u64 bitboard                  │
//! │   Side       : u8 (1 = black, 2 = white)     │
//! │   Action     : u8 (row * 8 + col)            │
//! │   Value      : f64                           │
//! ├──────────────────────────────────────────────┤
//! │ Entry 1                                      │
//! │   ...                                        │
//! └──────────────────────────────────────────────┘
//! ```
//!
//! Entries are written in whatever order the map yields them. The file is
//! always written in full to a temporary file in the same directory and then
//! renamed over the target, so a crash mid-save leaves the previous table.

use std::collections::HashMap;
use std::fs;
use std::io::{BufWriter, Write};
use std::path::Path;

use othello::{ActionKey, StateKey};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::error::QTableError;

const MAGIC: u32 = u32::from_le_bytes(*b"OTHQ");
const VERSION: u32 = 1;
const HEADER_LEN: usize = 16;
const ENTRY_LEN: usize = StateKey::ENCODED_LEN + 1 + 8;

/// Mapping from (state, action) to a value; absent entries read as 0.0.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QTable {
    values: HashMap<(StateKey, ActionKey), f64>,
}

impl QTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, state: &StateKey, action: ActionKey) -> f64 {
        self.values.get(&(*state, action)).copied().unwrap_or(0.0)
    }

    pub fn set(&mut self, state: StateKey, action: ActionKey, value: f64) {
        self.values.insert((state, action), value);
    }

    pub fn contains(&self, state: &StateKey, action: ActionKey) -> bool {
        self.values.contains_key(&(*state, action))
    }

    /// Largest value over `actions` in `state`, or `None` when `actions` is empty.
    pub fn max_over(&self, state: &StateKey, actions: &[(usize, usize)]) -> Option<f64> {
        actions
            .iter()
            .map(|&cell| self.get(state, ActionKey::from(cell)))
            .fold(None, |best, q| Some(best.map_or(q, |b: f64| b.max(q))))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&StateKey, ActionKey, f64)> + '_ {
        self.values.iter().map(|((s, a), v)| (s, *a, *v))
    }

    /// Serializes the whole table in the format described in the module docs.
    pub fn write_to<W: Write>(&self, w: &mut W) -> Result<(), QTableError> {
        w.write_all(&MAGIC.to_le_bytes())?;
        w.write_all(&VERSION.to_le_bytes())?;
        w.write_all(&(self.values.len() as u64).to_le_bytes())?;

        for ((state, action), value) in &self.values {
            w.write_all(&state.to_le_bytes())?;
            w.write_all(&[action.index()])?;
            w.write_all(&value.to_le_bytes())?;
        }
        Ok(())
    }

    /// Parses a complete table file. Any deviation from the format is an error.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, QTableError> {
        if bytes.len() < HEADER_LEN {
            return Err(QTableError::Length { expected: HEADER_LEN as u64, actual: bytes.len() as u64 });
        }

        let magic = read_u32(bytes, 0);
        if magic != MAGIC {
            return Err(QTableError::BadMagic(magic));
        }
        let version = read_u32(bytes, 4);
        if version != VERSION {
            return Err(QTableError::UnsupportedVersion(version));
        }
        let count = read_u64(bytes, 8);

        let expected = count
            .checked_mul(ENTRY_LEN as u64)
            .and_then(|n| n.checked_add(HEADER_LEN as u64))
            .ok_or(QTableError::Length { expected: u64::MAX, actual: bytes.len() as u64 })?;
        if expected != bytes.len() as u64 {
            return Err(QTableError::Length { expected, actual: bytes.len() as u64 });
        }

        let mut values = HashMap::with_capacity(count as usize);
        for (i, entry) in bytes[HEADER_LEN..].chunks_exact(ENTRY_LEN).enumerate() {
            let (key_bytes, rest) = entry.split_at(StateKey::ENCODED_LEN);
            let state = key_bytes
                .try_into()
                .ok()
                .and_then(StateKey::from_le_bytes)
                .ok_or(QTableError::InvalidEntry(i as u64))?;
            let action = ActionKey::from_index(rest[0]).ok_or(QTableError::InvalidEntry(i as u64))?;
            let value = f64::from_bits(read_u64(rest, 1));
            values.insert((state, action), value);
        }

        Ok(QTable { values })
    }

    /// Writes the table to `path` by atomic replace.
    pub fn save(&self, path: &Path) -> Result<(), QTableError> {
        let dir = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir)?;

        let tmp = NamedTempFile::new_in(dir)?;
        {
            let mut w = BufWriter::new(tmp.as_file());
            self.write_to(&mut w)?;
            w.flush()?;
        }
        tmp.as_file().sync_all()?;
        tmp.persist(path).map_err(|e| e.error)?;

        debug!("Saved Q-table with {} entries to {}", self.len(), path.display());
        Ok(())
    }

    /// Reads a table written by [`QTable::save`].
    pub fn try_load(path: &Path) -> Result<Self, QTableError> {
        let bytes = fs::read(path)?;
        Self::from_bytes(&bytes)
    }

    /// Reads the table at `path`, starting fresh when the file is missing,
    /// unreadable or corrupt.
    pub fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            info!("No Q-table at {}, starting with an empty table", path.display());
            return Self::new();
        }

        match Self::try_load(path) {
            Ok(table) => {
                info!("Loaded Q-table with {} entries from {}", table.len(), path.display());
                table
            }
            Err(e) => {
                warn!("Could not load Q-table from {} ({}), starting with an empty table", path.display(), e);
                Self::new()
            }
        }
    }
}

fn read_u32(bytes: &[u8], at: usize) -> u32 {
    let mut buf = [0u8; 4];
    buf.copy_from_slice(&bytes[at..at + 4]);
    u32::from_le_bytes(buf)
}

fn read_u64(bytes: &[u8], at: usize) -> u64 {
    let mut buf = [0u8; 8];
    buf.copy_from_slice(&bytes[at..at + 8]);
    u64::from_le_bytes(buf)
}
