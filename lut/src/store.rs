//! Persistence of truth tables, keyed by the permutation they tabulate.

use std::collections::BTreeMap;
use std::fmt;
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use bincode::config::{Configuration, Fixint, LittleEndian};
use kt_keccak::SliceValue;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Identifies a table: the width of the permutation and its number of rounds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TableKey {
    pub width: usize,
    pub nr_rounds: usize,
}

impl TableKey {
    pub const fn keccak_f25(nr_rounds: usize) -> Self {
        Self {
            width: 25,
            nr_rounds,
        }
    }

    /// Number of entries of a complete table, one per input.
    pub const fn table_len(&self) -> usize {
        1 << self.width
    }

    /// Name of the cache file holding the table, e.g. `KeccakF-25-nr2.LUT`.
    pub fn file_name(&self) -> String {
        format!("KeccakF-{}-nr{}.LUT", self.width, self.nr_rounds)
    }
}

impl fmt::Display for TableKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Keccak-f[{}] with {} rounds", self.width, self.nr_rounds)
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("No table is stored for {0}.")]
    Missing(TableKey),

    #[error("Not a truth table file (magic number {0:#010x}).")]
    BadMagic(u32),

    #[error("Found the table of {found} where the table of {expected} was expected.")]
    KeyMismatch { expected: TableKey, found: TableKey },

    #[error("The table of {key} has {found} entries instead of {}.", .key.table_len())]
    BadLength { key: TableKey, found: usize },

    #[error("The table of {key} maps {input:#x} to {found:#x}, outside of the state space.")]
    OutOfRange {
        key: TableKey,
        input: usize,
        found: SliceValue,
    },

    #[error("The table of {key} maps two inputs to {found:#x}, so it is not a permutation.")]
    NotAPermutation { key: TableKey, found: SliceValue },

    #[error("The table of {key} maps {input:#x} to {found:#x} instead of {expected:#x}.")]
    WrongImage {
        key: TableKey,
        input: SliceValue,
        found: SliceValue,
        expected: SliceValue,
    },

    #[error("Failed to decode the table: {0}")]
    Decode(#[from] bincode::error::DecodeError),

    #[error("Failed to encode the table: {0}")]
    Encode(#[from] bincode::error::EncodeError),

    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Somewhere truth tables can be kept between runs.
///
/// Implementations return exactly what was saved under a key, or an error; checking that a
/// loaded table is a permutation is left to [`check_table`].
pub trait TableStore {
    fn load(&self, key: TableKey) -> Result<Vec<SliceValue>, StoreError>;

    fn save(&self, key: TableKey, table: &[SliceValue]) -> Result<(), StoreError>;
}

/// Rejects a table that is not a permutation of the inputs of `key`: it must have one
/// entry per input, every entry must be an input, and no entry may occur twice.
pub fn check_table(key: TableKey, table: &[SliceValue]) -> Result<(), StoreError> {
    let len = key.table_len();
    if table.len() != len {
        return Err(StoreError::BadLength {
            key,
            found: table.len(),
        });
    }
    let mut seen = vec![0u64; len.div_ceil(64)];
    for (input, &found) in table.iter().enumerate() {
        let output = found as usize;
        if output >= len {
            return Err(StoreError::OutOfRange { key, input, found });
        }
        let (word, bit) = (output / 64, output % 64);
        if seen[word] >> bit & 1 == 1 {
            return Err(StoreError::NotAPermutation { key, found });
        }
        seen[word] |= 1 << bit;
    }
    Ok(())
}

/// "KF25" in ASCII.
const MAGIC: u32 = 0x4B46_3235;

fn bincode_config() -> Configuration<LittleEndian, Fixint> {
    bincode::config::standard()
        .with_little_endian()
        .with_fixed_int_encoding()
}

#[derive(Serialize)]
struct CacheEntryRef<'a> {
    magic: u32,
    key: TableKey,
    entries: &'a [SliceValue],
}

#[derive(Deserialize)]
struct CacheEntry {
    magic: u32,
    key: TableKey,
    entries: Vec<SliceValue>,
}

/// Stores each table in its own file of a directory, named after its key.
///
/// The encoding is private to this type and carries no version: a file that does not
/// decode as expected is simply not a usable table.
#[derive(Clone, Debug)]
pub struct DiskStore {
    dir: PathBuf,
}

impl DiskStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path(&self, key: TableKey) -> PathBuf {
        self.dir.join(key.file_name())
    }
}

impl TableStore for DiskStore {
    fn load(&self, key: TableKey) -> Result<Vec<SliceValue>, StoreError> {
        let file = match File::open(self.path(key)) {
            Ok(file) => file,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Err(StoreError::Missing(key));
            }
            Err(err) => return Err(err.into()),
        };
        let entry: CacheEntry =
            bincode::serde::decode_from_std_read(&mut BufReader::new(file), bincode_config())?;
        if entry.magic != MAGIC {
            return Err(StoreError::BadMagic(entry.magic));
        }
        if entry.key != key {
            return Err(StoreError::KeyMismatch {
                expected: key,
                found: entry.key,
            });
        }
        Ok(entry.entries)
    }

    fn save(&self, key: TableKey, table: &[SliceValue]) -> Result<(), StoreError> {
        fs::create_dir_all(&self.dir)?;
        let path = self.path(key);
        // Written aside and renamed, so that a reader never sees half a table.
        let partial = path.with_extension("LUT.partial");
        let written = write_entry(&partial, key, table).and_then(|()| {
            fs::rename(&partial, &path)?;
            Ok(())
        });
        if written.is_err() {
            // Only complete tables are left in the directory.
            let _ = fs::remove_file(&partial);
        }
        written
    }
}

fn write_entry(path: &Path, key: TableKey, table: &[SliceValue]) -> Result<(), StoreError> {
    let mut writer = BufWriter::new(File::create(path)?);
    let entry = CacheEntryRef {
        magic: MAGIC,
        key,
        entries: table,
    };
    bincode::serde::encode_into_std_write(&entry, &mut writer, bincode_config())?;
    writer.flush()?;
    Ok(())
}

/// Keeps tables in memory and counts accesses, for tests and short-lived processes.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<BTreeMap<TableKey, Vec<SliceValue>>>,
    loads: AtomicUsize,
    saves: AtomicUsize,
    reject_saves: bool,
}

impl MemoryStore {
    /// A store on which every save fails.
    pub fn read_only() -> Self {
        Self {
            reject_saves: true,
            ..Self::default()
        }
    }

    /// Puts `table` under `key` as is, bypassing [`TableStore::save`] and its counter.
    pub fn insert(&self, key: TableKey, table: Vec<SliceValue>) {
        self.lock().insert(key, table);
    }

    pub fn contains(&self, key: TableKey) -> bool {
        self.lock().contains_key(&key)
    }

    /// Number of [`TableStore::load`] calls so far.
    pub fn loads(&self) -> usize {
        self.loads.load(Ordering::Relaxed)
    }

    /// Number of [`TableStore::save`] calls so far, including rejected ones.
    pub fn saves(&self) -> usize {
        self.saves.load(Ordering::Relaxed)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<TableKey, Vec<SliceValue>>> {
        // A panic while holding the lock cannot leave the map half-updated.
        self.tables.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl TableStore for MemoryStore {
    fn load(&self, key: TableKey) -> Result<Vec<SliceValue>, StoreError> {
        self.loads.fetch_add(1, Ordering::Relaxed);
        self.lock()
            .get(&key)
            .cloned()
            .ok_or(StoreError::Missing(key))
    }

    fn save(&self, key: TableKey, table: &[SliceValue]) -> Result<(), StoreError> {
        self.saves.fetch_add(1, Ordering::Relaxed);
        if self.reject_saves {
            return Err(io::Error::new(io::ErrorKind::PermissionDenied, "read-only store").into());
        }
        self.lock().insert(key, table.to_vec());
        Ok(())
    }
}
