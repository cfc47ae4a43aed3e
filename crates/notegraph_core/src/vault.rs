//! Vault location and lifecycle.
//!
//! # Responsibility
//! - Map a vault name to its SQLite file inside a vault directory.
//! - Open (and migrate) one store per vault.
//!
//! # Invariants
//! - Vault names are short, filesystem-safe and never contain separators.
//! - Switching vaults means dropping one `Vault` and opening another; no state
//!   is shared between vaults.

use crate::db::{open_db, open_db_in_memory, DbError};
use crate::repo::note_repo::{SqliteNoteStore, StoreError};
use log::info;
use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

static VAULT_NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9 _-]{0,63}$").expect("valid vault name regex"));

const VAULT_FILE_EXTENSION: &str = "sqlite3";

/// Name used when the front end has not picked one.
pub const DEFAULT_VAULT_NAME: &str = "default";

#[derive(Debug)]
pub enum VaultError {
    InvalidName(String),
    Io(std::io::Error),
    Db(DbError),
    Store(StoreError),
}

impl Display for VaultError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidName(name) => write!(f, "invalid vault name `{name}`"),
            Self::Io(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for VaultError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidName(_) => None,
            Self::Io(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::Store(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for VaultError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<DbError> for VaultError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<StoreError> for VaultError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

/// One opened vault: a name plus the store backing it.
pub struct Vault {
    name: String,
    path: Option<PathBuf>,
    store: SqliteNoteStore,
}

impl Vault {
    /// Opens (creating when missing) the vault `name` inside `dir`.
    pub fn open(dir: impl AsRef<Path>, name: &str) -> Result<Self, VaultError> {
        let path = vault_path(dir.as_ref(), name)?;
        std::fs::create_dir_all(dir.as_ref())?;
        let store = SqliteNoteStore::try_new(open_db(&path)?)?;
        info!("event=vault_open module=vault status=ok mode=file");
        Ok(Self {
            name: name.trim().to_string(),
            path: Some(path),
            store,
        })
    }

    /// Opens a scratch vault that lives only as long as the process.
    pub fn open_in_memory(name: &str) -> Result<Self, VaultError> {
        validate_vault_name(name)?;
        let store = SqliteNoteStore::try_new(open_db_in_memory()?)?;
        info!("event=vault_open module=vault status=ok mode=memory");
        Ok(Self {
            name: name.trim().to_string(),
            path: None,
            store,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Backing file, `None` for in-memory vaults.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn store(&self) -> &SqliteNoteStore {
        &self.store
    }

    pub fn into_store(self) -> SqliteNoteStore {
        self.store
    }
}

/// Lists vault names found in `dir`, sorted case-insensitively.
pub fn list_vaults(dir: impl AsRef<Path>) -> Result<Vec<String>, VaultError> {
    let dir = dir.as_ref();
    if !dir.exists() {
        return Ok(Vec::new());
    }
    let mut names = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.extension().and_then(|ext| ext.to_str()) != Some(VAULT_FILE_EXTENSION) {
            continue;
        }
        if let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) {
            if VAULT_NAME_RE.is_match(stem) {
                names.push(stem.to_string());
            }
        }
    }
    names.sort_by_key(|name| name.to_lowercase());
    Ok(names)
}

/// Resolves the file path of a vault, validating its name.
pub fn vault_path(dir: &Path, name: &str) -> Result<PathBuf, VaultError> {
    let name = validate_vault_name(name)?;
    Ok(dir.join(format!("{name}.{VAULT_FILE_EXTENSION}")))
}

fn validate_vault_name(name: &str) -> Result<&str, VaultError> {
    let trimmed = name.trim();
    if VAULT_NAME_RE.is_match(trimmed) {
        Ok(trimmed)
    } else {
        Err(VaultError::InvalidName(name.to_string()))
    }
}
