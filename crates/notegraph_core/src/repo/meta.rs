//! Typed access to the vault metadata table.
//!
//! # Responsibility
//! - Name every metadata key the core reads or writes.
//! - Encode/decode metadata values (note pointers, favorites, settings).
//!
//! # Invariants
//! - The favorites list never contains duplicates.
//! - Undecodable settings fall back to defaults instead of failing the vault.

use crate::model::note::NoteId;
use crate::model::settings::VaultSettings;
use crate::repo::note_repo::{NoteStore, StoreError, StoreResult};
use log::warn;

/// Keys of the metadata table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetaKey {
    CentralNote,
    HomeNote,
    Favorites,
    Settings,
}

impl MetaKey {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::CentralNote => "central_note",
            Self::HomeNote => "home_note",
            Self::Favorites => "favorites",
            Self::Settings => "settings",
        }
    }
}

/// Reads a note pointer (`CentralNote`/`HomeNote`).
pub fn load_note_pointer(store: &impl NoteStore, key: MetaKey) -> StoreResult<Option<NoteId>> {
    Ok(store
        .get_meta(key)?
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .map(NoteId::from))
}

/// Writes or clears a note pointer.
pub fn save_note_pointer(
    store: &mut impl NoteStore,
    key: MetaKey,
    id: Option<&NoteId>,
) -> StoreResult<()> {
    match id {
        Some(id) => store.set_meta(key, id.as_str()),
        None => store.delete_meta(key),
    }
}

/// Reads the favorites id list.
pub fn load_favorites(store: &impl NoteStore) -> StoreResult<Vec<NoteId>> {
    match store.get_meta(MetaKey::Favorites)? {
        Some(raw) => decode_favorites(&raw),
        None => Ok(Vec::new()),
    }
}

/// Reads vault settings, falling back to defaults for missing or corrupt values.
pub fn load_settings(store: &impl NoteStore) -> StoreResult<VaultSettings> {
    let Some(raw) = store.get_meta(MetaKey::Settings)? else {
        return Ok(VaultSettings::default());
    };
    match serde_json::from_str::<VaultSettings>(&raw) {
        Ok(settings) => Ok(settings.normalized()),
        Err(err) => {
            warn!("event=settings_load module=repo status=fallback error={err}");
            Ok(VaultSettings::default())
        }
    }
}

pub fn save_settings(store: &mut impl NoteStore, settings: &VaultSettings) -> StoreResult<()> {
    let encoded = serde_json::to_string(&settings.clone().normalized())
        .map_err(|err| StoreError::InvalidData(format!("cannot encode settings: {err}")))?;
    store.set_meta(MetaKey::Settings, &encoded)
}

pub(crate) fn decode_favorites(raw: &str) -> StoreResult<Vec<NoteId>> {
    let ids: Vec<NoteId> = serde_json::from_str(raw)
        .map_err(|err| StoreError::InvalidData(format!("invalid favorites list: {err}")))?;
    let mut unique = Vec::with_capacity(ids.len());
    for id in ids {
        if !unique.contains(&id) {
            unique.push(id);
        }
    }
    Ok(unique)
}

pub(crate) fn encode_favorites(ids: &[NoteId]) -> StoreResult<String> {
    serde_json::to_string(ids)
        .map_err(|err| StoreError::InvalidData(format!("cannot encode favorites: {err}")))
}

#[cfg(test)]
mod tests {
    use super::{decode_favorites, encode_favorites};
    use crate::model::note::NoteId;

    #[test]
    fn decode_favorites_drops_duplicates() {
        let ids = decode_favorites(r#"["a","b","a"]"#).expect("valid list");
        assert_eq!(ids, vec![NoteId::from("a"), NoteId::from("b")]);
    }

    #[test]
    fn decode_favorites_rejects_non_array() {
        assert!(decode_favorites(r#"{"a":1}"#).is_err());
    }

    #[test]
    fn encode_favorites_writes_plain_string_array() {
        let encoded = encode_favorites(&[NoteId::from("x")]).expect("encodable");
        assert_eq!(encoded, r#"["x"]"#);
    }
}
