//! Per-vault settings persisted in the metadata table.

use serde::{Deserialize, Serialize};

const DEFAULT_FONT_SIZE: u16 = 16;
const MIN_FONT_SIZE: u16 = 8;
const MAX_FONT_SIZE: u16 = 48;

/// Ordering applied to every topology list before display.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortPolicy {
    /// Case-insensitive title, then id.
    #[default]
    Title,
    /// Oldest first.
    Created,
    /// Most recently modified first.
    Modified,
}

/// Vault settings. Unknown keys are ignored, missing keys take defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VaultSettings {
    pub font_size: u16,
    pub show_favorites: bool,
    pub show_content: bool,
    pub sort_policy: SortPolicy,
}

impl Default for VaultSettings {
    fn default() -> Self {
        Self {
            font_size: DEFAULT_FONT_SIZE,
            show_favorites: true,
            show_content: true,
            sort_policy: SortPolicy::default(),
        }
    }
}

impl VaultSettings {
    /// Returns a copy with out-of-range values pulled back into range.
    pub fn normalized(mut self) -> Self {
        self.font_size = self.font_size.clamp(MIN_FONT_SIZE, MAX_FONT_SIZE);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::{SortPolicy, VaultSettings};

    #[test]
    fn partial_json_takes_defaults() {
        let settings: VaultSettings =
            serde_json::from_str(r#"{"showFavorites":false}"#).expect("partial settings");
        assert!(!settings.show_favorites);
        assert!(settings.show_content);
        assert_eq!(settings.sort_policy, SortPolicy::Title);
    }

    #[test]
    fn normalized_clamps_font_size() {
        let settings = VaultSettings {
            font_size: 200,
            ..VaultSettings::default()
        };
        assert_eq!(settings.normalized().font_size, 48);
    }
}
