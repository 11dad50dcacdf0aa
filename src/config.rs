use std::collections::HashMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Session identity and path overrides supplied by the embedding
/// application. The core never persists this; the on-disk format belongs
/// to the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    pub player_name: String,
    pub player_uuid: Uuid,
    pub access_token: String,
    pub user_type: String,
    pub version_type: String,
    /// Game working directory. When `None` the layout's per-version
    /// instance directory is used.
    pub game_dir_override: Option<PathBuf>,
    /// Optional CurseForge API credential for pack imports.
    pub curseforge_api_key: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            player_name: "Player".to_string(),
            player_uuid: Uuid::nil(),
            access_token: "0".to_string(),
            user_type: "mojang".to_string(),
            version_type: "release".to_string(),
            game_dir_override: None,
            curseforge_api_key: String::new(),
        }
    }
}

impl SessionConfig {
    /// Build from the string-keyed map the external configuration layer
    /// hands over. Unknown keys are ignored; absent keys keep defaults.
    pub fn from_map(map: &HashMap<String, String>) -> Self {
        let mut cfg = Self::default();

        if let Some(v) = map.get("auth_player_name") {
            cfg.player_name = v.clone();
        }
        if let Some(v) = map.get("auth_uuid") {
            if let Ok(parsed) = Uuid::parse_str(v) {
                cfg.player_uuid = parsed;
            }
        }
        if let Some(v) = map.get("auth_access_token") {
            cfg.access_token = v.clone();
        }
        if let Some(v) = map.get("user_type") {
            cfg.user_type = v.clone();
        }
        if let Some(v) = map.get("version_type") {
            cfg.version_type = v.clone();
        }
        if let Some(v) = map.get("minecraft_dir") {
            if !v.trim().is_empty() {
                cfg.game_dir_override = Some(PathBuf::from(v));
            }
        }
        if let Some(v) = map.get("curseforge_api_key") {
            cfg.curseforge_api_key = v.clone();
        }

        cfg
    }
}
