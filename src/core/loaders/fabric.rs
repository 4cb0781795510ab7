use tracing::debug;

use crate::core::version::parse_components;

/// Which Fabric metadata service serves a given game version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FabricDialect {
    /// Legacy Fabric, for 1.13.x and older (and anything unparseable).
    Legacy,
    /// Combat Test snapshots.
    Combat,
    /// Official Fabric meta.
    Standard,
}

/// Combat Test snapshot ids as published by Mojang.
const COMBAT_SNAPSHOTS: &[&str] = &[
    "1.14_combat-212796",
    "1.14_combat-0",
    "1.14_combat-3",
    "1.15_combat-1",
    "1.15_combat-6",
    "1.16_combat-0",
    "1.16_combat-1",
    "1.16_combat-2",
    "1.16_combat-3",
    "1.16_combat-4",
    "1.16_combat-5",
    "1.16_combat-6",
];

const LEGACY_MAJOR: u32 = 1;
const LEGACY_MAX_MINOR: u32 = 13;

impl FabricDialect {
    pub fn for_game_version(game_version: &str) -> Self {
        let legacy = match parse_components(game_version) {
            Ok(parts) if parts.len() >= 2 => parts[0] == LEGACY_MAJOR && parts[1] <= LEGACY_MAX_MINOR,
            Ok(_) | Err(_) => {
                debug!("Cannot parse {:?}; assuming legacy Fabric", game_version);
                true
            }
        };

        if legacy {
            FabricDialect::Legacy
        } else if COMBAT_SNAPSHOTS.contains(&game_version) {
            FabricDialect::Combat
        } else {
            FabricDialect::Standard
        }
    }
}
