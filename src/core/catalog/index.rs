use std::cmp::Reverse;
use std::collections::HashMap;

use tracing::{debug, warn};

use super::release::{ReleaseChannel, ReleaseRecord};
use crate::core::version::{compare_versions, sort_descending};

/// The release chosen for each supported game version.
#[derive(Debug, Clone, Default)]
pub struct GameVersionIndex {
    by_game_version: HashMap<String, ReleaseRecord>,
    available: Vec<String>,
}

impl GameVersionIndex {
    /// Build the index from a catalog listing.
    ///
    /// Only `release` records count. Records are ordered newest-first by
    /// publication date before the first record listing a game version claims
    /// it; undated records keep feed order after the dated ones.
    pub fn build(records: Vec<ReleaseRecord>) -> Self {
        let mut releases: Vec<ReleaseRecord> = records
            .into_iter()
            .filter(|r| r.channel == ReleaseChannel::Release)
            .collect();
        releases.sort_by_key(|r| Reverse(r.date_published));

        let mut by_game_version: HashMap<String, ReleaseRecord> = HashMap::new();
        for record in releases {
            for game in &record.game_versions {
                if by_game_version.contains_key(game) {
                    continue;
                }
                debug!("{} -> {}", game, record.label());
                by_game_version.insert(game.clone(), record.clone());
            }
        }

        let available = sorted_versions(by_game_version.keys().cloned().collect());

        Self {
            by_game_version,
            available,
        }
    }

    pub fn get(&self, game_version: &str) -> Option<&ReleaseRecord> {
        self.by_game_version.get(game_version)
    }

    /// Supported game versions, newest first.
    pub fn available_versions(&self) -> &[String] {
        &self.available
    }

    pub fn is_empty(&self) -> bool {
        self.by_game_version.is_empty()
    }
}

fn sorted_versions(mut versions: Vec<String>) -> Vec<String> {
    versions.retain(|v| match compare_versions(v, v) {
        Ok(_) => true,
        Err(e) => {
            warn!("Dropping game version {:?} from the list: {}", v, e);
            false
        }
    });
    if let Err(e) = sort_descending(&mut versions) {
        warn!("Game versions could not be fully ordered: {}", e);
    }
    versions
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::core::catalog::release::{FileHashes, ReleaseFile};

    fn record(id: &str, games: &[&str], channel: ReleaseChannel, day: Option<u32>) -> ReleaseRecord {
        ReleaseRecord {
            id: Some(id.to_string()),
            name: None,
            version_number: Some(id.to_string()),
            game_versions: games.iter().map(|g| g.to_string()).collect(),
            files: vec![ReleaseFile {
                url: format!("https://cdn.example/{id}.mrpack"),
                primary: true,
                filename: None,
                hashes: FileHashes::default(),
                size: 0,
            }],
            channel,
            date_published: day.map(|d| Utc.with_ymd_and_hms(2023, 6, d, 0, 0, 0).unwrap()),
        }
    }

    #[test]
    fn only_release_channel_participates() {
        let index = GameVersionIndex::build(vec![
            record("beta", &["1.20.1"], ReleaseChannel::Beta, Some(20)),
            record("stable", &["1.20.1"], ReleaseChannel::Release, Some(1)),
            record("alpha", &["1.21"], ReleaseChannel::Alpha, Some(25)),
        ]);

        assert_eq!(index.get("1.20.1").unwrap().id.as_deref(), Some("stable"));
        assert!(index.get("1.21").is_none());
    }

    #[test]
    fn newest_publication_wins_regardless_of_feed_order() {
        let index = GameVersionIndex::build(vec![
            record("old", &["1.20.1"], ReleaseChannel::Release, Some(1)),
            record("new", &["1.20.1"], ReleaseChannel::Release, Some(15)),
        ]);
        assert_eq!(index.get("1.20.1").unwrap().id.as_deref(), Some("new"));
    }

    #[test]
    fn undated_records_keep_feed_order_first_wins() {
        let index = GameVersionIndex::build(vec![
            record("first", &["1.8.9"], ReleaseChannel::Release, None),
            record("second", &["1.8.9"], ReleaseChannel::Release, None),
        ]);
        assert_eq!(index.get("1.8.9").unwrap().id.as_deref(), Some("first"));
    }

    #[test]
    fn available_versions_are_sorted_descending() {
        let index = GameVersionIndex::build(vec![
            record("a", &["1.8.9", "1.20.1"], ReleaseChannel::Release, Some(2)),
            record("b", &["1.16.5", "1.19.4"], ReleaseChannel::Release, Some(1)),
        ]);
        assert_eq!(
            index.available_versions(),
            &["1.20.1", "1.19.4", "1.16.5", "1.8.9"]
        );
    }

    #[test]
    fn unparseable_versions_are_not_listed() {
        let index = GameVersionIndex::build(vec![record(
            "a",
            &["1.20.1", "latest"],
            ReleaseChannel::Release,
            Some(1),
        )]);
        assert_eq!(index.available_versions(), &["1.20.1"]);
        assert!(index.get("latest").is_some());
    }
}
