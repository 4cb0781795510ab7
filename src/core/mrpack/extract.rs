use std::collections::HashSet;
use std::io::{Read, Seek};
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::manifest::{ModrinthIndex, PackManifest, Side};
use super::paths::resolve_within;
use crate::core::error::{InstallerError, InstallerResult};

pub const MANIFEST_NAME: &str = "modrinth.index.json";
pub const OVERRIDES_PREFIX: &str = "overrides/";

/// Result of extracting a pack into a game directory.
#[derive(Debug)]
pub struct ExtractedPack {
    pub manifest: PackManifest,
    /// Override files written to disk (generic and side-specific).
    pub overrides_written: usize,
}

/// Read a `.mrpack` archive, writing its overrides under `root`.
///
/// Entries are read through the central directory, so archives whose sizes
/// follow the entry data (data descriptors) work too. Side-specific overrides
/// win over generic ones for the same destination no matter which comes first
/// in the archive. The manifest may appear anywhere; file environments are
/// resolved once every entry has been read.
pub fn extract_pack<R: Read + Seek>(reader: R, side: Side, root: &Path) -> InstallerResult<ExtractedPack> {
    let side_prefix = side.overrides_prefix();
    let mut index: Option<ModrinthIndex> = None;
    let mut side_written: HashSet<PathBuf> = HashSet::new();
    let mut overrides_written = 0usize;

    let mut archive = zip::ZipArchive::new(reader)?;
    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        let name = entry.name().to_string();

        if name == MANIFEST_NAME {
            let mut raw = Vec::new();
            entry
                .read_to_end(&mut raw)
                .map_err(|e| InstallerError::io(MANIFEST_NAME, e))?;
            index = Some(serde_json::from_slice(&raw)?);
            continue;
        }

        let (relative, side_specific) = if let Some(rest) = name.strip_prefix(side_prefix.as_str()) {
            (rest, true)
        } else if let Some(rest) = name.strip_prefix(OVERRIDES_PREFIX) {
            (rest, false)
        } else {
            continue;
        };

        let dest = resolve_within(root, relative)?;

        if entry.is_dir() {
            continue;
        }

        if !side_specific && side_written.contains(&dest) {
            debug!("Skipping {} (overridden by {})", name, side_prefix);
            continue;
        }

        if write_entry(&mut entry, &dest)? {
            overrides_written += 1;
            debug!("Extracted {} -> {:?}", name, dest);
        }

        if side_specific {
            side_written.insert(dest);
        }
    }

    let index = index.ok_or(InstallerError::MissingManifest)?;
    let manifest = PackManifest::from_index(index, side, root)?;

    info!(
        "Extracted {} override files; manifest lists {} files",
        overrides_written,
        manifest.files.len()
    );

    Ok(ExtractedPack {
        manifest,
        overrides_written,
    })
}

/// Replace whatever file sits at `dest` with the entry's content.
/// Returns false when `dest` is an existing directory.
fn write_entry<R: Read>(entry: &mut R, dest: &Path) -> InstallerResult<bool> {
    if dest.is_dir() {
        return Ok(false);
    }
    if dest.is_file() {
        std::fs::remove_file(dest).map_err(|e| InstallerError::io(dest, e))?;
    }
    if let Some(parent) = dest.parent() {
        std::fs::create_dir_all(parent).map_err(|e| InstallerError::io(parent, e))?;
    }

    let mut out = std::fs::File::create(dest).map_err(|e| InstallerError::io(dest, e))?;
    std::io::copy(entry, &mut out).map_err(|e| InstallerError::io(dest, e))?;
    Ok(true)
}
