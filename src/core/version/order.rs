// ─── Version Ordering ───
// Total order over Minecraft version strings: releases, snapshots
// (`23w04a`), pre-releases (`1.16.5-pre1`) and release candidates
// (`1.16.5-rc1`).

use std::cell::Cell;
use std::cmp::Ordering;

use crate::core::error::{InstallerError, InstallerResult};

const SNAPSHOT_MARKER: char = 'w';
const SNAPSHOT_MARKER_OFFSET: usize = 2;
/// Suffix value assumed for a version without `-pre`/`-rc`.
const FINAL_SUFFIX: u32 = 99;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum SuffixKind {
    Pre,
    Rc,
    Final,
}

/// Compare two version strings.
///
/// Pre-release suffixes on an equal base rank by kind before number:
/// `-preN` < `-rcN` < the final release, so `1.16.5-rc1` is newer than
/// `1.16.5-pre2` and `1.16.5-pre100` is still older than `1.16.5`.
///
/// Fails with [`InstallerError::InvalidVersion`] when a string has a component
/// that cannot be read as an integer.
pub fn compare_versions(a: &str, b: &str) -> InstallerResult<Ordering> {
    match (a.is_empty(), b.is_empty()) {
        (true, true) => return Ok(Ordering::Equal),
        (true, false) => return Ok(Ordering::Less),
        (false, true) => return Ok(Ordering::Greater),
        (false, false) => {}
    }

    if is_snapshot_at_offset(a) || is_snapshot_at_offset(b) {
        return compare_snapshots(a, b);
    }

    if has_prerelease_suffix(a) || has_prerelease_suffix(b) {
        let (base_a, kind_a, n_a) = split_prerelease(a)?;
        let (base_b, kind_b, n_b) = split_prerelease(b)?;

        let base = compare_versions(base_a, base_b)?;
        if base != Ordering::Equal {
            return Ok(base);
        }
        return Ok(kind_a.cmp(&kind_b).then(n_a.cmp(&n_b)));
    }

    let left = parse_components(a)?;
    let right = parse_components(b)?;
    Ok(left
        .iter()
        .zip(right.iter())
        .map(|(x, y)| x.cmp(y))
        .find(|o| *o != Ordering::Equal)
        .unwrap_or(Ordering::Equal))
}

/// Sort versions newest first.
///
/// Fails if any pair cannot be compared; the slice order is then unspecified.
pub fn sort_descending(versions: &mut [String]) -> InstallerResult<()> {
    let failure: Cell<Option<InstallerError>> = Cell::new(None);
    versions.sort_by(|a, b| match compare_versions(b, a) {
        Ok(ordering) => ordering,
        Err(e) => {
            failure.set(Some(e));
            Ordering::Equal
        }
    });
    match failure.into_inner() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

/// Split a version into its integer components.
///
/// Every run of non-digits becomes one separator; leading and trailing
/// separators are dropped. `1.16_combat-6` yields `[1, 16, 6]`.
pub fn parse_components(version: &str) -> InstallerResult<Vec<u32>> {
    let components = version
        .split(|c: char| !c.is_ascii_digit())
        .filter(|part| !part.is_empty())
        .map(|part| {
            part.parse::<u32>()
                .map_err(|_| InstallerError::InvalidVersion(version.to_string()))
        })
        .collect::<InstallerResult<Vec<u32>>>()?;

    if components.is_empty() {
        return Err(InstallerError::InvalidVersion(version.to_string()));
    }
    Ok(components)
}

fn is_snapshot_at_offset(version: &str) -> bool {
    version.find(SNAPSHOT_MARKER) == Some(SNAPSHOT_MARKER_OFFSET)
}

fn compare_snapshots(a: &str, b: &str) -> InstallerResult<Ordering> {
    let (snap_a, snap_b) = (a.contains(SNAPSHOT_MARKER), b.contains(SNAPSHOT_MARKER));
    match (snap_a, snap_b) {
        (true, false) => return Ok(Ordering::Greater),
        (false, true) => return Ok(Ordering::Less),
        _ => {}
    }

    let (year_a, rest_a) = split_snapshot(a)?;
    let (year_b, rest_b) = split_snapshot(b)?;
    if year_a != year_b {
        return Ok(year_a.cmp(&year_b));
    }

    let week_a = snapshot_ordinal(a, rest_a)?;
    let week_b = snapshot_ordinal(b, rest_b)?;
    if week_a != week_b {
        return Ok(week_a.cmp(&week_b));
    }

    Ok(letters(rest_a).cmp(&letters(rest_b)))
}

fn split_snapshot(version: &str) -> InstallerResult<(u32, &str)> {
    let (year, rest) = version
        .split_once(SNAPSHOT_MARKER)
        .ok_or_else(|| InstallerError::InvalidVersion(version.to_string()))?;
    let year = year
        .parse::<u32>()
        .map_err(|_| InstallerError::InvalidVersion(version.to_string()))?;
    Ok((year, rest))
}

fn snapshot_ordinal(version: &str, rest: &str) -> InstallerResult<u32> {
    let digits: String = rest.chars().filter(|c| !c.is_ascii_alphabetic()).collect();
    digits
        .parse::<u32>()
        .map_err(|_| InstallerError::InvalidVersion(version.to_string()))
}

fn letters(rest: &str) -> String {
    rest.chars().filter(|c| c.is_ascii_alphabetic()).collect()
}

fn has_prerelease_suffix(version: &str) -> bool {
    version.contains("-pre") || version.contains("-rc")
}

fn split_prerelease(version: &str) -> InstallerResult<(&str, SuffixKind, u32)> {
    let (base, kind, number) = if let Some((base, n)) = version.split_once("-pre") {
        (base, SuffixKind::Pre, n)
    } else if let Some((base, n)) = version.split_once("-rc") {
        (base, SuffixKind::Rc, n)
    } else {
        return Ok((version, SuffixKind::Final, FINAL_SUFFIX));
    };

    let number = number
        .parse::<u32>()
        .map_err(|_| InstallerError::InvalidVersion(version.to_string()))?;
    Ok((base, kind, number))
}
