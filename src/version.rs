//! Version calculation: parsing, bumping and validating `MAJOR.MINOR.PATCH` strings.
//!
//! Only plain three-component versions are accepted. Pre-release and build
//! metadata suffixes are rejected even though `semver` would parse them.

use semver::Version;

use crate::error::{ReleaseError, Result};

/// Represents the type of semantic version bump to apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionBump {
    Major,
    Minor,
    Patch,
}

/// What the user asked for on the command line.
///
/// Derived once from the positional version selector and never changed afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BumpKind {
    Major,
    Minor,
    Patch,
    Current,
    Explicit(String),
}

impl BumpKind {
    /// Classifies a version selector. Anything that is not a keyword is an explicit version.
    pub fn from_arg(arg: &str) -> Self {
        match arg {
            "major" => BumpKind::Major,
            "minor" => BumpKind::Minor,
            "patch" => BumpKind::Patch,
            "current" => BumpKind::Current,
            other => BumpKind::Explicit(other.to_string()),
        }
    }

    /// The bump this selector performs, if it is one of the bump keywords.
    pub fn as_bump(&self) -> Option<VersionBump> {
        match self {
            BumpKind::Major => Some(VersionBump::Major),
            BumpKind::Minor => Some(VersionBump::Minor),
            BumpKind::Patch => Some(VersionBump::Patch),
            BumpKind::Current | BumpKind::Explicit(_) => None,
        }
    }
}

/// Parses a strict `MAJOR.MINOR.PATCH` string.
///
/// Each component must be a non-empty run of ASCII digits that fits in a `u64`.
///
/// # Example
/// ```ignore
/// assert_eq!(parse("1.2.3")?, Version::new(1, 2, 3));
/// assert!(parse("1.2").is_err());
/// assert!(parse("1.2.3-rc.1").is_err());
/// ```
pub fn parse(input: &str) -> Result<Version> {
    let parts: Vec<&str> = input.split('.').collect();
    if parts.len() != 3 {
        return Err(ReleaseError::version_format(input));
    }

    let mut numbers = [0u64; 3];
    for (slot, part) in numbers.iter_mut().zip(&parts) {
        if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ReleaseError::version_format(input));
        }
        *slot = part
            .parse::<u64>()
            .map_err(|_| ReleaseError::version_format(input))?;
    }

    Ok(Version::new(numbers[0], numbers[1], numbers[2]))
}

/// Bumps `current` and returns the new version string.
///
/// - **Major**: major += 1, minor = 0, patch = 0
/// - **Minor**: minor += 1, patch = 0
/// - **Patch**: patch += 1
pub fn bump(current: &str, kind: VersionBump) -> Result<String> {
    let version = parse(current)?;
    let overflow = || ReleaseError::version_format(current);

    let bumped = match kind {
        VersionBump::Major => {
            Version::new(version.major.checked_add(1).ok_or_else(overflow)?, 0, 0)
        }
        VersionBump::Minor => Version::new(
            version.major,
            version.minor.checked_add(1).ok_or_else(overflow)?,
            0,
        ),
        VersionBump::Patch => Version::new(
            version.major,
            version.minor,
            version.patch.checked_add(1).ok_or_else(overflow)?,
        ),
    };

    Ok(bumped.to_string())
}

/// Accepts an explicit version only if it is strictly greater than `current`.
///
/// The candidate is parsed first, so a malformed candidate is reported even
/// when `current` is malformed too.
pub fn validate_explicit(candidate: &str, current: &str) -> Result<String> {
    let wanted = parse(candidate)?;
    let existing = parse(current)?;

    if wanted == existing {
        return Err(ReleaseError::VersionUnchanged {
            version: candidate.to_string(),
        });
    }
    if wanted < existing {
        return Err(ReleaseError::VersionNotGreater {
            candidate: candidate.to_string(),
            current: current.to_string(),
        });
    }

    Ok(candidate.to_string())
}

/// Turns a version selector into the release version.
pub fn resolve(arg: &str, current: &str) -> Result<String> {
    match BumpKind::from_arg(arg) {
        BumpKind::Major => bump(current, VersionBump::Major),
        BumpKind::Minor => bump(current, VersionBump::Minor),
        BumpKind::Patch => bump(current, VersionBump::Patch),
        BumpKind::Current => Ok(current.to_string()),
        BumpKind::Explicit(candidate) => validate_explicit(&candidate, current),
    }
}

/// Best-effort `(major, minor)` used to rewrite `"~> MAJOR.MINOR"` constraints.
///
/// Returns `(0, 0)` for anything unparsable. Never use this for validation.
pub fn extract_major_minor(version: &str) -> (u64, u64) {
    parse(version)
        .map(|v| (v.major, v.minor))
        .unwrap_or((0, 0))
}
