//! Version-bearing files: the project manifest and the documentation file
//! that advertises a `"~> MAJOR.MINOR"` dependency constraint.

use regex::Regex;
use std::fs;
use std::path::Path;

use crate::error::{ReleaseError, Result};
use crate::version::extract_major_minor;

/// Start of a version declaration: `@version "` or `version: "`.
const DECLARATION_PREFIX: &str = r#"(?m)^(\s*(?:@version\s+|version:\s*)")"#;

fn declaration_regex(version_pattern: &str) -> Result<Regex> {
    let pattern = format!(r#"{}({})""#, DECLARATION_PREFIX, version_pattern);
    Regex::new(&pattern).map_err(|e| ReleaseError::file(format!("bad version pattern: {}", e)))
}

fn read(path: &Path) -> Result<String> {
    fs::read_to_string(path)
        .map_err(|e| ReleaseError::file(format!("cannot read {}: {}", path.display(), e)))
}

fn write(path: &Path, contents: &str) -> Result<()> {
    fs::write(path, contents)
        .map_err(|e| ReleaseError::file(format!("cannot write {}: {}", path.display(), e)))
}

/// The version declared in manifest text, if any.
pub fn current_version(contents: &str) -> Result<Option<String>> {
    let regex = declaration_regex(r"\d+\.\d+\.\d+")?;
    Ok(regex
        .captures(contents)
        .and_then(|captures| captures.get(2))
        .map(|m| m.as_str().to_string()))
}

/// Reads the currently recorded version from the manifest file.
pub fn read_current_version(path: &Path) -> Result<String> {
    let contents = read(path)?;
    current_version(&contents)?.ok_or_else(|| {
        ReleaseError::file(format!("no version declaration found in {}", path.display()))
    })
}

/// Rewrites the declaration that holds exactly `current`. `None` when no such line exists.
pub fn replace_version(contents: &str, current: &str, new: &str) -> Result<Option<String>> {
    let regex = declaration_regex(&regex::escape(current))?;
    if !regex.is_match(contents) {
        return Ok(None);
    }
    let replacement = format!("${{1}}{}\"", new);
    Ok(Some(
        regex.replacen(contents, 1, replacement.as_str()).into_owned(),
    ))
}

/// Rewrites the manifest's version declaration from `current` to `new`.
pub fn update_version(path: &Path, current: &str, new: &str) -> Result<()> {
    let contents = read(path)?;
    let updated = replace_version(&contents, current, new)?.ok_or_else(|| {
        ReleaseError::file(format!(
            "version declaration \"{}\" not found in {}",
            current,
            path.display()
        ))
    })?;
    log::debug!("{}: {} -> {}", path.display(), current, new);
    write(path, &updated)
}

/// Result of the best-effort documentation rewrite.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocUpdate {
    Updated { from: String, to: String },
    Unchanged(String),
    Skipped(String),
}

/// The `"~> MAJOR.MINOR"` text for a version; `"~> 0.0"` when unparsable.
pub fn constraint_for(version: &str) -> String {
    let (major, minor) = extract_major_minor(version);
    format!("\"~> {}.{}\"", major, minor)
}

/// Moves the dependency constraint in a documentation file from `old` to `new`.
///
/// A missing file or missing constraint is reported as a skip, never an error.
pub fn update_dependency_reference(path: &Path, old: &str, new: &str) -> Result<DocUpdate> {
    if !path.exists() {
        return Ok(DocUpdate::Skipped(format!("{} not found", path.display())));
    }

    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) => {
            return Ok(DocUpdate::Skipped(format!(
                "cannot read {}: {}",
                path.display(),
                e
            )))
        }
    };
    let from = constraint_for(old);
    let to = constraint_for(new);

    if !contents.contains(&from) {
        return Ok(DocUpdate::Skipped(format!(
            "no {} constraint in {}",
            from,
            path.display()
        )));
    }
    if from == to {
        return Ok(DocUpdate::Unchanged(from));
    }

    write(path, &contents.replace(&from, &to))?;
    Ok(DocUpdate::Updated { from, to })
}
