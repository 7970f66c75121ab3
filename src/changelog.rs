//! Changelog editing around the `## Unreleased` section.

use chrono::NaiveDate;
use std::fs;
use std::path::Path;

use crate::error::{ReleaseError, Result};

const UNRELEASED_TITLE: &str = "## Unreleased";

/// A second-level heading (`## ...`), not a deeper one.
fn is_section_heading(line: &str) -> bool {
    line.starts_with("##") && !line.starts_with("###")
}

/// `## Unreleased`, in any case, optionally written as `## [Unreleased]`.
pub fn is_unreleased_heading(line: &str) -> bool {
    if !is_section_heading(line) {
        return false;
    }
    let rest = &line[2..];
    if !rest.starts_with(char::is_whitespace) {
        return false;
    }
    let title = rest.trim();
    let title = title
        .strip_prefix('[')
        .and_then(|t| t.strip_suffix(']'))
        .unwrap_or(title);
    title.eq_ignore_ascii_case("unreleased")
}

pub fn has_unreleased_section(contents: &str) -> bool {
    contents.lines().any(is_unreleased_heading)
}

fn as_list_item(entry: &str) -> String {
    let entry = entry.trim();
    if entry.starts_with("- ") || entry.starts_with("* ") {
        entry.to_string()
    } else {
        format!("- {}", entry)
    }
}

fn join(lines: Vec<String>) -> String {
    let mut out = lines.join("\n");
    out.push('\n');
    out
}

/// Adds `entry` at the top of the unreleased section, creating the section
/// (or the whole changelog when `existing` is `None`) as needed.
pub fn add_entry(existing: Option<&str>, entry: &str) -> String {
    let item = as_list_item(entry);
    let Some(contents) = existing else {
        return join(vec![
            "# Changelog".to_string(),
            String::new(),
            UNRELEASED_TITLE.to_string(),
            String::new(),
            item,
        ]);
    };

    let mut lines: Vec<String> = contents.lines().map(str::to_string).collect();

    if let Some(heading) = lines.iter().position(|l| is_unreleased_heading(l)) {
        let mut at = heading + 1;
        match lines.get(at) {
            None => {
                lines.push(String::new());
                at += 1;
            }
            Some(next) if next.trim().is_empty() => at += 1,
            Some(_) => {
                lines.insert(at, String::new());
                at += 1;
            }
        }
        let before_heading = lines.get(at).is_some_and(|l| l.starts_with('#'));
        lines.insert(at, item);
        if before_heading {
            lines.insert(at + 1, String::new());
        }
        return join(lines);
    }

    let section = vec![
        UNRELEASED_TITLE.to_string(),
        String::new(),
        item,
        String::new(),
    ];
    match lines.iter().position(|l| is_section_heading(l)) {
        Some(first) => {
            lines.splice(first..first, section);
        }
        None => {
            if lines.last().is_some_and(|l| !l.trim().is_empty()) {
                lines.push(String::new());
            }
            lines.extend(section);
            lines.pop();
        }
    }
    join(lines)
}

/// Writes `entry` into the changelog at `path`, creating the file if absent.
pub fn insert_entry(path: &Path, entry: &str) -> Result<()> {
    let existing = if path.exists() {
        Some(fs::read_to_string(path).map_err(|e| {
            ReleaseError::file(format!("cannot read {}: {}", path.display(), e))
        })?)
    } else {
        None
    };

    let updated = add_entry(existing.as_deref(), entry);
    log::debug!("adding changelog entry to {}", path.display());
    fs::write(path, updated)
        .map_err(|e| ReleaseError::file(format!("cannot write {}: {}", path.display(), e)))
}

/// The heading that replaces `## Unreleased` for a release.
pub fn release_heading(version: &str, date: NaiveDate) -> String {
    format!("## {} - {}", version, date.format("%Y-%m-%d"))
}

/// Renames the first unreleased heading. `None` when there is no such heading.
pub fn stamp(contents: &str, version: &str, date: NaiveDate) -> Option<String> {
    let mut lines: Vec<String> = contents.lines().map(str::to_string).collect();
    let heading = lines.iter().position(|l| is_unreleased_heading(l))?;
    lines[heading] = release_heading(version, date);
    Some(join(lines))
}

/// Rewrites the unreleased heading of the changelog at `path` to `## version - date`.
pub fn stamp_release(path: &Path, version: &str, date: NaiveDate) -> Result<()> {
    let contents = fs::read_to_string(path)
        .map_err(|e| ReleaseError::file(format!("cannot read {}: {}", path.display(), e)))?;
    let updated = stamp(&contents, version, date).ok_or_else(|| {
        ReleaseError::file(format!("no unreleased section in {}", path.display()))
    })?;
    fs::write(path, updated)
        .map_err(|e| ReleaseError::file(format!("cannot write {}: {}", path.display(), e)))
}

/// Body of the section released as `version`, without its heading.
pub fn release_notes(contents: &str, version: &str) -> Option<String> {
    let mut lines = contents.lines();
    lines.find(|line| {
        is_section_heading(line)
            && line[2..]
                .trim_start()
                .strip_prefix(version)
                .is_some_and(|rest| rest.is_empty() || rest.starts_with(' '))
    })?;

    let body: Vec<&str> = lines.take_while(|l| !is_section_heading(l)).collect();
    let notes = body.join("\n").trim().to_string();
    if notes.is_empty() {
        None
    } else {
        Some(notes)
    }
}
