//! Section demultiplexer for check_mk agent output
//!
//! The agent prints one block per subsystem, each introduced by a marker
//! line such as `<<<df>>>`. [`demux`] splits the output into a
//! [`SectionMap`] keyed by subsystem name.
//!
//! Rules:
//! - Lines before the first marker belong to no section and are dropped.
//! - Within one contiguous run of a section, duplicate lines collapse to the
//!   first occurrence; surviving lines keep their first-seen order.
//! - A marker repeating the open section's name continues the same run.
//! - A run is committed when a marker with a different name appears, or at
//!   end of input. When a name comes back after another section
//!   (`A, B, A`), the later run replaces the earlier one.

use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use regex::Regex;

/// Section marker, e.g. `<<<diskstat>>>`. Unanchored and ASCII-only on purpose:
/// markers with options such as `<<<lnx_if:sep(58)>>>` do not match and their
/// lines stay in the previous section.
static MARKER_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<<<([0-9A-Za-z_]+)>>>").expect("MARKER_REGEX is a valid regex pattern")
});

/// Returns the section name if `line` is a marker line
#[must_use]
pub fn marker_name(line: &str) -> Option<&str> {
    MARKER_REGEX
        .captures(line)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Lines of one contiguous section run, deduplicated
#[derive(Default)]
struct SectionRun<'a> {
    seen: HashSet<&'a str>,
    lines: Vec<&'a str>,
}

impl<'a> SectionRun<'a> {
    fn push(&mut self, line: &'a str) {
        if self.seen.insert(line) {
            self.lines.push(line);
        }
    }

    fn into_lines(self) -> Vec<String> {
        self.lines.into_iter().map(str::to_string).collect()
    }
}

/// Subsystem name → raw lines, built once per scrape
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SectionMap {
    sections: HashMap<String, Vec<String>>,
}

impl SectionMap {
    /// Returns the lines of a section
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&[String]> {
        self.sections.get(name).map(Vec::as_slice)
    }

    /// Returns true if the section appeared in the output
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.sections.contains_key(name)
    }

    /// Removes a section and hands its lines to the caller
    pub fn take(&mut self, name: &str) -> Option<Vec<String>> {
        self.sections.remove(name)
    }

    /// Drops every section whose name is not accepted by `keep`
    pub fn retain(&mut self, mut keep: impl FnMut(&str) -> bool) {
        self.sections.retain(|name, _| keep(name));
    }

    /// Section names in sorted order
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.sections.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Number of sections
    #[must_use]
    pub fn len(&self) -> usize {
        self.sections.len()
    }

    /// Returns true if no section was found
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }
}

impl FromIterator<(String, Vec<String>)> for SectionMap {
    fn from_iter<I: IntoIterator<Item = (String, Vec<String>)>>(iter: I) -> Self {
        Self {
            sections: iter.into_iter().collect(),
        }
    }
}

/// Splits raw agent output into sections.
#[must_use]
pub fn demux(raw: &str) -> SectionMap {
    let mut sections: HashMap<String, Vec<String>> = HashMap::new();
    let mut open: Option<(&str, SectionRun<'_>)> = None;

    for line in raw.lines() {
        if let Some(name) = marker_name(line) {
            if open.as_ref().is_some_and(|(current, _)| *current == name) {
                continue;
            }
            tracing::debug!(subsystem = name, "Parsing subsystem");
            if let Some((previous, run)) = open.take() {
                sections.insert(previous.to_string(), run.into_lines());
            }
            open = Some((name, SectionRun::default()));
        } else if let Some((_, run)) = open.as_mut() {
            tracing::trace!(line, "Parsing");
            run.push(line);
        }
    }

    if let Some((last, run)) = open {
        sections.insert(last.to_string(), run.into_lines());
    }

    SectionMap { sections }
}
