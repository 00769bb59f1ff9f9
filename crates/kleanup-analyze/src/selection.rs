//! Numbered selection lists and operator command resolution.

use std::collections::BTreeSet;
use std::path::PathBuf;

use itertools::Itertools;
use serde::Serialize;

use kleanup_core::{GroupMap, KleanupError, SummaryGroup};

/// Groups with more immediate subdirectories than this are flagged.
pub const LARGE_DIRECTORY_THRESHOLD: u64 = 15;

/// One numbered line of a displayed list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectionEntry {
    /// 1-based display index.
    pub index: usize,
    /// The summarized group behind this line.
    pub group: SummaryGroup,
}

impl SelectionEntry {
    /// Whether the operator should be warned this is a large directory.
    pub fn is_large(&self) -> bool {
        self.group.child_directory_count > LARGE_DIRECTORY_THRESHOLD
    }

    /// Paths handed on to the archive plan when this entry is chosen.
    pub fn archive_roots(&self) -> Vec<PathBuf> {
        self.group
            .archive_roots()
            .into_iter()
            .map(PathBuf::from)
            .collect()
    }
}

/// An ordered, numbered list of summary groups as shown to the operator.
///
/// Indices are only meaningful for the presentation that produced them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SelectionList {
    first_index: usize,
    entries: Vec<SelectionEntry>,
}

impl SelectionList {
    /// Number the groups in path order, starting at `first_index`.
    ///
    /// Groups without any direct match are left off the list; their size
    /// still counts wherever the group map is used for totals.
    pub fn present(groups: &GroupMap, first_index: usize) -> Self {
        let entries = groups
            .values()
            .filter(|group| group.matched_file_count > 0)
            .zip(first_index..)
            .map(|(group, index)| SelectionEntry {
                index,
                group: group.clone(),
            })
            .collect();

        Self {
            first_index,
            entries,
        }
    }

    /// Index the next list should start at to continue this numbering.
    pub fn next_index(&self) -> usize {
        self.first_index + self.entries.len()
    }

    /// Look up an entry by display index.
    pub fn get(&self, index: usize) -> Option<&SelectionEntry> {
        index
            .checked_sub(self.first_index)
            .and_then(|offset| self.entries.get(offset))
    }

    /// Iterate over entries in display order.
    pub fn iter(&self) -> impl Iterator<Item = &SelectionEntry> {
        self.entries.iter()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the list has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Whether chosen indices are kept or left out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SelectionMode {
    /// The chosen entries are the result.
    Select,
    /// Everything displayed except the chosen entries is the result.
    Ignore,
}

impl SelectionMode {
    /// Parse an operator answer (`S`/`select` or `I`/`ignore`).
    pub fn parse(input: &str) -> Result<Self, KleanupError> {
        match input.trim().to_ascii_lowercase().as_str() {
            "s" | "select" => Ok(Self::Select),
            "i" | "ignore" => Ok(Self::Ignore),
            _ => Err(KleanupError::InvalidSelectionMode {
                input: input.trim().to_string(),
            }),
        }
    }

    /// Verb used in prompts.
    pub fn verb(self) -> &'static str {
        match self {
            Self::Select => "select",
            Self::Ignore => "ignore",
        }
    }
}

/// Which displayed entries the operator named.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionCommand {
    /// Every entry of the first list.
    All,
    /// Every entry of every list shown together.
    Both,
    /// Nothing.
    None,
    /// Explicit display indices.
    Indices(BTreeSet<usize>),
}

impl SelectionCommand {
    /// Parse a space- or comma-separated answer.
    ///
    /// `BOTH` wins over `ALL` when both appear. Other tokens that are not
    /// numbers, `NONE` included, are ignored; an answer without any numbers
    /// means `NONE`.
    pub fn parse(input: &str) -> Self {
        let tokens: Vec<&str> = input
            .split(|c: char| c.is_whitespace() || c == ',')
            .filter(|t| !t.is_empty())
            .collect();

        let has = |word: &str| tokens.iter().any(|t| t.eq_ignore_ascii_case(word));

        if has("both") {
            return Self::Both;
        }
        if has("all") {
            return Self::All;
        }

        let indices: BTreeSet<usize> = tokens.iter().filter_map(|t| t.parse().ok()).collect();
        if indices.is_empty() {
            Self::None
        } else {
            Self::Indices(indices)
        }
    }
}

/// Resolves a command against one or more contiguously numbered lists.
#[derive(Debug, Clone)]
pub struct SelectionResolver<'a> {
    lists: Vec<&'a SelectionList>,
}

impl<'a> SelectionResolver<'a> {
    /// Create a resolver over lists shown together, first list first.
    pub fn new(lists: impl IntoIterator<Item = &'a SelectionList>) -> Self {
        Self {
            lists: lists.into_iter().collect(),
        }
    }

    /// Every displayed entry, in display order.
    pub fn displayed(&self) -> impl Iterator<Item = &'a SelectionEntry> + '_ {
        self.lists.iter().flat_map(|list: &&'a SelectionList| (*list).iter())
    }

    /// The indices a command names. Out-of-range indices are kept here and
    /// simply match nothing.
    pub fn chosen_indices(&self, command: &SelectionCommand) -> BTreeSet<usize> {
        match command {
            SelectionCommand::All => self
                .lists
                .first()
                .map(|list| list.iter().map(|e| e.index).collect())
                .unwrap_or_default(),
            SelectionCommand::Both => self.displayed().map(|e| e.index).collect(),
            SelectionCommand::None => BTreeSet::new(),
            SelectionCommand::Indices(indices) => indices.clone(),
        }
    }

    /// Resolve a mode and command into the final entries, in display order.
    pub fn resolve(
        &self,
        mode: SelectionMode,
        command: &SelectionCommand,
    ) -> Vec<&'a SelectionEntry> {
        let chosen = self.chosen_indices(command);
        let keep = |entry: &&SelectionEntry| match mode {
            SelectionMode::Select => chosen.contains(&entry.index),
            SelectionMode::Ignore => !chosen.contains(&entry.index),
        };

        self.displayed().filter(keep).collect()
    }

    /// Resolve straight to deduplicated archive root paths.
    pub fn resolve_paths(&self, mode: SelectionMode, command: &SelectionCommand) -> Vec<PathBuf> {
        self.resolve(mode, command)
            .into_iter()
            .flat_map(SelectionEntry::archive_roots)
            .unique()
            .collect()
    }
}
