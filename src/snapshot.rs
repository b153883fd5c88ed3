use serde::{Deserialize, Serialize};

use crate::error::SnapshotError;

/// What kind of element produced a fragment. The locators only care about
/// buttons and `<time>`-like elements; everything else is `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FragmentRole {
    Button,
    Time,
    #[default]
    Other,
}

/// One element's rendered text. `text` includes the text of its descendants,
/// the way the host renders it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextFragment {
    pub text: String,
    #[serde(default)]
    pub role: FragmentRole,
    /// Index of the enclosing fragment; always lower than this fragment's index.
    #[serde(default)]
    pub parent: Option<usize>,
}

impl TextFragment {
    pub fn trimmed(&self) -> &str {
        self.text.trim()
    }
}

/// Point-in-time capture of the host document's text, in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<TextFragment>", into = "Vec<TextFragment>")]
pub struct TimeSnapshot {
    fragments: Vec<TextFragment>,
}

impl TimeSnapshot {
    pub fn new(fragments: Vec<TextFragment>) -> Result<Self, SnapshotError> {
        for (index, fragment) in fragments.iter().enumerate() {
            if let Some(parent) = fragment.parent {
                if parent >= index {
                    return Err(SnapshotError::ParentOutOfOrder { index, parent });
                }
            }
        }
        Ok(Self { fragments })
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    pub fn get(&self, index: usize) -> Option<&TextFragment> {
        self.fragments.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &TextFragment)> + '_ {
        self.fragments.iter().enumerate()
    }

    /// `root` followed by all of its descendants, in document order.
    ///
    /// Siblings and ancestors of `root` are never included.
    pub fn subtree(&self, root: usize) -> Vec<usize> {
        if root >= self.fragments.len() {
            return Vec::new();
        }

        let mut in_scope = vec![false; self.fragments.len()];
        in_scope[root] = true;
        let mut members = vec![root];

        for index in root + 1..self.fragments.len() {
            let inside = self.fragments[index]
                .parent
                .map(|parent| in_scope[parent])
                .unwrap_or(false);
            if inside {
                in_scope[index] = true;
                members.push(index);
            }
        }

        members
    }
}

impl TryFrom<Vec<TextFragment>> for TimeSnapshot {
    type Error = SnapshotError;

    fn try_from(fragments: Vec<TextFragment>) -> Result<Self, Self::Error> {
        Self::new(fragments)
    }
}

impl From<TimeSnapshot> for Vec<TextFragment> {
    fn from(snapshot: TimeSnapshot) -> Self {
        snapshot.fragments
    }
}

/// Builds a snapshot top-down; parents are pushed before their children so
/// the ordering invariant holds by construction.
#[derive(Debug, Default)]
pub struct SnapshotBuilder {
    fragments: Vec<TextFragment>,
}

impl SnapshotBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, text: impl Into<String>, role: FragmentRole, parent: Option<usize>) -> usize {
        self.fragments.push(TextFragment {
            text: text.into(),
            role,
            parent,
        });
        self.fragments.len() - 1
    }

    pub fn element(&mut self, text: impl Into<String>, parent: Option<usize>) -> usize {
        self.push(text, FragmentRole::Other, parent)
    }

    pub fn button(&mut self, text: impl Into<String>, parent: Option<usize>) -> usize {
        self.push(text, FragmentRole::Button, parent)
    }

    pub fn build(self) -> Result<TimeSnapshot, SnapshotError> {
        TimeSnapshot::new(self.fragments)
    }
}
