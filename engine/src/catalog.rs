//! Prompt catalogs.
//!
//! A catalog is an ordered list of named prompts. Batches are stored as RON
//! documents of the following shape:
//!
//! ```text
//! (
//!     label: "creative avatars",
//!     output_dir: "avatars_creative",
//!     subject: "young man early 30s, short dark hair",
//!     entries: [
//!         (id: "ceo_of_crabs", prompt: "Digital illustration of {subject}, ..."),
//!     ],
//! )
//! ```
//!
//! Every `{subject}` placeholder in a prompt is replaced by `subject` while
//! loading, so a batch can describe its person once.

use std::{collections::HashSet, path::PathBuf};

use color_eyre::{
    Result,
    eyre::{WrapErr as _, ensure, eyre},
};
use nonempty::NonEmpty;
use serde::Deserialize;

pub const SUBJECT_PLACEHOLDER: &str = "{subject}";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptEntry {
    pub id: String,
    pub prompt_text: String,
}

impl PromptEntry {
    pub fn new(id: impl Into<String>, prompt_text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            prompt_text: prompt_text.into(),
        }
    }
}

/// Insertion ordered, non-empty set of prompts with unique ids.
#[derive(Debug, Clone)]
pub struct Catalog {
    entries: NonEmpty<PromptEntry>,
}

impl Catalog {
    pub fn new(entries: Vec<PromptEntry>) -> Result<Self> {
        let entries = NonEmpty::from_vec(entries).ok_or(eyre!("Catalog has no entries"))?;

        let mut seen = HashSet::new();
        for entry in entries.iter() {
            validate_id(&entry.id)?;
            ensure!(
                seen.insert(entry.id.as_str()),
                "Duplicate catalog id: {}",
                entry.id
            );
            ensure!(
                !entry.prompt_text.trim().is_empty(),
                "Empty prompt for catalog id: {}",
                entry.id
            );
        }

        Ok(Self { entries })
    }

    pub fn iter(&self) -> impl Iterator<Item = &PromptEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_last(&self, index: usize) -> bool {
        index + 1 == self.entries.len()
    }

    pub fn last_id(&self) -> &str {
        &self.entries.last().id
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.id.as_str())
    }
}

/// A catalog together with where its images go.
#[derive(Debug, Clone)]
pub struct Batch {
    pub label: String,
    pub output_dir: PathBuf,
    pub catalog: Catalog,
}

#[derive(Debug, Deserialize)]
struct BatchFile {
    label: String,
    output_dir: PathBuf,
    #[serde(default)]
    subject: String,
    entries: Vec<EntryFile>,
}

#[derive(Debug, Deserialize)]
struct EntryFile {
    id: String,
    prompt: String,
}

impl Batch {
    pub fn from_ron(src: &str) -> Result<Self> {
        let file: BatchFile = ron::from_str(src).wrap_err("Couldn't parse batch file")?;
        let BatchFile {
            label,
            output_dir,
            subject,
            entries,
        } = file;

        let subject = subject.trim();
        let entries = entries
            .into_iter()
            .map(|e| -> Result<PromptEntry> {
                ensure!(
                    !subject.is_empty() || !e.prompt.contains(SUBJECT_PLACEHOLDER),
                    "Prompt {} uses {SUBJECT_PLACEHOLDER} but the batch has no subject",
                    e.id
                );
                Ok(PromptEntry {
                    prompt_text: e.prompt.replace(SUBJECT_PLACEHOLDER, subject),
                    id: e.id,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let catalog = Catalog::new(entries).wrap_err_with(|| format!("Invalid batch: {label}"))?;
        Ok(Self {
            label,
            output_dir,
            catalog,
        })
    }
}

/// Ids become file stems, so they must not be able to escape the output dir.
fn validate_id(id: &str) -> Result<()> {
    ensure!(!id.trim().is_empty(), "Catalog ids must not be empty");
    ensure!(
        id != "." && id != "..",
        "Catalog id is not a valid file name: {id}"
    );
    ensure!(
        !id.contains(['/', '\\']),
        "Catalog id must not contain path separators: {id}"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use indoc::indoc;

    use super::*;

    const BATCH: &str = indoc! {r#"
        (
            label: "test avatars",
            output_dir: "out",
            subject: "  a tall person with a hat ",
            entries: [
                (id: "zeta", prompt: "Portrait of {subject}, oil painting"),
                (id: "alpha", prompt: "Sketch of {subject}"),
                (id: "mid", prompt: "A lighthouse at night"),
            ],
        )
    "#};

    #[test]
    fn batch_keeps_file_order() -> Result<()> {
        let batch = Batch::from_ron(BATCH)?;
        assert_eq!(batch.label, "test avatars");
        assert_eq!(batch.output_dir, PathBuf::from("out"));
        assert_eq!(
            batch.catalog.ids().collect::<Vec<_>>(),
            vec!["zeta", "alpha", "mid"]
        );
        assert_eq!(batch.catalog.last_id(), "mid");
        assert!(batch.catalog.is_last(2));
        assert!(!batch.catalog.is_last(0));
        Ok(())
    }

    #[test]
    fn subject_is_substituted() -> Result<()> {
        let batch = Batch::from_ron(BATCH)?;
        let prompts: Vec<_> = batch.catalog.iter().map(|e| &e.prompt_text).collect();
        assert_eq!(prompts[0], "Portrait of a tall person with a hat, oil painting");
        assert_eq!(prompts[1], "Sketch of a tall person with a hat");
        assert_eq!(prompts[2], "A lighthouse at night");
        Ok(())
    }

    #[test]
    fn placeholder_without_subject_is_rejected() {
        let src = r#"(label: "x", output_dir: "o", entries: [(id: "a", prompt: "{subject}")])"#;
        let err = Batch::from_ron(src).unwrap_err();
        assert!(err.to_string().contains("has no subject"));
    }

    #[test]
    fn empty_catalog_is_rejected() {
        let err = Catalog::new(vec![]).unwrap_err();
        assert!(err.to_string().contains("no entries"));
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let err = Catalog::new(vec![
            PromptEntry::new("a", "one"),
            PromptEntry::new("a", "two"),
        ])
        .unwrap_err();
        assert!(err.to_string().contains("Duplicate catalog id: a"));
    }

    #[test]
    fn path_like_ids_are_rejected() {
        for id in ["", "..", "nested/name", r"win\name"] {
            assert!(
                Catalog::new(vec![PromptEntry::new(id, "prompt")]).is_err(),
                "id {id:?} should be rejected"
            );
        }
    }

    #[test]
    fn blank_prompts_are_rejected() {
        let err = Catalog::new(vec![PromptEntry::new("a", "   \n")]).unwrap_err();
        assert!(err.to_string().contains("Empty prompt"));
    }
}
