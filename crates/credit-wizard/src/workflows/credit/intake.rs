//! File intake slots and the allow-list used at the file-picker boundary.
//!
//! The wizard core never rejects a file: candidates are screened by [`AllowList`] before they
//! reach a slot, and a slot simply keeps the most recently accepted selection.

use std::collections::BTreeMap;

use mime::Mime;
use serde::{Deserialize, Serialize};

use super::domain::DocumentPurpose;

/// Document formats accepted for credit requests and supporting documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MimeCategory {
    Pdf,
    Doc,
    Docx,
    PlainText,
}

impl MimeCategory {
    pub const fn essence(self) -> &'static str {
        match self {
            MimeCategory::Pdf => "application/pdf",
            MimeCategory::Doc => "application/msword",
            MimeCategory::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
            MimeCategory::PlainText => "text/plain",
        }
    }

    pub const fn extension(self) -> &'static str {
        match self {
            MimeCategory::Pdf => "pdf",
            MimeCategory::Doc => "doc",
            MimeCategory::Docx => "docx",
            MimeCategory::PlainText => "txt",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            MimeCategory::Pdf => "PDF",
            MimeCategory::Doc => "DOC",
            MimeCategory::Docx => "DOCX",
            MimeCategory::PlainText => "TXT",
        }
    }
}

/// File offered by the picker before screening.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileCandidate {
    pub name: String,
    pub size_bytes: u64,
    #[serde(default)]
    pub declared_type: Option<String>,
}

impl FileCandidate {
    pub fn new(name: impl Into<String>, size_bytes: u64) -> Self {
        Self {
            name: name.into(),
            size_bytes,
            declared_type: None,
        }
    }

    pub fn with_declared_type(mut self, declared_type: impl Into<String>) -> Self {
        self.declared_type = Some(declared_type.into());
        self
    }
}

/// Reference to an accepted upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileSelection {
    pub name: String,
    pub size_bytes: u64,
    pub mime_category: MimeCategory,
}

impl FileSelection {
    /// Size rounded to whole kibibytes for display.
    pub fn size_kib(&self) -> u64 {
        (self.size_bytes + 512) / 1024
    }
}

/// Allow-list of formats applied by the presentation layer before a file reaches the core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllowList {
    categories: Vec<MimeCategory>,
}

impl Default for AllowList {
    fn default() -> Self {
        Self::documents()
    }
}

impl AllowList {
    /// PDF, Word and plain-text documents.
    pub fn documents() -> Self {
        Self::new(vec![
            MimeCategory::Pdf,
            MimeCategory::Doc,
            MimeCategory::Docx,
            MimeCategory::PlainText,
        ])
    }

    pub fn new(categories: Vec<MimeCategory>) -> Self {
        Self { categories }
    }

    /// Accept a candidate when either its declared type or its extension is allowed.
    pub fn screen(&self, candidate: &FileCandidate) -> Option<FileSelection> {
        let declared = candidate
            .declared_type
            .as_deref()
            .and_then(|raw| raw.parse::<Mime>().ok())
            .and_then(|mime| self.category_for(&mime));

        let category = declared.or_else(|| {
            mime_guess::from_path(&candidate.name)
                .iter()
                .find_map(|mime| self.category_for(&mime))
        })?;

        Some(FileSelection {
            name: candidate.name.clone(),
            size_bytes: candidate.size_bytes,
            mime_category: category,
        })
    }

    /// Screen a drop gesture; dropping more than one file rejects the whole batch.
    pub fn screen_drop(&self, candidates: &[FileCandidate]) -> Option<FileSelection> {
        match candidates {
            [single] => self.screen(single),
            _ => None,
        }
    }

    fn category_for(&self, mime: &Mime) -> Option<MimeCategory> {
        self.categories
            .iter()
            .copied()
            .find(|category| category.essence() == mime.essence_str())
    }
}

/// Single-file slot: accepting a file silently replaces the previous one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileIntake {
    selection: Option<FileSelection>,
}

impl FileIntake {
    /// Store a selection, returning the one it replaced.
    pub fn set_file(&mut self, selection: FileSelection) -> Option<FileSelection> {
        self.selection.replace(selection)
    }

    pub fn clear(&mut self) -> Option<FileSelection> {
        self.selection.take()
    }

    pub fn current(&self) -> Option<&FileSelection> {
        self.selection.as_ref()
    }

    pub fn is_empty(&self) -> bool {
        self.selection.is_none()
    }
}

/// Independent intake slots keyed by document purpose.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentSlots {
    slots: BTreeMap<DocumentPurpose, FileIntake>,
}

impl DocumentSlots {
    pub fn new(purposes: impl IntoIterator<Item = DocumentPurpose>) -> Self {
        let slots = purposes
            .into_iter()
            .map(|purpose| (purpose, FileIntake::default()))
            .collect();
        Self { slots }
    }

    /// Returns `false` when no slot is configured for `purpose`.
    pub fn set_file(&mut self, purpose: DocumentPurpose, selection: FileSelection) -> bool {
        match self.slots.get_mut(&purpose) {
            Some(slot) => {
                slot.set_file(selection);
                true
            }
            None => false,
        }
    }

    pub fn clear(&mut self, purpose: DocumentPurpose) -> bool {
        match self.slots.get_mut(&purpose) {
            Some(slot) => slot.clear().is_some(),
            None => false,
        }
    }

    pub fn clear_all(&mut self) {
        for slot in self.slots.values_mut() {
            slot.clear();
        }
    }

    pub fn current(&self, purpose: DocumentPurpose) -> Option<&FileSelection> {
        self.slots.get(&purpose).and_then(FileIntake::current)
    }

    pub fn contains(&self, purpose: DocumentPurpose) -> bool {
        self.slots.contains_key(&purpose)
    }

    pub fn present_count(&self) -> usize {
        self.slots.values().filter(|slot| !slot.is_empty()).count()
    }

    pub fn missing(&self) -> Vec<DocumentPurpose> {
        self.slots
            .iter()
            .filter(|(_, slot)| slot.is_empty())
            .map(|(purpose, _)| *purpose)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (DocumentPurpose, Option<&FileSelection>)> {
        self.slots
            .iter()
            .map(|(purpose, slot)| (*purpose, slot.current()))
    }
}
