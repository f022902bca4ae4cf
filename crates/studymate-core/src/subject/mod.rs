//! Subjects and their content.
//!
//! Every subject gets an opaque [`SubjectId`] when it is created, whether it
//! was typed in, imported, or loaded from the remote store. All mutators look
//! subjects up by that id.
//!
//! Mutators validate before they touch anything, so a failed call leaves the
//! list exactly as it was.

pub mod ingest;

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ValidationError;

pub use ingest::{classify, ingest_file, ingest_path, open_external, DocumentFamily, FileKind};

pub const DEFAULT_EMOJI: &str = "📚";
pub const DEFAULT_SECTION_NAME: &str = "Content";

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubjectId(String);

impl SubjectId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for SubjectId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SubjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SubjectId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// A file attached to a subject.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileAttachment {
    pub uri: String,
    pub name: String,
    /// Extracted text, or a placeholder for files viewed externally.
    pub content: String,
    #[serde(default)]
    pub mime_type: String,
    /// Viewing is delegated to an external app.
    #[serde(default)]
    pub externally_openable: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentSection {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
    pub id: SubjectId,
    /// Row id in the remote store, if the subject exists there.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_id: Option<String>,
    pub name: String,
    pub emoji: String,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub files: Vec<FileAttachment>,
    #[serde(default)]
    pub notes: Vec<String>,
    #[serde(default)]
    pub sections: Vec<ContentSection>,
}

impl Subject {
    /// New local subject. The name is trimmed and must not be empty; an
    /// empty emoji falls back to [`DEFAULT_EMOJI`].
    pub fn new(name: &str, emoji: &str) -> Result<Self, ValidationError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ValidationError::Required("name".into()));
        }
        let emoji = match emoji.trim() {
            "" => DEFAULT_EMOJI,
            e => e,
        };
        Ok(Self {
            id: SubjectId::new(),
            remote_id: None,
            name: name.to_string(),
            emoji: emoji.to_string(),
            images: Vec::new(),
            files: Vec::new(),
            notes: Vec::new(),
            sections: Vec::new(),
        })
    }

    pub fn with_remote_id(mut self, remote_id: impl Into<String>) -> Self {
        self.remote_id = Some(remote_id.into());
        self
    }

    /// Name shown for the first content section.
    pub fn section_title(&self) -> &str {
        self.sections
            .first()
            .map(|s| s.name.as_str())
            .unwrap_or(DEFAULT_SECTION_NAME)
    }
}

/// Ordered list of subjects, addressed by id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubjectList {
    subjects: Vec<Subject>,
}

impl SubjectList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_vec(subjects: Vec<Subject>) -> Self {
        Self { subjects }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Subject> {
        self.subjects.iter()
    }

    pub fn len(&self) -> usize {
        self.subjects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subjects.is_empty()
    }

    pub fn get(&self, id: &SubjectId) -> Option<&Subject> {
        self.subjects.iter().find(|s| &s.id == id)
    }

    pub fn find_by_name(&self, name: &str) -> Option<&Subject> {
        self.subjects.iter().find(|s| s.name == name)
    }

    pub fn clear(&mut self) {
        self.subjects.clear();
    }

    pub fn push(&mut self, subject: Subject) -> SubjectId {
        let id = subject.id.clone();
        self.subjects.push(subject);
        id
    }

    /// Replace the subject with `id` in place, keeping its position.
    pub fn replace(&mut self, id: &SubjectId, subject: Subject) -> Result<Subject, ValidationError> {
        let slot = self.position(id)?;
        Ok(std::mem::replace(&mut self.subjects[slot], subject))
    }

    pub fn remove(&mut self, id: &SubjectId) -> Result<Subject, ValidationError> {
        let slot = self.position(id)?;
        Ok(self.subjects.remove(slot))
    }

    pub fn add_images(&mut self, id: &SubjectId, uris: Vec<String>) -> Result<(), ValidationError> {
        self.get_mut(id)?.images.extend(uris);
        Ok(())
    }

    pub fn add_files(
        &mut self,
        id: &SubjectId,
        files: Vec<FileAttachment>,
    ) -> Result<(), ValidationError> {
        self.get_mut(id)?.files.extend(files);
        Ok(())
    }

    /// Append a note. Returns the trimmed text that was stored.
    pub fn add_note(&mut self, id: &SubjectId, text: &str) -> Result<String, ValidationError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ValidationError::Required("note".into()));
        }
        self.get_mut(id)?.notes.push(text.to_string());
        Ok(text.to_string())
    }

    pub fn remove_image(&mut self, id: &SubjectId, index: usize) -> Result<String, ValidationError> {
        let subject = self.get_mut(id)?;
        remove_at(&mut subject.images, index, "images")
    }

    pub fn remove_file(
        &mut self,
        id: &SubjectId,
        index: usize,
    ) -> Result<FileAttachment, ValidationError> {
        let subject = self.get_mut(id)?;
        remove_at(&mut subject.files, index, "files")
    }

    pub fn remove_note(&mut self, id: &SubjectId, index: usize) -> Result<String, ValidationError> {
        let subject = self.get_mut(id)?;
        remove_at(&mut subject.notes, index, "notes")
    }

    pub fn add_section(&mut self, id: &SubjectId, name: &str) -> Result<(), ValidationError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ValidationError::Required("section name".into()));
        }
        self.get_mut(id)?.sections.push(ContentSection {
            name: name.to_string(),
        });
        Ok(())
    }

    /// Rename a content section. Renaming the first section of a subject
    /// that has none creates it.
    pub fn rename_section(
        &mut self,
        id: &SubjectId,
        index: usize,
        name: &str,
    ) -> Result<(), ValidationError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ValidationError::Required("section name".into()));
        }
        let subject = self.get_mut(id)?;
        if subject.sections.is_empty() && index == 0 {
            subject.sections.push(ContentSection {
                name: DEFAULT_SECTION_NAME.into(),
            });
        }
        let len = subject.sections.len();
        let section = subject
            .sections
            .get_mut(index)
            .ok_or_else(|| ValidationError::OutOfBounds {
                collection: "sections".into(),
                index,
                len,
            })?;
        section.name = name.to_string();
        Ok(())
    }

    fn position(&self, id: &SubjectId) -> Result<usize, ValidationError> {
        self.subjects
            .iter()
            .position(|s| &s.id == id)
            .ok_or_else(|| ValidationError::SubjectNotFound(id.to_string()))
    }

    fn get_mut(&mut self, id: &SubjectId) -> Result<&mut Subject, ValidationError> {
        let slot = self.position(id)?;
        Ok(&mut self.subjects[slot])
    }
}

impl IntoIterator for SubjectList {
    type Item = Subject;
    type IntoIter = std::vec::IntoIter<Subject>;

    fn into_iter(self) -> Self::IntoIter {
        self.subjects.into_iter()
    }
}

fn remove_at<T>(items: &mut Vec<T>, index: usize, collection: &str) -> Result<T, ValidationError> {
    if index >= items.len() {
        return Err(ValidationError::OutOfBounds {
            collection: collection.into(),
            index,
            len: items.len(),
        });
    }
    Ok(items.remove(index))
}
