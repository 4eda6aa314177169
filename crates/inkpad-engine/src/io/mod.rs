//! Note storage: markdown text in, markdown text out.
//!
//! Notes are addressed by a [`RelativePath`] under the notes root, so the
//! same path works whichever directory the host points at.

use anyhow::Context;
use log::debug;
use relative_path::RelativePath;
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::EditorConfig;
use crate::editing::Editor;
use crate::markdown;
use crate::model::Document;

#[derive(Debug, thiserror::Error)]
pub enum IoError {
    #[error("Note not found: {0}")]
    NotFound(PathBuf),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid notes directory: {0}")]
    InvalidNotesDir(String),
}

/// Read a note's markdown source
pub fn read_note(relative_path: &RelativePath, notes_root: &Path) -> Result<String, IoError> {
    let absolute_path = relative_path.to_path(notes_root);
    if !absolute_path.is_file() {
        return Err(IoError::NotFound(absolute_path));
    }
    fs::read_to_string(&absolute_path).map_err(IoError::Io)
}

/// Write a note, creating parent directories as needed
pub fn write_note(
    relative_path: &RelativePath,
    notes_root: &Path,
    content: &str,
) -> Result<(), IoError> {
    let absolute_path = relative_path.to_path(notes_root);

    if let Some(parent) = absolute_path.parent() {
        fs::create_dir_all(parent).map_err(IoError::Io)?;
    }

    debug!("writing {} bytes to {}", content.len(), absolute_path.display());
    fs::write(&absolute_path, content).map_err(IoError::Io)
}

/// Read and parse a note
pub fn load_document(relative_path: &RelativePath, notes_root: &Path) -> Result<Document, IoError> {
    read_note(relative_path, notes_root).map(|source| markdown::parse(&source))
}

/// Serialize and write a note
pub fn save_document(
    relative_path: &RelativePath,
    notes_root: &Path,
    doc: &Document,
) -> Result<(), IoError> {
    write_note(relative_path, notes_root, &markdown::serialize(doc))
}

/// Open an editing session over a note
pub fn open_note(
    relative_path: &RelativePath,
    notes_root: &Path,
    config: EditorConfig,
) -> anyhow::Result<Editor> {
    let source = read_note(relative_path, notes_root)
        .with_context(|| format!("Failed to open note {relative_path}"))?;
    Ok(Editor::from_markdown(&source, config))
}

/// Write a session's document back to its note
pub fn save_note(
    relative_path: &RelativePath,
    notes_root: &Path,
    editor: &Editor,
) -> anyhow::Result<()> {
    write_note(relative_path, notes_root, &editor.to_markdown())
        .with_context(|| format!("Failed to save note {relative_path}"))
}

pub fn validate_notes_dir(path: &Path) -> Result<(), IoError> {
    if !path.is_dir() {
        return Err(IoError::InvalidNotesDir(format!(
            "{} is not a directory",
            path.display()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn notes_dir() -> TempDir {
        TempDir::new().unwrap()
    }

    #[test]
    fn test_read_note_not_found() {
        let dir = notes_dir();
        let result = read_note(RelativePath::new("missing.md"), dir.path());
        assert!(matches!(result, Err(IoError::NotFound(_))));
    }

    #[test]
    fn test_write_note_creates_parent_directories() {
        let dir = notes_dir();
        let path = RelativePath::new("journal/2024/today.md");
        write_note(path, dir.path(), "- [ ] call mum").unwrap();

        assert!(dir.path().join("journal").join("2024").is_dir());
        assert_eq!(read_note(path, dir.path()).unwrap(), "- [ ] call mum");
    }

    #[test]
    fn test_write_note_overwrites_existing() {
        let dir = notes_dir();
        let path = RelativePath::new("note.md");
        write_note(path, dir.path(), "old").unwrap();
        write_note(path, dir.path(), "new").unwrap();
        assert_eq!(read_note(path, dir.path()).unwrap(), "new");
    }

    #[test]
    fn test_documents_round_trip_through_storage() {
        let dir = notes_dir();
        let path = RelativePath::new("note.md");
        let source = "# Title\n\nSee [docs](https://x.com)[^1]\n\n[^1]: A note.";
        write_note(path, dir.path(), source).unwrap();

        let doc = load_document(path, dir.path()).unwrap();
        save_document(path, dir.path(), &doc).unwrap();
        assert_eq!(read_note(path, dir.path()).unwrap(), source);
    }

    #[test]
    fn test_sessions_open_and_save_notes() {
        let dir = notes_dir();
        let path = RelativePath::new("todo.md");
        write_note(path, dir.path(), "- [ ] ship it").unwrap();

        let mut editor = open_note(path, dir.path(), EditorConfig::default()).unwrap();
        editor.toggle_task(3).unwrap();
        save_note(path, dir.path(), &editor).unwrap();
        assert_eq!(read_note(path, dir.path()).unwrap(), "- [x] ship it");

        let err = open_note(RelativePath::new("gone.md"), dir.path(), EditorConfig::default())
            .unwrap_err();
        assert!(err.to_string().contains("gone.md"));
    }

    #[test]
    fn test_validate_notes_dir() {
        let dir = notes_dir();
        assert!(validate_notes_dir(dir.path()).is_ok());
        assert!(matches!(
            validate_notes_dir(&dir.path().join("nope")),
            Err(IoError::InvalidNotesDir(_))
        ));
    }
}
