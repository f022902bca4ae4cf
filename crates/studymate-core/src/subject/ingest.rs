//! File ingestion.
//!
//! Plain-text files are read in full. Everything else (office documents,
//! PDFs, unknown formats) is stored as a placeholder and opened with an
//! external app when the user wants to see it.

use std::path::Path;

use tracing::warn;

use super::FileAttachment;

const TEXT_EXTENSIONS: &[&str] = &[
    ".txt", ".md", ".json", ".csv", ".html", ".xml", ".js", ".jsx", ".ts", ".tsx", ".css",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFamily {
    Word,
    Pdf,
    Excel,
    PowerPoint,
    Unknown,
}

impl DocumentFamily {
    pub fn label(self) -> &'static str {
        match self {
            DocumentFamily::Word => "Word",
            DocumentFamily::Pdf => "PDF",
            DocumentFamily::Excel => "Excel",
            DocumentFamily::PowerPoint => "PowerPoint",
            DocumentFamily::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    PlainText,
    Document(DocumentFamily),
}

/// Decide how a file is stored from its name and MIME type.
pub fn classify(name: &str, mime_type: &str) -> FileKind {
    let lower = name.to_ascii_lowercase();
    if mime_type.contains("text") || TEXT_EXTENSIONS.iter().any(|ext| lower.ends_with(ext)) {
        return FileKind::PlainText;
    }
    let family = if lower.ends_with(".docx") {
        DocumentFamily::Word
    } else if lower.ends_with(".pdf") {
        DocumentFamily::Pdf
    } else if lower.ends_with(".xlsx") || lower.ends_with(".xls") {
        DocumentFamily::Excel
    } else if lower.ends_with(".pptx") || lower.ends_with(".ppt") {
        DocumentFamily::PowerPoint
    } else {
        DocumentFamily::Unknown
    };
    FileKind::Document(family)
}

fn placeholder(family: DocumentFamily) -> String {
    format!(
        "📄 {} file\n\nUse \"open\" to view it with the matching application.",
        family.label()
    )
}

/// Build an attachment. `read` is only called for plain-text files; a read
/// failure becomes a visible error string in the attachment content.
pub fn ingest_file<F>(uri: &str, name: &str, mime_type: &str, read: F) -> FileAttachment
where
    F: FnOnce(&str) -> std::io::Result<String>,
{
    let (content, externally_openable) = match classify(name, mime_type) {
        FileKind::PlainText => match read(uri) {
            Ok(text) => (text, false),
            Err(e) => {
                warn!(file = name, error = %e, "failed to read attachment");
                (format!("❌ Could not read file: {e}"), false)
            }
        },
        FileKind::Document(family) => (placeholder(family), true),
    };
    FileAttachment {
        uri: uri.to_string(),
        name: name.to_string(),
        content,
        mime_type: mime_type.to_string(),
        externally_openable,
    }
}

/// Ingest a file from the local filesystem.
pub fn ingest_path(path: &Path) -> FileAttachment {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let uri = path.to_string_lossy();
    ingest_file(&uri, &name, guess_mime(&name), |p| std::fs::read_to_string(p))
}

fn guess_mime(name: &str) -> &'static str {
    let lower = name.to_ascii_lowercase();
    match lower.rsplit_once('.').map(|(_, ext)| ext) {
        Some("txt") | Some("md") | Some("csv") => "text/plain",
        Some("html") => "text/html",
        Some("css") => "text/css",
        Some("json") => "application/json",
        Some("xml") => "application/xml",
        Some("pdf") => "application/pdf",
        Some("docx") => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        Some("xlsx") => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        Some("xls") => "application/vnd.ms-excel",
        Some("pptx") => "application/vnd.openxmlformats-officedocument.presentationml.presentation",
        Some("ppt") => "application/vnd.ms-powerpoint",
        _ => "application/octet-stream",
    }
}

/// Hand an externally-openable attachment to the OS.
pub fn open_external(file: &FileAttachment) -> std::io::Result<()> {
    open::that(&file.uri)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn txt_is_read_in_full() {
        let file = ingest_file("mem://notes.txt", "notes.txt", "", |_| Ok("hello".into()));
        assert_eq!(file.content, "hello");
        assert!(!file.externally_openable);
    }

    #[test]
    fn pdf_gets_placeholder() {
        let file = ingest_file("mem://a.pdf", "a.pdf", "application/pdf", |_| {
            panic!("documents must not be read")
        });
        assert!(file.externally_openable);
        assert!(file.content.contains("PDF"));
    }

    #[test]
    fn classification_table() {
        assert_eq!(classify("README.MD", ""), FileKind::PlainText);
        assert_eq!(classify("data.bin", "text/plain"), FileKind::PlainText);
        assert_eq!(classify("essay.docx", ""), FileKind::Document(DocumentFamily::Word));
        assert_eq!(classify("sheet.xls", ""), FileKind::Document(DocumentFamily::Excel));
        assert_eq!(classify("deck.pptx", ""), FileKind::Document(DocumentFamily::PowerPoint));
        assert_eq!(classify("photo.heic", "image/heic"), FileKind::Document(DocumentFamily::Unknown));
    }

    #[test]
    fn read_failure_becomes_placeholder() {
        let file = ingest_file("mem://x.md", "x.md", "", |_| {
            Err(std::io::Error::new(std::io::ErrorKind::NotFound, "gone"))
        });
        assert!(file.content.starts_with("❌ Could not read file"));
        assert!(file.content.contains("gone"));
        assert!(!file.externally_openable);
    }

    #[test]
    fn ingest_path_reads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("summary.txt");
        let mut f = std::fs::File::create(&path).unwrap();
        write!(f, "cell theory").unwrap();

        let file = ingest_path(&path);
        assert_eq!(file.name, "summary.txt");
        assert_eq!(file.content, "cell theory");
        assert_eq!(file.mime_type, "text/plain");
    }
}
