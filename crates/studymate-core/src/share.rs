//! Sharing payload codec.
//!
//! Subjects are shared as a small JSON object that users copy, paste or scan:
//!
//! ```text
//! {"nombre":"Algebra","emoji":"📐","notas":["..."],"imagenes":[],"archivos":[]}
//! ```
//!
//! The field names and order are fixed for interop with other installs.
//! Images and files are always sent empty because their URIs only mean
//! something on the device that created them.

use serde::Serialize;
use serde_json::Value;

use crate::error::ShareError;
use crate::subject::{Subject, SubjectId};

#[derive(Serialize)]
struct WirePayload<'a> {
    nombre: &'a str,
    emoji: &'a str,
    notas: &'a [String],
    imagenes: [(); 0],
    archivos: [(); 0],
}

/// Encode the shareable view of a subject.
pub fn encode(subject: &Subject) -> String {
    let payload = WirePayload {
        nombre: &subject.name,
        emoji: &subject.emoji,
        notas: &subject.notes,
        imagenes: [],
        archivos: [],
    };
    // A struct of strings and empty arrays always serializes.
    serde_json::to_string(&payload).unwrap_or_default()
}

/// A subject received from someone else.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SharedSubject {
    pub name: String,
    pub emoji: String,
    pub notes: Vec<String>,
}

impl SharedSubject {
    /// Turn into a local subject with a fresh id and no attachments.
    pub fn into_subject(self) -> Subject {
        Subject {
            id: SubjectId::new(),
            remote_id: None,
            name: self.name,
            emoji: self.emoji,
            images: Vec::new(),
            files: Vec::new(),
            notes: self.notes,
            sections: Vec::new(),
        }
    }
}

/// Parse and validate a payload.
///
/// `nombre` and `emoji` must be non-empty strings. Everything else is
/// optional; `notas` entries that are not strings are dropped and unknown
/// fields are ignored.
pub fn decode(payload: &str) -> Result<SharedSubject, ShareError> {
    let value: Value = serde_json::from_str(payload.trim())?;
    let object = value
        .as_object()
        .ok_or_else(|| ShareError::Invalid("expected a JSON object".into()))?;

    let name = required_string(object, "nombre")?;
    let emoji = required_string(object, "emoji")?;
    let notes = match object.get("notas") {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|n| n.as_str().map(str::to_string))
            .collect(),
        _ => Vec::new(),
    };

    Ok(SharedSubject { name, emoji, notes })
}

fn required_string(
    object: &serde_json::Map<String, Value>,
    field: &str,
) -> Result<String, ShareError> {
    match object.get(field) {
        None | Some(Value::Null) => Err(ShareError::Invalid(format!("missing '{field}'"))),
        Some(Value::String(s)) if !s.trim().is_empty() => Ok(s.clone()),
        Some(Value::String(_)) => Err(ShareError::Invalid(format!("'{field}' is empty"))),
        Some(_) => Err(ShareError::Invalid(format!("'{field}' must be a string"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subject::FileAttachment;

    fn subject() -> Subject {
        let mut s = Subject::new("Geometry", "📐").unwrap();
        s.notes = vec!["Pythagoras".into(), "Thales \"quoted\"".into()];
        s.images = vec!["file:///photo.jpg".into()];
        s.files = vec![FileAttachment {
            uri: "file:///a.txt".into(),
            name: "a.txt".into(),
            content: "x".into(),
            mime_type: "text/plain".into(),
            externally_openable: false,
        }];
        s
    }

    #[test]
    fn wire_format_is_exact() {
        let mut s = Subject::new("X", "📐").unwrap();
        s.notes = vec!["n1".into()];
        assert_eq!(
            encode(&s),
            r#"{"nombre":"X","emoji":"📐","notas":["n1"],"imagenes":[],"archivos":[]}"#
        );
    }

    #[test]
    fn round_trip_drops_attachments() {
        let original = subject();
        let decoded = decode(&encode(&original)).unwrap();
        assert_eq!(decoded.name, original.name);
        assert_eq!(decoded.emoji, original.emoji);
        assert_eq!(decoded.notes, original.notes);
        let imported = decoded.into_subject();
        assert!(imported.images.is_empty());
        assert!(imported.files.is_empty());
        assert_ne!(imported.id, original.id);
    }

    #[test]
    fn requires_name_and_emoji() {
        assert!(matches!(decode(r#"{"nombre":"X"}"#), Err(ShareError::Invalid(_))));
        assert!(matches!(decode(r#"{"emoji":"📐"}"#), Err(ShareError::Invalid(_))));
        let ok = decode(r#"{"nombre":"X","emoji":"📐"}"#).unwrap();
        assert!(ok.notes.is_empty());
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        assert!(matches!(decode(r#"{"nombre":"X","#), Err(ShareError::Parse(_))));
        assert!(matches!(decode(""), Err(ShareError::Parse(_))));
    }

    #[test]
    fn non_string_emoji_is_rejected() {
        assert!(matches!(
            decode(r#"{"nombre":"X","emoji":42}"#),
            Err(ShareError::Invalid(_))
        ));
        assert!(matches!(
            decode(r#"{"nombre":"","emoji":"📐"}"#),
            Err(ShareError::Invalid(_))
        ));
    }

    #[test]
    fn tolerates_extra_and_odd_fields() {
        let decoded = decode(
            r#"{"id":"7","nombre":"X","emoji":"📐","notas":["a",3,"b"],"color":"red","archivos":[{"uri":"x"}]}"#,
        )
        .unwrap();
        assert_eq!(decoded.notes, vec!["a", "b"]);

        let decoded = decode(r#"{"nombre":"X","emoji":"📐","notas":"not a list"}"#).unwrap();
        assert!(decoded.notes.is_empty());
    }

    #[test]
    fn top_level_must_be_object() {
        assert!(matches!(decode("[1,2]"), Err(ShareError::Invalid(_))));
    }
}
