//! Slash-separated collection paths such as `chats` or `chats/{id}/messages`.
//!
//! A collection path always has an odd number of segments: collection names
//! alternate with document ids.

use std::fmt;

use mentor_core::error::MentorError;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CollectionPath {
    segments: Vec<String>,
}

impl CollectionPath {
    /// A top-level collection.
    pub fn root(name: &str) -> Result<Self, MentorError> {
        validate_segment(name)?;
        Ok(Self {
            segments: vec![name.to_string()],
        })
    }

    /// Parse `a/b/c` into a collection path.
    pub fn parse(raw: &str) -> Result<Self, MentorError> {
        let segments: Vec<String> = raw.split('/').map(str::to_string).collect();
        for segment in &segments {
            validate_segment(segment)?;
        }
        if segments.len() % 2 == 0 {
            return Err(MentorError::Storage(format!(
                "'{}' names a document, not a collection",
                raw
            )));
        }
        Ok(Self { segments })
    }

    /// The subcollection `name` under document `doc_id` of this collection.
    pub fn subcollection(&self, doc_id: &str, name: &str) -> Result<Self, MentorError> {
        validate_segment(doc_id)?;
        validate_segment(name)?;
        let mut segments = self.segments.clone();
        segments.push(doc_id.to_string());
        segments.push(name.to_string());
        Ok(Self { segments })
    }

    pub fn as_string(&self) -> String {
        self.segments.join("/")
    }

    /// Number of nesting levels below the root collection.
    pub fn depth(&self) -> usize {
        self.segments.len() / 2
    }
}

impl fmt::Display for CollectionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.join("/"))
    }
}

fn validate_segment(segment: &str) -> Result<(), MentorError> {
    if segment.trim().is_empty() {
        return Err(MentorError::Storage(
            "path segments must not be empty".to_string(),
        ));
    }
    if segment.contains('/') {
        return Err(MentorError::Storage(format!(
            "path segment '{}' must not contain '/'",
            segment
        )));
    }
    Ok(())
}
