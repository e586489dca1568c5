//! Email message

use std::fmt;

use encoding_rs::{Encoding, UTF_8};
use serde::{Deserialize, Serialize};

use crate::domain::communication::email_addresses::EmailAddress;

use super::MessageError;

/// The media kind of a rendered body variant
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    /// `text/plain`
    PlainText,

    /// `text/html`
    Html,
}

impl MediaKind {
    /// The MIME type of this kind, without parameters
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::PlainText => "text/plain",
            Self::Html => "text/html",
        }
    }

    /// The file extension a view of this kind is resolved with
    pub fn extension(&self) -> &'static str {
        match self {
            Self::PlainText => "txt",
            Self::Html => "html",
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mime_type())
    }
}

/// One rendered representation of the message body
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BodyPart {
    kind: MediaKind,
    content: Vec<u8>,
}

impl BodyPart {
    /// The media kind of this variant
    pub fn kind(&self) -> MediaKind {
        self.kind
    }

    /// The encoded content
    pub fn content(&self) -> &[u8] {
        &self.content
    }
}

/// Email message
///
/// Holds at most one [`BodyPart`] per [`MediaKind`]. Attaching a variant whose
/// kind is already present replaces it in place.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Message {
    /// The sender of the email
    pub from: EmailAddress,

    /// The recipients of the email
    pub to: Vec<EmailAddress>,

    /// The subject of the email
    pub subject: String,

    encoding: &'static Encoding,
    bodies: Vec<BodyPart>,
}

impl Message {
    /// Creates a message with a single recipient and no body.
    pub fn new(from: EmailAddress, to: EmailAddress, subject: impl Into<String>) -> Self {
        Self {
            from,
            to: vec![to],
            subject: subject.into(),
            encoding: UTF_8,
            bodies: Vec::new(),
        }
    }

    /// Sets the encoding body text is encoded with.
    ///
    /// Encodings that `encoding_rs` cannot produce (UTF-16 and `replacement`)
    /// are swapped for their output encoding, UTF-8. Only affects variants
    /// attached afterwards.
    pub fn with_encoding(mut self, encoding: &'static Encoding) -> Self {
        self.encoding = encoding.output_encoding();
        self
    }

    /// Adds another recipient
    pub fn add_recipient(&mut self, to: EmailAddress) {
        self.to.push(to);
    }

    /// The encoding of the body variants
    pub fn encoding(&self) -> &'static Encoding {
        self.encoding
    }

    /// Encodes `text` as a variant for `kind` without attaching it.
    ///
    /// Characters the encoding cannot represent are written as numeric
    /// character references, which is only valid for HTML. Plain text with
    /// such characters is rejected.
    pub fn encode(&self, kind: MediaKind, text: &str) -> Result<BodyPart, MessageError> {
        let (content, _, unmappable) = self.encoding.encode(text);

        if unmappable && kind == MediaKind::PlainText {
            return Err(MessageError::UnmappableText {
                kind,
                encoding: self.encoding.name(),
            });
        }

        Ok(BodyPart {
            kind,
            content: content.into_owned(),
        })
    }

    /// Encodes `text` and attaches it as the variant for `kind`.
    pub fn attach(&mut self, kind: MediaKind, text: &str) -> Result<(), MessageError> {
        let part = self.encode(kind, text)?;

        self.insert(part);

        Ok(())
    }

    /// Attaches an encoded variant, replacing any variant of the same kind.
    pub fn insert(&mut self, part: BodyPart) {
        match self.bodies.iter_mut().find(|existing| existing.kind == part.kind) {
            Some(existing) => *existing = part,
            None => self.bodies.push(part),
        }
    }

    /// Detaches the variant for `kind`, if any
    pub fn remove(&mut self, kind: MediaKind) -> Option<BodyPart> {
        let index = self.bodies.iter().position(|part| part.kind == kind)?;

        Some(self.bodies.remove(index))
    }

    /// The body variants, in the order they were first attached
    pub fn bodies(&self) -> &[BodyPart] {
        &self.bodies
    }

    /// The variant for `kind`, if any
    pub fn body(&self, kind: MediaKind) -> Option<&BodyPart> {
        self.bodies.iter().find(|part| part.kind == kind)
    }

    /// The decoded text of the variant for `kind`, if any
    pub fn body_text(&self, kind: MediaKind) -> Option<String> {
        self.body(kind).map(|part| {
            let (text, _) = self.encoding.decode_without_bom_handling(&part.content);
            text.into_owned()
        })
    }

    /// Whether at least one body variant is attached
    pub fn has_body(&self) -> bool {
        !self.bodies.is_empty()
    }
}
