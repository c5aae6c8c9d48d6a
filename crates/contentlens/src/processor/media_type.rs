use std::fmt;
use std::path::Path;

/// Generic fallback sent by browsers and HTTP clients that could not classify a file.
pub const OCTET_STREAM: &str = "application/octet-stream";

pub const PLAIN_TEXT: &str = "text/plain";
pub const MARKDOWN: &str = "text/markdown";
pub const JSON: &str = "application/json";
pub const WORD_DOCUMENT: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// Concrete media type a document is dispatched on.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MediaType {
    PlainText,
    Markdown,
    Json,
    WordDocument,
    /// Any `image/*` type, carrying the full MIME string.
    Image(String),
    /// Anything else, including the generic fallback when inference fails.
    Other(String),
}

impl MediaType {
    /// Parses a declared MIME type. Parameters such as `; charset=utf-8` are ignored
    /// and matching is case-insensitive.
    pub fn from_mime(mime: &str) -> Self {
        let essence = mime
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();

        match essence.as_str() {
            PLAIN_TEXT => Self::PlainText,
            MARKDOWN => Self::Markdown,
            JSON => Self::Json,
            WORD_DOCUMENT => Self::WordDocument,
            _ if essence.starts_with("image/") => Self::Image(essence),
            _ => Self::Other(essence),
        }
    }

    /// Looks up the fixed extension table used when the declared type is generic.
    pub fn from_file_name(file_name: &str) -> Option<Self> {
        let extension = Path::new(file_name)
            .extension()
            .and_then(|e| e.to_str())?
            .to_ascii_lowercase();

        match extension.as_str() {
            "md" | "markdown" => Some(Self::Markdown),
            "txt" => Some(Self::PlainText),
            "json" => Some(Self::Json),
            "docx" => Some(Self::WordDocument),
            _ => None,
        }
    }

    pub fn as_mime(&self) -> &str {
        match self {
            Self::PlainText => PLAIN_TEXT,
            Self::Markdown => MARKDOWN,
            Self::Json => JSON,
            Self::WordDocument => WORD_DOCUMENT,
            Self::Image(mime) | Self::Other(mime) => mime,
        }
    }

    pub fn is_image(&self) -> bool {
        matches!(self, Self::Image(_))
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_mime())
    }
}

/// Resolves the type a document is extracted as.
///
/// The declared type wins unless it is the generic binary fallback, in which case the
/// extension of `file_name` decides. Unknown extensions keep the generic type.
pub fn resolve_type(declared_type: &str, file_name: &str) -> MediaType {
    let declared = MediaType::from_mime(declared_type);
    match declared {
        MediaType::Other(ref mime) if mime == OCTET_STREAM => {
            MediaType::from_file_name(file_name).unwrap_or(declared)
        }
        _ => declared,
    }
}
