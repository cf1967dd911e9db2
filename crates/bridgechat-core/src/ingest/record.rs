use serde::{Deserialize, Serialize};

/// One ingested reference document, held fully in memory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileRecord {
    pub id: String,
    pub name: String,
    /// Path inside an uploaded folder (`folder/sub/file.pdf`); empty for
    /// single-file uploads.
    pub relative_path: String,
    pub media_type: String,
    pub size_bytes: u64,
    /// `data:<media_type>;base64,<payload>`
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview_content: Option<String>,
}

impl FileRecord {
    /// The base64 payload without its data-URI header.
    pub fn payload(&self) -> &str {
        match self.content.split_once(',') {
            Some((_, payload)) => payload,
            None => &self.content,
        }
    }

    pub fn kind(&self) -> FileKind {
        FileKind::from_media_type(&self.media_type)
    }

    pub fn is_image(&self) -> bool {
        self.media_type.starts_with("image/")
    }

    /// Folder path when present, otherwise the bare name.
    pub fn display_path(&self) -> &str {
        if self.relative_path.is_empty() {
            &self.name
        } else {
            &self.relative_path
        }
    }
}

/// Coarse document category, used for icons and listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Pdf,
    Image,
    Text,
    Other,
}

impl FileKind {
    pub fn from_media_type(media_type: &str) -> Self {
        if media_type.contains("pdf") {
            FileKind::Pdf
        } else if media_type.contains("image") {
            FileKind::Image
        } else if media_type.contains("text") || media_type.contains("plain") {
            FileKind::Text
        } else {
            FileKind::Other
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            FileKind::Pdf => "pdf",
            FileKind::Image => "image",
            FileKind::Text => "text",
            FileKind::Other => "file",
        }
    }
}

/// Human-readable size in 1024 steps, e.g. `0 Bytes`, `1.5 KB`, `2 MB`.
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];
    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    let rounded = format!("{value:.2}");
    let trimmed = rounded.trim_end_matches('0').trim_end_matches('.');
    format!("{} {}", trimmed, UNITS[unit])
}
