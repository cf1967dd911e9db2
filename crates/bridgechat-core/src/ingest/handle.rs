use std::path::{Path, PathBuf};

use ignore::WalkBuilder;

use crate::error::BridgeError;

/// A user-selected file, as handed over by a file or folder picker.
#[async_trait::async_trait]
pub trait FileHandle: Send + Sync {
    fn name(&self) -> &str;

    /// Only populated for folder selections.
    fn relative_path(&self) -> Option<&str>;

    /// The media type the source reports, if any.
    fn media_type(&self) -> Option<&str>;

    fn size(&self) -> u64;

    async fn read(&self) -> std::io::Result<Vec<u8>>;
}

/// A file on the local disk.
#[derive(Debug, Clone)]
pub struct LocalFile {
    path: PathBuf,
    name: String,
    relative_path: Option<String>,
    media_type: Option<String>,
    size: u64,
}

impl LocalFile {
    /// Stats the file synchronously to learn its size; a missing file reports 0.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let size = std::fs::metadata(&path).map(|m| m.len()).unwrap_or(0);
        let media_type = guess_media_type(&path).map(str::to_string);
        Self {
            path,
            name,
            relative_path: None,
            media_type,
            size,
        }
    }

    pub fn with_relative_path(mut self, relative_path: impl Into<String>) -> Self {
        self.relative_path = Some(relative_path.into());
        self
    }
}

#[async_trait::async_trait]
impl FileHandle for LocalFile {
    fn name(&self) -> &str {
        &self.name
    }

    fn relative_path(&self) -> Option<&str> {
        self.relative_path.as_deref()
    }

    fn media_type(&self) -> Option<&str> {
        self.media_type.as_deref()
    }

    fn size(&self) -> u64 {
        self.size
    }

    async fn read(&self) -> std::io::Result<Vec<u8>> {
        tokio::fs::read(&self.path).await
    }
}

/// A file whose bytes are already in memory.
#[derive(Debug, Clone)]
pub struct MemoryFile {
    name: String,
    relative_path: Option<String>,
    media_type: Option<String>,
    bytes: Vec<u8>,
}

impl MemoryFile {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            relative_path: None,
            media_type: None,
            bytes: bytes.into(),
        }
    }

    pub fn with_media_type(mut self, media_type: impl Into<String>) -> Self {
        self.media_type = Some(media_type.into());
        self
    }

    pub fn with_relative_path(mut self, relative_path: impl Into<String>) -> Self {
        self.relative_path = Some(relative_path.into());
        self
    }
}

#[async_trait::async_trait]
impl FileHandle for MemoryFile {
    fn name(&self) -> &str {
        &self.name
    }

    fn relative_path(&self) -> Option<&str> {
        self.relative_path.as_deref()
    }

    fn media_type(&self) -> Option<&str> {
        self.media_type.as_deref()
    }

    fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    async fn read(&self) -> std::io::Result<Vec<u8>> {
        Ok(self.bytes.clone())
    }
}

/// Handles for a multi-file selection. Blocks on one `stat` per path.
pub fn select_files<I, P>(paths: I) -> Vec<Box<dyn FileHandle>>
where
    I: IntoIterator<Item = P>,
    P: Into<PathBuf>,
{
    paths
        .into_iter()
        .map(|p| Box::new(LocalFile::new(p)) as Box<dyn FileHandle>)
        .collect()
}

/// Handles for every regular file below `root`, as a folder picker would
/// report them: relative paths start with the folder's own name.
///
/// Nothing is filtered here; hidden names are dropped later by ingestion.
/// The walk is synchronous; async callers should run it on a blocking thread.
pub fn select_directory(root: &Path) -> Result<Vec<Box<dyn FileHandle>>, BridgeError> {
    if !root.is_dir() {
        return Err(BridgeError::Other(format!(
            "Not a directory: {}",
            root.display()
        )));
    }

    let folder_name = root
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let walker = WalkBuilder::new(root)
        .standard_filters(false)
        .follow_links(false)
        .sort_by_file_path(|a, b| a.cmp(b))
        .build();

    let mut handles: Vec<Box<dyn FileHandle>> = Vec::new();
    for entry in walker {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                tracing::warn!("Skipping unreadable entry under {}: {}", root.display(), e);
                continue;
            }
        };
        if !entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
            continue;
        }

        let inner = entry.path().strip_prefix(root).unwrap_or(entry.path());
        let mut relative = folder_name.clone();
        for component in inner.components() {
            if !relative.is_empty() {
                relative.push('/');
            }
            relative.push_str(&component.as_os_str().to_string_lossy());
        }

        handles.push(Box::new(
            LocalFile::new(entry.path()).with_relative_path(relative),
        ));
    }

    Ok(handles)
}

/// Media type from the file extension, `None` when unknown.
pub fn guess_media_type(path: &Path) -> Option<&'static str> {
    let extension = path.extension()?.to_str()?.to_ascii_lowercase();
    let media_type = match extension.as_str() {
        "pdf" => "application/pdf",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "heic" => "image/heic",
        "txt" | "text" | "log" => "text/plain",
        "md" | "markdown" => "text/markdown",
        "csv" => "text/csv",
        "html" | "htm" => "text/html",
        "xml" => "text/xml",
        "css" => "text/css",
        "js" => "text/javascript",
        "py" => "text/x-python",
        "json" => "application/json",
        "rtf" => "application/rtf",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "xls" => "application/vnd.ms-excel",
        "xlsx" => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        "ppt" => "application/vnd.ms-powerpoint",
        "pptx" => "application/vnd.openxmlformats-officedocument.presentationml.presentation",
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        "mp4" => "video/mp4",
        _ => return None,
    };
    Some(media_type)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guess_media_type_is_case_insensitive() {
        assert_eq!(guess_media_type(Path::new("a/Report.PDF")), Some("application/pdf"));
        assert_eq!(guess_media_type(Path::new("photo.jpeg")), Some("image/jpeg"));
    }

    #[test]
    fn test_guess_media_type_unknown() {
        assert_eq!(guess_media_type(Path::new("archive.xyz")), None);
        assert_eq!(guess_media_type(Path::new("Makefile")), None);
    }

    #[test]
    fn test_memory_file_reports_its_length() {
        let file = MemoryFile::new("a.txt", b"hello".to_vec());
        assert_eq!(file.size(), 5);
        assert!(file.media_type().is_none());
        assert!(file.relative_path().is_none());
    }
}
