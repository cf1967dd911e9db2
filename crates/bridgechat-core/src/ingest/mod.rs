mod handle;
mod record;

pub use handle::{guess_media_type, select_directory, select_files, FileHandle, LocalFile, MemoryFile};
pub use record::{format_size, FileKind, FileRecord};

use base64::{engine::general_purpose, Engine as _};
use futures::future::join_all;

use crate::constants::ingest::{FALLBACK_MEDIA_TYPE, HIDDEN_PREFIX};

/// Names starting with `.` (`.DS_Store`, `.gitkeep`, ...) are never ingested.
pub fn is_hidden(name: &str) -> bool {
    name.starts_with(HIDDEN_PREFIX)
}

/// Read a batch of selected files into records.
///
/// All reads run concurrently and the call returns once every one of them
/// has finished. Hidden files are skipped, unreadable files are logged and
/// left out; the rest come back in selection order.
pub async fn ingest_batch(handles: &[Box<dyn FileHandle>]) -> Vec<FileRecord> {
    let reads = handles.iter().map(|handle| read_one(handle.as_ref()));
    let results = join_all(reads).await;

    let records: Vec<FileRecord> = results.into_iter().flatten().collect();
    tracing::info!(
        "Ingested {} of {} selected files",
        records.len(),
        handles.len()
    );
    records
}

async fn read_one(handle: &dyn FileHandle) -> Option<FileRecord> {
    if is_hidden(handle.name()) {
        tracing::debug!("Skipping hidden file {}", handle.name());
        return None;
    }

    match handle.read().await {
        Ok(bytes) => Some(to_record(handle, &bytes)),
        Err(e) => {
            tracing::warn!("Failed to read {}: {}", handle.name(), e);
            None
        }
    }
}

fn to_record(handle: &dyn FileHandle, bytes: &[u8]) -> FileRecord {
    let media_type = handle
        .media_type()
        .filter(|t| !t.is_empty())
        .unwrap_or(FALLBACK_MEDIA_TYPE)
        .to_string();
    let content = format!(
        "data:{};base64,{}",
        media_type,
        general_purpose::STANDARD.encode(bytes)
    );
    let preview_content = media_type
        .starts_with("image/")
        .then(|| content.clone());

    FileRecord {
        id: uuid::Uuid::new_v4().to_string(),
        name: handle.name().to_string(),
        relative_path: handle.relative_path().unwrap_or_default().to_string(),
        media_type,
        size_bytes: handle.size(),
        content,
        preview_content,
    }
}
