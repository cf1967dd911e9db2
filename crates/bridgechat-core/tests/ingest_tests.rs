use base64::{engine::general_purpose, Engine as _};
use bridgechat_core::ingest::{ingest_batch, is_hidden, select_directory, select_files};
use bridgechat_core::{FileHandle, FileKind, LocalFile, MemoryFile};
use std::collections::HashSet;
use tempfile::TempDir;

/// A handle whose read always fails, like a file deleted after selection.
struct BrokenFile {
    name: String,
}

#[async_trait::async_trait]
impl FileHandle for BrokenFile {
    fn name(&self) -> &str {
        &self.name
    }

    fn relative_path(&self) -> Option<&str> {
        None
    }

    fn media_type(&self) -> Option<&str> {
        Some("application/pdf")
    }

    fn size(&self) -> u64 {
        10
    }

    async fn read(&self) -> std::io::Result<Vec<u8>> {
        Err(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "denied",
        ))
    }
}

fn memory(name: &str, bytes: &[u8]) -> Box<dyn FileHandle> {
    Box::new(MemoryFile::new(name, bytes.to_vec()))
}

// ========================================================================
// Batch ingestion
// ========================================================================

#[tokio::test]
async fn test_record_content_is_data_uri() {
    let handles = vec![
        Box::new(MemoryFile::new("hello.txt", b"hello".to_vec()).with_media_type("text/plain"))
            as Box<dyn FileHandle>,
    ];
    let records = ingest_batch(&handles).await;

    assert_eq!(records.len(), 1);
    let record = &records[0];
    assert_eq!(record.name, "hello.txt");
    assert_eq!(record.media_type, "text/plain");
    assert_eq!(record.size_bytes, 5);
    assert_eq!(record.content, "data:text/plain;base64,aGVsbG8=");
    assert_eq!(record.payload(), "aGVsbG8=");
    assert!(record.relative_path.is_empty());
    assert!(record.preview_content.is_none());
    assert!(!record.id.is_empty());
}

#[tokio::test]
async fn test_missing_media_type_falls_back_to_octet_stream() {
    let records = ingest_batch(&[memory("blob", &[0, 1, 2])]).await;
    assert_eq!(records[0].media_type, "application/octet-stream");
    assert_eq!(records[0].kind(), FileKind::Other);
}

#[tokio::test]
async fn test_images_carry_a_preview() {
    let handles = vec![
        Box::new(MemoryFile::new("slide.png", vec![137, 80, 78, 71]).with_media_type("image/png"))
            as Box<dyn FileHandle>,
    ];
    let records = ingest_batch(&handles).await;
    assert_eq!(records[0].preview_content.as_deref(), Some(records[0].content.as_str()));
    assert!(records[0].is_image());
}

#[tokio::test]
async fn test_hidden_files_never_appear_wherever_they_are() {
    let handles = vec![
        memory(".DS_Store", b"x"),
        memory("a.txt", b"a"),
        memory(".hidden.pdf", b"x"),
        memory("b.txt", b"b"),
        memory(".gitkeep", b""),
    ];
    let records = ingest_batch(&handles).await;

    let names: Vec<&str> = records.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["a.txt", "b.txt"]);
    assert!(records.iter().all(|r| !is_hidden(&r.name)));
}

#[tokio::test]
async fn test_unreadable_file_does_not_sink_the_batch() {
    let handles: Vec<Box<dyn FileHandle>> = vec![
        memory("one.txt", b"1"),
        Box::new(BrokenFile {
            name: "locked.pdf".into(),
        }),
        memory(".DS_Store", b"x"),
        memory("two.txt", b"2"),
    ];
    let records = ingest_batch(&handles).await;

    // 4 inputs - 1 hidden - 1 unreadable
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].name, "one.txt");
    assert_eq!(records[1].name, "two.txt");
}

#[tokio::test]
async fn test_ids_are_unique_within_a_batch() {
    let handles: Vec<Box<dyn FileHandle>> =
        (0..20).map(|i| memory(&format!("f{i}.txt"), b"same")).collect();
    let records = ingest_batch(&handles).await;
    let ids: HashSet<&str> = records.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids.len(), 20);
}

#[tokio::test]
async fn test_empty_batch() {
    assert!(ingest_batch(&[]).await.is_empty());
}

// ========================================================================
// Local files and folder selection
// ========================================================================

#[tokio::test]
async fn test_select_files_reads_from_disk() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("Syllabus.PDF");
    std::fs::write(&path, b"%PDF-1.4").unwrap();

    let handles = select_files([path.clone()]);
    assert_eq!(handles.len(), 1);
    assert_eq!(handles[0].name(), "Syllabus.PDF");
    assert_eq!(handles[0].media_type(), Some("application/pdf"));
    assert_eq!(handles[0].size(), 8);
    assert!(handles[0].relative_path().is_none());

    let records = ingest_batch(&handles).await;
    assert_eq!(records[0].kind(), FileKind::Pdf);
    assert_eq!(
        records[0].payload(),
        general_purpose::STANDARD.encode(b"%PDF-1.4")
    );
}

#[tokio::test]
async fn test_missing_local_file_is_dropped() {
    let dir = TempDir::new().unwrap();
    let present = dir.path().join("present.txt");
    std::fs::write(&present, "here").unwrap();

    let handles = select_files([dir.path().join("gone.txt"), present]);
    let records = ingest_batch(&handles).await;
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].name, "present.txt");
}

#[tokio::test]
async fn test_select_directory_reports_relative_paths() {
    let dir = TempDir::new().unwrap();
    let root = dir.path().join("course");
    std::fs::create_dir_all(root.join("week1")).unwrap();
    std::fs::write(root.join("intro.md"), "# Intro").unwrap();
    std::fs::write(root.join("week1").join("notes.txt"), "notes").unwrap();
    std::fs::write(root.join(".DS_Store"), "junk").unwrap();

    let handles = select_directory(&root).unwrap();
    let mut paths: Vec<&str> = handles
        .iter()
        .filter_map(|h| h.relative_path())
        .collect();
    paths.sort();
    assert_eq!(
        paths,
        vec!["course/.DS_Store", "course/intro.md", "course/week1/notes.txt"]
    );

    let records = ingest_batch(&handles).await;
    assert_eq!(records.len(), 2);
    let notes = records.iter().find(|r| r.name == "notes.txt").unwrap();
    assert_eq!(notes.relative_path, "course/week1/notes.txt");
    assert_eq!(notes.display_path(), "course/week1/notes.txt");
    assert_eq!(notes.media_type, "text/plain");
}

#[test]
fn test_select_directory_rejects_plain_file() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("a.txt");
    std::fs::write(&file, "a").unwrap();
    assert!(select_directory(&file).is_err());
}

#[test]
fn test_local_file_with_relative_path() {
    let file = LocalFile::new("/tmp/does-not-matter.txt").with_relative_path("docs/does-not-matter.txt");
    assert_eq!(file.name(), "does-not-matter.txt");
    assert_eq!(file.relative_path(), Some("docs/does-not-matter.txt"));
}
