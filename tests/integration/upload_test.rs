//! Integration tests for the upload pipeline across requests.

use std::path::{Path, PathBuf};

use fileuploader_core::config::limits::ServerLimits;
use fileuploader_core::config::upload::{EditorOptions, TitlePolicy, UploadOptions};
use fileuploader_core::types::chunk::CHUNK_FIELD;
use fileuploader_core::types::editor::CropMode;
use fileuploader_core::types::file::FileRecord;
use fileuploader_core::types::request::{
    EDITOR_FIELD, HttpMethod, RawFile, RawFileInput, RequestContext,
};
use fileuploader_core::types::response::UploadResult;
use fileuploader_service::UploadService;
use fileuploader_storage::StaleChunkSweeper;

/// Upload directory plus a directory standing in for the transport's
/// temp files.
struct Workspace {
    incoming: tempfile::TempDir,
    uploads: tempfile::TempDir,
}

impl Workspace {
    fn new() -> Self {
        Self {
            incoming: tempfile::tempdir().unwrap(),
            uploads: tempfile::tempdir().unwrap(),
        }
    }

    fn options(&self) -> UploadOptions {
        UploadOptions {
            upload_dir: self.uploads.path().to_path_buf(),
            title: TitlePolicy::new("name", 12),
            ..UploadOptions::default()
        }
    }

    fn incoming(&self, name: &str, mime: &str, bytes: &[u8]) -> RawFile {
        let temp_path = self.incoming.path().join(format!("php_{}", name.replace('.', "_")));
        std::fs::write(&temp_path, bytes).unwrap();
        RawFile {
            name: name.into(),
            temp_path,
            mime_type: mime.into(),
            error: 0,
            size: bytes.len() as u64,
        }
    }
}

fn post(files: Vec<RawFile>) -> RequestContext {
    RequestContext::new(HttpMethod::Post, ServerLimits::default())
        .with_files("files", RawFileInput::List(files))
}

async fn upload(options: UploadOptions, context: RequestContext) -> (UploadResult, UploadService) {
    let mut service = UploadService::new("files", options, context);
    let result = service
        .upload()
        .await
        .into_result()
        .expect("request completes");
    (result, service)
}

fn png(path: &Path, width: u32, height: u32) -> Vec<u8> {
    image::RgbaImage::from_pixel(width, height, image::Rgba([200, 30, 30, 255]))
        .save(path)
        .unwrap();
    std::fs::read(path).unwrap()
}

fn dimensions(path: impl AsRef<Path>) -> (u32, u32) {
    image::image_dimensions(path).unwrap()
}

#[tokio::test]
async fn test_photo_upload_end_to_end() {
    let ws = Workspace::new();
    let options = UploadOptions {
        max_size: Some(5.0),
        extensions: Some(vec!["jpg".into(), "png".into()]),
        title: TitlePolicy::default(),
        replace: false,
        ..ws.options()
    };

    let raw = ws.incoming("photo.jpg", "image/jpeg", &vec![0xAB; 2 * 1024 * 1024]);
    let (result, _) = upload(options, post(vec![raw])).await;

    assert!(result.is_success);
    assert!(!result.has_warnings);
    assert_eq!(result.files.len(), 1);
    assert!(result.files[0].uploaded);
    assert!(result.files[0].name.ends_with(".jpg"));
    assert_eq!(result.files[0].size_label, "2.00 MB");
    assert!(Path::new(&result.files[0].file).is_file());
}

#[tokio::test]
async fn test_extension_checked_before_size() {
    let ws = Workspace::new();
    let options = UploadOptions {
        file_max_size: Some(0.001),
        extensions: Some(vec!["png".into()]),
        ..ws.options()
    };

    let raw = ws.incoming("big.gif", "image/gif", &[1u8; 4096]);
    let (result, _) = upload(options, post(vec![raw])).await;

    assert!(!result.is_success);
    assert_eq!(result.warnings, vec!["File type is not allowed for big.gif"]);
}

#[tokio::test]
async fn test_template_naming() {
    let ws = Workspace::new();
    let options = UploadOptions {
        title: TitlePolicy::new("{file_name}_{random}", 8),
        ..ws.options()
    };

    let raw = ws.incoming("photo.png", "image/png", b"png");
    let (result, _) = upload(options, post(vec![raw])).await;

    let name = &result.files[0].name;
    assert!(name.starts_with("photo_"));
    assert!(name.ends_with(".png"));
    assert_eq!(name.len(), "photo_".len() + 8 + ".png".len());
}

#[tokio::test]
async fn test_three_chunk_session() {
    let ws = Workspace::new();
    let slices: Vec<Vec<u8>> = (0..3u8)
        .map(|i| (0..512u32).map(|b| (b as u8).wrapping_add(i * 7)).collect())
        .collect();
    let descriptor = |first: bool, last: bool, token: Option<&str>| {
        serde_json::json!({
            "name": "archive.zip",
            "size": 1536,
            "type": "application/zip",
            "isFirst": first,
            "isLast": last,
            "temp_name": token,
        })
        .to_string()
    };

    let mut service = UploadService::new(
        "files",
        ws.options(),
        post(vec![ws.incoming("blob", "application/octet-stream", &slices[0])])
            .with_field(CHUNK_FIELD, descriptor(true, false, None)),
    );
    let first = service.upload().await;
    let token = first.chunk_token().expect("handshake").to_string();
    assert_eq!(
        serde_json::to_value(&first).unwrap(),
        serde_json::json!({"fileuploader": {"temp_name": token.as_str()}})
    );

    let mut service = UploadService::new(
        "files",
        ws.options(),
        post(vec![ws.incoming("blob", "application/octet-stream", &slices[1])])
            .with_field(CHUNK_FIELD, descriptor(false, false, Some(&token))),
    );
    assert_eq!(service.upload().await.chunk_token(), Some(token.as_str()));
    assert!(!ws.uploads.path().join("archive.zip").exists());

    let (result, _) = upload(
        ws.options(),
        post(vec![ws.incoming("blob", "application/octet-stream", &slices[2])])
            .with_field(CHUNK_FIELD, descriptor(false, true, Some(&token))),
    )
    .await;

    assert!(result.is_success);
    let file = &result.files[0];
    assert_eq!(file.name, "archive.zip");
    assert_eq!(file.mime_type, "application/zip");
    assert_eq!(file.size, 1536);
    assert_eq!(std::fs::read(&file.file).unwrap(), slices.concat());
}

#[tokio::test]
async fn test_chunk_session_larger_than_server_cap() {
    let ws = Workspace::new();
    let limits = ServerLimits {
        max_upload_size_mb: 1,
        ..ServerLimits::default()
    };
    let slices: Vec<Vec<u8>> = (0..3u8).map(|i| vec![i; 800_000]).collect();
    let request = |slice: &[u8], first: bool, last: bool, token: Option<&str>| {
        let descriptor = serde_json::json!({
            "name": "disk.img",
            "size": 2_400_000,
            "type": "application/octet-stream",
            "isFirst": first,
            "isLast": last,
            "temp_name": token,
        });
        RequestContext::new(HttpMethod::Post, limits.clone())
            .with_files(
                "files",
                RawFileInput::List(vec![ws.incoming("blob", "application/octet-stream", slice)]),
            )
            .with_field(CHUNK_FIELD, descriptor.to_string())
    };

    let mut service = UploadService::new("files", ws.options(), request(&slices[0], true, false, None));
    let token = service.upload().await.chunk_token().expect("handshake").to_string();

    let mut service = UploadService::new(
        "files",
        ws.options(),
        request(&slices[1], false, false, Some(&token)),
    );
    assert_eq!(service.upload().await.chunk_token(), Some(token.as_str()));

    let (result, _) = upload(ws.options(), request(&slices[2], false, true, Some(&token))).await;

    assert!(result.is_success, "{:?}", result.warnings);
    assert_eq!(result.files[0].size, 2_400_000);
    assert_eq!(std::fs::read(&result.files[0].file).unwrap(), slices.concat());
}

#[tokio::test]
async fn test_single_part_over_server_cap_is_rejected() {
    let ws = Workspace::new();
    let limits = ServerLimits {
        max_upload_size_mb: 1,
        ..ServerLimits::default()
    };
    let context = RequestContext::new(HttpMethod::Post, limits).with_files(
        "files",
        RawFileInput::List(vec![ws.incoming("disk.img", "application/octet-stream", &vec![0u8; 1_500_000])]),
    );

    let (result, _) = upload(ws.options(), context).await;

    assert!(!result.is_success);
    assert_eq!(
        result.warnings,
        vec!["The uploaded file exceeds the maximum upload size allowed by the server"]
    );
}

#[tokio::test]
async fn test_abandoned_chunk_is_swept() {
    let ws = Workspace::new();
    let mut service = UploadService::new(
        "files",
        ws.options(),
        post(vec![ws.incoming("blob", "application/octet-stream", &[9u8; 64])]).with_field(
            CHUNK_FIELD,
            r#"{"name":"movie.mp4","size":1024,"type":"video/mp4","isFirst":true,"isLast":false}"#,
        ),
    );
    assert!(service.upload().await.chunk_token().is_some());

    let leftovers = |dir: &Path| std::fs::read_dir(dir).unwrap().count();
    assert_eq!(leftovers(ws.uploads.path()), 1);

    let sweeper = StaleChunkSweeper::new(ws.uploads.path());
    assert_eq!(sweeper.sweep(std::time::Duration::from_secs(3600)).await.unwrap(), 0);
    assert_eq!(sweeper.sweep(std::time::Duration::ZERO).await.unwrap(), 1);
    assert_eq!(leftovers(ws.uploads.path()), 0);
}

#[tokio::test]
async fn test_list_state_across_requests() {
    let ws = Workspace::new();

    let first = post(vec![
        ws.incoming("a.png", "image/png", b"a"),
        ws.incoming("b.png", "image/png", b"b"),
    ])
    .with_field(
        "fileuploader-list-files",
        r#"[{"file":"0:/a.png"},{"file":"0:/b.png"}]"#,
    );
    let (result, service) = upload(ws.options(), first).await;
    assert_eq!(result.files.len(), 2);
    // Known files come back from the application's own storage.
    let known: Vec<FileRecord> = service
        .file_list()
        .iter()
        .cloned()
        .map(|f| FileRecord {
            uploaded: false,
            ..f
        })
        .collect();
    let path_of = |name: &str| ws.uploads.path().join(name).to_string_lossy().into_owned();

    // The client removed a.png, added c.png in front, and kept b.png.
    let list = serde_json::json!([
        {"file": "0:/c.png", "index": 0},
        {"file": path_of("b.png"), "index": 1},
    ])
    .to_string();
    let second = post(vec![ws.incoming("c.png", "image/png", b"c")])
        .with_field("fileuploader-list-files", list);
    let options = UploadOptions {
        files: known,
        ..ws.options()
    };
    let (result, mut service) = upload(options, second).await;

    assert!(result.is_success);
    assert_eq!(result.files[0].name, "c.png");

    let removed = service.removed_files("file");
    assert_eq!(removed.len(), 1);
    assert_eq!(removed[0].name, "a.png");
    assert!(Path::new(&removed[0].file).exists());

    let names: Vec<&str> = service.file_list().iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["c.png", "b.png"]);
}

#[tokio::test]
async fn test_known_files_reconciled_by_name_key() {
    let ws = Workspace::new();
    let known = |name: &str| FileRecord {
        name: name.into(),
        file: format!("u/{name}"),
        ..FileRecord::default()
    };
    let options = UploadOptions {
        files: vec![known("a.png"), known("b.png")],
        ..ws.options()
    };
    let context = RequestContext::new(HttpMethod::Post, ServerLimits::default())
        .with_field("fileuploader-list-files", r#"[{"file":"0:/b.png"}]"#);

    let (_, mut service) = upload(options, context).await;

    let removed = service.removed_files("file");
    let removed: Vec<&str> = removed.iter().map(|f| f.file.as_str()).collect();
    assert_eq!(removed, vec!["u/a.png"]);
    assert_eq!(service.file_list_attribute("file"), vec!["u/b.png"]);
}

#[tokio::test]
async fn test_known_files_sorted_by_index() {
    let ws = Workspace::new();
    let known = |name: &str, index: Option<i64>| FileRecord {
        name: name.into(),
        file: format!("u/{name}"),
        index,
        ..FileRecord::default()
    };
    let options = UploadOptions {
        files: vec![known("a", Some(2)), known("b", Some(0))],
        ..ws.options()
    };

    let context = RequestContext::new(HttpMethod::Get, ServerLimits::default());
    let (result, service) = upload(options, context).await;

    assert!(!result.has_warnings);
    let names: Vec<&str> = service.file_list().iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["b", "a"]);
}

#[tokio::test]
async fn test_uploaded_image_is_resized() {
    let ws = Workspace::new();
    let source = ws.incoming.path().join("source.png");
    let bytes = png(&source, 200, 100);
    let options = UploadOptions {
        editor: Some(EditorOptions {
            max_width: Some(50),
            max_height: Some(50),
            crop: CropMode::None,
            quality: 90,
        }),
        ..ws.options()
    };

    let raw = ws.incoming("wide.png", "image/png", &bytes);
    let (result, _) = upload(options, post(vec![raw])).await;

    let (width, height) = dimensions(&result.files[0].file);
    assert!(width <= 50 && height <= 50);
    assert_eq!(width, height * 2);
}

#[tokio::test]
async fn test_single_file_rotation() {
    let ws = Workspace::new();
    let source = ws.incoming.path().join("source.png");
    let bytes = png(&source, 40, 10);

    let context = post(vec![ws.incoming("tall.png", "image/png", &bytes)])
        .with_field(EDITOR_FIELD, r#"{"rotation":90}"#);
    let (result, _) = upload(ws.options(), context).await;

    let stored: PathBuf = result.files[0].file.clone().into();
    assert_eq!(dimensions(&stored), (10, 40));
    assert!(result.files[0].editor.is_none());
}
