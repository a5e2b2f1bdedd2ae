use uplyfile_storage::{
    api::{MockUplyClient, UplyApi},
    image::UplyImage,
    mapper::FileUrlMapper,
    storage::{BlobStorage, UplyStorage},
};

fn storage_with(api: MockUplyClient, dir: &tempfile::TempDir) -> UplyStorage {
    let mapper = FileUrlMapper::load(dir.path().join("uplyfile.json"));
    UplyStorage::new(Box::new(api), mapper)
}

#[tokio::test]
async fn test_save_then_transform_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let api = MockUplyClient::new();
    let storage = storage_with(api, &dir);

    storage.save("pic.jpg", b"jpeg bytes").await.unwrap();
    let hosted_url = storage.url("pic.jpg").unwrap();

    // The hosted URL parses straight into the transformation builder.
    let transformed = UplyImage::parse(&hosted_url)
        .unwrap()
        .avatar(None)
        .blur(None)
        .progressive()
        .url();

    assert!(transformed.ends_with("/avatar,blur,progressive/pic.jpg"));
    assert!(transformed.starts_with("https://uplycdn.com/MockPrj/"));
}

#[tokio::test]
async fn test_duplicate_content_is_uploaded_once() {
    let dir = tempfile::tempdir().unwrap();
    let api = MockUplyClient::new();
    let probe = api.clone();
    let storage = storage_with(api, &dir);

    storage.save("sans.webp", b"same bytes").await.unwrap();
    storage
        .save("definitely_not_sans.webp", b"same bytes")
        .await
        .unwrap();

    assert_eq!(probe.get_upload_count(), 1);
    assert_eq!(
        storage.url("sans.webp").unwrap(),
        storage.url("definitely_not_sans.webp").unwrap()
    );
}

#[tokio::test]
async fn test_mappings_survive_storage_teardown() {
    let dir = tempfile::tempdir().unwrap();
    let mappings_path = dir.path().join("uplyfile.json");

    {
        let storage = UplyStorage::new(
            Box::new(MockUplyClient::new()),
            FileUrlMapper::load(&mappings_path),
        );
        storage.save("kept.jpg", b"content").await.unwrap();
        // No explicit persist: dropping the storage flushes the mapper.
    }

    let reopened = UplyStorage::new(
        Box::new(MockUplyClient::new()),
        FileUrlMapper::load(&mappings_path),
    );
    assert!(reopened.url("kept.jpg").is_ok());
}

#[tokio::test]
async fn test_uploaded_file_appears_in_listing() {
    let api = MockUplyClient::new();

    let url = api.upload("dog.webp", b"dog").await.unwrap();
    let files = api.list_project_files().await.unwrap();

    assert_eq!(files.len(), 1);
    assert_eq!(files[0].url.full, url);
    assert_eq!(files[0].original_name, "dog.webp");
    assert!(api.file_exists(&url).await.unwrap());
}

#[test]
fn test_transformation_url_grammar_examples() {
    // Wire-level grammar: scheme://host/<id1>/<id2>/[ops/]<stem><ext>
    let base = UplyImage::parse("https://cdn.example/P1/F1/pic.jpg").unwrap();
    assert_eq!(base.url(), "https://cdn.example/P1/F1/pic.jpg");

    let chained = UplyImage::parse("https://cdn.example/P1/F1/pic.jpg")
        .unwrap()
        .avatar(None)
        .blur(None)
        .progressive()
        .format(None)
        .url();
    assert_eq!(chained, "https://cdn.example/P1/F1/avatar,blur,progressive/pic.jpg");

    let reformatted = UplyImage::parse("https://cdn.example/P1/F1/pic.jpg")
        .unwrap()
        .format(Some("png"))
        .url();
    assert_eq!(reformatted, "https://cdn.example/P1/F1/pic.png");

    let reparsed = UplyImage::parse("https://cdn.example/P1/F1/avatar,blur/pic.jpg").unwrap();
    assert_eq!(reparsed.base_url(), "https://cdn.example/P1/F1/");
    assert!(reparsed.operations().is_empty());
}
