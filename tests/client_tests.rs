use bucket_store::{
    ClientError, ObjectKey, PutOptions, RequestContext, StoreClient, TransferStage,
};
use futures::TryStreamExt;
use std::{collections::BTreeSet, path::Path};

fn client() -> StoreClient {
    StoreClient::in_memory("test-bucket").unwrap()
}

fn key(value: &str) -> ObjectKey {
    ObjectKey::new(value).unwrap()
}

#[tokio::test]
async fn exists_reports_presence_without_error() {
    let client = client();
    let ctx = RequestContext::background();

    for name in ["absent.txt", "nested/absent.txt", "deep/er/absent"] {
        assert!(!client.object_exists(&ctx, &key(name)).await.unwrap());
    }

    let present = key("present/here.txt");
    client
        .put_object_bytes(&ctx, &present, "here", &PutOptions::new())
        .await
        .unwrap();
    assert!(client.object_exists(&ctx, &present).await.unwrap());
}

#[tokio::test]
async fn bytes_round_trip_including_empty_buffer() {
    let client = client();
    let ctx = RequestContext::background();

    let payloads: Vec<(&str, Vec<u8>)> = vec![
        ("empty", Vec::new()),
        ("small", b"hello world".to_vec()),
        ("binary", (0..=255u8).cycle().take(70_000).collect()),
    ];

    for (name, payload) in payloads {
        let key = key(&format!("roundtrip/{}", name));
        client
            .put_object_bytes(&ctx, &key, payload.clone(), &PutOptions::new())
            .await
            .unwrap();
        let fetched = client.get_object_bytes(&ctx, &key).await.unwrap();
        assert_eq!(fetched.as_ref(), payload.as_slice(), "payload {}", name);
    }
}

#[tokio::test]
async fn file_round_trip() {
    let client = client();
    let ctx = RequestContext::background();
    let dir = tempfile::tempdir().unwrap();

    let source = dir.path().join("source.bin");
    let content: Vec<u8> = (0..100_000u32).map(|i| (i % 251) as u8).collect();
    std::fs::write(&source, &content).unwrap();

    let key = key("files/source.bin");
    let options = PutOptions::new().with_content_type("application/x-test");
    let sent = client.put_file(&ctx, &source, &key, &options).await.unwrap();
    assert_eq!(sent, content.len() as u64);

    let target = dir.path().join("copy.bin");
    let written = client.download_object(&ctx, &key, &target).await.unwrap();
    assert_eq!(written, content.len() as u64);
    assert_eq!(std::fs::read(&target).unwrap(), content);
}

#[tokio::test]
async fn empty_file_uploads_but_download_to_file_reports_zero_bytes() {
    let client = client();
    let ctx = RequestContext::background();
    let dir = tempfile::tempdir().unwrap();

    let source = dir.path().join("empty.txt");
    std::fs::write(&source, b"").unwrap();
    let key = key("files/empty.txt");

    // Uploading an empty file is fine
    assert_eq!(
        client
            .put_file(&ctx, &source, &key, &PutOptions::new())
            .await
            .unwrap(),
        0
    );
    assert!(client.object_exists(&ctx, &key).await.unwrap());

    // Downloading it to a named file is reported as a zero-byte result
    let target = dir.path().join("empty-copy.txt");
    let err = client
        .download_object(&ctx, &key, &target)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ClientError::ZeroByteDownload {
            operation: "download_object",
            ..
        }
    ));
    assert!(!target.exists());

    // The in-memory path has no such check
    assert!(client.get_object_bytes(&ctx, &key).await.unwrap().is_empty());
}

#[tokio::test]
async fn repeated_upload_keeps_last_write() {
    let client = client();
    let ctx = RequestContext::background();
    let key = key("config/settings.json");

    client
        .put_object_bytes(&ctx, &key, r#"{"version":1}"#, &PutOptions::new())
        .await
        .unwrap();
    client
        .put_object_bytes(&ctx, &key, r#"{"version":2}"#, &PutOptions::new())
        .await
        .unwrap();
    client
        .put_object_bytes(&ctx, &key, r#"{"version":2}"#, &PutOptions::new())
        .await
        .unwrap();

    let fetched = client.get_object_bytes(&ctx, &key).await.unwrap();
    assert_eq!(fetched.as_ref(), br#"{"version":2}"#);
}

#[tokio::test]
async fn listing_returns_exactly_the_prefixed_keys() {
    let client = client();
    let ctx = RequestContext::background();

    // Deliberately out of order
    let uploaded = [
        "photos/2024/summer/beach.jpg",
        "docs/readme.md",
        "photos/2023/winter.jpg",
        "photos-archive/old.jpg",
        "photos/2024/spring.jpg",
        "root.txt",
    ];
    for name in uploaded {
        client
            .put_object_bytes(&ctx, &key(name), name.as_bytes().to_vec(), &PutOptions::new())
            .await
            .unwrap();
    }

    for prefix in ["", "photos", "photos/", "photos/2024", "photos/2024/s", "docs/", "none/"] {
        let listed: Vec<_> = client
            .list_objects(&ctx, prefix)
            .try_collect()
            .await
            .unwrap();

        for info in &listed {
            assert!(info.key.has_prefix(prefix), "{} outside {}", info.key, prefix);
            assert_eq!(info.size, info.key.as_str().len() as u64);
        }

        let listed: BTreeSet<String> = listed.into_iter().map(|i| i.key.to_string()).collect();
        let expected: BTreeSet<String> = uploaded
            .iter()
            .filter(|name| name.starts_with(prefix))
            .map(|name| name.to_string())
            .collect();
        assert_eq!(listed, expected, "prefix {:?}", prefix);
    }
}

#[tokio::test]
async fn reserved_characters_round_trip_unchanged() {
    let client = client();
    let ctx = RequestContext::background();

    let names = [
        "reports/q1#final.csv",
        "data/[1].bin",
        "pct/100%.txt",
        "odd/a~b?c*d|e^f{g}`h.txt",
        "spaces/with space & plus+.txt",
        "dots/.hidden/..twice",
    ];
    for name in names {
        client
            .put_object_bytes(&ctx, &key(name), name.as_bytes().to_vec(), &PutOptions::new())
            .await
            .unwrap();
    }

    for name in names {
        let key = key(name);
        assert!(client.object_exists(&ctx, &key).await.unwrap(), "{}", name);
        assert_eq!(
            client.get_object_bytes(&ctx, &key).await.unwrap().as_ref(),
            name.as_bytes()
        );

        // The key itself is a prefix that matches exactly one object
        let listed: Vec<_> = client.list_objects(&ctx, name).try_collect().await.unwrap();
        assert_eq!(listed.len(), 1, "prefix {:?}", name);
        assert_eq!(listed[0].key, key);

        // Keys from a listing are usable as-is
        let info = client.stat_object(&ctx, &listed[0].key).await.unwrap();
        assert_eq!(info.map(|i| i.size), Some(name.len() as u64));
    }

    let all: BTreeSet<String> = client
        .list_objects(&ctx, "")
        .map_ok(|info| info.key.to_string())
        .try_collect()
        .await
        .unwrap();
    let expected: BTreeSet<String> = names.iter().map(|n| n.to_string()).collect();
    assert_eq!(all, expected);

    // A prefix ending inside a reserved-character segment
    let partial: Vec<_> = client
        .list_objects(&ctx, "reports/q1#")
        .try_collect()
        .await
        .unwrap();
    assert_eq!(partial.len(), 1);
}

#[test]
fn keys_the_backend_cannot_represent_are_rejected() {
    for name in ["a/./b", "a/../b", "..", "line\nbreak", "tab\there", "nul\0"] {
        assert!(ObjectKey::new(name).is_err(), "{:?}", name);
    }
}

#[tokio::test]
async fn download_creates_missing_directories() {
    let client = client();
    let ctx = RequestContext::background();
    let root = tempfile::tempdir().unwrap();
    let key = key("exports/data.csv");

    client
        .put_object_bytes(&ctx, &key, "a,b\n1,2\n", &PutOptions::new())
        .await
        .unwrap();

    let nested = root.path().join("one").join("two").join("three");
    let written = client
        .download(&ctx, &key, &nested, "data.csv")
        .await
        .unwrap();
    assert_eq!(written, 8);
    assert_eq!(
        std::fs::read_to_string(nested.join("data.csv")).unwrap(),
        "a,b\n1,2\n"
    );

    // Idempotent on an existing directory
    client
        .download(&ctx, &key, &nested, "again.csv")
        .await
        .unwrap();
    assert!(nested.join("again.csv").exists());

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mode = std::fs::metadata(root.path().join("one"))
            .unwrap()
            .permissions()
            .mode();
        // umask may clear bits but never adds them
        assert_eq!(mode & 0o777 & !0o755, 0);
    }
}

#[tokio::test]
async fn tempfile_download_is_readable_immediately() {
    let temp_root = tempfile::tempdir().unwrap();
    let client = client().with_temp_dir(temp_root.path());
    let ctx = RequestContext::background();
    let key = key("blobs/item.bin");
    let content = b"temporary content".to_vec();

    client
        .put_object_bytes(&ctx, &key, content.clone(), &PutOptions::new())
        .await
        .unwrap();

    let first = client.object_to_tempfile(&ctx, &key).await.unwrap();
    let second = client.object_to_tempfile(&ctx, &key).await.unwrap();

    assert_ne!(first, second);
    for path in [&first, &second] {
        assert!(path.starts_with(temp_root.path()));
        assert!(path
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with("object-"));
        assert_eq!(std::fs::read(path).unwrap(), content);
    }
}

#[tokio::test]
async fn failed_downloads_leave_no_local_files() {
    let temp_root = tempfile::tempdir().unwrap();
    let client = client().with_temp_dir(temp_root.path());
    let ctx = RequestContext::background();
    let missing = key("missing/object.bin");

    let err = client
        .object_to_tempfile(&ctx, &missing)
        .await
        .unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(err.stage(), Some(TransferStage::StreamOpen));
    assert_eq!(std::fs::read_dir(temp_root.path()).unwrap().count(), 0);

    let target = temp_root.path().join("out.bin");
    let err = client
        .download_object(&ctx, &missing, &target)
        .await
        .unwrap_err();
    assert!(err.is_not_found());
    assert!(!target.exists());

    let err = client
        .download(&ctx, &missing, temp_root.path(), "fetched.bin")
        .await
        .unwrap_err();
    assert!(err.is_not_found());
    assert!(!temp_root.path().join("fetched.bin").exists());
}

#[tokio::test]
async fn failed_download_keeps_existing_file() {
    let client = client();
    let ctx = RequestContext::background();
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("keep.txt");
    std::fs::write(&target, b"previous").unwrap();

    let err = client
        .download_object(&ctx, &key("missing"), &target)
        .await
        .unwrap_err();
    assert_eq!(err.stage(), Some(TransferStage::StreamOpen));
    assert_eq!(std::fs::read(&target).unwrap(), b"previous");
}

#[tokio::test]
async fn put_file_reports_local_stage() {
    let client = client();
    let ctx = RequestContext::background();

    let err = client
        .put_file(
            &ctx,
            Path::new("/definitely/not/here.bin"),
            &key("x"),
            &PutOptions::new(),
        )
        .await
        .unwrap_err();

    match err {
        ClientError::LocalIo {
            operation, stage, ..
        } => {
            assert_eq!(operation, "put_file");
            assert_eq!(stage, TransferStage::Open);
        }
        other => panic!("Expected local IO error, got {:?}", other),
    }
    assert!(!client.object_exists(&ctx, &key("x")).await.unwrap());
}

#[tokio::test]
async fn concurrent_checks_and_uploads_do_not_interfere() {
    let client = client();
    let ctx = RequestContext::background();

    let uploads = (0..32).map(|i| {
        let client = client.clone();
        let ctx = ctx.clone();
        tokio::spawn(async move {
            let key = key(&format!("concurrent/{:02}", i));
            client
                .put_object_bytes(&ctx, &key, format!("payload-{}", i), &PutOptions::new())
                .await
        })
    });
    for result in futures::future::join_all(uploads).await {
        result.unwrap().unwrap();
    }

    let checks = (0..64).map(|i| {
        let client = client.clone();
        let ctx = ctx.clone();
        tokio::spawn(async move {
            let key = key(&format!("concurrent/{:02}", i));
            client.object_exists(&ctx, &key).await.map(|exists| (i, exists))
        })
    });
    for result in futures::future::join_all(checks).await {
        let (i, exists) = result.unwrap().unwrap();
        assert_eq!(exists, i < 32, "key {}", i);
    }

    for i in 0..32 {
        let key = key(&format!("concurrent/{:02}", i));
        let data = client.get_object_bytes(&ctx, &key).await.unwrap();
        assert_eq!(data.as_ref(), format!("payload-{}", i).as_bytes());
    }
}
