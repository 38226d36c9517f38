//! Tests for skip-aware downloads and mtime-preserving uploads

use blobsync_core::metadata::{local_mtime, set_local_mtime};
use blobsync_core::{
    create_dir_marker, download_dir, download_file, upload_dir, upload_file, Access, Error,
    ObjectUri, TransferOutcome, DIRECTORY_CONTENT_TYPE,
};
use blobsync_testing::assertions::{assert_file_content, assert_mtime};
use blobsync_testing::{jan_2021, remote_tree, test_uri, MemoryProvider, StoredObject, TestDir, TEST_BUCKET};

fn uri(s: &str) -> ObjectUri {
    ObjectUri::parse(s).unwrap()
}

#[test]
fn test_download_file_stamps_remote_mtime() {
    let provider = remote_tree();
    let test_dir = TestDir::new().unwrap();
    let local = test_dir.path().join("testx.txt");

    let outcome = download_file(&provider, &uri(&test_uri("test.txt")), &local, false).unwrap();

    assert_eq!(outcome, TransferOutcome::Transferred);
    assert_file_content(&local, b"test1").unwrap();
    assert_eq!(local_mtime(&local).unwrap(), Some(1609459200.0));
    assert_eq!(provider.download_count(), 1);
}

#[test]
fn test_second_download_is_skipped() {
    let provider = remote_tree();
    let test_dir = TestDir::new().unwrap();
    let local = test_dir.path().join("testx.txt");
    let target = uri(&test_uri("test.txt"));

    download_file(&provider, &target, &local, false).unwrap();
    let outcome = download_file(&provider, &target, &local, false).unwrap();

    assert_eq!(outcome, TransferOutcome::Skipped);
    assert_eq!(provider.download_count(), 1);
    assert_mtime(&local, jan_2021(1)).unwrap();
}

#[test]
fn test_download_creates_parent_directories() {
    let provider = remote_tree();
    let test_dir = TestDir::new().unwrap();
    let local = test_dir.path().join("a").join("b").join("c.txt");

    download_file(&provider, &uri(&test_uri("testdir/test2.txt")), &local, false).unwrap();
    assert_file_content(&local, b"test3").unwrap();
}

#[test]
fn test_stale_local_copy_is_replaced() {
    let provider = remote_tree();
    let test_dir = TestDir::new().unwrap();
    let local = test_dir
        .create_file_with_mtime("old.txt", b"outdated", 1_500_000_000)
        .unwrap();

    let outcome = download_file(&provider, &uri(&test_uri("test.txt")), &local, false).unwrap();

    assert_eq!(outcome, TransferOutcome::Transferred);
    assert_file_content(&local, b"test1").unwrap();
    assert_mtime(&local, jan_2021(1)).unwrap();
}

#[test]
fn test_force_overrides_newer_local_copy() {
    let provider = remote_tree();
    let test_dir = TestDir::new().unwrap();
    let local = test_dir
        .create_file_with_mtime("newer.txt", b"local edits", 1_700_000_000)
        .unwrap();
    let target = uri(&test_uri("test.txt"));

    assert_eq!(
        download_file(&provider, &target, &local, false).unwrap(),
        TransferOutcome::Skipped
    );
    assert_file_content(&local, b"local edits").unwrap();

    assert_eq!(
        download_file(&provider, &target, &local, true).unwrap(),
        TransferOutcome::Transferred
    );
    assert_file_content(&local, b"test1").unwrap();
    assert_mtime(&local, jan_2021(1)).unwrap();
}

#[test]
fn test_reupload_with_older_mtime_keeps_cache() {
    let provider = MemoryProvider::with_bucket(TEST_BUCKET);
    let test_dir = TestDir::new().unwrap();
    let local = test_dir.create_file("testx.txt", b"testx").unwrap();
    let target = uri(&test_uri("testx.txt"));

    upload_file(&provider, &local, &target).unwrap();
    assert_eq!(
        download_file(&provider, &target, &local, false).unwrap(),
        TransferOutcome::Skipped
    );
    let mtime = local_mtime(&local).unwrap().unwrap();

    let older = test_dir.create_file("new/testx.txt", b"testx").unwrap();
    set_local_mtime(&older, mtime - 100.0).unwrap();
    upload_file(&provider, &older, &target).unwrap();

    download_file(&provider, &target, &local, false).unwrap();
    assert_eq!(local_mtime(&local).unwrap(), Some(mtime));

    download_file(&provider, &target, &local, true).unwrap();
    assert_mtime(&local, mtime - 100.0).unwrap();
}

#[test]
fn test_object_without_metadata_uses_provider_timestamp() {
    let provider = remote_tree();
    let test_dir = TestDir::new().unwrap();
    let local = test_dir.path().join("naive.txt");
    let target = uri(&test_uri("naive.txt"));

    download_file(&provider, &target, &local, false).unwrap();
    let mtime = local_mtime(&local).unwrap().unwrap();
    assert_eq!(mtime, 1654041600.0);

    set_local_mtime(&local, mtime + 100.0).unwrap();
    assert_eq!(
        download_file(&provider, &target, &local, false).unwrap(),
        TransferOutcome::Skipped
    );
    assert_mtime(&local, mtime + 100.0).unwrap();
}

#[test]
fn test_object_without_any_timestamp_lands_at_epoch() {
    let provider = MemoryProvider::with_bucket("b");
    provider.insert(
        "b",
        "bare.bin",
        StoredObject {
            data: vec![1, 2, 3],
            ..Default::default()
        },
    );
    let test_dir = TestDir::new().unwrap();
    let local = test_dir.path().join("bare.bin");

    download_file(&provider, &uri("gs://b/bare.bin"), &local, false).unwrap();
    assert_eq!(local_mtime(&local).unwrap(), Some(0.0));
}

#[test]
fn test_download_missing_object() {
    let provider = remote_tree();
    let test_dir = TestDir::new().unwrap();
    let local = test_dir.path().join("missing.txt");

    let err = download_file(&provider, &uri(&test_uri("missing.txt")), &local, false).unwrap_err();
    assert!(matches!(err, Error::ObjectNotFound { access: Access::Read, .. }));
    assert!(err.to_string().contains("missing.txt"));
    assert!(!local.exists());
}

#[test]
fn test_download_bare_bucket_is_invalid() {
    let provider = remote_tree();
    let test_dir = TestDir::new().unwrap();

    let err = download_file(&provider, &uri(&test_uri("")), &test_dir.path().join("x"), false)
        .unwrap_err();
    assert!(matches!(err, Error::InvalidUri { .. }));
}

#[test]
fn test_download_file_refuses_directory_marker() {
    let provider = remote_tree();
    let test_dir = TestDir::new().unwrap();
    let local = test_dir.path().join("test2");

    let err = download_file(&provider, &uri(&test_uri("testdir2/test2/")), &local, false)
        .unwrap_err();
    assert!(matches!(err, Error::InvalidUri { access: Access::Read, .. }));
    assert!(!local.exists());
    assert_eq!(provider.download_count(), 0);
}

#[test]
fn test_download_dir_materializes_tree() {
    let provider = remote_tree();
    let test_dir = TestDir::new().unwrap();
    let local = test_dir.path().join("testdir2");

    let summary = download_dir(&provider, &uri(&test_uri("testdir2/")), &local, false).unwrap();

    assert_eq!(summary.transferred, 3);
    assert_eq!(summary.skipped, 0);
    assert_eq!(summary.directories, 1);
    assert_file_content(&local.join("test9.txt"), b"test9").unwrap();
    assert_file_content(&local.join("test2").join("test1.txt"), b"test4").unwrap();
    assert_file_content(&local.join("test2").join("test2.txt"), b"test5").unwrap();
    assert_mtime(&local.join("test9.txt"), jan_2021(4)).unwrap();
    assert_mtime(&local.join("test2").join("test1.txt"), jan_2021(6)).unwrap();
    assert_mtime(&local.join("test2").join("test2.txt"), jan_2021(7)).unwrap();
    assert_mtime(&local.join("test2"), jan_2021(5)).unwrap();
}

#[test]
fn test_download_dir_skips_current_files() {
    let provider = remote_tree();
    let test_dir = TestDir::new().unwrap();
    let local = test_dir.path().join("testdir");
    let target = uri(&test_uri("testdir"));

    download_dir(&provider, &target, &local, false).unwrap();
    assert_eq!(provider.download_count(), 2);

    let summary = download_dir(&provider, &target, &local, false).unwrap();
    assert_eq!(summary.skipped, 2);
    assert_eq!(summary.transferred, 0);
    assert_eq!(provider.download_count(), 2);

    let summary = download_dir(&provider, &target, &local, true).unwrap();
    assert_eq!(summary.transferred, 2);
    assert_eq!(provider.download_count(), 4);
}

#[test]
fn test_download_dir_empty_marker() {
    let provider = MemoryProvider::with_bucket("b");
    provider.put_marker("b", "out/", Some(1_600_000_000.0));
    provider.put_marker("b", "out/empty/", Some(1_600_000_100.0));
    let test_dir = TestDir::new().unwrap();
    let local = test_dir.path().join("out");

    let summary = download_dir(&provider, &uri("gs://b/out/"), &local, false).unwrap();

    assert_eq!(summary.directories, 2);
    assert!(local.join("empty").is_dir());
    assert_mtime(&local.join("empty"), 1_600_000_100.0).unwrap();
    assert_mtime(&local, 1_600_000_000.0).unwrap();
}

#[test]
fn test_upload_then_download_round_trip() {
    let provider = MemoryProvider::with_bucket(TEST_BUCKET);
    let test_dir = TestDir::new().unwrap();
    let source = test_dir
        .create_file_with_mtime("src.txt", b"payload", 1_650_000_000)
        .unwrap();
    let target = uri(&test_uri("round/trip.txt"));

    let object = upload_file(&provider, &source, &target).unwrap();
    assert_eq!(object.custom_mtime, Some(1_650_000_000.0));

    let local = test_dir.path().join("copy.txt");
    download_file(&provider, &target, &local, false).unwrap();
    assert_eq!(provider.download_count(), 1);
    assert_file_content(&local, b"payload").unwrap();
    assert_mtime(&local, 1_650_000_000.0).unwrap();

    download_file(&provider, &target, &local, false).unwrap();
    assert_eq!(provider.download_count(), 1);
}

#[test]
fn test_upload_file_rejects_bucket_and_marker_names() {
    let provider = MemoryProvider::with_bucket(TEST_BUCKET);
    let test_dir = TestDir::new().unwrap();
    let source = test_dir.create_file("src.txt", b"x").unwrap();

    let err = upload_file(&provider, &source, &uri(&test_uri(""))).unwrap_err();
    assert!(matches!(err, Error::InvalidUri { access: Access::Write, .. }));

    let err = upload_file(&provider, &source, &uri(&test_uri("dir/"))).unwrap_err();
    assert!(matches!(err, Error::InvalidUri { .. }));
    assert_eq!(provider.upload_count(), 0);
}

#[test]
fn test_upload_missing_local_file() {
    let provider = MemoryProvider::with_bucket(TEST_BUCKET);
    let test_dir = TestDir::new().unwrap();

    let err = upload_file(&provider, &test_dir.path().join("nope"), &uri(&test_uri("x"))).unwrap_err();
    assert!(matches!(err, Error::Io(_)));
}

#[test]
fn test_upload_dir_requires_a_directory() {
    let provider = MemoryProvider::with_bucket(TEST_BUCKET);
    let test_dir = TestDir::new().unwrap();
    let source = test_dir.create_file("plain.txt", b"plain").unwrap();

    let err = upload_dir(&provider, &source, &uri(&test_uri("out/"))).unwrap_err();
    assert!(matches!(err, Error::Io(_)));
    assert!(provider.names(TEST_BUCKET).is_empty());
}

#[test]
fn test_directory_upload_download_symmetry() {
    let provider = MemoryProvider::with_bucket(TEST_BUCKET);
    let source = TestDir::new().unwrap();
    source.create_file_with_mtime("a.txt", b"alpha", 1_610_000_000).unwrap();
    source.create_file_with_mtime("sub/b.txt", b"beta", 1_620_000_000).unwrap();
    source.create_dir("empty").unwrap();

    let target = uri(&test_uri("sym"));
    let summary = upload_dir(&provider, source.path(), &target).unwrap();
    assert_eq!(summary.transferred, 2);
    assert_eq!(provider.names(TEST_BUCKET), vec!["sym/a.txt", "sym/sub/b.txt"]);

    let dest = TestDir::new().unwrap();
    download_dir(&provider, &target, dest.path(), false).unwrap();
    assert_file_content(&dest.path().join("a.txt"), b"alpha").unwrap();
    assert_file_content(&dest.path().join("sub").join("b.txt"), b"beta").unwrap();
    assert_mtime(&dest.path().join("a.txt"), 1_610_000_000.0).unwrap();
    assert_mtime(&dest.path().join("sub").join("b.txt"), 1_620_000_000.0).unwrap();
}

#[test]
fn test_create_dir_marker() {
    let provider = remote_tree();
    let target = uri(&test_uri("outdir"));

    assert!(create_dir_marker(&provider, &target).unwrap());
    let marker = provider.object(TEST_BUCKET, "outdir/").unwrap();
    assert!(marker.data.is_empty());
    assert_eq!(marker.content_type.as_deref(), Some(DIRECTORY_CONTENT_TYPE));

    assert!(!create_dir_marker(&provider, &target).unwrap());
    assert!(!create_dir_marker(&provider, &uri(&test_uri("testdir/"))).unwrap());
    assert_eq!(provider.upload_count(), 1);

    let err = create_dir_marker(&provider, &uri(&test_uri(""))).unwrap_err();
    assert!(matches!(err, Error::InvalidUri { .. }));
}
