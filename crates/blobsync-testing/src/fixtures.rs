//! Common remote trees for blobsync testing

use crate::memory::{MemoryProvider, StoredObject};
use chrono::{TimeZone, Utc};

/// Bucket the fixtures are created in
pub const TEST_BUCKET: &str = "test-bucket";

/// Epoch seconds of midnight UTC on the given day of January 2021
pub fn jan_2021(day: u32) -> f64 {
    Utc.with_ymd_and_hms(2021, 1, day, 0, 0, 0)
        .single()
        .map(|t| t.timestamp() as f64)
        .unwrap_or(0.0)
}

/// `gs://` URI string for a name in the test bucket
pub fn test_uri(name: &str) -> String {
    format!("gs://{TEST_BUCKET}/{name}")
}

/// Creates the standard remote tree
///
/// ```text
/// test.txt                    "test1"  2021-01-01
/// naive.txt                   "naive"  no logical mtime, updated 2022-06-01
/// testdir/test1.txt           "test2"  2021-01-02
/// testdir/test2.txt           "test3"  2021-01-03
/// testdir2/test9.txt          "test9"  2021-01-04
/// testdir2/test2/             marker   2021-01-05
/// testdir2/test2/test1.txt    "test4"  2021-01-06
/// testdir2/test2/test2.txt    "test5"  2021-01-07
/// ```
pub fn create_remote_tree(provider: &MemoryProvider) {
    provider.create_bucket(TEST_BUCKET);

    provider.put(TEST_BUCKET, "test.txt", b"test1", Some(jan_2021(1)));
    provider.insert(
        TEST_BUCKET,
        "naive.txt",
        StoredObject {
            data: b"naive".to_vec(),
            content_type: None,
            updated: Utc.with_ymd_and_hms(2022, 6, 1, 0, 0, 0).single(),
            custom_mtime: None,
        },
    );
    provider.put(TEST_BUCKET, "testdir/test1.txt", b"test2", Some(jan_2021(2)));
    provider.put(TEST_BUCKET, "testdir/test2.txt", b"test3", Some(jan_2021(3)));
    provider.put(TEST_BUCKET, "testdir2/test9.txt", b"test9", Some(jan_2021(4)));
    provider.put_marker(TEST_BUCKET, "testdir2/test2/", Some(jan_2021(5)));
    provider.put(TEST_BUCKET, "testdir2/test2/test1.txt", b"test4", Some(jan_2021(6)));
    provider.put(TEST_BUCKET, "testdir2/test2/test2.txt", b"test5", Some(jan_2021(7)));
}

/// A provider pre-populated with [`create_remote_tree`]
pub fn remote_tree() -> MemoryProvider {
    let provider = MemoryProvider::new();
    create_remote_tree(&provider);
    provider
}
