//! Runs the repository conformance suite against the bundled backends.

use chainkit_storage::conformance::run_conformance_suite;
use chainkit_storage::{DirectoryRepository, InMemoryRepository};

#[tokio::test]
async fn in_memory_repository_conformance() {
    let report = run_conformance_suite(|| async { InMemoryRepository::new() }).await;
    assert_eq!(report.failed(), 0, "{report}");
    assert!(report.total() > 0);
}

#[tokio::test]
async fn directory_repository_conformance() {
    let root = tempfile::tempdir().unwrap();
    let base = root.path().to_path_buf();
    let counter = std::sync::atomic::AtomicUsize::new(0);
    let report = run_conformance_suite(|| {
        let n = counter.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        let dir = base.join(format!("repo-{n}"));
        async move { DirectoryRepository::new(dir) }
    })
    .await;
    assert_eq!(report.failed(), 0, "{report}");
}
