//! Tests for the file-backed wait queue

use std::path::PathBuf;

use cluster_parking_lot::core::{Resources, SchedulerError, WaitEntry, WaitQueue};
use cluster_parking_lot::infra::FileWaitQueue;
use cluster_parking_lot::util::Priority;

fn temp_dir() -> PathBuf {
    std::env::temp_dir().join(format!("cpl-queue-{}", uuid::Uuid::new_v4()))
}

fn entry(id: u64) -> WaitEntry {
    WaitEntry {
        deployment_id: id,
        footprint: Resources::new(id, 1, 0),
    }
}

fn ids(entries: &[WaitEntry]) -> Vec<u64> {
    entries.iter().map(|e| e.deployment_id).collect()
}

#[tokio::test]
async fn test_file_queue_orders_by_priority_then_fifo() {
    let dir = temp_dir();
    let q = FileWaitQueue::new(&dir, "order").unwrap();
    q.enqueue(1, entry(1), Priority::Low).await.unwrap();
    q.enqueue(1, entry(2), Priority::High).await.unwrap();
    q.enqueue(1, entry(3), Priority::Low).await.unwrap();
    q.enqueue(1, entry(4), Priority::High).await.unwrap();

    assert_eq!(q.peek_highest(1).await.unwrap(), Some(entry(2)));
    assert_eq!(ids(&q.entries(1).await.unwrap()), vec![2, 4, 1, 3]);
    assert_eq!(q.peek_highest(2).await.unwrap(), None);
    let _ = std::fs::remove_dir_all(dir);
}

#[tokio::test]
async fn test_file_queue_survives_reopen() {
    let dir = temp_dir();
    {
        let q = FileWaitQueue::new(&dir, "durable").unwrap();
        q.enqueue(1, entry(10), Priority::Normal).await.unwrap();
        q.enqueue(1, entry(11), Priority::Normal).await.unwrap();
        q.enqueue(2, entry(20), Priority::Low).await.unwrap();
        q.enqueue(1, entry(12), Priority::High).await.unwrap();
        assert!(q.remove(1, 11).await.unwrap());
        assert!(q.file_path().exists());
    }

    let q = FileWaitQueue::new(&dir, "durable").unwrap();
    assert_eq!(ids(&q.entries(1).await.unwrap()), vec![12, 10]);
    assert_eq!(ids(&q.entries(2).await.unwrap()), vec![20]);

    // Fresh sequence numbers continue after the loaded ones.
    q.enqueue(1, entry(13), Priority::Normal).await.unwrap();
    assert_eq!(ids(&q.entries(1).await.unwrap()), vec![12, 10, 13]);
    let _ = std::fs::remove_dir_all(dir);
}

#[tokio::test]
async fn test_file_queue_rejects_duplicates() {
    let dir = temp_dir();
    let q = FileWaitQueue::new(&dir, "dupes").unwrap();
    q.enqueue(1, entry(1), Priority::Low).await.unwrap();
    let err = q.enqueue(1, entry(1), Priority::High).await.unwrap_err();
    assert!(matches!(err, SchedulerError::DuplicateEntry(1)));
    assert_eq!(q.entries(1).await.unwrap().len(), 1);

    assert!(!q.remove(1, 99).await.unwrap());
    let _ = std::fs::remove_dir_all(dir);
}

#[test]
fn test_file_queue_reports_corrupt_file() {
    let dir = temp_dir();
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("broken.jsonl"), "{not json}\n").unwrap();
    assert!(matches!(
        FileWaitQueue::new(&dir, "broken"),
        Err(SchedulerError::Backend(_))
    ));
    let _ = std::fs::remove_dir_all(dir);
}

#[tokio::test]
async fn test_file_queue_drops_torn_final_line() {
    let dir = temp_dir();
    let path = {
        let q = FileWaitQueue::new(&dir, "torn").unwrap();
        q.enqueue(1, entry(1), Priority::Low).await.unwrap();
        q.enqueue(1, entry(2), Priority::High).await.unwrap();
        q.file_path()
    };
    // Simulate an append interrupted mid-write.
    let mut contents = std::fs::read_to_string(&path).unwrap();
    contents.push_str(r#"{"cluster_id":1,"priority":2,"se"#);
    std::fs::write(&path, contents).unwrap();

    let q = FileWaitQueue::new(&dir, "torn").unwrap();
    assert_eq!(ids(&q.entries(1).await.unwrap()), vec![2, 1]);

    // The repaired file accepts further appends and reloads cleanly.
    q.enqueue(1, entry(3), Priority::High).await.unwrap();
    drop(q);
    let q = FileWaitQueue::new(&dir, "torn").unwrap();
    assert_eq!(ids(&q.entries(1).await.unwrap()), vec![2, 3, 1]);
    let _ = std::fs::remove_dir_all(dir);
}

#[tokio::test]
async fn test_file_queue_remove_leaves_no_temp_file() {
    let dir = temp_dir();
    let q = FileWaitQueue::new(&dir, "swap").unwrap();
    q.enqueue(1, entry(1), Priority::Low).await.unwrap();
    q.enqueue(1, entry(2), Priority::Low).await.unwrap();
    assert!(q.remove(1, 1).await.unwrap());

    let names: Vec<String> = std::fs::read_dir(&dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec!["swap.jsonl".to_string()]);

    let reopened = FileWaitQueue::new(&dir, "swap").unwrap();
    assert_eq!(ids(&reopened.entries(1).await.unwrap()), vec![2]);
    let _ = std::fs::remove_dir_all(dir);
}
