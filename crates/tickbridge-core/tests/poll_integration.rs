//! End-to-end poll cycles against a mocked TickTick server.
//!
//! Drives the engine through several cycles and verifies the emitted
//! event stream, snapshot lifecycle, and failure handling.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use chrono::{Duration, SecondsFormat, Utc};
use mockito::{Mock, ServerGuard};

use tickbridge_core::events::{BufferSink, EventSink, TaskEvent};
use tickbridge_core::ticktick::model::Snapshot;
use tickbridge_core::{PollEngine, PollOptions, TickTickClient};

fn rfc3339(offset_minutes: i64) -> String {
    (Utc::now() + Duration::minutes(offset_minutes)).to_rfc3339_opts(SecondsFormat::Secs, true)
}

async fn mock_projects(server: &mut ServerGuard) -> Mock {
    server
        .mock("GET", "/project")
        .with_status(200)
        .with_body(r#"[{"id": "p1", "name": "Inbox"}]"#)
        .create_async()
        .await
}

async fn mock_tasks(server: &mut ServerGuard, tasks_json: String) -> Mock {
    server
        .mock("GET", "/project/p1/data")
        .with_status(200)
        .with_body(format!(
            r#"{{"project": {{"id": "p1", "name": "Inbox"}}, "tasks": {}}}"#,
            tasks_json
        ))
        .create_async()
        .await
}

#[tokio::test]
async fn poll_cycles_produce_the_expected_event_stream() {
    let mut server = mockito::Server::new_async().await;
    let sink = Arc::new(BufferSink::new());
    let client = TickTickClient::new("token").with_base_url(server.url());
    let mut engine = PollEngine::new(client, PollOptions::new(300, 30), sink.clone());

    // Cycle 1: startup. One task due in 10 minutes; backlog must not
    // be reported as created.
    let p = mock_projects(&mut server).await;
    let d = mock_tasks(
        &mut server,
        format!(
            r#"[{{"id": "a", "projectId": "p1", "title": "Pay rent", "dueDate": "{}"}},
                {{"id": "keep", "projectId": "p1", "title": "Old backlog item"}}]"#,
            rfc3339(10)
        ),
    )
    .await;

    engine.poll_once().await.unwrap();
    let events = sink.drain();
    assert_eq!(events.len(), 1);
    match &events[0] {
        TaskEvent::TaskDueSoon {
            task_id,
            minutes_until_due,
            ..
        } => {
            assert_eq!(task_id, "a");
            assert!((9..=10).contains(minutes_until_due));
        }
        other => panic!("unexpected event: {:?}", other),
    }

    // Cycle 2: task "a" was completed remotely, task "b" is new.
    p.remove_async().await;
    d.remove_async().await;
    let completed_at = rfc3339(-1);
    let p = mock_projects(&mut server).await;
    let d = mock_tasks(
        &mut server,
        format!(
            r#"[{{"id": "a", "projectId": "p1", "title": "Pay rent", "status": 2,
                  "completedTime": "{}"}},
                {{"id": "keep", "projectId": "p1", "title": "Old backlog item"}},
                {{"id": "b", "projectId": "p1", "title": "Call plumber", "priority": 3}}]"#,
            completed_at
        ),
    )
    .await;

    engine.poll_once().await.unwrap();
    let events = sink.drain();
    assert_eq!(events.len(), 2);
    match &events[0] {
        TaskEvent::TaskCreated {
            task_id, priority, ..
        } => {
            assert_eq!(task_id, "b");
            assert_eq!(priority.as_str(), "medium");
        }
        other => panic!("expected created first, got {:?}", other),
    }
    match &events[1] {
        TaskEvent::TaskCompleted { task_id, .. } => assert_eq!(task_id, "a"),
        other => panic!("expected completed second, got {:?}", other),
    }

    // Cycle 3: outage. Previous snapshot must survive bit-for-bit.
    p.remove_async().await;
    d.remove_async().await;
    let fail = server
        .mock("GET", "/project")
        .with_status(503)
        .create_async()
        .await;

    let before = engine.snapshot().unwrap().clone();
    assert!(engine.poll_once().await.is_err());
    assert_eq!(engine.snapshot().unwrap(), &before);
    assert!(sink.drain().is_empty());

    // Cycle 4: recovery with identical remote state. No change events;
    // the snapshot is still re-adopted.
    fail.remove_async().await;
    let _p = mock_projects(&mut server).await;
    let _d = mock_tasks(
        &mut server,
        format!(
            r#"[{{"id": "a", "projectId": "p1", "title": "Pay rent", "status": 2,
                  "completedTime": "{}"}},
                {{"id": "keep", "projectId": "p1", "title": "Old backlog item"}},
                {{"id": "b", "projectId": "p1", "title": "Call plumber", "priority": 3}}]"#,
            completed_at
        ),
    )
    .await;

    let emitted = engine.poll_once().await.unwrap();
    assert_eq!(emitted, 0);
    let status = engine.status();
    assert!(status.available);
    assert_eq!(status.consecutive_failures, 0);
}

/// Sink that counts snapshot adoptions.
#[derive(Default)]
struct CountingSink {
    replaced: AtomicUsize,
}

impl EventSink for CountingSink {
    fn emit(&self, _event: &TaskEvent) {}

    fn snapshot_replaced(&self, _snapshot: &Snapshot) {
        self.replaced.fetch_add(1, Ordering::SeqCst);
    }
}

#[tokio::test]
async fn refresh_request_triggers_out_of_cycle_poll() {
    let mut server = mockito::Server::new_async().await;
    let _p = mock_projects(&mut server).await;
    let _d = mock_tasks(&mut server, "[]".to_string()).await;

    let sink = Arc::new(CountingSink::default());
    let client = TickTickClient::new("token").with_base_url(server.url());
    let mut engine = PollEngine::new(client, PollOptions::new(3600, 30), sink.clone());
    let refresh = engine.refresh_handle();

    let loop_task = tokio::spawn(async move { engine.run().await });

    // the interval's first tick polls immediately
    wait_for_replacements(&sink, 1).await;
    refresh.request();
    wait_for_replacements(&sink, 2).await;

    loop_task.abort();
}

async fn wait_for_replacements(sink: &CountingSink, target: usize) {
    tokio::time::timeout(std::time::Duration::from_secs(5), async {
        while sink.replaced.load(Ordering::SeqCst) < target {
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap_or_else(|_| {
        panic!(
            "expected {} snapshot adoptions, saw {}",
            target,
            sink.replaced.load(Ordering::SeqCst)
        )
    });
}
