//! In-memory [`ContainerRuntime`] for tests.
//!
//! Containers live in a map; every call is recorded. Events are pushed by the
//! test and delivered to every open subscription.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use futures::StreamExt;
use futures::stream;
use parking_lot::Mutex;
use tokio::sync::mpsc;

use crate::error::{RuntimeError, RuntimeResult};
use crate::traits::{ContainerRuntime, EventStream, ExecSession};
use crate::types::{ContainerMetadata, LifecycleEvent};

/// How exec calls against a container should fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecFailure {
    Create,
    Attach,
}

#[derive(Default)]
pub struct MockRuntime {
    running: Mutex<HashMap<String, ContainerMetadata>>,
    exec_failures: Mutex<HashMap<String, ExecFailure>>,
    broken_inspect: Mutex<HashSet<String>>,
    exec_output: Mutex<Vec<String>>,
    exit_code: Mutex<Option<i64>>,
    exec_calls: Mutex<Vec<(String, Vec<String>)>>,
    restart_calls: Mutex<Vec<(String, u64)>>,
    subscribers: Mutex<Vec<mpsc::UnboundedSender<RuntimeResult<LifecycleEvent>>>>,
    list_fails: AtomicBool,
    inspect_count: AtomicUsize,
    subscribe_count: AtomicUsize,
}

impl MockRuntime {
    pub fn new() -> Self {
        Self {
            exit_code: Mutex::new(Some(0)),
            ..Default::default()
        }
    }

    /// Mark a container as running.
    pub fn add_container(&self, metadata: ContainerMetadata) {
        self.running.lock().insert(metadata.id.clone(), metadata);
    }

    /// Mark a container as no longer running. Inspect then fails with NotFound.
    pub fn remove_container(&self, container_id: &str) {
        self.running.lock().remove(container_id);
    }

    /// Make exec against `container_id` fail.
    pub fn fail_exec(&self, container_id: &str, failure: ExecFailure) {
        self.exec_failures
            .lock()
            .insert(container_id.to_string(), failure);
    }

    /// Make inspect of `container_id` fail with an API error.
    pub fn fail_inspect(&self, container_id: &str) {
        self.broken_inspect.lock().insert(container_id.to_string());
    }

    /// Make listing running containers fail.
    pub fn fail_list(&self, fail: bool) {
        self.list_fails.store(fail, Ordering::SeqCst);
    }

    /// Lines every successful exec will produce.
    pub fn set_exec_output(&self, lines: &[&str]) {
        *self.exec_output.lock() = lines.iter().map(|l| l.to_string()).collect();
    }

    pub fn set_exit_code(&self, code: Option<i64>) {
        *self.exit_code.lock() = code;
    }

    /// Deliver an event to every open subscription.
    pub fn push_event(&self, event: LifecycleEvent) {
        self.subscribers
            .lock()
            .retain(|tx| tx.send(Ok(event.clone())).is_ok());
    }

    /// Deliver a stream error to every open subscription.
    pub fn push_error(&self, message: &str) {
        self.subscribers.lock().retain(|tx| {
            tx.send(Err(RuntimeError::EventStream(message.to_string())))
                .is_ok()
        });
    }

    /// End every open subscription.
    pub fn close_events(&self) {
        self.subscribers.lock().clear();
    }

    pub fn exec_calls(&self) -> Vec<(String, Vec<String>)> {
        self.exec_calls.lock().clone()
    }

    pub fn restart_calls(&self) -> Vec<(String, u64)> {
        self.restart_calls.lock().clone()
    }

    pub fn inspect_count(&self) -> usize {
        self.inspect_count.load(Ordering::SeqCst)
    }

    /// Number of times `events()` has been called.
    pub fn subscribe_count(&self) -> usize {
        self.subscribe_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ContainerRuntime for MockRuntime {
    async fn list_running(&self) -> RuntimeResult<Vec<String>> {
        if self.list_fails.load(Ordering::SeqCst) {
            return Err(RuntimeError::Api("list failed".to_string()));
        }
        let mut ids: Vec<String> = self.running.lock().keys().cloned().collect();
        ids.sort();
        Ok(ids)
    }

    async fn inspect(&self, container_id: &str) -> RuntimeResult<ContainerMetadata> {
        self.inspect_count.fetch_add(1, Ordering::SeqCst);
        if self.broken_inspect.lock().contains(container_id) {
            return Err(RuntimeError::Api(format!("inspect failed: {}", container_id)));
        }
        self.running
            .lock()
            .get(container_id)
            .cloned()
            .ok_or_else(|| RuntimeError::NotFound(container_id.to_string()))
    }

    async fn exec(&self, container_id: &str, argv: Vec<String>) -> RuntimeResult<ExecSession> {
        self.exec_calls
            .lock()
            .push((container_id.to_string(), argv));

        match self.exec_failures.lock().get(container_id) {
            Some(ExecFailure::Create) => {
                return Err(RuntimeError::ExecCreate {
                    container_id: container_id.to_string(),
                    message: "mock create failure".to_string(),
                });
            }
            Some(ExecFailure::Attach) => {
                return Err(RuntimeError::ExecAttach {
                    container_id: container_id.to_string(),
                    message: "mock attach failure".to_string(),
                });
            }
            None => {}
        }

        let lines: Vec<RuntimeResult<String>> =
            self.exec_output.lock().iter().cloned().map(Ok).collect();
        Ok(ExecSession {
            exec_id: format!("exec-{}", container_id),
            output: stream::iter(lines).boxed(),
        })
    }

    async fn exec_exit_code(&self, _exec_id: &str) -> RuntimeResult<Option<i64>> {
        Ok(*self.exit_code.lock())
    }

    async fn restart(&self, container_id: &str, timeout_secs: u64) -> RuntimeResult<()> {
        self.restart_calls
            .lock()
            .push((container_id.to_string(), timeout_secs));
        Ok(())
    }

    fn events(&self) -> EventStream {
        self.subscribe_count.fetch_add(1, Ordering::SeqCst);
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.lock().push(tx);
        stream::unfold(rx, |mut rx| async move { rx.recv().await.map(|item| (item, rx)) }).boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::EventAction;

    #[tokio::test]
    async fn test_inspect_running_and_missing() {
        let runtime = MockRuntime::new();
        runtime.add_container(ContainerMetadata::new("c1").with_label("a", "b"));

        let meta = runtime.inspect("c1").await.unwrap();
        assert_eq!(meta.label("a"), Some("b"));
        assert!(matches!(
            runtime.inspect("c2").await,
            Err(RuntimeError::NotFound(_))
        ));
        assert_eq!(runtime.inspect_count(), 2);
    }

    #[tokio::test]
    async fn test_exec_records_and_streams() {
        let runtime = MockRuntime::new();
        runtime.set_exec_output(&["one", "two"]);

        let session = runtime
            .exec("c1", vec!["echo".to_string(), "hi".to_string()])
            .await
            .unwrap();
        let lines: Vec<String> = session.output.map(|l| l.unwrap()).collect().await;
        assert_eq!(lines, vec!["one", "two"]);
        assert_eq!(runtime.exec_calls()[0].1, vec!["echo", "hi"]);
    }

    #[tokio::test]
    async fn test_exec_failure() {
        let runtime = MockRuntime::new();
        runtime.fail_exec("c1", ExecFailure::Attach);
        let err = runtime.exec("c1", vec!["true".to_string()]).await.unwrap_err();
        assert!(matches!(err, RuntimeError::ExecAttach { .. }));
    }

    #[tokio::test]
    async fn test_events_delivered_then_closed() {
        let runtime = MockRuntime::new();
        let mut events = runtime.events();

        runtime.push_event(LifecycleEvent::container("c1", EventAction::Start));
        let event = events.next().await.unwrap().unwrap();
        assert_eq!(event.action, EventAction::Start);

        runtime.close_events();
        assert!(events.next().await.is_none());
        assert_eq!(runtime.subscribe_count(), 1);
    }
}
