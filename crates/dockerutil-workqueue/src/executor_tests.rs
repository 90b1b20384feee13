    use super::*;
    use std::time::Duration;

    use dockerutil_config::QueueConfig;
    use tokio::sync::Mutex;

    /// Records every task; fails commands starting with `fail`.
    #[derive(Default)]
    struct RecordingHandler {
        seen: Mutex<Vec<String>>,
        delay: Option<Duration>,
    }

    #[async_trait]
    impl TaskHandler for RecordingHandler {
        async fn handle(&self, task: &CronJobTask) -> Result<(), QueueError> {
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            self.seen.lock().await.push(task.command.clone());
            if task.command.starts_with("fail") {
                return Err(QueueError::ExecutionFailed(task.command.clone()));
            }
            Ok(())
        }
    }

    fn queue() -> Arc<ExecutionQueue> {
        Arc::new(ExecutionQueue::new(&QueueConfig::default()))
    }

    #[tokio::test]
    async fn test_process_counts() {
        let handler = Arc::new(RecordingHandler::default());
        let executor = Executor::new(queue(), handler.clone());

        executor.process(CronJobTask::new("c1", "a", "echo ok", 1)).await;
        executor.process(CronJobTask::new("c1", "b", "fail now", 1)).await;

        assert_eq!(executor.tasks_completed(), 1);
        assert_eq!(executor.tasks_failed(), 1);
        assert_eq!(handler.seen.lock().await.len(), 2);
    }

    #[tokio::test]
    async fn test_run_processes_in_order() {
        let queue = queue();
        let handler = Arc::new(RecordingHandler::default());
        let executor = Arc::new(Executor::new(queue.clone(), handler.clone()));
        let cancel = CancellationToken::new();

        for n in 0..3 {
            queue
                .enqueue(CronJobTask::new("c1", "job", format!("echo {}", n), 1))
                .await
                .unwrap();
        }

        let handle = {
            let executor = executor.clone();
            let cancel = cancel.clone();
            tokio::spawn(async move { executor.run(cancel).await })
        };

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(
            *handler.seen.lock().await,
            vec!["echo 0", "echo 1", "echo 2"]
        );
        assert!(executor.is_running());

        cancel.cancel();
        handle.await.unwrap();
        assert!(!executor.is_running());
    }

    #[tokio::test]
    async fn test_serial_execution() {
        let queue = queue();
        let handler = Arc::new(RecordingHandler {
            delay: Some(Duration::from_millis(100)),
            ..Default::default()
        });
        let executor = Arc::new(Executor::new(queue.clone(), handler.clone()));
        let cancel = CancellationToken::new();

        queue.enqueue(CronJobTask::new("c1", "a", "first", 1)).await.unwrap();
        queue.enqueue(CronJobTask::new("c1", "b", "second", 1)).await.unwrap();

        let handle = {
            let executor = executor.clone();
            let cancel = cancel.clone();
            tokio::spawn(async move { executor.run(cancel).await })
        };

        // Only the first task can have finished by now.
        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(*handler.seen.lock().await, vec!["first"]);

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(*handler.seen.lock().await, vec!["first", "second"]);

        cancel.cancel();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_cancel_discards_queued_tasks() {
        let queue = queue();
        let handler = Arc::new(RecordingHandler::default());
        let executor = Executor::new(queue.clone(), handler.clone());
        let cancel = CancellationToken::new();

        queue.enqueue(CronJobTask::new("c1", "a", "echo 1", 1)).await.unwrap();
        cancel.cancel();

        tokio::time::timeout(Duration::from_secs(1), executor.run(cancel))
            .await
            .expect("executor must exit promptly");
        assert!(handler.seen.lock().await.is_empty());
        assert_eq!(queue.len(), 1);
    }
