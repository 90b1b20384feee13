    use super::*;

    use dockerutil_config::{AutohealConfig, QueueConfig};
    use dockerutil_runtime::mock::MockRuntime;
    use dockerutil_runtime::{ContainerMetadata, EventType};
    use dockerutil_scheduler::CronScheduler;
    use dockerutil_workqueue::ExecutionQueue;

    struct Fixture {
        runtime: Arc<MockRuntime>,
        queue: Arc<ExecutionQueue>,
        reconciler: Arc<Reconciler>,
    }

    fn fixture() -> Fixture {
        let runtime = Arc::new(MockRuntime::new());
        let queue = Arc::new(ExecutionQueue::new(&QueueConfig::default()));
        let registry = Arc::new(JobRegistry::new(Arc::new(CronScheduler::new()), queue.clone()));
        let autoheal = AutohealPolicy::new(runtime.clone(), &AutohealConfig::default());
        let reconciler = Arc::new(Reconciler::new(
            runtime.clone(),
            registry,
            autoheal,
            Duration::from_millis(10),
        ));
        Fixture {
            runtime,
            queue,
            reconciler,
        }
    }

    fn with_job(id: &str, task: &str) -> ContainerMetadata {
        ContainerMetadata::new(id)
            .with_label(format!("dockerutil.cron.{}.spec", task), "0 2 * * *")
            .with_label(format!("dockerutil.cron.{}.cmd", task), "echo hi")
    }

    fn job_count(f: &Fixture, id: &str) -> usize {
        f.reconciler.registry().job_count(id)
    }

    #[tokio::test]
    async fn test_start_registers_jobs() {
        let f = fixture();
        f.runtime.add_container(
            with_job("c1", "a")
                .with_label("dockerutil.cron.b.spec", "0 3 * * *")
                .with_label("dockerutil.cron.b.cmd", "date"),
        );

        f.reconciler
            .handle_event(&LifecycleEvent::container("c1", EventAction::Start))
            .await;
        assert_eq!(job_count(&f, "c1"), 2);
    }

    #[tokio::test]
    async fn test_start_then_die_leaves_no_jobs() {
        let f = fixture();
        f.runtime.add_container(with_job("c1", "a"));

        f.reconciler
            .handle_event(&LifecycleEvent::container("c1", EventAction::Start))
            .await;
        f.reconciler
            .handle_event(&LifecycleEvent::container("c1", EventAction::Die))
            .await;
        assert_eq!(job_count(&f, "c1"), 0);
        assert!(!f.reconciler.registry().is_tracked("c1"));
    }

    #[tokio::test]
    async fn test_stop_removes_jobs() {
        let f = fixture();
        f.runtime.add_container(with_job("c1", "a"));
        f.runtime.add_container(with_job("c2", "a"));
        f.reconciler.sync_running().await.unwrap();

        f.reconciler
            .handle_event(&LifecycleEvent::container("c1", EventAction::Stop))
            .await;
        assert_eq!(job_count(&f, "c1"), 0);
        assert_eq!(job_count(&f, "c2"), 1);
    }

    #[tokio::test]
    async fn test_duplicate_start_does_not_double_register() {
        let f = fixture();
        f.runtime.add_container(with_job("c1", "a"));

        for _ in 0..2 {
            f.reconciler
                .handle_event(&LifecycleEvent::container("c1", EventAction::Start))
                .await;
        }
        assert_eq!(job_count(&f, "c1"), 1);
    }

    #[tokio::test]
    async fn test_inspect_failure_abandons_transition() {
        let f = fixture();
        f.runtime.add_container(with_job("c1", "a"));
        f.runtime.fail_inspect("c1");

        f.reconciler
            .handle_event(&LifecycleEvent::container("c1", EventAction::Start))
            .await;
        assert_eq!(job_count(&f, "c1"), 0);
        assert!(f.reconciler.register_container("c1").await.is_none());
    }

    #[tokio::test]
    async fn test_non_container_events_ignored() {
        let f = fixture();
        f.runtime.add_container(with_job("c1", "a"));

        let mut event = LifecycleEvent::container("c1", EventAction::Start);
        event.event_type = EventType::Other("network".to_string());
        f.reconciler.handle_event(&event).await;

        assert_eq!(f.runtime.inspect_count(), 0);
        assert_eq!(job_count(&f, "c1"), 0);
    }

    #[tokio::test]
    async fn test_unhealthy_restarts_opted_in_container() {
        let f = fixture();
        f.runtime
            .add_container(with_job("c1", "a").with_label("dockerutil.autoheal", "true"));
        f.runtime.add_container(ContainerMetadata::new("c2"));

        let unhealthy = EventAction::HealthStatus(HealthStatus::Unhealthy);
        f.reconciler
            .handle_event(&LifecycleEvent::container("c1", unhealthy.clone()))
            .await;
        f.reconciler
            .handle_event(&LifecycleEvent::container("c2", unhealthy))
            .await;

        let restarts = f.runtime.restart_calls();
        assert_eq!(restarts.len(), 1);
        assert_eq!(restarts[0].0, "c1");
        // Autoheal leaves registration alone.
        assert_eq!(job_count(&f, "c1"), 0);
    }

    #[tokio::test]
    async fn test_healthy_status_ignored() {
        let f = fixture();
        f.runtime
            .add_container(ContainerMetadata::new("c1").with_label("dockerutil.autoheal", "true"));

        f.reconciler
            .handle_event(&LifecycleEvent::container(
                "c1",
                EventAction::HealthStatus(HealthStatus::Healthy),
            ))
            .await;
        assert!(f.runtime.restart_calls().is_empty());
        assert_eq!(f.runtime.inspect_count(), 0);
    }

    #[tokio::test]
    async fn test_sync_untracks_stopped_containers() {
        let f = fixture();
        f.runtime.add_container(with_job("c1", "a"));
        f.runtime.add_container(with_job("c2", "a"));
        assert_eq!(f.reconciler.sync_running().await.unwrap(), 2);

        f.runtime.remove_container("c1");
        assert_eq!(f.reconciler.sync_running().await.unwrap(), 1);
        assert_eq!(f.reconciler.registry().tracked_containers(), vec!["c2"]);
        assert_eq!(job_count(&f, "c1"), 0);
    }

    #[tokio::test]
    async fn test_run_snapshot_then_events() {
        let f = fixture();
        f.runtime.add_container(with_job("c1", "a"));
        let cancel = CancellationToken::new();

        let handle = {
            let reconciler = f.reconciler.clone();
            let cancel = cancel.clone();
            tokio::spawn(async move { reconciler.run(cancel).await })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(job_count(&f, "c1"), 1);

        f.runtime.add_container(with_job("c2", "b"));
        f.runtime
            .push_event(LifecycleEvent::container("c2", EventAction::Start));
        f.runtime
            .push_event(LifecycleEvent::container("c1", EventAction::Die));
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert_eq!(job_count(&f, "c1"), 0);
        assert_eq!(job_count(&f, "c2"), 1);

        cancel.cancel();
        handle.await.unwrap().unwrap();
        assert!(f.queue.is_empty());
    }

    #[tokio::test]
    async fn test_resubscribes_and_resyncs_after_stream_error() {
        let f = fixture();
        f.runtime.add_container(with_job("c1", "a"));
        let cancel = CancellationToken::new();

        let handle = {
            let reconciler = f.reconciler.clone();
            let cancel = cancel.clone();
            tokio::spawn(async move { reconciler.run(cancel).await })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;

        // c1 stops and c2 starts while the stream is broken.
        f.runtime.remove_container("c1");
        f.runtime.add_container(with_job("c2", "b"));
        f.runtime.push_error("connection reset");
        tokio::time::sleep(Duration::from_millis(100)).await;

        assert_eq!(f.runtime.subscribe_count(), 2);
        assert_eq!(job_count(&f, "c1"), 0);
        assert_eq!(job_count(&f, "c2"), 1);

        // The new subscription is live.
        f.runtime
            .push_event(LifecycleEvent::container("c2", EventAction::Stop));
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(job_count(&f, "c2"), 0);

        cancel.cancel();
        handle.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_resubscribes_after_stream_end() {
        let f = fixture();
        let cancel = CancellationToken::new();

        let handle = {
            let reconciler = f.reconciler.clone();
            let cancel = cancel.clone();
            tokio::spawn(async move { reconciler.run(cancel).await })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;

        f.runtime.close_events();
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(f.runtime.subscribe_count(), 2);

        cancel.cancel();
        handle.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_resync_retries_until_listing_recovers() {
        let f = fixture();
        let cancel = CancellationToken::new();

        let handle = {
            let reconciler = f.reconciler.clone();
            let cancel = cancel.clone();
            tokio::spawn(async move { reconciler.run(cancel).await })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;

        f.runtime.fail_list(true);
        f.runtime.add_container(with_job("c1", "a"));
        f.runtime.push_error("engine restarting");
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(f.runtime.subscribe_count() >= 3);
        assert_eq!(job_count(&f, "c1"), 0);

        f.runtime.fail_list(false);
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(job_count(&f, "c1"), 1);

        cancel.cancel();
        handle.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_snapshot_failure_aborts_start() {
        let f = fixture();
        f.runtime.fail_list(true);
        assert!(matches!(
            f.reconciler.start().await,
            Err(DaemonError::Snapshot(_))
        ));
    }

    #[tokio::test]
    async fn test_cancel_stops_run() {
        let f = fixture();
        let cancel = CancellationToken::new();
        cancel.cancel();

        tokio::time::timeout(Duration::from_secs(1), f.reconciler.run(cancel))
            .await
            .expect("reconciler must exit promptly")
            .unwrap();
    }
