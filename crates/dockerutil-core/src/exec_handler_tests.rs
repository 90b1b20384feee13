    use super::*;

    use dockerutil_config::QueueConfig;
    use dockerutil_runtime::mock::{ExecFailure, MockRuntime};
    use dockerutil_scheduler::CronScheduler;
    use dockerutil_workqueue::ExecutionQueue;

    use crate::job::JobDefinition;

    struct Fixture {
        runtime: Arc<MockRuntime>,
        registry: Arc<JobRegistry>,
        handler: ContainerExecHandler,
    }

    fn fixture() -> Fixture {
        let runtime = Arc::new(MockRuntime::new());
        let queue = Arc::new(ExecutionQueue::new(&QueueConfig::default()));
        let registry = Arc::new(JobRegistry::new(Arc::new(CronScheduler::new()), queue));
        let handler = ContainerExecHandler::new(runtime.clone(), registry.clone());
        Fixture {
            runtime,
            registry,
            handler,
        }
    }

    fn register(registry: &JobRegistry, container_id: &str) -> u64 {
        let job = JobDefinition {
            container_id: container_id.to_string(),
            task_name: "backup".to_string(),
            cron_spec: "0 2 * * *".to_string(),
            command: "tar -czf /backup.tgz /data".to_string(),
            run_immediately: false,
        };
        registry.register_container(container_id, &[job]).generation
    }

    #[tokio::test]
    async fn test_exec_splits_command() {
        let f = fixture();
        f.runtime.set_exec_output(&["archived 3 files"]);
        let generation = register(&f.registry, "c1");

        let task = CronJobTask::new("c1", "backup", "tar -czf /backup.tgz /data", generation);
        f.handler.handle(&task).await.unwrap();

        let calls = f.runtime.exec_calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "c1");
        assert_eq!(calls[0].1, vec!["tar", "-czf", "/backup.tgz", "/data"]);
        assert_eq!(f.registry.job_count("c1"), 1);
    }

    #[tokio::test]
    async fn test_non_zero_exit_keeps_jobs() {
        let f = fixture();
        f.runtime.set_exit_code(Some(2));
        let generation = register(&f.registry, "c1");

        let task = CronJobTask::new("c1", "backup", "false", generation);
        assert!(f.handler.handle(&task).await.is_ok());
        assert_eq!(f.registry.job_count("c1"), 1);
    }

    #[tokio::test]
    async fn test_create_failure_removes_jobs() {
        let f = fixture();
        let generation = register(&f.registry, "c1");
        register(&f.registry, "c2");
        f.runtime.fail_exec("c1", ExecFailure::Create);

        let task = CronJobTask::new("c1", "backup", "date", generation);
        assert!(f.handler.handle(&task).await.is_err());
        assert_eq!(f.registry.job_count("c1"), 0);
        assert_eq!(f.registry.job_count("c2"), 1);
    }

    #[tokio::test]
    async fn test_attach_failure_removes_jobs() {
        let f = fixture();
        let generation = register(&f.registry, "c1");
        f.runtime.fail_exec("c1", ExecFailure::Attach);

        let task = CronJobTask::new("c1", "backup", "date", generation);
        assert!(f.handler.handle(&task).await.is_err());
        assert_eq!(f.registry.job_count("c1"), 0);
        assert!(!f.registry.is_tracked("c1"));
    }

    #[tokio::test]
    async fn test_stale_failure_keeps_new_registration() {
        let f = fixture();
        let stale = register(&f.registry, "c1");
        register(&f.registry, "c1");
        f.runtime.fail_exec("c1", ExecFailure::Create);

        let task = CronJobTask::new("c1", "backup", "date", stale);
        assert!(f.handler.handle(&task).await.is_err());
        assert_eq!(f.registry.job_count("c1"), 1);
    }

    #[tokio::test]
    async fn test_empty_command_rejected_without_exec() {
        let f = fixture();
        let task = CronJobTask::new("c1", "noop", "  ", 1);
        assert!(f.handler.handle(&task).await.is_err());
        assert!(f.runtime.exec_calls().is_empty());
    }
