    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    fn config(capacity: usize, backpressure: BackpressurePolicy) -> QueueConfig {
        QueueConfig {
            capacity,
            backpressure,
        }
    }

    fn task(n: usize) -> CronJobTask {
        CronJobTask::new("c1", "job", format!("echo {}", n), 1)
    }

    #[tokio::test]
    async fn test_fifo_order() {
        let queue = ExecutionQueue::new(&config(10, BackpressurePolicy::Block));
        for n in 0..3 {
            queue.enqueue(task(n)).await.unwrap();
        }
        assert_eq!(queue.len(), 3);

        for n in 0..3 {
            assert_eq!(queue.dequeue().await.unwrap().command, format!("echo {}", n));
        }
        assert!(queue.is_empty());
    }

    #[tokio::test]
    async fn test_duplicates_are_kept() {
        let queue = ExecutionQueue::new(&config(10, BackpressurePolicy::Block));
        queue.enqueue(task(1)).await.unwrap();
        queue.enqueue(task(1)).await.unwrap();
        assert_eq!(queue.len(), 2);
    }

    #[tokio::test]
    async fn test_capacity_blocks_until_dequeue() {
        let queue = Arc::new(ExecutionQueue::new(&config(2, BackpressurePolicy::Block)));

        // K enqueues complete without a consumer.
        for n in 0..2 {
            tokio::time::timeout(Duration::from_millis(100), queue.enqueue(task(n)))
                .await
                .expect("enqueue within capacity must not block")
                .unwrap();
        }

        let producer = {
            let queue = queue.clone();
            tokio::spawn(async move { queue.enqueue(task(2)).await })
        };

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!producer.is_finished());

        assert_eq!(queue.dequeue().await.unwrap().command, "echo 0");
        tokio::time::timeout(Duration::from_millis(500), producer)
            .await
            .expect("producer must resume after a dequeue")
            .unwrap()
            .unwrap();
        assert_eq!(queue.len(), 2);
    }

    #[tokio::test]
    async fn test_drop_newest_counts_drops() {
        let queue = ExecutionQueue::new(&config(1, BackpressurePolicy::DropNewest));
        queue.enqueue(task(0)).await.unwrap();

        assert!(matches!(queue.enqueue(task(1)).await, Err(QueueError::QueueFull)));
        assert!(matches!(queue.enqueue(task(2)).await, Err(QueueError::QueueFull)));
        assert_eq!(queue.dropped(), 2);

        // The oldest task survives.
        assert_eq!(queue.dequeue().await.unwrap().command, "echo 0");
        assert!(queue.try_dequeue().await.is_none());
    }

    #[tokio::test]
    async fn test_zero_capacity_raised_to_one() {
        let queue = ExecutionQueue::new(&config(0, BackpressurePolicy::Block));
        assert_eq!(queue.capacity(), 1);
        assert_eq!(queue.policy(), BackpressurePolicy::Block);
    }
