use crate::{AdmissionQueue, DequeueStatus, EnqueueError, Error};
use core::time::Duration;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::time::Instant;

const GENEROUS: Duration = Duration::from_secs(3600);

#[test]
fn zero_capacity_is_rejected() {
    let err = AdmissionQueue::<u32>::new(0).unwrap_err();
    assert!(matches!(err, Error::InvalidConfig { .. }));
}

#[tokio::test]
async fn full_queue_rejects_zero_timeout_immediately() {
    let queue = AdmissionQueue::new(2).unwrap();

    queue.try_enqueue(1, GENEROUS).await.unwrap();
    queue.try_enqueue(2, GENEROUS).await.unwrap();
    assert_eq!(queue.len(), 2);
    assert_eq!(queue.available_slots(), 0);

    let err = queue.try_enqueue(3, Duration::ZERO).await.unwrap_err();
    assert!(err.is_timeout());
    assert_eq!(err.into_inner(), 3);
    assert_eq!(queue.len(), 2);
}

#[tokio::test(start_paused = true)]
async fn admits_when_a_slot_frees_before_the_deadline() {
    let queue = Arc::new(AdmissionQueue::new(1).unwrap());
    queue.try_enqueue(1, GENEROUS).await.unwrap();

    let consumer = {
        let queue = Arc::clone(&queue);
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(2)).await;
            queue.dequeue().await
        })
    };

    let start = Instant::now();
    queue.try_enqueue(2, Duration::from_secs(7)).await.unwrap();
    assert!(start.elapsed() >= Duration::from_secs(2));
    assert!(start.elapsed() < Duration::from_secs(7));

    assert_eq!(consumer.await.unwrap(), Some(1));
    assert_eq!(queue.try_dequeue(), DequeueStatus::Ready { item: 2 });
}

#[tokio::test(start_paused = true)]
async fn timed_out_item_is_never_delivered() {
    let queue = AdmissionQueue::new(1).unwrap();
    queue.try_enqueue("admitted", GENEROUS).await.unwrap();

    let start = Instant::now();
    let err = queue
        .try_enqueue("abandoned", Duration::from_secs(7))
        .await
        .unwrap_err();
    assert!(err.is_timeout());
    assert!(start.elapsed() >= Duration::from_secs(7));

    queue.close();
    assert_eq!(queue.dequeue().await, Some("admitted"));
    assert_eq!(queue.dequeue().await, None);
}

#[tokio::test(start_paused = true)]
async fn enqueue_after_close_fails_fast() {
    let queue = AdmissionQueue::new(3).unwrap();
    assert!(queue.close());

    let start = Instant::now();
    let err = queue.try_enqueue(1, GENEROUS).await.unwrap_err();
    assert!(err.is_closed());
    assert_eq!(start.elapsed(), Duration::ZERO);

    assert!(matches!(queue.enqueue(2).await, Err(EnqueueError::Closed(2))));
    assert_eq!(queue.available_slots(), 0);
}

#[tokio::test(start_paused = true)]
async fn close_wakes_pending_enqueuers() {
    let queue = Arc::new(AdmissionQueue::new(1).unwrap());
    queue.try_enqueue(1, GENEROUS).await.unwrap();

    let waiting = {
        let queue = Arc::clone(&queue);
        tokio::spawn(async move { queue.try_enqueue(2, GENEROUS).await })
    };
    tokio::task::yield_now().await;

    let start = Instant::now();
    queue.close();
    let err = waiting.await.unwrap().unwrap_err();
    assert!(err.is_closed());
    assert!(start.elapsed() < GENEROUS);

    // The rejected item did not sneak in.
    assert_eq!(queue.dequeue().await, Some(1));
    assert_eq!(queue.dequeue().await, None);
}

#[tokio::test]
async fn close_keeps_queued_items_for_draining() {
    let queue = AdmissionQueue::new(3).unwrap();
    for i in 1..=3 {
        queue.try_enqueue(i, Duration::ZERO).await.unwrap();
    }

    assert!(queue.close());
    assert!(!queue.close());
    assert!(queue.is_closed());

    assert_eq!(queue.dequeue().await, Some(1));
    assert_eq!(queue.dequeue().await, Some(2));
    assert_eq!(queue.dequeue().await, Some(3));
    assert_eq!(queue.dequeue().await, None);
    assert_eq!(queue.try_dequeue(), DequeueStatus::Drained);
}

#[tokio::test]
async fn dequeue_on_closed_empty_queue_does_not_block() {
    let queue = AdmissionQueue::<u32>::new(1).unwrap();
    queue.close();
    assert_eq!(queue.dequeue().await, None);
}

#[tokio::test]
async fn close_wakes_idle_dequeuers() {
    let queue = Arc::new(AdmissionQueue::<u32>::new(1).unwrap());

    let idle: Vec<_> = (0..3)
        .map(|_| {
            let queue = Arc::clone(&queue);
            tokio::spawn(async move { queue.dequeue().await })
        })
        .collect();
    tokio::task::yield_now().await;

    queue.close();
    for handle in idle {
        assert_eq!(handle.await.unwrap(), None);
    }
}

#[tokio::test]
async fn try_dequeue_reports_empty_while_open() {
    let queue = AdmissionQueue::new(2).unwrap();
    assert_eq!(queue.try_dequeue(), DequeueStatus::<u8>::Empty);

    queue.try_enqueue(5, Duration::ZERO).await.unwrap();
    assert_eq!(queue.try_dequeue(), DequeueStatus::Ready { item: 5 });
    assert_eq!(queue.available_slots(), 2);
}

#[tokio::test]
async fn preserves_admission_order() {
    let queue = AdmissionQueue::new(8).unwrap();
    for i in 0..8 {
        queue.enqueue(i).await.unwrap();
    }
    queue.close();

    let mut drained = Vec::new();
    while let Some(i) = queue.dequeue().await {
        drained.push(i);
    }
    assert_eq!(drained, (0..8).collect::<Vec<_>>());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn never_exceeds_capacity_under_contention() {
    const CAPACITY: usize = 3;
    const PRODUCERS: usize = 16;
    const CONSUMERS: usize = 4;
    const PER_PRODUCER: usize = 250;

    let queue = Arc::new(AdmissionQueue::new(CAPACITY).unwrap());

    let consumers: Vec<_> = (0..CONSUMERS)
        .map(|_| {
            let queue = Arc::clone(&queue);
            tokio::spawn(async move {
                let mut received = Vec::new();
                while let Some(item) = queue.dequeue().await {
                    assert!(queue.len() <= CAPACITY);
                    received.push(item);
                    tokio::task::yield_now().await;
                }
                received
            })
        })
        .collect();

    let producers: Vec<_> = (0..PRODUCERS)
        .map(|p| {
            let queue = Arc::clone(&queue);
            tokio::spawn(async move {
                for i in 0..PER_PRODUCER {
                    queue.enqueue(p * PER_PRODUCER + i).await.unwrap();
                    assert!(queue.len() <= CAPACITY);
                }
            })
        })
        .collect();

    for producer in producers {
        producer.await.unwrap();
    }
    queue.close();

    let mut seen = HashSet::new();
    for consumer in consumers {
        for item in consumer.await.unwrap() {
            assert!(seen.insert(item), "item {item} delivered twice");
        }
    }

    assert_eq!(seen.len(), PRODUCERS * PER_PRODUCER);
    assert!(queue.high_water_mark() <= CAPACITY);
    assert!(queue.is_empty());
}
