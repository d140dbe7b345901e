use crate::common::FlakyBackend;
use mailrelay::queue::{self, QUEUE_NAME};
use mailrelay::{DeliveryPipeline, MessageDto, QueueError, StatelessFailover, StickyFailover};

fn dto(i: usize) -> MessageDto {
    MessageDto {
        subject: format!("Test Email {i}"),
        body: format!("This is a test email {i}"),
        to: vec!["email@example.com".to_string()],
        from_email: "from@example.com".to_string(),
    }
}

#[tokio::test]
async fn undelivered_messages_are_still_acknowledged() {
    let (producer, consumer) = queue::channel(2);
    let failover =
        StatelessFailover::new(vec![DeliveryPipeline::from_shared(FlakyBackend::failing_first("vendor", 2))])
            .unwrap();
    let worker = tokio::spawn(consumer.run(failover));

    let batch: Vec<_> = (0..5).map(dto).collect();
    producer.publish(&batch).await.unwrap();
    drop(producer);

    let report = worker.await.unwrap();
    assert_eq!(report.received, 5);
    assert_eq!(report.undelivered, 2);
    assert_eq!(report.delivered, 3);
    assert_eq!(report.acked(), 5);
    assert!(report.unacked.is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn exhausted_sweeps_leave_the_message_unacked() {
    let (producer, consumer) = queue::channel(8);
    let failover =
        StickyFailover::new(vec![DeliveryPipeline::from_shared(FlakyBackend::failing_first("vendor", 2))])
            .unwrap()
            .with_max_sweeps(1);

    producer.publish(&[dto(0), dto(1)]).await.unwrap();
    drop(producer);

    let report = consumer.run(failover).await;
    assert_eq!(report.received, 2);
    assert_eq!(report.delivered, 1);
    assert_eq!(report.unacked.len(), 1);
    assert_eq!(report.unacked[0].tag, 1);
}

#[tokio::test]
async fn malformed_body_is_not_acknowledged() {
    let (producer, consumer) = queue::channel(4);
    let failover =
        StatelessFailover::new(vec![DeliveryPipeline::from_shared(FlakyBackend::healthy("vendor"))])
            .unwrap();

    producer
        .publish_raw(serde_json::to_string(&dto(0)).unwrap())
        .await
        .unwrap();
    producer
        .publish_raw(r#"{"subject":"missing fields"}"#.to_string())
        .await
        .unwrap();
    drop(producer);

    let report = consumer.run(failover).await;
    assert_eq!(report.delivered, 1);
    assert_eq!(report.unacked.len(), 1);
    assert_eq!(report.unacked[0].tag, 2);
}

#[tokio::test]
async fn publishing_to_a_closed_queue_fails() {
    let (producer, consumer) = queue::channel(1);
    drop(consumer);

    let err = producer.publish(&[dto(0)]).await.unwrap_err();
    assert!(matches!(err, QueueError::Closed(QUEUE_NAME)));
    assert_eq!(err.to_string(), "queue 'emails' is closed");
}
