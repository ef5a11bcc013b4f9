mod common;

#[cfg(test)]
mod tests {
    use crate::common::handle::{make_rabbitmq_handle, make_rabbitmq_handle_on};
    use crate::common::names::{mangle, random_token};
    use crate::common::publisher::TestPublisher;
    use parking_lot::Mutex;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;
    use std::time::Duration;
    use warren_rabbitmq::lapin::options::BasicAckOptions;
    use warren_rabbitmq::{
        BindingOptions, Consumer, ConsumerError, ConsumerOptions, Exchange, ExchangeKind, Phase,
        Queue, Session, ShutdownError,
    };
    use warren_tracing::LogContext;

    fn make_session(test_name: &str) -> Session {
        Session::new(
            Exchange::named(mangle(test_name, "exchange"))
                .with_kind(ExchangeKind::Topic)
                .with_auto_delete(true),
            Queue::named(mangle(test_name, "queue")).with_auto_delete(true),
            BindingOptions::with_routing_key("order.*"),
            ConsumerOptions::tagged(mangle(test_name, "consumer")),
        )
    }

    #[tokio::test]
    #[ignore]
    async fn consume_topic_deliveries() {
        // Given
        let session = make_session("consumer::tests::consume_topic_deliveries");
        let exchange = session.exchange().name().to_string();
        let context = LogContext::new("test_warren_rabbitmq", "test");
        let consumer = Arc::new(
            Consumer::start_in(&context, &make_rabbitmq_handle(), session)
                .await
                .unwrap(),
        );
        let publisher = TestPublisher::connect(&make_rabbitmq_handle()).await;
        let payloads = [random_token(), random_token(), random_token()];
        let received = Arc::new(Mutex::new(Vec::new()));

        let task = {
            let consumer = Arc::clone(&consumer);
            let received = Arc::clone(&received);
            tokio::spawn(async move {
                consumer
                    .consume(move |delivery| {
                        let received = Arc::clone(&received);
                        async move {
                            received
                                .lock()
                                .push(String::from_utf8_lossy(&delivery.data).into_owned());
                            delivery.ack(BasicAckOptions::default()).await.unwrap();
                        }
                    })
                    .await
            })
        };

        // When
        publisher.publish(&exchange, "order.created", &payloads[0]).await;
        publisher.publish(&exchange, "invoice.created", "unrouted").await;
        publisher.publish(&exchange, "order.paid", &payloads[1]).await;
        publisher.publish(&exchange, "order.shipped", &payloads[2]).await;
        tokio::time::timeout(Duration::from_secs(10), async {
            while received.lock().len() < 3 {
                tokio::time::sleep(Duration::from_millis(20)).await;
            }
        })
        .await
        .unwrap();
        let shutdown_result = consumer.shutdown().await;

        // Then
        assert!(shutdown_result.is_ok());
        assert!(task.await.unwrap().is_ok());
        assert_eq!(*received.lock(), payloads.to_vec());
        assert_eq!(consumer.phase(), Phase::Closed);
    }

    #[tokio::test]
    #[ignore]
    async fn shutdown_before_consume() {
        // Given
        let session = make_session("consumer::tests::shutdown_before_consume");
        let consumer = Consumer::start(&make_rabbitmq_handle(), session)
            .await
            .unwrap();

        // When
        let result = tokio::time::timeout(Duration::from_secs(10), consumer.shutdown())
            .await
            .unwrap();

        // Then
        assert!(matches!(result, Err(ShutdownError::NeverConsumed { .. })));
    }

    #[tokio::test]
    #[ignore]
    async fn server_named_queue() {
        // Given
        let session = Session::new(
            Exchange::named("amq.topic"),
            Queue::default().with_exclusive(true),
            BindingOptions::with_routing_key(mangle("consumer::tests::server_named_queue", "key")),
            ConsumerOptions::tagged(random_token()).with_auto_ack(true),
        );

        // When
        let consumer = Consumer::start(&make_rabbitmq_handle(), session)
            .await
            .unwrap();

        // Then
        assert!(consumer.queue().starts_with("amq.gen-"));
        assert!(matches!(
            consumer.shutdown().await,
            Err(ShutdownError::NeverConsumed { .. }),
        ));
    }

    #[tokio::test]
    #[ignore]
    async fn refuses_conflicting_exchange() {
        // Given
        let session = make_session("consumer::tests::refuses_conflicting_exchange");
        let conflicting = Session::new(
            session.exchange().clone().with_kind(ExchangeKind::Fanout),
            session.queue().clone(),
            session.binding().clone(),
            session.consumer().clone(),
        );
        let first = Consumer::start(&make_rabbitmq_handle(), session)
            .await
            .unwrap();

        // When
        let result = Consumer::start(&make_rabbitmq_handle(), conflicting).await;

        // Then
        assert!(matches!(result, Err(ConsumerError::Topology { .. })));
        let _ = first.shutdown().await;
    }

    #[tokio::test]
    #[ignore]
    async fn reports_unreachable_broker() {
        // Given
        let session = make_session("consumer::tests::reports_unreachable_broker");

        // When
        let result = Consumer::start(&make_rabbitmq_handle_on(1), session).await;

        // Then
        assert!(matches!(result, Err(ConsumerError::Connection { .. })));
    }
}
