use crate::{Broker, ConsumerError, Session, TopologyStep};
use tracing::{debug, warn};

/// Declares the routing topology of a [`Session`] on a [`Broker`] and
/// registers the consumer, in a fixed order:
///
/// 1. Declare the exchange.
/// 2. Declare the queue.
/// 3. Bind the queue (by its server-assigned name) to the exchange.
/// 4. Start consuming from the queue.
///
/// The first failing step aborts the rest, and its error is returned as the
/// `source` of a [`ConsumerError`]. Nothing is rolled back: declarations are
/// idempotent at the broker.
///
/// Built-in exchanges (the default exchange and the `amq.*` ones) already
/// exist and are not declared. Binding to the default exchange is implicit
/// and is skipped.
pub(crate) struct Topology<'a> {
    session: &'a Session,
}

impl<'a> Topology<'a> {
    pub(crate) fn new(session: &'a Session) -> Self {
        Self { session }
    }

    /// Runs the declaration steps. Returns the server-assigned queue name and
    /// the delivery stream.
    pub(crate) async fn declare<B>(&self, broker: &B) -> Result<(String, B::Stream), ConsumerError>
    where
        B: Broker,
    {
        let tag = self.session.tag();
        let exchange = self.session.exchange();

        if exchange.is_builtin() {
            debug!(
                consumer = tag,
                exchange = exchange.name(),
                "Skipped declaring a built-in RabbitMQ exchange",
            );
        } else {
            broker
                .declare_exchange(exchange)
                .await
                .map_err(|source| self.fail(TopologyStep::Exchange, source))?;
        }

        let queue = broker
            .declare_queue(self.session.queue())
            .await
            .map_err(|source| self.fail(TopologyStep::Queue, source))?;

        if !exchange.is_default() {
            broker
                .bind_queue(&queue, exchange.name(), self.session.binding())
                .await
                .map_err(|source| self.fail(TopologyStep::Binding, source))?;
        }

        let stream = match broker.consume(&queue, self.session.consumer()).await {
            Ok(stream) => stream,
            Err(source) => {
                warn!(
                    consumer = tag,
                    queue = queue.as_str(),
                    error = ?source,
                    error_message = %source,
                    "Failed to start consuming from a RabbitMQ queue",
                );

                return Err(ConsumerError::ConsumeStart {
                    tag: tag.to_string(),
                    queue,
                    source,
                });
            }
        };

        debug!(
            consumer = tag,
            exchange = exchange.name(),
            queue = queue.as_str(),
            routing_key = self.session.binding().routing_key(),
            "Declared the RabbitMQ topology",
        );

        Ok((queue, stream))
    }

    fn fail(&self, step: TopologyStep, source: crate::BrokerError) -> ConsumerError {
        warn!(
            consumer = self.session.tag(),
            %step,
            error = ?source,
            error_message = %source,
            "Failed to declare the RabbitMQ topology",
        );

        ConsumerError::Topology {
            tag: self.session.tag().to_string(),
            step,
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MemoryBroker;
    use crate::{BindingOptions, ConsumerOptions, Exchange, ExchangeKind, Queue};
    use pretty_assertions::assert_eq;

    fn session(exchange: Exchange, queue: Queue) -> Session {
        Session::new(
            exchange,
            queue,
            BindingOptions::with_routing_key("order.*"),
            ConsumerOptions::tagged("orders-consumer"),
        )
    }

    #[tokio::test]
    async fn declares_in_order() {
        // Given
        let broker = MemoryBroker::new();
        let session = session(
            Exchange::named("orders").with_kind(ExchangeKind::Topic),
            Queue::named("orders.q"),
        );

        // When
        let (queue, _stream) = Topology::new(&session).declare(&broker).await.unwrap();

        // Then
        assert_eq!(queue, "orders.q");
        assert_eq!(
            broker.calls(),
            vec![
                "declare_exchange orders topic",
                "declare_queue orders.q",
                "bind_queue orders.q orders order.*",
                "consume orders.q orders-consumer",
            ],
        );
    }

    #[tokio::test]
    async fn binds_server_named_queue() {
        // Given
        let broker = MemoryBroker::new();
        let session = session(Exchange::named("amq.topic"), Queue::default());

        // When
        let (queue, _stream) = Topology::new(&session).declare(&broker).await.unwrap();

        // Then
        assert_eq!(queue, "amq.gen-1");
        assert_eq!(
            broker.calls(),
            vec![
                "declare_queue amq.gen-1",
                "bind_queue amq.gen-1 amq.topic order.*",
                "consume amq.gen-1 orders-consumer",
            ],
        );
    }

    #[tokio::test]
    async fn default_exchange_is_neither_declared_nor_bound() {
        // Given
        let broker = MemoryBroker::new();
        let session = session(Exchange::default(), Queue::named("orders.q"));

        // When
        let result = Topology::new(&session).declare(&broker).await;

        // Then
        assert!(result.is_ok());
        assert_eq!(
            broker.calls(),
            vec!["declare_queue orders.q", "consume orders.q orders-consumer"],
        );
    }

    #[tokio::test]
    async fn first_failure_aborts_the_rest() {
        for (primitive, expected_step, expected_calls) in [
            ("declare_exchange", TopologyStep::Exchange, 1),
            ("declare_queue", TopologyStep::Queue, 2),
            ("bind_queue", TopologyStep::Binding, 3),
        ] {
            // Given
            let broker = MemoryBroker::new().failing(primitive);
            let session = session(Exchange::named("orders"), Queue::named("orders.q"));

            // When
            let result = Topology::new(&session).declare(&broker).await;

            // Then
            match result {
                Err(ConsumerError::Topology { tag, step, source }) => {
                    assert_eq!(tag, "orders-consumer");
                    assert_eq!(step, expected_step);
                    assert_eq!(source.to_string(), format!("injected failure in {}", primitive));
                }
                other => panic!("unexpected outcome: {:?}", other.map(|(queue, _)| queue)),
            }
            assert_eq!(broker.calls().len(), expected_calls);
            assert_eq!(broker.count("consume"), 0);
        }
    }

    #[tokio::test]
    async fn refused_registration_names_the_queue() {
        // Given
        let broker = MemoryBroker::new().failing("consume");
        let session = session(Exchange::named("orders"), Queue::named("orders.q"));

        // When
        let result = Topology::new(&session).declare(&broker).await;

        // Then
        assert!(matches!(
            result,
            Err(ConsumerError::ConsumeStart { ref queue, .. }) if queue == "orders.q",
        ));
    }
}
