use warren_rabbitmq::Handle;
use warren_rabbitmq::lapin::options::BasicPublishOptions;
use warren_rabbitmq::lapin::{BasicProperties, Channel, Connection, ConnectionProperties};

/// A bare publishing channel that feeds the consumers under test.
pub struct TestPublisher {
    _connection: Connection,
    channel: Channel,
}

impl TestPublisher {
    pub async fn connect(handle: &Handle) -> Self {
        let properties = ConnectionProperties::default()
            .with_executor(tokio_executor_trait::Tokio::current())
            .with_reactor(tokio_reactor_trait::Tokio);
        let connection = Connection::connect(handle.dsn().unsecure(), properties)
            .await
            .unwrap();
        let channel = connection.create_channel().await.unwrap();

        Self {
            _connection: connection,
            channel,
        }
    }

    pub async fn publish(&self, exchange: &str, routing_key: &str, payload: &str) {
        self.channel
            .basic_publish(
                exchange,
                routing_key,
                BasicPublishOptions::default(),
                payload.as_bytes(),
                BasicProperties::default(),
            )
            .await
            .unwrap()
            .await
            .unwrap();
    }
}
