use crate::routing::argument::field_table;
use crate::{BindingOptions, Broker, BrokerError, ConsumerError, ConsumerOptions, Exchange, Handle, Queue};
use async_trait::async_trait;
use lapin::message::Delivery;
use lapin::options::{
    BasicCancelOptions, BasicConsumeOptions, ExchangeDeclareOptions, QueueBindOptions,
    QueueDeclareOptions,
};
use lapin::{Channel, Connection as LapinConnection, ConnectionProperties, Error as LapinError};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// The AMQP reply code for a normal shutdown.
const REPLY_SUCCESS: u16 = 200;

/// A RabbitMQ connection with the single [`Channel`] that a
/// [`Consumer`](crate::Consumer) works on.
///
/// Both are opened together by [`Connection::open`] and closed together by
/// [`Broker::close`]. After closing, neither is usable, whatever the outcome.
pub struct Connection {
    tag: Arc<str>,
    identifier: Arc<str>,
    connection: LapinConnection,
    channel: Channel,
}

impl Connection {
    /// Dials the DSN of the given [`Handle`] and opens a channel on the new
    /// connection. The `tag` only labels log events and errors.
    ///
    /// The connection is driven by the current Tokio runtime, so this must be
    /// called from within one.
    pub async fn open(handle: &Handle, tag: impl AsRef<str>) -> Result<Self, ConsumerError> {
        let tag = Arc::<str>::from(tag.as_ref());
        let identifier = Arc::<str>::from(handle.identifier());

        let connection_properties = ConnectionProperties::default()
            .with_executor(tokio_executor_trait::Tokio::current())
            .with_reactor(tokio_reactor_trait::Tokio);

        let connection = LapinConnection::connect(handle.dsn().unsecure(), connection_properties)
            .await
            .map_err(|error| {
                warn!(
                    consumer = tag.as_ref(),
                    identifier = identifier.as_ref(),
                    ?error,
                    error_message = %error,
                    "Failed to establish a RabbitMQ connection",
                );

                ConsumerError::Connection {
                    tag: tag.to_string(),
                    source: error.into(),
                }
            })?;

        let channel = match connection.create_channel().await {
            Ok(channel) => channel,
            Err(error) => {
                warn!(
                    consumer = tag.as_ref(),
                    identifier = identifier.as_ref(),
                    ?error,
                    error_message = %error,
                    "Failed to create a RabbitMQ channel",
                );

                // Don't leave the fresh connection behind
                if let Err(close_error) = connection.close(REPLY_SUCCESS, "Channel not created").await {
                    debug!(
                        consumer = tag.as_ref(),
                        error = ?close_error,
                        "Failed to close the RabbitMQ connection after a channel error",
                    );
                }

                return Err(ConsumerError::Connection {
                    tag: tag.to_string(),
                    source: error.into(),
                });
            }
        };

        debug!(
            consumer = tag.as_ref(),
            identifier = identifier.as_ref(),
            "Opened a RabbitMQ connection and channel",
        );

        Ok(Self {
            tag,
            identifier,
            connection,
            channel,
        })
    }

    /// Reports the password-free identifier of the connected handle.
    pub fn identifier(&self) -> &str {
        &self.identifier
    }
}

/// Treats an action refused because the broker already closed the channel or
/// the connection as done: either way, nothing is left to close or cancel.
fn tolerate_closed(
    tag: &str,
    identifier: &str,
    action: &str,
    result: Result<(), LapinError>,
) -> Result<(), BrokerError> {
    match result {
        Ok(()) => Ok(()),
        Err(LapinError::InvalidChannelState(state)) => {
            info!(
                consumer = tag,
                identifier = identifier,
                "Skipped {} with the channel in the state '{:?}'",
                action,
                state,
            );
            Ok(())
        }
        Err(LapinError::InvalidConnectionState(state)) => {
            info!(
                consumer = tag,
                identifier = identifier,
                "Skipped {} with the connection in the state '{:?}'",
                action,
                state,
            );
            Ok(())
        }
        Err(error) => Err(error.into()),
    }
}

#[async_trait]
impl Broker for Connection {
    type Delivery = Delivery;
    type StreamError = LapinError;
    type Stream = lapin::Consumer;

    async fn declare_exchange(&self, exchange: &Exchange) -> Result<(), BrokerError> {
        let options = ExchangeDeclareOptions {
            passive: false,
            durable: exchange.durable(),
            auto_delete: exchange.auto_delete(),
            internal: exchange.internal(),
            nowait: exchange.no_wait(),
        };

        self.channel
            .exchange_declare(
                exchange.name(),
                exchange.kind().lapin_value(),
                options,
                field_table(exchange.args()),
            )
            .await?;

        Ok(())
    }

    async fn declare_queue(&self, queue: &Queue) -> Result<String, BrokerError> {
        let options = QueueDeclareOptions {
            passive: false,
            durable: queue.durable(),
            exclusive: queue.exclusive(),
            auto_delete: queue.auto_delete(),
            nowait: queue.no_wait(),
        };

        let declared = self
            .channel
            .queue_declare(queue.name(), options, field_table(queue.args()))
            .await?;

        Ok(declared.name().as_str().to_string())
    }

    async fn bind_queue(
        &self,
        queue: &str,
        exchange: &str,
        binding: &BindingOptions,
    ) -> Result<(), BrokerError> {
        let options = QueueBindOptions {
            nowait: binding.no_wait(),
        };

        self.channel
            .queue_bind(
                queue,
                exchange,
                binding.routing_key(),
                options,
                field_table(binding.args()),
            )
            .await?;

        Ok(())
    }

    async fn consume(
        &self,
        queue: &str,
        options: &ConsumerOptions,
    ) -> Result<Self::Stream, BrokerError> {
        let consume_options = BasicConsumeOptions {
            no_local: options.no_local(),
            no_ack: options.auto_ack(),
            exclusive: options.exclusive(),
            nowait: options.no_wait(),
        };

        let consumer = self
            .channel
            .basic_consume(
                queue,
                options.tag(),
                consume_options,
                field_table(options.args()),
            )
            .await?;

        Ok(consumer)
    }

    async fn cancel(&self, tag: &str) -> Result<(), BrokerError> {
        let result = self
            .channel
            .basic_cancel(tag, BasicCancelOptions::default())
            .await;

        tolerate_closed(
            &self.tag,
            &self.identifier,
            "cancelling the RabbitMQ subscription",
            result,
        )
    }

    async fn close(&self) -> Result<(), BrokerError> {
        let channel_result = self
            .channel
            .close(REPLY_SUCCESS, "Consumer shut down")
            .await;
        let channel_result = tolerate_closed(
            &self.tag,
            &self.identifier,
            "closing the RabbitMQ channel",
            channel_result,
        );

        // Attempt the connection close even if the channel close failed
        let connection_result = self
            .connection
            .close(REPLY_SUCCESS, "Consumer shut down")
            .await;
        let connection_result = tolerate_closed(
            &self.tag,
            &self.identifier,
            "closing the RabbitMQ connection",
            connection_result,
        );

        channel_result.and(connection_result)
    }
}
