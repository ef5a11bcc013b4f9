use crate::{BindingOptions, BrokerError, ConsumerOptions, Exchange, Queue};
use async_trait::async_trait;
use futures::Stream;

/// The primitives a [`Consumer`](crate::Consumer) needs from a broker
/// connection.
///
/// [`Connection`](crate::Connection) is the RabbitMQ implementation. All
/// methods take `&self`: the consumer shares its broker between the task that
/// consumes and the task that shuts down.
#[async_trait]
pub trait Broker: Send + Sync + 'static {
    /// The message type handed to the consumer's handler.
    type Delivery: Send + 'static;

    /// The error type of a failed delivery in the stream.
    type StreamError: std::error::Error + Send + Sync + 'static;

    /// The stream of deliveries produced by [`consume`](Broker::consume). It
    /// ends once the subscription is cancelled or the channel is closed.
    type Stream: Stream<Item = Result<Self::Delivery, Self::StreamError>> + Send + Unpin + 'static;

    /// Declares the given exchange.
    async fn declare_exchange(&self, exchange: &Exchange) -> Result<(), BrokerError>;

    /// Declares the given queue and returns its name, as assigned by the
    /// server.
    async fn declare_queue(&self, queue: &Queue) -> Result<String, BrokerError>;

    /// Binds the named queue to the named exchange.
    async fn bind_queue(
        &self,
        queue: &str,
        exchange: &str,
        binding: &BindingOptions,
    ) -> Result<(), BrokerError>;

    /// Registers a consumer on the named queue and returns its deliveries.
    async fn consume(
        &self,
        queue: &str,
        options: &ConsumerOptions,
    ) -> Result<Self::Stream, BrokerError>;

    /// Cancels the subscription with the given consumer tag. The channel stays
    /// open.
    async fn cancel(&self, tag: &str) -> Result<(), BrokerError>;

    /// Closes the channel, then the connection.
    async fn close(&self) -> Result<(), BrokerError>;
}
