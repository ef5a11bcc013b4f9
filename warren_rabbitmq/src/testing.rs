use crate::{BindingOptions, Broker, BrokerError, ConsumerOptions, Exchange, Queue};
use async_trait::async_trait;
use futures::channel::mpsc::{UnboundedReceiver, UnboundedSender, unbounded};
use parking_lot::Mutex;
use std::io::Error as IoError;
use std::sync::Arc;

/// An in-memory [`Broker`] whose deliveries are plain numbers. Clones share
/// the same state, so a test keeps one clone to feed and inspect the broker
/// while the consumer owns another.
#[derive(Clone, Default)]
pub(crate) struct MemoryBroker {
    inner: Arc<Inner>,
}

#[derive(Default)]
struct Inner {
    calls: Mutex<Vec<String>>,
    failing: Mutex<Vec<&'static str>>,
    stall_cancel: Mutex<bool>,
    feeder: Mutex<Option<UnboundedSender<Result<u32, IoError>>>>,
    stream: Mutex<Option<UnboundedReceiver<Result<u32, IoError>>>>,
}

impl MemoryBroker {
    pub(crate) fn new() -> Self {
        let (feeder, stream) = unbounded();
        let broker = Self::default();

        *broker.inner.feeder.lock() = Some(feeder);
        *broker.inner.stream.lock() = Some(stream);

        broker
    }

    /// Makes the given primitive (`"declare_exchange"`, `"cancel"`, ...) fail.
    pub(crate) fn failing(self, primitive: &'static str) -> Self {
        self.inner.failing.lock().push(primitive);

        self
    }

    /// Makes `cancel` succeed without ending the stream.
    pub(crate) fn stalling_cancel(self) -> Self {
        *self.inner.stall_cancel.lock() = true;

        self
    }

    pub(crate) fn push(&self, delivery: u32) {
        self.push_item(Ok(delivery));
    }

    pub(crate) fn push_error(&self, message: &str) {
        self.push_item(Err(IoError::other(message.to_string())));
    }

    fn push_item(&self, item: Result<u32, IoError>) {
        if let Some(feeder) = self.inner.feeder.lock().as_ref() {
            let _ = feeder.unbounded_send(item);
        }
    }

    /// Ends the stream, as the broker does when the subscription goes away.
    pub(crate) fn end_stream(&self) {
        self.inner.feeder.lock().take();
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.inner.calls.lock().clone()
    }

    pub(crate) fn count(&self, primitive: &str) -> usize {
        self.inner
            .calls
            .lock()
            .iter()
            .filter(|call| call.split(' ').next() == Some(primitive))
            .count()
    }

    fn record(&self, primitive: &'static str, call: String) -> Result<(), BrokerError> {
        self.inner.calls.lock().push(call);

        if self.inner.failing.lock().contains(&primitive) {
            return Err(format!("injected failure in {}", primitive).into());
        }

        Ok(())
    }
}

#[async_trait]
impl Broker for MemoryBroker {
    type Delivery = u32;
    type StreamError = IoError;
    type Stream = UnboundedReceiver<Result<u32, IoError>>;

    async fn declare_exchange(&self, exchange: &Exchange) -> Result<(), BrokerError> {
        self.record(
            "declare_exchange",
            format!("declare_exchange {} {}", exchange.name(), exchange.kind()),
        )
    }

    async fn declare_queue(&self, queue: &Queue) -> Result<String, BrokerError> {
        let name = match queue.name() {
            "" => "amq.gen-1".to_string(),
            name => name.to_string(),
        };
        self.record("declare_queue", format!("declare_queue {}", name))?;

        Ok(name)
    }

    async fn bind_queue(
        &self,
        queue: &str,
        exchange: &str,
        binding: &BindingOptions,
    ) -> Result<(), BrokerError> {
        self.record(
            "bind_queue",
            format!("bind_queue {} {} {}", queue, exchange, binding.routing_key()),
        )
    }

    async fn consume(
        &self,
        queue: &str,
        options: &ConsumerOptions,
    ) -> Result<Self::Stream, BrokerError> {
        self.record("consume", format!("consume {} {}", queue, options.tag()))?;

        self.inner
            .stream
            .lock()
            .take()
            .ok_or_else(|| "stream already consumed".into())
    }

    async fn cancel(&self, tag: &str) -> Result<(), BrokerError> {
        self.record("cancel", format!("cancel {}", tag))?;

        if !*self.inner.stall_cancel.lock() {
            self.end_stream();
        }

        Ok(())
    }

    async fn close(&self) -> Result<(), BrokerError> {
        // The stream ends with the channel, even if closing reports an error
        self.end_stream();

        self.record("close", "close".to_string())
    }
}
