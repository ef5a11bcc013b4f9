use crate::{BindingOptions, ConsumerOptions, Exchange, Queue};

/// The write-once configuration of a [`Consumer`](crate::Consumer): one
/// [`Exchange`], one [`Queue`], the [`BindingOptions`] between them, and the
/// [`ConsumerOptions`] for registering with the broker.
///
/// A session exposes no mutators: once handed to a consumer, it stays exactly
/// as it was declared.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Session {
    exchange: Exchange,
    queue: Queue,
    binding: BindingOptions,
    consumer: ConsumerOptions,
}

impl Session {
    /// Groups the given parts into a session.
    pub fn new(
        exchange: Exchange,
        queue: Queue,
        binding: BindingOptions,
        consumer: ConsumerOptions,
    ) -> Self {
        Self {
            exchange,
            queue,
            binding,
            consumer,
        }
    }

    /// Reports the [`Exchange`] of this session.
    pub fn exchange(&self) -> &Exchange {
        &self.exchange
    }

    /// Reports the [`Queue`] of this session.
    pub fn queue(&self) -> &Queue {
        &self.queue
    }

    /// Reports the [`BindingOptions`] of this session.
    pub fn binding(&self) -> &BindingOptions {
        &self.binding
    }

    /// Reports the [`ConsumerOptions`] of this session.
    pub fn consumer(&self) -> &ConsumerOptions {
        &self.consumer
    }

    /// Reports the consumer tag of this session.
    pub fn tag(&self) -> &str {
        self.consumer.tag()
    }
}
