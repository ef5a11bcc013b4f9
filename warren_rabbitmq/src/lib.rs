#![doc = include_str!("../README.md")]
#![deny(missing_docs)]
#![cfg_attr(test, deny(warnings))]

/// Exposes an application configuration section.
mod config;
pub use self::config::{ConsumerConfig, LoadChoices, LoadError};

/// Exposes a handle for defining a set of connection credentials.
mod handle;
pub use self::handle::{DsnChunks, Handle};

/// Exposes the types that describe what a consumer declares and how it
/// subscribes.
mod routing {
    pub mod argument;
    pub mod binding;
    pub mod exchange;
    pub mod queue;
    pub mod session;
    pub mod subscription;
}

// Re-export routing types
pub use self::routing::argument::{Argument, Arguments};
pub use self::routing::binding::BindingOptions;
pub use self::routing::exchange::{
    EXCHANGE_DEFAULT, EXCHANGE_RESERVED_PREFIX, Exchange, ExchangeKind,
};
pub use self::routing::queue::Queue;
pub use self::routing::session::Session;
pub use self::routing::subscription::ConsumerOptions;

/// Exposes the error types of this crate.
mod error;
pub use self::error::{
    BrokerError, ConsumeError, ConsumerError, ShutdownError, TopologyStep,
};

/// Exposes the primitives a consumer needs from a broker connection.
mod broker;
pub use self::broker::Broker;

/// Exposes the RabbitMQ connection.
mod connection;
pub use self::connection::Connection;

mod topology;

/// Exposes the consumer itself.
mod consumer;
pub use self::consumer::deliveries::Deliveries;
pub use self::consumer::{Consumer, Phase};

mod signal;

#[cfg(test)]
mod testing;

/// Re-exports `lapin`, whose [`Delivery`](lapin::message::Delivery) is what a
/// RabbitMQ consumer's handler receives.
pub use lapin;
