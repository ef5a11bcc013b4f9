use std::fmt::{Display, Formatter};
use std::time::Duration;
use thiserror::Error;

/// The error reported by a [`Broker`](crate::Broker) primitive, boxed so that
/// the original error stays reachable as the `source` of the typed errors
/// below.
pub type BrokerError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Reports why a [`Consumer`](crate::Consumer) could not be constructed.
///
/// Whenever construction fails after the connection was opened, the connection
/// is closed before this error is returned.
#[derive(Error, Debug)]
pub enum ConsumerError {
    /// The connection (or its channel) could not be opened.
    #[error("consumer '{tag}' failed to connect to RabbitMQ: {source}")]
    Connection {
        /// The consumer tag.
        tag: String,
        /// The broker error.
        #[source]
        source: BrokerError,
    },

    /// One of the declaration steps failed; the later steps were not issued.
    #[error("consumer '{tag}' failed to declare the {step}: {source}")]
    Topology {
        /// The consumer tag.
        tag: String,
        /// The declaration step that failed.
        step: TopologyStep,
        /// The broker error.
        #[source]
        source: BrokerError,
    },

    /// The topology was declared, but the broker refused the consumer
    /// registration.
    #[error("consumer '{tag}' failed to start consuming from queue '{queue}': {source}")]
    ConsumeStart {
        /// The consumer tag.
        tag: String,
        /// The (server-assigned) queue name.
        queue: String,
        /// The broker error.
        #[source]
        source: BrokerError,
    },
}

/// Names a step of the topology declaration.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TopologyStep {
    /// The exchange declaration.
    Exchange,
    /// The queue declaration.
    Queue,
    /// The queue-to-exchange binding.
    Binding,
}

impl Display for TopologyStep {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Exchange => "exchange",
            Self::Queue => "queue",
            Self::Binding => "binding",
        })
    }
}

/// Reports why the deliveries of a [`Consumer`](crate::Consumer) cannot be
/// handed out.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConsumeError {
    /// The deliveries were already handed out (by a previous call to
    /// [`consume`](crate::Consumer::consume) or
    /// [`deliveries`](crate::Consumer::deliveries)).
    #[error("deliveries of consumer '{tag}' were already taken")]
    AlreadyTaken {
        /// The consumer tag.
        tag: String,
    },

    /// The consumer is shutting down or already shut down.
    #[error("consumer '{tag}' is shutting down")]
    ShuttingDown {
        /// The consumer tag.
        tag: String,
    },
}

/// Reports the first problem encountered while shutting down a
/// [`Consumer`](crate::Consumer). Shutdown always runs to the end (the
/// connection is closed regardless), so this error describes the outcome, not
/// an abandoned attempt.
#[derive(Error, Debug)]
pub enum ShutdownError {
    /// The broker-side subscription could not be cancelled.
    #[error("consumer '{tag}' failed to cancel its subscription: {source}")]
    Cancel {
        /// The consumer tag.
        tag: String,
        /// The broker error.
        #[source]
        source: BrokerError,
    },

    /// The in-flight deliveries were not drained within the deadline.
    #[error("consumer '{tag}' did not drain its deliveries within {}", humantime::format_duration(*.timeout))]
    TimedOut {
        /// The consumer tag.
        tag: String,
        /// The deadline that elapsed.
        timeout: Duration,
    },

    /// The channel or the connection could not be closed cleanly.
    #[error("consumer '{tag}' failed to close its connection: {source}")]
    Close {
        /// The consumer tag.
        tag: String,
        /// The broker error.
        #[source]
        source: BrokerError,
    },

    /// The consumer was shut down cleanly, but its deliveries were never
    /// consumed.
    #[error("consumer '{tag}' was shut down before consuming")]
    NeverConsumed {
        /// The consumer tag.
        tag: String,
    },

    /// Shutdown was already requested earlier; nothing was done.
    #[error("consumer '{tag}' is already shut down")]
    AlreadyShutDown {
        /// The consumer tag.
        tag: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::error::Error as _;

    #[test]
    fn topology_error_keeps_source() {
        // Given
        let source: BrokerError = "NOT_FOUND - no queue 'orders.q'".into();

        // When
        let error = ConsumerError::Topology {
            tag: "orders-consumer".to_string(),
            step: TopologyStep::Binding,
            source,
        };

        // Then
        assert_eq!(
            error.to_string(),
            "consumer 'orders-consumer' failed to declare the binding: NOT_FOUND - no queue 'orders.q'",
        );
        assert_eq!(
            error.source().map(ToString::to_string).as_deref(),
            Some("NOT_FOUND - no queue 'orders.q'"),
        );
    }

    #[test]
    fn timed_out_reports_deadline() {
        let error = ShutdownError::TimedOut {
            tag: "t1".to_string(),
            timeout: Duration::from_millis(1500),
        };

        assert_eq!(
            error.to_string(),
            "consumer 't1' did not drain its deliveries within 1s 500ms",
        );
    }
}
