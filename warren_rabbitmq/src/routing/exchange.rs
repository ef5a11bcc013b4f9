use crate::{Argument, Arguments};
use lapin::ExchangeKind as LapinExchangeKind;
use serde::{Deserialize, Deserializer};
use std::fmt::{Display, Formatter};

/// Name of the RabbitMQ built-in default exchange.
pub const EXCHANGE_DEFAULT: &str = "";

/// Prefix of the exchange names reserved by RabbitMQ for built-in exchanges.
pub const EXCHANGE_RESERVED_PREFIX: &str = "amq.";

/// Defines a RabbitMQ exchange: the named routing entity that messages are
/// published to.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Exchange {
    name: String,
    #[serde(alias = "type")]
    kind: ExchangeKind,
    durable: bool,
    auto_delete: bool,
    internal: bool,
    #[serde(alias = "nowait")]
    no_wait: bool,
    #[serde(alias = "arguments")]
    args: Arguments,
}

impl Exchange {
    /// Creates a non-durable [`direct`](ExchangeKind::Direct) exchange with the
    /// given name. Use the `with_*` methods to adjust the remaining options.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Re-creates this exchange with the given [`ExchangeKind`].
    pub fn with_kind(self, kind: ExchangeKind) -> Self {
        Self { kind, ..self }
    }

    /// Re-creates this exchange with the given `durable` flag.
    pub fn with_durable(self, durable: bool) -> Self {
        Self { durable, ..self }
    }

    /// Re-creates this exchange with the given `auto_delete` flag.
    pub fn with_auto_delete(self, auto_delete: bool) -> Self {
        Self {
            auto_delete,
            ..self
        }
    }

    /// Re-creates this exchange with the given `internal` flag.
    pub fn with_internal(self, internal: bool) -> Self {
        Self { internal, ..self }
    }

    /// Re-creates this exchange with the given `no_wait` flag.
    pub fn with_no_wait(self, no_wait: bool) -> Self {
        Self { no_wait, ..self }
    }

    /// Re-creates this exchange with an extra declaration argument.
    pub fn with_arg(mut self, key: impl Into<String>, value: impl Into<Argument>) -> Self {
        self.args.insert(key.into(), value.into());

        self
    }
}

impl Exchange {
    /// Reports the exchange name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Reports the exchange kind.
    pub fn kind(&self) -> &ExchangeKind {
        &self.kind
    }

    /// Reports whether the exchange survives a broker restart.
    pub fn durable(&self) -> bool {
        self.durable
    }

    /// Reports whether the exchange is deleted once its last binding is gone.
    pub fn auto_delete(&self) -> bool {
        self.auto_delete
    }

    /// Reports whether the exchange rejects direct publishing (only accepts
    /// messages from other exchanges).
    pub fn internal(&self) -> bool {
        self.internal
    }

    /// Reports whether the declaration is sent without awaiting confirmation.
    pub fn no_wait(&self) -> bool {
        self.no_wait
    }

    /// Exposes the declaration arguments.
    pub fn args(&self) -> &Arguments {
        &self.args
    }

    /// Reports whether this is the RabbitMQ built-in default exchange, which
    /// can neither be declared nor bound to.
    pub fn is_default(&self) -> bool {
        self.name == EXCHANGE_DEFAULT
    }

    /// Reports whether this exchange is built into RabbitMQ (the default
    /// exchange or any `amq.*` exchange). Built-in exchanges always exist and
    /// are never declared.
    pub fn is_builtin(&self) -> bool {
        self.is_default() || self.name.starts_with(EXCHANGE_RESERVED_PREFIX)
    }
}

impl Display for Exchange {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)
    }
}

/// Represents the kinds of RabbitMQ exchanges.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub enum ExchangeKind {
    /// A **direct** exchange delivers messages to queues based on the message
    /// routing key.
    #[default]
    Direct,

    /// A **fanout** exchange routes messages to all the queues that are bound
    /// to it, and the routing key is ignored.
    Fanout,

    /// **Topic** exchanges route messages to one or many queues based on
    /// matching between a message routing key and the pattern that was used to
    /// bind a queue to an exchange.
    Topic,

    /// A **headers** exchange routes on message headers instead of the routing
    /// key.
    Headers,

    /// Any exchange type provided by a broker plugin (e.g.,
    /// `x-consistent-hash`).
    Custom(String),
}

impl ExchangeKind {
    /// Parses an exchange kind from its case-insensitive RabbitMQ name.
    /// Unrecognized names are taken as [custom](ExchangeKind::Custom) kinds,
    /// verbatim.
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "direct" => Self::Direct,
            "fanout" | "fan" => Self::Fanout,
            "topic" => Self::Topic,
            "headers" | "header" => Self::Headers,
            _ => Self::Custom(name.trim().to_string()),
        }
    }

    /// Returns the [`lapin::ExchangeKind`] value corresponding to this exchange
    /// kind.
    pub fn lapin_value(&self) -> LapinExchangeKind {
        match self {
            Self::Direct => LapinExchangeKind::Direct,
            Self::Fanout => LapinExchangeKind::Fanout,
            Self::Topic => LapinExchangeKind::Topic,
            Self::Headers => LapinExchangeKind::Headers,
            Self::Custom(name) => LapinExchangeKind::Custom(name.clone()),
        }
    }
}

impl Display for ExchangeKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Direct => "direct",
            Self::Fanout => "fanout",
            Self::Topic => "topic",
            Self::Headers => "headers",
            Self::Custom(name) => name,
        })
    }
}

impl<'de> Deserialize<'de> for ExchangeKind {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let name = String::deserialize(deserializer)?;

        Ok(Self::from_name(&name))
    }
}
