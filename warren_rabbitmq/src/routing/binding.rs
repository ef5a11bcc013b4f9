use crate::{Argument, Arguments};
use serde::Deserialize;

/// Defines the rule that links a [`Queue`](crate::Queue) to an
/// [`Exchange`](crate::Exchange).
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct BindingOptions {
    #[serde(alias = "binding_key", alias = "key")]
    routing_key: String,
    #[serde(alias = "nowait")]
    no_wait: bool,
    #[serde(alias = "arguments")]
    args: Arguments,
}

impl BindingOptions {
    /// Creates a binding with the given routing key.
    pub fn with_routing_key(routing_key: impl Into<String>) -> Self {
        Self {
            routing_key: routing_key.into(),
            ..Self::default()
        }
    }

    /// Re-creates this binding with the given `no_wait` flag.
    pub fn with_no_wait(self, no_wait: bool) -> Self {
        Self { no_wait, ..self }
    }

    /// Re-creates this binding with an extra argument (e.g., `x-match` for a
    /// headers exchange).
    pub fn with_arg(mut self, key: impl Into<String>, value: impl Into<Argument>) -> Self {
        self.args.insert(key.into(), value.into());

        self
    }
}

impl BindingOptions {
    /// Reports the routing key (the binding pattern, for topic exchanges).
    pub fn routing_key(&self) -> &str {
        &self.routing_key
    }

    /// Reports whether the binding is sent without awaiting confirmation.
    pub fn no_wait(&self) -> bool {
        self.no_wait
    }

    /// Exposes the binding arguments.
    pub fn args(&self) -> &Arguments {
        &self.args
    }
}
