use crate::{Argument, Arguments};
use serde::Deserialize;
use std::fmt::{Display, Formatter};

/// Defines a RabbitMQ queue: the buffer holding messages awaiting consumption.
///
/// An empty name asks the broker to generate a unique one on declaration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Queue {
    name: String,
    durable: bool,
    auto_delete: bool,
    exclusive: bool,
    #[serde(alias = "nowait")]
    no_wait: bool,
    #[serde(alias = "arguments")]
    args: Arguments,
}

impl Queue {
    /// Creates a non-durable, non-exclusive queue with the given name. Use the
    /// `with_*` methods to adjust the remaining options.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Re-creates this queue with the given `durable` flag.
    pub fn with_durable(self, durable: bool) -> Self {
        Self { durable, ..self }
    }

    /// Re-creates this queue with the given `auto_delete` flag.
    pub fn with_auto_delete(self, auto_delete: bool) -> Self {
        Self {
            auto_delete,
            ..self
        }
    }

    /// Re-creates this queue with the given `exclusive` flag.
    pub fn with_exclusive(self, exclusive: bool) -> Self {
        Self { exclusive, ..self }
    }

    /// Re-creates this queue with the given `no_wait` flag.
    pub fn with_no_wait(self, no_wait: bool) -> Self {
        Self { no_wait, ..self }
    }

    /// Re-creates this queue with an extra declaration argument (e.g.,
    /// `x-queue-type`).
    pub fn with_arg(mut self, key: impl Into<String>, value: impl Into<Argument>) -> Self {
        self.args.insert(key.into(), value.into());

        self
    }
}

impl Queue {
    /// Reports the queue name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Reports whether the queue survives a broker restart.
    pub fn durable(&self) -> bool {
        self.durable
    }

    /// Reports whether the queue is deleted once its last consumer is gone.
    pub fn auto_delete(&self) -> bool {
        self.auto_delete
    }

    /// Reports whether the queue is private to the declaring connection.
    pub fn exclusive(&self) -> bool {
        self.exclusive
    }

    /// Reports whether the declaration is sent without awaiting confirmation.
    pub fn no_wait(&self) -> bool {
        self.no_wait
    }

    /// Exposes the declaration arguments.
    pub fn args(&self) -> &Arguments {
        &self.args
    }
}

impl Display for Queue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn deserialize_full() {
        // Given
        let input = r#"
name: orders.q
durable: true
exclusive: true
nowait: true
arguments:
  x-queue-type: quorum
"#;
        let expected_output = Queue::named("orders.q")
            .with_durable(true)
            .with_exclusive(true)
            .with_no_wait(true)
            .with_arg("x-queue-type", "quorum");

        // When
        let actual_output = serde_yml::from_str::<Queue>(input).unwrap();

        // Then
        assert_eq!(expected_output, actual_output);
    }
}
