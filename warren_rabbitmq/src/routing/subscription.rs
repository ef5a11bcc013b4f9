use crate::{Argument, Arguments};
use serde::Deserialize;

/// Governs how a [`Consumer`](crate::Consumer) registers itself with the
/// broker.
///
/// The `tag` identifies the registration: it names the consumer in the logs
/// and is the handle by which the subscription is later cancelled.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ConsumerOptions {
    #[serde(alias = "consumer_tag")]
    tag: String,
    #[serde(alias = "no_ack")]
    auto_ack: bool,
    exclusive: bool,
    no_local: bool,
    #[serde(alias = "nowait")]
    no_wait: bool,
    #[serde(alias = "arguments")]
    args: Arguments,
}

impl ConsumerOptions {
    /// Creates consumer options with the given tag and manual acknowledgement.
    pub fn tagged(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Self::default()
        }
    }

    /// Re-creates these options with the given `auto_ack` flag. With
    /// `auto_ack`, the broker considers every message acknowledged as soon as
    /// it is delivered.
    pub fn with_auto_ack(self, auto_ack: bool) -> Self {
        Self { auto_ack, ..self }
    }

    /// Re-creates these options with the given `exclusive` flag.
    pub fn with_exclusive(self, exclusive: bool) -> Self {
        Self { exclusive, ..self }
    }

    /// Re-creates these options with the given `no_local` flag.
    pub fn with_no_local(self, no_local: bool) -> Self {
        Self { no_local, ..self }
    }

    /// Re-creates these options with the given `no_wait` flag.
    pub fn with_no_wait(self, no_wait: bool) -> Self {
        Self { no_wait, ..self }
    }

    /// Re-creates these options with an extra argument (e.g., `x-priority`).
    pub fn with_arg(mut self, key: impl Into<String>, value: impl Into<Argument>) -> Self {
        self.args.insert(key.into(), value.into());

        self
    }
}

impl ConsumerOptions {
    /// Reports the consumer tag.
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Reports whether deliveries are acknowledged automatically.
    pub fn auto_ack(&self) -> bool {
        self.auto_ack
    }

    /// Reports whether this consumer requests exclusive access to the queue.
    pub fn exclusive(&self) -> bool {
        self.exclusive
    }

    /// Reports whether messages published on this connection are withheld.
    pub fn no_local(&self) -> bool {
        self.no_local
    }

    /// Reports whether the registration is sent without awaiting
    /// confirmation.
    pub fn no_wait(&self) -> bool {
        self.no_wait
    }

    /// Exposes the registration arguments.
    pub fn args(&self) -> &Arguments {
        &self.args
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn deserialize_aliases() {
        // Given
        let input = r#"{"consumer_tag":"t1","no_ack":true,"arguments":{"x-priority":5}}"#;
        let expected_output = ConsumerOptions::tagged("t1")
            .with_auto_ack(true)
            .with_arg("x-priority", 5);

        // When
        let actual_output = serde_json::from_str::<ConsumerOptions>(input).unwrap();

        // Then
        assert_eq!(expected_output, actual_output);
    }
}
