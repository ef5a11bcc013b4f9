use crate::{
    BindingOptions, Connection, Consumer, ConsumerError, ConsumerOptions, Exchange, Handle, Queue,
    Session,
};
use config::{ConfigBuilder, Environment, File};
use config::builder::DefaultState;
use serde::{Deserialize, Deserializer};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// The configuration of a single [`Consumer`]: where to connect, what to
/// declare, and how long to wait for the deliveries to drain on a shutdown
/// signal.
///
/// Every section is optional and falls back to its default.
///
/// ```yaml
/// handle:
///   host: rabbit.internal
///   user: koding
///   password: secret
/// exchange:
///   name: orders
///   type: topic
/// queue:
///   name: orders.q
///   durable: true
/// binding:
///   routing_key: order.*
/// consumer:
///   tag: orders-consumer
/// shutdown_timeout: 30s
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ConsumerConfig {
    handle: Handle,
    exchange: Exchange,
    queue: Queue,
    binding: BindingOptions,
    consumer: ConsumerOptions,
    #[serde(deserialize_with = "deserialize_timeout")]
    shutdown_timeout: Option<Duration>,
}

impl ConsumerConfig {
    /// Reports the connection [`Handle`].
    pub fn handle(&self) -> &Handle {
        &self.handle
    }

    /// Groups the routing parts of this config into a [`Session`].
    pub fn session(&self) -> Session {
        Session::new(
            self.exchange.clone(),
            self.queue.clone(),
            self.binding.clone(),
            self.consumer.clone(),
        )
    }

    /// Reports the drain deadline to apply on a shutdown signal, if any.
    pub fn shutdown_timeout(&self) -> Option<Duration> {
        self.shutdown_timeout
    }

    /// Starts a [`Consumer`] as described by this config.
    pub async fn start(&self) -> Result<Consumer<Connection>, ConsumerError> {
        let consumer = Consumer::start(&self.handle, self.session()).await?;

        Ok(consumer.with_shutdown_timeout(self.shutdown_timeout))
    }
}

impl AsRef<ConsumerConfig> for ConsumerConfig {
    fn as_ref(&self) -> &ConsumerConfig {
        self
    }
}

fn deserialize_timeout<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer)?
        .map(|value| humantime::parse_duration(value.trim()).map_err(serde::de::Error::custom))
        .transpose()
}

/// Tells [`ConsumerConfig::load`] where to look.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadChoices {
    /// The directory whose `*.toml`, `*.yaml`, and `*.yml` files are loaded,
    /// in lexicographic order. A missing directory contributes nothing.
    pub dir_name: Option<String>,
    /// Whether the environment variables are loaded (over the files).
    pub env_enabled: bool,
    /// The prefix of the environment variables to load.
    pub env_prefix: Option<String>,
    /// The separator of nested keys in the environment variable names (e.g.,
    /// `WARREN_HANDLE__HOST`).
    pub env_separator: Option<String>,
}

impl Default for LoadChoices {
    fn default() -> Self {
        Self {
            dir_name: Some("config".to_string()),
            env_enabled: true,
            env_prefix: Some("WARREN".to_string()),
            env_separator: Some("__".to_string()),
        }
    }
}

/// Reports why [`ConsumerConfig::load`] failed.
#[derive(Error, Debug)]
pub enum LoadError {
    /// The config directory exists but could not be listed.
    #[error("failed to list the config directory '{}': {source}", .path.display())]
    Dir {
        /// The config directory.
        path: PathBuf,
        /// The I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The sources could not be read or merged, or the result does not match
    /// [`ConsumerConfig`].
    #[error("failed to load the consumer config: {0}")]
    Config(#[from] config::ConfigError),
}

impl ConsumerConfig {
    /// Assembles a config from the files and the environment variables
    /// selected by the given [`LoadChoices`]. Later sources override earlier
    /// ones, and the environment overrides all files.
    pub fn load(choices: &LoadChoices) -> Result<Self, LoadError> {
        let mut builder = ConfigBuilder::<DefaultState>::default();

        let dir = Path::new(choices.dir_name.as_deref().unwrap_or("config"));
        for config_file in find_config_files(dir)? {
            builder = builder.add_source(File::from(config_file));
        }

        if choices.env_enabled {
            let mut env_source = Environment::default().try_parsing(true);

            if let Some(prefix) = choices.env_prefix.as_deref() {
                env_source = env_source.prefix(prefix).prefix_separator("_");
            }

            if let Some(separator) = choices.env_separator.as_deref() {
                env_source = env_source.separator(separator);
            }

            builder = builder.add_source(env_source);
        }

        Ok(builder.build()?.try_deserialize()?)
    }
}

fn find_config_files(dir: &Path) -> Result<Vec<PathBuf>, LoadError> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(error) if error.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(source) => {
            return Err(LoadError::Dir {
                path: dir.to_path_buf(),
                source,
            });
        }
    };

    let mut config_files = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .filter(|path| {
            path.extension()
                .and_then(|extension| extension.to_str())
                .is_some_and(|extension| matches!(extension, "toml" | "yaml" | "yml"))
        })
        .collect::<Vec<_>>();

    config_files.sort();

    Ok(config_files)
}
