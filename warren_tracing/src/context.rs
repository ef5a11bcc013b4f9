use crate::TracingConfig;
use std::sync::Arc;
use tracing::{info_span, Span};
use tracing_subscriber::util::TryInitError;

/// The explicit logging context of a running service.
///
/// Identifies the service in every event emitted within its
/// [span](LogContext::span) by two fields:
///
/// - `source`: `"<service> <pid> on <host>"`, where `<host>` is the first
///   label of the host name,
/// - `tags`: `"<service> <profile>"`.
///
/// The context is built once, then cheaply cloned into (or borrowed by) the
/// components that log on behalf of the service. Components instrument their
/// work with the [span](LogContext::span), so no process-wide mutable state is
/// involved.
///
/// A [`Span`] only records anything if a subscriber is installed by the time
/// it is created: build the context after installing one, or use
/// [`LogContext::init`] to do both in the correct order.
#[derive(Debug, Clone)]
pub struct LogContext {
    service: Arc<str>,
    profile: Arc<str>,
    source: Arc<str>,
    tags: Arc<str>,
    span: Span,
}

impl LogContext {
    /// Creates a new context for the given service and profile, running on the
    /// current host.
    ///
    /// The host name is queried from the operating system, with `localhost`
    /// as a fallback.
    pub fn new(service: impl AsRef<str>, profile: impl AsRef<str>) -> Self {
        let host = host_name().unwrap_or_else(|| "localhost".to_string());

        Self::with_host(service, profile, host)
    }

    /// Creates a new context for the given service and profile, running on the
    /// given host.
    pub fn with_host(
        service: impl AsRef<str>,
        profile: impl AsRef<str>,
        host: impl AsRef<str>,
    ) -> Self {
        let service = service.as_ref();
        let profile = profile.as_ref();
        let short_host = host.as_ref().split('.').next().unwrap_or_default();

        let source: Arc<str> = Arc::from(format!(
            "{} {} on {}",
            service,
            std::process::id(),
            short_host,
        ));
        let tags: Arc<str> = Arc::from(format!("{} {}", service, profile));
        let span = info_span!("service", source = %source, tags = %tags);

        Self {
            service: Arc::from(service),
            profile: Arc::from(profile),
            source,
            tags,
            span,
        }
    }

    /// Installs the global subscriber described by the given
    /// [config](TracingConfig), then creates a new context for the given
    /// service and profile.
    pub fn init(
        service: impl AsRef<str>,
        profile: impl AsRef<str>,
        config: impl AsRef<TracingConfig>,
    ) -> Result<Self, TryInitError> {
        crate::init(config)?;

        Ok(Self::new(service, profile))
    }
}

impl LogContext {
    /// Reports the service name.
    pub fn service(&self) -> &str {
        &self.service
    }

    /// Reports the profile (environment) name.
    pub fn profile(&self) -> &str {
        &self.profile
    }

    /// Reports the `source` field recorded on the span.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Reports the `tags` field recorded on the span.
    pub fn tags(&self) -> &str {
        &self.tags
    }

    /// Exposes the span that carries this context.
    pub fn span(&self) -> &Span {
        &self.span
    }
}

/// Reports the host name of this machine, as the kernel knows it.
#[cfg(unix)]
fn host_name() -> Option<String> {
    let mut buffer = [0u8; 256];

    // SAFETY: the buffer outlives the call, and its exact length is passed
    let status = unsafe { libc::gethostname(buffer.as_mut_ptr().cast(), buffer.len()) };
    if status != 0 {
        return None;
    }

    // A truncated name may lack the terminating NUL
    let length = buffer.iter().position(|&b| b == 0).unwrap_or(buffer.len());
    let name = String::from_utf8_lossy(&buffer[..length]).into_owned();

    (!name.is_empty()).then_some(name)
}

/// Reports the host name of this machine, as Windows knows it.
#[cfg(not(unix))]
fn host_name() -> Option<String> {
    std::env::var("COMPUTERNAME").ok().filter(|name| !name.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn composes_source_and_tags() {
        // Given
        let expected_source = format!("kontrol {} on node-1", std::process::id());

        // When
        let context = LogContext::with_host("kontrol", "prod", "node-1.example.com");

        // Then
        assert_eq!(context.service(), "kontrol");
        assert_eq!(context.profile(), "prod");
        assert_eq!(context.source(), expected_source);
        assert_eq!(context.tags(), "kontrol prod");
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn new_uses_the_kernel_host_name() {
        // Given
        let kernel_host = std::fs::read_to_string("/proc/sys/kernel/hostname").unwrap();
        let short_host = kernel_host.trim().split('.').next().unwrap().to_string();
        let expected_source = format!("kontrol {} on {}", std::process::id(), short_host);

        // When
        let context = LogContext::new("kontrol", "prod");

        // Then
        assert_eq!(context.source(), expected_source);
        assert_eq!(host_name().as_deref(), Some(kernel_host.trim()));
    }

    #[test]
    fn clones_share_the_span() {
        let context = LogContext::with_host("kontrol", "dev", "localhost");

        let clone = context.clone();

        assert_eq!(context.span().id(), clone.span().id());
        assert_eq!(context.source(), clone.source());
    }
}
