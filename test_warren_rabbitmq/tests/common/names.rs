use std::time::{SystemTime, UNIX_EPOCH};

/// Generates a random 6-character token to use as a globally unique name or
/// value.
pub fn random_token() -> String {
    use rand::Rng;

    rand::rng()
        .sample_iter(&rand::distr::Alphanumeric)
        .take(6)
        .map(char::from)
        .collect()
}

/// Adds a timestamp and a random suffix to the given test name to make it
/// globally unique.
pub fn mangle(name: &str, kind: &str) -> String {
    format!(
        "{}.{}.{}.{}",
        name.replace("::tests::", "::").replace("::", "."),
        kind,
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs(),
        random_token(),
    )
}
