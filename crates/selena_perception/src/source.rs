use anyhow::{Context, Result};
use url::Url;

/// Check that a configured endpoint is an absolute HTTP(S) URL with a host.
pub fn validate_url(url: &str) -> Result<Url> {
    let parsed = Url::parse(url).with_context(|| format!("Invalid URL '{}'", url))?;

    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        anyhow::bail!("Only HTTP/HTTPS schemes are allowed, got '{}'", parsed.scheme());
    }
    if parsed.host_str().map_or(true, str::is_empty) {
        anyhow::bail!("URL '{}' has no host", url);
    }

    Ok(parsed)
}
