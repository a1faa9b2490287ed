use thiserror::Error;
use url::Url;

/// Reasons a link is not handed to the system browser.
#[derive(Error, Debug)]
pub enum OpenUrlError {
    /// Feed items without a link carry the `#` placeholder.
    #[error("Item has no link")]
    NoLink,
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("Unsupported scheme: {0} (only http/https allowed)")]
    UnsupportedScheme(String),
}

/// Validate a link before passing it to `open::that`.
///
/// Feed content is untrusted, so only absolute http(s) URLs are accepted.
pub fn validate_url_for_open(url_str: &str) -> Result<Url, OpenUrlError> {
    let trimmed = url_str.trim();
    if trimmed.is_empty() || trimmed == "#" {
        return Err(OpenUrlError::NoLink);
    }

    let url = Url::parse(trimmed)?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        scheme => Err(OpenUrlError::UnsupportedScheme(scheme.to_owned())),
    }
}
