use regex::Regex;
use std::sync::LazyLock;
use url::Url;

// local@label.label[.label…], with no whitespace and a single `@`
static EMAIL_RGX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@.]+(?:\.[^\s@.]+)+$").expect("email regex should be valid")
});

/// Test whether `s` has the shape of an email address.  Only the syntax is
/// checked.
pub(crate) fn is_valid_email(s: &str) -> bool {
    EMAIL_RGX.is_match(s)
}

/// Test whether `s` is an absolute HTTP or HTTPS URL with a host
pub(crate) fn is_valid_url(s: &str) -> bool {
    Url::parse(s).is_ok_and(|url| {
        matches!(url.scheme(), "http" | "https") && url.host_str().is_some_and(|h| !h.is_empty())
    })
}
