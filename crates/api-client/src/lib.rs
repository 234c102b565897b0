//! HTTP implementation of the dialdesk provider command surface
//!
//! [`HttpCommandClient`] implements
//! [`CommandClient`](dialdesk_agent_core::CommandClient) against the
//! provider's REST API. Every command is a single attempt: no retry, no
//! backoff, no timeout policy - a failure comes back verbatim as a
//! `CommandFailed` error for the session layer to surface, and acting again
//! is the user's decision.
//!
//! The extension-registration popup is a UI concern, but its URL shape is
//! provider API surface, so [`extension_url`] lives here next to the other
//! endpoints.

mod http;

pub use http::HttpCommandClient;

use url::Url;

/// Build the URL of the provider's extension-registration surface for the
/// given agent token
///
/// # Examples
///
/// ```rust
/// use url::Url;
///
/// let base = Url::parse("https://app.example.com").unwrap();
/// let url = dialdesk_api_client::extension_url(&base, "tok-1");
/// assert_eq!(url.as_str(), "https://app.example.com/extension?api_token=tok-1");
/// ```
pub fn extension_url(base: &Url, token: &str) -> Url {
    let mut url = base.clone();
    url.set_path("/extension");
    url.query_pairs_mut().clear().append_pair("api_token", token);
    url
}
