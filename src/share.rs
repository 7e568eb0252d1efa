use reqwest::Url;

use crate::config::{SHARE_INTENT_URL, SHARE_MENTION, SITE_DOMAIN};

pub fn share_text(handle: &str) -> String {
    format!(
        "Just reserved my personal operator handle \"{handle}\" on {SHARE_MENTION}! \
         Can't wait to explore the future of browsing. 🚀\n\n{SITE_DOMAIN}"
    )
}

/// Tweet intent link for a claimed handle.
pub fn share_url(handle: &str) -> String {
    Url::parse_with_params(SHARE_INTENT_URL, &[("text", share_text(handle))])
        .map(|u| u.to_string())
        .unwrap_or_else(|_| SHARE_INTENT_URL.to_string())
}
