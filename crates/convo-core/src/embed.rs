//! Shareable and embeddable link construction.
//!
//! Pure string templates over the configured base origin; existence of the
//! referenced entity is never checked (a broken id simply 404s downstream).

use base64::engine::general_purpose::URL_SAFE;
use base64::Engine as _;

use crate::config::CoreConfig;

#[derive(Debug, Clone)]
pub struct EmbedLinks {
    base: String,
}

impl EmbedLinks {
    pub fn new(base: impl Into<String>) -> Self {
        let mut base = base.into();
        while base.ends_with('/') {
            base.pop();
        }
        Self { base }
    }

    pub fn from_config(config: &CoreConfig) -> Self {
        Self::new(config.api_url.clone())
    }

    pub fn comment_embed_url(&self, comment_id: &str) -> String {
        format!("{}/embed/c/{}", self.base, comment_id)
    }

    pub fn thread_embed_url(&self, thread_id: &str) -> String {
        format!("{}/embed/t/{}", self.base, thread_id)
    }

    pub fn thread_permalink(&self, thread_id: &str) -> String {
        format!("{}/thread/{}", self.base, thread_id)
    }

    /// Copy-paste iframe snippet for embedding a whole thread.
    pub fn thread_embed_iframe(&self, thread_id: &str) -> String {
        format!("<iframe src=\"{}\"/>", self.thread_embed_url(thread_id))
    }

    /// "Similar threads" page for a normalized page URL, which travels
    /// base64url-encoded in the path.
    pub fn site_permalink(&self, page_url: &str) -> String {
        format!("{}/site/{}", self.base, URL_SAFE.encode(page_url))
    }
}
