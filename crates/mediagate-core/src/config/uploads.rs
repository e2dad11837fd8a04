//! Upload tree location configuration.

use serde::{Deserialize, Serialize};

/// Where the shared upload tree lives and how it is addressed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadsConfig {
    /// Filesystem root of the upload tree. Requests may only resolve
    /// to files beneath this directory.
    pub root_dir: String,
    /// Public base URL of the upload tree, used when composing
    /// tokenized access links.
    pub base_url: String,
    /// Site root URL, the last-resort denial redirect target.
    #[serde(default)]
    pub site_url: String,
}

impl UploadsConfig {
    /// The site root with a trailing slash, falling back to `/`.
    pub fn site_root(&self) -> String {
        if self.site_url.is_empty() {
            "/".to_string()
        } else {
            format!("{}/", self.site_url.trim_end_matches('/'))
        }
    }
}
