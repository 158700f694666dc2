//! Request classification.
//!
//! A pure mapping from (method, URL) to an [`AssetClass`], or `None` when
//! the request must bypass the worker entirely.

use regex::Regex;
use reqwest::{Method, Url};
use spritz_core::AppConfig;
use std::sync::LazyLock;

/// Suffixes of documents and scripts served from the app origin.
/// Matched case-sensitively.
const STATIC_SUFFIXES: [&str; 6] = [".html", ".css", ".js", ".mjs", ".tsx", ".ts"];

static IMAGE_EXT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\.(jpg|jpeg|png|gif|webp|svg|ico)$").expect("image extension pattern"));

static FONT_EXT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\.(woff|woff2|ttf|eot|otf)$").expect("font extension pattern"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetClass {
    Static,
    Image,
    Font,
    /// Catch-all, including API-like calls.
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classifier {
    static_prefixes: Vec<String>,
    image_hosts: Vec<String>,
}

impl Default for Classifier {
    fn default() -> Self {
        Self::from_config(&AppConfig::default())
    }
}

impl Classifier {
    pub fn new(static_prefixes: Vec<String>, image_hosts: Vec<String>) -> Self {
        Self { static_prefixes, image_hosts }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.static_prefixes.clone(), config.image_hosts.clone())
    }

    /// Classify a request. `None` means skip: not a GET, or not http(s).
    ///
    /// First match wins: static, image, font, other.
    pub fn classify(&self, method: &Method, url: &Url) -> Option<AssetClass> {
        if method != Method::GET || !matches!(url.scheme(), "http" | "https") {
            return None;
        }

        let path = url.path();
        let class = if self.is_static(path) {
            AssetClass::Static
        } else if IMAGE_EXT.is_match(path) || self.is_image_host(url) {
            AssetClass::Image
        } else if FONT_EXT.is_match(path) {
            AssetClass::Font
        } else {
            AssetClass::Other
        };
        Some(class)
    }

    fn is_static(&self, path: &str) -> bool {
        path == "/"
            || STATIC_SUFFIXES.iter().any(|suffix| path.ends_with(suffix))
            || self.static_prefixes.iter().any(|prefix| path.starts_with(prefix.as_str()))
    }

    fn is_image_host(&self, url: &Url) -> bool {
        url.host_str().is_some_and(|host| self.image_hosts.iter().any(|h| host.contains(h.as_str())))
    }
}
