//! Versioned bucket naming: `<prefix>-<category>-<version>`.

use std::fmt;

/// Semantic category embedded in a bucket name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BucketCategory {
    Static,
    Images,
    Fonts,
    Runtime,
}

impl BucketCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            BucketCategory::Static => "static",
            BucketCategory::Images => "images",
            BucketCategory::Fonts => "fonts",
            BucketCategory::Runtime => "runtime",
        }
    }
}

impl fmt::Display for BucketCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Bucket names of one worker version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BucketNames {
    prefix: String,
    pub static_assets: String,
    pub images: String,
    pub fonts: String,
    /// Only present when network-first responses get their own bucket.
    pub runtime: Option<String>,
}

impl BucketNames {
    pub fn new(prefix: &str, version: &str, dedicated_runtime: bool) -> Self {
        let name = |category: BucketCategory| format!("{prefix}-{category}-{version}");
        Self {
            prefix: prefix.to_string(),
            static_assets: name(BucketCategory::Static),
            images: name(BucketCategory::Images),
            fonts: name(BucketCategory::Fonts),
            runtime: dedicated_runtime.then(|| name(BucketCategory::Runtime)),
        }
    }

    /// Every bucket the current version owns.
    pub fn current(&self) -> Vec<&str> {
        let mut names = vec![self.static_assets.as_str(), self.images.as_str(), self.fonts.as_str()];
        names.extend(self.runtime.as_deref());
        names
    }

    /// Bucket written and read by the network-first strategy.
    pub fn network_first(&self) -> &str {
        self.runtime.as_deref().unwrap_or(&self.static_assets)
    }

    pub fn is_current(&self, name: &str) -> bool {
        self.current().contains(&name)
    }

    /// Whether a bucket follows this application's naming convention,
    /// whatever its version.
    pub fn is_owned(&self, name: &str) -> bool {
        name.strip_prefix(self.prefix.as_str()).is_some_and(|rest| rest.starts_with('-'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_embed_category_and_version() {
        let names = BucketNames::new("cocktail-app", "v1.0.0", false);
        assert_eq!(names.static_assets, "cocktail-app-static-v1.0.0");
        assert_eq!(names.images, "cocktail-app-images-v1.0.0");
        assert_eq!(names.fonts, "cocktail-app-fonts-v1.0.0");
        assert_eq!(names.runtime, None);
        assert_eq!(names.current().len(), 3);
    }

    #[test]
    fn test_network_first_shares_static_by_default() {
        let names = BucketNames::new("app", "v2", false);
        assert_eq!(names.network_first(), "app-static-v2");
    }

    #[test]
    fn test_dedicated_runtime_bucket() {
        let names = BucketNames::new("app", "v2", true);
        assert_eq!(names.network_first(), "app-runtime-v2");
        assert!(names.is_current("app-runtime-v2"));
        assert_eq!(names.current().len(), 4);
    }

    #[test]
    fn test_ownership_and_currency() {
        let names = BucketNames::new("app", "v2", false);
        assert!(names.is_owned("app-static-v1"));
        assert!(!names.is_current("app-static-v1"));
        assert!(names.is_current("app-images-v2"));
        assert!(!names.is_owned("application-static-v1"));
        assert!(!names.is_owned("other-static-v1"));
    }
}
