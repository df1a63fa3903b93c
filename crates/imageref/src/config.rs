use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// Defaults applied when normalizing and familiarizing references.
///
/// The stock values follow the Docker conventions; alternate registries can
/// supply their own to get the same defaulting rules against a different
/// domain.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReferenceConfig {
    /// Domain assumed when a name has no domain-like first component.
    pub default_domain: Cow<'static, str>,
    /// Historical alias of the default domain, rewritten during normalization.
    pub legacy_default_domain: Cow<'static, str>,
    /// Namespace prepended to single-component paths on the default domain.
    pub official_repo_prefix: Cow<'static, str>,
    /// Tag attached to bare names by `tag_name_only`.
    pub default_tag: Cow<'static, str>,
    /// Maximum length of `domain/path`.
    pub name_total_length_max: usize,
}

impl ReferenceConfig {
    /// Docker Hub conventions.
    pub const DOCKER: Self = Self {
        default_domain: Cow::Borrowed(DEFAULT_DOMAIN),
        legacy_default_domain: Cow::Borrowed(LEGACY_DEFAULT_DOMAIN),
        official_repo_prefix: Cow::Borrowed(OFFICIAL_REPO_PREFIX),
        default_tag: Cow::Borrowed(DEFAULT_TAG),
        name_total_length_max: NAME_TOTAL_LENGTH_MAX,
    };

    /// Same conventions with a different default domain and no legacy alias.
    pub fn with_default_domain(domain: impl Into<String>) -> Self {
        Self {
            default_domain: Cow::Owned(domain.into()),
            legacy_default_domain: Cow::Borrowed(""),
            ..Self::DOCKER
        }
    }
}

impl Default for ReferenceConfig {
    fn default() -> Self {
        Self::DOCKER
    }
}

/// Maximum total number of characters in a repository name.
pub const NAME_TOTAL_LENGTH_MAX: usize = 255;

pub const DEFAULT_DOMAIN: &str = "docker.io";
pub const LEGACY_DEFAULT_DOMAIN: &str = "index.docker.io";
pub const OFFICIAL_REPO_PREFIX: &str = "library/";
pub const DEFAULT_TAG: &str = "latest";
