//! Turning familiar, user-typed names into fully qualified references.
//!
//! A [`Normalizer`] owns a [`ReferenceConfig`] and applies its defaults:
//! the default domain for names without a registry, the official namespace
//! for single-component names on that domain, and the default tag for bare
//! names. The free functions in this module use the Docker defaults.

use tracing::{debug, trace};

use crate::config::{ReferenceConfig, DEFAULT_TAG};
use crate::digest::Digest;
use crate::error::{ReferenceError, Result};
use crate::grammar;
use crate::reference::{self, Named, Reference, Tag};

/// Applies defaulting rules from a [`ReferenceConfig`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Normalizer {
    config: ReferenceConfig,
    default_tag: Tag,
}

static DOCKER: Normalizer = Normalizer {
    config: ReferenceConfig::DOCKER,
    default_tag: Tag::from_static(DEFAULT_TAG),
};

/// A configured domain must survive the domain split of the names it is
/// prepended to.
fn is_registry(domain: &str) -> bool {
    grammar::looks_like_domain(domain) && grammar::is_domain(domain)
}

impl Normalizer {
    /// Build a normalizer, checking that the configured defaults are
    /// themselves valid reference parts.
    ///
    /// Both domains must be recognizable as registries, so a dotless host
    /// other than `localhost` needs an explicit port.
    pub fn new(config: ReferenceConfig) -> Result<Self> {
        if !is_registry(&config.default_domain) {
            return Err(ReferenceError::InvalidFormat);
        }
        if !config.legacy_default_domain.is_empty()
            && !is_registry(&config.legacy_default_domain)
        {
            return Err(ReferenceError::InvalidFormat);
        }
        if let Some(namespace) = config.official_repo_prefix.strip_suffix('/') {
            if !grammar::is_path(namespace) {
                return Err(ReferenceError::InvalidFormat);
            }
        } else if !config.official_repo_prefix.is_empty() {
            return Err(ReferenceError::InvalidFormat);
        }
        let default_tag = Tag::new(&config.default_tag)?;
        Ok(Self {
            config,
            default_tag,
        })
    }

    /// The normalizer for Docker Hub conventions.
    pub fn docker() -> &'static Self {
        &DOCKER
    }

    pub fn config(&self) -> &ReferenceConfig {
        &self.config
    }

    /// Strict parse honouring the configured name length limit.
    pub fn parse(&self, s: &str) -> Result<Reference> {
        reference::parse_with(s, self.config.name_total_length_max)
    }

    /// Validate a bare name under the configured length limit.
    pub fn with_name(&self, name: &str) -> Result<Named> {
        reference::with_name_limited(name, self.config.name_total_length_max)
    }

    /// The domain of `named`, falling back to the configured default.
    pub fn domain<'a>(&'a self, named: &'a Named) -> &'a str {
        named.domain().unwrap_or(&self.config.default_domain)
    }

    /// The path of `named`.
    pub fn path<'a>(&self, named: &'a Named) -> &'a str {
        named.path()
    }

    /// Split a familiar name into domain and remainder, applying the
    /// default domain, the legacy alias rewrite and the official prefix.
    fn split_docker_domain(&self, name: &str) -> (String, String) {
        let config = &self.config;
        let (mut domain, mut remainder) = match name.split_once('/') {
            Some((first, rest)) if grammar::looks_like_domain(first) => {
                (first.to_string(), rest.to_string())
            }
            _ => (config.default_domain.to_string(), name.to_string()),
        };
        if !config.legacy_default_domain.is_empty() && domain == config.legacy_default_domain {
            domain = config.default_domain.to_string();
        }
        if domain == config.default_domain && !remainder.contains('/') {
            remainder.insert_str(0, &config.official_repo_prefix);
        }
        (domain, remainder)
    }

    /// Parse a familiar name, as typed in a UI, into a fully qualified one.
    ///
    /// `busybox` becomes `docker.io/library/busybox`, `user/app:v1` becomes
    /// `docker.io/user/app:v1`, and names with their own registry are kept.
    /// A bare 64-character hex identifier is rejected; use
    /// [`Normalizer::parse_any_reference`] when one may appear.
    pub fn parse_normalized_named(&self, s: &str) -> Result<Named> {
        if grammar::is_identifier(s) {
            return Err(ReferenceError::InvalidFormat);
        }
        let (domain, remainder) = self.split_docker_domain(s);
        let remote_name = remainder
            .split_once([':', '@'])
            .map_or(remainder.as_str(), |(name, _)| name);
        if remote_name.bytes().any(|b| b.is_ascii_uppercase()) {
            return Err(ReferenceError::NameContainsUppercase);
        }
        trace!(input = s, %domain, %remainder, "normalizing familiar name");

        match self.parse(&format!("{domain}/{remainder}"))? {
            Reference::Named(named) => Ok(named),
            Reference::Digest(_) => Err(ReferenceError::InvalidFormat),
        }
    }

    /// Parse a name that must already be in its normalized form.
    pub fn parse_named(&self, s: &str) -> Result<Named> {
        let named = self.parse_normalized_named(s)?;
        if named.to_string() != s {
            debug!(input = s, normalized = %named, "name is not canonical");
            return Err(ReferenceError::NameNotCanonical);
        }
        Ok(named)
    }

    /// Parse `s` as an identifier, a digest, or a familiar name, in that
    /// order.
    pub fn parse_any_reference(&self, s: &str) -> Result<Reference> {
        if let Some(digest) = reference::parse_digest_only(s) {
            return Ok(Reference::Digest(digest));
        }
        self.parse_normalized_named(s).map(Reference::Named)
    }

    /// Normalize following the Docker convention: the result is either
    /// tagged or digested, never both and never bare.
    ///
    /// When both a tag and a digest are present, the digest wins and the tag
    /// is dropped. A bare name receives the default tag.
    pub fn parse_docker_ref(&self, s: &str) -> Result<Named> {
        let named = self
            .parse_any_reference(s)?
            .into_named()
            .ok_or(ReferenceError::InvalidFormat)?;
        Ok(match named {
            Named::Canonical { repository, digest, .. } => {
                debug!(input = s, "dropping tag in favour of digest");
                Named::Digested { repository, digest }
            }
            other => self.tag_name_only(other),
        })
    }

    /// Attach the default tag if `named` has neither tag nor digest.
    pub fn tag_name_only(&self, named: Named) -> Named {
        match named {
            Named::Bare(repository) => Named::Tagged {
                repository,
                tag: self.default_tag.clone(),
            },
            other => other,
        }
    }
}

impl Default for Normalizer {
    fn default() -> Self {
        DOCKER.clone()
    }
}

/// [`Normalizer::parse_normalized_named`] with Docker defaults.
pub fn parse_normalized_named(s: &str) -> Result<Named> {
    DOCKER.parse_normalized_named(s)
}

/// [`Normalizer::parse_docker_ref`] with Docker defaults.
pub fn parse_docker_ref(s: &str) -> Result<Named> {
    DOCKER.parse_docker_ref(s)
}

/// [`Normalizer::parse_any_reference`] with Docker defaults.
pub fn parse_any_reference(s: &str) -> Result<Reference> {
    DOCKER.parse_any_reference(s)
}

/// [`Normalizer::tag_name_only`] with Docker defaults.
pub fn tag_name_only(named: Named) -> Named {
    DOCKER.tag_name_only(named)
}

/// Returns `true` if `named` carries only a repository name.
pub fn is_name_only(named: &Named) -> bool {
    named.is_name_only()
}

/// Wrap a bare identifier as a digest-only reference.
pub fn identifier_reference(id: &str) -> Result<Reference> {
    Digest::from_identifier(id).map(Reference::Digest)
}
