//! The reference model and the strict parser.
//!
//! A reference is either a [`Named`] value (a repository name, optionally
//! refined with a tag, a digest, or both) or a bare [`Digest`]. Parsing here
//! never applies defaults; see [`crate::normalize`] for that.

use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::config::{DEFAULT_DOMAIN, NAME_TOTAL_LENGTH_MAX};
use crate::digest::Digest;
use crate::error::{ReferenceError, Result};
use crate::grammar;

/// A validated tag, `[\w][\w.-]{0,127}`.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Tag(Cow<'static, str>);

impl Tag {
    /// Validate and wrap a tag.
    pub fn new(tag: &str) -> Result<Self> {
        if grammar::is_tag(tag) {
            Ok(Self(Cow::Owned(tag.to_string())))
        } else {
            Err(ReferenceError::TagInvalidFormat)
        }
    }

    /// Wrap a tag known to be valid at compile time.
    pub(crate) const fn from_static(tag: &'static str) -> Self {
        Self(Cow::Borrowed(tag))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Tag({})", self.0)
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Tag {
    type Err = ReferenceError;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl TryFrom<String> for Tag {
    type Error = ReferenceError;

    fn try_from(s: String) -> Result<Self> {
        Self::new(&s)
    }
}

impl From<Tag> for String {
    fn from(tag: Tag) -> Self {
        tag.0.into_owned()
    }
}

/// A repository name: an optional registry domain and a path.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Repository {
    domain: Option<String>,
    path: String,
}

impl Repository {
    /// Build from parts that are already known to be valid.
    pub(crate) fn from_parts(domain: Option<&str>, path: &str) -> Self {
        Self {
            domain: domain.map(str::to_string),
            path: path.to_string(),
        }
    }

    /// The registry domain, if the name carried one.
    pub fn domain(&self) -> Option<&str> {
        self.domain.as_deref()
    }

    /// The path within the registry.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The full name, `domain/path` or just `path`.
    pub fn name(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Repository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.domain {
            Some(domain) => write!(f, "{domain}/{}", self.path),
            None => f.write_str(&self.path),
        }
    }
}

/// A reference that carries a repository name.
///
/// The variants are the possible refinements of a name; constructors always
/// pick the narrowest one that fits.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Named {
    /// Name only.
    Bare(Repository),
    /// Name and tag.
    Tagged { repository: Repository, tag: Tag },
    /// Name and digest.
    Digested { repository: Repository, digest: Digest },
    /// Name, tag and digest.
    Canonical {
        repository: Repository,
        tag: Tag,
        digest: Digest,
    },
}

impl Named {
    /// Assemble the narrowest variant for the given parts.
    pub fn from_parts(repository: Repository, tag: Option<Tag>, digest: Option<Digest>) -> Self {
        match (tag, digest) {
            (None, None) => Self::Bare(repository),
            (Some(tag), None) => Self::Tagged { repository, tag },
            (None, Some(digest)) => Self::Digested { repository, digest },
            (Some(tag), Some(digest)) => Self::Canonical {
                repository,
                tag,
                digest,
            },
        }
    }

    /// Split back into repository, tag and digest.
    pub fn into_parts(self) -> (Repository, Option<Tag>, Option<Digest>) {
        match self {
            Self::Bare(repository) => (repository, None, None),
            Self::Tagged { repository, tag } => (repository, Some(tag), None),
            Self::Digested { repository, digest } => (repository, None, Some(digest)),
            Self::Canonical {
                repository,
                tag,
                digest,
            } => (repository, Some(tag), Some(digest)),
        }
    }

    pub fn repository(&self) -> &Repository {
        match self {
            Self::Bare(repository)
            | Self::Tagged { repository, .. }
            | Self::Digested { repository, .. }
            | Self::Canonical { repository, .. } => repository,
        }
    }

    /// The full repository name without tag or digest.
    pub fn name(&self) -> String {
        self.repository().name()
    }

    pub fn domain(&self) -> Option<&str> {
        self.repository().domain()
    }

    pub fn path(&self) -> &str {
        self.repository().path()
    }

    pub fn tag(&self) -> Option<&Tag> {
        match self {
            Self::Tagged { tag, .. } | Self::Canonical { tag, .. } => Some(tag),
            Self::Bare(_) | Self::Digested { .. } => None,
        }
    }

    pub fn digest(&self) -> Option<&Digest> {
        match self {
            Self::Digested { digest, .. } | Self::Canonical { digest, .. } => Some(digest),
            Self::Bare(_) | Self::Tagged { .. } => None,
        }
    }

    /// Returns `true` if there is neither a tag nor a digest.
    pub fn is_name_only(&self) -> bool {
        matches!(self, Self::Bare(_))
    }

    /// Attach a tag, keeping any digest already present.
    pub fn with_tag(self, tag: Tag) -> Self {
        let (repository, _, digest) = self.into_parts();
        Self::from_parts(repository, Some(tag), digest)
    }

    /// Attach a digest, keeping any tag already present.
    pub fn with_digest(self, digest: Digest) -> Self {
        let (repository, tag, _) = self.into_parts();
        Self::from_parts(repository, tag, Some(digest))
    }

    /// Drop tag and digest.
    pub fn trimmed(&self) -> Self {
        Self::Bare(self.repository().clone())
    }
}

impl fmt::Display for Named {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.repository())?;
        if let Some(tag) = self.tag() {
            write!(f, ":{tag}")?;
        }
        if let Some(digest) = self.digest() {
            write!(f, "@{digest}")?;
        }
        Ok(())
    }
}

impl FromStr for Named {
    type Err = ReferenceError;

    fn from_str(s: &str) -> Result<Self> {
        match parse(s)? {
            Reference::Named(named) => Ok(named),
            Reference::Digest(_) => Err(ReferenceError::InvalidFormat),
        }
    }
}

/// Any syntactically valid reference.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Reference {
    /// A reference carrying a repository name.
    Named(Named),
    /// A bare digest with no name.
    Digest(Digest),
}

impl Reference {
    pub fn named(&self) -> Option<&Named> {
        match self {
            Self::Named(named) => Some(named),
            Self::Digest(_) => None,
        }
    }

    pub fn into_named(self) -> Option<Named> {
        match self {
            Self::Named(named) => Some(named),
            Self::Digest(_) => None,
        }
    }

    pub fn tag(&self) -> Option<&Tag> {
        self.named().and_then(Named::tag)
    }

    pub fn digest(&self) -> Option<&Digest> {
        match self {
            Self::Named(named) => named.digest(),
            Self::Digest(digest) => Some(digest),
        }
    }

    pub fn is_named(&self) -> bool {
        matches!(self, Self::Named(_))
    }
}

impl From<Named> for Reference {
    fn from(named: Named) -> Self {
        Self::Named(named)
    }
}

impl From<Digest> for Reference {
    fn from(digest: Digest) -> Self {
        Self::Digest(digest)
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named(named) => named.fmt(f),
            Self::Digest(digest) => digest.fmt(f),
        }
    }
}

impl FromStr for Reference {
    type Err = ReferenceError;

    fn from_str(s: &str) -> Result<Self> {
        parse(s)
    }
}

/// Validate a full `[domain/]path` name and split it.
fn parse_name(name: &str, max_len: usize) -> Result<Repository> {
    if name.is_empty() {
        return Err(ReferenceError::NameEmpty);
    }
    let (domain, path) = grammar::split_domain(name);
    if !grammar::is_path(path) {
        if grammar::is_name(&name.to_ascii_lowercase()) {
            return Err(ReferenceError::NameContainsUppercase);
        }
        return Err(ReferenceError::InvalidFormat);
    }
    if name.len() > max_len {
        return Err(ReferenceError::NameTooLong { max: max_len });
    }
    trace!(domain = domain.unwrap_or(""), path, "split repository name");
    Ok(Repository::from_parts(domain, path))
}

/// Strict parse with an explicit name length limit.
pub(crate) fn parse_with(s: &str, max_len: usize) -> Result<Reference> {
    if s.is_empty() {
        return Err(ReferenceError::NameEmpty);
    }
    let parts = grammar::split_reference(s);
    let repository = match parse_name(parts.name, max_len) {
        Err(ReferenceError::NameEmpty) => return Err(ReferenceError::InvalidFormat),
        other => other?,
    };
    let tag = match parts.tag {
        Some("") => return Err(ReferenceError::InvalidFormat),
        Some(tag) => Some(Tag::new(tag)?),
        None => None,
    };
    let digest = match parts.digest {
        Some("") => return Err(ReferenceError::InvalidFormat),
        Some(digest) => Some(Digest::parse(digest)?),
        None => None,
    };
    Ok(Reference::Named(Named::from_parts(repository, tag, digest)))
}

/// Parse `s` as `name[:tag][@digest]`, returning the narrowest variant.
///
/// No defaults are applied: a name without a domain keeps no domain.
///
/// # Examples
///
/// ```
/// use imageref::{parse, Reference};
///
/// let r = parse("docker.io/library/busybox:latest").unwrap();
/// assert_eq!(r.tag().unwrap().as_str(), "latest");
/// assert!(parse("Busybox").is_err());
/// ```
pub fn parse(s: &str) -> Result<Reference> {
    parse_with(s, NAME_TOTAL_LENGTH_MAX)
}

/// Parse `s` as a name that must already be fully qualified.
///
/// Fails with [`ReferenceError::NameNotCanonical`] if normalization would
/// change the input, e.g. because the domain was omitted.
pub fn parse_named(s: &str) -> Result<Named> {
    crate::normalize::Normalizer::docker().parse_named(s)
}

/// Validate a bare repository name.
pub fn with_name(name: &str) -> Result<Named> {
    with_name_limited(name, NAME_TOTAL_LENGTH_MAX)
}

pub(crate) fn with_name_limited(name: &str, max_len: usize) -> Result<Named> {
    if name.len() > max_len {
        return Err(ReferenceError::NameTooLong { max: max_len });
    }
    let (domain, path) = grammar::split_domain(name);
    if !grammar::is_path(path) {
        return Err(ReferenceError::InvalidFormat);
    }
    Ok(Named::Bare(Repository::from_parts(domain, path)))
}

/// Attach a validated tag to `named`, keeping any digest.
pub fn with_tag(named: Named, tag: &str) -> Result<Named> {
    Ok(named.with_tag(Tag::new(tag)?))
}

/// Attach a validated digest to `named`, keeping any tag.
pub fn with_digest(named: Named, digest: &str) -> Result<Named> {
    Ok(named.with_digest(Digest::parse(digest)?))
}

/// Keep only the name.
pub fn trim_named(named: &Named) -> Named {
    named.trimmed()
}

/// The domain of `named`, or the default domain when it has none.
pub fn domain(named: &Named) -> &str {
    named.domain().unwrap_or(DEFAULT_DOMAIN)
}

/// The path of `named`.
pub fn path(named: &Named) -> &str {
    named.path()
}

/// Interpret `s` as a digest-only reference, if it is a bare identifier or a
/// digest with a registered algorithm.
pub(crate) fn parse_digest_only(s: &str) -> Option<Digest> {
    if grammar::is_identifier(s) {
        return Digest::from_identifier(s).ok();
    }
    Digest::parse(s).ok().filter(Digest::is_registered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn sha() -> String {
        format!("sha256:{}", "7cc4b5aefd1d0cadf8d97d4350462ba51c694ebca145b08d7d41b41acc8db5aa")
    }

    fn named(s: &str) -> Named {
        parse(s).unwrap().into_named().unwrap()
    }

    #[test]
    fn parse_bare_name() {
        let n = named("busybox");
        assert!(matches!(n, Named::Bare(_)));
        assert_eq!(n.domain(), None);
        assert_eq!(n.path(), "busybox");
    }

    #[test]
    fn parse_variants() {
        assert!(matches!(named("docker.io/library/busybox:1.36"), Named::Tagged { .. }));
        assert!(matches!(named(&format!("busybox@{}", sha())), Named::Digested { .. }));
        assert!(matches!(named(&format!("busybox:1.36@{}", sha())), Named::Canonical { .. }));
    }

    #[test]
    fn parse_components() {
        let n = named(&format!("localhost:5000/team/app:v2@{}", sha()));
        assert_eq!(n.domain(), Some("localhost:5000"));
        assert_eq!(n.path(), "team/app");
        assert_eq!(n.tag().unwrap().as_str(), "v2");
        assert_eq!(n.digest().unwrap().to_string(), sha());
        assert_eq!(n.name(), "localhost:5000/team/app");
    }

    #[test]
    fn parse_does_not_default() {
        let n = named("library/busybox");
        assert_eq!(n.domain(), None);
        assert_eq!(n.to_string(), "library/busybox");
    }

    #[test]
    fn domain_heuristic_decides_the_split() {
        // No dot, colon or localhost: the first component is path.
        let n = named("myregistry/myimage");
        assert_eq!(n.domain(), None);
        assert_eq!(n.path(), "myregistry/myimage");

        let n = named("myregistry.local/myimage");
        assert_eq!(n.domain(), Some("myregistry.local"));
        assert_eq!(n.path(), "myimage");

        let n = named("localhost/myimage");
        assert_eq!(n.domain(), Some("localhost"));

        let n = named("registry:5000/myimage");
        assert_eq!(n.domain(), Some("registry:5000"));
    }

    #[test]
    fn ipv6_domain() {
        let n = named("[::1]:5000/app:dev");
        assert_eq!(n.domain(), Some("[::1]:5000"));
        assert_eq!(n.path(), "app");
        assert_eq!(n.tag().unwrap().as_str(), "dev");
    }

    #[test]
    fn uppercase_domain_is_allowed() {
        let n = named("Registry.Example.com/app");
        assert_eq!(n.domain(), Some("Registry.Example.com"));
    }

    #[test]
    fn reject_empty() {
        assert_eq!(parse(""), Err(ReferenceError::NameEmpty));
    }

    #[test]
    fn reject_uppercase_path() {
        assert_eq!(parse("Busybox"), Err(ReferenceError::NameContainsUppercase));
        assert_eq!(
            parse("docker.io/Library/busybox:latest"),
            Err(ReferenceError::NameContainsUppercase)
        );
        // Not a domain by the heuristic, so the uppercase lands in the path.
        assert_eq!(parse("MyRegistry/app"), Err(ReferenceError::NameContainsUppercase));
    }

    #[test]
    fn reject_invalid_names() {
        assert_eq!(parse("not a ref"), Err(ReferenceError::InvalidFormat));
        assert_eq!(parse("a//b"), Err(ReferenceError::InvalidFormat));
        assert_eq!(parse("-busybox"), Err(ReferenceError::InvalidFormat));
        assert_eq!(parse(":latest"), Err(ReferenceError::InvalidFormat));
        assert_eq!(parse("busybox:"), Err(ReferenceError::InvalidFormat));
        assert_eq!(parse("busybox@"), Err(ReferenceError::InvalidFormat));
        assert_eq!(parse("docker.io/"), Err(ReferenceError::InvalidFormat));
    }

    #[test]
    fn reject_long_name() {
        let long = format!("docker.io/{}", "a".repeat(250));
        assert_eq!(parse(&long), Err(ReferenceError::NameTooLong { max: 255 }));
        let fits = "a".repeat(255);
        assert!(parse(&fits).is_ok());
    }

    #[test]
    fn reject_bad_tag_and_digest() {
        let tag = "a".repeat(129);
        assert_eq!(parse(&format!("busybox:{tag}")), Err(ReferenceError::TagInvalidFormat));
        assert_eq!(parse("busybox:.bad"), Err(ReferenceError::TagInvalidFormat));
        assert_eq!(parse("busybox@sha256:abc"), Err(ReferenceError::DigestInvalidFormat));
        assert_eq!(
            parse(&format!("busybox@{}", sha().to_uppercase())),
            Err(ReferenceError::DigestInvalidFormat)
        );
    }

    #[test]
    fn with_name_validates() {
        let n = with_name("docker.io/library/busybox").unwrap();
        assert!(n.is_name_only());
        assert_eq!(with_name("Busybox"), Err(ReferenceError::InvalidFormat));
        assert_eq!(with_name("busybox:latest"), Err(ReferenceError::InvalidFormat));
        assert_eq!(with_name(&"a".repeat(256)), Err(ReferenceError::NameTooLong { max: 255 }));
    }

    #[test]
    fn with_tag_keeps_digest() {
        let n = named(&format!("busybox@{}", sha()));
        let tagged = with_tag(n, "stable").unwrap();
        assert!(matches!(tagged, Named::Canonical { .. }));
        assert_eq!(tagged.to_string(), format!("busybox:stable@{}", sha()));
    }

    #[test]
    fn with_tag_rejects_long_tag() {
        let n = with_name("busybox").unwrap();
        assert_eq!(with_tag(n, &"t".repeat(129)), Err(ReferenceError::TagInvalidFormat));
    }

    #[test]
    fn with_tag_replaces_tag() {
        let n = named("busybox:old");
        assert_eq!(with_tag(n, "new").unwrap().to_string(), "busybox:new");
    }

    #[test]
    fn with_digest_keeps_tag() {
        let n = named("busybox:latest");
        let canonical = with_digest(n, &sha()).unwrap();
        assert!(matches!(canonical, Named::Canonical { .. }));
        assert_eq!(
            with_digest(named("busybox"), "sha256:xyz"),
            Err(ReferenceError::DigestInvalidFormat)
        );
    }

    #[test]
    fn trim_drops_tag_and_digest() {
        let n = named(&format!("docker.io/library/busybox:latest@{}", sha()));
        let trimmed = trim_named(&n);
        assert!(trimmed.is_name_only());
        assert_eq!(trimmed.to_string(), "docker.io/library/busybox");
    }

    #[test]
    fn domain_and_path_accessors() {
        let n = named("busybox");
        assert_eq!(domain(&n), "docker.io");
        assert_eq!(path(&n), "busybox");

        let n = named("quay.io/coreos/etcd");
        assert_eq!(domain(&n), "quay.io");
        assert_eq!(path(&n), "coreos/etcd");
    }

    #[test]
    fn reference_accessors() {
        let r = Reference::Digest(Digest::parse(&sha()).unwrap());
        assert!(!r.is_named());
        assert!(r.tag().is_none());
        assert_eq!(r.digest().unwrap().to_string(), sha());
        assert_eq!(r.to_string(), sha());
    }

    #[test]
    fn from_str_impls() {
        let r: Reference = "busybox:latest".parse().unwrap();
        assert!(r.is_named());
        let n: Named = "docker.io/busybox".parse().unwrap();
        assert_eq!(n.path(), "busybox");
        assert!("BAD".parse::<Named>().is_err());
    }

    #[test]
    fn digest_only_detection() {
        assert!(parse_digest_only(&"f".repeat(64)).is_some());
        assert!(parse_digest_only(&sha()).is_some());
        assert!(parse_digest_only(&format!("custom:{}", "a".repeat(32))).is_none());
        assert!(parse_digest_only("busybox:latest").is_none());
    }

    fn reference_strategy() -> impl Strategy<Value = String> {
        let domain = prop::option::of("[a-z][a-z0-9]{0,6}\\.(com|io|local)(:[0-9]{1,5})?");
        let path = "[a-z0-9]{1,6}([._-][a-z0-9]{1,4})?(/[a-z0-9]{1,6}){0,2}";
        let tag = prop::option::of("[A-Za-z0-9_][A-Za-z0-9_.-]{0,20}");
        let digest = prop::option::of("[a-f0-9]{64}");
        (domain, path, tag, digest).prop_map(|(domain, path, tag, digest)| {
            let mut s = match domain {
                Some(domain) => format!("{domain}/{path}"),
                None => path,
            };
            if let Some(tag) = tag {
                s.push(':');
                s.push_str(&tag);
            }
            if let Some(digest) = digest {
                s.push_str("@sha256:");
                s.push_str(&digest);
            }
            s
        })
    }

    proptest! {
        #[test]
        fn parse_roundtrips(s in reference_strategy()) {
            let r = parse(&s).unwrap();
            prop_assert_eq!(r.to_string(), s.clone());
            prop_assert_eq!(parse(&r.to_string()).unwrap(), r);
        }
    }
}
