//! Character-level scanner for the reference grammar.
//!
//! ```text
//! reference        := name [ ":" tag ] [ "@" digest ]
//! name             := [domain '/'] path
//! domain           := host [':' port-number]
//! host             := domain-name | '[' IPv6address ']'
//! domain-name      := domain-component ['.' domain-component]*
//! domain-component := /([a-zA-Z0-9]|[a-zA-Z0-9][a-zA-Z0-9-]*[a-zA-Z0-9])/
//! port-number      := /[0-9]+/
//! path             := path-component ['/' path-component]*
//! path-component   := alpha-numeric [separator alpha-numeric]*
//! alpha-numeric    := /[a-z0-9]+/
//! separator        := /[_.]|__|[-]+/
//! tag              := /[\w][\w.-]{0,127}/
//! digest           := algorithm ":" hex
//! algorithm        := component [ /[+._-]/ component ]*
//! component        := /[A-Za-z][A-Za-z0-9]*/
//! hex              := /[0-9a-f]{32,}/
//! identifier       := /[a-f0-9]{64}/
//! ```
//!
//! Every predicate here is total: it inspects the input and answers yes or
//! no without allocating. Deciding which error to report is left to the
//! parser.

/// Maximum length of a tag.
pub const TAG_MAX_LEN: usize = 128;

/// Minimum number of hex characters in a digest.
pub const DIGEST_HEX_MIN_LEN: usize = 32;

/// Length of a bare content identifier.
pub const IDENTIFIER_LEN: usize = 64;

/// The only dot-free, colon-free host accepted as a domain.
const LOCALHOST: &str = "localhost";

fn is_lower_alnum(b: u8) -> bool {
    b.is_ascii_lowercase() || b.is_ascii_digit()
}

fn is_word(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

fn is_lower_hex(b: u8) -> bool {
    b.is_ascii_digit() || (b'a'..=b'f').contains(&b)
}

/// A single path component: lowercase alphanumeric runs joined by `.`, `_`,
/// `__`, or one or more `-`.
pub fn is_path_component(s: &str) -> bool {
    let b = s.as_bytes();
    let mut i = 0;
    loop {
        let start = i;
        while i < b.len() && is_lower_alnum(b[i]) {
            i += 1;
        }
        if i == start {
            return false;
        }
        if i == b.len() {
            return true;
        }
        match b[i] {
            b'.' => i += 1,
            b'_' => {
                i += 1;
                if i < b.len() && b[i] == b'_' {
                    i += 1;
                }
            }
            b'-' => {
                while i < b.len() && b[i] == b'-' {
                    i += 1;
                }
            }
            _ => return false,
        }
    }
}

/// One or more `/`-separated path components.
pub fn is_path(s: &str) -> bool {
    s.split('/').all(is_path_component)
}

/// A single dot-free domain component.
pub fn is_domain_component(s: &str) -> bool {
    let b = s.as_bytes();
    match (b.first(), b.last()) {
        (Some(first), Some(last)) => {
            first.is_ascii_alphanumeric()
                && last.is_ascii_alphanumeric()
                && b.iter().all(|c| c.is_ascii_alphanumeric() || *c == b'-')
        }
        _ => false,
    }
}

fn is_ipv6_literal(s: &str) -> bool {
    match s.strip_prefix('[').and_then(|rest| rest.strip_suffix(']')) {
        Some(inner) => {
            !inner.is_empty() && inner.bytes().all(|b| b.is_ascii_hexdigit() || b == b':')
        }
        None => false,
    }
}

fn is_port(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

/// A registry host, optionally followed by `:port`.
pub fn is_domain(s: &str) -> bool {
    let (host, port) = if s.starts_with('[') {
        match s.find(']') {
            Some(end) => s.split_at(end + 1),
            None => return false,
        }
    } else {
        match s.find(':') {
            Some(colon) => s.split_at(colon),
            None => (s, ""),
        }
    };

    let host_ok = if host.starts_with('[') {
        is_ipv6_literal(host)
    } else {
        host.split('.').all(is_domain_component)
    };
    let port_ok = port.is_empty() || port.strip_prefix(':').is_some_and(is_port);

    host_ok && port_ok
}

/// Heuristic deciding whether the first `/`-component of a name names a
/// registry: it must contain `.` or `:`, or be exactly `localhost`.
pub fn looks_like_domain(component: &str) -> bool {
    component.contains(['.', ':']) || component == LOCALHOST
}

/// `[\w][\w.-]{0,127}`.
pub fn is_tag(s: &str) -> bool {
    let b = s.as_bytes();
    match b.split_first() {
        Some((first, rest)) => {
            b.len() <= TAG_MAX_LEN
                && is_word(*first)
                && rest.iter().all(|c| is_word(*c) || *c == b'.' || *c == b'-')
        }
        None => false,
    }
}

/// A digest algorithm such as `sha256` or `multihash+base58`.
pub fn is_digest_algorithm(s: &str) -> bool {
    let b = s.as_bytes();
    let mut i = 0;
    loop {
        if i >= b.len() || !b[i].is_ascii_alphabetic() {
            return false;
        }
        while i < b.len() && b[i].is_ascii_alphanumeric() {
            i += 1;
        }
        if i == b.len() {
            return true;
        }
        match b[i] {
            b'+' | b'.' | b'-' | b'_' => i += 1,
            _ => return false,
        }
    }
}

/// At least 32 lowercase hex characters.
pub fn is_digest_hex(s: &str) -> bool {
    s.len() >= DIGEST_HEX_MIN_LEN && s.bytes().all(is_lower_hex)
}

/// A bare 64-character lowercase hex content identifier.
pub fn is_identifier(s: &str) -> bool {
    s.len() == IDENTIFIER_LEN && s.bytes().all(is_lower_hex)
}

/// The three textual parts of a reference, before validation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Parts<'a> {
    /// Everything before the tag or digest: `[domain/]path`.
    pub name: &'a str,
    /// Text after the tag separator, if one was present.
    pub tag: Option<&'a str>,
    /// Text after `@`, if one was present.
    pub digest: Option<&'a str>,
}

/// Split a reference into name, tag and digest without validating any of
/// them.
///
/// The digest starts at the first `@`. The tag starts at the last `:` that
/// follows the last `/` of what remains, so a registry port is never taken
/// for a tag.
pub fn split_reference(s: &str) -> Parts<'_> {
    let (rest, digest) = match s.split_once('@') {
        Some((rest, digest)) => (rest, Some(digest)),
        None => (s, None),
    };
    let last_component = rest.rfind('/').map_or(0, |i| i + 1);
    match rest[last_component..].rfind(':') {
        Some(colon) => {
            let at = last_component + colon;
            Parts {
                name: &rest[..at],
                tag: Some(&rest[at + 1..]),
                digest,
            }
        }
        None => Parts {
            name: rest,
            tag: None,
            digest,
        },
    }
}

/// Split a full name into an optional domain and a path.
///
/// The first component is a domain only if it passes [`looks_like_domain`]
/// and is a well-formed domain; otherwise the whole name is the path.
pub fn split_domain(name: &str) -> (Option<&str>, &str) {
    match name.split_once('/') {
        Some((first, rest)) if looks_like_domain(first) && is_domain(first) => {
            (Some(first), rest)
        }
        _ => (None, name),
    }
}

/// Returns `true` if `name` is a well-formed `[domain/]path`.
pub fn is_name(name: &str) -> bool {
    let (_, path) = split_domain(name);
    is_path(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_component_separators() {
        assert!(is_path_component("busybox"));
        assert!(is_path_component("a.b"));
        assert!(is_path_component("a_b"));
        assert!(is_path_component("a__b"));
        assert!(is_path_component("a-b"));
        assert!(is_path_component("a---b"));
        assert!(is_path_component("a.b_c-d"));
    }

    #[test]
    fn path_component_rejects_bad_separators() {
        assert!(!is_path_component(""));
        assert!(!is_path_component("a___b"));
        assert!(!is_path_component("a..b"));
        assert!(!is_path_component("-a"));
        assert!(!is_path_component("a-"));
        assert!(!is_path_component("a_"));
        assert!(!is_path_component(".a"));
        assert!(!is_path_component("a._b"));
    }

    #[test]
    fn path_component_rejects_uppercase() {
        assert!(!is_path_component("Busybox"));
        assert!(!is_path_component("busyBox"));
    }

    #[test]
    fn path_requires_non_empty_components() {
        assert!(is_path("library/busybox"));
        assert!(is_path("a/b/c/d"));
        assert!(!is_path("a//b"));
        assert!(!is_path("/a"));
        assert!(!is_path("a/"));
    }

    #[test]
    fn domains() {
        assert!(is_domain("docker.io"));
        assert!(is_domain("localhost"));
        assert!(is_domain("localhost:5000"));
        assert!(is_domain("Registry.Example.COM"));
        assert!(is_domain("192.168.1.1:443"));
        assert!(is_domain("my-registry.local"));
        assert!(is_domain("[::1]"));
        assert!(is_domain("[fe80::1:2]:5000"));
    }

    #[test]
    fn rejected_domains() {
        assert!(!is_domain(""));
        assert!(!is_domain("-docker.io"));
        assert!(!is_domain("docker-.io"));
        assert!(!is_domain("docker..io"));
        assert!(!is_domain("docker_io.com"));
        assert!(!is_domain("localhost:"));
        assert!(!is_domain("localhost:50a"));
        assert!(!is_domain("[]"));
        assert!(!is_domain("[::1"));
        assert!(!is_domain("[::g]"));
        assert!(!is_domain("[::1]5000"));
    }

    #[test]
    fn domain_heuristic() {
        assert!(looks_like_domain("docker.io"));
        assert!(looks_like_domain("localhost"));
        assert!(looks_like_domain("host:5000"));
        assert!(!looks_like_domain("myregistry"));
        assert!(!looks_like_domain("library"));
        assert!(!looks_like_domain("Localhost"));
    }

    #[test]
    fn tags() {
        assert!(is_tag("latest"));
        assert!(is_tag("v1.2.3-rc.1"));
        assert!(is_tag("_private"));
        assert!(is_tag("UPPER"));
        assert!(is_tag(&"a".repeat(128)));
        assert!(!is_tag(""));
        assert!(!is_tag(".hidden"));
        assert!(!is_tag("-dash"));
        assert!(!is_tag("a+b"));
        assert!(!is_tag(&"a".repeat(129)));
    }

    #[test]
    fn digest_algorithms() {
        assert!(is_digest_algorithm("sha256"));
        assert!(is_digest_algorithm("multihash+base58"));
        assert!(is_digest_algorithm("sha256.v2"));
        assert!(is_digest_algorithm("Tarsum_v1-sha256"));
        assert!(!is_digest_algorithm(""));
        assert!(!is_digest_algorithm("256sha"));
        assert!(!is_digest_algorithm("sha256+"));
        assert!(!is_digest_algorithm("sha+256"));
        assert!(!is_digest_algorithm("sha256:"));
    }

    #[test]
    fn digest_hex_length_and_case() {
        assert!(is_digest_hex(&"a".repeat(32)));
        assert!(!is_digest_hex(&"a".repeat(31)));
        assert!(!is_digest_hex(&"A".repeat(32)));
        assert!(!is_digest_hex(&"g".repeat(32)));
    }

    #[test]
    fn identifiers() {
        assert!(is_identifier(&"0123456789abcdef".repeat(4)));
        assert!(!is_identifier(&"0123456789abcdef".repeat(3)));
        assert!(!is_identifier(&"0123456789ABCDEF".repeat(4)));
    }

    #[test]
    fn split_plain_name() {
        let parts = split_reference("busybox");
        assert_eq!(parts.name, "busybox");
        assert_eq!(parts.tag, None);
        assert_eq!(parts.digest, None);
    }

    #[test]
    fn split_port_is_not_a_tag() {
        let parts = split_reference("localhost:5000/app");
        assert_eq!(parts.name, "localhost:5000/app");
        assert_eq!(parts.tag, None);

        let parts = split_reference("localhost:5000/app:v1@sha256:abc");
        assert_eq!(parts.name, "localhost:5000/app");
        assert_eq!(parts.tag, Some("v1"));
        assert_eq!(parts.digest, Some("sha256:abc"));
    }

    #[test]
    fn split_without_slash_takes_last_colon() {
        let parts = split_reference("localhost:5000");
        assert_eq!(parts.name, "localhost");
        assert_eq!(parts.tag, Some("5000"));
    }

    #[test]
    fn split_domain_heuristic() {
        assert_eq!(
            split_domain("docker.io/library/busybox"),
            (Some("docker.io"), "library/busybox")
        );
        assert_eq!(split_domain("localhost/app"), (Some("localhost"), "app"));
        assert_eq!(split_domain("myregistry/myimage"), (None, "myregistry/myimage"));
        assert_eq!(split_domain("busybox"), (None, "busybox"));
        // Domain-looking but malformed: the whole name is a path.
        assert_eq!(split_domain("bad_host.com/app"), (None, "bad_host.com/app"));
    }
}
