//! Parsing and normalization of container image references.
//!
//! An image reference names content in a registry by repository, tag and/or
//! digest, e.g. `docker.io/library/busybox:latest@sha256:...`. This crate
//! parses such strings against the reference grammar, and provides the
//! Docker-style transforms built on top of the parsed form.
//!
//! # Modules
//!
//! - [`grammar`]: Character-level predicates for each grammar production
//! - [`digest`]: The validated [`Digest`] type
//! - [`reference`]: [`Reference`], [`Named`] and the strict [`parse`]
//! - [`normalize`]: [`Normalizer`] and Docker-style defaulting
//! - [`familiar`]: Shortest familiar rendering and glob matching
//! - [`sort`]: Precedence sorting of reference strings
//! - [`field`]: [`Field`], a serde wrapper for references
//! - [`config`]: [`ReferenceConfig`] and the Docker defaults
//! - [`error`]: [`ReferenceError`]
//!
//! # Example
//!
//! ```
//! use imageref::{familiar_string, parse_docker_ref, Reference};
//!
//! let named = parse_docker_ref("busybox").unwrap();
//! assert_eq!(named.to_string(), "docker.io/library/busybox:latest");
//! assert_eq!(familiar_string(&Reference::Named(named)), "busybox:latest");
//! ```

pub mod config;
pub mod digest;
pub mod error;
pub mod familiar;
pub mod field;
pub mod grammar;
pub mod normalize;
pub mod reference;
pub mod sort;

pub use config::{ReferenceConfig, NAME_TOTAL_LENGTH_MAX};
pub use digest::Digest;
pub use error::{ReferenceError, Result};
pub use familiar::{familiar_match, familiar_name, familiar_string};
pub use field::{as_field, Field};
pub use normalize::{
    is_name_only, parse_any_reference, parse_docker_ref, parse_normalized_named, tag_name_only,
    Normalizer,
};
pub use reference::{
    domain, parse, parse_named, path, trim_named, with_digest, with_name, with_tag, Named,
    Reference, Repository, Tag,
};
pub use sort::{sort, Rank};
