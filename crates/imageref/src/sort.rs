//! Ordering reference strings by how much they say about an image.

use tracing::debug;

use crate::normalize::Normalizer;
use crate::reference::{self, Named, Reference};

/// Precedence class of a reference string, most informative first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Rank {
    /// Name, tag and digest.
    TaggedDigested,
    /// Name and tag.
    Tagged,
    /// Name and digest.
    Digested,
    /// Name only.
    NameOnly,
    /// Digest without a name.
    DigestOnly,
    /// Not a reference at all.
    Unparsable,
}

impl Rank {
    /// The rank of an already parsed reference.
    pub fn of(reference: &Reference) -> Self {
        match reference {
            Reference::Named(Named::Canonical { .. }) => Self::TaggedDigested,
            Reference::Named(Named::Tagged { .. }) => Self::Tagged,
            Reference::Named(Named::Digested { .. }) => Self::Digested,
            Reference::Named(Named::Bare(_)) => Self::NameOnly,
            Reference::Digest(_) => Self::DigestOnly,
        }
    }
}

impl Normalizer {
    /// Classify a reference string without normalizing it.
    ///
    /// Bare identifiers and registered digests are digest-only; anything
    /// else goes through the strict parser.
    pub fn rank(&self, s: &str) -> Rank {
        if reference::parse_digest_only(s).is_some() {
            return Rank::DigestOnly;
        }
        self.parse(s).map_or(Rank::Unparsable, |r| Rank::of(&r))
    }

    /// Sort reference strings, most informative first.
    ///
    /// The sort is stable: strings of equal rank, including unparsable ones,
    /// keep their input order. The strings themselves are returned untouched.
    pub fn sort<I, S>(&self, references: I) -> Vec<S>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut ranked: Vec<(Rank, S)> = references
            .into_iter()
            .map(|s| (self.rank(s.as_ref()), s))
            .collect();
        ranked.sort_by_key(|(rank, _)| *rank);
        let unparsable = ranked.iter().filter(|(rank, _)| *rank == Rank::Unparsable).count();
        debug!(total = ranked.len(), unparsable, "sorted references");
        ranked.into_iter().map(|(_, s)| s).collect()
    }
}

/// [`Normalizer::sort`] with Docker defaults.
///
/// ```
/// let sorted = imageref::sort(["busybox", "busybox:latest", "not a ref"]);
/// assert_eq!(sorted, ["busybox:latest", "busybox", "not a ref"]);
/// ```
pub fn sort<I, S>(references: I) -> Vec<S>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    Normalizer::docker().sort(references)
}
