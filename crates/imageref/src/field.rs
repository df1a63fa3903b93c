//! Serializing references as plain strings.

use std::fmt;

use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};

use crate::reference::{self, Reference};

/// A [`Reference`] that serializes as its string form.
///
/// Deserializing re-parses the string, so the concrete variant (bare,
/// tagged, digested, canonical, or digest-only) survives a round trip.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Field(Reference);

impl Field {
    pub fn new(reference: Reference) -> Self {
        Self(reference)
    }

    pub fn reference(&self) -> &Reference {
        &self.0
    }

    pub fn into_reference(self) -> Reference {
        self.0
    }
}

/// Wrap `reference` for serialization.
pub fn as_field(reference: Reference) -> Field {
    Field(reference)
}

impl From<Reference> for Field {
    fn from(reference: Reference) -> Self {
        Self(reference)
    }
}

impl Serialize for Field {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&self.0)
    }
}

struct FieldVisitor;

impl<'de> Visitor<'de> for FieldVisitor {
    type Value = Field;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an image reference string")
    }

    fn visit_str<E: de::Error>(self, s: &str) -> Result<Field, E> {
        if let Some(digest) = reference::parse_digest_only(s) {
            return Ok(Field(Reference::Digest(digest)));
        }
        reference::parse(s).map(Field).map_err(E::custom)
    }
}

impl<'de> Deserialize<'de> for Field {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_str(FieldVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference::Named;

    const HEX: &str = "7cc4b5aefd1d0cadf8d97d4350462ba51c694ebca145b08d7d41b41acc8db5aa";

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Manifest {
        image: Field,
        base: Option<Field>,
    }

    #[test]
    fn serializes_as_string() {
        let field = as_field(reference::parse("quay.io/org/app:v1").unwrap());
        let json = serde_json::to_string(&field).unwrap();
        assert_eq!(json, "\"quay.io/org/app:v1\"");
    }

    #[test]
    fn variant_survives_roundtrip() {
        let inputs = [
            "busybox".to_string(),
            "busybox:latest".to_string(),
            format!("busybox@sha256:{HEX}"),
            format!("busybox:latest@sha256:{HEX}"),
            format!("sha256:{HEX}"),
        ];
        for input in inputs {
            let json = format!("\"{input}\"");
            let field: Field = serde_json::from_str(&json).unwrap();
            assert_eq!(field.reference().to_string(), input);
            assert_eq!(serde_json::to_string(&field).unwrap(), json);
        }

        let json = format!("\"busybox:latest@sha256:{HEX}\"");
        let field: Field = serde_json::from_str(&json).unwrap();
        assert!(matches!(field.into_reference(), Reference::Named(Named::Canonical { .. })));
        let field: Field = serde_json::from_str(&format!("\"sha256:{HEX}\"")).unwrap();
        assert!(matches!(field.reference(), Reference::Digest(_)));
    }

    #[test]
    fn nested_in_struct() {
        let manifest = Manifest {
            image: Field::new(reference::parse("docker.io/library/busybox:1.36").unwrap()),
            base: None,
        };
        let json = serde_json::to_string(&manifest).unwrap();
        let parsed: Manifest = serde_json::from_str(&json).unwrap();
        assert_eq!(manifest, parsed);
    }

    #[test]
    fn rejects_invalid_reference() {
        let err = serde_json::from_str::<Field>("\"Not A Ref\"").unwrap_err();
        assert!(err.to_string().contains("invalid reference format"));
        assert!(serde_json::from_str::<Field>("42").is_err());
    }
}
