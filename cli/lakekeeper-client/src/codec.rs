//! Encoding and decoding of discriminated configuration variants.
//!
//! Storage profiles, storage credentials and delete profiles are each a closed
//! set of variants. On the wire a variant is a single JSON object holding one
//! or two discriminator keys next to the variant's own fields:
//!
//! ```json
//! { "type": "s3", "credential-type": "access-key", "aws-access-key-id": "..." }
//! ```
//!
//! Decoding reads the discriminators first and only then decodes the payload
//! into the concrete type they select.
//! Encoding serializes the concrete type with the discriminators flattened
//! into the same object.

use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use thiserror::Error;

pub const TYPE_KEY: &str = "type";
pub const CREDENTIAL_TYPE_KEY: &str = "credential-type";

/// The tags identifying a concrete variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Discriminator {
    #[serde(rename = "type")]
    pub kind: &'static str,
    #[serde(rename = "credential-type", skip_serializing_if = "Option::is_none")]
    pub subtype: Option<&'static str>,
}

impl Discriminator {
    pub const fn new(kind: &'static str) -> Self {
        Self {
            kind,
            subtype: None,
        }
    }

    pub const fn with_subtype(kind: &'static str, subtype: &'static str) -> Self {
        Self {
            kind,
            subtype: Some(subtype),
        }
    }
}

impl fmt::Display for Discriminator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.subtype {
            Some(subtype) => write!(f, "{}/{subtype}", self.kind),
            None => write!(f, "{}", self.kind),
        }
    }
}

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("{family} is not a JSON object")]
    NotAnObject { family: &'static str },
    #[error("missing discriminator '{key}' for {family}")]
    MissingDiscriminator {
        family: &'static str,
        key: &'static str,
    },
    #[error("unsupported {family} variant: {}", fmt_tags(.tags))]
    UnsupportedVariant {
        family: &'static str,
        tags: Vec<(&'static str, String)>,
    },
    #[error("invalid {family} '{discriminator}': {source}")]
    InvalidPayload {
        family: &'static str,
        discriminator: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to encode {family}")]
    Encode {
        family: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

fn fmt_tags(tags: &[(&'static str, String)]) -> String {
    tags.iter()
        .map(|(key, value)| format!("{key}={value:?}"))
        .collect::<Vec<_>>()
        .join(", ")
}

/// A closed family of configuration variants sharing a discriminator scheme.
pub trait ConfigVariant: Sized {
    /// Human readable family name used in error messages.
    const FAMILY: &'static str;
    /// Keys read, in order, to select the concrete variant.
    const DISCRIMINATOR_KEYS: &'static [&'static str];
    /// Every value the first discriminator key may take.
    const KINDS: &'static [&'static str];

    /// The tags this value is encoded with.
    fn discriminator(&self) -> Discriminator;

    /// Decode the full payload into the variant selected by `tags`.
    ///
    /// `tags` holds one value per [`Self::DISCRIMINATOR_KEYS`] entry.
    fn decode_variant(tags: &[&str], payload: Value) -> Result<Self, CodecError>;
}

/// Read the discriminator values of a payload without decoding the rest.
///
/// An unknown first tag is reported as unsupported even if later keys are
/// missing; a missing key is only reported for a known kind.
fn peek<'a, V: ConfigVariant>(payload: &'a Value) -> Result<Vec<&'a str>, CodecError> {
    let object = payload
        .as_object()
        .ok_or(CodecError::NotAnObject { family: V::FAMILY })?;
    let tags = V::DISCRIMINATOR_KEYS
        .iter()
        .map(|&key| object.get(key).and_then(Value::as_str))
        .collect::<Vec<_>>();

    let Some(missing) = tags.iter().position(Option::is_none) else {
        return Ok(tags.into_iter().flatten().collect());
    };

    let known_kind = tags
        .first()
        .copied()
        .flatten()
        .is_some_and(|kind| V::KINDS.iter().any(|known| *known == kind));
    if missing > 0 && !known_kind {
        return Err(CodecError::UnsupportedVariant {
            family: V::FAMILY,
            tags: V::DISCRIMINATOR_KEYS
                .iter()
                .copied()
                .zip(&tags)
                .filter_map(|(key, tag)| tag.map(|tag| (key, tag.to_string())))
                .collect(),
        });
    }
    Err(CodecError::MissingDiscriminator {
        family: V::FAMILY,
        key: V::DISCRIMINATOR_KEYS[missing],
    })
}

/// Decode a configuration variant from a JSON value.
pub fn decode<V: ConfigVariant>(payload: Value) -> Result<V, CodecError> {
    let tags = peek::<V>(&payload)?;
    let tags = tags.into_iter().map(str::to_owned).collect::<Vec<_>>();
    let tags = tags.iter().map(String::as_str).collect::<Vec<_>>();
    V::decode_variant(&tags, payload)
}

/// Decode a configuration variant from JSON text.
pub fn decode_str<V: ConfigVariant>(json: &str) -> Result<V, CodecError> {
    let payload = serde_json::from_str(json).map_err(|source| CodecError::InvalidPayload {
        family: V::FAMILY,
        discriminator: String::new(),
        source,
    })?;
    decode(payload)
}

/// Encode a configuration variant into a JSON value.
pub fn encode<V: ConfigVariant + Serialize>(variant: &V) -> Result<Value, CodecError> {
    serde_json::to_value(variant).map_err(|source| CodecError::Encode {
        family: V::FAMILY,
        source,
    })
}

/// Build the error for a tag combination no variant claims.
pub(crate) fn unsupported<V: ConfigVariant>(tags: &[&str]) -> CodecError {
    CodecError::UnsupportedVariant {
        family: V::FAMILY,
        tags: V::DISCRIMINATOR_KEYS
            .iter()
            .copied()
            .zip(tags.iter().map(|tag| tag.to_string()))
            .collect(),
    }
}

/// Decode the fields of the concrete variant `T` selected for `V`.
///
/// The discriminator keys are left in the payload; variant types ignore them.
pub(crate) fn decode_fields<V: ConfigVariant, T: DeserializeOwned>(
    tags: &[&str],
    payload: Value,
) -> Result<T, CodecError> {
    serde_json::from_value(payload).map_err(|source| CodecError::InvalidPayload {
        family: V::FAMILY,
        discriminator: tags.join("/"),
        source,
    })
}

/// Serialize `fields` with `discriminator` injected into the same object.
pub(crate) fn serialize_tagged<S, T>(
    serializer: S,
    discriminator: Discriminator,
    fields: &T,
) -> Result<S::Ok, S::Error>
where
    S: Serializer,
    T: Serialize,
{
    #[derive(Serialize)]
    struct Tagged<'a, T> {
        #[serde(flatten)]
        discriminator: Discriminator,
        #[serde(flatten)]
        fields: &'a T,
    }

    Tagged {
        discriminator,
        fields,
    }
    .serialize(serializer)
}

/// Shared `Deserialize` implementation for configuration variants.
pub(crate) fn deserialize_variant<'de, D, V>(deserializer: D) -> Result<V, D::Error>
where
    D: Deserializer<'de>,
    V: ConfigVariant,
{
    let payload = Value::deserialize(deserializer)?;
    decode(payload).map_err(serde::de::Error::custom)
}

/// Implements `Serialize` and `Deserialize` for a [`ConfigVariant`] family.
///
/// Each arm maps a variant to the value serialized next to its
/// discriminator.
macro_rules! config_variant_serde {
    ($family:ty { $($variant:ident($fields:ident)),+ $(,)? }) => {
        impl ::serde::Serialize for $family {
            fn serialize<S: ::serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                let discriminator = $crate::codec::ConfigVariant::discriminator(self);
                match self {
                    $(Self::$variant($fields) => {
                        $crate::codec::serialize_tagged(serializer, discriminator, $fields)
                    },)+
                }
            }
        }

        impl<'de> ::serde::Deserialize<'de> for $family {
            fn deserialize<D: ::serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                $crate::codec::deserialize_variant(deserializer)
            }
        }
    };
}

pub(crate) use config_variant_serde;

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Circle {
        radius: u32,
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Square {
        side: u32,
    }

    #[derive(Debug, Clone, PartialEq)]
    enum Shape {
        Circle(Circle),
        Square(Square),
    }

    impl ConfigVariant for Shape {
        const DISCRIMINATOR_KEYS: &'static [&'static str] = &[TYPE_KEY];
        const FAMILY: &'static str = "shape";
        const KINDS: &'static [&'static str] = &["circle", "square"];

        fn discriminator(&self) -> Discriminator {
            match self {
                Shape::Circle(_) => Discriminator::new("circle"),
                Shape::Square(_) => Discriminator::new("square"),
            }
        }

        fn decode_variant(tags: &[&str], payload: Value) -> Result<Self, CodecError> {
            match tags {
                ["circle"] => decode_fields::<Self, _>(tags, payload).map(Shape::Circle),
                ["square"] => decode_fields::<Self, _>(tags, payload).map(Shape::Square),
                _ => Err(unsupported::<Self>(tags)),
            }
        }
    }

    config_variant_serde!(Shape {
        Circle(fields),
        Square(fields),
    });

    #[test]
    fn discriminator_is_flattened_next_to_fields() {
        let encoded = encode(&Shape::Circle(Circle { radius: 3 })).unwrap();
        assert_eq!(encoded, json!({"type": "circle", "radius": 3}));
    }

    #[test]
    fn discriminator_is_serialized_first() {
        let encoded = serde_json::to_string(&Shape::Square(Square { side: 2 })).unwrap();
        assert_eq!(encoded, r#"{"type":"square","side":2}"#);
    }

    #[test]
    fn decode_dispatches_on_tag() {
        let decoded: Shape = decode(json!({"type": "square", "side": 4})).unwrap();
        assert_eq!(decoded, Shape::Square(Square { side: 4 }));
    }

    #[test]
    fn unknown_tag_is_named_in_error() {
        let err = decode::<Shape>(json!({"type": "triangle"})).unwrap_err();
        assert!(matches!(err, CodecError::UnsupportedVariant { .. }));
        assert_eq!(err.to_string(), r#"unsupported shape variant: type="triangle""#);
    }

    #[test]
    fn missing_tag_is_reported() {
        let err = decode::<Shape>(json!({"radius": 1})).unwrap_err();
        assert_eq!(err.to_string(), "missing discriminator 'type' for shape");
    }

    #[test]
    fn non_string_tag_is_missing() {
        let err = decode::<Shape>(json!({"type": 7})).unwrap_err();
        assert!(matches!(err, CodecError::MissingDiscriminator { .. }));
    }

    #[test]
    fn non_object_is_rejected() {
        let err = decode::<Shape>(json!(["circle"])).unwrap_err();
        assert!(matches!(err, CodecError::NotAnObject { .. }));
    }

    #[test]
    fn invalid_fields_name_the_variant() {
        let err = decode::<Shape>(json!({"type": "circle", "radius": "big"})).unwrap_err();
        assert!(
            err.to_string().starts_with("invalid shape 'circle'"),
            "{err}"
        );
    }

    #[test]
    fn serde_deserialize_surfaces_codec_message() {
        let err = serde_json::from_str::<Shape>(r#"{"type":"hexagon"}"#).unwrap_err();
        assert!(err.to_string().contains(r#"type="hexagon""#), "{err}");
    }
}
