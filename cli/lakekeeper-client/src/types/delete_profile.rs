//! Delete profiles: what happens to dropped tables and views.

use derive_more::From;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::codec::{
    CodecError,
    ConfigVariant,
    Discriminator,
    TYPE_KEY,
    config_variant_serde,
    decode_fields,
    unsupported,
};

#[derive(Debug, Clone, PartialEq, From)]
#[cfg_attr(test, derive(proptest_derive::Arbitrary))]
pub enum DeleteProfile {
    /// Purge immediately.
    Hard(HardDeleteProfile),
    /// Keep for a grace period before purging.
    Soft(SoftDeleteProfile),
}

impl DeleteProfile {
    pub fn hard() -> Self {
        DeleteProfile::Hard(HardDeleteProfile::default())
    }

    pub fn soft(expiration_seconds: i32) -> Self {
        DeleteProfile::Soft(SoftDeleteProfile { expiration_seconds })
    }

    pub fn as_hard(&self) -> Option<&HardDeleteProfile> {
        match self {
            DeleteProfile::Hard(profile) => Some(profile),
            _ => None,
        }
    }

    pub fn as_soft(&self) -> Option<&SoftDeleteProfile> {
        match self {
            DeleteProfile::Soft(profile) => Some(profile),
            _ => None,
        }
    }
}

impl Default for DeleteProfile {
    fn default() -> Self {
        DeleteProfile::hard()
    }
}

impl ConfigVariant for DeleteProfile {
    const DISCRIMINATOR_KEYS: &'static [&'static str] = &[TYPE_KEY];
    const FAMILY: &'static str = "delete profile";
    const KINDS: &'static [&'static str] = &["hard", "soft"];

    fn discriminator(&self) -> Discriminator {
        match self {
            DeleteProfile::Hard(_) => Discriminator::new("hard"),
            DeleteProfile::Soft(_) => Discriminator::new("soft"),
        }
    }

    fn decode_variant(tags: &[&str], payload: Value) -> Result<Self, CodecError> {
        match tags {
            ["hard"] => decode_fields::<Self, _>(tags, payload).map(DeleteProfile::Hard),
            ["soft"] => decode_fields::<Self, _>(tags, payload).map(DeleteProfile::Soft),
            _ => Err(unsupported::<Self>(tags)),
        }
    }
}

config_variant_serde!(DeleteProfile {
    Hard(profile),
    Soft(profile),
});

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(test, derive(proptest_derive::Arbitrary))]
pub struct HardDeleteProfile {}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(test, derive(proptest_derive::Arbitrary))]
#[serde(rename_all = "kebab-case")]
pub struct SoftDeleteProfile {
    pub expiration_seconds: i32,
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use serde_json::json;

    use super::*;
    use crate::codec::{decode, decode_str, encode};

    #[test]
    fn hard_encodes_only_type() {
        assert_eq!(
            serde_json::to_string(&DeleteProfile::hard()).unwrap(),
            r#"{"type":"hard"}"#
        );
    }

    #[test]
    fn soft_encodes_expiration() {
        assert_eq!(
            encode(&DeleteProfile::soft(86400)).unwrap(),
            json!({"type": "soft", "expiration-seconds": 86400})
        );
    }

    #[test]
    fn soft_requires_expiration() {
        let err = decode::<DeleteProfile>(json!({"type": "soft"})).unwrap_err();
        assert!(matches!(err, CodecError::InvalidPayload { .. }), "{err}");
    }

    #[test]
    fn soft_decodes_from_text() {
        let profile: DeleteProfile =
            decode_str(r#"{"type":"soft","expiration-seconds":3600}"#).unwrap();
        assert_eq!(profile.as_soft().map(|p| p.expiration_seconds), Some(3600));
        assert!(profile.as_hard().is_none());
    }

    #[test]
    fn unknown_type_names_the_tag() {
        let err = decode::<DeleteProfile>(json!({"type": "unknown"})).unwrap_err();
        assert_eq!(
            err.to_string(),
            r#"unsupported delete profile variant: type="unknown""#
        );
    }

    proptest! {
        #[test]
        fn delete_profile_round_trips(profile: DeleteProfile) {
            let decoded: DeleteProfile = decode(encode(&profile).unwrap()).unwrap();
            prop_assert_eq!(decoded, profile);
        }
    }
}
