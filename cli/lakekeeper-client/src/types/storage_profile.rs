//! Storage profiles: where a warehouse keeps its data.

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

pub const DEFAULT_STS_TOKEN_VALIDITY_SECONDS: i64 = 3600;

/// The non-secret description of a warehouse location.
#[derive(Debug, Clone, PartialEq, From)]
#[cfg_attr(test, derive(proptest_derive::Arbitrary))]
pub enum StorageProfile {
    S3(S3StorageProfile),
    Gcs(GcsStorageProfile),
    Adls(AdlsStorageProfile),
}

impl StorageProfile {
    pub fn as_s3(&self) -> Option<&S3StorageProfile> {
        match self {
            StorageProfile::S3(profile) => Some(profile),
            _ => None,
        }
    }

    pub fn as_gcs(&self) -> Option<&GcsStorageProfile> {
        match self {
            StorageProfile::Gcs(profile) => Some(profile),
            _ => None,
        }
    }

    pub fn as_adls(&self) -> Option<&AdlsStorageProfile> {
        match self {
            StorageProfile::Adls(profile) => Some(profile),
            _ => None,
        }
    }
}

impl ConfigVariant for StorageProfile {
    const DISCRIMINATOR_KEYS: &'static [&'static str] = &[TYPE_KEY];
    const FAMILY: &'static str = "storage profile";
    const KINDS: &'static [&'static str] = &["s3", "gcs", "adls"];

    fn discriminator(&self) -> Discriminator {
        match self {
            StorageProfile::S3(_) => Discriminator::new("s3"),
            StorageProfile::Gcs(_) => Discriminator::new("gcs"),
            StorageProfile::Adls(_) => Discriminator::new("adls"),
        }
    }

    fn decode_variant(tags: &[&str], payload: Value) -> Result<Self, CodecError> {
        match tags {
            ["s3"] => decode_fields::<Self, _>(tags, payload).map(StorageProfile::S3),
            ["gcs"] => decode_fields::<Self, _>(tags, payload).map(StorageProfile::Gcs),
            ["adls"] => decode_fields::<Self, _>(tags, payload).map(StorageProfile::Adls),
            _ => Err(unsupported::<Self>(tags)),
        }
    }
}

config_variant_serde!(StorageProfile {
    S3(profile),
    Gcs(profile),
    Adls(profile),
});

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(test, derive(proptest_derive::Arbitrary))]
#[serde(rename_all = "kebab-case")]
pub enum S3Flavor {
    #[default]
    Aws,
    S3Compat,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(test, derive(proptest_derive::Arbitrary))]
#[serde(rename_all = "kebab-case")]
pub enum RemoteSigningUrlStyle {
    Path,
    VirtualHost,
    #[default]
    Auto,
}

/// An S3 or S3-compatible bucket.
///
/// Construct with [`S3StorageProfile::new`], which applies the defaults, and
/// override individual settings with the `with_*` methods.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(test, derive(proptest_derive::Arbitrary))]
#[serde(rename_all = "kebab-case")]
pub struct S3StorageProfile {
    pub bucket: String,
    pub region: String,
    pub sts_enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub flavor: S3Flavor,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_prefix: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path_style_access: Option<bool>,
    #[serde(default = "default_true")]
    pub push_s3_delete_disabled: bool,
    #[serde(default)]
    pub remote_signing_url_style: RemoteSigningUrlStyle,
    #[serde(default = "default_sts_token_validity_seconds")]
    pub sts_token_validity_seconds: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assume_role_arn: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sts_role_arn: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aws_kms_key_arn: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allow_alternative_protocols: Option<bool>,
}

fn default_true() -> bool {
    true
}

fn default_sts_token_validity_seconds() -> i64 {
    DEFAULT_STS_TOKEN_VALIDITY_SECONDS
}

impl S3StorageProfile {
    pub fn new(bucket: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            region: region.into(),
            sts_enabled: false,
            endpoint: None,
            flavor: S3Flavor::Aws,
            key_prefix: None,
            path_style_access: None,
            push_s3_delete_disabled: true,
            remote_signing_url_style: RemoteSigningUrlStyle::Auto,
            sts_token_validity_seconds: DEFAULT_STS_TOKEN_VALIDITY_SECONDS,
            assume_role_arn: None,
            sts_role_arn: None,
            aws_kms_key_arn: None,
            allow_alternative_protocols: None,
        }
    }

    pub fn with_sts_enabled(mut self, enabled: bool) -> Self {
        self.sts_enabled = enabled;
        self
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    pub fn with_flavor(mut self, flavor: S3Flavor) -> Self {
        self.flavor = flavor;
        self
    }

    pub fn with_key_prefix(mut self, key_prefix: impl Into<String>) -> Self {
        self.key_prefix = Some(key_prefix.into());
        self
    }

    pub fn with_path_style_access(mut self, enabled: bool) -> Self {
        self.path_style_access = Some(enabled);
        self
    }

    pub fn with_push_s3_delete_disabled(mut self, disabled: bool) -> Self {
        self.push_s3_delete_disabled = disabled;
        self
    }

    pub fn with_remote_signing_url_style(mut self, style: RemoteSigningUrlStyle) -> Self {
        self.remote_signing_url_style = style;
        self
    }

    pub fn with_sts_token_validity_seconds(mut self, seconds: i64) -> Self {
        self.sts_token_validity_seconds = seconds;
        self
    }

    pub fn with_assume_role_arn(mut self, arn: impl Into<String>) -> Self {
        self.assume_role_arn = Some(arn.into());
        self
    }

    pub fn with_sts_role_arn(mut self, arn: impl Into<String>) -> Self {
        self.sts_role_arn = Some(arn.into());
        self
    }

    pub fn with_aws_kms_key_arn(mut self, arn: impl Into<String>) -> Self {
        self.aws_kms_key_arn = Some(arn.into());
        self
    }

    pub fn with_allow_alternative_protocols(mut self, allow: bool) -> Self {
        self.allow_alternative_protocols = Some(allow);
        self
    }
}

/// A Google Cloud Storage bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(test, derive(proptest_derive::Arbitrary))]
#[serde(rename_all = "kebab-case")]
pub struct GcsStorageProfile {
    pub bucket: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_prefix: Option<String>,
}

impl GcsStorageProfile {
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            key_prefix: None,
        }
    }

    pub fn with_key_prefix(mut self, key_prefix: impl Into<String>) -> Self {
        self.key_prefix = Some(key_prefix.into());
        self
    }
}

/// An Azure Data Lake Storage Gen2 filesystem.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(test, derive(proptest_derive::Arbitrary))]
#[serde(rename_all = "kebab-case")]
pub struct AdlsStorageProfile {
    pub filesystem: String,
    pub account_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_prefix: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authority_host: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sas_token_validity_seconds: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allow_alternative_protocols: Option<bool>,
}

impl AdlsStorageProfile {
    pub fn new(filesystem: impl Into<String>, account_name: impl Into<String>) -> Self {
        Self {
            filesystem: filesystem.into(),
            account_name: account_name.into(),
            key_prefix: None,
            authority_host: None,
            host: None,
            sas_token_validity_seconds: None,
            allow_alternative_protocols: None,
        }
    }

    pub fn with_key_prefix(mut self, key_prefix: impl Into<String>) -> Self {
        self.key_prefix = Some(key_prefix.into());
        self
    }

    pub fn with_authority_host(mut self, authority_host: impl Into<String>) -> Self {
        self.authority_host = Some(authority_host.into());
        self
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    pub fn with_sas_token_validity_seconds(mut self, seconds: i64) -> Self {
        self.sas_token_validity_seconds = Some(seconds);
        self
    }

    pub fn with_allow_alternative_protocols(mut self, allow: bool) -> Self {
        self.allow_alternative_protocols = Some(allow);
        self
    }
}
