//! Storage credentials: how the server accesses a storage profile's location.
//!
//! Credentials are selected by two discriminators, the provider (`type`) and
//! the kind of credential for that provider (`credential-type`).

use std::fmt;

use derive_more::From;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::codec::{
    CREDENTIAL_TYPE_KEY,
    CodecError,
    ConfigVariant,
    Discriminator,
    TYPE_KEY,
    decode_fields,
    unsupported,
};

const REDACTED: &str = "<redacted>";

/// The secret or identity used to access a storage location.
#[derive(Debug, Clone, PartialEq, From)]
#[cfg_attr(test, derive(proptest_derive::Arbitrary))]
pub enum StorageCredential {
    S3(S3Credential),
    Gcs(GcsCredential),
    Az(AzCredential),
}

#[derive(Debug, Clone, PartialEq, From)]
#[cfg_attr(test, derive(proptest_derive::Arbitrary))]
pub enum S3Credential {
    AccessKey(S3AccessKeyCredential),
    AwsSystemIdentity(S3AwsSystemIdentityCredential),
    CloudflareR2(CloudflareR2Credential),
}

#[derive(Debug, Clone, PartialEq, From)]
#[cfg_attr(test, derive(proptest_derive::Arbitrary))]
pub enum GcsCredential {
    ServiceAccountKey(GcsServiceAccountKeyCredential),
    GcpSystemIdentity(GcpSystemIdentityCredential),
}

#[derive(Debug, Clone, PartialEq, From)]
#[cfg_attr(test, derive(proptest_derive::Arbitrary))]
pub enum AzCredential {
    ClientCredentials(AzClientCredentials),
    SharedAccessKey(AzSharedAccessKeyCredential),
    AzureSystemIdentity(AzureSystemIdentityCredential),
}

impl StorageCredential {
    pub fn as_s3(&self) -> Option<&S3Credential> {
        match self {
            StorageCredential::S3(credential) => Some(credential),
            _ => None,
        }
    }

    pub fn as_gcs(&self) -> Option<&GcsCredential> {
        match self {
            StorageCredential::Gcs(credential) => Some(credential),
            _ => None,
        }
    }

    pub fn as_az(&self) -> Option<&AzCredential> {
        match self {
            StorageCredential::Az(credential) => Some(credential),
            _ => None,
        }
    }
}

impl S3Credential {
    pub fn as_access_key(&self) -> Option<&S3AccessKeyCredential> {
        match self {
            S3Credential::AccessKey(credential) => Some(credential),
            _ => None,
        }
    }

    pub fn as_aws_system_identity(&self) -> Option<&S3AwsSystemIdentityCredential> {
        match self {
            S3Credential::AwsSystemIdentity(credential) => Some(credential),
            _ => None,
        }
    }

    pub fn as_cloudflare_r2(&self) -> Option<&CloudflareR2Credential> {
        match self {
            S3Credential::CloudflareR2(credential) => Some(credential),
            _ => None,
        }
    }
}

impl GcsCredential {
    pub fn as_service_account_key(&self) -> Option<&GcsServiceAccountKeyCredential> {
        match self {
            GcsCredential::ServiceAccountKey(credential) => Some(credential),
            _ => None,
        }
    }

    pub fn as_gcp_system_identity(&self) -> Option<&GcpSystemIdentityCredential> {
        match self {
            GcsCredential::GcpSystemIdentity(credential) => Some(credential),
            _ => None,
        }
    }
}

impl AzCredential {
    pub fn as_client_credentials(&self) -> Option<&AzClientCredentials> {
        match self {
            AzCredential::ClientCredentials(credential) => Some(credential),
            _ => None,
        }
    }

    pub fn as_shared_access_key(&self) -> Option<&AzSharedAccessKeyCredential> {
        match self {
            AzCredential::SharedAccessKey(credential) => Some(credential),
            _ => None,
        }
    }

    pub fn as_azure_system_identity(&self) -> Option<&AzureSystemIdentityCredential> {
        match self {
            AzCredential::AzureSystemIdentity(credential) => Some(credential),
            _ => None,
        }
    }
}

// Leaf conversions so callers can go straight from a concrete credential to
// the family type.
macro_rules! impl_from_leaf {
    ($($leaf:ty => $provider:ident),+ $(,)?) => {
        $(impl From<$leaf> for StorageCredential {
            fn from(credential: $leaf) -> Self {
                StorageCredential::$provider(credential.into())
            }
        })+
    };
}

impl_from_leaf! {
    S3AccessKeyCredential => S3,
    S3AwsSystemIdentityCredential => S3,
    CloudflareR2Credential => S3,
    GcsServiceAccountKeyCredential => Gcs,
    GcpSystemIdentityCredential => Gcs,
    AzClientCredentials => Az,
    AzSharedAccessKeyCredential => Az,
    AzureSystemIdentityCredential => Az,
}

/// Flat view used for serialization; the variant's fields sit next to both
/// discriminators.
enum Leaf<'a> {
    S3AccessKey(&'a S3AccessKeyCredential),
    S3AwsSystemIdentity(&'a S3AwsSystemIdentityCredential),
    CloudflareR2(&'a CloudflareR2Credential),
    GcsServiceAccountKey(&'a GcsServiceAccountKeyCredential),
    GcpSystemIdentity(&'a GcpSystemIdentityCredential),
    AzClientCredentials(&'a AzClientCredentials),
    AzSharedAccessKey(&'a AzSharedAccessKeyCredential),
    AzureSystemIdentity(&'a AzureSystemIdentityCredential),
}

impl StorageCredential {
    fn leaf(&self) -> Leaf<'_> {
        match self {
            StorageCredential::S3(S3Credential::AccessKey(c)) => Leaf::S3AccessKey(c),
            StorageCredential::S3(S3Credential::AwsSystemIdentity(c)) => {
                Leaf::S3AwsSystemIdentity(c)
            },
            StorageCredential::S3(S3Credential::CloudflareR2(c)) => Leaf::CloudflareR2(c),
            StorageCredential::Gcs(GcsCredential::ServiceAccountKey(c)) => {
                Leaf::GcsServiceAccountKey(c)
            },
            StorageCredential::Gcs(GcsCredential::GcpSystemIdentity(c)) => {
                Leaf::GcpSystemIdentity(c)
            },
            StorageCredential::Az(AzCredential::ClientCredentials(c)) => {
                Leaf::AzClientCredentials(c)
            },
            StorageCredential::Az(AzCredential::SharedAccessKey(c)) => Leaf::AzSharedAccessKey(c),
            StorageCredential::Az(AzCredential::AzureSystemIdentity(c)) => {
                Leaf::AzureSystemIdentity(c)
            },
        }
    }
}

impl ConfigVariant for StorageCredential {
    const DISCRIMINATOR_KEYS: &'static [&'static str] = &[TYPE_KEY, CREDENTIAL_TYPE_KEY];
    const FAMILY: &'static str = "storage credential";
    const KINDS: &'static [&'static str] = &["s3", "gcs", "az"];

    fn discriminator(&self) -> Discriminator {
        match self.leaf() {
            Leaf::S3AccessKey(_) => Discriminator::with_subtype("s3", "access-key"),
            Leaf::S3AwsSystemIdentity(_) => {
                Discriminator::with_subtype("s3", "aws-system-identity")
            },
            Leaf::CloudflareR2(_) => Discriminator::with_subtype("s3", "cloudflare-r2"),
            Leaf::GcsServiceAccountKey(_) => {
                Discriminator::with_subtype("gcs", "service-account-key")
            },
            Leaf::GcpSystemIdentity(_) => Discriminator::with_subtype("gcs", "gcp-system-identity"),
            Leaf::AzClientCredentials(_) => Discriminator::with_subtype("az", "client-credentials"),
            Leaf::AzSharedAccessKey(_) => Discriminator::with_subtype("az", "shared-access-key"),
            Leaf::AzureSystemIdentity(_) => {
                Discriminator::with_subtype("az", "azure-system-identity")
            },
        }
    }

    fn decode_variant(tags: &[&str], payload: Value) -> Result<Self, CodecError> {
        let credential: StorageCredential = match tags {
            ["s3", "access-key"] => {
                decode_fields::<Self, S3AccessKeyCredential>(tags, payload)?.into()
            },
            ["s3", "aws-system-identity"] => {
                decode_fields::<Self, S3AwsSystemIdentityCredential>(tags, payload)?.into()
            },
            ["s3", "cloudflare-r2"] => {
                decode_fields::<Self, CloudflareR2Credential>(tags, payload)?.into()
            },
            ["gcs", "service-account-key"] => {
                decode_fields::<Self, GcsServiceAccountKeyCredential>(tags, payload)?.into()
            },
            ["gcs", "gcp-system-identity"] => {
                decode_fields::<Self, GcpSystemIdentityCredential>(tags, payload)?.into()
            },
            ["az", "client-credentials"] => {
                decode_fields::<Self, AzClientCredentials>(tags, payload)?.into()
            },
            ["az", "shared-access-key"] => {
                decode_fields::<Self, AzSharedAccessKeyCredential>(tags, payload)?.into()
            },
            ["az", "azure-system-identity"] => {
                decode_fields::<Self, AzureSystemIdentityCredential>(tags, payload)?.into()
            },
            _ => return Err(unsupported::<Self>(tags)),
        };
        Ok(credential)
    }
}

impl Serialize for StorageCredential {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use crate::codec::serialize_tagged;

        let discriminator = self.discriminator();
        match self.leaf() {
            Leaf::S3AccessKey(c) => serialize_tagged(serializer, discriminator, c),
            Leaf::S3AwsSystemIdentity(c) => serialize_tagged(serializer, discriminator, c),
            Leaf::CloudflareR2(c) => serialize_tagged(serializer, discriminator, c),
            Leaf::GcsServiceAccountKey(c) => serialize_tagged(serializer, discriminator, c),
            Leaf::GcpSystemIdentity(c) => serialize_tagged(serializer, discriminator, c),
            Leaf::AzClientCredentials(c) => serialize_tagged(serializer, discriminator, c),
            Leaf::AzSharedAccessKey(c) => serialize_tagged(serializer, discriminator, c),
            Leaf::AzureSystemIdentity(c) => serialize_tagged(serializer, discriminator, c),
        }
    }
}

impl<'de> Deserialize<'de> for StorageCredential {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        crate::codec::deserialize_variant(deserializer)
    }
}

/// Static AWS access keys.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(test, derive(proptest_derive::Arbitrary))]
#[serde(rename_all = "kebab-case")]
pub struct S3AccessKeyCredential {
    pub aws_access_key_id: String,
    pub aws_secret_access_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
}

impl S3AccessKeyCredential {
    pub fn new(
        aws_access_key_id: impl Into<String>,
        aws_secret_access_key: impl Into<String>,
    ) -> Self {
        Self {
            aws_access_key_id: aws_access_key_id.into(),
            aws_secret_access_key: aws_secret_access_key.into(),
            external_id: None,
        }
    }

    pub fn with_external_id(mut self, external_id: impl Into<String>) -> Self {
        self.external_id = Some(external_id.into());
        self
    }
}

impl fmt::Debug for S3AccessKeyCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("S3AccessKeyCredential")
            .field("aws_access_key_id", &self.aws_access_key_id)
            .field("aws_secret_access_key", &REDACTED)
            .field("external_id", &self.external_id)
            .finish()
    }
}

/// The identity of the server process itself.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(test, derive(proptest_derive::Arbitrary))]
#[serde(rename_all = "kebab-case")]
pub struct S3AwsSystemIdentityCredential {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
}

#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(test, derive(proptest_derive::Arbitrary))]
#[serde(rename_all = "kebab-case")]
pub struct CloudflareR2Credential {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub token: String,
    pub account_id: String,
}

impl fmt::Debug for CloudflareR2Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CloudflareR2Credential")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &REDACTED)
            .field("token", &REDACTED)
            .field("account_id", &self.account_id)
            .finish()
    }
}

/// A Google service account key file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(test, derive(proptest_derive::Arbitrary))]
pub struct GcsServiceAccountKeyCredential {
    pub key: GcsServiceAccountKey,
}

/// The JSON key file as issued by Google; keys are snake_case.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(test, derive(proptest_derive::Arbitrary))]
pub struct GcsServiceAccountKey {
    #[serde(rename = "type")]
    pub key_type: String,
    pub project_id: String,
    pub private_key_id: String,
    pub private_key: String,
    pub client_email: String,
    pub client_id: String,
    pub auth_uri: String,
    pub token_uri: String,
    pub auth_provider_x509_cert_url: String,
    pub client_x509_cert_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub universe_domain: Option<String>,
}

impl fmt::Debug for GcsServiceAccountKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GcsServiceAccountKey")
            .field("key_type", &self.key_type)
            .field("project_id", &self.project_id)
            .field("private_key_id", &self.private_key_id)
            .field("private_key", &REDACTED)
            .field("client_email", &self.client_email)
            .field("client_id", &self.client_id)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(test, derive(proptest_derive::Arbitrary))]
pub struct GcpSystemIdentityCredential {}

/// An Entra ID service principal.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(test, derive(proptest_derive::Arbitrary))]
#[serde(rename_all = "kebab-case")]
pub struct AzClientCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub tenant_id: String,
}

impl fmt::Debug for AzClientCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AzClientCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &REDACTED)
            .field("tenant_id", &self.tenant_id)
            .finish()
    }
}

#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(test, derive(proptest_derive::Arbitrary))]
pub struct AzSharedAccessKeyCredential {
    pub key: String,
}

impl fmt::Debug for AzSharedAccessKeyCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AzSharedAccessKeyCredential")
            .field("key", &REDACTED)
            .finish()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(test, derive(proptest_derive::Arbitrary))]
pub struct AzureSystemIdentityCredential {}
