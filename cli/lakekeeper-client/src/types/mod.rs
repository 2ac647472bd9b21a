//! Management API domain types.
//!
//! Storage profiles, storage credentials and delete profiles are closed
//! variant families encoded through [`crate::codec`].

mod delete_profile;
mod server;
mod storage_credential;
mod storage_profile;
mod warehouse;

pub use delete_profile::{DeleteProfile, HardDeleteProfile, SoftDeleteProfile};
pub use server::{BootstrapRequest, ServerInfo, User, UserType};
pub use storage_credential::{
    AzClientCredentials,
    AzCredential,
    AzSharedAccessKeyCredential,
    AzureSystemIdentityCredential,
    CloudflareR2Credential,
    GcpSystemIdentityCredential,
    GcsCredential,
    GcsServiceAccountKey,
    GcsServiceAccountKeyCredential,
    S3AccessKeyCredential,
    S3AwsSystemIdentityCredential,
    S3Credential,
    StorageCredential,
};
pub use storage_profile::{
    AdlsStorageProfile,
    DEFAULT_STS_TOKEN_VALIDITY_SECONDS,
    GcsStorageProfile,
    RemoteSigningUrlStyle,
    S3Flavor,
    S3StorageProfile,
    StorageProfile,
};
pub use warehouse::{
    CreateWarehouseRequest,
    CreateWarehouseResponse,
    DeleteWarehouseOptions,
    ListWarehousesOptions,
    ListWarehousesResponse,
    UpdateDeleteProfileRequest,
    UpdateStorageRequest,
    Warehouse,
    WarehouseStatus,
};
