//! Warehouse request and response types.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{DeleteProfile, StorageCredential, StorageProfile};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WarehouseStatus {
    Active,
    Inactive,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CreateWarehouseRequest {
    pub warehouse_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    pub storage_profile: StorageProfile,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_credential: Option<StorageCredential>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delete_profile: Option<DeleteProfile>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CreateWarehouseResponse {
    pub warehouse_id: Uuid,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Warehouse {
    pub id: Uuid,
    pub name: String,
    pub project_id: String,
    pub storage_profile: StorageProfile,
    #[serde(default)]
    pub delete_profile: DeleteProfile,
    pub status: WarehouseStatus,
    #[serde(default)]
    pub protected: bool,
}

/// Query options for `GET /warehouse`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct ListWarehousesOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warehouse_status: Vec<WarehouseStatus>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListWarehousesResponse {
    pub warehouses: Vec<Warehouse>,
}

/// Query options for `DELETE /warehouse/{id}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DeleteWarehouseOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub force: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct UpdateStorageRequest {
    pub storage_profile: StorageProfile,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_credential: Option<StorageCredential>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct UpdateDeleteProfileRequest {
    pub delete_profile: DeleteProfile,
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;
    use crate::types::{S3AccessKeyCredential, S3StorageProfile};

    #[test]
    fn create_request_nests_variants_under_their_keys() {
        let request = CreateWarehouseRequest {
            warehouse_name: "demo".to_string(),
            project_id: None,
            storage_profile: S3StorageProfile::new("b1", "eu-west-1").into(),
            storage_credential: Some(S3AccessKeyCredential::new("AKIA", "secret").into()),
            delete_profile: Some(DeleteProfile::soft(60)),
        };

        let encoded = serde_json::to_value(&request).unwrap();
        assert_eq!(encoded["warehouse-name"], json!("demo"));
        assert_eq!(encoded["storage-profile"]["type"], json!("s3"));
        assert_eq!(
            encoded["storage-credential"]["credential-type"],
            json!("access-key")
        );
        assert_eq!(
            encoded["delete-profile"],
            json!({"type": "soft", "expiration-seconds": 60})
        );
        assert!(encoded.get("project-id").is_none());
    }

    #[test]
    fn warehouse_decodes_polymorphic_fields() {
        let warehouse: Warehouse = serde_json::from_value(json!({
            "id": "0b6c9a0e-3e8f-4d35-9d52-8b3f5f0c2a11",
            "name": "demo",
            "project-id": "00000000-0000-0000-0000-000000000000",
            "storage-profile": {"type": "gcs", "bucket": "bucket"},
            "delete-profile": {"type": "hard"},
            "status": "active"
        }))
        .unwrap();

        assert_eq!(warehouse.storage_profile.as_gcs().unwrap().bucket, "bucket");
        assert_eq!(warehouse.delete_profile, DeleteProfile::hard());
        assert_eq!(warehouse.status, WarehouseStatus::Active);
        assert!(!warehouse.protected);
    }

    #[test]
    fn warehouse_with_unknown_profile_fails() {
        let result = serde_json::from_value::<Warehouse>(json!({
            "id": "0b6c9a0e-3e8f-4d35-9d52-8b3f5f0c2a11",
            "name": "demo",
            "project-id": "p",
            "storage-profile": {"type": "hdfs"},
            "status": "active"
        }));
        let err = result.unwrap_err();
        assert!(err.to_string().contains(r#"type="hdfs""#), "{err}");
    }
}
