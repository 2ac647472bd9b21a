use reqwest::Method;
use tracing::instrument;
use uuid::Uuid;

use crate::client::Client;
use crate::error::ClientError;
use crate::request::{RequestOption, path_escape};
use crate::types::{
    CreateWarehouseRequest,
    CreateWarehouseResponse,
    DeleteWarehouseOptions,
    ListWarehousesOptions,
    ListWarehousesResponse,
    UpdateDeleteProfileRequest,
    UpdateStorageRequest,
    Warehouse,
};

fn warehouse_path(warehouse_id: Uuid, suffix: &str) -> String {
    format!(
        "/warehouse/{}{suffix}",
        path_escape(&warehouse_id.to_string())
    )
}

impl Client {
    /// `POST /warehouse`
    #[instrument(skip_all, fields(warehouse_name = %body.warehouse_name))]
    pub async fn create_warehouse(
        &self,
        body: &CreateWarehouseRequest,
        options: &[RequestOption],
    ) -> Result<CreateWarehouseResponse, ClientError> {
        let request = self.new_request(Method::POST, "/warehouse", Some(body), options)?;
        self.execute(&request).await
    }

    /// `GET /warehouse/{id}`
    #[instrument(skip_all, fields(%warehouse_id))]
    pub async fn get_warehouse(
        &self,
        warehouse_id: Uuid,
        options: &[RequestOption],
    ) -> Result<Warehouse, ClientError> {
        let path = warehouse_path(warehouse_id, "");
        let request = self.new_request::<()>(Method::GET, &path, None, options)?;
        self.execute(&request).await
    }

    /// `GET /warehouse`
    #[instrument(skip_all)]
    pub async fn list_warehouses(
        &self,
        params: &ListWarehousesOptions,
        options: &[RequestOption],
    ) -> Result<ListWarehousesResponse, ClientError> {
        let request = self.new_request(Method::GET, "/warehouse", Some(params), options)?;
        self.execute(&request).await
    }

    /// `DELETE /warehouse/{id}`
    #[instrument(skip_all, fields(%warehouse_id))]
    pub async fn delete_warehouse(
        &self,
        warehouse_id: Uuid,
        params: &DeleteWarehouseOptions,
        options: &[RequestOption],
    ) -> Result<(), ClientError> {
        let path = warehouse_path(warehouse_id, "");
        let request = self.new_request(Method::DELETE, &path, Some(params), options)?;
        self.execute_unit(&request).await
    }

    /// `POST /warehouse/{id}/storage`
    #[instrument(skip_all, fields(%warehouse_id))]
    pub async fn update_storage(
        &self,
        warehouse_id: Uuid,
        body: &UpdateStorageRequest,
        options: &[RequestOption],
    ) -> Result<(), ClientError> {
        let path = warehouse_path(warehouse_id, "/storage");
        let request = self.new_request(Method::POST, &path, Some(body), options)?;
        self.execute_unit(&request).await
    }

    /// `POST /warehouse/{id}/delete-profile`
    #[instrument(skip_all, fields(%warehouse_id))]
    pub async fn update_delete_profile(
        &self,
        warehouse_id: Uuid,
        body: &UpdateDeleteProfileRequest,
        options: &[RequestOption],
    ) -> Result<(), ClientError> {
        let path = warehouse_path(warehouse_id, "/delete-profile");
        let request = self.new_request(Method::POST, &path, Some(body), options)?;
        self.execute_unit(&request).await
    }
}
