use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use bpaf::Bpaf;
use lakekeeper_client::types::{
    AdlsStorageProfile,
    AzClientCredentials,
    CreateWarehouseRequest,
    DeleteProfile,
    DeleteWarehouseOptions,
    GcsServiceAccountKey,
    GcsServiceAccountKeyCredential,
    GcsStorageProfile,
    ListWarehousesOptions,
    S3AccessKeyCredential,
    S3Flavor,
    S3StorageProfile,
    StorageCredential,
    StorageProfile,
    WarehouseStatus,
};
use lakekeeper_client::{Client, RequestOption};
use tracing::instrument;
use uuid::Uuid;

use super::print_json;
use crate::utils::message;

#[derive(Bpaf, Clone, Debug)]
pub enum WarehouseCommands {
    /// List warehouses of a project
    #[bpaf(command)]
    List(#[bpaf(external(list))] List),

    /// Show a single warehouse
    #[bpaf(command)]
    Get(#[bpaf(external(get))] Get),

    /// Create a warehouse
    #[bpaf(command)]
    Create(#[bpaf(external(create))] Create),

    /// Delete a warehouse
    #[bpaf(command)]
    Delete(#[bpaf(external(delete))] Delete),
}

impl WarehouseCommands {
    pub async fn handle(self, client: &Client) -> Result<()> {
        match self {
            WarehouseCommands::List(args) => args.handle(client).await,
            WarehouseCommands::Get(args) => args.handle(client).await,
            WarehouseCommands::Create(args) => args.handle(client).await,
            WarehouseCommands::Delete(args) => args.handle(client).await,
        }
    }
}

fn parse_status(s: String) -> Result<WarehouseStatus> {
    match s.as_str() {
        "active" => Ok(WarehouseStatus::Active),
        "inactive" => Ok(WarehouseStatus::Inactive),
        other => bail!("unknown warehouse status '{other}', expected 'active' or 'inactive'"),
    }
}

#[derive(Bpaf, Clone, Debug)]
pub struct List {
    /// Project to list warehouses of, defaults to the server's default project
    #[bpaf(long("project-id"), argument("ID"))]
    project_id: Option<String>,

    /// Only list warehouses with this status; may be repeated
    #[bpaf(long("status"), argument::<String>("STATUS"), parse(parse_status), many)]
    status: Vec<WarehouseStatus>,
}

impl List {
    #[instrument(name = "warehouse_list", skip_all)]
    async fn handle(self, client: &Client) -> Result<()> {
        let params = ListWarehousesOptions {
            project_id: self.project_id,
            warehouse_status: self.status,
        };
        let response = client.list_warehouses(&params, &[]).await?;
        print_json(&response.warehouses)
    }
}

#[derive(Bpaf, Clone, Debug)]
pub struct Get {
    #[bpaf(positional("ID"))]
    id: Uuid,
}

impl Get {
    #[instrument(name = "warehouse_get", skip_all)]
    async fn handle(self, client: &Client) -> Result<()> {
        let warehouse = client.get_warehouse(self.id, &[]).await?;
        print_json(&warehouse)
    }
}

#[derive(Bpaf, Clone, Debug)]
pub struct Delete {
    /// Delete the warehouse even if it is protected
    #[bpaf(short, long)]
    force: bool,

    #[bpaf(positional("ID"))]
    id: Uuid,
}

impl Delete {
    #[instrument(name = "warehouse_delete", skip_all)]
    async fn handle(self, client: &Client) -> Result<()> {
        let params = DeleteWarehouseOptions {
            force: self.force.then_some(true),
        };
        client.delete_warehouse(self.id, &params, &[]).await?;
        message::deleted(format!("Warehouse '{}' deleted", self.id));
        Ok(())
    }
}

/// Storage backend of a new warehouse
#[derive(Bpaf, Clone, Debug)]
pub enum Storage {
    S3 {
        /// Store data in this S3 bucket
        #[bpaf(long("s3"), argument("BUCKET"))]
        bucket: String,
        #[bpaf(long("region"), argument("REGION"))]
        region: String,
        /// Endpoint of an S3-compatible service
        #[bpaf(long("endpoint"), argument("URL"))]
        endpoint: Option<String>,
        /// The service is S3-compatible rather than AWS
        #[bpaf(long("s3-compat"))]
        s3_compat: bool,
        #[bpaf(long("path-style-access"))]
        path_style_access: bool,
        /// Vend temporary credentials through STS
        #[bpaf(long("sts"))]
        sts_enabled: bool,
        #[bpaf(long("key-prefix"), argument("PREFIX"))]
        key_prefix: Option<String>,
        #[bpaf(long("access-key-id"), argument("ID"))]
        access_key_id: Option<String>,
        #[bpaf(long("secret-access-key"), argument("KEY"))]
        secret_access_key: Option<String>,
    },
    Gcs {
        /// Store data in this GCS bucket
        #[bpaf(long("gcs"), argument("BUCKET"))]
        bucket: String,
        #[bpaf(long("key-prefix"), argument("PREFIX"))]
        key_prefix: Option<String>,
        /// Service account key file (JSON)
        #[bpaf(long("key-file"), argument("PATH"))]
        key_file: Option<PathBuf>,
    },
    Adls {
        /// Store data in this ADLS filesystem
        #[bpaf(long("adls"), argument("FILESYSTEM"))]
        filesystem: String,
        #[bpaf(long("account-name"), argument("ACCOUNT"))]
        account_name: String,
        #[bpaf(long("key-prefix"), argument("PREFIX"))]
        key_prefix: Option<String>,
        #[bpaf(long("client-id"), argument("ID"))]
        client_id: Option<String>,
        #[bpaf(long("client-secret"), argument("SECRET"))]
        client_secret: Option<String>,
        #[bpaf(long("tenant-id"), argument("ID"))]
        tenant_id: Option<String>,
    },
}

impl Storage {
    /// The storage profile and, if given, credential for this backend.
    fn into_profile_and_credential(self) -> Result<(StorageProfile, Option<StorageCredential>)> {
        match self {
            Storage::S3 {
                bucket,
                region,
                endpoint,
                s3_compat,
                path_style_access,
                sts_enabled,
                key_prefix,
                access_key_id,
                secret_access_key,
            } => {
                let mut profile =
                    S3StorageProfile::new(bucket, region).with_sts_enabled(sts_enabled);
                if let Some(endpoint) = endpoint {
                    profile = profile.with_endpoint(endpoint);
                }
                if s3_compat {
                    profile = profile.with_flavor(S3Flavor::S3Compat);
                }
                if path_style_access {
                    profile = profile.with_path_style_access(true);
                }
                if let Some(key_prefix) = key_prefix {
                    profile = profile.with_key_prefix(key_prefix);
                }

                let credential: Option<StorageCredential> = match (access_key_id, secret_access_key) {
                    (Some(id), Some(secret)) => Some(S3AccessKeyCredential::new(id, secret).into()),
                    (None, None) => None,
                    _ => bail!("'--access-key-id' and '--secret-access-key' must be used together"),
                };
                Ok((profile.into(), credential))
            },
            Storage::Gcs {
                bucket,
                key_prefix,
                key_file,
            } => {
                let mut profile = GcsStorageProfile::new(bucket);
                if let Some(key_prefix) = key_prefix {
                    profile = profile.with_key_prefix(key_prefix);
                }

                let credential: Option<StorageCredential> = match key_file {
                    Some(path) => {
                        let contents = std::fs::read_to_string(&path).with_context(|| {
                            format!("Could not read key file '{}'", path.display())
                        })?;
                        let key: GcsServiceAccountKey = serde_json::from_str(&contents)
                            .with_context(|| {
                                format!("Could not parse key file '{}'", path.display())
                            })?;
                        Some(GcsServiceAccountKeyCredential { key }.into())
                    },
                    None => None,
                };
                Ok((profile.into(), credential))
            },
            Storage::Adls {
                filesystem,
                account_name,
                key_prefix,
                client_id,
                client_secret,
                tenant_id,
            } => {
                let mut profile = AdlsStorageProfile::new(filesystem, account_name);
                if let Some(key_prefix) = key_prefix {
                    profile = profile.with_key_prefix(key_prefix);
                }

                let credential: Option<StorageCredential> = match (client_id, client_secret, tenant_id) {
                    (Some(client_id), Some(client_secret), Some(tenant_id)) => Some(
                        AzClientCredentials {
                            client_id,
                            client_secret,
                            tenant_id,
                        }
                        .into(),
                    ),
                    (None, None, None) => None,
                    _ => bail!(
                        "'--client-id', '--client-secret' and '--tenant-id' must be used together"
                    ),
                };
                Ok((profile.into(), credential))
            },
        }
    }
}

#[derive(Bpaf, Clone, Debug)]
pub struct Create {
    /// Project to create the warehouse in
    #[bpaf(long("project-id"), argument("ID"))]
    project_id: String,

    #[bpaf(external(storage))]
    storage: Storage,

    /// Soft-delete tables, purging them after SECONDS
    #[bpaf(long("soft-delete"), argument("SECONDS"))]
    soft_delete: Option<i32>,

    #[bpaf(positional("NAME"))]
    name: String,
}

impl Create {
    fn into_request(self) -> Result<CreateWarehouseRequest> {
        let (storage_profile, storage_credential) = self.storage.into_profile_and_credential()?;
        Ok(CreateWarehouseRequest {
            warehouse_name: self.name,
            project_id: Some(self.project_id),
            storage_profile,
            storage_credential,
            delete_profile: self.soft_delete.map(DeleteProfile::soft),
        })
    }

    #[instrument(name = "warehouse_create", skip_all)]
    async fn handle(self, client: &Client) -> Result<()> {
        let options = [RequestOption::project_id(self.project_id.clone())];
        let request = self.into_request()?;
        let response = client.create_warehouse(&request, &options).await?;
        message::created(format!(
            "Warehouse '{}' created with id {}",
            request.warehouse_name, response.warehouse_id
        ));
        print_json(&response)
    }
}
