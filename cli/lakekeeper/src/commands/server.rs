use anyhow::{Result, bail};
use bpaf::Bpaf;
use lakekeeper_client::types::{BootstrapRequest, UserType};
use lakekeeper_client::{Client, is_already_bootstrapped};
use tracing::instrument;

use super::print_json;
use crate::utils::message;

#[instrument(name = "info", skip_all)]
pub(super) async fn info(client: &Client) -> Result<()> {
    let info = client.server_info(&[]).await?;
    print_json(&info)
}

#[instrument(name = "whoami", skip_all)]
pub(super) async fn whoami(client: &Client) -> Result<()> {
    let user = client.whoami(&[]).await?;
    print_json(&user)
}

fn parse_user_type(s: String) -> Result<UserType> {
    match s.as_str() {
        "human" => Ok(UserType::Human),
        "application" => Ok(UserType::Application),
        other => bail!("unknown user type '{other}', expected 'human' or 'application'"),
    }
}

#[derive(Bpaf, Clone, Debug)]
pub struct Bootstrap {
    /// Make the bootstrapping principal the server operator
    #[bpaf(long("operator"))]
    operator: bool,

    /// Type of the bootstrapping principal: 'human' (default) or 'application'
    #[bpaf(
        long("user-type"),
        argument::<String>("TYPE"),
        parse(parse_user_type),
        fallback(UserType::Human)
    )]
    user_type: UserType,
}

impl Bootstrap {
    #[instrument(name = "bootstrap", skip_all)]
    pub async fn handle(self, client: &Client) -> Result<()> {
        let request = BootstrapRequest {
            accept_terms_of_use: true,
            is_operator: self.operator,
            user_name: None,
            user_email: None,
            user_type: Some(self.user_type),
        };

        match client.bootstrap(&request, &[]).await {
            Ok(()) => message::updated("Server bootstrapped"),
            Err(err) if is_already_bootstrapped(&err) => {
                message::plain("Server is already bootstrapped")
            },
            Err(err) => return Err(err.into()),
        }
        Ok(())
    }
}
