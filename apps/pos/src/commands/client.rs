//! # Client Commands
//!
//! Customer records, optionally attached to a sale at checkout.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::ApiResult;
use crate::state::AppState;
use ferre_core::Client;
use ferre_db::repository::generate_id;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientForm {
    pub first_name: String,
    pub last_name: String,
    pub tax_id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub is_professional: bool,
}

impl ClientForm {
    fn into_client(self, id: String, created_at: DateTime<Utc>) -> Client {
        Client {
            id,
            first_name: self.first_name,
            last_name: self.last_name,
            tax_id: self.tax_id,
            email: self.email,
            phone: self.phone,
            address: self.address,
            is_professional: self.is_professional,
            created_at,
        }
    }
}

/// Searches by first name, last name or tax id. Empty lists everyone.
pub async fn search_clients(state: &AppState, query: &str) -> ApiResult<Vec<Client>> {
    let limit = state.config().search_limit;
    Ok(state.db().clients().search(query, limit).await?)
}

pub async fn get_client(state: &AppState, id: &str) -> ApiResult<Client> {
    Ok(state.db().clients().require(id).await?)
}

pub async fn create_client(state: &AppState, form: ClientForm) -> ApiResult<Client> {
    let client = form.into_client(generate_id(), Utc::now());
    let client = state.db().clients().insert(&client).await?;

    info!(id = %client.id, tax_id = %client.tax_id, "Client created");
    Ok(client)
}

pub async fn update_client(state: &AppState, id: &str, form: ClientForm) -> ApiResult<Client> {
    let current = state.db().clients().require(id).await?;
    let client = form.into_client(current.id, current.created_at);

    Ok(state.db().clients().update(&client).await?)
}

/// Deletes a client. Their past sales stay, without the client reference.
pub async fn delete_client(state: &AppState, id: &str) -> ApiResult<()> {
    state.db().clients().delete(id).await?;
    info!(id = %id, "Client deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::state::test_support::test_state;

    fn form(first: &str, tax_id: &str) -> ClientForm {
        ClientForm {
            first_name: first.to_string(),
            last_name: "Pérez".to_string(),
            tax_id: tax_id.to_string(),
            ..ClientForm::default()
        }
    }

    #[tokio::test]
    async fn test_client_crud() {
        let state = test_state().await;

        let juan = create_client(&state, form("Juan", "20-1")).await.unwrap();
        create_client(&state, form("Ana", "27-2")).await.unwrap();

        assert_eq!(search_clients(&state, "").await.unwrap().len(), 2);
        assert_eq!(search_clients(&state, "juan").await.unwrap().len(), 1);

        let mut edit = form("Juan Carlos", "20-1");
        edit.is_professional = true;
        let updated = update_client(&state, &juan.id, edit).await.unwrap();
        assert_eq!(updated.first_name, "Juan Carlos");
        assert!(updated.is_professional);

        delete_client(&state, &juan.id).await.unwrap();
        assert_eq!(
            get_client(&state, &juan.id).await.unwrap_err().code,
            ErrorCode::NotFound
        );
    }

    #[tokio::test]
    async fn test_duplicate_tax_id_and_bad_email() {
        let state = test_state().await;
        create_client(&state, form("Juan", "20-1")).await.unwrap();

        let err = create_client(&state, form("Otro", "20-1")).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::Conflict);

        let mut bad = form("Ana", "27-2");
        bad.email = Some("ana-at-example".to_string());
        let err = create_client(&state, bad).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
    }
}
