//! # Client Repository
//!
//! Customer records. A sale may reference a client; deleting the client
//! keeps the sale and clears the reference.

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::repository::contains_pattern;
use ferre_core::validation::{optional_text, validate_email, validate_required, validate_search_query};
use ferre_core::Client;

const CLIENT_COLUMNS: &str =
    "id, first_name, last_name, tax_id, email, phone, address, is_professional, created_at";

/// Repository for clients.
#[derive(Debug, Clone)]
pub struct ClientRepository {
    pool: SqlitePool,
}

impl ClientRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ClientRepository { pool }
    }

    /// Inserts a client and returns the stored (trimmed) record.
    ///
    /// ## Errors
    /// - `Domain(Validation)` for blank names or tax id, malformed email
    /// - `UniqueViolation` when the tax id is taken
    pub async fn insert(&self, client: &Client) -> DbResult<Client> {
        let client = normalize(client)?;

        debug!(id = %client.id, tax_id = %client.tax_id, "Inserting client");

        sqlx::query(
            r#"
            INSERT INTO clients (
                id, first_name, last_name, tax_id, email, phone, address,
                is_professional, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&client.id)
        .bind(&client.first_name)
        .bind(&client.last_name)
        .bind(&client.tax_id)
        .bind(&client.email)
        .bind(&client.phone)
        .bind(&client.address)
        .bind(client.is_professional)
        .bind(client.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| unique_tax_id(e, &client.tax_id))?;

        Ok(client)
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Client>> {
        let sql = format!("SELECT {} FROM clients WHERE id = ?1", CLIENT_COLUMNS);
        let client = sqlx::query_as::<_, Client>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(client)
    }

    pub async fn require(&self, id: &str) -> DbResult<Client> {
        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Client", id))
    }

    /// Updates every editable field of a client.
    pub async fn update(&self, client: &Client) -> DbResult<Client> {
        let client = normalize(client)?;

        debug!(id = %client.id, "Updating client");

        let result = sqlx::query(
            r#"
            UPDATE clients
            SET
                first_name = ?2,
                last_name = ?3,
                tax_id = ?4,
                email = ?5,
                phone = ?6,
                address = ?7,
                is_professional = ?8
            WHERE id = ?1
            "#,
        )
        .bind(&client.id)
        .bind(&client.first_name)
        .bind(&client.last_name)
        .bind(&client.tax_id)
        .bind(&client.email)
        .bind(&client.phone)
        .bind(&client.address)
        .bind(client.is_professional)
        .execute(&self.pool)
        .await
        .map_err(|e| unique_tax_id(e, &client.tax_id))?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Client", &client.id));
        }

        self.require(&client.id).await
    }

    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting client");

        let result = sqlx::query("DELETE FROM clients WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Client", id));
        }

        Ok(())
    }

    /// Searches by first name, last name or tax id. Empty query lists all.
    pub async fn search(&self, query: &str, limit: u32) -> DbResult<Vec<Client>> {
        let query = validate_search_query(query)?;

        let sql = format!(
            r#"
            SELECT {}
            FROM clients
            WHERE ?1 = ''
               OR first_name LIKE ?2 ESCAPE '\'
               OR last_name LIKE ?2 ESCAPE '\'
               OR tax_id LIKE ?2 ESCAPE '\'
            ORDER BY last_name, first_name
            LIMIT ?3
            "#,
            CLIENT_COLUMNS
        );
        let clients = sqlx::query_as::<_, Client>(&sql)
            .bind(&query)
            .bind(contains_pattern(&query))
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(clients)
    }
}

fn normalize(client: &Client) -> DbResult<Client> {
    Ok(Client {
        id: client.id.clone(),
        first_name: validate_required("first_name", &client.first_name, 100)?,
        last_name: validate_required("last_name", &client.last_name, 100)?,
        tax_id: validate_required("tax_id", &client.tax_id, 20)?,
        email: validate_email(client.email.as_deref())?,
        phone: optional_text("phone", client.phone.as_deref(), 20)?,
        address: optional_text("address", client.address.as_deref(), 255)?,
        is_professional: client.is_professional,
        created_at: client.created_at,
    })
}

fn unique_tax_id(err: sqlx::Error, tax_id: &str) -> DbError {
    match DbError::from(err) {
        DbError::UniqueViolation { .. } => DbError::duplicate("tax_id", tax_id),
        other => other,
    }
}
