//! PostgreSQL store

use std::time::Duration;

use async_trait::async_trait;
use deadpool_postgres::{Manager, ManagerConfig, Object, Pool, RecyclingMethod, Runtime, Status};
use tokio_postgres::error::SqlState;
use tokio_postgres::{NoTls, Row};

use super::{ContractStore, UserStore};
use crate::auth::{NewUser, User, UserId};
use crate::contracts::{Contract, ContractId, ContractUpdate, NewContract};
use crate::error::{Error, Result};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id BIGSERIAL PRIMARY KEY,
    username VARCHAR(255) NOT NULL,
    email VARCHAR(255) NOT NULL,
    full_name VARCHAR(255) NOT NULL,
    hashed_password VARCHAR(255) NOT NULL,
    CONSTRAINT users_username_key UNIQUE (username),
    CONSTRAINT users_email_key UNIQUE (email)
);

CREATE TABLE IF NOT EXISTS contracts (
    id BIGSERIAL PRIMARY KEY,
    filename VARCHAR(255) NOT NULL,
    uploaded_by BIGINT NOT NULL REFERENCES users(id),
    parties TEXT,
    monetary_values TEXT,
    obligations TEXT,
    additional_data TEXT,
    termination_clauses TEXT,
    CONSTRAINT contracts_filename_key UNIQUE (filename)
);
"#;

const USER_COLUMNS: &str = "id, username, email, full_name, hashed_password";

const CONTRACT_COLUMNS: &str = "id, filename, uploaded_by, parties, monetary_values, \
     obligations, additional_data, termination_clauses";

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Store backed by a pool of PostgreSQL connections.
///
/// Each operation checks a connection out for its own duration. Connections
/// whose socket has closed are discarded on recycle, so the store recovers on
/// its own after a database restart.
pub struct PgStore {
    pool: Pool,
}

impl PgStore {
    /// Build the pool; no connection is opened until the first query
    pub fn connect(url: &str, max_connections: usize) -> Result<Self> {
        let pg_config: tokio_postgres::Config = url.parse()?;
        let manager = Manager::from_config(
            pg_config,
            NoTls,
            ManagerConfig {
                recycling_method: RecyclingMethod::Fast,
            },
        );

        let pool = Pool::builder(manager)
            .max_size(max_connections.max(1))
            .runtime(Runtime::Tokio1)
            .create_timeout(Some(CONNECT_TIMEOUT))
            .wait_timeout(Some(CONNECT_TIMEOUT))
            .build()
            .map_err(|e| Error::Config(format!("could not build the database pool: {}", e)))?;

        tracing::info!(max_connections = pool.status().max_size, "PostgreSQL pool ready");
        Ok(Self { pool })
    }

    /// Create the tables if they are missing
    pub async fn ensure_schema(&self) -> Result<()> {
        self.client().await?.batch_execute(SCHEMA).await?;
        tracing::debug!("Database schema is in place");
        Ok(())
    }

    pub fn status(&self) -> Status {
        self.pool.status()
    }

    async fn client(&self) -> Result<Object> {
        self.pool.get().await.map_err(|e| {
            tracing::error!("Could not get a database connection: {}", e);
            Error::from(e)
        })
    }
}

fn user_from_row(row: &Row) -> User {
    User {
        id: row.get("id"),
        username: row.get("username"),
        email: row.get("email"),
        full_name: row.get("full_name"),
        password_hash: row.get("hashed_password"),
    }
}

fn contract_from_row(row: &Row) -> Contract {
    Contract {
        id: row.get("id"),
        filename: row.get("filename"),
        uploaded_by: row.get("uploaded_by"),
        parties: row.get("parties"),
        monetary_values: row.get("monetary_values"),
        obligations: row.get("obligations"),
        additional_data: row.get("additional_data"),
        termination_clauses: row.get("termination_clauses"),
    }
}

/// Name of the unique constraint a statement tripped over, if any
fn violated_unique_constraint(err: &tokio_postgres::Error) -> Option<String> {
    if err.code() != Some(&SqlState::UNIQUE_VIOLATION) {
        return None;
    }
    err.as_db_error()
        .and_then(|db| db.constraint())
        .map(str::to_owned)
}

#[async_trait]
impl UserStore for PgStore {
    async fn find_user_by_id(&self, id: UserId) -> Result<Option<User>> {
        let query = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);
        let row = self.client().await?.query_opt(query.as_str(), &[&id]).await?;
        Ok(row.as_ref().map(user_from_row))
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let query = format!("SELECT {} FROM users WHERE email = $1", USER_COLUMNS);
        let row = self.client().await?.query_opt(query.as_str(), &[&email]).await?;
        Ok(row.as_ref().map(user_from_row))
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let query = format!("SELECT {} FROM users WHERE username = $1", USER_COLUMNS);
        let row = self.client().await?.query_opt(query.as_str(), &[&username]).await?;
        Ok(row.as_ref().map(user_from_row))
    }

    async fn create_user(&self, user: NewUser) -> Result<User> {
        let query = format!(
            "INSERT INTO users (username, email, full_name, hashed_password) \
             VALUES ($1, $2, $3, $4) RETURNING {}",
            USER_COLUMNS
        );

        let row = self
            .client()
            .await?
            .query_one(
                query.as_str(),
                &[&user.username, &user.email, &user.full_name, &user.password_hash],
            )
            .await
            .map_err(|e| match violated_unique_constraint(&e).as_deref() {
                Some("users_email_key") => Error::EmailTaken,
                Some("users_username_key") => Error::UsernameTaken,
                _ => Error::Database(e),
            })?;

        Ok(user_from_row(&row))
    }
}

#[async_trait]
impl ContractStore for PgStore {
    async fn create_contract(&self, contract: NewContract) -> Result<Contract> {
        let query = format!(
            "INSERT INTO contracts (filename, uploaded_by, parties, monetary_values, \
             obligations, additional_data, termination_clauses) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING {}",
            CONTRACT_COLUMNS
        );

        let row = self
            .client()
            .await?
            .query_one(
                query.as_str(),
                &[
                    &contract.filename,
                    &contract.uploaded_by,
                    &contract.parties,
                    &contract.monetary_values,
                    &contract.obligations,
                    &contract.additional_data,
                    &contract.termination_clauses,
                ],
            )
            .await
            .map_err(|e| match violated_unique_constraint(&e).as_deref() {
                Some("contracts_filename_key") => Error::FilenameTaken(contract.filename.clone()),
                _ => Error::Database(e),
            })?;

        Ok(contract_from_row(&row))
    }

    async fn find_contract_by_id(&self, id: ContractId) -> Result<Option<Contract>> {
        let query = format!("SELECT {} FROM contracts WHERE id = $1", CONTRACT_COLUMNS);
        let row = self.client().await?.query_opt(query.as_str(), &[&id]).await?;
        Ok(row.as_ref().map(contract_from_row))
    }

    async fn find_contract_by_filename(&self, filename: &str) -> Result<Option<Contract>> {
        let query = format!(
            "SELECT {} FROM contracts WHERE filename = $1",
            CONTRACT_COLUMNS
        );
        let row = self.client().await?.query_opt(query.as_str(), &[&filename]).await?;
        Ok(row.as_ref().map(contract_from_row))
    }

    async fn list_contracts(&self) -> Result<Vec<Contract>> {
        let query = format!("SELECT {} FROM contracts ORDER BY id", CONTRACT_COLUMNS);
        let rows = self.client().await?.query(query.as_str(), &[]).await?;
        Ok(rows.iter().map(contract_from_row).collect())
    }

    async fn update_contract(
        &self,
        id: ContractId,
        changes: ContractUpdate,
    ) -> Result<Option<Contract>> {
        let query = format!(
            "UPDATE contracts SET \
                filename = COALESCE($2, filename), \
                parties = COALESCE($3, parties), \
                monetary_values = COALESCE($4, monetary_values), \
                obligations = COALESCE($5, obligations), \
                additional_data = COALESCE($6, additional_data), \
                termination_clauses = COALESCE($7, termination_clauses) \
             WHERE id = $1 RETURNING {}",
            CONTRACT_COLUMNS
        );

        let row = self
            .client()
            .await?
            .query_opt(
                query.as_str(),
                &[
                    &id,
                    &changes.filename,
                    &changes.parties,
                    &changes.monetary_values,
                    &changes.obligations,
                    &changes.additional_data,
                    &changes.termination_clauses,
                ],
            )
            .await
            .map_err(|e| match violated_unique_constraint(&e).as_deref() {
                Some("contracts_filename_key") => {
                    Error::FilenameTaken(changes.filename.clone().unwrap_or_default())
                }
                _ => Error::Database(e),
            })?;

        Ok(row.as_ref().map(contract_from_row))
    }

    async fn delete_contract(&self, id: ContractId) -> Result<bool> {
        let deleted = self
            .client()
            .await?
            .execute("DELETE FROM contracts WHERE id = $1", &[&id])
            .await?;
        Ok(deleted > 0)
    }
}
