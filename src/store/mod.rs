//! Persistence for users and contracts
//!
//! Handlers only see the [`Store`] trait object. [`PgStore`] backs production
//! deployments; [`MemoryStore`] keeps everything in process for tests and
//! local runs.

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use std::sync::Arc;

use async_trait::async_trait;

use crate::auth::{NewUser, User, UserId};
use crate::config::DatabaseConfig;
use crate::contracts::{Contract, ContractId, ContractUpdate, NewContract};
use crate::error::Result;

/// Registry of users and their password digests
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_user_by_id(&self, id: UserId) -> Result<Option<User>>;

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>>;

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>>;

    /// Insert a user; fails with `EmailTaken` or `UsernameTaken` on collisions
    async fn create_user(&self, user: NewUser) -> Result<User>;
}

/// Analyzed contracts
#[async_trait]
pub trait ContractStore: Send + Sync {
    /// Insert a contract; fails with `FilenameTaken` on collisions
    async fn create_contract(&self, contract: NewContract) -> Result<Contract>;

    async fn find_contract_by_id(&self, id: ContractId) -> Result<Option<Contract>>;

    async fn find_contract_by_filename(&self, filename: &str) -> Result<Option<Contract>>;

    /// All contracts ordered by id
    async fn list_contracts(&self) -> Result<Vec<Contract>>;

    /// Apply the fields present in `changes`; `None` if the contract does not exist
    async fn update_contract(
        &self,
        id: ContractId,
        changes: ContractUpdate,
    ) -> Result<Option<Contract>>;

    /// Returns whether a contract was removed
    async fn delete_contract(&self, id: ContractId) -> Result<bool>;
}

/// Everything the HTTP layer needs from persistence
pub trait Store: UserStore + ContractStore {}

impl<T: UserStore + ContractStore> Store for T {}

/// Open the store selected by the database configuration
pub async fn open_store(config: &DatabaseConfig) -> Result<Arc<dyn Store>> {
    if config.is_memory() {
        tracing::warn!("Using the in-memory store; data is lost on shutdown");
        return Ok(Arc::new(MemoryStore::new()));
    }

    let store = PgStore::connect(&config.url, config.max_connections)?;
    store.ensure_schema().await?;
    Ok(Arc::new(store))
}
