//! In-process store

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{ContractStore, UserStore};
use crate::auth::{NewUser, User, UserId};
use crate::contracts::{Contract, ContractId, ContractUpdate, NewContract};
use crate::error::{Error, Result};

#[derive(Default)]
struct Tables {
    users: BTreeMap<UserId, User>,
    contracts: BTreeMap<ContractId, Contract>,
    next_user_id: UserId,
    next_contract_id: ContractId,
}

/// Store backed by in-memory maps, shared between clones
#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove a user, leaving any tokens issued to them in circulation
    pub async fn delete_user(&self, id: UserId) -> bool {
        self.tables.write().await.users.remove(&id).is_some()
    }

    pub async fn user_count(&self) -> usize {
        self.tables.read().await.users.len()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_user_by_id(&self, id: UserId) -> Result<Option<User>> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables.users.values().find(|u| u.email == email).cloned())
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables.users.values().find(|u| u.username == username).cloned())
    }

    async fn create_user(&self, user: NewUser) -> Result<User> {
        let mut tables = self.tables.write().await;

        if tables.users.values().any(|u| u.email == user.email) {
            return Err(Error::EmailTaken);
        }
        if tables.users.values().any(|u| u.username == user.username) {
            return Err(Error::UsernameTaken);
        }

        tables.next_user_id += 1;
        let stored = User {
            id: tables.next_user_id,
            username: user.username,
            email: user.email,
            full_name: user.full_name,
            password_hash: user.password_hash,
        };
        tables.users.insert(stored.id, stored.clone());
        Ok(stored)
    }
}

#[async_trait]
impl ContractStore for MemoryStore {
    async fn create_contract(&self, contract: NewContract) -> Result<Contract> {
        let mut tables = self.tables.write().await;

        if tables
            .contracts
            .values()
            .any(|c| c.filename == contract.filename)
        {
            return Err(Error::FilenameTaken(contract.filename));
        }

        tables.next_contract_id += 1;
        let stored = Contract {
            id: tables.next_contract_id,
            filename: contract.filename,
            uploaded_by: contract.uploaded_by,
            parties: contract.parties,
            monetary_values: contract.monetary_values,
            obligations: contract.obligations,
            additional_data: contract.additional_data,
            termination_clauses: contract.termination_clauses,
        };
        tables.contracts.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn find_contract_by_id(&self, id: ContractId) -> Result<Option<Contract>> {
        Ok(self.tables.read().await.contracts.get(&id).cloned())
    }

    async fn find_contract_by_filename(&self, filename: &str) -> Result<Option<Contract>> {
        let tables = self.tables.read().await;
        Ok(tables
            .contracts
            .values()
            .find(|c| c.filename == filename)
            .cloned())
    }

    async fn list_contracts(&self) -> Result<Vec<Contract>> {
        Ok(self.tables.read().await.contracts.values().cloned().collect())
    }

    async fn update_contract(
        &self,
        id: ContractId,
        changes: ContractUpdate,
    ) -> Result<Option<Contract>> {
        let mut tables = self.tables.write().await;

        if let Some(filename) = &changes.filename {
            if tables
                .contracts
                .values()
                .any(|c| c.id != id && &c.filename == filename)
            {
                return Err(Error::FilenameTaken(filename.clone()));
            }
        }

        let Some(contract) = tables.contracts.get_mut(&id) else {
            return Ok(None);
        };
        changes.apply_to(contract);
        Ok(Some(contract.clone()))
    }

    async fn delete_contract(&self, id: ContractId) -> Result<bool> {
        Ok(self.tables.write().await.contracts.remove(&id).is_some())
    }
}
