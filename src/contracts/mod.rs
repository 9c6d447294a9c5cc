//! Contract records

use serde::{Deserialize, Serialize};

use crate::analysis::ContractAnalysis;
use crate::auth::UserId;

pub type ContractId = i64;

/// A stored, analyzed contract
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contract {
    pub id: ContractId,
    pub filename: String,
    pub uploaded_by: UserId,
    /// Party names separated by "; "
    pub parties: Option<String>,
    /// Monetary amounts separated by "; "
    pub monetary_values: Option<String>,
    /// One obligation per line
    pub obligations: Option<String>,
    /// Subject matter, term and other notable details
    pub additional_data: Option<String>,
    pub termination_clauses: Option<String>,
}

/// A contract about to be inserted
#[derive(Debug, Clone)]
pub struct NewContract {
    pub filename: String,
    pub uploaded_by: UserId,
    pub parties: Option<String>,
    pub monetary_values: Option<String>,
    pub obligations: Option<String>,
    pub additional_data: Option<String>,
    pub termination_clauses: Option<String>,
}

impl NewContract {
    /// Flatten an analysis into storable columns
    pub fn from_analysis(filename: String, uploaded_by: UserId, analysis: &ContractAnalysis) -> Self {
        Self {
            filename,
            uploaded_by,
            parties: non_empty(analysis.parties.join("; ")),
            monetary_values: non_empty(analysis.monetary_values.join("; ")),
            obligations: non_empty(analysis.obligations.join("\n")),
            additional_data: non_empty(analysis.additional_data.clone()),
            termination_clauses: non_empty(analysis.termination_clauses.clone()),
        }
    }
}

fn non_empty(value: String) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}

/// Partial update; absent fields are left unchanged
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContractUpdate {
    pub filename: Option<String>,
    pub parties: Option<String>,
    pub monetary_values: Option<String>,
    pub obligations: Option<String>,
    pub additional_data: Option<String>,
    pub termination_clauses: Option<String>,
}

impl ContractUpdate {
    pub fn is_empty(&self) -> bool {
        self.filename.is_none()
            && self.parties.is_none()
            && self.monetary_values.is_none()
            && self.obligations.is_none()
            && self.additional_data.is_none()
            && self.termination_clauses.is_none()
    }

    pub fn apply_to(self, contract: &mut Contract) {
        if let Some(filename) = self.filename {
            contract.filename = filename;
        }
        if self.parties.is_some() {
            contract.parties = self.parties;
        }
        if self.monetary_values.is_some() {
            contract.monetary_values = self.monetary_values;
        }
        if self.obligations.is_some() {
            contract.obligations = self.obligations;
        }
        if self.additional_data.is_some() {
            contract.additional_data = self.additional_data;
        }
        if self.termination_clauses.is_some() {
            contract.termination_clauses = self.termination_clauses;
        }
    }
}
