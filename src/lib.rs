//! Operator handle claiming: workflow, record-store access and side effects
//! behind the waitlist page.

use serde::{Deserialize, Serialize};

pub mod analytics;
pub mod cache;
pub mod config;
pub mod error;
pub mod notify;
pub mod share;
pub mod speech;
pub mod store;
pub mod validation;
pub mod workflow;

pub use error::{ClaimError, FormatIssue, StoreError};
pub use workflow::{ClaimWorkflow, Phase, WorkflowSnapshot};

/// A reserved handle as written to the record store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claim {
    #[serde(rename = "Handle")]
    pub handle: String,
    #[serde(rename = "Full Name")]
    pub full_name: String,
    #[serde(rename = "Email")]
    pub email: String,
    #[serde(rename = "Position")]
    pub position: u64,
}

/// What the page shows once a claim has been stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimReceipt {
    pub handle: String,
    pub position: u64,
}

impl From<&Claim> for ClaimReceipt {
    fn from(claim: &Claim) -> Self {
        Self {
            handle: claim.handle.clone(),
            position: claim.position,
        }
    }
}
