//! User reference model
//!
//! Users live in an external identity store; rooms only keep the stable id
//! and the display name resolved for the current request.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The caller of an operation, resolved by the identity collaborator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub id: Uuid,
    pub display_name: String,
}

impl Principal {
    pub fn new(id: Uuid, display_name: impl Into<String>) -> Self {
        Self {
            id,
            display_name: display_name.into(),
        }
    }
}
