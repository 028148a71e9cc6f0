use serde::{Deserialize, Serialize};

use crate::error::{Result, RosterError};
use crate::paths;

/// The authenticated user performing an action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub uid: String,
    pub email: String,
    pub name: String,
}

impl Identity {
    pub fn new(uid: impl Into<String>, email: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            email: email.into(),
            name: name.into(),
        }
    }

    /// Check the fields and return a copy with the email normalized.
    pub fn validated(&self) -> Result<Identity> {
        if self.uid.trim().is_empty() {
            return Err(RosterError::EmptyField { field: "uid" });
        }
        Ok(Identity {
            uid: self.uid.clone(),
            email: paths::validated_email(&self.email)?,
            name: self.name.trim().to_string(),
        })
    }
}
