use serde::{Deserialize, Serialize};

use crate::{ValidationError, user::User};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    pub name: String,
    pub members: Vec<User>,
}

impl Team {
    #[must_use]
    pub fn new(name: impl Into<String>, members: Vec<User>) -> Self {
        Self {
            name: name.into(),
            members,
        }
    }

    /// # Errors
    ///
    /// * [`ValidationError::TeamNameEmpty`] if the name is empty
    /// * [`ValidationError::TeamMembersEmpty`] if the team has no members
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.is_empty() {
            return Err(ValidationError::TeamNameEmpty);
        }
        if self.members.is_empty() {
            return Err(ValidationError::TeamMembersEmpty);
        }
        Ok(())
    }
}
