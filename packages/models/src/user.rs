use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub username: String,
    pub is_active: bool,
    /// `None` when the user does not belong to any team.
    pub team_name: Option<String>,
}

impl User {
    #[must_use]
    pub fn new(id: impl Into<String>, username: impl Into<String>, is_active: bool) -> Self {
        Self {
            id: id.into(),
            username: username.into(),
            is_active,
            team_name: None,
        }
    }

    #[must_use]
    pub fn with_team(mut self, team_name: impl Into<String>) -> Self {
        self.team_name = Some(team_name.into());
        self
    }

    /// Whether the stored profile matches `other` in every field that an
    /// upsert would write.
    #[must_use]
    pub fn same_profile(&self, other: &Self) -> bool {
        self == other
    }

    /// Whether the user belongs to a team with a non-empty name.
    #[must_use]
    pub fn has_team(&self) -> bool {
        self.team_name.as_deref().is_some_and(|name| !name.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_user() -> User {
        User::new("user-1", "john_doe", true).with_team("backend-team")
    }

    #[test]
    fn test_same_profile_identical() {
        assert!(base_user().same_profile(&base_user()));
    }

    #[test]
    fn test_same_profile_detects_each_field() {
        let base = base_user();

        let mut other = base_user();
        other.id = "user-2".to_string();
        assert!(!base.same_profile(&other));

        let mut other = base_user();
        other.username = "john_smith".to_string();
        assert!(!base.same_profile(&other));

        let mut other = base_user();
        other.is_active = false;
        assert!(!base.same_profile(&other));

        let mut other = base_user();
        other.team_name = Some("frontend-team".to_string());
        assert!(!base.same_profile(&other));
    }

    #[test]
    fn test_same_profile_missing_team_vs_filled() {
        let without_team = User::new("user-1", "john_doe", true);
        assert!(!without_team.same_profile(&base_user()));
    }

    #[test]
    fn test_has_team() {
        assert!(base_user().has_team());
        assert!(!User::new("u1", "a", true).has_team());
        assert!(!User::new("u1", "a", true).with_team("").has_team());
    }
}
