//! In-memory panel for unit tests.

use crate::domain::{User, UserModification, UserStatus};
use crate::services::panel_service::{AccessContext, PanelApi, PanelError};
use std::collections::HashSet;
use std::sync::Mutex;

pub struct FakePanel {
    users: Vec<User>,
    failing_users: HashSet<String>,
    fail_listing: bool,
    modifications: Mutex<Vec<(String, UserModification)>>,
    deletions: Mutex<Vec<String>>,
}

impl FakePanel {
    pub fn new(users: Vec<User>) -> Self {
        Self {
            users,
            failing_users: HashSet::new(),
            fail_listing: false,
            modifications: Mutex::new(Vec::new()),
            deletions: Mutex::new(Vec::new()),
        }
    }

    pub fn failing_on(mut self, username: &str) -> Self {
        self.failing_users.insert(username.to_string());
        self
    }

    pub const fn failing_listing(mut self) -> Self {
        self.fail_listing = true;
        self
    }

    pub fn session(&self) -> AccessContext {
        AccessContext::bearer("admin", "fake-token").unwrap()
    }

    pub fn users(&self) -> Vec<User> {
        self.users.clone()
    }

    pub fn modifications(&self) -> Vec<(String, UserModification)> {
        self.modifications.lock().unwrap().clone()
    }

    pub fn deletions(&self) -> Vec<String> {
        self.deletions.lock().unwrap().clone()
    }

    fn check(&self, username: &str) -> Result<(), PanelError> {
        if self.failing_users.contains(username) {
            return Err(PanelError::Http {
                status: 500,
                body: format!("cannot touch {username}"),
            });
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl PanelApi for FakePanel {
    async fn authenticate(
        &self,
        username: &str,
        password: &str,
    ) -> Result<AccessContext, PanelError> {
        if password == "wrong" {
            return Err(PanelError::Auth("401 invalid credentials".to_string()));
        }
        AccessContext::bearer(username, "fake-token")
    }

    async fn list_users(
        &self,
        _access: &AccessContext,
        status: Option<UserStatus>,
    ) -> Result<Vec<User>, PanelError> {
        if self.fail_listing {
            return Err(PanelError::Http {
                status: 500,
                body: "listing unavailable".to_string(),
            });
        }
        Ok(self
            .users
            .iter()
            .filter(|u| status.is_none_or(|s| s == u.status))
            .cloned()
            .collect())
    }

    async fn modify_user(
        &self,
        _access: &AccessContext,
        username: &str,
        changes: &UserModification,
    ) -> Result<(), PanelError> {
        self.check(username)?;
        self.modifications
            .lock()
            .unwrap()
            .push((username.to_string(), changes.clone()));
        Ok(())
    }

    async fn delete_user(&self, _access: &AccessContext, username: &str) -> Result<(), PanelError> {
        self.check(username)?;
        self.deletions.lock().unwrap().push(username.to_string());
        Ok(())
    }
}
