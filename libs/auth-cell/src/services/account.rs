use serde_json::json;
use tracing::{debug, info};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::SupabaseClient;
use shared_models::auth::Role;

use crate::models::AppUser;
use crate::AuthError;

/// Reads and writes `app_users`.
pub struct AccountService {
    supabase: SupabaseClient,
}

impl AccountService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    pub async fn find_by_username(&self, username: &str) -> Result<Option<AppUser>, AuthError> {
        debug!("Looking up account {}", username);

        let path = format!(
            "/rest/v1/app_users?username=eq.{}&select=*",
            urlencoding::encode(username)
        );
        Ok(self.supabase.select_one(&path).await?)
    }

    pub async fn get_user(&self, user_id: Uuid) -> Result<Option<AppUser>, AuthError> {
        let path = format!("/rest/v1/app_users?id=eq.{}&select=*", user_id);
        Ok(self.supabase.select_one(&path).await?)
    }

    pub async fn username_taken(&self, username: &str) -> Result<bool, AuthError> {
        Ok(self
            .find_by_username(username)
            .await?
            .is_some_and(|user| user.is_active))
    }

    /// A unique-username conflict from the database surfaces as `UsernameTaken`.
    pub async fn create_user(
        &self,
        username: &str,
        password_hash: &str,
        role: Role,
    ) -> Result<AppUser, AuthError> {
        let body = json!({
            "username": username,
            "password_hash": password_hash,
            "role": role,
            "is_active": true,
        });

        let mut rows: Vec<AppUser> = match self.supabase.insert("app_users", body).await {
            Ok(rows) => rows,
            Err(e) if e.is_conflict() => return Err(AuthError::UsernameTaken),
            Err(e) => return Err(e.into()),
        };
        let user = rows.pop().ok_or(AuthError::NotSaved)?;

        info!("Account {} created for {}", user.id, username);
        Ok(user)
    }

    pub async fn delete_user(&self, user_id: Uuid) -> Result<(), AuthError> {
        let path = format!("/rest/v1/app_users?id=eq.{}", user_id);
        self.supabase.delete(&path).await?;
        info!("Account {} removed", user_id);
        Ok(())
    }
}
