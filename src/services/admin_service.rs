use std::sync::Arc;

use crate::backend::{AuthApi, Store};
use crate::dto::admin_dto::{CreateAdminPayload, CreatedAccountResponse};
use crate::error::Result;
use crate::models::profile::{Profile, Role};
use crate::services::candidate_service::{provision_account, AccountRequest};
use crate::utils::validation::validate;

#[derive(Clone)]
pub struct AdminService {
    store: Arc<dyn Store>,
    auth: Arc<dyn AuthApi>,
}

impl AdminService {
    pub fn new(store: Arc<dyn Store>, auth: Arc<dyn AuthApi>) -> Self {
        Self { store, auth }
    }

    pub async fn list(&self, token: &str) -> Result<Vec<Profile>> {
        self.store.list_profiles(token, Some(Role::Admin)).await
    }

    pub async fn create(
        &self,
        token: &str,
        payload: CreateAdminPayload,
    ) -> Result<CreatedAccountResponse> {
        validate(&payload)?;
        let created = provision_account(
            self.store.as_ref(),
            self.auth.as_ref(),
            token,
            AccountRequest {
                name: payload.name,
                email: payload.email,
                password: payload.password,
                role: Role::Admin,
                assigned_test_id: None,
            },
        )
        .await?;
        tracing::info!(admin_id = %created.profile.id, "admin account created");
        Ok(created)
    }
}
