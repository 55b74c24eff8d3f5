use std::collections::HashMap;
use std::sync::Arc;

use uuid::Uuid;

use crate::backend::{AuthApi, NewAccount, Store};
use crate::dto::admin_dto::{
    CandidateSummary, CreateCandidatePayload, CreatedAccountResponse, UpdateCandidatePayload,
};
use crate::error::{Error, Result};
use crate::models::profile::{NewProfile, Profile, ProfilePatch, ProfileStatus, Role};
use crate::utils::token::{generate_temp_password, TEMP_PASSWORD_LEN};
use crate::utils::validation::{clean_optional, validate};

#[derive(Clone)]
pub struct CandidateService {
    store: Arc<dyn Store>,
    auth: Arc<dyn AuthApi>,
}

impl CandidateService {
    pub fn new(store: Arc<dyn Store>, auth: Arc<dyn AuthApi>) -> Self {
        Self { store, auth }
    }

    /// Candidates annotated with the title of their assigned test.
    pub async fn list(&self, token: &str) -> Result<Vec<CandidateSummary>> {
        let (profiles, tests) = tokio::try_join!(
            self.store.list_profiles(token, Some(Role::Candidate)),
            self.store.list_tests(token),
        )?;
        let titles: HashMap<Uuid, String> = tests.into_iter().map(|t| (t.id, t.title)).collect();

        Ok(profiles
            .into_iter()
            .map(|profile| CandidateSummary {
                test_title: profile
                    .assigned_test_id
                    .and_then(|id| titles.get(&id).cloned()),
                profile,
            })
            .collect())
    }

    pub async fn create(
        &self,
        token: &str,
        payload: CreateCandidatePayload,
    ) -> Result<CreatedAccountResponse> {
        validate(&payload)?;
        if let Some(test_id) = payload.assigned_test_id {
            self.ensure_test_exists(token, test_id).await?;
        }
        provision_account(
            self.store.as_ref(),
            self.auth.as_ref(),
            token,
            AccountRequest {
                name: payload.name,
                email: payload.email,
                password: payload.password,
                role: Role::Candidate,
                assigned_test_id: payload.assigned_test_id,
            },
        )
        .await
    }

    /// Only the name and the assigned test are editable from the roster.
    pub async fn update(
        &self,
        token: &str,
        id: Uuid,
        payload: UpdateCandidatePayload,
    ) -> Result<Profile> {
        validate(&payload)?;
        if let Some(Some(test_id)) = payload.assigned_test_id {
            self.ensure_test_exists(token, test_id).await?;
        }
        let patch = ProfilePatch {
            name: payload.name.map(|n| n.trim().to_string()),
            assigned_test_id: payload.assigned_test_id,
            ..Default::default()
        };
        if patch.is_empty() {
            return Err(Error::BadRequest("Nothing to update".into()));
        }
        let profile = self.store.update_profile(token, id, &patch).await?;
        tracing::info!(candidate_id = %id, "candidate updated");
        Ok(profile)
    }

    async fn ensure_test_exists(&self, token: &str, test_id: Uuid) -> Result<()> {
        match self.store.get_test(token, test_id).await? {
            Some(_) => Ok(()),
            None => Err(Error::BadRequest("Assigned test does not exist".into())),
        }
    }
}

pub(crate) struct AccountRequest {
    pub name: String,
    pub email: String,
    pub password: Option<String>,
    pub role: Role,
    pub assigned_test_id: Option<Uuid>,
}

/// Signs the account up through an isolated auth handle, then writes its
/// profile row with the caller's token.
pub(crate) async fn provision_account(
    store: &dyn Store,
    auth: &dyn AuthApi,
    token: &str,
    request: AccountRequest,
) -> Result<CreatedAccountResponse> {
    let (password, temporary_password) = match clean_optional(request.password) {
        Some(pw) => (pw, None),
        None => {
            let generated = generate_temp_password(TEMP_PASSWORD_LEN);
            (generated.clone(), Some(generated))
        }
    };
    let name = request.name.trim().to_string();
    let email = request.email.trim().to_lowercase();

    let user = auth
        .create_account(&NewAccount {
            email: email.clone(),
            password,
            name: name.clone(),
            role: request.role,
        })
        .await?;

    let profile = store
        .upsert_profile(
            token,
            &NewProfile {
                id: user.id,
                name,
                email: user.email.unwrap_or(email),
                role: request.role,
                status: ProfileStatus::Pending,
                assigned_test_id: request.assigned_test_id,
            },
        )
        .await?;

    Ok(CreatedAccountResponse {
        profile,
        temporary_password,
    })
}
