#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use assessment_console::{
    backend::{AuthApi, AuthSession, AuthUser, NewAccount, Store},
    build_router,
    config::Config,
    error::{Error, Result},
    models::{
        profile::{NewProfile, Profile, ProfilePatch, ProfileStatus, Role},
        result::ResultRecord,
        test::{Test, TestRow},
    },
    dto::webhook_dto::AnswerPayload,
    services::webhook_service::AnswerSink,
    AppState,
};
use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::{json, Value as JsonValue};
use tower::ServiceExt;
use uuid::Uuid;

pub const JWT_SECRET: &str = "integration-secret";

pub fn config() -> Config {
    Config {
        server_address: "127.0.0.1:0".into(),
        backend_url: "http://backend.invalid".into(),
        backend_anon_key: "anon".into(),
        backend_jwt_secret: JWT_SECRET.into(),
        answer_webhook_url: "http://webhook.invalid".into(),
        webhook_timeout_secs: 5,
        admin_rps: 1000,
        public_rps: 1000,
    }
}

/// Access token shaped like the ones the hosted auth service issues.
pub fn mint_token(user_id: Uuid, role: Role) -> String {
    let exp = (chrono::Utc::now().timestamp() + 3600) as usize;
    let claims = json!({
        "sub": user_id.to_string(),
        "exp": exp,
        "aud": "authenticated",
        "email": format!("{}@example.com", role.as_str()),
        "user_metadata": { "role": role.as_str(), "name": "Test User" },
    });
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    )
    .expect("encode token")
}

#[derive(Default)]
struct Rows {
    profiles: HashMap<Uuid, Profile>,
    tests: HashMap<Uuid, Test>,
    results: Vec<ResultRecord>,
    passwords: HashMap<String, (Uuid, Role)>,
}

/// In-memory rows and accounts standing in for the hosted backend.
#[derive(Clone, Default)]
pub struct FakeBackend {
    rows: Arc<Mutex<Rows>>,
    pub profile_updates: Arc<Mutex<Vec<(Uuid, ProfilePatch)>>>,
}

impl FakeBackend {
    pub fn add_profile(&self, profile: Profile) {
        self.rows.lock().unwrap().profiles.insert(profile.id, profile);
    }

    pub fn add_test(&self, test: Test) {
        self.rows.lock().unwrap().tests.insert(test.id, test);
    }

    pub fn add_result(&self, record: ResultRecord) {
        self.rows.lock().unwrap().results.push(record);
    }

    pub fn add_login(&self, email: &str, user_id: Uuid, role: Role) {
        self.rows
            .lock()
            .unwrap()
            .passwords
            .insert(email.to_string(), (user_id, role));
    }

    pub fn profile(&self, id: Uuid) -> Option<Profile> {
        self.rows.lock().unwrap().profiles.get(&id).cloned()
    }
}

#[async_trait]
impl Store for FakeBackend {
    async fn list_profiles(&self, _token: &str, role: Option<Role>) -> Result<Vec<Profile>> {
        let rows = self.rows.lock().unwrap();
        Ok(rows
            .profiles
            .values()
            .filter(|p| role.map(|r| p.role == r).unwrap_or(true))
            .cloned()
            .collect())
    }

    async fn get_profile(&self, _token: &str, id: Uuid) -> Result<Option<Profile>> {
        Ok(self.profile(id))
    }

    async fn upsert_profile(&self, _token: &str, p: &NewProfile) -> Result<Profile> {
        let profile = Profile {
            id: p.id,
            name: Some(p.name.clone()),
            email: p.email.clone(),
            role: p.role,
            status: p.status,
            assigned_test_id: p.assigned_test_id,
            score: None,
            completion_date: None,
            created_at: Some(chrono::Utc::now()),
        };
        self.add_profile(profile.clone());
        Ok(profile)
    }

    async fn update_profile(&self, _token: &str, id: Uuid, patch: &ProfilePatch) -> Result<Profile> {
        self.profile_updates.lock().unwrap().push((id, patch.clone()));
        let mut rows = self.rows.lock().unwrap();
        let profile = rows
            .profiles
            .get_mut(&id)
            .ok_or_else(|| Error::NotFound("profile".into()))?;
        if let Some(name) = &patch.name {
            profile.name = Some(name.clone());
        }
        if let Some(assigned) = patch.assigned_test_id {
            profile.assigned_test_id = assigned;
        }
        if let Some(status) = patch.status {
            profile.status = status;
        }
        if let Some(date) = patch.completion_date {
            profile.completion_date = Some(date);
        }
        Ok(profile.clone())
    }

    async fn list_tests(&self, _token: &str) -> Result<Vec<Test>> {
        Ok(self.rows.lock().unwrap().tests.values().cloned().collect())
    }

    async fn get_test(&self, _token: &str, id: Uuid) -> Result<Option<Test>> {
        Ok(self.rows.lock().unwrap().tests.get(&id).cloned())
    }

    async fn insert_test(&self, _token: &str, row: &TestRow) -> Result<Test> {
        let test = Test {
            id: Uuid::new_v4(),
            title: row.title.clone(),
            description: row.description.clone(),
            is_active: row.is_active,
            questions: row.questions.clone(),
            created_at: Some(chrono::Utc::now()),
        };
        self.add_test(test.clone());
        Ok(test)
    }

    async fn replace_test(&self, _token: &str, id: Uuid, row: &TestRow) -> Result<Test> {
        let mut rows = self.rows.lock().unwrap();
        let test = rows
            .tests
            .get_mut(&id)
            .ok_or_else(|| Error::NotFound("test".into()))?;
        test.title = row.title.clone();
        test.description = row.description.clone();
        test.is_active = row.is_active;
        test.questions = row.questions.clone();
        Ok(test.clone())
    }

    async fn set_test_active(&self, _token: &str, id: Uuid, is_active: bool) -> Result<Test> {
        let mut rows = self.rows.lock().unwrap();
        let test = rows
            .tests
            .get_mut(&id)
            .ok_or_else(|| Error::NotFound("test".into()))?;
        test.is_active = is_active;
        Ok(test.clone())
    }

    async fn list_results(&self, _token: &str) -> Result<Vec<ResultRecord>> {
        Ok(self.rows.lock().unwrap().results.clone())
    }

    async fn get_result(&self, _token: &str, id: Uuid) -> Result<Option<ResultRecord>> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .results
            .iter()
            .find(|r| r.id == id)
            .cloned())
    }
}

#[async_trait]
impl AuthApi for FakeBackend {
    async fn sign_in(&self, email: &str, _password: &str) -> Result<AuthSession> {
        let found = self.rows.lock().unwrap().passwords.get(email).copied();
        let Some((id, role)) = found else {
            return Err(Error::Backend {
                status: 400,
                message: "Incorrect email or password.".into(),
            });
        };
        Ok(AuthSession {
            access_token: mint_token(id, role),
            refresh_token: None,
            expires_in: Some(3600),
            user: AuthUser {
                id,
                email: Some(email.to_string()),
                user_metadata: json!({ "role": role.as_str() }),
            },
        })
    }

    async fn sign_out(&self, _access_token: &str, _user_id: Uuid) -> Result<()> {
        Ok(())
    }

    async fn create_account(&self, account: &NewAccount) -> Result<AuthUser> {
        let id = Uuid::new_v4();
        self.add_login(&account.email, id, account.role);
        Ok(AuthUser {
            id,
            email: Some(account.email.clone()),
            user_metadata: json!({ "role": account.role.as_str(), "name": account.name }),
        })
    }
}

/// Webhook stand-in that records deliveries and can be told to fail.
#[derive(Clone, Default)]
pub struct RecordingSink {
    pub delivered: Arc<Mutex<Vec<AnswerPayload>>>,
    pub fail: Arc<Mutex<bool>>,
}

impl RecordingSink {
    pub fn set_failing(&self, failing: bool) {
        *self.fail.lock().unwrap() = failing;
    }

    pub fn deliveries(&self) -> Vec<AnswerPayload> {
        self.delivered.lock().unwrap().clone()
    }
}

#[async_trait]
impl AnswerSink for RecordingSink {
    async fn deliver(&self, payload: &AnswerPayload) -> Result<()> {
        if *self.fail.lock().unwrap() {
            return Err(Error::Backend {
                status: 502,
                message: "webhook down".into(),
            });
        }
        self.delivered.lock().unwrap().push(payload.clone());
        Ok(())
    }
}

pub struct TestApp {
    pub router: Router,
    pub backend: FakeBackend,
    pub sink: RecordingSink,
    pub state: AppState,
}

pub fn test_app() -> TestApp {
    let backend = FakeBackend::default();
    let sink = RecordingSink::default();
    let state = AppState::new(
        config(),
        Arc::new(backend.clone()),
        Arc::new(backend.clone()),
        Arc::new(sink.clone()),
    );
    TestApp {
        router: build_router(state.clone()),
        backend,
        sink,
        state,
    }
}

impl TestApp {
    pub async fn send(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<JsonValue>,
    ) -> (StatusCode, JsonValue) {
        let (status, bytes) = self.send_raw(method, uri, token, body).await;
        let json = if bytes.is_empty() {
            JsonValue::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(JsonValue::Null)
        };
        (status, json)
    }

    pub async fn send_raw(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<JsonValue>,
    ) -> (StatusCode, Vec<u8>) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(t) = token {
            builder = builder.header("authorization", format!("Bearer {}", t));
        }
        let req = match body {
            Some(b) => builder
                .header("content-type", "application/json")
                .body(Body::from(b.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        let resp = self.router.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        (status, bytes.to_vec())
    }
}

pub fn candidate_profile(id: Uuid, status: ProfileStatus, test_id: Option<Uuid>) -> Profile {
    Profile {
        id,
        name: Some("Casey".into()),
        email: "casey@example.com".into(),
        role: Role::Candidate,
        status,
        assigned_test_id: test_id,
        score: None,
        completion_date: None,
        created_at: Some(chrono::Utc::now()),
    }
}

/// Scale question followed by a single choice question.
pub fn t1(is_active: bool) -> Test {
    serde_json::from_value(json!({
        "id": Uuid::new_v4(),
        "title": "T1",
        "is_active": is_active,
        "questions": [
            { "id": "q1", "text": "I enjoy leading", "type": "scale", "category": "Leadership" },
            { "id": "q2", "text": "Pick one", "type": "choice",
              "options": [{ "text": "Option A" }, { "text": "Option B" }] }
        ]
    }))
    .expect("t1")
}
