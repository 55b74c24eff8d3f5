use async_trait::async_trait;
use reqwest::Method;
use serde_json::json;
use uuid::Uuid;

use super::client::{read_json, BackendClient};
use crate::error::{Error, Result};
use crate::models::profile::{NewProfile, Profile, ProfilePatch, Role};
use crate::models::result::ResultRecord;
use crate::models::test::{Test, TestRow};

pub const PROFILES: &str = "profiles";
pub const TESTS: &str = "tests";
pub const RESULTS: &str = "result_test";

/// Row access on the hosted backend. Every call carries the caller's access
/// token so the backend's row-level rules apply.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Store: Send + Sync {
    async fn list_profiles(&self, token: &str, role: Option<Role>) -> Result<Vec<Profile>>;

    async fn get_profile(&self, token: &str, id: Uuid) -> Result<Option<Profile>>;

    async fn upsert_profile(&self, token: &str, profile: &NewProfile) -> Result<Profile>;

    async fn update_profile(&self, token: &str, id: Uuid, patch: &ProfilePatch) -> Result<Profile>;

    async fn list_tests(&self, token: &str) -> Result<Vec<Test>>;

    async fn get_test(&self, token: &str, id: Uuid) -> Result<Option<Test>>;

    async fn insert_test(&self, token: &str, row: &TestRow) -> Result<Test>;

    async fn replace_test(&self, token: &str, id: Uuid, row: &TestRow) -> Result<Test>;

    async fn set_test_active(&self, token: &str, id: Uuid, is_active: bool) -> Result<Test>;

    async fn list_results(&self, token: &str) -> Result<Vec<ResultRecord>>;

    async fn get_result(&self, token: &str, id: Uuid) -> Result<Option<ResultRecord>>;
}

fn eq(id: Uuid) -> String {
    format!("eq.{}", id)
}

fn single<T>(mut rows: Vec<T>, what: &str) -> Result<T> {
    if rows.is_empty() {
        return Err(Error::NotFound(format!("{} not found", what)));
    }
    Ok(rows.swap_remove(0))
}

#[async_trait]
impl Store for BackendClient {
    async fn list_profiles(&self, token: &str, role: Option<Role>) -> Result<Vec<Profile>> {
        let mut query = vec![
            ("select", "*".to_string()),
            ("order", "created_at.desc".to_string()),
        ];
        if let Some(role) = role {
            query.push(("role", format!("eq.{}", role.as_str())));
        }
        let resp = self
            .rest(Method::GET, PROFILES, token)?
            .query(&query)
            .send()
            .await?;
        read_json(resp).await
    }

    async fn get_profile(&self, token: &str, id: Uuid) -> Result<Option<Profile>> {
        let resp = self
            .rest(Method::GET, PROFILES, token)?
            .query(&[("select", "*".to_string()), ("id", eq(id))])
            .send()
            .await?;
        let rows: Vec<Profile> = read_json(resp).await?;
        Ok(rows.into_iter().next())
    }

    async fn upsert_profile(&self, token: &str, profile: &NewProfile) -> Result<Profile> {
        let resp = self
            .rest(Method::POST, PROFILES, token)?
            .header("Prefer", "resolution=merge-duplicates,return=representation")
            .json(&[profile])
            .send()
            .await?;
        single(read_json(resp).await?, "Profile")
    }

    async fn update_profile(&self, token: &str, id: Uuid, patch: &ProfilePatch) -> Result<Profile> {
        let resp = self
            .rest(Method::PATCH, PROFILES, token)?
            .query(&[("id", eq(id))])
            .header("Prefer", "return=representation")
            .json(patch)
            .send()
            .await?;
        single(read_json(resp).await?, "Profile")
    }

    async fn list_tests(&self, token: &str) -> Result<Vec<Test>> {
        let resp = self
            .rest(Method::GET, TESTS, token)?
            .query(&[("select", "*"), ("order", "created_at.desc")])
            .send()
            .await?;
        read_json(resp).await
    }

    async fn get_test(&self, token: &str, id: Uuid) -> Result<Option<Test>> {
        let resp = self
            .rest(Method::GET, TESTS, token)?
            .query(&[("select", "*".to_string()), ("id", eq(id))])
            .send()
            .await?;
        let rows: Vec<Test> = read_json(resp).await?;
        Ok(rows.into_iter().next())
    }

    async fn insert_test(&self, token: &str, row: &TestRow) -> Result<Test> {
        let resp = self
            .rest(Method::POST, TESTS, token)?
            .header("Prefer", "return=representation")
            .json(&[row])
            .send()
            .await?;
        single(read_json(resp).await?, "Test")
    }

    async fn replace_test(&self, token: &str, id: Uuid, row: &TestRow) -> Result<Test> {
        let resp = self
            .rest(Method::PATCH, TESTS, token)?
            .query(&[("id", eq(id))])
            .header("Prefer", "return=representation")
            .json(row)
            .send()
            .await?;
        single(read_json(resp).await?, "Test")
    }

    async fn set_test_active(&self, token: &str, id: Uuid, is_active: bool) -> Result<Test> {
        let resp = self
            .rest(Method::PATCH, TESTS, token)?
            .query(&[("id", eq(id))])
            .header("Prefer", "return=representation")
            .json(&json!({ "is_active": is_active }))
            .send()
            .await?;
        single(read_json(resp).await?, "Test")
    }

    async fn list_results(&self, token: &str) -> Result<Vec<ResultRecord>> {
        let resp = self
            .rest(Method::GET, RESULTS, token)?
            .query(&[("select", "*"), ("order", "created_at.desc")])
            .send()
            .await?;
        read_json(resp).await
    }

    async fn get_result(&self, token: &str, id: Uuid) -> Result<Option<ResultRecord>> {
        let resp = self
            .rest(Method::GET, RESULTS, token)?
            .query(&[("select", "*".to_string()), ("id", eq(id))])
            .send()
            .await?;
        let rows: Vec<ResultRecord> = read_json(resp).await?;
        Ok(rows.into_iter().next())
    }
}
