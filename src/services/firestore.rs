use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde_json::{Map, Value};
use std::time::Duration;

use crate::core::ports::{ProfileStore, StoreError};
use crate::models::UserProfile;

/// Default Firestore REST endpoint
pub const DEFAULT_BASE_URL: &str = "https://firestore.googleapis.com/v1";

/// Firestore REST client for the user profile collection
///
/// Handles all communication with Firestore including:
/// - Fetching a single profile document
/// - Listing the collection page by page
/// - Decoding Firestore's typed values into plain profiles
pub struct FirestoreProfileStore {
    base_url: String,
    project_id: String,
    database_id: String,
    collection: String,
    api_token: Option<String>,
    page_size: u32,
    client: Client,
}

impl FirestoreProfileStore {
    /// Create a new Firestore client
    pub fn new(
        base_url: String,
        project_id: String,
        collection: String,
        api_token: Option<String>,
        page_size: u32,
    ) -> Result<Self, StoreError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| StoreError::Unavailable(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            base_url,
            project_id,
            database_id: "(default)".to_string(),
            collection,
            api_token,
            page_size: page_size.max(1),
            client,
        })
    }

    fn collection_url(&self) -> String {
        format!(
            "{}/projects/{}/databases/{}/documents/{}",
            self.base_url.trim_end_matches('/'),
            self.project_id,
            self.database_id,
            self.collection
        )
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.api_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn fetch_page(&self, page_token: Option<&str>) -> Result<(Vec<Value>, Option<String>), StoreError> {
        let mut url = format!("{}?pageSize={}", self.collection_url(), self.page_size);
        if let Some(token) = page_token {
            url.push_str("&pageToken=");
            url.push_str(&urlencoding::encode(token));
        }

        let response = self
            .authorize(self.client.get(&url))
            .send()
            .await
            .map_err(unavailable)?;

        if !response.status().is_success() {
            return Err(StoreError::Unavailable(format!(
                "Failed to list profiles: {}",
                response.status()
            )));
        }

        let json: Value = response.json().await.map_err(unavailable)?;

        // An empty collection comes back as `{}`
        let documents = json
            .get("documents")
            .and_then(|d| d.as_array())
            .cloned()
            .unwrap_or_default();

        let next = json
            .get("nextPageToken")
            .and_then(|t| t.as_str())
            .filter(|t| !t.is_empty())
            .map(str::to_string);

        Ok((documents, next))
    }
}

#[async_trait]
impl ProfileStore for FirestoreProfileStore {
    async fn get(&self, id: &str) -> Result<UserProfile, StoreError> {
        let url = format!("{}/{}", self.collection_url(), urlencoding::encode(id));

        tracing::debug!("Fetching profile for user: {}", id);

        let response = self
            .authorize(self.client.get(&url))
            .send()
            .await
            .map_err(unavailable)?;

        match response.status() {
            StatusCode::NOT_FOUND => return Err(StoreError::NotFound(id.to_string())),
            status if !status.is_success() => {
                let body = response.text().await.unwrap_or_else(|_| "Unable to read body".to_string());
                tracing::error!("Failed to fetch profile for {}: {} - {}", id, status, body);
                return Err(StoreError::Unavailable(format!("Failed to fetch profile: {}", status)));
            }
            _ => {}
        }

        let document: Value = response.json().await.map_err(unavailable)?;

        decode_document(&document)
    }

    async fn query_all_except(&self, id: &str) -> Result<Vec<UserProfile>, StoreError> {
        let mut profiles = Vec::new();
        let mut page_token: Option<String> = None;
        let mut pages = 0usize;

        loop {
            let (documents, next) = self.fetch_page(page_token.as_deref()).await?;
            pages += 1;

            for document in &documents {
                match decode_document(document) {
                    Ok(profile) if profile.id != id => profiles.push(profile),
                    Ok(_) => {}
                    Err(e) => tracing::warn!("Skipping undecodable profile document: {}", e),
                }
            }

            match next {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        tracing::debug!("Listed {} candidate profiles over {} pages", profiles.len(), pages);

        Ok(profiles)
    }
}

fn unavailable(e: reqwest::Error) -> StoreError {
    StoreError::Unavailable(e.to_string())
}

/// Turn a Firestore document into a profile
///
/// The document id (last segment of `name`) fills in `id` when the fields
/// do not carry one.
pub fn decode_document(document: &Value) -> Result<UserProfile, StoreError> {
    let fields = document
        .get("fields")
        .and_then(|f| f.as_object())
        .map(decode_fields)
        .unwrap_or_default();

    let mut data = fields;
    if !data.contains_key("id") && !data.contains_key("userId") && !data.contains_key("uid") {
        let doc_id = document
            .get("name")
            .and_then(|n| n.as_str())
            .and_then(|n| n.rsplit('/').next())
            .ok_or_else(|| StoreError::InvalidData("Document has neither id nor name".into()))?;
        data.insert("id".to_string(), Value::String(doc_id.to_string()));
    }

    serde_json::from_value(Value::Object(data))
        .map_err(|e| StoreError::InvalidData(format!("Failed to parse profile: {}", e)))
}

fn decode_fields(fields: &Map<String, Value>) -> Map<String, Value> {
    fields
        .iter()
        .map(|(key, value)| (key.clone(), decode_value(value)))
        .collect()
}

/// Convert one Firestore typed value into plain JSON
pub fn decode_value(value: &Value) -> Value {
    let Some(typed) = value.as_object() else {
        return Value::Null;
    };

    if let Some(v) = typed.get("stringValue") {
        return v.clone();
    }
    if let Some(v) = typed.get("integerValue") {
        // int64 values are sent as strings
        return match v {
            Value::String(s) => s.parse::<i64>().map(Value::from).unwrap_or(Value::Null),
            other => other.clone(),
        };
    }
    if let Some(v) = typed.get("doubleValue") {
        return v.clone();
    }
    if let Some(v) = typed.get("booleanValue") {
        return v.clone();
    }
    if let Some(v) = typed.get("timestampValue").or_else(|| typed.get("referenceValue")) {
        return v.clone();
    }
    if let Some(v) = typed.get("geoPointValue") {
        return v.clone();
    }
    if let Some(array) = typed.get("arrayValue") {
        let values = array
            .get("values")
            .and_then(|v| v.as_array())
            .map(|values| values.iter().map(decode_value).collect())
            .unwrap_or_default();
        return Value::Array(values);
    }
    if let Some(map) = typed.get("mapValue") {
        let fields = map
            .get("fields")
            .and_then(|f| f.as_object())
            .map(decode_fields)
            .unwrap_or_default();
        return Value::Object(fields);
    }

    Value::Null
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AgePreference, Decision};
    use mockito::Matcher;
    use serde_json::json;

    fn profile_document(id: &str, intention: &str) -> Value {
        json!({
            "name": format!("projects/p/databases/(default)/documents/users/{}", id),
            "fields": {
                "displayName": {"stringValue": format!("User {}", id)},
                "age": {"integerValue": "27"},
                "gender": {"stringValue": "woman"},
                "genderPreference": {"stringValue": "both"},
                "matchIntention": {"stringValue": intention},
                "agePreference": {"mapValue": {"fields": {
                    "min": {"integerValue": "24"},
                    "max": {"integerValue": "30"}
                }}},
                "musicPreference": {"arrayValue": {"values": [
                    {"stringValue": "pop"},
                    {"stringValue": "jazz"}
                ]}},
                "location": {"stringValue": "Los Angeles, CA"},
                "latitude": {"doubleValue": 34.0522},
                "longitude": {"doubleValue": -118.2437},
                "matches": {"mapValue": {"fields": {
                    "x1": {"stringValue": "liked"}
                }}},
                "profilePhoto": {"nullValue": null}
            }
        })
    }

    fn store(server: &mockito::ServerGuard) -> FirestoreProfileStore {
        FirestoreProfileStore::new(server.url(), "p".into(), "users".into(), Some("token".into()), 2)
            .unwrap()
    }

    #[test]
    fn test_decode_document() {
        let profile = decode_document(&profile_document("u1", "romantic")).unwrap();

        assert_eq!(profile.id, "u1");
        assert_eq!(profile.age, Some(27));
        assert_eq!(profile.age_preference, Some(AgePreference { min: 24, max: 30 }));
        assert_eq!(
            profile.music_preference,
            Some(vec!["pop".to_string(), "jazz".to_string()])
        );
        assert_eq!(profile.latitude, Some(34.0522));
        assert_eq!(profile.matches.get("x1"), Some(&Decision::Liked));
    }

    #[test]
    fn test_decode_null_matches() {
        let document = json!({
            "name": "projects/p/databases/(default)/documents/users/u2",
            "fields": {
                "gender": {"stringValue": "man"},
                "genderPreference": {"stringValue": "woman"},
                "matchIntention": {"stringValue": "romantic"},
                "matches": {"nullValue": null}
            }
        });

        let profile = decode_document(&document).unwrap();

        assert_eq!(profile.id, "u2");
        assert_eq!(profile.gender.as_deref(), Some("man"));
        assert!(profile.matches.is_empty());
    }

    #[test]
    fn test_decode_empty_array_and_map() {
        assert_eq!(decode_value(&json!({"arrayValue": {}})), json!([]));
        assert_eq!(decode_value(&json!({"mapValue": {}})), json!({}));
        assert_eq!(decode_value(&json!({"nullValue": null})), Value::Null);
    }

    #[tokio::test]
    async fn test_get_profile() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/projects/p/databases/(default)/documents/users/u1")
            .match_header("authorization", "Bearer token")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(profile_document("u1", "romantic").to_string())
            .create_async()
            .await;

        let profile = store(&server).get("u1").await.unwrap();

        assert_eq!(profile.id, "u1");
        assert_eq!(profile.match_intention.as_deref(), Some("romantic"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_get_missing_profile() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/projects/p/databases/(default)/documents/users/ghost")
            .with_status(404)
            .with_body(r#"{"error": {"code": 404, "status": "NOT_FOUND"}}"#)
            .create_async()
            .await;

        let result = store(&server).get("ghost").await;
        assert!(matches!(result, Err(StoreError::NotFound(id)) if id == "ghost"));
    }

    #[tokio::test]
    async fn test_get_server_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/projects/p/databases/(default)/documents/users/u1")
            .with_status(503)
            .create_async()
            .await;

        let result = store(&server).get("u1").await;
        assert!(matches!(result, Err(StoreError::Unavailable(_))));
    }

    #[tokio::test]
    async fn test_query_follows_pages_and_skips_self() {
        let mut server = mockito::Server::new_async().await;
        let path = "/projects/p/databases/(default)/documents/users";

        let first = server
            .mock("GET", path)
            .match_query(Matcher::Regex("^pageSize=2$".into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "documents": [profile_document("me", "romantic"), profile_document("a", "romantic")],
                    "nextPageToken": "page2"
                })
                .to_string(),
            )
            .create_async()
            .await;

        let second = server
            .mock("GET", path)
            .match_query(Matcher::Regex("pageToken=page2".into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "documents": [
                        profile_document("b", "friendship"),
                        {"name": "projects/p/databases/(default)/documents/users/broken",
                         "fields": {"age": {"stringValue": "not a number"}}}
                    ]
                })
                .to_string(),
            )
            .create_async()
            .await;

        let mut ids: Vec<String> = store(&server)
            .query_all_except("me")
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.id)
            .collect();
        ids.sort();

        assert_eq!(ids, vec!["a", "b"]);
        first.assert_async().await;
        second.assert_async().await;
    }

    #[tokio::test]
    async fn test_query_empty_collection() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/projects/p/databases/(default)/documents/users")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body("{}")
            .create_async()
            .await;

        let profiles = store(&server).query_all_except("me").await.unwrap();
        assert!(profiles.is_empty());
    }

    #[tokio::test]
    async fn test_query_failure() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/projects/p/databases/(default)/documents/users")
            .match_query(Matcher::Any)
            .with_status(500)
            .create_async()
            .await;

        let result = store(&server).query_all_except("me").await;
        assert!(matches!(result, Err(StoreError::Unavailable(_))));
    }
}
