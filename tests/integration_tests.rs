// Integration tests for HabiBeats Match

use actix_web::{test, web, App};
use async_trait::async_trait;
use habibeats_match::core::{
    CompatibilityEvaluator, DiscoveryError, DiscoveryPipeline, ProfileStore, StoreError,
};
use habibeats_match::models::{
    AgePreference, Coordinates, Decision, DiscoverResponse, EvaluateResponse, MatchingOptions, UserProfile,
};
use habibeats_match::routes::{self, matches::AppState};
use habibeats_match::services::{FixedLocationProvider, InMemoryProfileStore};
use serde_json::json;
use std::collections::HashSet;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

const LOS_ANGELES: Coordinates = Coordinates { latitude: 34.0522, longitude: -118.2437 };

fn acting_user() -> UserProfile {
    UserProfile {
        display_name: Some("U".to_string()),
        age: Some(27),
        gender: Some("woman".to_string()),
        gender_preference: Some("men".to_string()),
        age_preference: Some(AgePreference { min: 24, max: 30 }),
        music_preference: Some(vec!["pop".to_string()]),
        match_intention: Some("romantic".to_string()),
        location: Some("Los Angeles, CA".to_string()),
        latitude: Some(LOS_ANGELES.latitude),
        longitude: Some(LOS_ANGELES.longitude),
        ..UserProfile::new("u")
    }
}

/// Romantic, jazz-loving man about 60 miles north of the acting user
fn distant_candidate(id: &str) -> UserProfile {
    UserProfile {
        age: Some(28),
        gender: Some("man".to_string()),
        gender_preference: Some("women".to_string()),
        match_intention: Some("romantic".to_string()),
        music_preference: Some(vec!["jazz".to_string()]),
        location: Some("Lancaster, CA".to_string()),
        latitude: Some(34.9222),
        longitude: Some(-118.2437),
        ..UserProfile::new(id)
    }
}

fn evaluator() -> CompatibilityEvaluator {
    CompatibilityEvaluator::new(
        Arc::new(FixedLocationProvider::new(LOS_ANGELES)),
        MatchingOptions::default(),
    )
}

fn ids(profiles: &[UserProfile]) -> HashSet<&str> {
    profiles.iter().map(|p| p.id.as_str()).collect()
}

struct UnreachableStore;

#[async_trait]
impl ProfileStore for UnreachableStore {
    async fn get(&self, _id: &str) -> Result<UserProfile, StoreError> {
        Err(StoreError::Unavailable("connection refused".to_string()))
    }

    async fn query_all_except(&self, _id: &str) -> Result<Vec<UserProfile>, StoreError> {
        Err(StoreError::Unavailable("connection refused".to_string()))
    }
}

#[tokio::test]
async fn test_end_to_end_scenario() {
    let mut user = acting_user();
    user.matches.insert("c2".to_string(), Decision::Liked);

    let c1 = distant_candidate("c1");
    let c2 = distant_candidate("c2");

    let signals = evaluator().evaluate(&user, &c1).await;
    assert!(signals.match_intention);
    assert!(!signals.music);
    assert!(!signals.location);
    assert!(signals.is_match());

    let store = InMemoryProfileStore::with_profiles(vec![user, c1, c2]);
    let pipeline = DiscoveryPipeline::new(Arc::new(store), evaluator());

    let outcome = pipeline
        .discover_candidates("u", &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(ids(&outcome.candidates), HashSet::from(["c1"]));
    assert_eq!(outcome.total_candidates, 2);
    assert_eq!(outcome.excluded, 1);
}

#[tokio::test]
async fn test_disliked_candidates_are_excluded_too() {
    let mut user = acting_user();
    user.matches.insert("c1".to_string(), Decision::Disliked);

    let store = InMemoryProfileStore::with_profiles(vec![user, distant_candidate("c1")]);
    let pipeline = DiscoveryPipeline::new(Arc::new(store), evaluator());

    let outcome = tokio_test::assert_ok!(
        pipeline.discover_candidates("u", &CancellationToken::new()).await
    );

    assert!(outcome.candidates.is_empty());
    assert_eq!(outcome.excluded, 1);
}

#[tokio::test]
async fn test_unknown_acting_user() {
    let store = InMemoryProfileStore::with_profiles(vec![distant_candidate("c1")]);
    let pipeline = DiscoveryPipeline::new(Arc::new(store), evaluator());

    let err = tokio_test::assert_err!(
        pipeline.discover_candidates("u", &CancellationToken::new()).await
    );
    assert!(matches!(err, DiscoveryError::ProfileNotFound(id) if id == "u"));
}

#[tokio::test]
async fn test_many_candidates_evaluated_concurrently() {
    let mut profiles: Vec<UserProfile> = (0..200)
        .map(|i| {
            let mut candidate = distant_candidate(&format!("c{}", i));
            if i % 2 == 1 {
                candidate.match_intention = Some("friendship".to_string());
            }
            candidate
        })
        .collect();
    profiles.push(acting_user());

    let evaluator = CompatibilityEvaluator::new(
        Arc::new(FixedLocationProvider::new(LOS_ANGELES)),
        MatchingOptions {
            max_concurrent_evaluations: 8,
            ..MatchingOptions::default()
        },
    );
    let pipeline = DiscoveryPipeline::new(Arc::new(InMemoryProfileStore::with_profiles(profiles)), evaluator);

    let outcome = pipeline
        .discover_candidates("u", &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(outcome.total_candidates, 200);
    assert_eq!(outcome.candidates.len(), 100);
    assert!(outcome
        .candidates
        .iter()
        .all(|c| c.match_intention.as_deref() == Some("romantic")));
}

async fn sample_state() -> AppState {
    let store = InMemoryProfileStore::from_json_file("config/profiles.sample.json")
        .await
        .expect("sample profiles should load");

    AppState {
        store: Arc::new(store),
        postgres: None,
        matching: MatchingOptions::default(),
        default_location: None,
    }
}

#[actix_web::test]
async fn test_api_discover() {
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(sample_state().await))
            .configure(routes::configure_routes),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/v1/matches/discover")
        .set_json(json!({"userId": "maya"}))
        .to_request();
    let resp: DiscoverResponse = test::call_and_read_body_json(&app, req).await;

    assert_eq!(ids(&resp.candidates), HashSet::from(["karim", "sami"]));
    assert_eq!(resp.total_candidates, 4);
    assert_eq!(resp.excluded, 1);
}

#[actix_web::test]
async fn test_api_evaluate() {
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(sample_state().await))
            .configure(routes::configure_routes),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/v1/matches/evaluate")
        .set_json(json!({"userId": "maya", "candidateId": "lina"}))
        .to_request();
    let resp: EvaluateResponse = test::call_and_read_body_json(&app, req).await;

    assert!(resp.signals.music);
    assert!(!resp.signals.age);
    assert!(!resp.signals.gender);
    assert!(!resp.signals.location);
    assert!(!resp.is_match);
}

#[actix_web::test]
async fn test_api_errors() {
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(sample_state().await))
            .configure(routes::configure_routes),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/v1/matches/discover")
        .set_json(json!({"userId": "ghost"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 404);

    let req = test::TestRequest::post()
        .uri("/api/v1/matches/discover")
        .set_json(json!({"userId": ""}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);

    let req = test::TestRequest::post()
        .uri("/api/v1/matches/evaluate")
        .set_json(json!({"userId": "maya", "candidateId": "ghost"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 404);
}

#[actix_web::test]
async fn test_api_store_unavailable() {
    let state = AppState {
        store: Arc::new(UnreachableStore),
        postgres: None,
        matching: MatchingOptions::default(),
        default_location: None,
    };
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(state))
            .configure(routes::configure_routes),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/v1/matches/discover")
        .set_json(json!({"userId": "maya"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 503);

    let req = test::TestRequest::get().uri("/api/v1/health").to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());
}
