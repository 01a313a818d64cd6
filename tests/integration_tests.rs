// Integration tests for Moodbite

use actix_web::{test, web, App};
use moodbite::core::{
    offline_restaurants, CandidateSource, CurationCatalog, Pipeline, PipelineState, QueryInterpreter,
    Recommender, SavedSet, SearchSession, SessionRegistry, SubmitOutcome,
};
use moodbite::routes::{configure_routes, AppState};
use moodbite::services::{ChatClient, RestaurantFinderClient};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

const UNREACHABLE: &str = "http://127.0.0.1:9";

fn chat_client(url: String, key: Option<&str>) -> Arc<ChatClient> {
    Arc::new(
        ChatClient::new(url, key.map(str::to_string), "test-model".to_string(), Duration::from_secs(5))
            .unwrap(),
    )
}

fn finder_client(url: String, token: Option<&str>) -> Arc<RestaurantFinderClient> {
    Arc::new(
        RestaurantFinderClient::new(
            url,
            "someone~finder".to_string(),
            token.map(str::to_string),
            Duration::ZERO,
            Duration::from_secs(5),
        )
        .unwrap(),
    )
}

fn build_pipeline(llm: Arc<ChatClient>, finder: Arc<RestaurantFinderClient>) -> Arc<Pipeline> {
    Arc::new(Pipeline::new(
        QueryInterpreter::new(Arc::clone(&llm)),
        CandidateSource::new(finder, 20),
        Recommender::new(llm, 10, 6),
        "Brooklyn, NY".to_string(),
        Duration::from_secs(30),
    ))
}

fn offline_pipeline() -> Arc<Pipeline> {
    build_pipeline(
        chat_client(UNREACHABLE.to_string(), None),
        finder_client(UNREACHABLE.to_string(), None),
    )
}

fn chat_body(content: &str) -> String {
    json!({ "choices": [{ "message": { "content": content } }] }).to_string()
}

#[tokio::test]
async fn test_integration_end_to_end_with_upstreams() {
    let mut server = mockito::Server::new_async().await;

    let run = server
        .mock("POST", "/v2/acts/someone~finder/runs")
        .match_body(mockito::Matcher::PartialJson(json!({
            "input": {"searchQuery": "cozy Italian dinner", "location": "Queens, NY"}
        })))
        .with_status(201)
        .with_header("content-type", "application/json")
        .with_body(r#"{"data":{"id":"run-7"}}"#)
        .create_async()
        .await;
    let items = server
        .mock("GET", "/v2/acts/someone~finder/runs/run-7/dataset/items")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"[
                {"id": "place-a", "name": "Trattoria Uno", "cuisine": "Italian", "atmosphere": "Cozy", "priceRange": "$$", "rating": 4.6},
                {"id": "place-b", "name": "Candle & Pasta", "cuisine": "Italian", "atmosphere": "Romantic", "priceRange": "upscale", "rating": 4.8},
                {"id": "place-c", "name": "Burger Shack", "cuisine": "American", "rating": 3.9}
            ]"#,
        )
        .create_async()
        .await;
    let parse = server
        .mock("POST", "/chat/completions")
        .match_body(mockito::Matcher::Regex("restaurant search assistant".to_string()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(chat_body(
            r#"{"cuisine": ["Italian"], "vibe": ["cozy"], "priceRange": "mid-range", "searchTerms": ["pasta"]}"#,
        ))
        .create_async()
        .await;
    let rank = server
        .mock("POST", "/chat/completions")
        .match_body(mockito::Matcher::Regex("recommendation expert".to_string()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(chat_body(
            r#"Here you go: [
                {"id": "apify:place-a", "relevanceScore": 7, "matchReason": "Warm and casual"},
                {"id": "apify:place-b", "name": "Renamed", "relevanceScore": 9, "matchReason": "Candlelit", "enhancedDescription": "Soft light, fresh pasta."}
            ]"#,
        ))
        .create_async()
        .await;

    let pipeline = build_pipeline(
        chat_client(server.url(), Some("key")),
        finder_client(server.url(), Some("token")),
    );
    let session = Arc::new(SearchSession::new("u1", pipeline));

    let outcome = session
        .submit("  cozy Italian dinner ", Some("Queens, NY"))
        .await
        .unwrap();

    let ranked = match outcome {
        SubmitOutcome::Completed(PipelineState::Results { ranked, query }) => {
            assert_eq!(query, "cozy Italian dinner");
            ranked
        }
        other => panic!("Expected results, got {:?}", other),
    };

    let ids: Vec<_> = ranked.iter().map(|r| r.id()).collect();
    assert_eq!(ids, vec!["apify:place-b", "apify:place-a"]);

    // Annotations are added; the record itself is never rewritten
    assert_eq!(ranked[0].restaurant.name, "Candle & Pasta");
    assert_eq!(ranked[0].relevance_score, Some(9.0));
    assert_eq!(ranked[0].enhanced_description.as_deref(), Some("Soft light, fresh pasta."));
    assert_eq!(ranked[1].restaurant.vibe, "Cozy");

    assert_eq!(session.displayed().len(), 2);

    run.assert_async().await;
    items.assert_async().await;
    parse.assert_async().await;
    rank.assert_async().await;
}

#[tokio::test]
async fn test_integration_offline_scenario() {
    let session = Arc::new(SearchSession::new("u1", offline_pipeline()));

    let outcome = session.submit("late night ramen", None).await.unwrap();

    let expected = offline_restaurants();
    match outcome {
        SubmitOutcome::Completed(PipelineState::Results { ranked, .. }) => {
            assert_eq!(ranked.len(), expected.len().min(6));
            for (ranked, record) in ranked.iter().zip(&expected) {
                assert_eq!(&ranked.restaurant, record);
                assert!(ranked.relevance_score.is_none());
                assert!(ranked.match_reason.is_none());
            }
        }
        other => panic!("Expected results, got {:?}", other),
    }

    // A second search replaces the first
    let again = session.submit("brunch", None).await.unwrap();
    assert!(matches!(again, SubmitOutcome::Completed(PipelineState::Results { .. })));
    assert!(matches!(session.state(), PipelineState::Results { ref query, .. } if query == "brunch"));
}

#[tokio::test]
async fn test_integration_saved_set_scenario() {
    let saved = SavedSet::new();

    assert!(saved.save("u1", "mock-1"));
    assert!(saved.save("u1", "mock-2"));
    assert!(!saved.save("u1", "mock-1"));
    assert!(saved.unsave("u1", "mock-1"));

    let ids: Vec<_> = saved.list_saved("u1").into_iter().map(|b| b.restaurant_id).collect();
    assert_eq!(ids, vec!["mock-2".to_string()]);
    assert!(saved.list_saved("u2").is_empty());
}

fn app_state() -> AppState {
    AppState {
        sessions: Arc::new(SessionRegistry::new(offline_pipeline())),
        saved: Arc::new(SavedSet::new()),
        catalog: Arc::new(CurationCatalog::seeded()),
    }
}

#[actix_web::test]
async fn test_http_search_save_and_lists() {
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(app_state()))
            .configure(configure_routes),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/v1/discover/search")
        .set_json(json!({"userId": "u1", "query": "cozy dinner"}))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["status"], "results");
    assert_eq!(body["restaurants"].as_array().unwrap().len(), 6);
    assert_eq!(body["restaurants"][0]["id"], "mock-1");
    assert_eq!(body["restaurants"][0]["isSaved"], false);

    let req = test::TestRequest::post()
        .uri("/api/v1/saved")
        .set_json(json!({"userId": "u1", "restaurantId": "mock-5"}))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["isSaved"], true);

    let req = test::TestRequest::get()
        .uri("/api/v1/discover/state?userId=u1")
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["status"], "results");
    assert_eq!(body["query"], "cozy dinner");
    assert_eq!(body["restaurants"][4]["id"], "mock-5");
    assert_eq!(body["restaurants"][4]["isSaved"], true);

    let req = test::TestRequest::get()
        .uri("/api/v1/lists/date-night?userId=u1")
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["id"], "date-night");
    let details = body["restaurantDetails"].as_array().unwrap();
    assert_eq!(details.len(), 2);
    assert_eq!(details[0]["id"], "mock-5");
    assert_eq!(details[0]["isSaved"], true);
    assert_eq!(details[1]["id"], "mock-1");

    let req = test::TestRequest::delete()
        .uri("/api/v1/saved")
        .set_json(json!({"userId": "u1", "restaurantId": "mock-5"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());

    let req = test::TestRequest::get().uri("/api/v1/saved?userId=u1").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["count"], 0);
}

#[actix_web::test]
async fn test_http_rejections() {
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(app_state()))
            .configure(configure_routes),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/v1/discover/search")
        .set_json(json!({"userId": "u1", "query": "   "}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status().as_u16(), 400);

    let req = test::TestRequest::get()
        .uri("/api/v1/discover/state?userId=u1")
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["status"], "idle");

    let req = test::TestRequest::get().uri("/api/v1/lists/nope").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status().as_u16(), 404);

    let req = test::TestRequest::post()
        .uri("/api/v1/saved")
        .set_json(json!({"userId": "", "restaurantId": "mock-1"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status().as_u16(), 400);

    let req = test::TestRequest::get().uri("/api/v1/lists").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body.as_array().unwrap().len(), 3);
}
