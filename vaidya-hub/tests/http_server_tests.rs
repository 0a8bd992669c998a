//! End-to-end tests through the axum router

mod helpers;

use std::time::Duration;

use axum::http::StatusCode;
use helpers::{png_data_uri, FakeVerifier, Reply, TestApp};
use serde_json::{json, Value};

async fn plausible_app() -> TestApp {
    TestApp::new(FakeVerifier::plausible()).await
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = plausible_app().await;

    let (status, body) = app.get("/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "vaidya-hub");
    assert_eq!(body["ai_configured"], true);
    assert_eq!(body["active_games"], 0);
}

#[tokio::test]
async fn test_catalog_endpoints() {
    let app = plausible_app().await;

    let (status, plants) = app.get("/api/plants").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(plants.as_array().unwrap().len(), 9);

    let (status, neem) = app.get("/api/plants/1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(neem["scientificName"], "Azadirachta indica");

    let (status, missing) = app.get("/api/plants/999").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(missing["error"]["code"], "NOT_FOUND");

    let (_, languages) = app.get("/api/languages").await;
    assert_eq!(languages.as_array().unwrap().len(), 6);
}

#[tokio::test]
async fn test_remedy_list_includes_seeded_examples() {
    let app = plausible_app().await;

    let (status, body) = app.get("/api/remedies").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["sort"], "recency");
    let remedies = body["remedies"].as_array().unwrap();
    assert_eq!(remedies.len(), 3);
    assert!(remedies.iter().all(|r| r["id"].as_str().unwrap().starts_with("initial-")));

    let (_, by_rating) = app.get("/api/remedies?sort=rating").await;
    assert_eq!(by_rating["sort"], "rating");
    assert_eq!(by_rating["remedies"][0]["plantName"], "Tulsi (Holy Basil)");

    let (status, _) = app.get("/api/remedies?sort=alphabetical").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_submit_then_vote() {
    let app = plausible_app().await;

    let (status, body) = app
        .post(
            "/api/remedies",
            json!({
                "profileId": "p1",
                "plantName": "Tulsi (Holy Basil)",
                "remedyDescription": "Boil leaves with ginger for cough",
                "language": "English",
                "effectivenessRating": 4,
                "photoDataUri": png_data_uri(),
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["status"], "accepted");
    let id = body["remedy"]["id"].as_str().unwrap().to_string();

    let (status, voted) = app
        .post(&format!("/api/remedies/{}/vote", id), json!({"direction": "up"}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(voted["status"], "counted");
    assert_eq!(voted["remedy"]["upvotes"], 1);

    let (_, summary) = app.get("/api/profiles/p1/progress").await;
    assert_eq!(summary["progress"]["points"], 20);
    assert_eq!(summary["progress"]["remediesContributed"], 1);

    let (_, list) = app.get("/api/remedies").await;
    assert_eq!(list["remedies"][0]["id"], id.as_str());
}

#[tokio::test]
async fn test_submission_validation_errors() {
    let app = plausible_app().await;

    let (status, body) = app
        .post(
            "/api/remedies",
            json!({"profileId": "p1", "plantName": "", "remedyDescription": "short", "language": "", "effectivenessRating": 0}),
        )
        .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"]["code"], "VALIDATION_FAILED");
    let fields: Vec<&str> = body["error"]["details"]
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["field"].as_str().unwrap())
        .collect();
    assert_eq!(
        fields,
        vec!["plantName", "remedyDescription", "language", "effectivenessRating"]
    );
    assert_eq!(app.verifier.call_count(), 0);
}

#[tokio::test]
async fn test_rejected_submission_returns_notes() {
    let app = TestApp::new(FakeVerifier::implausible("Not a known use of neem.")).await;

    let (status, body) = app
        .post(
            "/api/remedies",
            json!({
                "profileId": "p1",
                "plantName": "Neem",
                "remedyDescription": "Drink neem oil for eyesight",
                "language": "Hindi",
                "effectivenessRating": 5,
            }),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "rejected");
    assert_eq!(body["notes"], "Not a known use of neem.");

    let (_, list) = app.get("/api/remedies").await;
    assert_eq!(list["remedies"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_verifier_outage_is_bad_gateway() {
    let app = TestApp::new(FakeVerifier::failing()).await;

    let (status, body) = app
        .post(
            "/api/remedies",
            json!({
                "profileId": "p1",
                "plantName": "Neem",
                "remedyDescription": "Neem paste on wounds heals them",
                "language": "Hindi",
                "effectivenessRating": 3,
            }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"]["code"], "COLLABORATOR_FAILED");

    let (_, health) = app.get("/health").await;
    assert!(health["last_error"].is_string());
}

#[tokio::test]
async fn test_seeded_and_unknown_votes() {
    let app = plausible_app().await;

    let (status, body) = app
        .post("/api/remedies/initial-0/vote", json!({"direction": "up"}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "immutable");

    let (_, list) = app.get("/api/remedies").await;
    let seeded = list["remedies"]
        .as_array()
        .unwrap()
        .iter()
        .find(|r| r["id"] == "initial-0")
        .cloned()
        .unwrap();
    assert_eq!(seeded["upvotes"], 14);

    let (status, _) = app
        .post("/api/remedies/does-not-exist/vote", json!({"direction": "down"}))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Looks like a seeded id but names no seeded example
    let (status, body) = app
        .post("/api/remedies/initial-99/vote", json!({"direction": "up"}))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_vote_with_sort_returns_resorted_board() {
    let app = plausible_app().await;
    let (_, body) = app
        .post(
            "/api/remedies",
            json!({
                "profileId": "p1",
                "plantName": "Ginger",
                "remedyDescription": "Chew raw ginger for nausea relief",
                "language": "English",
                "effectivenessRating": 4,
            }),
        )
        .await;
    let id = body["remedy"]["id"].as_str().unwrap().to_string();

    let (status, _) = app
        .post(&format!("/api/remedies/{}/vote", id), json!({"direction": "up"}))
        .await;
    assert_eq!(status, StatusCode::OK);

    let mut last = json!(null);
    for _ in 0..24 {
        let (status, voted) = app
            .post(
                &format!("/api/remedies/{}/vote?sort=rating", id),
                json!({"direction": "up"}),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        last = voted;
    }

    // 25 net beats the best seeded example
    assert_eq!(last["status"], "counted");
    assert_eq!(last["remedy"]["upvotes"], 25);
    assert_eq!(last["sort"], "rating");
    assert_eq!(last["remedies"][0]["id"], id.as_str());
    assert_eq!(last["remedies"][0]["upvotes"], 25);

    let (status, _) = app
        .post(
            &format!("/api/remedies/{}/vote?sort=alphabetical", id),
            json!({"direction": "up"}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_progress_and_identification() {
    let app = plausible_app().await;

    let (status, fresh) = app.get("/api/profiles/newcomer/progress").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fresh["progress"]["points"], 0);
    assert_eq!(fresh["badges"].as_array().unwrap().len(), 5);

    let (status, outcome) = app
        .post("/api/profiles/newcomer/identify", json!({"photoDataUri": png_data_uri()}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(outcome["result"]["commonName"], "Neem");
    assert_eq!(outcome["pointsAwarded"], 25);

    let (_, again) = app
        .post("/api/profiles/newcomer/identify", json!({"photoDataUri": png_data_uri()}))
        .await;
    assert_eq!(again["pointsAwarded"], 0);
    assert_eq!(again["totalPoints"], 25);

    let (status, _) = app.get("/api/profiles/bad%20id/progress").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_chat_endpoint() {
    let app = plausible_app().await;

    let (status, body) = app.post("/api/chat", json!({"query": "neem"})).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["answer"].as_str().unwrap().contains("neem"));

    let (status, body) = app.post("/api/chat", json!({"query": "   "})).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"]["details"][0]["field"], "query");
}

#[tokio::test]
async fn test_settings_reject_blank_key() {
    let app = plausible_app().await;

    let (status, _) = app
        .post("/api/settings/genai_api_key", json!({"api_key": "   "}))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_settings_store_key() {
    let app = plausible_app().await;

    let (status, body) = app
        .post("/api/settings/genai_api_key", json!({"api_key": " new-key "}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);

    let stored = vaidya_hub::db::settings::get_genai_api_key(&app.state.db)
        .await
        .unwrap();
    assert_eq!(stored.as_deref(), Some("new-key"));
}

async fn poll_state(app: &TestApp, id: &str, state: &str) -> Value {
    for _ in 0..200 {
        let (_, snapshot) = app.get(&format!("/api/game/sessions/{}", id)).await;
        if snapshot["state"] == state {
            return snapshot;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("session {} never reached {}", id, state);
}

#[tokio::test]
async fn test_game_session_round_trip() {
    let app = plausible_app().await;
    app.translator
        .script("Neem", "Santhali", Reply::Name("Neem Dare"), Duration::ZERO);

    let (status, created) = app
        .post(
            "/api/game/sessions",
            json!({"profileId": "p1", "plantId": 1, "language": "Santhali"}),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = created["sessionId"].as_str().unwrap().to_string();

    let idle = poll_state(&app, &id, "idle").await;
    assert_eq!(idle["captureEnabled"], true);

    let (status, body) = app
        .post(
            &format!("/api/game/sessions/{}/listen", id),
            json!({"speechCapture": false}),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "CAPABILITY_UNAVAILABLE");

    let (status, _) = app
        .post(
            &format!("/api/game/sessions/{}/listen", id),
            json!({"speechCapture": true}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .post(
            &format!("/api/game/sessions/{}/capture", id),
            json!({"transcript": "Neem Dare"}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let result = poll_state(&app, &id, "result").await;
    assert_eq!(result["isCorrect"], true);
    assert_eq!(result["score"], 10);

    let (status, audio) = app
        .post(&format!("/api/game/sessions/{}/speak", id), json!({}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(audio["media"].as_str().unwrap().starts_with("data:audio/wav"));

    let (_, health) = app.get("/health").await;
    assert_eq!(health["active_games"], 1);

    let (status, _) = app
        .request("DELETE", &format!("/api/game/sessions/{}", id), None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = app.get(&format!("/api/game/sessions/{}", id)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_game_retry_keeps_pair() {
    let app = plausible_app().await;
    app.translator
        .script("Neem", "Santhali", Reply::Name("Neem Dare"), Duration::ZERO);

    let (_, created) = app
        .post(
            "/api/game/sessions",
            json!({"profileId": "p1", "plantId": 1, "language": "Santhali"}),
        )
        .await;
    let id = created["sessionId"].as_str().unwrap().to_string();
    poll_state(&app, &id, "idle").await;

    let (status, _) = app
        .post(&format!("/api/game/sessions/{}/retry", id), json!({}))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    app.post(
        &format!("/api/game/sessions/{}/listen", id),
        json!({"speechCapture": true}),
    )
    .await;
    app.post(
        &format!("/api/game/sessions/{}/capture", id),
        json!({"transcript": "neem"}),
    )
    .await;
    let result = poll_state(&app, &id, "result").await;
    assert_eq!(result["isCorrect"], false);

    let (status, retried) = app
        .post(&format!("/api/game/sessions/{}/retry", id), json!({}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(retried["plantId"], 1);
    assert_eq!(retried["language"], "Santhali");

    let idle = poll_state(&app, &id, "idle").await;
    assert_eq!(idle["captureEnabled"], true);
    assert_eq!(idle["translation"]["translatedName"], "Neem Dare");
}

#[tokio::test]
async fn test_speech_endpoint() {
    let app = plausible_app().await;

    let (status, audio) = app.post("/api/speech", json!({"text": "Neem Dare"})).await;
    assert_eq!(status, StatusCode::OK);
    assert!(audio["media"].as_str().unwrap().starts_with("data:audio/wav"));

    let (status, body) = app.post("/api/speech", json!({"text": "   "})).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"]["details"][0]["field"], "text");

    let mut collaborators = app.state.collaborators().await;
    collaborators.speech = None;
    app.state.set_collaborators(collaborators).await;

    let (status, body) = app.post("/api/speech", json!({"text": "Neem Dare"})).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "CAPABILITY_UNAVAILABLE");
}

#[tokio::test]
async fn test_game_capture_requires_one_field() {
    let app = plausible_app().await;
    let (_, created) = app
        .post("/api/game/sessions", json!({"profileId": "p1"}))
        .await;
    let id = created["sessionId"].as_str().unwrap();

    let (status, _) = app
        .post(&format!("/api/game/sessions/{}/capture", id), json!({}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_game_rejects_unknown_plant() {
    let app = plausible_app().await;

    let (status, _) = app
        .post("/api/game/sessions", json!({"profileId": "p1", "plantId": 404}))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app
        .post("/api/game/sessions", json!({"profileId": "not valid!"}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
