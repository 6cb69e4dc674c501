// HTTP handler tests for the SaúdeConecta API

use actix_web::{http::StatusCode, test, web, App};
use saude_conecta::core::Recommender;
use saude_conecta::models::Provider;
use saude_conecta::routes::{self, AppState};
use saude_conecta::services::{CacheManager, ProviderCatalog, SupabaseClient};
use serde_json::{json, Value};
use std::sync::Arc;

fn sample_catalog() -> Vec<Provider> {
    serde_json::from_str(include_str!("../data/providers.json")).expect("Failed to parse sample catalog")
}

fn create_state(catalog: ProviderCatalog) -> AppState {
    shared_state(Arc::new(catalog), None)
}

fn shared_state(catalog: Arc<ProviderCatalog>, supabase: Option<SupabaseClient>) -> AppState {
    AppState {
        catalog,
        cache: Arc::new(CacheManager::in_memory(100, 60)),
        supabase: supabase.map(Arc::new),
        postgres: None,
        recommender: Recommender::with_default_weights(),
    }
}

fn loaded_state() -> AppState {
    create_state(ProviderCatalog::new(sample_catalog()).unwrap())
}

macro_rules! init_app {
    ($state:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new($state))
                .app_data(routes::json_config())
                .app_data(routes::query_config())
                .configure(routes::configure_routes),
        )
        .await
    };
}

fn recommendation_ids(body: &Value) -> Vec<String> {
    body["recommendations"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["id"].as_str().unwrap().to_string())
        .collect()
}

fn free_checkup_request() -> Value {
    json!({
        "patient": {
            "id": "patient-1",
            "location": { "latitude": 37.7749, "longitude": -122.4194 },
            "medicalNeeds": ["checkup"],
            "preferredCost": "free",
            "preferredDistance": 5
        }
    })
}

#[actix_web::test]
async fn test_recommendations_ok() {
    let app = init_app!(loaded_state());

    let req = test::TestRequest::post()
        .uri("/api/recommendations")
        .set_json(free_checkup_request())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = test::read_body_json(resp).await;
    let recommendations = body["recommendations"].as_array().unwrap();
    assert_eq!(recommendations.len(), 2);
    assert_eq!(recommendations[0]["id"], "p1");
    assert_eq!(recommendations[0]["distance"], "0.0 miles");
    assert_eq!(recommendations[0]["nextAvailable"], "2023-05-15 at 10:00");
    assert_eq!(recommendations[0]["cost"], "Free options available");
    assert_eq!(recommendations[1]["id"], "p3");
}

#[actix_web::test]
async fn test_recommendations_served_from_cache_are_identical() {
    let app = init_app!(loaded_state());

    let mut bodies = Vec::new();
    for _ in 0..2 {
        let req = test::TestRequest::post()
            .uri("/api/recommendations")
            .set_json(free_checkup_request())
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        bodies.push(body);
    }

    assert_eq!(bodies[0], bodies[1]);
}

#[actix_web::test]
async fn test_recommendations_missing_location() {
    let app = init_app!(loaded_state());

    let req = test::TestRequest::post()
        .uri("/api/recommendations")
        .set_json(json!({ "patient": { "medicalNeeds": ["checkup"], "preferredDistance": 5 } }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body, json!({ "error": "Missing required patient information" }));
}

#[actix_web::test]
async fn test_recommendations_invalid_distance() {
    let app = init_app!(loaded_state());

    let mut request = free_checkup_request();
    request["patient"]["preferredDistance"] = json!(0);

    let req = test::TestRequest::post()
        .uri("/api/recommendations")
        .set_json(request)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "Invalid patient information");
    assert!(body["message"].is_string());
}

#[actix_web::test]
async fn test_recommendations_malformed_json() {
    let app = init_app!(loaded_state());

    let req = test::TestRequest::post()
        .uri("/api/recommendations")
        .insert_header(("content-type", "application/json"))
        .set_payload("{ not json")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body: Value = test::read_body_json(resp).await;
    assert!(body["error"].as_str().unwrap().starts_with("Invalid JSON"));
}

#[actix_web::test]
async fn test_recommendations_catalog_unavailable() {
    let app = init_app!(create_state(ProviderCatalog::unloaded()));

    let req = test::TestRequest::post()
        .uri("/api/recommendations")
        .set_json(free_checkup_request())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "Failed to process recommendation request");
}

#[actix_web::test]
async fn test_recommendations_empty_result() {
    let app = init_app!(loaded_state());

    let mut request = free_checkup_request();
    request["patient"]["medicalNeeds"] = json!(["dermatology"]);

    let req = test::TestRequest::post()
        .uri("/api/recommendations")
        .set_json(request)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body, json!({ "recommendations": [] }));
}

#[actix_web::test]
async fn test_list_providers_with_filters() {
    let app = init_app!(loaded_state());

    let req = test::TestRequest::get().uri("/api/providers?cost=free").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    let ids: Vec<&str> = body["providers"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["p1", "p3"]);

    let req = test::TestRequest::get().uri("/api/providers?specialty=pediatrics").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["providers"][0]["id"], "p2");
    assert_eq!(body["providers"][0]["nextAvailable"], "2023-05-15 at 09:15");
    assert_eq!(body["providers"][0]["acceptingNewPatients"], true);
}

#[actix_web::test]
async fn test_get_provider() {
    let app = init_app!(loaded_state());

    let req = test::TestRequest::get().uri("/api/providers/p2").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["name"], "Neighborhood Medical Center");

    let req = test::TestRequest::get().uri("/api/providers/unknown").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body, json!({ "error": "Provider not found" }));
}

#[actix_web::test]
async fn test_register_provider_then_recommend() {
    let app = init_app!(loaded_state());

    // Warm the cache so registration has something to invalidate
    let req = test::TestRequest::post()
        .uri("/api/recommendations")
        .set_json(free_checkup_request())
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["recommendations"].as_array().unwrap().len(), 2);

    let req = test::TestRequest::post()
        .uri("/api/providers")
        .set_json(json!({
            "name": "Mission Free Clinic",
            "type": "clinic",
            "specialty": "General Practice",
            "address": "1 Mission St, Anytown, USA",
            "phone": "555-0100",
            "email": "contact@missionclinic.org",
            "services": ["walk-in checkup"],
            "location": { "latitude": 37.7760, "longitude": -122.4180 },
            "availableSlots": [
                { "date": "2023-05-20", "time": "08:00", "duration": 20, "cost": "free" }
            ]
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "Provider registered successfully");
    assert_eq!(body["provider"]["ratings"], 0.0);
    assert_eq!(body["provider"]["reviews"], 0);
    let new_id = body["provider"]["id"].as_str().unwrap().to_string();

    let req = test::TestRequest::post()
        .uri("/api/recommendations")
        .set_json(free_checkup_request())
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    let ids: Vec<&str> = body["recommendations"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids.len(), 3);
    assert!(ids.contains(&new_id.as_str()));
}

#[actix_web::test]
async fn test_register_provider_missing_field() {
    let app = init_app!(loaded_state());

    let req = test::TestRequest::post()
        .uri("/api/providers")
        .set_json(json!({
            "name": "Mission Free Clinic",
            "type": "clinic",
            "specialty": "General Practice",
            "address": "1 Mission St, Anytown, USA",
            "email": "contact@missionclinic.org",
            "services": ["checkup"]
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body, json!({ "error": "Missing required field: phone" }));
}

#[actix_web::test]
async fn test_appointments_without_database() {
    let app = init_app!(loaded_state());

    let req = test::TestRequest::get().uri("/api/appointments?patientId=patient-1").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body, json!({ "error": "Appointment storage is not configured" }));
}

#[actix_web::test]
async fn test_health() {
    let app = init_app!(loaded_state());

    let req = test::TestRequest::get().uri("/api/health").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["providers"], 3);
    assert_eq!(body["cache"]["l2_enabled"], false);
    assert!(body["cache"]["l1_size"].is_u64());

    let app = init_app!(create_state(ProviderCatalog::unloaded()));

    let req = test::TestRequest::get().uri("/api/health").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["status"], "degraded");
    assert_eq!(body["providers"], 0);
}

#[actix_web::test]
async fn test_comma_in_tag_does_not_share_cached_answer() {
    let app = init_app!(loaded_state());

    let mut joined = free_checkup_request();
    joined["patient"]["medicalNeeds"] = json!(["checkup,vaccination"]);
    joined["patient"]["preferredCost"] = json!("any");

    let req = test::TestRequest::post().uri("/api/recommendations").set_json(&joined).to_request();
    let uncached: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(uncached, json!({ "recommendations": [] }));

    let mut split = joined.clone();
    split["patient"]["medicalNeeds"] = json!(["checkup", "vaccination"]);
    let req = test::TestRequest::post().uri("/api/recommendations").set_json(&split).to_request();
    let warmed: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(recommendation_ids(&warmed).len(), 3);

    let req = test::TestRequest::post().uri("/api/recommendations").set_json(&joined).to_request();
    let after: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(after, uncached);
}

#[actix_web::test]
async fn test_catalog_write_is_visible_without_cache_invalidation() {
    let catalog = Arc::new(ProviderCatalog::new(sample_catalog()).unwrap());
    let app = init_app!(shared_state(Arc::clone(&catalog), None));

    let req = test::TestRequest::post()
        .uri("/api/recommendations")
        .set_json(free_checkup_request())
        .to_request();
    let before: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(recommendation_ids(&before), vec!["p1", "p3"]);

    // Write straight to the catalog; nothing clears the cache
    let mut provider = sample_catalog().remove(0);
    provider.id = "p4".to_string();
    catalog.insert(provider).await.unwrap();

    let req = test::TestRequest::post()
        .uri("/api/recommendations")
        .set_json(free_checkup_request())
        .to_request();
    let after: Value = test::call_and_read_body_json(&app, req).await;
    assert!(recommendation_ids(&after).contains(&"p4".to_string()));
}

#[actix_web::test]
async fn test_register_provider_while_catalog_unloaded() {
    let mut server = mockito::Server::new_async().await;
    let insert_mock = server
        .mock("POST", "/rest/v1/providers")
        .with_status(201)
        .create_async()
        .await;
    let fetch_mock = server
        .mock("GET", "/rest/v1/providers")
        .match_query(mockito::Matcher::Any)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!([{
                "id": "remote-1",
                "name": "Mission Free Clinic",
                "specialty": "General Practice",
                "latitude": 37.7760,
                "longitude": -122.4180,
                "address": "1 Mission St, Anytown, USA",
                "services": ["walk-in checkup"],
                "available_slots": []
            }])
            .to_string(),
        )
        .create_async()
        .await;

    let supabase = SupabaseClient::new(server.url(), "test_key".to_string(), "public".to_string()).unwrap();
    let app = init_app!(shared_state(Arc::new(ProviderCatalog::unloaded()), Some(supabase)));

    let req = test::TestRequest::post()
        .uri("/api/providers")
        .set_json(json!({
            "name": "Mission Free Clinic",
            "type": "clinic",
            "specialty": "General Practice",
            "address": "1 Mission St, Anytown, USA",
            "phone": "555-0100",
            "email": "contact@missionclinic.org",
            "services": ["walk-in checkup"]
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    insert_mock.assert_async().await;
    fetch_mock.assert_async().await;

    let req = test::TestRequest::get().uri("/api/health").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["providers"], 1);
}

#[actix_web::test]
async fn test_published_slot_makes_provider_eligible() {
    let app = init_app!(loaded_state());

    let req = test::TestRequest::post()
        .uri("/api/recommendations")
        .set_json(free_checkup_request())
        .to_request();
    let before: Value = test::call_and_read_body_json(&app, req).await;
    assert!(!recommendation_ids(&before).contains(&"p2".to_string()));

    let req = test::TestRequest::post()
        .uri("/api/providers/p2/slots")
        .set_json(json!({
            "slots": [{ "date": "2023-05-14", "time": "08:00", "duration": 20, "cost": "free" }]
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "Slots added successfully");
    assert_eq!(body["providerId"], "p2");
    assert_eq!(body["slots"].as_array().unwrap().len(), 3);
    assert_eq!(body["slots"][0]["time"], "08:00");
    assert!(body["slots"][0]["id"].is_string());

    let req = test::TestRequest::post()
        .uri("/api/recommendations")
        .set_json(free_checkup_request())
        .to_request();
    let after: Value = test::call_and_read_body_json(&app, req).await;
    assert!(recommendation_ids(&after).contains(&"p2".to_string()));

    let req = test::TestRequest::get().uri("/api/providers?specialty=pediatrics").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["providers"][0]["nextAvailable"], "2023-05-14 at 08:00");
}

#[actix_web::test]
async fn test_edit_and_withdraw_slots() {
    let app = init_app!(loaded_state());

    let req = test::TestRequest::get().uri("/api/providers/p1/slots").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    let first = body["slots"][0]["id"].as_str().unwrap().to_string();
    let second = body["slots"][1]["id"].as_str().unwrap().to_string();

    let req = test::TestRequest::put()
        .uri(&format!("/api/providers/p1/slots/{}", first))
        .set_json(json!({ "cost": 30 }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "Slot updated successfully");
    assert_eq!(body["slots"][0]["id"], first.as_str());
    assert_eq!(body["slots"][0]["cost"], 30.0);
    assert_eq!(body["slots"][0]["time"], "10:00");

    let req = test::TestRequest::delete()
        .uri(&format!("/api/providers/p1/slots/{}", second))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["slots"].as_array().unwrap().len(), 1);

    // p1 has no free slot left
    let req = test::TestRequest::post()
        .uri("/api/recommendations")
        .set_json(free_checkup_request())
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(recommendation_ids(&body), vec!["p3"]);

    let req = test::TestRequest::delete()
        .uri(&format!("/api/providers/p1/slots/{}", second))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body, json!({ "error": "Slot not found" }));
}

#[actix_web::test]
async fn test_slot_routes_reject_bad_input() {
    let app = init_app!(loaded_state());

    let req = test::TestRequest::post()
        .uri("/api/providers/unknown/slots")
        .set_json(json!({ "slots": [{ "date": "2023-05-14", "time": "08:00", "duration": 20, "cost": "free" }] }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body, json!({ "error": "Provider not found" }));

    let req = test::TestRequest::post()
        .uri("/api/providers/p1/slots")
        .set_json(json!({ "slots": [] }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body, json!({ "error": "Missing required field: slots" }));

    let req = test::TestRequest::put()
        .uri("/api/providers/p1/slots/p1-slot-1")
        .set_json(json!({ "date": "May 15" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn test_appointment_changes_require_id() {
    let app = init_app!(loaded_state());

    let req = test::TestRequest::delete().uri("/api/appointments").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body, json!({ "error": "Missing appointment ID" }));

    let req = test::TestRequest::put()
        .uri("/api/appointments")
        .set_json(json!({ "status": "cancelled" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body, json!({ "error": "Missing appointment ID" }));
}
