//! End-to-end donation request lifecycle over HTTP.

#[macro_use]
mod common;

use crate::common::*;
use actix_web::http::StatusCode;
use actix_web::test;
use bloodlink_backend::models::Role;
use serde_json::{json, Value};

const REQUESTER: &str = "a@x.com";
const DONOR: &str = "b@x.com";
const VOLUNTEER: &str = "v@x.com";
const ADMIN: &str = "admin@x.com";

fn seeded() -> TestHarness {
    let harness = TestHarness::new();
    harness.register(REQUESTER, Role::Donor);
    harness.register(DONOR, Role::Donor);
    harness.register(VOLUNTEER, Role::Volunteer);
    harness.register(ADMIN, Role::Admin);
    harness
}

#[actix_web::test]
async fn confirming_twice_cites_current_status_and_keeps_first_donor() {
    let harness = seeded();
    let app = test_app!(harness);

    let resp = test::call_service(
        &app,
        send("POST", "/donation-requests", Some(REQUESTER), donation_request_body("R1")).to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let created: Value = test::read_body_json(resp).await;
    assert_eq!(created["status"], "pending");
    assert_eq!(created["requesterEmail"], REQUESTER);
    let id = created["id"].as_str().unwrap().to_string();

    let confirm = json!({ "donorName": "B", "donorEmail": DONOR });
    let resp = test::call_service(
        &app,
        send("PATCH", &format!("/donation-requests/confirm/{}", id), Some(DONOR), confirm).to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let confirmed: Value = test::read_body_json(resp).await;
    assert_eq!(confirmed["status"], "inprogress");
    assert_eq!(confirmed["donor"]["email"], DONOR);

    let second = json!({ "donorName": "C", "donorEmail": "c@x.com" });
    let resp = test::call_service(
        &app,
        send("PATCH", &format!("/donation-requests/confirm/{}", id), Some("c@x.com"), second).to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert!(body["message"].as_str().unwrap().contains("inprogress"));

    let resp = test::call_service(&app, get(&format!("/donation-requests/{}", id), Some(DONOR)).to_request()).await;
    let stored: Value = test::read_body_json(resp).await;
    assert_eq!(stored["donor"]["email"], DONOR);
    assert_eq!(stored["donor"]["name"], "B");
}

#[actix_web::test]
async fn requester_can_never_confirm_own_request() {
    let harness = seeded();
    harness.set_role(REQUESTER, Role::Admin);
    let app = test_app!(harness);

    let resp = test::call_service(
        &app,
        send("POST", "/donation-requests", Some(REQUESTER), donation_request_body("R1")).to_request(),
    )
    .await;
    let created: Value = test::read_body_json(resp).await;
    let id = created["id"].as_str().unwrap();

    let confirm = json!({ "donorName": "Me", "donorEmail": REQUESTER });
    let resp = test::call_service(
        &app,
        send("PATCH", &format!("/donation-requests/confirm/{}", id), Some(REQUESTER), confirm).to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn blocked_user_cannot_create_until_reactivated() {
    let harness = seeded();
    let carol = "c@x.com";
    let carol_id = harness.register(carol, Role::Donor);
    let app = test_app!(harness);

    let resp = test::call_service(
        &app,
        send("PATCH", &format!("/update-users/status/{}", carol_id), Some(ADMIN), json!({ "status": "blocked" }))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = test::call_service(
        &app,
        send("POST", "/donation-requests", Some(carol), donation_request_body("R")).to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let resp = test::call_service(
        &app,
        send("PATCH", &format!("/update-users/status/{}", carol_id), Some(ADMIN), json!({ "status": "active" }))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = test::call_service(
        &app,
        send("POST", "/donation-requests", Some(carol), donation_request_body("R")).to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
}

#[actix_web::test]
async fn volunteer_may_only_edit_status_of_others_requests() {
    let harness = seeded();
    let app = test_app!(harness);

    let resp = test::call_service(
        &app,
        send("POST", "/donation-requests", Some(REQUESTER), donation_request_body("R1")).to_request(),
    )
    .await;
    let created: Value = test::read_body_json(resp).await;
    let uri = format!("/donation-requests/{}", created["id"].as_str().unwrap());

    let resp = test::call_service(
        &app,
        send("PATCH", &uri, Some(VOLUNTEER), json!({ "status": "done", "recipientName": "X" })).to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let resp = test::call_service(&app, send("PATCH", &uri, Some(DONOR), json!({ "status": "done" })).to_request()).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let resp = test::call_service(&app, send("PATCH", &uri, Some(VOLUNTEER), json!({ "status": "done" })).to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let updated: Value = test::read_body_json(resp).await;
    assert_eq!(updated["status"], "done");
    assert_eq!(updated["recipientName"], "R1");

    let resp = test::call_service(&app, send("PATCH", &uri, Some(ADMIN), json!({ "status": "pending" })).to_request()).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn owner_and_admin_edit_every_field() {
    let harness = seeded();
    let app = test_app!(harness);

    let resp = test::call_service(
        &app,
        send("POST", "/donation-requests", Some(REQUESTER), donation_request_body("R1")).to_request(),
    )
    .await;
    let created: Value = test::read_body_json(resp).await;
    let uri = format!("/donation-requests/{}", created["id"].as_str().unwrap());

    let resp = test::call_service(
        &app,
        send("PATCH", &uri, Some(ADMIN), json!({ "hospitalName": "Square Hospital" })).to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = test::call_service(
        &app,
        send("PATCH", &uri, Some(REQUESTER), json!({ "status": "canceled", "requestMessage": "No longer needed" }))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let updated: Value = test::read_body_json(resp).await;
    assert_eq!(updated["hospitalName"], "Square Hospital");
    assert_eq!(updated["status"], "canceled");

    let resp = test::call_service(&app, send("PATCH", &uri, Some(REQUESTER), json!({})).to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[actix_web::test]
async fn delete_is_limited_to_owner_and_admin() {
    let harness = seeded();
    let app = test_app!(harness);

    let mut uris = Vec::new();
    for recipient in ["R1", "R2"] {
        let resp = test::call_service(
            &app,
            send("POST", "/donation-requests", Some(REQUESTER), donation_request_body(recipient)).to_request(),
        )
        .await;
        let created: Value = test::read_body_json(resp).await;
        uris.push(format!("/donation-requests/{}", created["id"].as_str().unwrap()));
    }

    let resp = test::call_service(&app, send("DELETE", &uris[0], Some(VOLUNTEER), json!({})).to_request()).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let resp = test::call_service(&app, send("DELETE", &uris[0], Some(ADMIN), json!({})).to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = test::call_service(&app, send("DELETE", &uris[1], Some(REQUESTER), json!({})).to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = test::call_service(&app, send("DELETE", &uris[1], Some(ADMIN), json!({})).to_request()).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn my_requests_are_limited_owned_and_newest_first() {
    let harness = seeded();
    let app = test_app!(harness);

    for recipient in ["R1", "R2", "R3"] {
        test::call_service(
            &app,
            send("POST", "/donation-requests", Some(REQUESTER), donation_request_body(recipient)).to_request(),
        )
        .await;
    }
    test::call_service(
        &app,
        send("POST", "/donation-requests", Some(DONOR), donation_request_body("other")).to_request(),
    )
    .await;

    let resp = test::call_service(&app, get("/donation-requests/my-requests?limit=2", Some(REQUESTER)).to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let mine: Vec<Value> = test::read_body_json(resp).await;
    assert_eq!(mine.len(), 2);
    assert!(mine.iter().all(|r| r["requesterEmail"] == REQUESTER));
    assert_eq!(mine[0]["recipientName"], "R3");
    assert_eq!(mine[1]["recipientName"], "R2");

    let resp = test::call_service(&app, get("/donation-requests/pending", None).to_request()).await;
    let pending: Vec<Value> = test::read_body_json(resp).await;
    assert_eq!(pending.len(), 4);

    let resp = test::call_service(&app, get("/donation-requests", Some(DONOR)).to_request()).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    let resp = test::call_service(&app, get("/donation-requests?status=pending", Some(VOLUNTEER)).to_request()).await;
    let all: Vec<Value> = test::read_body_json(resp).await;
    assert_eq!(all.len(), 4);
}

#[actix_web::test]
async fn malformed_input_and_missing_credentials_fail_fast() {
    let harness = seeded();
    let app = test_app!(harness);

    let resp = test::call_service(&app, get("/donation-requests/not-a-uuid", Some(REQUESTER)).to_request()).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert!(body["message"].is_string());

    let resp = test::call_service(&app, get("/donation-requests/my-requests", None).to_request()).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let resp = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/donation-requests/my-requests")
            .insert_header(("Authorization", "Bearer forged"))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let resp = test::call_service(
        &app,
        send("POST", "/donation-requests", Some(REQUESTER), donation_request_body("R1")).to_request(),
    )
    .await;
    let created: Value = test::read_body_json(resp).await;
    let uri = format!("/donation-requests/{}", created["id"].as_str().unwrap());

    let resp = test::call_service(
        &app,
        send("PATCH", &uri, Some(REQUESTER), json!({ "requesterEmail": "mallory@x.com" })).to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = test::call_service(
        &app,
        send("PATCH", &uri, Some(REQUESTER), json!({ "status": "finished" })).to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let mut bad_time = donation_request_body("R2");
    bad_time["donationTime"] = json!("noon");
    let resp = test::call_service(&app, send("POST", "/donation-requests", Some(REQUESTER), bad_time).to_request()).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let missing = format!("/donation-requests/{}", uuid::Uuid::now_v7());
    let resp = test::call_service(&app, send("PATCH", &missing, Some(ADMIN), json!({ "status": "done" })).to_request()).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
