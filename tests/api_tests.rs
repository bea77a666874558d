//! API integration tests
//!
//! These run against a live server with a fresh database:
//! `cargo test -- --ignored`

use reqwest::Client;
use serde_json::{json, Value};

use fieldgear_server::models::user::{Role, UserClaims};

const BASE_URL: &str = "http://localhost:8080/api/v1";
const JWT_SECRET: &str = "change-this-secret-in-production";

/// Mint a token the way the identity service would
fn token(role: Role) -> String {
    let claims = UserClaims {
        sub: "integration-tests".to_string(),
        role,
        site: None,
        exp: 4102444800, // 2100-01-01
        iat: 0,
    };
    claims.create_token(JWT_SECRET).expect("Failed to sign token")
}

/// Unique suffix so reruns do not collide on serials and RUTs
fn unique_suffix() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_millis() as u64
}

fn unique_rut(salt: u64) -> String {
    format!("{:08}-K", (unique_suffix() + salt) % 100_000_000)
}

async fn register_equipment(client: &Client, tech: &str, serial: &str) -> i64 {
    let response = client
        .post(format!("{}/equipment", BASE_URL))
        .header("Authorization", format!("Bearer {}", tech))
        .json(&json!({
            "serial": serial,
            "brand": "Lenovo",
            "model": "ThinkPad L14",
            "category": "notebook",
            "ram_gb": 16,
            "ssd_gb": 512,
            "os": "Windows 11"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 201);
    let body: Value = response.json().await.expect("Failed to parse response");
    body["id"].as_i64().expect("No equipment ID")
}

async fn register_worker(client: &Client, tech: &str, rut: &str, site: &str) {
    let response = client
        .post(format!("{}/workers", BASE_URL))
        .header("Authorization", format!("Bearer {}", tech))
        .json(&json!({
            "rut": rut,
            "name": "Test Worker",
            "site": site,
            "phone": "+56 9 5555 5555"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 201);
}

async fn begin_loan(client: &Client, tech: &str, equipment_id: i64, rut: &str, site: &str) -> reqwest::Response {
    client
        .post(format!("{}/loans", BASE_URL))
        .header("Authorization", format!("Bearer {}", tech))
        .json(&json!({
            "equipment_id": equipment_id,
            "worker_rut": rut,
            "site": site,
            "handoff_condition_good": true,
            "handoff_has_charger": true,
            "handoff_notes": "clean, charged"
        }))
        .send()
        .await
        .expect("Failed to send request")
}

#[tokio::test]
#[ignore] // Run with: cargo test -- --ignored
async fn test_health_check() {
    let client = Client::new();

    let response = client
        .get(format!("{}/health", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
#[ignore]
async fn test_unauthorized_access() {
    let client = Client::new();

    let response = client
        .get(format!("{}/equipment", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 401);
}

#[tokio::test]
#[ignore]
async fn test_hr_cannot_register_equipment() {
    let client = Client::new();
    let hr = token(Role::Hr);

    let response = client
        .post(format!("{}/equipment", BASE_URL))
        .header("Authorization", format!("Bearer {}", hr))
        .json(&json!({
            "serial": "HR-FORBIDDEN",
            "brand": "HP",
            "model": "ProBook",
            "category": "notebook"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 403);
}

#[tokio::test]
#[ignore]
async fn test_duplicate_serial_conflicts() {
    let client = Client::new();
    let tech = token(Role::Tech);
    let serial = format!("SN-DUP-{}", unique_suffix());

    register_equipment(&client, &tech, &serial).await;

    // Same serial, lowercased: normalization makes it a duplicate
    let response = client
        .post(format!("{}/equipment", BASE_URL))
        .header("Authorization", format!("Bearer {}", tech))
        .json(&json!({
            "serial": serial.to_lowercase(),
            "brand": "Lenovo",
            "model": "ThinkPad L14",
            "category": "notebook"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 409);
}

#[tokio::test]
#[ignore]
async fn test_scan_flips_with_loan_state() {
    let client = Client::new();
    let tech = token(Role::Tech);
    let serial = format!("SN-SCAN-{}", unique_suffix());
    let rut = unique_rut(1);
    let site = "SCAN YARD";

    let equipment_id = register_equipment(&client, &tech, &serial).await;
    register_worker(&client, &tech, &rut, site).await;

    // Idle device: scan says lend
    let response = client
        .get(format!("{}/equipment/{}/scan", BASE_URL, equipment_id))
        .header("Authorization", format!("Bearer {}", tech))
        .send()
        .await
        .expect("Failed to send request");
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["action"], "lend");
    assert!(body["active_loan"].is_null());

    let response = begin_loan(&client, &tech, equipment_id, &rut, site).await;
    assert_eq!(response.status(), 201);
    let loan: Value = response.json().await.expect("Failed to parse response");
    let loan_id = loan["id"].as_i64().expect("No loan ID");

    // On loan: same code now says return, with the loan attached
    let response = client
        .get(format!("{}/equipment/{}/scan", BASE_URL, equipment_id))
        .header("Authorization", format!("Bearer {}", tech))
        .send()
        .await
        .expect("Failed to send request");
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["action"], "return");
    assert_eq!(body["active_loan"]["id"].as_i64(), Some(loan_id));

    // Return it; the scan flips back to lend
    let response = client
        .put(format!("{}/loans/{}/return", BASE_URL, loan_id))
        .header("Authorization", format!("Bearer {}", tech))
        .json(&json!({
            "return_condition_good": true,
            "return_has_charger": true
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 200);

    let response = client
        .get(format!("{}/equipment/{}/scan", BASE_URL, equipment_id))
        .header("Authorization", format!("Bearer {}", tech))
        .send()
        .await
        .expect("Failed to send request");
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["action"], "lend");
}

#[tokio::test]
#[ignore]
async fn test_double_return_fails_not_active() {
    let client = Client::new();
    let tech = token(Role::Tech);
    let serial = format!("SN-DRET-{}", unique_suffix());
    let rut = unique_rut(2);
    let site = "RETURN YARD";

    let equipment_id = register_equipment(&client, &tech, &serial).await;
    register_worker(&client, &tech, &rut, site).await;

    let response = begin_loan(&client, &tech, equipment_id, &rut, site).await;
    let loan: Value = response.json().await.expect("Failed to parse response");
    let loan_id = loan["id"].as_i64().expect("No loan ID");

    let return_body = json!({
        "return_condition_good": true,
        "return_has_charger": true
    });

    let first = client
        .put(format!("{}/loans/{}/return", BASE_URL, loan_id))
        .header("Authorization", format!("Bearer {}", tech))
        .json(&return_body)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(first.status(), 200);

    let second = client
        .put(format!("{}/loans/{}/return", BASE_URL, loan_id))
        .header("Authorization", format!("Bearer {}", tech))
        .json(&return_body)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(second.status(), 409);
}

#[tokio::test]
#[ignore]
async fn test_concurrent_begin_loan_single_winner() {
    let client = Client::new();
    let tech = token(Role::Tech);
    let serial = format!("SN-RACE-{}", unique_suffix());
    let rut = unique_rut(3);
    let site = "RACE YARD";

    let equipment_id = register_equipment(&client, &tech, &serial).await;
    register_worker(&client, &tech, &rut, site).await;

    let (a, b) = tokio::join!(
        begin_loan(&client, &tech, equipment_id, &rut, site),
        begin_loan(&client, &tech, equipment_id, &rut, site),
    );

    let statuses = [a.status().as_u16(), b.status().as_u16()];
    assert!(
        statuses.contains(&201) && statuses.contains(&409),
        "expected one winner and one conflict, got {:?}",
        statuses
    );
}

#[tokio::test]
#[ignore]
async fn test_charger_returned_later_flow() {
    let client = Client::new();
    let tech = token(Role::Tech);
    let serial = format!("SN-CHG-{}", unique_suffix());
    let rut = unique_rut(4);
    let site = "CHARGER YARD";

    let equipment_id = register_equipment(&client, &tech, &serial).await;
    register_worker(&client, &tech, &rut, site).await;

    let response = begin_loan(&client, &tech, equipment_id, &rut, site).await;
    let loan: Value = response.json().await.expect("Failed to parse response");
    let loan_id = loan["id"].as_i64().expect("No loan ID");

    // Returned without the charger: the worker now has a pending issue
    let response = client
        .put(format!("{}/loans/{}/return", BASE_URL, loan_id))
        .header("Authorization", format!("Bearer {}", tech))
        .json(&json!({
            "return_condition_good": true,
            "return_has_charger": false,
            "return_notes": "charger left at the container"
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 200);

    let response = client
        .get(format!("{}/workers/{}/alerts", BASE_URL, rut))
        .header("Authorization", format!("Bearer {}", tech))
        .send()
        .await
        .expect("Failed to send request");
    let alerts: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(alerts.as_array().unwrap().len(), 1);
    assert_eq!(alerts[0]["kind"], "ISSUE_PENDING");
    assert_eq!(alerts[0]["problems"][0], "missing charger");

    // Charger shows up a week later
    let response = client
        .put(format!("{}/loans/{}/charger-returned", BASE_URL, loan_id))
        .header("Authorization", format!("Bearer {}", tech))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 200);

    let response = client
        .get(format!("{}/workers/{}/alerts", BASE_URL, rut))
        .header("Authorization", format!("Bearer {}", tech))
        .send()
        .await
        .expect("Failed to send request");
    let alerts: Value = response.json().await.expect("Failed to parse response");
    assert!(alerts.as_array().unwrap().is_empty());

    // Second mark is not eligible
    let response = client
        .put(format!("{}/loans/{}/charger-returned", BASE_URL, loan_id))
        .header("Authorization", format!("Bearer {}", tech))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 422);
}

#[tokio::test]
#[ignore]
async fn test_bad_return_then_termination_escalates() {
    let client = Client::new();
    let tech = token(Role::Tech);
    let hr = token(Role::Hr);
    let serial = format!("SN-E2E-{}", unique_suffix());
    let rut = unique_rut(5);
    let site = "E2E YARD";

    let equipment_id = register_equipment(&client, &tech, &serial).await;
    register_worker(&client, &tech, &rut, site).await;

    let response = begin_loan(&client, &tech, equipment_id, &rut, site).await;
    assert_eq!(response.status(), 201);
    let loan: Value = response.json().await.expect("Failed to parse response");
    let loan_id = loan["id"].as_i64().expect("No loan ID");

    let response = client
        .put(format!("{}/loans/{}/return", BASE_URL, loan_id))
        .header("Authorization", format!("Bearer {}", tech))
        .json(&json!({
            "return_condition_good": false,
            "return_has_charger": true,
            "return_notes": "screen cracked"
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 200);

    // One informational pending issue
    let response = client
        .get(format!("{}/workers/{}/alerts", BASE_URL, rut))
        .header("Authorization", format!("Bearer {}", tech))
        .send()
        .await
        .expect("Failed to send request");
    let alerts: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(alerts[0]["problems"][0], "bad condition");

    // Termination promotes the worker into the urgent tier
    let response = client
        .put(format!("{}/workers/{}/terminate", BASE_URL, rut))
        .header("Authorization", format!("Bearer {}", hr))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 200);

    let response = client
        .get(format!("{}/alerts", BASE_URL))
        .header("Authorization", format!("Bearer {}", tech))
        .send()
        .await
        .expect("Failed to send request");
    let alerts: Value = response.json().await.expect("Failed to parse response");
    let kinds: Vec<&str> = alerts
        .as_array()
        .unwrap()
        .iter()
        .filter(|a| a["worker_rut"] == rut.as_str())
        .map(|a| a["kind"].as_str().unwrap())
        .collect();
    assert!(kinds.contains(&"ISSUE_PENDING"));
    assert!(kinds.contains(&"TERMINATED_WITH_ISSUE"));

    // The dirty record cannot be purged
    let response = client
        .delete(format!("{}/loans/{}", BASE_URL, loan_id))
        .header("Authorization", format!("Bearer {}", tech))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 422);
}

#[tokio::test]
#[ignore]
async fn test_full_cycle_listed_once_with_handoff_intact() {
    let client = Client::new();
    let tech = token(Role::Tech);
    let serial = format!("SN-CYCLE-{}", unique_suffix());
    let rut = unique_rut(8);
    let site = "CYCLE YARD";

    let equipment_id = register_equipment(&client, &tech, &serial).await;
    register_worker(&client, &tech, &rut, site).await;

    let response = begin_loan(&client, &tech, equipment_id, &rut, site).await;
    assert_eq!(response.status(), 201);
    let loan: Value = response.json().await.expect("Failed to parse response");
    let loan_id = loan["id"].as_i64().expect("No loan ID");

    let response = client
        .put(format!("{}/loans/{}/return", BASE_URL, loan_id))
        .header("Authorization", format!("Bearer {}", tech))
        .json(&json!({
            "return_condition_good": true,
            "return_has_charger": true
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 200);

    let response = client
        .get(format!("{}/loans?equipment_id={}", BASE_URL, equipment_id))
        .header("Authorization", format!("Bearer {}", tech))
        .send()
        .await
        .expect("Failed to send request");
    let loans: Value = response.json().await.expect("Failed to parse response");
    let loans = loans.as_array().unwrap();
    assert_eq!(loans.len(), 1);
    assert_eq!(loans[0]["state"], "RETURNED");
    assert!(loans[0]["return_at"].is_string());
    // Handoff attestation is untouched by the return
    assert_eq!(loans[0]["handoff_condition_good"], true);
    assert_eq!(loans[0]["handoff_has_charger"], true);
    assert_eq!(loans[0]["handoff_notes"], "clean, charged");
}

#[tokio::test]
#[ignore]
async fn test_retire_with_active_loan_conflicts() {
    let client = Client::new();
    let tech = token(Role::Tech);
    let serial = format!("SN-RET-{}", unique_suffix());
    let rut = unique_rut(6);
    let site = "RETIRE YARD";

    let equipment_id = register_equipment(&client, &tech, &serial).await;
    register_worker(&client, &tech, &rut, site).await;

    let response = begin_loan(&client, &tech, equipment_id, &rut, site).await;
    assert_eq!(response.status(), 201);

    let response = client
        .put(format!("{}/equipment/{}/state", BASE_URL, equipment_id))
        .header("Authorization", format!("Bearer {}", tech))
        .json(&json!({ "operational_state": "RETIRED" }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 409);

    // Equipment with loan history cannot be deleted either
    let response = client
        .delete(format!("{}/equipment/{}", BASE_URL, equipment_id))
        .header("Authorization", format!("Bearer {}", tech))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 409);
}

#[tokio::test]
#[ignore]
async fn test_terminated_worker_cannot_borrow() {
    let client = Client::new();
    let tech = token(Role::Tech);
    let hr = token(Role::Hr);
    let serial = format!("SN-TERM-{}", unique_suffix());
    let rut = unique_rut(7);
    let site = "TERM YARD";

    let equipment_id = register_equipment(&client, &tech, &serial).await;
    register_worker(&client, &tech, &rut, site).await;

    let response = client
        .put(format!("{}/workers/{}/terminate", BASE_URL, rut))
        .header("Authorization", format!("Bearer {}", hr))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 200);

    let response = begin_loan(&client, &tech, equipment_id, &rut, site).await;
    assert_eq!(response.status(), 422);
}

#[tokio::test]
#[ignore]
async fn test_dashboard_shape() {
    let client = Client::new();
    let tech = token(Role::Tech);

    let response = client
        .get(format!("{}/stats/dashboard", BASE_URL))
        .header("Authorization", format!("Bearer {}", tech))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body["summary"]["total_equipment"].is_number());
    assert!(body["summary"]["active_loans"].is_number());
    assert!(body["summary"]["pending_alerts"].is_number());
    assert!(body["loans_per_day"].is_array());
    assert!(body["trend"]["slope"].is_number());
    assert!(body["trend"]["r_squared"].is_number());
    assert!(!body["trend"]["r_squared"].as_f64().unwrap().is_nan());
}
