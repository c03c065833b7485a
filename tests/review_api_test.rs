mod common;

use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use common::{ivan_petrov, TestApp, ADMIN_CHAT_ID};
use serde_json::{json, Value as JsonValue};
use uuid::Uuid;

fn timestamp(value: &JsonValue) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(value.as_str().unwrap())
        .unwrap()
        .with_timezone(&Utc)
}

fn email_ids(candidate: &JsonValue) -> Vec<String> {
    candidate["scheduledEmails"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["id"].as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn approval_enrolls_candidate_into_the_sequence() {
    let app = TestApp::new();
    let id = app.submit(ivan_petrov(), false).await;

    let (status, body) = app
        .patch(&format!("/api/candidates/{}", id), json!({ "status": "APPROVED" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "APPROVED");
    assert_eq!(body["reviewedBy"], "Admin");
    assert_eq!(body["brevoContactId"], "9001");

    let reviewed_at = timestamp(&body["reviewedAt"]);
    let started_at = timestamp(&body["emailSequenceStartedAt"]);
    assert_eq!(reviewed_at, started_at);

    let emails = body["scheduledEmails"].as_array().unwrap();
    assert_eq!(emails.len(), 3);
    let numbers: Vec<i64> = emails.iter().map(|e| e["emailNumber"].as_i64().unwrap()).collect();
    assert_eq!(numbers, vec![1, 2, 3]);
    let templates: Vec<i64> = emails.iter().map(|e| e["templateId"].as_i64().unwrap()).collect();
    assert_eq!(templates, vec![3, 4, 5]);
    let offsets: Vec<i64> = emails
        .iter()
        .map(|e| (timestamp(&e["scheduledFor"]) - started_at).num_hours())
        .collect();
    assert_eq!(offsets, vec![0, 24, 72]);
    assert!(emails.iter().all(|e| e["status"] == "SCHEDULED"));
    assert_eq!(emails[0]["subject"], "Твоят кастинг номер е генериран");

    let upserts = app.contacts.upserts();
    assert_eq!(upserts.len(), 1);
    assert_eq!(upserts[0].email, "ivan.petrov@example.com");
    assert_eq!(upserts[0].phone.as_deref(), Some("+359888123456"));
    assert_eq!(upserts[0].attributes["CITY"], "Sofia");
    assert_eq!(upserts[0].attributes["CATEGORY"], "Fashion, Commercial");

    let edits = app.notifier.edits();
    assert_eq!(edits.len(), 1);
    assert_eq!(edits[0].chat_id, ADMIN_CHAT_ID);
    assert_eq!(edits[0].message_id, 100);
    assert_eq!(
        edits[0].text,
        "✅ <b>ОДОБРЕН</b>\n\n👤 Ivan Petrov\n📧 ivan.petrov@example.com"
    );
}

#[tokio::test]
async fn reapproval_is_idempotent() {
    let app = TestApp::new();
    let id = app.submit(ivan_petrov(), true).await;
    let uri = format!("/api/candidates/{}", id);

    let (_, first) = app.patch(&uri, json!({ "status": "APPROVED" })).await;
    let (status, second) = app
        .patch(&uri, json!({ "status": "APPROVED", "reviewedBy": "Someone Else" }))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(email_ids(&first), email_ids(&second));
    assert_eq!(second["reviewedBy"], "Admin");
    assert_eq!(second["reviewedAt"], first["reviewedAt"]);
    assert_eq!(app.contacts.upserts().len(), 1);
}

#[tokio::test]
async fn rejection_skips_contact_sync() {
    let app = TestApp::new();
    let id = app.submit(ivan_petrov(), false).await;

    let (status, body) = app
        .patch(
            &format!("/api/candidates/{}", id),
            json!({ "status": "REJECTED", "reviewedBy": "Nina" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "REJECTED");
    assert_eq!(body["reviewedBy"], "Nina");
    assert_eq!(body["scheduledEmails"], json!([]));
    assert!(app.contacts.upserts().is_empty());
    assert!(app.notifier.edits()[0].text.starts_with("❌ <b>ОТХВЪРЛЕН</b>"));
}

#[tokio::test]
async fn invalid_status_changes_nothing() {
    let app = TestApp::new();
    let id = app.submit(ivan_petrov(), true).await;
    let uri = format!("/api/candidates/{}", id);

    let (status, body) = app.patch(&uri, json!({ "status": "MAYBE" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid status");

    let (status, _) = app
        .patch(&uri, json!({ "status": "APPROVED", "salesStage": "won" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, candidate) = app.get(&uri).await;
    assert_eq!(candidate["status"], "PENDING");
    assert_eq!(candidate["reviewedAt"], JsonValue::Null);
    assert!(app.contacts.upserts().is_empty());
}

#[tokio::test]
async fn reviewing_unknown_candidate_is_not_found() {
    let app = TestApp::new();
    let (status, _) = app
        .patch(
            &format!("/api/candidates/{}", Uuid::new_v4()),
            json!({ "status": "APPROVED" }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(app.contacts.upserts().is_empty());
}

#[tokio::test]
async fn sales_fields_update_without_review() {
    let app = TestApp::new();
    let id = app.submit(ivan_petrov(), false).await;
    let uri = format!("/api/candidates/{}", id);

    let (status, body) = app
        .patch(
            &uri,
            json!({ "salesStage": "presentation_scheduled", "salesNotes": "Call on Monday", "tags": ["VIP", "Hot lead"] }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "PENDING");
    assert_eq!(body["reviewedAt"], JsonValue::Null);
    assert_eq!(body["salesStage"], "presentation_scheduled");
    assert_eq!(body["salesNotes"], "Call on Monday");
    assert_eq!(body["tags"], json!(["VIP", "Hot lead"]));

    let (_, body) = app.patch(&uri, json!({ "salesStage": null })).await;
    assert_eq!(body["salesStage"], JsonValue::Null);
    assert_eq!(body["salesNotes"], "Call on Monday");

    assert!(app.notifier.edits().is_empty());
    assert!(app.contacts.upserts().is_empty());
}

#[tokio::test]
async fn contact_sync_failure_keeps_approval_without_sequence() {
    let app = TestApp::new();
    let id = app.submit(ivan_petrov(), true).await;
    app.contacts.fail_next_calls();

    let (status, body) = app
        .patch(&format!("/api/candidates/{}", id), json!({ "status": "APPROVED" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "APPROVED");
    assert_eq!(body["brevoContactId"], JsonValue::Null);
    assert_eq!(body["emailSequenceStartedAt"], JsonValue::Null);
    assert_eq!(body["scheduledEmails"], json!([]));
    assert_eq!(app.contacts.upserts().len(), 1);
}

#[tokio::test]
async fn reapproval_enrolls_after_contact_sync_recovers() {
    let app = TestApp::new();
    let id = app.submit(ivan_petrov(), true).await;
    let uri = format!("/api/candidates/{}", id);
    app.contacts.fail_next_calls();

    let (_, first) = app.patch(&uri, json!({ "status": "APPROVED" })).await;
    assert_eq!(first["scheduledEmails"], json!([]));

    app.contacts.recover();
    let (status, body) = app.patch(&uri, json!({ "status": "APPROVED" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "APPROVED");
    assert_eq!(body["reviewedAt"], first["reviewedAt"]);
    assert_eq!(body["brevoContactId"], "9001");
    assert_ne!(body["emailSequenceStartedAt"], JsonValue::Null);
    assert_eq!(body["scheduledEmails"].as_array().unwrap().len(), 3);
    assert_eq!(app.contacts.upserts().len(), 2);

    let (_, settled) = app.patch(&uri, json!({ "status": "APPROVED" })).await;
    assert_eq!(email_ids(&settled), email_ids(&body));
    assert_eq!(app.contacts.upserts().len(), 2);
}
