#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use casting_backend::{
    database::MemoryCandidateStore,
    error::{Error, Result},
    routes,
    services::{
        brevo_service::{ContactReceipt, ContactSync, ContactUpsert},
        telegram_service::{InlineKeyboardMarkup, Notifier, SentMessage},
    },
    AppState,
};
use serde_json::{json, Value as JsonValue};
use tower::ServiceExt;

pub const API_KEY: &str = "test-api-key";
pub const ADMIN_CHAT_ID: i64 = -1001234;

#[derive(Debug, Clone)]
pub struct SentText {
    pub chat_id: i64,
    pub text: String,
    pub reply_markup: Option<InlineKeyboardMarkup>,
}

#[derive(Debug, Clone)]
pub struct EditedText {
    pub chat_id: i64,
    pub message_id: i64,
    pub text: String,
}

/// Records every chat call; message ids are handed out sequentially from 100.
#[derive(Default)]
pub struct RecordingNotifier {
    pub sent: Mutex<Vec<SentText>>,
    pub edits: Mutex<Vec<EditedText>>,
    pub answers: Mutex<Vec<(String, Option<String>)>>,
    next_message_id: AtomicI64,
}

impl RecordingNotifier {
    pub fn sent(&self) -> Vec<SentText> {
        self.sent.lock().unwrap().clone()
    }

    pub fn edits(&self) -> Vec<EditedText> {
        self.edits.lock().unwrap().clone()
    }

    pub fn answers(&self) -> Vec<(String, Option<String>)> {
        self.answers.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send_message(
        &self,
        chat_id: Option<i64>,
        text: &str,
        reply_markup: Option<InlineKeyboardMarkup>,
    ) -> Result<SentMessage> {
        let chat_id = chat_id.unwrap_or(ADMIN_CHAT_ID);
        self.sent.lock().unwrap().push(SentText {
            chat_id,
            text: text.to_string(),
            reply_markup,
        });
        let message_id = 100 + self.next_message_id.fetch_add(1, Ordering::SeqCst);
        Ok(SentMessage {
            message_id,
            chat_id,
        })
    }

    async fn edit_message(&self, chat_id: i64, message_id: i64, text: &str) -> Result<()> {
        self.edits.lock().unwrap().push(EditedText {
            chat_id,
            message_id,
            text: text.to_string(),
        });
        Ok(())
    }

    async fn answer_callback(&self, callback_query_id: &str, text: Option<String>) -> Result<()> {
        self.answers
            .lock()
            .unwrap()
            .push((callback_query_id.to_string(), text));
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingContacts {
    pub upserts: Mutex<Vec<ContactUpsert>>,
    pub fail: AtomicBool,
}

impl RecordingContacts {
    pub fn upserts(&self) -> Vec<ContactUpsert> {
        self.upserts.lock().unwrap().clone()
    }

    pub fn fail_next_calls(&self) {
        self.fail.store(true, Ordering::SeqCst);
    }

    pub fn recover(&self) {
        self.fail.store(false, Ordering::SeqCst);
    }
}

#[async_trait]
impl ContactSync for RecordingContacts {
    async fn upsert_contact(&self, contact: &ContactUpsert) -> Result<ContactReceipt> {
        self.upserts.lock().unwrap().push(contact.clone());
        if self.fail.load(Ordering::SeqCst) {
            return Err(Error::External("Brevo API error 503: unavailable".to_string()));
        }
        Ok(ContactReceipt {
            contact_id: Some("9001".to_string()),
        })
    }
}

pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryCandidateStore>,
    pub notifier: Arc<RecordingNotifier>,
    pub contacts: Arc<RecordingContacts>,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_public_rps(1000)
    }

    pub fn with_public_rps(public_rps: u32) -> Self {
        let store = Arc::new(MemoryCandidateStore::new());
        let notifier = Arc::new(RecordingNotifier::default());
        let contacts = Arc::new(RecordingContacts::default());
        let state = AppState::with_clients(
            store.clone(),
            contacts.clone(),
            notifier.clone(),
            API_KEY,
            public_rps,
        );
        Self {
            router: routes::router(state),
            store,
            notifier,
            contacts,
        }
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<JsonValue>,
        bearer: Option<&str>,
    ) -> (StatusCode, JsonValue) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = bearer {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        self.send(request).await
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, JsonValue) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            JsonValue::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| json!(String::from_utf8_lossy(&bytes)))
        };
        (status, body)
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, JsonValue) {
        self.request(Method::GET, uri, None, None).await
    }

    pub async fn patch(&self, uri: &str, body: JsonValue) -> (StatusCode, JsonValue) {
        self.request(Method::PATCH, uri, Some(body), None).await
    }

    /// Submits an application with the intake key and returns its id.
    pub async fn submit(&self, body: JsonValue, silent: bool) -> String {
        let uri = if silent {
            "/api/candidates?silent=true"
        } else {
            "/api/candidates"
        };
        let (status, body) = self.request(Method::POST, uri, Some(body), Some(API_KEY)).await;
        assert_eq!(status, StatusCode::CREATED, "unexpected intake response: {}", body);
        body["id"].as_str().unwrap().to_string()
    }

    pub async fn post_update(&self, update: JsonValue) -> (StatusCode, JsonValue) {
        self.request(Method::POST, "/api/telegram/webhook", Some(update), None)
            .await
    }
}

pub fn ivan_petrov() -> JsonValue {
    json!({
        "firstName": "Ivan",
        "lastName": "Petrov",
        "email": "ivan.petrov@example.com",
        "phone": "+359888123456",
        "birthDate": "2001-04-12",
        "height": "183",
        "instagram": "https://instagram.com/ivan.petrov",
        "city": "Sofia",
        "category": "Fashion, Commercial",
        "photoUrls": ["https://cdn.example.com/ivan-1.jpg", "https://cdn.example.com/ivan-2.jpg"],
        "submittedAt": "2026-10-17",
        "time": "18:45:00"
    })
}

pub fn applicant(first: &str, last: &str, email: &str, city: &str, birth_date: &str) -> JsonValue {
    json!({
        "firstName": first,
        "lastName": last,
        "email": email,
        "city": city,
        "birthDate": birth_date,
    })
}

pub fn callback_update(update_id: i64, data: &str, chat_id: i64, message_id: i64) -> JsonValue {
    json!({
        "update_id": update_id,
        "callback_query": {
            "id": format!("cbq-{}", update_id),
            "from": { "id": 501, "is_bot": false, "first_name": "Maria", "username": "maria" },
            "message": {
                "message_id": message_id,
                "date": 1760000000,
                "chat": { "id": chat_id, "type": "supergroup" }
            },
            "chat_instance": "42",
            "data": data
        }
    })
}
