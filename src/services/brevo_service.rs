use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use tracing::info;

use crate::error::{Error, Result};
use crate::models::candidate::Candidate;

/// Contact upsert keyed by email.
#[derive(Debug, Clone, PartialEq)]
pub struct ContactUpsert {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub attributes: BTreeMap<String, String>,
}

impl ContactUpsert {
    pub fn from_candidate(candidate: &Candidate) -> Self {
        let mut attributes = BTreeMap::new();
        attributes.insert("CITY".to_string(), candidate.city.clone().unwrap_or_default());
        attributes.insert(
            "CATEGORY".to_string(),
            candidate.category.clone().unwrap_or_default(),
        );

        Self {
            email: candidate.email.clone(),
            first_name: candidate.first_name.clone(),
            last_name: candidate.last_name.clone(),
            phone: candidate.phone.clone().filter(|p| !p.is_empty()),
            attributes,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactReceipt {
    /// Present when the contact was created; an update of an existing
    /// contact is acknowledged without an id.
    pub contact_id: Option<String>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ContactSync: Send + Sync {
    async fn upsert_contact(&self, contact: &ContactUpsert) -> Result<ContactReceipt>;
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateContactBody<'a> {
    email: &'a str,
    attributes: BTreeMap<&'a str, &'a str>,
    list_ids: [i64; 1],
    update_enabled: bool,
}

#[derive(Debug, Deserialize)]
struct CreateContactResponse {
    id: Option<JsonValue>,
}

#[derive(Clone)]
pub struct BrevoService {
    client: Client,
    base_url: String,
    api_key: String,
    list_id: i64,
}

impl BrevoService {
    pub fn new(client: Client, base_url: String, api_key: String, list_id: i64) -> Self {
        info!("Brevo contact sync enabled for list {}", list_id);
        Self {
            client,
            base_url,
            api_key,
            list_id,
        }
    }
}

#[async_trait]
impl ContactSync for BrevoService {
    async fn upsert_contact(&self, contact: &ContactUpsert) -> Result<ContactReceipt> {
        let mut attributes: BTreeMap<&str, &str> = BTreeMap::new();
        attributes.insert("FIRSTNAME", &contact.first_name);
        attributes.insert("LASTNAME", &contact.last_name);
        if let Some(phone) = &contact.phone {
            attributes.insert("SMS", phone);
        }
        for (key, value) in &contact.attributes {
            attributes.insert(key, value);
        }

        let body = CreateContactBody {
            email: &contact.email,
            attributes,
            list_ids: [self.list_id],
            update_enabled: true,
        };

        let response = self
            .client
            .post(format!("{}/contacts", self.base_url))
            .header("api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::NO_CONTENT {
            return Ok(ContactReceipt { contact_id: None });
        }

        let text = response.text().await.unwrap_or_default();
        if !status.is_success() {
            return Err(Error::External(format!(
                "Brevo API error {}: {}",
                status.as_u16(),
                text
            )));
        }

        let parsed: CreateContactResponse = serde_json::from_str(&text)?;
        let contact_id = parsed.id.and_then(|id| match id {
            JsonValue::Number(n) => Some(n.to_string()),
            JsonValue::String(s) => Some(s),
            _ => None,
        });
        Ok(ContactReceipt { contact_id })
    }
}
