use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value as JsonValue};
use tracing::info;

use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InlineKeyboardButton {
    pub text: String,
    pub callback_data: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InlineKeyboardMarkup {
    pub inline_keyboard: Vec<Vec<InlineKeyboardButton>>,
}

/// Coordinates of a delivered message, needed to edit it later.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SentMessage {
    pub message_id: i64,
    pub chat_id: i64,
}

/// Chat notification surface used for reviewer alerts and verdict banners.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Sends an HTML message. `chat_id` falls back to the configured admin chat.
    async fn send_message(
        &self,
        chat_id: Option<i64>,
        text: &str,
        reply_markup: Option<InlineKeyboardMarkup>,
    ) -> Result<SentMessage>;

    /// Replaces the text of an existing message; inline buttons are dropped.
    async fn edit_message(&self, chat_id: i64, message_id: i64, text: &str) -> Result<()>;

    /// Clears the loading state of a pressed inline button.
    async fn answer_callback(&self, callback_query_id: &str, text: Option<String>) -> Result<()>;
}

#[derive(Debug, Deserialize)]
struct TelegramResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MessageResult {
    message_id: i64,
    chat: ChatResult,
}

#[derive(Debug, Deserialize)]
struct ChatResult {
    id: i64,
}

#[derive(Debug, Deserialize)]
struct WebhookInfo {
    #[serde(default)]
    url: String,
}

#[derive(Clone)]
pub struct TelegramService {
    client: Client,
    api_url: String,
    bot_token: String,
    default_chat_id: i64,
}

impl TelegramService {
    pub fn new(client: Client, api_url: String, bot_token: String, default_chat_id: i64) -> Self {
        Self {
            client,
            api_url,
            bot_token,
            default_chat_id,
        }
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, body: &JsonValue) -> Result<Option<T>> {
        let url = format!("{}/bot{}/{}", self.api_url, self.bot_token, method);
        let response = self.client.post(&url).json(body).send().await?;
        let status = response.status();
        let text = response.text().await.unwrap_or_default();

        let parsed: TelegramResponse<T> = serde_json::from_str(&text).map_err(|_| {
            Error::External(format!("Telegram {} returned {}: {}", method, status.as_u16(), text))
        })?;
        if !parsed.ok {
            return Err(Error::External(format!(
                "Telegram {} failed: {}",
                method,
                parsed.description.unwrap_or_else(|| status.to_string())
            )));
        }
        Ok(parsed.result)
    }

    /// Points the bot webhook at `target_url` unless it already is.
    pub async fn ensure_webhook(&self, target_url: &str) -> Result<()> {
        info!("Checking Telegram webhook status...");
        let current = self
            .call::<WebhookInfo>("getWebhookInfo", &json!({}))
            .await?
            .map(|info| info.url)
            .unwrap_or_default();

        if current == target_url {
            info!("Telegram webhook is already up to date: {}", current);
            return Ok(());
        }

        info!("Updating Telegram webhook: {} -> {}", current, target_url);
        self.call::<JsonValue>(
            "setWebhook",
            &json!({
                "url": target_url,
                "allowed_updates": ["callback_query"],
            }),
        )
        .await?;
        info!("Telegram webhook registered successfully");
        Ok(())
    }
}

#[async_trait]
impl Notifier for TelegramService {
    async fn send_message(
        &self,
        chat_id: Option<i64>,
        text: &str,
        reply_markup: Option<InlineKeyboardMarkup>,
    ) -> Result<SentMessage> {
        let mut body = json!({
            "chat_id": chat_id.unwrap_or(self.default_chat_id),
            "text": text,
            "parse_mode": "HTML",
        });
        if let Some(markup) = reply_markup {
            body["reply_markup"] = serde_json::to_value(markup)?;
        }

        let result = self
            .call::<MessageResult>("sendMessage", &body)
            .await?
            .ok_or_else(|| Error::External("Telegram sendMessage returned no result".into()))?;

        Ok(SentMessage {
            message_id: result.message_id,
            chat_id: result.chat.id,
        })
    }

    async fn edit_message(&self, chat_id: i64, message_id: i64, text: &str) -> Result<()> {
        let body = json!({
            "chat_id": chat_id,
            "message_id": message_id,
            "text": text,
            "parse_mode": "HTML",
        });
        self.call::<JsonValue>("editMessageText", &body).await?;
        Ok(())
    }

    async fn answer_callback(&self, callback_query_id: &str, text: Option<String>) -> Result<()> {
        let mut body = json!({ "callback_query_id": callback_query_id });
        if let Some(text) = text {
            body["text"] = JsonValue::String(text);
        }
        self.call::<JsonValue>("answerCallbackQuery", &body).await?;
        Ok(())
    }
}
