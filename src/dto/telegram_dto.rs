use serde::Deserialize;

use crate::services::review_service::{ChatAction, ChatReviewer};

/// The subset of a Telegram update this service reacts to. Unknown fields are
/// ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct TelegramUpdate {
    #[serde(default)]
    pub update_id: i64,
    pub callback_query: Option<CallbackQuery>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CallbackQuery {
    pub id: String,
    pub from: Option<TelegramUser>,
    pub message: Option<CallbackMessage>,
    pub data: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TelegramUser {
    pub id: i64,
    pub first_name: Option<String>,
    pub username: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CallbackMessage {
    pub message_id: i64,
    pub chat: TelegramChat,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TelegramChat {
    pub id: i64,
}

impl CallbackQuery {
    /// `None` when the button press cannot be attributed to a message or its
    /// data is not an approve/reject action.
    pub fn to_action(&self) -> Option<ChatAction> {
        let (verb, candidate_id) = ChatAction::parse_data(self.data.as_deref()?)?;
        let message = self.message.as_ref()?;
        let reviewer = self
            .from
            .as_ref()
            .map(|user| ChatReviewer {
                username: user.username.clone(),
                first_name: user.first_name.clone(),
            })
            .unwrap_or_default();

        Some(ChatAction {
            verb,
            candidate_id,
            reviewer,
            chat_id: message.chat.id,
            message_id: message.message_id,
            callback_query_id: self.id.clone(),
        })
    }
}
