use axum::{body::Bytes, extract::State, Json};
use serde_json::{json, Value as JsonValue};

use crate::{
    dto::telegram_dto::{CallbackQuery, TelegramUpdate},
    AppState,
};

/// Telegram retries any non-2xx answer, so this always acknowledges.
pub async fn handle_webhook(State(state): State<AppState>, body: Bytes) -> Json<JsonValue> {
    let update = match serde_json::from_slice::<TelegramUpdate>(&body) {
        Ok(update) => update,
        Err(e) => {
            tracing::warn!(error = %e, "ignoring unparseable Telegram update");
            return Json(json!({ "ok": true }));
        }
    };

    let Some(action) = update.callback_query.as_ref().and_then(CallbackQuery::to_action) else {
        tracing::debug!(update_id = update.update_id, "Telegram update carries no review action");
        return Json(json!({ "ok": true }));
    };

    tracing::info!(
        update_id = update.update_id,
        candidate_id = %action.candidate_id,
        verb = ?action.verb,
        "received review action from chat"
    );
    if let Err(e) = state.review_service.handle_chat_action(&action).await {
        tracing::error!(error = %e, candidate_id = %action.candidate_id, "failed to handle chat action");
    }
    Json(json!({ "ok": true }))
}

pub async fn webhook_status() -> Json<JsonValue> {
    Json(json!({ "status": "Telegram webhook endpoint active" }))
}
