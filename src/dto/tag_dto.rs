use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::error::{Error, Result};
use crate::models::tag::Tag;

#[derive(Debug, Clone, Deserialize)]
pub struct CreateTagRequest {
    pub name: Option<JsonValue>,
}

impl CreateTagRequest {
    pub fn trimmed_name(&self) -> Result<String> {
        match &self.name {
            Some(JsonValue::String(name)) if !name.trim().is_empty() => Ok(name.trim().to_string()),
            _ => Err(Error::BadRequest("Tag name is required".to_string())),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TagListResponse {
    pub tags: Vec<Tag>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TagResponse {
    pub tag: Tag,
}

#[derive(Debug, Clone, Serialize)]
pub struct DuplicateTagResponse {
    pub error: String,
    pub tag: Tag,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn tag_name_is_trimmed_and_required() {
        let request: CreateTagRequest = serde_json::from_value(json!({ "name": "  VIP " })).unwrap();
        assert_eq!(request.trimmed_name().unwrap(), "VIP");

        for body in [json!({}), json!({ "name": "   " }), json!({ "name": 5 })] {
            let request: CreateTagRequest = serde_json::from_value(body).unwrap();
            assert!(matches!(request.trimmed_name(), Err(Error::BadRequest(_))));
        }
    }
}
