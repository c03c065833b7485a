use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;
use validator::Validate;

use crate::database::CandidateFilter;
use crate::error::{Error, Result};
use crate::models::candidate::{CandidateStatus, CandidateWithEmails, NewCandidate, SalesStage, Verdict};
use crate::models::review::{FieldChanges, ReviewChanges};
use crate::utils::time;

const DEFAULT_PAGE: i64 = 1;
const DEFAULT_LIMIT: i64 = 50;
const MAX_LIMIT: i64 = 500;

/// Accepts `182`, `"182"` or `"182 cm"`; anything without leading digits is
/// treated as absent.
fn deserialize_height_flexible<'de, D>(deserializer: D) -> std::result::Result<Option<i32>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum HeightValue {
        Int(i64),
        Float(f64),
        String(String),
    }

    let height = match Option::<HeightValue>::deserialize(deserializer)? {
        None => None,
        Some(HeightValue::Int(i)) => i32::try_from(i).ok(),
        Some(HeightValue::Float(f)) => Some(f.trunc() as i32),
        Some(HeightValue::String(s)) => {
            let digits: String = s.trim().chars().take_while(|c| c.is_ascii_digit()).collect();
            digits.parse().ok()
        }
    };
    Ok(height.filter(|h| *h > 0))
}

/// Distinguishes an absent field (`None`) from an explicit `null` (`Some(None)`).
fn deserialize_double_option<'de, T, D>(deserializer: D) -> std::result::Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateCandidateRequest {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[validate(email)]
    pub email: String,
    pub phone: Option<String>,
    pub birth_date: Option<String>,
    #[serde(default, deserialize_with = "deserialize_height_flexible")]
    pub height: Option<i32>,
    pub instagram: Option<String>,
    pub tiktok: Option<String>,
    pub city: Option<String>,
    pub category: Option<String>,
    #[serde(default)]
    pub photo_urls: Vec<String>,
    pub submitted_at: Option<String>,
    pub time: Option<String>,
}

impl CreateCandidateRequest {
    /// Normalizes sheet values: blanks become absent, unparseable submission
    /// times fall back to `now`.
    pub fn into_new_candidate(self, now: DateTime<Utc>) -> NewCandidate {
        let submitted_at = self
            .submitted_at
            .as_deref()
            .and_then(|date| time::parse_submitted_at(date, self.time.as_deref()))
            .unwrap_or(now);
        let birth_date = self.birth_date.as_deref().and_then(time::parse_birth_date);

        NewCandidate {
            first_name: self.first_name.trim().to_string(),
            last_name: self.last_name.trim().to_string(),
            email: self.email.trim().to_string(),
            phone: non_empty(self.phone),
            birth_date,
            height_cm: self.height,
            instagram: non_empty(self.instagram),
            tiktok: non_empty(self.tiktok),
            city: non_empty(self.city),
            category: non_empty(self.category),
            photo_urls: self
                .photo_urls
                .into_iter()
                .map(|url| url.trim().to_string())
                .filter(|url| !url.is_empty())
                .collect(),
            submitted_at,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct IntakeQuery {
    pub silent: Option<String>,
}

impl IntakeQuery {
    pub fn is_silent(&self) -> bool {
        self.silent.as_deref() == Some("true")
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateCandidateResponse {
    pub success: bool,
    pub id: Uuid,
    pub silent: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct DuplicateCandidateResponse {
    pub error: String,
    pub id: Uuid,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewCandidateRequest {
    pub status: Option<String>,
    #[serde(default, deserialize_with = "deserialize_double_option")]
    pub sales_stage: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_double_option")]
    pub sales_notes: Option<Option<String>>,
    pub tags: Option<JsonValue>,
    pub reviewed_by: Option<String>,
}

impl ReviewCandidateRequest {
    /// Validates the request before anything is persisted.
    pub fn into_changes(self) -> Result<(ReviewChanges, Option<String>)> {
        let status = self
            .status
            .map(|s| s.parse::<Verdict>())
            .transpose()
            .map_err(|_| Error::BadRequest("Invalid status".to_string()))?;

        let sales_stage = match self.sales_stage {
            None => None,
            Some(stage) => Some(
                non_empty(stage)
                    .map(|s| s.parse::<SalesStage>())
                    .transpose()
                    .map_err(Error::BadRequest)?,
            ),
        };

        let sales_notes = self.sales_notes.map(non_empty);

        let tags = match self.tags {
            None => None,
            Some(JsonValue::Array(items)) => Some(
                items
                    .into_iter()
                    .map(|item| match item {
                        JsonValue::String(tag) => Ok(tag.trim().to_string()),
                        _ => Err(Error::BadRequest("Tags must be an array of strings".to_string())),
                    })
                    .filter(|tag| !matches!(tag, Ok(t) if t.is_empty()))
                    .collect::<Result<Vec<_>>>()?,
            ),
            Some(_) => {
                return Err(Error::BadRequest("Tags must be an array of strings".to_string()));
            }
        };

        let changes = ReviewChanges {
            status,
            fields: FieldChanges {
                sales_stage,
                sales_notes,
                tags,
            },
        };
        Ok((changes, self.reviewed_by))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListCandidatesQuery {
    pub status: Option<String>,
    pub city: Option<String>,
    pub min_age: Option<u32>,
    pub max_age: Option<u32>,
    pub search: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl ListCandidatesQuery {
    pub fn page(&self) -> i64 {
        self.page.filter(|p| *p > 0).unwrap_or(DEFAULT_PAGE)
    }

    pub fn limit(&self) -> i64 {
        self.limit
            .filter(|l| *l > 0)
            .unwrap_or(DEFAULT_LIMIT)
            .min(MAX_LIMIT)
    }

    /// Age bounds become birth-date bounds relative to `today`: `maxAge`
    /// keeps candidates born after `today - (maxAge + 1)` years, `minAge`
    /// those born on or before `today - minAge` years.
    pub fn to_filter(&self, today: NaiveDate) -> Result<CandidateFilter> {
        let status = non_empty(self.status.clone())
            .map(|s| s.parse::<CandidateStatus>())
            .transpose()
            .map_err(Error::BadRequest)?;
        let offset = (self.page() - 1)
            .checked_mul(self.limit())
            .ok_or_else(|| Error::BadRequest("Page is out of range".to_string()))?;

        Ok(CandidateFilter {
            status,
            city: non_empty(self.city.clone()),
            born_on_or_after: self
                .max_age
                .and_then(|age| time::years_before(today, age.saturating_add(1))),
            born_on_or_before: self.min_age.and_then(|age| time::years_before(today, age)),
            search: non_empty(self.search.clone()),
            offset,
            limit: self.limit(),
        })
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    pub total_pages: i64,
}

impl Pagination {
    pub fn new(page: i64, limit: i64, total: i64) -> Self {
        let total_pages = if limit > 0 { (total + limit - 1) / limit } else { 0 };
        Self {
            page,
            limit,
            total,
            total_pages,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ListFilters {
    pub cities: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ListCandidatesResponse {
    pub candidates: Vec<CandidateWithEmails>,
    pub pagination: Pagination,
    pub filters: ListFilters,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn create_request(body: JsonValue) -> CreateCandidateRequest {
        serde_json::from_value(body).unwrap()
    }

    #[test]
    fn intake_body_is_normalized() {
        let now = Utc::now();
        let request = create_request(json!({
            "firstName": "Ivan",
            "lastName": "Petrov",
            "email": "ivan@example.com",
            "phone": "",
            "birthDate": "2000-06-15",
            "height": "182 cm",
            "city": "Sofia",
            "photoUrls": ["https://cdn.example.com/a.jpg", " "],
            "submittedAt": "2026-03-01",
            "time": "09:30:00"
        }));
        assert!(request.validate().is_ok());

        let candidate = request.into_new_candidate(now);
        assert_eq!(candidate.email, "ivan@example.com");
        assert_eq!(candidate.phone, None);
        assert_eq!(candidate.height_cm, Some(182));
        assert_eq!(candidate.birth_date, NaiveDate::from_ymd_opt(2000, 6, 15));
        assert_eq!(candidate.photo_urls, vec!["https://cdn.example.com/a.jpg".to_string()]);
        assert_eq!(candidate.submitted_at.to_rfc3339(), "2026-03-01T09:30:00+00:00");
    }

    #[test]
    fn numeric_height_and_bad_timestamp() {
        let now = Utc::now();
        let candidate = create_request(json!({
            "email": "a@example.com",
            "height": 175,
            "submittedAt": "not a date"
        }))
        .into_new_candidate(now);
        assert_eq!(candidate.height_cm, Some(175));
        assert_eq!(candidate.submitted_at, now);
        assert_eq!(candidate.first_name, "");
    }

    #[test]
    fn invalid_email_fails_validation() {
        let request = create_request(json!({ "email": "nope" }));
        assert!(request.validate().is_err());
    }

    #[test]
    fn review_status_must_be_terminal() {
        let request: ReviewCandidateRequest =
            serde_json::from_value(json!({ "status": "MAYBE" })).unwrap();
        assert!(matches!(request.into_changes(), Err(Error::BadRequest(_))));

        let request: ReviewCandidateRequest =
            serde_json::from_value(json!({ "status": "PENDING" })).unwrap();
        assert!(request.into_changes().is_err());
    }

    #[test]
    fn review_fields_distinguish_null_from_absent() {
        let request: ReviewCandidateRequest = serde_json::from_value(json!({
            "status": "APPROVED",
            "salesStage": null,
            "tags": ["VIP", "  ", "Hot lead"],
            "reviewedBy": "Nina"
        }))
        .unwrap();
        let (changes, reviewer) = request.into_changes().unwrap();
        assert_eq!(changes.status, Some(Verdict::Approved));
        assert_eq!(changes.fields.sales_stage, Some(None));
        assert_eq!(changes.fields.sales_notes, None);
        assert_eq!(
            changes.fields.tags,
            Some(vec!["VIP".to_string(), "Hot lead".to_string()])
        );
        assert_eq!(reviewer.as_deref(), Some("Nina"));
    }

    #[test]
    fn review_rejects_bad_stage_and_tags() {
        let request: ReviewCandidateRequest =
            serde_json::from_value(json!({ "salesStage": "won" })).unwrap();
        assert!(request.into_changes().is_err());

        let request: ReviewCandidateRequest =
            serde_json::from_value(json!({ "tags": "VIP" })).unwrap();
        assert!(request.into_changes().is_err());

        let request: ReviewCandidateRequest =
            serde_json::from_value(json!({ "tags": ["VIP", 3] })).unwrap();
        assert!(request.into_changes().is_err());
    }

    #[test]
    fn list_query_translates_ages() {
        let today = NaiveDate::from_ymd_opt(2026, 10, 18).unwrap();
        let query = ListCandidatesQuery {
            status: Some("approved".into()),
            min_age: Some(18),
            max_age: Some(25),
            page: Some(3),
            limit: Some(20),
            ..Default::default()
        };
        let filter = query.to_filter(today).unwrap();
        assert_eq!(filter.status, Some(CandidateStatus::Approved));
        assert_eq!(filter.born_on_or_before, NaiveDate::from_ymd_opt(2008, 10, 18));
        assert_eq!(filter.born_on_or_after, NaiveDate::from_ymd_opt(2000, 10, 18));
        assert_eq!((filter.offset, filter.limit), (40, 20));
    }

    #[test]
    fn huge_page_is_rejected() {
        let today = NaiveDate::from_ymd_opt(2026, 10, 18).unwrap();
        let query = ListCandidatesQuery {
            page: Some(i64::MAX),
            ..Default::default()
        };
        match query.to_filter(today) {
            Err(Error::BadRequest(message)) => assert_eq!(message, "Page is out of range"),
            other => panic!("unexpected filter: {:?}", other),
        }

        let last_page = ListCandidatesQuery {
            page: Some(i64::MAX / MAX_LIMIT),
            limit: Some(MAX_LIMIT),
            ..Default::default()
        };
        assert!(last_page.to_filter(today).is_ok());
    }

    #[test]
    fn pagination_rounds_up() {
        assert_eq!(Pagination::new(1, 50, 101).total_pages, 3);
        assert_eq!(Pagination::new(1, 50, 0).total_pages, 0);
    }
}
