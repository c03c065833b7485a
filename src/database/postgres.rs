use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};
use std::collections::HashMap;
use uuid::Uuid;

use super::store::{CandidateFilter, CandidatePage, CandidateStore, InsertOutcome, TagInsert};
use crate::error::Result;
use crate::models::candidate::{Candidate, CandidateWithEmails, NewCandidate};
use crate::models::review::{FieldChanges, ReviewRecord};
use crate::models::scheduled_email::ScheduledEmail;
use crate::models::tag::Tag;
use crate::services::email_sequence::ScheduledEmailDraft;

#[derive(Clone)]
pub struct PgCandidateStore {
    pool: PgPool,
}

impl PgCandidateStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn emails_for(&self, ids: &[Uuid]) -> Result<HashMap<Uuid, Vec<ScheduledEmail>>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let rows = sqlx::query_as::<_, ScheduledEmail>(
            r#"
            SELECT * FROM scheduled_emails
            WHERE candidate_id = ANY($1)
            ORDER BY email_number ASC
            "#,
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        let mut grouped: HashMap<Uuid, Vec<ScheduledEmail>> = HashMap::new();
        for row in rows {
            grouped.entry(row.candidate_id).or_default().push(row);
        }
        Ok(grouped)
    }
}

fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, filter: &CandidateFilter) {
    qb.push(" WHERE TRUE");
    if let Some(status) = filter.status {
        qb.push(" AND status = ").push_bind(status);
    }
    if let Some(city) = &filter.city {
        qb.push(" AND city ILIKE ").push_bind(format!("%{}%", city));
    }
    if let Some(date) = filter.born_on_or_after {
        qb.push(" AND birth_date >= ").push_bind(date);
    }
    if let Some(date) = filter.born_on_or_before {
        qb.push(" AND birth_date <= ").push_bind(date);
    }
    if let Some(search) = &filter.search {
        let pattern = format!("%{}%", search);
        qb.push(" AND (first_name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR last_name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR email ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR phone ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
}

#[async_trait]
impl CandidateStore for PgCandidateStore {
    async fn find_candidate(&self, id: Uuid) -> Result<Option<Candidate>> {
        let candidate = sqlx::query_as::<_, Candidate>("SELECT * FROM candidates WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(candidate)
    }

    async fn find_candidate_by_email(&self, email: &str) -> Result<Option<Candidate>> {
        let candidate = sqlx::query_as::<_, Candidate>("SELECT * FROM candidates WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(candidate)
    }

    async fn insert_candidate(&self, new: NewCandidate) -> Result<InsertOutcome> {
        let inserted = sqlx::query_as::<_, Candidate>(
            r#"
            INSERT INTO candidates (
                id, first_name, last_name, email, phone, birth_date, height_cm,
                instagram, tiktok, city, category, photo_urls, submitted_at, status
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, 'PENDING')
            ON CONFLICT (email) DO NOTHING
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&new.first_name)
        .bind(&new.last_name)
        .bind(&new.email)
        .bind(&new.phone)
        .bind(new.birth_date)
        .bind(new.height_cm)
        .bind(&new.instagram)
        .bind(&new.tiktok)
        .bind(&new.city)
        .bind(&new.category)
        .bind(&new.photo_urls)
        .bind(new.submitted_at)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(candidate) = inserted {
            return Ok(InsertOutcome::Created(candidate));
        }

        let existing: Uuid = sqlx::query_scalar("SELECT id FROM candidates WHERE email = $1")
            .bind(&new.email)
            .fetch_one(&self.pool)
            .await?;
        Ok(InsertOutcome::Existing(existing))
    }

    async fn bind_telegram_message(&self, id: Uuid, chat_id: i64, message_id: i64) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE candidates
            SET telegram_chat_id = $2, telegram_message_id = $3, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(chat_id)
        .bind(message_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn list_candidates(&self, filter: &CandidateFilter) -> Result<CandidatePage> {
        let mut query = QueryBuilder::<Postgres>::new("SELECT * FROM candidates");
        push_filters(&mut query, filter);
        query
            .push(" ORDER BY submitted_at DESC LIMIT ")
            .push_bind(filter.limit)
            .push(" OFFSET ")
            .push_bind(filter.offset);
        let candidates: Vec<Candidate> = query.build_query_as().fetch_all(&self.pool).await?;

        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM candidates");
        push_filters(&mut count, filter);
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        let ids: Vec<Uuid> = candidates.iter().map(|c| c.id).collect();
        let mut emails = self.emails_for(&ids).await?;

        let candidates = candidates
            .into_iter()
            .map(|candidate| {
                let scheduled_emails = emails.remove(&candidate.id).unwrap_or_default();
                CandidateWithEmails { candidate, scheduled_emails }
            })
            .collect();

        Ok(CandidatePage { candidates, total })
    }

    async fn distinct_cities(&self) -> Result<Vec<String>> {
        let cities = sqlx::query_scalar::<_, String>(
            r#"
            SELECT DISTINCT city FROM candidates
            WHERE city IS NOT NULL AND city <> ''
            ORDER BY city
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(cities)
    }

    async fn apply_review(
        &self,
        id: Uuid,
        review: &ReviewRecord,
        fields: &FieldChanges,
    ) -> Result<Option<Candidate>> {
        let candidate = sqlx::query_as::<_, Candidate>(
            r#"
            UPDATE candidates
            SET status = $2,
                reviewed_at = $3,
                reviewed_by = $4,
                sales_stage = CASE WHEN $5 THEN $6 ELSE sales_stage END,
                sales_notes = CASE WHEN $7 THEN $8 ELSE sales_notes END,
                tags = COALESCE($9, tags),
                updated_at = NOW()
            WHERE id = $1 AND status = 'PENDING'
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(review.status)
        .bind(review.reviewed_at)
        .bind(&review.reviewed_by)
        .bind(fields.sales_stage.is_some())
        .bind(fields.sales_stage.flatten())
        .bind(fields.sales_notes.is_some())
        .bind(fields.sales_notes.clone().flatten())
        .bind(fields.tags.clone())
        .fetch_optional(&self.pool)
        .await?;
        Ok(candidate)
    }

    async fn apply_field_changes(&self, id: Uuid, fields: &FieldChanges) -> Result<Option<Candidate>> {
        let candidate = sqlx::query_as::<_, Candidate>(
            r#"
            UPDATE candidates
            SET sales_stage = CASE WHEN $2 THEN $3 ELSE sales_stage END,
                sales_notes = CASE WHEN $4 THEN $5 ELSE sales_notes END,
                tags = COALESCE($6, tags),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(fields.sales_stage.is_some())
        .bind(fields.sales_stage.flatten())
        .bind(fields.sales_notes.is_some())
        .bind(fields.sales_notes.clone().flatten())
        .bind(fields.tags.clone())
        .fetch_optional(&self.pool)
        .await?;
        Ok(candidate)
    }

    async fn start_email_sequence(
        &self,
        id: Uuid,
        contact_id: Option<&str>,
        started_at: DateTime<Utc>,
        drafts: &[ScheduledEmailDraft],
    ) -> Result<u64> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            UPDATE candidates
            SET brevo_contact_id = COALESCE($2, brevo_contact_id),
                email_sequence_started_at = COALESCE(email_sequence_started_at, $3),
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(contact_id)
        .bind(started_at)
        .execute(&mut *tx)
        .await?;

        let mut inserted = 0;
        for draft in drafts {
            let result = sqlx::query(
                r#"
                INSERT INTO scheduled_emails (id, candidate_id, email_number, template_id, subject, scheduled_for)
                VALUES ($1, $2, $3, $4, $5, $6)
                ON CONFLICT (candidate_id, email_number) DO NOTHING
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(id)
            .bind(draft.email_number)
            .bind(draft.template_id)
            .bind(&draft.subject)
            .bind(draft.scheduled_for)
            .execute(&mut *tx)
            .await?;
            inserted += result.rows_affected();
        }

        tx.commit().await?;
        Ok(inserted)
    }

    async fn scheduled_emails(&self, candidate_id: Uuid) -> Result<Vec<ScheduledEmail>> {
        let emails = sqlx::query_as::<_, ScheduledEmail>(
            r#"
            SELECT * FROM scheduled_emails
            WHERE candidate_id = $1
            ORDER BY email_number ASC
            "#,
        )
        .bind(candidate_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(emails)
    }

    async fn list_tags(&self) -> Result<Vec<Tag>> {
        let tags = sqlx::query_as::<_, Tag>("SELECT * FROM tags ORDER BY name ASC")
            .fetch_all(&self.pool)
            .await?;
        Ok(tags)
    }

    async fn seed_tags(&self, names: &[&str]) -> Result<()> {
        let names: Vec<String> = names.iter().map(|n| n.to_string()).collect();
        sqlx::query(
            r#"
            INSERT INTO tags (name)
            SELECT UNNEST($1::text[])
            ON CONFLICT (name) DO NOTHING
            "#,
        )
        .bind(&names)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn create_tag(&self, name: &str) -> Result<TagInsert> {
        let inserted = sqlx::query_as::<_, Tag>(
            r#"
            INSERT INTO tags (name) VALUES ($1)
            ON CONFLICT (name) DO NOTHING
            RETURNING *
            "#,
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        match inserted {
            Some(tag) => Ok(TagInsert::Created(tag)),
            None => {
                let existing = sqlx::query_as::<_, Tag>("SELECT * FROM tags WHERE name = $1")
                    .bind(name)
                    .fetch_one(&self.pool)
                    .await?;
                Ok(TagInsert::Existing(existing))
            }
        }
    }
}
