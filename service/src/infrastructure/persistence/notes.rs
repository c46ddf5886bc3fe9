use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use quire_common::database::Database;
use quire_common::{
    CONTENT_TYPE_FIELD_NAME, ContentId, ContentType, Cover, LookupKey,
    NOTE_ID_FIELD_NAME, NOTES_TABLE_NAME, OWNER_ID_FIELD_NAME, OwnerId, PUBLISHED_FIELD_NAME,
    RemoteRecord, SLUG_FIELD_NAME, Submission, TAGS_FIELD_NAME, TRANSACTION_HASH_FIELD_NAME,
    UPDATED_FIELD_NAME, UPDATED_TRANSACTION_HASH_FIELD_NAME, WriteReceipt,
};
use sqlx::Row;
use sqlx::postgres::PgRow;

use crate::domain::{ContentStore, RemoteError};

/// Content store backed by the `notes` table.
///
/// Every write runs in its own transaction, the id of that transaction is
/// reported as the ledger hash of the write.
#[derive(Clone, Debug)]
pub struct PostgresContentStore {
    database: &'static Database,
}

impl PostgresContentStore {
    pub fn new(database: &'static Database) -> Self {
        Self { database }
    }

    fn table(&self) -> String {
        self.database.qualified(NOTES_TABLE_NAME)
    }

    fn select_columns() -> String {
        [
            NOTE_ID_FIELD_NAME,
            OWNER_ID_FIELD_NAME,
            CONTENT_TYPE_FIELD_NAME,
            "title",
            "content",
            "summary",
            SLUG_FIELD_NAME,
            TAGS_FIELD_NAME,
            "cover_address",
            "cover_mime_type",
            PUBLISHED_FIELD_NAME,
            "disable_ai_summary",
            TRANSACTION_HASH_FIELD_NAME,
            UPDATED_TRANSACTION_HASH_FIELD_NAME,
        ]
        .join(", ")
    }
}

/// The store tags every note with its content type.
fn stored_tags(submission: &Submission) -> Vec<String> {
    let mut tags = vec![submission.content_type.as_str().to_string()];
    for tag in &submission.tags {
        if !tags.contains(tag) {
            tags.push(tag.clone());
        }
    }
    tags
}

fn record_from_row(row: &PgRow) -> Result<RemoteRecord, sqlx::Error> {
    let content_type: String = row.try_get(CONTENT_TYPE_FIELD_NAME)?;
    let content_type =
        content_type
            .parse::<ContentType>()
            .map_err(|message| sqlx::Error::ColumnDecode {
                index: CONTENT_TYPE_FIELD_NAME.to_string(),
                source: message.into(),
            })?;
    let cover_address: Option<String> = row.try_get("cover_address")?;
    let cover_mime_type: Option<String> = row.try_get("cover_mime_type")?;

    Ok(RemoteRecord {
        content_id: ContentId(row.try_get(NOTE_ID_FIELD_NAME)?),
        owner: OwnerId(row.try_get(OWNER_ID_FIELD_NAME)?),
        content_type,
        title: row.try_get("title")?,
        content: row.try_get("content")?,
        summary: row.try_get("summary")?,
        slug: row.try_get(SLUG_FIELD_NAME)?,
        tags: row.try_get(TAGS_FIELD_NAME)?,
        cover: cover_address
            .map(|address| Cover::new(address, cover_mime_type.unwrap_or_default())),
        published_at: row.try_get::<Option<DateTime<Utc>>, _>(PUBLISHED_FIELD_NAME)?,
        disable_ai_summary: row.try_get("disable_ai_summary")?,
        transaction_hash: row.try_get(TRANSACTION_HASH_FIELD_NAME)?,
        updated_transaction_hash: row.try_get(UPDATED_TRANSACTION_HASH_FIELD_NAME)?,
    })
}

impl From<sqlx::Error> for RemoteError {
    fn from(value: sqlx::Error) -> Self {
        match value {
            sqlx::Error::RowNotFound => Self::NotFound("record".to_string()),
            sqlx::Error::Database(err) if err.is_unique_violation() => {
                Self::Rejected(format!("duplicate value: {}", err.message()))
            }
            other => {
                tracing::error!("{:?}", other);
                Self::Unavailable(other.to_string())
            }
        }
    }
}

impl ContentStore for PostgresContentStore {
    async fn lookup(
        &self,
        owner: OwnerId,
        key: &LookupKey,
    ) -> Result<Option<RemoteRecord>, RemoteError> {
        let column = match key {
            LookupKey::Id(_) => NOTE_ID_FIELD_NAME,
            LookupKey::Slug(_) => SLUG_FIELD_NAME,
        };
        let sql = format!(
            "SELECT {} FROM {} WHERE {} = $1 AND {} = $2",
            Self::select_columns(),
            self.table(),
            OWNER_ID_FIELD_NAME,
            column,
        );
        tracing::debug!("{}", sql);

        let query = sqlx::query(&sql).bind(owner.0);
        let query = match key {
            LookupKey::Id(id) => query.bind(id.0),
            LookupKey::Slug(slug) => query.bind(slug.to_string()),
        };
        let row = query
            .fetch_optional(self.database.database_pool())
            .await?;

        Ok(row.as_ref().map(record_from_row).transpose()?)
    }

    async fn create(&self, submission: Submission) -> Result<WriteReceipt, RemoteError> {
        let sql = format!(
            "INSERT INTO {} ({}, {}, title, content, summary, {}, {}, cover_address, cover_mime_type, \
             {}, disable_ai_summary, {}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, COALESCE($10, now()), $11, txid_current()::text) \
             RETURNING {}, {}",
            self.table(),
            OWNER_ID_FIELD_NAME,
            CONTENT_TYPE_FIELD_NAME,
            SLUG_FIELD_NAME,
            TAGS_FIELD_NAME,
            PUBLISHED_FIELD_NAME,
            TRANSACTION_HASH_FIELD_NAME,
            NOTE_ID_FIELD_NAME,
            TRANSACTION_HASH_FIELD_NAME,
        );
        tracing::debug!("{}", sql);

        let cover = submission.cover.clone();
        let row = sqlx::query(&sql)
            .bind(submission.owner.0)
            .bind(submission.content_type.as_str())
            .bind(&submission.title)
            .bind(&submission.content)
            .bind(&submission.excerpt)
            .bind(submission.slug.to_string())
            .bind(stored_tags(&submission))
            .bind(cover.as_ref().map(|cover| cover.address.clone()))
            .bind(cover.map(|cover| cover.mime_type))
            .bind(submission.published_at)
            .bind(submission.disable_ai_summary)
            .fetch_one(self.database.database_pool())
            .await?;

        let receipt = WriteReceipt {
            content_id: ContentId(row.try_get(NOTE_ID_FIELD_NAME)?),
            transaction_hash: row.try_get(TRANSACTION_HASH_FIELD_NAME)?,
        };
        tracing::info!(owner = %submission.owner, content_id = %receipt.content_id, "note created");
        Ok(receipt)
    }

    async fn update(
        &self,
        id: ContentId,
        submission: Submission,
    ) -> Result<WriteReceipt, RemoteError> {
        let sql = format!(
            "UPDATE {} SET {} = $3, title = $4, content = $5, summary = $6, {} = $7, {} = $8, \
             cover_address = $9, cover_mime_type = $10, {} = COALESCE($11, {}), \
             disable_ai_summary = $12, {} = txid_current()::text, {} = now() \
             WHERE {} = $1 AND {} = $2 \
             RETURNING {}",
            self.table(),
            CONTENT_TYPE_FIELD_NAME,
            SLUG_FIELD_NAME,
            TAGS_FIELD_NAME,
            PUBLISHED_FIELD_NAME,
            PUBLISHED_FIELD_NAME,
            UPDATED_TRANSACTION_HASH_FIELD_NAME,
            UPDATED_FIELD_NAME,
            NOTE_ID_FIELD_NAME,
            OWNER_ID_FIELD_NAME,
            UPDATED_TRANSACTION_HASH_FIELD_NAME,
        );
        tracing::debug!("{}", sql);

        let cover = submission.cover.clone();
        let row = sqlx::query(&sql)
            .bind(id.0)
            .bind(submission.owner.0)
            .bind(submission.content_type.as_str())
            .bind(&submission.title)
            .bind(&submission.content)
            .bind(&submission.excerpt)
            .bind(submission.slug.to_string())
            .bind(stored_tags(&submission))
            .bind(cover.as_ref().map(|cover| cover.address.clone()))
            .bind(cover.map(|cover| cover.mime_type))
            .bind(submission.published_at)
            .bind(submission.disable_ai_summary)
            .fetch_optional(self.database.database_pool())
            .await?
            .ok_or_else(|| RemoteError::NotFound(format!("note {id}")))?;

        tracing::info!(owner = %submission.owner, content_id = %id, "note updated");
        Ok(WriteReceipt {
            content_id: id,
            transaction_hash: row.try_get(UPDATED_TRANSACTION_HASH_FIELD_NAME)?,
        })
    }

    async fn delete(&self, id: ContentId, owner: OwnerId) -> Result<(), RemoteError> {
        let sql = format!(
            "DELETE FROM {} WHERE {} = $1 AND {} = $2",
            self.table(),
            NOTE_ID_FIELD_NAME,
            OWNER_ID_FIELD_NAME,
        );
        tracing::debug!("{}", sql);

        let result = sqlx::query(&sql)
            .bind(id.0)
            .bind(owner.0)
            .execute(self.database.database_pool())
            .await?;

        if result.rows_affected() == 0 {
            return Err(RemoteError::NotFound(format!("note {id}")));
        }
        tracing::info!(%owner, content_id = %id, "note deleted");
        Ok(())
    }

    async fn tags_for_owner(&self, owner: OwnerId) -> Result<BTreeSet<String>, RemoteError> {
        let sql = format!(
            "SELECT DISTINCT unnest({}) AS tag FROM {} WHERE {} = $1",
            TAGS_FIELD_NAME,
            self.table(),
            OWNER_ID_FIELD_NAME,
        );
        tracing::debug!("{}", sql);

        let mut rows = sqlx::query(&sql)
            .bind(owner.0)
            .fetch(self.database.database_pool());

        let mut tags = BTreeSet::new();
        while let Some(row) = rows.try_next().await? {
            tags.insert(row.try_get::<String, _>("tag")?);
        }
        Ok(tags)
    }
}
