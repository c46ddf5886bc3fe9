use quire_common::database::Database;
use quire_common::{
    CUSTOM_DOMAIN_FIELD_NAME, HANDLE_FIELD_NAME, OWNER_ID_FIELD_NAME, OwnerId, SITES_TABLE_NAME,
    SiteInfo,
};
use sqlx::Row;
use sqlx::postgres::PgRow;

use crate::domain::{RemoteError, SiteDirectory};

#[derive(Clone, Debug)]
pub struct PostgresSiteDirectory {
    database: &'static Database,
}

impl PostgresSiteDirectory {
    pub fn new(database: &'static Database) -> Self {
        Self { database }
    }

    fn select_by(&self, column: &str) -> String {
        let sql = format!(
            "SELECT {}, {}, {} FROM {} WHERE {} = $1",
            OWNER_ID_FIELD_NAME,
            HANDLE_FIELD_NAME,
            CUSTOM_DOMAIN_FIELD_NAME,
            self.database.qualified(SITES_TABLE_NAME),
            column,
        );
        tracing::debug!("{}", sql);
        sql
    }
}

fn site_from_row(row: &PgRow) -> Result<SiteInfo, sqlx::Error> {
    Ok(SiteInfo {
        owner: OwnerId(row.try_get(OWNER_ID_FIELD_NAME)?),
        handle: row.try_get(HANDLE_FIELD_NAME)?,
        custom_domain: row.try_get(CUSTOM_DOMAIN_FIELD_NAME)?,
    })
}

impl SiteDirectory for PostgresSiteDirectory {
    async fn site(&self, owner: OwnerId) -> Result<Option<SiteInfo>, RemoteError> {
        let sql = self.select_by(OWNER_ID_FIELD_NAME);
        let row = sqlx::query(&sql)
            .bind(owner.0)
            .fetch_optional(self.database.database_pool())
            .await?;
        Ok(row.as_ref().map(site_from_row).transpose()?)
    }

    async fn site_by_handle(&self, handle: &str) -> Result<Option<SiteInfo>, RemoteError> {
        let sql = self.select_by(HANDLE_FIELD_NAME);
        let row = sqlx::query(&sql)
            .bind(handle)
            .fetch_optional(self.database.database_pool())
            .await?;
        Ok(row.as_ref().map(site_from_row).transpose()?)
    }
}
