use quire_common::{
    CONTENT_TYPE_FIELD_NAME, CREATED_FIELD_NAME, CUSTOM_DOMAIN_FIELD_NAME, HANDLE_FIELD_NAME,
    NOTE_ID_FIELD_NAME, NOTES_TABLE_NAME, OWNER_ID_FIELD_NAME, PUBLISHED_FIELD_NAME,
    SITES_TABLE_NAME, SLUG_FIELD_NAME, TAGS_FIELD_NAME, TRANSACTION_HASH_FIELD_NAME,
    UPDATED_FIELD_NAME, UPDATED_TRANSACTION_HASH_FIELD_NAME,
};

use crate::domain::tables::{Column, ColumnType, ForeignKeyConstraint, Index, Table};

pub mod migration;
pub mod persistence;
pub mod tables;

/// Tables the dashboard needs, in dependency order.
pub fn quire_tables() -> Vec<Table> {
    vec![sites_table(), notes_table()]
}

fn sites_table() -> Table {
    let columns = vec![
        Column::primary_key(OWNER_ID_FIELD_NAME, ColumnType::BigInt),
        Column::new(HANDLE_FIELD_NAME, ColumnType::Text, true, true, None),
        Column::optional(CUSTOM_DOMAIN_FIELD_NAME, ColumnType::Text),
        created_column(),
    ];
    Table::new(SITES_TABLE_NAME, columns, Vec::new(), Vec::new())
}

fn notes_table() -> Table {
    let columns = vec![
        Column::primary_key(NOTE_ID_FIELD_NAME, ColumnType::BigSerial),
        Column::new(OWNER_ID_FIELD_NAME, ColumnType::BigInt, true, false, None),
        Column::new(CONTENT_TYPE_FIELD_NAME, ColumnType::Text, true, false, None),
        Column::new("title", ColumnType::Text, true, false, None),
        Column::new("content", ColumnType::Text, true, false, None),
        Column::new("summary", ColumnType::Text, true, false, Some("''")),
        Column::new(SLUG_FIELD_NAME, ColumnType::Text, true, false, None),
        Column::new(TAGS_FIELD_NAME, ColumnType::TextArray, true, false, Some("'{}'")),
        Column::optional("cover_address", ColumnType::Text),
        Column::optional("cover_mime_type", ColumnType::Text),
        Column::optional(PUBLISHED_FIELD_NAME, ColumnType::TimestampTZ),
        Column::new("disable_ai_summary", ColumnType::Boolean, true, false, Some("false")),
        Column::optional(TRANSACTION_HASH_FIELD_NAME, ColumnType::Text),
        Column::optional(UPDATED_TRANSACTION_HASH_FIELD_NAME, ColumnType::Text),
        created_column(),
        Column::optional(UPDATED_FIELD_NAME, ColumnType::TimestampTZ),
    ];

    let foreign_keys = vec![ForeignKeyConstraint::new(
        NOTES_TABLE_NAME,
        OWNER_ID_FIELD_NAME,
        SITES_TABLE_NAME,
        OWNER_ID_FIELD_NAME,
    )];

    // slugs are unique per owner
    let indexes = vec![Index::new(
        NOTES_TABLE_NAME,
        &[OWNER_ID_FIELD_NAME, SLUG_FIELD_NAME],
        true,
    )];

    Table::new(NOTES_TABLE_NAME, columns, foreign_keys, indexes)
}

fn created_column() -> Column {
    Column::new(
        CREATED_FIELD_NAME,
        ColumnType::TimestampTZ,
        true,
        false,
        Some("now()"),
    )
}
