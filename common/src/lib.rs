mod domain;

pub mod database;
pub mod test_utils;

// Remote store table names

pub const NOTES_TABLE_NAME: &'static str = "notes";
pub const SITES_TABLE_NAME: &'static str = "sites";

// Remote store field names

pub const NOTE_ID_FIELD_NAME: &'static str = "note_id";
pub const OWNER_ID_FIELD_NAME: &'static str = "owner_id";
pub const CONTENT_TYPE_FIELD_NAME: &'static str = "content_type";
pub const SLUG_FIELD_NAME: &'static str = "slug";
pub const TAGS_FIELD_NAME: &'static str = "tags";
pub const HANDLE_FIELD_NAME: &'static str = "handle";
pub const CUSTOM_DOMAIN_FIELD_NAME: &'static str = "custom_domain";

pub const CREATED_FIELD_NAME: &'static str = "created_at";
pub const UPDATED_FIELD_NAME: &'static str = "updated_at";
pub const PUBLISHED_FIELD_NAME: &'static str = "published_at";

pub const TRANSACTION_HASH_FIELD_NAME: &'static str = "transaction_hash";
pub const UPDATED_TRANSACTION_HASH_FIELD_NAME: &'static str = "updated_transaction_hash";

// Tags the remote store attaches by itself; never shown in the editor.
pub const RESERVED_TAGS: [&'static str; 3] = ["post", "page", "comment"];

// expose domain module

pub use domain::*;
