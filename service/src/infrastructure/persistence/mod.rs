pub mod notes;
pub mod sites;

pub use notes::PostgresContentStore;
pub use sites::PostgresSiteDirectory;
