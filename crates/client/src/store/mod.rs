//! SQLite-backed storage for relational data and document embeddings.
//!
//! One database file carries both the user's relational tables (queried by
//! generated SQL) and the `documents` table backing vector search. Access
//! goes through tokio-rusqlite so database work runs off the async
//! executor. It supports:
//!
//! - Raw read-only SQL execution returning JSON row maps
//! - Best-effort schema introspection for prompts and optimizer hints
//! - Content-addressed document storage with brute-force cosine search

pub mod connection;
pub mod distance;
pub mod documents;
pub mod error;
pub mod migrations;
pub mod query;
pub mod schema;

pub use connection::StoreDb;
pub use documents::DocumentMatch;
pub use error::StoreError;
pub use schema::SchemaInfo;
