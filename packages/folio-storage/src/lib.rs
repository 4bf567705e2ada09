//! Persistence for knowledge fragments: Postgres is the source of truth, Qdrant an optional
//! nearest-neighbour index over the stored embeddings.

pub mod db;
pub mod models;
pub mod qdrant;
pub mod queries;
pub mod schema;

mod error;

pub use error::{Error, Result};
