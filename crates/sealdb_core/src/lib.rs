//! # SealDB Core
//!
//! Record store engine for SealDB.
//!
//! This crate provides:
//! - [`Predicate`] and [`evaluate`] - the shared condition evaluator
//!   behind every select, update and delete
//! - [`FieldSpec`] and [`project`] - the projection/transform engine
//! - [`RecordStore`] - CRUD orchestration over the encrypted vault
//! - [`aggregate`] - flat numeric reductions
//! - schema introspection, backups and id generation
//!
//! Every mutating operation is a full read-modify-write cycle over the
//! whole collection; there is no cache and no cross-call record
//! identity. See [`RecordStore`] for the concurrency caveats.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod aggregate;
mod condition;
mod error;
mod id;
mod projection;
mod schema;
mod store;

pub use aggregate::{aggregate, AggregateOp};
pub use condition::{evaluate, CompareOp, Predicate};
pub use error::{CoreError, CoreResult};
pub use id::generate_id;
pub use projection::{project, project_value, FieldSpec, Param};
pub use schema::schema_keys;
pub use store::{RecordStore, SelectOrder};

pub use sealdb_codec::{Map, Record, Value};
pub use sealdb_storage::{
    CipherKind, EncryptionContext, EncryptionKey, FileKind, Iv, Vault,
};
