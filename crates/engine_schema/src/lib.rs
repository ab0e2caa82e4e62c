//! # engine_schema
//!
//! Declarative component schemas and the resolver that completes a partially
//! specified configuration record against them.
//!
//! - [`FieldSpec`] / [`SchemaField`]: what a field is and when it applies.
//! - [`Schema`]: a component type's full field table, buildable in code or
//!   from JSON.
//! - [`sanitize`]: the fixed-point defaulting pass.
//! - [`Value`] / [`Record`]: resolved values in native math types.

pub mod error;
pub mod field;
pub mod resolve;
pub mod schema;
pub mod value;

pub use error::SchemaError;
pub use field::{Condition, FieldKind, FieldSpec, SchemaField};
pub use resolve::{Resolution, resolve, sanitize};
pub use schema::Schema;
pub use value::{Record, Value};
