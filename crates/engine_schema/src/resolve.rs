//! Fixed-point field resolution.
//!
//! Every schema field missing from the input starts out *pending*. On each
//! pass, a pending field whose condition siblings are all no longer pending
//! is settled: it either receives the default of its first applicable
//! candidate or is dropped. Passes repeat until nothing settles. Whatever is
//! still pending then sits on a dependency cycle and is left unset.
//!
//! Fields supplied by the caller are never pending and never overwritten.

use std::collections::BTreeSet;

use tracing::warn;

use crate::schema::Schema;
use crate::value::Record;

/// Outcome of [`resolve`].
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    /// The completed record.
    pub record: Record,
    /// Fields that could not be settled because of a circular or
    /// unsatisfiable condition.
    pub unresolved: Vec<String>,
}

impl Resolution {
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.unresolved.is_empty()
    }
}

/// Complete `data` against `schema`, reporting unresolvable fields.
#[must_use]
pub fn resolve(mut data: Record, schema: &Schema) -> Resolution {
    let mut pending: BTreeSet<&str> = schema
        .fields()
        .map(|(name, _)| name)
        .filter(|name| !data.contains_key(*name))
        .collect();

    loop {
        let ready: Vec<&str> = pending
            .iter()
            .copied()
            .filter(|name| {
                schema
                    .get(name)
                    .is_some_and(|field| field.siblings().all(|s| !pending.contains(s)))
            })
            .collect();

        if ready.is_empty() {
            break;
        }

        for name in ready {
            pending.remove(name);
            if let Some(value) = schema.get(name).and_then(|field| field.default_for(&data)) {
                data.insert(name.to_owned(), value);
            }
        }
    }

    Resolution {
        record: data,
        unresolved: pending.into_iter().map(str::to_owned).collect(),
    }
}

/// Complete `data` against `schema`.
///
/// Unresolvable fields are logged and left absent. Registration validates
/// schemas up front, so this only happens for schemas that bypassed
/// [`Schema::validate`].
#[must_use]
pub fn sanitize(data: Record, schema: &Schema) -> Record {
    let resolution = resolve(data, schema);
    if !resolution.is_complete() {
        warn!(
            fields = ?resolution.unresolved,
            "schema fields left unset: circular or unsatisfiable condition"
        );
    }
    resolution.record
}
