//! Shape predicates over fetched objects.
//!
//! The plain predicates are pure. The `is_annotated_*` family dereferences
//! the wrapped link, so it needs a store and can fail with it.

use serde_json::Value;

use crate::record::{Annotatable, Record};
use crate::store::{ObjectStore, StoreError};

fn decodes_to(value: &Value, pred: impl Fn(&Record) -> bool) -> bool {
    Record::from_value(value).map(|r| pred(&r)).unwrap_or(false)
}

pub fn is_context(value: &Value) -> bool {
    decodes_to(value, |r| matches!(r, Record::Context(_)))
}

pub fn is_formula(value: &Value) -> bool {
    decodes_to(value, |r| matches!(r, Record::Formula(_)))
}

pub fn is_sequent(value: &Value) -> bool {
    decodes_to(value, |r| matches!(r, Record::Sequent(_)))
}

pub fn is_production(value: &Value) -> bool {
    decodes_to(value, |r| matches!(r, Record::Production(_)))
}

pub fn is_assertion(value: &Value) -> bool {
    decodes_to(value, |r| matches!(r, Record::Assertion(_)))
}

pub fn is_collection(value: &Value) -> bool {
    decodes_to(value, |r| matches!(r, Record::Collection(_)))
}

pub fn is_tool(value: &Value) -> bool {
    decodes_to(value, |r| matches!(r, Record::Tool(_)))
}

pub fn is_language(value: &Value) -> bool {
    decodes_to(value, |r| matches!(r, Record::Language(_)))
}

/// Whether `value` is an `annotated-<kind>` wrapper around a valid `kind` record.
pub async fn is_annotated<S: ObjectStore + ?Sized>(
    kind: Annotatable,
    value: &Value,
    store: &S,
) -> Result<bool, StoreError> {
    let target = match Record::from_value(value) {
        Ok(Record::Annotated(a)) if a.kind == kind => a.target,
        _ => return Ok(false),
    };
    let inner = store.get(target.cid()).await?;
    Ok(decodes_to(&inner, |r| kind.matches(r)))
}

pub async fn is_annotated_context<S: ObjectStore + ?Sized>(
    value: &Value,
    store: &S,
) -> Result<bool, StoreError> {
    is_annotated(Annotatable::Context, value, store).await
}

pub async fn is_annotated_formula<S: ObjectStore + ?Sized>(
    value: &Value,
    store: &S,
) -> Result<bool, StoreError> {
    is_annotated(Annotatable::Formula, value, store).await
}

pub async fn is_annotated_sequent<S: ObjectStore + ?Sized>(
    value: &Value,
    store: &S,
) -> Result<bool, StoreError> {
    is_annotated(Annotatable::Sequent, value, store).await
}

pub async fn is_annotated_production<S: ObjectStore + ?Sized>(
    value: &Value,
    store: &S,
) -> Result<bool, StoreError> {
    is_annotated(Annotatable::Production, value, store).await
}

/// Whether `value` is one of the publishable record shapes.
///
/// Tools and languages are referenced but not published on their own, so
/// they are not part of this set.
pub async fn is_of_specified_types<S: ObjectStore + ?Sized>(
    value: &Value,
    store: &S,
) -> Result<bool, StoreError> {
    if is_context(value)
        || is_formula(value)
        || is_sequent(value)
        || is_production(value)
        || is_assertion(value)
        || is_collection(value)
    {
        return Ok(true);
    }
    for kind in Annotatable::all() {
        if is_annotated(kind, value, store).await? {
            return Ok(true);
        }
    }
    Ok(false)
}
