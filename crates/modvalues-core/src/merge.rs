//! Flattening of `oneOf`/`anyOf` branches into a single schema
//!
//! This is a shallow, order-sensitive merge and not JSON-Schema unification:
//! branch properties are copied over the base one key at a time, a later
//! branch replacing an earlier same-named property wholesale. Only the last
//! branch's own composition keywords survive on the result.

use crate::schema::SchemaNode;

/// Merge `branches` over an independent copy of `base`
pub fn merge_schemas(base: &SchemaNode, branches: &[SchemaNode]) -> SchemaNode {
    let mut merged = base.clone();
    merged.clear_compositions();

    for branch in branches {
        for (key, property) in &branch.properties {
            merged.properties.insert(key.clone(), property.clone());
        }
        merged.one_of = branch.one_of.clone();
        merged.all_of = branch.all_of.clone();
        merged.any_of = branch.any_of.clone();
    }

    merged
}
