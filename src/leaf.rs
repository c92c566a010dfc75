//! Discovery of the leaf fields of a message.

use std::collections::BTreeMap;

use itertools::Itertools;
use log::trace;

use crate::schema::{Field, MessageType, Schema};
use crate::Result;

/// Returns a map from dotted path to field for all the leaf fields of `message`, where a leaf
/// is a non-message field, or a field holding a well-known type.
///
/// e.g. for a message like the following
///
/// ```proto
/// message Mollusc {
///     message Squid {
///         message Mantle {
///             int32 mass_kg = 1;
///         }
///         Mantle mantle = 1;
///     }
///     Squid squid = 1;
/// }
/// ```
///
/// the one entry would be `"squid.mantle.mass_kg"`.
///
/// Message fields are expanded unless they are repeated, `excluded`, or already on the path
/// from `message` to the field; such fields are dropped. Iteration order of the returned map
/// is lexicographic by path.
pub fn collect_leaves<'a>(
    schema: &'a Schema,
    message: &'a MessageType,
    excluded: Option<&Field>,
) -> Result<BTreeMap<String, &'a Field>> {
    visit(schema, message, &[], excluded)
}

fn visit<'a>(
    schema: &'a Schema,
    message: &'a MessageType,
    stack: &[&'a Field],
    excluded: Option<&Field>,
) -> Result<BTreeMap<String, &'a Field>> {
    let mut leaves = BTreeMap::new();
    for field in &message.fields {
        if !field.is_message() || field.is_well_known() {
            let path = stack
                .iter()
                .chain(Some(&field))
                .map(|field| field.name.as_str())
                .join(".");
            leaves.insert(path, field);
            continue;
        }

        // Repeated message fields can not be mapped onto query parameters.
        if field.is_repeated() {
            trace!("dropping repeated message field {}", field.full_name);
            continue;
        }
        if excluded.map_or(false, |excluded| excluded.full_name == field.full_name) {
            continue;
        }
        if stack.iter().any(|seen| seen.full_name == field.full_name) {
            trace!("dropping recursive field {}", field.full_name);
            continue;
        }

        let nested = schema.message(&field.type_name)?;
        let mut path = stack.to_vec();
        path.push(field);
        leaves.extend(visit(schema, nested, &path, excluded)?);
    }
    Ok(leaves)
}
