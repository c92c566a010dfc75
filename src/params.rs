//! Population code for query and form parameters.
//!
//! Each leaf field becomes a short sequence of [`Statement`]s which add the field's value to a
//! parameter bucket, guarded according to the field's kind. The statements are rendered by
//! [`crate::render`].

use std::collections::BTreeMap;
use std::fmt;

use crate::descriptor::field_descriptor_proto::Type;
use crate::ident::{getter_chain, to_go_camel, unexport};
use crate::schema::Field;

/// The name of the request value in generated methods.
pub const REQUEST: &str = "in";

/// A getter chain reading a field from the request value, e.g. `in.GetFilter().GetAuthor()`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Accessor(Vec<String>);

impl Accessor {
    /// The request value itself.
    pub fn root() -> Accessor {
        Accessor::default()
    }

    /// Parses a dotted field path relative to the request value.
    pub fn parse(path: &str) -> Accessor {
        Accessor(
            path.split('.')
                .filter(|segment| !segment.is_empty())
                .map(str::to_owned)
                .collect(),
        )
    }

    /// Appends the dotted field path `path` to this accessor.
    pub fn join(&self, path: &str) -> Accessor {
        let mut segments = self.0.clone();
        segments.extend(Accessor::parse(path).0);
        Accessor(segments)
    }

    /// The accessor of the message holding the last field, or `None` for the root.
    pub fn parent(&self) -> Option<Accessor> {
        self.0
            .split_last()
            .map(|(_, parent)| Accessor(parent.to_vec()))
    }

    /// The name of the last field, or `None` for the root.
    pub fn last(&self) -> Option<&str> {
        self.0.last().map(String::as_str)
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// The dotted field path, empty for the root.
    pub fn path(&self) -> String {
        self.0.join(".")
    }
}

impl fmt::Display for Accessor {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(REQUEST)?;
        f.write_str(&getter_chain(self.0.iter().map(String::as_str)))
    }
}

/// The `url.Values` a statement adds to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Bucket {
    /// URL query parameters.
    Query,
    /// Form or multipart body entries.
    Form,
}

impl Bucket {
    /// The name of the local variable holding the bucket.
    pub fn var(self) -> &'static str {
        match self {
            Bucket::Query => "params",
            Bucket::Form => "forms",
        }
    }
}

/// The value being added.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Operand {
    Field(Accessor),
    /// The current element of the innermost [`Statement::ForEach`].
    Item,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Value {
    /// The operand formatted with `%v`.
    Formatted(Operand),
    /// The operand marshalled to its canonical JSON form. JSON strings are decoded, so the
    /// value sent is the text of the string.
    ///
    /// `var` prefixes the names of the local variables holding the encoded and decoded value.
    WellKnown { var: String, operand: Operand },
}

/// A guard around the statements adding a field.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Condition {
    /// `len(field) > 0`.
    NonEmpty(Accessor),
    /// The explicit presence pointer of a proto3 `optional` field is set.
    Present(Accessor),
    NonNil(Accessor),
    NonEmptyString(Accessor),
    True(Accessor),
    NonZero(Accessor),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Statement {
    Add {
        bucket: Bucket,
        key: String,
        value: Value,
    },
    If {
        condition: Condition,
        body: Vec<Statement>,
    },
    ForEach {
        items: Accessor,
        body: Vec<Statement>,
    },
}

impl Statement {
    /// Returns `true` if this statement, or any nested statement, marshals a well-known value.
    pub fn marshals_well_known(&self) -> bool {
        match self {
            Statement::Add { value, .. } => matches!(value, Value::WellKnown { .. }),
            Statement::If { body, .. } | Statement::ForEach { body, .. } => {
                body.iter().any(Statement::marshals_well_known)
            }
        }
    }
}

/// Builds the statements adding every field of `leaves` to `bucket`.
///
/// `leaves` is keyed by dotted path relative to `prefix`, which is the accessor of the message
/// holding the leaves. Keys of the bucket are the dotted paths; statements are emitted in
/// lexicographic path order.
pub fn build_params(
    bucket: Bucket,
    prefix: &Accessor,
    leaves: &BTreeMap<String, &Field>,
) -> Vec<Statement> {
    leaves
        .iter()
        .flat_map(|(path, field)| build_param(bucket, prefix, path, field))
        .collect()
}

fn build_param(bucket: Bucket, prefix: &Accessor, path: &str, field: &Field) -> Vec<Statement> {
    let accessor = prefix.join(path);
    let value = |operand| {
        if field.is_well_known() {
            Value::WellKnown {
                var: unexport(&to_go_camel(path)),
                operand,
            }
        } else {
            Value::Formatted(operand)
        }
    };

    if field.is_repeated() {
        let add = Statement::Add {
            bucket,
            key: path.to_owned(),
            value: value(Operand::Item),
        };
        return vec![Statement::If {
            condition: Condition::NonEmpty(accessor.clone()),
            body: vec![Statement::ForEach {
                items: accessor,
                body: vec![add],
            }],
        }];
    }

    let add = Statement::Add {
        bucket,
        key: path.to_owned(),
        value: value(Operand::Field(accessor.clone())),
    };

    // Only required, singular, primitive fields are added regardless of their value.
    if field.required && field.is_singular_primitive() {
        return vec![add];
    }

    let condition = if field.proto3_optional {
        Condition::Present(accessor)
    } else {
        match field.ty {
            Type::Message | Type::Bytes => Condition::NonNil(accessor),
            Type::String => Condition::NonEmptyString(accessor),
            Type::Bool => Condition::True(accessor),
            _ => Condition::NonZero(accessor),
        }
    };
    vec![Statement::If {
        condition,
        body: vec![add],
    }]
}
