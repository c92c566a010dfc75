//! Classification of request fields into path, query and body parameters.

use std::collections::BTreeMap;

use log::warn;

use crate::http::{BodySelector, HttpBinding};
use crate::leaf::collect_leaves;
use crate::path_template::PathTemplate;
use crate::schema::{Field, MethodDefinition, Schema};
use crate::{Error, Result};

/// The request fields of a method, split by where they are sent.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Classification<'a> {
    /// Fields substituted into the URL, keyed by dotted path.
    pub path: BTreeMap<String, &'a Field>,
    /// Fields sent as URL query parameters, keyed by dotted path.
    pub query: BTreeMap<String, &'a Field>,
}

/// Classifies the request fields of `method` bound by `binding`.
///
/// A leaf of the request is a query parameter if, and only if, it is neither a path parameter
/// nor part of the body. When the whole request is the body there are no query parameters.
pub fn classify<'a>(
    schema: &'a Schema,
    method: &MethodDefinition,
    binding: &HttpBinding,
    template: &PathTemplate,
) -> Result<Classification<'a>> {
    let mut classification = Classification::default();

    for param in &template.params {
        match schema.lookup_field(&method.input_type, param)? {
            Some(field) => {
                classification.path.insert(param.clone(), field);
            }
            None => warn!(
                "method {:?}: path parameter {:?} does not name a field of {}",
                method.name, param, method.input_type
            ),
        }
    }

    if binding.body == BodySelector::Whole {
        return Ok(classification);
    }

    let request = schema.message(&method.input_type)?;
    let body_path = binding.body.field_path();
    // Body fields are not valid query parameters, because the same value would be sent twice.
    let body_field = match body_path {
        Some(path) => schema.lookup_field(&method.input_type, path)?,
        None => None,
    };

    classification.query = collect_leaves(schema, request, body_field)?
        .into_iter()
        .filter(|(path, _)| {
            !classification.path.contains_key(path) && Some(path.as_str()) != body_path
        })
        .collect();

    Ok(classification)
}

/// Returns the leaves of the message sent as a form or multipart body, keyed by their path
/// relative to the body message.
pub fn form_fields<'a>(
    schema: &'a Schema,
    method: &MethodDefinition,
    binding: &HttpBinding,
) -> Result<BTreeMap<String, &'a Field>> {
    let body = match &binding.body {
        BodySelector::None => return Ok(BTreeMap::new()),
        BodySelector::Whole => schema.message(&method.input_type)?,
        BodySelector::Field(path) => match schema.lookup_field(&method.input_type, path)? {
            Some(field) if field.is_message() && !field.is_repeated() => {
                schema.message(&field.type_name)?
            }
            _ => {
                return Err(Error::FormBodyNotMessage {
                    method: method.name.clone(),
                    field: path.clone(),
                })
            }
        },
    };
    collect_leaves(schema, body, None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::*;

    use proptest::prelude::*;
    use proptest::sample::select;

    fn method<'a>(schema: &'a Schema, name: &str) -> &'a MethodDefinition {
        schema
            .files()
            .iter()
            .flat_map(|file| &file.services)
            .flat_map(|service| &service.methods)
            .find(|method| method.name == name)
            .unwrap()
    }

    fn classify_method<'a>(schema: &'a Schema, name: &str) -> Result<Classification<'a>> {
        let method = method(schema, name);
        let binding = method.binding().unwrap().unwrap();
        classify(schema, method, &binding, &PathTemplate::parse(&binding.template))
    }

    fn keys(map: &BTreeMap<String, &Field>) -> Vec<String> {
        map.keys().cloned().collect()
    }

    #[test]
    fn test_get_without_body() {
        let files = library();
        let schema = Schema::new(&files);

        let classification = classify_method(&schema, "GetBook").unwrap();
        assert_eq!(vec!["book_id", "user_id"], keys(&classification.path));
        assert_eq!(
            vec![
                "filter.author",
                "filter.available",
                "filter.published_after",
                "page_size",
                "tags",
            ],
            keys(&classification.query)
        );
    }

    #[test]
    fn test_body_field_is_not_a_query_parameter() {
        let files = library();
        let schema = Schema::new(&files);

        let classification = classify_method(&schema, "CreateBook").unwrap();
        assert_eq!(vec!["parent"], keys(&classification.path));
        assert_eq!(vec!["validate_only"], keys(&classification.query));
    }

    #[test]
    fn test_whole_body_has_no_query() {
        let files = library();
        let schema = Schema::new(&files);

        let classification = classify_method(&schema, "UpdateBook").unwrap();
        assert_eq!(vec!["book.name"], keys(&classification.path));
        assert!(classification.query.is_empty());
    }

    #[test]
    fn test_unresolved_path_parameter_is_dropped() {
        let files = library();
        let schema = Schema::new(&files);
        let method = method(&schema, "GetBook");
        let binding = HttpBinding {
            template: "/v1/{shelf}/books/{book_id}".to_owned(),
            ..method.binding().unwrap().unwrap()
        };

        let template = PathTemplate::parse(&binding.template);
        let classification = classify(&schema, method, &binding, &template).unwrap();
        assert_eq!(vec!["book_id"], keys(&classification.path));
        assert!(classification.query.contains_key("user_id"));
    }

    #[test]
    fn test_scalar_body_field() {
        let files = library();
        let schema = Schema::new(&files);
        let method = method(&schema, "GetBook");
        let binding = HttpBinding {
            body: BodySelector::Field("page_size".to_owned()),
            ..method.binding().unwrap().unwrap()
        };

        let template = PathTemplate::parse(&binding.template);
        let classification = classify(&schema, method, &binding, &template).unwrap();
        assert!(!classification.query.contains_key("page_size"));
        assert_eq!(4, classification.query.len());
    }

    #[test]
    fn test_form_fields() {
        let files = library();
        let schema = Schema::new(&files);
        let upload = method(&schema, "UploadCover");
        let binding = upload.binding().unwrap().unwrap();

        let fields = form_fields(&schema, upload, &binding).unwrap();
        assert_eq!(vec!["image", "title"], keys(&fields));

        let classification = classify_method(&schema, "UploadCover").unwrap();
        assert_eq!(vec!["book_id"], keys(&classification.path));
        assert!(classification.query.is_empty());

        let scalar_body = HttpBinding {
            body: BodySelector::Field("book_id".to_owned()),
            ..binding.clone()
        };
        assert_eq!(
            Err(Error::FormBodyNotMessage {
                method: "UploadCover".to_owned(),
                field: "book_id".to_owned(),
            }),
            form_fields(&schema, upload, &scalar_body)
        );
    }

    proptest! {
        #[test]
        fn path_query_and_body_partition_the_leaves(
            params in proptest::collection::btree_set(
                select(vec!["user_id", "book_id", "page_size", "filter.author", "tags", "missing"]),
                0..4,
            ),
            body in select(vec!["", "*", "filter", "page_size", "filter.author"]),
        ) {
            let files = library();
            let schema = Schema::new(&files);
            let method = method(&schema, "GetBook");
            let template = format!(
                "/v1/{}",
                params.iter().map(|param| format!("{{{}}}", param)).collect::<Vec<_>>().join("/")
            );
            let binding = HttpBinding {
                template,
                body: match body {
                    "" => BodySelector::None,
                    "*" => BodySelector::Whole,
                    path => BodySelector::Field(path.to_owned()),
                },
                ..method.binding().unwrap().unwrap()
            };

            let template = PathTemplate::parse(&binding.template);
            let classification = classify(&schema, method, &binding, &template).unwrap();
            for path in classification.path.keys() {
                prop_assert!(!classification.query.contains_key(path));
            }

            if body == "*" {
                prop_assert!(classification.query.is_empty());
            } else {
                let request = schema.message(&method.input_type).unwrap();
                let leaves = collect_leaves(&schema, request, None).unwrap();
                for path in leaves.keys() {
                    let in_path = classification.path.contains_key(path);
                    let in_query = classification.query.contains_key(path);
                    let in_body = !body.is_empty()
                        && (path == body || path.starts_with(&format!("{}.", body)));
                    prop_assert_eq!(in_query, !in_path && !in_body, "{}", path);
                }
            }
        }
    }
}
