//! Call plans: the compiled REST call of each RPC method.

use std::collections::BTreeMap;

use itertools::Itertools;
use log::{debug, warn};

use crate::classify::{classify, form_fields};
use crate::fully_qualified_name::FullyQualifiedName;
use crate::http::{BodyEncoding, BodySelector, Verb};
use crate::ident::{go_import_path, go_package_name, to_go_camel};
use crate::params::{build_params, Accessor, Bucket, Statement};
use crate::path_template::PathTemplate;
use crate::schema::{FileDefinition, MethodDefinition, Schema, ServiceDefinition};
use crate::{Error, Result};

/// A positional URL format and the accessors substituted into it, in template order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UrlFormat {
    /// The URL path with a `%v` marker per placeholder, to be appended to the base address.
    pub format: String,
    pub accessors: Vec<Accessor>,
}

/// The request body of a call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Body {
    None,
    /// The value sent JSON-encoded.
    Json(Accessor),
    /// Form or multipart entries.
    Form {
        encoding: BodyEncoding,
        statements: Vec<Statement>,
    },
}

/// The REST call of a method.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CallPlan {
    pub verb: Verb,
    pub url: UrlFormat,
    pub query: Vec<Statement>,
    pub body: Body,
}

impl CallPlan {
    /// The client session method performing the call, e.g. `Get`.
    pub fn dispatch(&self) -> &'static str {
        self.verb.as_camel()
    }

    /// Returns `true` if the plan populates a query or form bucket.
    pub fn has_params(&self) -> bool {
        !self.query.is_empty() || matches!(self.body, Body::Form { .. })
    }

    /// Returns `true` if the plan marshals a well-known value.
    pub fn marshals_well_known(&self) -> bool {
        let form: &[Statement] = match &self.body {
            Body::Form { statements, .. } => statements.as_slice(),
            _ => &[],
        };
        self.query
            .iter()
            .chain(form)
            .any(Statement::marshals_well_known)
    }
}

/// The body of a generated method.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MethodBody {
    /// Streaming methods can not be called over REST; the body returns an error.
    Streaming { method: String, client: bool },
    /// The method has no HTTP binding; the body returns an error.
    Unbound { method: String },
    Rest(CallPlan),
}

/// A generated method.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MethodPlan {
    pub name: String,
    /// The first line of the method's leading comment.
    pub summary: String,
    /// Go type name of the request message, qualified with its package name if the message is
    /// declared in another Go package.
    pub input_type: String,
    pub body: MethodBody,
}

/// A generated service.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServicePlan {
    /// The service name with any trailing `Service` removed.
    pub name: String,
    pub methods: Vec<MethodPlan>,
}

/// A generated file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FilePlan {
    /// The `.proto` file the plan was built from.
    pub source: String,
    pub go_package: String,
    /// Packages declaring the request messages of other Go packages, mapping import path to
    /// package name.
    pub imports: BTreeMap<String, String>,
    pub services: Vec<ServicePlan>,
}

impl FilePlan {
    /// Plans every service of `file`. Methods without an HTTP binding are skipped if
    /// `omit_unbound` is set.
    pub fn build(schema: &Schema, file: &FileDefinition, omit_unbound: bool) -> Result<FilePlan> {
        let mut imports = BTreeMap::new();
        let services = file
            .services
            .iter()
            .map(|service| ServicePlan::build(schema, file, service, omit_unbound, &mut imports))
            .collect::<Result<_>>()?;

        Ok(FilePlan {
            source: file.name.clone(),
            go_package: go_package_name(file.go_package.as_deref(), &file.package),
            imports,
            services,
        })
    }

    pub fn has_params(&self) -> bool {
        self.rest_plans().any(CallPlan::has_params)
    }

    pub fn marshals_well_known(&self) -> bool {
        self.rest_plans().any(CallPlan::marshals_well_known)
    }

    fn rest_plans(&self) -> impl Iterator<Item = &CallPlan> {
        self.services
            .iter()
            .flat_map(|service| &service.methods)
            .filter_map(|method| match &method.body {
                MethodBody::Rest(plan) => Some(plan),
                _ => None,
            })
    }
}

impl ServicePlan {
    fn build(
        schema: &Schema,
        file: &FileDefinition,
        service: &ServiceDefinition,
        omit_unbound: bool,
        imports: &mut BTreeMap<String, String>,
    ) -> Result<ServicePlan> {
        let mut methods = Vec::with_capacity(service.methods.len());
        for method in &service.methods {
            let body = build(schema, method)?;
            if omit_unbound && matches!(body, MethodBody::Unbound { .. }) {
                debug!("omitting method {:?} without HTTP binding", method.name);
                continue;
            }
            methods.push(MethodPlan {
                name: method.name.clone(),
                summary: method.summary().to_owned(),
                input_type: go_type_name(schema, file, &method.input_type, imports)?,
                body,
            });
        }

        let name = service.name.strip_suffix("Service").unwrap_or(&service.name);
        Ok(ServicePlan {
            name: name.to_owned(),
            methods,
        })
    }
}

/// Compiles the body of `method`.
pub fn build(schema: &Schema, method: &MethodDefinition) -> Result<MethodBody> {
    let binding = match method.binding()? {
        Some(binding) => binding,
        None => {
            return Ok(MethodBody::Unbound {
                method: method.name.clone(),
            })
        }
    };

    if method.client_streaming || method.server_streaming {
        return Ok(MethodBody::Streaming {
            method: method.name.clone(),
            client: method.client_streaming,
        });
    }

    let template = PathTemplate::parse(&binding.template);
    let url = UrlFormat {
        format: template.format.clone(),
        accessors: template
            .params
            .iter()
            .map(|param| Accessor::parse(param))
            .collect(),
    };

    let classification = classify(schema, method, &binding, &template)?;
    let query = build_params(Bucket::Query, &Accessor::root(), &classification.query);

    let body_value = match &binding.body {
        BodySelector::None => None,
        BodySelector::Whole => Some(Accessor::root()),
        BodySelector::Field(path) => Some(Accessor::parse(path)),
    };
    let body = match body_value {
        None => Body::None,
        Some(_) if !binding.verb.allows_body() => {
            return Err(Error::BodyOnGetOrDelete {
                method: method.name.clone(),
            })
        }
        Some(value) => match binding.encoding {
            BodyEncoding::Json => Body::Json(value),
            encoding => {
                let fields = form_fields(schema, method, &binding)?;
                Body::Form {
                    encoding,
                    statements: build_params(Bucket::Form, &value, &fields),
                }
            }
        },
    };

    Ok(MethodBody::Rest(CallPlan {
        verb: binding.verb,
        url,
        query,
        body,
    }))
}

/// Names reserved in generated files, which imported packages must not shadow.
const RESERVED_NAMES: &[&str] = &[
    "c", "context", "ctx", "fmt", "grequests", "in", "json", "opts", "protojson", "url",
];

/// Returns the Go type name of the message `type_name` as generated by `protoc-gen-go`, e.g.
/// `Book_Chapter` for `.library.v1.Book.Chapter`.
///
/// Messages declared in another Go package are qualified with the package name, and the
/// package is added to `imports`.
fn go_type_name(
    schema: &Schema,
    file: &FileDefinition,
    type_name: &str,
    imports: &mut BTreeMap<String, String>,
) -> Result<String> {
    let message = schema.message(type_name)?;
    let declared_in = schema.file(&message.file).unwrap_or(file);

    let name = FullyQualifiedName::from_type_name(type_name);
    let ident = name
        .strip_package(&declared_in.package)
        .unwrap_or_default()
        .iter()
        .map(|segment| to_go_camel(segment))
        .join("_");

    if same_go_package(file, declared_in) {
        return Ok(ident);
    }
    match go_import_path(declared_in.go_package.as_deref()) {
        Some(path) => {
            let package = go_package_name(declared_in.go_package.as_deref(), &declared_in.package);
            let alias = import_alias(imports, path, package);
            Ok(format!("{}.{}", alias, ident))
        }
        None => {
            warn!(
                "{} declares {} without a go_package option; referring to it as {}",
                declared_in.name, type_name, ident
            );
            Ok(ident)
        }
    }
}

fn same_go_package(file: &FileDefinition, other: &FileDefinition) -> bool {
    match (
        go_import_path(file.go_package.as_deref()),
        go_import_path(other.go_package.as_deref()),
    ) {
        (Some(path), Some(other_path)) => path == other_path,
        _ => file.package == other.package,
    }
}

/// Returns the name `path` is imported as, registering the import on first use. Clashing
/// package names are suffixed with a counter.
fn import_alias(imports: &mut BTreeMap<String, String>, path: &str, package: String) -> String {
    if let Some(alias) = imports.get(path) {
        return alias.clone();
    }
    let mut alias = package.clone();
    let mut counter = 1;
    while RESERVED_NAMES.contains(&alias.as_str()) || imports.values().any(|used| *used == alias) {
        alias = format!("{}{}", package, counter);
        counter += 1;
    }
    imports.insert(path.to_owned(), alias.clone());
    alias
}
