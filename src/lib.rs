//! `goapi-build` compiles Protobuf service definitions annotated with `google.api.http` rules
//! into Go REST clients.
//!
//! Every RPC method carrying an HTTP binding is compiled into a call plan: the URL is built by
//! substituting path parameters into the binding's template, the remaining request fields are
//! sent as query parameters, and the body selector picks what is sent as the request body. The
//! plans are rendered into one `.api.go` file per `.proto` file, implementing a client on top of
//! the [`grequests`](https://github.com/open-api-go/grequests) HTTP library.
//!
//! For example, the method
//!
//! ```proto
//! service LibraryService {
//!   rpc GetBook(GetBookRequest) returns (Book) {
//!     option (google.api.http) = { get: "/v1/{user_id}/books/{book_id=shelves/*}" };
//!   }
//! }
//! ```
//!
//! becomes a `GetBook` method fetching `<addr>/v1/<user_id>/books/<book_id>`, with every other
//! leaf field of `GetBookRequest` added to the query string.
//!
//! The crate is usually driven by the `protoc-gen-goapi` plugin:
//!
//! ```bash
//! protoc --plugin=protoc-gen-goapi --goapi_out=omitempty=false:gen library.proto
//! ```
//!
//! ## Options
//!
//! Options are passed through the plugin parameter as comma separated `key[=value]` pairs:
//!
//! * `omitempty` (default `true`): omit methods without an HTTP binding from the generated
//!   service. When disabled, such methods are generated with a body returning an error.

#![doc(html_root_url = "https://docs.rs/goapi-build/0.3.0")]

use log::debug;
use prost_types::compiler::code_generator_response::{Feature, File};
use prost_types::compiler::CodeGeneratorResponse;

pub mod descriptor;
mod error;
mod fully_qualified_name;
mod ident;

pub mod classify;
pub mod http;
pub mod leaf;
pub mod params;
pub mod path_template;
pub mod plan;
pub mod render;
pub mod schema;

#[cfg(test)]
mod fixtures;

pub use crate::error::{Error, Result};

use crate::descriptor::CodeGeneratorRequest;
use crate::plan::FilePlan;
use crate::schema::Schema;

/// The file name suffix of generated files.
const OUTPUT_SUFFIX: &str = ".api.go";

/// Configuration options for Go REST client generation.
///
/// This configuration builder can be used to set non-default code generation options.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    omit_unbound: bool,
}

/// A generated Go source file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GeneratedFile {
    /// The path of the file, relative to the output directory.
    pub name: String,
    pub content: String,
}

impl Config {
    /// Creates a new code generator configuration with default options.
    pub fn new() -> Config {
        Config::default()
    }

    /// Parses the options passed as the plugin parameter, e.g. `omitempty=false`.
    pub fn from_parameter(parameter: &str) -> Result<Config> {
        let mut config = Config::new();
        for option in parameter.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            let (key, value) = match option.split_once('=') {
                Some((key, value)) => (key.trim(), Some(value.trim())),
                None => (option, None),
            };
            match key {
                "omitempty" => {
                    config.omit_unbound(parse_bool(key, value)?);
                }
                _ => return Err(Error::InvalidOption(format!("unknown option {:?}", key))),
            }
        }
        Ok(config)
    }

    /// Configures whether methods without an HTTP binding are left out of the generated
    /// services.
    ///
    /// Defaults to `true`. When disabled, unbound methods are generated with a body which
    /// returns an error.
    pub fn omit_unbound(&mut self, omit: bool) -> &mut Self {
        self.omit_unbound = omit;
        self
    }

    /// Generates a Go source file for each file listed in `file_to_generate`.
    ///
    /// Every file of the request is indexed, since generated methods may refer to message types
    /// declared in dependencies. Fails on the first fatal error, without producing any files.
    pub fn generate(&self, request: &CodeGeneratorRequest) -> Result<Vec<GeneratedFile>> {
        let schema = Schema::new(&request.proto_file);

        let mut files = Vec::with_capacity(request.file_to_generate.len());
        for name in &request.file_to_generate {
            let file = match schema.file(name) {
                Some(file) => file,
                None => return Err(Error::MissingFile(name.clone())),
            };
            debug!("generating file: {:?}", name);
            let plan = FilePlan::build(&schema, file, self.omit_unbound)?;
            files.push(GeneratedFile {
                name: output_name(name),
                content: render::render(&plan)?,
            });
        }
        Ok(files)
    }

    /// Runs the generator over a plugin request.
    ///
    /// Errors are reported through the `error` field of the response.
    pub fn compile_request(&self, request: &CodeGeneratorRequest) -> CodeGeneratorResponse {
        let mut response = CodeGeneratorResponse {
            supported_features: Some(Feature::Proto3Optional as u64),
            ..Default::default()
        };
        match self.generate(request) {
            Ok(files) => {
                response.file = files
                    .into_iter()
                    .map(|file| File {
                        name: Some(file.name),
                        content: Some(file.content),
                        ..Default::default()
                    })
                    .collect();
            }
            Err(error) => response.error = Some(error.to_string()),
        }
        response
    }
}

impl Default for Config {
    fn default() -> Config {
        Config { omit_unbound: true }
    }
}

/// Runs the generator over a plugin request, taking options from the request parameter.
///
/// Never fails: invalid options and generation errors are reported through the `error` field
/// of the response.
pub fn compile_request(request: &CodeGeneratorRequest) -> CodeGeneratorResponse {
    match Config::from_parameter(request.parameter()) {
        Ok(config) => config.compile_request(request),
        Err(error) => CodeGeneratorResponse {
            error: Some(error.to_string()),
            supported_features: Some(Feature::Proto3Optional as u64),
            ..Default::default()
        },
    }
}

fn parse_bool(key: &str, value: Option<&str>) -> Result<bool> {
    match value {
        None | Some("true") => Ok(true),
        Some("false") => Ok(false),
        Some(value) => Err(Error::InvalidOption(format!(
            "option {:?} expects true or false, got {:?}",
            key, value
        ))),
    }
}

/// `library/v1/library.proto` becomes `library/v1/library.api.go`.
fn output_name(proto: &str) -> String {
    let stem = proto.strip_suffix(".proto").unwrap_or(proto);
    format!("{}{}", stem, OUTPUT_SUFFIX)
}
