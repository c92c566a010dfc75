//! Code generation errors.

use std::fmt;

use thiserror::Error;

/// A fatal code generation error.
///
/// Any error aborts the whole run: the plugin reports it back to `protoc` through the
/// `error` field of the response and emits no files.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// A fully-qualified message type name could not be found in any input file.
    #[error("unknown message type {0:?}")]
    UnknownType(String),

    /// A body mapping was declared on a method whose verb carries no body.
    #[error("invalid use of body parameter for a get/delete method {method:?}")]
    BodyOnGetOrDelete { method: String },

    /// The body selector named an encoding other than json, form or multipart.
    #[error("unsupported body encoding {encoding:?} on method {method:?}")]
    InvalidBodyEncoding { method: String, encoding: String },

    /// A form or multipart body must select a message, whose fields become the form entries.
    #[error("body field {field:?} of method {method:?} is not a message and can not be form encoded")]
    FormBodyNotMessage { method: String, field: String },

    /// A file listed in `file_to_generate` has no descriptor in the request.
    #[error("file to generate {0:?} is missing from the request")]
    MissingFile(String),

    /// The plugin parameter string could not be parsed.
    #[error("invalid generator option: {0}")]
    InvalidOption(String),

    /// Writing the generated source failed.
    #[error("failed to render generated source")]
    Render(#[from] fmt::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
