//! Resolution of `google.api.http` annotations into typed HTTP bindings.

use std::fmt;

use log::{debug, warn};

use crate::descriptor::http_rule::Pattern;
use crate::descriptor::MethodOptions;
use crate::{Error, Result};

/// An HTTP verb supported by the REST mapping.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Verb {
    Get,
    Put,
    Post,
    Delete,
    Patch,
}

impl Verb {
    /// Returns `false` for verbs which must not carry a request body.
    pub fn allows_body(self) -> bool {
        !matches!(self, Verb::Get | Verb::Delete)
    }

    /// The verb in `UpperCamel` case, as used by the client session methods.
    pub fn as_camel(self) -> &'static str {
        match self {
            Verb::Get => "Get",
            Verb::Put => "Put",
            Verb::Post => "Post",
            Verb::Delete => "Delete",
            Verb::Patch => "Patch",
        }
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.as_camel().to_ascii_uppercase())
    }
}

/// Which part of the request becomes the HTTP request body.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BodySelector {
    /// No body; every non-path field is sent as a query parameter.
    None,
    /// `*`: the whole request message is the body.
    Whole,
    /// A dotted field path selecting a sub-field of the request.
    Field(String),
}

impl BodySelector {
    /// Returns the selected field path, if the selector names one.
    pub fn field_path(&self) -> Option<&str> {
        match self {
            BodySelector::Field(path) => Some(path),
            _ => None,
        }
    }
}

/// How the request body is packaged on the wire.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum BodyEncoding {
    #[default]
    Json,
    /// `application/x-www-form-urlencoded`.
    Form,
    /// `multipart/form-data`.
    Multipart,
}

impl BodyEncoding {
    fn parse(method: &str, encoding: &str) -> Result<BodyEncoding> {
        match encoding {
            "" | "json" => Ok(BodyEncoding::Json),
            "form" => Ok(BodyEncoding::Form),
            "multi" | "multipart" => Ok(BodyEncoding::Multipart),
            _ => Err(Error::InvalidBodyEncoding {
                method: method.to_owned(),
                encoding: encoding.to_owned(),
            }),
        }
    }
}

/// The REST mapping of a single RPC method.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HttpBinding {
    pub verb: Verb,
    /// The URL template, e.g. `/v1/{name=shelves/*}/books`.
    pub template: String,
    pub body: BodySelector,
    pub encoding: BodyEncoding,
}

impl HttpBinding {
    /// Resolves the HTTP binding of the method `method` from its options.
    ///
    /// Only the primary pattern is honored; `additional_bindings` are ignored. Methods without
    /// an `http` option, or whose rule uses a `custom` pattern, have no binding.
    pub fn resolve(method: &str, options: Option<&MethodOptions>) -> Result<Option<HttpBinding>> {
        let rule = match options.and_then(|options| options.http.as_ref()) {
            Some(rule) => rule,
            None => return Ok(None),
        };

        if !rule.additional_bindings.is_empty() {
            debug!(
                "method {:?}: ignoring {} additional HTTP binding(s)",
                method,
                rule.additional_bindings.len()
            );
        }

        let (verb, template) = match rule.pattern.as_ref() {
            Some(Pattern::Get(url)) => (Verb::Get, url),
            Some(Pattern::Put(url)) => (Verb::Put, url),
            Some(Pattern::Post(url)) => (Verb::Post, url),
            Some(Pattern::Delete(url)) => (Verb::Delete, url),
            Some(Pattern::Patch(url)) => (Verb::Patch, url),
            Some(Pattern::Custom(custom)) => {
                warn!(
                    "method {:?}: custom HTTP verb {:?} is not supported",
                    method, custom.kind
                );
                return Ok(None);
            }
            None => {
                warn!("method {:?}: HTTP rule without a pattern", method);
                return Ok(None);
            }
        };

        let (body, encoding) = match rule.body.split_once(',') {
            Some((body, encoding)) => (body.trim(), BodyEncoding::parse(method, encoding.trim())?),
            None => (rule.body.trim(), BodyEncoding::Json),
        };
        let body = match body {
            "" => BodySelector::None,
            "*" => BodySelector::Whole,
            path => BodySelector::Field(path.to_owned()),
        };

        Ok(Some(HttpBinding {
            verb,
            template: template.clone(),
            body,
            encoding,
        }))
    }
}
