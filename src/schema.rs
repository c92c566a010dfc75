//! The typed schema model and its index of message types.

use std::collections::HashMap;

use log::{debug, trace};

use crate::descriptor::field_descriptor_proto::{Label, Type};
use crate::descriptor::{
    DescriptorProto, FieldBehavior, FieldDescriptorProto, FileDescriptorProto,
    MethodDescriptorProto, MethodOptions, ServiceDescriptorProto, SourceCodeInfo,
};
use crate::fully_qualified_name::FullyQualifiedName;
use crate::http::HttpBinding;
use crate::{Error, Result};

const FILE_SERVICE: i32 = 6;
const SERVICE_METHOD: i32 = 2;

/// Well-known types with a canonical textual form. Fields of these types are leaves.
const WELL_KNOWN_TYPES: &[&str] = &[
    ".google.protobuf.FieldMask",
    ".google.protobuf.Timestamp",
    ".google.protobuf.Duration",
    ".google.protobuf.DoubleValue",
    ".google.protobuf.FloatValue",
    ".google.protobuf.Int64Value",
    ".google.protobuf.UInt64Value",
    ".google.protobuf.Int32Value",
    ".google.protobuf.UInt32Value",
    ".google.protobuf.BoolValue",
    ".google.protobuf.StringValue",
    ".google.protobuf.BytesValue",
    ".google.protobuf.Value",
    ".google.protobuf.ListValue",
];

/// A field of a message type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Field {
    /// The fully-qualified name of the field, e.g. `.library.v1.Book.title`. Identifies the
    /// field across the whole schema.
    pub full_name: String,
    pub name: String,
    /// The JSON name, as filled in by `protoc`.
    pub json_name: String,
    pub ty: Type,
    pub label: Label,
    /// Whether this is a proto3 `optional` field with explicit presence.
    pub proto3_optional: bool,
    /// Whether the field is annotated with `google.api.field_behavior = REQUIRED`.
    pub required: bool,
    /// The fully-qualified name of the referenced message or enum, empty for scalars.
    pub type_name: String,
}

impl Field {
    fn new(message: &FullyQualifiedName, field: &FieldDescriptorProto) -> Field {
        let name = field.name().to_owned();
        let required = field.options.as_ref().map_or(false, |options| {
            options
                .field_behavior
                .contains(&(FieldBehavior::Required as i32))
        });
        Field {
            full_name: message.join(&name).into(),
            name,
            json_name: field.json_name().to_owned(),
            ty: field.r#type(),
            label: field.label(),
            proto3_optional: field.proto3_optional(),
            required,
            type_name: field.type_name().to_owned(),
        }
    }

    pub fn is_repeated(&self) -> bool {
        self.label == Label::Repeated
    }

    pub fn is_message(&self) -> bool {
        self.ty == Type::Message
    }

    /// Returns `true` if this field holds one of the well-known types with a canonical textual
    /// representation.
    pub fn is_well_known(&self) -> bool {
        self.is_message() && WELL_KNOWN_TYPES.contains(&self.type_name.as_str())
    }

    /// Returns `true` for singular fields that are neither messages nor bytes.
    pub fn is_singular_primitive(&self) -> bool {
        !self.is_repeated() && !matches!(self.ty, Type::Message | Type::Bytes)
    }
}

/// A message type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MessageType {
    /// The fully-qualified name, e.g. `.library.v1.Book`.
    pub name: String,
    /// The name of the `.proto` file declaring the type.
    pub file: String,
    pub fields: Vec<Field>,
}

impl MessageType {
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|field| field.name == name)
    }
}

/// An RPC method.
#[derive(Clone, Debug, PartialEq)]
pub struct MethodDefinition {
    pub name: String,
    /// The leading comment of the method, empty if none.
    pub comment: String,
    /// Fully-qualified input message type name.
    pub input_type: String,
    /// Fully-qualified output message type name.
    pub output_type: String,
    pub client_streaming: bool,
    pub server_streaming: bool,
    /// The method options carrying the `google.api.http` rule, if any.
    pub options: Option<MethodOptions>,
}

impl MethodDefinition {
    /// The first line of the leading comment, trimmed.
    pub fn summary(&self) -> &str {
        self.comment.lines().next().unwrap_or("").trim()
    }

    /// Resolves the HTTP binding of the method.
    ///
    /// Bindings are resolved on demand, so an invalid rule only fails the files whose methods
    /// are generated.
    pub fn binding(&self) -> Result<Option<HttpBinding>> {
        HttpBinding::resolve(&self.name, self.options.as_ref())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ServiceDefinition {
    pub name: String,
    pub methods: Vec<MethodDefinition>,
}

/// A `.proto` file's services and package information.
#[derive(Clone, Debug, PartialEq)]
pub struct FileDefinition {
    pub name: String,
    pub package: String,
    pub go_package: Option<String>,
    pub services: Vec<ServiceDefinition>,
}

/// The read-only schema of a single generator run.
///
/// Built once over every file of the request, including files which are only dependencies of
/// the files to generate, since their types may be referenced by generated methods.
#[derive(Debug)]
pub struct Schema {
    messages: HashMap<String, MessageType>,
    files: Vec<FileDefinition>,
}

impl Schema {
    pub fn new<'a>(files: impl IntoIterator<Item = &'a FileDescriptorProto>) -> Schema {
        let mut schema = Schema {
            messages: HashMap::new(),
            files: Vec::new(),
        };

        for file in files {
            debug!("indexing file: {:?}", file.name());
            let package = FullyQualifiedName::package(file.package());
            for message in &file.message_type {
                schema.add_message(file.name(), package.clone(), message);
            }
            schema.files.push(FileDefinition::new(file));
        }

        schema
    }

    fn add_message(&mut self, file: &str, parent: FullyQualifiedName, message: &DescriptorProto) {
        let name = parent.join(message.name());
        trace!("  message: {:?}", name);
        let fields = message
            .field
            .iter()
            .map(|field| Field::new(&name, field))
            .collect();
        for nested in &message.nested_type {
            self.add_message(file, name.clone(), nested);
        }
        self.messages.insert(
            name.clone().into(),
            MessageType {
                name: name.into(),
                file: file.to_owned(),
                fields,
            },
        );
    }

    /// Looks up a message type by its fully-qualified name.
    pub fn message(&self, name: &str) -> Result<&MessageType> {
        self.messages
            .get(name)
            .ok_or_else(|| Error::UnknownType(name.to_owned()))
    }

    /// Looks up the field at the dotted `path` below the message type `message`.
    ///
    /// Returns `Ok(None)` if a segment does not name a field, or names a non-message field
    /// before the last segment. Fails if a message type along the path is unknown.
    pub fn lookup_field(&self, message: &str, path: &str) -> Result<Option<&Field>> {
        let mut message = self.message(message)?;
        let mut segments = path.split('.').peekable();
        while let Some(segment) = segments.next() {
            let field = match message.field(segment) {
                Some(field) => field,
                None => return Ok(None),
            };
            if segments.peek().is_none() {
                return Ok(Some(field));
            }
            if !field.is_message() {
                return Ok(None);
            }
            message = self.message(&field.type_name)?;
        }
        Ok(None)
    }

    /// The files of the request, in request order.
    pub fn files(&self) -> &[FileDefinition] {
        &self.files
    }

    pub fn file(&self, name: &str) -> Option<&FileDefinition> {
        self.files.iter().find(|file| file.name == name)
    }
}

impl FileDefinition {
    fn new(file: &FileDescriptorProto) -> FileDefinition {
        let comments = leading_comments(file.source_code_info.as_ref());
        let services = file
            .service
            .iter()
            .enumerate()
            .map(|(idx, service)| ServiceDefinition::new(idx as i32, service, &comments))
            .collect();

        FileDefinition {
            name: file.name().to_owned(),
            package: file.package().to_owned(),
            go_package: file
                .options
                .as_ref()
                .and_then(|options| options.go_package.clone()),
            services,
        }
    }
}

impl ServiceDefinition {
    fn new(
        idx: i32,
        service: &ServiceDescriptorProto,
        comments: &HashMap<Vec<i32>, String>,
    ) -> ServiceDefinition {
        debug!("  service: {:?}", service.name());
        let methods = service
            .method
            .iter()
            .enumerate()
            .map(|(method_idx, method)| {
                let path = vec![FILE_SERVICE, idx, SERVICE_METHOD, method_idx as i32];
                let comment = comments.get(&path).cloned().unwrap_or_default();
                MethodDefinition::new(method, comment)
            })
            .collect();

        ServiceDefinition {
            name: service.name().to_owned(),
            methods,
        }
    }
}

impl MethodDefinition {
    fn new(method: &MethodDescriptorProto, comment: String) -> MethodDefinition {
        trace!("    method: {:?}", method.name());
        MethodDefinition {
            name: method.name().to_owned(),
            comment,
            input_type: FullyQualifiedName::from_type_name(method.input_type()).into(),
            output_type: FullyQualifiedName::from_type_name(method.output_type()).into(),
            client_streaming: method.client_streaming(),
            server_streaming: method.server_streaming(),
            options: method.options.clone(),
        }
    }
}

/// Maps source locations to their leading comments.
fn leading_comments(source_info: Option<&SourceCodeInfo>) -> HashMap<Vec<i32>, String> {
    source_info
        .map(|source_info| {
            source_info
                .location
                .iter()
                .filter_map(|location| {
                    location
                        .leading_comments
                        .as_ref()
                        .map(|comment| (location.path.clone(), comment.clone()))
                })
                .collect()
        })
        .unwrap_or_default()
}
