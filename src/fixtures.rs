//! Descriptor builders shared by the unit tests.

use heck::ToLowerCamelCase;

use crate::descriptor::field_descriptor_proto::{Label, Type};
use crate::descriptor::source_code_info::Location;
use crate::descriptor::{
    http_rule, DescriptorProto, FieldBehavior, FieldDescriptorProto, FieldOptions,
    FileDescriptorProto, FileOptions, HttpRule, MethodDescriptorProto, MethodOptions,
    ServiceDescriptorProto, SourceCodeInfo,
};

/// A field as `protoc` describes it, with the JSON name filled in.
pub fn field(name: &str, number: i32, ty: Type) -> FieldDescriptorProto {
    let mut field = FieldDescriptorProto {
        name: Some(name.to_owned()),
        number: Some(number),
        json_name: Some(name.to_lower_camel_case()),
        ..Default::default()
    };
    field.set_label(Label::Optional);
    field.set_type(ty);
    field
}

pub fn message_field(name: &str, number: i32, type_name: &str) -> FieldDescriptorProto {
    FieldDescriptorProto {
        type_name: Some(type_name.to_owned()),
        ..field(name, number, Type::Message)
    }
}

pub fn repeated(mut field: FieldDescriptorProto) -> FieldDescriptorProto {
    field.set_label(Label::Repeated);
    field
}

pub fn optional(field: FieldDescriptorProto) -> FieldDescriptorProto {
    FieldDescriptorProto {
        proto3_optional: Some(true),
        ..field
    }
}

pub fn required(field: FieldDescriptorProto) -> FieldDescriptorProto {
    FieldDescriptorProto {
        options: Some(FieldOptions {
            field_behavior: vec![FieldBehavior::Required as i32],
        }),
        ..field
    }
}

pub fn message(name: &str, field: Vec<FieldDescriptorProto>) -> DescriptorProto {
    DescriptorProto {
        name: Some(name.to_owned()),
        field,
        ..Default::default()
    }
}

pub fn rule(pattern: http_rule::Pattern, body: &str) -> HttpRule {
    HttpRule {
        pattern: Some(pattern),
        body: body.to_owned(),
        ..Default::default()
    }
}

pub fn get(url: &str) -> HttpRule {
    rule(http_rule::Pattern::Get(url.to_owned()), "")
}

pub fn post(url: &str, body: &str) -> HttpRule {
    rule(http_rule::Pattern::Post(url.to_owned()), body)
}

pub fn method(
    name: &str,
    input_type: &str,
    output_type: &str,
    http: Option<HttpRule>,
) -> MethodDescriptorProto {
    MethodDescriptorProto {
        name: Some(name.to_owned()),
        input_type: Some(input_type.to_owned()),
        output_type: Some(output_type.to_owned()),
        options: http.map(|http| MethodOptions { http: Some(http) }),
        ..Default::default()
    }
}

pub fn file(
    name: &str,
    package: &str,
    message_type: Vec<DescriptorProto>,
    service: Vec<ServiceDescriptorProto>,
) -> FileDescriptorProto {
    FileDescriptorProto {
        name: Some(name.to_owned()),
        package: Some(package.to_owned()),
        message_type,
        service,
        syntax: Some("proto3".to_owned()),
        ..Default::default()
    }
}

pub fn well_known_types() -> Vec<FileDescriptorProto> {
    vec![
        file(
            "google/protobuf/timestamp.proto",
            "google.protobuf",
            vec![message(
                "Timestamp",
                vec![field("seconds", 1, Type::Int64), field("nanos", 2, Type::Int32)],
            )],
            vec![],
        ),
        file(
            "google/protobuf/field_mask.proto",
            "google.protobuf",
            vec![message(
                "FieldMask",
                vec![repeated(field("paths", 1, Type::String))],
            )],
            vec![],
        ),
    ]
}

/// A library service exercising path, query, body and form mappings.
///
/// ```proto
/// service LibraryService {
///   // Gets a book.
///   rpc GetBook(GetBookRequest) returns (Book) {
///     option (google.api.http) = { get: "/v1/{user_id}/books/{book_id=shelves/*}" };
///   }
///   // Creates a book.
///   rpc CreateBook(CreateBookRequest) returns (Book) {
///     option (google.api.http) = { post: "/v1/{parent=shelves/*}/books" body: "book" };
///   }
///   rpc UpdateBook(UpdateBookRequest) returns (Book) {
///     option (google.api.http) = { patch: "/v1/{book.name=books/*}" body: "*" };
///   }
///   rpc UploadCover(UploadCoverRequest) returns (Book) {
///     option (google.api.http) = { post: "/v1/books/{book_id}:cover" body: "cover,form" };
///   }
///   rpc WatchBooks(GetBookRequest) returns (stream Book) {
///     option (google.api.http) = { get: "/v1/books:watch" };
///   }
///   rpc Ping(PingRequest) returns (PingResponse);
/// }
/// ```
pub fn library() -> Vec<FileDescriptorProto> {
    let messages = vec![
        DescriptorProto {
            nested_type: vec![message(
                "Filter",
                vec![
                    field("author", 1, Type::String),
                    optional(field("available", 2, Type::Bool)),
                    message_field("published_after", 3, ".google.protobuf.Timestamp"),
                ],
            )],
            ..message(
                "GetBookRequest",
                vec![
                    field("user_id", 1, Type::String),
                    field("book_id", 2, Type::String),
                    field("page_size", 3, Type::Int32),
                    message_field("filter", 4, ".library.v1.GetBookRequest.Filter"),
                    repeated(field("tags", 5, Type::String)),
                ],
            )
        },
        message(
            "Book",
            vec![
                field("name", 1, Type::String),
                field("title", 2, Type::String),
                repeated(message_field("chapters", 3, ".library.v1.Chapter")),
                message_field("sequel", 4, ".library.v1.Book"),
            ],
        ),
        message("Chapter", vec![field("title", 1, Type::String)]),
        message(
            "CreateBookRequest",
            vec![
                required(field("parent", 1, Type::String)),
                message_field("book", 2, ".library.v1.Book"),
                field("validate_only", 3, Type::Bool),
            ],
        ),
        message(
            "UpdateBookRequest",
            vec![
                message_field("book", 1, ".library.v1.Book"),
                message_field("update_mask", 2, ".google.protobuf.FieldMask"),
            ],
        ),
        message(
            "UploadCoverRequest",
            vec![
                field("book_id", 1, Type::String),
                message_field("cover", 2, ".library.v1.Cover"),
            ],
        ),
        message(
            "Cover",
            vec![field("title", 1, Type::String), field("image", 2, Type::Bytes)],
        ),
        message("PingRequest", vec![]),
        message("PingResponse", vec![]),
    ];

    let mut watch_books = method(
        "WatchBooks",
        ".library.v1.GetBookRequest",
        ".library.v1.Book",
        Some(get("/v1/books:watch")),
    );
    watch_books.server_streaming = Some(true);

    let service = ServiceDescriptorProto {
        name: Some("LibraryService".to_owned()),
        method: vec![
            method(
                "GetBook",
                ".library.v1.GetBookRequest",
                ".library.v1.Book",
                Some(get("/v1/{user_id}/books/{book_id=shelves/*}")),
            ),
            method(
                "CreateBook",
                ".library.v1.CreateBookRequest",
                ".library.v1.Book",
                Some(post("/v1/{parent=shelves/*}/books", "book")),
            ),
            method(
                "UpdateBook",
                ".library.v1.UpdateBookRequest",
                ".library.v1.Book",
                Some(rule(
                    http_rule::Pattern::Patch("/v1/{book.name=books/*}".to_owned()),
                    "*",
                )),
            ),
            method(
                "UploadCover",
                ".library.v1.UploadCoverRequest",
                ".library.v1.Book",
                Some(post("/v1/books/{book_id}:cover", "cover,form")),
            ),
            watch_books,
            method(
                "Ping",
                ".library.v1.PingRequest",
                ".library.v1.PingResponse",
                None,
            ),
        ],
    };

    let comment = |path: Vec<i32>, text: &str| Location {
        path,
        leading_comments: Some(text.to_owned()),
        ..Default::default()
    };

    let library = FileDescriptorProto {
        dependency: vec![
            "google/protobuf/timestamp.proto".to_owned(),
            "google/protobuf/field_mask.proto".to_owned(),
        ],
        options: Some(FileOptions {
            go_package: Some("example.com/library/apiv1/librarypb".to_owned()),
        }),
        source_code_info: Some(SourceCodeInfo {
            location: vec![
                comment(vec![6, 0], " Manages a library.\n"),
                comment(vec![6, 0, 2, 0], " Gets a book.\n Second line.\n"),
                comment(vec![6, 0, 2, 1], " Creates a book.\n"),
            ],
        }),
        ..file("library/v1/library.proto", "library.v1", messages, vec![service])
    };

    let mut files = well_known_types();
    files.push(library);
    files
}

/// A media service exercising multipart and whole-request form bodies, wrapper types and
/// request messages declared in other Go packages.
///
/// ```proto
/// service MediaService {
///   rpc UploadAsset(UploadAssetRequest) returns (Asset) {
///     option (google.api.http) = { post: "/v1/{parent=users/*}/assets" body: "asset,multipart" };
///   }
///   rpc SubmitForm(SubmitFormRequest) returns (Asset) {
///     option (google.api.http) = { post: "/v1/forms/{form_id}:submit" body: "*,form" };
///   }
///   rpc SearchAssets(SearchAssetsRequest) returns (Asset) {
///     option (google.api.http) = { get: "/v1/assets:search" };
///   }
///   rpc ListAssets(google.protobuf.Empty) returns (Asset) {
///     option (google.api.http) = { get: "/v1/assets" };
///   }
/// }
/// ```
pub fn media() -> Vec<FileDescriptorProto> {
    let go_package = |path: &str| {
        Some(FileOptions {
            go_package: Some(path.to_owned()),
        })
    };

    let wrappers = FileDescriptorProto {
        options: go_package("google.golang.org/protobuf/types/known/wrapperspb"),
        ..file(
            "google/protobuf/wrappers.proto",
            "google.protobuf",
            vec![message(
                "StringValue",
                vec![field("value", 1, Type::String)],
            )],
            vec![],
        )
    };
    let empty = FileDescriptorProto {
        options: go_package("google.golang.org/protobuf/types/known/emptypb"),
        ..file(
            "google/protobuf/empty.proto",
            "google.protobuf",
            vec![message("Empty", vec![])],
            vec![],
        )
    };

    let messages = vec![
        message(
            "Asset",
            vec![field("title", 1, Type::String), field("data", 2, Type::Bytes)],
        ),
        message(
            "UploadAssetRequest",
            vec![
                field("parent", 1, Type::String),
                message_field("asset", 2, ".media.v1.Asset"),
                field("overwrite", 3, Type::Bool),
            ],
        ),
        message(
            "SubmitFormRequest",
            vec![
                field("form_id", 1, Type::String),
                field("comment", 2, Type::String),
                message_field("note", 3, ".google.protobuf.StringValue"),
            ],
        ),
        message(
            "SearchAssetsRequest",
            vec![message_field("query", 1, ".google.protobuf.StringValue")],
        ),
    ];

    let service = ServiceDescriptorProto {
        name: Some("MediaService".to_owned()),
        method: vec![
            method(
                "UploadAsset",
                ".media.v1.UploadAssetRequest",
                ".media.v1.Asset",
                Some(post("/v1/{parent=users/*}/assets", "asset,multipart")),
            ),
            method(
                "SubmitForm",
                ".media.v1.SubmitFormRequest",
                ".media.v1.Asset",
                Some(post("/v1/forms/{form_id}:submit", "*,form")),
            ),
            method(
                "SearchAssets",
                ".media.v1.SearchAssetsRequest",
                ".media.v1.Asset",
                Some(get("/v1/assets:search")),
            ),
            method(
                "ListAssets",
                ".google.protobuf.Empty",
                ".media.v1.Asset",
                Some(get("/v1/assets")),
            ),
        ],
    };

    let media = FileDescriptorProto {
        dependency: vec![
            "google/protobuf/wrappers.proto".to_owned(),
            "google/protobuf/empty.proto".to_owned(),
        ],
        options: go_package("example.com/media/apiv1/mediapb"),
        ..file("media/v1/media.proto", "media.v1", messages, vec![service])
    };

    vec![wrappers, empty, media]
}
