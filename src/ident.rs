//! Utility functions for working with Go identifiers.

use heck::ToLowerCamelCase;

/// Converts a Protobuf field or type name to the `CamelCase` identifier `protoc-gen-go` derives
/// for it.
///
/// Underscores followed by a lowercase letter are dropped and the letter is upper-cased; other
/// underscores are kept. A leading underscore becomes `X`, and `.` separators become `_`.
pub fn to_go_camel(s: &str) -> String {
    let bytes = s.as_bytes();
    let mut ident = String::with_capacity(s.len() + 1);
    let mut i = 0;
    while i < bytes.len() {
        let c = bytes[i];
        let next_is_lower = bytes.get(i + 1).map_or(false, u8::is_ascii_lowercase);
        match c {
            b'.' if next_is_lower => {}
            b'.' => ident.push('_'),
            b'_' if i == 0 || bytes[i - 1] == b'.' => ident.push('X'),
            b'_' if next_is_lower => {}
            c if c.is_ascii_digit() => ident.push(c as char),
            c => {
                ident.push(c.to_ascii_uppercase() as char);
                while bytes.get(i + 1).map_or(false, u8::is_ascii_lowercase) {
                    i += 1;
                    ident.push(bytes[i] as char);
                }
            }
        }
        i += 1;
    }
    ident
}

/// Converts an exported Go identifier to its unexported form.
pub fn unexport(s: &str) -> String {
    s.to_lower_camel_case()
}

/// Returns the Go getter chain reading the field at `path`, e.g. `.GetSquid().GetMantle()`.
pub fn getter_chain<'a>(path: impl IntoIterator<Item = &'a str>) -> String {
    path.into_iter()
        .map(|segment| format!(".Get{}()", to_go_camel(segment)))
        .collect()
}

/// Derives the Go package name from a `go_package` option, falling back to the last segment of
/// the Protobuf package.
pub fn go_package_name(go_package: Option<&str>, proto_package: &str) -> String {
    let name = match go_package.filter(|s| !s.is_empty()) {
        Some(go_package) => match go_package.split_once(';') {
            Some((_, name)) => name,
            None => go_package.rsplit('/').next().unwrap_or(go_package),
        },
        None => proto_package.rsplit('.').next().unwrap_or(proto_package),
    };
    name.replace(['-', '.'], "_")
}

/// Returns the Go import path of a `go_package` option, e.g. `example.com/library/apiv1` for
/// `example.com/library/apiv1;lib`.
pub fn go_import_path(go_package: Option<&str>) -> Option<&str> {
    let path = match go_package?.split_once(';') {
        Some((path, _)) => path,
        None => go_package?,
    };
    Some(path.trim()).filter(|path| !path.is_empty())
}
