//! A `protoc` plugin generating Go REST clients from `google.api.http` annotations.
//!
//! Reads an encoded `CodeGeneratorRequest` from stdin and writes the encoded
//! `CodeGeneratorResponse` to stdout. Generation errors are reported to `protoc` through the
//! response; only failures to read, decode or write the plugin messages end the process with an
//! error status. Logs go to stderr and are enabled with `RUST_LOG`.

use std::io::{self, Read, Write};

use anyhow::{Context, Result};
use log::debug;
use prost::Message;

use goapi_build::descriptor::CodeGeneratorRequest;

fn main() -> Result<()> {
    env_logger::init();

    if std::env::args().skip(1).any(|arg| arg == "--version") {
        println!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let mut buf = Vec::new();
    io::stdin()
        .read_to_end(&mut buf)
        .context("failed to read the plugin request from stdin")?;

    let request = CodeGeneratorRequest::decode(buf.as_slice())
        .context("failed to decode the plugin request")?;
    debug!(
        "received request for {} file(s) with parameter {:?}",
        request.file_to_generate.len(),
        request.parameter()
    );

    let response = goapi_build::compile_request(&request);
    if let Some(error) = &response.error {
        debug!("generation failed: {}", error);
    }

    io::stdout()
        .write_all(&response.encode_to_vec())
        .context("failed to write the plugin response to stdout")?;
    Ok(())
}
