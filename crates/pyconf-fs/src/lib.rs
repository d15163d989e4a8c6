use std::io::Read;
use std::path::Path;

use encoding_rs_io::DecodeReaderBytesBuilder;
use tracing::trace;

pub use crate::path::*;

mod path;

/// Reads data from the path and requires that it be valid UTF-8 or UTF-16.
///
/// This uses BOM sniffing to determine if the data should be transcoded
/// from UTF-16 to Rust's `String` type (which uses UTF-8). A UTF-8 BOM is stripped.
pub fn read_to_string_transcode(path: impl AsRef<Path>) -> std::io::Result<String> {
    let path = path.as_ref();
    trace!("Reading {}", path.user_display());
    let raw = fs_err::read(path)?;
    let mut buf = String::with_capacity(raw.len());
    DecodeReaderBytesBuilder::new()
        .strip_bom(true)
        .build(&*raw)
        .read_to_string(&mut buf)
        .map_err(|err| {
            let path = path.display();
            std::io::Error::other(format!("failed to decode file {path}: {err}"))
        })?;
    Ok(buf)
}
