//! Transport encoding for copy payloads carried in `data-copy` attributes.
//!
//! Percent-encoding leaves only `[A-Za-z0-9-_.~%]`, so the encoded form is
//! attribute-safe without escaping and decodes back byte-for-byte.

use anyhow::{Context, Result};

pub fn encode_copy_payload(text: &str) -> String {
    urlencoding::encode(text).into_owned()
}

pub fn decode_copy_payload(encoded: &str) -> Result<String> {
    let decoded = urlencoding::decode(encoded).context("copy payload is not valid UTF-8")?;
    Ok(decoded.into_owned())
}
