//! URL and base64 transcoding filters.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::context::RenderContext;
use crate::error::{FilterError, FilterResult};
use crate::value::Value;

/// Form-encode: unreserved characters pass through, space becomes `+`,
/// everything else is percent-encoded byte by byte.
pub fn url_encode(_ctx: &RenderContext, input: &Value, _args: &[Value]) -> FilterResult<Value> {
    if input.is_nil() {
        return Ok(Value::Nil);
    }
    let s = input.to_string();
    let mut out = String::with_capacity(s.len());
    for byte in s.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            b' ' => out.push('+'),
            _ => out.push_str(&format!("%{:02X}", byte)),
        }
    }
    Ok(Value::Str(out))
}

/// Reverse of [`url_encode`]. Malformed percent escapes pass through as
/// literal text rather than failing the render.
pub fn url_decode(_ctx: &RenderContext, input: &Value, _args: &[Value]) -> FilterResult<Value> {
    if input.is_nil() {
        return Ok(Value::Nil);
    }
    let s = input.to_string();
    let bytes = s.as_bytes();
    let mut out: Vec<u8> = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'+' => {
                out.push(b' ');
                i += 1;
            }
            b'%' => match hex_pair(bytes.get(i + 1), bytes.get(i + 2)) {
                Some(byte) => {
                    out.push(byte);
                    i += 3;
                }
                None => {
                    out.push(b'%');
                    i += 1;
                }
            },
            b => {
                out.push(b);
                i += 1;
            }
        }
    }
    Ok(Value::Str(String::from_utf8_lossy(&out).into_owned()))
}

fn hex_pair(high: Option<&u8>, low: Option<&u8>) -> Option<u8> {
    let high = (*high? as char).to_digit(16)?;
    let low = (*low? as char).to_digit(16)?;
    Some((high * 16 + low) as u8)
}

pub fn base64_encode(_ctx: &RenderContext, input: &Value, _args: &[Value]) -> FilterResult<Value> {
    Ok(Value::Str(STANDARD.encode(input.to_string())))
}

pub fn base64_decode(_ctx: &RenderContext, input: &Value, _args: &[Value]) -> FilterResult<Value> {
    decode_standard(&input.to_string(), "base64_decode")
}

/// Standard encoding with the URL-unsafe alphabet characters swapped out
/// and padding dropped.
pub fn base64_url_safe_encode(
    _ctx: &RenderContext,
    input: &Value,
    _args: &[Value],
) -> FilterResult<Value> {
    let encoded = STANDARD
        .encode(input.to_string())
        .replace('+', "-")
        .replace('/', "_")
        .trim_end_matches('=')
        .to_string();
    Ok(Value::Str(encoded))
}

pub fn base64_url_safe_decode(
    _ctx: &RenderContext,
    input: &Value,
    _args: &[Value],
) -> FilterResult<Value> {
    let mut text = input.to_string().replace('-', "+").replace('_', "/");
    while text.len() % 4 != 0 {
        text.push('=');
    }
    decode_standard(&text, "base64_url_safe_decode")
}

fn decode_standard(text: &str, filter: &str) -> FilterResult<Value> {
    let bytes = STANDARD.decode(text).map_err(|_| FilterError::MalformedEncoding {
        filter: filter.to_string(),
    })?;
    let decoded = String::from_utf8(bytes).map_err(|_| FilterError::MalformedEncoding {
        filter: filter.to_string(),
    })?;
    Ok(Value::Str(decoded))
}
