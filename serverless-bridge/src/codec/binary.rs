use crate::{AdapterError, Body, Entity, Response};

use backtrace::Backtrace;
use base64::engine::general_purpose::{GeneralPurpose, STANDARD};
use base64::read::DecoderReader;
use base64::write::EncoderStringWriter;
use headers::{ContentType, HeaderMapExt};
use mime::Mime;

use std::io::{Cursor, Write};

// Standard alphabet with canonical padding and no line wrapping. URL-safe and MIME input is
// rejected.
static ENGINE: GeneralPurpose = STANDARD;

/// Build the request entity stream from the raw event body.
///
/// If `base64_encoded` is set, a base64 decoder is interposed directly on top of the raw bytes so
/// that every later stage reads decoded content. Malformed input surfaces as an
/// [`InvalidData`](std::io::ErrorKind::InvalidData) error while reading the entity.
pub fn decode_entity(raw: Vec<u8>, base64_encoded: bool) -> Entity {
  if base64_encoded {
    Entity::new(DecoderReader::new(Cursor::new(raw), &ENGINE))
  } else {
    Entity::new(Cursor::new(raw))
  }
}

/// Serialize a response body as the platform's string body.
///
/// If `base64` is set, the body is written through a base64 encoder. Otherwise, text bodies pass
/// through unchanged and binary bodies must be valid UTF-8. Returns `None` for an empty body.
pub fn encode_body(body: Body, base64: bool) -> Result<Option<String>, AdapterError> {
  let bytes = match body {
    Body::Empty => return Ok(None),
    Body::Text(text) if !base64 => return Ok(Some(text)),
    Body::Text(text) => text.into_bytes(),
    Body::Binary(bytes) => bytes,
  };

  if base64 {
    let mut encoder = EncoderStringWriter::new(&ENGINE);
    encoder
      .write_all(&bytes)
      .map_err(|err| AdapterError::EncodeBody(Box::new(err), Backtrace::new()))?;
    Ok(Some(encoder.into_inner()))
  } else {
    String::from_utf8(bytes)
      .map(Some)
      .map_err(|err| AdapterError::InvalidBodyUtf8(Box::new(err), Backtrace::new()))
  }
}

/// Whether the response entity is binary and must be base64-encoded by platforms that only carry
/// string bodies.
///
/// This is the case for [`Body::Binary`] bodies and for any response with a `Content-Encoding`
/// header (e.g., gzip-compressed text).
pub fn is_binary_response(response: &Response) -> bool {
  matches!(response.body(), Body::Binary(_))
    || response
      .headers()
      .contains_key(http::header::CONTENT_ENCODING)
}

/// Return the parsed `Content-Type` of a header map, if present and valid.
pub fn content_type(headers: &crate::HeaderMap) -> Option<Mime> {
  headers.typed_get::<ContentType>().map(Mime::from)
}

/// Whether a media type represents text that can be carried as a plain string (`text/*`, JSON,
/// XML, JavaScript, and form-urlencoded data).
pub fn is_textual_media_type(media_type: &Mime) -> bool {
  media_type.type_() == mime::TEXT
    || (media_type.type_() == mime::APPLICATION
      && (matches!(
        media_type.subtype().as_str(),
        "json" | "xml" | "javascript" | "x-www-form-urlencoded"
      ) || matches!(
        media_type.suffix().map(|suffix| suffix.as_str()),
        Some("json" | "xml")
      )))
}

#[cfg(test)]
mod tests {
  use super::{decode_entity, encode_body, is_binary_response, is_textual_media_type};
  use crate::{Body, HeaderValue, Response};

  use pretty_assertions::assert_eq;

  use std::io::{ErrorKind, Read};

  fn read(raw: &str, base64_encoded: bool) -> std::io::Result<Vec<u8>> {
    let mut buf = Vec::new();
    decode_entity(raw.as_bytes().to_vec(), base64_encoded).read_to_end(&mut buf)?;
    Ok(buf)
  }

  #[test]
  fn test_decode_standard_alphabet() {
    assert_eq!(read("dGVzdA==", true).unwrap(), b"test");
    assert_eq!(read("+/8=", true).unwrap(), vec![0xfb, 0xff]);
  }

  #[test]
  fn test_decode_rejects_url_safe_alphabet() {
    let err = read("-_8=", true).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidData);
  }

  #[test]
  fn test_decode_rejects_mime_line_breaks() {
    let err = read("dGVz\r\ndA==", true).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidData);
  }

  #[test]
  fn test_passthrough() {
    assert_eq!(read("dGVzdA==", false).unwrap(), b"dGVzdA==");
    assert_eq!(read("", false).unwrap(), b"");
  }

  #[test]
  fn test_encode_body() {
    assert_eq!(encode_body(Body::Empty, true).unwrap(), None);
    assert_eq!(
      encode_body(Body::Text("ok".to_string()), false).unwrap(),
      Some("ok".to_string())
    );
    assert_eq!(
      encode_body(Body::Binary(vec![0xfb, 0xff]), true).unwrap(),
      Some("+/8=".to_string())
    );
    assert_eq!(
      encode_body(Body::Text("test".to_string()), true).unwrap(),
      Some("dGVzdA==".to_string())
    );
    assert!(encode_body(Body::Binary(vec![0xff]), false).is_err());
  }

  #[test]
  fn test_is_binary_response() {
    assert!(!is_binary_response(&Response::new(
      http::StatusCode::OK,
      Body::Text("ok".to_string())
    )));
    assert!(is_binary_response(&Response::new(
      http::StatusCode::OK,
      Body::Binary(vec![1, 2, 3])
    )));

    let mut gzipped = Response::new(http::StatusCode::OK, Body::Text("ok".to_string()));
    gzipped
      .headers_mut()
      .insert(http::header::CONTENT_ENCODING, HeaderValue::from_static("gzip"));
    assert!(is_binary_response(&gzipped));
  }

  #[test]
  fn test_is_textual_media_type() {
    for textual in [
      "text/plain",
      "text/html; charset=utf-8",
      "application/json",
      "application/problem+json",
      "application/atom+xml",
      "application/x-www-form-urlencoded",
    ] {
      assert!(
        is_textual_media_type(&textual.parse().unwrap()),
        "{textual} should be textual"
      );
    }
    for binary in ["image/png", "application/octet-stream", "application/pdf"] {
      assert!(
        !is_textual_media_type(&binary.parse().unwrap()),
        "{binary} should be binary"
      );
    }
  }
}
