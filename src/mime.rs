//! MIME part location and content-transfer decoding.
//!
//! [`locate`] walks the immediate subparts of a multipart message and
//! returns the decoded bytes of the first part whose media type exactly
//! equals the wanted one. Media types are compared on the normalized
//! (lowercased) type string — `text/html` never matches a `text/*` prefix
//! or a longer type.
//!
//! Transfer decoding is decided here, not delegated: the part's
//! `Content-Transfer-Encoding` header is inspected case-insensitively, and
//! only `base64` and `quoted-printable` transform the bytes. Everything
//! else — `7bit`, `8bit`, `binary`, or no header at all — passes the raw
//! part body through unchanged.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use mailparse::body::Body;
use mailparse::{MailHeaderMap, ParsedMail};

use crate::error::Error;

/// Find the first subpart with the wanted media type and return its
/// decoded bytes.
///
/// Fails with [`Error::NotMultipart`] when the message is not a
/// `multipart/*` kind, and [`Error::PartNotFound`] when the subparts are
/// exhausted without a match.
pub fn locate(mail: &ParsedMail<'_>, media_type: &str) -> Result<Vec<u8>, Error> {
    if !mail.ctype.mimetype.starts_with("multipart/") {
        return Err(Error::NotMultipart(mail.ctype.mimetype.clone()));
    }

    for part in &mail.subparts {
        if part.ctype.mimetype != media_type {
            continue;
        }

        let raw = raw_part_body(part);
        let encoding = part
            .headers
            .get_first_value("Content-Transfer-Encoding")
            .unwrap_or_default()
            .to_ascii_lowercase();
        return match encoding.trim() {
            "base64" => base64_decode_forgiving(&raw),
            "quoted-printable" => Ok(qp_decode(&raw)),
            _ => Ok(raw),
        };
    }

    Err(Error::PartNotFound(media_type.to_string()))
}

/// The undecoded body bytes of a part, regardless of how the parser
/// classified its transfer encoding.
fn raw_part_body(part: &ParsedMail<'_>) -> Vec<u8> {
    match part.get_body_encoded() {
        Body::Base64(body) | Body::QuotedPrintable(body) => body.get_raw().to_vec(),
        Body::SevenBit(body) | Body::EightBit(body) => body.get_raw().to_vec(),
        Body::Binary(body) => body.get_raw().to_vec(),
    }
}

/// Decode base64 the way mail transports produce it: line breaks and other
/// whitespace interleaved with the alphabet are skipped before decoding.
fn base64_decode_forgiving(raw: &[u8]) -> Result<Vec<u8>, Error> {
    let filtered: Vec<u8> = raw
        .iter()
        .copied()
        .filter(|b| !b.is_ascii_whitespace())
        .collect();
    BASE64
        .decode(&filtered)
        .map_err(|e| Error::BodyRead(format!("invalid base64 body: {e}")))
}

/// Decode quoted-printable per RFC 2045.
///
/// Soft line breaks (`=` before a UNIX or DOS line ending) are discarded.
/// Invalid escape sequences are passed through untransformed rather than
/// rejected, so this never fails.
pub fn qp_decode(s: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(s.len());
    let mut i = 0;
    while i < s.len() {
        if s[i] != b'=' {
            out.push(s[i]);
            i += 1;
            continue;
        }
        if s[i + 1..].starts_with(b"\r\n") {
            i += 3;
            continue;
        }
        if s[i + 1..].starts_with(b"\n") {
            i += 2;
            continue;
        }
        match s.get(i + 1..i + 3).and_then(hex_byte) {
            Some(byte) => {
                out.push(byte);
                i += 3;
            }
            None => {
                out.push(b'=');
                i += 1;
            }
        }
    }
    out
}

fn hex_byte(pair: &[u8]) -> Option<u8> {
    std::str::from_utf8(pair)
        .ok()
        .and_then(|p| u8::from_str_radix(p, 16).ok())
}
