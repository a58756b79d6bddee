//! RFC 2047 encoded-word decoding for message headers.
//!
//! Subjects arrive from mail agents as sequences of plain tokens and
//! `=?charset?encoding?text?=` encoded words. Plain text passes through
//! unchanged; encoded words are transfer-decoded (Q or B) and then charset-
//! decoded. Whitespace between two adjacent encoded words is deleted, as
//! RFC 2047 §6.2 requires, while whitespace next to plain text is kept.
//!
//! Unlike the forgiving decoders in [`crate::mime`], this fails loudly: a
//! word naming an unknown charset or carrying an invalid transfer encoding
//! makes the whole header undecodable.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use lazy_static::lazy_static;
use regex::Regex;

use crate::error::Error;
use crate::mime::qp_decode;

lazy_static! {
    // The token alphabet is printable ASCII minus space and `?`.
    static ref ENCODED_WORD: Regex =
        Regex::new(r"=\?([!->@-~]+)\?([!->@-~]+)\?([!->@-~]*)\?=").unwrap();
}

/// Decode a header value that may contain RFC 2047 encoded words.
pub fn decode_header(raw: &str) -> Result<String, Error> {
    let mut out = String::new();
    let mut last_end = 0;
    let mut previous_was_word = false;

    for captures in ENCODED_WORD.captures_iter(raw) {
        let matched = captures.get(0).unwrap();
        let between = &raw[last_end..matched.start()];
        let only_whitespace = !between.is_empty() && between.chars().all(char::is_whitespace);
        if !(previous_was_word && only_whitespace) {
            out.push_str(between);
        }

        out.push_str(&decode_word(
            captures.get(1).unwrap().as_str(),
            captures.get(2).unwrap().as_str(),
            captures.get(3).unwrap().as_str(),
        )?);

        last_end = matched.end();
        previous_was_word = true;
    }

    out.push_str(&raw[last_end..]);
    Ok(out)
}

fn decode_word(charset: &str, encoding: &str, text: &str) -> Result<String, Error> {
    let bytes = match encoding {
        // `_` stands for ASCII space regardless of charset, before any
        // transfer decoding.
        "q" | "Q" => qp_decode(text.replace('_', " ").as_bytes()),
        "b" | "B" => BASE64
            .decode(text.as_bytes())
            .map_err(|e| Error::MalformedSubject(format!("invalid base64 encoded word: {e}")))?,
        other => {
            return Err(Error::MalformedSubject(format!(
                "unknown transfer encoding {other:?}"
            )))
        }
    };

    let encoding = encoding_rs::Encoding::for_label_no_replacement(charset.as_bytes())
        .ok_or_else(|| Error::MalformedSubject(format!("unknown charset {charset:?}")))?;
    let (decoded, _, _) = encoding.decode(&bytes);
    Ok(decoded.into_owned())
}

/// Strip header folding from a raw header value. The continuation line's
/// leading whitespace survives, so folded words stay separated.
pub fn unfold(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw).replace(['\r', '\n'], "")
}
