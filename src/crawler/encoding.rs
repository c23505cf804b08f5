//! Charset detection for response bodies
//!
//! The trade-history pages are served as GBK/GB2312 while the response
//! headers often claim otherwise, so the body is sniffed before the header
//! is trusted.
//!
//! Detection order:
//! 1. Byte-order mark
//! 2. `<meta charset=...>` / `http-equiv` charset within the first 1024 bytes
//! 3. Valid UTF-8
//! 4. Charset declared in the `Content-Type` header, unless it claims UTF-8
//! 5. GB18030 (superset of GBK and GB2312)

use encoding_rs::{Encoding, GB18030, UTF_8};

/// How far into the document the meta prescan looks
const PRESCAN_LIMIT: usize = 1024;

/// Picks the encoding a body should be decoded with
pub fn detect_encoding(body: &[u8], declared: Option<&str>) -> &'static Encoding {
    if let Some((encoding, _)) = Encoding::for_bom(body) {
        return encoding;
    }

    if let Some(encoding) = sniff_meta_charset(body) {
        return encoding;
    }

    if std::str::from_utf8(body).is_ok() {
        return UTF_8;
    }

    // A declared UTF-8 is already disproven at this point
    declared
        .and_then(|label| Encoding::for_label(label.trim().as_bytes()))
        .filter(|encoding| *encoding != UTF_8)
        .unwrap_or(GB18030)
}

/// Decodes a body with its detected encoding, replacing malformed sequences
pub fn decode_body(body: &[u8], declared: Option<&str>) -> String {
    let encoding = detect_encoding(body, declared);
    let (text, actual, had_errors) = encoding.decode(body);
    if had_errors {
        tracing::debug!(
            "Body contained malformed {} sequences; replaced",
            actual.name()
        );
    }
    text.into_owned()
}

/// Extracts the charset label from a `Content-Type` header value
pub fn charset_from_content_type(content_type: &str) -> Option<String> {
    content_type.split(';').skip(1).find_map(|param| {
        let (key, value) = param.split_once('=')?;
        if key.trim().eq_ignore_ascii_case("charset") {
            Some(value.trim().trim_matches('"').to_string())
        } else {
            None
        }
    })
}

/// Looks for a charset declaration in the document head
fn sniff_meta_charset(body: &[u8]) -> Option<&'static Encoding> {
    let head = &body[..body.len().min(PRESCAN_LIMIT)];
    // Only ASCII matters for the declaration itself
    let head = String::from_utf8_lossy(head).to_ascii_lowercase();

    let mut rest = head.as_str();
    while let Some(pos) = rest.find("charset") {
        rest = &rest[pos + "charset".len()..];
        let Some(value) = rest.trim_start().strip_prefix('=') else {
            continue;
        };
        let label: String = value
            .trim_start()
            .trim_start_matches(['"', '\''])
            .chars()
            .take_while(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | ':' | '.'))
            .collect();
        if let Some(encoding) = Encoding::for_label(label.as_bytes()) {
            return Some(encoding);
        }
    }

    None
}
