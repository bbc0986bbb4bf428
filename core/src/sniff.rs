//! Content sniffing for raw byte bodies.
//!
//! Follows the WHATWG MIME sniffing algorithm for the signatures that matter
//! to an API client: markup, documents, common image and archive formats,
//! and the final text-versus-binary decision. At most the first 512 bytes
//! are considered.

const SNIFF_LEN: usize = 512;

const TEXT_PLAIN: &str = "text/plain; charset=utf-8";
const OCTET_STREAM: &str = "application/octet-stream";

/// HTML tags recognised after leading whitespace, matched case-insensitively
/// and followed by a tag-terminating byte.
const HTML_SIGNATURES: &[&[u8]] = &[
    b"<!DOCTYPE HTML",
    b"<HTML",
    b"<HEAD",
    b"<SCRIPT",
    b"<IFRAME",
    b"<H1",
    b"<DIV",
    b"<FONT",
    b"<TABLE",
    b"<A",
    b"<STYLE",
    b"<TITLE",
    b"<B",
    b"<BODY",
    b"<BR",
    b"<P",
    b"<!--",
];

/// Exact prefixes and the content type they identify.
const PREFIX_SIGNATURES: &[(&[u8], &str)] = &[
    (b"%PDF-", "application/pdf"),
    (b"%!PS-Adobe-", "application/postscript"),
    (b"\xFE\xFF", "text/plain; charset=utf-16be"),
    (b"\xFF\xFE", "text/plain; charset=utf-16le"),
    (b"\xEF\xBB\xBF", TEXT_PLAIN),
    (b"GIF87a", "image/gif"),
    (b"GIF89a", "image/gif"),
    (b"\x89PNG\x0D\x0A\x1A\x0A", "image/png"),
    (b"\xFF\xD8\xFF", "image/jpeg"),
    (b"BM", "image/bmp"),
    (b"\x00\x00\x01\x00", "image/x-icon"),
    (b"OggS\x00", "application/ogg"),
    (b"ID3", "audio/mpeg"),
    (b"\x1F\x8B\x08", "application/x-gzip"),
    (b"PK\x03\x04", "application/zip"),
    (b"Rar!\x1A\x07\x00", "application/x-rar-compressed"),
    (b"Rar!\x1A\x07\x01\x00", "application/x-rar-compressed"),
    (b"\x00\x61\x73\x6D", "application/wasm"),
];

/// Guess the content type of `data`.
///
/// Always returns a valid MIME type; `application/octet-stream` when
/// nothing more specific matches. Empty input is plain text.
pub fn detect_content_type(data: &[u8]) -> &'static str {
    let data = &data[..data.len().min(SNIFF_LEN)];

    let trimmed = skip_whitespace(data);
    if HTML_SIGNATURES.iter().any(|sig| matches_html(trimmed, sig)) {
        return "text/html; charset=utf-8";
    }
    if trimmed.starts_with(b"<?xml") {
        return "text/xml; charset=utf-8";
    }

    for &(prefix, content_type) in PREFIX_SIGNATURES {
        if data.starts_with(prefix) {
            return content_type;
        }
    }

    if is_webp(data) {
        return "image/webp";
    }
    if is_wav(data) {
        return "audio/wave";
    }

    if data.iter().any(|b| is_binary_byte(*b)) {
        OCTET_STREAM
    } else {
        TEXT_PLAIN
    }
}

fn skip_whitespace(data: &[u8]) -> &[u8] {
    let start = data
        .iter()
        .position(|&b| !matches!(b, b'\t' | b'\n' | b'\x0C' | b'\r' | b' '))
        .unwrap_or(data.len());
    &data[start..]
}

fn matches_html(data: &[u8], sig: &[u8]) -> bool {
    if data.len() <= sig.len() {
        return false;
    }
    let head = &data[..sig.len()];
    if !head.eq_ignore_ascii_case(sig) {
        return false;
    }
    matches!(data[sig.len()], b' ' | b'>')
}

fn is_webp(data: &[u8]) -> bool {
    data.len() >= 14 && data.starts_with(b"RIFF") && &data[8..14] == b"WEBPVP"
}

fn is_wav(data: &[u8]) -> bool {
    data.len() >= 12 && data.starts_with(b"RIFF") && &data[8..12] == b"WAVE"
}

fn is_binary_byte(b: u8) -> bool {
    matches!(b, 0x00..=0x08 | 0x0B | 0x0E..=0x1A | 0x1C..=0x1F)
}
