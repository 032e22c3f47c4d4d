//! Header codec.
//!
//! Maps the service's header vocabulary onto [`ResponseFields`] and renders
//! object metadata back into request headers. Decoding works on raw header
//! lines (including the `HTTP/1.x <code> <reason>` status line) as well as on
//! already split name/value pairs.

mod fields;

pub use fields::ResponseFields;

use crate::{Metadata, Result, TRACING_TARGET_HEADERS};

pub const ACCOUNT_CONTAINER_COUNT: &str = "X-Account-Container-Count";
pub const ACCOUNT_BYTES_USED: &str = "X-Account-Bytes-Used";
pub const CONTAINER_OBJECT_COUNT: &str = "X-Container-Object-Count";
pub const CONTAINER_BYTES_USED: &str = "X-Container-Bytes-Used";
pub const OBJECT_META_PREFIX: &str = "X-Object-Meta-";

pub const CDN_URI: &str = "X-CDN-URI";
pub const CDN_ENABLED: &str = "X-CDN-Enabled";
pub const CDN_LOG_RETENTION: &str = "X-Log-Retention";
pub const CDN_ACL_USER_AGENT: &str = "X-User-Agent-ACL";
pub const CDN_ACL_REFERRER: &str = "X-Referrer-ACL";
pub const CDN_TTL: &str = "X-TTL";

pub const AUTH_USER: &str = "X-Auth-User";
pub const AUTH_KEY: &str = "X-Auth-Key";
pub const AUTH_TOKEN: &str = "X-Auth-Token";
pub const STORAGE_USER: &str = "X-Storage-User";
pub const STORAGE_PASS: &str = "X-Storage-Pass";
pub const STORAGE_TOKEN: &str = "X-Storage-Token";
pub const STORAGE_URL: &str = "X-Storage-Url";
pub const CDN_MANAGEMENT_URL: &str = "X-CDN-Management-Url";

pub const ETAG: &str = "ETag";
pub const LAST_MODIFIED: &str = "Last-Modified";
pub const CONTENT_TYPE: &str = "Content-Type";
pub const CONTENT_LENGTH: &str = "Content-Length";
pub const USER_AGENT: &str = "User-Agent";

/// Decodes one raw response header line.
///
/// Status lines overwrite any previously decoded status, so after a redirect
/// the fields describe the last response. Lines that are neither a status
/// line nor `name: value` are ignored.
pub fn decode_line(fields: &mut ResponseFields, line: &str) {
    let line = line.trim_end_matches(['\r', '\n']);

    if let Some((status, reason)) = parse_status_line(line) {
        fields.status = status;
        fields.reason = reason.to_owned();
        return;
    }

    if let Some((name, value)) = line.split_once(':') {
        decode_header(fields, name.trim(), value);
    }
}

/// Decodes one header given as a name and a value.
///
/// Names are matched case-insensitively; unknown names are ignored.
pub fn decode_header(fields: &mut ResponseFields, name: &str, value: &str) {
    let value = value.trim();

    if let Some(key) = strip_prefix_ignore_case(name, OBJECT_META_PREFIX) {
        fields.metadata.insert(key.to_owned(), value.to_owned());
        return;
    }

    match name.to_ascii_lowercase().as_str() {
        "x-account-container-count" => fields.account_container_count = parse_count(value),
        "x-account-bytes-used" => fields.account_bytes_used = parse_count(value),
        "x-container-object-count" => fields.container_object_count = parse_count(value),
        "x-container-bytes-used" => fields.container_bytes_used = parse_count(value),
        "x-cdn-uri" => fields.cdn_uri = Some(value.to_owned()),
        "x-cdn-enabled" => fields.cdn_enabled = parse_flag(value),
        "x-log-retention" => fields.cdn_log_retention = parse_flag(value),
        "x-user-agent-acl" => fields.cdn_acl_user_agent = Some(value.to_owned()),
        "x-referrer-acl" => fields.cdn_acl_referrer = Some(value.to_owned()),
        "x-ttl" => fields.cdn_ttl = parse_count(value),
        "x-storage-url" => fields.storage_url = Some(value.to_owned()),
        "x-cdn-management-url" => fields.cdn_management_url = Some(value.to_owned()),
        "x-auth-token" | "x-storage-token" => fields.auth_token = Some(value.to_owned()),
        "etag" => fields.etag = Some(value.to_owned()),
        "last-modified" => fields.last_modified = Some(value.to_owned()),
        "content-type" => fields.content_type = Some(value.to_owned()),
        "content-length" => fields.content_length = Some(parse_count(value)),
        _ => {}
    }
}

/// Decodes a complete header block, one line at a time.
pub fn decode_block(block: &str) -> ResponseFields {
    let mut fields = ResponseFields::new();
    for line in block.lines() {
        decode_line(&mut fields, line);
    }
    fields
}

/// Renders metadata as `X-Object-Meta-<key>` request headers.
///
/// Keys and values are trimmed. Fails with a syntax error when any entry
/// breaks the service limits.
pub fn encode_metadata(metadata: &Metadata) -> Result<Vec<(String, String)>> {
    metadata.validate()?;

    let headers = metadata
        .iter()
        .map(|(key, value)| {
            (
                format!("{OBJECT_META_PREFIX}{}", key.trim()),
                value.trim().to_owned(),
            )
        })
        .collect();

    Ok(headers)
}

/// Renders a boolean the way the service expects it.
#[inline]
pub fn encode_flag(value: bool) -> &'static str {
    if value { "True" } else { "False" }
}

/// Parses the leading run of ASCII digits; anything else yields 0.
pub fn parse_count(value: &str) -> u64 {
    let value = value.trim();
    let end = value
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(value.len());

    match value[..end].parse() {
        Ok(n) => n,
        Err(_) => {
            if !value.is_empty() {
                tracing::trace!(
                    target: TRACING_TARGET_HEADERS,
                    value = %value,
                    "Non-numeric header value decoded as zero"
                );
            }
            0
        }
    }
}

/// Parses a `True`/`False` header value.
#[inline]
pub fn parse_flag(value: &str) -> bool {
    value.trim().eq_ignore_ascii_case("true")
}

fn parse_status_line(line: &str) -> Option<(u16, &str)> {
    let rest = line.strip_prefix("HTTP/1.")?;
    let (_minor, rest) = rest.split_once(' ')?;
    let rest = rest.trim_start();
    let (code, reason) = rest.split_once(' ').unwrap_or((rest, ""));

    if code.len() != 3 {
        return None;
    }
    let status = code.parse().ok()?;
    Some((status, reason.trim()))
}

fn strip_prefix_ignore_case<'a>(value: &'a str, prefix: &str) -> Option<&'a str> {
    let head = value.get(..prefix.len())?;
    head.eq_ignore_ascii_case(prefix)
        .then(|| &value[prefix.len()..])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_line() {
        let mut fields = ResponseFields::new();
        decode_line(&mut fields, "HTTP/1.1 201 Created\r\n");
        assert_eq!(fields.status, 201);
        assert_eq!(fields.reason, "Created");
    }

    #[test]
    fn test_last_status_line_wins() {
        let fields = decode_block(
            "HTTP/1.1 301 Moved Permanently\r\n\
             Location: https://elsewhere\r\n\
             \r\n\
             HTTP/1.0 204 No Content\r\n",
        );
        assert_eq!(fields.status, 204);
        assert_eq!(fields.reason, "No Content");
    }

    #[test]
    fn test_case_insensitive_names() {
        let fields = decode_block(
            "x-account-container-count: 12\r\n\
             X-ACCOUNT-BYTES-USED: 4096\r\n\
             etag: abc\r\n\
             content-length: 1024\r\n",
        );
        assert_eq!(fields.account_container_count, 12);
        assert_eq!(fields.account_bytes_used, 4096);
        assert_eq!(fields.etag.as_deref(), Some("abc"));
        assert_eq!(fields.content_length, Some(1024));
    }

    #[test]
    fn test_malformed_numbers_decode_as_zero() {
        let fields = decode_block(
            "X-Container-Object-Count: lots\r\n\
             X-Container-Bytes-Used: 42abc\r\n\
             X-TTL: \r\n",
        );
        assert_eq!(fields.container_object_count, 0);
        assert_eq!(fields.container_bytes_used, 42);
        assert_eq!(fields.cdn_ttl, 0);
    }

    #[test]
    fn test_cdn_headers() {
        let fields = decode_block(
            "X-CDN-Enabled: True\r\n\
             X-CDN-URI: http://c0.cdn.example\r\n\
             X-TTL: 86400\r\n\
             X-Log-Retention: False\r\n\
             X-User-Agent-ACL: Mozilla\r\n\
             X-Referrer-ACL: http://example.com\r\n",
        );
        assert!(fields.cdn_enabled);
        assert_eq!(fields.cdn_uri.as_deref(), Some("http://c0.cdn.example"));
        assert_eq!(fields.cdn_ttl, 86400);
        assert!(!fields.cdn_log_retention);
        assert_eq!(fields.cdn_acl_user_agent.as_deref(), Some("Mozilla"));
        assert_eq!(fields.cdn_acl_referrer.as_deref(), Some("http://example.com"));
    }

    #[test]
    fn test_auth_headers_and_legacy_token() {
        let fields = decode_block(
            "X-Storage-Url: https://storage.example/v1/acct\r\n\
             X-CDN-Management-Url: https://cdn.example/v1/acct\r\n\
             X-Storage-Token: legacy-token\r\n",
        );
        assert_eq!(
            fields.storage_url.as_deref(),
            Some("https://storage.example/v1/acct")
        );
        assert_eq!(fields.auth_token.as_deref(), Some("legacy-token"));
    }

    #[test]
    fn test_metadata_round_trip() {
        let metadata = Metadata::new().with("Author", "EJ");
        let headers = encode_metadata(&metadata).unwrap();
        assert_eq!(
            headers,
            vec![("X-Object-Meta-Author".to_owned(), "EJ".to_owned())]
        );

        let mut fields = ResponseFields::new();
        for (name, value) in &headers {
            decode_line(&mut fields, &format!("{name}: {value}\r\n"));
        }
        assert_eq!(fields.metadata, metadata);
    }

    #[test]
    fn test_metadata_value_keeps_inner_colons() {
        let fields = decode_block("X-Object-Meta-Link: http://example.com:8080/\r\n");
        assert_eq!(
            fields.metadata.get("Link").map(String::as_str),
            Some("http://example.com:8080/")
        );
    }

    #[test]
    fn test_metadata_last_write_wins() {
        let fields = decode_block("X-Object-Meta-Tag: one\r\nx-object-meta-Tag: two\r\n");
        assert_eq!(fields.metadata.len(), 1);
        assert_eq!(fields.metadata.get("Tag").map(String::as_str), Some("two"));
    }

    #[test]
    fn test_encode_rejects_invalid_metadata() {
        let metadata = Metadata::new().with("a:b", "c");
        assert!(encode_metadata(&metadata).unwrap_err().is_syntax());
    }

    #[test]
    fn test_unknown_and_garbage_lines_ignored() {
        let fields = decode_block("Server: swift\r\nnot a header\r\nHTTP/2 200\r\n");
        assert_eq!(fields, ResponseFields::new());
    }

    #[test]
    fn test_flags() {
        assert!(parse_flag("True"));
        assert!(parse_flag("true"));
        assert!(!parse_flag("False"));
        assert!(!parse_flag("yes"));
        assert_eq!(encode_flag(true), "True");
        assert_eq!(encode_flag(false), "False");
    }
}
