//! Decoding of reqwest responses into [`ResponseFields`].

use cloudfiles_core::headers::decode_header;
use cloudfiles_core::ResponseFields;
use reqwest::StatusCode;
use reqwest::header::HeaderMap;

/// Decodes the status and headers of a response.
///
/// Header names arrive lowercased from the HTTP stack. They are restored to
/// the title case the service uses, so `x-object-meta-author` yields the
/// metadata key `Author`.
pub fn decode_response(response: &reqwest::Response) -> ResponseFields {
    decode_parts(response.status(), response.headers())
}

pub(crate) fn decode_parts(status: StatusCode, headers: &HeaderMap) -> ResponseFields {
    let mut fields = ResponseFields::with_status(
        status.as_u16(),
        status.canonical_reason().unwrap_or_default(),
    );

    for (name, value) in headers {
        let value = String::from_utf8_lossy(value.as_bytes());
        decode_header(&mut fields, &title_case(name.as_str()), &value);
    }

    fields
}

/// Upper-cases every letter that follows a non-letter, lower-cases the rest.
fn title_case(name: &str) -> String {
    let mut after_letter = false;
    name.chars()
        .map(|c| {
            let mapped = if after_letter {
                c.to_ascii_lowercase()
            } else {
                c.to_ascii_uppercase()
            };
            after_letter = c.is_ascii_alphabetic();
            mapped
        })
        .collect()
}
