use bytes::Bytes;
use cloudfiles_core::{Error, ResponseFields};

/// Maps a status that no operation table accepts.
pub(crate) fn unexpected(fields: &ResponseFields) -> Error {
    match fields.status {
        401 => Error::Authentication(format!("Request rejected: {}", fields.reason)),
        _ => fields.invalid_response(),
    }
}

/// Maps the status of a listing request: 200 carries a body, 204 is empty.
pub(crate) fn listing(
    fields: &ResponseFields,
    body: Bytes,
    not_found: Option<&str>,
) -> Result<Bytes, Error> {
    match (fields.status, not_found) {
        (200, _) => Ok(body),
        (204, _) => Ok(Bytes::new()),
        (404, Some(what)) => Err(Error::NotFound(what.to_owned())),
        _ => Err(unexpected(fields)),
    }
}
