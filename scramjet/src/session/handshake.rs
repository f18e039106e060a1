//! Version announcement check applied to the first frame.

use crate::error::VersionError;
use crate::version::{VERSION_SIZE, Version, is_compatible};
use crate::wire::{Frame, MessageType};

/// Validate the peer's first frame and return its announced version.
///
/// Checks, in order: the type tag is `ApiVersion`, the body is exactly
/// [`VERSION_SIZE`] bytes, and the announced version passes
/// [`is_compatible`] against `required`.
pub fn verify_version_announcement(
    frame: &Frame,
    required: &Version,
) -> Result<Version, VersionError> {
    if frame.kind() != Some(MessageType::ApiVersion) {
        return Err(VersionError::UnsupportedType {
            tag: frame.message_type(),
        });
    }

    let body = frame.body();
    if body.len() != VERSION_SIZE {
        return Err(VersionError::WrongSize {
            expected: VERSION_SIZE,
            actual: body.len(),
        });
    }

    let advertised = Version::decode(&mut &body[..]).map_err(|_| VersionError::WrongSize {
        expected: VERSION_SIZE,
        actual: body.len(),
    })?;

    if !is_compatible(&advertised, required) {
        return Err(VersionError::Incompatible {
            advertised,
            required: *required,
        });
    }

    Ok(advertised)
}
