//! Protocol version record and the compatibility gate.
//!
//! Wire layout: three little-endian `u32` fields, `[major][minor][patch]`,
//! 12 bytes total.

use bytes::Buf;
use serde::{Deserialize, Serialize};

use crate::wire::FramingError;

/// Encoded size of a [`Version`] in bytes.
pub const VERSION_SIZE: usize = 12;

/// The protocol version this crate is built against.
pub const SUPPORTED_VERSION: Version = Version::new(1, 0, 0);

/// A `major.minor.patch` protocol version.
///
/// Fields are private so a decoded version cannot be altered afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Version {
    major: u32,
    minor: u32,
    patch: u32,
}

impl Version {
    /// Create a version from literal fields.
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Major component.
    pub const fn major(&self) -> u32 {
        self.major
    }

    /// Minor component.
    pub const fn minor(&self) -> u32 {
        self.minor
    }

    /// Patch component.
    pub const fn patch(&self) -> u32 {
        self.patch
    }

    /// Decode a version from the front of `buf`, consuming exactly
    /// [`VERSION_SIZE`] bytes.
    ///
    /// # Errors
    ///
    /// Returns `TruncatedInput` (and consumes nothing) if fewer than
    /// [`VERSION_SIZE`] bytes remain.
    ///
    /// # Examples
    ///
    /// ```
    /// use scramjet::Version;
    ///
    /// let mut buf = &[1, 0, 0, 0, 2, 0, 0, 0, 3, 0, 0, 0, 0xFF][..];
    /// let version = Version::decode(&mut buf).expect("decode");
    /// assert_eq!(version, Version::new(1, 2, 3));
    /// assert_eq!(buf, &[0xFF]);
    /// ```
    pub fn decode<B: Buf>(buf: &mut B) -> Result<Self, FramingError> {
        if buf.remaining() < VERSION_SIZE {
            return Err(FramingError::TruncatedInput {
                needed: VERSION_SIZE,
                have: buf.remaining(),
            });
        }

        let major = buf.get_u32_le();
        let minor = buf.get_u32_le();
        let patch = buf.get_u32_le();
        Ok(Self::new(major, minor, patch))
    }

    /// Encode into the 12-byte little-endian wire representation.
    pub fn encode(&self) -> [u8; VERSION_SIZE] {
        let mut out = [0u8; VERSION_SIZE];
        out[0..4].copy_from_slice(&self.major.to_le_bytes());
        out[4..8].copy_from_slice(&self.minor.to_le_bytes());
        out[8..12].copy_from_slice(&self.patch.to_le_bytes());
        out
    }

    /// Whether a peer advertising `self` may talk to a local side that
    /// requires `required`. See [`is_compatible`].
    pub fn is_compatible_with(&self, required: &Version) -> bool {
        is_compatible(self, required)
    }
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Version gate applied to the peer's announcement.
///
/// - Major versions must match exactly.
/// - An older advertised minor is accepted, a newer one rejected.
/// - With equal minors, the advertised patch must not exceed the required one.
///
/// This is not a semver "compatible superset" check: a peer
/// newer than what we were built against is refused even within a major.
pub fn is_compatible(advertised: &Version, required: &Version) -> bool {
    if advertised.major != required.major {
        return false;
    }

    if advertised.minor > required.minor {
        return false;
    }

    if advertised.minor < required.minor {
        return true;
    }

    advertised.patch <= required.patch
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip() {
        let version = Version::new(0x0102_0304, 7, u32::MAX);
        let encoded = version.encode();
        let decoded = Version::decode(&mut &encoded[..]).expect("decode");
        assert_eq!(version, decoded);
    }

    #[test]
    fn test_field_order_little_endian() {
        let encoded = Version::new(1, 2, 0x0300).encode();
        assert_eq!(encoded, [1, 0, 0, 0, 2, 0, 0, 0, 0, 3, 0, 0]);
    }

    #[test]
    fn test_decode_truncated() {
        let short = [0u8; VERSION_SIZE - 1];
        let mut buf = &short[..];
        let result = Version::decode(&mut buf);
        assert_eq!(
            result,
            Err(FramingError::TruncatedInput {
                needed: VERSION_SIZE,
                have: VERSION_SIZE - 1
            })
        );
        assert_eq!(buf.len(), VERSION_SIZE - 1, "nothing consumed on failure");
    }

    #[test]
    fn test_compatible_with_itself() {
        for v in [
            Version::new(0, 0, 0),
            Version::new(1, 0, 0),
            Version::new(3, 9, 27),
        ] {
            assert!(is_compatible(&v, &v), "{} should accept itself", v);
        }
    }

    #[test]
    fn test_older_minor_accepted() {
        assert!(is_compatible(&Version::new(1, 0, 0), &Version::new(1, 5, 3)));
        // Patch is irrelevant when the minor is older.
        assert!(is_compatible(&Version::new(1, 4, 99), &Version::new(1, 5, 0)));
    }

    #[test]
    fn test_newer_minor_rejected() {
        assert!(!is_compatible(&Version::new(1, 5, 0), &Version::new(1, 0, 0)));
    }

    #[test]
    fn test_patch_boundary() {
        let required = Version::new(1, 2, 3);
        assert!(!is_compatible(&Version::new(1, 2, 5), &required));
        assert!(is_compatible(&Version::new(1, 2, 3), &required));
        assert!(is_compatible(&Version::new(1, 2, 2), &required));
    }

    #[test]
    fn test_major_mismatch() {
        assert!(!is_compatible(&Version::new(2, 0, 0), &Version::new(1, 0, 0)));
        assert!(!is_compatible(&Version::new(0, 0, 0), &Version::new(1, 0, 0)));
    }

    #[test]
    fn test_method_form_matches() {
        let advertised = Version::new(1, 0, 0);
        assert_eq!(
            advertised.is_compatible_with(&SUPPORTED_VERSION),
            is_compatible(&advertised, &SUPPORTED_VERSION)
        );
    }

    #[test]
    fn test_serde_roundtrip() {
        let version = Version::new(1, 4, 2);
        let json = serde_json::to_string(&version).expect("serialize");
        assert_eq!(json, r#"{"major":1,"minor":4,"patch":2}"#);
        let decoded: Version = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(version, decoded);
    }

    #[test]
    fn test_display() {
        assert_eq!(Version::new(1, 12, 0).to_string(), "1.12.0");
    }
}
