use core::fmt::{self, Display};

use parsing::{IDENTIFIER_AUTHORITY_LIMIT, SidError};

/// The 48-bit identifier authority of a SID.
///
/// Stored widened to `u64` so that values built by hand can be checked
/// against the 48-bit limit instead of being silently truncated.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SidIdentifierAuthority {
    /// The authority value, valid below 2^48.
    pub value: u64,
}

impl SidIdentifierAuthority {
    /// `S-1-0`
    pub const NULL_AUTHORITY: Self = Self::new(0);
    /// `S-1-1`
    pub const SECURITY_WORLD_AUTHORITY: Self = Self::new(1);
    /// `S-1-2`
    pub const SECURITY_LOCAL_AUTHORITY: Self = Self::new(2);
    /// `S-1-3`
    pub const SECURITY_CREATOR_AUTHORITY: Self = Self::new(3);
    /// `S-1-5`
    pub const NT_AUTHORITY: Self = Self::new(5);
    /// `S-1-15`
    pub const SECURITY_APP_PACKAGE_AUTHORITY: Self = Self::new(15);
    /// `S-1-16`
    pub const SECURITY_MANDATORY_LABEL_AUTHORITY: Self = Self::new(16);

    /// Wraps a raw value without checking the 48-bit limit.
    #[inline]
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self { value }
    }

    /// Whether the value fits the 6-byte wire field.
    #[inline]
    #[must_use]
    pub const fn is_valid(self) -> bool {
        self.value < IDENTIFIER_AUTHORITY_LIMIT
    }

    /// Decodes the big-endian wire field.
    #[inline]
    #[must_use]
    pub fn from_be_bytes(bytes: [u8; 6]) -> Self {
        let mut be_bytes = [0u8; 8];
        be_bytes[2..].copy_from_slice(&bytes);
        Self::new(u64::from_be_bytes(be_bytes))
    }

    /// Encodes the big-endian wire field.
    ///
    /// # Errors
    /// [`SidError::InvalidAuthority`] when the value does not fit in 48 bits.
    #[inline]
    pub fn to_be_bytes(self) -> Result<[u8; 6], SidError> {
        if !self.is_valid() {
            return Err(SidError::InvalidAuthority);
        }
        let [_, _, rest @ ..] = self.value.to_be_bytes();
        Ok(rest)
    }
}

impl From<u64> for SidIdentifierAuthority {
    #[inline]
    fn from(value: u64) -> Self {
        Self::new(value)
    }
}

impl From<[u8; 6]> for SidIdentifierAuthority {
    #[inline]
    fn from(value: [u8; 6]) -> Self {
        Self::from_be_bytes(value)
    }
}

impl Display for SidIdentifierAuthority {
    /// Decimal when the value fits in 32 bits, `0x`-prefixed hex otherwise.
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.value <= u64::from(u32::MAX) {
            write!(f, "{}", self.value)
        } else {
            write!(f, "0x{:x}", self.value)
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, reason = "Unwrap is not an issue in test")]
pub(crate) mod test {
    use super::*;
    use proptest::prelude::*;

    prop_compose! {
        pub fn arb_identifier_authority()
            (value in prop_oneof![0u64..=16, 0u64..IDENTIFIER_AUTHORITY_LIMIT])
            -> SidIdentifierAuthority {
            SidIdentifierAuthority::new(value)
        }
    }

    #[test]
    fn wire_bytes_are_big_endian() {
        let bytes = SidIdentifierAuthority::NT_AUTHORITY.to_be_bytes().unwrap();
        assert_eq!(bytes, [0, 0, 0, 0, 0, 5]);
        let wide = SidIdentifierAuthority::from_be_bytes([0x12, 0x34, 0x56, 0x78, 0x9A, 0xBC]);
        assert_eq!(wide.value, 0x1234_5678_9ABC);
    }

    #[test]
    fn rejects_values_beyond_48_bits() {
        let too_wide = SidIdentifierAuthority::new(IDENTIFIER_AUTHORITY_LIMIT);
        assert!(!too_wide.is_valid());
        assert_eq!(too_wide.to_be_bytes(), Err(SidError::InvalidAuthority));
    }

    #[test]
    fn display_switches_to_hex_above_u32() {
        assert_eq!(SidIdentifierAuthority::new(5).to_string(), "5");
        assert_eq!(
            SidIdentifierAuthority::new(u64::from(u32::MAX)).to_string(),
            "4294967295"
        );
        assert_eq!(
            SidIdentifierAuthority::new(0x1_0000_0000).to_string(),
            "0x100000000"
        );
        assert_eq!(
            SidIdentifierAuthority::new(0x1234_5678_9ABC).to_string(),
            "0x123456789abc"
        );
    }

    proptest! {
        #[test]
        fn be_bytes_round_trip(authority in arb_identifier_authority()) {
            let bytes = authority.to_be_bytes().unwrap();
            prop_assert_eq!(SidIdentifierAuthority::from_be_bytes(bytes), authority);
        }
    }
}
