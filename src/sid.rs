//! Owned Windows Security Identifier and its binary and SDDL codecs.
//!
//! Binary layout (self-relative form):
//!
//! | offset | size      | field                               |
//! |--------|-----------|-------------------------------------|
//! | 0      | 1         | revision (always 1)                 |
//! | 1      | 1         | sub-authority count (0..=15)        |
//! | 2      | 6         | identifier authority, big-endian    |
//! | 8      | 4 × count | sub-authorities, each little-endian |

use core::fmt::{self, Debug, Display};
use core::str::FromStr;

use parsing::{MAX_SUBAUTHORITY_COUNT, SID_REVISION, SidComponents, SidError, well_known};

use crate::SidIdentifierAuthority;
use crate::utils::{read_u8, read_u32_le};

/// Size of the fixed part of a binary SID.
pub const SID_HEADER_SIZE: usize = 8;

/// A Windows Security Identifier.
///
/// Fields are public so that values can be assembled by hand; every
/// encoder re-checks the invariants (revision 1, at most 15
/// sub-authorities, 48-bit authority) instead of truncating.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Sid {
    /// The SID revision value, 1 for every valid SID.
    pub revision: u8,
    /// The SID identifier authority value.
    pub identifier_authority: SidIdentifierAuthority,
    /// The SID sub-authority values.
    pub sub_authority: Vec<u32>,
}

impl Sid {
    /// Builds a revision 1 SID, validating its invariants.
    ///
    /// # Errors
    /// [`SidError::TooManySubAuthorities`] for more than 15 sub-authorities,
    /// [`SidError::InvalidAuthority`] when the authority does not fit in 48 bits.
    ///
    /// # Examples
    /// ```rust
    /// use win_sddl::{Sid, SidIdentifierAuthority};
    ///
    /// let sid = Sid::try_new(SidIdentifierAuthority::NT_AUTHORITY, [32, 544]).unwrap();
    /// assert_eq!(sid.to_string(), "S-1-5-32-544");
    /// assert_eq!(sid.to_sddl().unwrap(), "BA");
    /// ```
    #[inline]
    pub fn try_new(
        identifier_authority: SidIdentifierAuthority,
        sub_authority: impl IntoIterator<Item = u32>,
    ) -> Result<Self, SidError> {
        let sid = Self {
            revision: SID_REVISION,
            identifier_authority,
            sub_authority: sub_authority.into_iter().collect(),
        };
        sid.validate()?;
        Ok(sid)
    }

    /// Number of sub-authorities.
    #[inline]
    #[must_use]
    pub fn sub_authority_count(&self) -> usize {
        self.sub_authority.len()
    }

    /// Length of the binary encoding: `8 + 4 * count`.
    #[inline]
    #[must_use]
    pub fn binary_len(&self) -> usize {
        SID_HEADER_SIZE + 4 * self.sub_authority.len()
    }

    /// Checks the invariants shared by every encoder.
    ///
    /// # Errors
    /// The first violated invariant.
    #[inline]
    pub fn validate(&self) -> Result<(), SidError> {
        if self.revision != SID_REVISION {
            return Err(SidError::InvalidRevision);
        }
        if self.sub_authority.len() > MAX_SUBAUTHORITY_COUNT as usize {
            return Err(SidError::TooManySubAuthorities(self.sub_authority.len()));
        }
        if !self.identifier_authority.is_valid() {
            return Err(SidError::InvalidAuthority);
        }
        Ok(())
    }

    /// Decodes a binary SID from the start of `bytes`.
    ///
    /// Trailing bytes past `8 + 4 * count` are ignored, so the SID can be
    /// read in place inside a larger structure.
    ///
    /// # Errors
    /// - [`SidError::Truncated`] if the buffer is shorter than the layout it declares.
    /// - [`SidError::InvalidRevision`] if the revision is not 1.
    /// - [`SidError::TooManySubAuthorities`] if the count byte exceeds 15.
    ///
    /// # Examples
    /// ```rust
    /// use win_sddl::Sid;
    ///
    /// let bytes = [1, 1, 0, 0, 0, 0, 0, 5, 18, 0, 0, 0];
    /// let sid = Sid::from_bytes(&bytes).unwrap();
    /// assert_eq!(sid.to_sddl().unwrap(), "SY");
    /// ```
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SidError> {
        let (Some(revision), Some(count), Some(authority)) = (
            read_u8(bytes, 0),
            read_u8(bytes, 1),
            bytes
                .get(2..SID_HEADER_SIZE)
                .and_then(|b| <[u8; 6]>::try_from(b).ok()),
        ) else {
            return Err(SidError::Truncated {
                needed: SID_HEADER_SIZE,
                available: bytes.len(),
            });
        };
        if revision != SID_REVISION {
            return Err(SidError::InvalidRevision);
        }
        if count > MAX_SUBAUTHORITY_COUNT {
            return Err(SidError::TooManySubAuthorities(count.into()));
        }
        let count = usize::from(count);
        let needed = SID_HEADER_SIZE + 4 * count;
        if bytes.len() < needed {
            return Err(SidError::Truncated {
                needed,
                available: bytes.len(),
            });
        }
        let sub_authority = (0..count)
            .map(|i| read_u32_le(bytes, SID_HEADER_SIZE + 4 * i))
            .collect::<Option<Vec<u32>>>()
            .ok_or(SidError::Truncated {
                needed,
                available: bytes.len(),
            })?;
        Ok(Self {
            revision,
            identifier_authority: SidIdentifierAuthority::from_be_bytes(authority),
            sub_authority,
        })
    }

    /// Appends the binary encoding to `out`.
    ///
    /// # Errors
    /// See [`Sid::validate`]. Nothing is written on error.
    pub fn write_bytes(&self, out: &mut Vec<u8>) -> Result<(), SidError> {
        self.validate()?;
        let authority = self.identifier_authority.to_be_bytes()?;
        let count = u8::try_from(self.sub_authority.len())
            .map_err(|_| SidError::TooManySubAuthorities(self.sub_authority.len()))?;
        out.reserve(self.binary_len());
        out.push(self.revision);
        out.push(count);
        out.extend_from_slice(&authority);
        for sub in &self.sub_authority {
            out.extend_from_slice(&sub.to_le_bytes());
        }
        Ok(())
    }

    /// Encodes the SID to its binary form.
    ///
    /// # Errors
    /// See [`Sid::validate`].
    #[inline]
    pub fn to_bytes(&self) -> Result<Vec<u8>, SidError> {
        let mut out = Vec::with_capacity(self.binary_len());
        self.write_bytes(&mut out)?;
        Ok(out)
    }

    /// The registered two-letter alias of this SID, if any.
    #[inline]
    #[must_use]
    pub fn alias(&self) -> Option<&'static str> {
        well_known::alias_for_sid(&self.to_string())
    }

    /// Renders the SDDL form: the registered alias when there is one,
    /// the canonical `S-1-...` string otherwise.
    ///
    /// # Errors
    /// See [`Sid::validate`].
    #[inline]
    pub fn to_sddl(&self) -> Result<String, SidError> {
        self.validate()?;
        Ok(self
            .alias()
            .map_or_else(|| self.to_string(), str::to_owned))
    }
}

impl From<SidComponents> for Sid {
    #[inline]
    fn from(value: SidComponents) -> Self {
        Self {
            revision: value.revision,
            identifier_authority: SidIdentifierAuthority::new(value.identifier_authority),
            sub_authority: value.sub_authority.to_vec(),
        }
    }
}

impl FromStr for Sid {
    type Err = SidError;

    /// Parses the canonical `S-1-...` form or a registered alias.
    ///
    /// # Examples
    /// ```rust
    /// use win_sddl::Sid;
    ///
    /// let alias: Sid = "SY".parse().unwrap();
    /// let canonical: Sid = "S-1-5-18".parse().unwrap();
    /// assert_eq!(alias, canonical);
    /// ```
    #[inline]
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<SidComponents>().map(Self::from)
    }
}

impl TryFrom<&[u8]> for Sid {
    type Error = SidError;

    #[inline]
    fn try_from(value: &[u8]) -> Result<Self, Self::Error> {
        Self::from_bytes(value)
    }
}

impl Display for Sid {
    /// Canonical `S-<revision>-<authority>[-<sub>]*` form, never an alias.
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "S-{}-{}", self.revision, self.identifier_authority)?;
        for sub in &self.sub_authority {
            write!(f, "-{sub}")?;
        }
        Ok(())
    }
}

impl Debug for Sid {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Sid").field(&format_args!("{self}")).finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, reason = "Unwrap is not an issue in test")]
pub(crate) mod test {
    use super::*;
    use crate::arb_identifier_authority;
    #[cfg(feature = "macro")]
    use crate::sid;
    use proptest::prelude::*;

    prop_compose! {
        pub fn arb_sid()
            (identifier_authority in arb_identifier_authority(),
             sub_authority in proptest::collection::vec(any::<u32>(), 0..=15))
            -> Sid {
            Sid { revision: SID_REVISION, identifier_authority, sub_authority }
        }
    }

    /// Mostly well-known SIDs so that the alias paths get exercised.
    pub fn arb_trustee() -> impl Strategy<Value = Sid> {
        prop_oneof![
            3 => proptest::sample::select(well_known::SID_ALIASES)
                .prop_map(|(canonical, _)| canonical.parse::<Sid>().unwrap()),
            1 => arb_sid(),
        ]
    }

    #[test]
    fn decodes_local_system() {
        let bytes = [0x01, 0x01, 0, 0, 0, 0, 0, 0x05, 0x12, 0, 0, 0];
        let sid = Sid::from_bytes(&bytes).unwrap();
        assert_eq!(sid.identifier_authority, SidIdentifierAuthority::NT_AUTHORITY);
        assert_eq!(sid.sub_authority, [18]);
        assert_eq!(sid.to_sddl().unwrap(), "SY");
        assert_eq!(sid.to_string(), "S-1-5-18");
        assert_eq!(sid.to_bytes().unwrap(), bytes);
    }

    #[test]
    fn decoder_ignores_trailing_bytes() {
        let bytes = [0x01, 0x00, 0, 0, 0, 0, 0, 0x01, 0xAA, 0xBB];
        let sid = Sid::from_bytes(&bytes).unwrap();
        assert!(sid.sub_authority.is_empty());
        assert_eq!(sid.binary_len(), 8);
    }

    #[test]
    fn decoder_rejects_truncation() {
        assert_eq!(
            Sid::from_bytes(&[0x01, 0x01, 0, 0]),
            Err(SidError::Truncated { needed: 8, available: 4 })
        );
        assert_eq!(
            Sid::from_bytes(&[0x01, 0x02, 0, 0, 0, 0, 0, 0x05, 0x20, 0, 0, 0]),
            Err(SidError::Truncated { needed: 16, available: 12 })
        );
    }

    #[test]
    fn decoder_rejects_bad_header() {
        assert_eq!(
            Sid::from_bytes(&[0x02, 0x00, 0, 0, 0, 0, 0, 0x05]),
            Err(SidError::InvalidRevision)
        );
        let mut bytes = vec![0x01, 0x10, 0, 0, 0, 0, 0, 0x05];
        bytes.resize(8 + 4 * 16, 0);
        assert_eq!(Sid::from_bytes(&bytes), Err(SidError::TooManySubAuthorities(16)));
    }

    #[test]
    fn encoders_enforce_bounds() {
        let too_long = Sid {
            revision: 1,
            identifier_authority: SidIdentifierAuthority::NT_AUTHORITY,
            sub_authority: (1..=16).collect(),
        };
        assert_eq!(too_long.to_bytes(), Err(SidError::TooManySubAuthorities(16)));
        assert_eq!(too_long.to_sddl(), Err(SidError::TooManySubAuthorities(16)));

        let too_wide = Sid {
            revision: 1,
            identifier_authority: SidIdentifierAuthority::new(1 << 48),
            sub_authority: vec![1],
        };
        assert_eq!(too_wide.to_bytes(), Err(SidError::InvalidAuthority));

        let bad_revision = Sid { revision: 2, ..too_wide };
        assert_eq!(bad_revision.to_sddl(), Err(SidError::InvalidRevision));

        assert_eq!(
            Sid::try_new(SidIdentifierAuthority::NT_AUTHORITY, 0..16),
            Err(SidError::TooManySubAuthorities(16))
        );
    }

    #[test]
    fn sixteen_sub_authorities_fail_to_parse() {
        assert_eq!(
            "S-1-5-21-1-2-3-4-5-6-7-8-9-10-11-12-13-14-15".parse::<Sid>(),
            Err(SidError::TooManySubAuthorities(16))
        );
    }

    #[test]
    fn fifteen_sub_authorities_are_accepted() {
        let text = "S-1-5-21-1-2-3-4-5-6-7-8-9-10-11-12-13-14";
        let sid: Sid = text.parse().unwrap();
        assert_eq!(sid.sub_authority.len(), 15);
        assert_eq!(sid.to_sddl().unwrap(), text);

        let bytes = sid.to_bytes().unwrap();
        assert_eq!(bytes.len(), SID_HEADER_SIZE + 4 * 15);
        assert_eq!(bytes[1], 15);
        assert_eq!(Sid::from_bytes(&bytes).unwrap(), sid);
    }

    #[test]
    fn wide_authority_renders_hex() {
        let sid: Sid = "S-1-0x100000000-7".parse().unwrap();
        assert_eq!(sid.to_sddl().unwrap(), "S-1-0x100000000-7");
        assert_eq!(sid.to_bytes().unwrap()[2..8], [0, 0x01, 0, 0, 0, 0]);

        let upper: Sid = "S-1-0XABCDEF012345-1".parse().unwrap();
        assert_eq!(upper.to_sddl().unwrap(), "S-1-0xabcdef012345-1");
    }

    #[test]
    fn every_alias_is_idempotent() {
        for (canonical, alias) in well_known::SID_ALIASES {
            let from_alias: Sid = alias.parse().unwrap();
            let from_canonical: Sid = canonical.parse().unwrap();
            assert_eq!(from_alias, from_canonical, "alias {alias}");
            assert_eq!(from_alias.to_sddl().unwrap(), *alias);
        }
    }

    #[test]
    fn null_sid_round_trips() {
        let null: Sid = "NULL".parse().unwrap();
        assert_eq!(null.identifier_authority, SidIdentifierAuthority::NULL_AUTHORITY);
        assert_eq!(null.sub_authority, [0]);
        assert_eq!(null.to_string(), "S-1-0-0");
        assert_eq!(null.to_sddl().unwrap(), "NULL");

        let bytes = null.to_bytes().unwrap();
        assert_eq!(bytes, [0x01, 0x01, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0]);
        assert_eq!(Sid::from_bytes(&bytes).unwrap().to_sddl().unwrap(), "NULL");
    }

    #[cfg(feature = "macro")]
    #[test]
    fn macro_matches_runtime_parse() {
        let admins = sid!("BA");
        assert_eq!(admins, "S-1-5-32-544".parse::<Sid>().unwrap());
        let domain_user = sid!("S-1-5-21-1004336348-1177238915-682003330-512");
        assert_eq!(domain_user.sub_authority_count(), 5);
    }

    proptest! {
        #[test]
        fn binary_round_trip(sid in arb_sid()) {
            let bytes = sid.to_bytes().unwrap();
            prop_assert_eq!(bytes.len(), sid.binary_len());
            prop_assert_eq!(Sid::from_bytes(&bytes).unwrap(), sid);
        }

        #[test]
        fn string_round_trip(sid in arb_trustee()) {
            let text = sid.to_sddl().unwrap();
            prop_assert_eq!(text.parse::<Sid>().unwrap(), sid);
        }
    }
}
