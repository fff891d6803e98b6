//! Core SID grammar shared by `win-sddl` and its `sid!` macro.
//!
//! This crate is `no_std`: it only knows how to split a textual SID into
//! its numeric components and which aliases stand for which
//! well-known SIDs. The owning model types live in `win-sddl`.
#![cfg_attr(not(feature = "std"), no_std)]

pub mod well_known;

use core::str::FromStr;

use arrayvec::ArrayVec;
use thiserror::Error;

/// The only SID revision in use.
pub const SID_REVISION: u8 = 1;

/// Maximum number of sub-authorities a SID may carry.
pub const MAX_SUBAUTHORITY_COUNT: u8 = 15;

/// Exclusive upper bound of the 48-bit identifier authority.
pub const IDENTIFIER_AUTHORITY_LIMIT: u64 = 1 << 48;

/// Errors raised while decoding or encoding a SID, in any representation.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum SidError {
    /// Empty input, missing `S-` prefix or missing revision/authority.
    #[error("invalid SID format")]
    InvalidSidFormat,
    /// The binary form is shorter than the layout it declares.
    #[error("invalid SID format: need {needed} bytes, got {available}")]
    Truncated {
        /// Bytes required by the header and the declared sub-authority count.
        needed: usize,
        /// Bytes actually available.
        available: usize,
    },
    /// The revision is not a number or is not 1.
    #[error("invalid SID revision")]
    InvalidRevision,
    /// The identifier authority is not a number or does not fit in 48 bits.
    #[error("invalid authority value")]
    InvalidAuthority,
    /// More than 15 sub-authorities.
    #[error("too many sub-authorities: got {0}, maximum is 15")]
    TooManySubAuthorities(usize),
    /// A sub-authority is not a decimal 32-bit value.
    #[error("invalid sub-authority value at position {0}")]
    InvalidSubAuthority(usize),
}

/// Numeric components of a textual SID.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SidComponents {
    /// The SID revision value, always 1 once parsed.
    pub revision: u8,
    /// The 48-bit identifier authority.
    pub identifier_authority: u64,
    /// The SID sub-authority values.
    pub sub_authority: ArrayVec<u32, { MAX_SUBAUTHORITY_COUNT as usize }>,
}

fn parse_digits(s: &str, radix: u32) -> Option<u64> {
    if s.is_empty() || !s.chars().all(|c| c.is_digit(radix)) {
        return None;
    }
    u64::from_str_radix(s, radix).ok()
}

fn parse_authority(s: &str) -> Result<u64, SidError> {
    let value = match s.get(..2) {
        Some(prefix) if prefix.eq_ignore_ascii_case("0x") => {
            s.get(2..).and_then(|hex| parse_digits(hex, 16))
        }
        _ => parse_digits(s, 10),
    }
    .ok_or(SidError::InvalidAuthority)?;
    if value >= IDENTIFIER_AUTHORITY_LIMIT {
        return Err(SidError::InvalidAuthority);
    }
    Ok(value)
}

impl FromStr for SidComponents {
    type Err = SidError;

    /// Parses `S-<revision>-<authority>[-<sub>]*`, or a registered alias such as `SY`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = well_known::sid_for_alias(s).unwrap_or(s);
        let body = s.strip_prefix("S-").ok_or(SidError::InvalidSidFormat)?;
        let mut s_cmp = body.split('-');
        let (Some(revision), Some(authority)) = (s_cmp.next(), s_cmp.next()) else {
            return Err(SidError::InvalidSidFormat);
        };

        if parse_digits(revision, 10) != Some(u64::from(SID_REVISION)) {
            return Err(SidError::InvalidRevision);
        }
        let identifier_authority = parse_authority(authority)?;

        let count = s_cmp.clone().count();
        if count > MAX_SUBAUTHORITY_COUNT as usize {
            return Err(SidError::TooManySubAuthorities(count));
        }
        let mut sub_authority = ArrayVec::new();
        for (position, item) in s_cmp.enumerate() {
            let item = parse_digits(item, 10)
                .and_then(|v| u32::try_from(v).ok())
                .ok_or(SidError::InvalidSubAuthority(position))?;
            sub_authority
                .try_push(item)
                .map_err(|_| SidError::TooManySubAuthorities(count))?;
        }

        Ok(Self {
            revision: SID_REVISION,
            identifier_authority,
            sub_authority,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, reason = "Unwrap is not an issue in test")]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn parses_canonical_form() {
        let c: SidComponents = "S-1-5-32-544".parse().unwrap();
        assert_eq!(c.revision, 1);
        assert_eq!(c.identifier_authority, 5);
        assert_eq!(c.sub_authority.as_slice(), &[32, 544]);
    }

    #[test]
    fn parses_alias() {
        let alias: SidComponents = "SY".parse().unwrap();
        let canonical: SidComponents = "S-1-5-18".parse().unwrap();
        assert_eq!(alias, canonical);
    }

    #[test]
    fn parses_hex_authority() {
        let c: SidComponents = "S-1-0xFFFFFFFFFFFF-1".parse().unwrap();
        assert_eq!(c.identifier_authority, 0xFFFF_FFFF_FFFF);
        let c: SidComponents = "S-1-0X10-1".parse().unwrap();
        assert_eq!(c.identifier_authority, 16);
    }

    #[test]
    fn accepts_no_sub_authorities() {
        let c: SidComponents = "S-1-5".parse().unwrap();
        assert!(c.sub_authority.is_empty());
    }

    #[test]
    fn rejects_malformed() {
        assert_eq!("".parse::<SidComponents>(), Err(SidError::InvalidSidFormat));
        assert_eq!("X-1-5-18".parse::<SidComponents>(), Err(SidError::InvalidSidFormat));
        assert_eq!("S-1".parse::<SidComponents>(), Err(SidError::InvalidSidFormat));
        assert_eq!("S-2-5-18".parse::<SidComponents>(), Err(SidError::InvalidRevision));
        assert_eq!("S-x-5-18".parse::<SidComponents>(), Err(SidError::InvalidRevision));
        assert_eq!("S-1-+5-18".parse::<SidComponents>(), Err(SidError::InvalidAuthority));
        assert_eq!(
            "S-1-0x1000000000000-1".parse::<SidComponents>(),
            Err(SidError::InvalidAuthority)
        );
        assert_eq!(
            "S-1-281474976710656-1".parse::<SidComponents>(),
            Err(SidError::InvalidAuthority)
        );
        assert_eq!(
            "S-1-5-abc".parse::<SidComponents>(),
            Err(SidError::InvalidSubAuthority(0))
        );
        assert_eq!(
            "S-1-5-18-4294967296".parse::<SidComponents>(),
            Err(SidError::InvalidSubAuthority(1))
        );
    }

    #[test]
    fn rejects_sixteen_sub_authorities() {
        assert_eq!(
            "S-1-5-21-1-2-3-4-5-6-7-8-9-10-11-12-13-14-15".parse::<SidComponents>(),
            Err(SidError::TooManySubAuthorities(16))
        );
    }

    #[test]
    fn accepts_fifteen_sub_authorities() {
        let parsed: SidComponents = "S-1-5-21-1-2-3-4-5-6-7-8-9-10-11-12-13-14".parse().unwrap();
        assert_eq!(parsed.sub_authority.len(), 15);
        assert_eq!(parsed.sub_authority[14], 14);
    }

    proptest! {
        #[test]
        fn decimal_components_parse(authority in 0u64..IDENTIFIER_AUTHORITY_LIMIT, subs in proptest::collection::vec(any::<u32>(), 0..=15)) {
            use std::fmt::Write as _;
            let mut text = std::format!("S-1-{authority}");
            for sub in &subs {
                write!(text, "-{sub}").unwrap();
            }
            let parsed: SidComponents = text.parse().unwrap();
            prop_assert_eq!(parsed.identifier_authority, authority);
            prop_assert_eq!(parsed.sub_authority.as_slice(), subs.as_slice());
        }
    }
}
