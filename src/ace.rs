//! Access Control Entries in the standard layout: header, mask, trustee.
//!
//! Object ACEs carrying GUIDs are not modelled; their two SDDL fields are
//! accepted and ignored on input and always rendered empty.

use core::fmt::{self, Display};
use core::str::FromStr;

use bitflags::bitflags;

use crate::Sid;
use crate::error::AceError;
use crate::utils::{read_u8, read_u16_le, read_u32_le};
use crate::well_known;

/// Size of header plus access mask.
pub const ACE_FIXED_SIZE: usize = 8;

/// Smallest encoded ACE: fixed part plus a SID without sub-authorities.
pub const ACE_MIN_SIZE: usize = 16;

/// The `AceType` header byte.
///
/// Open newtype: any byte value decodes, the named constants are the ones
/// with an SDDL alias.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AceType(pub u8);

impl AceType {
    /// `A`
    pub const ACCESS_ALLOWED: Self = Self(0x00);
    /// `D`
    pub const ACCESS_DENIED: Self = Self(0x01);
    /// `AU`
    pub const SYSTEM_AUDIT: Self = Self(0x02);
    /// `AL`
    pub const SYSTEM_ALARM: Self = Self(0x03);
    /// `OA`
    pub const ACCESS_ALLOWED_OBJECT: Self = Self(0x05);

    const ALIASES: [(Self, &'static str); 5] = [
        (Self::ACCESS_ALLOWED, "A"),
        (Self::ACCESS_DENIED, "D"),
        (Self::SYSTEM_AUDIT, "AU"),
        (Self::SYSTEM_ALARM, "AL"),
        (Self::ACCESS_ALLOWED_OBJECT, "OA"),
    ];

    /// The SDDL alias for this type, if it has one.
    #[inline]
    #[must_use]
    pub fn alias(self) -> Option<&'static str> {
        Self::ALIASES
            .iter()
            .find(|&&(ty, _)| ty == self)
            .map(|&(_, alias)| alias)
    }

    /// Whether `SA`/`FA` flags are legal on this type.
    #[inline]
    #[must_use]
    pub const fn is_audit(self) -> bool {
        self.0 == Self::SYSTEM_AUDIT.0
    }
}

impl Display for AceType {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.alias() {
            Some(alias) => f.write_str(alias),
            None => write!(f, "0x{:02X}", self.0),
        }
    }
}

impl FromStr for AceType {
    type Err = AceError;

    #[inline]
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(&(ty, _)) = Self::ALIASES.iter().find(|&&(_, alias)| alias == s) {
            return Ok(ty);
        }
        strip_hex_prefix(s)
            .and_then(|hex| parse_hex(hex, u8::from_str_radix))
            .map(Self)
            .ok_or_else(|| AceError::InvalidType(s.to_owned()))
    }
}

bitflags! {
    /// `AceFlags` header byte.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct AceFlags: u8 {
        /// `OI`: inherited by non-container children.
        const OBJECT_INHERIT = 0x01;
        /// `CI`: inherited by container children.
        const CONTAINER_INHERIT = 0x02;
        /// `NP`: inheritance stops after one level.
        const NO_PROPAGATE_INHERIT = 0x04;
        /// `IO`: applies to children only.
        const INHERIT_ONLY = 0x08;
        /// `ID`: the ACE was inherited.
        const INHERITED = 0x10;
        /// `SA`: audit successful access.
        const SUCCESSFUL_ACCESS = 0x40;
        /// `FA`: audit failed access.
        const FAILED_ACCESS = 0x80;

        const _ = !0;
    }
}

impl AceFlags {
    /// Bits legal on every ACE type.
    pub const INHERITANCE: Self = Self::OBJECT_INHERIT
        .union(Self::CONTAINER_INHERIT)
        .union(Self::NO_PROPAGATE_INHERIT)
        .union(Self::INHERIT_ONLY)
        .union(Self::INHERITED);

    /// Audit outcome bits, legal only on system audit ACEs.
    pub const AUDIT: Self = Self::SUCCESSFUL_ACCESS.union(Self::FAILED_ACCESS);
}

/// SDDL flag codes in rendering order.
const FLAG_CODES: [(&str, AceFlags); 7] = [
    ("SA", AceFlags::SUCCESSFUL_ACCESS),
    ("FA", AceFlags::FAILED_ACCESS),
    ("OI", AceFlags::OBJECT_INHERIT),
    ("CI", AceFlags::CONTAINER_INHERIT),
    ("NP", AceFlags::NO_PROPAGATE_INHERIT),
    ("IO", AceFlags::INHERIT_ONLY),
    ("ID", AceFlags::INHERITED),
];

/// `ACE_HEADER`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct AceHeader {
    /// Kind of entry.
    pub ace_type: AceType,
    /// Inheritance and audit bits.
    pub ace_flags: AceFlags,
    /// Total encoded length of the owning ACE, header included.
    pub ace_size: u16,
}

/// One access control entry.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Ace {
    /// Type, flags and size.
    pub header: AceHeader,
    /// Rights granted, denied or audited.
    pub access_mask: u32,
    /// The trustee.
    pub sid: Sid,
}

impl Ace {
    /// Builds an ACE with its size computed from the trustee.
    ///
    /// # Errors
    /// [`AceError::Sid`] when the trustee breaks the SID invariants.
    ///
    /// # Examples
    /// ```rust
    /// use win_sddl::{Ace, AceFlags, AceType};
    ///
    /// let ace = Ace::new(AceType::ACCESS_ALLOWED, AceFlags::empty(), 0x001F_01FF, "SY".parse().unwrap()).unwrap();
    /// assert_eq!(ace.header.ace_size, 20);
    /// assert_eq!(ace.to_sddl().unwrap(), "(A;;FA;;;SY)");
    /// ```
    #[inline]
    pub fn new(
        ace_type: AceType,
        ace_flags: AceFlags,
        access_mask: u32,
        sid: Sid,
    ) -> Result<Self, AceError> {
        sid.validate().map_err(AceError::Sid)?;
        let ace_size = encoded_size(&sid)?;
        Ok(Self {
            header: AceHeader {
                ace_type,
                ace_flags,
                ace_size,
            },
            access_mask,
            sid,
        })
    }

    /// Decodes one ACE from the start of `bytes`.
    ///
    /// The trustee is read within the declared size only; the declared size
    /// is kept as-is so the caller can advance past the entry.
    ///
    /// # Errors
    /// Truncated buffers, a declared size below 16 or beyond the buffer,
    /// and any trustee decoding failure.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, AceError> {
        let (Some(ace_type), Some(ace_flags), Some(ace_size), Some(access_mask)) = (
            read_u8(bytes, 0),
            read_u8(bytes, 1),
            read_u16_le(bytes, 2),
            read_u32_le(bytes, 4),
        ) else {
            return Err(AceError::Truncated(bytes.len()));
        };
        if bytes.len() < ACE_MIN_SIZE {
            return Err(AceError::Truncated(bytes.len()));
        }
        if usize::from(ace_size) < ACE_MIN_SIZE {
            return Err(AceError::SizeTooSmall(ace_size));
        }
        let body = bytes
            .get(ACE_FIXED_SIZE..usize::from(ace_size))
            .ok_or(AceError::SizeExceedsBuffer {
                declared: ace_size,
                available: bytes.len(),
            })?;
        let sid = Sid::from_bytes(body).map_err(AceError::Sid)?;
        Ok(Self {
            header: AceHeader {
                ace_type: AceType(ace_type),
                ace_flags: AceFlags::from_bits_retain(ace_flags),
                ace_size,
            },
            access_mask,
            sid,
        })
    }

    /// Encodes the ACE.
    ///
    /// # Errors
    /// Trustee encoding failures, and a stored size that disagrees with the
    /// computed one.
    pub fn to_bytes(&self) -> Result<Vec<u8>, AceError> {
        let sid = self.sid.to_bytes().map_err(AceError::Sid)?;
        let computed = ACE_FIXED_SIZE + sid.len();
        let size = u16::try_from(computed).map_err(|_| AceError::SizeOverflow(computed))?;
        if size != self.header.ace_size {
            return Err(AceError::SizeMismatch {
                stored: self.header.ace_size,
                computed,
            });
        }
        let mut out = Vec::with_capacity(computed);
        out.push(self.header.ace_type.0);
        out.push(self.header.ace_flags.bits());
        out.extend_from_slice(&size.to_le_bytes());
        out.extend_from_slice(&self.access_mask.to_le_bytes());
        out.extend_from_slice(&sid);
        Ok(out)
    }

    /// Renders `(type;flags;mask;;;trustee)`.
    ///
    /// # Errors
    /// Flag bits without a code, audit bits on the wrong type, an audit ACE
    /// without audit bits, and trustee rendering failures.
    pub fn to_sddl(&self) -> Result<String, AceError> {
        let ace_type = self.header.ace_type;
        let flags = self.header.ace_flags;
        let unknown = flags.difference(AceFlags::INHERITANCE.union(AceFlags::AUDIT));
        if !unknown.is_empty() {
            return Err(AceError::UnrepresentableFlags(unknown.bits()));
        }
        check_audit_flags(ace_type, flags)?;

        let flags_text: String = FLAG_CODES
            .iter()
            .filter(|(_, flag)| flags.contains(*flag))
            .map(|(code, _)| *code)
            .collect();
        let trustee = self.sid.to_sddl().map_err(AceError::Sid)?;
        Ok(format!(
            "({ace_type};{flags_text};{};;;{trustee})",
            format_access_mask(self.access_mask)
        ))
    }
}

impl FromStr for Ace {
    type Err = AceError;

    /// Parses one parenthesised ACE string.
    ///
    /// # Examples
    /// ```rust
    /// use win_sddl::{Ace, AceType};
    ///
    /// let ace: Ace = "(A;;FA;;;SY)".parse().unwrap();
    /// assert_eq!(ace.header.ace_type, AceType::ACCESS_ALLOWED);
    /// assert_eq!(ace.access_mask, 0x001F_01FF);
    /// assert_eq!(ace.to_bytes().unwrap().len(), 20);
    /// ```
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let inner = s
            .strip_prefix('(')
            .and_then(|rest| rest.strip_suffix(')'))
            .ok_or(AceError::MissingParentheses)?;
        let fields: Vec<&str> = inner.split(';').collect();
        let &[ace_type, flags, mask, _object_type, _inherited_object_type, trustee] =
            fields.as_slice()
        else {
            return Err(AceError::FieldCount(fields.len()));
        };

        let ace_type: AceType = ace_type.parse()?;
        let ace_flags = parse_flags(flags, ace_type)?;
        let access_mask = parse_access_mask(mask)?;
        let sid: Sid = trustee.parse().map_err(AceError::Sid)?;
        Self::new(ace_type, ace_flags, access_mask, sid)
    }
}

impl TryFrom<&[u8]> for Ace {
    type Error = AceError;

    #[inline]
    fn try_from(value: &[u8]) -> Result<Self, Self::Error> {
        Self::from_bytes(value)
    }
}

fn encoded_size(sid: &Sid) -> Result<u16, AceError> {
    let computed = ACE_FIXED_SIZE + sid.binary_len();
    u16::try_from(computed).map_err(|_| AceError::SizeOverflow(computed))
}

fn check_audit_flags(ace_type: AceType, flags: AceFlags) -> Result<(), AceError> {
    let has_audit = flags.intersects(AceFlags::AUDIT);
    match (ace_type.is_audit(), has_audit) {
        (true, false) => Err(AceError::MissingAuditFlag),
        (false, true) => Err(AceError::AuditFlagOnNonAuditAce),
        _ => Ok(()),
    }
}

fn parse_flags(text: &str, ace_type: AceType) -> Result<AceFlags, AceError> {
    let mut flags = AceFlags::empty();
    let mut rest = text;
    let mut position = 0;
    while !rest.is_empty() {
        let (Some(code), Some(tail)) = (rest.get(..2), rest.get(2..)) else {
            return Err(AceError::DanglingFlag(position));
        };
        let &(_, flag) = FLAG_CODES
            .iter()
            .find(|&&(c, _)| c == code)
            .ok_or_else(|| AceError::UnknownFlag(code.to_owned()))?;
        if flag.intersects(AceFlags::AUDIT) && !ace_type.is_audit() {
            return Err(AceError::AuditFlagOnNonAuditAce);
        }
        flags |= flag;
        rest = tail;
        position += 2;
    }
    check_audit_flags(ace_type, flags)?;
    Ok(flags)
}

fn strip_hex_prefix(s: &str) -> Option<&str> {
    s.strip_prefix("0x").or_else(|| s.strip_prefix("0X"))
}

fn parse_hex<T>(hex: &str, from_str_radix: fn(&str, u32) -> Result<T, core::num::ParseIntError>) -> Option<T> {
    if hex.is_empty() || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    from_str_radix(hex, 16).ok()
}

/// Alias, then `0x` literal, then a run of component codes.
pub(crate) fn parse_access_mask(text: &str) -> Result<u32, AceError> {
    well_known::access_mask_for_alias(text)
        .or_else(|| strip_hex_prefix(text).and_then(|hex| parse_hex(hex, u32::from_str_radix)))
        .or_else(|| well_known::compose_access_mask(text))
        .ok_or_else(|| AceError::UnknownAccessMask(text.to_owned()))
}

/// Alias, then component codes, then an eight digit `0x` literal.
pub(crate) fn format_access_mask(mask: u32) -> String {
    well_known::access_mask_alias(mask).map_or_else(
        || well_known::decompose_access_mask(mask).unwrap_or_else(|| format!("0x{mask:08X}")),
        str::to_owned,
    )
}
