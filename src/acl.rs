//! Access Control Lists: the 8-byte header followed by packed ACEs.

use core::fmt;
use core::str::FromStr;

use delegate::delegate;

use crate::ace::{Ace, format_access_mask};
use crate::error::AclError;
use crate::utils::{read_u8, read_u16_le, tail};
use crate::SecurityDescriptorControl;

/// The only ACL revision produced for standard ACEs.
pub const ACL_REVISION: u8 = 2;

/// Size of the ACL header.
pub const ACL_HEADER_SIZE: usize = 8;

/// Whether an ACL is the discretionary or the system list.
///
/// The raw ACL bytes do not say; the owning descriptor does.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AclType {
    /// `D:`
    Discretionary,
    /// `S:`
    System,
}

impl AclType {
    /// The SDDL prefix letter.
    #[inline]
    #[must_use]
    pub const fn prefix(self) -> char {
        match self {
            Self::Discretionary => 'D',
            Self::System => 'S',
        }
    }

    /// Inverse of [`AclType::prefix`].
    #[inline]
    #[must_use]
    pub const fn from_prefix(prefix: char) -> Option<Self> {
        match prefix {
            'D' => Some(Self::Discretionary),
            'S' => Some(Self::System),
            _ => None,
        }
    }

    /// `DACL_PRESENT` or `SACL_PRESENT`.
    #[inline]
    #[must_use]
    pub const fn present_flag(self) -> SecurityDescriptorControl {
        match self {
            Self::Discretionary => SecurityDescriptorControl::DACL_PRESENT,
            Self::System => SecurityDescriptorControl::SACL_PRESENT,
        }
    }

    /// The bit behind the `R` flag.
    #[inline]
    #[must_use]
    pub const fn defaulted_flag(self) -> SecurityDescriptorControl {
        match self {
            Self::Discretionary => SecurityDescriptorControl::DACL_DEFAULTED,
            Self::System => SecurityDescriptorControl::SACL_DEFAULTED,
        }
    }

    /// The bit behind the `P` flag.
    #[inline]
    #[must_use]
    pub const fn protected_flag(self) -> SecurityDescriptorControl {
        match self {
            Self::Discretionary => SecurityDescriptorControl::DACL_PROTECTED,
            Self::System => SecurityDescriptorControl::SACL_PROTECTED,
        }
    }

    /// The bit behind the `AI` flag.
    #[inline]
    #[must_use]
    pub const fn auto_inherited_flag(self) -> SecurityDescriptorControl {
        match self {
            Self::Discretionary => SecurityDescriptorControl::DACL_AUTO_INHERITED,
            Self::System => SecurityDescriptorControl::SACL_AUTO_INHERITED,
        }
    }

    /// The bit behind the `AR` flag.
    #[inline]
    #[must_use]
    pub const fn auto_inherit_required_flag(self) -> SecurityDescriptorControl {
        match self {
            Self::Discretionary => SecurityDescriptorControl::DACL_AUTO_INHERIT_REQUIRED,
            Self::System => SecurityDescriptorControl::SACL_AUTO_INHERIT_REQUIRED,
        }
    }

    /// Bits an ACL string contributes to its descriptor.
    #[inline]
    #[must_use]
    pub const fn inheritance_flags(self) -> SecurityDescriptorControl {
        self.protected_flag()
            .union(self.auto_inherited_flag())
            .union(self.auto_inherit_required_flag())
    }

    /// ACL flag codes in rendering order.
    const fn flag_codes(self) -> [(&'static str, SecurityDescriptorControl); 4] {
        [
            ("P", self.protected_flag()),
            ("AI", self.auto_inherited_flag()),
            ("AR", self.auto_inherit_required_flag()),
            ("R", self.defaulted_flag()),
        ]
    }
}

/// An access control list together with the descriptor context it was
/// read in.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Acl {
    /// ACL revision byte, 2 for standard ACEs.
    pub acl_revision: u8,
    /// Reserved byte.
    pub sbz1: u8,
    /// Header plus every encoded ACE.
    pub acl_size: u16,
    /// Number of ACEs the header declares.
    pub ace_count: u16,
    /// Reserved word.
    pub sbz2: u16,
    /// Which list of the owning descriptor this is.
    pub acl_type: AclType,
    /// Mirror of the owning descriptor's control word.
    pub control: SecurityDescriptorControl,
    /// Entries in evaluation order.
    pub aces: Vec<Ace>,
}

impl Acl {
    /// Builds a revision 2 ACL with size and count computed from `aces`.
    ///
    /// # Errors
    /// [`AclError::SizeOverflow`] or [`AclError::CountOverflow`] when the
    /// list does not fit the 16-bit header fields.
    pub fn new(
        acl_type: AclType,
        control: SecurityDescriptorControl,
        aces: Vec<Ace>,
    ) -> Result<Self, AclError> {
        let computed = ACL_HEADER_SIZE
            + aces
                .iter()
                .map(|ace| usize::from(ace.header.ace_size))
                .sum::<usize>();
        let acl_size = u16::try_from(computed).map_err(|_| AclError::SizeOverflow(computed))?;
        let ace_count =
            u16::try_from(aces.len()).map_err(|_| AclError::CountOverflow(aces.len()))?;
        Ok(Self {
            acl_revision: ACL_REVISION,
            sbz1: 0,
            acl_size,
            ace_count,
            sbz2: 0,
            acl_type,
            control,
            aces,
        })
    }

    delegate! {
        to self.aces {
            /// Number of entries.
            #[inline]
            #[must_use]
            pub fn len(&self) -> usize;
            /// Whether the list holds no entries.
            #[inline]
            #[must_use]
            pub fn is_empty(&self) -> bool;
            /// Entries in evaluation order.
            #[inline]
            pub fn iter(&self) -> core::slice::Iter<'_, Ace>;
        }
    }

    /// Decodes an ACL from the start of `bytes`.
    ///
    /// `acl_type` and `control` come from the owning descriptor and are
    /// stored verbatim.
    ///
    /// # Errors
    /// A truncated header, a declared size outside `8..=bytes.len()`, the
    /// cursor reaching the declared size before `ace_count` entries were
    /// read, and any ACE decoding failure.
    pub fn from_bytes(
        bytes: &[u8],
        acl_type: AclType,
        control: SecurityDescriptorControl,
    ) -> Result<Self, AclError> {
        let (Some(acl_revision), Some(sbz1), Some(acl_size), Some(ace_count), Some(sbz2)) = (
            read_u8(bytes, 0),
            read_u8(bytes, 1),
            read_u16_le(bytes, 2),
            read_u16_le(bytes, 4),
            read_u16_le(bytes, 6),
        ) else {
            return Err(AclError::Truncated(bytes.len()));
        };
        if usize::from(acl_size) < ACL_HEADER_SIZE {
            return Err(AclError::SizeTooSmall(acl_size));
        }
        let body = bytes
            .get(..usize::from(acl_size))
            .ok_or(AclError::SizeExceedsBuffer {
                declared: acl_size,
                available: bytes.len(),
            })?;

        let mut aces = Vec::new();
        let mut offset = ACL_HEADER_SIZE;
        for index in 0..usize::from(ace_count) {
            if offset >= body.len() {
                return Err(AclError::OffsetExceedsAclSize {
                    index,
                    offset,
                    acl_size,
                });
            }
            let ace = Ace::from_bytes(tail(body, offset))
                .map_err(|cause| AclError::Ace { index, cause })?;
            offset += usize::from(ace.header.ace_size);
            aces.push(ace);
        }

        Ok(Self {
            acl_revision,
            sbz1,
            acl_size,
            ace_count,
            sbz2,
            acl_type,
            control,
            aces,
        })
    }

    /// Encodes the ACL.
    ///
    /// # Errors
    /// Any ACE encoding failure, and stored size or count fields that
    /// disagree with the ACE list.
    pub fn to_bytes(&self) -> Result<Vec<u8>, AclError> {
        let mut body = Vec::new();
        for (index, ace) in self.aces.iter().enumerate() {
            let bytes = ace
                .to_bytes()
                .map_err(|cause| AclError::AceEncoding { index, cause })?;
            body.extend_from_slice(&bytes);
        }
        let computed = ACL_HEADER_SIZE + body.len();
        let size = u16::try_from(computed).map_err(|_| AclError::SizeOverflow(computed))?;
        if size != self.acl_size {
            return Err(AclError::SizeMismatch {
                stored: self.acl_size,
                computed,
            });
        }
        if usize::from(self.ace_count) != self.aces.len() {
            return Err(AclError::CountMismatch {
                stored: self.ace_count,
                actual: self.aces.len(),
            });
        }

        let mut out = Vec::with_capacity(computed);
        out.push(self.acl_revision);
        out.push(self.sbz1);
        out.extend_from_slice(&size.to_le_bytes());
        out.extend_from_slice(&self.ace_count.to_le_bytes());
        out.extend_from_slice(&self.sbz2.to_le_bytes());
        out.extend_from_slice(&body);
        Ok(out)
    }

    /// Renders `D:` or `S:`, the flags in `P AI AR R` order, then every ACE.
    ///
    /// # Errors
    /// Any ACE rendering failure.
    pub fn to_sddl(&self) -> Result<String, AclError> {
        let mut out = String::new();
        out.push(self.acl_type.prefix());
        out.push(':');
        for (code, flag) in self.acl_type.flag_codes() {
            if self.control.contains(flag) {
                out.push_str(code);
            }
        }
        for (index, ace) in self.aces.iter().enumerate() {
            let text = ace
                .to_sddl()
                .map_err(|cause| AclError::AceEncoding { index, cause })?;
            out.push_str(&text);
        }
        Ok(out)
    }

    pub(crate) fn fmt_indented(&self, f: &mut fmt::Formatter<'_>, margin: usize) -> fmt::Result {
        writeln!(f, "{:margin$}AclType: {}", "", self.acl_type.prefix())?;
        writeln!(f, "{:margin$}AclRevision: {}", "", self.acl_revision)?;
        writeln!(f, "{:margin$}Sbz1: {}", "", self.sbz1)?;
        writeln!(f, "{:margin$}AclSize: {}", "", self.acl_size)?;
        writeln!(f, "{:margin$}AceCount: {}", "", self.ace_count)?;
        writeln!(f, "{:margin$}Sbz2: {}", "", self.sbz2)?;
        let flags: Vec<&str> = self
            .acl_type
            .flag_codes()
            .into_iter()
            .filter(|&(_, flag)| self.control.contains(flag))
            .map(|(code, _)| code)
            .collect();
        writeln!(f, "{:margin$}Flags: {}", "", flags.join(" "))?;
        for (index, ace) in self.aces.iter().enumerate() {
            let inner = margin + 4;
            writeln!(f, "{:margin$}ACE {index}:", "")?;
            writeln!(
                f,
                "{:inner$}AceType: 0x{:02X} ({})",
                "",
                ace.header.ace_type.0,
                ace.header.ace_type
            )?;
            write!(f, "{:inner$}AceFlags: 0x{:02X} (", "", ace.header.ace_flags.bits())?;
            bitflags::parser::to_writer(&ace.header.ace_flags, &mut *f)?;
            writeln!(f, ")")?;
            writeln!(f, "{:inner$}AceSize: {}", "", ace.header.ace_size)?;
            writeln!(
                f,
                "{:inner$}AccessMask: 0x{:08X} ({})",
                "",
                ace.access_mask,
                format_access_mask(ace.access_mask)
            )?;
            match ace.sid.alias() {
                Some(alias) => writeln!(f, "{:inner$}SID: {} ({alias})", "", ace.sid)?,
                None => writeln!(f, "{:inner$}SID: {}", "", ace.sid)?,
            }
        }
        Ok(())
    }
}

impl<'a> IntoIterator for &'a Acl {
    type Item = &'a Ace;
    type IntoIter = core::slice::Iter<'a, Ace>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.aces.iter()
    }
}

impl FromStr for Acl {
    type Err = AclError;

    /// Parses `D:` or `S:`, an optional flag run, then packed `(...)` ACEs.
    ///
    /// # Examples
    /// ```rust
    /// use win_sddl::{Acl, AclType, SecurityDescriptorControl};
    ///
    /// let acl: Acl = "D:".parse().unwrap();
    /// assert_eq!(acl.acl_type, AclType::Discretionary);
    /// assert_eq!(acl.acl_size, 8);
    /// assert_eq!(acl.control, SecurityDescriptorControl::DACL_PRESENT);
    /// assert_eq!(acl.to_sddl().unwrap(), "D:");
    /// ```
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        let (Some(prefix), Some(':')) = (chars.next(), chars.next()) else {
            return Err(AclError::MissingPrefix);
        };
        let acl_type = AclType::from_prefix(prefix).ok_or(AclError::InvalidType(prefix))?;
        let rest = chars.as_str();

        let flags_end = match rest.find('(') {
            Some(position) => position,
            None if rest.contains(')') => return Err(AclError::MissingOpeningParenthesis),
            None => rest.len(),
        };
        let (flag_text, mut remaining) = rest.split_at(flags_end);
        let control = acl_type.present_flag() | parse_acl_flags(flag_text, acl_type)?;

        let mut aces = Vec::new();
        while !remaining.is_empty() {
            if !remaining.starts_with('(') {
                return Err(AclError::MissingOpeningParenthesis);
            }
            let close = remaining
                .find(')')
                .ok_or(AclError::MissingClosingParenthesis)?;
            let (span, next) = remaining.split_at(close + 1);
            let ace = span.parse::<Ace>().map_err(|cause| AclError::Ace {
                index: aces.len(),
                cause,
            })?;
            aces.push(ace);
            remaining = next;
        }

        Self::new(acl_type, control, aces)
    }
}

/// Two-letter codes are tried before `P` and `R`; `NO` and `IO` are
/// accepted without setting any bit.
fn parse_acl_flags(text: &str, acl_type: AclType) -> Result<SecurityDescriptorControl, AclError> {
    let mut control = SecurityDescriptorControl::empty();
    let mut rest = text;
    while let Some(first) = rest.chars().next() {
        let (flag, width) = match rest.get(..2) {
            Some("AI") => (acl_type.auto_inherited_flag(), 2),
            Some("AR") => (acl_type.auto_inherit_required_flag(), 2),
            Some("NO" | "IO") => (SecurityDescriptorControl::empty(), 2),
            _ => match first {
                'P' => (acl_type.protected_flag(), 1),
                'R' => (acl_type.defaulted_flag(), 1),
                other => return Err(AclError::InvalidFlag(other)),
            },
        };
        control |= flag;
        rest = rest.get(width..).unwrap_or_default();
    }
    Ok(control)
}
