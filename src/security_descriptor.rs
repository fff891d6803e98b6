//! Self-relative security descriptors and their SDDL form.
//!
//! The binary layout is a fixed 20-byte header followed by the owner SID,
//! group SID, SACL and DACL, each located through a byte offset from the
//! start of the buffer (0 meaning absent):
//!
//! ```text
//! offset 0:  revision      u8  (=1)
//! offset 1:  sbz1          u8
//! offset 2:  control       u16
//! offset 4:  owner offset  u32
//! offset 8:  group offset  u32
//! offset 12: sacl offset   u32
//! offset 16: dacl offset   u32
//! ```

use core::fmt::{self, Display};
use core::str::FromStr;

use arrayvec::ArrayVec;
use tracing::{debug, trace};

use crate::acl::{Acl, AclType};
use crate::error::{Component, SecurityDescriptorError};
use crate::utils::{read_u8, read_u16_le, read_u32_le, tail};
use crate::{SecurityDescriptorControl, Sid};

/// The only security descriptor revision.
pub const SECURITY_DESCRIPTOR_REVISION: u8 = 1;

/// Size of the self-relative header.
pub const SELF_RELATIVE_HEADER_SIZE: usize = 20;

/// The fixed header of a self-relative security descriptor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SelfRelativeHeader {
    /// Descriptor revision byte.
    pub revision: u8,
    /// Reserved byte.
    pub sbz1: u8,
    /// The control word.
    pub control: SecurityDescriptorControl,
    /// Byte offsets from the start of the descriptor, 0 when absent.
    pub owner_offset: u32,
    /// Offset of the group SID.
    pub group_offset: u32,
    /// Offset of the SACL.
    pub sacl_offset: u32,
    /// Offset of the DACL.
    pub dacl_offset: u32,
}

impl SelfRelativeHeader {
    /// Reads the header of a whole descriptor buffer.
    ///
    /// Every non-zero offset is checked against `bytes.len()`.
    ///
    /// # Errors
    /// [`SecurityDescriptorError::Truncated`] under 20 bytes,
    /// [`SecurityDescriptorError::OffsetOutOfRange`] naming the first bad offset.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SecurityDescriptorError> {
        let (
            Some(revision),
            Some(sbz1),
            Some(control),
            Some(owner_offset),
            Some(group_offset),
            Some(sacl_offset),
            Some(dacl_offset),
        ) = (
            read_u8(bytes, 0),
            read_u8(bytes, 1),
            read_u16_le(bytes, 2),
            read_u32_le(bytes, 4),
            read_u32_le(bytes, 8),
            read_u32_le(bytes, 12),
            read_u32_le(bytes, 16),
        )
        else {
            return Err(SecurityDescriptorError::Truncated(bytes.len()));
        };
        let header = Self {
            revision,
            sbz1,
            control: SecurityDescriptorControl::from_bits_retain(control),
            owner_offset,
            group_offset,
            sacl_offset,
            dacl_offset,
        };
        for component in [Component::Owner, Component::Group, Component::Sacl, Component::Dacl] {
            let offset = header.offset(component);
            let in_range = usize::try_from(offset).is_ok_and(|o| o < bytes.len());
            if offset != 0 && !in_range {
                return Err(SecurityDescriptorError::OffsetOutOfRange {
                    component,
                    offset,
                    len: bytes.len(),
                });
            }
        }
        Ok(header)
    }

    /// The offset field of `component`.
    #[inline]
    #[must_use]
    pub const fn offset(&self, component: Component) -> u32 {
        match component {
            Component::Owner => self.owner_offset,
            Component::Group => self.group_offset,
            Component::Sacl => self.sacl_offset,
            Component::Dacl => self.dacl_offset,
        }
    }

    /// Little-endian wire form of the header.
    #[inline]
    #[must_use]
    pub fn to_bytes(&self) -> [u8; SELF_RELATIVE_HEADER_SIZE] {
        let mut out = [0u8; SELF_RELATIVE_HEADER_SIZE];
        let fields = self
            .control
            .bits()
            .to_le_bytes()
            .into_iter()
            .chain(self.owner_offset.to_le_bytes())
            .chain(self.group_offset.to_le_bytes())
            .chain(self.sacl_offset.to_le_bytes())
            .chain(self.dacl_offset.to_le_bytes());
        for (slot, byte) in out
            .iter_mut()
            .zip([self.revision, self.sbz1].into_iter().chain(fields))
        {
            *slot = byte;
        }
        out
    }

    /// The region `component` points at, `None` when its offset is 0.
    fn region<'a>(&self, bytes: &'a [u8], component: Component) -> Option<&'a [u8]> {
        let offset = self.offset(component);
        (offset != 0).then(|| usize::try_from(offset).map_or(&[][..], |o| tail(bytes, o)))
    }
}

/// A security descriptor: owner, group, both ACLs and the control word.
///
/// # Examples
/// ```rust
/// use win_sddl::SecurityDescriptor;
///
/// let sd: SecurityDescriptor = "O:SYG:BAD:(A;;FA;;;SY)(D;;FR;;;WD)".parse().unwrap();
/// assert_eq!(sd.owner.as_ref().unwrap().to_sddl().unwrap(), "SY");
/// assert_eq!(sd.dacl.as_ref().unwrap().len(), 2);
///
/// let bytes = sd.to_bytes().unwrap();
/// let decoded = SecurityDescriptor::from_bytes(&bytes).unwrap();
/// assert_eq!(decoded.to_sddl().unwrap(), "O:SYG:BAD:(A;;FA;;;SY)(D;;FR;;;WD)");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SecurityDescriptor {
    /// Always 1 for descriptors this crate produces.
    pub revision: u8,
    /// Reserved byte, kept verbatim.
    pub sbz1: u8,
    /// Control word; the encoder always adds `SELF_RELATIVE`.
    pub control: SecurityDescriptorControl,
    /// Owner SID, `O:` in SDDL.
    pub owner: Option<Sid>,
    /// Primary group SID, `G:` in SDDL.
    pub group: Option<Sid>,
    /// System ACL, present iff `SACL_PRESENT` is set for the encoder.
    pub sacl: Option<Acl>,
    /// Discretionary ACL, present iff `DACL_PRESENT` is set for the encoder.
    pub dacl: Option<Acl>,
}

impl Default for SecurityDescriptor {
    /// The descriptor an empty SDDL string stands for.
    #[inline]
    fn default() -> Self {
        Self {
            revision: SECURITY_DESCRIPTOR_REVISION,
            sbz1: 0,
            control: SecurityDescriptorControl::NOTHING_SPECIFIED,
            owner: None,
            group: None,
            sacl: None,
            dacl: None,
        }
    }
}

impl SecurityDescriptor {
    /// Decodes a self-relative security descriptor.
    ///
    /// Presence is decided by the offsets alone; the control bits are kept
    /// verbatim and handed to both ACLs.
    ///
    /// # Errors
    /// Header errors from [`SelfRelativeHeader::from_bytes`] and any nested
    /// SID or ACL failure, tagged with the failing component.
    #[inline]
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SecurityDescriptorError> {
        trace!(len = bytes.len(), "decoding self-relative security descriptor");
        Self::decode(bytes).inspect_err(|err| debug!(%err, "rejected binary security descriptor"))
    }

    fn decode(bytes: &[u8]) -> Result<Self, SecurityDescriptorError> {
        let header = SelfRelativeHeader::from_bytes(bytes)?;
        let sid_at = |component| {
            header
                .region(bytes, component)
                .map(Sid::from_bytes)
                .transpose()
                .map_err(|cause| SecurityDescriptorError::Sid { component, cause })
        };
        let acl_at = |component, acl_type| {
            header
                .region(bytes, component)
                .map(|region| Acl::from_bytes(region, acl_type, header.control))
                .transpose()
                .map_err(|cause| SecurityDescriptorError::Acl { component, cause })
        };
        Ok(Self {
            revision: header.revision,
            sbz1: header.sbz1,
            control: header.control,
            owner: sid_at(Component::Owner)?,
            group: sid_at(Component::Group)?,
            sacl: acl_at(Component::Sacl, AclType::System)?,
            dacl: acl_at(Component::Dacl, AclType::Discretionary)?,
        })
    }

    /// Encodes the descriptor in self-relative form.
    ///
    /// The self-relative control bit is always set in the output. Parts are
    /// laid out owner, group, SACL, DACL right after the header.
    ///
    /// # Errors
    /// A `*_PRESENT` bit that disagrees with its ACL, and any nested
    /// SID or ACL failure.
    pub fn to_bytes(&self) -> Result<Vec<u8>, SecurityDescriptorError> {
        trace!("encoding self-relative security descriptor");
        let control = self.control | SecurityDescriptorControl::SELF_RELATIVE;
        check_presence(self.sacl.as_ref(), control, AclType::System, Component::Sacl)?;
        check_presence(self.dacl.as_ref(), control, AclType::Discretionary, Component::Dacl)?;

        let mut body = Vec::new();
        let owner_offset = match &self.owner {
            Some(sid) => append(&mut body, &encode_sid(sid, Component::Owner)?)?,
            None => 0,
        };
        let group_offset = match &self.group {
            Some(sid) => append(&mut body, &encode_sid(sid, Component::Group)?)?,
            None => 0,
        };
        let sacl_offset = match &self.sacl {
            Some(acl) => append(&mut body, &encode_acl(acl, Component::Sacl)?)?,
            None => 0,
        };
        let dacl_offset = match &self.dacl {
            Some(acl) => append(&mut body, &encode_acl(acl, Component::Dacl)?)?,
            None => 0,
        };

        let header = SelfRelativeHeader {
            revision: self.revision,
            sbz1: self.sbz1,
            control,
            owner_offset,
            group_offset,
            sacl_offset,
            dacl_offset,
        };
        let mut out = Vec::with_capacity(SELF_RELATIVE_HEADER_SIZE + body.len());
        out.extend_from_slice(&header.to_bytes());
        out.extend_from_slice(&body);
        trace!(len = out.len(), "encoded self-relative security descriptor");
        Ok(out)
    }

    /// Renders `O:`, `G:`, the DACL and the SACL, in that order, skipping
    /// absent parts.
    ///
    /// # Errors
    /// Any nested rendering failure.
    pub fn to_sddl(&self) -> Result<String, SecurityDescriptorError> {
        let mut out = String::new();
        for (prefix, sid, component) in [
            ("O:", &self.owner, Component::Owner),
            ("G:", &self.group, Component::Group),
        ] {
            if let Some(sid) = sid {
                let text = sid
                    .to_sddl()
                    .map_err(|cause| SecurityDescriptorError::Sid { component, cause })?;
                out.push_str(prefix);
                out.push_str(&text);
            }
        }
        for (acl, component) in [(&self.dacl, Component::Dacl), (&self.sacl, Component::Sacl)] {
            if let Some(acl) = acl {
                let text = acl
                    .to_sddl()
                    .map_err(|cause| SecurityDescriptorError::Acl { component, cause })?;
                out.push_str(&text);
            }
        }
        Ok(out)
    }

    /// Multi-line dump of every field, each nested level indented by two
    /// more spaces than `margin`.
    #[must_use]
    pub fn to_indented_string(&self, margin: usize) -> String {
        self.indented(margin).to_string()
    }

    /// [`Display`] adapter behind [`SecurityDescriptor::to_indented_string`].
    #[inline]
    #[must_use]
    pub const fn indented(&self, margin: usize) -> Indented<'_> {
        Indented { sd: self, margin }
    }

    fn parse_sddl(s: &str) -> Result<Self, SecurityDescriptorError> {
        let mut sd = Self::default();
        if s.is_empty() {
            return Ok(sd);
        }

        let mut pending: ArrayVec<Part, 4> = Part::ALL.into();
        if next_marker(s, &pending).is_none() {
            return Err(SecurityDescriptorError::NoComponents);
        }

        let mut remaining = s;
        while !remaining.is_empty() && !pending.is_empty() {
            let Some((0, part)) = next_marker(remaining, &pending) else {
                break;
            };
            pending.retain(|p| *p != part);
            let body = remaining.get(2..).unwrap_or_default();
            let end = next_marker(body, &pending).map_or(body.len(), |(position, _)| position);
            let (payload, rest) = body.split_at(end);

            match part {
                Part::Owner | Part::Group => {
                    let component = part.component();
                    let sid = payload
                        .parse::<Sid>()
                        .map_err(|cause| SecurityDescriptorError::Sid { component, cause })?;
                    if component == Component::Owner {
                        sd.owner = Some(sid);
                        sd.control.remove(SecurityDescriptorControl::OWNER_DEFAULTED);
                    } else {
                        sd.group = Some(sid);
                        sd.control.remove(SecurityDescriptorControl::GROUP_DEFAULTED);
                    }
                }
                Part::Dacl | Part::Sacl => {
                    let component = part.component();
                    let text = remaining.get(..2 + end).unwrap_or_default();
                    let acl = text
                        .parse::<Acl>()
                        .map_err(|cause| SecurityDescriptorError::Acl { component, cause })?;
                    let acl_type = acl.acl_type;
                    sd.control.remove(acl_type.defaulted_flag());
                    sd.control.insert(acl_type.present_flag());
                    sd.control |= acl.control & acl_type.inheritance_flags();
                    match acl_type {
                        AclType::Discretionary => sd.dacl = Some(acl),
                        AclType::System => sd.sacl = Some(acl),
                    }
                }
            }
            remaining = rest;
        }

        if !remaining.is_empty() {
            return Err(SecurityDescriptorError::UnexpectedContent(remaining.to_owned()));
        }

        for acl in [&mut sd.dacl, &mut sd.sacl].into_iter().flatten() {
            acl.control = sd.control;
        }
        Ok(sd)
    }
}

impl FromStr for SecurityDescriptor {
    type Err = SecurityDescriptorError;

    /// Parses an SDDL string whose `O:`, `G:`, `D:` and `S:` parts may come
    /// in any order, each at most once.
    ///
    /// Parsing starts from [`SecurityDescriptor::default`]; each part found
    /// clears its `*_DEFAULTED` bit, and each ACL sets its `*_PRESENT` bit
    /// plus the protected and auto-inherit bits its flags carry. The `R`
    /// flag is not carried over to the descriptor.
    #[inline]
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        trace!(len = s.len(), "parsing SDDL security descriptor");
        Self::parse_sddl(s).inspect_err(|err| debug!(%err, "rejected SDDL security descriptor"))
    }
}

impl TryFrom<&[u8]> for SecurityDescriptor {
    type Error = SecurityDescriptorError;

    #[inline]
    fn try_from(value: &[u8]) -> Result<Self, Self::Error> {
        Self::from_bytes(value)
    }
}

/// Indented multi-line view of a [`SecurityDescriptor`].
#[derive(Clone, Copy, Debug)]
pub struct Indented<'a> {
    sd: &'a SecurityDescriptor,
    margin: usize,
}

impl Display for Indented<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Self { sd, margin } = *self;
        let inner = margin + 2;
        writeln!(f, "{:margin$}SecurityDescriptor:", "")?;
        writeln!(f, "{:inner$}Revision: {}", "", sd.revision)?;
        writeln!(f, "{:inner$}Sbz1: {}", "", sd.sbz1)?;
        write!(f, "{:inner$}Control: 0x{:04X} (", "", sd.control.bits())?;
        bitflags::parser::to_writer(&sd.control, &mut *f)?;
        writeln!(f, ")")?;
        for (label, sid) in [("Owner", &sd.owner), ("Group", &sd.group)] {
            match sid {
                Some(sid) => match sid.alias() {
                    Some(alias) => writeln!(f, "{:inner$}{label}: {sid} ({alias})", "")?,
                    None => writeln!(f, "{:inner$}{label}: {sid}", "")?,
                },
                None => writeln!(f, "{:inner$}{label}: <none>", "")?,
            }
        }
        for (label, acl) in [("DACL", &sd.dacl), ("SACL", &sd.sacl)] {
            match acl {
                Some(acl) => {
                    writeln!(f, "{:inner$}{label}:", "")?;
                    acl.fmt_indented(f, inner + 2)?;
                }
                None => writeln!(f, "{:inner$}{label}: <none>", "")?,
            }
        }
        Ok(())
    }
}

/// SDDL component markers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Part {
    Owner,
    Group,
    Dacl,
    Sacl,
}

impl Part {
    const ALL: [Self; 4] = [Self::Owner, Self::Group, Self::Dacl, Self::Sacl];

    const fn marker(self) -> &'static str {
        match self {
            Self::Owner => "O:",
            Self::Group => "G:",
            Self::Dacl => "D:",
            Self::Sacl => "S:",
        }
    }

    const fn component(self) -> Component {
        match self {
            Self::Owner => Component::Owner,
            Self::Group => Component::Group,
            Self::Dacl => Component::Dacl,
            Self::Sacl => Component::Sacl,
        }
    }
}

/// Earliest position of any pending marker in `s`.
fn next_marker(s: &str, pending: &[Part]) -> Option<(usize, Part)> {
    pending
        .iter()
        .filter_map(|&part| s.find(part.marker()).map(|position| (position, part)))
        .min_by_key(|&(position, _)| position)
}

fn check_presence(
    acl: Option<&Acl>,
    control: SecurityDescriptorControl,
    acl_type: AclType,
    component: Component,
) -> Result<(), SecurityDescriptorError> {
    match (acl.is_some(), control.contains(acl_type.present_flag())) {
        (true, false) => Err(SecurityDescriptorError::AclWithoutPresentFlag(component)),
        (false, true) => Err(SecurityDescriptorError::PresentFlagWithoutAcl(component)),
        _ => Ok(()),
    }
}

fn encode_sid(sid: &Sid, component: Component) -> Result<Vec<u8>, SecurityDescriptorError> {
    sid.to_bytes()
        .map_err(|cause| SecurityDescriptorError::Sid { component, cause })
}

fn encode_acl(acl: &Acl, component: Component) -> Result<Vec<u8>, SecurityDescriptorError> {
    acl.to_bytes()
        .map_err(|cause| SecurityDescriptorError::Acl { component, cause })
}

/// Appends `bytes` to the body and returns their offset from the start of
/// the descriptor.
fn append(body: &mut Vec<u8>, bytes: &[u8]) -> Result<u32, SecurityDescriptorError> {
    let position = SELF_RELATIVE_HEADER_SIZE + body.len();
    let offset =
        u32::try_from(position).map_err(|_| SecurityDescriptorError::SizeOverflow(position))?;
    body.extend_from_slice(bytes);
    Ok(offset)
}
