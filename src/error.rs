use thiserror::Error;

pub use parsing::SidError;

/// Errors raised by the ACE codecs.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum AceError {
    /// Fewer than 16 bytes: 4 for the header, 4 for the mask, 8 for the SID.
    #[error("invalid ACE: too short, got {0} bytes but need at least 16")]
    Truncated(usize),
    /// The size field is smaller than the fixed ACE layout.
    #[error("invalid ACE: declared size {0} is smaller than 16")]
    SizeTooSmall(u16),
    /// The size field claims more bytes than the buffer holds.
    #[error("invalid ACE: declared size {declared} exceeds available {available} bytes")]
    SizeExceedsBuffer {
        /// Size field of the ACE header.
        declared: u16,
        /// Bytes available to the decoder.
        available: usize,
    },
    /// The trustee SID failed to decode, encode or parse.
    #[error("invalid ACE SID: {0}")]
    Sid(SidError),
    /// The encoded ACE does not fit the 16-bit size field.
    #[error("ACE size {0} exceeds maximum size of 65535 bytes")]
    SizeOverflow(usize),
    /// The stored size disagrees with the computed one.
    #[error("calculated ACE size {computed} doesn't match header size {stored}")]
    SizeMismatch {
        /// Size field of the ACE header.
        stored: u16,
        /// Size computed from the trustee SID.
        computed: usize,
    },
    /// The text is not wrapped in `(` and `)`.
    #[error("invalid ACE string format: must be enclosed in parentheses")]
    MissingParentheses,
    /// The text does not split into exactly six `;`-separated fields.
    #[error("invalid ACE string format: expected 6 fields separated by semicolons, got {0}")]
    FieldCount(usize),
    /// Neither a type alias nor a `0xNN` literal.
    #[error("invalid ACE type: {0}")]
    InvalidType(String),
    /// The flag field has an odd trailing character.
    #[error("invalid ACE flag format at position {0}")]
    DanglingFlag(usize),
    /// A two-letter flag code nobody knows.
    #[error("unknown ACE flag: {0}")]
    UnknownFlag(String),
    /// `SA`/`FA` on a type other than system audit.
    #[error("audit flags (SA/FA) are only valid for audit ACEs")]
    AuditFlagOnNonAuditAce,
    /// A system audit ACE without `SA` or `FA`.
    #[error("audit ACEs must specify at least one audit flag (SA/FA)")]
    MissingAuditFlag,
    /// Flag bits with no SDDL code.
    #[error("ACE flags {0:#04x} have no SDDL representation")]
    UnrepresentableFlags(u8),
    /// Neither an alias, a `0x` literal nor a run of component codes.
    #[error("unknown access mask: {0}")]
    UnknownAccessMask(String),
}

/// Errors raised by the ACL codecs.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum AclError {
    /// Fewer than 8 header bytes.
    #[error("invalid ACL: too short, got {0} bytes but need at least 8")]
    Truncated(usize),
    /// The size field is smaller than the ACL header.
    #[error("invalid ACL: declared size {0} is smaller than 8")]
    SizeTooSmall(u16),
    /// The size field claims more bytes than the buffer holds.
    #[error("invalid ACL: declared size {declared} exceeds available {available} bytes")]
    SizeExceedsBuffer {
        /// Size field of the ACL header.
        declared: u16,
        /// Bytes available to the decoder.
        available: usize,
    },
    /// The cursor ran past the declared size before `ace_count` ACEs were read.
    #[error("invalid ACL: ACE {index} at offset {offset} exceeds AclSize {acl_size}")]
    OffsetExceedsAclSize {
        /// Zero-based position of the ACE.
        index: usize,
        /// Cursor position inside the ACL.
        offset: usize,
        /// Size field of the ACL header.
        acl_size: u16,
    },
    /// A child ACE failed to decode or parse.
    #[error("error parsing ACE {index}: {cause}")]
    Ace {
        /// Zero-based position of the ACE.
        index: usize,
        /// The underlying failure.
        cause: AceError,
    },
    /// A child ACE failed to encode or render.
    #[error("error converting ACE {index}: {cause}")]
    AceEncoding {
        /// Zero-based position of the ACE.
        index: usize,
        /// The underlying failure.
        cause: AceError,
    },
    /// The encoded ACL does not fit the 16-bit size field.
    #[error("ACL size {0} exceeds maximum size of 65535 bytes")]
    SizeOverflow(usize),
    /// The stored size disagrees with the computed one.
    #[error("calculated ACL size {computed} doesn't match header size {stored}")]
    SizeMismatch {
        /// Size field of the ACL header.
        stored: u16,
        /// Header plus the encoded ACEs.
        computed: usize,
    },
    /// The stored count disagrees with the ACE list.
    #[error("actual ACE count {actual} doesn't match header count {stored}")]
    CountMismatch {
        /// Count field of the ACL header.
        stored: u16,
        /// Length of the ACE list.
        actual: usize,
    },
    /// More ACEs than the 16-bit count field can carry.
    #[error("ACE count {0} exceeds maximum of 65535")]
    CountOverflow(usize),
    /// The text does not start with `<type>:`.
    #[error("invalid ACL string format: must start with 'D:' or 'S:'")]
    MissingPrefix,
    /// The type letter is neither `D` nor `S`.
    #[error("invalid ACL type: {0:?}")]
    InvalidType(char),
    /// A character in the flag run that is no ACL flag.
    #[error("invalid ACL flag: {0:?}")]
    InvalidFlag(char),
    /// A `)` with no `(` before it, or ACE text not starting with `(`.
    #[error("invalid ACL format: missing opening parenthesis")]
    MissingOpeningParenthesis,
    /// A `(` that is never closed.
    #[error("invalid ACE format: missing closing parenthesis")]
    MissingClosingParenthesis,
}

/// Which part of a security descriptor an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Component {
    /// The owner SID.
    Owner,
    /// The primary group SID.
    Group,
    /// The system ACL.
    Sacl,
    /// The discretionary ACL.
    Dacl,
}

impl core::fmt::Display for Component {
    #[inline]
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(match self {
            Self::Owner => "owner",
            Self::Group => "group",
            Self::Sacl => "SACL",
            Self::Dacl => "DACL",
        })
    }
}

/// Errors raised by the security descriptor codecs.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SecurityDescriptorError {
    /// Fewer than 20 header bytes.
    #[error("invalid security descriptor: it must be 20 bytes length at minimum, got {0}")]
    Truncated(usize),
    /// A non-zero offset pointing at or past the end of the buffer.
    #[error("invalid security descriptor: {component} offset {offset:#x} exceeds data length {len:#x}")]
    OffsetOutOfRange {
        /// The field whose offset is bad.
        component: Component,
        /// The offset read from the header.
        offset: u32,
        /// Length of the buffer.
        len: usize,
    },
    /// The owner or group SID failed.
    #[error("error parsing {component} SID: {cause}")]
    Sid {
        /// [`Component::Owner`] or [`Component::Group`].
        component: Component,
        /// The underlying failure.
        cause: SidError,
    },
    /// The SACL or the DACL failed.
    #[error("error parsing {component}: {cause}")]
    Acl {
        /// [`Component::Sacl`] or [`Component::Dacl`].
        component: Component,
        /// The underlying failure.
        cause: AclError,
    },
    /// An ACL is set but its `*_PRESENT` bit is clear.
    #[error("{0} present but its PRESENT control flag is not set")]
    AclWithoutPresentFlag(Component),
    /// A `*_PRESENT` bit is set but the ACL is missing.
    #[error("{0} PRESENT control flag set but the ACL is missing")]
    PresentFlagWithoutAcl(Component),
    /// The encoded descriptor does not fit the 32-bit offsets.
    #[error("security descriptor size {0} exceeds the offset range")]
    SizeOverflow(usize),
    /// Non-empty text with none of `O:`, `G:`, `D:`, `S:`.
    #[error("no components found in security descriptor")]
    NoComponents,
    /// Text that belongs to no component.
    #[error("unexpected content after parsing: {0}")]
    UnexpectedContent(String),
}
