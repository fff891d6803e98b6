use bitflags::bitflags;

bitflags! {
    /// `SECURITY_DESCRIPTOR_CONTROL` bits.
    ///
    /// Bits without a name here are kept as-is through both codecs.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct SecurityDescriptorControl: u16 {
        /// Owner was supplied by a default mechanism.
        const OWNER_DEFAULTED = 0x0001;
        /// Group was supplied by a default mechanism.
        const GROUP_DEFAULTED = 0x0002;
        /// The descriptor carries a DACL.
        const DACL_PRESENT = 0x0004;
        /// DACL was supplied by a default mechanism (`R` on `D:`).
        const DACL_DEFAULTED = 0x0008;
        /// The descriptor carries a SACL.
        const SACL_PRESENT = 0x0010;
        /// SACL was supplied by a default mechanism (`R` on `S:`).
        const SACL_DEFAULTED = 0x0020;
        /// The DACL comes from a trusted source.
        const DACL_TRUSTED = 0x0040;
        /// Server ACL replacement was requested.
        const SERVER_SECURITY = 0x0080;
        /// `AR` on `D:`.
        const DACL_AUTO_INHERIT_REQUIRED = 0x0100;
        /// `AR` on `S:`.
        const SACL_AUTO_INHERIT_REQUIRED = 0x0200;
        /// `AI` on `D:`.
        const DACL_AUTO_INHERITED = 0x0400;
        /// `AI` on `S:`.
        const SACL_AUTO_INHERITED = 0x0800;
        /// `P` on `D:`: inheritable ACEs from the parent are blocked.
        const DACL_PROTECTED = 0x1000;
        /// `P` on `S:`.
        const SACL_PROTECTED = 0x2000;
        /// The resource manager control byte is valid.
        const RM_CONTROL_VALID = 0x4000;
        /// The descriptor is in self-relative form.
        const SELF_RELATIVE = 0x8000;

        const _ = !0;
    }
}

impl SecurityDescriptorControl {
    /// The state of a descriptor parsed from an empty SDDL string.
    pub const NOTHING_SPECIFIED: Self = Self::SELF_RELATIVE
        .union(Self::OWNER_DEFAULTED)
        .union(Self::GROUP_DEFAULTED)
        .union(Self::DACL_DEFAULTED)
        .union(Self::SACL_DEFAULTED);
}
