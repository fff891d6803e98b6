//! # Windows security descriptors for Rust
//!
//! Converts Windows security descriptors between the compact binary
//! *self-relative* layout and SDDL (Security Descriptor Definition Language)
//! strings. The crate provides:
//! - [`Sid`]: an owned security identifier with binary and SDDL codecs,
//!   including the two-letter aliases (`SY`, `BA`, `WD`, ...).
//! - [`Ace`]: a standard access control entry (header, access mask, trustee).
//! - [`Acl`]: an ordered list of ACEs, discretionary or system.
//! - [`SecurityDescriptor`]: owner, group, DACL, SACL and the
//!   [`SecurityDescriptorControl`] word.
//! - [`SelfRelativeHeader`]: the fixed 20-byte header of the binary form.
//! - [`well_known`]: alias tables for SIDs and access masks.
//!
//! ## Overview
//! Every structure has four entry points: `from_bytes`, `to_bytes`,
//! [`FromStr`](core::str::FromStr) and `to_sddl`. Decoders never panic on
//! untrusted input; every failure is a typed error naming the component that
//! failed. Encoders cross-check stored size and count fields against the
//! content instead of silently fixing them.
//!
//! ## Examples
//! ### Parse SDDL and encode it
//! ```rust
//! use win_sddl::SecurityDescriptor;
//!
//! let sd: SecurityDescriptor = "O:SYG:BAD:(A;;FA;;;SY)(D;;FR;;;WD)".parse().unwrap();
//! let bytes = sd.to_bytes().unwrap();
//! assert_eq!(&bytes[..4], &[1, 0, 0x24, 0x80]);
//!
//! let back = SecurityDescriptor::from_bytes(&bytes).unwrap();
//! assert_eq!(back.to_sddl().unwrap(), "O:SYG:BAD:(A;;FA;;;SY)(D;;FR;;;WD)");
//! ```
//!
//! ### Build an ACE by hand
//! ```rust
//! use win_sddl::{Ace, AceFlags, AceType, Sid};
//!
//! let everyone: Sid = "WD".parse().unwrap();
//! let ace = Ace::new(AceType::ACCESS_DENIED, AceFlags::empty(), 0x0012_0089, everyone).unwrap();
//! assert_eq!(ace.header.ace_size, 20);
//! assert_eq!(ace.to_sddl().unwrap(), "(D;;FR;;;WD)");
//! ```
//!
//! ## Windows-only functionality
//! *Available behind `cfg(windows)`.*
//!
//! - [`read_file_security`] and `SecurityDescriptor::from_file` fetch a
//!   file's descriptor through `GetFileSecurityW`.

#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_auto_cfg, doc_cfg))]

use cfg_if::cfg_if;

mod ace;
mod acl;
mod control;
mod error;
mod security_descriptor;
mod sid;
mod sid_identifier_authority;
pub mod well_known;

#[cfg(feature = "serde")]
mod serde_impl;

/// Bounds-checked readers over untrusted bytes.
pub(crate) mod utils;

pub use ace::{ACE_FIXED_SIZE, ACE_MIN_SIZE, Ace, AceFlags, AceHeader, AceType};
pub use acl::{ACL_HEADER_SIZE, ACL_REVISION, Acl, AclType};
pub use control::SecurityDescriptorControl;
pub use error::{AceError, AclError, Component, SecurityDescriptorError, SidError};
pub use security_descriptor::{
    Indented, SECURITY_DESCRIPTOR_REVISION, SELF_RELATIVE_HEADER_SIZE, SecurityDescriptor,
    SelfRelativeHeader,
};
pub use sid::{SID_HEADER_SIZE, Sid};

/// Identifier authority component of a SID (48-bit value).
pub use sid_identifier_authority::SidIdentifierAuthority;

/// Numeric limits of the SID grammar.
pub use parsing::{IDENTIFIER_AUTHORITY_LIMIT, MAX_SUBAUTHORITY_COUNT, SID_REVISION};

/// Builds a [`Sid`] from a string literal checked at compile time.
#[cfg(feature = "macro")]
pub use sid_macro::sid;

cfg_if! {
    if #[cfg(windows)] {
        mod ext;
        #[cfg_attr(docsrs, doc(cfg(windows)))]
        pub use ext::windows::{FileSecurityError, read_file_security};
    }
}

#[cfg(test)]
pub(crate) use ace::test::arb_ace;
#[cfg(test)]
pub(crate) use sid::test::arb_trustee;
#[cfg(test)]
pub(crate) use sid_identifier_authority::test::arb_identifier_authority;
