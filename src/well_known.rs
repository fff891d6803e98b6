//! Well-known names used by the SDDL string form.
//!
//! Source: https://learn.microsoft.com/windows/win32/secauthz/ace-strings
//!
//! SID aliases live in the parsing crate so the `sid!` macro can resolve
//! them at compile time; they are re-exported here next to the access-mask
//! tables.

pub use parsing::well_known::{SID_ALIASES, alias_for_sid, sid_for_alias};

/// Composite access masks with a dedicated alias.
pub const ACCESS_MASK_ALIASES: &[(u32, &str)] = &[
    (0x001F_01FF, "FA"), // FILE_ALL_ACCESS
    (0x0012_0089, "FR"), // FILE_GENERIC_READ
    (0x0012_0116, "FW"), // FILE_GENERIC_WRITE
    (0x0012_00A0, "FX"), // FILE_GENERIC_EXECUTE
];

/// Single-right codes, sorted by ascending bit value.
pub const ACCESS_MASK_COMPONENTS: &[(u32, &str)] = &[
    // ---- Directory service object rights ----
    (0x0000_0001, "CC"), // create child
    (0x0000_0002, "DC"), // delete child
    (0x0000_0004, "LC"), // list children
    (0x0000_0008, "SW"), // self write
    (0x0000_0010, "RP"), // read property
    (0x0000_0020, "WP"), // write property
    (0x0000_0040, "DT"), // delete tree
    (0x0000_0080, "LO"), // list object
    (0x0000_0100, "CR"), // control access
    // ---- Standard rights ----
    (0x0001_0000, "SD"), // delete
    (0x0002_0000, "RC"), // read control
    (0x0004_0000, "WD"), // write DAC
    (0x0008_0000, "WO"), // write owner
    (0x0010_0000, "SY"), // synchronize
    (0x0100_0000, "AS"), // access system security
    (0x0200_0000, "MA"), // maximum allowed
    // ---- Generic rights ----
    (0x1000_0000, "GA"), // generic all
    (0x2000_0000, "GX"), // generic execute
    (0x4000_0000, "GW"), // generic write
    (0x8000_0000, "GR"), // generic read
];

/// Alias registered for an exact composite mask.
#[inline]
#[must_use]
pub fn access_mask_alias(mask: u32) -> Option<&'static str> {
    ACCESS_MASK_ALIASES
        .iter()
        .find(|&&(value, _)| value == mask)
        .map(|&(_, alias)| alias)
}

/// Composite mask an alias stands for.
#[inline]
#[must_use]
pub fn access_mask_for_alias(alias: &str) -> Option<u32> {
    ACCESS_MASK_ALIASES
        .iter()
        .find(|&&(_, a)| a == alias)
        .map(|&(value, _)| value)
}

/// Spells `mask` as concatenated component codes, lowest bit first.
///
/// Returns `None` for an empty mask or when some set bit has no code.
#[must_use]
pub fn decompose_access_mask(mask: u32) -> Option<String> {
    let mut remaining = mask;
    let mut codes = String::new();
    for &(bit, code) in ACCESS_MASK_COMPONENTS {
        if remaining & bit != 0 {
            codes.push_str(code);
            remaining &= !bit;
        }
    }
    (mask != 0 && remaining == 0).then_some(codes)
}

/// Reads a run of two-letter component codes back into a mask.
///
/// Returns `None` on an odd length or on any unknown code.
#[must_use]
pub fn compose_access_mask(codes: &str) -> Option<u32> {
    if codes.is_empty() || codes.len() % 2 != 0 {
        return None;
    }
    let mut mask = 0u32;
    let mut rest = codes;
    while let (Some(code), Some(tail)) = (rest.get(..2), rest.get(2..)) {
        let (bit, _) = ACCESS_MASK_COMPONENTS.iter().find(|&&(_, c)| c == code)?;
        mask |= bit;
        rest = tail;
    }
    rest.is_empty().then_some(mask)
}
