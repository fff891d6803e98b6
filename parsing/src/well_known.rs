//! Well-known SID aliases used by the SDDL string form.
//!
//! Source: https://learn.microsoft.com/windows/win32/secauthz/sid-strings
//!
//! Only aliases that name a fixed SID are listed; domain-relative aliases
//! (`DA`, `DD`, `LA`...) depend on the machine and cannot be resolved here.
//! `NULL` is the one alias longer than two letters.

/// `(canonical SID, alias)` pairs.
pub const SID_ALIASES: &[(&str, &str)] = &[
    // ---- Basic Authorities ----
    ("S-1-0-0", "NULL"), // Null SID
    ("S-1-1-0", "WD"),   // Everyone
    ("S-1-2-0", "LG"),   // Local
    ("S-1-3-0", "CC"),   // Creator Creator
    ("S-1-3-1", "CO"),   // Creator Owner
    ("S-1-3-2", "CG"),   // Creator Group
    ("S-1-3-3", "OW"),   // Owner Rights
    // ---- NT Authority (S-1-5) ----
    ("S-1-5-1", "DU"),  // Dialup
    ("S-1-5-2", "AN"),  // Network
    ("S-1-5-3", "BT"),  // Batch
    ("S-1-5-4", "IU"),  // Interactive
    ("S-1-5-6", "SU"),  // Service
    ("S-1-5-7", "AS"),  // Anonymous
    ("S-1-5-8", "PS"),  // Proxy
    ("S-1-5-9", "ED"),  // Enterprise Domain Controllers
    ("S-1-5-10", "SS"), // Self
    ("S-1-5-11", "AU"), // Authenticated Users
    ("S-1-5-12", "RC"), // Restricted Code
    ("S-1-5-18", "SY"), // Local System
    // ---- BUILTIN Domain (S-1-5-32) ----
    ("S-1-5-32-544", "BA"), // Administrators
    ("S-1-5-32-545", "BU"), // Users
    ("S-1-5-32-546", "BG"), // Guests
    ("S-1-5-32-547", "PU"), // Power Users
    ("S-1-5-32-548", "AO"), // Account Operators
    ("S-1-5-32-549", "SO"), // Server Operators
    ("S-1-5-32-550", "PO"), // Print Operators
    ("S-1-5-32-551", "BO"), // Backup Operators
    ("S-1-5-32-552", "RE"), // Replicator
    ("S-1-5-32-554", "RU"), // Pre-Windows 2000 Compatible Access
    ("S-1-5-32-555", "RD"), // Remote Desktop Users
    ("S-1-5-32-556", "NO"), // Network Configuration Operators
    // ---- Authentication (S-1-5-64) ----
    ("S-1-5-64-10", "AA"), // NTLM Authentication
    ("S-1-5-64-14", "RA"), // SChannel Authentication
    ("S-1-5-64-21", "OA"), // Digest Authentication
];

/// Returns the alias registered for a canonical SID string.
#[must_use]
pub fn alias_for_sid(sid: &str) -> Option<&'static str> {
    SID_ALIASES
        .iter()
        .find(|(canonical, _)| *canonical == sid)
        .map(|&(_, alias)| alias)
}

/// Returns the canonical SID string an alias stands for.
#[must_use]
pub fn sid_for_alias(alias: &str) -> Option<&'static str> {
    SID_ALIASES
        .iter()
        .find(|(_, a)| *a == alias)
        .map(|&(canonical, _)| canonical)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_is_bijective() {
        for (i, (sid, alias)) in SID_ALIASES.iter().enumerate() {
            for (other_sid, other_alias) in SID_ALIASES.iter().skip(i + 1) {
                assert_ne!(sid, other_sid, "duplicate SID {sid}");
                assert_ne!(alias, other_alias, "duplicate alias {alias}");
            }
        }
    }

    #[test]
    fn lookups_are_inverse() {
        assert_eq!(alias_for_sid("S-1-5-18"), Some("SY"));
        assert_eq!(sid_for_alias("BA"), Some("S-1-5-32-544"));
        assert_eq!(alias_for_sid("S-1-5-21-1-2-3"), None);
        assert_eq!(sid_for_alias("ZZ"), None);
    }

    #[test]
    fn null_sid_has_a_long_alias() {
        assert_eq!(alias_for_sid("S-1-0-0"), Some("NULL"));
        assert_eq!(sid_for_alias("NULL"), Some("S-1-0-0"));
        assert_eq!(alias_for_sid("S-1-5-19"), None);
        assert_eq!(sid_for_alias("LS"), None);
    }
}
