// End-to-end checks of the public codecs on documented sample values.
#![allow(clippy::unwrap_used, reason = "Unwrap is not an issue in tests")]

use win_sddl::{
    Ace, AceFlags, AceType, Acl, AclError, AclType, Component, SecurityDescriptor,
    SecurityDescriptorControl, SecurityDescriptorError, SelfRelativeHeader, Sid, SidError,
    well_known,
};

#[test]
fn binary_sid_renders_alias() {
    let bytes = [0x01, 0x01, 0, 0, 0, 0, 0, 0x05, 0x12, 0, 0, 0];
    let sid = Sid::from_bytes(&bytes).unwrap();
    assert_eq!(sid.to_sddl().unwrap(), "SY");
    assert_eq!(sid.to_string(), "S-1-5-18");
    assert_eq!(sid.to_bytes().unwrap(), bytes);
}

#[test]
fn full_access_ace() {
    let ace: Ace = "(A;;FA;;;SY)".parse().unwrap();
    assert_eq!(ace.header.ace_type, AceType::ACCESS_ALLOWED);
    assert_eq!(ace.header.ace_flags, AceFlags::empty());
    assert_eq!(ace.access_mask, 0x001F_01FF);
    assert_eq!(ace.sid, "S-1-5-18".parse().unwrap());
    let bytes = ace.to_bytes().unwrap();
    assert_eq!(bytes.len(), 20);
    assert_eq!(Ace::from_bytes(&bytes).unwrap(), ace);
}

#[test]
fn empty_dacl() {
    let acl: Acl = "D:".parse().unwrap();
    assert_eq!(acl.acl_revision, 2);
    assert_eq!(acl.acl_size, 8);
    assert_eq!(acl.acl_type, AclType::Discretionary);
    assert_eq!(acl.control, SecurityDescriptorControl::DACL_PRESENT);
    assert!(acl.is_empty());
    assert_eq!(acl.to_sddl().unwrap(), "D:");
}

#[test]
fn full_descriptor_round_trips() {
    const SDDL: &str = "O:SYG:BAD:(A;;FA;;;SY)(D;;FR;;;WD)";
    let sd: SecurityDescriptor = SDDL.parse().unwrap();
    assert_eq!(sd.owner.as_ref().unwrap().to_sddl().unwrap(), "SY");
    assert_eq!(sd.group.as_ref().unwrap().to_sddl().unwrap(), "BA");
    let dacl = sd.dacl.as_ref().unwrap();
    let types: Vec<AceType> = dacl.iter().map(|ace| ace.header.ace_type).collect();
    assert_eq!(types, [AceType::ACCESS_ALLOWED, AceType::ACCESS_DENIED]);
    assert_eq!(sd.to_sddl().unwrap(), SDDL);

    let bytes = sd.to_bytes().unwrap();
    let header = SelfRelativeHeader::from_bytes(&bytes).unwrap();
    assert_eq!(header.revision, 1);
    assert_eq!(header.sacl_offset, 0);
    let decoded = SecurityDescriptor::try_from(bytes.as_slice()).unwrap();
    assert_eq!(decoded, sd);
    assert_eq!(decoded.to_sddl().unwrap(), SDDL);
}

#[test]
fn sixteen_sub_authorities_are_rejected() {
    let text = "S-1-5-21-1-2-3-4-5-6-7-8-9-10-11-12-13-14-15";
    assert_eq!(text.parse::<Sid>(), Err(SidError::TooManySubAuthorities(16)));
}

#[test]
fn aliases_are_idempotent() {
    for &(canonical, alias) in well_known::SID_ALIASES {
        let sid: Sid = alias.parse().unwrap();
        assert_eq!(sid, canonical.parse::<Sid>().unwrap(), "alias {alias}");
        assert_eq!(sid.to_sddl().unwrap(), alias);
    }
}

#[test]
fn sacl_round_trip_through_binary() {
    let sd: SecurityDescriptor = "O:BAG:SYD:PAI(A;OICI;FA;;;BA)(A;OICIIO;0x10000000;;;CO)S:AI(AU;SAFA;FA;;;WD)"
        .parse()
        .unwrap();
    let bytes = sd.to_bytes().unwrap();
    let decoded = SecurityDescriptor::from_bytes(&bytes).unwrap();
    assert_eq!(
        decoded.to_sddl().unwrap(),
        "O:BAG:SYD:PAI(A;OICI;FA;;;BA)(A;OICIIO;GA;;;CO)S:AI(AU;SAFA;FA;;;WD)"
    );
}

#[test]
fn nested_failures_name_their_component() {
    let err = "O:SYD:(A;;FA;;;SY)(A;;;;;SY)"
        .parse::<SecurityDescriptor>()
        .unwrap_err();
    assert!(matches!(
        err,
        SecurityDescriptorError::Acl {
            component: Component::Dacl,
            cause: AclError::Ace { index: 1, .. },
        }
    ));
    assert!(err.to_string().starts_with("error parsing DACL: error parsing ACE 1: "));
}

#[cfg(feature = "macro")]
#[test]
fn sid_macro_builds_values() {
    let system = win_sddl::sid!("SY");
    let admins = win_sddl::sid!("S-1-5-32-544");
    let sd: SecurityDescriptor = "O:SYG:BA".parse().unwrap();
    assert_eq!(sd.owner, Some(system));
    assert_eq!(sd.group, Some(admins));
}
