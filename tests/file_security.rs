// Windows-only integration test that reads a real file's descriptor
#![cfg(windows)]
#![allow(clippy::unwrap_used, reason = "Unwrap is not an issue in tests")]

use win_sddl::{SecurityDescriptor, read_file_security};

#[test]
fn reads_and_round_trips_file_descriptor() {
    let path = std::env::current_exe().unwrap();
    let bytes = read_file_security(&path).unwrap();
    let sd = SecurityDescriptor::from_bytes(&bytes).unwrap();
    assert!(sd.owner.is_some(), "file descriptor must carry an owner");
    assert!(sd.dacl.is_some(), "file descriptor must carry a DACL");

    let text = sd.to_sddl().unwrap();
    let reparsed: SecurityDescriptor = text.parse().unwrap();
    assert_eq!(reparsed.to_sddl().unwrap(), text);
    assert_eq!(SecurityDescriptor::from_file(&path).unwrap(), sd);
}

#[test]
fn missing_file_is_an_error() {
    let err = read_file_security(r"C:\this\path\does\not\exist.txt").unwrap_err();
    assert!(!err.to_string().is_empty());
}
