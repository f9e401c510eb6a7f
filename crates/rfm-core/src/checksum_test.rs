use super::*;

#[test]
fn test_known_digest() {
    assert_eq!(
        compute_checksum(b""),
        "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
    );
    assert_eq!(
        compute_checksum(b"abc"),
        "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
    );
}

#[test]
fn test_digest_is_fixed_length_hex() {
    let digest = compute_checksum(b"create table t(id int);");
    assert_eq!(digest.len(), 64);
    assert!(digest
        .chars()
        .all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
}

#[test]
fn test_whitespace_changes_digest() {
    assert_ne!(
        compute_checksum(b"create table t(id int);"),
        compute_checksum(b"create table t(id int);\n")
    );
}
