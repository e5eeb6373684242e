//! Tests for shared value types

use locus_core::types::{Address, MethodToken, ModuleIdentity};

#[test]
fn test_identity_formatting_is_deterministic()
{
    let identity = ModuleIdentity::from_u128(0xDEAD_BEEF_0001_0002_A0B1_C2D3_E4F5_0617);
    assert_eq!(identity.to_string(), "deadbeef-0001-0002-a0b1-c2d3e4f50617");
    assert_eq!(identity.to_string(), ModuleIdentity::from_u128(identity.as_u128()).to_string());
}

#[test]
fn test_identity_from_in_memory_guid()
{
    let bytes = [
        0x3d, 0x2c, 0x1b, 0x0a, 0x05, 0x04, 0x07, 0x06, 0x08, 0x09, 0x0a, 0x0b, 0x0c, 0x0d, 0x0e, 0x0f,
    ];
    assert_eq!(
        ModuleIdentity::from_bytes_le(bytes).to_string(),
        "0a1b2c3d-0405-0607-0809-0a0b0c0d0e0f"
    );
}

#[test]
fn test_address_display_and_containment()
{
    let base = Address::new(0x1000);
    assert_eq!(base.to_string(), "0x0000000000001000");
    assert!(base.range_contains(0x100, Address::new(0x10ff)));
    assert!(!base.range_contains(0x100, Address::new(0x1100)));
    assert!(!base.range_contains(0x100, Address::new(0x0fff)));
}

#[test]
fn test_method_token_display()
{
    assert_eq!(MethodToken::new(0x0600_0001).to_string(), "0x06000001");
    assert_eq!(MethodToken::from(7).raw(), 7);
}
