//! Module version identity.

use std::fmt;

/// Content identity of a compiled module (its module version id).
///
/// The value is written by the compiler into the module's metadata and is the
/// same for identical binaries no matter where, or in which process, they are
/// loaded. Front ends use it to correlate a module across debug sessions.
///
/// The fields follow the GUID layout the metadata stores: a `u32`, two `u16`
/// values, and eight trailing bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ModuleIdentity
{
    data1: u32,
    data2: u16,
    data3: u16,
    data4: [u8; 8],
}

impl ModuleIdentity
{
    /// Build an identity from its GUID fields.
    pub const fn from_fields(data1: u32, data2: u16, data3: u16, data4: [u8; 8]) -> Self
    {
        Self {
            data1,
            data2,
            data3,
            data4,
        }
    }

    /// Decode the 16-byte in-memory GUID representation.
    ///
    /// The first three fields are little-endian, the trailing eight bytes are
    /// taken as-is.
    pub fn from_bytes_le(bytes: [u8; 16]) -> Self
    {
        let mut data4 = [0u8; 8];
        data4.copy_from_slice(&bytes[8..]);
        Self {
            data1: u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
            data2: u16::from_le_bytes([bytes[4], bytes[5]]),
            data3: u16::from_le_bytes([bytes[6], bytes[7]]),
            data4,
        }
    }

    /// Build an identity from a 128-bit value read as `data1 | data2 | data3 | data4`,
    /// most significant bits first.
    pub fn from_u128(value: u128) -> Self
    {
        let bytes = value.to_be_bytes();
        let mut data4 = [0u8; 8];
        data4.copy_from_slice(&bytes[8..]);
        Self {
            data1: u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
            data2: u16::from_be_bytes([bytes[4], bytes[5]]),
            data3: u16::from_be_bytes([bytes[6], bytes[7]]),
            data4,
        }
    }

    /// Inverse of [`ModuleIdentity::from_u128`].
    pub fn as_u128(self) -> u128
    {
        let mut bytes = [0u8; 16];
        bytes[..4].copy_from_slice(&self.data1.to_be_bytes());
        bytes[4..6].copy_from_slice(&self.data2.to_be_bytes());
        bytes[6..8].copy_from_slice(&self.data3.to_be_bytes());
        bytes[8..].copy_from_slice(&self.data4);
        u128::from_be_bytes(bytes)
    }
}

impl fmt::Display for ModuleIdentity
{
    /// Canonical lowercase hyphenated form, e.g. `0a1b2c3d-0405-0607-0809-0a0b0c0d0e0f`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        write!(
            f,
            "{:08x}-{:04x}-{:04x}-{:02x}{:02x}-",
            self.data1, self.data2, self.data3, self.data4[0], self.data4[1]
        )?;
        for byte in &self.data4[2..] {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}
