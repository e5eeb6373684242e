//! Target virtual address type.

use std::fmt;

/// Strongly typed virtual address in the debuggee
///
/// Module base addresses are the registry's primary key. Wrapping them keeps
/// them from being mixed up with image sizes or IL offsets, which are plain
/// integers of similar width.
///
/// ## Example
///
/// ```rust
/// use locus_core::types::Address;
///
/// let base = Address::from(0x7f00_0000_0000);
/// assert_eq!(base.value(), 0x7f00_0000_0000);
/// assert!(base.range_contains(0x1000, Address::from(0x7f00_0000_0800)));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Address(u64);

impl Address
{
    /// Create a new address from a `u64` value
    pub const fn new(value: u64) -> Self
    {
        Address(value)
    }

    /// Get the raw `u64` value of this address
    pub const fn value(self) -> u64
    {
        self.0
    }

    /// Whether `address` falls inside `[self, self + size)`.
    ///
    /// Ranges that would wrap past the top of the address space are clamped.
    pub fn range_contains(self, size: u64, address: Address) -> bool
    {
        let end = self.0.saturating_add(size);
        address.0 >= self.0 && address.0 < end
    }
}

impl From<u64> for Address
{
    fn from(value: u64) -> Self
    {
        Address(value)
    }
}

impl From<Address> for u64
{
    fn from(address: Address) -> Self
    {
        address.0
    }
}

impl fmt::Display for Address
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        write!(f, "0x{:016x}", self.0)
    }
}
