//! Canonical Primitive Types for the Vote-Lock Ledger
//!
//! Rule: No String identifiers in ledger state. Ever.
//!
//! These types are shared by the token ledger and the vote-lock engine.
//! They are designed to be:
//! - Fixed-size (no dynamic allocation)
//! - Deterministically serializable
//! - Efficient to copy and compare

use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// TYPE ALIASES
// ============================================================================

/// Block height in the chain (0-indexed)
pub type BlockHeight = u64;

/// Unix timestamp in seconds
pub type Timestamp = u64;

/// Token amounts (supports up to ~340 undecillion units)
pub type Amount = u128;

/// Basis points for percentage calculations (10000 = 100%)
pub type Bps = u16;

/// Maximum basis points (100%)
pub const MAX_BPS: Bps = 10_000;

// ============================================================================
// TIME SOURCE
// ============================================================================

/// The host's view of "now": a block height and its timestamp.
///
/// Both components are expected to be monotonically non-decreasing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct BlockStamp {
    pub height: BlockHeight,
    pub timestamp: Timestamp,
}

impl BlockStamp {
    pub const fn new(height: BlockHeight, timestamp: Timestamp) -> Self {
        Self { height, timestamp }
    }

    /// True if `self` is not behind `earlier` in either height or time.
    pub fn is_at_or_after(&self, earlier: &BlockStamp) -> bool {
        self.height >= earlier.height && self.timestamp >= earlier.timestamp
    }
}

impl fmt::Display for BlockStamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}@{}", self.height, self.timestamp)
    }
}

// ============================================================================
// IDENTITY TYPES
// ============================================================================

/// 32-byte account address
#[derive(Clone, Copy, Eq, PartialEq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub struct Address(pub [u8; 32]);

impl Address {
    /// Create a new Address from raw bytes
    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Create a zeroed Address
    pub const fn zero() -> Self {
        Self([0u8; 32])
    }

    /// Get the underlying bytes
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Check if this is the zero address
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", hex::encode(&self.0[..8]))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl From<[u8; 32]> for Address {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl AsRef<[u8]> for Address {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

// ============================================================================
// TOKEN TYPES
// ============================================================================

/// 32-byte token identifier
#[derive(Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize, Default)]
pub struct TokenId(pub [u8; 32]);

impl TokenId {
    /// Create a new TokenId from raw bytes
    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Get the underlying bytes
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Debug for TokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TokenId({})", hex::encode(&self.0[..8]))
    }
}

impl fmt::Display for TokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl From<[u8; 32]> for TokenId {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_basics() {
        let addr = Address::new([3u8; 32]);
        assert!(!addr.is_zero());
        assert_eq!(addr.as_bytes(), &[3u8; 32]);
        assert!(Address::zero().is_zero());
    }

    #[test]
    fn test_address_debug_is_truncated() {
        let addr = Address::new([0xab; 32]);
        assert_eq!(format!("{:?}", addr), "Address(abababababababab)");
        assert_eq!(format!("{}", addr).len(), 64);
    }

    #[test]
    fn test_block_stamp_ordering() {
        let earlier = BlockStamp::new(10, 1_000);
        let later = BlockStamp::new(11, 1_012);
        assert!(later.is_at_or_after(&earlier));
        assert!(earlier.is_at_or_after(&earlier));
        assert!(!earlier.is_at_or_after(&later));

        // Height moved forward but time went back.
        let skewed = BlockStamp::new(12, 999);
        assert!(!skewed.is_at_or_after(&earlier));
    }

    #[test]
    fn test_block_stamp_serialization() {
        let stamp = BlockStamp::new(42, 604_800);
        let bytes = bincode::serialize(&stamp).unwrap();
        let restored: BlockStamp = bincode::deserialize(&bytes).unwrap();
        assert_eq!(stamp, restored);
        assert_eq!(format!("{}", stamp), "#42@604800");
    }
}
