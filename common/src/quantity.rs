//! Arbitrary-precision token amount.
//!
//! Grounded on the teacher's `common/src/uint.rs` big-unsigned wrapper: a
//! native integer dressed up with big-endian, leading-zero-stripped byte
//! serialization so that two quantities with the same value always encode
//! to the same canonical bytes regardless of how they were constructed.
use std::{
    fmt,
    iter::Sum,
    ops::{Add, AddAssign, Sub, SubAssign},
};

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

/// A non-negative token amount. Backed by `u128`, which comfortably spans
/// any realistic token supply while keeping arithmetic checked and panic
/// on overflow/underflow, as ledger balances must never silently wrap.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct Quantity(u128);

impl Quantity {
    pub const fn new(value: u128) -> Self {
        Quantity(value)
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn checked_sub(&self, other: &Quantity) -> Option<Quantity> {
        self.0.checked_sub(other.0).map(Quantity)
    }

    pub fn checked_add(&self, other: &Quantity) -> Option<Quantity> {
        self.0.checked_add(other.0).map(Quantity)
    }

    pub fn as_u128(&self) -> u128 {
        self.0
    }
}

impl From<u128> for Quantity {
    fn from(value: u128) -> Self {
        Quantity(value)
    }
}

impl From<u64> for Quantity {
    fn from(value: u64) -> Self {
        Quantity(value as u128)
    }
}

impl Add for Quantity {
    type Output = Quantity;
    fn add(self, rhs: Quantity) -> Quantity {
        Quantity(self.0.checked_add(rhs.0).expect("quantity overflow"))
    }
}

impl AddAssign for Quantity {
    fn add_assign(&mut self, rhs: Quantity) {
        self.0 = self.0.checked_add(rhs.0).expect("quantity overflow");
    }
}

impl Sub for Quantity {
    type Output = Quantity;
    fn sub(self, rhs: Quantity) -> Quantity {
        Quantity(self.0.checked_sub(rhs.0).expect("quantity underflow"))
    }
}

impl SubAssign for Quantity {
    fn sub_assign(&mut self, rhs: Quantity) {
        self.0 = self.0.checked_sub(rhs.0).expect("quantity underflow");
    }
}

impl Sum for Quantity {
    fn sum<I: Iterator<Item = Quantity>>(iter: I) -> Self {
        iter.fold(Quantity(0), |acc, q| acc + q)
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for Quantity {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let buffer = self.0.to_be_bytes();
        let leading_empty = buffer.iter().take_while(|b| **b == 0).count();
        serializer.serialize_bytes(&buffer[leading_empty..])
    }
}

impl<'de> Deserialize<'de> for Quantity {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let bytes = serde_bytes::ByteBuf::deserialize(deserializer)?;
        if bytes.len() > 16 {
            return Err(de::Error::custom("quantity exceeds 128 bits"));
        }
        if !bytes.is_empty() && bytes[0] == 0 {
            return Err(de::Error::custom("non-canonical quantity encoding"));
        }
        let mut buffer = [0u8; 16];
        buffer[16 - bytes.len()..].copy_from_slice(&bytes);
        Ok(Quantity(u128::from_be_bytes(buffer)))
    }
}
