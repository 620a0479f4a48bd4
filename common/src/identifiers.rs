//! Chain/runtime identifiers, epoch and round counters.

/// Logical clock tracking committee elections and node expiration.
///
/// `EpochTime` is monotonically increasing; `EPOCH_INVALID` marks a
/// not-yet-assigned value and must never compare live against any node.
pub type EpochTime = u64;

/// Sentinel for "no epoch assigned yet".
pub const EPOCH_INVALID: EpochTime = u64::MAX;

/// A single execution cycle on a runtime.
pub type Round = u64;

/// Implement fixed-width byte-array newtypes with hex `Debug`/`Display` and
/// a `serde_bytes`-style wire encoding (plain bytes, not a CBOR array).
///
/// Grounded on `common/src/uint.rs`'s `impl_serialize_for_uint!`/
/// `impl_deserialize_for_uint!` pair in the teacher, generalized from
/// big-endian integers to opaque fixed-width byte strings.
#[macro_export]
macro_rules! fixed_bytes_type {
    ($name:ident, $size:expr) => {
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name([u8; $size]);

        impl ::std::default::Default for $name {
            fn default() -> Self {
                $name([0u8; $size])
            }
        }

        impl $name {
            pub const fn from_bytes(bytes: [u8; $size]) -> Self {
                $name(bytes)
            }

            pub fn as_bytes(&self) -> &[u8; $size] {
                &self.0
            }

            pub fn to_vec(&self) -> Vec<u8> {
                self.0.to_vec()
            }
        }

        impl ::std::fmt::Debug for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                write!(f, "{}", ::rustc_hex::ToHex::to_hex::<String>(&self.0[..]))
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                write!(f, "{}", ::rustc_hex::ToHex::to_hex::<String>(&self.0[..]))
            }
        }

        impl ::std::convert::TryFrom<&[u8]> for $name {
            type Error = ::anyhow::Error;

            fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
                if bytes.len() != $size {
                    ::anyhow::bail!(
                        "{} must be {} bytes, got {}",
                        stringify!($name),
                        $size,
                        bytes.len()
                    );
                }
                let mut buf = [0u8; $size];
                buf.copy_from_slice(bytes);
                Ok($name(buf))
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                use ::std::convert::TryFrom as _;
                let bytes: Vec<u8> = ::rustc_hex::FromHex::from_hex(s).expect("invalid hex");
                $name::try_from(bytes.as_slice()).expect("invalid length")
            }
        }

        impl ::serde::Serialize for $name {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: ::serde::Serializer,
            {
                serializer.serialize_bytes(&self.0)
            }
        }

        impl<'de> ::serde::Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: ::serde::Deserializer<'de>,
            {
                let bytes = ::serde_bytes::ByteBuf::deserialize(deserializer)?;
                <$name as ::std::convert::TryFrom<&[u8]>>::try_from(bytes.as_slice())
                    .map_err(::serde::de::Error::custom)
            }
        }
    };
}

fixed_bytes_type!(Namespace, 32);
