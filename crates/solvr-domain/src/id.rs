//! UUIDv7-backed identifiers
//!
//! Every entity gets its own newtype so an `ApproachId` can never be passed
//! where a `ProblemId` is expected. All of them share the same representation:
//!
//! - Chronological sortability for temporal queries
//! - 128-bit uniqueness
//! - RFC 9562 string format on the wire and in the database

/// Declare a UUIDv7-backed identifier newtype.
macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(u128);

        impl $name {
            /// Generate a new UUIDv7-based identifier
            pub fn new() -> Self {
                Self(uuid::Uuid::now_v7().as_u128())
            }

            /// Create an identifier from a raw u128 value
            pub fn from_value(value: u128) -> Self {
                Self(value)
            }

            /// Parse an identifier from its UUID string form
            pub fn parse(s: &str) -> Result<Self, String> {
                uuid::Uuid::parse_str(s)
                    .map(|u| Self(u.as_u128()))
                    .map_err(|e| format!("invalid {} {:?}: {}", stringify!($name), s, e))
            }

            /// Get the raw u128 value
            pub fn value(&self) -> u128 {
                self.0
            }

            /// Unix millisecond timestamp embedded in the UUIDv7
            pub fn timestamp_millis(&self) -> u64 {
                (self.0 >> 80) as u64
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", uuid::Uuid::from_u128(self.0))
            }
        }

        impl std::str::FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::parse(s)
            }
        }

        impl serde::Serialize for $name {
            fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.collect_str(self)
            }
        }

        impl<'de> serde::Deserialize<'de> for $name {
            fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                Self::parse(&s).map_err(serde::de::Error::custom)
            }
        }
    };
}

pub(crate) use uuid_id;


#[cfg(test)]
mod proptests {
    use crate::ApproachId;
    use proptest::prelude::*;

    proptest! {
        /// Ordering of identifiers matches ordering of the raw values
        #[test]
        fn test_id_ordering_property(a: u128, b: u128) {
            let id_a = ApproachId::from_value(a);
            let id_b = ApproachId::from_value(b);
            prop_assert_eq!(id_a < id_b, a < b);
            prop_assert_eq!(id_a == id_b, a == b);
        }

        #[test]
        fn test_id_string_roundtrip(value: u128) {
            let id = ApproachId::from_value(value);
            match ApproachId::parse(&id.to_string()) {
                Ok(parsed) => prop_assert_eq!(id, parsed),
                Err(e) => return Err(TestCaseError::fail(e)),
            }
        }
    }
}
