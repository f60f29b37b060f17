use serde::{Deserialize, Serialize};

/// Declares an integer identifier assigned by the database.
///
/// Each identifier is its own type so an order id can never be passed where
/// an item id is expected.
macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            /// Wraps a raw identifier value.
            pub fn new(value: i64) -> Self {
                Self(value)
            }

            /// Returns the raw identifier value.
            pub fn as_i64(&self) -> i64 {
                self.0
            }

            /// Returns true if the value can refer to a stored row.
            pub fn is_valid(&self) -> bool {
                self.0 > 0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i64> for $name {
            fn from(value: i64) -> Self {
                Self(value)
            }
        }

        impl From<$name> for i64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id!(
    /// Identifier of a committed order (a "sale").
    OrderId
);

define_id!(
    /// Identifier of a single order line.
    OrderLineId
);

define_id!(
    /// Identifier of an inventory item.
    ItemId
);

define_id!(
    /// Identifier of the user who owns an order.
    UserId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_preserves_value() {
        let id = OrderId::new(42);
        assert_eq!(id.as_i64(), 42);
        assert_eq!(i64::from(id), 42);
        assert_eq!(ItemId::from(7).to_string(), "7");
    }

    #[test]
    fn id_validity() {
        assert!(UserId::new(1).is_valid());
        assert!(!UserId::new(0).is_valid());
        assert!(!UserId::new(-3).is_valid());
    }

    #[test]
    fn id_serializes_transparently() {
        let json = serde_json::to_string(&ItemId::new(9)).unwrap();
        assert_eq!(json, "9");
        let parsed: UserId = serde_json::from_str("12").unwrap();
        assert_eq!(parsed, UserId::new(12));
    }
}
