//! Fixed-width identifiers used across the chain and view layers.
//!
//! Every identifier is an opaque 32-byte value. They render and serialize as
//! lowercase hex so they can be used as keys in JSON-persisted maps.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};
use std::fmt;

macro_rules! id_type {
	($(#[$meta:meta])* $name:ident) => {
		$(#[$meta])*
		#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
		pub struct $name(pub [u8; 32]);

		impl $name {
			/// Parse from a 64-character hex string.
			pub fn from_hex(s: &str) -> Option<Self> {
				let bytes = hex::decode(s).ok()?;
				let inner: [u8; 32] = bytes.try_into().ok()?;
				Some(Self(inner))
			}

			pub fn to_hex(&self) -> String {
				hex::encode(self.0)
			}
		}

		impl fmt::Display for $name {
			fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
				f.write_str(&self.to_hex())
			}
		}

		impl fmt::Debug for $name {
			fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
				write!(f, "{}({})", stringify!($name), &self.to_hex()[..12])
			}
		}

		impl Serialize for $name {
			fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
				serializer.serialize_str(&self.to_hex())
			}
		}

		impl<'de> Deserialize<'de> for $name {
			fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
				let s = String::deserialize(deserializer)?;
				Self::from_hex(&s).ok_or_else(|| {
					serde::de::Error::custom(format!(
						"invalid {} hex: {}",
						stringify!($name),
						s
					))
				})
			}
		}
	};
}

id_type!(
	/// Value revealed on chain when a note or swap is spent or claimed.
	Nullifier
);
id_type!(
	/// Commitment to a note or swap in the state commitment tree.
	StateCommitment
);
id_type!(AssetId);
id_type!(
	/// Content hash of a transaction.
	TransactionId
);
id_type!(PositionId);
id_type!(AuctionId);
id_type!(IdentityKey);
id_type!(
	/// Root of the state commitment tree.
	Root
);

impl AssetId {
	/// Asset id of a denomination that is derived locally rather than
	/// registered on chain.
	pub fn from_denom(base_denom: &str) -> Self {
		Self(Sha256::digest(base_denom.as_bytes()).into())
	}
}

/// SHA-256 over the bincode encoding of `value`.
pub(crate) fn content_hash<T: Serialize>(value: &T) -> [u8; 32] {
	// bincode cannot fail for the plain data types hashed in this crate
	let encoded = bincode::serialize(value).unwrap_or_default();
	Sha256::digest(&encoded).into()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn hex_round_trip_through_json() {
		let id = Nullifier([7u8; 32]);
		let json = serde_json::to_string(&id).unwrap();
		assert_eq!(json, format!("\"{}\"", "07".repeat(32)));
		let back: Nullifier = serde_json::from_str(&json).unwrap();
		assert_eq!(back, id);
	}

	#[test]
	fn rejects_short_hex() {
		assert!(AssetId::from_hex("abcd").is_none());
		assert!(serde_json::from_str::<AssetId>("\"abcd\"").is_err());
	}

	#[test]
	fn denom_ids_are_deterministic() {
		assert_eq!(
			AssetId::from_denom("auctionnft_0_00"),
			AssetId::from_denom("auctionnft_0_00")
		);
		assert_ne!(
			AssetId::from_denom("auctionnft_0_00"),
			AssetId::from_denom("auctionnft_1_00")
		);
	}
}
