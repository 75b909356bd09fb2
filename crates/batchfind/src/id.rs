use std::borrow::Borrow;
use std::fmt;

use serde::Deserialize;

/// Resource kind, e.g. `user`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(transparent)]
pub struct ResourceType(String);

impl ResourceType {
	/// Creates a resource type.
	pub fn new(name: impl Into<String>) -> Self {
		Self(name.into())
	}

	/// Returns the type name.
	pub fn as_str(&self) -> &str {
		&self.0
	}
}

/// Entity identifier within one [`ResourceType`].
///
/// Ids are compared as strings, so `EntityId::from(1)` and
/// `EntityId::from("1")` name the same entity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
	/// Creates an id.
	pub fn new(id: impl Into<String>) -> Self {
		Self(id.into())
	}

	/// Returns the id as a string.
	pub fn as_str(&self) -> &str {
		&self.0
	}
}

macro_rules! string_newtype_conversions {
	($ty:ident) => {
		impl From<&str> for $ty {
			fn from(value: &str) -> Self {
				Self(value.to_owned())
			}
		}

		impl From<String> for $ty {
			fn from(value: String) -> Self {
				Self(value)
			}
		}

		impl From<&$ty> for $ty {
			fn from(value: &$ty) -> Self {
				value.clone()
			}
		}

		impl Borrow<str> for $ty {
			fn borrow(&self) -> &str {
				&self.0
			}
		}

		impl fmt::Display for $ty {
			fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
				f.write_str(&self.0)
			}
		}
	};
}

string_newtype_conversions!(ResourceType);
string_newtype_conversions!(EntityId);

macro_rules! entity_id_from_int {
	($($int:ty),*) => {
		$(
			impl From<$int> for EntityId {
				fn from(value: $int) -> Self {
					Self(value.to_string())
				}
			}
		)*
	};
}

entity_id_from_int!(u8, u16, u32, u64, usize, i8, i16, i32, i64, isize);
