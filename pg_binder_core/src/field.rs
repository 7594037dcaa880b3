//! Implementations of [`Field`] for the Rust types the resolver knows about
//!
//! A field type turns a resolved [`Binding`] into a pair of closures. They are built once when a
//! [`Table`] is constructed and then called for every value, without consulting the table again
//!
//! [`Field`]: ./trait.Field.html
//! [`Binding`]: ../resolve/struct.Binding.html
//! [`Table`]: ../table/struct.Table.html
use std::{
	collections::HashMap,
	convert::TryFrom,
	fmt::Display,
	ops::{ Deref, DerefMut },
};

use chrono::{ DateTime, NaiveDate, NaiveDateTime, Utc };
use serde::{ de::DeserializeOwned, Deserialize, Serialize };
use uuid::Uuid;

use crate::{
	catalog::{ ColumnType, Format },
	codec::*,
	resolve::{ resolve, unsupported, Binding, FieldKind, FieldType },
	wire::{ WireCursor, WriteSink },
	BindError,
};

/// Writes one field value, length prefix included
pub type Encoder<T> = Box<dyn Fn(&T, &mut dyn WriteSink) -> Result<(), BindError> + Send + Sync>;
/// Reads one field value from a column
pub type Decoder<T> = Box<dyn Fn(&mut dyn WireCursor) -> Result<T, BindError> + Send + Sync>;

/// A Rust type that can be bound to a column
pub trait Field: Sized + 'static {
	/// Where the type sits in the compatibility table
	const FIELD_TYPE: FieldType;

	/// Format values of this field are sent in
	fn format(binding: &Binding) -> Format {
		binding.column.format()
	}

	fn encoder(binding: &Binding) -> Result<Encoder<Self>, BindError>;

	fn decoder(binding: &Binding) -> Result<Decoder<Self>, BindError>;
}

impl Binding {
	/// The error for a binding the field implementation has no codec for
	pub fn unsupported(&self) -> BindError {
		unsupported(self.field, self.column)
	}
}

/// Range checked conversion that records the failure on the cursor
fn fit<T, S>(vr: &mut dyn WireCursor, v: S) -> Result<T, BindError>
where
	T: TryFrom<S>,
	S: Display + Copy,
{
	narrow(v).map_err(|e| vr.fail(e))
}

macro_rules! integer_field {
	($t:ty, $kind:ident) => {
		impl Field for $t {
			const FIELD_TYPE: FieldType = FieldType::value(FieldKind::$kind);

			fn encoder(b: &Binding) -> Result<Encoder<Self>, BindError> {
				let enc: Encoder<Self> = match b.column {
					ColumnType::Int2 => Box::new(|v: &$t, s: &mut dyn WriteSink| {
						encode_int2(narrow(*v)?, s);
						Ok(())
					}),
					ColumnType::Int4 => Box::new(|v: &$t, s: &mut dyn WriteSink| {
						encode_int4(narrow(*v)?, s);
						Ok(())
					}),
					ColumnType::Int8 => Box::new(|v: &$t, s: &mut dyn WriteSink| {
						encode_int8(narrow(*v)?, s);
						Ok(())
					}),
					_ => return Err(b.unsupported()),
				};
				Ok(enc)
			}

			fn decoder(b: &Binding) -> Result<Decoder<Self>, BindError> {
				let dec: Decoder<Self> = match b.column {
					ColumnType::Int2 => Box::new(|vr: &mut dyn WireCursor| {
						let v = decode_int2(vr)?;
						fit(vr, v)
					}),
					ColumnType::Int4 => Box::new(|vr: &mut dyn WireCursor| {
						let v = decode_int4(vr)?;
						fit(vr, v)
					}),
					ColumnType::Int8 => Box::new(|vr: &mut dyn WireCursor| {
						let v = decode_int8(vr)?;
						fit(vr, v)
					}),
					_ => return Err(b.unsupported()),
				};
				Ok(dec)
			}
		}
	};
}

integer_field!(i16, I16);
integer_field!(u16, U16);
integer_field!(i32, I32);
integer_field!(i64, I64);
integer_field!(u64, U64);
integer_field!(isize, Isize);
integer_field!(usize, Usize);

impl Field for u32 {
	const FIELD_TYPE: FieldType = FieldType::value(FieldKind::U32);

	fn encoder(b: &Binding) -> Result<Encoder<Self>, BindError> {
		if b.column == ColumnType::Oid {
			return Ok(Box::new(|v: &u32, s: &mut dyn WriteSink| {
				encode_oid(*v, s);
				Ok(())
			}));
		}
		let enc: Encoder<Self> = match b.column {
			ColumnType::Int2 => Box::new(|v: &u32, s: &mut dyn WriteSink| {
				encode_int2(narrow(*v)?, s);
				Ok(())
			}),
			ColumnType::Int4 => Box::new(|v: &u32, s: &mut dyn WriteSink| {
				encode_int4(narrow(*v)?, s);
				Ok(())
			}),
			ColumnType::Int8 => Box::new(|v: &u32, s: &mut dyn WriteSink| {
				encode_int8(i64::from(*v), s);
				Ok(())
			}),
			_ => return Err(b.unsupported()),
		};
		Ok(enc)
	}

	fn decoder(b: &Binding) -> Result<Decoder<Self>, BindError> {
		let dec: Decoder<Self> = match b.column {
			ColumnType::Oid => Box::new(|vr: &mut dyn WireCursor| decode_oid(vr)),
			ColumnType::Int2 => Box::new(|vr: &mut dyn WireCursor| {
				let v = decode_int2(vr)?;
				fit(vr, v)
			}),
			ColumnType::Int4 => Box::new(|vr: &mut dyn WireCursor| {
				let v = decode_int4(vr)?;
				fit(vr, v)
			}),
			ColumnType::Int8 => Box::new(|vr: &mut dyn WireCursor| {
				let v = decode_int8(vr)?;
				fit(vr, v)
			}),
			_ => return Err(b.unsupported()),
		};
		Ok(dec)
	}
}

impl Field for bool {
	const FIELD_TYPE: FieldType = FieldType::value(FieldKind::Bool);

	fn encoder(b: &Binding) -> Result<Encoder<Self>, BindError> {
		match b.column {
			ColumnType::Bool => Ok(Box::new(|v: &bool, s: &mut dyn WriteSink| {
				encode_bool(*v, s);
				Ok(())
			})),
			_ => Err(b.unsupported()),
		}
	}

	fn decoder(b: &Binding) -> Result<Decoder<Self>, BindError> {
		match b.column {
			ColumnType::Bool => Ok(Box::new(|vr: &mut dyn WireCursor| decode_bool(vr))),
			_ => Err(b.unsupported()),
		}
	}
}

impl Field for f32 {
	const FIELD_TYPE: FieldType = FieldType::value(FieldKind::F32);

	fn encoder(b: &Binding) -> Result<Encoder<Self>, BindError> {
		let enc: Encoder<Self> = match b.column {
			ColumnType::Float4 => Box::new(|v: &f32, s: &mut dyn WriteSink| {
				encode_float4(*v, s);
				Ok(())
			}),
			ColumnType::Float8 => Box::new(|v: &f32, s: &mut dyn WriteSink| {
				encode_float8(f64::from(*v), s);
				Ok(())
			}),
			_ => return Err(b.unsupported()),
		};
		Ok(enc)
	}

	fn decoder(b: &Binding) -> Result<Decoder<Self>, BindError> {
		let dec: Decoder<Self> = match b.column {
			ColumnType::Float4 => Box::new(|vr: &mut dyn WireCursor| decode_float4(vr)),
			ColumnType::Float8 => Box::new(|vr: &mut dyn WireCursor| {
				let v = decode_float8(vr)?;
				narrow_f64(v).map_err(|e| vr.fail(e))
			}),
			_ => return Err(b.unsupported()),
		};
		Ok(dec)
	}
}

impl Field for f64 {
	const FIELD_TYPE: FieldType = FieldType::value(FieldKind::F64);

	fn encoder(b: &Binding) -> Result<Encoder<Self>, BindError> {
		let enc: Encoder<Self> = match b.column {
			ColumnType::Float4 => Box::new(|v: &f64, s: &mut dyn WriteSink| {
				encode_float4(narrow_f64(*v)?, s);
				Ok(())
			}),
			ColumnType::Float8 => Box::new(|v: &f64, s: &mut dyn WriteSink| {
				encode_float8(*v, s);
				Ok(())
			}),
			_ => return Err(b.unsupported()),
		};
		Ok(enc)
	}

	fn decoder(b: &Binding) -> Result<Decoder<Self>, BindError> {
		let dec: Decoder<Self> = match b.column {
			ColumnType::Float4 => Box::new(|vr: &mut dyn WireCursor| decode_float4(vr).map(f64::from)),
			ColumnType::Float8 => Box::new(|vr: &mut dyn WireCursor| decode_float8(vr)),
			_ => return Err(b.unsupported()),
		};
		Ok(dec)
	}
}

impl Field for String {
	const FIELD_TYPE: FieldType = FieldType::value(FieldKind::String);

	fn encoder(b: &Binding) -> Result<Encoder<Self>, BindError> {
		let enc: Encoder<Self> = match b.column {
			ColumnType::Text | ColumnType::Varchar | ColumnType::Json => Box::new(|v: &String, s: &mut dyn WriteSink| encode_text(v, s)),
			ColumnType::Bytea => Box::new(|v: &String, s: &mut dyn WriteSink| encode_bytea(v.as_bytes(), s)),
			ColumnType::Uuid => Box::new(|v: &String, s: &mut dyn WriteSink| encode_uuid_str(v, s)),
			_ => return Err(b.unsupported()),
		};
		Ok(enc)
	}

	fn decoder(b: &Binding) -> Result<Decoder<Self>, BindError> {
		let dec: Decoder<Self> = match b.column {
			column @ ColumnType::Text | column @ ColumnType::Varchar | column @ ColumnType::Json => {
				Box::new(move |vr: &mut dyn WireCursor| decode_string(vr, column))
			},
			ColumnType::Bytea => Box::new(|vr: &mut dyn WireCursor| {
				let raw = decode_bytea(vr)?;
				String::from_utf8(raw).map_err(|_| vr.fail(BindError::Utf8("bytea")))
			}),
			ColumnType::Uuid => Box::new(|vr: &mut dyn WireCursor| decode_uuid_string(vr)),
			_ => return Err(b.unsupported()),
		};
		Ok(dec)
	}
}

impl Field for Vec<u8> {
	const FIELD_TYPE: FieldType = FieldType::value(FieldKind::Bytes);

	fn encoder(b: &Binding) -> Result<Encoder<Self>, BindError> {
		let enc: Encoder<Self> = match b.column {
			ColumnType::Bytea => Box::new(|v: &Vec<u8>, s: &mut dyn WriteSink| encode_bytea(v, s)),
			ColumnType::Json => Box::new(|v: &Vec<u8>, s: &mut dyn WriteSink| encode_json_bytes(v, s)),
			ColumnType::Text | ColumnType::Varchar => Box::new(|v: &Vec<u8>, s: &mut dyn WriteSink| encode_text_bytes(v, s)),
			_ => return Err(b.unsupported()),
		};
		Ok(enc)
	}

	fn decoder(b: &Binding) -> Result<Decoder<Self>, BindError> {
		let dec: Decoder<Self> = match b.column {
			ColumnType::Bytea => Box::new(|vr: &mut dyn WireCursor| decode_bytea(vr)),
			column @ ColumnType::Json | column @ ColumnType::Text | column @ ColumnType::Varchar => {
				Box::new(move |vr: &mut dyn WireCursor| decode_string_bytes(vr, column))
			},
			_ => return Err(b.unsupported()),
		};
		Ok(dec)
	}
}

impl Field for NaiveDate {
	const FIELD_TYPE: FieldType = FieldType::value(FieldKind::Date);

	fn encoder(b: &Binding) -> Result<Encoder<Self>, BindError> {
		match b.column {
			ColumnType::Date => {
				let format = <Self as Field>::format(b);
				Ok(Box::new(move |v: &NaiveDate, s: &mut dyn WriteSink| encode_date(*v, format, s)))
			},
			_ => Err(b.unsupported()),
		}
	}

	fn decoder(b: &Binding) -> Result<Decoder<Self>, BindError> {
		match b.column {
			ColumnType::Date => Ok(Box::new(|vr: &mut dyn WireCursor| decode_date(vr))),
			_ => Err(b.unsupported()),
		}
	}
}

impl Field for NaiveDateTime {
	const FIELD_TYPE: FieldType = FieldType::value(FieldKind::DateTime);

	fn encoder(b: &Binding) -> Result<Encoder<Self>, BindError> {
		match b.column {
			ColumnType::Timestamp | ColumnType::TimestampTz => {
				Ok(Box::new(|v: &NaiveDateTime, s: &mut dyn WriteSink| encode_timestamp(v, s)))
			},
			_ => Err(b.unsupported()),
		}
	}

	fn decoder(b: &Binding) -> Result<Decoder<Self>, BindError> {
		match b.column {
			column @ ColumnType::Timestamp | column @ ColumnType::TimestampTz => {
				Ok(Box::new(move |vr: &mut dyn WireCursor| decode_instant(vr, column).map(|t| t.naive_utc())))
			},
			_ => Err(b.unsupported()),
		}
	}
}

impl Field for DateTime<Utc> {
	const FIELD_TYPE: FieldType = FieldType::value(FieldKind::DateTimeUtc);

	fn encoder(b: &Binding) -> Result<Encoder<Self>, BindError> {
		match b.column {
			ColumnType::Timestamp | ColumnType::TimestampTz => {
				Ok(Box::new(|v: &DateTime<Utc>, s: &mut dyn WriteSink| encode_instant(v, s)))
			},
			_ => Err(b.unsupported()),
		}
	}

	fn decoder(b: &Binding) -> Result<Decoder<Self>, BindError> {
		match b.column {
			column @ ColumnType::Timestamp | column @ ColumnType::TimestampTz => {
				Ok(Box::new(move |vr: &mut dyn WireCursor| decode_instant(vr, column)))
			},
			_ => Err(b.unsupported()),
		}
	}
}

impl Field for Uuid {
	const FIELD_TYPE: FieldType = FieldType::value(FieldKind::Uuid);

	fn encoder(b: &Binding) -> Result<Encoder<Self>, BindError> {
		match b.column {
			ColumnType::Uuid => Ok(Box::new(|v: &Uuid, s: &mut dyn WriteSink| {
				encode_uuid(v, s);
				Ok(())
			})),
			_ => Err(b.unsupported()),
		}
	}

	fn decoder(b: &Binding) -> Result<Decoder<Self>, BindError> {
		match b.column {
			ColumnType::Uuid => Ok(Box::new(|vr: &mut dyn WireCursor| decode_uuid(vr))),
			_ => Err(b.unsupported()),
		}
	}
}

impl Field for serde_json::Value {
	const FIELD_TYPE: FieldType = FieldType::value(FieldKind::Json);

	fn encoder(b: &Binding) -> Result<Encoder<Self>, BindError> {
		match b.column {
			ColumnType::Json => Ok(Box::new(|v: &serde_json::Value, s: &mut dyn WriteSink| encode_json(v, s))),
			_ => Err(b.unsupported()),
		}
	}

	fn decoder(b: &Binding) -> Result<Decoder<Self>, BindError> {
		match b.column {
			ColumnType::Json => Ok(Box::new(|vr: &mut dyn WireCursor| decode_json(vr))),
			_ => Err(b.unsupported()),
		}
	}
}

/// Binds any serde type to a json column
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Json<T>(pub T);

impl<T> Deref for Json<T> {
	type Target = T;
	fn deref(&self) -> &T {
		&self.0
	}
}

impl<T> DerefMut for Json<T> {
	fn deref_mut(&mut self) -> &mut T {
		&mut self.0
	}
}

impl<T> Field for Json<T>
where
	T: Serialize + DeserializeOwned + Send + Sync + 'static,
{
	const FIELD_TYPE: FieldType = FieldType::value(FieldKind::Json);

	fn encoder(b: &Binding) -> Result<Encoder<Self>, BindError> {
		match b.column {
			ColumnType::Json => Ok(Box::new(|v: &Json<T>, s: &mut dyn WriteSink| encode_json(&v.0, s))),
			_ => Err(b.unsupported()),
		}
	}

	fn decoder(b: &Binding) -> Result<Decoder<Self>, BindError> {
		match b.column {
			ColumnType::Json => Ok(Box::new(|vr: &mut dyn WireCursor| decode_json(vr).map(Json))),
			_ => Err(b.unsupported()),
		}
	}
}

impl Field for HashMap<String, String> {
	const FIELD_TYPE: FieldType = FieldType::value(FieldKind::StringMap);

	fn encoder(b: &Binding) -> Result<Encoder<Self>, BindError> {
		match b.column {
			ColumnType::Hstore => Ok(Box::new(|v: &HashMap<String, String>, s: &mut dyn WriteSink| {
				encode_hstore(v.iter().map(|(k, v)| (k.as_str(), Some(v.as_str()))), s)
			})),
			_ => Err(b.unsupported()),
		}
	}

	fn decoder(b: &Binding) -> Result<Decoder<Self>, BindError> {
		match b.column {
			ColumnType::Hstore => Ok(Box::new(|vr: &mut dyn WireCursor| decode_hstore_strict(vr))),
			_ => Err(b.unsupported()),
		}
	}
}

macro_rules! array_field {
	($t:ty, $kind:ident) => {
		impl Field for Vec<$t> {
			const FIELD_TYPE: FieldType = FieldType::value(FieldKind::$kind);

			fn encoder(b: &Binding) -> Result<Encoder<Self>, BindError> {
				let column = b.column;
				match column.element() {
					Some(el) if <$t as ArrayElement>::accepts(el) => {
						Ok(Box::new(move |v: &Vec<$t>, s: &mut dyn WriteSink| encode_array(v, column, s)))
					},
					_ => Err(b.unsupported()),
				}
			}

			fn decoder(b: &Binding) -> Result<Decoder<Self>, BindError> {
				match b.column.element() {
					Some(el) if <$t as ArrayElement>::accepts(el) => {
						Ok(Box::new(|vr: &mut dyn WireCursor| decode_array(vr)))
					},
					_ => Err(b.unsupported()),
				}
			}
		}
	};
}

array_field!(bool, BoolVec);
array_field!(i16, I16Vec);
array_field!(i32, I32Vec);
array_field!(i64, I64Vec);
array_field!(f32, F32Vec);
array_field!(f64, F64Vec);
array_field!(String, StringVec);
array_field!(NaiveDateTime, DateTimeVec);
array_field!(DateTime<Utc>, DateTimeUtcVec);
array_field!(Uuid, UuidVec);

/// Boxed fields go through the table as their pointee
impl<T: Field> Field for Box<T> {
	const FIELD_TYPE: FieldType = T::FIELD_TYPE.boxed();

	fn format(b: &Binding) -> Format {
		T::format(b)
	}

	fn encoder(b: &Binding) -> Result<Encoder<Self>, BindError> {
		let inner = T::encoder(b)?;
		Ok(Box::new(move |v: &Box<T>, s: &mut dyn WriteSink| inner(&**v, s)))
	}

	fn decoder(b: &Binding) -> Result<Decoder<Self>, BindError> {
		let inner = T::decoder(b)?;
		Ok(Box::new(move |vr: &mut dyn WireCursor| inner(vr).map(Box::new)))
	}
}

/// The nullable adapter: NULL is `None`, anything else is handed to `T`
impl<T: Field> Field for Option<T> {
	const FIELD_TYPE: FieldType = FieldType::value(FieldKind::Adapter);

	fn format(b: &Binding) -> Format {
		T::format(b)
	}

	fn encoder(b: &Binding) -> Result<Encoder<Self>, BindError> {
		let inner = T::encoder(&resolve(T::FIELD_TYPE, b.column)?)?;
		Ok(Box::new(move |v: &Option<T>, s: &mut dyn WriteSink| match v {
			Some(v) => inner(v, s),
			None => {
				encode_null(s);
				Ok(())
			},
		}))
	}

	fn decoder(b: &Binding) -> Result<Decoder<Self>, BindError> {
		let inner = T::decoder(&resolve(T::FIELD_TYPE, b.column)?)?;
		Ok(Box::new(move |vr: &mut dyn WireCursor| {
			if let Some(e) = vr.last_error() {
				return Err(e.clone());
			}
			if vr.is_null() {
				return Ok(None);
			}
			inner(vr).map(Some)
		}))
	}
}
