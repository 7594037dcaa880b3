//! The extension point for field types the codec does not understand natively
//!
//! An [`Adapter`] owns its encoding completely. The resolver only records that a field is an
//! adapter, the adapter decides which columns it accepts when its codec is built. Implement the
//! trait and invoke [`adapter_field!`] to make the type usable in a [`Table`]
//!
//! ```
//! use pg_binder_core::{ adapter_field, Adapter, BindError, ColumnType, Format, WireCursor, WriteSink };
//!
//! /// A comma separated list kept in a text column
//! #[derive(Debug, Default, PartialEq)]
//! pub struct Csv(Vec<String>);
//!
//! impl Adapter for Csv {
//! 	fn accepts(column: ColumnType) -> bool {
//! 		column == ColumnType::Text
//! 	}
//! 	fn encode_column(&self, _: ColumnType, _: Format, sink: &mut dyn WriteSink) -> Result<(), BindError> {
//! 		pg_binder_core::codec::encode_text(&self.0.join(","), sink)
//! 	}
//! 	fn decode_column(column: ColumnType, vr: &mut dyn WireCursor) -> Result<Self, BindError> {
//! 		let s = pg_binder_core::codec::decode_string(vr, column)?;
//! 		Ok(Csv(s.split(',').map(str::to_owned).collect()))
//! 	}
//! }
//! adapter_field!(Csv);
//! ```
//!
//! [`Adapter`]: ./trait.Adapter.html
//! [`adapter_field!`]: ../macro.adapter_field.html
//! [`Table`]: ../table/struct.Table.html
use std::collections::HashMap;

use serde::{ Deserialize, Serialize };

use crate::{
	catalog::{ ColumnType, Format, Oid },
	codec::{ decode_hstore, encode_hstore, encode_null, pg_len },
	field::{ Decoder, Encoder },
	resolve::Binding,
	wire::{ ValueReader, WireCursor, WriteSink },
	BindError,
};

pub trait Adapter: Sized + Send + Sync + 'static {
	/// Whether values of this type can live in `column`
	fn accepts(column: ColumnType) -> bool;

	/// Format the adapter sends `column` values in
	fn format(column: ColumnType) -> Format {
		column.format()
	}

	/// Writes the complete wire value, length prefix included
	fn encode_column(&self, column: ColumnType, format: Format, sink: &mut dyn WriteSink) -> Result<(), BindError>;

	/// Reads a value. NULL handling is up to the adapter
	fn decode_column(column: ColumnType, vr: &mut dyn WireCursor) -> Result<Self, BindError>;
}

/// Builds the encode closure for an adapter field, used by [`adapter_field!`]
///
/// [`adapter_field!`]: ../macro.adapter_field.html
pub fn adapter_encoder<T: Adapter>(b: &Binding) -> Result<Encoder<T>, BindError> {
	if !T::accepts(b.column) {
		return Err(b.unsupported());
	}
	let column = b.column;
	let format = T::format(column);
	Ok(Box::new(move |v: &T, s: &mut dyn WriteSink| v.encode_column(column, format, s)))
}

/// Builds the decode closure for an adapter field, used by [`adapter_field!`]
///
/// [`adapter_field!`]: ../macro.adapter_field.html
pub fn adapter_decoder<T: Adapter>(b: &Binding) -> Result<Decoder<T>, BindError> {
	if !T::accepts(b.column) {
		return Err(b.unsupported());
	}
	let column = b.column;
	Ok(Box::new(move |vr: &mut dyn WireCursor| {
		if let Some(e) = vr.last_error() {
			return Err(e.clone());
		}
		T::decode_column(column, vr)
	}))
}

/// Implements [`Field`] for a type implementing [`Adapter`]
///
/// [`Field`]: ./trait.Field.html
/// [`Adapter`]: ./trait.Adapter.html
#[macro_export]
macro_rules! adapter_field {
	($t:ty) => {
		impl $crate::Field for $t {
			const FIELD_TYPE: $crate::FieldType = $crate::FieldType::value($crate::FieldKind::Adapter);

			fn format(b: &$crate::Binding) -> $crate::Format {
				<$t as $crate::Adapter>::format(b.column)
			}

			fn encoder(b: &$crate::Binding) -> ::std::result::Result<$crate::Encoder<Self>, $crate::BindError> {
				$crate::adapter::adapter_encoder::<$t>(b)
			}

			fn decoder(b: &$crate::Binding) -> ::std::result::Result<$crate::Decoder<Self>, $crate::BindError> {
				$crate::adapter::adapter_decoder::<$t>(b)
			}
		}
	};
}

/// An hstore whose values may be NULL
pub type Hstore = HashMap<String, Option<String>>;

impl Adapter for Hstore {
	fn accepts(column: ColumnType) -> bool {
		column == ColumnType::Hstore
	}

	fn encode_column(&self, _: ColumnType, _: Format, sink: &mut dyn WriteSink) -> Result<(), BindError> {
		encode_hstore(self.iter().map(|(k, v)| (k.as_str(), v.as_deref())), sink)
	}

	fn decode_column(_: ColumnType, vr: &mut dyn WireCursor) -> Result<Self, BindError> {
		decode_hstore(vr)
	}
}

adapter_field!(Hstore);

/// A column value kept exactly as it arrived, in whatever type and format
///
/// Bound to any column. On encode the bytes are sent untouched in the recorded format
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RawValue {
	pub oid: Oid,
	pub format: Format,
	/// The payload without its length prefix, `None` for NULL
	pub bytes: Option<Vec<u8>>,
}

impl RawValue {
	pub fn is_null(&self) -> bool {
		self.bytes.is_none()
	}

	/// A cursor over the captured payload
	pub fn reader(&self) -> ValueReader<'_> {
		ValueReader::new(self.oid, self.format, self.bytes.as_deref())
	}
}

impl Adapter for RawValue {
	fn accepts(_: ColumnType) -> bool {
		true
	}

	fn encode_column(&self, _: ColumnType, _: Format, sink: &mut dyn WriteSink) -> Result<(), BindError> {
		match &self.bytes {
			Some(b) => {
				sink.append_i32(pg_len("raw value", b.len())?);
				sink.append_bytes(b);
			},
			None => encode_null(sink),
		}
		Ok(())
	}

	fn decode_column(_: ColumnType, vr: &mut dyn WireCursor) -> Result<Self, BindError> {
		let format = vr.format().map_err(|e| vr.fail(e))?;
		let oid = vr.type_oid();
		let bytes = if vr.is_null() {
			None
		} else {
			let n = vr.len() as usize;
			Some(vr.read_bytes(n)?.to_vec())
		};
		Ok(RawValue { oid, format, bytes })
	}
}

adapter_field!(RawValue);

#[cfg(test)]
mod tests {
	use super::*;
	use crate::{ field::Field, resolve::resolve };

	fn binding<F: Field>(column: ColumnType) -> Binding {
		resolve(F::FIELD_TYPE, column).unwrap()
	}

	#[test]
	fn hstore_keeps_null_values() {
		let mut h = Hstore::new();
		h.insert("a".to_owned(), Some("1".to_owned()));
		h.insert("b".to_owned(), None);
		let b = binding::<Hstore>(ColumnType::Hstore);
		let mut wire = Vec::new();
		Hstore::encoder(&b).unwrap()(&h, &mut wire).unwrap();
		let mut vr = ValueReader::from_wire(0, Format::Binary, &wire).unwrap();
		assert_eq!(Hstore::decoder(&b).unwrap()(&mut vr), Ok(h));
	}

	#[test]
	fn adapters_choose_their_columns() {
		let b = binding::<Hstore>(ColumnType::Text);
		assert_eq!(
			Hstore::encoder(&b).err(),
			Some(BindError::UnsupportedBinding { field: "adapter".to_owned(), column: "text".to_owned() })
		);
		assert!(RawValue::decoder(&binding::<RawValue>(ColumnType::Int8)).is_ok());
	}

	#[test]
	fn raw_values_pass_through() {
		let b = binding::<RawValue>(ColumnType::Int4);
		let mut vr = ValueReader::new(23, Format::Binary, Some(&[0, 0, 0, 7]));
		let raw = RawValue::decoder(&b).unwrap()(&mut vr).unwrap();
		assert_eq!(raw, RawValue { oid: 23, format: Format::Binary, bytes: Some(vec![0, 0, 0, 7]) });
		assert_eq!(crate::codec::decode_int4(&mut raw.reader()), Ok(7));

		let mut wire = Vec::new();
		RawValue::encoder(&b).unwrap()(&raw, &mut wire).unwrap();
		assert_eq!(wire, vec![0, 0, 0, 4, 0, 0, 0, 7]);

		let mut vr = ValueReader::new(25, Format::Text, None);
		let null = RawValue::decoder(&b).unwrap()(&mut vr).unwrap();
		assert!(null.is_null());
		wire.clear();
		RawValue::encoder(&b).unwrap()(&null, &mut wire).unwrap();
		assert_eq!(wire, vec![0xff; 4]);
	}

	#[test]
	fn raw_values_serialize() {
		let raw = RawValue { oid: 25, format: Format::Text, bytes: Some(b"hi".to_vec()) };
		let json = serde_json::to_string(&raw).unwrap();
		assert_eq!(json, r#"{"oid":25,"format":"Text","bytes":[104,105]}"#);
		assert_eq!(serde_json::from_str::<RawValue>(&json).unwrap(), raw);
	}
}
