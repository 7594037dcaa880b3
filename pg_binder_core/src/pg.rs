//! Glue between the codec and tokio-postgres
//!
//! Results are captured untouched through [`RawValue`]'s [`FromSql`] implementation and decoded by
//! the table. Parameters are encoded by the table and handed over as [`EncodedParam`]s
//!
//! [`RawValue`]: ../adapter/struct.RawValue.html
//! [`FromSql`]: https://docs.rs/postgres-types/0.2/postgres_types/trait.FromSql.html
//! [`EncodedParam`]: ./struct.EncodedParam.html
use std::error::Error;

use byteorder::{ ByteOrder, NetworkEndian };
use bytes::BytesMut;
use postgres_types::{ to_sql_checked, FromSql, IsNull, ToSql, Type };

use crate::{
	adapter::RawValue,
	catalog::{ ColumnType, Format },
};

// tokio-postgres always asks for binary results
impl<'a> FromSql<'a> for RawValue {
	fn from_sql(ty: &Type, raw: &'a [u8]) -> Result<Self, Box<dyn Error + Sync + Send>> {
		Ok(RawValue { oid: ty.oid(), format: Format::Binary, bytes: Some(raw.to_vec()) })
	}

	fn from_sql_null(ty: &Type) -> Result<Self, Box<dyn Error + Sync + Send>> {
		Ok(RawValue { oid: ty.oid(), format: Format::Binary, bytes: None })
	}

	fn accepts(_ty: &Type) -> bool {
		true
	}
}

/// One encoded statement parameter
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedParam {
	pub column: ColumnType,
	pub format: Format,
	/// The value without its length prefix, `None` for NULL
	pub value: Option<Vec<u8>>,
}

impl EncodedParam {
	/// Splits the output of an encoder into a parameter
	pub fn from_wire(column: ColumnType, format: Format, wire: Vec<u8>) -> Self {
		let value = if wire.len() < 4 || NetworkEndian::read_i32(&wire[..4]) < 0 {
			None
		} else {
			Some(wire[4..].to_vec())
		};
		EncodedParam { column, format, value }
	}
}

impl ToSql for EncodedParam {
	fn to_sql(&self, _ty: &Type, out: &mut BytesMut) -> Result<IsNull, Box<dyn Error + Sync + Send>> {
		match &self.value {
			Some(v) => {
				out.extend_from_slice(v);
				Ok(IsNull::No)
			},
			None => Ok(IsNull::Yes),
		}
	}

	// the column type was checked when the table was built
	fn accepts(_ty: &Type) -> bool {
		true
	}

	fn encode_format(&self, _ty: &Type) -> postgres_types::Format {
		self.format.into()
	}

	to_sql_checked!();
}
