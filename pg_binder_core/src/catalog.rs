//! The closed set of column types the codec understands
//!
//! Every [`ColumnType`] carries exactly one wire type id (a PostgreSQL oid), one preferred [`Format`]
//! and, for fixed width types, the exact payload length
//!
//! [`ColumnType`]: ./enum.ColumnType.html
//! [`Format`]: ./enum.Format.html
use std::{
	convert::TryFrom,
	fmt,
	str::FromStr,
};

use serde::{ Deserialize, Serialize };

use crate::BindError;

/// A PostgreSQL object identifier, used on the wire to name a type
pub type Oid = u32;

/// Wire type ids
pub mod oid {
	use super::Oid;

	pub const BOOL: Oid = 16;
	pub const BYTEA: Oid = 17;
	pub const INT8: Oid = 20;
	pub const INT2: Oid = 21;
	pub const INT4: Oid = 23;
	pub const TEXT: Oid = 25;
	pub const OID: Oid = 26;
	pub const JSON: Oid = 114;
	pub const FLOAT4: Oid = 700;
	pub const FLOAT8: Oid = 701;
	pub const BOOL_ARRAY: Oid = 1000;
	pub const INT2_ARRAY: Oid = 1005;
	pub const INT4_ARRAY: Oid = 1007;
	pub const TEXT_ARRAY: Oid = 1009;
	pub const VARCHAR_ARRAY: Oid = 1015;
	pub const INT8_ARRAY: Oid = 1016;
	pub const FLOAT4_ARRAY: Oid = 1021;
	pub const FLOAT8_ARRAY: Oid = 1022;
	pub const VARCHAR: Oid = 1043;
	pub const DATE: Oid = 1082;
	pub const TIMESTAMP: Oid = 1114;
	pub const TIMESTAMP_ARRAY: Oid = 1115;
	pub const TIMESTAMPTZ: Oid = 1184;
	pub const TIMESTAMPTZ_ARRAY: Oid = 1185;
	pub const UUID: Oid = 2950;
	pub const UUID_ARRAY: Oid = 2951;
	/// hstore is an extension type, its oid differs between databases
	pub const HSTORE: Oid = 0;
}

/// Format code of a parameter or result column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Format {
	Text = 0,
	Binary = 1,
}

impl Default for Format {
	fn default() -> Self {
		Format::Binary
	}
}

impl TryFrom<i16> for Format {
	type Error = BindError;

	fn try_from(code: i16) -> Result<Format, BindError> {
		match code {
			0 => Ok(Format::Text),
			1 => Ok(Format::Binary),
			n => Err(BindError::UnknownFormat(n)),
		}
	}
}

impl From<Format> for postgres_types::Format {
	fn from(f: Format) -> Self {
		match f {
			Format::Text => postgres_types::Format::Text,
			Format::Binary => postgres_types::Format::Binary,
		}
	}
}

/// A logical column type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ColumnType {
	Bool,
	Int2,
	Int4,
	Int8,
	Float4,
	Float8,
	Bytea,
	Text,
	Varchar,
	Oid,
	Date,
	Timestamp,
	TimestampTz,
	Json,
	Uuid,
	Hstore,
	BoolArray,
	Int2Array,
	Int4Array,
	Int8Array,
	Float4Array,
	Float8Array,
	TextArray,
	VarcharArray,
	TimestampArray,
	TimestampTzArray,
	UuidArray,
}

impl ColumnType {
	pub const ALL: [ColumnType; 27] = [
		ColumnType::Bool,
		ColumnType::Int2,
		ColumnType::Int4,
		ColumnType::Int8,
		ColumnType::Float4,
		ColumnType::Float8,
		ColumnType::Bytea,
		ColumnType::Text,
		ColumnType::Varchar,
		ColumnType::Oid,
		ColumnType::Date,
		ColumnType::Timestamp,
		ColumnType::TimestampTz,
		ColumnType::Json,
		ColumnType::Uuid,
		ColumnType::Hstore,
		ColumnType::BoolArray,
		ColumnType::Int2Array,
		ColumnType::Int4Array,
		ColumnType::Int8Array,
		ColumnType::Float4Array,
		ColumnType::Float8Array,
		ColumnType::TextArray,
		ColumnType::VarcharArray,
		ColumnType::TimestampArray,
		ColumnType::TimestampTzArray,
		ColumnType::UuidArray,
	];

	/// The wire type id
	pub const fn oid(self) -> Oid {
		use ColumnType::*;
		match self {
			Bool => oid::BOOL,
			Int2 => oid::INT2,
			Int4 => oid::INT4,
			Int8 => oid::INT8,
			Float4 => oid::FLOAT4,
			Float8 => oid::FLOAT8,
			Bytea => oid::BYTEA,
			Text => oid::TEXT,
			Varchar => oid::VARCHAR,
			Oid => oid::OID,
			Date => oid::DATE,
			Timestamp => oid::TIMESTAMP,
			TimestampTz => oid::TIMESTAMPTZ,
			Json => oid::JSON,
			Uuid => oid::UUID,
			Hstore => oid::HSTORE,
			BoolArray => oid::BOOL_ARRAY,
			Int2Array => oid::INT2_ARRAY,
			Int4Array => oid::INT4_ARRAY,
			Int8Array => oid::INT8_ARRAY,
			Float4Array => oid::FLOAT4_ARRAY,
			Float8Array => oid::FLOAT8_ARRAY,
			TextArray => oid::TEXT_ARRAY,
			VarcharArray => oid::VARCHAR_ARRAY,
			TimestampArray => oid::TIMESTAMP_ARRAY,
			TimestampTzArray => oid::TIMESTAMPTZ_ARRAY,
			UuidArray => oid::UUID_ARRAY,
		}
	}

	/// The format parameters of this type are sent in
	///
	/// Text affinity types (text, varchar, date, json) go out as text, everything else as binary.
	/// Result columns are always requested in binary, the decoders for the text affinity types accept both
	pub const fn format(self) -> Format {
		use ColumnType::*;
		match self {
			Text | Varchar | Date | Json => Format::Text,
			_ => Format::Binary,
		}
	}

	/// Payload width of fixed width types, `None` for variable length ones
	pub const fn width(self) -> Option<i32> {
		use ColumnType::*;
		match self {
			Bool => Some(1),
			Int2 => Some(2),
			Int4 | Float4 | Date | Oid => Some(4),
			Int8 | Float8 | Timestamp | TimestampTz => Some(8),
			Uuid => Some(16),
			_ => None,
		}
	}

	/// The element type of an array type
	pub const fn element(self) -> Option<ColumnType> {
		use ColumnType::*;
		match self {
			BoolArray => Some(Bool),
			Int2Array => Some(Int2),
			Int4Array => Some(Int4),
			Int8Array => Some(Int8),
			Float4Array => Some(Float4),
			Float8Array => Some(Float8),
			TextArray => Some(Text),
			VarcharArray => Some(Varchar),
			TimestampArray => Some(Timestamp),
			TimestampTzArray => Some(TimestampTz),
			UuidArray => Some(Uuid),
			_ => None,
		}
	}

	/// The array form of an array eligible type
	pub const fn array(self) -> Option<ColumnType> {
		use ColumnType::*;
		match self {
			Bool => Some(BoolArray),
			Int2 => Some(Int2Array),
			Int4 => Some(Int4Array),
			Int8 => Some(Int8Array),
			Float4 => Some(Float4Array),
			Float8 => Some(Float8Array),
			Text => Some(TextArray),
			Varchar => Some(VarcharArray),
			Timestamp => Some(TimestampArray),
			TimestampTz => Some(TimestampTzArray),
			Uuid => Some(UuidArray),
			_ => None,
		}
	}

	pub const fn is_array(self) -> bool {
		self.element().is_some()
	}

	/// Canonical SQL spelling, used in alias casts
	pub const fn name(self) -> &'static str {
		use ColumnType::*;
		match self {
			Bool => "bool",
			Int2 => "int2",
			Int4 => "int4",
			Int8 => "int8",
			Float4 => "float4",
			Float8 => "float8",
			Bytea => "bytea",
			Text => "text",
			Varchar => "varchar",
			Oid => "oid",
			Date => "date",
			Timestamp => "timestamp",
			TimestampTz => "timestamptz",
			Json => "json",
			Uuid => "uuid",
			Hstore => "hstore",
			BoolArray => "bool[]",
			Int2Array => "int2[]",
			Int4Array => "int4[]",
			Int8Array => "int8[]",
			Float4Array => "float4[]",
			Float8Array => "float8[]",
			TextArray => "text[]",
			VarcharArray => "varchar[]",
			TimestampArray => "timestamp[]",
			TimestampTzArray => "timestamptz[]",
			UuidArray => "uuid[]",
		}
	}

	/// Look a type up by wire type id
	///
	/// hstore has no fixed id and is never returned
	pub fn from_oid(id: Oid) -> Option<ColumnType> {
		ColumnType::ALL.iter().copied().find(|t| *t != ColumnType::Hstore && t.oid() == id)
	}

	/// Normalize a declared SQL type name
	///
	/// Matching is case insensitive and tolerates the usual aliases (`integer`, `double precision`,
	/// `character varying(32)`, `float(24)`, `timestamp with time zone`, ...). Array forms are written
	/// with a trailing `[]`. Returns `None` for anything unrecognized
	pub fn normalize(name: &str) -> Option<ColumnType> {
		let name = name.trim().to_ascii_lowercase();
		if let Some(inner) = name.strip_suffix("[]") {
			return ColumnType::normalize_scalar(inner.trim_end()).and_then(ColumnType::array);
		}
		ColumnType::normalize_scalar(&name)
	}

	fn normalize_scalar(name: &str) -> Option<ColumnType> {
		use ColumnType::*;
		let t = match name {
			"bool" | "boolean" => Bool,
			"int2" | "smallint" => Int2,
			"int4" | "int" | "integer" => Int4,
			"int8" | "bigint" => Int8,
			"float4" | "real" | "float32" => Float4,
			"float8" | "float" | "double" | "double precision" | "float64" => Float8,
			"bytea" => Bytea,
			"text" => Text,
			"varchar" | "character varying" => Varchar,
			"oid" => Oid,
			"date" => Date,
			"timestamp" | "timestamp without time zone" | "time" => Timestamp,
			"timestamptz" | "timestamp with time zone" => TimestampTz,
			"json" => Json,
			"uuid" => Uuid,
			"hstore" => Hstore,
			other => {
				let sized = |prefix: &str| other.strip_prefix(prefix).and_then(|p| p.strip_suffix(')')).map_or(false, |n| n.trim().parse::<u32>().is_ok());
				if sized("varchar(") || sized("character varying(") {
					Varchar
				} else if let Some(precision) = other.strip_prefix("float(").and_then(|p| p.strip_suffix(')')) {
					match precision.trim().parse::<u32>() {
						Ok(p) if p <= 24 => Float4,
						Ok(_) => Float8,
						Err(_) => return None,
					}
				} else {
					return None;
				}
			}
		};
		Some(t)
	}
}

impl fmt::Display for ColumnType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.name())
	}
}

impl FromStr for ColumnType {
	type Err = BindError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		ColumnType::normalize(s).ok_or_else(|| BindError::Parse { target: "column type", input: s.to_owned() })
	}
}
