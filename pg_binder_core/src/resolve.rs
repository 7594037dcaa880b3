//! Decides, once per declared binding, whether a Rust field type can be bound to a column type and
//! which conversion moves values between them
//!
//! The table is keyed first by [`FieldKind`] then by [`ColumnType`]. Each entry records the [`Cast`]
//! used in both directions because they differ: an `i64` field bound to an `int4` column narrows
//! (with an overflow check) on encode but widens on decode
//!
//! [`FieldKind`]: ./enum.FieldKind.html
//! [`ColumnType`]: ../catalog/enum.ColumnType.html
//! [`Cast`]: ./enum.Cast.html
use std::fmt;

use crate::{
	catalog::ColumnType,
	BindError,
};

/// The shape of a Rust field, ignoring indirection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
	Bool,
	I16,
	U16,
	I32,
	U32,
	I64,
	U64,
	Isize,
	Usize,
	F32,
	F64,
	String,
	Bytes,
	/// `chrono::NaiveDate`
	Date,
	/// `chrono::NaiveDateTime`
	DateTime,
	/// `chrono::DateTime<Utc>`
	DateTimeUtc,
	Uuid,
	/// `serde_json::Value` or `Json<T>`
	Json,
	/// `HashMap<String, String>`
	StringMap,
	BoolVec,
	I16Vec,
	I32Vec,
	I64Vec,
	F32Vec,
	F64Vec,
	StringVec,
	DateTimeVec,
	DateTimeUtcVec,
	UuidVec,
	/// A type implementing [`Adapter`](../adapter/trait.Adapter.html), which does its own encoding
	Adapter,
}

/// How the field holds its value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Source {
	Value,
	/// Behind a `Box`, dereferenced on encode and assigned through on decode
	Deref,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FieldType {
	pub kind: FieldKind,
	pub source: Source,
}

impl FieldType {
	pub const fn value(kind: FieldKind) -> Self {
		FieldType { kind, source: Source::Value }
	}

	pub const fn boxed(self) -> Self {
		FieldType { kind: self.kind, source: Source::Deref }
	}
}

impl fmt::Display for FieldType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self.source {
			Source::Value => f.write_str(self.kind.rust_name()),
			Source::Deref => write!(f, "Box<{}>", self.kind.rust_name()),
		}
	}
}

/// The value conversion applied between field and column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cast {
	Identity,
	/// Lossless numeric widening
	Widen,
	/// Numeric narrowing, range checked
	Narrow,
	/// Bytes to text or text to bytes, also the string form of a uuid
	Reinterpret,
}

/// A resolved conversion for one direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Conversion {
	Native {
		source: Source,
		cast: Cast,
	},
	/// Handed to the field's [`Adapter`](../adapter/trait.Adapter.html) implementation
	Adapter {
		source: Source,
	},
}

impl Conversion {
	pub fn source(&self) -> Source {
		match *self {
			Conversion::Native { source, .. } | Conversion::Adapter { source } => source,
		}
	}

	pub fn checks_overflow(&self) -> bool {
		matches!(self, Conversion::Native { cast: Cast::Narrow, .. })
	}
}

/// A validated (field, column) pair and its conversion in both directions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Binding {
	pub field: FieldType,
	pub column: ColumnType,
	pub encode: Conversion,
	pub decode: Conversion,
}

/// One entry of the table: column, encode cast, decode cast
pub type Rule = (ColumnType, Cast, Cast);

use Cast::*;
use ColumnType as C;

const BOOL_RULES: &[Rule] = &[(C::Bool, Identity, Identity)];
const I16_RULES: &[Rule] = &[
	(C::Int2, Identity, Identity),
	(C::Int4, Widen, Narrow),
	(C::Int8, Widen, Narrow),
];
const U16_RULES: &[Rule] = &[
	(C::Int2, Narrow, Narrow),
	(C::Int4, Widen, Narrow),
	(C::Int8, Widen, Narrow),
];
const I32_RULES: &[Rule] = &[
	(C::Int2, Narrow, Widen),
	(C::Int4, Identity, Identity),
	(C::Int8, Widen, Narrow),
];
const U32_RULES: &[Rule] = &[
	(C::Int2, Narrow, Narrow),
	(C::Int4, Narrow, Narrow),
	(C::Int8, Widen, Narrow),
	(C::Oid, Identity, Identity),
];
const I64_RULES: &[Rule] = &[
	(C::Int2, Narrow, Widen),
	(C::Int4, Narrow, Widen),
	(C::Int8, Identity, Identity),
];
const U64_RULES: &[Rule] = &[
	(C::Int2, Narrow, Narrow),
	(C::Int4, Narrow, Narrow),
	(C::Int8, Narrow, Narrow),
];
const F32_RULES: &[Rule] = &[
	(C::Float4, Identity, Identity),
	(C::Float8, Widen, Narrow),
];
const F64_RULES: &[Rule] = &[
	(C::Float4, Narrow, Widen),
	(C::Float8, Identity, Identity),
];
const STRING_RULES: &[Rule] = &[
	(C::Text, Identity, Identity),
	(C::Varchar, Identity, Identity),
	(C::Json, Identity, Identity),
	(C::Bytea, Reinterpret, Reinterpret),
	(C::Uuid, Reinterpret, Reinterpret),
];
const BYTES_RULES: &[Rule] = &[
	(C::Bytea, Identity, Identity),
	(C::Json, Identity, Identity),
	(C::Text, Reinterpret, Reinterpret),
	(C::Varchar, Reinterpret, Reinterpret),
];
const DATE_RULES: &[Rule] = &[(C::Date, Identity, Identity)];
const DATE_TIME_RULES: &[Rule] = &[
	(C::Timestamp, Identity, Identity),
	(C::TimestampTz, Identity, Identity),
];
const UUID_RULES: &[Rule] = &[(C::Uuid, Identity, Identity)];
const JSON_RULES: &[Rule] = &[(C::Json, Identity, Identity)];
const STRING_MAP_RULES: &[Rule] = &[(C::Hstore, Identity, Identity)];
const BOOL_VEC_RULES: &[Rule] = &[(C::BoolArray, Identity, Identity)];
const I16_VEC_RULES: &[Rule] = &[(C::Int2Array, Identity, Identity)];
const I32_VEC_RULES: &[Rule] = &[(C::Int4Array, Identity, Identity)];
const I64_VEC_RULES: &[Rule] = &[(C::Int8Array, Identity, Identity)];
const F32_VEC_RULES: &[Rule] = &[(C::Float4Array, Identity, Identity)];
const F64_VEC_RULES: &[Rule] = &[(C::Float8Array, Identity, Identity)];
const STRING_VEC_RULES: &[Rule] = &[
	(C::TextArray, Identity, Identity),
	(C::VarcharArray, Identity, Identity),
];
const DATE_TIME_VEC_RULES: &[Rule] = &[
	(C::TimestampArray, Identity, Identity),
	(C::TimestampTzArray, Identity, Identity),
];
const UUID_VEC_RULES: &[Rule] = &[(C::UuidArray, Identity, Identity)];

impl FieldKind {
	/// The column types this kind can bind to natively; empty for adapters
	pub const fn rules(self) -> &'static [Rule] {
		use FieldKind::*;
		match self {
			Bool => BOOL_RULES,
			I16 => I16_RULES,
			U16 => U16_RULES,
			I32 => I32_RULES,
			U32 => U32_RULES,
			// 64 bit targets only
			I64 | Isize => I64_RULES,
			U64 | Usize => U64_RULES,
			F32 => F32_RULES,
			F64 => F64_RULES,
			String => STRING_RULES,
			Bytes => BYTES_RULES,
			Date => DATE_RULES,
			DateTime | DateTimeUtc => DATE_TIME_RULES,
			Uuid => UUID_RULES,
			Json => JSON_RULES,
			StringMap => STRING_MAP_RULES,
			BoolVec => BOOL_VEC_RULES,
			I16Vec => I16_VEC_RULES,
			I32Vec => I32_VEC_RULES,
			I64Vec => I64_VEC_RULES,
			F32Vec => F32_VEC_RULES,
			F64Vec => F64_VEC_RULES,
			StringVec => STRING_VEC_RULES,
			DateTimeVec | DateTimeUtcVec => DATE_TIME_VEC_RULES,
			UuidVec => UUID_VEC_RULES,
			Adapter => &[],
		}
	}

	/// How the kind is spelled in Rust source
	pub const fn rust_name(self) -> &'static str {
		use FieldKind::*;
		match self {
			Bool => "bool",
			I16 => "i16",
			U16 => "u16",
			I32 => "i32",
			U32 => "u32",
			I64 => "i64",
			U64 => "u64",
			Isize => "isize",
			Usize => "usize",
			F32 => "f32",
			F64 => "f64",
			String => "String",
			Bytes => "Vec<u8>",
			Date => "chrono::NaiveDate",
			DateTime => "chrono::NaiveDateTime",
			DateTimeUtc => "chrono::DateTime<chrono::Utc>",
			Uuid => "uuid::Uuid",
			Json => "serde_json::Value",
			StringMap => "std::collections::HashMap<String, String>",
			BoolVec => "Vec<bool>",
			I16Vec => "Vec<i16>",
			I32Vec => "Vec<i32>",
			I64Vec => "Vec<i64>",
			F32Vec => "Vec<f32>",
			F64Vec => "Vec<f64>",
			StringVec => "Vec<String>",
			DateTimeVec => "Vec<chrono::NaiveDateTime>",
			DateTimeUtcVec => "Vec<chrono::DateTime<chrono::Utc>>",
			UuidVec => "Vec<uuid::Uuid>",
			Adapter => "adapter",
		}
	}

	/// Parses a Rust type as written in source
	///
	/// Paths are matched on their last segment and whitespace is ignored, so `chrono::NaiveDate`,
	/// `NaiveDate` and `Vec < i32 >` are all understood. `Box<T>` yields `T` behind [`Source::Deref`],
	/// `Option<T>`, `Hstore`, `RawValue` and `Json<T>` are recognized as adapters or json
	///
	/// [`Source::Deref`]: ./enum.Source.html#variant.Deref
	pub fn from_rust_type(ty: &str) -> Option<FieldType> {
		let compact: std::string::String = ty.chars().filter(|c| !c.is_whitespace()).collect();
		FieldKind::parse_compact(&compact)
	}

	fn parse_compact(ty: &str) -> Option<FieldType> {
		use FieldKind::*;
		if let Some(inner) = generic_arg(ty, "Box") {
			let inner = FieldKind::parse_compact(inner)?;
			return Some(inner.boxed());
		}
		if generic_arg(ty, "Option").is_some() {
			return Some(FieldType::value(Adapter));
		}
		if generic_arg(ty, "Json").is_some() {
			return Some(FieldType::value(Json));
		}
		if let Some(args) = generic_arg(ty, "HashMap") {
			return match args {
				"String,String" => Some(FieldType::value(StringMap)),
				"String,Option<String>" => Some(FieldType::value(Adapter)),
				_ => None,
			};
		}
		if let Some(inner) = generic_arg(ty, "Vec") {
			let kind = match last_segment(inner) {
				"u8" => Bytes,
				"bool" => BoolVec,
				"i16" => I16Vec,
				"i32" => I32Vec,
				"i64" => I64Vec,
				"f32" => F32Vec,
				"f64" => F64Vec,
				"String" => StringVec,
				"NaiveDateTime" => DateTimeVec,
				"Uuid" => UuidVec,
				_ if generic_arg(inner, "DateTime").is_some() => DateTimeUtcVec,
				_ => return None,
			};
			return Some(FieldType::value(kind));
		}
		if generic_arg(ty, "DateTime").is_some() {
			return Some(FieldType::value(DateTimeUtc));
		}
		let kind = match last_segment(ty) {
			"bool" => Bool,
			"i16" => I16,
			"u16" => U16,
			"i32" => I32,
			"u32" => U32,
			"i64" => I64,
			"u64" => U64,
			"isize" => Isize,
			"usize" => Usize,
			"f32" => F32,
			"f64" => F64,
			"String" => String,
			"NaiveDate" => Date,
			"NaiveDateTime" => DateTime,
			"Uuid" => Uuid,
			"Value" => Json,
			"Hstore" | "RawValue" => Adapter,
			_ => return None,
		};
		Some(FieldType::value(kind))
	}
}

/// `Name<args>` (optionally path qualified) to `args`
fn generic_arg<'a>(ty: &'a str, name: &str) -> Option<&'a str> {
	let open = ty.find('<')?;
	let inner = ty.strip_suffix('>')?;
	if last_segment(&ty[..open]) != name {
		return None;
	}
	Some(&inner[open + 1..])
}

fn last_segment(path: &str) -> &str {
	path.rsplit("::").next().unwrap_or(path)
}

/// Looks up the conversion for binding `field` to `column`
///
/// Adapters resolve to [`Conversion::Adapter`] for every column, whether the adapter accepts the
/// column is decided by the adapter itself when its codec is built
///
/// [`Conversion::Adapter`]: ./enum.Conversion.html#variant.Adapter
pub fn resolve(field: FieldType, column: ColumnType) -> Result<Binding, BindError> {
	if field.kind == FieldKind::Adapter {
		let conv = Conversion::Adapter { source: field.source };
		return Ok(Binding { field, column, encode: conv, decode: conv });
	}
	let rule = field.kind.rules().iter().find(|(c, _, _)| *c == column);
	match rule {
		Some(&(_, enc, dec)) => Ok(Binding {
			field,
			column,
			encode: Conversion::Native { source: field.source, cast: enc },
			decode: Conversion::Native { source: field.source, cast: dec },
		}),
		None => Err(unsupported(field, column)),
	}
}

/// Resolves a declared SQL type name, normalizing it first
pub fn resolve_named(field: FieldType, sql_type: &str) -> Result<Binding, BindError> {
	match ColumnType::normalize(sql_type) {
		Some(column) => resolve(field, column),
		None => Err(BindError::UnsupportedBinding { field: field.to_string(), column: sql_type.to_owned() }),
	}
}

pub(crate) fn unsupported(field: FieldType, column: ColumnType) -> BindError {
	BindError::UnsupportedBinding { field: field.to_string(), column: column.name().to_owned() }
}
