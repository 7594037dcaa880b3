use thiserror::Error;

use crate::catalog::{ ColumnType, Format, Oid };

/// Every failure the codec, the resolver and the dispatch tables can report
///
/// Errors are returned to the caller immediately, nothing is retried. The type is `Clone` so a
/// [`WireCursor`] can hold on to the first error it saw and hand it back on every later read
///
/// [`WireCursor`]: ./trait.WireCursor.html
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BindError {
	#[error("cannot decode oid {found} into {target} (expected oid {expected})")]
	OidMismatch {
		target: &'static str,
		expected: Oid,
		found: Oid,
	},
	#[error("cannot decode {target} from format code {found}")]
	FormatMismatch {
		target: &'static str,
		found: i16,
	},
	#[error("unknown format code: {0}")]
	UnknownFormat(i16),
	#[error("invalid length for {target}: expected {expected} bytes, found {found}")]
	InvalidLength {
		target: &'static str,
		expected: i32,
		found: i32,
	},
	#[error("cannot decode null into non-nullable {0}")]
	NullNotAllowed(&'static str),
	#[error("{value} is out of range for {target}")]
	Overflow {
		value: String,
		target: &'static str,
	},
	#[error("field type {field} cannot be bound to column type {column}")]
	UnsupportedBinding {
		field: String,
		column: String,
	},
	#[error("malformed array: {0}")]
	MalformedArray(String),
	#[error("column index {index} is out of range for a table with {len} columns")]
	DispatchOutOfRange {
		index: usize,
		len: usize,
	},
	#[error("column {column} not found in {table}")]
	UnknownColumn {
		table: &'static str,
		column: String,
	},
	#[error("column {column} is declared more than once in {table}")]
	DuplicateColumn {
		table: &'static str,
		column: String,
	},
	#[error("{table} declares {count} columns, at most 256 are supported")]
	SchemaTooWide {
		table: &'static str,
		count: usize,
	},
	#[error("could not deserialize {target}: {message}")]
	Deserialization {
		target: &'static str,
		message: String,
	},
	#[error("could not parse {input:?} as {target}")]
	Parse {
		target: &'static str,
		input: String,
	},
	#[error("invalid UTF-8 in {0} value")]
	Utf8(&'static str),
	#[error("driver error: {0}")]
	Driver(String),
}

impl BindError {
	/// Wire type id mismatch for `column`
	pub fn oid_mismatch(target: &'static str, column: ColumnType, found: Oid) -> Self {
		BindError::OidMismatch { target, expected: column.oid(), found }
	}

	/// Unsupported format code for `target`
	pub fn format_mismatch(target: &'static str, found: Format) -> Self {
		BindError::FormatMismatch { target, found: found as i16 }
	}

	pub fn overflow<V: ToString>(value: V, target: &'static str) -> Self {
		BindError::Overflow { value: value.to_string(), target }
	}

	/// True for the errors raised by a wrong wire type id or format code
	pub fn is_protocol_mismatch(&self) -> bool {
		matches!(self, BindError::OidMismatch { .. } | BindError::FormatMismatch { .. } | BindError::UnknownFormat(_))
	}
}

impl From<serde_json::Error> for BindError {
	fn from(e: serde_json::Error) -> Self {
		BindError::Deserialization { target: "json", message: e.to_string() }
	}
}

impl From<tokio_postgres::Error> for BindError {
	fn from(e: tokio_postgres::Error) -> Self {
		BindError::Driver(e.to_string())
	}
}
