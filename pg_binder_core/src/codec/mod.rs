//! Binary encode and decode routines for every [`ColumnType`]
//!
//! Decoders take a [`WireCursor`] positioned at the start of a value and police it in a fixed order
//! before reading anything: NULL, then wire type id, then format code, then (for fixed width types)
//! the exact length. Every failure is recorded on the cursor.
//!
//! Encoders write the complete wire value, 4 byte length prefix included, to a [`WriteSink`]
//!
//! [`ColumnType`]: ../catalog/enum.ColumnType.html
//! [`WireCursor`]: ../wire/trait.WireCursor.html
//! [`WriteSink`]: ../wire/trait.WriteSink.html
use crate::{
	catalog::{ ColumnType, Format },
	wire::{ WireCursor, WriteSink },
	BindError,
};

mod array;
mod hstore;
mod narrow;
mod scalar;
mod text;
mod time;

pub use array::*;
pub use hstore::*;
pub use narrow::*;
pub use scalar::*;
pub use text::*;
pub use time::*;

/// Writes the length prefix of a NULL value
pub fn encode_null<S: WriteSink + ?Sized>(sink: &mut S) {
	sink.append_i32(-1);
}

/// Converts a payload length to the wire's i32, failing for payloads over 2GB
pub fn pg_len(what: &'static str, len: usize) -> Result<i32, BindError> {
	use std::convert::TryFrom;
	i32::try_from(len).map_err(|_| BindError::overflow(len, what))
}

/// Hands back the error already recorded on the cursor, if any
pub(crate) fn poisoned<C: WireCursor + ?Sized>(vr: &C) -> Result<(), BindError> {
	match vr.last_error() {
		Some(e) => Err(e.clone()),
		None => Ok(()),
	}
}

/// Null and wire type id checks shared by every decoder
///
/// hstore has no stable oid so its id is not compared
pub(crate) fn guard_value<C: WireCursor + ?Sized>(vr: &mut C, column: ColumnType, target: &'static str) -> Result<Format, BindError> {
	poisoned(vr)?;
	if vr.is_null() {
		return Err(vr.fail(BindError::NullNotAllowed(target)));
	}
	if column != ColumnType::Hstore && vr.type_oid() != column.oid() {
		let found = vr.type_oid();
		return Err(vr.fail(BindError::oid_mismatch(target, column, found)));
	}
	match vr.format() {
		Ok(f) => Ok(f),
		Err(e) => Err(vr.fail(e)),
	}
}

/// [`guard_value`] for types that only have a binary decoder, including the width check
pub(crate) fn guard_binary<C: WireCursor + ?Sized>(vr: &mut C, column: ColumnType, target: &'static str) -> Result<(), BindError> {
	let format = guard_value(vr, column, target)?;
	if format != Format::Binary {
		return Err(vr.fail(BindError::format_mismatch(target, format)));
	}
	if let Some(width) = column.width() {
		expect_len(vr, width, target)?;
	}
	Ok(())
}

pub(crate) fn expect_len<C: WireCursor + ?Sized>(vr: &mut C, width: i32, target: &'static str) -> Result<(), BindError> {
	if vr.len() != width {
		let found = vr.len();
		return Err(vr.fail(BindError::InvalidLength { target, expected: width, found }));
	}
	Ok(())
}
