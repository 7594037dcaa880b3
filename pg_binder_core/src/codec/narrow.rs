//! Decoders that read whichever integer or float column they are given and convert it to the
//! requested Rust type, checking the range whenever the conversion could lose information
use std::{
	any::type_name,
	convert::TryFrom,
	fmt::Display,
};

use super::{ decode_bool, decode_float4, decode_float8, decode_int2, decode_int4, decode_int8, poisoned };
use crate::{
	catalog::{ oid, ColumnType },
	wire::WireCursor,
	BindError,
};

/// Checked conversion between integer types, failing with [`BindError::Overflow`] naming the value
/// and the target type
///
/// [`BindError::Overflow`]: ../enum.BindError.html#variant.Overflow
pub fn narrow<T, S>(v: S) -> Result<T, BindError>
where
	T: TryFrom<S>,
	S: Display + Copy,
{
	T::try_from(v).map_err(|_| BindError::overflow(v, type_name::<T>()))
}

/// Narrows a double to a float
///
/// Finite values beyond the float range fail. NaN and the infinities are carried over unchanged
pub fn narrow_f64(v: f64) -> Result<f32, BindError> {
	if v.is_finite() && v.abs() > f64::from(f32::MAX) {
		return Err(BindError::overflow(v, "f32"));
	}
	Ok(v as f32)
}

/// Reads a bool, int2, int4 or int8 column widened to i64
pub fn decode_integer<C: WireCursor + ?Sized>(vr: &mut C) -> Result<i64, BindError> {
	poisoned(vr)?;
	match vr.type_oid() {
		oid::BOOL => decode_bool(vr).map(i64::from),
		oid::INT2 => decode_int2(vr).map(i64::from),
		oid::INT4 => decode_int4(vr).map(i64::from),
		oid::INT8 => decode_int8(vr),
		found => Err(vr.fail(BindError::oid_mismatch("integer", ColumnType::Int8, found))),
	}
}

/// Reads any integer column into `T`, failing if the stored value does not fit
///
/// ```
/// # use pg_binder_core::{ codec, Format, ValueReader };
/// let mut vr = ValueReader::new(20, Format::Binary, Some(&[0, 0, 0, 0, 0, 0, 0x7f, 0xff]));
/// assert_eq!(codec::decode_into::<i16, _>(&mut vr), Ok(i16::MAX));
/// ```
pub fn decode_into<T, C>(vr: &mut C) -> Result<T, BindError>
where
	T: TryFrom<i64>,
	C: WireCursor + ?Sized,
{
	let v = decode_integer(vr)?;
	match narrow::<T, i64>(v) {
		Ok(t) => Ok(t),
		Err(e) => Err(vr.fail(e)),
	}
}

pub fn decode_into_f32<C: WireCursor + ?Sized>(vr: &mut C) -> Result<f32, BindError> {
	poisoned(vr)?;
	match vr.type_oid() {
		oid::FLOAT4 => decode_float4(vr),
		oid::FLOAT8 => {
			let v = decode_float8(vr)?;
			narrow_f64(v).map_err(|e| vr.fail(e))
		},
		found => Err(vr.fail(BindError::oid_mismatch("f32", ColumnType::Float4, found))),
	}
}

pub fn decode_into_f64<C: WireCursor + ?Sized>(vr: &mut C) -> Result<f64, BindError> {
	poisoned(vr)?;
	match vr.type_oid() {
		oid::FLOAT4 => decode_float4(vr).map(f64::from),
		oid::FLOAT8 => decode_float8(vr),
		found => Err(vr.fail(BindError::oid_mismatch("f64", ColumnType::Float8, found))),
	}
}
