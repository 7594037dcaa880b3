//! One dimensional arrays
//!
//! ```text
//! int32 totalLen | int32 ndim (=1) | int32 hasNull (=0) | int32 elementOid | int32 count | int32 lowerBound (=1)
//! then per element: int32 len | payload
//! ```
//!
//! NULL elements are not supported, decoding one is an error
use chrono::{ DateTime, NaiveDateTime, Utc };
use uuid::Uuid;

use super::{ instant_from_micros, micros_from_instant, pg_len, poisoned };
use crate::{
	catalog::{ ColumnType, Format, Oid },
	wire::{ WireCursor, WriteSink },
	BindError,
};

/// Size of the array header, excluding the leading length
const HEADER_LEN: usize = 20;

/// A type that can be an element of a one dimensional array
pub trait ArrayElement: Sized {
	/// Whether arrays of `element` can hold this type
	fn accepts(element: ColumnType) -> bool;

	/// Reads an element payload of `len` bytes
	fn decode_element<C: WireCursor + ?Sized>(vr: &mut C, len: usize) -> Result<Self, BindError>;

	/// Payload length, excluding the 4 byte prefix
	fn element_len(&self) -> usize;

	/// Writes the payload, excluding the 4 byte prefix
	fn encode_element<S: WriteSink + ?Sized>(&self, sink: &mut S) -> Result<(), BindError>;
}

fn fixed<C: WireCursor + ?Sized>(vr: &mut C, len: usize, width: usize, target: &'static str) -> Result<(), BindError> {
	if len != width {
		return Err(vr.fail(BindError::InvalidLength { target, expected: width as i32, found: len as i32 }));
	}
	Ok(())
}

impl ArrayElement for bool {
	fn accepts(element: ColumnType) -> bool {
		element == ColumnType::Bool
	}
	fn decode_element<C: WireCursor + ?Sized>(vr: &mut C, len: usize) -> Result<Self, BindError> {
		fixed(vr, len, 1, "bool")?;
		Ok(vr.read_u8()? != 0)
	}
	fn element_len(&self) -> usize {
		1
	}
	fn encode_element<S: WriteSink + ?Sized>(&self, sink: &mut S) -> Result<(), BindError> {
		sink.append_bytes(&[*self as u8]);
		Ok(())
	}
}

impl ArrayElement for i16 {
	fn accepts(element: ColumnType) -> bool {
		element == ColumnType::Int2
	}
	fn decode_element<C: WireCursor + ?Sized>(vr: &mut C, len: usize) -> Result<Self, BindError> {
		fixed(vr, len, 2, "int2")?;
		vr.read_i16()
	}
	fn element_len(&self) -> usize {
		2
	}
	fn encode_element<S: WriteSink + ?Sized>(&self, sink: &mut S) -> Result<(), BindError> {
		sink.append_i16(*self);
		Ok(())
	}
}

impl ArrayElement for i32 {
	fn accepts(element: ColumnType) -> bool {
		element == ColumnType::Int4
	}
	fn decode_element<C: WireCursor + ?Sized>(vr: &mut C, len: usize) -> Result<Self, BindError> {
		fixed(vr, len, 4, "int4")?;
		vr.read_i32()
	}
	fn element_len(&self) -> usize {
		4
	}
	fn encode_element<S: WriteSink + ?Sized>(&self, sink: &mut S) -> Result<(), BindError> {
		sink.append_i32(*self);
		Ok(())
	}
}

impl ArrayElement for i64 {
	fn accepts(element: ColumnType) -> bool {
		element == ColumnType::Int8
	}
	fn decode_element<C: WireCursor + ?Sized>(vr: &mut C, len: usize) -> Result<Self, BindError> {
		fixed(vr, len, 8, "int8")?;
		vr.read_i64()
	}
	fn element_len(&self) -> usize {
		8
	}
	fn encode_element<S: WriteSink + ?Sized>(&self, sink: &mut S) -> Result<(), BindError> {
		sink.append_i64(*self);
		Ok(())
	}
}

impl ArrayElement for f32 {
	fn accepts(element: ColumnType) -> bool {
		element == ColumnType::Float4
	}
	fn decode_element<C: WireCursor + ?Sized>(vr: &mut C, len: usize) -> Result<Self, BindError> {
		fixed(vr, len, 4, "float4")?;
		Ok(f32::from_bits(vr.read_i32()? as u32))
	}
	fn element_len(&self) -> usize {
		4
	}
	fn encode_element<S: WriteSink + ?Sized>(&self, sink: &mut S) -> Result<(), BindError> {
		sink.append_i32(self.to_bits() as i32);
		Ok(())
	}
}

impl ArrayElement for f64 {
	fn accepts(element: ColumnType) -> bool {
		element == ColumnType::Float8
	}
	fn decode_element<C: WireCursor + ?Sized>(vr: &mut C, len: usize) -> Result<Self, BindError> {
		fixed(vr, len, 8, "float8")?;
		Ok(f64::from_bits(vr.read_i64()? as u64))
	}
	fn element_len(&self) -> usize {
		8
	}
	fn encode_element<S: WriteSink + ?Sized>(&self, sink: &mut S) -> Result<(), BindError> {
		sink.append_i64(self.to_bits() as i64);
		Ok(())
	}
}

impl ArrayElement for String {
	fn accepts(element: ColumnType) -> bool {
		matches!(element, ColumnType::Text | ColumnType::Varchar)
	}
	fn decode_element<C: WireCursor + ?Sized>(vr: &mut C, len: usize) -> Result<Self, BindError> {
		vr.read_string(len)
	}
	fn element_len(&self) -> usize {
		self.len()
	}
	fn encode_element<S: WriteSink + ?Sized>(&self, sink: &mut S) -> Result<(), BindError> {
		sink.append_str(self);
		Ok(())
	}
}

impl ArrayElement for DateTime<Utc> {
	fn accepts(element: ColumnType) -> bool {
		matches!(element, ColumnType::Timestamp | ColumnType::TimestampTz)
	}
	fn decode_element<C: WireCursor + ?Sized>(vr: &mut C, len: usize) -> Result<Self, BindError> {
		fixed(vr, len, 8, "timestamp")?;
		let stored = vr.read_i64()?;
		instant_from_micros(stored).map_err(|e| vr.fail(e))
	}
	fn element_len(&self) -> usize {
		8
	}
	fn encode_element<S: WriteSink + ?Sized>(&self, sink: &mut S) -> Result<(), BindError> {
		sink.append_i64(micros_from_instant(self)?);
		Ok(())
	}
}

impl ArrayElement for NaiveDateTime {
	fn accepts(element: ColumnType) -> bool {
		<DateTime<Utc> as ArrayElement>::accepts(element)
	}
	fn decode_element<C: WireCursor + ?Sized>(vr: &mut C, len: usize) -> Result<Self, BindError> {
		<DateTime<Utc> as ArrayElement>::decode_element(vr, len).map(|t| t.naive_utc())
	}
	fn element_len(&self) -> usize {
		8
	}
	fn encode_element<S: WriteSink + ?Sized>(&self, sink: &mut S) -> Result<(), BindError> {
		self.and_utc().encode_element(sink)
	}
}

impl ArrayElement for Uuid {
	fn accepts(element: ColumnType) -> bool {
		element == ColumnType::Uuid
	}
	fn decode_element<C: WireCursor + ?Sized>(vr: &mut C, len: usize) -> Result<Self, BindError> {
		fixed(vr, len, 16, "uuid")?;
		let mut bytes = [0u8; 16];
		bytes.copy_from_slice(vr.read_bytes(16)?);
		Ok(Uuid::from_bytes(bytes))
	}
	fn element_len(&self) -> usize {
		16
	}
	fn encode_element<S: WriteSink + ?Sized>(&self, sink: &mut S) -> Result<(), BindError> {
		sink.append_bytes(self.as_bytes());
		Ok(())
	}
}

fn malformed<C: WireCursor + ?Sized>(vr: &mut C, what: String) -> BindError {
	vr.fail(BindError::MalformedArray(what))
}

/// Decodes a one dimensional array
///
/// Any array oid whose element type `T` [accepts](trait.ArrayElement.html#tymethod.accepts) is allowed,
/// so `Vec<String>` reads both `text[]` and `varchar[]`. A NULL array decodes to an empty vector
pub fn decode_array<T, C>(vr: &mut C) -> Result<Vec<T>, BindError>
where
	T: ArrayElement,
	C: WireCursor + ?Sized,
{
	poisoned(vr)?;
	if vr.is_null() {
		return Ok(Vec::new());
	}
	let found = vr.type_oid();
	let accepted = ColumnType::from_oid(found).and_then(ColumnType::element).map_or(false, T::accepts);
	if !accepted {
		let expected = ColumnType::ALL
			.iter()
			.copied()
			.find(|t| t.element().map_or(false, T::accepts))
			.map_or(0, ColumnType::oid);
		return Err(vr.fail(BindError::OidMismatch { target: "array", expected, found }));
	}
	let format = vr.format().map_err(|e| vr.fail(e))?;
	if format != Format::Binary {
		return Err(vr.fail(BindError::format_mismatch("array", format)));
	}

	let ndim = vr.read_i32()?;
	// has-null flag, never acted on
	vr.read_i32()?;
	let element_oid = vr.read_i32()?;
	match ndim {
		0 => return Ok(Vec::new()),
		1 => {},
		n => return Err(malformed(vr, format!("{} dimensions, only 1 is supported", n))),
	}
	let element_ok = ColumnType::from_oid(element_oid as Oid).map_or(false, T::accepts);
	if !element_ok {
		return Err(malformed(vr, format!("element type {} does not match {}", element_oid as Oid, found)));
	}
	let count = vr.read_i32()?;
	let lower_bound = vr.read_i32()?;
	if lower_bound != 1 {
		return Err(malformed(vr, format!("lower bound {}, expected 1", lower_bound)));
	}
	if count < 0 {
		return Err(malformed(vr, format!("negative element count {}", count)));
	}

	// every element carries at least its length
	let mut out = Vec::with_capacity((count as usize).min(vr.len().max(0) as usize / 4));
	for i in 0..count {
		let len = vr.read_i32()?;
		if len < 0 {
			return Err(malformed(vr, format!("element {} is NULL", i)));
		}
		out.push(T::decode_element(vr, len as usize)?);
	}
	Ok(out)
}

/// Encodes `values` as an array of `column`, which must be an array type
pub fn encode_array<T, S>(values: &[T], column: ColumnType, sink: &mut S) -> Result<(), BindError>
where
	T: ArrayElement,
	S: WriteSink + ?Sized,
{
	let element = match column.element() {
		Some(el) if T::accepts(el) => el,
		_ => return Err(BindError::UnsupportedBinding {
			field: std::any::type_name::<T>().to_owned(),
			column: column.name().to_owned(),
		}),
	};
	let payload: usize = values.iter().map(|v| 4 + v.element_len()).sum();
	sink.append_i32(pg_len("array", HEADER_LEN + payload)?);
	sink.append_i32(1);
	sink.append_i32(0);
	sink.append_i32(element.oid() as i32);
	sink.append_i32(pg_len("array", values.len())?);
	sink.append_i32(1);
	for v in values {
		sink.append_i32(pg_len("array element", v.element_len())?);
		v.encode_element(sink)?;
	}
	Ok(())
}
