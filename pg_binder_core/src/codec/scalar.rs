use super::{ guard_binary, guard_value, expect_len };
use crate::{
	catalog::{ ColumnType, Format, Oid },
	wire::{ WireCursor, WriteSink },
	BindError,
};

pub fn decode_bool<C: WireCursor + ?Sized>(vr: &mut C) -> Result<bool, BindError> {
	guard_binary(vr, ColumnType::Bool, "bool")?;
	Ok(vr.read_u8()? != 0)
}

pub fn encode_bool<S: WriteSink + ?Sized>(v: bool, sink: &mut S) {
	sink.append_i32(1);
	sink.append_bytes(&[v as u8]);
}

pub fn decode_int2<C: WireCursor + ?Sized>(vr: &mut C) -> Result<i16, BindError> {
	guard_binary(vr, ColumnType::Int2, "int2")?;
	vr.read_i16()
}

pub fn encode_int2<S: WriteSink + ?Sized>(v: i16, sink: &mut S) {
	sink.append_i32(2);
	sink.append_i16(v);
}

pub fn decode_int4<C: WireCursor + ?Sized>(vr: &mut C) -> Result<i32, BindError> {
	guard_binary(vr, ColumnType::Int4, "int4")?;
	vr.read_i32()
}

pub fn encode_int4<S: WriteSink + ?Sized>(v: i32, sink: &mut S) {
	sink.append_i32(4);
	sink.append_i32(v);
}

pub fn decode_int8<C: WireCursor + ?Sized>(vr: &mut C) -> Result<i64, BindError> {
	guard_binary(vr, ColumnType::Int8, "int8")?;
	vr.read_i64()
}

pub fn encode_int8<S: WriteSink + ?Sized>(v: i64, sink: &mut S) {
	sink.append_i32(8);
	sink.append_i64(v);
}

pub fn decode_float4<C: WireCursor + ?Sized>(vr: &mut C) -> Result<f32, BindError> {
	guard_binary(vr, ColumnType::Float4, "float4")?;
	Ok(f32::from_bits(vr.read_i32()? as u32))
}

pub fn encode_float4<S: WriteSink + ?Sized>(v: f32, sink: &mut S) {
	sink.append_i32(4);
	sink.append_i32(v.to_bits() as i32);
}

pub fn decode_float8<C: WireCursor + ?Sized>(vr: &mut C) -> Result<f64, BindError> {
	guard_binary(vr, ColumnType::Float8, "float8")?;
	Ok(f64::from_bits(vr.read_i64()? as u64))
}

pub fn encode_float8<S: WriteSink + ?Sized>(v: f64, sink: &mut S) {
	sink.append_i32(8);
	sink.append_i64(v.to_bits() as i64);
}

/// Decodes an oid column, which may arrive as binary or as decimal text
pub fn decode_oid<C: WireCursor + ?Sized>(vr: &mut C) -> Result<Oid, BindError> {
	match guard_value(vr, ColumnType::Oid, "oid")? {
		Format::Binary => {
			expect_len(vr, 4, "oid")?;
			Ok(vr.read_i32()? as u32)
		},
		Format::Text => {
			let n = vr.len() as usize;
			let s = vr.read_string(n)?;
			match s.trim().parse::<u32>() {
				Ok(id) => Ok(id),
				Err(_) => Err(vr.fail(BindError::Parse { target: "oid", input: s })),
			}
		},
	}
}

pub fn encode_oid<S: WriteSink + ?Sized>(v: Oid, sink: &mut S) {
	sink.append_i32(4);
	sink.append_i32(v as i32);
}
