use std::collections::HashMap;

use super::{ guard_binary, pg_len };
use crate::{
	catalog::ColumnType,
	wire::{ WireCursor, WriteSink },
	BindError,
};

fn read_len<C: WireCursor + ?Sized>(vr: &mut C, what: &'static str) -> Result<Option<usize>, BindError> {
	let n = vr.read_i32()?;
	if n < -1 {
		return Err(vr.fail(BindError::InvalidLength { target: what, expected: -1, found: n }));
	}
	Ok(if n == -1 { None } else { Some(n as usize) })
}

/// Decodes an hstore, keeping NULL values
///
/// Duplicate keys are not checked for, a later pair replaces an earlier one
pub fn decode_hstore<C: WireCursor + ?Sized>(vr: &mut C) -> Result<HashMap<String, Option<String>>, BindError> {
	guard_binary(vr, ColumnType::Hstore, "hstore")?;
	let count = vr.read_i32()?;
	if count < 0 {
		return Err(vr.fail(BindError::InvalidLength { target: "hstore", expected: 0, found: count }));
	}
	// a pair is at least two lengths
	let mut map = HashMap::with_capacity((count as usize).min(vr.len().max(0) as usize / 8));
	for _ in 0..count {
		let key = match read_len(vr, "hstore key")? {
			Some(n) => vr.read_string(n)?,
			None => return Err(vr.fail(BindError::NullNotAllowed("hstore key"))),
		};
		let value = match read_len(vr, "hstore value")? {
			Some(n) => Some(vr.read_string(n)?),
			None => None,
		};
		map.insert(key, value);
	}
	Ok(map)
}

/// Decodes an hstore into plain strings, a NULL value is an error
pub fn decode_hstore_strict<C: WireCursor + ?Sized>(vr: &mut C) -> Result<HashMap<String, String>, BindError> {
	let map = decode_hstore(vr)?;
	let mut out = HashMap::with_capacity(map.len());
	for (k, v) in map {
		match v {
			Some(v) => out.insert(k, v),
			None => return Err(vr.fail(BindError::NullNotAllowed("hstore value"))),
		};
	}
	Ok(out)
}

/// Encodes key/value pairs as an hstore, `None` values are written as NULL
pub fn encode_hstore<'a, I, S>(pairs: I, sink: &mut S) -> Result<(), BindError>
where
	I: IntoIterator<Item = (&'a str, Option<&'a str>)>,
	I::IntoIter: Clone,
	S: WriteSink + ?Sized,
{
	let pairs = pairs.into_iter();
	let mut count = 0usize;
	let mut total = 4usize;
	for (k, v) in pairs.clone() {
		count += 1;
		total += 8 + k.len() + v.map_or(0, str::len);
	}
	sink.append_i32(pg_len("hstore", total)?);
	sink.append_i32(pg_len("hstore", count)?);
	for (k, v) in pairs {
		sink.append_i32(pg_len("hstore key", k.len())?);
		sink.append_str(k);
		match v {
			Some(v) => {
				sink.append_i32(pg_len("hstore value", v.len())?);
				sink.append_str(v);
			},
			None => sink.append_i32(-1),
		}
	}
	Ok(())
}
