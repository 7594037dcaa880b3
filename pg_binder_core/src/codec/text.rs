//! Variable length values: bytea, text, varchar and json, plus uuid which is fixed width but is
//! frequently bound to strings
use serde::{ de::DeserializeOwned, Serialize };
use uuid::Uuid;

use super::{ guard_binary, guard_value, pg_len, poisoned };
use crate::{
	catalog::ColumnType,
	wire::{ WireCursor, WriteSink },
	BindError,
};

fn read_rest<C: WireCursor + ?Sized>(vr: &mut C) -> Result<Vec<u8>, BindError> {
	let n = vr.len() as usize;
	Ok(vr.read_bytes(n)?.to_vec())
}

fn utf8<C: WireCursor + ?Sized>(vr: &mut C, raw: Vec<u8>, target: &'static str) -> Result<String, BindError> {
	String::from_utf8(raw).map_err(|_| vr.fail(BindError::Utf8(target)))
}

fn encode_raw<S: WriteSink + ?Sized>(what: &'static str, raw: &[u8], sink: &mut S) -> Result<(), BindError> {
	sink.append_i32(pg_len(what, raw.len())?);
	sink.append_bytes(raw);
	Ok(())
}

/// Decodes a bytea column
///
/// Unlike every other type a NULL bytea is not an error, it decodes to an empty buffer
pub fn decode_bytea<C: WireCursor + ?Sized>(vr: &mut C) -> Result<Vec<u8>, BindError> {
	poisoned(vr)?;
	if vr.is_null() {
		return Ok(Vec::new());
	}
	guard_binary(vr, ColumnType::Bytea, "bytea")?;
	read_rest(vr)
}

pub fn encode_bytea<S: WriteSink + ?Sized>(v: &[u8], sink: &mut S) -> Result<(), BindError> {
	encode_raw("bytea", v, sink)
}

/// Reads a text or varchar column (`column` picks which oid is expected)
///
/// Both formats carry the same UTF-8 bytes, so both are accepted
pub fn decode_string<C: WireCursor + ?Sized>(vr: &mut C, column: ColumnType) -> Result<String, BindError> {
	let raw = decode_string_bytes(vr, column)?;
	utf8(vr, raw, column.name())
}

/// [`decode_string`](fn.decode_string.html) without the UTF-8 check
pub fn decode_string_bytes<C: WireCursor + ?Sized>(vr: &mut C, column: ColumnType) -> Result<Vec<u8>, BindError> {
	guard_value(vr, column, column.name())?;
	read_rest(vr)
}

pub fn decode_text<C: WireCursor + ?Sized>(vr: &mut C) -> Result<String, BindError> {
	decode_string(vr, ColumnType::Text)
}

pub fn decode_varchar<C: WireCursor + ?Sized>(vr: &mut C) -> Result<String, BindError> {
	decode_string(vr, ColumnType::Varchar)
}

/// Encodes a text, varchar or json payload
///
/// The bytes are the same whichever format was negotiated for the parameter
pub fn encode_text<S: WriteSink + ?Sized>(v: &str, sink: &mut S) -> Result<(), BindError> {
	encode_raw("text", v.as_bytes(), sink)
}

/// Text columns bound to byte buffers
pub fn encode_text_bytes<S: WriteSink + ?Sized>(v: &[u8], sink: &mut S) -> Result<(), BindError> {
	if std::str::from_utf8(v).is_err() {
		return Err(BindError::Utf8("text"));
	}
	encode_raw("text", v, sink)
}

/// The raw json document, unparsed
pub fn decode_json_bytes<C: WireCursor + ?Sized>(vr: &mut C) -> Result<Vec<u8>, BindError> {
	decode_string_bytes(vr, ColumnType::Json)
}

pub fn decode_json_string<C: WireCursor + ?Sized>(vr: &mut C) -> Result<String, BindError> {
	decode_string(vr, ColumnType::Json)
}

/// Parses the json document into `T`
pub fn decode_json<T: DeserializeOwned, C: WireCursor + ?Sized>(vr: &mut C) -> Result<T, BindError> {
	let raw = decode_json_bytes(vr)?;
	serde_json::from_slice(&raw).map_err(|e| vr.fail(BindError::from(e)))
}

pub fn encode_json_bytes<S: WriteSink + ?Sized>(v: &[u8], sink: &mut S) -> Result<(), BindError> {
	encode_raw("json", v, sink)
}

pub fn encode_json<T: Serialize + ?Sized, S: WriteSink + ?Sized>(v: &T, sink: &mut S) -> Result<(), BindError> {
	let raw = serde_json::to_vec(v).map_err(|e| BindError::Deserialization { target: "json", message: e.to_string() })?;
	encode_raw("json", &raw, sink)
}

pub fn decode_uuid<C: WireCursor + ?Sized>(vr: &mut C) -> Result<Uuid, BindError> {
	guard_binary(vr, ColumnType::Uuid, "uuid")?;
	let raw = vr.read_bytes(16)?;
	let mut bytes = [0u8; 16];
	bytes.copy_from_slice(raw);
	Ok(Uuid::from_bytes(bytes))
}

/// Decodes a uuid into its hyphenated lower case form
pub fn decode_uuid_string<C: WireCursor + ?Sized>(vr: &mut C) -> Result<String, BindError> {
	decode_uuid(vr).map(|u| u.hyphenated().to_string())
}

pub fn encode_uuid<S: WriteSink + ?Sized>(v: &Uuid, sink: &mut S) {
	sink.append_i32(16);
	sink.append_bytes(v.as_bytes());
}

/// Encodes a uuid given in any of the forms [`Uuid::parse_str`] accepts
///
/// [`Uuid::parse_str`]: https://docs.rs/uuid/1/uuid/struct.Uuid.html#method.parse_str
pub fn encode_uuid_str<S: WriteSink + ?Sized>(v: &str, sink: &mut S) -> Result<(), BindError> {
	let id = Uuid::parse_str(v).map_err(|_| BindError::Parse { target: "uuid", input: v.to_owned() })?;
	encode_uuid(&id, sink);
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::{
		catalog::Format,
		codec::test_util::*,
		wire::ValueReader,
	};
	use serde::Deserialize;

	#[test]
	fn null_bytea_is_empty() {
		let mut vr = ValueReader::new(17, Format::Binary, None);
		assert_eq!(decode_bytea(&mut vr), Ok(Vec::new()));
	}

	#[test]
	fn null_text_is_an_error() {
		let mut vr = ValueReader::new(25, Format::Binary, None);
		assert_eq!(decode_text(&mut vr), Err(BindError::NullNotAllowed("text")));
	}

	#[test]
	fn bytea_round_trip() {
		let wire = encoded(|s| encode_bytea(&[0, 1, 0xff], s).unwrap());
		assert_eq!(wire, vec![0, 0, 0, 3, 0, 1, 0xff]);
		assert_eq!(decode_bytea(&mut reader(ColumnType::Bytea, &wire)), Ok(vec![0, 1, 0xff]));
		let wire = encoded(|s| encode_bytea(&[], s).unwrap());
		assert_eq!(decode_bytea(&mut reader(ColumnType::Bytea, &wire)), Ok(vec![]));
	}

	#[test]
	fn text_accepts_either_format() {
		let mut vr = raw_reader(1043, Format::Text, "grüße".as_bytes());
		assert_eq!(decode_varchar(&mut vr), Ok("grüße".to_owned()));
		let mut vr = raw_reader(1043, Format::Binary, b"abc");
		assert_eq!(decode_varchar(&mut vr), Ok("abc".to_owned()));
		// text oid for a varchar target
		let mut vr = raw_reader(25, Format::Binary, b"abc");
		assert!(decode_varchar(&mut vr).unwrap_err().is_protocol_mismatch());
	}

	#[test]
	fn invalid_utf8() {
		let mut vr = raw_reader(25, Format::Binary, &[0xc3, 0x28]);
		assert_eq!(decode_text(&mut vr), Err(BindError::Utf8("text")));
		assert!(encode_text_bytes(&[0xc3, 0x28], &mut Vec::new()).is_err());
	}

	#[derive(Debug, PartialEq, Deserialize, Serialize)]
	struct Settings {
		depth: u32,
		name: String,
	}

	#[test]
	fn json_structured() {
		let wire = encoded(|s| encode_json(&Settings { depth: 3, name: "x".into() }, s).unwrap());
		let got: Settings = decode_json(&mut reader(ColumnType::Json, &wire)).unwrap();
		assert_eq!(got, Settings { depth: 3, name: "x".into() });

		let mut vr = raw_reader(114, Format::Text, br#"{"depth": -1}"#);
		assert!(matches!(decode_json::<Settings, _>(&mut vr), Err(BindError::Deserialization { .. })));
	}

	#[test]
	fn json_opaque() {
		let mut vr = raw_reader(114, Format::Text, br#"{"a":1}"#);
		assert_eq!(decode_json_string(&mut vr), Ok(r#"{"a":1}"#.to_owned()));
		let mut vr = raw_reader(114, Format::Binary, b"not json at all");
		assert_eq!(decode_json_bytes(&mut vr), Ok(b"not json at all".to_vec()));
	}

	#[test]
	fn uuid_forms() {
		let id = "67e55044-10b1-426f-9247-bb680e5fe0c8";
		let wire = encoded(|s| encode_uuid_str(id, s).unwrap());
		assert_eq!(wire.len(), 20);
		assert_eq!(decode_uuid_string(&mut reader(ColumnType::Uuid, &wire)), Ok(id.to_owned()));
		assert_eq!(decode_uuid(&mut reader(ColumnType::Uuid, &wire)).unwrap().to_string(), id);

		assert!(matches!(encode_uuid_str("nope", &mut Vec::new()), Err(BindError::Parse { target: "uuid", .. })));

		let mut vr = raw_reader(2950, Format::Binary, &[0; 15]);
		assert!(matches!(decode_uuid(&mut vr), Err(BindError::InvalidLength { expected: 16, found: 15, .. })));
	}

	#[test]
	fn uuid_matches_postgres_types() {
		use bytes::BytesMut;
		use postgres_types::{ ToSql, Type };

		let id = Uuid::from_u128(0xa0ee_bc99_9c0b_4ef8_bb6d_6bb9_bd38_0a11);
		let mut theirs = BytesMut::new();
		id.to_sql(&Type::UUID, &mut theirs).unwrap();
		let ours = encoded(|s| encode_uuid(&id, s));
		assert_eq!(&ours[4..], &theirs[..]);
	}
}
