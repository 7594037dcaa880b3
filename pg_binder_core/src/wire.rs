//! The two seams between the codec and the transport: [`WireCursor`] for reading a single column
//! value and [`WriteSink`] for writing parameters
//!
//! [`WireCursor`]: ./trait.WireCursor.html
//! [`WriteSink`]: ./trait.WriteSink.html
use byteorder::{ ByteOrder, NetworkEndian };
use bytes::{ BufMut, BytesMut };

use crate::{
	catalog::{ Format, Oid },
	BindError,
};

/// Read access to one column value as it arrived on the wire
///
/// A cursor remembers the first error recorded on it. Once it has failed every further read
/// returns that same error without consuming anything
pub trait WireCursor {
	/// Bytes left in the value, or -1 when the value is NULL
	fn len(&self) -> i32;
	/// The wire type id the server reported for the column
	fn type_oid(&self) -> Oid;
	/// The raw format code the column was sent in
	fn format_code(&self) -> i16;

	fn read_u8(&mut self) -> Result<u8, BindError>;
	fn read_i16(&mut self) -> Result<i16, BindError>;
	fn read_i32(&mut self) -> Result<i32, BindError>;
	fn read_i64(&mut self) -> Result<i64, BindError>;
	fn read_bytes(&mut self, n: usize) -> Result<&[u8], BindError>;

	/// Records `err` unless an earlier error is already recorded, and returns the recorded one
	fn fail(&mut self, err: BindError) -> BindError;
	fn last_error(&self) -> Option<&BindError>;

	fn is_null(&self) -> bool {
		self.len() < 0
	}

	fn format(&self) -> Result<Format, BindError> {
		use std::convert::TryFrom;
		Format::try_from(self.format_code())
	}

	fn read_string(&mut self, n: usize) -> Result<String, BindError> {
		let raw = self.read_bytes(n)?.to_vec();
		match String::from_utf8(raw) {
			Ok(s) => Ok(s),
			Err(_) => Err(self.fail(BindError::Utf8("text"))),
		}
	}
}

/// Append only output for encoded parameters
pub trait WriteSink {
	fn append_bytes(&mut self, b: &[u8]);
	fn append_i16(&mut self, n: i16);
	fn append_i32(&mut self, n: i32);

	fn append_str(&mut self, s: &str) {
		self.append_bytes(s.as_bytes());
	}
	fn append_i64(&mut self, n: i64) {
		self.append_bytes(&n.to_be_bytes());
	}
}

impl WriteSink for BytesMut {
	fn append_bytes(&mut self, b: &[u8]) {
		self.put_slice(b);
	}
	fn append_i16(&mut self, n: i16) {
		self.put_i16(n);
	}
	fn append_i32(&mut self, n: i32) {
		self.put_i32(n);
	}
	fn append_i64(&mut self, n: i64) {
		self.put_i64(n);
	}
}

impl WriteSink for Vec<u8> {
	fn append_bytes(&mut self, b: &[u8]) {
		self.extend_from_slice(b);
	}
	fn append_i16(&mut self, n: i16) {
		self.extend_from_slice(&n.to_be_bytes());
	}
	fn append_i32(&mut self, n: i32) {
		self.extend_from_slice(&n.to_be_bytes());
	}
}

/// A [`WireCursor`] over a borrowed payload
///
/// `raw` is the column payload without its length prefix, `None` for NULL
///
/// [`WireCursor`]: ./trait.WireCursor.html
#[derive(Debug, Clone)]
pub struct ValueReader<'a> {
	oid: Oid,
	format: i16,
	raw: Option<&'a [u8]>,
	pos: usize,
	err: Option<BindError>,
}

impl<'a> ValueReader<'a> {
	pub fn new(oid: Oid, format: Format, raw: Option<&'a [u8]>) -> Self {
		ValueReader::with_format_code(oid, format as i16, raw)
	}

	pub fn with_format_code(oid: Oid, format: i16, raw: Option<&'a [u8]>) -> Self {
		ValueReader { oid, format, raw, pos: 0, err: None }
	}

	/// Splits a length prefixed value (as written by the encoders) into a cursor
	pub fn from_wire(oid: Oid, format: Format, wire: &'a [u8]) -> Result<Self, BindError> {
		if wire.len() < 4 {
			return Err(BindError::InvalidLength { target: "value", expected: 4, found: wire.len() as i32 });
		}
		let len = NetworkEndian::read_i32(&wire[..4]);
		let raw = if len < 0 {
			None
		} else if wire.len() - 4 == len as usize {
			Some(&wire[4..])
		} else {
			return Err(BindError::InvalidLength { target: "value", expected: len, found: wire.len() as i32 - 4 });
		};
		Ok(ValueReader::new(oid, format, raw))
	}

	fn take(&mut self, n: usize, target: &'static str) -> Result<&'a [u8], BindError> {
		if let Some(e) = &self.err {
			return Err(e.clone());
		}
		let raw = match self.raw {
			Some(raw) => raw,
			None => return Err(self.fail(BindError::NullNotAllowed(target))),
		};
		let rest = &raw[self.pos..];
		if rest.len() < n {
			let e = BindError::InvalidLength { target, expected: n as i32, found: rest.len() as i32 };
			return Err(self.fail(e));
		}
		self.pos += n;
		Ok(&rest[..n])
	}
}

impl WireCursor for ValueReader<'_> {
	fn len(&self) -> i32 {
		match self.raw {
			Some(raw) => (raw.len() - self.pos) as i32,
			None => -1,
		}
	}

	fn type_oid(&self) -> Oid {
		self.oid
	}

	fn format_code(&self) -> i16 {
		self.format
	}

	fn read_u8(&mut self) -> Result<u8, BindError> {
		Ok(self.take(1, "byte")?[0])
	}

	fn read_i16(&mut self) -> Result<i16, BindError> {
		self.take(2, "int2").map(NetworkEndian::read_i16)
	}

	fn read_i32(&mut self) -> Result<i32, BindError> {
		self.take(4, "int4").map(NetworkEndian::read_i32)
	}

	fn read_i64(&mut self) -> Result<i64, BindError> {
		self.take(8, "int8").map(NetworkEndian::read_i64)
	}

	fn read_bytes(&mut self, n: usize) -> Result<&[u8], BindError> {
		self.take(n, "bytes")
	}

	fn fail(&mut self, err: BindError) -> BindError {
		self.err.get_or_insert(err).clone()
	}

	fn last_error(&self) -> Option<&BindError> {
		self.err.as_ref()
	}
}
