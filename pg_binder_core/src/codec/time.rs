//! Dates and timestamps
//!
//! PostgreSQL counts from 2000-01-01T00:00:00Z rather than the Unix epoch. Timestamps are stored as
//! microseconds and dates as days since that instant
use chrono::{ DateTime, Duration, NaiveDate, NaiveDateTime, Utc };

use super::{ expect_len, guard_binary, guard_value, pg_len };
use crate::{
	catalog::{ ColumnType, Format },
	wire::{ WireCursor, WriteSink },
	BindError,
};

/// Microseconds between 1970-01-01T00:00:00Z and 2000-01-01T00:00:00Z
pub const Y2K_EPOCH_MICROS: i64 = 946_684_800_000_000;

const DATE_FORMAT: &str = "%Y-%m-%d";

fn y2k_date() -> NaiveDate {
	NaiveDate::from_ymd_opt(2000, 1, 1).expect("2000-01-01 is a valid date")
}

/// Converts a stored timestamp to an instant
pub fn instant_from_micros(stored: i64) -> Result<DateTime<Utc>, BindError> {
	let unix = stored.checked_add(Y2K_EPOCH_MICROS).ok_or_else(|| BindError::overflow(stored, "timestamp"))?;
	let secs = unix.div_euclid(1_000_000);
	let nanos = (unix.rem_euclid(1_000_000) * 1_000) as u32;
	DateTime::<Utc>::from_timestamp(secs, nanos).ok_or_else(|| BindError::overflow(stored, "timestamp"))
}

/// Converts an instant to its stored form, dropping anything below a microsecond
pub fn micros_from_instant(t: &DateTime<Utc>) -> Result<i64, BindError> {
	t.timestamp_micros().checked_sub(Y2K_EPOCH_MICROS).ok_or_else(|| BindError::overflow(t, "timestamp"))
}

/// Reads a timestamp or timestamptz column (`column` picks which oid is expected)
pub fn decode_instant<C: WireCursor + ?Sized>(vr: &mut C, column: ColumnType) -> Result<DateTime<Utc>, BindError> {
	guard_binary(vr, column, column.name())?;
	let stored = vr.read_i64()?;
	instant_from_micros(stored).map_err(|e| vr.fail(e))
}

pub fn decode_timestamp<C: WireCursor + ?Sized>(vr: &mut C) -> Result<NaiveDateTime, BindError> {
	decode_instant(vr, ColumnType::Timestamp).map(|t| t.naive_utc())
}

pub fn decode_timestamptz<C: WireCursor + ?Sized>(vr: &mut C) -> Result<DateTime<Utc>, BindError> {
	decode_instant(vr, ColumnType::TimestampTz)
}

/// Timestamps and timestamptz share a layout, the column type only changes the declared oid
pub fn encode_instant<S: WriteSink + ?Sized>(t: &DateTime<Utc>, sink: &mut S) -> Result<(), BindError> {
	let stored = micros_from_instant(t)?;
	sink.append_i32(8);
	sink.append_i64(stored);
	Ok(())
}

pub fn encode_timestamp<S: WriteSink + ?Sized>(t: &NaiveDateTime, sink: &mut S) -> Result<(), BindError> {
	encode_instant(&t.and_utc(), sink)
}

/// Decodes a date column from either format
///
/// Binary dates are a day count from 2000-01-01, text dates are `YYYY-MM-DD`
pub fn decode_date<C: WireCursor + ?Sized>(vr: &mut C) -> Result<NaiveDate, BindError> {
	match guard_value(vr, ColumnType::Date, "date")? {
		Format::Binary => {
			expect_len(vr, 4, "date")?;
			let days = vr.read_i32()?;
			y2k_date()
				.checked_add_signed(Duration::days(i64::from(days)))
				.ok_or_else(|| vr.fail(BindError::overflow(days, "date")))
		},
		Format::Text => {
			let n = vr.len() as usize;
			let s = vr.read_string(n)?;
			NaiveDate::parse_from_str(s.trim(), DATE_FORMAT).map_err(|_| vr.fail(BindError::Parse { target: "date", input: s }))
		},
	}
}

pub fn encode_date<S: WriteSink + ?Sized>(d: NaiveDate, format: Format, sink: &mut S) -> Result<(), BindError> {
	match format {
		Format::Binary => {
			let days = d.signed_duration_since(y2k_date()).num_days();
			let days = super::narrow::<i32, i64>(days)?;
			sink.append_i32(4);
			sink.append_i32(days);
		},
		Format::Text => {
			let s = d.format(DATE_FORMAT).to_string();
			sink.append_i32(pg_len("date", s.len())?);
			sink.append_str(&s);
		},
	}
	Ok(())
}
