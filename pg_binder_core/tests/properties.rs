use pg_binder_core::{
	chrono::{ DateTime, Duration, NaiveDate, Utc },
	codec,
	table::{ alias_token, parse_alias },
	uuid::Uuid,
	BindError, ColumnType, Format, ValueReader,
};
use proptest::prelude::*;

fn wire<F: FnOnce(&mut Vec<u8>)>(f: F) -> Vec<u8> {
	let mut out = Vec::new();
	f(&mut out);
	out
}

fn reader(column: ColumnType, wire: &[u8]) -> ValueReader<'_> {
	ValueReader::from_wire(column.oid(), Format::Binary, wire).unwrap()
}

fn null(column: ColumnType) -> ValueReader<'static> {
	ValueReader::new(column.oid(), Format::Binary, None)
}

proptest! {
	#[test]
	fn bool_round_trip(v in any::<bool>()) {
		let w = wire(|s| codec::encode_bool(v, s));
		prop_assert_eq!(codec::decode_bool(&mut reader(ColumnType::Bool, &w)), Ok(v));
	}

	#[test]
	fn integer_round_trips(a in any::<i16>(), b in any::<i32>(), c in any::<i64>(), o in any::<u32>()) {
		let w = wire(|s| codec::encode_int2(a, s));
		prop_assert_eq!(codec::decode_int2(&mut reader(ColumnType::Int2, &w)), Ok(a));
		let w = wire(|s| codec::encode_int4(b, s));
		prop_assert_eq!(codec::decode_int4(&mut reader(ColumnType::Int4, &w)), Ok(b));
		let w = wire(|s| codec::encode_int8(c, s));
		prop_assert_eq!(codec::decode_int8(&mut reader(ColumnType::Int8, &w)), Ok(c));
		let w = wire(|s| codec::encode_oid(o, s));
		prop_assert_eq!(codec::decode_oid(&mut reader(ColumnType::Oid, &w)), Ok(o));
	}

	#[test]
	fn float_round_trips_bit_for_bit(a in any::<f32>(), b in any::<f64>()) {
		let w = wire(|s| codec::encode_float4(a, s));
		prop_assert_eq!(codec::decode_float4(&mut reader(ColumnType::Float4, &w)).map(f32::to_bits), Ok(a.to_bits()));
		let w = wire(|s| codec::encode_float8(b, s));
		prop_assert_eq!(codec::decode_float8(&mut reader(ColumnType::Float8, &w)).map(f64::to_bits), Ok(b.to_bits()));
	}

	#[test]
	fn text_and_bytes_round_trip(text in ".*", bytes in proptest::collection::vec(any::<u8>(), 0..64)) {
		let w = wire(|s| codec::encode_text(&text, s).unwrap());
		prop_assert_eq!(codec::decode_text(&mut reader(ColumnType::Text, &w)), Ok(text.clone()));
		prop_assert_eq!(codec::decode_varchar(&mut reader(ColumnType::Varchar, &w)), Ok(text));
		let w = wire(|s| codec::encode_bytea(&bytes, s).unwrap());
		prop_assert_eq!(codec::decode_bytea(&mut reader(ColumnType::Bytea, &w)), Ok(bytes));
	}

	#[test]
	fn uuid_round_trip(n in any::<u128>()) {
		let id = Uuid::from_u128(n);
		let w = wire(|s| codec::encode_uuid(&id, s));
		prop_assert_eq!(codec::decode_uuid(&mut reader(ColumnType::Uuid, &w)), Ok(id));
		prop_assert_eq!(codec::decode_uuid_string(&mut reader(ColumnType::Uuid, &w)), Ok(id.hyphenated().to_string()));
	}

	// about 285 years either side of 2000
	#[test]
	fn timestamp_round_trip(stored in -(1i64 << 53)..(1i64 << 53)) {
		let t = codec::instant_from_micros(stored).unwrap();
		prop_assert_eq!(codec::micros_from_instant(&t), Ok(stored));
		let w = wire(|s| codec::encode_instant(&t, s).unwrap());
		prop_assert_eq!(codec::decode_timestamptz(&mut reader(ColumnType::TimestampTz, &w)), Ok(t));
	}

	#[test]
	fn dates_round_trip_at_day_granularity(days in -700_000i64..2_900_000, micros in 0i64..86_400_000_000) {
		let day = NaiveDate::from_ymd_opt(2000, 1, 1).unwrap() + Duration::days(days);
		let instant: DateTime<Utc> = day.and_hms_opt(0, 0, 0).unwrap().and_utc() + Duration::microseconds(micros);
		let truncated = instant.date_naive();
		prop_assert_eq!(truncated, day);
		for &format in &[Format::Binary, Format::Text] {
			let w = wire(|s| codec::encode_date(truncated, format, s).unwrap());
			let mut vr = ValueReader::from_wire(ColumnType::Date.oid(), format, &w).unwrap();
			prop_assert_eq!(codec::decode_date(&mut vr), Ok(day));
		}
	}

	#[test]
	fn narrowing_into_i16(v in any::<i64>()) {
		let w = wire(|s| codec::encode_int8(v, s));
		let got = codec::decode_into::<i16, _>(&mut reader(ColumnType::Int8, &w));
		if v >= i64::from(i16::MIN) && v <= i64::from(i16::MAX) {
			prop_assert_eq!(got, Ok(v as i16));
		} else {
			prop_assert_eq!(got, Err(BindError::overflow(v, "i16")));
		}
	}

	#[test]
	fn narrowing_into_u32(v in any::<i64>()) {
		let w = wire(|s| codec::encode_int8(v, s));
		let got = codec::decode_into::<u32, _>(&mut reader(ColumnType::Int8, &w));
		prop_assert_eq!(got.is_ok(), v >= 0 && v <= i64::from(u32::MAX));
	}

	#[test]
	fn int_arrays_keep_order(values in proptest::collection::vec(any::<i32>(), 0..16)) {
		let w = wire(|s| codec::encode_array(&values, ColumnType::Int4Array, s).unwrap());
		prop_assert_eq!(codec::decode_array::<i32, _>(&mut reader(ColumnType::Int4Array, &w)), Ok(values));
	}

	#[test]
	fn text_arrays_keep_order(values in proptest::collection::vec("[a-z]{0,8}", 0..8)) {
		let w = wire(|s| codec::encode_array(&values, ColumnType::VarcharArray, s).unwrap());
		prop_assert_eq!(codec::decode_array::<String, _>(&mut reader(ColumnType::VarcharArray, &w)), Ok(values));
	}

	#[test]
	fn alias_tokens_decode_to_their_ordinal(i in 0usize..256) {
		let token = alias_token(i);
		prop_assert_eq!(token.len(), 4);
		prop_assert_eq!(parse_alias(&token), Some(i));
	}
}

#[test]
fn boundaries_fit_exactly() {
	for &v in &[i64::from(i16::MIN), i64::from(i16::MAX)] {
		let w = wire(|s| codec::encode_int8(v, s));
		assert_eq!(codec::decode_into::<i16, _>(&mut reader(ColumnType::Int8, &w)), Ok(v as i16));
	}
	for &v in &[i64::from(i16::MIN) - 1, i64::from(i16::MAX) + 1] {
		let w = wire(|s| codec::encode_int8(v, s));
		assert!(matches!(codec::decode_into::<i16, _>(&mut reader(ColumnType::Int8, &w)), Err(BindError::Overflow { .. })));
	}
	let w = wire(|s| codec::encode_float8(f64::from(f32::MAX), s));
	assert_eq!(codec::decode_into_f32(&mut reader(ColumnType::Float8, &w)), Ok(f32::MAX));
	let w = wire(|s| codec::encode_float8(f64::from(f32::MAX) * 2.0, s));
	assert!(matches!(codec::decode_into_f32(&mut reader(ColumnType::Float8, &w)), Err(BindError::Overflow { .. })));
}

#[test]
fn every_scalar_rejects_null_except_bytea() {
	fn rejects<T: std::fmt::Debug>(r: Result<T, BindError>) -> bool {
		matches!(r, Err(BindError::NullNotAllowed(_)))
	}
	assert!(rejects(codec::decode_bool(&mut null(ColumnType::Bool))));
	assert!(rejects(codec::decode_int2(&mut null(ColumnType::Int2))));
	assert!(rejects(codec::decode_int4(&mut null(ColumnType::Int4))));
	assert!(rejects(codec::decode_int8(&mut null(ColumnType::Int8))));
	assert!(rejects(codec::decode_float4(&mut null(ColumnType::Float4))));
	assert!(rejects(codec::decode_float8(&mut null(ColumnType::Float8))));
	assert!(rejects(codec::decode_oid(&mut null(ColumnType::Oid))));
	assert!(rejects(codec::decode_text(&mut null(ColumnType::Text))));
	assert!(rejects(codec::decode_varchar(&mut null(ColumnType::Varchar))));
	assert!(rejects(codec::decode_date(&mut null(ColumnType::Date))));
	assert!(rejects(codec::decode_timestamp(&mut null(ColumnType::Timestamp))));
	assert!(rejects(codec::decode_timestamptz(&mut null(ColumnType::TimestampTz))));
	assert!(rejects(codec::decode_json::<serde_json::Value, _>(&mut null(ColumnType::Json))));
	assert!(rejects(codec::decode_uuid(&mut null(ColumnType::Uuid))));
	assert!(rejects(codec::decode_hstore(&mut null(ColumnType::Hstore))));
	assert_eq!(codec::decode_bytea(&mut null(ColumnType::Bytea)), Ok(Vec::new()));
}

#[test]
fn epoch_origins() {
	let y2k = DateTime::<Utc>::from_timestamp(946_684_800, 0).unwrap();
	assert_eq!(codec::micros_from_instant(&y2k), Ok(0));
	let unix = DateTime::<Utc>::from_timestamp(0, 0).unwrap();
	assert_eq!(codec::micros_from_instant(&unix), Ok(-946_684_800_000_000));
	assert_eq!(codec::Y2K_EPOCH_MICROS, 946_684_800_000_000);
}

#[test]
fn empty_and_three_element_arrays() {
	let w = wire(|s| codec::encode_array::<bool, _>(&[], ColumnType::BoolArray, s).unwrap());
	assert_eq!(codec::decode_array::<bool, _>(&mut reader(ColumnType::BoolArray, &w)), Ok(Vec::new()));
	let three = vec![Uuid::from_u128(3), Uuid::nil(), Uuid::from_u128(1)];
	let w = wire(|s| codec::encode_array(&three, ColumnType::UuidArray, s).unwrap());
	assert_eq!(codec::decode_array::<Uuid, _>(&mut reader(ColumnType::UuidArray, &w)), Ok(three));
}
