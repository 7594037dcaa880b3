use std::collections::HashMap;

use pg_binder_core::{
	adapter_field,
	chrono::{ NaiveDate, TimeZone, Utc },
	codec,
	uuid::Uuid,
	Adapter, BindError, ColumnType, Format, Hstore, Json, Record, ValueReader, WireCursor, WriteSink,
};
use serde::{ Deserialize, Serialize };

#[derive(Debug, Clone, Default, PartialEq, Record)]
struct Widget {
	#[pg(sql_type = "int4")]
	id: i32,
	#[pg(sql_type = "varchar")]
	name: String,
	#[pg(sql_type = "text[]")]
	tags: Vec<String>,
}

fn widget() -> Widget {
	Widget { id: 42, name: "widget".to_owned(), tags: vec!["a".to_owned(), "b".to_owned()] }
}

/// Encodes every column of `rec` and pairs each value with the name produced by `name`
fn wire_row<R: Record>(rec: &R, name: impl Fn(usize, &str) -> String) -> Vec<(String, u32, Vec<u8>)> {
	let table = R::table().unwrap();
	table
		.columns()
		.iter()
		.map(|c| {
			let mut wire = Vec::new();
			table.encode_column(rec, c.ordinal, &mut wire).unwrap();
			(name(c.ordinal, &c.name), c.column_type().oid(), wire)
		})
		.collect()
}

fn decode<R: Record + Default>(row: &[(String, u32, Vec<u8>)]) -> Result<R, BindError> {
	let mut rec = R::default();
	let cursors = row.iter().map(|(n, oid, wire)| (n.as_str(), ValueReader::from_wire(*oid, Format::Binary, wire).unwrap()));
	R::table()?.decode_row(&mut rec, cursors)?;
	Ok(rec)
}

#[test]
fn widget_round_trips_by_alias() {
	let row = wire_row(&widget(), |i, _| format!("__{:02x}", i));
	assert_eq!(row.iter().map(|r| r.0.as_str()).collect::<Vec<_>>(), vec!["__00", "__01", "__02"]);
	assert_eq!(decode::<Widget>(&row), Ok(widget()));
}

#[test]
fn widget_round_trips_by_name() {
	let row = wire_row(&widget(), |_, n| n.to_owned());
	assert_eq!(decode::<Widget>(&row), Ok(widget()));
}

#[test]
fn widget_columns_arrive_in_any_order() {
	let mut row = wire_row(&widget(), |i, _| format!("__{:02x}", i));
	row.reverse();
	assert_eq!(decode::<Widget>(&row), Ok(widget()));
}

#[test]
fn widget_select_list() {
	let t = Widget::table().unwrap();
	assert_eq!(t.alias_all(), "id as __00::int4, name as __01::varchar, tags as __02::text[]");
	assert_eq!(t.oids(), vec![23, 1043, 1009]);
}

#[test]
fn widget_parameters() {
	let t = Widget::table().unwrap();
	let params = t.params(&[]).unwrap().to_sql_params(&widget()).unwrap();
	assert_eq!(params.len(), 3);
	assert_eq!(params[0].value, Some(42i32.to_be_bytes().to_vec()));
	assert_eq!(params[1].value.as_deref(), Some(&b"widget"[..]));
	assert_eq!(params[1].format, Format::Text);
	assert_eq!(params[2].column, ColumnType::TextArray);
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
struct Settings {
	theme: String,
	volume: u8,
}

#[derive(Debug, Default, PartialEq, Record)]
struct Account {
	#[pg(column = "account_id", sql_type = "bigint")]
	id: i64,
	#[pg(sql_type = "smallint")]
	rank: i64,
	#[pg(sql_type = "uuid")]
	token: Uuid,
	#[pg(sql_type = "text")]
	nickname: Option<String>,
	#[pg(sql_type = "int8")]
	parent: Option<Box<u32>>,
	#[pg(sql_type = "date")]
	joined: NaiveDate,
	#[pg(sql_type = "timestamp with time zone")]
	seen: pg_binder_core::chrono::DateTime<Utc>,
	#[pg(sql_type = "json")]
	settings: Json<Settings>,
	#[pg(sql_type = "hstore")]
	labels: Hstore,
	#[pg(sql_type = "hstore")]
	strict_labels: HashMap<String, String>,
	#[pg(sql_type = "float4")]
	score: f64,
	#[pg(skip)]
	scratch: Vec<u8>,
}

fn account() -> Account {
	let mut labels = Hstore::new();
	labels.insert("team".to_owned(), Some("core".to_owned()));
	labels.insert("legacy".to_owned(), None);
	let mut strict_labels = HashMap::new();
	strict_labels.insert("region".to_owned(), "eu".to_owned());
	Account {
		id: 9_000_000_000,
		rank: -3,
		token: Uuid::from_u128(0x0123_4567_89ab_cdef_0123_4567_89ab_cdef),
		nickname: None,
		parent: Some(Box::new(17)),
		joined: NaiveDate::from_ymd_opt(2019, 4, 1).unwrap(),
		seen: Utc.with_ymd_and_hms(2023, 11, 5, 8, 30, 0).unwrap(),
		settings: Json(Settings { theme: "dark".to_owned(), volume: 7 }),
		labels,
		strict_labels,
		score: 0.5,
		scratch: Vec::new(),
	}
}

#[test]
fn mixed_record_round_trips() {
	let t = Account::table().unwrap();
	assert_eq!(t.len(), 11);
	assert_eq!(t.index("account_id"), Some(0));
	assert_eq!(t.index("scratch"), None);
	assert_eq!(t.alias(&["seen"]), Ok(vec!["seen as __06::timestamptz"]));

	// date goes out as text, so read it back the same way
	let row: Vec<_> = wire_row(&account(), |i, _| format!("__{:02x}", i));
	let mut rec = Account::default();
	for (name, oid, wire) in &row {
		let format = if *oid == ColumnType::Date.oid() { Format::Text } else { Format::Binary };
		let mut vr = ValueReader::from_wire(*oid, format, wire).unwrap();
		t.decode_column(&mut rec, name, &mut vr).unwrap();
	}
	assert_eq!(rec, account());
}

#[test]
fn narrowed_columns_reject_out_of_range_values() {
	let mut a = account();
	a.rank = 40_000;
	let t = Account::table().unwrap();
	let mut wire = Vec::new();
	assert_eq!(t.encode_column(&a, 1, &mut wire), Err(BindError::overflow(40_000, "i16")));
}

#[test]
fn null_into_a_plain_field_fails() {
	let t = Account::table().unwrap();
	let mut rec = Account::default();
	let mut vr = ValueReader::new(20, Format::Binary, None);
	assert_eq!(t.decode_column(&mut rec, "account_id", &mut vr), Err(BindError::NullNotAllowed("int8")));
	let mut vr = ValueReader::new(20, Format::Binary, None);
	rec.parent = Some(Box::new(1));
	assert_eq!(t.decode_column(&mut rec, "parent", &mut vr), Ok(()));
	assert_eq!(rec.parent, None);
}

/// A comma separated list stored in a text column
#[derive(Debug, Default, PartialEq)]
struct Csv(Vec<String>);

impl Adapter for Csv {
	fn accepts(column: ColumnType) -> bool {
		matches!(column, ColumnType::Text | ColumnType::Varchar)
	}

	fn encode_column(&self, _: ColumnType, _: Format, sink: &mut dyn WriteSink) -> Result<(), BindError> {
		codec::encode_text(&self.0.join(","), sink)
	}

	fn decode_column(column: ColumnType, vr: &mut dyn WireCursor) -> Result<Self, BindError> {
		if vr.is_null() {
			return Ok(Csv::default());
		}
		let s = codec::decode_string(vr, column)?;
		Ok(Csv(s.split(',').map(str::to_owned).collect()))
	}
}

adapter_field!(Csv);

#[derive(Debug, Default, PartialEq, Record)]
struct Post {
	#[pg(sql_type = "text")]
	keywords: Csv,
}

#[derive(Debug, Default, PartialEq, Record)]
struct BadPost {
	#[pg(sql_type = "int4")]
	keywords: Csv,
}

#[test]
fn custom_adapters() {
	let p = Post { keywords: Csv(vec!["rust".to_owned(), "postgres".to_owned()]) };
	let row = wire_row(&p, |_, n| n.to_owned());
	assert_eq!(&row[0].2[4..], b"rust,postgres");
	assert_eq!(decode::<Post>(&row), Ok(p));

	let mut rec = Post::default();
	let mut vr = ValueReader::new(25, Format::Text, None);
	Post::table().unwrap().decode_column(&mut rec, "keywords", &mut vr).unwrap();
	assert_eq!(rec, Post::default());

	assert_eq!(
		BadPost::table().err(),
		Some(BindError::UnsupportedBinding { field: "adapter".to_owned(), column: "int4".to_owned() })
	);
}

#[derive(Debug, Default, Record)]
struct Mismatched {
	#[pg(sql_type = "text")]
	count: i32,
}

#[test]
fn unsupported_bindings_fail_when_the_table_is_built() {
	let err = Mismatched::table().unwrap_err();
	assert_eq!(err.to_string(), "field type i32 cannot be bound to column type text");
	// the failure is cached like a success would be
	assert_eq!(Mismatched::table().unwrap_err(), err);
}
