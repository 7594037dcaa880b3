//! Per-record column tables and the row dispatch built on them
//!
//! A [`Table`] is built once per record type. Every column is resolved against its field type when
//! the table is built, so decoding a row never consults the resolver. Columns are addressed by
//! ordinal, and queries can alias each selected column to `__NN` (two lowercase hex digits of the
//! ordinal) so that [`Table::decode_column`] finds the decoder without a name lookup
//!
//! [`Table`]: ./struct.Table.html
//! [`Table::decode_column`]: ./struct.Table.html#method.decode_column
use std::collections::HashMap;

use tracing::{ debug, trace };

use crate::{
	adapter::RawValue,
	catalog::{ ColumnType, Format, Oid },
	field::Field,
	pg::EncodedParam,
	resolve::{ resolve_named, Binding },
	wire::{ WireCursor, WriteSink },
	BindError, Row,
};

/// Most columns a table can have, the alias scheme has two hex digits
pub const MAX_COLUMNS: usize = 256;

type RowEncoder<R> = Box<dyn Fn(&R, &mut dyn WriteSink) -> Result<(), BindError> + Send + Sync>;
type RowDecoder<R> = Box<dyn Fn(&mut R, &mut dyn WireCursor) -> Result<(), BindError> + Send + Sync>;

/// `__` followed by the ordinal as two lowercase hex digits
pub fn alias_token(ordinal: usize) -> String {
	format!("__{:02x}", ordinal)
}

/// The ordinal encoded in an alias token, if `name` is one
///
/// ```
/// # use pg_binder_core::table::parse_alias;
/// assert_eq!(parse_alias("__0a"), Some(10));
/// assert_eq!(parse_alias("__ff"), Some(255));
/// assert_eq!(parse_alias("name"), None);
/// assert_eq!(parse_alias("__0"), None);
/// ```
pub fn parse_alias(name: &str) -> Option<usize> {
	let b = name.as_bytes();
	if b.len() != 4 || &b[..2] != b"__" {
		return None;
	}
	let hi = (b[2] as char).to_digit(16)?;
	let lo = (b[3] as char).to_digit(16)?;
	Some((hi * 16 + lo) as usize)
}

/// A declared column of a [`Table`](./struct.Table.html)
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDescriptor {
	pub name: String,
	pub ordinal: usize,
	pub binding: Binding,
	/// Format parameters for this column are sent in
	pub format: Format,
}

impl ColumnDescriptor {
	pub fn column_type(&self) -> ColumnType {
		self.binding.column
	}

	pub fn alias(&self) -> String {
		alias_token(self.ordinal)
	}

	/// `<name> as __NN::<type>`
	pub fn alias_fragment(&self) -> String {
		format!("{} as {}::{}", self.name, self.alias(), self.column_type().name())
	}
}

/// Collects the columns of a record, resolving each one as it is added
pub struct TableBuilder<R> {
	name: &'static str,
	columns: Vec<ColumnDescriptor>,
	encoders: Vec<RowEncoder<R>>,
	decoders: Vec<RowDecoder<R>>,
}

impl<R: 'static> TableBuilder<R> {
	pub fn new(name: &'static str) -> Self {
		TableBuilder {
			name,
			columns: Vec::new(),
			encoders: Vec::new(),
			decoders: Vec::new(),
		}
	}

	/// Declares the next column
	///
	/// `sql_type` is normalized with [`ColumnType::normalize`] and the binding is resolved for
	/// `F` immediately, so an unsupported pair fails here rather than on the first row
	///
	/// [`ColumnType::normalize`]: ../catalog/enum.ColumnType.html#method.normalize
	pub fn column<F: Field>(
		mut self,
		name: &str,
		sql_type: &str,
		get: fn(&R) -> &F,
		get_mut: fn(&mut R) -> &mut F,
	) -> Result<Self, BindError> {
		if self.columns.iter().any(|c| c.name == name) {
			return Err(BindError::DuplicateColumn { table: self.name, column: name.to_owned() });
		}
		let binding = resolve_named(F::FIELD_TYPE, sql_type)?;
		let encode = F::encoder(&binding)?;
		let decode = F::decoder(&binding)?;
		self.columns.push(ColumnDescriptor {
			name: name.to_owned(),
			ordinal: self.columns.len(),
			binding,
			format: F::format(&binding),
		});
		self.encoders.push(Box::new(move |rec: &R, s: &mut dyn WriteSink| encode(get(rec), s)));
		self.decoders.push(Box::new(move |rec: &mut R, vr: &mut dyn WireCursor| {
			*get_mut(rec) = decode(vr)?;
			Ok(())
		}));
		Ok(self)
	}

	pub fn build(self) -> Result<Table<R>, BindError> {
		let count = self.columns.len();
		if count > MAX_COLUMNS {
			return Err(BindError::SchemaTooWide { table: self.name, count });
		}
		let index = self.columns.iter().map(|c| (c.name.clone(), c.ordinal)).collect();
		let fragments: Vec<String> = self.columns.iter().map(ColumnDescriptor::alias_fragment).collect();
		let alias_all = fragments.join(", ");
		debug!(table = self.name, columns = count, "built column table");
		Ok(Table {
			name: self.name,
			columns: self.columns,
			index,
			fragments,
			alias_all,
			encoders: self.encoders,
			decoders: self.decoders,
		})
	}
}

/// The resolved columns of a record type `R` together with their codecs
pub struct Table<R> {
	name: &'static str,
	columns: Vec<ColumnDescriptor>,
	index: HashMap<String, usize>,
	fragments: Vec<String>,
	alias_all: String,
	encoders: Vec<RowEncoder<R>>,
	decoders: Vec<RowDecoder<R>>,
}

impl<R> std::fmt::Debug for Table<R> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Table").field("name", &self.name).field("columns", &self.columns).finish()
	}
}

impl<R> Table<R> {
	pub fn name(&self) -> &'static str {
		self.name
	}

	pub fn len(&self) -> usize {
		self.columns.len()
	}

	pub fn is_empty(&self) -> bool {
		self.columns.is_empty()
	}

	pub fn columns(&self) -> &[ColumnDescriptor] {
		&self.columns
	}

	pub fn names(&self) -> Vec<&str> {
		self.columns.iter().map(|c| c.name.as_str()).collect()
	}

	pub fn types(&self) -> Vec<ColumnType> {
		self.columns.iter().map(ColumnDescriptor::column_type).collect()
	}

	pub fn formats(&self) -> Vec<Format> {
		self.columns.iter().map(|c| c.format).collect()
	}

	pub fn oids(&self) -> Vec<Oid> {
		self.columns.iter().map(|c| c.column_type().oid()).collect()
	}

	/// The bare `__NN` token of every column
	pub fn aliases(&self) -> Vec<String> {
		self.columns.iter().map(ColumnDescriptor::alias).collect()
	}

	/// `<name> as __NN::<type>` for every column, in ordinal order
	pub fn alias_fragments(&self) -> &[String] {
		&self.fragments
	}

	/// Alias fragments for `cols`, or for every column when `cols` is empty
	pub fn alias(&self, cols: &[&str]) -> Result<Vec<&str>, BindError> {
		if cols.is_empty() {
			return Ok(self.fragments.iter().map(String::as_str).collect());
		}
		Ok(self.indexes(cols)?.into_iter().map(|i| self.fragments[i].as_str()).collect())
	}

	/// Every alias fragment joined for use in a select list
	pub fn alias_all(&self) -> &str {
		&self.alias_all
	}

	pub fn index(&self, name: &str) -> Option<usize> {
		self.index.get(name).copied()
	}

	pub fn indexes(&self, names: &[&str]) -> Result<Vec<usize>, BindError> {
		names.iter().map(|n| self.index(n).ok_or_else(|| self.unknown(n))).collect()
	}

	fn unknown(&self, column: &str) -> BindError {
		BindError::UnknownColumn { table: self.name, column: column.to_owned() }
	}

	/// Decodes one returned column into `rec`
	///
	/// A name of the form `__NN` is taken as an ordinal directly. Anything else is looked up by
	/// declared name. Either way an ordinal past the last column is a
	/// [`BindError::DispatchOutOfRange`]
	///
	/// [`BindError::DispatchOutOfRange`]: ../enum.BindError.html#variant.DispatchOutOfRange
	pub fn decode_column(&self, rec: &mut R, name: &str, vr: &mut dyn WireCursor) -> Result<(), BindError> {
		let ordinal = match parse_alias(name) {
			Some(i) => i,
			None => {
				trace!(table = self.name, column = name, "column is not aliased, looking it up by name");
				self.index(name).ok_or_else(|| self.unknown(name))?
			},
		};
		match self.decoders.get(ordinal) {
			Some(decode) => decode(rec, vr),
			None => Err(BindError::DispatchOutOfRange { index: ordinal, len: self.len() }),
		}
	}

	/// Decodes every (name, cursor) pair of a row into `rec`, stopping at the first failure
	pub fn decode_row<I, N, C>(&self, rec: &mut R, row: I) -> Result<(), BindError>
	where
		I: IntoIterator<Item = (N, C)>,
		N: AsRef<str>,
		C: WireCursor,
	{
		for (name, mut vr) in row {
			self.decode_column(rec, name.as_ref(), &mut vr)?;
		}
		Ok(())
	}

	/// Decodes a tokio-postgres row into `rec`
	pub fn decode_pg_row_into(&self, rec: &mut R, row: &Row) -> Result<(), BindError> {
		for (i, column) in row.columns().iter().enumerate() {
			let raw: RawValue = row.try_get(i)?;
			self.decode_column(rec, column.name(), &mut raw.reader())?;
		}
		Ok(())
	}

	/// Decodes a tokio-postgres row into a fresh record
	pub fn decode_pg_row(&self, row: &Row) -> Result<R, BindError>
	where
		R: Default,
	{
		let mut rec = R::default();
		self.decode_pg_row_into(&mut rec, row)?;
		Ok(rec)
	}

	/// Writes the value of the column at `ordinal`, length prefix included
	pub fn encode_column(&self, rec: &R, ordinal: usize, sink: &mut dyn WriteSink) -> Result<(), BindError> {
		match self.encoders.get(ordinal) {
			Some(encode) => encode(rec, sink),
			None => Err(BindError::DispatchOutOfRange { index: ordinal, len: self.len() }),
		}
	}

	/// A parameter encoder for `cols`, or for every column when `cols` is empty
	pub fn params(&self, cols: &[&str]) -> Result<ParamsEncoder<'_, R>, BindError> {
		let ordinals = if cols.is_empty() { (0..self.len()).collect() } else { self.indexes(cols)? };
		Ok(ParamsEncoder { table: self, ordinals })
	}
}

/// Encodes a fixed selection of columns as statement parameters
pub struct ParamsEncoder<'t, R> {
	table: &'t Table<R>,
	ordinals: Vec<usize>,
}

impl<R> ParamsEncoder<'_, R> {
	pub fn len(&self) -> usize {
		self.ordinals.len()
	}

	pub fn is_empty(&self) -> bool {
		self.ordinals.is_empty()
	}

	pub fn formats(&self) -> Vec<Format> {
		self.ordinals.iter().map(|&i| self.table.columns[i].format).collect()
	}

	/// Parameter type ids, for preparing the statement
	pub fn oids(&self) -> Vec<Oid> {
		self.ordinals.iter().map(|&i| self.table.columns[i].column_type().oid()).collect()
	}

	/// The parameter format section of a Bind message: a count then one code per parameter
	pub fn encode_formats(&self, sink: &mut dyn WriteSink) {
		sink.append_i16(self.ordinals.len() as i16);
		for f in self.formats() {
			sink.append_i16(f as i16);
		}
	}

	/// The parameter value section of a Bind message: a count then each length prefixed value
	pub fn encode_values(&self, rec: &R, sink: &mut dyn WriteSink) -> Result<(), BindError> {
		sink.append_i16(self.ordinals.len() as i16);
		for &i in &self.ordinals {
			self.table.encode_column(rec, i, sink)?;
		}
		Ok(())
	}

	/// Encodes `rec` as parameters that can be handed straight to tokio-postgres
	pub fn to_sql_params(&self, rec: &R) -> Result<Vec<EncodedParam>, BindError> {
		let mut out = Vec::with_capacity(self.ordinals.len());
		for &i in &self.ordinals {
			let column = &self.table.columns[i];
			let mut wire = Vec::new();
			self.table.encode_column(rec, i, &mut wire)?;
			out.push(EncodedParam::from_wire(column.column_type(), column.format, wire));
		}
		Ok(out)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::wire::ValueReader;

	#[derive(Debug, Default, PartialEq)]
	struct Widget {
		id: i32,
		name: String,
		tags: Vec<String>,
	}

	fn widgets() -> Table<Widget> {
		TableBuilder::new("Widget")
			.column("id", "int4", |w: &Widget| &w.id, |w: &mut Widget| &mut w.id)
			.and_then(|t| t.column("name", "varchar", |w: &Widget| &w.name, |w: &mut Widget| &mut w.name))
			.and_then(|t| t.column("tags", "text[]", |w: &Widget| &w.tags, |w: &mut Widget| &mut w.tags))
			.and_then(TableBuilder::build)
			.unwrap()
	}

	fn sample() -> Widget {
		Widget { id: 7, name: "gear".to_owned(), tags: vec!["a".to_owned(), "b".to_owned()] }
	}

	#[test]
	fn alias_tokens() {
		assert_eq!(alias_token(0), "__00");
		assert_eq!(alias_token(15), "__0f");
		assert_eq!(alias_token(255), "__ff");
		for i in 0..MAX_COLUMNS {
			assert_eq!(parse_alias(&alias_token(i)), Some(i));
		}
		assert_eq!(parse_alias("__+f"), None);
		assert_eq!(parse_alias("ab00"), None);
	}

	#[test]
	fn alias_fragments() {
		let t = widgets();
		assert_eq!(t.aliases(), vec!["__00", "__01", "__02"]);
		assert_eq!(t.alias_all(), "id as __00::int4, name as __01::varchar, tags as __02::text[]");
		assert_eq!(t.alias(&["tags", "id"]), Ok(vec!["tags as __02::text[]", "id as __00::int4"]));
		assert_eq!(t.alias(&[]).unwrap().len(), 3);
		assert_eq!(t.alias(&["nope"]), Err(BindError::UnknownColumn { table: "Widget", column: "nope".to_owned() }));
	}

	#[test]
	fn accessors() {
		let t = widgets();
		assert_eq!(t.names(), vec!["id", "name", "tags"]);
		assert_eq!(t.types(), vec![ColumnType::Int4, ColumnType::Varchar, ColumnType::TextArray]);
		assert_eq!(t.oids(), vec![23, 1043, 1009]);
		assert_eq!(t.formats(), vec![Format::Binary, Format::Text, Format::Binary]);
		assert_eq!(t.index("name"), Some(1));
		assert_eq!(t.index("missing"), None);
		assert_eq!(t.indexes(&["tags", "id"]), Ok(vec![2, 0]));
	}

	fn encoded_columns(t: &Table<Widget>, w: &Widget) -> Vec<Vec<u8>> {
		(0..t.len())
			.map(|i| {
				let mut wire = Vec::new();
				t.encode_column(w, i, &mut wire).unwrap();
				wire
			})
			.collect()
	}

	#[test]
	fn decodes_by_alias_and_by_name() {
		let t = widgets();
		let wires = encoded_columns(&t, &sample());
		let oids = t.oids();

		let mut by_alias = Widget::default();
		let row = (0..3).map(|i| (alias_token(i), ValueReader::from_wire(oids[i], Format::Binary, &wires[i]).unwrap()));
		t.decode_row(&mut by_alias, row).unwrap();
		assert_eq!(by_alias, sample());

		let mut by_name = Widget::default();
		let row = t.names().into_iter().zip(&wires).zip(&oids).map(|((n, w), &o)| (n, ValueReader::from_wire(o, Format::Binary, w).unwrap()));
		t.decode_row(&mut by_name, row).unwrap();
		assert_eq!(by_name, sample());
	}

	#[test]
	fn dispatch_errors() {
		let t = widgets();
		let mut w = Widget::default();
		let mut vr = ValueReader::new(23, Format::Binary, Some(&[0, 0, 0, 1]));
		assert_eq!(t.decode_column(&mut w, "__03", &mut vr), Err(BindError::DispatchOutOfRange { index: 3, len: 3 }));
		assert_eq!(
			t.decode_column(&mut w, "colour", &mut vr),
			Err(BindError::UnknownColumn { table: "Widget", column: "colour".to_owned() })
		);
		assert_eq!(t.decode_column(&mut w, "__00", &mut vr), Ok(()));
		assert_eq!(w.id, 1);
	}

	#[test]
	fn row_decoding_stops_at_the_first_error() {
		let t = widgets();
		let mut w = Widget::default();
		let row = vec![
			("__00", ValueReader::new(23, Format::Binary, Some(&[0, 0, 0, 5]))),
			("__01", ValueReader::new(23, Format::Binary, Some(&[0, 0, 0, 5]))),
			("__02", ValueReader::new(1009, Format::Binary, None)),
		];
		let err = t.decode_row(&mut w, row).unwrap_err();
		assert!(err.is_protocol_mismatch());
		assert_eq!(w.id, 5);
		assert!(w.tags.is_empty());
	}

	#[test]
	fn builder_rejects_bad_schemas() {
		let dup = TableBuilder::new("Widget")
			.column("id", "int4", |w: &Widget| &w.id, |w: &mut Widget| &mut w.id)
			.and_then(|t| t.column("id", "int8", |w: &Widget| &w.id, |w: &mut Widget| &mut w.id));
		assert!(matches!(dup, Err(BindError::DuplicateColumn { .. })));

		let bad = TableBuilder::new("Widget").column("id", "text", |w: &Widget| &w.id, |w: &mut Widget| &mut w.id);
		assert_eq!(bad.err(), Some(BindError::UnsupportedBinding { field: "i32".to_owned(), column: "text".to_owned() }));

		let unknown = TableBuilder::new("Widget").column("id", "money", |w: &Widget| &w.id, |w: &mut Widget| &mut w.id);
		assert_eq!(unknown.err(), Some(BindError::UnsupportedBinding { field: "i32".to_owned(), column: "money".to_owned() }));
	}

	#[test]
	fn date_columns() {
		use chrono::NaiveDate;

		#[derive(Debug, Default, PartialEq)]
		struct Delivery {
			due: NaiveDate,
		}

		let t = TableBuilder::new("Delivery")
			.column("due", "date", |d: &Delivery| &d.due, |d: &mut Delivery| &mut d.due)
			.and_then(TableBuilder::build)
			.unwrap();
		assert_eq!(t.formats(), vec![Format::Text]);

		let sent = Delivery { due: NaiveDate::from_ymd_opt(2024, 2, 29).unwrap() };
		let mut wire = Vec::new();
		t.encode_column(&sent, 0, &mut wire).unwrap();
		assert_eq!(&wire[4..], b"2024-02-29");

		let mut got = Delivery::default();
		let mut vr = ValueReader::from_wire(1082, Format::Text, &wire).unwrap();
		t.decode_column(&mut got, "due", &mut vr).unwrap();
		assert_eq!(got, sent);
	}

	#[test]
	fn too_wide() {
		let names: Vec<String> = (0..=MAX_COLUMNS).map(|i| format!("c{}", i)).collect();
		let mut b = TableBuilder::new("Wide");
		for n in &names {
			b = b.column(n, "int4", |w: &Widget| &w.id, |w: &mut Widget| &mut w.id).unwrap();
		}
		assert_eq!(b.build().err(), Some(BindError::SchemaTooWide { table: "Wide", count: 257 }));
	}

	#[test]
	fn parameters() {
		let t = widgets();
		let p = t.params(&["name", "id"]).unwrap();
		assert_eq!(p.formats(), vec![Format::Text, Format::Binary]);
		assert_eq!(p.oids(), vec![1043, 23]);

		let mut formats = Vec::new();
		p.encode_formats(&mut formats);
		assert_eq!(formats, vec![0, 2, 0, 0, 0, 1]);

		let mut values = Vec::new();
		p.encode_values(&sample(), &mut values).unwrap();
		assert_eq!(values, vec![0, 2, 0, 0, 0, 4, b'g', b'e', b'a', b'r', 0, 0, 0, 4, 0, 0, 0, 7]);

		assert_eq!(t.params(&[]).unwrap().len(), 3);
		assert!(t.params(&["weight"]).is_err());
	}
}
