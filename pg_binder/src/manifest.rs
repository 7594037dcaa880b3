//! The JSON description of the records to check and generate
//!
//! ```json
//! { "records": [
//! 	{ "name": "widget", "fields": [
//! 		{ "name": "id", "type": "i32", "sql_type": "int4" },
//! 		{ "name": "label", "type": "String", "column": "name", "sql_type": "varchar(64)" }
//! 	] }
//! ] }
//! ```
use std::{ fs, path::Path };

use anyhow::Context;
use serde::{ Deserialize, Serialize };
use tracing::{ debug, warn };

use pg_binder_core::{
	resolve::resolve_named,
	table::MAX_COLUMNS,
	Adapter, BindError, Binding, ColumnType, Conversion, FieldKind, Hstore, RawValue,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
	pub records: Vec<RecordSpec>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordSpec {
	pub name: String,
	pub fields: Vec<FieldSpec>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
	pub name: String,
	/// The Rust type as it would be written in source
	#[serde(rename = "type")]
	pub rust_type: String,
	/// Column name, defaults to the field name
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub column: Option<String>,
	pub sql_type: String,
}

impl FieldSpec {
	pub fn column_name(&self) -> &str {
		self.column.as_deref().unwrap_or(&self.name)
	}

	/// Resolves the declared pair the same way the derived table will
	///
	/// `Option<T>` is an adapter, so `T` is resolved as well. The built-in adapters are held to the
	/// columns their codecs accept
	pub fn resolve(&self) -> Result<Binding, BindError> {
		let compact: String = self.rust_type.chars().filter(|c| !c.is_whitespace()).collect();
		if let Some(inner) = compact.strip_prefix("Option<").and_then(|t| t.strip_suffix('>')) {
			resolve_type(inner, &self.sql_type)?;
		}
		resolve_type(&compact, &self.sql_type)
	}
}

fn resolve_type(rust_type: &str, sql_type: &str) -> Result<Binding, BindError> {
	let unsupported = |column: &str| BindError::UnsupportedBinding {
		field: rust_type.to_owned(),
		column: column.to_owned(),
	};
	let field = FieldKind::from_rust_type(rust_type).ok_or_else(|| unsupported(sql_type))?;
	let binding = resolve_named(field, sql_type)?;
	if let Conversion::Adapter { .. } = binding.encode {
		if !adapter_accepts(rust_type, binding.column) {
			return Err(unsupported(binding.column.name()));
		}
	}
	Ok(binding)
}

/// The `accepts` rule of the adapter named by `rust_type`
///
/// `Option<T>` defers to `T`, which is checked on its own
fn adapter_accepts(rust_type: &str, column: ColumnType) -> bool {
	let head = rust_type.split('<').next().unwrap_or(rust_type);
	match head.rsplit("::").next().unwrap_or(head) {
		"Hstore" | "HashMap" => <Hstore as Adapter>::accepts(column),
		"RawValue" => <RawValue as Adapter>::accepts(column),
		_ => true,
	}
}

/// The outcome of resolving every field of one record
#[derive(Debug)]
pub struct RecordReport<'a> {
	pub record: &'a RecordSpec,
	pub fields: Vec<(&'a FieldSpec, Result<Binding, BindError>)>,
	/// Problems with the record as a whole
	pub errors: Vec<String>,
}

impl RecordReport<'_> {
	pub fn is_ok(&self) -> bool {
		self.errors.is_empty() && self.fields.iter().all(|(_, r)| r.is_ok())
	}

	pub fn failures(&self) -> impl Iterator<Item = String> + '_ {
		let fields = self.fields.iter().filter_map(move |(f, r)| match r {
			Ok(_) => None,
			Err(e) => Some(format!("{}.{}: {}", self.record.name, f.name, e)),
		});
		self.errors.iter().map(move |e| format!("{}: {}", self.record.name, e)).chain(fields)
	}
}

impl Manifest {
	pub fn from_path(path: &Path) -> anyhow::Result<Manifest> {
		let raw = fs::read_to_string(path).with_context(|| format!("could not read manifest {}", path.display()))?;
		Manifest::from_json(&raw).with_context(|| format!("could not parse manifest {}", path.display()))
	}

	pub fn from_json(raw: &str) -> anyhow::Result<Manifest> {
		let manifest: Manifest = serde_json::from_str(raw)?;
		debug!(records = manifest.records.len(), "loaded manifest");
		Ok(manifest)
	}

	/// Resolves every declared binding, logging each failure
	pub fn check(&self) -> Vec<RecordReport<'_>> {
		self.records
			.iter()
			.map(|record| {
				let mut errors = Vec::new();
				if record.fields.len() > MAX_COLUMNS {
					errors.push(format!("{} columns declared, at most {} are supported", record.fields.len(), MAX_COLUMNS));
				}
				let mut seen = std::collections::HashSet::new();
				for f in &record.fields {
					if !seen.insert(f.column_name()) {
						errors.push(format!("column {} is declared more than once", f.column_name()));
					}
				}
				let fields = record
					.fields
					.iter()
					.map(|f| {
						let res = f.resolve();
						if let Err(e) = &res {
							warn!(record = %record.name, field = %f.name, error = %e, "binding rejected");
						}
						(f, res)
					})
					.collect();
				RecordReport { record, fields, errors }
			})
			.collect()
	}
}
