//! Renders the records of a manifest as Rust source
use std::str::FromStr;

use heck::{ CamelCase, SnakeCase };
use proc_macro2::{ Ident, Span, TokenStream };
use quote::quote;

use pg_binder_core::{ table::alias_token, Binding };

use crate::{
	manifest::{ FieldSpec, RecordReport },
	Opt,
};

const RUST_KEYWORDS: [&str; 38] = [
	"as", "async", "await", "break", "const", "continue", "crate", "dyn", "else", "enum", "extern", "false", "fn", "for",
	"if", "impl", "in", "let", "loop", "match", "mod", "move", "mut", "pub", "ref", "return", "self", "Self", "static",
	"struct", "super", "trait", "true", "type", "unsafe", "use", "where", "while",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Case {
	CamelCase,
	SnakeCase,
}

/// Converts a SQL name to a Rust identifier of the given case
///
/// Keywords get a trailing underscore, names starting with a digit a leading one
pub fn format_heck(name: &str, case: Case) -> Ident {
	let mut s = match case {
		Case::CamelCase => name.to_camel_case(),
		Case::SnakeCase => name.to_snake_case(),
	};
	if RUST_KEYWORDS.contains(&s.as_str()) {
		s.push('_');
	}
	if s.is_empty() || s.starts_with(|c: char| c.is_ascii_digit()) {
		s.insert(0, '_');
	}
	Ident::new(&s, Span::call_site())
}

/// The item header of every generated file
pub fn prelude() -> TokenStream {
	quote! {
		#![allow(dead_code)]
		use pg_binder_core::*;
	}
}

fn field_to_rust(field: &FieldSpec, binding: &Binding) -> TokenStream {
	let ident = format_heck(&field.name, Case::SnakeCase);
	// unparsable types were rejected by the resolver already
	let typ = TokenStream::from_str(&field.rust_type).unwrap_or_else(|_| quote! { () });
	let column = field.column_name();
	let sql_type = binding.column.name();
	quote! {
		#[pg(column = #column, sql_type = #sql_type)]
		pub #ident: #typ
	}
}

/// Renders one fully resolved record
///
/// ```ignore
/// #[derive(Debug, Clone, Default, Record)]
/// pub struct Widget {
/// 	#[pg(column = "id", sql_type = "int4")]
/// 	pub id: i32,
/// }
/// impl Widget {
/// 	pub const COLUMNS: [&'static str; 1usize] = ["id"];
/// 	pub const ALIASES: &'static str = "id as __00::int4";
/// }
/// ```
pub fn record_to_rust(report: &RecordReport<'_>, opt: &Opt) -> TokenStream {
	let name = format_heck(&report.record.name, Case::CamelCase);
	let fields: Vec<TokenStream> = report
		.fields
		.iter()
		.filter_map(|(f, res)| res.as_ref().ok().map(|b| field_to_rust(f, b)))
		.collect();
	let derives = if opt.serde {
		quote! { #[derive(Debug, Clone, Default, Record, serde::Serialize, serde::Deserialize)] }
	} else {
		quote! { #[derive(Debug, Clone, Default, Record)] }
	};
	let consts = if opt.aliases {
		let columns: Vec<&str> = report.fields.iter().map(|(f, _)| f.column_name()).collect();
		let count = columns.len();
		let aliases = report
			.fields
			.iter()
			.enumerate()
			.filter_map(|(i, (f, res))| res.as_ref().ok().map(|b| format!("{} as {}::{}", f.column_name(), alias_token(i), b.column.name())))
			.collect::<Vec<_>>()
			.join(", ");
		quote! {
			impl #name {
				pub const COLUMNS: [&'static str; #count] = [#(#columns),*];
				pub const ALIASES: &'static str = #aliases;
			}
		}
	} else {
		quote! {}
	};
	quote! {
		#derives
		pub struct #name {
			#(#fields),*
		}
		#consts
	}
}

/// Renders every record into a single file
pub fn to_rust(reports: &[RecordReport<'_>], opt: &Opt) -> TokenStream {
	let prelude = prelude();
	let records = reports.iter().map(|r| record_to_rust(r, opt));
	quote! {
		#prelude
		#(#records)*
	}
}
