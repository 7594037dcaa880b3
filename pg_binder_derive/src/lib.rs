//! Contains a derive macro for [`Record`] which builds the column table of a struct
//!
//! [`Record`]: https://docs.rs/pg_binder_core/0.1.0/pg_binder_core/trait.Record.html

extern crate proc_macro;

use proc_macro2::{
	Span,
	TokenStream,
};

use quote::quote;

use syn::{
	parse_macro_input,
	Data,
	DeriveInput,
	Field,
	Fields,
	LitStr,
};

/// Column settings read from a `#[pg(...)]` attribute
struct ColumnAttr {
	column: Option<String>,
	sql_type: Option<String>,
	skip: bool,
}

impl ColumnAttr {
	fn from_field(field: &Field) -> syn::Result<Self> {
		let mut attr = ColumnAttr { column: None, sql_type: None, skip: false };
		for a in field.attrs.iter().filter(|a| a.path().is_ident("pg")) {
			a.parse_nested_meta(|meta| {
				if meta.path.is_ident("column") {
					attr.column = Some(meta.value()?.parse::<LitStr>()?.value());
				} else if meta.path.is_ident("sql_type") {
					attr.sql_type = Some(meta.value()?.parse::<LitStr>()?.value());
				} else if meta.path.is_ident("skip") {
					attr.skip = true;
				} else {
					return Err(meta.error("expected `column`, `sql_type` or `skip`"));
				}
				Ok(())
			})?;
		}
		Ok(attr)
	}
}

#[proc_macro_derive(Record, attributes(pg))]
/// A derive macro for [`Record`]
///
/// Every named field becomes a column, in declaration order, unless marked `#[pg(skip)]`. Fields
/// need a `#[pg(sql_type = "...")]` attribute naming the column type and may rename the column with
/// `column = "..."`. Skipped fields are left at their `Default` value when a row is decoded
///
/// ```ignore
/// #[derive(Default, Record)]
/// struct Widget {
/// 	#[pg(sql_type = "int4")]
/// 	id: i32,
/// 	#[pg(column = "label", sql_type = "varchar(64)")]
/// 	name: String,
/// 	#[pg(skip)]
/// 	cached: Option<u64>,
/// }
/// ```
///
/// [`Record`]: https://docs.rs/pg_binder_core/0.1.0/pg_binder_core/trait.Record.html
pub fn derive_record(input: proc_macro::TokenStream) -> proc_macro::TokenStream {
	let input = parse_macro_input!(input as DeriveInput);

	// get the name of the type we want to implement the trait for
	let name = &input.ident;
	if !input.generics.params.is_empty() {
		panic!("Cannot derive Record for generic types, the table is cached in a static");
	}

	let fields = match input.data {
		Data::Struct(x) => x.fields,
		Data::Enum(_) => panic!("Cannot derive Record automatically for enum types"),
		Data::Union(_) => panic!("Cannot derive Record automatically for union types"),
	};
	let fields = match fields {
		Fields::Named(x) => x.named,
		_ => panic!("Cannot derive Record for tuple or unit structs, columns are named after fields"),
	};

	let mut columns = TokenStream::new();
	for field in fields.iter() {
		let attr = match ColumnAttr::from_field(field) {
			Ok(attr) => attr,
			Err(e) => return e.to_compile_error().into(),
		};
		if attr.skip {
			continue;
		}
		let ident = field.ident.as_ref().unwrap();
		let sql_type = match attr.sql_type {
			Some(t) => t,
			None => {
				let msg = format!("field `{}` needs a #[pg(sql_type = \"...\")] attribute", ident);
				return syn::Error::new_spanned(ident, msg).to_compile_error().into();
			},
		};
		let column = LitStr::new(&attr.column.unwrap_or_else(|| ident.to_string()), Span::call_site());
		let sql_type = LitStr::new(&sql_type, Span::call_site());
		columns.extend(quote! {
			.column(#column, #sql_type, |r: &#name| &r.#ident, |r: &mut #name| &mut r.#ident)?
		});
	}

	let table_name = LitStr::new(&name.to_string(), Span::call_site());
	let expanded = quote! {
		impl ::pg_binder_core::Record for #name {
			fn build_table() -> ::core::result::Result<::pg_binder_core::Table<Self>, ::pg_binder_core::BindError> {
				::pg_binder_core::TableBuilder::new(#table_name)
					#columns
					.build()
			}

			fn table() -> ::core::result::Result<&'static ::pg_binder_core::Table<Self>, ::pg_binder_core::BindError> {
				static TABLE: ::std::sync::OnceLock<
					::core::result::Result<::pg_binder_core::Table<#name>, ::pg_binder_core::BindError>
				> = ::std::sync::OnceLock::new();
				TABLE
					.get_or_init(<Self as ::pg_binder_core::Record>::build_table)
					.as_ref()
					.map_err(::core::clone::Clone::clone)
			}
		}
	};

	expanded.into()
}
