#![forbid(unsafe_code)]
//! Binary value codec and column binding for the PostgreSQL wire protocol
//!
//! Provides the [`codec`] functions which read and write single column values in their wire form,
//! the [`resolve`] table which decides which Rust field types can be bound to which column types, and
//! the [`Table`] which decodes whole rows into a struct (dispatching on `__NN` column aliases) and
//! encodes structs as statement parameters
//!
//! Structs are usually described with `#[derive(Record)]`, reexported from `pg_binder_derive`
//!
//! ```
//! use pg_binder_core::{ Format, Record, ValueReader };
//!
//! #[derive(Debug, Default, PartialEq, Record)]
//! struct Widget {
//! 	#[pg(sql_type = "int4")]
//! 	id: i32,
//! 	#[pg(sql_type = "varchar")]
//! 	name: String,
//! }
//!
//! let table = Widget::table().unwrap();
//! assert_eq!(table.alias_all(), "id as __00::int4, name as __01::varchar");
//!
//! let mut w = Widget::default();
//! let mut id = ValueReader::new(23, Format::Binary, Some(&[0, 0, 0, 42]));
//! table.decode_column(&mut w, "__00", &mut id).unwrap();
//! assert_eq!(w.id, 42);
//! ```
//!
//! Reexports [`tokio_postgres::Row`] and the [`FromSql`] and [`ToSql`] traits, along with the crates
//! whose types can be bound (`chrono`, `uuid` and `serde_json`)
//!
//! [`codec`]: ./codec/index.html
//! [`resolve`]: ./resolve/index.html
//! [`Table`]: ./table/struct.Table.html
//! [`tokio_postgres::Row`]: https://docs.rs/tokio-postgres/0.7/tokio_postgres/row/struct.Row.html
//! [`FromSql`]: https://docs.rs/postgres-types/0.2/postgres_types/trait.FromSql.html
//! [`ToSql`]: https://docs.rs/postgres-types/0.2/postgres_types/trait.ToSql.html

//reexports
pub use pg_binder_derive::*;
pub use postgres_types::{ FromSql, ToSql };
pub use tokio_postgres::row::Row;

pub use chrono;
pub use serde_json;
pub use uuid;

pub mod adapter;
pub mod catalog;
pub mod codec;
mod error;
mod field;
pub mod pg;
mod record;
pub mod resolve;
pub mod table;
mod wire;

pub use adapter::{ Adapter, Hstore, RawValue };
pub use catalog::{ ColumnType, Format, Oid };
pub use error::BindError;
pub use field::{ Decoder, Encoder, Field, Json };
pub use pg::EncodedParam;
pub use record::Record;
pub use resolve::{ resolve, Binding, Cast, Conversion, FieldKind, FieldType, Source };
pub use table::{ ColumnDescriptor, ParamsEncoder, Table, TableBuilder };
pub use wire::{ ValueReader, WireCursor, WriteSink };
