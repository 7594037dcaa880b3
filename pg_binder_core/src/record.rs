use crate::{ table::{ Table, TableBuilder }, BindError, Row };

/// A struct whose fields map onto the columns of a query
///
/// Normally derived with `#[derive(Record)]`, which implements [`build_table`] from the `#[pg(...)]`
/// field attributes and caches the result for [`table`]
///
/// [`build_table`]: ./trait.Record.html#tymethod.build_table
/// [`table`]: ./trait.Record.html#tymethod.table
pub trait Record: Sized + 'static {
	/// Declares every column, in ordinal order
	fn build_table() -> Result<Table<Self>, BindError>;

	/// The table built by [`build_table`], built on first use
	///
	/// [`build_table`]: ./trait.Record.html#tymethod.build_table
	fn table() -> Result<&'static Table<Self>, BindError>;

	/// Starts a table for `Self`, for hand written [`build_table`] implementations
	///
	/// [`build_table`]: ./trait.Record.html#tymethod.build_table
	fn builder() -> TableBuilder<Self> {
		TableBuilder::new(short_type_name::<Self>())
	}

	fn from_row(row: &Row) -> Result<Self, BindError>
	where
		Self: Default,
	{
		Self::table()?.decode_pg_row(row)
	}
}

fn short_type_name<T>() -> &'static str {
	let full = std::any::type_name::<T>();
	full.rsplit("::").next().unwrap_or(full)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[derive(Debug, Default)]
	struct Point {
		x: f64,
		y: f64,
	}

	impl Record for Point {
		fn build_table() -> Result<Table<Self>, BindError> {
			Self::builder()
				.column("x", "float8", |p: &Point| &p.x, |p: &mut Point| &mut p.x)?
				.column("y", "double precision", |p: &Point| &p.y, |p: &mut Point| &mut p.y)?
				.build()
		}

		fn table() -> Result<&'static Table<Self>, BindError> {
			static TABLE: std::sync::OnceLock<Result<Table<Point>, BindError>> = std::sync::OnceLock::new();
			TABLE.get_or_init(Self::build_table).as_ref().map_err(Clone::clone)
		}
	}

	#[test]
	fn hand_written_records() {
		let t = Point::table().unwrap();
		assert_eq!(t.name(), "Point");
		assert_eq!(t.alias_all(), "x as __00::float8, y as __01::float8");
		assert!(std::ptr::eq(t, Point::table().unwrap()));
	}
}
