//! Checks PostgreSQL column bindings ahead of time and generates Rust record definitions for them
//!
//! Reads a JSON [`Manifest`] listing records, their Rust field types and their column types, resolves
//! every pair with the same table the runtime uses, and either reports the result (`--check`) or
//! renders structs deriving [`Record`]
//!
//! [`Manifest`]: ./manifest/struct.Manifest.html
//! [`Record`]: https://docs.rs/pg_binder_core/0.1.0/pg_binder_core/trait.Record.html

pub mod codegen;
pub mod manifest;

use std::{
	fs,
	io::Write,
	path::PathBuf,
	process::{ Command, Stdio },
};

use anyhow::{ bail, Context };
use structopt::StructOpt;
use tracing::{ info, warn };

use manifest::{ Manifest, RecordReport };
use pg_binder_core::{ Conversion, Source };

#[derive(Debug, StructOpt)]
#[structopt(name = "pg_binder", about = "Validates column bindings and generates Rust records from a JSON manifest")]
pub struct Opt {
	/// The JSON manifest describing the records
	#[structopt(parse(from_os_str))]
	pub manifest: PathBuf,

	/// Output file, stdout if not present
	#[structopt(parse(from_os_str))]
	pub output: Option<PathBuf>,

	/// Only resolve the bindings and print a report
	#[structopt(long)]
	pub check: bool,

	/// Emit COLUMNS and ALIASES constants for every record
	#[structopt(long)]
	pub aliases: bool,

	/// Add serde derives to the generated records
	#[structopt(long)]
	pub serde: bool,

	/// Format the output with rustfmt
	#[structopt(long)]
	pub rustfmt: bool,

	/// Log at debug level unless RUST_LOG says otherwise
	#[structopt(short, long)]
	pub debug: bool,
}

fn conversion_name(c: &Conversion) -> String {
	let s = match c {
		Conversion::Native { cast, .. } => format!("{:?}", cast).to_lowercase(),
		Conversion::Adapter { .. } => "adapter".to_owned(),
	};
	match c.source() {
		Source::Value => s,
		Source::Deref => format!("deref, {}", s),
	}
}

/// One line per field: the field, its column and the conversion in each direction
pub fn binding_report(reports: &[RecordReport<'_>]) -> String {
	let mut out = String::new();
	for r in reports {
		for (f, res) in &r.fields {
			let line = match res {
				Ok(b) => format!(
					"{}.{}: {} -> {} (encode: {}, decode: {})",
					r.record.name,
					f.name,
					f.rust_type,
					b.column,
					conversion_name(&b.encode),
					conversion_name(&b.decode),
				),
				Err(e) => format!("{}.{}: error: {}", r.record.name, f.name, e),
			};
			out.push_str(&line);
			out.push('\n');
		}
		for e in &r.errors {
			out.push_str(&format!("{}: error: {}\n", r.record.name, e));
		}
	}
	out
}

/// Runs the generator as configured by `opt`
pub fn run(opt: &Opt) -> anyhow::Result<()> {
	let manifest = Manifest::from_path(&opt.manifest)?;
	let reports = manifest.check();
	let failures: Vec<String> = reports.iter().flat_map(RecordReport::failures).collect();

	let text = if opt.check {
		binding_report(&reports)
	} else {
		if !failures.is_empty() {
			bail!("{} binding(s) cannot be generated:\n{}", failures.len(), failures.join("\n"));
		}
		let code = codegen::to_rust(&reports, opt).to_string();
		if opt.rustfmt {
			format_rust(&code)
		} else {
			code
		}
	};

	match &opt.output {
		Some(path) => {
			fs::write(path, text).with_context(|| format!("could not write {}", path.display()))?;
			info!(path = %path.display(), "wrote output");
		},
		None => print!("{}", text),
	}

	if opt.check && !failures.is_empty() {
		bail!("{} binding(s) rejected", failures.len());
	}
	Ok(())
}

fn rustfmt(value: &str) -> anyhow::Result<String> {
	let mut proc = Command::new("rustfmt")
		.arg("--emit=stdout")
		.arg("--edition=2018")
		.args(&["--config", "hard_tabs=true"])
		.stdin(Stdio::piped())
		.stdout(Stdio::piped())
		.stderr(Stdio::piped())
		.spawn()
		.context("failed to spawn rustfmt")?;
	proc.stdin.as_mut().context("rustfmt has no stdin")?.write_all(value.as_bytes())?;
	let output = proc.wait_with_output()?;
	if !output.status.success() {
		bail!("rustfmt exited with {:?}: {}", output.status.code(), String::from_utf8_lossy(&output.stderr));
	}
	Ok(String::from_utf8(output.stdout)?)
}

/// Formats generated code with rustfmt, returning it unchanged if rustfmt is missing or fails
pub fn format_rust(value: &str) -> String {
	match rustfmt(value) {
		Ok(s) => s,
		Err(e) => {
			warn!(error = %e, "leaving output unformatted");
			value.to_owned()
		},
	}
}
