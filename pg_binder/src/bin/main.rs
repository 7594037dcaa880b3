use structopt::StructOpt;
use tracing_subscriber::EnvFilter;
use pg_binder::{
	Opt,
};

fn main() -> anyhow::Result<()> {
	let opt = Opt::from_args();

	let default_level = if opt.debug { "debug" } else { "info" };
	let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
	tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

	pg_binder::run(&opt)
}
