use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;
	let args = loci_sweeper::Args::parse();
	loci_sweeper::run(args).await
}
