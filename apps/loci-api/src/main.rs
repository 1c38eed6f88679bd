use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;
	let args = loci_api::Args::parse();
	loci_api::run(args).await
}
