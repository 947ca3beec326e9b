use clap::Parser;
use secret_getter::cli::Cli;
use secret_getter::logging;
use secret_getter::pipeline;
use secret_getter::secrets::{ProcessEnvironment, SourceRegistry};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    logging::init(cli.log_format);

    let config = cli.into_run_config();
    let env = ProcessEnvironment;

    let report = pipeline::run(&config, &SourceRegistry::default(), &env).await?;
    pipeline::finish(&config, report, &env)?;

    Ok(())
}
