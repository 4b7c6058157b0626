use les_stats_lib::{
    cli::{parse_args, Command},
    commands::{run_import, run_migrate, run_serve},
    config::Config,
    logging::init_logging,
};

use dotenv::dotenv;
use tracing::error;

#[tokio::main]
async fn main() {
    dotenv().ok();
    let cli = parse_args();

    let mode = match &cli.command {
        Command::Serve => "serve",
        Command::Migrate => "migrate",
        Command::ImportMatches(_) => "import-matches",
    };
    let logging_context = init_logging("les_stats", mode, &cli.log_level);
    let run_span = tracing::info_span!(
        "les_stats_run",
        mode = %logging_context.mode,
        run_id = %logging_context.run_id
    );
    let _run_guard = run_span.enter();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(err) => {
            error!(event = "config_invalid", error = %err, "configuration is invalid");
            eprintln!("{err}");
            std::process::exit(2);
        }
    };

    let code = match cli.command {
        Command::Serve => run_serve(&config).await,
        Command::Migrate => run_migrate(&config).await,
        Command::ImportMatches(args) => run_import(&config, args).await,
    };
    std::process::exit(code);
}
