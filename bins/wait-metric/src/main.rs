mod cmd;

use clap::Parser;
use cmd::config::{Effective, WaitArgs};

/// Exit code of a run that ended in an error, recorded or not.
const EXIT_FAULT: i32 = 2;

#[derive(Parser)]
#[command(
    name = "wait-metric",
    about = "Ждёт, пока метрика достигнет ожидаемого значения, и записывает результат бенчмарка"
)]
struct Cli {
    #[command(flatten)]
    args: WaitArgs,
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();

    let eff = match Effective::new(&cli.args) {
        Ok(e) => e,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(EXIT_FAULT);
        }
    };

    match cmd::wait::run(&eff).await {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(EXIT_FAULT);
        }
    }
}
