use std::process::ExitCode;

use clap::Parser;
use dlsim::cli::{Cli, DEBUG_PERIODIC};
use dlsim::simulation;
use dotenvy::dotenv;
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> ExitCode {
    dotenv().ok();

    let cli = Cli::parse();

    let log_file = match std::fs::create_dir_all(&cli.log_dir)
        .and_then(|()| std::fs::File::create(cli.log_dir.join("main.log")))
    {
        Ok(file) => file,
        Err(err) => {
            eprintln!("cannot open main log file: {err}");
            return ExitCode::FAILURE;
        }
    };
    let (writer, _guard) = tracing_appender::non_blocking(log_file);
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("{}=info", env!("CARGO_CRATE_NAME")).into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(writer).with_ansi(false))
        .init();

    let progress = if cli.debug_flags & DEBUG_PERIODIC != 0 {
        let bar = ProgressBar::new(cli.events);
        bar.set_style(
            ProgressStyle::with_template("{bar:40} tick {pos}/{len} ({eta})")
                .expect("static progress template is valid"),
        );
        Some(bar)
    } else {
        None
    };

    let result = simulation::run(&cli, |tick| {
        if let Some(bar) = &progress {
            bar.set_position(tick);
        }
    });

    if let Some(bar) = progress {
        bar.finish_and_clear();
    }

    match result {
        Ok(outcome) => {
            println!("--- M0 ---\n{}", outcome.m0);
            println!("--- M1 ---\n{}", outcome.m1);
            println!("--- total ---\n{}", outcome.total);
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("{err}");
            ExitCode::FAILURE
        }
    }
}
