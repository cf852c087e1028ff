//! nau - network reachability and blocking diagnostics
//!
//! Probes a set of domains and protocol endpoints, folds in the platform
//! diagnostic text and prints a report with likely causes of blocking.

use clap::Parser;
use network_autopsy::{
    app::DiagnosticSession,
    cli::Cli,
    config::{display_config_summary, load_config, validate_config},
    error::{AppError, ErrorReporter, Result},
    output::{FileReportSink, OutputFormatterFactory},
    platform::{ProgressSink, ReportSink},
    PKG_NAME, VERSION,
};
use std::process;
use std::sync::Arc;

/// Progress lines on stderr so stdout carries only the report
struct ConsoleProgress {
    enabled: bool,
}

impl ProgressSink for ConsoleProgress {
    fn report_progress(&self, percent: u8, message: &str) {
        if self.enabled {
            eprintln!("[{:>3}%] {}", percent, message);
        }
    }
}

#[tokio::main]
async fn main() {
    std::panic::set_hook(Box::new(|panic_info| {
        eprintln!("Application panic: {}", panic_info);
        process::exit(99);
    }));

    let cli = Cli::parse();
    let reporter = ErrorReporter::new(cli.use_colors(), cli.verbose || cli.debug);

    if let Err(e) = run_application(cli).await {
        reporter.report_error(&e);
        process::exit(e.exit_code());
    }
}

async fn run_application(cli: Cli) -> Result<()> {
    if cli.should_show_topic_help() {
        println!("{}", cli.display_help());
        return Ok(());
    }

    cli.validate().map_err(AppError::config)?;

    if cli.debug {
        eprintln!("{} v{}", PKG_NAME, VERSION);
        if let Some(commit) = option_env!("GIT_COMMIT") {
            eprintln!("Commit: {}", commit);
        }
        if let Some(built) = option_env!("BUILD_TIME") {
            eprintln!("Built: {}", built);
        }
    }

    let config = load_config(cli)?;

    for warning in validate_config(&config)? {
        eprintln!("{}", warning.format(config.enable_color));
    }

    if config.debug {
        eprintln!("{}", display_config_summary(&config));
        eprintln!();
    }

    let progress = Arc::new(ConsoleProgress {
        enabled: !config.json_output,
    });
    let session = Arc::new(DiagnosticSession::from_config(config.clone())?.with_progress(progress));

    let interrupter = session.clone();
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("Interrupted, finishing with partial results");
            interrupter.cancel();
        }
    });

    let run = session.run_diagnostic().await;
    interrupt.abort();
    let run = run?;

    let formatter = OutputFormatterFactory::create_formatter(&config);
    println!("{}", formatter.format_run(&run)?);

    if config.save_report {
        let sink = FileReportSink::new(config.report_dir.clone());
        match sink.save_report(&run.report) {
            Ok(path) => eprintln!("{}", formatter.format_saved(&path)),
            Err(e) => ErrorReporter::new(config.enable_color, config.verbose).report_error(&e),
        }
    }

    if run.cancelled {
        return Err(AppError::Cancelled);
    }

    Ok(())
}
