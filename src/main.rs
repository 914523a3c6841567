use clap::Parser;
use std::process::ExitCode;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use leo_cli::cli::commands::translate;
use leo_cli::cli::{Args, load_settings};
use leo_cli::ui::Style;
use leo_cli::{logging, output};

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    output::init(output::OutputConfig {
        no_color: args.no_color || output::OutputConfig::default().no_color,
    });

    let settings = match load_settings(args) {
        Ok(settings) => settings,
        Err(err) => return fail(&err, exitcode::USAGE),
    };
    if let Err(err) = logging::init(&settings.log_level) {
        return fail(&err, exitcode::USAGE);
    }

    let cancel = CancellationToken::new();
    tokio::spawn(cancel_on_signal(cancel.clone()));

    match translate::run_translate(settings, cancel.clone()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(_) if cancel.is_cancelled() => ExitCode::SUCCESS,
        Err(err) => fail(&err, exitcode::UNAVAILABLE),
    }
}

fn fail(err: &anyhow::Error, code: exitcode::ExitCode) -> ExitCode {
    let message = format!("Error: {err:#}");
    if output::is_no_color() {
        eprintln!("{message}");
    } else {
        eprintln!("{}", Style::error(message));
    }
    ExitCode::from(u8::try_from(code).unwrap_or(1))
}

/// Cancels `cancel` on Ctrl-C or SIGTERM.
async fn cancel_on_signal(cancel: CancellationToken) {
    tokio::select! {
        _ = tokio::signal::ctrl_c() => debug!("received SIGINT"),
        () = wait_for_sigterm() => debug!("received SIGTERM"),
    }
    cancel.cancel();
}

#[cfg(unix)]
async fn wait_for_sigterm() {
    use tokio::signal::unix::{SignalKind, signal};
    match signal(SignalKind::terminate()) {
        Ok(mut sigterm) => {
            sigterm.recv().await;
        }
        Err(_) => std::future::pending::<()>().await,
    }
}

#[cfg(not(unix))]
async fn wait_for_sigterm() {
    std::future::pending::<()>().await
}
