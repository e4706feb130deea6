use std::io::Write;
use std::process::ExitCode;

use clap::Parser;
use colored::Colorize;
use tracing_subscriber::EnvFilter;

use hostaudit::driver;
use hostaudit::platform;
use hostaudit::probe::LiveProbe;

#[derive(Parser)]
#[command(
    name = "hostaudit",
    version,
    about = "Windows host inventory and security posture report"
)]
struct Cli {}

fn main() -> ExitCode {
    let _cli = Cli::parse();
    init_tracing();

    if let Err(err) = platform::ensure_supported() {
        eprintln!("{} {}", "fatal:".red().bold(), err);
        return ExitCode::from(2);
    }

    // Collectors run strictly one at a time; a single-threaded runtime is
    // all the concurrency this tool needs.
    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(err) => {
            eprintln!("{} failed to start runtime: {}", "fatal:".red().bold(), err);
            return ExitCode::from(2);
        }
    };

    let mut stdout = std::io::stdout();
    match runtime.block_on(driver::run(&LiveProbe, &mut stdout)) {
        Ok(summary) => {
            let _ = stdout.flush();
            ExitCode::from(summary.exit_code() as u8)
        }
        Err(err) => {
            eprintln!("{} {}", "fatal:".red().bold(), err);
            ExitCode::from(2)
        }
    }
}

fn init_tracing() {
    // Verbosity comes from RUST_LOG; the report itself owns stdout, so all
    // diagnostics go to stderr.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
