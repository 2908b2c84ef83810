//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `petkeeper_core` linkage, configuration, and store bootstrap.
//! - Keep output deterministic for quick local sanity checks.

use petkeeper_core::db::migrations;
use petkeeper_core::CoreConfig;
use std::process::ExitCode;

fn main() -> ExitCode {
    let config = match CoreConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("petkeeper config error: {err}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(err) = config.init_logging() {
        eprintln!("petkeeper logging error: {err}");
        return ExitCode::FAILURE;
    }

    println!("petkeeper_core version={}", petkeeper_core::core_version());

    let conn = match config.open_db() {
        Ok(conn) => conn,
        Err(err) => {
            log::error!("event=cli_start module=cli status=error error={err}");
            eprintln!("petkeeper store error: {err}");
            return ExitCode::FAILURE;
        }
    };

    match migrations::current_version(&conn) {
        Ok(version) => {
            println!(
                "petkeeper_core schema={version}/{}",
                migrations::latest_version()
            );
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("petkeeper store error: {err}");
            ExitCode::FAILURE
        }
    }
}
