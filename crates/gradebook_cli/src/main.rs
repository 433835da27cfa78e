//! CLI smoke entry point.
//!
//! # Responsibility
//! - Resolve configuration, open the configured database and report health.
//! - Keep output deterministic for quick local sanity checks.

use gradebook_api::{ApiConfig, GradebookApi};
use gradebook_core::db::migrations::schema_version;
use std::process::ExitCode;

fn main() -> ExitCode {
    println!("gradebook_core ping={}", gradebook_core::ping());
    println!("gradebook_core version={}", gradebook_core::core_version());

    let config = ApiConfig::from_env();
    let api = match GradebookApi::bootstrap(&config) {
        Ok(api) => api,
        Err(err) => {
            eprintln!("gradebook bootstrap failed: {err}");
            return ExitCode::FAILURE;
        }
    };

    println!("gradebook db_path={}", config.db_path.display());
    match schema_version(api.connection()) {
        Ok(version) => println!("gradebook schema_version={version}"),
        Err(err) => {
            eprintln!("gradebook schema check failed: {err}");
            return ExitCode::FAILURE;
        }
    }

    let health = api.health();
    let status = health
        .body
        .as_ref()
        .and_then(|body| body["status"].as_str())
        .unwrap_or("unknown");
    println!("gradebook health={status}");
    ExitCode::SUCCESS
}
