pub mod config;
pub mod error;
pub mod questionnaire;
pub mod telemetry;

mod cli;
mod routes;
mod server;

use error::AppError;

/// Entry point shared by the binary: parses arguments and dispatches the subcommand.
pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
