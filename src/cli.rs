use crate::config::AppConfig;
use crate::error::AppError;
use crate::questionnaire::{
    snapshot_from_path, CheckResult, CheckStatus, DerivedTotal, FormKind, ValidationEngine,
};
use crate::server;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "ARN Questionnaire Validator",
    about = "Validate quarterly telecom questionnaires and serve the validation API",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Run a full submission pass over an exported snapshot
    Validate(SnapshotArgs),
    /// Print the derived totals of an exported snapshot
    Totals(SnapshotArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

#[derive(Args, Debug)]
pub(crate) struct SnapshotArgs {
    /// Questionnaire form, e.g. estacoes_moveis or trafego_originado
    #[arg(long)]
    form: FormKind,
    /// Snapshot export (.json object or field,value .csv)
    #[arg(long)]
    input: PathBuf,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Validate(args) => run_validate(args),
        Command::Totals(args) => run_totals(args),
    }
}

fn engine_for(form: FormKind) -> Result<ValidationEngine, AppError> {
    let config = AppConfig::load()?;
    Ok(ValidationEngine::for_form(form, config.questionnaire.limits))
}

fn run_validate(args: SnapshotArgs) -> Result<(), AppError> {
    let engine = engine_for(args.form)?;
    let parsed = snapshot_from_path(args.form, &args.input)?;

    let report = engine.validate_submission_with(&parsed.snapshot, &parsed.clamped);
    let totals = engine.aggregate(&parsed.snapshot).totals;

    println!("{} questionnaire: {}", args.form.label(), args.input.display());
    if !parsed.ignored.is_empty() {
        println!("Ignored fields: {}", parsed.ignored.join(", "));
    }
    if !parsed.clamped.is_empty() {
        let clamped: Vec<&str> = parsed.clamped.iter().map(|field| field.as_str()).collect();
        println!("Negative values replaced by 0: {}", clamped.join(", "));
    }

    println!("\nChecks");
    for result in &report.results {
        println!("- {}", describe_result(result));
    }

    render_totals(&totals);

    let verdict = if report.blocks_submission() {
        "submission blocked"
    } else {
        "ready to submit"
    };
    println!("\n{} ({verdict})", report.summary());
    Ok(())
}

fn run_totals(args: SnapshotArgs) -> Result<(), AppError> {
    let engine = engine_for(args.form)?;
    let parsed = snapshot_from_path(args.form, &args.input)?;

    println!("{} questionnaire: {}", args.form.label(), args.input.display());
    render_totals(&engine.aggregate(&parsed.snapshot).totals);
    Ok(())
}

fn describe_result(result: &CheckResult) -> String {
    let status = match result.status {
        CheckStatus::Passed => "ok",
        CheckStatus::Skipped => "skipped",
        CheckStatus::Warning | CheckStatus::Failed => result.severity.label(),
    };
    let field = result
        .field
        .map(|field| format!(" [{field}]"))
        .unwrap_or_default();

    match (&result.message, result.status) {
        (Some(message), CheckStatus::Failed | CheckStatus::Warning) => {
            format!("{status}: {}{field} {message}", result.rule)
        }
        _ => format!("{status}: {}", result.rule),
    }
}

fn render_totals(totals: &[DerivedTotal]) {
    if totals.is_empty() {
        println!("\nTotals: none");
        return;
    }

    println!("\nTotals");
    for total in totals {
        let marker = if total.highlighted { " (!)" } else { "" };
        println!("- {}: {}{marker}", total.name, total.formatted);
    }
}
