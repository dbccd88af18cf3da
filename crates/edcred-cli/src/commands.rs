use anyhow::Context;
use colored::Colorize;
use edcred_ledger::{CredentialRegistry, RegistryConfig};
use edcred_types::Timestamp;
use tracing::info;

use crate::cli::*;
use crate::script::{OpOutcome, OpStatus, Script};

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config = load_config(&cli)?;
    match cli.command {
        Command::Run(args) => cmd_run(args, &config, &cli.format),
        Command::Check(args) => cmd_check(args),
    }
}

/// `--config` file if given, then `--now` on top.
fn load_config(cli: &Cli) -> anyhow::Result<RegistryConfig> {
    let mut config = match &cli.config {
        Some(path) => {
            let input = std::fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            RegistryConfig::from_toml_str(&input)?
        }
        None => RegistryConfig::default(),
    };
    if let Some(now_ms) = cli.now {
        config = RegistryConfig::fixed_at(Timestamp::from_millis(now_ms));
    }
    Ok(config)
}

fn cmd_run(args: RunArgs, config: &RegistryConfig, format: &OutputFormat) -> anyhow::Result<()> {
    let script = Script::from_path(&args.script)?;
    let registry = CredentialRegistry::new(config);
    let outcomes = script.run(&registry, args.fail_fast);

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&outcomes)?),
        OutputFormat::Text => {
            for outcome in &outcomes {
                print_outcome(outcome);
            }
        }
    }

    let failed = outcomes.iter().filter(|o| o.status.is_failed()).count();
    info!(
        executed = outcomes.len(),
        failed,
        total = script.ops.len(),
        "script finished"
    );
    if failed > 0 {
        anyhow::bail!("{failed} of {} operations failed", outcomes.len());
    }
    if matches!(format, OutputFormat::Text) {
        println!("{} {} operations succeeded", "✓".green().bold(), outcomes.len());
    }
    Ok(())
}

fn cmd_check(args: CheckArgs) -> anyhow::Result<()> {
    let script = Script::from_path(&args.script)?;
    println!(
        "{} {} is valid ({} operations)",
        "✓".green().bold(),
        args.script.display().to_string().bold(),
        script.ops.len()
    );
    Ok(())
}

fn print_outcome(outcome: &OpOutcome) {
    let label = format!("[{}] {}", outcome.index, outcome.action);
    match &outcome.status {
        OpStatus::Ok { value } => println!("{} {} → {}", "✓".green(), label, value.to_string().cyan()),
        OpStatus::Failed { error } => println!("{} {}: {}", "✗".red(), label.bold(), error.red()),
    }
}
