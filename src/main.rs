//! Seriate CLI - run a plan's steps one after another

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;

use seriate::{FixSuggestion, OutputFormat, Plan, PlanRunner, SeriateError, StepOutput};

#[derive(Parser)]
#[command(name = "seriate")]
#[command(about = "Run a plan's steps strictly one after another")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a plan file
    Run {
        /// Path to plan YAML file
        file: String,

        /// Override the plan's output format
        #[arg(short, long, value_enum)]
        format: Option<OutputFormat>,

        /// Print the event log as JSON to stderr when done
        #[arg(long)]
        events: bool,
    },

    /// Validate a plan file without running it
    Validate {
        /// Path to plan YAML file
        file: String,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run {
            file,
            format,
            events,
        } => run_plan(&file, format, events).await,
        Commands::Validate { file } => validate_plan(&file).await,
    };

    if let Err(e) = result {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        if let Some(suggestion) = e
            .downcast_ref::<SeriateError>()
            .and_then(|e| e.fix_suggestion())
        {
            eprintln!("  {} {}", "Fix:".yellow(), suggestion);
        }
        std::process::exit(1);
    }
}

async fn run_plan(file: &str, format: Option<OutputFormat>, events: bool) -> Result<()> {
    let plan = Plan::load(file).await?;
    let format = format.unwrap_or(plan.output.format);

    let runner = PlanRunner::new(plan);
    let result = runner.run().await;

    if events {
        let json = serde_json::to_string_pretty(&runner.event_log().to_json())
            .context("serializing event log")?;
        eprintln!("{}", json);
    }

    let outputs = result?;
    print_outputs(&outputs, format)?;
    Ok(())
}

fn print_outputs(outputs: &[StepOutput], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(outputs)?);
        }
        OutputFormat::Text => {
            for step in outputs {
                println!("{} {} {}", "[✓]".green(), step.id.bold(), step.output);
            }
        }
    }
    Ok(())
}

async fn validate_plan(file: &str) -> Result<()> {
    let plan = Plan::load(file).await?;

    println!("{} Plan '{}' is valid", "✓".green(), file);
    println!("  Steps: {}", plan.steps.len());
    for step in &plan.steps {
        println!("    {} ({})", step.id, step.action.verb());
    }

    Ok(())
}
