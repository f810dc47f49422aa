use anyhow::{Context, Result};
use clap::Parser;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::time::{Duration, Instant};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use quizgen::cli::{Cli, Commands};
use quizgen::config::{ApiKey, Config};
use quizgen::diagnostics;
use quizgen::extractors::document::{declared_type_for_path, extract_document};
use quizgen::generate::{GeneratorSettings, QuizClient};
use quizgen::output;
use quizgen::pipeline::QuizPipeline;
use quizgen::utils::{format_duration, format_file_size, LengthNotice};
use quizgen::QuizError;

#[tokio::main]
async fn main() {
    // A .env file in the working directory may carry the API key
    dotenv::dotenv().ok();

    let cli = Cli::parse();

    let default_filter = if cli.verbose { "quizgen=debug" } else { "quizgen=info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Err(err) = run(cli).await {
        eprintln!("{} {:#}", style("❌").red(), err);
        if let Some(tip) = err.downcast_ref::<QuizError>().and_then(QuizError::tip) {
            eprintln!("💡 Tip: {}", tip);
        }
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::load()?;

    match cli.command {
        Commands::Generate {
            url,
            file,
            content_type,
            output_dir,
            no_export,
        } => {
            let api_key = ApiKey::resolve(cli.api_key.as_deref())?;
            let client = QuizClient::new(GeneratorSettings::from_config(&config, api_key))?;
            let pipeline = QuizPipeline::new(&config, client);

            let progress = spinner(cli.quiet, "📝 Extracting source text...");
            let source = match (url, file) {
                (Some(url), _) => {
                    tracing::info!("Starting quiz generation for URL: {}", url);
                    pipeline.extract_from_youtube(&url).await.map_err(anyhow::Error::from)
                }
                (None, Some(path)) => {
                    let declared = content_type.unwrap_or_else(|| declared_type_for_path(&path).to_string());
                    tracing::info!("Starting quiz generation for {} ({})", path.display(), declared);
                    fs_err::read(&path)
                        .context("Failed to read document")
                        .and_then(|bytes| Ok(extract_document(&bytes, &declared)?))
                }
                (None, None) => Err(anyhow::anyhow!("Either --url or --file is required")),
            };
            progress.finish_and_clear();
            let source = source?;

            let chars = source.char_count();
            match LengthNotice::for_length(chars) {
                LengthNotice::VeryLong => println!(
                    "⚠️  Very long {} detected ({} characters). This may take longer to process.",
                    source.origin.describe().to_lowercase(),
                    chars
                ),
                LengthNotice::Long => println!(
                    "📝 Long {} detected ({} characters). Only the beginning is sent for generation.",
                    source.origin.describe().to_lowercase(),
                    chars
                ),
                LengthNotice::Normal => {}
            }
            println!(
                "{} {} extracted successfully! ({} characters)",
                style("✅").green(),
                source.origin.describe(),
                chars
            );

            let progress = spinner(cli.quiet, "🧠 Generating quiz with AI... This may take up to 2 minutes.");
            let started = Instant::now();
            let outcome = pipeline.generate(source).await;
            progress.finish_and_clear();
            let outcome = outcome?;

            println!(
                "🎉 Quiz generated successfully! {} questions from {} in {}\n",
                outcome.quiz.len(),
                outcome.model,
                format_duration(started.elapsed())
            );

            output::print_to_console(&outcome.quiz);

            if !no_export {
                let dir = output_dir.unwrap_or_else(|| config.export.output_dir.clone());
                export_results(&outcome.quiz, &dir);
            }
        }
        Commands::Check { offline } => {
            println!("🎯 AI Quiz Generator - Environment Check");
            println!("{}", "=".repeat(50));

            let reports = diagnostics::run_checks(&config, cli.api_key.as_deref(), offline).await;

            for report in &reports {
                if report.passed {
                    println!("{} {}: {}", style("✅ PASS").green(), report.name, report.detail);
                } else {
                    println!("{} {}: {}", style("❌ FAIL").red(), report.name, report.detail);
                    if let Some(hint) = &report.hint {
                        println!("   💡 {}", hint);
                    }
                }
            }

            let passed = diagnostics::passed_count(&reports);
            println!("{}", "=".repeat(50));
            println!("Overall: {}/{} checks passed", passed, reports.len());

            if passed != reports.len() {
                anyhow::bail!("{} check(s) failed", reports.len() - passed);
            }
            println!("🎉 All checks passed! Your environment is ready.");
        }
        Commands::Config { show, init } => {
            if init {
                let path = Config::default().save()?;
                println!("Default configuration written to: {}", path.display());
            } else {
                if !show {
                    println!("Edit quizgen.yaml in the current directory or run `quizgen config --init`.\n");
                }
                config.display(cli.api_key.as_deref());
            }
        }
    }

    Ok(())
}

/// Write every export, reporting failures without stopping the others
fn export_results(quiz: &quizgen::QuizDocument, dir: &Path) {
    println!("\n{}", style("📤 Export Results").bold().underlined());

    for result in output::export_all(quiz) {
        let saved = result
            .map_err(anyhow::Error::from)
            .and_then(|artifact| {
                let path = output::save_artifact(&artifact, dir)?;
                Ok((artifact, path))
            });

        match saved {
            Ok((artifact, path)) => println!(
                "  {} {} saved to: {} ({})",
                style("✅").green(),
                artifact.kind.label(),
                path.display(),
                format_file_size(artifact.bytes.len() as u64)
            ),
            Err(e) => eprintln!("  {} {:#}", style("❌").red(), e),
        }
    }
}

fn spinner(quiet: bool, message: &'static str) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }

    let progress = ProgressBar::new_spinner();
    progress.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    progress.set_message(message);
    progress.enable_steady_tick(Duration::from_millis(100));
    progress
}
