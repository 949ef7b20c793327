mod harness;
mod players;
mod scenarios;

use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;
use colored::Colorize;
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write, stdout};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use harness::ScenarioRunner;
use scenarios::{ScenarioResult, get_all_scenarios, get_scenarios_by_names};

#[derive(Debug, Parser)]
#[command(name = "cafe-rush-tester", version)]
#[command(about = "Automated QA testing for the Cafe Rush engine - scripted players over pure game logic")]
struct Args {
    /// Scenarios to run (comma-separated, substring match)
    #[arg(long, default_value = "all")]
    scenarios: String,

    /// List all available scenarios and exit
    #[arg(long)]
    list_scenarios: bool,

    /// Seeds to run (comma-separated)
    #[arg(long, default_value = "1337")]
    seeds: String,

    /// Number of iterations per scenario and seed
    #[arg(long, default_value_t = 10)]
    iterations: usize,

    /// Output report format
    #[arg(long, default_value = "console")]
    #[arg(value_parser = ["console", "json", "markdown"])]
    report: String,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Optional path to write the report output instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
struct Report {
    generated_at: String,
    elapsed_ms: u64,
    total_scenarios: usize,
    passed_scenarios: usize,
    results: Vec<ScenarioResult>,
}

fn main() -> Result<ExitCode> {
    env_logger::init();
    let args = Args::parse();

    if args.list_scenarios {
        println!("Available scenarios:");
        for scenario in get_all_scenarios() {
            println!("  {:<20} {}", scenario.name.bright_white(), scenario.description);
        }
        return Ok(ExitCode::SUCCESS);
    }

    println!("{}", "☕ Cafe Rush engine tester".bright_yellow().bold());

    let scenarios = if args.scenarios == "all" {
        get_all_scenarios()
    } else {
        get_scenarios_by_names(&split_csv(&args.scenarios))
    };
    if scenarios.is_empty() {
        anyhow::bail!("no scenarios match '{}'", args.scenarios);
    }
    let seeds = parse_seeds(&args.seeds)?;
    log::info!(
        "running {} scenarios across {} seeds, {} iterations each",
        scenarios.len(),
        seeds.len(),
        args.iterations
    );

    let started = Instant::now();
    let runner = ScenarioRunner::new(args.verbose);
    let results = runner.run_scenarios(&scenarios, &seeds, args.iterations);

    let passed = results.iter().filter(|result| result.passed).count();
    let report = Report {
        generated_at: Local::now().to_rfc3339(),
        elapsed_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
        total_scenarios: results.len(),
        passed_scenarios: passed,
        results,
    };

    write_report(&args, &report)?;

    if passed == report.total_scenarios {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}

fn split_csv(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_seeds(input: &str) -> Result<Vec<u64>> {
    let seeds = split_csv(input)
        .iter()
        .map(|token| {
            token
                .parse::<u64>()
                .with_context(|| format!("invalid seed '{token}'"))
        })
        .collect::<Result<Vec<u64>>>()?;
    anyhow::ensure!(!seeds.is_empty(), "at least one seed is required");
    Ok(seeds)
}

fn write_report(args: &Args, report: &Report) -> Result<()> {
    let rendered = match args.report.as_str() {
        "json" => serde_json::to_string_pretty(report)?,
        "markdown" => render_markdown(report),
        _ => {
            render_console(report);
            return Ok(());
        }
    };

    match &args.output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("cannot create report file {}", path.display()))?;
            let mut writer = BufWriter::new(file);
            writeln!(writer, "{rendered}")?;
        }
        None => {
            writeln!(stdout(), "{rendered}")?;
        }
    }
    Ok(())
}

fn render_console(report: &Report) {
    println!();
    for result in &report.results {
        let status = if result.passed {
            "PASS".green().bold()
        } else {
            "FAIL".red().bold()
        };
        println!(
            "{status} {:<20} {}/{} runs, avg {}ms",
            result.scenario_name,
            result.successful_iterations,
            result.iterations_run,
            result.average_duration_ms
        );
        for failure in &result.failures {
            println!("       {}", failure.red());
        }
    }
    println!();
    let summary = format!(
        "{}/{} scenarios passed in {}ms",
        report.passed_scenarios, report.total_scenarios, report.elapsed_ms
    );
    if report.passed_scenarios == report.total_scenarios {
        println!("{}", summary.green().bold());
    } else {
        println!("{}", summary.red().bold());
    }
}

fn render_markdown(report: &Report) -> String {
    let mut out = String::new();
    out.push_str("# Cafe Rush tester report\n\n");
    out.push_str(&format!("Generated: {}\n\n", report.generated_at));
    out.push_str("| Scenario | Passed | Runs | Avg (ms) |\n");
    out.push_str("|----------|--------|------|----------|\n");
    for result in &report.results {
        out.push_str(&format!(
            "| {} | {} | {}/{} | {} |\n",
            result.scenario_name,
            if result.passed { "yes" } else { "no" },
            result.successful_iterations,
            result.iterations_run,
            result.average_duration_ms
        ));
    }
    for result in &report.results {
        if !result.failures.is_empty() {
            out.push_str(&format!("\n## Failures: {}\n\n", result.scenario_name));
            for failure in &result.failures {
                out.push_str(&format!("- {failure}\n"));
            }
        }
    }
    out
}
