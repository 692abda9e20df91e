//! Antibiotic Recommendation Engine — Demo CLI
//!
//! Usage:
//!   cargo run -p demo -- recommend --file case.json
//!   cargo run -p demo -- recommend --stdin
//!   cargo run -p demo -- validate --corpus-dir guidelines
//!   cargo run -p demo -- reload --corpus-dir guidelines
//!   cargo run -p demo -- scenarios

use std::io::Read;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use abx_contracts::error::{AbxError, AbxResult};
use abx_contracts::patient::{PatientCase, RawPatientCase};
use abx_contracts::recommendation::Recommendation;
use abx_engine::RecommendationEngine;
use abx_repository::GuidelineRepository;

/// Antibiotic recommendation engine — reference CLI over the guideline corpus.
#[derive(Parser)]
#[command(
    name = "demo",
    about = "Antibiotic recommendation engine demo",
    long_about = "Runs the empiric antibiotic recommendation pipeline\n\
                  (allergy classification -> pregnancy filtering -> renal\n\
                  adjustment -> drug selection -> dose calculation) against\n\
                  a versioned guideline corpus loaded from disk."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Produce a recommendation for a single patient case.
    Recommend {
        /// Read the patient case from a JSON file.
        #[arg(long)]
        file: Option<PathBuf>,
        /// Read the patient case as JSON from stdin.
        #[arg(long)]
        stdin: bool,
        /// Corpus directory to load (defaults to the shipped default corpus).
        #[arg(long)]
        corpus_dir: Option<PathBuf>,
    },
    /// Load a corpus and print its cross-reference validation report.
    Validate {
        #[arg(long)]
        corpus_dir: PathBuf,
    },
    /// Load a corpus, then reload it in place, demonstrating the atomic swap.
    Reload {
        #[arg(long)]
        corpus_dir: PathBuf,
    },
    /// Run the canonical set of patient-case scenarios against the default corpus.
    Scenarios,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_target(false)
        .compact()
        .init();

    let cli = Cli::parse();

    print_banner();

    let result = match cli.command {
        Command::Recommend { file, stdin, corpus_dir } => run_recommend(file, stdin, corpus_dir),
        Command::Validate { corpus_dir } => run_validate(corpus_dir),
        Command::Reload { corpus_dir } => run_reload(corpus_dir),
        Command::Scenarios => run_scenarios(),
    };

    match result {
        Ok(()) => {}
        Err(e) => {
            eprintln!("demo error: {e}");
            std::process::exit(1);
        }
    }
}

fn load_repository(corpus_dir: Option<PathBuf>) -> AbxResult<GuidelineRepository> {
    let dir = corpus_dir.unwrap_or_else(abx_guidelines::default_corpus_dir);
    let (repository, report) = GuidelineRepository::load(dir)?;
    if !report.is_clean() {
        for violation in &report.violations {
            eprintln!("warning: {violation}");
        }
    }
    Ok(repository)
}

fn run_recommend(file: Option<PathBuf>, stdin: bool, corpus_dir: Option<PathBuf>) -> AbxResult<()> {
    let raw_json = if let Some(path) = file {
        std::fs::read_to_string(&path)
            .map_err(|e| AbxError::InvalidInput { reason: format!("failed to read {}: {e}", path.display()) })?
    } else if stdin {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .map_err(|e| AbxError::InvalidInput { reason: format!("failed to read stdin: {e}") })?;
        buf
    } else {
        return Err(AbxError::InvalidInput { reason: "pass --file <path> or --stdin".to_string() });
    };

    let raw: RawPatientCase = serde_json::from_str(&raw_json)
        .map_err(|e| AbxError::InvalidInput { reason: format!("invalid patient case JSON: {e}") })?;
    let case = PatientCase::try_from(raw)?;

    let repository = load_repository(corpus_dir)?;
    let engine = RecommendationEngine::new(&repository);
    let recommendation = engine.recommend(&case);
    print_recommendation(&recommendation);
    Ok(())
}

fn run_validate(corpus_dir: PathBuf) -> AbxResult<()> {
    let (_repository, report) = GuidelineRepository::load(corpus_dir)?;
    if report.is_clean() {
        println!("corpus is clean: no cross-reference violations");
    } else {
        println!("{} cross-reference violation(s):", report.violations.len());
        for violation in &report.violations {
            println!("  - {violation}");
        }
    }
    Ok(())
}

fn run_reload(corpus_dir: PathBuf) -> AbxResult<()> {
    let repository = GuidelineRepository::load(corpus_dir)?.0;
    println!("loaded corpus version {}", repository.current().version);
    let report = repository.reload()?;
    println!("reloaded corpus version {}", repository.current().version);
    if report.is_clean() {
        println!("reloaded corpus is clean: no cross-reference violations");
    } else {
        println!("{} cross-reference violation(s) after reload:", report.violations.len());
        for violation in &report.violations {
            println!("  - {violation}");
        }
    }
    Ok(())
}

fn run_scenarios() -> AbxResult<()> {
    let (repository, _report) = GuidelineRepository::load(abx_guidelines::default_corpus_dir())?;
    let engine = RecommendationEngine::new(&repository);

    for (label, case) in canonical_scenarios() {
        println!("=== {label} ===");
        let recommendation = engine.recommend(&case);
        print_recommendation(&recommendation);
        println!();
    }
    Ok(())
}

fn canonical_scenarios() -> Vec<(&'static str, PatientCase)> {
    use abx_contracts::patient::PatientCaseBuilder;

    vec![
        ("Febrile UTI (pyelonephritis)", PatientCaseBuilder::new(55, "uti").fever(true).build()),
        (
            "Intra-abdominal infection, severe PCN allergy",
            PatientCaseBuilder::new(65, "intra_abdominal").allergies("Penicillin - anaphylaxis").build(),
        ),
        (
            "Pregnant UTI, severe PCN allergy",
            PatientCaseBuilder::new(28, "uti").fever(true).pregnancy(2).allergies("PCN (anaphylaxis)").build(),
        ),
        (
            "MRSA bacteremia, renal impairment",
            PatientCaseBuilder::new(75, "bacteremia").mrsa_risk(true).weight_kg(80.0).crcl_ml_min(25.0).build(),
        ),
        ("Bacterial meningitis", PatientCaseBuilder::new(42, "meningitis").weight_kg(70.0).build()),
        ("Afebrile UTI (cystitis)", PatientCaseBuilder::new(45, "uti").fever(false).build()),
    ]
}

fn print_recommendation(recommendation: &Recommendation) {
    if let Some(text) = &recommendation.recommendation_text {
        println!("{text}");
    }
    if !recommendation.errors.is_empty() {
        println!("errors:");
        for error in &recommendation.errors {
            println!("  - {error}");
        }
    }
}

fn print_banner() {
    println!();
    println!("Antibiotic Recommendation Engine");
    println!("=================================");
    println!();
    println!("Pipeline per case:");
    println!("  [1] Allergy classifier       -> no_allergy / mild / severe PCN allergy");
    println!("  [2] Pregnancy filter          -> excludes contraindicated drug classes");
    println!("  [3] Renal adjuster            -> CrCl-banded dose tiers");
    println!("  [4] Drug selector             -> first matching regimen, source order");
    println!("  [5] Dose calculator           -> indication lookup + weight-based dosing");
    println!();
}
