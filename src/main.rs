//! libr-trace CLI
//!
//! Trace separate-property claims through account statements from the
//! command line.
//!
//! # Usage
//!
//! ```bash
//! # Build ledgers and trace every claim in a case file
//! libr-trace trace --input case.json
//!
//! # Output as JSON, with a custom ledger configuration
//! libr-trace trace --input case.json --format json --config trace.json
//!
//! # Show only the reconciled ledgers
//! libr-trace ledger --input case.json
//!
//! # Generate a random case for testing
//! libr-trace generate --days 365 --seed 7 --output case.json
//! ```

use libr_trace::case::repository::{AccountProfile, CaseRepository, InMemoryCaseRepository};
use libr_trace::case::runner::{AccountReport, CaseRunner};
use libr_trace::config::TraceConfig;
use libr_trace::core::account::AccountId;
use libr_trace::core::batch::{BatchId, Confidence, StatementBatch};
use libr_trace::core::claim::{ClaimId, ClaimSource, SeparateClaim};
use libr_trace::core::currency::Money;
use libr_trace::core::period::DateRange;
use libr_trace::ledger::builder::LedgerBuilder;
use libr_trace::ledger::discrepancy::Discrepancy;
use libr_trace::simulation::history::{generate_history, HistoryConfig};
use libr_trace::trace::result::TraceResult;
use libr_trace::trace::summary::TraceSummary;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::fs;
use std::process;
use uuid::Uuid;

fn print_usage() {
    eprintln!(
        r#"libr-trace: lowest intermediate balance tracing of separate property

USAGE:
    libr-trace <COMMAND> [OPTIONS]

COMMANDS:
    trace       Build ledgers and trace every claim in a case file
    ledger      Build and print the reconciled ledgers only
    generate    Generate a random case file (for testing)
    help        Show this message

OPTIONS (trace, ledger):
    --input <FILE>      Path to JSON case file
    --format <FORMAT>   Output format: text (default) or json
    --config <FILE>     JSON ledger configuration (default: built-in)

OPTIONS (generate):
    --days <N>          Days of history (default: 365)
    --seed <N>          Random seed (default: 42)
    --claim <AMOUNT>    Claimed amount on the first day (default: opening balance)
    --output <FILE>     Write to file instead of stdout

ENVIRONMENT:
    RUST_LOG            Log filter, e.g. RUST_LOG=libr_trace=debug

EXAMPLES:
    libr-trace trace --input case.json
    libr-trace trace --input case.json --format json --config trace.json
    libr-trace ledger --input case.json
    libr-trace generate --days 90 --seed 7 --output case.json"#
    );
}

/// JSON schema for a case file.
#[derive(serde::Serialize, serde::Deserialize)]
struct CaseFile {
    accounts: Vec<AccountInput>,
}

#[derive(serde::Serialize, serde::Deserialize)]
struct AccountInput {
    account: String,
    #[serde(default = "default_currency")]
    currency: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(default)]
    batches: Vec<BatchInput>,
    #[serde(default)]
    claims: Vec<ClaimInput>,
}

#[derive(serde::Serialize, serde::Deserialize)]
struct BatchInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<Uuid>,
    start: NaiveDate,
    end: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    confidence: Option<String>,
    records: Vec<RecordInput>,
}

#[derive(serde::Serialize, serde::Deserialize)]
struct RecordInput {
    date: NaiveDate,
    amount: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    balance: Option<String>,
    #[serde(default)]
    description: String,
}

#[derive(serde::Serialize, serde::Deserialize)]
struct ClaimInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(default)]
    source: ClaimSource,
    amount: String,
    date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    anchor_balance: Option<String>,
}

fn default_currency() -> String {
    "USD".to_string()
}

/// JSON output schema for one account.
#[derive(serde::Serialize)]
struct AccountOutput {
    account: String,
    ledger_hash: Option<String>,
    ledger_error: Option<String>,
    discrepancies: Vec<Discrepancy>,
    results: Vec<ClaimOutput>,
    failures: Vec<FailureOutput>,
}

#[derive(serde::Serialize)]
struct ClaimOutput {
    summary: TraceSummary,
    narrative: String,
    result: TraceResult,
}

#[derive(serde::Serialize)]
struct FailureOutput {
    claim: String,
    error: String,
}

fn parse_decimal(what: &str, value: &str) -> Decimal {
    value.trim().parse().unwrap_or_else(|e| {
        eprintln!("Invalid {} '{}': {}", what, value, e);
        process::exit(1);
    })
}

fn fail<T>(message: String) -> T {
    eprintln!("{}", message);
    process::exit(1);
}

/// Deterministic id for inputs that do not carry one, so that re-running
/// the same file reproduces the same hashes.
fn derived_id(account_index: usize, kind: u128, index: usize) -> u128 {
    ((account_index as u128 + 1) << 96) | (kind << 64) | (index as u128 + 1)
}

fn load_case(path: &str) -> CaseFile {
    let content = fs::read_to_string(path).unwrap_or_else(|e| {
        eprintln!("Error reading file '{}': {}", path, e);
        process::exit(1);
    });

    serde_json::from_str(&content).unwrap_or_else(|e| {
        eprintln!("Error parsing JSON: {}", e);
        eprintln!("Expected format:");
        eprintln!(
            r#"{{
  "accounts": [
    {{
      "account": "CHASE-CHK-4821",
      "currency": "USD",
      "batches": [
        {{ "start": "2024-01-01", "end": "2024-01-31",
           "records": [ {{ "date": "2024-01-02", "amount": "-120.00", "balance": "9880.00", "description": "UTILITIES" }} ] }}
      ],
      "claims": [ {{ "amount": "10000", "date": "2024-01-01", "source": "inheritance" }} ]
    }}
  ]
}}"#
        );
        process::exit(1);
    })
}

fn build_repository(case: CaseFile) -> InMemoryCaseRepository {
    let repo = InMemoryCaseRepository::new();

    for (a, input) in case.accounts.into_iter().enumerate() {
        let account = AccountId::new(&input.account);
        let mut profile = AccountProfile::new(account.clone(), input.currency.as_str());
        if let Some(name) = &input.name {
            profile = profile.with_name(name.clone());
        }
        repo.insert_account(profile)
            .unwrap_or_else(|e| fail(format!("Error: {}", e)));

        for (b, batch_input) in input.batches.into_iter().enumerate() {
            let id = batch_input
                .id
                .map(BatchId::from_uuid)
                .unwrap_or_else(|| BatchId::from_u128(derived_id(a, 1, b)));
            let coverage = DateRange::new(batch_input.start, batch_input.end)
                .unwrap_or_else(|e| fail(format!("Batch {}: {}", id, e)));
            let mut batch = StatementBatch::new(id, account.clone(), input.currency.as_str(), coverage);
            if let Some(confidence) = &batch_input.confidence {
                let confidence = Confidence::new(parse_decimal("confidence", confidence))
                    .unwrap_or_else(|e| fail(format!("Batch {}: {}", id, e)));
                batch = batch.with_confidence(confidence);
            }
            for r in batch_input.records {
                let mut record = batch
                    .record(r.date, parse_decimal("amount", &r.amount))
                    .with_description(r.description);
                if let Some(balance) = &r.balance {
                    record = record.with_stated_balance(parse_decimal("balance", balance));
                }
                batch.add(record);
            }
            repo.add_batch(batch)
                .unwrap_or_else(|e| fail(format!("Error: {}", e)));
        }

        for (c, claim_input) in input.claims.into_iter().enumerate() {
            let id = claim_input
                .id
                .map(ClaimId::from_uuid)
                .unwrap_or_else(|| ClaimId::from_u128(derived_id(a, 2, c)));
            let amount = Money::new(
                parse_decimal("claim amount", &claim_input.amount),
                input.currency.as_str(),
            );
            let mut claim = SeparateClaim::new(id, account.clone(), amount, claim_input.date)
                .unwrap_or_else(|e| fail(format!("Claim {}: {}", id, e)))
                .with_source(claim_input.source);
            if let Some(name) = claim_input.name {
                claim = claim.with_name(name);
            }
            if let Some(anchor) = &claim_input.anchor_balance {
                let anchor = Money::new(parse_decimal("anchor balance", anchor), input.currency.as_str());
                claim = claim
                    .with_anchor_balance(anchor)
                    .unwrap_or_else(|e| fail(format!("Claim {}: {}", id, e)));
            }
            repo.add_claim(claim)
                .unwrap_or_else(|e| fail(format!("Error: {}", e)));
        }
    }
    repo
}

struct CommonArgs {
    input: String,
    format: String,
    config: TraceConfig,
}

fn parse_common(args: &[String]) -> CommonArgs {
    let mut input_path = None;
    let mut format = "text".to_string();
    let mut config = TraceConfig::default();
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--input" => {
                i += 1;
                input_path = Some(args.get(i).cloned().unwrap_or_else(|| {
                    eprintln!("--input requires a file path");
                    process::exit(1);
                }));
            }
            "--format" => {
                i += 1;
                format = args.get(i).cloned().unwrap_or_else(|| {
                    eprintln!("--format requires 'text' or 'json'");
                    process::exit(1);
                });
            }
            "--config" => {
                i += 1;
                let path = args.get(i).cloned().unwrap_or_else(|| {
                    eprintln!("--config requires a file path");
                    process::exit(1);
                });
                config = TraceConfig::load(&path).unwrap_or_else(|e| fail(format!("Error: {}", e)));
            }
            _ => {
                eprintln!("Unknown option: {}", args[i]);
                process::exit(1);
            }
        }
        i += 1;
    }

    let input = input_path.unwrap_or_else(|| {
        eprintln!("Error: --input <FILE> is required");
        process::exit(1);
    });
    if format != "text" && format != "json" {
        eprintln!("--format requires 'text' or 'json', got '{}'", format);
        process::exit(1);
    }

    CommonArgs {
        input,
        format,
        config,
    }
}

fn account_output(report: &AccountReport) -> AccountOutput {
    let (ledger_hash, ledger_error, discrepancies) = match &report.ledger {
        Ok(ledger) => (
            Some(ledger.content_hash().to_string()),
            None,
            ledger.discrepancies().to_vec(),
        ),
        Err(e) => (None, Some(e.to_string()), Vec::new()),
    };

    AccountOutput {
        account: report.account.to_string(),
        ledger_hash,
        ledger_error,
        discrepancies,
        results: report
            .traced()
            .map(|result| {
                let summary = TraceSummary::from_result(result);
                ClaimOutput {
                    narrative: summary.narrative(),
                    summary,
                    result: result.clone(),
                }
            })
            .collect(),
        failures: report
            .failed()
            .map(|(claim, e)| FailureOutput {
                claim: claim.to_string(),
                error: e.to_string(),
            })
            .collect(),
    }
}

fn cmd_trace(args: &[String]) {
    let common = parse_common(args);
    let repo = build_repository(load_case(&common.input));
    let mut runner = CaseRunner::new(repo).with_config(common.config);
    let reports = runner
        .run_all()
        .unwrap_or_else(|e| fail(format!("Error: {}", e)));

    if common.format == "json" {
        let output: Vec<AccountOutput> = reports.iter().map(account_output).collect();
        let json = serde_json::to_string_pretty(&output)
            .unwrap_or_else(|e| fail(format!("Error serializing output: {}", e)));
        println!("{}", json);
    } else {
        for report in &reports {
            println!("{}", report);
            for result in report.traced() {
                println!("{}", result);
            }
        }
    }

    if reports.iter().any(|r| !r.is_ok()) {
        process::exit(2);
    }
}

fn cmd_ledger(args: &[String]) {
    let common = parse_common(args);
    let case = load_case(&common.input);

    let repo = build_repository(case);
    let mut ledgers = Vec::new();
    let profiles = repo
        .accounts()
        .unwrap_or_else(|e| fail(format!("Error: {}", e)));
    for profile in profiles {
        let batches = repo
            .batches(&profile.id)
            .unwrap_or_else(|e| fail(format!("Error: {}", e)));
        let mut builder = LedgerBuilder::new(profile.id.clone(), profile.currency.clone())
            .with_config(common.config.clone());
        builder.add_batches(batches);
        match builder.build() {
            Ok(ledger) => ledgers.push(ledger),
            Err(e) => fail(format!("Account {}: {}", profile.id, e)),
        }
    }

    if common.format == "json" {
        let json = serde_json::to_string_pretty(&ledgers)
            .unwrap_or_else(|e| fail(format!("Error serializing output: {}", e)));
        println!("{}", json);
    } else {
        for ledger in &ledgers {
            println!("{}", ledger);
        }
    }
}

fn cmd_generate(args: &[String]) {
    let mut config = HistoryConfig::default();
    let mut claim_amount: Option<Decimal> = None;
    let mut output_path: Option<String> = None;
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--days" => {
                i += 1;
                config.days = args
                    .get(i)
                    .and_then(|s| s.parse().ok())
                    .unwrap_or_else(|| {
                        eprintln!("--days requires a number");
                        process::exit(1);
                    });
            }
            "--seed" => {
                i += 1;
                config.seed = args
                    .get(i)
                    .and_then(|s| s.parse().ok())
                    .unwrap_or_else(|| {
                        eprintln!("--seed requires a number");
                        process::exit(1);
                    });
            }
            "--claim" => {
                i += 1;
                let value = args.get(i).cloned().unwrap_or_else(|| {
                    eprintln!("--claim requires an amount");
                    process::exit(1);
                });
                claim_amount = Some(parse_decimal("claim amount", &value));
            }
            "--output" => {
                i += 1;
                output_path = Some(args.get(i).cloned().unwrap_or_else(|| {
                    eprintln!("--output requires a file path");
                    process::exit(1);
                }));
            }
            _ => {
                eprintln!("Unknown option: {}", args[i]);
                process::exit(1);
            }
        }
        i += 1;
    }

    let batches = generate_history(&config);
    let record_count: usize = batches.iter().map(|b| b.len()).sum();

    let output = CaseFile {
        accounts: vec![AccountInput {
            account: config.account.to_string(),
            currency: config.currency.to_string(),
            name: Some("Generated checking account".to_string()),
            batches: batches
                .iter()
                .map(|b| BatchInput {
                    id: Some(*b.id().as_uuid()),
                    start: b.coverage().start(),
                    end: b.coverage().end(),
                    confidence: None,
                    records: b
                        .records()
                        .iter()
                        .map(|r| RecordInput {
                            date: r.date(),
                            amount: r.amount().amount().to_string(),
                            balance: r.stated_balance().map(|m| m.amount().to_string()),
                            description: r.description().to_string(),
                        })
                        .collect(),
                })
                .collect(),
            claims: vec![ClaimInput {
                id: None,
                name: Some("Generated inheritance".to_string()),
                source: ClaimSource::Inheritance,
                amount: claim_amount.unwrap_or(config.opening_balance).to_string(),
                date: config.start,
                anchor_balance: Some(config.opening_balance.to_string()),
            }],
        }],
    };

    let json = serde_json::to_string_pretty(&output)
        .unwrap_or_else(|e| fail(format!("Error serializing output: {}", e)));

    if let Some(path) = output_path {
        fs::write(&path, &json).unwrap_or_else(|e| {
            eprintln!("Error writing to '{}': {}", path, e);
            process::exit(1);
        });
        eprintln!(
            "Generated {} records in {} statements over {} days → {}",
            record_count,
            batches.len(),
            config.days,
            path
        );
    } else {
        println!("{}", json);
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_usage();
        process::exit(1);
    }

    let command = args[1].as_str();
    let rest = &args[2..];

    match command {
        "trace" => cmd_trace(rest),
        "ledger" => cmd_ledger(rest),
        "generate" => cmd_generate(rest),
        "help" | "--help" | "-h" => print_usage(),
        _ => {
            eprintln!("Unknown command: {}", command);
            print_usage();
            process::exit(1);
        }
    }
}
