//! Basic LIBR trace example.
//!
//! Builds one ledger from two overlapping statements, traces an
//! inheritance deposited into a joint checking account, and prints the
//! summary a report would show.

use chrono::NaiveDate;
use libr_trace::prelude::*;
use rust_decimal_macros::dec;

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2023, 4, d).unwrap_or_default()
}

fn main() {
    println!("╔══════════════════════════════════════════╗");
    println!("║     libr-trace: Basic Trace Example      ║");
    println!("╚══════════════════════════════════════════╝\n");

    let account = AccountId::new("CHASE-CHK-4821");

    // --- Scenario 1: Merging statement sources ---
    println!("━━━ Scenario 1: Monthly PDF + partial CSV export ━━━\n");

    let Ok(april) = DateRange::new(day(1), day(30)) else {
        return;
    };
    let mut pdf = StatementBatch::new(BatchId::from_u128(1), account.clone(), "USD", april);
    pdf.add(pdf.record(day(3), dec!(2400)).with_stated_balance(dec!(5400)).with_description("PAYROLL DEPOSIT"));
    pdf.add(pdf.record(day(5), dec!(50000)).with_stated_balance(dec!(55400)).with_description("WIRE FROM ESTATE OF M. HALE"));
    pdf.add(pdf.record(day(9), dec!(-38000)).with_stated_balance(dec!(17400)).with_description("TITLE CO CLOSING"));
    pdf.add(pdf.record(day(17), dec!(2400)).with_stated_balance(dec!(19800)).with_description("PAYROLL DEPOSIT"));
    pdf.add(pdf.record(day(24), dec!(-9500)).with_stated_balance(dec!(10300)).with_description("AUTO DEALER"));
    pdf.add(pdf.record(day(28), dec!(6000)).with_stated_balance(dec!(16300)).with_description("TRANSFER FROM SAVINGS"));

    // Lower-quality export of the first half of the month.
    let Ok(first_half) = DateRange::new(day(1), day(15)) else {
        return;
    };
    let Ok(confidence) = Confidence::new(dec!(0.7)) else {
        return;
    };
    let mut csv = StatementBatch::new(BatchId::from_u128(2), account.clone(), "USD", first_half)
        .with_confidence(confidence);
    csv.add(csv.record(day(3), dec!(2400)).with_description("PAYROLL DEPOSlT"));
    csv.add(csv.record(day(5), dec!(50000)).with_description("WIRE FROM ESTATE OF M HALE"));
    csv.add(csv.record(day(9), dec!(-38000)).with_description("TITLE CO CLOSING"));

    let mut builder = LedgerBuilder::new(account.clone(), "USD");
    builder.add_batch(pdf).add_batch(csv);
    let ledger = match builder.build() {
        Ok(ledger) => ledger,
        Err(e) => {
            eprintln!("ledger failed: {}", e);
            return;
        }
    };
    println!("{}", ledger);

    // --- Scenario 2: Tracing the inheritance ---
    println!("━━━ Scenario 2: Tracing a $50,000 inheritance ━━━\n");

    let claim = match SeparateClaim::new(
        ClaimId::from_u128(1),
        account.clone(),
        Money::new(dec!(50000), "USD"),
        day(5),
    ) {
        Ok(claim) => claim
            .with_name("Inheritance from M. Hale")
            .with_source(ClaimSource::Inheritance),
        Err(e) => {
            eprintln!("invalid claim: {}", e);
            return;
        }
    };

    let result = match TraceEngine::trace(&ledger, &claim) {
        Ok(result) => result,
        Err(e) => {
            eprintln!("trace failed: {}", e);
            return;
        }
    };
    println!("{}", result);

    let summary = TraceSummary::from_result(&result);
    println!("{}", summary);
    println!("Conclusion: {}\n", summary.narrative());

    // --- Scenario 3: A claim dated before the statements ---
    println!("━━━ Scenario 3: Pre-statement gift with an anchor balance ━━━\n");

    let gift = SeparateClaim::new(
        ClaimId::from_u128(2),
        account,
        Money::new(dec!(4000), "USD"),
        NaiveDate::from_ymd_opt(2023, 3, 20).unwrap_or_default(),
    )
    .map(|c| c.with_source(ClaimSource::Gift));

    if let Ok(gift) = &gift {
        match TraceEngine::trace(&ledger, gift) {
            Ok(_) => println!("Unexpected: traced without an anchor"),
            Err(e) => println!("Without anchor: {}", e),
        }
    }

    let anchored = gift.and_then(|c| c.with_anchor_balance(Money::new(dec!(3000), "USD")));
    if let Ok(anchored) = anchored {
        if let Ok(result) = TraceEngine::trace(&ledger, &anchored) {
            let summary = TraceSummary::from_result(&result);
            println!(
                "With anchor 3000: {} of {} traceable ({}%)",
                summary.final_traceable, summary.claimed_amount, summary.retained_percent
            );
        }
    }
}
