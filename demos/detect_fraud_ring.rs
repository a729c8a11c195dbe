//! Fraud ring detection example
//!
//! Builds a small synthetic transaction batch mixing a circular
//! routing loop, a smurfing burst, and ordinary payroll traffic, then
//! runs the full pipeline and prints the report.

use mule_ring_detector::{Pipeline, RawTransactionRecord};

fn record(id: &str, from: &str, to: &str, amount: f64, ts: &str) -> RawTransactionRecord {
    RawTransactionRecord {
        transaction_id: Some(id.to_string()),
        from_account: Some(from.to_string()),
        sender_id: None,
        to_account: Some(to.to_string()),
        receiver_id: None,
        amount: Some(amount.to_string()),
        timestamp: Some(ts.to_string()),
    }
}

fn main() {
    tracing_subscriber::fmt::init();

    println!("=== Mule Ring Detector ===\n");

    let mut records = Vec::new();

    // A circular routing loop: A -> B -> C -> A.
    records.push(record("T1", "RING_A", "RING_B", 10_000.0, "2026-02-15 09:00:00"));
    records.push(record("T2", "RING_B", "RING_C", 9_500.0, "2026-02-15 09:03:00"));
    records.push(record("T3", "RING_C", "RING_A", 9_000.0, "2026-02-15 09:07:00"));

    // A smurfing burst: one sender fragments a large sum into 15 similar
    // transfers, all inside one 12-hour window.
    for i in 0..15 {
        let amount = 950.0 + (i as f64 * 7.0) % 100.0;
        records.push(record(
            &format!("SMURF{i}"),
            "SMURF_SRC",
            &format!("SMURF_DST{i}"),
            amount,
            "2026-02-15 10:00:00",
        ));
    }

    // Ordinary payroll traffic, which should never be flagged.
    for week in 0..6 {
        for employee in 0..8 {
            records.push(record(
                &format!("PAY{week}-{employee}"),
                "PAYROLL",
                &format!("EMP{employee}"),
                4_500.0,
                &format!("2026-0{}-0{} 08:00:00", (week % 2) + 1, employee + 1),
            ));
        }
    }

    let pipeline = Pipeline::new();
    let report = pipeline.run(&records).expect("synthetic batch is well-formed");

    println!("Fraud rings detected: {}", report.summary.fraud_rings_detected);
    for ring in &report.fraud_rings {
        println!(
            "  {} [{}] risk_score={:.1} members={:?}",
            ring.ring_id,
            ring.pattern_type.as_str(),
            ring.risk_score,
            ring.member_accounts
        );
    }

    println!("\nSuspicious accounts: {}", report.summary.suspicious_accounts_flagged);
    for account in &report.suspicious_accounts {
        println!(
            "  {} suspicion_score={:.1} patterns={:?} first_ring={}",
            account.account_id, account.suspicion_score, account.detected_patterns, account.ring_id
        );
    }

    println!("\nAccounts analyzed: {}", report.summary.total_accounts_analyzed);
    println!("Processing time: {:.4}s", report.summary.processing_time_seconds);
    println!("Budget expired: {}", report.summary.budget_expired);
}
