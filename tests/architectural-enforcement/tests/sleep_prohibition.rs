//! Integration Test: Sleep Prohibition
//!
//! **Policy**: Production code in the engine and the runner MUST NOT call
//! sleep methods. Periodic work uses `tokio::time::interval`; delays inside
//! the engine are virtual-clock timers.
//! **Exceptions**: test code

use architectural_enforcement::{is_sleep_call, scan_production};

#[test]
fn test_no_sleep_in_production_code() {
    let violations = scan_production(is_sleep_call);

    if !violations.is_empty() {
        eprintln!("\n❌ CRITICAL: Sleep calls found in production code!\n");
        for violation in &violations {
            eprintln!("  ❌ {violation}");
        }
        eprintln!("\n✅ ACCEPTABLE:");
        eprintln!("  - Test code (#[cfg(test)] modules, tests/ directories)");
        eprintln!("  - Periodic tasks using tokio::time::interval()");
        eprintln!("  - Engine timers scheduled on the session clock");

        panic!(
            "\nFound {} sleep violation(s) in production code.\nFix these before merging!",
            violations.len()
        );
    }
}
