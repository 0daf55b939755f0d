//! Integration Test: Virtual Clock
//!
//! **Policy**: The engine takes time as an argument. Only the runtime driver
//! (and the runner binary around it) may read a clock; every other module
//! works on the session time it is handed.

use architectural_enforcement::{is_wall_clock_read, scan_directory, workspace_root};

const CLOCK_OWNERS: &[&str] = &["runtime.rs"];

#[test]
fn test_engine_never_reads_wall_clock() {
    let core = workspace_root().join("engine/core/src");
    let violations: Vec<_> = scan_directory(&core, is_wall_clock_read)
        .into_iter()
        .filter(|v| {
            !CLOCK_OWNERS
                .iter()
                .any(|owner| v.path.file_name().and_then(|n| n.to_str()) == Some(owner))
        })
        .collect();

    for violation in &violations {
        eprintln!("  ❌ {violation}");
    }
    assert!(
        violations.is_empty(),
        "Found {} wall-clock read(s) outside the runtime driver",
        violations.len()
    );
}

#[test]
fn test_runtime_driver_owns_the_clock() {
    let runtime = workspace_root().join("engine/core/src/runtime.rs");
    let source = std::fs::read_to_string(&runtime).expect("runtime.rs readable");
    assert!(source.contains("tokio::time::interval"));
}
