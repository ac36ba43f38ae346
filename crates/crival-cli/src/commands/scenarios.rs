//! `crival scenarios` — List the container conformance scenarios.

use crival_validate::SCENARIOS;

/// Executes the `scenarios` command.
pub fn execute() {
    for (i, scenario) in SCENARIOS.iter().enumerate() {
        println!("{:>2}. {}", i + 1, scenario.name);
    }
}
