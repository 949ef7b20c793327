//! Scenario runner: seeds, iterations, timing, and console feedback.

use colored::Colorize;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::time::{Duration, Instant};

use crate::scenarios::{ScenarioResult, TestScenario};

pub struct ScenarioRunner {
    verbose: bool,
}

impl ScenarioRunner {
    #[must_use]
    pub const fn new(verbose: bool) -> Self {
        Self { verbose }
    }

    /// Run every selected scenario across all seeds and iterations.
    pub fn run_scenarios(
        &self,
        scenarios: &[TestScenario],
        seeds: &[u64],
        iterations: usize,
    ) -> Vec<ScenarioResult> {
        let mut results = Vec::with_capacity(scenarios.len());
        for scenario in scenarios {
            if self.verbose {
                println!("🧪 Testing scenario: {}", scenario.name.bright_white());
            }
            results.push(self.run_scenario(scenario, seeds, iterations));
        }
        results
    }

    fn run_scenario(
        &self,
        scenario: &TestScenario,
        seeds: &[u64],
        iterations: usize,
    ) -> ScenarioResult {
        let mut successes = 0;
        let mut failures = Vec::new();
        let mut durations = Vec::new();
        let total = seeds.len() * iterations;
        let mut run = 0;

        for &seed_base in seeds {
            for iteration in 0..iterations {
                run += 1;
                let seed = seed_base.wrapping_add(iteration as u64);
                let mut rng = ChaCha8Rng::seed_from_u64(seed);
                let started = Instant::now();

                match (scenario.test_fn)(&mut rng) {
                    Ok(()) => {
                        successes += 1;
                        let duration = started.elapsed();
                        durations.push(duration);
                        if self.verbose {
                            println!("  ✅ Run {run}/{total} passed ({duration:?})");
                        }
                    }
                    Err(err) => {
                        failures.push(format!("seed {seed}: {err}"));
                        if self.verbose {
                            println!("  ❌ Run {run}/{total} failed: {}", err.to_string().red());
                        }
                    }
                }
            }
        }

        let average = if durations.is_empty() {
            Duration::ZERO
        } else {
            durations.iter().sum::<Duration>() / durations.len() as u32
        };

        ScenarioResult {
            scenario_name: scenario.name.to_string(),
            passed: failures.is_empty(),
            iterations_run: total,
            successful_iterations: successes,
            failures,
            average_duration_ms: u64::try_from(average.as_millis()).unwrap_or(u64::MAX),
        }
    }
}
