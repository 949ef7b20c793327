//! Scenario registry: each scenario drives the public engine API and
//! asserts the invariants the balance sheet promises.

use anyhow::{Result, bail, ensure};
use cafe_rush_game::{BalanceData, GameEvent, GamePhase, SessionState};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::players::{MemoryStore, PlayerProfile, drive_run, new_session};

pub struct TestScenario {
    pub name: &'static str,
    pub description: &'static str,
    pub test_fn: fn(&mut ChaCha8Rng) -> Result<()>,
}

/// Outcome of running one scenario across all its iterations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub scenario_name: String,
    pub passed: bool,
    pub iterations_run: usize,
    pub successful_iterations: usize,
    pub failures: Vec<String>,
    pub average_duration_ms: u64,
}

#[must_use]
pub fn get_all_scenarios() -> Vec<TestScenario> {
    vec![
        perfect_run(),
        sloppy_run(),
        stalled_run(),
        timeout_partial(),
        pause_resume(),
        history_bounded(),
        snapshot_freshness(),
        corrupt_storage(),
        ending_totality(),
        invalid_taps(),
    ]
}

#[must_use]
pub fn get_scenarios_by_names(names: &[String]) -> Vec<TestScenario> {
    get_all_scenarios()
        .into_iter()
        .filter(|scenario| {
            names
                .iter()
                .any(|name| scenario.name.contains(&name.to_lowercase()))
        })
        .collect()
}

fn perfect_run() -> TestScenario {
    TestScenario {
        name: "perfect-run",
        description: "A flawless player clears all ten levels and earns the top ending",
        test_fn: |rng| {
            let (mut session, _store, clock) = new_session();
            session.start();
            drive_run(&mut session, &clock, PlayerProfile::PERFECT, rng, 200);

            ensure!(session.phase() == GamePhase::Ended, "run should finish");
            let state = session.state();
            ensure!(state.level == 10, "final level was {}", state.level);
            ensure!(state.character_level == 5, "character should cap at 5");
            ensure!(
                state.correct_taps == state.total_taps,
                "perfect play recorded misses"
            );

            let events = session.drain_events();
            let Some(GameEvent::RunEnded { summary, ending }) = events
                .iter()
                .find(|event| matches!(event, GameEvent::RunEnded { .. }))
            else {
                bail!("no terminal event emitted");
            };
            ensure!(ending.id == "master", "ending was {}", ending.id);
            ensure!(
                (summary.accuracy_percent - 100.0).abs() < f64::EPSILON,
                "accuracy was {}",
                summary.accuracy_percent
            );
            Ok(())
        },
    }
}

fn sloppy_run() -> TestScenario {
    TestScenario {
        name: "sloppy-run",
        description: "A mistake-prone player still terminates with consistent stats",
        test_fn: |rng| {
            let (mut session, _store, clock) = new_session();
            session.start();
            drive_run(&mut session, &clock, PlayerProfile::SLOPPY, rng, 2_000);

            ensure!(session.phase() == GamePhase::Ended, "run should finish");
            let state = session.state();
            ensure!(state.score >= 0, "score went negative: {}", state.score);
            ensure!(
                state.correct_taps <= state.total_taps,
                "tap accounting inverted"
            );
            ensure!(
                state.max_combo <= state.correct_taps,
                "max combo exceeds correct taps"
            );
            ensure!(session.history().len() == 1, "run summary not recorded");
            Ok(())
        },
    }
}

fn stalled_run() -> TestScenario {
    TestScenario {
        name: "stalled-run",
        description: "Time-up with zero taps ends the run on the spot",
        test_fn: |_rng| {
            let (mut session, _store, _clock) = new_session();
            session.start();
            for _ in 0..15 {
                session.tick();
            }
            ensure!(session.phase() == GamePhase::Ended, "run should be over");
            let history = session.history();
            ensure!(history.len() == 1, "summary missing");
            ensure!(
                history[0].ending_id == "newbie",
                "zero-score ending was {}",
                history[0].ending_id
            );
            Ok(())
        },
    }
}

fn timeout_partial() -> TestScenario {
    TestScenario {
        name: "timeout-partial",
        description: "Time-up after partial progress decays the score and advances",
        test_fn: |_rng| {
            let (mut session, _store, _clock) = new_session();
            session.start();
            session.on_tap(1);
            let before = session.state().score;
            for _ in 0..15 {
                session.tick();
            }
            ensure!(session.phase() == GamePhase::Playing, "run ended early");
            ensure!(session.state().level == 2, "level should advance");
            ensure!(
                session.state().score == cafe_rush_game::time_up_decay(before),
                "decay mismatch"
            );
            ensure!(
                session.state().currency == 0,
                "timed-out level must not pay out"
            );
            Ok(())
        },
    }
}

fn pause_resume() -> TestScenario {
    TestScenario {
        name: "pause-resume",
        description: "Pause freezes the countdown and resume continues from it",
        test_fn: |_rng| {
            let (mut session, _store, _clock) = new_session();
            session.start();
            session.tick();
            session.tick();
            let frozen = session.remaining_seconds();

            session.pause();
            for _ in 0..60 {
                session.tick();
            }
            ensure!(
                session.remaining_seconds() == frozen,
                "countdown moved while paused"
            );
            session.on_tap(1);
            ensure!(session.state().total_taps == 0, "paused tap not dropped");

            session.resume();
            session.tick();
            ensure!(
                session.remaining_seconds() == frozen - 1,
                "resume did not continue countdown"
            );
            Ok(())
        },
    }
}

fn history_bounded() -> TestScenario {
    TestScenario {
        name: "history-bounded",
        description: "Fifteen finished runs leave exactly the newest ten summaries",
        test_fn: |_rng| {
            let (mut session, _store, clock) = new_session();
            for _ in 0..15 {
                clock.advance_ms(1_000);
                session.start();
                for _ in 0..15 {
                    session.tick();
                }
            }
            let history = session.history();
            ensure!(history.len() == 10, "history held {}", history.len());
            let ordered = history
                .windows(2)
                .all(|pair| pair[0].finished_at_epoch_ms <= pair[1].finished_at_epoch_ms);
            ensure!(ordered, "history out of order");
            Ok(())
        },
    }
}

fn snapshot_freshness() -> TestScenario {
    TestScenario {
        name: "snapshot-freshness",
        description: "Saved sessions restore within 24 hours and are discarded after",
        test_fn: |rng| {
            let (mut session, store, clock) = new_session();
            session.start();
            drive_run(&mut session, &clock, PlayerProfile::PERFECT, rng, 5);
            let score = session.state().score;

            clock.advance_ms(23 * 60 * 60 * 1_000);
            let fresh = crate::players::TesterSession::new(
                BalanceData::load_from_static(),
                store.clone(),
                clock.clone(),
            );
            ensure!(fresh.state().score == score, "fresh snapshot not restored");

            clock.advance_ms(2 * 60 * 60 * 1_000);
            let stale = crate::players::TesterSession::new(
                BalanceData::load_from_static(),
                store,
                clock,
            );
            ensure!(
                stale.state() == &SessionState::default(),
                "stale snapshot restored"
            );
            Ok(())
        },
    }
}

fn corrupt_storage() -> TestScenario {
    TestScenario {
        name: "corrupt-storage",
        description: "Corrupt blobs degrade to defaults instead of failing",
        test_fn: |_rng| {
            let store = MemoryStore::default();
            store.inject("current-session", "{ definitely not json");
            store.inject("run-history", "[ 1, 2, oops");

            let clock = crate::players::ManualClock::default();
            let mut session = crate::players::TesterSession::new(
                BalanceData::load_from_static(),
                store,
                clock,
            );
            ensure!(
                session.state() == &SessionState::default(),
                "corrupt snapshot leaked into state"
            );
            ensure!(session.history().is_empty(), "corrupt history leaked");

            // The engine must still run and overwrite the bad blobs.
            session.start();
            for _ in 0..15 {
                session.tick();
            }
            ensure!(session.history().len() == 1, "history not rebuilt");
            Ok(())
        },
    }
}

fn ending_totality() -> TestScenario {
    TestScenario {
        name: "ending-totality",
        description: "Every score in [0, 1_000_000] resolves to exactly one ending",
        test_fn: |_rng| {
            let data = BalanceData::load_from_static();
            for score in 0..=1_000_000_i64 {
                let record = data.endings.resolve(score);
                if score >= 2_000 {
                    ensure!(record.id == "master", "score {score} -> {}", record.id);
                } else {
                    ensure!(
                        record.score_min <= score,
                        "score {score} resolved above threshold"
                    );
                }
            }
            // Threshold boundaries land on their own tier.
            ensure!(data.endings.resolve(600).id == "cozy", "lower bound inclusive");
            ensure!(data.endings.resolve(1_200).id == "popular", "lower bound inclusive");
            Ok(())
        },
    }
}

fn invalid_taps() -> TestScenario {
    TestScenario {
        name: "invalid-taps",
        description: "Out-of-range and out-of-phase taps are silently dropped",
        test_fn: |_rng| {
            let (mut session, _store, _clock) = new_session();
            session.on_tap(1);
            ensure!(session.state().total_taps == 0, "menu tap counted");

            session.start();
            session.drain_events();
            session.on_tap(0);
            session.on_tap(200);
            ensure!(session.state().total_taps == 0, "out-of-range tap counted");
            ensure!(session.drain_events().is_empty(), "invalid tap emitted events");
            Ok(())
        },
    }
}
