//! Analyzer parity testing
//!
//! Verifies the analyzer against:
//! - A table of hand-checked positions (tests/data/scenarios.json)
//! - A naive exhaustive minimax with no classifier and no cache policy,
//!   over every 5- and 6-bush position with small counts

use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use roses_core::{analyze, Analyzer, AnalyzerConfig, Position};
use serde::Deserialize;

/// JSON structure of the scenario table
#[derive(Debug, Deserialize)]
struct ScenarioFile {
    version: String,
    scenarios: Vec<Scenario>,
}

#[derive(Debug, Deserialize)]
struct Scenario {
    description: String,
    position: Vec<u32>,
    is_winning: bool,
    witness: Option<Vec<u32>>,
}

fn load_scenarios() -> ScenarioFile {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/data/scenarios.json");
    let file = File::open(&path).expect("Failed to open scenario file");
    serde_json::from_reader(BufReader::new(file)).expect("Failed to parse JSON")
}

/// Plain minimax over sorted count vectors: a position wins iff some move
/// reaches a losing position.
fn naive_wins(counts: &[u32], memo: &mut HashMap<Vec<u32>, bool>) -> bool {
    let mut key = counts.to_vec();
    key.sort_unstable();
    if let Some(&known) = memo.get(&key) {
        return known;
    }

    let n = key.len();
    let mut wins = false;
    'moves: for i in 0..n {
        if key[i] == 0 {
            continue;
        }
        let mut child = key.clone();
        child[i] -= 1;
        if !naive_wins(&child, memo) {
            wins = true;
            break;
        }
        for j in (i + 1)..n {
            if key[j] == 0 {
                continue;
            }
            let mut child = key.clone();
            child[i] -= 1;
            child[j] -= 1;
            if !naive_wins(&child, memo) {
                wins = true;
                break 'moves;
            }
        }
    }

    memo.insert(key, wins);
    wins
}

/// Every count vector of `piles` bushes with counts in 0..=max.
fn all_positions(piles: usize, max: u32) -> Vec<Vec<u32>> {
    let mut out = vec![Vec::new()];
    for _ in 0..piles {
        out = out
            .into_iter()
            .flat_map(|prefix| {
                (0..=max).map(move |c| {
                    let mut next = prefix.clone();
                    next.push(c);
                    next
                })
            })
            .collect();
    }
    out
}

#[test]
fn test_scenario_table() {
    let data = load_scenarios();
    println!("Loaded {} scenarios (v{})", data.scenarios.len(), data.version);

    let mut failures: Vec<String> = Vec::new();
    for s in &data.scenarios {
        let verdict = analyze(&Position::new(s.position.clone()));
        let witness = verdict.witness_move.as_ref().map(|w| w.counts().to_vec());
        if verdict.is_winning != s.is_winning || witness != s.witness {
            failures.push(format!(
                "{} {:?}: expected ({}, {:?}), got ({}, {:?})",
                s.description, s.position, s.is_winning, s.witness, verdict.is_winning, witness
            ));
        }
    }

    assert!(failures.is_empty(), "Scenario failures:\n  {}", failures.join("\n  "));
}

#[test]
fn test_naive_minimax_parity() {
    let mut memo = HashMap::new();
    let mut checked = 0;
    let mut failures: Vec<String> = Vec::new();

    for (piles, max) in [(5, 3), (6, 3)] {
        for counts in all_positions(piles, max) {
            let expected = naive_wins(&counts, &mut memo);
            let position = Position::new(counts.clone());
            let verdict = analyze(&position);
            checked += 1;

            if verdict.is_winning != expected {
                failures.push(format!(
                    "{:?}: analyzer={}, minimax={}",
                    counts, verdict.is_winning, expected
                ));
                continue;
            }

            // Witness must be one move away and lost for the opponent
            if let Some(witness) = &verdict.witness_move {
                if position.move_to(witness).is_none() {
                    failures.push(format!("{:?}: witness {} is not one move away", counts, witness));
                } else if naive_wins(witness.counts(), &mut memo) {
                    failures.push(format!("{:?}: witness {} wins for the opponent", counts, witness));
                }
            } else if verdict.is_winning {
                failures.push(format!("{:?}: winning verdict without witness", counts));
            }
        }
    }

    println!("Checked {} positions", checked);
    if failures.len() > 10 {
        failures.truncate(10);
    }
    assert!(failures.is_empty(), "Parity failures:\n  {}", failures.join("\n  "));
}

#[test]
fn test_full_search_matches_closed_form() {
    let config = AnalyzerConfig {
        closed_form: false,
        ..AnalyzerConfig::default()
    };

    // Positions with an empty bush are where the classifier applies
    let positions = all_positions(5, 3).into_iter().chain(all_positions(6, 2));
    for counts in positions.filter(|c| c.contains(&0)) {
        let position = Position::new(counts.clone());
        let mut full = Analyzer::new(config.clone());
        let searched = full.analyze(&position).expect("unbounded search");
        assert_eq!(
            searched.is_winning,
            analyze(&position).is_winning,
            "Classifier disagrees with full search for {:?}",
            counts
        );
    }
}
