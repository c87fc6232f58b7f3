//! Benchmark suite for report generation
//!
//! The aggregator re-scans the batting file for every distinct season, so
//! run time grows with the square of the input size. These benchmarks track
//! that curve and the cost of narrowing inputs with a filter.
//!
//! # Running Benchmarks
//!
//! ```bash
//! # Run all benchmarks
//! cargo bench
//! ```
//!
//! # Benchmark Fixtures
//!
//! Inputs are generated into a temporary directory before timing starts:
//! one batting row per player season, every third player with a second
//! stint, spread over ten seasons and eight teams.

use rust_batting_average::core::{generate_report, NoProgress, ReportConfig};
use rust_batting_average::io::{Origin, TabularFile};
use std::fmt::Write as _;
use std::fs;
use tempfile::TempDir;

const TEAMS: [&str; 8] = ["BOS", "CHA", "CLE", "DET", "NYA", "PHA", "SLA", "WS1"];
const FIRST_YEAR: u32 = 1901;

fn main() {
    divan::main();
}

struct Fixture {
    dir: TempDir,
}

impl Fixture {
    fn new(players: usize) -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");

        let mut batting = String::from("playerID,yearID,stint,teamID,lgID,G,AB,R,H\n");
        for player in 0..players {
            let year = FIRST_YEAR + (player % 10) as u32;
            let team = TEAMS[player % TEAMS.len()];
            let at_bats = 100 + (player * 37) % 500;
            let hits = at_bats / 4 + player % 17;
            writeln!(
                batting,
                "player{:05},{},1,{},AL,100,{},50,{}",
                player, year, team, at_bats, hits
            )
            .expect("Failed to format row");

            if player % 3 == 0 {
                let other = TEAMS[(player + 1) % TEAMS.len()];
                writeln!(batting, "player{:05},{},2,{},AL,20,60,8,15", player, year, other)
                    .expect("Failed to format row");
            }
        }

        let mut teams = String::from("yearID,lgID,teamID,name\n");
        for offset in 0..10 {
            for team in TEAMS {
                writeln!(teams, "{},AL,{},{} Club", FIRST_YEAR + offset, team, team)
                    .expect("Failed to format row");
            }
        }

        fs::write(dir.path().join("Batting.csv"), batting).expect("Failed to write batting");
        fs::write(dir.path().join("Teams.csv"), teams).expect("Failed to write teams");
        Fixture { dir }
    }

    fn config(&self) -> ReportConfig {
        ReportConfig::new(
            self.dir.path().join("Batting.csv"),
            self.dir.path().join("Teams.csv"),
            self.dir.path().join("result.csv"),
        )
    }
}

/// Full report over every season
#[divan::bench(args = [100, 500, 1_000])]
fn report_all_seasons(bencher: divan::Bencher, players: usize) {
    let fixture = Fixture::new(players);
    let config = fixture.config();

    bencher.bench_local(|| {
        generate_report(&config, &mut NoProgress).expect("Report failed");
    });
}

/// Report narrowed to one season through temporary copies
#[divan::bench(args = [100, 500, 1_000])]
fn report_one_season(bencher: divan::Bencher, players: usize) {
    let fixture = Fixture::new(players);
    let config = fixture.config().with_year(FIRST_YEAR.to_string());

    bencher.bench_local(|| {
        generate_report(&config, &mut NoProgress).expect("Report failed");
    });
}

/// Single full pass with a predicate
#[divan::bench(args = [1_000, 10_000])]
fn filter_from_start(bencher: divan::Bencher, players: usize) {
    let fixture = Fixture::new(players);
    let mut file =
        TabularFile::open(fixture.dir.path().join("Batting.csv")).expect("Failed to open");

    bencher.bench_local(|| {
        file.filter(Origin::Start, |row| Ok(row.value("teamID") == "DET"))
            .expect("Filter failed")
    });
}
