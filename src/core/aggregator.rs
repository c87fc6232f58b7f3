//! Batting average aggregation
//!
//! Produces one output record per distinct (player, season) pair of the
//! primary file. For each new pair the primary file is re-entered with a
//! cursor-preserving [`scan`](TabularFile::scan) that collects every stint of
//! that pair, and each stint's team is resolved against the reference file
//! with [`find`](TabularFile::find).
//!
//! # Output
//!
//! ```text
//! playerID,yearID,Team name(s),Batting Average
//! mcgrajo01,1902,"Baltimore Orioles, New York Giants",0.253
//! ```
//!
//! Keys are written in file order of first appearance. Later rows of an
//! already written key are not processed again; their numbers were already
//! included by the scan of the first one.

use crate::core::filter::EqualityFilter;
use crate::core::traits::ProgressReporter;
use crate::io::tabular_file::discard;
use crate::io::{Origin, TabularFile};
use crate::types::{Row, TableError};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;
use tracing::{debug, info, warn};

/// Header of the joined label column
pub const TEAM_NAMES_COLUMN: &str = "Team name(s)";

/// Header of the ratio column
pub const AVERAGE_COLUMN: &str = "Batting Average";

/// Column names the aggregator reads
///
/// The reference file is expected to use the same `sub_entity` and `period`
/// names as the primary file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportColumns {
    /// Player identifier in the primary file
    pub entity: String,
    /// Season identifier in both files
    pub period: String,
    /// Team identifier in both files
    pub sub_entity: String,
    /// Hits
    pub successes: String,
    /// At-bats
    pub attempts: String,
    /// Team name in the reference file
    pub label: String,
}

impl Default for ReportColumns {
    fn default() -> Self {
        ReportColumns {
            entity: "playerID".to_string(),
            period: "yearID".to_string(),
            sub_entity: "teamID".to_string(),
            successes: "H".to_string(),
            attempts: "AB".to_string(),
            label: "name".to_string(),
        }
    }
}

/// What to do when a stint's team has no reference row
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MissingReferencePolicy {
    /// Warn, omit the label and keep the stint's numbers
    #[default]
    Skip,
    /// Abort with [`TableError::ReferenceNotFound`]
    Fail,
}

/// A (player, season) pair
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SeasonKey {
    pub entity: String,
    pub period: String,
}

impl SeasonKey {
    fn of(row: &Row, columns: &ReportColumns) -> Self {
        SeasonKey {
            entity: row.value(&columns.entity).to_string(),
            period: row.value(&columns.period).to_string(),
        }
    }

    fn matches(&self, row: &Row, columns: &ReportColumns) -> bool {
        row.value(&columns.entity) == self.entity && row.value(&columns.period) == self.period
    }
}

impl fmt::Display for SeasonKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.entity, self.period)
    }
}

/// One output record
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeasonAverage {
    pub entity_id: String,
    pub period_id: String,
    pub team_names: String,
    pub batting_average: String,
}

/// Counters of one aggregation run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AggregationSummary {
    /// Data rows pulled by the outer pass
    pub rows_read: usize,
    /// Output records written
    pub keys_written: usize,
    /// Rows whose key had already been written
    pub repeated_keys: usize,
    /// Malformed rows and stints with invalid counters
    pub rows_skipped: usize,
    /// Keys with at least one unresolved team, in order of discovery
    pub missing_references: Vec<String>,
}

/// Hits over at-bats, rounded half away from zero to 3 places
///
/// Zero at-bats yields zero.
pub fn batting_average(hits: u64, at_bats: u64) -> Decimal {
    if at_bats == 0 {
        return Decimal::ZERO;
    }

    (Decimal::from(hits) / Decimal::from(at_bats))
        .round_dp_with_strategy(3, RoundingStrategy::MidpointAwayFromZero)
}

/// Fixed three-digit rendering used in the output file
pub fn format_average(average: Decimal) -> String {
    format!("{:.3}", average)
}

fn join_labels(labels: &[String]) -> String {
    labels
        .join(", ")
        .trim_matches(|c| c == ',' || c == ' ')
        .to_string()
}

fn counter(row: &Row, field: &str) -> Result<u64, TableError> {
    let raw = row.value(field);
    if raw.is_empty() {
        return Ok(0);
    }

    raw.parse::<u64>()
        .map_err(|_| TableError::invalid_number(row.line().unwrap_or_default(), field, raw))
}

/// Computes per-player-per-season batting averages
#[derive(Debug, Clone, Default)]
pub struct BattingAggregator {
    columns: ReportColumns,
    missing_reference: MissingReferencePolicy,
}

impl BattingAggregator {
    pub fn new(columns: ReportColumns) -> Self {
        BattingAggregator {
            columns,
            missing_reference: MissingReferencePolicy::default(),
        }
    }

    pub fn with_missing_reference(mut self, policy: MissingReferencePolicy) -> Self {
        self.missing_reference = policy;
        self
    }

    pub fn columns(&self) -> &ReportColumns {
        &self.columns
    }

    /// Field names of the output file
    pub fn output_header(&self) -> Vec<String> {
        vec![
            self.columns.entity.clone(),
            self.columns.period.clone(),
            TEAM_NAMES_COLUMN.to_string(),
            AVERAGE_COLUMN.to_string(),
        ]
    }

    /// Aggregate `primary` into `output`, resolving teams through `reference`
    ///
    /// A non-empty `filter` narrows both files first. The narrowed copies are
    /// temporary files that are deleted when the run ends, whether it
    /// succeeds or fails.
    ///
    /// # Errors
    ///
    /// - `InvalidArgument` if a file lacks a required or filtered column
    /// - `ReferenceNotFound` under [`MissingReferencePolicy::Fail`]
    /// - any fatal I/O or parse error
    pub fn run(
        &self,
        primary: &mut TabularFile,
        reference: &mut TabularFile,
        filter: &EqualityFilter,
        output: &mut TabularFile,
        progress: &mut dyn ProgressReporter,
    ) -> Result<AggregationSummary, TableError> {
        self.validate(primary, reference, filter)?;

        if filter.is_empty() {
            return self.aggregate(primary, reference, output, progress);
        }

        let mut primary_copy = primary.materialize(Origin::Cursor, |row| Ok(filter.matches(row)))?;
        let mut reference_copy =
            match reference.materialize(Origin::Cursor, |row| Ok(filter.matches(row))) {
                Ok(copy) => copy,
                Err(err) => {
                    discard(primary_copy);
                    return Err(err);
                }
            };
        debug!(
            conditions = ?filter.conditions(),
            primary = %primary_copy.path().display(),
            reference = %reference_copy.path().display(),
            "narrowed inputs"
        );

        let outcome = self.aggregate(&mut primary_copy, &mut reference_copy, output, progress);

        discard(primary_copy);
        discard(reference_copy);
        outcome
    }

    /// Check that both files have every column the run will read
    ///
    /// # Errors
    ///
    /// `InvalidArgument` naming the first missing report or filter column.
    pub fn validate(
        &self,
        primary: &TabularFile,
        reference: &TabularFile,
        filter: &EqualityFilter,
    ) -> Result<(), TableError> {
        let columns = &self.columns;
        let required = [
            (primary, &columns.entity),
            (primary, &columns.period),
            (primary, &columns.sub_entity),
            (primary, &columns.successes),
            (primary, &columns.attempts),
            (reference, &columns.sub_entity),
            (reference, &columns.period),
            (reference, &columns.label),
        ];

        for (file, column) in required {
            if !file.header().contains(column) {
                return Err(TableError::unknown_column(column, file.path()));
            }
        }
        filter.validate(primary)?;
        filter.validate(reference)
    }

    fn aggregate(
        &self,
        primary: &mut TabularFile,
        reference: &mut TabularFile,
        output: &mut TabularFile,
        progress: &mut dyn ProgressReporter,
    ) -> Result<AggregationSummary, TableError> {
        let total = primary.row_count()?;
        progress.start(total);
        info!(rows = total, path = %primary.path().display(), "aggregating");

        let mut seen = HashSet::new();
        let mut summary = AggregationSummary::default();

        loop {
            let row = match primary.next_row() {
                Ok(Some(row)) => row,
                Ok(None) => break,
                Err(err) if err.is_recoverable() => {
                    warn!(path = %primary.path().display(), "skipping row: {}", err);
                    summary.rows_read += 1;
                    summary.rows_skipped += 1;
                    continue;
                }
                Err(err) => return Err(err),
            };
            summary.rows_read += 1;

            let key = SeasonKey::of(&row, &self.columns);
            if !seen.insert(key.clone()) {
                summary.repeated_keys += 1;
                continue;
            }

            let season = self.season(primary, reference, &key, &mut summary)?;
            output.add_record(&season)?;
            summary.keys_written += 1;
            progress.advance(summary.rows_read, total);
        }

        output.flush()?;
        progress.finish(summary.rows_read, total);
        info!(
            keys = summary.keys_written,
            skipped = summary.rows_skipped,
            missing_references = summary.missing_references.len(),
            "aggregation complete"
        );
        Ok(summary)
    }

    /// Totals and team names of every stint of `key`
    fn season(
        &self,
        primary: &mut TabularFile,
        reference: &mut TabularFile,
        key: &SeasonKey,
        summary: &mut AggregationSummary,
    ) -> Result<SeasonAverage, TableError> {
        let columns = &self.columns;
        let stints = primary.scan(|row| Ok(key.matches(row, columns)))?;

        let mut hits: u64 = 0;
        let mut at_bats: u64 = 0;
        let mut labels = Vec::with_capacity(stints.len());

        for stint in &stints {
            let (stint_hits, stint_at_bats) = match (
                counter(stint, &columns.successes),
                counter(stint, &columns.attempts),
            ) {
                (Ok(h), Ok(ab)) => (h, ab),
                (Err(err), _) | (_, Err(err)) => {
                    warn!(key = %key, "skipping stint: {}", err);
                    summary.rows_skipped += 1;
                    continue;
                }
            };
            hits = hits.saturating_add(stint_hits);
            at_bats = at_bats.saturating_add(stint_at_bats);

            let team_id = stint.value(&columns.sub_entity);
            let period = stint.value(&columns.period);
            let team = reference.find(|team| {
                Ok(team.value(&columns.sub_entity) == team_id && team.value(&columns.period) == period)
            })?;

            match team {
                Some(team) => labels.push(team.value(&columns.label).to_string()),
                None => {
                    let key_text = key.to_string();
                    let err = TableError::reference_not_found(&key_text, team_id, period);
                    if self.missing_reference == MissingReferencePolicy::Fail {
                        return Err(err);
                    }
                    warn!("{}", err);
                    if !summary.missing_references.contains(&key_text) {
                        summary.missing_references.push(key_text);
                    }
                }
            }
        }

        Ok(SeasonAverage {
            entity_id: key.entity.clone(),
            period_id: key.period.clone(),
            team_names: join_labels(&labels),
            batting_average: format_average(batting_average(hits, at_bats)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::traits::NoProgress;
    use rstest::rstest;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_csv(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("Failed to create temp file");
        file.write_all(content.as_bytes())
            .expect("Failed to write to temp file");
        file.flush().expect("Failed to flush temp file");
        file
    }

    const PRIMARY: &str = "id,period,sub,H,AB\n\
        p1,2000,A,2,4\n\
        p1,2000,B,1,4\n\
        p2,2000,A,3,6\n";

    const REFERENCE: &str = "sub,period,label\n\
        A,2000,Alpha\n\
        B,2000,Beta\n";

    fn columns() -> ReportColumns {
        ReportColumns {
            entity: "id".to_string(),
            period: "period".to_string(),
            sub_entity: "sub".to_string(),
            successes: "H".to_string(),
            attempts: "AB".to_string(),
            label: "label".to_string(),
        }
    }

    #[derive(Default)]
    struct RecordingProgress {
        started: Option<usize>,
        steps: Vec<(usize, usize)>,
        finished: Option<(usize, usize)>,
    }

    impl ProgressReporter for RecordingProgress {
        fn start(&mut self, total: usize) {
            self.started = Some(total);
        }

        fn advance(&mut self, done: usize, total: usize) {
            self.steps.push((done, total));
        }

        fn finish(&mut self, done: usize, total: usize) {
            self.finished = Some((done, total));
        }
    }

    /// Run the aggregator over in-memory CSV text and return the output text
    fn run_report(
        aggregator: &BattingAggregator,
        primary: &str,
        reference: &str,
        filter: &EqualityFilter,
        progress: &mut dyn ProgressReporter,
    ) -> Result<(String, AggregationSummary), TableError> {
        let primary_temp = create_temp_csv(primary);
        let reference_temp = create_temp_csv(reference);
        let mut primary = TabularFile::open(primary_temp.path())?;
        let mut reference = TabularFile::open(reference_temp.path())?;
        let mut output = TabularFile::make(aggregator.output_header(), None)?;

        let result = aggregator.run(&mut primary, &mut reference, filter, &mut output, progress);
        let content = std::fs::read_to_string(output.path()).unwrap();
        output.close()?;

        result.map(|summary| (content, summary))
    }

    #[test]
    fn test_concrete_scenario() {
        let aggregator = BattingAggregator::new(columns());
        let (content, summary) = run_report(
            &aggregator,
            PRIMARY,
            REFERENCE,
            &EqualityFilter::new(),
            &mut NoProgress,
        )
        .unwrap();

        assert_eq!(
            content,
            "id,period,Team name(s),Batting Average\n\
             p1,2000,\"Alpha, Beta\",0.375\n\
             p2,2000,Alpha,0.500\n"
        );
        assert_eq!(summary.rows_read, 3);
        assert_eq!(summary.keys_written, 2);
        assert_eq!(summary.repeated_keys, 1);
        assert!(summary.missing_references.is_empty());
    }

    #[test]
    fn test_missing_reference_fails_under_strict_policy() {
        let aggregator =
            BattingAggregator::new(columns()).with_missing_reference(MissingReferencePolicy::Fail);
        let result = run_report(
            &aggregator,
            PRIMARY,
            "sub,period,label\nA,2000,Alpha\n",
            &EqualityFilter::new(),
            &mut NoProgress,
        );

        assert_eq!(
            result.unwrap_err(),
            TableError::reference_not_found("p1::2000", "B", "2000")
        );
    }

    #[test]
    fn test_missing_reference_is_skipped_by_default() {
        let aggregator = BattingAggregator::new(columns());
        let (content, summary) = run_report(
            &aggregator,
            PRIMARY,
            "sub,period,label\nA,2000,Alpha\n",
            &EqualityFilter::new(),
            &mut NoProgress,
        )
        .unwrap();

        assert!(content.contains("p1,2000,Alpha,0.375\n"));
        assert_eq!(summary.missing_references, vec!["p1::2000".to_string()]);
    }

    #[test]
    fn test_zero_attempts_yield_zero_average() {
        let aggregator = BattingAggregator::new(columns());
        let (content, _) = run_report(
            &aggregator,
            "id,period,sub,H,AB\np3,2000,A,0,0\np4,2000,A,0,\n",
            REFERENCE,
            &EqualityFilter::new(),
            &mut NoProgress,
        )
        .unwrap();

        assert!(content.contains("p3,2000,Alpha,0.000\n"));
        assert!(content.contains("p4,2000,Alpha,0.000\n"));
    }

    #[test]
    fn test_later_stints_are_merged_into_first_appearance() {
        let aggregator = BattingAggregator::new(columns());
        let (content, summary) = run_report(
            &aggregator,
            "id,period,sub,H,AB\n\
             p1,2000,A,2,4\n\
             p2,2000,A,3,6\n\
             p1,2000,B,1,4\n\
             p1,2001,A,1,2\n",
            "sub,period,label\nA,2000,Alpha\nB,2000,Beta\nA,2001,Alpha\n",
            &EqualityFilter::new(),
            &mut NoProgress,
        )
        .unwrap();

        assert_eq!(
            content,
            "id,period,Team name(s),Batting Average\n\
             p1,2000,\"Alpha, Beta\",0.375\n\
             p2,2000,Alpha,0.500\n\
             p1,2001,Alpha,0.500\n"
        );
        assert_eq!(summary.repeated_keys, 1);
    }

    #[test]
    fn test_repeated_team_labels_are_kept() {
        let aggregator = BattingAggregator::new(columns());
        let (content, _) = run_report(
            &aggregator,
            "id,period,sub,H,AB\np1,2000,A,1,2\np1,2000,B,1,2\np1,2000,A,1,2\n",
            REFERENCE,
            &EqualityFilter::new(),
            &mut NoProgress,
        )
        .unwrap();

        assert!(content.contains("p1,2000,\"Alpha, Beta, Alpha\",0.500\n"));
    }

    #[test]
    fn test_invalid_counter_skips_stint() {
        let aggregator = BattingAggregator::new(columns());
        let (content, summary) = run_report(
            &aggregator,
            "id,period,sub,H,AB\np1,2000,A,2,4\np1,2000,B,x,4\n",
            REFERENCE,
            &EqualityFilter::new(),
            &mut NoProgress,
        )
        .unwrap();

        assert!(content.contains("p1,2000,Alpha,0.500\n"));
        assert_eq!(summary.rows_skipped, 1);
    }

    #[test]
    fn test_malformed_primary_row_is_skipped_once() {
        let aggregator = BattingAggregator::new(columns());
        let (content, summary) = run_report(
            &aggregator,
            "id,period,sub,H,AB\np1,2000,A,2,4\np9,2000\np2,2000,A,3,6\n",
            REFERENCE,
            &EqualityFilter::new(),
            &mut NoProgress,
        )
        .unwrap();

        assert!(!content.contains("p9"));
        assert_eq!(summary.rows_read, 3);
        assert_eq!(summary.rows_skipped, 1);
        assert_eq!(summary.keys_written, 2);
    }

    #[test]
    fn test_filter_narrows_both_files() {
        let aggregator = BattingAggregator::new(columns());
        let (content, summary) = run_report(
            &aggregator,
            PRIMARY,
            REFERENCE,
            &EqualityFilter::new().with("sub", "B"),
            &mut NoProgress,
        )
        .unwrap();

        assert_eq!(
            content,
            "id,period,Team name(s),Batting Average\np1,2000,Beta,0.250\n"
        );
        assert_eq!(summary.rows_read, 1);
    }

    #[test]
    fn test_filter_on_unknown_column_is_invalid_argument() {
        let aggregator = BattingAggregator::new(columns());
        let result = run_report(
            &aggregator,
            PRIMARY,
            REFERENCE,
            &EqualityFilter::new().with("league", "AL"),
            &mut NoProgress,
        );

        assert!(matches!(result, Err(TableError::InvalidArgument { .. })));
    }

    #[test]
    fn test_missing_required_column_is_invalid_argument() {
        let aggregator = BattingAggregator::new(columns());
        let result = run_report(
            &aggregator,
            PRIMARY,
            "sub,period\nA,2000\n",
            &EqualityFilter::new(),
            &mut NoProgress,
        );

        assert!(matches!(
            result,
            Err(TableError::InvalidArgument { message }) if message.contains("'label'")
        ));
    }

    #[test]
    fn test_progress_is_monotonic_and_completes() {
        let aggregator = BattingAggregator::new(columns());
        let mut progress = RecordingProgress::default();
        run_report(
            &aggregator,
            PRIMARY,
            REFERENCE,
            &EqualityFilter::new(),
            &mut progress,
        )
        .unwrap();

        assert_eq!(progress.started, Some(3));
        assert_eq!(progress.steps, vec![(1, 3), (3, 3)]);
        assert_eq!(progress.finished, Some((3, 3)));
    }

    #[test]
    fn test_output_is_deterministic() {
        let aggregator = BattingAggregator::new(columns());
        let first = run_report(&aggregator, PRIMARY, REFERENCE, &EqualityFilter::new(), &mut NoProgress)
            .unwrap()
            .0;
        let second = run_report(&aggregator, PRIMARY, REFERENCE, &EqualityFilter::new(), &mut NoProgress)
            .unwrap()
            .0;
        assert_eq!(first, second);
    }

    #[rstest]
    #[case::exact(3, 8, "0.375")]
    #[case::half(3, 6, "0.500")]
    #[case::zero_attempts(0, 0, "0.000")]
    #[case::hits_without_attempts(2, 0, "0.000")]
    #[case::thirds_round_down(1, 3, "0.333")]
    #[case::thirds_round_up(2, 3, "0.667")]
    #[case::midpoint_away_from_zero(1, 16, "0.063")]
    #[case::perfect(4, 4, "1.000")]
    #[case::aaron_1954(131, 468, "0.280")]
    fn test_batting_average(#[case] hits: u64, #[case] at_bats: u64, #[case] expected: &str) {
        assert_eq!(format_average(batting_average(hits, at_bats)), expected);
    }

    #[rstest]
    #[case::single(&["Alpha"], "Alpha")]
    #[case::several(&["Alpha", "Beta"], "Alpha, Beta")]
    #[case::trailing_empty(&["Alpha", ""], "Alpha")]
    #[case::leading_empty(&["", "Beta"], "Beta")]
    #[case::none(&[], "")]
    fn test_join_labels(#[case] labels: &[&str], #[case] expected: &str) {
        let labels: Vec<String> = labels.iter().map(|l| l.to_string()).collect();
        assert_eq!(join_labels(&labels), expected);
    }

    #[test]
    fn test_season_key_display() {
        let key = SeasonKey {
            entity: "p1".to_string(),
            period: "2000".to_string(),
        };
        assert_eq!(key.to_string(), "p1::2000");
    }
}
