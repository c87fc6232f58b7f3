//! Terminal progress bar for report runs

use crate::core::traits::{percent, ProgressReporter};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::debug;

const TEMPLATE: &str =
    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} rows ({percent}%) | {msg}";

/// Progress reporter drawing an indicatif bar on stderr
#[derive(Debug, Default)]
pub struct BarProgress {
    progress_bar: Option<ProgressBar>,
}

impl BarProgress {
    pub fn new() -> Self {
        Self::default()
    }

    fn style() -> ProgressStyle {
        ProgressStyle::with_template(TEMPLATE)
            .map(|style| style.progress_chars("█▉▊▋▌▍▎▏  "))
            .unwrap_or_else(|_| ProgressStyle::default_bar())
    }
}

impl ProgressReporter for BarProgress {
    fn start(&mut self, total: usize) {
        let pb = ProgressBar::new(total as u64);
        pb.set_style(Self::style());
        pb.set_message("Aggregating seasons");
        debug!("Progress bar initialized for {} rows", total);
        self.progress_bar = Some(pb);
    }

    fn advance(&mut self, done: usize, total: usize) {
        if let Some(ref pb) = self.progress_bar {
            pb.set_length(total as u64);
            pb.set_position(done as u64);
        }
    }

    fn finish(&mut self, done: usize, total: usize) {
        if let Some(pb) = self.progress_bar.take() {
            pb.set_position(done as u64);
            pb.finish_with_message(format!("Done ({:.0}%)", percent(done, total)));
        }
    }
}

impl Drop for BarProgress {
    fn drop(&mut self) {
        // A failed run never reaches `finish`
        if let Some(ref pb) = self.progress_bar {
            if !pb.is_finished() {
                pb.finish_and_clear();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bar_tracks_position() {
        let mut progress = BarProgress::new();
        progress.start(4);
        progress.advance(1, 4);
        progress.advance(3, 4);

        let pb = progress.progress_bar.clone().unwrap();
        assert_eq!(pb.position(), 3);
        assert_eq!(pb.length(), Some(4));

        progress.finish(4, 4);
        assert!(progress.progress_bar.is_none());
        assert_eq!(pb.position(), 4);
    }

    #[test]
    fn test_advance_before_start_is_ignored() {
        let mut progress = BarProgress::new();
        progress.advance(1, 2);
        progress.finish(1, 2);
        assert!(progress.progress_bar.is_none());
    }
}
