//! Scoped cursor bookmark
//!
//! A [`Bookmark`] remembers the cursor of a [`TabularFile`] when it is created
//! and puts it back when it goes out of scope, on every exit path: normal
//! return, `?` propagation and unwinding. Operations that re-enter a file
//! while an outer iteration is active run through a bookmark so the outer
//! iteration never notices.
//!
//! ```no_run
//! use rust_batting_average::io::TabularFile;
//!
//! let mut file = TabularFile::open("Batting.csv").unwrap();
//! {
//!     let mut bookmark = file.bookmark();
//!     bookmark.rewind().unwrap();
//!     while let Some(_row) = bookmark.next_row().unwrap() {}
//! } // cursor restored here
//! ```

use crate::io::tabular_file::TabularFile;
use csv::Position;
use std::ops::{Deref, DerefMut};

/// Restores a file's cursor on drop unless released
///
/// Dereferences to the file, so the bookmarked file is used through the
/// bookmark for the length of the scope.
#[derive(Debug)]
pub struct Bookmark<'a> {
    file: &'a mut TabularFile,
    saved: Option<Position>,
}

impl<'a> Bookmark<'a> {
    pub(crate) fn new(file: &'a mut TabularFile) -> Self {
        let saved = Some(file.position().clone());
        Bookmark { file, saved }
    }

    /// The position that will be restored
    pub fn saved_position(&self) -> Option<&Position> {
        self.saved.as_ref()
    }

    /// Keep the cursor wherever it is now instead of restoring it
    pub fn release(mut self) {
        self.saved = None;
    }
}

impl Deref for Bookmark<'_> {
    type Target = TabularFile;

    fn deref(&self) -> &TabularFile {
        self.file
    }
}

impl DerefMut for Bookmark<'_> {
    fn deref_mut(&mut self) -> &mut TabularFile {
        self.file
    }
}

impl Drop for Bookmark<'_> {
    fn drop(&mut self) {
        if let Some(saved) = self.saved.take() {
            self.file.restore(saved);
        }
    }
}
