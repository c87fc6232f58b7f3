//! Cursor-based reader/writer over a delimited file
//!
//! A [`TabularFile`] owns an explicit read cursor (a byte position into the
//! file) and never loads the whole file into memory. Rows are pulled one at a
//! time from the cursor; `scan`, `each` and `find` can be issued while an
//! outer iteration is in progress because they run through a
//! [`Bookmark`](crate::io::Bookmark) that puts the cursor back afterwards.
//!
//! # Layout
//!
//! The first physical record is the header. When field names are supplied
//! explicitly the first record is still consumed at open time, so the cursor
//! always starts on the second physical record.
//!
//! # Writes
//!
//! Writes go through a separate append handle that is opened on the first
//! write, so existing files are only opened for reading unless something is
//! added to them. Buffered writes are flushed before the next read.
//!
//! # Example
//!
//! ```no_run
//! use rust_batting_average::io::{Origin, TabularFile};
//!
//! let mut batting = TabularFile::open("Batting.csv").unwrap();
//! while let Some(row) = batting.next_row().unwrap() {
//!     let player = row.value("playerID").to_string();
//!     let stints = batting
//!         .scan(|other| Ok(other.get("playerID") == Some(player.as_str())))
//!         .unwrap();
//!     println!("{} has {} stints", player, stints.len());
//! }
//! ```

use crate::io::bookmark::Bookmark;
use crate::io::sink::RowSink;
use crate::types::{FieldCountPolicy, Header, Row, TableError};
use csv::{ByteRecord, Position, ReaderBuilder, StringRecord, WriterBuilder};
use serde::Serialize;
use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::io::SeekFrom;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// Where a filtering pass starts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Origin {
    /// From the current cursor; the cursor is restored afterwards
    #[default]
    Cursor,
    /// From the first data row; the cursor is left at end of data
    Start,
}

/// Options for [`TabularFile::open_with`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableOptions {
    field_names: Option<Vec<String>>,
    fresh: bool,
    field_count: FieldCountPolicy,
}

impl TableOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use these field names instead of the file's first record
    pub fn field_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.field_names = Some(names.into_iter().map(Into::into).collect());
        self
    }

    /// Create the file, truncating it if it exists
    pub fn fresh(mut self, fresh: bool) -> Self {
        self.fresh = fresh;
        self
    }

    pub fn field_count(mut self, policy: FieldCountPolicy) -> Self {
        self.field_count = policy;
        self
    }
}

/// Header-aware, forward-only, position-restorable delimited file
///
/// Dropping a `TabularFile` flushes and releases its handles but leaves the
/// file on disk; [`close`](TabularFile::close) is the only way to delete it.
pub struct TabularFile {
    path: PathBuf,
    header: Arc<Header>,
    field_count: FieldCountPolicy,
    reader: csv::Reader<File>,
    writer: Option<csv::Writer<File>>,
    /// Position of the next record to read
    cursor: Position,
    /// The reader's internal position equals `cursor` and it has not hit EOF
    in_sync: bool,
    /// The writer holds records not yet flushed to disk
    pending_writes: bool,
}

impl TabularFile {
    /// Open an existing file, taking field names from its first record
    ///
    /// # Errors
    ///
    /// - `FileNotFound` if the path does not exist
    /// - `IoError` if the file cannot be opened
    pub fn open(path: impl AsRef<Path>) -> Result<Self, TableError> {
        Self::open_with(path, TableOptions::default())
    }

    /// Open a file with explicit options
    ///
    /// The first physical record is consumed even when field names are
    /// supplied in `options`.
    pub fn open_with(path: impl AsRef<Path>, options: TableOptions) -> Result<Self, TableError> {
        let path = path.as_ref();

        if options.fresh {
            File::create(path).map_err(|e| TableError::io_at(path, e))?;
        } else if !path.exists() {
            return Err(TableError::file_not_found(path));
        }

        let file = File::open(path).map_err(|e| TableError::io_at(path, e))?;
        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .buffer_capacity(8 * 1024)
            .from_reader(file);

        let mut first = StringRecord::new();
        let has_first = reader.read_record(&mut first)?;

        let header = match options.field_names {
            Some(names) => Header::new(names),
            None => Header::new(first.iter()),
        };
        let cursor = reader.position().clone();

        let writer = if options.fresh {
            Some(open_writer(path)?)
        } else {
            None
        };

        debug!(
            path = %path.display(),
            fields = header.len(),
            fresh = options.fresh,
            "opened tabular file"
        );

        Ok(TabularFile {
            path: path.to_path_buf(),
            header: Arc::new(header),
            field_count: options.field_count,
            reader,
            writer,
            cursor,
            in_sync: has_first,
            pending_writes: false,
        })
    }

    /// Create a new file and write `field_names` as its first record
    ///
    /// Without a path the file is created in the system temp directory.
    /// The cursor is left at byte 0, so [`rewind`](TabularFile::rewind) before
    /// reading rows back.
    pub fn make<I, S>(field_names: I, path: Option<&Path>) -> Result<Self, TableError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = field_names.into_iter().map(Into::into).collect();

        let path = match path {
            Some(path) => path.to_path_buf(),
            None => tempfile::Builder::new()
                .prefix("csv.")
                .tempfile()?
                .into_temp_path()
                .keep()
                .map_err(|e| TableError::from(e.error))?,
        };

        let mut file = Self::open_with(
            &path,
            TableOptions::new().fresh(true).field_names(names.iter().cloned()),
        )?;
        file.add_values(&names)?;

        Ok(file)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn header(&self) -> &Arc<Header> {
        &self.header
    }

    /// Field names in order
    pub fn field_names(&self) -> Vec<String> {
        self.header.to_vec()
    }

    /// Current cursor position
    pub fn position(&self) -> &Position {
        &self.cursor
    }

    /// Save the cursor; it is restored when the returned guard drops
    pub fn bookmark(&mut self) -> Bookmark<'_> {
        Bookmark::new(self)
    }

    /// Move the cursor back to a previously observed position
    pub(crate) fn restore(&mut self, position: Position) {
        if position.byte() != self.cursor.byte() {
            self.in_sync = false;
        }
        self.cursor = position;
    }

    /// Move the cursor to the first data row
    ///
    /// Seeks to byte 0 and skips exactly one record.
    pub fn rewind(&mut self) -> Result<&mut Self, TableError> {
        self.restore(Position::new());
        self.in_sync = false;
        let mut skipped = ByteRecord::new();
        self.read_byte_record(&mut skipped)?;
        Ok(self)
    }

    /// Number of data rows
    ///
    /// Counts every record after the first without moving the cursor.
    pub fn row_count(&mut self) -> Result<usize, TableError> {
        let mut bookmark = self.bookmark();
        bookmark.rewind()?;

        let mut record = ByteRecord::new();
        let mut count = 0;
        while bookmark.read_byte_record(&mut record)? {
            count += 1;
        }

        Ok(count)
    }

    /// Lazy, forward-only sequence of rows starting at the cursor
    ///
    /// Each item advances the cursor. The sequence only restarts through an
    /// explicit [`rewind`](TabularFile::rewind).
    pub fn rows(&mut self) -> Rows<'_> {
        Rows { file: self }
    }

    /// Read the row at the cursor and advance past it
    ///
    /// Returns `Ok(None)` at end of data. A line whose field count does not
    /// match the header is returned as `Err(MalformedRow)` under the strict
    /// policy; the cursor moves past it either way.
    pub fn next_row(&mut self) -> Result<Option<Row>, TableError> {
        let mut record = StringRecord::new();
        if !self.read_string_record(&mut record)? {
            return Ok(None);
        }
        self.shape(record).map(Some)
    }

    /// Collect the rows selected by `predicate` into `sink`
    ///
    /// With [`Origin::Cursor`] the pass starts at the cursor and the cursor is
    /// restored afterwards. With [`Origin::Start`] the pass starts at the
    /// first data row and leaves the cursor at end of data. On error the
    /// cursor is always restored before the error is returned.
    pub fn filter_into<S, P>(
        &mut self,
        origin: Origin,
        sink: &mut S,
        predicate: P,
    ) -> Result<(), TableError>
    where
        S: RowSink + ?Sized,
        P: FnMut(&Row) -> Result<bool, TableError>,
    {
        let mut bookmark = self.bookmark();
        if origin == Origin::Start {
            bookmark.rewind()?;
        }

        bookmark.sweep(sink, predicate)?;

        if origin == Origin::Start {
            bookmark.release();
        }
        Ok(())
    }

    /// Rows selected by `predicate`, collected in memory
    pub fn filter<P>(&mut self, origin: Origin, predicate: P) -> Result<Vec<Row>, TableError>
    where
        P: FnMut(&Row) -> Result<bool, TableError>,
    {
        let mut rows = Vec::new();
        self.filter_into(origin, &mut rows, predicate)?;
        Ok(rows)
    }

    /// Rows selected by `predicate`, written to a new temporary file
    ///
    /// The new file has the same field names and field-count policy and is
    /// rewound before it is returned. It is deleted only by
    /// [`close`](TabularFile::close).
    pub fn materialize<P>(&mut self, origin: Origin, predicate: P) -> Result<TabularFile, TableError>
    where
        P: FnMut(&Row) -> Result<bool, TableError>,
    {
        let mut copy = TabularFile::make(self.field_names(), None)?;
        copy.field_count = self.field_count;

        if let Err(err) = self.filter_into(origin, &mut copy, predicate) {
            discard(copy);
            return Err(err);
        }

        copy.rewind()?;
        debug!(
            source = %self.path.display(),
            copy = %copy.path.display(),
            "materialized filtered rows"
        );
        Ok(copy)
    }

    /// Full pass from the first data row into `sink`, cursor restored after
    ///
    /// This is how a file is re-entered in the middle of an outer iteration.
    pub fn scan_into<S, P>(&mut self, sink: &mut S, predicate: P) -> Result<(), TableError>
    where
        S: RowSink + ?Sized,
        P: FnMut(&Row) -> Result<bool, TableError>,
    {
        let mut bookmark = self.bookmark();
        bookmark.filter_into(Origin::Start, sink, predicate)
    }

    /// Every row selected by `predicate`, cursor restored after
    pub fn scan<P>(&mut self, predicate: P) -> Result<Vec<Row>, TableError>
    where
        P: FnMut(&Row) -> Result<bool, TableError>,
    {
        let mut rows = Vec::new();
        self.scan_into(&mut rows, predicate)?;
        Ok(rows)
    }

    /// Like [`scan`](TabularFile::scan) but materialized into a new file
    pub fn scan_materialize<P>(&mut self, predicate: P) -> Result<TabularFile, TableError>
    where
        P: FnMut(&Row) -> Result<bool, TableError>,
    {
        let mut bookmark = self.bookmark();
        bookmark.materialize(Origin::Start, predicate)
    }

    /// Side-effecting sweep; always restores the cursor
    ///
    /// Returns the rows for which `predicate` held.
    pub fn each<P>(&mut self, origin: Origin, predicate: P) -> Result<Vec<Row>, TableError>
    where
        P: FnMut(&Row) -> Result<bool, TableError>,
    {
        let mut bookmark = self.bookmark();
        if origin == Origin::Start {
            bookmark.rewind()?;
        }

        let mut rows = Vec::new();
        bookmark.sweep(&mut rows, predicate)?;
        Ok(rows)
    }

    /// First row, from the start of data, for which `predicate` holds
    ///
    /// The cursor is restored when a row is found. When nothing matches the
    /// cursor is left at end of data.
    pub fn find<P>(&mut self, mut predicate: P) -> Result<Option<Row>, TableError>
    where
        P: FnMut(&Row) -> Result<bool, TableError>,
    {
        let mut bookmark = self.bookmark();
        bookmark.rewind()?;

        while let Some(row) = bookmark.next_clean_row()? {
            if predicate(&row)? {
                return Ok(Some(row));
            }
        }

        bookmark.release();
        Ok(None)
    }

    /// Append a row, values in this file's field order
    ///
    /// Fields the row lacks are written empty, including the trailing
    /// fields of a short row read under [`FieldCountPolicy::Lenient`].
    pub fn add_row(&mut self, row: &Row) -> Result<&mut Self, TableError> {
        let same_header =
            Arc::ptr_eq(row.header(), &self.header) || **row.header() == *self.header;
        if same_header && row.len() == self.header.len() {
            self.write_with(|writer| writer.write_record(row.record()))?;
            return Ok(self);
        }

        let values: Vec<&str> = self.header.names().map(|name| row.value(name)).collect();
        self.write_with(|writer| writer.write_record(&values))?;
        Ok(self)
    }

    /// Append raw values in order
    pub fn add_values<I, T>(&mut self, values: I) -> Result<&mut Self, TableError>
    where
        I: IntoIterator<Item = T>,
        T: AsRef<[u8]>,
    {
        self.write_with(|writer| writer.write_record(values))?;
        Ok(self)
    }

    /// Append a serde-serialized record
    pub fn add_record<T: Serialize>(&mut self, record: &T) -> Result<&mut Self, TableError> {
        self.write_with(|writer| writer.serialize(record))?;
        Ok(self)
    }

    /// Flush buffered writes to disk
    pub fn flush(&mut self) -> Result<(), TableError> {
        if let Some(writer) = self.writer.as_mut() {
            writer.flush().map_err(|e| TableError::io_at(&self.path, e))?;
        }
        self.pending_writes = false;
        Ok(())
    }

    /// Flush, release the handles and delete the file
    pub fn close(mut self) -> Result<(), TableError> {
        self.flush()?;
        let path = std::mem::take(&mut self.path);
        drop(self);

        fs::remove_file(&path).map_err(|e| TableError::io_at(&path, e))?;
        debug!(path = %path.display(), "closed and removed tabular file");
        Ok(())
    }

    /// Next row, skipping lines that only concern one row of data
    fn next_clean_row(&mut self) -> Result<Option<Row>, TableError> {
        loop {
            match self.next_row() {
                Err(err) if err.is_recoverable() => {
                    debug!(path = %self.path.display(), "skipping row: {}", err);
                }
                other => return other,
            }
        }
    }

    fn sweep<S, P>(&mut self, sink: &mut S, mut predicate: P) -> Result<(), TableError>
    where
        S: RowSink + ?Sized,
        P: FnMut(&Row) -> Result<bool, TableError>,
    {
        while let Some(row) = self.next_clean_row()? {
            if predicate(&row)? {
                sink.accept(row)?;
            }
        }
        Ok(())
    }

    fn shape(&self, mut record: StringRecord) -> Result<Row, TableError> {
        let expected = self.header.len();
        if record.len() != expected {
            match self.field_count {
                FieldCountPolicy::Strict => {
                    let line = record.position().map(|pos| pos.line()).unwrap_or_default();
                    return Err(TableError::malformed_row(line, expected, record.len()));
                }
                FieldCountPolicy::Lenient => record.truncate(expected),
            }
        }
        Ok(Row::new(Arc::clone(&self.header), record))
    }

    /// Flush pending writes and seek the reader to the cursor if needed
    fn prepare_read(&mut self) -> Result<(), TableError> {
        if self.pending_writes {
            self.flush()?;
            self.in_sync = false;
        }
        if !self.in_sync {
            // `seek` skips same-offset seeks without clearing the EOF state.
            self.reader
                .seek_raw(SeekFrom::Start(self.cursor.byte()), self.cursor.clone())?;
            self.in_sync = true;
        }
        Ok(())
    }

    fn read_string_record(&mut self, record: &mut StringRecord) -> Result<bool, TableError> {
        self.prepare_read()?;
        let read = self.reader.read_record(record);
        self.after_read(read)
    }

    fn read_byte_record(&mut self, record: &mut ByteRecord) -> Result<bool, TableError> {
        self.prepare_read()?;
        let read = self.reader.read_byte_record(record);
        self.after_read(read)
    }

    fn after_read(&mut self, read: csv::Result<bool>) -> Result<bool, TableError> {
        self.cursor = self.reader.position().clone();
        match read {
            Ok(true) => Ok(true),
            // The reader refuses further reads once it has seen EOF, so the
            // next read must seek even if rows were appended since.
            Ok(false) => {
                self.in_sync = false;
                Ok(false)
            }
            Err(err) => {
                self.in_sync = false;
                Err(err.into())
            }
        }
    }

    fn write_with<F>(&mut self, write: F) -> Result<(), TableError>
    where
        F: FnOnce(&mut csv::Writer<File>) -> csv::Result<()>,
    {
        let writer = match self.writer.take() {
            Some(writer) => writer,
            None => open_writer(&self.path)?,
        };
        let writer = self.writer.insert(writer);
        write(writer)?;
        self.pending_writes = true;
        Ok(())
    }
}

impl fmt::Debug for TabularFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TabularFile")
            .field("path", &self.path)
            .field("fields", &self.header.to_vec())
            .field("cursor", &self.cursor.byte())
            .field("field_count", &self.field_count)
            .finish()
    }
}

fn open_writer(path: &Path) -> Result<csv::Writer<File>, TableError> {
    let file = OpenOptions::new()
        .append(true)
        .open(path)
        .map_err(|e| TableError::io_at(path, e))?;

    Ok(WriterBuilder::new().has_headers(false).from_writer(file))
}

/// Close a temporary file on an error path, logging instead of failing
pub(crate) fn discard(file: TabularFile) {
    let path = file.path().to_path_buf();
    if let Err(err) = file.close() {
        tracing::warn!(path = %path.display(), "failed to remove temporary file: {}", err);
    }
}

/// Iterator returned by [`TabularFile::rows`]
///
/// Holds the file mutably; use [`Rows::file`] to re-enter it between items.
#[derive(Debug)]
pub struct Rows<'a> {
    file: &'a mut TabularFile,
}

impl Rows<'_> {
    /// The file being iterated
    ///
    /// Calls to `scan`, `each` and `find` through this reference do not
    /// change which row the iterator yields next.
    pub fn file(&mut self) -> &mut TabularFile {
        self.file
    }
}

impl Iterator for Rows<'_> {
    type Item = Result<Row, TableError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.file.next_row().transpose()
    }
}
