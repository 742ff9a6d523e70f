// Pcheckers — Keyed text table
//
// One `.mi` file: a `#` header line naming the fields, then one record per
// line. The first field is the primary key; the remaining fields are joined
// into a composite value. Indexing builds the forward map, the reverse map
// and the ordered key list in one O(n) pass and caches the outcome.

use std::cell::OnceCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use super::options::{ReversePolicy, SortPolicy, SplitMode, TableOptions};
use super::source::{check_trailing_newline, read_latin1};
use super::FormatError;

/// Marker that opens the header line.
pub const HEADER_MARKER: char = '#';

/// Value → key(s) index, shaped by the table's [`ReversePolicy`].
#[derive(Debug)]
enum ReverseIndex {
    Unique(HashMap<String, String>),
    Accumulate(HashMap<String, Vec<String>>),
}

#[derive(Debug)]
struct KeyIndex {
    values: HashMap<String, String>,
    reverse: ReverseIndex,
    ordered: Vec<String>,
}

/// A validated key → composite-value table backed by a text file.
#[derive(Debug)]
pub struct KeyedTable {
    origin: PathBuf,
    options: TableOptions,
    header: Vec<String>,
    rows: Vec<String>,
    index: OnceCell<Result<KeyIndex, FormatError>>,
}

impl KeyedTable {
    /// Read `path` and build a fully indexed table.
    pub fn open(path: &Path, options: TableOptions) -> Result<Self, FormatError> {
        let text = read_latin1(path)?;
        Self::parse(path, &text, options)
    }

    /// Build a fully indexed table from raw text; any defect is returned.
    pub fn parse(origin: &Path, text: &str, options: TableOptions) -> Result<Self, FormatError> {
        let table = Self::from_text(origin, text, options)?;
        table.validate()?;
        Ok(table)
    }

    /// Split the text into header and rows without indexing. Indexing runs
    /// lazily on first access, or explicitly through [`KeyedTable::validate`].
    pub fn from_text(origin: &Path, text: &str, options: TableOptions) -> Result<Self, FormatError> {
        check_trailing_newline(text)?;

        let mut lines = text.lines();
        let head = lines.next().unwrap_or_default();
        let header = parse_header(head, options.delimiter)?;
        let rows: Vec<String> = lines.map(str::to_string).collect();

        Ok(Self {
            origin: origin.to_path_buf(),
            options,
            header,
            rows,
            index: OnceCell::new(),
        })
    }

    pub fn origin(&self) -> &Path {
        &self.origin
    }

    pub fn options(&self) -> &TableOptions {
        &self.options
    }

    pub fn header(&self) -> &[String] {
        &self.header
    }

    /// Raw data lines (header excluded).
    pub fn rows(&self) -> &[String] {
        &self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Index the table if it has not been indexed yet and report the outcome.
    /// The result is cached; calling this again does not re-scan the rows.
    pub fn validate(&self) -> Result<(), FormatError> {
        self.index().map(|_| ()).map_err(Clone::clone)
    }

    /// Primary keys in policy order; empty when the table fails to index.
    pub fn keys(&self) -> &[String] {
        match self.index() {
            Ok(index) => &index.ordered,
            Err(_) => &[],
        }
    }

    /// Number of indexed keys.
    pub fn len(&self) -> usize {
        self.keys().len()
    }

    pub fn lookup(&self, key: &str) -> Option<&str> {
        self.index().ok()?.values.get(key).map(String::as_str)
    }

    /// Key owning `value`; only meaningful for value-unique tables.
    pub fn reverse_lookup(&self, value: &str) -> Option<&str> {
        match &self.index().ok()?.reverse {
            ReverseIndex::Unique(map) => map.get(value).map(String::as_str),
            ReverseIndex::Accumulate(_) => None,
        }
    }

    /// Every key whose composite value equals `value`, in file order.
    pub fn reverse_lookup_all(&self, value: &str) -> Vec<&str> {
        let Ok(index) = self.index() else {
            return Vec::new();
        };
        match &index.reverse {
            ReverseIndex::Unique(map) => map.get(value).map(String::as_str).into_iter().collect(),
            ReverseIndex::Accumulate(map) => map
                .get(value)
                .map(|keys| keys.iter().map(String::as_str).collect())
                .unwrap_or_default(),
        }
    }

    /// `(key, value)` pairs in key order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.keys()
            .iter()
            .filter_map(move |k| self.lookup(k).map(|v| (k.as_str(), v)))
    }

    /// Re-read the origin file into a new indexed table with the same
    /// options. The header must be unchanged. `self` is left untouched.
    pub fn reread(&self) -> Result<KeyedTable, FormatError> {
        let text = read_latin1(&self.origin)?;
        let fresh = Self::from_text(&self.origin, &text, self.options.clone())?;
        if fresh.header != self.header {
            return Err(FormatError::HeaderChanged {
                previous: self.header.clone(),
                current: fresh.header,
            });
        }
        fresh.validate()?;
        Ok(fresh)
    }

    /// Re-read the origin file in place; on any failure the current content
    /// is kept.
    pub fn reload(&mut self) -> Result<(), FormatError> {
        let fresh = self.reread()?;
        tracing::debug!(origin = %self.origin.display(), rows = fresh.rows.len(), "Table reloaded");
        *self = fresh;
        Ok(())
    }

    fn index(&self) -> Result<&KeyIndex, &FormatError> {
        self.index
            .get_or_init(|| build_index(&self.header, &self.rows, &self.options))
            .as_ref()
    }
}

fn parse_header(head: &str, delimiter: char) -> Result<Vec<String>, FormatError> {
    let fields = head
        .strip_prefix(HEADER_MARKER)
        .ok_or(FormatError::MissingHeader)?;
    Ok(fields.trim().split(delimiter).map(str::to_string).collect())
}

fn build_index(
    header: &[String],
    rows: &[String],
    options: &TableOptions,
) -> Result<KeyIndex, FormatError> {
    let mut values: HashMap<String, String> = HashMap::with_capacity(rows.len());
    let mut reverse = match options.reverse {
        ReversePolicy::Unique => ReverseIndex::Unique(HashMap::new()),
        ReversePolicy::Accumulate => ReverseIndex::Accumulate(HashMap::new()),
    };
    let mut ordered = Vec::with_capacity(rows.len());

    // Line 1 is the header.
    for (line, row) in (2..).zip(rows) {
        let cells = split_row(row, line, header.len(), options)?;
        if cells.iter().any(|c| *c != c.trim()) {
            return Err(FormatError::Untrimmed { line });
        }

        let key = cells[0];
        if key.is_empty() {
            return Err(FormatError::EmptyKey { line });
        }
        let value = cells[1..].join(&options.value_join);

        if values.contains_key(key) {
            return Err(FormatError::DuplicateKey(key.to_string()));
        }
        check_key_chars(key, &options.key_blacklist)?;
        check_value_chars(key, &value)?;

        match &mut reverse {
            ReverseIndex::Unique(map) => {
                if map.contains_key(&value) {
                    return Err(FormatError::DuplicateValue(value));
                }
                map.insert(value.clone(), key.to_string());
            }
            ReverseIndex::Accumulate(map) => {
                map.entry(value.clone()).or_default().push(key.to_string());
            }
        }

        tracing::trace!(line, key, "Row indexed");
        values.insert(key.to_string(), value);
        ordered.push(key.to_string());
    }

    match options.sort {
        SortPolicy::CaseInsensitive => ordered.sort_by_cached_key(|k| k.to_ascii_lowercase()),
        SortPolicy::CaseSensitive => ordered.sort(),
        SortPolicy::Unsorted => {}
    }

    debug_assert_eq!(ordered.len(), values.len());
    Ok(KeyIndex {
        values,
        reverse,
        ordered,
    })
}

fn split_row<'a>(
    row: &'a str,
    line: usize,
    expected: usize,
    options: &TableOptions,
) -> Result<Vec<&'a str>, FormatError> {
    let cells: Vec<&str> = match options.split {
        SplitMode::FirstDelimiter => match row.split_once(options.delimiter) {
            Some((key, value)) => vec![key, value],
            None => vec![row],
        },
        SplitMode::EveryDelimiter => row.split(options.delimiter).collect(),
    };
    if cells.len() != expected {
        return Err(FormatError::FieldCountMismatch {
            line,
            expected,
            actual: cells.len(),
        });
    }
    Ok(cells)
}

fn is_printable_ascii(c: char) -> bool {
    (' '..='~').contains(&c)
}

fn check_key_chars(key: &str, blacklist: &str) -> Result<(), FormatError> {
    match key
        .chars()
        .find(|&c| blacklist.contains(c) || !is_printable_ascii(c))
    {
        Some(c) => Err(FormatError::InvalidCharacter {
            key: key.to_string(),
            codepoint: c as u32,
        }),
        None => Ok(()),
    }
}

fn check_value_chars(key: &str, value: &str) -> Result<(), FormatError> {
    match value.chars().find(|&c| !is_printable_ascii(c)) {
        Some(c) => Err(FormatError::InvalidCharacter {
            key: key.to_string(),
            codepoint: c as u32,
        }),
        None => Ok(()),
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
