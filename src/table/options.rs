// Pcheckers — Table parsing options
//
// Every knob that changes how a table is split, indexed and checked lives
// here, so that each table kind states its policy explicitly.

/// Ordering applied to the primary keys once a table is indexed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortPolicy {
    /// Lexical, ignoring case (ties keep their file order).
    #[default]
    CaseInsensitive,
    /// Plain lexical order.
    CaseSensitive,
    /// File order.
    Unsorted,
}

/// How composite values map back to keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReversePolicy {
    /// Each value belongs to exactly one key; duplicates are rejected.
    Unique,
    /// Values may repeat; all owning keys are kept in file order.
    #[default]
    Accumulate,
}

/// How a data row is cut into cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SplitMode {
    /// Split on every delimiter; the cell count must equal the header length.
    #[default]
    EveryDelimiter,
    /// Split on the first delimiter only, yielding `(key, value)`.
    FirstDelimiter,
}

/// Parsing and validation options for one table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableOptions {
    pub delimiter: char,
    /// Separator used to join the non-key cells into the composite value.
    pub value_join: String,
    pub split: SplitMode,
    pub reverse: ReversePolicy,
    pub sort: SortPolicy,
    /// Characters forbidden in the key, on top of the printable-ASCII rule.
    pub key_blacklist: String,
}

impl Default for TableOptions {
    fn default() -> Self {
        Self {
            delimiter: ';',
            value_join: ";".to_string(),
            split: SplitMode::EveryDelimiter,
            reverse: ReversePolicy::Accumulate,
            sort: SortPolicy::CaseInsensitive,
            key_blacklist: String::new(),
        }
    }
}

impl TableOptions {
    pub fn with_join(mut self, join: &str) -> Self {
        self.value_join = join.to_string();
        self
    }

    pub fn with_split(mut self, split: SplitMode) -> Self {
        self.split = split;
        self
    }

    pub fn with_reverse(mut self, reverse: ReversePolicy) -> Self {
        self.reverse = reverse;
        self
    }

    pub fn with_sort(mut self, sort: SortPolicy) -> Self {
        self.sort = sort;
        self
    }

    pub fn with_key_blacklist(mut self, chars: &str) -> Self {
        self.key_blacklist = chars.to_string();
        self
    }

    pub fn value_unique(&self) -> bool {
        self.reverse == ReversePolicy::Unique
    }
}
