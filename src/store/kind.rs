// Pcheckers — Table kinds
//
// The fixed credential schema. Each kind states its file name and the exact
// parsing policy of its table; nothing is inferred from the file contents.

use std::fmt;

use serde::Serialize;

use crate::table::{ReversePolicy, SplitMode, TableOptions};

/// Keys of users and password references: no blanks, separators or globs.
const STRICT_KEY_BLACKLIST: &str = " :!?$*()=";

/// Account titles are free-form apart from the query mark.
const TITLE_KEY_BLACKLIST: &str = "?";

/// Role of a table in the credential schema.
///
/// The declaration order is the display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum TableKind {
    /// `title → user_ref=pass_ref`
    Accounts,
    /// `user_ref → display name`
    Users,
    /// `pass_ref → plaintext password`
    PasswordMap,
    /// `title → digit=description`; 0 disables, 1 is the highest rank.
    Rank,
    /// `title → free text` (optional table)
    Info,
}

impl TableKind {
    pub const ALL: [TableKind; 5] = [
        TableKind::Accounts,
        TableKind::Users,
        TableKind::PasswordMap,
        TableKind::Rank,
        TableKind::Info,
    ];

    /// Tables that must exist on disk.
    pub const REQUIRED: [TableKind; 4] = [
        TableKind::Accounts,
        TableKind::Users,
        TableKind::PasswordMap,
        TableKind::Rank,
    ];

    pub fn name(self) -> &'static str {
        match self {
            TableKind::Accounts => "accounts",
            TableKind::Users => "users",
            TableKind::PasswordMap => "password-map",
            TableKind::Rank => "rank",
            TableKind::Info => "info",
        }
    }

    /// Human title used in verbose dumps.
    pub fn title(self) -> &'static str {
        match self {
            TableKind::Accounts => "Accounts",
            TableKind::Users => "Users",
            TableKind::PasswordMap => "Password-map",
            TableKind::Rank => "Account rank",
            TableKind::Info => "Information",
        }
    }

    pub fn file_name(self) -> &'static str {
        match self {
            TableKind::Accounts => "accs.mi",
            TableKind::Users => "users.mi",
            TableKind::PasswordMap => "pmap.mi",
            TableKind::Rank => "rank.mi",
            TableKind::Info => "info.mi",
        }
    }

    pub fn is_optional(self) -> bool {
        matches!(self, TableKind::Info)
    }

    /// Free-text values may contain `:`; other kinds refuse it when dumped.
    pub fn value_allows_punctuation(self) -> bool {
        matches!(self, TableKind::Info)
    }

    /// Parsing policy for this kind.
    pub fn options(self) -> TableOptions {
        let base = TableOptions::default();
        match self {
            TableKind::Accounts | TableKind::Rank => base
                .with_join("=")
                .with_key_blacklist(TITLE_KEY_BLACKLIST),
            TableKind::Users => base
                .with_join("=")
                .with_reverse(ReversePolicy::Unique)
                .with_key_blacklist(STRICT_KEY_BLACKLIST),
            TableKind::PasswordMap => base
                .with_join("")
                .with_split(SplitMode::FirstDelimiter)
                .with_key_blacklist(STRICT_KEY_BLACKLIST),
            TableKind::Info => base.with_join(";").with_key_blacklist(TITLE_KEY_BLACKLIST),
        }
    }
}

impl fmt::Display for TableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
