// Pcheckers — Credential Store
//
// Loads the fixed schema of `.mi` tables from one directory and checks the
// references between them. Loading is fail-fast; the consistency check runs
// after every successful load. A store that failed the check can still be
// inspected, but the resolver refuses it.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use super::models::{RankEntry, StoreSummary, TableSummary};
use super::{ConsistencyError, LoadError, TableKind};
use crate::table::KeyedTable;

/// Separator between the user and password references of an account.
pub const ACCOUNT_SEPARATOR: char = '=';

/// Leading char of an `info` value that exempts its key from the accounts check.
pub const NO_CHECK_MARKER: char = 'F';

/// Shown in place of a user reference missing from `users`.
pub const UNKNOWN_USER: &str = "?";

/// Schema of keyed tables read from one directory.
#[derive(Debug)]
pub struct CredentialStore {
    dir: PathBuf,
    tables: BTreeMap<TableKind, KeyedTable>,
    ranks: BTreeMap<String, RankEntry>,
    consistent: bool,
}

impl CredentialStore {
    /// Load every table under `dir` and run the consistency check.
    pub fn load(dir: &Path) -> Result<Self, LoadError> {
        let mut store = Self::open(dir)?;
        store.check_consistency()?;
        Ok(store)
    }

    /// Load and index every table under `dir` without cross-table checks.
    pub fn open(dir: &Path) -> Result<Self, LoadError> {
        let mut tables = BTreeMap::new();

        for kind in TableKind::ALL {
            let path = dir.join(kind.file_name());
            if !path.is_file() {
                if kind.is_optional() {
                    tracing::debug!(table = %kind, path = %path.display(), "Optional table absent");
                    continue;
                }
                return Err(LoadError::MissingTable { kind, path });
            }

            let table = KeyedTable::open(&path, kind.options()).map_err(|source| {
                LoadError::TableFailed {
                    kind,
                    path: path.clone(),
                    source,
                }
            })?;
            tracing::debug!(
                table = %kind,
                path = %path.display(),
                rows = table.rows().len(),
                header = ?table.header(),
                "Table indexed"
            );
            tables.insert(kind, table);
        }

        tracing::info!(dir = %dir.display(), tables = tables.len(), "Tables loaded");
        Ok(Self::from_tables(dir, tables))
    }

    /// Assemble a store from already indexed tables. The store is not
    /// consistent until [`CredentialStore::check_consistency`] succeeds.
    pub fn from_tables(dir: &Path, tables: BTreeMap<TableKind, KeyedTable>) -> Self {
        Self {
            dir: dir.to_path_buf(),
            tables,
            ranks: BTreeMap::new(),
            consistent: false,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn table(&self, kind: TableKind) -> Option<&KeyedTable> {
        self.tables.get(&kind)
    }

    /// Loaded kinds in display order.
    pub fn kinds(&self) -> impl Iterator<Item = TableKind> + '_ {
        self.tables.keys().copied()
    }

    pub fn is_consistent(&self) -> bool {
        self.consistent
    }

    /// Rank of an account title, with the description filled in.
    pub fn rank(&self, title: &str) -> Option<&RankEntry> {
        self.ranks.get(title)
    }

    /// Ranks of a consistent store, by title.
    pub fn ranks(&self) -> impl Iterator<Item = (&str, &RankEntry)> {
        self.ranks.iter().map(|(title, entry)| (title.as_str(), entry))
    }

    /// Re-read every table from disk and re-run the consistency check.
    /// Table headers must not change. Tables are swapped in only when every
    /// one of them re-reads cleanly; otherwise the store keeps its content.
    pub fn reload(&mut self) -> Result<(), LoadError> {
        self.consistent = false;
        let mut fresh = BTreeMap::new();
        for (kind, table) in &self.tables {
            let reread = table.reread().map_err(|source| LoadError::TableFailed {
                kind: *kind,
                path: table.origin().to_path_buf(),
                source,
            })?;
            fresh.insert(*kind, reread);
        }
        tracing::debug!(dir = %self.dir.display(), tables = fresh.len(), "Tables reloaded");
        self.tables = fresh;
        self.check_consistency()?;
        Ok(())
    }

    /// Verify the references between tables.
    ///
    /// A user reference missing from `users` or a password reference missing
    /// from `password-map` is tolerated and only reported in the log; the
    /// resolver shows such accounts with a placeholder.
    pub fn check_consistency(&mut self) -> Result<(), ConsistencyError> {
        self.consistent = false;
        let ranks = self.verify()?;
        self.ranks = ranks;
        self.consistent = true;
        tracing::debug!(dir = %self.dir.display(), "Consistency check passed");
        Ok(())
    }

    fn require(&self, kind: TableKind) -> Result<&KeyedTable, ConsistencyError> {
        self.table(kind).ok_or(ConsistencyError::MissingCoreTable(kind))
    }

    fn verify(&self) -> Result<BTreeMap<String, RankEntry>, ConsistencyError> {
        let users = self.require(TableKind::Users)?;
        let accounts = self.require(TableKind::Accounts)?;
        let pmap = self.require(TableKind::PasswordMap)?;

        for (title, value) in accounts.entries() {
            let (user_ref, pass_ref) = split_account(title, value)?;
            if pmap.lookup(pass_ref).is_none() {
                tracing::warn!(account = %title, pass_ref, "Account refers to an unknown password");
            }
            match users.lookup(user_ref) {
                Some(user) => {
                    tracing::debug!(account = %title, user_ref, user, pass_ref, "Account references resolved");
                }
                None => {
                    tracing::warn!(
                        account = %title,
                        user_ref,
                        shown = UNKNOWN_USER,
                        "Account refers to an unknown user"
                    );
                }
            }
        }

        let mut ranks = BTreeMap::new();
        if let Some(rank) = self.table(TableKind::Rank) {
            for (key, value) in rank.entries() {
                if accounts.lookup(key).is_none() {
                    return Err(ConsistencyError::DanglingReference {
                        table: TableKind::Rank,
                        key: key.to_string(),
                        target: TableKind::Accounts,
                        hint: case_hint(accounts, key),
                    });
                }
                ranks.insert(key.to_string(), parse_rank(key, value)?);
            }
        }

        if let Some(info) = self.table(TableKind::Info) {
            for (key, value) in info.entries() {
                if value.starts_with(NO_CHECK_MARKER) || accounts.lookup(key).is_some() {
                    continue;
                }
                return Err(ConsistencyError::DanglingReference {
                    table: TableKind::Info,
                    key: key.to_string(),
                    target: TableKind::Accounts,
                    hint: case_hint(accounts, key),
                });
            }
        }

        Ok(ranks)
    }

    /// Row counts of the loaded tables, core tables first.
    pub fn table_summary(&self) -> StoreSummary {
        StoreSummary(
            self.tables
                .iter()
                .map(|(kind, table)| TableSummary {
                    kind: *kind,
                    rows: table.rows().len(),
                })
                .collect(),
        )
    }

    /// Headers of the required tables, in display order.
    pub fn headers(&self) -> Vec<(TableKind, &[String])> {
        TableKind::REQUIRED
            .into_iter()
            .filter_map(|kind| self.table(kind).map(|t| (kind, t.header())))
            .collect()
    }

    /// Render one table for display. Values of kinds other than `info`
    /// must not contain `:`. Rank values show the description filled in by
    /// the consistency check.
    pub fn dump_table(&self, kind: TableKind) -> Result<Vec<String>, ConsistencyError> {
        let Some(table) = self.table(kind) else {
            return Ok(Vec::new());
        };

        if !kind.value_allows_punctuation() {
            if let Some((key, _)) = table.entries().find(|(_, v)| v.contains(':')) {
                return Err(ConsistencyError::ForbiddenValueChar {
                    table: kind,
                    key: key.to_string(),
                    ch: ':',
                });
            }
        }

        let lines = table
            .entries()
            .map(|(key, value)| match kind {
                TableKind::Accounts => format!("Account {key}: {value}"),
                TableKind::Rank => match (self.rank(key), value.split_once(ACCOUNT_SEPARATOR)) {
                    (Some(entry), Some((level, _))) => {
                        format!("Key ({kind}) {key}: {level}{ACCOUNT_SEPARATOR}{}", entry.description)
                    }
                    _ => format!("Key ({kind}) {key}: {value}"),
                },
                _ => format!("Key ({kind}) {key}: {value}"),
            })
            .collect();
        Ok(lines)
    }
}

/// Split an account value into `(user_ref, pass_ref)`.
pub fn split_account<'a>(title: &str, value: &'a str) -> Result<(&'a str, &'a str), ConsistencyError> {
    let mut parts = value.split(ACCOUNT_SEPARATOR);
    match (parts.next(), parts.next(), parts.next()) {
        (Some(user_ref), Some(pass_ref), None) => Ok((user_ref, pass_ref)),
        _ => Err(ConsistencyError::MalformedAccount {
            title: title.to_string(),
            value: value.to_string(),
        }),
    }
}

fn parse_rank(key: &str, value: &str) -> Result<RankEntry, ConsistencyError> {
    let level = value
        .chars()
        .next()
        .and_then(|c| c.to_digit(10))
        .ok_or_else(|| ConsistencyError::BadRank {
            key: key.to_string(),
            value: value.to_string(),
        })?;

    let description = match value.split_once(ACCOUNT_SEPARATOR) {
        Some((_, desc)) if !desc.is_empty() => desc.to_string(),
        // "1=" means the title doubles as the description.
        Some(_) => key.to_string(),
        None => value.to_string(),
    };

    Ok(RankEntry {
        level: level as u8,
        description,
    })
}

fn case_hint(accounts: &KeyedTable, key: &str) -> Option<String> {
    accounts
        .keys()
        .iter()
        .any(|k| k.eq_ignore_ascii_case(key))
        .then(|| "try fix-case".to_string())
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;
    use crate::table::FormatError;

    const ACCS: &str = "#title;user;pass\nalpha;u1;p1\n";
    const USERS: &str = "#user;name\nu1;Alice\n";
    const PMAP: &str = "#ref;password\np1;secret\n";
    const RANK: &str = "#title;rank;description\nalpha;1;Primary\n";

    fn write_tables(dir: &Path, tables: &[(&str, &str)]) {
        for (name, text) in tables {
            fs::write(dir.join(name), text).unwrap();
        }
    }

    fn fixture() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        write_tables(
            dir.path(),
            &[
                ("accs.mi", ACCS),
                ("users.mi", USERS),
                ("pmap.mi", PMAP),
                ("rank.mi", RANK),
            ],
        );
        dir
    }

    #[test]
    fn test_load_valid_store() {
        let dir = fixture();
        let store = CredentialStore::load(dir.path()).unwrap();
        assert!(store.is_consistent());
        assert_eq!(store.dir(), dir.path());
        assert_eq!(
            store.table(TableKind::Accounts).unwrap().lookup("alpha"),
            Some("u1=p1")
        );
        assert!(store.table(TableKind::Info).is_none());
        assert_eq!(
            store.rank("alpha"),
            Some(&RankEntry { level: 1, description: "Primary".to_string() })
        );
    }

    #[test]
    fn test_table_summary_order_and_display() {
        let dir = fixture();
        write_tables(dir.path(), &[("info.mi", "#title;text\nalpha;main mail\n")]);
        let store = CredentialStore::load(dir.path()).unwrap();

        let kinds: Vec<_> = store.table_summary().iter().map(|s| s.kind).collect();
        assert_eq!(kinds, TableKind::ALL.to_vec());
        assert_eq!(
            store.table_summary().to_string(),
            "accounts=#1;users=#1;password-map=#1;rank=#1;(info=#1)"
        );
    }

    #[test]
    fn test_headers_of_required_tables() {
        let dir = fixture();
        let store = CredentialStore::load(dir.path()).unwrap();
        let headers = store.headers();
        assert_eq!(headers.len(), 4);
        assert_eq!(headers[0], (TableKind::Accounts, &["title".to_string(), "user".to_string(), "pass".to_string()][..]));
    }

    #[test]
    fn test_missing_required_table() {
        let dir = fixture();
        fs::remove_file(dir.path().join("rank.mi")).unwrap();
        let err = CredentialStore::load(dir.path()).unwrap_err();
        assert!(matches!(err, LoadError::MissingTable { kind: TableKind::Rank, .. }));
    }

    #[test]
    fn test_table_failure_names_the_kind() {
        let dir = fixture();
        write_tables(dir.path(), &[("users.mi", "#user;name\nu1;Alice\nu1;Bob\n")]);
        let err = CredentialStore::load(dir.path()).unwrap_err();
        match err {
            LoadError::TableFailed { kind, source, .. } => {
                assert_eq!(kind, TableKind::Users);
                assert_eq!(source, FormatError::DuplicateKey("u1".to_string()));
            }
            other => panic!("Expected TableFailed, got {other:?}"),
        }
    }

    #[test]
    fn test_users_reject_duplicate_display_names() {
        let dir = fixture();
        write_tables(dir.path(), &[("users.mi", "#user;name\nu1;Alice\nu2;Alice\n")]);
        let err = CredentialStore::load(dir.path()).unwrap_err();
        assert!(matches!(
            err,
            LoadError::TableFailed { source: FormatError::DuplicateValue(_), .. }
        ));
    }

    #[test]
    fn test_shared_passwords_are_allowed() {
        let dir = fixture();
        write_tables(
            dir.path(),
            &[
                ("accs.mi", "#title;user;pass\nalpha;u1;p1\nbeta;u1;p2\n"),
                ("pmap.mi", "#ref;password\np1;same\np2;same\n"),
            ],
        );
        assert!(CredentialStore::load(dir.path()).is_ok());
    }

    #[test]
    fn test_missing_newline_in_any_table_fails_load() {
        let dir = fixture();
        write_tables(dir.path(), &[("pmap.mi", "#ref;password\np1;secret")]);
        let err = CredentialStore::load(dir.path()).unwrap_err();
        assert!(matches!(
            err,
            LoadError::TableFailed { kind: TableKind::PasswordMap, source: FormatError::BadTrailingNewline, .. }
        ));
    }

    #[test]
    fn test_rank_dangling_reference_names_rank() {
        let dir = fixture();
        write_tables(dir.path(), &[("rank.mi", "#title;rank;description\nghost;1;Nobody\n")]);
        let err = CredentialStore::load(dir.path()).unwrap_err();
        let LoadError::Inconsistent(err) = err else {
            panic!("Expected Inconsistent");
        };
        assert_eq!(
            err,
            ConsistencyError::DanglingReference {
                table: TableKind::Rank,
                key: "ghost".to_string(),
                target: TableKind::Accounts,
                hint: None,
            }
        );
        assert!(err.to_string().contains("'ghost' not in 'accounts'"));
    }

    #[test]
    fn test_rank_without_digit_fails() {
        let dir = fixture();
        write_tables(dir.path(), &[("rank.mi", "#title;rank;description\nalpha;x;Primary\n")]);
        let err = CredentialStore::load(dir.path()).unwrap_err();
        assert!(matches!(
            err,
            LoadError::Inconsistent(ConsistencyError::BadRank { .. })
        ));
    }

    #[test]
    fn test_rank_description_defaults_to_title() {
        let dir = fixture();
        write_tables(dir.path(), &[("rank.mi", "#title;rank;description\nalpha;0;\n")]);
        let store = CredentialStore::load(dir.path()).unwrap();
        let rank = store.rank("alpha").unwrap();
        assert_eq!(rank.description, "alpha");
        assert!(rank.is_disabled());
    }

    #[test]
    fn test_missing_password_ref_is_tolerated() {
        let dir = fixture();
        write_tables(dir.path(), &[("accs.mi", "#title;user;pass\nalpha;u1;p9\n")]);
        let store = CredentialStore::load(dir.path()).unwrap();
        assert!(store.is_consistent());
        assert_eq!(
            store.table(TableKind::Accounts).unwrap().lookup("alpha"),
            Some("u1=p9")
        );
    }

    #[test]
    fn test_missing_user_ref_is_tolerated() {
        let dir = fixture();
        write_tables(dir.path(), &[("accs.mi", "#title;user;pass\nalpha;u9;p1\n")]);
        let store = CredentialStore::load(dir.path()).unwrap();
        assert!(store.is_consistent());
    }

    #[test]
    fn test_malformed_account_is_an_error_not_a_panic() {
        let dir = fixture();
        write_tables(dir.path(), &[("accs.mi", "#title;user;pass;extra\nalpha;u1;p1;x\n")]);
        let err = CredentialStore::load(dir.path()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Inconsistent tables: Account 'alpha' must hold exactly 'user=pass', got 'u1=p1=x'"
        );
    }

    #[test]
    fn test_info_case_mismatch_hint() {
        let dir = fixture();
        write_tables(dir.path(), &[("info.mi", "#title;text\nAlpha;main mail\n")]);
        let err = CredentialStore::load(dir.path()).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("info: field key 'Alpha' not in 'accounts'"), "{message}");
        assert!(message.contains("try fix-case"), "{message}");
    }

    #[test]
    fn test_info_unknown_key_without_hint() {
        let dir = fixture();
        write_tables(dir.path(), &[("info.mi", "#title;text\nzulu;note\n")]);
        let err = CredentialStore::load(dir.path()).unwrap_err();
        assert!(!err.to_string().contains("fix-case"));
    }

    #[test]
    fn test_info_no_check_marker() {
        let dir = fixture();
        write_tables(dir.path(), &[("info.mi", "#title;text\nzulu;F: free note\n")]);
        assert!(CredentialStore::load(dir.path()).is_ok());
    }

    #[test]
    fn test_missing_core_table_in_assembled_store() {
        let dir = fixture();
        let mut tables = BTreeMap::new();
        let path = dir.path().join("accs.mi");
        tables.insert(
            TableKind::Accounts,
            KeyedTable::open(&path, TableKind::Accounts.options()).unwrap(),
        );
        let mut store = CredentialStore::from_tables(dir.path(), tables);
        assert_eq!(
            store.check_consistency(),
            Err(ConsistencyError::MissingCoreTable(TableKind::Users))
        );
        assert!(!store.is_consistent());
    }

    #[test]
    fn test_open_keeps_inconsistent_tables_inspectable() {
        let dir = fixture();
        write_tables(dir.path(), &[("rank.mi", "#title;rank;description\nghost;1;x\n")]);
        let mut store = CredentialStore::open(dir.path()).unwrap();
        assert!(store.check_consistency().is_err());
        assert!(!store.is_consistent());
        assert_eq!(store.table(TableKind::Rank).unwrap().keys(), ["ghost"]);
    }

    #[test]
    fn test_dump_table_lines() {
        let dir = fixture();
        let store = CredentialStore::load(dir.path()).unwrap();
        assert_eq!(
            store.dump_table(TableKind::Accounts).unwrap(),
            vec!["Account alpha: u1=p1"]
        );
        assert_eq!(
            store.dump_table(TableKind::Users).unwrap(),
            vec!["Key (users) u1: Alice"]
        );
        assert!(store.dump_table(TableKind::Info).unwrap().is_empty());
    }

    #[test]
    fn test_dump_rejects_colon_outside_info() {
        let dir = fixture();
        write_tables(
            dir.path(),
            &[
                ("users.mi", "#user;name\nu1;Alice: admin\n"),
                ("info.mi", "#title;text\nalpha;url: https://example.org\n"),
            ],
        );
        let store = CredentialStore::load(dir.path()).unwrap();
        assert!(matches!(
            store.dump_table(TableKind::Users),
            Err(ConsistencyError::ForbiddenValueChar { table: TableKind::Users, .. })
        ));
        assert_eq!(store.dump_table(TableKind::Info).unwrap().len(), 1);
    }

    #[test]
    fn test_dump_rank_shows_filled_in_description() {
        let dir = fixture();
        write_tables(
            dir.path(),
            &[
                ("accs.mi", "#title;user;pass\nalpha;u1;p1\nbeta;u1;p1\n"),
                ("rank.mi", "#title;rank;description\nalpha;0;\nbeta;2;Backup\n"),
            ],
        );
        let store = CredentialStore::load(dir.path()).unwrap();
        assert_eq!(
            store.dump_table(TableKind::Rank).unwrap(),
            vec!["Key (rank) alpha: 0=alpha", "Key (rank) beta: 2=Backup"]
        );
        let ranks: Vec<_> = store.ranks().map(|(title, entry)| (title, entry.level)).collect();
        assert_eq!(ranks, vec![("alpha", 0), ("beta", 2)]);
    }

    #[test]
    fn test_reload_keeps_every_table_when_one_fails() {
        let dir = fixture();
        let mut store = CredentialStore::load(dir.path()).unwrap();
        write_tables(
            dir.path(),
            &[
                ("accs.mi", "#title;user;pass\nalpha;u1;p1\nbeta;u1;p1\n"),
                ("users.mi", "#user;name\nu1;Alice"),
            ],
        );

        let err = store.reload().unwrap_err();
        assert!(matches!(
            err,
            LoadError::TableFailed { kind: TableKind::Users, source: FormatError::BadTrailingNewline, .. }
        ));
        assert_eq!(store.table(TableKind::Accounts).unwrap().keys(), ["alpha"]);
        assert!(!store.is_consistent());
    }

    #[test]
    fn test_reload_picks_up_new_rows() {
        let dir = fixture();
        let mut store = CredentialStore::load(dir.path()).unwrap();
        write_tables(dir.path(), &[("accs.mi", "#title;user;pass\nalpha;u1;p1\nbeta;u1;p1\n")]);
        store.reload().unwrap();
        assert!(store.is_consistent());
        assert_eq!(store.table(TableKind::Accounts).unwrap().keys(), ["alpha", "beta"]);
    }

    #[test]
    fn test_reload_rechecks_consistency() {
        let dir = fixture();
        let mut store = CredentialStore::load(dir.path()).unwrap();
        write_tables(dir.path(), &[("rank.mi", "#title;rank;description\nghost;1;x\n")]);
        assert!(matches!(store.reload(), Err(LoadError::Inconsistent(_))));
        assert!(!store.is_consistent());
    }

    #[test]
    fn test_split_account() {
        assert_eq!(split_account("t", "u=p").unwrap(), ("u", "p"));
        assert!(split_account("t", "up").is_err());
        assert!(split_account("t", "u=p=q").is_err());
    }
}
