// Pcheckers — Store data models

use std::fmt;

use serde::Serialize;

use super::TableKind;

/// Row count of one loaded table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableSummary {
    pub kind: TableKind,
    pub rows: usize,
}

/// Ordered per-table row counts, core tables first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct StoreSummary(pub Vec<TableSummary>);

impl StoreSummary {
    pub fn iter(&self) -> impl Iterator<Item = &TableSummary> {
        self.0.iter()
    }
}

/// Compact form: `accounts=#3;users=#2;password-map=#2;rank=#1;(info=#1)`.
impl fmt::Display for StoreSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (optional, core): (Vec<_>, Vec<_>) = self.0.iter().partition(|s| s.kind.is_optional());
        let core: Vec<String> = core.iter().map(|s| format!("{}=#{}", s.kind, s.rows)).collect();
        write!(f, "{}", core.join(";"))?;
        if !optional.is_empty() {
            let extra: Vec<String> = optional
                .iter()
                .map(|s| format!("{}=#{}", s.kind, s.rows))
                .collect();
            write!(f, ";({})", extra.join(";"))?;
        }
        Ok(())
    }
}

/// Parsed `rank` value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankEntry {
    /// 0 disables the account; 1 is the highest rank, 9 the lowest.
    pub level: u8,
    pub description: String,
}

impl RankEntry {
    pub fn is_disabled(&self) -> bool {
        self.level == 0
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
