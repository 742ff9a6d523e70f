// Pcheckers — Credential resolution
//
// Narrows the accounts table with a user filter. The verbatim filter is
// tried first; when it matches nothing, the original filter is retried with
// each separator (`.`, blank, `-`, `_`, in that order) replaced by a blank.
// The first attempt with at least one match wins.

use std::collections::BTreeMap;
use std::iter;

use super::models::{PasswordExposure, Resolution, ResolveOptions, ResolvedCredential};
use super::ResolutionError;
use crate::store::{split_account, CredentialStore, TableKind, UNKNOWN_USER};
use crate::table::KeyedTable;

/// Separators loosened to a blank, in attempt order.
pub const SEPARATORS: [char; 4] = ['.', ' ', '-', '_'];

/// Filter prefix asking for a substring match anywhere in the title.
pub const SUBSTRING_MARKER: char = '@';

/// Prefix of the reference shown when a password is missing.
pub const MISSING_PASSWORD_MARKER: char = '*';

struct SchemaView<'a> {
    accounts: &'a KeyedTable,
    users: &'a KeyedTable,
    pmap: &'a KeyedTable,
}

impl<'a> SchemaView<'a> {
    fn of(store: &'a CredentialStore) -> Result<Self, ResolutionError> {
        let get = |kind: TableKind| store.table(kind).ok_or(ResolutionError::SchemaIncomplete(kind));
        Ok(Self {
            accounts: get(TableKind::Accounts)?,
            users: get(TableKind::Users)?,
            pmap: get(TableKind::PasswordMap)?,
        })
    }

    /// Accounts whose title matches `filter`, in account order.
    fn matching(
        &self,
        filter: &str,
        options: &ResolveOptions,
    ) -> Result<Vec<ResolvedCredential>, ResolutionError> {
        let mut found = Vec::new();
        for (title, value) in self.accounts.entries() {
            if !title_matches(title, filter) {
                continue;
            }
            let (user_ref, pass_ref) = split_account(title, value)?;
            let username = self.users.lookup(user_ref).unwrap_or(UNKNOWN_USER);
            found.push(ResolvedCredential::new(
                title.to_string(),
                username.to_string(),
                render_password(self.pmap, pass_ref, options.exposure),
            ));
        }
        Ok(found)
    }
}

/// Resolve `filter` against the accounts of a consistent store.
///
/// An absent or empty filter selects every account.
pub fn resolve(
    store: &CredentialStore,
    filter: Option<&str>,
    options: &ResolveOptions,
) -> Result<Resolution, ResolutionError> {
    let view = SchemaView::of(store)?;
    if !store.is_consistent() {
        return Err(ResolutionError::InconsistentStore);
    }

    let filter = filter.unwrap_or_default();
    let mut attempts = BTreeMap::new();
    if filter.is_empty() {
        return Ok(Resolution {
            matches: view.matching("", options)?,
            attempts,
        });
    }

    let candidates = iter::once(filter.to_string())
        .chain(SEPARATORS.iter().map(|&sep| filter.replace(sep, " ")));

    for (idx, candidate) in (1..).zip(candidates) {
        if attempts.contains_key(&candidate) {
            continue;
        }
        let mut found = view.matching(&candidate, options)?;
        tracing::debug!(attempt = idx, filter = %candidate, matches = found.len(), "Resolution attempt");
        attempts.insert(candidate, idx);

        if !found.is_empty() {
            if options.prefer_single_exact {
                narrow_to_exact(&mut found, filter);
            }
            return Ok(Resolution {
                matches: found,
                attempts,
            });
        }
        if !options.loosen {
            break;
        }
    }

    Ok(Resolution {
        matches: Vec::new(),
        attempts,
    })
}

/// Case-insensitive: the title starts with the filter, or the filter is
/// `@text` and the title contains `text`.
pub fn title_matches(title: &str, filter: &str) -> bool {
    let title = title.to_ascii_uppercase();
    let filter = filter.to_ascii_uppercase();
    if title.starts_with(&filter) {
        return true;
    }
    match filter.strip_prefix(SUBSTRING_MARKER) {
        Some(part) => title.contains(part),
        None => false,
    }
}

fn narrow_to_exact(found: &mut Vec<ResolvedCredential>, filter: &str) {
    if found.len() < 2 {
        return;
    }
    let mut exact = found.iter().filter(|c| c.title.eq_ignore_ascii_case(filter));
    if let (Some(single), None) = (exact.next(), exact.next()) {
        let single = single.clone();
        found.clear();
        found.push(single);
    }
}

fn render_password(pmap: &KeyedTable, pass_ref: &str, exposure: PasswordExposure) -> String {
    match (pmap.lookup(pass_ref), exposure) {
        (None, _) => format!("{MISSING_PASSWORD_MARKER}{pass_ref}"),
        (Some(plain), PasswordExposure::Plain) => plain.to_string(),
        (Some(_), PasswordExposure::Reference) => pass_ref.to_string(),
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
