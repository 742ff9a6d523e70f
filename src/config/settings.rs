// Pcheckers — Settings file
//
// `$HOME/.config/pcheckers/config`, one statement per line:
//
//   # comment
//   NAME=value        set (overwrites)
//   NAME+=value       append to a list
//   NAME              boolean flag
//
// `$HOME/` in values is replaced by the home directory and backslashes
// become slashes. Any other `$` reference is an error. When the file does
// not exist the built-in defaults apply.

use std::collections::BTreeMap;
use std::fmt;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use super::ConfigError;

/// Settings file location, relative to the home directory.
pub const CONFIG_REL_PATH: &str = ".config/pcheckers/config";

/// Statements used when no settings file exists.
pub const DEFAULT_CONFIG: &[&str] = &["key_abs_path=$HOME/pdir"];

/// Setting holding the default tables directory.
pub const KEY_ABS_PATH: &str = "key_abs_path";

/// A setting's value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigValue {
    Text(String),
    List(Vec<String>),
    Flag,
}

impl fmt::Display for ConfigValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigValue::Text(s) => f.write_str(&safe_string(s)),
            ConfigValue::List(items) => {
                let shown: Vec<String> = items.iter().map(|s| safe_string(s)).collect();
                write!(f, "[{}]", shown.join(", "))
            }
            ConfigValue::Flag => f.write_str("true"),
        }
    }
}

/// Parsed and substituted settings.
#[derive(Debug, Clone)]
pub struct Settings {
    path: PathBuf,
    from_file: bool,
    values: BTreeMap<String, ConfigValue>,
}

impl Settings {
    /// Read the settings of the current user.
    pub fn load() -> Result<Self, ConfigError> {
        let home = dirs_next::home_dir().ok_or(ConfigError::NoHome)?;
        Self::load_from_home(&home)
    }

    /// Read the settings below an explicit home directory.
    pub fn load_from_home(home: &Path) -> Result<Self, ConfigError> {
        let path = home.join(CONFIG_REL_PATH);
        let (raw, from_file) = match std::fs::read_to_string(&path) {
            Ok(text) => (parse_statements(text.lines())?, true),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No settings file, using defaults");
                (parse_statements(DEFAULT_CONFIG.iter().copied())?, false)
            }
            Err(source) => return Err(ConfigError::Io { path, source }),
        };

        let home_str = home.to_string_lossy().replace('\\', "/");
        let mut values = BTreeMap::new();
        for (name, value) in raw {
            let value = match value {
                ConfigValue::Text(s) => ConfigValue::Text(substitute(&name, &s, &home_str)?),
                ConfigValue::List(items) => ConfigValue::List(
                    items
                        .iter()
                        .map(|s| substitute(&name, s, &home_str))
                        .collect::<Result<_, _>>()?,
                ),
                ConfigValue::Flag => ConfigValue::Flag,
            };
            values.insert(name, value);
        }

        Ok(Self {
            path,
            from_file,
            values,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// True when the values came from the settings file rather than defaults.
    pub fn exists(&self) -> bool {
        self.from_file
    }

    pub fn get(&self, name: &str) -> Option<&ConfigValue> {
        self.values.get(name)
    }

    /// Text value of `name`; lists and flags yield `None`.
    pub fn get_str(&self, name: &str) -> Option<&str> {
        match self.values.get(name)? {
            ConfigValue::Text(s) => Some(s),
            ConfigValue::List(_) | ConfigValue::Flag => None,
        }
    }

    /// Settings sorted by name, ignoring case.
    pub fn entries(&self) -> Vec<(&str, &ConfigValue)> {
        let mut entries: Vec<_> = self.values.iter().map(|(k, v)| (k.as_str(), v)).collect();
        entries.sort_by_cached_key(|(k, _)| k.to_lowercase());
        entries
    }

    /// `name: value` lines for display, escaped.
    pub fn render(&self) -> String {
        self.entries()
            .iter()
            .map(|(k, v)| format!("{k}: {v}\n"))
            .collect()
    }
}

fn parse_statements<'a>(
    lines: impl Iterator<Item = &'a str>,
) -> Result<BTreeMap<String, ConfigValue>, ConfigError> {
    let mut conf: BTreeMap<String, ConfigValue> = BTreeMap::new();

    for line in lines.map(str::trim) {
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some((lhs, rhs)) = line.split_once('=') else {
            if conf.insert(line.to_string(), ConfigValue::Flag).is_some() {
                return Err(ConfigError::DuplicateFlag(line.to_string()));
            }
            continue;
        };

        let lhs = lhs.trim();
        let value = rhs.trim().to_string();
        let Some(name) = lhs.strip_suffix('+') else {
            conf.insert(lhs.to_string(), ConfigValue::Text(value));
            continue;
        };

        let name = name.trim().to_string();
        let appended = match conf.remove(&name) {
            None => ConfigValue::List(vec![value]),
            Some(ConfigValue::Text(prev)) => ConfigValue::List(vec![prev, value]),
            Some(ConfigValue::List(mut items)) => {
                items.push(value);
                ConfigValue::List(items)
            }
            Some(ConfigValue::Flag) => return Err(ConfigError::FlagAppend(name)),
        };
        conf.insert(name, appended);
    }
    Ok(conf)
}

fn substitute(name: &str, value: &str, home: &str) -> Result<String, ConfigError> {
    let out = value.replace("$HOME/", &format!("{home}/")).replace('\\', "/");
    if out.contains('$') {
        return Err(ConfigError::UnknownVariable {
            name: name.to_string(),
            value: value.to_string(),
        });
    }
    Ok(out)
}

/// Printable rendering of arbitrary text: controls, non-ASCII and `\` are
/// shown as `\xx` hex; newlines are kept; the empty string is `''`.
pub fn safe_string(text: &str) -> String {
    if text.is_empty() {
        return "''".to_string();
    }
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if c == '\n' {
            out.push(c);
        } else if c < ' ' || c > '~' || c == '\\' {
            out.push_str(&format!("\\{:02x}", c as u32));
        } else {
            out.push(c);
        }
    }
    out
}

// ─── Tests ───────────────────────────────────────────────────────────────────
