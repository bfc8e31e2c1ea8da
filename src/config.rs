//! Configuration file handling.
//!
//! The configuration file is stored at `$CASHFLOW_HOME/config.json` and holds the vendor patterns
//! used to classify transactions, the list of vendors whose outgoing payments count as
//! investments, and backup settings. The ledger itself lives next to it at
//! `$CASHFLOW_HOME/processed_transactions.csv`.

use crate::backup::Backup;
use crate::classify::Classifier;
use crate::{utils, Result};
use anyhow::{bail, Context};
use serde::de::{Error as SerdeError, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashSet;
use std::fmt::Formatter;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const BACKUP_COPIES: u32 = 5;
const BACKUPS: &str = ".backups";
const CONFIG_JSON: &str = "config.json";
const LEDGER_CSV: &str = "processed_transactions.csv";

/// The `Config` object represents the configuration of the app. You instantiate it by providing
/// the path to `$CASHFLOW_HOME` and from there it loads `$CASHFLOW_HOME/config.json`. It provides
/// paths to the ledger and backups which are expected in a certain location within the home
/// directory.
#[derive(Debug, Clone)]
pub struct Config {
    root: PathBuf,
    backups: PathBuf,
    config_path: PathBuf,
    ledger_path: PathBuf,
    config_file: ConfigFile,
}

impl Config {
    /// Creates the home directory, its backups subdirectory, and a starter `config.json` with no
    /// vendor patterns.
    ///
    /// # Errors
    /// - Returns an error if any file operations fail.
    /// - Returns an error if `config.json` already exists, so that existing patterns are never
    ///   overwritten.
    pub fn create(dir: impl Into<PathBuf>) -> Result<Self> {
        let maybe_relative = dir.into();
        utils::make_dir(&maybe_relative).context("Unable to create the cashflow home directory")?;
        let root = utils::canonicalize(&maybe_relative)?;

        let backups = root.join(BACKUPS);
        utils::make_dir(&backups)?;

        let config_path = root.join(CONFIG_JSON);
        if config_path.exists() {
            bail!(
                "A config file already exists at '{}', refusing to overwrite it",
                config_path.display()
            )
        }
        let config_file = ConfigFile::default();
        config_file.save(&config_path)?;

        Ok(Self {
            ledger_path: root.join(LEDGER_CSV),
            root,
            backups,
            config_path,
            config_file,
        })
    }

    /// This will
    /// - validate that the home directory exists and that the config file exists
    /// - load the config file
    /// - make sure the backups directory exists
    /// - return the loaded configuration object
    pub fn load(home: impl Into<PathBuf>) -> Result<Self> {
        let maybe_relative = home.into();
        let root = utils::canonicalize(&maybe_relative).context("Cashflow home is missing")?;

        let config_path = root.join(CONFIG_JSON);
        if !config_path.is_file() {
            bail!("The config file is missing '{}'", config_path.display())
        }
        let config_file = ConfigFile::load(&config_path)?;

        let backups = root.join(BACKUPS);
        utils::make_dir(&backups)?;

        Ok(Self {
            ledger_path: root.join(LEDGER_CSV),
            root,
            backups,
            config_path,
            config_file,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn ledger_path(&self) -> &Path {
        &self.ledger_path
    }

    pub fn backups(&self) -> &Path {
        &self.backups
    }

    pub fn backup_copies(&self) -> u32 {
        self.config_file.backup_copies
    }

    pub fn patterns(&self) -> &VendorPatterns {
        &self.config_file.patterns_wf
    }

    pub fn investment_vendors(&self) -> &[String] {
        &self.config_file.cash_investments
    }

    /// Creates a new `Backup` instance for managing backup files.
    pub fn backup(&self) -> Backup {
        Backup::new(self)
    }

    /// Builds a `Classifier` from the configured patterns and investment vendors.
    pub fn classifier(&self) -> Classifier {
        Classifier::new(self.patterns(), self.investment_vendors().iter().cloned())
    }
}

/// Represents the serialization and deserialization format of the configuration file.
///
/// Example configuration:
/// ```json
/// {
///   "patterns_wf": {
///     "Vanguard": ["vanguard", "vgi"],
///     "Groceries": ["safeway", "trader joe"]
///   },
///   "cash_investments": ["Vanguard"],
///   "backup_copies": 5
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
struct ConfigFile {
    /// Vendor name -> substrings that identify the vendor in a transaction description.
    patterns_wf: VendorPatterns,

    /// Vendors whose outgoing payments are investments rather than spending.
    cash_investments: Vec<String>,

    /// Number of ledger backup copies to keep
    #[serde(default = "default_backup_copies")]
    backup_copies: u32,
}

fn default_backup_copies() -> u32 {
    BACKUP_COPIES
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            patterns_wf: VendorPatterns::default(),
            cash_investments: Vec::new(),
            backup_copies: BACKUP_COPIES,
        }
    }
}

impl ConfigFile {
    /// Loads a ConfigFile from the specified path.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed
    fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let config: ConfigFile = utils::deserialize(path)
            .with_context(|| format!("Failed to load config file at {}", path.display()))?;

        if config.patterns_wf.is_empty() {
            warn!(
                "'patterns_wf' is empty in {}, every transaction will be classified as 'Other'",
                path.display()
            );
        }
        if config.cash_investments.is_empty() {
            warn!(
                "'cash_investments' is empty in {}, no transaction will be classified as \
                cash_investments",
                path.display()
            );
        }
        for vendor in &config.cash_investments {
            if !config.patterns_wf.contains(vendor) {
                warn!("Investment vendor '{vendor}' has no entry in 'patterns_wf'");
            }
        }
        debug!(
            "Loaded {} vendor pattern(s) and {} investment vendor(s)",
            config.patterns_wf.len(),
            config.cash_investments.len()
        );
        Ok(config)
    }

    /// Saves the ConfigFile to the specified path.
    fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let p = path.as_ref();
        let data = serde_json::to_string_pretty(self).context("Unable to serialize config")?;
        utils::write(p, data).context("Unable to write config file")
    }
}

/// An ordered mapping of vendor name to the substrings that identify that vendor.
///
/// The order of entries is the order they appear in the configuration file, and it matters: when a
/// description matches patterns of more than one vendor, the vendor listed first wins.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct VendorPatterns(Vec<(String, Vec<String>)>);

impl VendorPatterns {
    pub fn new<V, P, I>(entries: impl IntoIterator<Item = (V, I)>) -> Self
    where
        V: Into<String>,
        P: Into<String>,
        I: IntoIterator<Item = P>,
    {
        Self(
            entries
                .into_iter()
                .map(|(v, p)| (v.into(), p.into_iter().map(|s| s.into()).collect()))
                .collect(),
        )
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, vendor: &str) -> bool {
        self.0.iter().any(|(v, _)| v == vendor)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.0.iter().map(|(v, p)| (v.as_str(), p.as_slice()))
    }
}

impl Serialize for VendorPatterns {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (vendor, patterns) in &self.0 {
            map.serialize_entry(vendor, patterns)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for VendorPatterns {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_map(VendorPatternsVisitor)
    }
}

struct VendorPatternsVisitor;

impl<'de> Visitor<'de> for VendorPatternsVisitor {
    type Value = VendorPatterns;

    fn expecting(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str("a map of vendor name to a list of description substrings")
    }

    fn visit_map<A>(self, mut map: A) -> std::result::Result<Self::Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut seen = HashSet::new();
        let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
        while let Some(vendor) = map.next_key::<String>()? {
            if !seen.insert(vendor.clone()) {
                return Err(A::Error::custom(format!(
                    "vendor '{vendor}' appears more than once in patterns_wf"
                )));
            }
            let patterns: Vec<String> = map.next_value()?;
            entries.push((vendor, patterns));
        }
        Ok(VendorPatterns(entries))
    }
}
