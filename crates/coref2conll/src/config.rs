use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use conll_coref::{CorefOptions, MarkableFilter};
use conll_types::{Column, OnMissing, SentenceFilter, UnknownColumn};
use conll_writer::{MIN_COLUMN_SPACING, WriterConfig};
use coref_reader::{LoadMode, ReaderOptions, SENTENCE_START_NUMBER};
use serde::Deserialize;
use serde_yaml::Value;
use thiserror::Error;

/// Key under `conll_defaults` and `on_missing` that configures the document ID.
pub const DOCUMENT_ID_KEY: &str = "document_id";
pub const DEFAULT_DOCUMENT_ID: &str = "UNKNOWN";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("unknown CoNLL column {0:?} in `{1}`")]
    UnknownColumn(String, &'static str),
    #[error("default for {0:?} must be a string, number or boolean")]
    InvalidDefault(String),
}

/// Settings read from a YAML file. Every key is optional.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub validate: bool,
    pub uniqueyfy: bool,
    pub fill_non_consecutive_spans: bool,
    pub sentence_filter: SentenceFilter,
    pub conll_columns: Vec<Column>,
    /// Per-column defaults, plus `document_id`.
    pub conll_defaults: BTreeMap<String, Value>,
    /// Per-column missing-value policies, plus `document_id`.
    pub on_missing: BTreeMap<String, OnMissing>,
    pub min_column_spacing: usize,
    pub allow_overwriting: bool,
    pub log_on_error: bool,
    pub input_extension: String,
    pub conll_extension: String,
    pub dirs_to_ignore: Vec<String>,
    pub load_mode: LoadMode,
    pub sentence_start_number: u32,
    /// MMAX markable levels that take part in chains; empty keeps all.
    pub coref_level_filter: Vec<String>,
    /// MMAX markable types that take part in chains; empty keeps all.
    pub coref_type_filter: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            validate: true,
            uniqueyfy: false,
            fill_non_consecutive_spans: false,
            sentence_filter: SentenceFilter::None,
            conll_columns: WriterConfig::default().columns,
            conll_defaults: BTreeMap::new(),
            on_missing: BTreeMap::new(),
            min_column_spacing: MIN_COLUMN_SPACING,
            allow_overwriting: false,
            log_on_error: true,
            input_extension: ".json".into(),
            conll_extension: ".conll".into(),
            dirs_to_ignore: Vec::new(),
            load_mode: LoadMode::Mmap,
            sentence_start_number: SENTENCE_START_NUMBER,
            coref_level_filter: Vec::new(),
            coref_type_filter: Vec::new(),
        }
    }
}

impl Config {
    /// Read a YAML configuration file and check that its CoNLL keys are valid.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("read configuration {}", path.display()))?;
        Self::from_yaml(&text).with_context(|| format!("configuration {}", path.display()))
    }

    pub fn from_yaml(text: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(text)?;
        config.writer_config()?;
        Ok(config)
    }

    pub fn coref_options(&self) -> CorefOptions {
        CorefOptions {
            validate: self.validate,
            uniqueyfy: self.uniqueyfy,
            fill_spans: self.fill_non_consecutive_spans,
        }
    }

    pub fn reader_options(&self) -> ReaderOptions {
        ReaderOptions {
            validate: self.validate,
            sentence_start_number: self.sentence_start_number,
            markable_filter: MarkableFilter {
                levels: self.coref_level_filter.clone(),
                types: self.coref_type_filter.clone(),
            },
        }
    }

    pub fn writer_config(&self) -> Result<WriterConfig, ConfigError> {
        let mut defaults = HashMap::new();
        for (key, value) in &self.conll_defaults {
            if key == DOCUMENT_ID_KEY {
                continue;
            }
            let column = parse_column(key, "conll_defaults")?;
            defaults.insert(column, value_text(key, value)?);
        }

        let mut on_missing = HashMap::new();
        for (key, policy) in &self.on_missing {
            if key == DOCUMENT_ID_KEY {
                continue;
            }
            on_missing.insert(parse_column(key, "on_missing")?, *policy);
        }

        Ok(WriterConfig {
            columns: self.conll_columns.clone(),
            defaults,
            on_missing,
            min_column_spacing: self.min_column_spacing,
        })
    }

    /// ID written for documents without one.
    pub fn document_id_default(&self) -> String {
        self.conll_defaults
            .get(DOCUMENT_ID_KEY)
            .and_then(|v| value_text(DOCUMENT_ID_KEY, v).ok())
            .unwrap_or_else(|| DEFAULT_DOCUMENT_ID.to_string())
    }

    /// What to do when no document ID can be found; fails by default.
    pub fn document_id_on_missing(&self) -> OnMissing {
        self.on_missing
            .get(DOCUMENT_ID_KEY)
            .copied()
            .unwrap_or(OnMissing::Throw)
    }
}

fn parse_column(key: &str, section: &'static str) -> Result<Column, ConfigError> {
    key.parse()
        .map_err(|UnknownColumn(name)| ConfigError::UnknownColumn(name, section))
}

fn value_text(key: &str, value: &Value) -> Result<String, ConfigError> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Null => Ok(String::new()),
        _ => Err(ConfigError::InvalidDefault(key.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let config = Config::from_yaml("{}").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.coref_options(), CorefOptions::default());
        assert_eq!(config.writer_config().unwrap(), WriterConfig::default());
        assert_eq!(config.document_id_default(), "UNKNOWN");
        assert_eq!(config.document_id_on_missing(), OnMissing::Throw);
    }

    #[test]
    fn reads_all_sections() {
        let config = Config::from_yaml(
            r#"
validate: false
fill_non_consecutive_spans: true
sentence_filter: has_problem
conll_columns: [part_number, word_number, word, POS, coref]
conll_defaults:
  document_id: anonymous
  part_number: 0
  POS: "-"
on_missing:
  document_id: warn
  POS: warn
min_column_spacing: 1
load_mode: owned
coref_level_filter: [coref]
"#,
        )
        .unwrap();

        assert_eq!(config.sentence_filter, SentenceFilter::HasProblem);
        assert_eq!(config.load_mode, LoadMode::Owned);
        assert_eq!(config.document_id_default(), "anonymous");
        assert_eq!(config.document_id_on_missing(), OnMissing::Warn);
        assert!(config.coref_options().fill_spans);
        assert_eq!(config.reader_options().markable_filter.levels, vec!["coref"]);

        let writer = config.writer_config().unwrap();
        assert_eq!(writer.columns.len(), 5);
        assert_eq!(writer.columns[3], Column::Pos);
        assert_eq!(writer.default_for(Column::PartNumber), "0");
        assert_eq!(writer.default_for(Column::Pos), "-");
        assert_eq!(writer.on_missing_for(Column::Pos), OnMissing::Warn);
        assert_eq!(writer.min_column_spacing, 1);
    }

    #[test]
    fn unknown_columns_are_rejected() {
        let err = Config::from_yaml("conll_columns: [word, lemma]").unwrap_err();
        assert!(err.to_string().contains("lemma"));

        let err = Config::from_yaml("on_missing:\n  lemma: warn").unwrap_err();
        assert_eq!(
            err.downcast_ref::<ConfigError>(),
            Some(&ConfigError::UnknownColumn("lemma".into(), "on_missing"))
        );
    }
}
