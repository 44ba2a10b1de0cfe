//! Per-column cleaning rules.
//!
//! A [`ColumnRules`] map is the configuration surface of the cleaning pipeline. Keys are
//! column names; they are normalized on insert with the same rules as dataset columns (see
//! [`crate::cleaning::names::normalize_name`]), so `"Unit Price"` and `"unit_price"` address
//! the same column.
//!
//! Rules can be built in code or loaded from JSON:
//!
//! ```rust
//! use rust_data_cleaning::rules::{ColumnRules, NullStrategy, TargetType};
//!
//! let rules = ColumnRules::from_json_str(
//!     r#"{ "Unit Price": { "type": "numeric", "null_strategy": "mean" } }"#,
//! )
//! .unwrap();
//! let rule = rules.get("unit_price").unwrap();
//! assert_eq!(rule.target_type, Some(TargetType::Numeric));
//! assert_eq!(rule.null_strategy, Some(NullStrategy::Mean));
//! ```
//!
//! Absence of a rule means: auto-detect the type, title-case text, fill nulls with
//! [`NullStrategy::PLACEHOLDER`].

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::cleaning::names::normalize_name;
use crate::error::{EngineError, EngineResult};

/// Semantic type a column is coerced to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetType {
    /// Integer or floating point.
    Numeric,
    /// Calendar timestamp.
    Date,
    /// Stringify every present value.
    Text,
}

/// Casing policy applied by the text normalizer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Casing {
    Upper,
    Lower,
    /// Capitalize the first letter of each word.
    #[default]
    Title,
}

/// How missing cells of a column are resolved.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NullStrategy {
    /// Fill with `0` (`"0"` for text columns).
    Zero,
    /// Fill with the mean of present values. Numeric columns only.
    Mean,
    /// Fill with the median of present values. Numeric columns only.
    Median,
    /// Fill with the first most frequent present value.
    Mode,
    /// Propagate the nearest preceding present value.
    #[serde(rename = "ffill", alias = "forward_fill")]
    ForwardFill,
    /// Leave missing cells untouched.
    Keep,
    /// Fill with [`NullStrategy::PLACEHOLDER`].
    #[default]
    #[serde(rename = "unknown", alias = "default")]
    Placeholder,
}

impl NullStrategy {
    /// Literal written by [`NullStrategy::Placeholder`].
    pub const PLACEHOLDER: &'static str = "Unknown";

    /// Strategies that compute a statistic and therefore need a numeric column.
    pub fn requires_numeric(self) -> bool {
        matches!(self, Self::Mean | Self::Median)
    }
}

impl FromStr for TargetType {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "numeric" => Ok(Self::Numeric),
            "date" => Ok(Self::Date),
            "text" => Ok(Self::Text),
            _ => Err(EngineError::UnknownVariant {
                kind: "target type",
                value: s.to_string(),
            }),
        }
    }
}

impl FromStr for Casing {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "upper" => Ok(Self::Upper),
            "lower" => Ok(Self::Lower),
            "title" => Ok(Self::Title),
            _ => Err(EngineError::UnknownVariant {
                kind: "casing",
                value: s.to_string(),
            }),
        }
    }
}

impl FromStr for NullStrategy {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "zero" => Ok(Self::Zero),
            "mean" => Ok(Self::Mean),
            "median" => Ok(Self::Median),
            "mode" => Ok(Self::Mode),
            "ffill" | "forward_fill" => Ok(Self::ForwardFill),
            "keep" => Ok(Self::Keep),
            "unknown" | "default" => Ok(Self::Placeholder),
            _ => Err(EngineError::UnknownVariant {
                kind: "null strategy",
                value: s.to_string(),
            }),
        }
    }
}

/// Cleaning configuration for a single column.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ColumnRule {
    /// Explicit target type; `None` means auto-detect.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub target_type: Option<TargetType>,
    /// Casing for textual columns; `None` means [`Casing::Title`].
    #[serde(alias = "case", default, skip_serializing_if = "Option::is_none")]
    pub casing: Option<Casing>,
    /// Null strategy; `None` means [`NullStrategy::Placeholder`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub null_strategy: Option<NullStrategy>,
    /// Exclude the column from all automatic cleaning.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub skip_cleaning: bool,
}

impl ColumnRule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_type(mut self, target_type: TargetType) -> Self {
        self.target_type = Some(target_type);
        self
    }

    pub fn with_casing(mut self, casing: Casing) -> Self {
        self.casing = Some(casing);
        self
    }

    pub fn with_null_strategy(mut self, strategy: NullStrategy) -> Self {
        self.null_strategy = Some(strategy);
        self
    }

    pub fn skipped(mut self) -> Self {
        self.skip_cleaning = true;
        self
    }
}

/// Rule map keyed by normalized column name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ColumnRules {
    rules: BTreeMap<String, ColumnRule>,
}

impl ColumnRules {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert (or replace) the rule for `column`. The key is normalized first.
    pub fn insert(&mut self, column: &str, rule: ColumnRule) -> &mut Self {
        self.rules.insert(normalize_name(column), rule);
        self
    }

    /// Builder-style [`ColumnRules::insert`].
    pub fn with(mut self, column: &str, rule: ColumnRule) -> Self {
        self.insert(column, rule);
        self
    }

    /// Rule for a normalized column name.
    pub fn get(&self, column: &str) -> Option<&ColumnRule> {
        self.rules.get(column)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ColumnRule)> {
        self.rules.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Parse a JSON object of `column -> rule`.
    ///
    /// Unknown strategy or type names are rejected here rather than silently ignored.
    pub fn from_json_str(input: &str) -> EngineResult<Self> {
        let raw: BTreeMap<String, ColumnRule> = serde_json::from_str(input)?;
        let mut rules = Self::new();
        for (column, rule) in raw {
            rules.insert(&column, rule);
        }
        Ok(rules)
    }

    /// Load rules from a JSON file.
    pub fn from_json_path(path: impl AsRef<Path>) -> EngineResult<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Reject rule combinations that can never be applied, before any data is touched.
    ///
    /// Statistical null strategies need a numeric column, so pairing them with an explicit
    /// `date`/`text` type is an error. `zero` cannot fill a date column.
    pub fn validate(&self) -> EngineResult<()> {
        for (column, rule) in &self.rules {
            let (Some(target), Some(strategy)) = (rule.target_type, rule.null_strategy) else {
                continue;
            };
            let conflict = match target {
                TargetType::Numeric => false,
                TargetType::Text => strategy.requires_numeric(),
                TargetType::Date => strategy.requires_numeric() || strategy == NullStrategy::Zero,
            };
            if conflict {
                return Err(EngineError::InvalidRule {
                    column: column.clone(),
                    message: format!("null strategy {strategy:?} cannot be applied to a {target:?} column"),
                });
            }
        }
        Ok(())
    }
}
