//! Vendor point-naming conventions.

use std::collections::BTreeMap;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{BmsCheckError, Result};

/// Letter case a point name must follow.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Casing {
    /// No lowercase letters.
    Upper,
    /// No uppercase letters.
    Lower,
    /// Starts lowercase, no separators.
    Camel,
    /// Starts uppercase, no separators.
    Pascal,
    /// Anything goes.
    #[default]
    Any,
}

impl Casing {
    fn label(&self) -> &'static str {
        match self {
            Casing::Upper => "UPPER",
            Casing::Lower => "lower",
            Casing::Camel => "camelCase",
            Casing::Pascal => "PascalCase",
            Casing::Any => "any",
        }
    }

    fn accepts(&self, name: &str) -> bool {
        let has_separator = name.chars().any(|c| !c.is_alphanumeric());
        let first = name.chars().next();
        match self {
            Casing::Upper => !name.chars().any(|c| c.is_lowercase()),
            Casing::Lower => !name.chars().any(|c| c.is_uppercase()),
            Casing::Camel => !has_separator && first.is_some_and(|c| c.is_lowercase()),
            Casing::Pascal => !has_separator && first.is_some_and(|c| c.is_uppercase()),
            Casing::Any => true,
        }
    }
}

/// Naming convention for one BMS vendor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamingRule {
    /// Regex the whole point name must match.
    pub pattern: String,
    /// Token separator.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delimiter: Option<String>,
    /// Prefix every point name must start with.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_prefix: Option<String>,
    /// Accepted final tokens (empty = any).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub allowed_suffixes: Vec<String>,
    /// Required letter case.
    #[serde(default)]
    pub casing: Casing,
    /// Minimum number of delimiter-separated tokens.
    #[serde(default = "default_min_tokens")]
    pub min_tokens: usize,
    /// Short description shown in reports.
    #[serde(default)]
    pub description: String,
}

fn default_min_tokens() -> usize {
    1
}

impl NamingRule {
    /// Create a rule from a pattern.
    pub fn new(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            delimiter: None,
            required_prefix: None,
            allowed_suffixes: Vec::new(),
            casing: Casing::Any,
            min_tokens: 1,
            description: String::new(),
        }
    }

    /// Set the token delimiter and minimum token count.
    pub fn with_tokens(mut self, delimiter: impl Into<String>, min_tokens: usize) -> Self {
        self.delimiter = Some(delimiter.into());
        self.min_tokens = min_tokens;
        self
    }

    /// Set the casing.
    pub fn with_casing(mut self, casing: Casing) -> Self {
        self.casing = casing;
        self
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Conventions shipped with the engine, keyed by vendor.
    pub fn builtin() -> BTreeMap<String, NamingRule> {
        BTreeMap::from([
            (
                "haystack".to_string(),
                NamingRule::new(r"^[a-z][a-zA-Z0-9]*$")
                    .with_casing(Casing::Camel)
                    .with_description("Project Haystack camelCase point names"),
            ),
            (
                "metasys".to_string(),
                NamingRule::new(r"^[A-Z0-9-]+(\.[A-Z0-9-]+)+$")
                    .with_tokens(".", 2)
                    .with_casing(Casing::Upper)
                    .with_description("Johnson Controls Metasys dotted object references"),
            ),
            (
                "niagara".to_string(),
                NamingRule::new(r"^[A-Z][A-Z0-9]*(_[A-Z0-9]+)+$")
                    .with_tokens("_", 2)
                    .with_casing(Casing::Upper)
                    .with_description("Tridium Niagara EQUIP_POINT names"),
            ),
        ])
    }
}

/// A naming rule with its pattern compiled.
#[derive(Debug, Clone)]
pub struct CompiledNamingRule {
    /// Vendor key.
    pub vendor: String,
    /// The source rule.
    pub rule: NamingRule,
    regex: Regex,
}

impl CompiledNamingRule {
    /// Compile a vendor's rule.
    pub fn compile(vendor: &str, rule: &NamingRule) -> Result<Self> {
        let regex = Regex::new(&rule.pattern).map_err(|e| {
            BmsCheckError::Config(format!(
                "invalid naming pattern for vendor '{}': {}",
                vendor, e
            ))
        })?;
        Ok(Self {
            vendor: vendor.to_string(),
            rule: rule.clone(),
            regex,
        })
    }

    /// Check whether a point name passes every check.
    pub fn matches(&self, name: &str) -> bool {
        self.violations(name).is_empty()
    }

    /// Describe each check a point name fails.
    pub fn violations(&self, name: &str) -> Vec<String> {
        let rule = &self.rule;
        let mut failures = Vec::new();

        if !self.regex.is_match(name) {
            failures.push(format!("does not match pattern {}", rule.pattern));
        }

        if let Some(ref prefix) = rule.required_prefix {
            if !name.starts_with(prefix.as_str()) {
                failures.push(format!("missing required prefix '{}'", prefix));
            }
        }

        if !rule.casing.accepts(name) {
            failures.push(format!("is not {}", rule.casing.label()));
        }

        let tokens: Vec<&str> = match rule.delimiter.as_deref() {
            Some(delim) if !delim.is_empty() => {
                name.split(delim).filter(|t| !t.is_empty()).collect()
            }
            _ => vec![name],
        };

        if tokens.len() < rule.min_tokens {
            failures.push(format!(
                "has {} token(s), expected at least {}",
                tokens.len(),
                rule.min_tokens
            ));
        }

        if !rule.allowed_suffixes.is_empty() {
            let last = tokens.last().copied().unwrap_or_default();
            if !rule
                .allowed_suffixes
                .iter()
                .any(|s| s.eq_ignore_ascii_case(last))
            {
                failures.push(format!(
                    "suffix '{}' is not one of [{}]",
                    last,
                    rule.allowed_suffixes.join(", ")
                ));
            }
        }

        failures
    }
}
