//! Filename-pattern rules.
//!
//! Many filers name their primary document the same way every period
//! (`acme-10k_2024.htm`, `acme-10q_q3.htm`), which is a stronger signal than
//! EDGAR's declared document type. Which names count is filer-specific
//! knowledge, so no rules are built in: callers supply an ordered list of
//! regular expressions per form type, compiled once at construction.

use crate::error::{ResolveError, Result};
use crate::filing::normalize_form_type;
use regex::Regex;
use std::collections::{BTreeMap, HashMap};

/// Compiled filename rules per form type.
#[derive(Debug, Clone, Default)]
pub struct FilenamePatterns {
    rules: HashMap<String, Vec<Regex>>,
}

impl FilenamePatterns {
    /// No rules at all.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Compile a configured `form -> patterns` map. Forms with an empty list get no rules.
    pub fn from_map(map: &BTreeMap<String, Vec<String>>) -> Result<Self> {
        let mut patterns = Self::empty();
        for (form, rules) in map {
            patterns.set(form, rules.iter().map(String::as_str))?;
        }
        Ok(patterns)
    }

    /// Replace the rule list for `form`. An empty list removes the form.
    pub fn set<'a>(&mut self, form: &str, rules: impl IntoIterator<Item = &'a str>) -> Result<()> {
        let form = normalize_form_type(form);
        let compiled = rules
            .into_iter()
            .map(|pattern| {
                Regex::new(pattern).map_err(|source| ResolveError::InvalidPattern {
                    form: form.clone(),
                    pattern: pattern.to_string(),
                    source,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        if compiled.is_empty() {
            self.rules.remove(&form);
        } else {
            self.rules.insert(form, compiled);
        }
        Ok(())
    }

    /// Rules registered for `form`, if any.
    pub fn rules_for(&self, form: &str) -> Option<&[Regex]> {
        self.rules
            .get(&normalize_form_type(form))
            .map(Vec::as_slice)
    }

    /// First item, in input order, whose name matches any rule for `form`.
    pub fn first_match<'a, T>(
        &self,
        form: &str,
        items: &'a [T],
        name: impl Fn(&T) -> &str,
    ) -> Option<&'a T> {
        let rules = self.rules_for(form)?;
        items
            .iter()
            .find(|&item| rules.iter().any(|rule| rule.is_match(name(item))))
    }

    /// Rule sources grouped by form, sorted by form.
    pub fn describe(&self) -> BTreeMap<&str, Vec<&str>> {
        self.rules
            .iter()
            .map(|(form, rules)| (form.as_str(), rules.iter().map(Regex::as_str).collect()))
            .collect()
    }
}
