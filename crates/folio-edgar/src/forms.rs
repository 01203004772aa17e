//! Deterministic form map.
//!
//! Structured EDGAR forms (ownership reports, Form D, Schedule 13D/G, ...) are
//! rendered by the SEC at a fixed XSL path inside every filing folder, so the
//! primary document can be named without looking at the folder at all.

use crate::filing::normalize_form_type;
use std::collections::BTreeMap;

const OWNERSHIP: &str = "xslF345X05/ownership.xml";
const SCHEDULE_13D: &str = "xslSCHEDULE_13D_X01/primary_doc.xml";
const SCHEDULE_13G: &str = "xslSCHEDULE_13G_X01/primary_doc.xml";
const FORM_D: &str = "xslFormDX01/primary_doc.xml";
const FORM_C: &str = "xslC_X01/primary_doc.xml";
const FORM_144: &str = "xsl144X01/primary_doc.xml";
const EFFECT: &str = "xslEFFECTX01/primary_doc.xml";
const REG_A: &str = "xsl1-A_X01/primary_doc.xml";
const REG_A_ANNUAL: &str = "xsl1-K_X01/primary_doc.xml";
const REG_A_EXIT: &str = "xsl1-Z_X01/primary_doc.xml";
const QUALIF: &str = "xslQUALIFX01/primary_doc.xml";

/// Built-in form type to relative path table.
pub const DEFAULT_FORM_PATHS: &[(&str, &str)] = &[
    ("3", OWNERSHIP),
    ("3/A", OWNERSHIP),
    ("4", OWNERSHIP),
    ("4/A", OWNERSHIP),
    ("5", OWNERSHIP),
    ("5/A", OWNERSHIP),
    ("SC 13D", SCHEDULE_13D),
    ("SC 13D/A", SCHEDULE_13D),
    ("SCHEDULE 13D", SCHEDULE_13D),
    ("SCHEDULE 13D/A", SCHEDULE_13D),
    ("SC 13G", SCHEDULE_13G),
    ("SC 13G/A", SCHEDULE_13G),
    ("SCHEDULE 13G", SCHEDULE_13G),
    ("SCHEDULE 13G/A", SCHEDULE_13G),
    ("D", FORM_D),
    ("D/A", FORM_D),
    ("C", FORM_C),
    ("C/A", FORM_C),
    ("C-U", FORM_C),
    ("C-U/A", FORM_C),
    ("C-AR", FORM_C),
    ("C-AR/A", FORM_C),
    ("C-TR", FORM_C),
    ("144", FORM_144),
    ("144/A", FORM_144),
    ("EFFECT", EFFECT),
    ("1-A", REG_A),
    ("1-A/A", REG_A),
    ("1-A POS", REG_A),
    ("1-K", REG_A_ANNUAL),
    ("1-Z", REG_A_EXIT),
    ("1-Z/A", REG_A_EXIT),
    ("QUALIF", QUALIF),
];

/// Mapping from normalized form type to a fixed path inside the filing folder.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormMap {
    paths: BTreeMap<String, String>,
}

impl FormMap {
    /// An empty map; every form falls through to the other strategies.
    pub fn empty() -> Self {
        Self::default()
    }

    /// The built-in table.
    pub fn with_defaults() -> Self {
        let mut map = Self::empty();
        for (form, path) in DEFAULT_FORM_PATHS {
            map.insert(form, path);
        }
        map
    }

    /// Add or replace the path for `form`.
    pub fn insert(&mut self, form: &str, path: &str) {
        self.paths
            .insert(normalize_form_type(form), path.trim_start_matches('/').to_string());
    }

    /// Merge `overrides` on top of this map.
    pub fn extend<'a>(&mut self, overrides: impl IntoIterator<Item = (&'a String, &'a String)>) {
        for (form, path) in overrides {
            self.insert(form, path);
        }
    }

    /// Relative path for `form`, if the form is deterministic.
    pub fn path_for(&self, form: &str) -> Option<&str> {
        self.paths
            .get(&normalize_form_type(form))
            .map(String::as_str)
    }

    /// Iterate over `(form, path)` pairs in form order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.paths.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of mapped forms.
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    /// Whether the map has no entries.
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}
