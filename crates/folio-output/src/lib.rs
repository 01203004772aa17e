#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/folio/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod export;
pub mod tables;

pub use export::{ExportError, ExportFormat, Exporter, ResolutionRecord};
pub use tables::{ExtractOptions, ExtractedTable, extract_tables};
