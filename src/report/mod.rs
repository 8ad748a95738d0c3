//! Printable report generation.
//!
//! Templates are stored as opaque JSON in settings and parsed into a typed
//! component tree only at render time ([`template`]). [`data`] joins a sample
//! with the catalog into per-page result rows, and [`render`] turns both into
//! self-contained print HTML.

pub mod data;
pub mod render;
pub mod template;

pub use data::{build_pages, ReportData, ReportPage, ResultRow};
pub use render::{render_report, render_slip};
pub use template::{parse_template, ComponentKind, ParsedTemplate, ReportStyles, TemplateComponent};
