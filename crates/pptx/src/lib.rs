//! OOXML backend for the template applicator.
//!
//! Works on `.pptx` packages directly: applies a template's masters and
//! layouts, reassigns slide layouts, and inspects or fills decks.

pub mod edit;
pub mod error;
pub mod fill;
pub mod host;
pub mod inspect;
pub mod opc;
pub mod package;
pub mod presentation;
pub mod template;
mod xml;

#[cfg(test)]
mod testing;

pub use error::{PptxError, Result};
pub use fill::{fill_file, parse_sections, FillReport, Section};
pub use host::{PptxDocument, PptxHost};
pub use inspect::{inspect, Inspection, SlideSummary};
pub use package::Package;
pub use template::apply_template;
