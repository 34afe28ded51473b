//! Streaming XML writer library for Rust.
//!
//! This crate emits well-formed XML incrementally to an output sink (a
//! file, optionally gzip-compressed, or an in-memory buffer) without
//! building a document tree. A single stateful [`XmlWriter`] tracks the
//! open-element stack and the active section mode and serializes every
//! call directly, buffering only what correctness requires: the `>` of a
//! start tag is held back until content or the end tag decides between
//! `<name>...</name>` and the self-closing `<name/>` form.
//!
//! # Features
//!
//! - **Sequential call surface**: start/end pairs for elements,
//!   attributes, comments, CDATA sections, processing instructions, and
//!   DTD declarations, with `write_*` one-shot helpers.
//! - **Structural enforcement**: mismatched end calls and conflicting
//!   sections are reported as errors instead of producing broken markup.
//! - **Namespace scoping**: prefix bindings are tracked per element,
//!   deduplicated against enclosing scopes, and shadowable in subtrees.
//! - **Formatting control**: switchable indentation, configurable indent
//!   string and attribute quote character.
//!
//! # Quick Start
//!
//! ```rust
//! use xmlwriter_rs::XmlWriter;
//!
//! let mut writer = XmlWriter::to_memory();
//! writer.start_document(None, Some("UTF-8"), None)?;
//! writer.start_element("library")?;
//! writer.start_element("book")?;
//! writer.write_attribute("isbn", "978-0-0000-0000-0")?;
//! writer.write_element("title", Some("Writing <XML> by hand"))?;
//! writer.end_document()?;
//!
//! let xml = String::from_utf8(writer.into_inner()?).unwrap();
//! assert!(xml.contains("Writing &lt;XML&gt; by hand"));
//! # Ok::<(), xmlwriter_rs::Error>(())
//! ```
//!
//! # Writing to a file
//!
//! ```rust,no_run
//! use xmlwriter_rs::XmlWriter;
//!
//! // gzip-compressed file sink
//! let mut writer = XmlWriter::to_path("report.xml.gz", true)?;
//! writer.start_document(None, Some("UTF-8"), None)?;
//! writer.write_element("report", Some("done"))?;
//! writer.end_document()?;
//! # Ok::<(), xmlwriter_rs::Error>(())
//! ```
//!
//! # Module Structure
//!
//! - [`writer`] - The streaming writer state machine
//! - [`sink`] - File-backed byte sinks
//! - [`escape`] - Text and attribute-value escaping
//! - [`encoding`] - Charset-name resolution for the XML declaration
//! - [`error`] - Error types

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod encoding;
pub mod error;
pub mod escape;
pub mod sink;
pub mod writer;

// Re-export commonly used types at the crate root
pub use error::{Error, Result};
pub use sink::Sink;
pub use writer::XmlWriter;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
