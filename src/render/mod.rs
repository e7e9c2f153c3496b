//! Template rendering.
//!
//! A template document is rendered in two ordered passes: `${file(...)}`
//! inclusions first, then `${variable}` substitutions against the
//! flattened parameter set. Both passes share one explicit scanner that
//! classifies the document into literal, inclusion, and variable spans,
//! so a file marker is never misread as a variable, a variable never
//! bleeds into a neighboring marker, and unresolved markers pass through
//! verbatim.

mod renderer;
mod scanner;

pub use renderer::{substitute, TemplateRenderer};
pub use scanner::{scan, Span};
