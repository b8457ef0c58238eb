//! Tree-sitter backed node query facet.
//!
//! Parsing turns a source buffer into a [`ParsedSource`]; rule callbacks and
//! patterns only ever see the read-only [`Node`] view of it.

pub mod errors;
pub mod node;
pub mod parser;

pub use errors::ParseError;
pub use node::Node;
pub use parser::{ErrorNode, ParsedSource, SourceParser};
