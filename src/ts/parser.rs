use crate::ts::errors::ParseError;
use crate::ts::node::Node;
use ast_grep_language::{LanguageExt, SupportLang};
use tree_sitter::{Parser, Tree};

/// Tree-sitter parser wrapper bound to one source language.
pub struct SourceParser {
    parser: Parser,
    language: SupportLang,
}

impl SourceParser {
    /// Create a parser for `language`.
    pub fn new(language: SupportLang) -> Result<Self, ParseError> {
        let mut parser = Parser::new();
        // Grammars come from ast-grep-language so both stay on one tree-sitter ABI
        let ts_lang = language.get_ts_language();
        parser
            .set_language(&ts_lang)
            .map_err(|_| ParseError::LanguageSet {
                language: format!("{language:?}"),
            })?;

        Ok(Self { parser, language })
    }

    pub fn language(&self) -> SupportLang {
        self.language
    }

    /// Parse `source`, rejecting trees that contain ERROR or MISSING nodes.
    pub fn parse<'a>(&mut self, source: &'a str) -> Result<ParsedSource<'a>, ParseError> {
        let parsed = self.parse_lenient(source)?;
        parsed.check_syntax()?;
        Ok(parsed)
    }

    /// Parse `source` and keep the tree even if it has syntax errors.
    pub fn parse_lenient<'a>(&mut self, source: &'a str) -> Result<ParsedSource<'a>, ParseError> {
        let tree = self
            .parser
            .parse(source, None)
            .ok_or(ParseError::ParseFailed)?;
        Ok(ParsedSource { source, tree })
    }
}

/// A parsed source buffer with its tree-sitter tree.
///
/// Every [`Node`] handed out borrows from this value, so node ranges can never
/// outlive the exact buffer they were computed against.
pub struct ParsedSource<'a> {
    pub source: &'a str,
    pub tree: Tree,
}

impl<'a> ParsedSource<'a> {
    /// Get the root node of the tree.
    pub fn root(&self) -> Node<'_> {
        Node::new(self.tree.root_node(), self.source)
    }

    /// Check if the tree contains any ERROR nodes.
    pub fn has_errors(&self) -> bool {
        has_error_nodes(self.tree.root_node())
    }

    /// Get all ERROR and MISSING nodes in the tree.
    pub fn error_nodes(&self) -> Vec<ErrorNode> {
        let mut errors = Vec::new();
        collect_error_nodes(self.tree.root_node(), &mut errors);
        errors
    }

    fn check_syntax(&self) -> Result<(), ParseError> {
        let errors = self.error_nodes();
        match errors.as_slice() {
            [] => Ok(()),
            [only] => Err(ParseError::SyntaxError {
                byte_start: only.byte_start,
                byte_end: only.byte_end,
            }),
            [first, ..] => Err(ParseError::MultipleSyntaxErrors {
                count: errors.len(),
                byte_start: first.byte_start,
                byte_end: first.byte_end,
            }),
        }
    }
}

/// Information about an ERROR node in the parse tree.
#[derive(Debug, Clone)]
pub struct ErrorNode {
    pub byte_start: usize,
    pub byte_end: usize,
    pub start_point: tree_sitter::Point,
    pub end_point: tree_sitter::Point,
}

fn has_error_nodes(node: tree_sitter::Node<'_>) -> bool {
    if node.is_error() || node.is_missing() {
        return true;
    }

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if has_error_nodes(child) {
            return true;
        }
    }

    false
}

fn collect_error_nodes(node: tree_sitter::Node<'_>, errors: &mut Vec<ErrorNode>) {
    if node.is_error() || node.is_missing() {
        errors.push(ErrorNode {
            byte_start: node.start_byte(),
            byte_end: node.end_byte(),
            start_point: node.start_position(),
            end_point: node.end_position(),
        });
    }

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        collect_error_nodes(child, errors);
    }
}
