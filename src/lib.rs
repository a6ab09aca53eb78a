#![allow(clippy::module_inception)]

use std::{fs, io, path::Path};

use colored::Colorize;

use crate::{
    ast::ast::Node,
    errors::errors::{Error, ErrorTip},
    lexer::lexer::tokenize,
    parser::parser::parse,
};

pub mod ast;
pub mod compiler;
pub mod errors;
pub mod lexer;
pub mod macros;
pub mod parser;
pub mod scope;
pub mod type_checker;
pub mod visitor;

/// A program's text together with the name diagnostics refer to it by.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub name: String,
    pub contents: String,
}

impl SourceFile {
    pub fn new(name: impl Into<String>, contents: impl Into<String>) -> Self {
        SourceFile {
            name: name.into(),
            contents: contents.into(),
        }
    }

    pub fn read(path: &Path) -> io::Result<Self> {
        let contents = fs::read_to_string(path)?;
        Ok(SourceFile::new(path.display().to_string(), contents))
    }

    /// Text of the 1-based line `line`, without its line break.
    pub fn line_text(&self, line: u32) -> Option<&str> {
        let index = (line as usize).checked_sub(1)?;
        self.contents.lines().nth(index)
    }

    /// Lexes and parses the whole file into its root block.
    pub fn parse(&self) -> Result<Node, Error> {
        parse(tokenize(&self.contents)?)
    }
}

/// Renders an error as `ERR: <message>` followed, when the file and line are
/// known, by `<file> line <n>: <source line>`.
pub fn format_diagnostic(error: &Error, file: Option<&SourceFile>) -> String {
    let mut message = format!("ERR: {}", error);

    if let Some(file) = file {
        let line = error.get_line();
        if line > 0 {
            let text = file.line_text(line).unwrap_or_default();
            message.push_str(&format!("\n{} line {}: {}", file.name, line, text));
        }
    }

    message
}

/// Prints a diagnostic to stderr, highlighted, with the error's tip if it
/// has one.
pub fn display_error(error: &Error, file: Option<&SourceFile>) {
    let formatted = format_diagnostic(error, file);
    let mut lines = formatted.lines();

    if let Some(headline) = lines.next() {
        let message = headline.trim_start_matches("ERR: ");
        eprintln!("{} {} {}", "ERR:".red().bold(), message, format!("[{}]", error.get_error_name()).dimmed());
    }
    for location in lines {
        eprintln!("  {} {}", "-->".blue(), location);
    }

    if let ErrorTip::Suggestion(tip) = error.get_tip() {
        eprintln!("  {} {}", "tip:".yellow(), tip);
    }
}

#[cfg(test)]
mod tests {
    use crate::errors::errors::{Error, ErrorImpl};

    use super::{format_diagnostic, SourceFile};

    fn program() -> SourceFile {
        SourceFile::new("main.flow", "high int x = 1;\nlow int y = 0;\nif (x > 0) {\n    y = 1;\n}\n")
    }

    #[test]
    fn test_line_text() {
        let file = program();

        assert_eq!(file.line_text(1), Some("high int x = 1;"));
        assert_eq!(file.line_text(4), Some("    y = 1;"));
        assert_eq!(file.line_text(0), None);
        assert_eq!(file.line_text(99), None);
    }

    #[test]
    fn test_format_diagnostic_with_location() {
        let error = Error::new(
            ErrorImpl::SecurityViolationImplicit {
                variable: String::from("y"),
            },
            4,
        );

        let formatted = format_diagnostic(&error, Some(&program()));
        let lines: Vec<&str> = formatted.lines().collect();

        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("ERR: "));
        assert!(lines[0].contains("implicit flow"));
        assert_eq!(lines[1], "main.flow line 4:     y = 1;");
    }

    #[test]
    fn test_format_diagnostic_without_location() {
        let error = Error::new(
            ErrorImpl::UndeclaredVariable {
                variable: String::from("z"),
            },
            0,
        );

        assert_eq!(format_diagnostic(&error, Some(&program())), "ERR: Undeclared variable z");
        assert_eq!(
            format_diagnostic(&Error::new(error.kind().clone(), 3), None),
            "ERR: Undeclared variable z"
        );
    }

    #[test]
    fn test_source_file_parse() {
        let root = program().parse().unwrap();
        assert_eq!(root.tag(), "Block");

        let error = SourceFile::new("bad.flow", "int x = $;").parse().unwrap_err();
        assert_eq!(error.get_error_name(), "UnrecognisedToken");
    }
}
