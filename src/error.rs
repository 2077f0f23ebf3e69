//! Stage error types.
//!
//! No `thiserror`/`anyhow` here, matching the teacher's own
//! `codegen::error::CodeGenError` (hand-written `Display` +
//! `std::error::Error`, `From` impls for the inner error kinds `?`
//! needs to convert through).

use std::fmt;

/// The tokenizer never raises an error (`spec.md` §4.1: "no errors are
/// raised; unrecognised bytes become single-character Operator
/// tokens"). This type exists only so the stage boundary is uniform;
/// nothing in this crate ever constructs one.
#[derive(Debug)]
pub enum LexError {}

impl fmt::Display for LexError {
    fn fmt(&self, _f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {}
    }
}

impl std::error::Error for LexError {}

#[derive(Debug)]
pub enum ParseError {
    /// An unexpected token was encountered in a production; carries the
    /// formatted message per `spec.md` §6's `Error at '<lexeme>': ...`
    /// diagnostic shape.
    UnexpectedToken(String),
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::UnexpectedToken(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for ParseError {}

#[derive(Debug)]
pub enum SemanticError {
    UndeclaredIdentifier(String),
    Redeclaration(String),
    UnknownType(String),
    CallOfNonFunction(String),
    ArgumentCountMismatch {
        callee: String,
        expected: usize,
        found: usize,
    },
    InvalidAssignmentTarget,
}

impl fmt::Display for SemanticError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SemanticError::UndeclaredIdentifier(name) => {
                write!(f, "Undeclared identifier: {}", name)
            }
            SemanticError::Redeclaration(name) => {
                write!(f, "Redeclaration of symbol: {}", name)
            }
            SemanticError::UnknownType(name) => write!(f, "Unknown type name: {}", name),
            SemanticError::CallOfNonFunction(name) => {
                write!(f, "'{}' is not a function", name)
            }
            SemanticError::ArgumentCountMismatch {
                callee,
                expected,
                found,
            } => write!(
                f,
                "'{}' expects {} argument(s), found {}",
                callee, expected, found
            ),
            SemanticError::InvalidAssignmentTarget => {
                write!(f, "Assignment target must be an identifier")
            }
        }
    }
}

impl std::error::Error for SemanticError {}

/// Mirrors the teacher's `codegen::error::CodeGenError`: a logical
/// variant for compiler-internal invariant violations and a formatting
/// variant for `write!` failures into the output buffer.
#[derive(Debug)]
pub enum CodeGenError {
    Logic(String),
    Format(fmt::Error),
}

impl fmt::Display for CodeGenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CodeGenError::Logic(msg) => write!(f, "{}", msg),
            CodeGenError::Format(e) => write!(f, "IR generation error: {}", e),
        }
    }
}

impl std::error::Error for CodeGenError {}

impl From<fmt::Error> for CodeGenError {
    fn from(e: fmt::Error) -> Self {
        CodeGenError::Format(e)
    }
}

/// Union of every stage error, for the driver.
#[derive(Debug)]
pub enum CompileError {
    Io(std::io::Error),
    Parse(ParseError),
    Semantic(SemanticError),
    CodeGen(CodeGenError),
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompileError::Io(e) => write!(f, "{}", e),
            // `ParseError`'s own message already carries the full
            // `Error at '<lexeme>': ...` line (`spec.md` §6), so this
            // arm does not add a further prefix.
            CompileError::Parse(e) => write!(f, "{}", e),
            CompileError::Semantic(e) => write!(f, "Semantic error: {}", e),
            CompileError::CodeGen(e) => write!(f, "Code generation error: {}", e),
        }
    }
}

impl std::error::Error for CompileError {}

impl From<std::io::Error> for CompileError {
    fn from(e: std::io::Error) -> Self {
        CompileError::Io(e)
    }
}

impl From<ParseError> for CompileError {
    fn from(e: ParseError) -> Self {
        CompileError::Parse(e)
    }
}

impl From<SemanticError> for CompileError {
    fn from(e: SemanticError) -> Self {
        CompileError::Semantic(e)
    }
}

impl From<CodeGenError> for CompileError {
    fn from(e: CodeGenError) -> Self {
        CompileError::CodeGen(e)
    }
}
