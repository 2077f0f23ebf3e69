//! A batch compiler for a minimal C subset, targeting LLVM textual IR.
//!
//! The pipeline is a linear composition of four stages, each consuming
//! the previous stage's output entirely before the next begins:
//!
//! ```text
//! source bytes -> Tokenizer -> tokens -> Parser -> AST
//!              -> SemanticAnalyzer -> (AST, Scope) -> CodeGen -> IR text
//! ```
//!
//! [`compile_source`] and [`compile_file`] run the whole pipeline;
//! `main.rs` is a thin driver over this library.

pub mod ast;
pub mod codegen;
pub mod config;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod semantic;
pub mod symbol;
pub mod token;
pub mod types;

use std::fs;
use std::path::Path;
use std::rc::Rc;

use crate::ast::Program;
use crate::config::CompilerConfig;
use crate::error::CompileError;
use crate::parser::Parser;
use crate::semantic::Analyzer;
use crate::symbol::Scope;

/// The result of a successful compilation: the generated IR text plus
/// the AST and global scope, for a verbose driver to inspect.
pub struct CompileOutput {
    pub ir: String,
    pub program: Program,
    pub global_scope: Rc<Scope>,
}

/// Run the full pipeline over in-memory source text.
pub fn compile_source(source: &str, config: &CompilerConfig) -> Result<CompileOutput, CompileError> {
    let outcome = Parser::new(source).parse();
    if let Some(first) = outcome.errors.into_iter().next() {
        return Err(CompileError::Parse(first));
    }
    let program = outcome.program;

    let global_scope = Analyzer::new().analyze(&program)?;
    let ir = codegen::CodeGen::new().generate(&program, config)?;

    Ok(CompileOutput {
        ir,
        program,
        global_scope,
    })
}

/// Read `input_path`, run the pipeline, and write the resulting IR to
/// `output_path`.
pub fn compile_file(
    input_path: &Path,
    output_path: &Path,
    config: &CompilerConfig,
) -> Result<CompileOutput, CompileError> {
    let source = fs::read_to_string(input_path)?;
    let output = compile_source(&source, config)?;
    fs::write(output_path, &output.ir)?;
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compiles_a_minimal_program_to_ir() {
        let output = compile_source("int main() { return 0; }", &CompilerConfig::default()).unwrap();
        assert!(output.ir.contains("define i32 @main()"));
    }

    #[test]
    fn parse_errors_short_circuit_before_semantic_analysis() {
        let err = compile_source("int main( { return 0; }", &CompilerConfig::default()).unwrap_err();
        assert!(matches!(err, CompileError::Parse(_)));
    }

    #[test]
    fn semantic_errors_surface_through_the_pipeline() {
        let err = compile_source("int main() { return x; }", &CompilerConfig::default()).unwrap_err();
        assert!(matches!(err, CompileError::Semantic(_)));
    }
}
