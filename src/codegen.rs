//! Code generation: AST → textual LLVM IR.
//!
//! A single-pass emitter. Every intermediate value materializes into a
//! fresh virtual register (`%tN`) even literals (`spec.md` §4.4:
//! `NumberLiteral` emits `%r = add i32 <value>, 0` rather than
//! substituting the literal inline), so `emit_expr` always hands back a
//! register name the caller can drop straight into the next
//! instruction. Labels (`labelN`) and registers share the same
//! monotonically increasing scheme and are never reused, even across
//! control-flow shapes that don't end up needing every label they
//! allocate (an `if` without an `else` still burns a label name for the
//! unused `else:` block) — that's the generator's actual behavior, not
//! an oversight to clean up.

use std::collections::HashMap;
use std::fmt::Write as _;

use crate::ast::{CompoundStmt, Decl, Expr, ForInit, FunctionDecl, Program, Stmt};
use crate::config::CompilerConfig;
use crate::error::CodeGenError;
use crate::types::TypeInfo;

#[derive(Clone)]
struct LocalVar {
    ir_type: String,
    stack_allocated: bool,
}

#[derive(Clone)]
struct FunctionSig {
    return_type: TypeInfo,
}

pub struct CodeGen {
    output: String,
    temp_counter: u32,
    label_counter: u32,
    string_counter: u32,
    locals: HashMap<String, LocalVar>,
    functions: HashMap<String, FunctionSig>,
    current_return_ir: String,
}

impl CodeGen {
    pub fn new() -> Self {
        CodeGen {
            output: String::new(),
            temp_counter: 0,
            label_counter: 0,
            string_counter: 0,
            locals: HashMap::new(),
            functions: HashMap::new(),
            current_return_ir: String::new(),
        }
    }

    pub fn generate(mut self, program: &Program, config: &CompilerConfig) -> Result<String, CodeGenError> {
        writeln!(self.output, "; LLVM IR Generated Code")?;
        writeln!(self.output, "target triple = \"{}\"", config.target_triple)?;
        writeln!(self.output)?;
        writeln!(self.output, "declare i32 @printf(i8* nocapture readonly, ...)")?;
        writeln!(self.output, "declare i32 @scanf(i8* nocapture readonly, ...)")?;
        writeln!(self.output)?;
        self.collect_signatures(program)?;
        for decl in &program.decls {
            if let Decl::Function(f) = decl {
                if f.body.is_some() {
                    self.emit_function(f)?;
                }
            }
        }
        Ok(self.output)
    }

    /// Registers every function's signature before any body is
    /// emitted, so a call to a function declared later in the file
    /// (or only forward-declared) resolves.
    fn collect_signatures(&mut self, program: &Program) -> Result<(), CodeGenError> {
        for decl in &program.decls {
            if let Decl::Function(f) = decl {
                let return_type = resolve_type(&f.return_type)?;
                self.functions
                    .insert(f.name.clone(), FunctionSig { return_type });
            }
        }
        Ok(())
    }

    fn fresh_temp(&mut self) -> String {
        let name = format!("%t{}", self.temp_counter);
        self.temp_counter += 1;
        name
    }

    fn fresh_label(&mut self) -> String {
        let name = format!("label{}", self.label_counter);
        self.label_counter += 1;
        name
    }

    // --- top level --------------------------------------------------------

    fn emit_function(&mut self, f: &FunctionDecl) -> Result<(), CodeGenError> {
        let return_type = resolve_type(&f.return_type)?;
        let ir_ret = return_type.to_ir();
        self.current_return_ir = ir_ret.clone();
        self.locals.clear();

        let mut param_parts = Vec::with_capacity(f.params.len());
        for (ty, name) in &f.params {
            let ir_ty = resolve_type(ty)?.to_ir();
            param_parts.push(format!("{} %{}", ir_ty, name));
            self.locals.insert(
                name.clone(),
                LocalVar {
                    ir_type: ir_ty,
                    stack_allocated: false,
                },
            );
        }

        writeln!(
            self.output,
            "define {} @{}({}) {{",
            ir_ret,
            f.name,
            param_parts.join(", ")
        )?;
        writeln!(self.output, "entry:")?;

        if let Some(body) = &f.body {
            self.emit_compound(body)?;
        }

        if return_type == TypeInfo::Void {
            writeln!(self.output, "ret void")?;
        } else {
            writeln!(self.output, "ret {} 0", ir_ret)?;
        }
        writeln!(self.output, "}}\n")?;
        Ok(())
    }

    fn emit_compound(&mut self, block: &CompoundStmt) -> Result<(), CodeGenError> {
        for stmt in &block.stmts {
            self.emit_stmt(stmt)?;
        }
        Ok(())
    }

    fn emit_stmt(&mut self, stmt: &Stmt) -> Result<(), CodeGenError> {
        match stmt {
            Stmt::Compound(block) => self.emit_compound(block),
            Stmt::Expression(expr) => {
                if let Some(e) = expr {
                    self.emit_expr(e)?;
                }
                Ok(())
            }
            Stmt::VarDecl(v) => {
                let ir_ty = resolve_type(&v.type_name)?.to_ir();
                writeln!(self.output, "%{} = alloca {}", v.name, ir_ty)?;
                self.locals.insert(
                    v.name.clone(),
                    LocalVar {
                        ir_type: ir_ty.clone(),
                        stack_allocated: true,
                    },
                );
                if let Some(init) = &v.init {
                    let val = self.emit_expr(init)?;
                    writeln!(self.output, "store {} {}, {}* %{}", ir_ty, val, ir_ty, v.name)?;
                } else {
                    writeln!(self.output, "store {} 0, {}* %{}", ir_ty, ir_ty, v.name)?;
                }
                Ok(())
            }
            Stmt::If {
                cond,
                then_branch,
                else_branch,
            } => self.emit_if(cond, then_branch, else_branch),
            Stmt::While { cond, body } => self.emit_while(cond, body),
            Stmt::For {
                init,
                cond,
                increment,
                body,
            } => self.emit_for(init, cond, increment, body),
            Stmt::Return(value) => {
                match value {
                    Some(v) => {
                        let val = self.emit_expr(v)?;
                        writeln!(self.output, "ret {} {}", self.current_return_ir, val)?;
                    }
                    None => {
                        writeln!(self.output, "ret void")?;
                    }
                }
                Ok(())
            }
        }
    }

    fn emit_if(
        &mut self,
        cond: &Expr,
        then_branch: &Stmt,
        else_branch: &Option<Box<Stmt>>,
    ) -> Result<(), CodeGenError> {
        let then_label = self.fresh_label();
        let else_label = self.fresh_label();
        let end_label = self.fresh_label();

        let c = self.emit_expr(cond)?;
        let branch_target = if else_branch.is_some() {
            &else_label
        } else {
            &end_label
        };
        writeln!(
            self.output,
            "br i1 {}, label %{}, label %{}",
            c, then_label, branch_target
        )?;

        writeln!(self.output, "{}:", then_label)?;
        self.emit_stmt(then_branch)?;
        writeln!(self.output, "br label %{}", end_label)?;

        if let Some(else_branch) = else_branch {
            writeln!(self.output, "{}:", else_label)?;
            self.emit_stmt(else_branch)?;
            writeln!(self.output, "br label %{}", end_label)?;
        }

        writeln!(self.output, "{}:", end_label)?;
        Ok(())
    }

    fn emit_while(&mut self, cond: &Expr, body: &Stmt) -> Result<(), CodeGenError> {
        let cond_label = self.fresh_label();
        let body_label = self.fresh_label();
        let end_label = self.fresh_label();

        writeln!(self.output, "br label %{}", cond_label)?;
        writeln!(self.output, "{}:", cond_label)?;
        let c = self.emit_expr(cond)?;
        writeln!(
            self.output,
            "br i1 {}, label %{}, label %{}",
            c, body_label, end_label
        )?;

        writeln!(self.output, "{}:", body_label)?;
        self.emit_stmt(body)?;
        writeln!(self.output, "br label %{}", cond_label)?;

        writeln!(self.output, "{}:", end_label)?;
        Ok(())
    }

    fn emit_for(
        &mut self,
        init: &Option<ForInit>,
        cond: &Option<Expr>,
        increment: &Option<Expr>,
        body: &Stmt,
    ) -> Result<(), CodeGenError> {
        match init {
            Some(ForInit::Decl(v)) => {
                self.emit_stmt(&Stmt::VarDecl(v.clone()))?;
            }
            Some(ForInit::Expr(e)) => {
                self.emit_expr(e)?;
            }
            None => {}
        }

        let cond_label = self.fresh_label();
        let body_label = self.fresh_label();
        let incr_label = self.fresh_label();
        let end_label = self.fresh_label();

        writeln!(self.output, "br label %{}", cond_label)?;
        writeln!(self.output, "{}:", cond_label)?;
        match cond {
            Some(cond) => {
                let c = self.emit_expr(cond)?;
                writeln!(
                    self.output,
                    "br i1 {}, label %{}, label %{}",
                    c, body_label, end_label
                )?;
            }
            None => {
                writeln!(self.output, "br label %{}", body_label)?;
            }
        }

        writeln!(self.output, "{}:", body_label)?;
        self.emit_stmt(body)?;
        writeln!(self.output, "br label %{}", incr_label)?;

        writeln!(self.output, "{}:", incr_label)?;
        if let Some(increment) = increment {
            self.emit_expr(increment)?;
        }
        writeln!(self.output, "br label %{}", cond_label)?;

        writeln!(self.output, "{}:", end_label)?;
        Ok(())
    }

    // --- expressions ---------------------------------------------------

    fn emit_expr(&mut self, expr: &Expr) -> Result<String, CodeGenError> {
        match expr {
            Expr::Binary { op, left, right } => self.emit_binary(op, left, right),
            Expr::Unary { op, operand } => self.emit_unary(op, operand),
            Expr::Call { callee, args } => self.emit_call(callee, args),
            Expr::Identifier(name) => self.emit_identifier(name),
            Expr::NumberLiteral(text) => {
                let t = self.fresh_temp();
                writeln!(self.output, "{} = add i32 {}, 0", t, text)?;
                Ok(t)
            }
            Expr::StringLiteral(raw) => self.emit_string_literal(raw),
            Expr::Assignment { target, value } => self.emit_assignment(target, value),
        }
    }

    fn emit_binary(&mut self, op: &str, left: &Expr, right: &Expr) -> Result<String, CodeGenError> {
        let l = self.emit_expr(left)?;
        let r = self.emit_expr(right)?;
        match op {
            "+" | "-" | "*" | "/" => {
                let mnemonic = match op {
                    "+" => "add",
                    "-" => "sub",
                    "*" => "mul",
                    "/" => "sdiv",
                    _ => unreachable!(),
                };
                let t = self.fresh_temp();
                writeln!(self.output, "{} = {} i32 {}, {}", t, mnemonic, l, r)?;
                Ok(t)
            }
            "==" | "!=" | "<" | "<=" | ">" | ">=" => {
                let cond = match op {
                    "==" => "eq",
                    "!=" => "ne",
                    "<" => "slt",
                    "<=" => "sle",
                    ">" => "sgt",
                    ">=" => "sge",
                    _ => unreachable!(),
                };
                let cmp = self.fresh_temp();
                writeln!(self.output, "{} = icmp {} i32 {}, {}", cmp, cond, l, r)?;
                let ext = self.fresh_temp();
                writeln!(self.output, "{} = zext i1 {} to i32", ext, cmp)?;
                Ok(ext)
            }
            other => Err(CodeGenError::Logic(format!(
                "unsupported binary operator '{}'",
                other
            ))),
        }
    }

    fn emit_unary(&mut self, op: &str, operand: &Expr) -> Result<String, CodeGenError> {
        let v = self.emit_expr(operand)?;
        match op {
            "-" => {
                let t = self.fresh_temp();
                writeln!(self.output, "{} = sub i32 0, {}", t, v)?;
                Ok(t)
            }
            "!" => {
                let cmp = self.fresh_temp();
                writeln!(self.output, "{} = icmp eq i32 {}, 0", cmp, v)?;
                let ext = self.fresh_temp();
                writeln!(self.output, "{} = zext i1 {} to i32", ext, cmp)?;
                Ok(ext)
            }
            other => Err(CodeGenError::Logic(format!(
                "unsupported unary operator '{}'",
                other
            ))),
        }
    }

    fn emit_call(&mut self, callee: &str, args: &[Expr]) -> Result<String, CodeGenError> {
        let sig = self
            .functions
            .get(callee)
            .cloned()
            .ok_or_else(|| CodeGenError::Logic(format!("undefined function '{}'", callee)))?;

        let mut arg_regs = Vec::with_capacity(args.len());
        for arg in args {
            arg_regs.push(self.emit_expr(arg)?);
        }
        let args_ir = arg_regs
            .iter()
            .map(|r| format!("i32 {}", r))
            .collect::<Vec<_>>()
            .join(", ");

        if sig.return_type == TypeInfo::Void {
            writeln!(self.output, "call void @{}({})", callee, args_ir)?;
            Ok("0".to_string())
        } else {
            let t = self.fresh_temp();
            writeln!(
                self.output,
                "{} = call {} @{}({})",
                t,
                sig.return_type.to_ir(),
                callee,
                args_ir
            )?;
            Ok(t)
        }
    }

    fn emit_identifier(&mut self, name: &str) -> Result<String, CodeGenError> {
        let local = self
            .locals
            .get(name)
            .cloned()
            .ok_or_else(|| CodeGenError::Logic(format!("undefined variable '{}' at code generation", name)))?;
        if local.stack_allocated {
            let t = self.fresh_temp();
            writeln!(
                self.output,
                "{} = load {}, {}* %{}",
                t, local.ir_type, local.ir_type, name
            )?;
            Ok(t)
        } else {
            Ok(format!("%{}", name))
        }
    }

    fn emit_string_literal(&mut self, raw: &str) -> Result<String, CodeGenError> {
        let inner = raw
            .strip_prefix('"')
            .and_then(|s| s.strip_suffix('"'))
            .unwrap_or(raw);
        let (escaped, len) = escape_string_for_ir(inner);
        let global_name = format!("@str.{}", self.string_counter);
        self.string_counter += 1;
        writeln!(
            self.output,
            "{} = private constant [{} x i8] c\"{}\"",
            global_name, len, escaped
        )?;
        let t = self.fresh_temp();
        writeln!(
            self.output,
            "{} = getelementptr [{} x i8], [{} x i8]* {}, i32 0, i32 0",
            t, len, len, global_name
        )?;
        Ok(t)
    }

    fn emit_assignment(&mut self, target: &Expr, value: &Expr) -> Result<String, CodeGenError> {
        let val = self.emit_expr(value)?;
        let name = target
            .as_identifier()
            .ok_or_else(|| CodeGenError::Logic("assignment target not an identifier".to_string()))?;
        let local = self
            .locals
            .get(name)
            .cloned()
            .ok_or_else(|| CodeGenError::Logic(format!("undefined variable '{}' at code generation", name)))?;
        if !local.stack_allocated {
            return Err(CodeGenError::Logic(format!(
                "missing result-register slot for assignment to parameter '{}'",
                name
            )));
        }
        writeln!(
            self.output,
            "store {} {}, {}* %{}",
            local.ir_type, val, local.ir_type, name
        )?;
        Ok(val)
    }
}

impl Default for CodeGen {
    fn default() -> Self {
        CodeGen::new()
    }
}

fn resolve_type(spelling: &str) -> Result<TypeInfo, CodeGenError> {
    TypeInfo::from_spelling(spelling)
        .ok_or_else(|| CodeGenError::Logic(format!("unknown type name '{}' at code generation", spelling)))
}

/// Decode the backslash-escape pairs the lexer preserved literally, then
/// re-escape every byte for an LLVM `c"..."` constant
/// (`spec.md` §4.4's `\n→\0A, \t→\09, \r→\0D, \0→\00, "→\22, \→\5C`
/// table), appending the trailing NUL every C string constant carries.
/// Returns the escaped text and the total byte length (including the
/// NUL) for the `[N x i8]` array type.
fn escape_string_for_ir(inner: &str) -> (String, usize) {
    let bytes = inner.as_bytes();
    let mut decoded = Vec::with_capacity(bytes.len() + 1);
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'\\' && i + 1 < bytes.len() {
            let decoded_byte = match bytes[i + 1] {
                b'n' => b'\n',
                b't' => b'\t',
                b'r' => b'\r',
                b'0' => 0u8,
                other => other,
            };
            decoded.push(decoded_byte);
            i += 2;
        } else {
            decoded.push(bytes[i]);
            i += 1;
        }
    }
    decoded.push(0);

    let mut escaped = String::with_capacity(decoded.len() * 2);
    for b in &decoded {
        match b {
            b'\n' => escaped.push_str("\\0A"),
            b'\t' => escaped.push_str("\\09"),
            b'\r' => escaped.push_str("\\0D"),
            0 => escaped.push_str("\\00"),
            b'"' => escaped.push_str("\\22"),
            b'\\' => escaped.push_str("\\5C"),
            b if b.is_ascii_graphic() || *b == b' ' => escaped.push(*b as char),
            other => escaped.push_str(&format!("\\{:02X}", other)),
        }
    }
    (escaped, decoded.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CompilerConfig;
    use crate::parser::Parser;
    use crate::semantic::Analyzer;

    fn compile(src: &str) -> String {
        let outcome = Parser::new(src).parse();
        assert!(outcome.errors.is_empty(), "{:?}", outcome.errors);
        Analyzer::new().analyze(&outcome.program).unwrap();
        CodeGen::new().generate(&outcome.program, &CompilerConfig::default()).unwrap()
    }

    #[test]
    fn s1_return_constant_from_main() {
        let ir = compile("int main() { return 42; }");
        assert!(ir.contains("define i32 @main() {"));
        assert!(ir.contains("%t0 = add i32 42, 0"));
        assert!(ir.contains("ret i32 %t0"));
        assert!(ir.trim_end().ends_with("ret i32 0\n}") || ir.contains("ret i32 0\n}"));
    }

    #[test]
    fn s2_call_passes_parameter_ssa_names_without_load() {
        let ir = compile(
            "int add(int a, int b) { return a + b; } int main() { return add(2, 3); }",
        );
        assert!(ir.contains("define i32 @add(i32 %a, i32 %b) {"));
        assert!(ir.contains("add i32 %a, %b"));
        assert!(!ir.contains("load i32, i32* %a"));
        assert!(ir.contains("call i32 @add("));
    }

    #[test]
    fn s3_for_loop_emits_four_labels_with_back_edges() {
        let ir = compile(
            "int main() { int i; int result; for (i = 0; i < 5; i = i + 1) result = result + i; return result; }",
        );
        assert!(ir.contains("label0:"));
        assert!(ir.contains("label1:"));
        assert!(ir.contains("label2:"));
        assert!(ir.contains("label3:"));
        // back-edges from body and incr both target cond (label0)
        assert_eq!(ir.matches("br label %label0").count(), 2);
    }

    #[test]
    fn s6_string_literal_produces_escaped_global_and_gep() {
        let ir = compile(r#"int puts(int s); int main() { puts("hi\n"); return 0; }"#);
        assert!(ir.contains("@str.0 = private constant [4 x i8] c\"hi\\0A\\00\""));
        assert!(ir.contains("getelementptr [4 x i8], [4 x i8]* @str.0"));
    }

    #[test]
    fn if_without_else_still_allocates_three_labels() {
        let ir = compile("int main() { if (1) { return 1; } return 0; }");
        assert!(ir.contains("label0:"));
        assert!(ir.contains("label2:"));
        assert!(!ir.contains("label1:"));
    }

    #[test]
    fn assignment_to_a_parameter_is_a_codegen_error() {
        let outcome = Parser::new("int f(int a) { a = 1; return a; }").parse();
        assert!(outcome.errors.is_empty());
        Analyzer::new().analyze(&outcome.program).unwrap();
        let err = CodeGen::new()
            .generate(&outcome.program, &CompilerConfig::default())
            .unwrap_err();
        assert!(matches!(err, CodeGenError::Logic(msg) if msg.contains("missing result-register slot")));
    }
}
