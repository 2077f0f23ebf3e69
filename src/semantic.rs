//! Semantic analysis.
//!
//! Walks the AST built by the parser, maintaining a scope stack rooted
//! at the global scope, and reports the first failure it finds
//! (`spec.md` §4.3: "the analyzer returns pass/fail; the first failure
//! short-circuits"). Nothing here checks operand types beyond existence
//! and call arity — `spec.md` §9 "Type checking laxity" asks for that
//! permissiveness to be preserved, not tightened.

use std::rc::Rc;

use crate::ast::{CompoundStmt, Decl, Expr, ForInit, FunctionDecl, Program, Stmt, VariableDecl};
use crate::error::SemanticError;
use crate::symbol::{Scope, SymbolEntry, SymbolKind};
use crate::types::TypeInfo;

pub struct Analyzer {
    scope: Rc<Scope>,
}

impl Analyzer {
    pub fn new() -> Self {
        Analyzer {
            scope: Scope::root(),
        }
    }

    /// Run the analysis and hand back the (possibly partially
    /// populated) global scope for the driver's verbose dump, alongside
    /// the first error if analysis failed.
    pub fn analyze(mut self, program: &Program) -> Result<Rc<Scope>, SemanticError> {
        for decl in &program.decls {
            self.analyze_decl(decl)?;
        }
        Ok(self.scope)
    }

    fn enter_scope(&mut self) {
        self.scope = Scope::child_of(&self.scope);
    }

    fn exit_scope(&mut self) {
        // Every `enter_scope` here is paired with exactly one
        // `exit_scope` before `analyze` returns, so the parent always
        // exists; see `analyze_function`, `analyze_compound`, `analyze_for`.
        self.scope = self.scope.parent().expect("exited past the global scope");
    }

    fn resolve_type(&self, spelling: &str) -> Result<TypeInfo, SemanticError> {
        TypeInfo::from_spelling(spelling)
            .ok_or_else(|| SemanticError::UnknownType(spelling.to_string()))
    }

    fn analyze_decl(&mut self, decl: &Decl) -> Result<(), SemanticError> {
        match decl {
            Decl::Function(f) => self.analyze_function(f),
            Decl::Variable(v) => self.analyze_variable(v, SymbolKind::Variable),
        }
    }

    fn analyze_function(&mut self, f: &FunctionDecl) -> Result<(), SemanticError> {
        let return_type = self.resolve_type(&f.return_type)?;
        let mut params = Vec::with_capacity(f.params.len());
        for (ty, _) in &f.params {
            params.push(self.resolve_type(ty)?);
        }

        if !self.scope.declare(SymbolEntry::new(
            &f.name,
            return_type,
            SymbolKind::Function {
                params: params.clone(),
            },
            true,
        )) {
            return Err(SemanticError::Redeclaration(f.name.clone()));
        }

        if let Some(body) = &f.body {
            self.enter_scope();
            for (ty, name) in &f.params {
                let param_type = self.resolve_type(ty)?;
                if !self
                    .scope
                    .declare(SymbolEntry::new(name, param_type, SymbolKind::Parameter, true))
                {
                    self.exit_scope();
                    return Err(SemanticError::Redeclaration(name.clone()));
                }
            }
            let result = self.analyze_compound_in_current_scope(body);
            self.exit_scope();
            result?;
        }
        Ok(())
    }

    fn analyze_variable(
        &mut self,
        v: &VariableDecl,
        kind: SymbolKind,
    ) -> Result<(), SemanticError> {
        let ty = self.resolve_type(&v.type_name)?;
        if let Some(init) = &v.init {
            self.analyze_expr(init)?;
        }
        // `initialized = true` unconditionally: `spec.md` §4.3 elects
        // this to avoid false positives without definite-assignment
        // analysis.
        if !self.scope.declare(SymbolEntry::new(&v.name, ty, kind, true)) {
            return Err(SemanticError::Redeclaration(v.name.clone()));
        }
        Ok(())
    }

    fn analyze_compound(&mut self, block: &CompoundStmt) -> Result<(), SemanticError> {
        self.enter_scope();
        let result = self.analyze_compound_in_current_scope(block);
        self.exit_scope();
        result
    }

    fn analyze_compound_in_current_scope(
        &mut self,
        block: &CompoundStmt,
    ) -> Result<(), SemanticError> {
        for stmt in &block.stmts {
            self.analyze_stmt(stmt)?;
        }
        Ok(())
    }

    fn analyze_stmt(&mut self, stmt: &Stmt) -> Result<(), SemanticError> {
        match stmt {
            Stmt::Compound(block) => self.analyze_compound(block),
            Stmt::Expression(expr) => {
                if let Some(e) = expr {
                    self.analyze_expr(e)?;
                }
                Ok(())
            }
            Stmt::VarDecl(v) => self.analyze_variable(v, SymbolKind::Variable),
            Stmt::If {
                cond,
                then_branch,
                else_branch,
            } => {
                self.analyze_expr(cond)?;
                self.analyze_stmt(then_branch)?;
                if let Some(else_branch) = else_branch {
                    self.analyze_stmt(else_branch)?;
                }
                Ok(())
            }
            Stmt::While { cond, body } => {
                self.analyze_expr(cond)?;
                self.analyze_stmt(body)
            }
            Stmt::For {
                init,
                cond,
                increment,
                body,
            } => self.analyze_for(init, cond, increment, body),
            Stmt::Return(value) => {
                if let Some(v) = value {
                    self.analyze_expr(v)?;
                }
                Ok(())
            }
        }
    }

    fn analyze_for(
        &mut self,
        init: &Option<ForInit>,
        cond: &Option<Expr>,
        increment: &Option<Expr>,
        body: &Stmt,
    ) -> Result<(), SemanticError> {
        self.enter_scope();
        let result = (|| {
            if let Some(init) = init {
                match init {
                    ForInit::Decl(v) => self.analyze_variable(v, SymbolKind::Variable)?,
                    ForInit::Expr(e) => self.analyze_expr(e)?,
                }
            }
            if let Some(cond) = cond {
                self.analyze_expr(cond)?;
            }
            if let Some(increment) = increment {
                self.analyze_expr(increment)?;
            }
            self.analyze_stmt(body)
        })();
        self.exit_scope();
        result
    }

    fn analyze_expr(&mut self, expr: &Expr) -> Result<(), SemanticError> {
        match expr {
            Expr::Binary { left, right, .. } => {
                self.analyze_expr(left)?;
                self.analyze_expr(right)
            }
            Expr::Unary { operand, .. } => self.analyze_expr(operand),
            Expr::Call { callee, args } => {
                let entry = self
                    .scope
                    .lookup(callee)
                    .ok_or_else(|| SemanticError::UndeclaredIdentifier(callee.clone()))?;
                let SymbolKind::Function { params } = &entry.kind else {
                    return Err(SemanticError::CallOfNonFunction(callee.clone()));
                };
                if params.len() != args.len() {
                    return Err(SemanticError::ArgumentCountMismatch {
                        callee: callee.clone(),
                        expected: params.len(),
                        found: args.len(),
                    });
                }
                for arg in args {
                    self.analyze_expr(arg)?;
                }
                Ok(())
            }
            Expr::Identifier(name) => {
                self.scope
                    .lookup(name)
                    .ok_or_else(|| SemanticError::UndeclaredIdentifier(name.clone()))?;
                Ok(())
            }
            Expr::NumberLiteral(_) | Expr::StringLiteral(_) => Ok(()),
            Expr::Assignment { target, value } => {
                self.analyze_expr(value)?;
                let Some(name) = target.as_identifier() else {
                    return Err(SemanticError::InvalidAssignmentTarget);
                };
                let entry = self
                    .scope
                    .lookup(name)
                    .ok_or_else(|| SemanticError::UndeclaredIdentifier(name.to_string()))?;
                entry.mark_initialized();
                Ok(())
            }
        }
    }
}

impl Default for Analyzer {
    fn default() -> Self {
        Analyzer::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::Parser;

    fn analyze_src(src: &str) -> Result<Rc<Scope>, SemanticError> {
        let outcome = Parser::new(src).parse();
        assert!(outcome.errors.is_empty());
        Analyzer::new().analyze(&outcome.program)
    }

    #[test]
    fn undeclared_identifier_is_rejected() {
        let err = analyze_src("int main() { return x; }").unwrap_err();
        assert!(matches!(err, SemanticError::UndeclaredIdentifier(n) if n == "x"));
    }

    #[test]
    fn redeclaration_in_the_same_scope_is_rejected() {
        // S5
        let err = analyze_src("int main() { int i; int i; }").unwrap_err();
        assert!(matches!(err, SemanticError::Redeclaration(n) if n == "i"));
    }

    #[test]
    fn call_arity_mismatch_is_rejected() {
        // P6
        let err = analyze_src("int f(int a) { return a; } int main() { return f(1, 2); }")
            .unwrap_err();
        assert!(matches!(
            err,
            SemanticError::ArgumentCountMismatch {
                expected: 1,
                found: 2,
                ..
            }
        ));
    }

    #[test]
    fn call_of_a_non_function_is_rejected() {
        let err = analyze_src("int x; int main() { return x(1); }").unwrap_err();
        assert!(matches!(err, SemanticError::CallOfNonFunction(n) if n == "x"));
    }

    #[test]
    fn scope_discipline_hides_block_locals_from_the_enclosing_scope() {
        // P5
        let outcome = Parser::new("int main() { { int n; } return n; }").parse();
        assert!(outcome.errors.is_empty());
        let err = Analyzer::new().analyze(&outcome.program).unwrap_err();
        assert!(matches!(err, SemanticError::UndeclaredIdentifier(n) if n == "n"));
    }

    #[test]
    fn for_header_declaration_is_visible_inside_the_loop_body_only() {
        let scope = analyze_src("int main() { for (int i = 0; i < 1; i = i + 1) { int x; } return 0; }").unwrap();
        assert!(scope.lookup("i").is_none());
    }

    #[test]
    fn well_formed_program_analyzes_successfully() {
        assert!(analyze_src(
            "int add(int a, int b) { return a + b; } int main() { return add(2, 3); }"
        )
        .is_ok());
    }
}
