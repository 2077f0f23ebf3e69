//! Recursive-descent parser.
//!
//! Builds a [`Program`] from a token stream using the stratified
//! expression grammar in `spec.md` §4.2 (the layering encodes operator
//! precedence and associativity directly in the call graph). Parser
//! state is a one-token lookahead (`current_token`) plus a
//! `previous_token` snapshot, matching `spec.md`'s description; true
//! backtracking is never needed because every speculative point in this
//! grammar (function vs. variable declaration) resolves on the very
//! next token once the shared `type IDENT` prefix has been consumed, so
//! no production has to undo more than that.

use crate::ast::{CompoundStmt, Decl, Expr, ForInit, FunctionDecl, Program, Stmt, VariableDecl};
use crate::error::ParseError;
use crate::lexer::Lexer;
use crate::token::{Token, TokenKind};

/// The parser's final result: a possibly-partial `Program` plus every
/// top-level error collected during panic-mode recovery (`spec.md` §7:
/// "the parser performs recovery ... in order to surface multiple
/// top-level errors within one run").
pub struct ParseOutcome {
    pub program: Program,
    pub errors: Vec<ParseError>,
}

pub struct Parser<'a> {
    lexer: Lexer<'a>,
    current_token: Token,
    previous_token: Token,
    errors: Vec<ParseError>,
}

impl<'a> Parser<'a> {
    pub fn new(source: &'a str) -> Self {
        let mut lexer = Lexer::new(source);
        let current_token = lexer.next_token();
        Parser {
            lexer,
            current_token,
            previous_token: Token::end_of_input(),
            errors: Vec::new(),
        }
    }

    pub fn parse(mut self) -> ParseOutcome {
        let mut decls = Vec::new();
        while self.current_token.kind != TokenKind::EndOfInput {
            match self.parse_top_level() {
                Ok(decl) => decls.push(decl),
                Err(e) => {
                    self.report(&e);
                    self.errors.push(e);
                    self.synchronize();
                }
            }
        }
        ParseOutcome {
            program: Program { decls },
            errors: self.errors,
        }
    }

    // --- token plumbing -------------------------------------------------

    fn advance(&mut self) -> Token {
        let consumed = std::mem::replace(&mut self.current_token, self.lexer.next_token());
        self.previous_token = consumed.clone();
        consumed
    }

    fn check_punct(&self, lexeme: &str) -> bool {
        self.current_token.is_punctuator(lexeme)
    }

    fn check_operator(&self, lexeme: &str) -> bool {
        self.current_token.is_operator(lexeme)
    }

    fn check_keyword(&self, lexeme: &str) -> bool {
        self.current_token.is_keyword(lexeme)
    }

    fn expect_punct(&mut self, lexeme: &str) -> Result<(), ParseError> {
        if self.check_punct(lexeme) {
            self.advance();
            Ok(())
        } else {
            Err(self.unexpected(&format!("expected '{}'", lexeme)))
        }
    }

    fn expect_identifier(&mut self) -> Result<String, ParseError> {
        if self.current_token.kind == TokenKind::Identifier {
            Ok(self.advance().lexeme)
        } else {
            Err(self.unexpected("expected an identifier"))
        }
    }

    fn unexpected(&self, msg: &str) -> ParseError {
        ParseError::UnexpectedToken(format!(
            "Error at '{}': {}",
            self.current_token.lexeme, msg
        ))
    }

    fn report(&self, e: &ParseError) {
        eprintln!("{}", e);
    }

    /// Panic-mode recovery, per `spec.md` §4.2: skip tokens until the
    /// next token begins a type keyword, then resume at the top level.
    fn synchronize(&mut self) {
        while self.current_token.kind != TokenKind::EndOfInput
            && !self.current_token.is_type_keyword()
        {
            self.advance();
        }
    }

    // --- top level --------------------------------------------------------

    fn parse_top_level(&mut self) -> Result<Decl, ParseError> {
        if !self.current_token.is_type_keyword() {
            return Err(self.unexpected("expected a type keyword"));
        }
        let return_type = self.advance().lexeme;
        let name = self.expect_identifier()?;

        if self.check_punct("(") {
            self.parse_function_rest(return_type, name).map(Decl::Function)
        } else {
            self.parse_variable_rest(return_type, name).map(Decl::Variable)
        }
    }

    fn parse_function_rest(
        &mut self,
        return_type: String,
        name: String,
    ) -> Result<FunctionDecl, ParseError> {
        self.expect_punct("(")?;
        let mut params = Vec::new();
        if !self.check_punct(")") {
            loop {
                if !self.current_token.is_type_keyword() {
                    return Err(self.unexpected("expected a parameter type"));
                }
                let ptype = self.advance().lexeme;
                let pname = self.expect_identifier()?;
                params.push((ptype, pname));
                if self.check_punct(",") {
                    self.advance();
                } else {
                    break;
                }
            }
        }
        self.expect_punct(")")?;

        let body = if self.check_punct(";") {
            self.advance();
            None
        } else {
            Some(self.parse_compound()?)
        };

        Ok(FunctionDecl {
            return_type,
            name,
            params,
            body,
        })
    }

    fn parse_variable_rest(
        &mut self,
        type_name: String,
        name: String,
    ) -> Result<VariableDecl, ParseError> {
        let init = if self.check_operator("=") {
            self.advance();
            Some(self.parse_expression()?)
        } else {
            None
        };
        self.expect_punct(";")?;
        Ok(VariableDecl {
            type_name,
            name,
            init,
        })
    }

    // --- statements ---------------------------------------------------

    fn parse_compound(&mut self) -> Result<CompoundStmt, ParseError> {
        self.expect_punct("{")?;
        let mut stmts = Vec::new();
        while !self.check_punct("}") {
            if self.current_token.kind == TokenKind::EndOfInput {
                return Err(self.unexpected("unterminated compound statement"));
            }
            stmts.push(self.parse_statement()?);
        }
        self.expect_punct("}")?;
        Ok(CompoundStmt { stmts })
    }

    fn parse_statement(&mut self) -> Result<Stmt, ParseError> {
        if self.check_punct("{") {
            return Ok(Stmt::Compound(self.parse_compound()?));
        }
        if self.check_keyword("if") {
            return self.parse_if();
        }
        if self.check_keyword("while") {
            return self.parse_while();
        }
        if self.check_keyword("for") {
            return self.parse_for();
        }
        if self.check_keyword("return") {
            return self.parse_return();
        }
        if self.current_token.is_type_keyword() {
            let type_name = self.advance().lexeme;
            let name = self.expect_identifier()?;
            return self
                .parse_variable_rest(type_name, name)
                .map(Stmt::VarDecl);
        }
        self.parse_expression_statement()
    }

    fn parse_if(&mut self) -> Result<Stmt, ParseError> {
        self.advance(); // 'if'
        self.expect_punct("(")?;
        let cond = self.parse_expression()?;
        self.expect_punct(")")?;
        let then_branch = Box::new(self.parse_statement()?);
        let else_branch = if self.check_keyword("else") {
            self.advance();
            Some(Box::new(self.parse_statement()?))
        } else {
            None
        };
        Ok(Stmt::If {
            cond,
            then_branch,
            else_branch,
        })
    }

    fn parse_while(&mut self) -> Result<Stmt, ParseError> {
        self.advance(); // 'while'
        self.expect_punct("(")?;
        let cond = self.parse_expression()?;
        self.expect_punct(")")?;
        let body = Box::new(self.parse_statement()?);
        Ok(Stmt::While { cond, body })
    }

    fn parse_for(&mut self) -> Result<Stmt, ParseError> {
        self.advance(); // 'for'
        self.expect_punct("(")?;

        let init = if self.check_punct(";") {
            self.advance();
            None
        } else if self.current_token.is_type_keyword() {
            let type_name = self.advance().lexeme;
            let name = self.expect_identifier()?;
            Some(ForInit::Decl(self.parse_variable_rest(type_name, name)?))
        } else {
            let expr = self.parse_expression()?;
            self.expect_punct(";")?;
            Some(ForInit::Expr(expr))
        };

        let cond = if self.check_punct(";") {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.expect_punct(";")?;

        let increment = if self.check_punct(")") {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.expect_punct(")")?;

        let body = Box::new(self.parse_statement()?);
        Ok(Stmt::For {
            init,
            cond,
            increment,
            body,
        })
    }

    fn parse_return(&mut self) -> Result<Stmt, ParseError> {
        self.advance(); // 'return'
        let value = if self.check_punct(";") {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.expect_punct(";")?;
        Ok(Stmt::Return(value))
    }

    fn parse_expression_statement(&mut self) -> Result<Stmt, ParseError> {
        if self.check_punct(";") {
            self.advance();
            return Ok(Stmt::Expression(None));
        }
        let expr = self.parse_expression()?;
        self.expect_punct(";")?;
        Ok(Stmt::Expression(Some(expr)))
    }

    // --- expressions: assignment / equality / comparison / term / factor / unary / primary

    fn parse_expression(&mut self) -> Result<Expr, ParseError> {
        self.parse_assignment()
    }

    fn parse_assignment(&mut self) -> Result<Expr, ParseError> {
        let left = self.parse_equality()?;
        if self.check_operator("=") {
            self.advance();
            let value = self.parse_assignment()?; // right-associative
            if left.as_identifier().is_none() {
                return Err(self.unexpected("invalid assignment target"));
            }
            return Ok(Expr::Assignment {
                target: Box::new(left),
                value: Box::new(value),
            });
        }
        Ok(left)
    }

    fn parse_equality(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_comparison()?;
        loop {
            let op = if self.check_operator("==") {
                "=="
            } else if self.check_operator("!=") {
                "!="
            } else {
                break;
            };
            self.advance();
            let right = self.parse_comparison()?;
            left = Expr::Binary {
                op: op.to_string(),
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_comparison(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_term()?;
        loop {
            let op = if self.check_operator("<=") {
                "<="
            } else if self.check_operator(">=") {
                ">="
            } else if self.check_operator("<") {
                "<"
            } else if self.check_operator(">") {
                ">"
            } else {
                break;
            };
            self.advance();
            let right = self.parse_term()?;
            left = Expr::Binary {
                op: op.to_string(),
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_term(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_factor()?;
        loop {
            let op = if self.check_operator("+") {
                "+"
            } else if self.check_operator("-") {
                "-"
            } else {
                break;
            };
            self.advance();
            let right = self.parse_factor()?;
            left = Expr::Binary {
                op: op.to_string(),
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_factor(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_unary()?;
        loop {
            let op = if self.check_operator("*") {
                "*"
            } else if self.check_operator("/") {
                "/"
            } else {
                break;
            };
            self.advance();
            let right = self.parse_unary()?;
            left = Expr::Binary {
                op: op.to_string(),
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expr, ParseError> {
        for op in ["!", "-", "&", "*"] {
            if self.check_operator(op) {
                self.advance();
                let operand = self.parse_unary()?;
                return Ok(Expr::Unary {
                    op: op.to_string(),
                    operand: Box::new(operand),
                });
            }
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        match self.current_token.kind {
            TokenKind::Number => Ok(Expr::NumberLiteral(self.advance().lexeme)),
            // Not in the written grammar's `primary` production, but
            // string literals are an explicit AST variant and part of
            // the accepted language (`spec.md` §1/§3); `primary` is
            // extended here to admit them.
            TokenKind::String => Ok(Expr::StringLiteral(self.advance().lexeme)),
            TokenKind::Identifier => {
                let name = self.advance().lexeme;
                if self.check_punct("(") {
                    self.advance();
                    let mut args = Vec::new();
                    if !self.check_punct(")") {
                        loop {
                            args.push(self.parse_expression()?);
                            if self.check_punct(",") {
                                self.advance();
                            } else {
                                break;
                            }
                        }
                    }
                    self.expect_punct(")")?;
                    Ok(Expr::Call { callee: name, args })
                } else {
                    Ok(Expr::Identifier(name))
                }
            }
            _ if self.check_punct("(") => {
                self.advance();
                let expr = self.parse_expression()?;
                self.expect_punct(")")?;
                Ok(expr)
            }
            _ => Err(self.unexpected("expected an expression")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_ok(src: &str) -> Program {
        let outcome = Parser::new(src).parse();
        assert!(outcome.errors.is_empty(), "errors: {:?}", outcome.errors);
        outcome.program
    }

    #[test]
    fn precedence_multiplication_binds_tighter_than_addition() {
        // P4: `a + b * c` on the RHS of an assignment has `*` as the
        // root of the Binary subtree, with `+` as its parent.
        let program = parse_ok("int main() { int x; x = a + b * c; }");
        let Decl::Function(f) = &program.decls[0] else {
            panic!("expected function");
        };
        let body = f.body.as_ref().unwrap();
        let Stmt::Expression(Some(Expr::Assignment { value, .. })) = &body.stmts[1] else {
            panic!("expected assignment statement, got {:?}", body.stmts[1]);
        };
        match value.as_ref() {
            Expr::Binary { op, right, .. } => {
                assert_eq!(op, "+");
                match right.as_ref() {
                    Expr::Binary { op, .. } => assert_eq!(op, "*"),
                    other => panic!("expected nested multiply, got {:?}", other),
                }
            }
            other => panic!("expected top-level add, got {:?}", other),
        }
    }

    #[test]
    fn function_vs_variable_declaration_disambiguation() {
        let program = parse_ok("int f(int a) { return a; } int g;");
        assert!(matches!(program.decls[0], Decl::Function(_)));
        assert!(matches!(program.decls[1], Decl::Variable(_)));
    }

    #[test]
    fn forward_declaration_has_no_body() {
        let program = parse_ok("int f(int a);");
        let Decl::Function(f) = &program.decls[0] else {
            panic!("expected function");
        };
        assert!(f.body.is_none());
    }

    #[test]
    fn for_loop_produces_all_four_clauses() {
        let program = parse_ok("int main() { for (i = 0; i < 5; i = i + 1) result = result + i; }");
        let Decl::Function(f) = &program.decls[0] else {
            panic!()
        };
        let Stmt::For {
            init,
            cond,
            increment,
            ..
        } = &f.body.as_ref().unwrap().stmts[0]
        else {
            panic!("expected for statement");
        };
        assert!(init.is_some());
        assert!(cond.is_some());
        assert!(increment.is_some());
    }

    #[test]
    fn invalid_assignment_target_is_reported() {
        let outcome = Parser::new("int main() { 1 = 2; }").parse();
        assert!(!outcome.errors.is_empty());
    }

    #[test]
    fn multiple_top_level_errors_are_all_collected() {
        // S5-adjacent: malformed top-level declarations recover via
        // panic mode and both are reported in one run.
        let outcome = Parser::new("int ; int ;").parse();
        assert_eq!(outcome.errors.len(), 2);
    }

    #[test]
    fn string_literal_parses_in_primary_position() {
        let program = parse_ok(r#"int main() { puts("hi\n"); }"#);
        let Decl::Function(f) = &program.decls[0] else {
            panic!()
        };
        let Stmt::Expression(Some(Expr::Call { args, .. })) = &f.body.as_ref().unwrap().stmts[0]
        else {
            panic!("expected call statement");
        };
        assert!(matches!(args[0], Expr::StringLiteral(_)));
    }
}
