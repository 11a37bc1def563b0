//! Recursive-descent parser for the target dialect.
//!
//! Accepts the legacy subset the platform executes: `var` declarations,
//! named function declarations and function expressions, `if`/`else`,
//! `while`, classic `for`, `return`, and expression statements. Statement
//! terminators are tolerated rather than enforced: a `;` is consumed when
//! present, so both terminated and brace-delimited styles parse.

use std::fmt;
use std::rc::Rc;

use super::ast::{AssignOp, BinaryOp, Expr, FunctionDef, Program, Stmt, UnaryOp};
use super::lexer::{tokenize, Keyword, Punct, Token, TokenKind};

/// A syntax error with its 1-based source line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    /// Diagnostic message.
    pub message: String,
    /// 1-based source line.
    pub line: u32,
}

impl ParseError {
    pub(crate) fn new(message: impl Into<String>, line: u32) -> Self {
        Self {
            message: message.into(),
            line,
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (line {})", self.message, self.line)
    }
}

impl std::error::Error for ParseError {}

/// Parses fragment source into a program.
pub fn parse(source: &str) -> Result<Program, ParseError> {
    let tokens = tokenize(source)?;
    let mut parser = Parser {
        tokens,
        pos: 0,
        depth: 0,
    };
    let mut body = Vec::new();
    while !parser.at_eof() {
        body.push(parser.statement()?);
    }
    Ok(Program { body })
}

// Bounds recursive descent so pathologically nested (but otherwise valid)
// input becomes a syntax error instead of exhausting the native stack.
const MAX_NESTING_DEPTH: usize = 128;

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn peek(&self) -> &Token {
        // tokenize always appends Eof, so pos stays in range.
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn line(&self) -> u32 {
        self.peek().line
    }

    fn at_eof(&self) -> bool {
        matches!(self.peek().kind, TokenKind::Eof)
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        token
    }

    fn enter(&mut self) -> Result<(), ParseError> {
        if self.depth >= MAX_NESTING_DEPTH {
            return Err(ParseError::new("nesting too deep", self.line()));
        }
        self.depth += 1;
        Ok(())
    }

    fn check_punct(&self, punct: Punct) -> bool {
        matches!(self.peek().kind, TokenKind::Punct(p) if p == punct)
    }

    fn eat_punct(&mut self, punct: Punct) -> bool {
        if self.check_punct(punct) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect_punct(&mut self, punct: Punct, what: &str) -> Result<(), ParseError> {
        if self.eat_punct(punct) {
            Ok(())
        } else {
            Err(ParseError::new(
                format!("expected {what}, found {}", describe(&self.peek().kind)),
                self.line(),
            ))
        }
    }

    fn check_keyword(&self, keyword: Keyword) -> bool {
        matches!(self.peek().kind, TokenKind::Keyword(k) if k == keyword)
    }

    fn eat_keyword(&mut self, keyword: Keyword) -> bool {
        if self.check_keyword(keyword) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect_ident(&mut self, what: &str) -> Result<String, ParseError> {
        let line = self.line();
        match self.advance().kind {
            TokenKind::Ident(name) => Ok(name),
            other => Err(ParseError::new(
                format!("expected {what}, found {}", describe(&other)),
                line,
            )),
        }
    }

    // ---- statements ----

    /// Depth-guarded statement entry; nested blocks and branch bodies
    /// recurse through here.
    fn statement(&mut self) -> Result<Stmt, ParseError> {
        self.enter()?;
        let stmt = self.statement_inner();
        self.depth -= 1;
        stmt
    }

    fn statement_inner(&mut self) -> Result<Stmt, ParseError> {
        let line = self.line();

        if self.eat_keyword(Keyword::Var) {
            let stmt = self.var_decls()?;
            self.eat_punct(Punct::Semi);
            return Ok(stmt);
        }

        if self.check_keyword(Keyword::Function) {
            return self.function_declaration();
        }

        if self.eat_keyword(Keyword::If) {
            return self.if_statement();
        }

        if self.eat_keyword(Keyword::While) {
            self.expect_punct(Punct::LParen, "'(' after 'while'")?;
            let cond = self.expression()?;
            self.expect_punct(Punct::RParen, "')' after condition")?;
            let body = self.branch_body()?;
            return Ok(Stmt::While { cond, body });
        }

        if self.eat_keyword(Keyword::For) {
            return self.for_statement();
        }

        if self.eat_keyword(Keyword::Return) {
            let value = if self.check_punct(Punct::Semi)
                || self.check_punct(Punct::RBrace)
                || self.at_eof()
            {
                None
            } else {
                Some(self.expression()?)
            };
            self.eat_punct(Punct::Semi);
            return Ok(Stmt::Return { value });
        }

        if self.eat_keyword(Keyword::Break) {
            self.eat_punct(Punct::Semi);
            return Ok(Stmt::Break { line });
        }

        if self.eat_keyword(Keyword::Continue) {
            self.eat_punct(Punct::Semi);
            return Ok(Stmt::Continue { line });
        }

        if self.check_punct(Punct::LBrace) {
            // Plain block statement; the dialect has no block scoping, so it
            // only groups statements.
            let body = self.block()?;
            return Ok(Stmt::If {
                cond: Expr::Bool(true),
                then: body,
                otherwise: None,
            });
        }

        let expr = self.expression()?;
        self.eat_punct(Punct::Semi);
        Ok(Stmt::Expr { expr })
    }

    fn var_decls(&mut self) -> Result<Stmt, ParseError> {
        let mut decls = Vec::new();
        loop {
            let name = self.expect_ident("variable name")?;
            let init = if self.eat_punct(Punct::Assign) {
                Some(self.assignment()?)
            } else {
                None
            };
            decls.push((name, init));
            if !self.eat_punct(Punct::Comma) {
                break;
            }
        }
        Ok(Stmt::Var { decls })
    }

    fn function_declaration(&mut self) -> Result<Stmt, ParseError> {
        self.advance(); // 'function'
        let name = self.expect_ident("function name")?;
        let func = self.function_rest(Some(name.clone()))?;
        Ok(Stmt::Function { name, func })
    }

    fn function_rest(&mut self, name: Option<String>) -> Result<Rc<FunctionDef>, ParseError> {
        self.expect_punct(Punct::LParen, "'(' after function name")?;
        let mut params = Vec::new();
        if !self.check_punct(Punct::RParen) {
            loop {
                params.push(self.expect_ident("parameter name")?);
                if !self.eat_punct(Punct::Comma) {
                    break;
                }
            }
        }
        self.expect_punct(Punct::RParen, "')' after parameters")?;
        let body = self.block()?;
        Ok(Rc::new(FunctionDef { name, params, body }))
    }

    fn if_statement(&mut self) -> Result<Stmt, ParseError> {
        self.expect_punct(Punct::LParen, "'(' after 'if'")?;
        let cond = self.expression()?;
        self.expect_punct(Punct::RParen, "')' after condition")?;
        let then = self.branch_body()?;
        let otherwise = if self.eat_keyword(Keyword::Else) {
            if self.check_keyword(Keyword::If) {
                self.advance();
                self.enter()?;
                let nested = self.if_statement();
                self.depth -= 1;
                Some(vec![nested?])
            } else {
                Some(self.branch_body()?)
            }
        } else {
            None
        };
        Ok(Stmt::If {
            cond,
            then,
            otherwise,
        })
    }

    fn for_statement(&mut self) -> Result<Stmt, ParseError> {
        self.expect_punct(Punct::LParen, "'(' after 'for'")?;

        let init = if self.check_punct(Punct::Semi) {
            None
        } else if self.eat_keyword(Keyword::Var) {
            Some(Box::new(self.var_decls()?))
        } else {
            Some(Box::new(Stmt::Expr {
                expr: self.expression()?,
            }))
        };
        self.expect_punct(Punct::Semi, "';' after for-loop initializer")?;

        let cond = if self.check_punct(Punct::Semi) {
            None
        } else {
            Some(self.expression()?)
        };
        self.expect_punct(Punct::Semi, "';' after for-loop condition")?;

        let update = if self.check_punct(Punct::RParen) {
            None
        } else {
            Some(self.expression()?)
        };
        self.expect_punct(Punct::RParen, "')' after for-loop clauses")?;

        let body = self.branch_body()?;
        Ok(Stmt::For {
            init,
            cond,
            update,
            body,
        })
    }

    /// A branch body: either a brace block or a single statement.
    fn branch_body(&mut self) -> Result<Vec<Stmt>, ParseError> {
        if self.check_punct(Punct::LBrace) {
            self.block()
        } else {
            Ok(vec![self.statement()?])
        }
    }

    fn block(&mut self) -> Result<Vec<Stmt>, ParseError> {
        self.expect_punct(Punct::LBrace, "'{'")?;
        let mut body = Vec::new();
        while !self.check_punct(Punct::RBrace) {
            if self.at_eof() {
                return Err(ParseError::new("unexpected end of input in block", self.line()));
            }
            body.push(self.statement()?);
        }
        self.expect_punct(Punct::RBrace, "'}'")?;
        Ok(body)
    }

    // ---- expressions ----

    fn expression(&mut self) -> Result<Expr, ParseError> {
        self.assignment()
    }

    /// Depth-guarded expression entry; nested expressions (parenthesised
    /// groups, literals, arguments, conditional arms) recurse through here.
    fn assignment(&mut self) -> Result<Expr, ParseError> {
        self.enter()?;
        let expr = self.assignment_inner();
        self.depth -= 1;
        expr
    }

    fn assignment_inner(&mut self) -> Result<Expr, ParseError> {
        let expr = self.conditional()?;
        let line = self.line();

        let op = if self.eat_punct(Punct::Assign) {
            AssignOp::Assign
        } else if self.eat_punct(Punct::AddAssign) {
            AssignOp::AddAssign
        } else if self.eat_punct(Punct::SubAssign) {
            AssignOp::SubAssign
        } else {
            return Ok(expr);
        };

        if !matches!(
            expr,
            Expr::Ident { .. } | Expr::Member { .. } | Expr::Index { .. }
        ) {
            return Err(ParseError::new("invalid assignment target", line));
        }

        let value = self.assignment()?;
        Ok(Expr::Assign {
            target: Box::new(expr),
            op,
            value: Box::new(value),
            line,
        })
    }

    fn conditional(&mut self) -> Result<Expr, ParseError> {
        let cond = self.logical_or()?;
        if self.eat_punct(Punct::Question) {
            let then = self.assignment()?;
            self.expect_punct(Punct::Colon, "':' in conditional expression")?;
            let otherwise = self.assignment()?;
            return Ok(Expr::Conditional {
                cond: Box::new(cond),
                then: Box::new(then),
                otherwise: Box::new(otherwise),
            });
        }
        Ok(cond)
    }

    fn logical_or(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.logical_and()?;
        while self.eat_punct(Punct::OrOr) {
            let right = self.logical_and()?;
            left = Expr::Logical {
                and: false,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn logical_and(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.equality()?;
        while self.eat_punct(Punct::AndAnd) {
            let right = self.equality()?;
            left = Expr::Logical {
                and: true,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn equality(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.relational()?;
        loop {
            let op = if self.eat_punct(Punct::EqEqEq) {
                BinaryOp::StrictEq
            } else if self.eat_punct(Punct::NotEqEq) {
                BinaryOp::StrictNe
            } else if self.eat_punct(Punct::EqEq) {
                BinaryOp::Eq
            } else if self.eat_punct(Punct::NotEq) {
                BinaryOp::Ne
            } else {
                return Ok(left);
            };
            let right = self.relational()?;
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
    }

    fn relational(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.additive()?;
        loop {
            let op = if self.eat_punct(Punct::Le) {
                BinaryOp::Le
            } else if self.eat_punct(Punct::Ge) {
                BinaryOp::Ge
            } else if self.eat_punct(Punct::Lt) {
                BinaryOp::Lt
            } else if self.eat_punct(Punct::Gt) {
                BinaryOp::Gt
            } else {
                return Ok(left);
            };
            let right = self.additive()?;
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
    }

    fn additive(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.multiplicative()?;
        loop {
            let op = if self.eat_punct(Punct::Plus) {
                BinaryOp::Add
            } else if self.eat_punct(Punct::Minus) {
                BinaryOp::Sub
            } else {
                return Ok(left);
            };
            let right = self.multiplicative()?;
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
    }

    fn multiplicative(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.unary()?;
        loop {
            let op = if self.eat_punct(Punct::Star) {
                BinaryOp::Mul
            } else if self.eat_punct(Punct::Slash) {
                BinaryOp::Div
            } else if self.eat_punct(Punct::Percent) {
                BinaryOp::Mod
            } else {
                return Ok(left);
            };
            let right = self.unary()?;
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
    }

    fn unary(&mut self) -> Result<Expr, ParseError> {
        let op = if self.eat_punct(Punct::Not) {
            Some(UnaryOp::Not)
        } else if self.eat_punct(Punct::Minus) {
            Some(UnaryOp::Neg)
        } else if self.eat_keyword(Keyword::Typeof) {
            Some(UnaryOp::Typeof)
        } else {
            None
        };

        match op {
            Some(op) => {
                self.enter()?;
                let operand = self.unary();
                self.depth -= 1;
                Ok(Expr::Unary {
                    op,
                    operand: Box::new(operand?),
                })
            }
            None => self.postfix(),
        }
    }

    fn postfix(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.primary()?;
        loop {
            let line = self.line();
            if self.eat_punct(Punct::Dot) {
                let property = self.property_name()?;
                expr = Expr::Member {
                    object: Box::new(expr),
                    property,
                    line,
                };
            } else if self.eat_punct(Punct::LBracket) {
                let index = self.expression()?;
                self.expect_punct(Punct::RBracket, "']' after index")?;
                expr = Expr::Index {
                    object: Box::new(expr),
                    index: Box::new(index),
                    line,
                };
            } else if self.eat_punct(Punct::LParen) {
                let mut args = Vec::new();
                if !self.check_punct(Punct::RParen) {
                    loop {
                        args.push(self.assignment()?);
                        if !self.eat_punct(Punct::Comma) {
                            break;
                        }
                    }
                }
                self.expect_punct(Punct::RParen, "')' after arguments")?;
                expr = Expr::Call {
                    callee: Box::new(expr),
                    args,
                    line,
                };
            } else if self.eat_punct(Punct::PlusPlus) {
                expr = self.postfix_update(expr, true, line)?;
            } else if self.eat_punct(Punct::MinusMinus) {
                expr = self.postfix_update(expr, false, line)?;
            } else {
                return Ok(expr);
            }
        }
    }

    fn postfix_update(
        &mut self,
        target: Expr,
        increment: bool,
        line: u32,
    ) -> Result<Expr, ParseError> {
        if !matches!(
            target,
            Expr::Ident { .. } | Expr::Member { .. } | Expr::Index { .. }
        ) {
            return Err(ParseError::new("invalid increment/decrement target", line));
        }
        Ok(Expr::Postfix {
            target: Box::new(target),
            increment,
            line,
        })
    }

    /// Property names after `.` may be identifiers or keywords (`x.return`
    /// never occurs in practice, but `x.for` style keys exist in the wild).
    fn property_name(&mut self) -> Result<String, ParseError> {
        let line = self.line();
        match self.advance().kind {
            TokenKind::Ident(name) => Ok(name),
            TokenKind::Keyword(kw) => Ok(keyword_text(kw).to_string()),
            other => Err(ParseError::new(
                format!("expected property name, found {}", describe(&other)),
                line,
            )),
        }
    }

    fn primary(&mut self) -> Result<Expr, ParseError> {
        let line = self.line();
        let token = self.advance();
        match token.kind {
            TokenKind::Number(n) => Ok(Expr::Number(n)),
            TokenKind::Str(s) => Ok(Expr::Str(s)),
            TokenKind::Keyword(Keyword::True) => Ok(Expr::Bool(true)),
            TokenKind::Keyword(Keyword::False) => Ok(Expr::Bool(false)),
            TokenKind::Keyword(Keyword::Null) => Ok(Expr::Null),
            TokenKind::Keyword(Keyword::Undefined) => Ok(Expr::Undefined),
            TokenKind::Ident(name) => Ok(Expr::Ident { name, line }),
            TokenKind::Keyword(Keyword::Function) => {
                let name = match &self.peek().kind {
                    TokenKind::Ident(name) => {
                        let name = name.clone();
                        self.advance();
                        Some(name)
                    }
                    _ => None,
                };
                Ok(Expr::Function(self.function_rest(name)?))
            }
            TokenKind::Punct(Punct::LParen) => {
                let expr = self.expression()?;
                self.expect_punct(Punct::RParen, "')'")?;
                Ok(expr)
            }
            TokenKind::Punct(Punct::LBracket) => {
                let mut items = Vec::new();
                if !self.check_punct(Punct::RBracket) {
                    loop {
                        items.push(self.assignment()?);
                        if !self.eat_punct(Punct::Comma) {
                            break;
                        }
                    }
                }
                self.expect_punct(Punct::RBracket, "']' after array literal")?;
                Ok(Expr::Array(items))
            }
            TokenKind::Punct(Punct::LBrace) => {
                let mut entries = Vec::new();
                if !self.check_punct(Punct::RBrace) {
                    loop {
                        let key = match self.advance().kind {
                            TokenKind::Ident(name) => name,
                            TokenKind::Str(s) => s,
                            TokenKind::Keyword(kw) => keyword_text(kw).to_string(),
                            TokenKind::Number(n) => super::value::format_number(n),
                            other => {
                                return Err(ParseError::new(
                                    format!("expected object key, found {}", describe(&other)),
                                    line,
                                ))
                            }
                        };
                        self.expect_punct(Punct::Colon, "':' after object key")?;
                        entries.push((key, self.assignment()?));
                        if !self.eat_punct(Punct::Comma) {
                            break;
                        }
                    }
                }
                self.expect_punct(Punct::RBrace, "'}' after object literal")?;
                Ok(Expr::Object(entries))
            }
            other => Err(ParseError::new(
                format!("unexpected {}", describe(&other)),
                line,
            )),
        }
    }
}

fn describe(kind: &TokenKind) -> String {
    match kind {
        TokenKind::Ident(name) => format!("identifier '{name}'"),
        TokenKind::Number(n) => format!("number {n}"),
        TokenKind::Str(_) => "string literal".to_string(),
        TokenKind::Keyword(kw) => format!("keyword '{}'", keyword_text(*kw)),
        TokenKind::Punct(p) => format!("'{}'", punct_text(*p)),
        TokenKind::Eof => "end of input".to_string(),
    }
}

fn keyword_text(kw: Keyword) -> &'static str {
    match kw {
        Keyword::Var => "var",
        Keyword::Function => "function",
        Keyword::If => "if",
        Keyword::Else => "else",
        Keyword::While => "while",
        Keyword::For => "for",
        Keyword::Return => "return",
        Keyword::Break => "break",
        Keyword::Continue => "continue",
        Keyword::Typeof => "typeof",
        Keyword::True => "true",
        Keyword::False => "false",
        Keyword::Null => "null",
        Keyword::Undefined => "undefined",
    }
}

fn punct_text(p: Punct) -> &'static str {
    match p {
        Punct::LParen => "(",
        Punct::RParen => ")",
        Punct::LBrace => "{",
        Punct::RBrace => "}",
        Punct::LBracket => "[",
        Punct::RBracket => "]",
        Punct::Comma => ",",
        Punct::Semi => ";",
        Punct::Colon => ":",
        Punct::Dot => ".",
        Punct::Question => "?",
        Punct::Assign => "=",
        Punct::AddAssign => "+=",
        Punct::SubAssign => "-=",
        Punct::EqEq => "==",
        Punct::EqEqEq => "===",
        Punct::NotEq => "!=",
        Punct::NotEqEq => "!==",
        Punct::Lt => "<",
        Punct::Gt => ">",
        Punct::Le => "<=",
        Punct::Ge => ">=",
        Punct::Plus => "+",
        Punct::Minus => "-",
        Punct::Star => "*",
        Punct::Slash => "/",
        Punct::Percent => "%",
        Punct::AndAnd => "&&",
        Punct::OrOr => "||",
        Punct::Not => "!",
        Punct::PlusPlus => "++",
        Punct::MinusMinus => "--",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_var_and_function_declarations() {
        let program = parse(
            "var a = 1, b;\nfunction add(x, y) { return x + y; }\nadd(a, 2);\n",
        )
        .unwrap();
        assert_eq!(program.body.len(), 3);
        assert!(matches!(program.body[0], Stmt::Var { .. }));
        assert!(matches!(program.body[1], Stmt::Function { .. }));
        assert!(matches!(program.body[2], Stmt::Expr { .. }));
    }

    #[test]
    fn parses_control_flow() {
        let src = "\
var i;
for (i = 0; i < 3; i++) {
    if (i == 1) { continue; } else { noop(); }
}
while (false) { break; }
";
        let program = parse(src).unwrap();
        assert_eq!(program.body.len(), 3);
        assert!(matches!(program.body[1], Stmt::For { .. }));
        assert!(matches!(program.body[2], Stmt::While { .. }));
    }

    #[test]
    fn parses_member_index_and_nested_calls() {
        let program = parse("session.variables['caller'] = lookup(get(1).name);").unwrap();
        assert_eq!(program.body.len(), 1);
    }

    #[test]
    fn parses_object_and_array_literals() {
        let program =
            parse("var cfg = { retries: 3, 'max wait': 10, items: [1, 2, 3] };").unwrap();
        let Stmt::Var { decls, .. } = &program.body[0] else {
            panic!("expected var");
        };
        assert!(matches!(decls[0].1, Some(Expr::Object(_))));
    }

    #[test]
    fn parses_conditional_and_logical_operators() {
        let program = parse("var v = a && b || !c ? x + 1 : y - 1;").unwrap();
        assert_eq!(program.body.len(), 1);
    }

    #[test]
    fn parses_function_expressions() {
        let program = parse("var cb = function (x) { return x * 2; };").unwrap();
        let Stmt::Var { decls, .. } = &program.body[0] else {
            panic!("expected var");
        };
        assert!(matches!(decls[0].1, Some(Expr::Function(_))));
    }

    #[test]
    fn reports_syntax_errors_with_line() {
        let err = parse("var ok = 1;\nvar bad = ;\n").unwrap_err();
        assert_eq!(err.line, 2);
        assert!(err.message.contains("unexpected"));
    }

    #[test]
    fn rejects_invalid_assignment_targets() {
        let err = parse("1 = 2;").unwrap_err();
        assert!(err.message.contains("assignment target"));
    }

    #[test]
    fn missing_semicolons_are_tolerated() {
        let program = parse("var a = 1\nvar b = 2\n").unwrap();
        assert_eq!(program.body.len(), 2);
    }

    #[test]
    fn deep_parenthesis_nesting_is_a_syntax_error() {
        let depth = 50_000;
        let src = format!("var deep = {}1{};", "(".repeat(depth), ")".repeat(depth));
        let err = parse(&src).unwrap_err();
        assert!(err.message.contains("nesting too deep"));
    }

    #[test]
    fn deep_block_nesting_is_a_syntax_error() {
        let depth = 50_000;
        let src = format!("{}var x = 1;{}", "{".repeat(depth), "}".repeat(depth));
        let err = parse(&src).unwrap_err();
        assert!(err.message.contains("nesting too deep"));
    }

    #[test]
    fn moderate_nesting_still_parses() {
        let depth = 32;
        let src = format!("var v = {}7{};", "(".repeat(depth), ")".repeat(depth));
        let program = parse(&src).unwrap();
        assert_eq!(program.body.len(), 1);
    }

    #[test]
    fn else_if_chains() {
        let program = parse(
            "if (a) { one(); } else if (b) { two(); } else { three(); }",
        )
        .unwrap();
        assert_eq!(program.body.len(), 1);
    }
}
