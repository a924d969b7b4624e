//! Recursive-descent parser for Malin
//!
//! Binary expressions are parsed with operator-precedence climbing; the
//! precedence of an operator is its numeric value in `BinaryOp`. There is no
//! error recovery: the first unexpected token aborts the file.

use crate::ast::*;
use crate::lexer::{SrcLocationRange, Token, TokenKind, token_kinds_to_string};
use std::fmt;

/// Raised on any unexpected token, carrying the offending token.
#[derive(Debug, Clone)]
pub struct ParseError {
    pub message: String,
    pub token: Token,
}

impl ParseError {
    fn new(message: impl Into<String>, token: Token) -> Self {
        ParseError {
            message: message.into(),
            token,
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at [{}]", self.message, self.token.location)
    }
}

impl std::error::Error for ParseError {}

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Parser { tokens, pos: 0 }
    }

    /// Parse a whole file.
    ///
    /// The token list has to end with an `EndOfFile` token (the lexer
    /// guarantees this).
    pub fn parse(&mut self) -> Result<Root, ParseError> {
        if self.tokens.is_empty() {
            return Err(ParseError::new(
                "can't parse empty file without any token",
                Token::invalid(),
            ));
        }

        let mut root = Root {
            location: Some(self.tokens[0].location),
            ..Root::default()
        };

        while !self.tokens_empty() {
            match self.kind() {
                TokenKind::KeywordLet => {
                    root.globals.push(self.parse_variable_declaration(false)?);
                }
                TokenKind::KeywordFun => {
                    root.functions.push(self.parse_function_declaration()?);
                }
                TokenKind::KeywordClass => {
                    root.classes.push(self.parse_class_declaration()?);
                }
                other => {
                    return Err(ParseError::new(
                        format!("got unexpected token {}", other),
                        self.current().clone(),
                    ));
                }
            }
        }
        self.consume(TokenKind::EndOfFile)?;

        Ok(root)
    }

    /********************************************************
     **** token cursor **************************************
     */

    fn current(&self) -> &Token {
        // the EndOfFile token is never consumed past
        self.tokens.get(self.pos).unwrap_or(&self.tokens[self.tokens.len() - 1])
    }

    /// Kind of the next token that can be consumed.
    fn kind(&self) -> TokenKind {
        self.current().kind
    }

    /// Kind of the token after the next one.
    fn next_kind(&self) -> TokenKind {
        self.tokens
            .get(self.pos + 1)
            .map(|t| t.kind)
            .unwrap_or(TokenKind::EndOfFile)
    }

    fn location(&self) -> SrcLocationRange {
        self.current().location
    }

    fn tokens_empty(&self) -> bool {
        self.kind() == TokenKind::EndOfFile
    }

    /// Consume the next token, which must have the expected kind.
    fn consume(&mut self, kind: TokenKind) -> Result<Token, ParseError> {
        let token = self.current().clone();
        if token.kind == kind {
            if self.pos < self.tokens.len() - 1 {
                self.pos += 1;
            }
            Ok(token)
        } else {
            Err(ParseError::new(
                format!("expected token {} but got token {}", kind, token.kind),
                token,
            ))
        }
    }

    fn unexpected_token<T>(
        &self,
        expected: &[TokenKind],
        phase: &str,
    ) -> Result<T, ParseError> {
        let pre = if phase.is_empty() {
            String::new()
        } else {
            format!("{} ", phase)
        };
        let message = match expected.len() {
            0 => format!("{}got unexpected token {}", pre, self.kind()),
            1 => format!("{}expected {} but got token {}", pre, expected[0], self.kind()),
            _ => format!(
                "{}expected one of {} but got token {}",
                pre,
                token_kinds_to_string(expected),
                self.kind()
            ),
        };
        Err(ParseError::new(message, self.current().clone()))
    }

    /********************************************************
     **** statements ****************************************
     */

    fn parse_statement(&mut self) -> Result<Statement, ParseError> {
        match self.kind() {
            TokenKind::KeywordLet => Ok(Statement::Let(self.parse_variable_declaration(false)?)),
            TokenKind::KeywordReturn => self.parse_return_statement(),
            TokenKind::KeywordIf => self.parse_if_statement(),
            TokenKind::KeywordWhile => self.parse_while_statement(),
            TokenKind::LeftBrace => Ok(Statement::Compound(self.parse_compound_statement()?)),
            _ => {
                let expr = self.parse_expression()?;
                // a variable or member expression followed by '=' is an assignment
                let is_assignable = matches!(
                    expr.kind,
                    ExprKind::Variable(_) | ExprKind::MemberVariable(_)
                );
                let statement = if is_assignable && self.kind() == TokenKind::OperatorAssign {
                    let assign_location = self.consume(TokenKind::OperatorAssign)?.location;
                    let value = self.parse_expression()?;
                    Statement::Assign(AssignStmt {
                        target: expr,
                        value,
                        location: assign_location,
                    })
                } else {
                    Statement::Expr(expr)
                };
                self.consume(TokenKind::Semicolon)?;
                Ok(statement)
            }
        }
    }

    fn parse_return_statement(&mut self) -> Result<Statement, ParseError> {
        let location = self.consume(TokenKind::KeywordReturn)?.location;

        // optional expression
        let expression = if self.kind() != TokenKind::Semicolon {
            Some(self.parse_expression()?)
        } else {
            None
        };
        self.consume(TokenKind::Semicolon)?;

        Ok(Statement::Return(ReturnStmt {
            expression,
            location,
        }))
    }

    fn parse_compound_statement(&mut self) -> Result<CompoundStmt, ParseError> {
        let location = self.consume(TokenKind::LeftBrace)?.location;
        let mut statements = Vec::new();
        while !self.tokens_empty() && self.kind() != TokenKind::RightBrace {
            statements.push(self.parse_statement()?);
        }
        self.consume(TokenKind::RightBrace)?;
        Ok(CompoundStmt {
            statements,
            location,
        })
    }

    fn parse_if_statement(&mut self) -> Result<Statement, ParseError> {
        let location = self.consume(TokenKind::KeywordIf)?.location;

        let condition = self.parse_expression()?;
        let then_body = self.parse_compound_statement()?;
        let else_body = if self.kind() == TokenKind::KeywordElse {
            self.consume(TokenKind::KeywordElse)?;
            Some(self.parse_compound_statement()?)
        } else {
            None
        };

        Ok(Statement::If(IfStmt {
            condition,
            then_body,
            else_body,
            location,
        }))
    }

    fn parse_while_statement(&mut self) -> Result<Statement, ParseError> {
        let location = self.consume(TokenKind::KeywordWhile)?.location;
        let condition = self.parse_expression()?;
        let body = self.parse_compound_statement()?;

        Ok(Statement::While(WhileStmt {
            condition,
            body,
            location,
        }))
    }

    /********************************************************
     **** declarations **************************************
     */

    /// Parse a variable declaration.
    ///
    /// For `let` declarations (`in_class` false) the leading `let` is
    /// consumed, the declared type is optional and the init expression is
    /// required. Class members have a required declared type and an optional
    /// init expression.
    fn parse_variable_declaration(&mut self, in_class: bool) -> Result<VariableDecl, ParseError> {
        if !in_class {
            self.consume(TokenKind::KeywordLet)?;
        }
        let name_token = self.consume(TokenKind::Identifier)?;
        let location = name_token.location;

        // optional type for let, required for members
        let type_name = if self.kind() == TokenKind::Colon {
            self.consume(TokenKind::Colon)?;
            Some(self.consume(TokenKind::Identifier)?.text)
        } else if in_class {
            return self.unexpected_token(&[TokenKind::Colon], "class member variable");
        } else {
            None
        };

        // init value, optional only for class members
        let init = if !in_class || self.kind() == TokenKind::OperatorAssign {
            self.consume(TokenKind::OperatorAssign)?;
            Some(self.parse_expression()?)
        } else {
            None
        };

        self.consume(TokenKind::Semicolon)?;
        Ok(VariableDecl {
            name: name_token.text,
            type_name,
            init,
            location,
            var_id: None,
        })
    }

    fn parse_function_declaration(&mut self) -> Result<FunctionDecl, ParseError> {
        let location = self.consume(TokenKind::KeywordFun)?.location;

        let is_extern = self.kind() == TokenKind::KeywordExtern;
        if is_extern {
            self.consume(TokenKind::KeywordExtern)?;
        }
        let name = self.consume(TokenKind::Identifier)?.text;

        // parameters
        let mut params = Vec::new();
        self.consume(TokenKind::LeftParen)?;
        while !self.tokens_empty() && self.kind() != TokenKind::RightParen {
            params.push(self.parse_function_param_declaration()?);

            if self.kind() == TokenKind::Comma {
                self.consume(TokenKind::Comma)?;
            } else {
                break;
            }
        }
        self.consume(TokenKind::RightParen)?;

        // optional return type, void when absent
        let return_type_name = if self.kind() == TokenKind::Colon {
            self.consume(TokenKind::Colon)?;
            self.consume(TokenKind::Identifier)?.text
        } else {
            "void".to_string()
        };

        // body, or terminating semicolon for extern declarations
        let body = if is_extern {
            self.consume(TokenKind::Semicolon)?;
            None
        } else {
            Some(self.parse_compound_statement()?)
        };

        Ok(FunctionDecl {
            name,
            return_type_name,
            params,
            body,
            is_extern,
            location,
            fun_id: None,
        })
    }

    /// Parse one function parameter. The trailing comma is left to the
    /// caller.
    fn parse_function_param_declaration(&mut self) -> Result<FunctionParamDecl, ParseError> {
        let param_token = self.current().clone();
        let name = self.consume(TokenKind::Identifier)?.text;
        let location = param_token.location;

        self.consume(TokenKind::Colon)?;
        let type_name = self.consume(TokenKind::Identifier)?.text;

        // optional default value, constant expressions only
        let default = if self.kind() == TokenKind::OperatorAssign {
            self.consume(TokenKind::OperatorAssign)?;
            let expr = self.parse_expression()?;
            if !expr.is_const_expr() {
                return Err(ParseError::new(
                    "only const values are supported for default function arguments",
                    param_token,
                ));
            }
            Some(expr)
        } else {
            None
        };

        Ok(FunctionParamDecl {
            name,
            type_name,
            default,
            location,
            var_id: None,
        })
    }

    /// Class declaration with member variables and functions.
    fn parse_class_declaration(&mut self) -> Result<ClassDecl, ParseError> {
        let location = self.consume(TokenKind::KeywordClass)?.location;
        let name = self.consume(TokenKind::Identifier)?.text;

        let mut members = Vec::new();
        let mut methods = Vec::new();
        self.consume(TokenKind::LeftBrace)?;
        while !self.tokens_empty() && self.kind() != TokenKind::RightBrace {
            match self.kind() {
                TokenKind::KeywordFun => methods.push(self.parse_function_declaration()?),
                TokenKind::Identifier => members.push(self.parse_variable_declaration(true)?),
                _ => {
                    return self.unexpected_token(
                        &[TokenKind::KeywordFun, TokenKind::Identifier],
                        "class declaration",
                    );
                }
            }
        }
        self.consume(TokenKind::RightBrace)?;

        Ok(ClassDecl {
            name,
            members,
            methods,
            location,
        })
    }

    /********************************************************
     **** expressions ***************************************
     */

    fn parse_expression(&mut self) -> Result<Expression, ParseError> {
        let lhs = self.parse_primary_expression()?;
        self.parse_binary_expression_rhs(lhs, 0)
    }

    /// An expression that does not start with a binary operator: literals,
    /// identifier expressions, `!`-prefixed primaries and `( ... )`.
    fn parse_primary_expression(&mut self) -> Result<Expression, ParseError> {
        match self.kind() {
            TokenKind::Identifier => self.parse_identifier_expression(None),
            TokenKind::Number => self.parse_number_expression(),
            // a '-' immediately before a number is a signed literal
            TokenKind::OperatorMinus if self.next_kind() == TokenKind::Number => {
                self.parse_number_expression()
            }
            TokenKind::KeywordTrue => {
                let location = self.consume(TokenKind::KeywordTrue)?.location;
                Ok(Expression::new(ExprKind::BoolLiteral(true), location))
            }
            TokenKind::KeywordFalse => {
                let location = self.consume(TokenKind::KeywordFalse)?.location;
                Ok(Expression::new(ExprKind::BoolLiteral(false), location))
            }
            TokenKind::String => {
                let token = self.consume(TokenKind::String)?;
                Ok(Expression::new(
                    ExprKind::StringLiteral(token.text),
                    token.location,
                ))
            }
            TokenKind::OperatorUnaryNot => self.parse_unary_not_expression(),
            TokenKind::LeftParen => self.parse_paren_expression(),
            _ => self.unexpected_token(
                &[
                    TokenKind::Identifier,
                    TokenKind::Number,
                    TokenKind::OperatorMinus,
                    TokenKind::String,
                    TokenKind::LeftParen,
                    TokenKind::KeywordTrue,
                    TokenKind::KeywordFalse,
                ],
                "expression",
            ),
        }
    }

    fn parse_paren_expression(&mut self) -> Result<Expression, ParseError> {
        self.consume(TokenKind::LeftParen)?;
        if self.kind() == TokenKind::RightParen {
            return self.unexpected_token(&[], "empty parentheses, expected an expression but");
        }
        let expr = self.parse_expression()?;
        self.consume(TokenKind::RightParen)?;
        Ok(expr)
    }

    fn parse_unary_not_expression(&mut self) -> Result<Expression, ParseError> {
        let location = self.consume(TokenKind::OperatorUnaryNot)?.location;
        let inner = self.parse_primary_expression()?;
        Ok(Expression::new(
            ExprKind::Unary(UnaryExpr {
                op: UnaryOp::LogicNot,
                inner: Box::new(inner),
            }),
            location,
        ))
    }

    /// A variable expression like `myVar`, a call like `func()` or a member
    /// chain like `myObject.memberProp` / `myObject.method()`.
    fn parse_identifier_expression(
        &mut self,
        previous: Option<Box<Expression>>,
    ) -> Result<Expression, ParseError> {
        // a following '(' makes it a call
        let expr = if self.next_kind() == TokenKind::LeftParen {
            let (call, location) = self.parse_call_expression()?;
            match previous {
                Some(parent) => Expression::new(
                    ExprKind::MemberCall(MemberCallExpr { parent, call }),
                    location,
                ),
                None => Expression::new(ExprKind::Call(call), location),
            }
        } else {
            let name_token = self.consume(TokenKind::Identifier)?;
            match previous {
                Some(parent) => Expression::new(
                    ExprKind::MemberVariable(MemberVariableExpr {
                        parent,
                        name: name_token.text,
                        resolved: None,
                    }),
                    name_token.location,
                ),
                None => Expression::new(
                    ExprKind::Variable(VariableExpr {
                        name: name_token.text,
                        resolved: None,
                    }),
                    name_token.location,
                ),
            }
        };

        // a following '.' continues the member chain
        if self.kind() == TokenKind::Dot {
            self.consume(TokenKind::Dot)?;
            self.parse_identifier_expression(Some(Box::new(expr)))
        } else {
            Ok(expr)
        }
    }

    fn parse_call_expression(&mut self) -> Result<(CallExpr, SrcLocationRange), ParseError> {
        let name_token = self.consume(TokenKind::Identifier)?;

        let mut args = Vec::new();
        let mut named_args = Vec::new();
        let mut got_named_argument = false;

        self.consume(TokenKind::LeftParen)?;
        while !self.tokens_empty() && self.kind() != TokenKind::RightParen {
            let arg_location = self.location();

            // an identifier followed by '=' or ':' is a named argument
            let arg_name = if self.kind() == TokenKind::Identifier
                && (self.next_kind() == TokenKind::OperatorAssign
                    || self.next_kind() == TokenKind::Colon)
            {
                let name = self.consume(TokenKind::Identifier)?.text;
                if self.kind() == TokenKind::OperatorAssign {
                    self.consume(TokenKind::OperatorAssign)?;
                } else {
                    self.consume(TokenKind::Colon)?;
                }
                got_named_argument = true;
                Some(name)
            } else if got_named_argument {
                return Err(ParseError::new(
                    "unnamed arguments are not allowed after named arguments of a function call",
                    self.current().clone(),
                ));
            } else {
                None
            };

            let expression = self.parse_expression()?;
            let arg = CallArg {
                name: arg_name.clone(),
                expression,
                location: arg_location,
            };
            if arg_name.is_some() {
                named_args.push(arg);
            } else {
                args.push(arg);
            }

            if self.kind() == TokenKind::Comma {
                self.consume(TokenKind::Comma)?;
            } else {
                break;
            }
        }
        self.consume(TokenKind::RightParen)?;

        Ok((
            CallExpr {
                name: name_token.text,
                args,
                named_args,
                resolved: None,
            },
            name_token.location,
        ))
    }

    fn parse_number_expression(&mut self) -> Result<Expression, ParseError> {
        let is_negative = self.kind() == TokenKind::OperatorMinus;
        let start = self.location();
        if is_negative {
            self.consume(TokenKind::OperatorMinus)?;
        }
        let number_token = self.consume(TokenKind::Number)?;
        let text = if is_negative {
            format!("-{}", number_token.text)
        } else {
            number_token.text.clone()
        };
        let location = if is_negative {
            SrcLocationRange::span(start.start, number_token.location.last_location())
        } else {
            number_token.location
        };

        // a '.' makes it a floating point literal
        let kind = if text.contains('.') {
            match text.parse::<f32>() {
                Ok(value) => ExprKind::FloatLiteral(value),
                Err(e) => {
                    return Err(ParseError::new(
                        format!("can't convert number literal to a float value: {}", e),
                        number_token,
                    ));
                }
            }
        } else {
            match text.parse::<i32>() {
                Ok(value) => ExprKind::IntLiteral(value),
                Err(e) => {
                    return Err(ParseError::new(
                        format!("can't convert number literal to an integer value: {}", e),
                        number_token,
                    ));
                }
            }
        };

        Ok(Expression::new(kind, location))
    }

    /// Parse a chain like `a + b * c - d ...` with precedence climbing.
    ///
    /// Operators are consumed only while their precedence is at least
    /// `precedence_higher_than`; the right-hand side recurses with the
    /// current precedence plus one, which makes same-precedence chains
    /// left-associative.
    fn parse_binary_expression_rhs(
        &mut self,
        mut lhs: Expression,
        precedence_higher_than: u32,
    ) -> Result<Expression, ParseError> {
        loop {
            let current_op = match BinaryOp::from_token(self.kind()) {
                Some(op) if op.precedence() >= precedence_higher_than => op,
                _ => return Ok(lhs),
            };

            let op_location = self.consume(self.kind())?.location;
            let mut rhs = self.parse_primary_expression()?;

            // bind stronger following operators to the right-hand side first
            if let Some(next_op) = BinaryOp::from_token(self.kind()) {
                if current_op.precedence() < next_op.precedence() {
                    rhs = self.parse_binary_expression_rhs(rhs, current_op.precedence() + 1)?;
                }
            }

            lhs = Expression::new(
                ExprKind::Binary(BinaryExpr {
                    op: current_op,
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                }),
                op_location,
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Lexer;

    fn parse(source: &str) -> Root {
        let tokens = Lexer::new(source).tokens().expect("lexing failed");
        Parser::new(tokens).parse().expect("parsing failed")
    }

    fn parse_err(source: &str) -> ParseError {
        let tokens = Lexer::new(source).tokens().expect("lexing failed");
        Parser::new(tokens)
            .parse()
            .expect_err("expected a parse error")
    }

    /// Parse `source` as the init expression of a global.
    fn parse_expr(source: &str) -> Expression {
        let root = parse(&format!("let x = {};", source));
        root.globals.into_iter().next().unwrap().init.unwrap()
    }

    fn binary_parts(expr: &Expression) -> (&BinaryExpr, BinaryOp) {
        match &expr.kind {
            ExprKind::Binary(b) => (b, b.op),
            other => panic!("expected binary expression, got {:?}", other),
        }
    }

    #[test]
    fn test_global_variable_with_type() {
        let root = parse("let x: i32 = 42;");
        assert_eq!(root.globals.len(), 1);
        let var = &root.globals[0];
        assert_eq!(var.name, "x");
        assert_eq!(var.type_name.as_deref(), Some("i32"));
        assert!(matches!(
            var.init.as_ref().unwrap().kind,
            ExprKind::IntLiteral(42)
        ));
    }

    #[test]
    fn test_global_variable_inferred() {
        let root = parse("let y = 1.5;");
        let var = &root.globals[0];
        assert_eq!(var.type_name, None);
        assert!(matches!(
            var.init.as_ref().unwrap().kind,
            ExprKind::FloatLiteral(_)
        ));
    }

    #[test]
    fn test_precedence_mul_over_add() {
        // 1 + 2 * 3 parses as 1 + (2 * 3)
        let expr = parse_expr("1 + 2 * 3");
        let (add, op) = binary_parts(&expr);
        assert_eq!(op, BinaryOp::Plus);
        assert!(matches!(add.lhs.kind, ExprKind::IntLiteral(1)));
        let (mul, op) = binary_parts(&add.rhs);
        assert_eq!(op, BinaryOp::Multiply);
        assert!(matches!(mul.lhs.kind, ExprKind::IntLiteral(2)));
        assert!(matches!(mul.rhs.kind, ExprKind::IntLiteral(3)));
    }

    #[test]
    fn test_same_precedence_is_left_associative() {
        // 1 * 2 * 3 parses as (1 * 2) * 3
        let expr = parse_expr("1 * 2 * 3");
        let (outer, op) = binary_parts(&expr);
        assert_eq!(op, BinaryOp::Multiply);
        assert!(matches!(outer.rhs.kind, ExprKind::IntLiteral(3)));
        let (inner, _) = binary_parts(&outer.lhs);
        assert!(matches!(inner.lhs.kind, ExprKind::IntLiteral(1)));
        assert!(matches!(inner.rhs.kind, ExprKind::IntLiteral(2)));
    }

    #[test]
    fn test_comparison_binds_weaker_than_arithmetic() {
        // a + 1 < b * 2 parses as (a + 1) < (b * 2)
        let expr = parse_expr("a + 1 < b * 2");
        let (cmp, op) = binary_parts(&expr);
        assert_eq!(op, BinaryOp::LessThen);
        let (_, lhs_op) = binary_parts(&cmp.lhs);
        assert_eq!(lhs_op, BinaryOp::Plus);
        let (_, rhs_op) = binary_parts(&cmp.rhs);
        assert_eq!(rhs_op, BinaryOp::Multiply);
    }

    #[test]
    fn test_logic_or_binds_weakest() {
        let expr = parse_expr("a && b || c");
        let (or, op) = binary_parts(&expr);
        assert_eq!(op, BinaryOp::LogicOr);
        let (_, lhs_op) = binary_parts(&or.lhs);
        assert_eq!(lhs_op, BinaryOp::LogicAnd);
    }

    #[test]
    fn test_parens_override_precedence() {
        let expr = parse_expr("(1 + 2) * 3");
        let (mul, op) = binary_parts(&expr);
        assert_eq!(op, BinaryOp::Multiply);
        let (_, lhs_op) = binary_parts(&mul.lhs);
        assert_eq!(lhs_op, BinaryOp::Plus);
    }

    #[test]
    fn test_negative_number_literal() {
        let expr = parse_expr("-5");
        assert!(matches!(expr.kind, ExprKind::IntLiteral(-5)));
        let expr = parse_expr("-2.5");
        match expr.kind {
            ExprKind::FloatLiteral(v) => assert_eq!(v, -2.5),
            other => panic!("expected float literal, got {:?}", other),
        }
    }

    #[test]
    fn test_minus_between_numbers_is_binary() {
        // the '-' is consumed as a binary operator before the primary starts
        let expr = parse_expr("3 - 1");
        let (_, op) = binary_parts(&expr);
        assert_eq!(op, BinaryOp::Minus);
    }

    #[test]
    fn test_unary_not() {
        let expr = parse_expr("!true");
        match &expr.kind {
            ExprKind::Unary(u) => {
                assert_eq!(u.op, UnaryOp::LogicNot);
                assert!(matches!(u.inner.kind, ExprKind::BoolLiteral(true)));
            }
            other => panic!("expected unary expression, got {:?}", other),
        }
    }

    #[test]
    fn test_function_declaration() {
        let root = parse("fun main(): i32 { return 1; }");
        assert_eq!(root.functions.len(), 1);
        let func = &root.functions[0];
        assert_eq!(func.name, "main");
        assert_eq!(func.return_type_name, "i32");
        assert!(!func.is_extern);
        assert_eq!(func.body.as_ref().unwrap().statements.len(), 1);
    }

    #[test]
    fn test_function_without_return_type_is_void() {
        let root = parse("fun f() { }");
        assert_eq!(root.functions[0].return_type_name, "void");
    }

    #[test]
    fn test_extern_function() {
        let root = parse("fun extern printNum(num: i32);");
        let func = &root.functions[0];
        assert!(func.is_extern);
        assert!(func.body.is_none());
        assert_eq!(func.params.len(), 1);
        assert_eq!(func.params[0].type_name, "i32");
    }

    #[test]
    fn test_function_with_default_param() {
        let root = parse("fun f(a: i32, b: i32 = 10): i32 { return a; }");
        let func = &root.functions[0];
        assert_eq!(func.params.len(), 2);
        assert!(func.params[0].default.is_none());
        assert!(matches!(
            func.params[1].default.as_ref().unwrap().kind,
            ExprKind::IntLiteral(10)
        ));
    }

    #[test]
    fn test_non_const_default_param_fails() {
        let err = parse_err("fun f(a: i32 = 1 + 2) { }");
        assert!(err.message.contains("only const values"));
    }

    #[test]
    fn test_call_with_positional_and_named_args() {
        let expr = parse_expr("f(1, b = 2, c: 3)");
        match &expr.kind {
            ExprKind::Call(call) => {
                assert_eq!(call.name, "f");
                assert_eq!(call.args.len(), 1);
                assert_eq!(call.named_args.len(), 2);
                assert_eq!(call.named_args[0].name.as_deref(), Some("b"));
                assert_eq!(call.named_args[1].name.as_deref(), Some("c"));
            }
            other => panic!("expected call, got {:?}", other),
        }
    }

    #[test]
    fn test_positional_after_named_fails() {
        let err = parse_err("let x = f(a = 1, 2);");
        assert!(err.message.contains("unnamed arguments are not allowed"));
    }

    #[test]
    fn test_member_variable_chain() {
        let expr = parse_expr("obj.inner.value");
        match &expr.kind {
            ExprKind::MemberVariable(outer) => {
                assert_eq!(outer.name, "value");
                match &outer.parent.kind {
                    ExprKind::MemberVariable(inner) => {
                        assert_eq!(inner.name, "inner");
                        assert!(matches!(inner.parent.kind, ExprKind::Variable(_)));
                    }
                    other => panic!("expected member variable, got {:?}", other),
                }
            }
            other => panic!("expected member variable, got {:?}", other),
        }
    }

    #[test]
    fn test_member_call() {
        let expr = parse_expr("obj.method(1)");
        match &expr.kind {
            ExprKind::MemberCall(mc) => {
                assert_eq!(mc.call.name, "method");
                assert!(matches!(mc.parent.kind, ExprKind::Variable(_)));
            }
            other => panic!("expected member call, got {:?}", other),
        }
    }

    #[test]
    fn test_class_declaration() {
        let root = parse(
            "class Point {\n  x: i32;\n  y: i32 = 0;\n  fun sum(): i32 { return x + y; }\n}",
        );
        assert_eq!(root.classes.len(), 1);
        let class = &root.classes[0];
        assert_eq!(class.name, "Point");
        assert_eq!(class.members.len(), 2);
        assert_eq!(class.methods.len(), 1);
        assert!(class.members[0].init.is_none());
        assert!(class.members[1].init.is_some());
    }

    #[test]
    fn test_class_member_without_type_fails() {
        let err = parse_err("class A { x = 5; }");
        assert!(err.message.contains("expected Colon"));
    }

    #[test]
    fn test_statements() {
        let root = parse(
            "fun f(): i32 {\n  let a = 1;\n  a = 2;\n  if a > 1 { a = 3; } else { a = 4; }\n  while a < 10 { a = a + 1; }\n  return a;\n}",
        );
        let body = root.functions[0].body.as_ref().unwrap();
        assert!(matches!(body.statements[0], Statement::Let(_)));
        assert!(matches!(body.statements[1], Statement::Assign(_)));
        assert!(matches!(body.statements[2], Statement::If(_)));
        assert!(matches!(body.statements[3], Statement::While(_)));
        assert!(matches!(body.statements[4], Statement::Return(_)));
    }

    #[test]
    fn test_member_assign_statement() {
        let root = parse("fun f() { obj.x = 1; }");
        let body = root.functions[0].body.as_ref().unwrap();
        match &body.statements[0] {
            Statement::Assign(assign) => {
                assert!(matches!(assign.target.kind, ExprKind::MemberVariable(_)));
            }
            other => panic!("expected assignment, got {:?}", other),
        }
    }

    #[test]
    fn test_unexpected_token_message() {
        let err = parse_err("let 5 = 1;");
        assert!(err.message.contains("expected token Identifier"));
        assert_eq!(err.token.kind, TokenKind::Number);
    }

    #[test]
    fn test_missing_semicolon_fails() {
        let err = parse_err("let x = 1");
        assert!(err.message.contains("Semicolon"));
    }

    #[test]
    fn test_parser_is_deterministic() {
        let source = "fun main(): i32 { let a = 1 + 2 * 3; return a; }";
        let first = parse(source);
        let second = parse(source);
        assert_eq!(first, second);
    }

    #[test]
    fn test_return_without_expression() {
        let root = parse("fun f() { return; }");
        let body = root.functions[0].body.as_ref().unwrap();
        match &body.statements[0] {
            Statement::Return(ret) => assert!(ret.expression.is_none()),
            other => panic!("expected return, got {:?}", other),
        }
    }
}
