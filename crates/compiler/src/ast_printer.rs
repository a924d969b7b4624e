//! AST printers
//!
//! `AstPrinter` dumps the tree with one indented line per node, optionally
//! with the resolved types after decoration. `AstCodePrinter` renders a
//! subtree back to source text; the IR generator uses it for the comments
//! it leaves ahead of lowered conditions.

use crate::ast::*;
use crate::decorator::Symbols;

/// Indented tree dump of the AST.
pub struct AstPrinter<'s> {
    symbols: Option<&'s Symbols>,
    out: String,
}

impl<'s> AstPrinter<'s> {
    /// Printer for the undecorated tree.
    pub fn new() -> Self {
        AstPrinter {
            symbols: None,
            out: String::new(),
        }
    }

    /// Printer that also shows the resolved types.
    pub fn with_symbols(symbols: &'s Symbols) -> Self {
        AstPrinter {
            symbols: Some(symbols),
            out: String::new(),
        }
    }

    pub fn print(mut self, root: &Root) -> String {
        self.line(0, format!("RootDeclarations() at {}", location_str(&root.location)));
        if !root.classes.is_empty() {
            self.line(0, "> classes:".to_string());
            for class in &root.classes {
                self.print_class(1, class);
            }
        }
        self.line(0, "> global vars:".to_string());
        for global in &root.globals {
            self.print_variable_decl(1, global);
        }
        self.line(0, "> functions:".to_string());
        for function in &root.functions {
            self.print_function(1, function);
        }
        self.out
    }

    fn line(&mut self, depth: usize, text: String) {
        for _ in 0..depth {
            self.out.push_str("    ");
        }
        self.out.push_str(&text);
        self.out.push('\n');
    }

    fn type_line(&mut self, depth: usize, ty: &LangType) {
        if let Some(symbols) = self.symbols {
            if !ty.is_invalid() {
                self.line(depth, format!("Type({})", symbols.type_name(ty)));
            }
        }
    }

    fn print_class(&mut self, depth: usize, class: &ClassDecl) {
        self.line(
            depth,
            format!("ClassDeclaration(name: {}) at {}", class.name, class.location),
        );
        for member in &class.members {
            self.print_variable_decl(depth + 1, member);
        }
        for method in &class.methods {
            self.print_function(depth + 1, method);
        }
    }

    fn print_variable_decl(&mut self, depth: usize, decl: &VariableDecl) {
        self.line(
            depth,
            format!(
                "VariableDeclaration(name: {}, type: {}) at {}",
                decl.name,
                decl.type_name.as_deref().unwrap_or("<inferred>"),
                decl.location
            ),
        );
        if let (Some(symbols), Some(var_id)) = (self.symbols, decl.var_id) {
            let ty = symbols.var(var_id).ty.clone();
            self.type_line(depth + 1, &ty);
        }
        if let Some(init) = &decl.init {
            self.line(depth, "> init:".to_string());
            self.print_expression(depth + 1, init);
        }
    }

    fn print_function(&mut self, depth: usize, function: &FunctionDecl) {
        self.line(
            depth,
            format!(
                "FunctionDeclaration(name: {}, type: {}{}) at {}",
                function.name,
                function.return_type_name,
                if function.is_extern { ", extern" } else { "" },
                function.location
            ),
        );
        if !function.params.is_empty() {
            self.line(depth, "> arguments:".to_string());
            for param in &function.params {
                self.line(
                    depth + 1,
                    format!(
                        "FunctionParamDeclaration(name: {}, type: {}) at {}",
                        param.name, param.type_name, param.location
                    ),
                );
                if let Some(default) = &param.default {
                    self.line(depth + 1, "> default:".to_string());
                    self.print_expression(depth + 2, default);
                }
            }
        }
        if let Some(body) = &function.body {
            self.line(depth, "> body:".to_string());
            self.print_compound(depth + 1, body);
        }
    }

    fn print_compound(&mut self, depth: usize, compound: &CompoundStmt) {
        self.line(
            depth,
            format!("CompoundStatement() at {}", compound.location),
        );
        for statement in &compound.statements {
            self.print_statement(depth + 1, statement);
        }
    }

    fn print_statement(&mut self, depth: usize, statement: &Statement) {
        match statement {
            Statement::Compound(compound) => self.print_compound(depth, compound),
            Statement::Return(ret) => {
                self.line(depth, format!("ReturnStatement() at {}", ret.location));
                if let Some(expr) = &ret.expression {
                    self.line(depth, "> expression:".to_string());
                    self.print_expression(depth + 1, expr);
                }
            }
            Statement::If(if_stmt) => {
                self.line(depth, format!("IfStatement() at {}", if_stmt.location));
                self.line(depth, "> condition:".to_string());
                self.print_expression(depth + 1, &if_stmt.condition);
                self.line(depth, "> then:".to_string());
                self.print_compound(depth + 1, &if_stmt.then_body);
                if let Some(else_body) = &if_stmt.else_body {
                    self.line(depth, "> else:".to_string());
                    self.print_compound(depth + 1, else_body);
                }
            }
            Statement::While(while_stmt) => {
                self.line(depth, format!("WhileStatement() at {}", while_stmt.location));
                self.line(depth, "> condition:".to_string());
                self.print_expression(depth + 1, &while_stmt.condition);
                self.line(depth, "> body:".to_string());
                self.print_compound(depth + 1, &while_stmt.body);
            }
            Statement::Assign(assign) => {
                self.line(
                    depth,
                    format!("VariableAssignStatement() at {}", assign.location),
                );
                self.line(depth, "> variable:".to_string());
                self.print_expression(depth + 1, &assign.target);
                self.line(depth, "> value:".to_string());
                self.print_expression(depth + 1, &assign.value);
            }
            Statement::Let(decl) => self.print_variable_decl(depth, decl),
            Statement::Expr(expr) => self.print_expression(depth, expr),
        }
    }

    fn print_expression(&mut self, depth: usize, expr: &Expression) {
        match &expr.kind {
            ExprKind::IntLiteral(value) => {
                self.line(
                    depth,
                    format!("NumberIntExpression(value: {}) at {}", value, expr.location),
                );
            }
            ExprKind::FloatLiteral(value) => {
                self.line(
                    depth,
                    format!("NumberFloatExpression(value: {}) at {}", value, expr.location),
                );
            }
            ExprKind::BoolLiteral(value) => {
                self.line(
                    depth,
                    format!("BoolExpression(value: {}) at {}", value, expr.location),
                );
            }
            ExprKind::StringLiteral(value) => {
                self.line(
                    depth,
                    format!("StringExpression(value: {}) at {}", value, expr.location),
                );
            }
            ExprKind::Variable(variable) => {
                self.line(
                    depth,
                    format!(
                        "VariableExpression(name: {}) at {}",
                        variable.name, expr.location
                    ),
                );
            }
            ExprKind::MemberVariable(member) => {
                self.line(
                    depth,
                    format!(
                        "MemberVariableExpression(name: {}) at {}",
                        member.name, expr.location
                    ),
                );
                self.line(depth, "> parent:".to_string());
                self.print_expression(depth + 1, &member.parent);
            }
            ExprKind::Call(call) => {
                self.line(
                    depth,
                    format!("CallExpression(calledName: {}) at {}", call.name, expr.location),
                );
                self.print_call_args(depth, call);
            }
            ExprKind::MemberCall(member_call) => {
                self.line(
                    depth,
                    format!(
                        "MemberCallExpression(calledName: {}) at {}",
                        member_call.call.name, expr.location
                    ),
                );
                self.line(depth, "> parent:".to_string());
                self.print_expression(depth + 1, &member_call.parent);
                self.print_call_args(depth, &member_call.call);
            }
            ExprKind::Unary(unary) => {
                self.line(
                    depth,
                    format!(
                        "UnaryExpression(operation: {}) at {}",
                        unary.op, expr.location
                    ),
                );
                self.print_expression(depth + 1, &unary.inner);
            }
            ExprKind::Binary(binary) => {
                self.line(
                    depth,
                    format!(
                        "BinaryExpression(operation: {}) at {}",
                        binary.op, expr.location
                    ),
                );
                self.line(depth, "> lhs:".to_string());
                self.print_expression(depth + 1, &binary.lhs);
                self.line(depth, "> rhs:".to_string());
                self.print_expression(depth + 1, &binary.rhs);
            }
        }
        if self.symbols.is_some() {
            self.type_line(depth + 1, &expr.result_type);
        }
    }

    fn print_call_args(&mut self, depth: usize, call: &CallExpr) {
        if !call.args.is_empty() {
            self.line(depth, "> arguments:".to_string());
            for arg in &call.args {
                self.print_expression(depth + 1, &arg.expression);
            }
        }
        if !call.named_args.is_empty() {
            self.line(depth, "> arguments-named:".to_string());
            for arg in &call.named_args {
                self.line(
                    depth + 1,
                    format!(
                        "CallExpressionArgument(argName: {}) at {}",
                        arg.name.as_deref().unwrap_or("?"),
                        arg.location
                    ),
                );
                self.print_expression(depth + 2, &arg.expression);
            }
        }
    }
}

impl Default for AstPrinter<'_> {
    fn default() -> Self {
        Self::new()
    }
}

fn location_str(location: &Option<crate::lexer::SrcLocationRange>) -> String {
    match location {
        Some(range) => range.to_string(),
        None => "?".to_string(),
    }
}

/********************************************************
 **** source rendering **********************************
 */

/// Render an expression back as source text.
pub fn expression_as_code(expr: &Expression) -> String {
    match &expr.kind {
        ExprKind::IntLiteral(value) => value.to_string(),
        ExprKind::FloatLiteral(value) => float_literal(*value),
        ExprKind::BoolLiteral(value) => value.to_string(),
        ExprKind::StringLiteral(value) => format!("\"{}\"", value),
        ExprKind::Variable(variable) => variable.name.clone(),
        ExprKind::MemberVariable(member) => {
            format!("{}.{}", expression_as_code(&member.parent), member.name)
        }
        ExprKind::Call(call) => call_as_code(call),
        ExprKind::MemberCall(member_call) => format!(
            "{}.{}",
            expression_as_code(&member_call.parent),
            call_as_code(&member_call.call)
        ),
        ExprKind::Unary(unary) => format!("{}{}", unary.op, expression_as_code(&unary.inner)),
        ExprKind::Binary(binary) => format!(
            "{} {} {}",
            binary_operand_code(&binary.lhs, binary.op, false),
            binary.op,
            binary_operand_code(&binary.rhs, binary.op, true)
        ),
    }
}

/// Floats keep a fraction part so the rendering re-parses as a float.
fn float_literal(value: f32) -> String {
    let text = value.to_string();
    if text.contains('.') { text } else { format!("{}.0", text) }
}

fn call_as_code(call: &CallExpr) -> String {
    let mut parts: Vec<String> = call
        .args
        .iter()
        .map(|arg| expression_as_code(&arg.expression))
        .collect();
    parts.extend(
        call.named_args
            .iter()
            .map(|arg| {
                format!(
                    "{} = {}",
                    arg.name.as_deref().unwrap_or("?"),
                    expression_as_code(&arg.expression)
                )
            }),
    );
    format!("{}({})", call.name, parts.join(", "))
}

/// Parenthesise operands that bind weaker than the surrounding operator.
fn binary_operand_code(operand: &Expression, parent_op: BinaryOp, is_rhs: bool) -> String {
    let code = expression_as_code(operand);
    if let ExprKind::Binary(child) = &operand.kind {
        let needs_parens = if is_rhs {
            child.op.precedence() <= parent_op.precedence()
        } else {
            child.op.precedence() < parent_op.precedence()
        };
        if needs_parens {
            return format!("({})", code);
        }
    }
    code
}

/// Render a whole root back as source text.
pub fn root_as_code(root: &Root) -> String {
    let mut out = String::new();
    for class in &root.classes {
        out.push_str(&format!("class {} {{\n", class.name));
        for member in &class.members {
            out.push_str(&format!("    {};\n", variable_decl_as_code(member, true)));
        }
        for method in &class.methods {
            out.push_str(&function_as_code(method, 1));
        }
        out.push_str("}\n\n");
    }
    for global in &root.globals {
        out.push_str(&format!("{};\n", variable_decl_as_code(global, false)));
    }
    if !root.globals.is_empty() {
        out.push('\n');
    }
    for function in &root.functions {
        out.push_str(&function_as_code(function, 0));
        out.push('\n');
    }
    out
}

fn variable_decl_as_code(decl: &VariableDecl, is_member: bool) -> String {
    let mut out = String::new();
    if !is_member {
        out.push_str("let ");
    }
    out.push_str(&decl.name);
    if let Some(type_name) = &decl.type_name {
        out.push_str(&format!(": {}", type_name));
    }
    if let Some(init) = &decl.init {
        out.push_str(&format!(" = {}", expression_as_code(init)));
    }
    out
}

fn function_as_code(function: &FunctionDecl, depth: usize) -> String {
    let indent = "    ".repeat(depth);
    let params: Vec<String> = function
        .params
        .iter()
        .map(|param| {
            let mut out = format!("{}: {}", param.name, param.type_name);
            if let Some(default) = &param.default {
                out.push_str(&format!(" = {}", expression_as_code(default)));
            }
            out
        })
        .collect();
    let header = format!(
        "{}fun {}{}({}): {}",
        indent,
        if function.is_extern { "extern " } else { "" },
        function.name,
        params.join(", "),
        function.return_type_name
    );
    match &function.body {
        None => format!("{};\n", header),
        Some(body) => format!("{} {}\n", header, compound_as_code(body, depth)),
    }
}

fn compound_as_code(compound: &CompoundStmt, depth: usize) -> String {
    let indent = "    ".repeat(depth);
    let mut out = String::from("{\n");
    for statement in &compound.statements {
        out.push_str(&statement_as_code(statement, depth + 1));
    }
    out.push_str(&format!("{}}}", indent));
    out
}

fn statement_as_code(statement: &Statement, depth: usize) -> String {
    let indent = "    ".repeat(depth);
    match statement {
        Statement::Compound(compound) => {
            format!("{}{}\n", indent, compound_as_code(compound, depth))
        }
        Statement::Return(ret) => match &ret.expression {
            Some(expr) => format!("{}return {};\n", indent, expression_as_code(expr)),
            None => format!("{}return;\n", indent),
        },
        Statement::If(if_stmt) => {
            let mut out = format!(
                "{}if {} {}",
                indent,
                expression_as_code(&if_stmt.condition),
                compound_as_code(&if_stmt.then_body, depth)
            );
            if let Some(else_body) = &if_stmt.else_body {
                out.push_str(&format!(" else {}", compound_as_code(else_body, depth)));
            }
            out.push('\n');
            out
        }
        Statement::While(while_stmt) => format!(
            "{}while {} {}\n",
            indent,
            expression_as_code(&while_stmt.condition),
            compound_as_code(&while_stmt.body, depth)
        ),
        Statement::Assign(assign) => format!(
            "{}{} = {};\n",
            indent,
            expression_as_code(&assign.target),
            expression_as_code(&assign.value)
        ),
        Statement::Let(decl) => format!("{}{};\n", indent, variable_decl_as_code(decl, false)),
        Statement::Expr(expr) => format!("{}{};\n", indent, expression_as_code(expr)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Lexer;
    use crate::parser::Parser;

    fn parse(source: &str) -> Root {
        let tokens = Lexer::new(source).tokens().expect("lexing failed");
        Parser::new(tokens).parse().expect("parsing failed")
    }

    fn first_global_init(source: &str) -> Expression {
        parse(source).globals.into_iter().next().unwrap().init.unwrap()
    }

    #[test]
    fn test_expression_code_respects_precedence() {
        let expr = first_global_init("let x = 1 + 2 * 3;");
        assert_eq!(expression_as_code(&expr), "1 + 2 * 3");
        let expr = first_global_init("let x = (1 + 2) * 3;");
        assert_eq!(expression_as_code(&expr), "(1 + 2) * 3");
    }

    #[test]
    fn test_expression_code_for_calls_and_members() {
        let expr = first_global_init("let x = obj.f(1, n = 2);");
        assert_eq!(expression_as_code(&expr), "obj.f(1, n = 2)");
        let expr = first_global_init("let x = a.b.c;");
        assert_eq!(expression_as_code(&expr), "a.b.c");
    }

    #[test]
    fn test_float_literal_keeps_fraction() {
        let expr = first_global_init("let x = 2.0;");
        assert_eq!(expression_as_code(&expr), "2.0");
    }

    #[test]
    fn test_unary_and_bool_code() {
        let expr = first_global_init("let x = !true;");
        assert_eq!(expression_as_code(&expr), "!true");
    }

    #[test]
    fn test_root_as_code_round_trips_through_parser() {
        let source = "let g: i32 = 1 + 2;\n\nfun extern printNum(num: i32): void;\nfun main(): i32 {\n    let a = 3;\n    if a > 2 {\n        printNum(a);\n    }\n    return a;\n}\n";
        let root = parse(source);
        let rendered = root_as_code(&root);
        // rendering is stable under a parse round trip
        let reparsed = parse(&rendered);
        assert_eq!(root_as_code(&reparsed), rendered);
    }

    #[test]
    fn test_tree_dump_contains_node_lines() {
        let root = parse("fun main(): i32 { return 1 + 2; }");
        let dump = AstPrinter::new().print(&root);
        assert!(dump.contains("RootDeclarations()"));
        assert!(dump.contains("FunctionDeclaration(name: main, type: i32)"));
        assert!(dump.contains("BinaryExpression(operation: +)"));
        assert!(dump.contains("NumberIntExpression(value: 1)"));
    }

    #[test]
    fn test_decorated_dump_shows_types() {
        let mut root = parse("fun main(): i32 { return 1 + 2; }");
        let mut diags = crate::diagnostics::Diagnostics::new();
        let symbols = crate::decorator::decorate(&mut root, &mut diags);
        assert!(!diags.has_errors());
        let dump = AstPrinter::with_symbols(&symbols).print(&root);
        assert!(dump.contains("Type(i32)"));
    }
}
