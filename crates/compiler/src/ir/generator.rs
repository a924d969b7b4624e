//! IR generation: decorated AST → IR
//!
//! Function and global definitions are emitted before any body is lowered
//! so calls resolve forward. Global initialisers and argument defaults are
//! lowered through the builder's holding block and moved into the module's
//! constant-initialiser list. Surface constructs the IR path does not cover
//! (string values, classes) are reported as user-facing errors; an internal
//! error means a bug in the generator and aborts.

use super::builder::IRBuilder;
use super::*;
use crate::ast::*;
use crate::ast_printer::expression_as_code;
use crate::decorator::Symbols;
use crate::diagnostics::Diagnostics;
use crate::ir::passes::{ModulePass, RemoveRedundantTerminatorsPass};
use crate::lexer::SrcLocationRange;
use std::collections::HashMap;
use std::fmt;

/// Error of the IR generator.
///
/// `User` errors describe malin programs the IR path does not support and
/// are accumulated as diagnostics. `Internal` errors are generator bugs and
/// abort the run.
#[derive(Debug, Clone)]
pub enum IRGenError {
    User {
        message: String,
        location: SrcLocationRange,
    },
    Internal {
        message: String,
        location: SrcLocationRange,
    },
}

impl IRGenError {
    fn user(message: impl Into<String>, location: SrcLocationRange) -> Self {
        IRGenError::User {
            message: message.into(),
            location,
        }
    }

    fn internal(message: impl Into<String>, location: SrcLocationRange) -> Self {
        IRGenError::Internal {
            message: message.into(),
            location,
        }
    }

    pub fn location(&self) -> SrcLocationRange {
        match self {
            IRGenError::User { location, .. } | IRGenError::Internal { location, .. } => *location,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            IRGenError::User { message, .. } | IRGenError::Internal { message, .. } => message,
        }
    }
}

impl fmt::Display for IRGenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IRGenError::User { message, location } => write!(f, "{} at {}", message, location),
            IRGenError::Internal { message, location } => {
                write!(f, "ir generation internal error: {} at {}", message, location)
            }
        }
    }
}

impl std::error::Error for IRGenError {}

/// Generate the IR module for a decorated root.
///
/// User-facing problems are accumulated in `diags`; the returned `Err` is
/// reserved for internal generator errors.
pub fn generate(
    root: &Root,
    symbols: &Symbols,
    source_file_name: &str,
    diags: &mut Diagnostics,
) -> Result<IRModule, IRGenError> {
    let mut generator = IRGenerator {
        symbols,
        diags,
        builder: IRBuilder::new(source_file_name),
        var_values: HashMap::new(),
        fun_values: HashMap::new(),
    };

    // definitions first so bodies can reference everything
    for global in &root.globals {
        generator.gen_global_definition(global);
    }
    for function in &root.functions {
        let result = generator.gen_function_definition(function);
        generator.report_unless_internal(result)?;
    }
    for class in &root.classes {
        generator
            .diags
            .error("classes are not lowered to IR yet", class.location);
    }

    for global in &root.globals {
        let result = generator.lower_global_init(global);
        generator.report_unless_internal(result)?;
    }
    for function in &root.functions {
        let result = generator.lower_function_body(function);
        generator.report_unless_internal(result)?;
    }

    let mut module = generator.builder.finish();

    // enforce the basic-block invariant: nothing after the first terminator
    RemoveRedundantTerminatorsPass.run(&mut module, ());

    Ok(module)
}

struct IRGenerator<'a> {
    symbols: &'a Symbols,
    diags: &'a mut Diagnostics,
    builder: IRBuilder,
    /// variable declaration -> its pointer value (alloca or global)
    var_values: HashMap<VarId, ValueId>,
    /// function signature -> IR function
    fun_values: HashMap<FunId, FunctionId>,
}

impl IRGenerator<'_> {
    /// Turn a user error into a diagnostic; pass internal errors through.
    fn report_unless_internal(&mut self, result: Result<(), IRGenError>) -> Result<(), IRGenError> {
        match result {
            Ok(()) => Ok(()),
            Err(IRGenError::User { message, location }) => {
                self.diags.error(message, location);
                Ok(())
            }
            Err(internal) => Err(internal),
        }
    }

    /********************************************************
     **** definitions ***************************************
     */

    /// Emit the global variable value, without its init.
    fn gen_global_definition(&mut self, decl: &VariableDecl) {
        let Some(var_id) = decl.var_id else {
            return;
        };
        let ty = &self.symbols.var(var_id).ty;
        let ir_type = lang_type_to_ir_type(ty);
        if matches!(ir_type, IRType::Invalid | IRType::Void) {
            self.diags.error(
                "only builtin types are supported for global variables in IR",
                decl.location,
            );
            return;
        }
        let value = self
            .builder
            .global_var(decl.name.clone(), IRType::pointer_to(ir_type));
        self.var_values.insert(var_id, value);
    }

    /// Emit the function and its argument values, without the body.
    fn gen_function_definition(&mut self, decl: &FunctionDecl) -> Result<(), IRGenError> {
        let Some(fun_id) = decl.fun_id else {
            return Ok(());
        };
        let sig = self.symbols.function(fun_id).clone();

        let return_type = lang_type_to_ir_type(&sig.return_type);
        if matches!(return_type, IRType::Invalid) {
            return Err(IRGenError::user(
                format!(
                    "return type '{}' of function '{}' is not supported in IR",
                    self.symbols.type_name(&sig.return_type),
                    sig.name
                ),
                decl.location,
            ));
        }

        let function = self
            .builder
            .function(sig.name.clone(), return_type, sig.is_extern);
        self.fun_values.insert(fun_id, function);

        for param in &sig.params {
            let param_type = lang_type_to_ir_type(&param.ty);
            if matches!(param_type, IRType::Invalid | IRType::Void) {
                return Err(IRGenError::user(
                    format!(
                        "type '{}' of argument '{}' is not supported in IR",
                        self.symbols.type_name(&param.ty),
                        param.name
                    ),
                    param.location,
                ));
            }
            let argument =
                self.builder
                    .function_argument(function, param.name.clone(), param_type);

            // the default value is lowered into the holding block and kept
            // as a constant initialiser
            if let Some(default) = &param.default {
                let current = self.builder.insertion_block();
                self.builder.select_holding_block();
                let default_value = self.lower_expression(default, false)?;
                self.builder.take_holding_values();
                self.builder.set_insertion_block(current);

                let argument_value = self.builder.module_mut().value_mut(argument);
                if let IRValueKind::FunctionArgument { default } = &mut argument_value.kind {
                    *default = Some(default_value);
                }
            }
        }

        Ok(())
    }

    /********************************************************
     **** lowering ******************************************
     */

    fn lower_global_init(&mut self, decl: &VariableDecl) -> Result<(), IRGenError> {
        let Some(var_id) = decl.var_id else {
            return Ok(());
        };
        let Some(&global_value) = self.var_values.get(&var_id) else {
            // the definition was rejected, nothing to initialise
            return Ok(());
        };
        let Some(init) = &decl.init else {
            return Err(IRGenError::internal(
                "global variable without init expression survived decoration",
                decl.location,
            ));
        };

        self.builder.select_holding_block();
        let init_value = self.lower_expression(init, false)?;
        self.builder.take_holding_values();

        let global = self.builder.module_mut().value_mut(global_value);
        if let IRValueKind::GlobalVar { init } = &mut global.kind {
            *init = Some(init_value);
        }
        Ok(())
    }

    fn lower_function_body(&mut self, decl: &FunctionDecl) -> Result<(), IRGenError> {
        let Some(fun_id) = decl.fun_id else {
            return Ok(());
        };
        let Some(body) = &decl.body else {
            // extern
            return Ok(());
        };
        let Some(&function) = self.fun_values.get(&fun_id) else {
            // the definition was rejected
            return Ok(());
        };
        let sig = self.symbols.function(fun_id).clone();
        if sig
            .params
            .iter()
            .any(|p| matches!(lang_type_to_ir_type(&p.ty), IRType::Invalid | IRType::Void))
        {
            // rejected at definition time
            return Ok(());
        }

        let entry = self
            .builder
            .module()
            .entry_block(function)
            .ok_or_else(|| {
                IRGenError::internal("function has no entry block", decl.location)
            })?;
        self.builder.set_insertion_block(entry);

        // materialise the arguments as addressable locals
        let params = self.builder.module().function(function).params.clone();
        for (param, argument) in sig.params.iter().zip(params) {
            let param_type = lang_type_to_ir_type(&param.ty);
            let slot = self.builder.inst(
                IRValueKind::AllocBuiltin(param.ty.as_builtin().ok_or_else(|| {
                    IRGenError::internal("non-builtin argument survived definition", param.location)
                })?),
                IRType::pointer_to(param_type),
                param.name.clone(),
            );
            self.builder.inst(
                IRValueKind::Store {
                    dest: slot,
                    value: argument,
                },
                IRType::Void,
                String::new(),
            );
            self.var_values.insert(param.var_id, slot);
        }

        self.lower_compound(body)
    }

    fn lower_compound(&mut self, compound: &CompoundStmt) -> Result<(), IRGenError> {
        for statement in &compound.statements {
            self.lower_statement(statement)?;
        }
        Ok(())
    }

    fn lower_statement(&mut self, statement: &Statement) -> Result<(), IRGenError> {
        match statement {
            Statement::Compound(compound) => self.lower_compound(compound),
            Statement::Let(decl) => self.lower_local_variable(decl),
            Statement::Return(ret) => {
                let value = match &ret.expression {
                    Some(expr) => Some(self.lower_expression(expr, false)?),
                    None => None,
                };
                self.builder
                    .inst(IRValueKind::Return { value }, IRType::Void, String::new());
                Ok(())
            }
            Statement::Assign(assign) => self.lower_assign(assign),
            Statement::If(if_stmt) => self.lower_if(if_stmt),
            Statement::While(while_stmt) => self.lower_while(while_stmt),
            Statement::Expr(expr) => {
                self.lower_expression(expr, false)?;
                Ok(())
            }
        }
    }

    fn lower_local_variable(&mut self, decl: &VariableDecl) -> Result<(), IRGenError> {
        let var_id = decl.var_id.ok_or_else(|| {
            IRGenError::internal("unresolved local variable declaration", decl.location)
        })?;
        let ty = self.symbols.var(var_id).ty.clone();
        let Some(builtin) = ty.as_builtin() else {
            return Err(IRGenError::user(
                format!(
                    "local variables of type '{}' are not lowered to IR yet",
                    self.symbols.type_name(&ty)
                ),
                decl.location,
            ));
        };

        let slot = self.builder.inst(
            IRValueKind::AllocBuiltin(builtin),
            IRType::pointer_to(lang_type_to_ir_type(&ty)),
            decl.name.clone(),
        );
        self.var_values.insert(var_id, slot);

        let init = decl.init.as_ref().ok_or_else(|| {
            IRGenError::internal("variables need an initial value", decl.location)
        })?;
        let init_value = self.lower_expression(init, false)?;
        self.builder.inst(
            IRValueKind::Store {
                dest: slot,
                value: init_value,
            },
            IRType::Void,
            String::new(),
        );
        Ok(())
    }

    fn lower_assign(&mut self, assign: &AssignStmt) -> Result<(), IRGenError> {
        let target_type = &assign.target.result_type;
        if target_type.is_class() {
            return Err(IRGenError::user(
                "class values can't be assigned in the IR path yet",
                assign.location,
            ));
        }
        if target_type.as_builtin() == Some(BuiltinType::Str) {
            return Err(IRGenError::user(
                "str values can't be assigned in the IR path yet",
                assign.location,
            ));
        }

        let pointer = self.lower_expression(&assign.target, true)?;
        if !self.builder.module().value(pointer).ty.is_pointer() {
            return Err(IRGenError::internal(
                "can't store a value through a non-pointer value",
                assign.location,
            ));
        }
        let value = self.lower_expression(&assign.value, false)?;
        self.builder.inst(
            IRValueKind::Store {
                dest: pointer,
                value,
            },
            IRType::Void,
            String::new(),
        );
        Ok(())
    }

    fn lower_if(&mut self, if_stmt: &IfStmt) -> Result<(), IRGenError> {
        self.builder.inst(
            IRValueKind::Comment(format!(
                "condition for if: {}",
                expression_as_code(&if_stmt.condition)
            )),
            IRType::Void,
            String::new(),
        );
        let condition = self.lower_expression(&if_stmt.condition, false)?;

        // targets are patched as the blocks are created
        let placeholder = self.builder.insertion_block();
        let cond_jump = self.builder.inst(
            IRValueKind::CondJump {
                condition,
                true_target: placeholder,
                false_target: placeholder,
            },
            IRType::Void,
            String::new(),
        );

        let then_block = self.builder.basic_block("ifThen");
        self.patch_cond_jump(cond_jump, Some(then_block), None);
        self.lower_compound(&if_stmt.then_body)?;
        let end_of_then = self.builder.insertion_block();

        let end_of_else = match &if_stmt.else_body {
            Some(else_body) => {
                let else_block = self.builder.basic_block("ifElse");
                self.patch_cond_jump(cond_jump, None, Some(else_block));
                self.lower_compound(else_body)?;
                Some(self.builder.insertion_block())
            }
            None => None,
        };

        let merge_block = self.builder.basic_block("ifMerge");
        match end_of_else {
            Some(end_of_else) => {
                self.builder.set_insertion_block(end_of_else);
                self.builder.inst(
                    IRValueKind::Jump {
                        target: merge_block,
                    },
                    IRType::Void,
                    String::new(),
                );
            }
            // without an else a false condition continues at the merge
            None => self.patch_cond_jump(cond_jump, None, Some(merge_block)),
        }
        self.builder.set_insertion_block(end_of_then);
        self.builder.inst(
            IRValueKind::Jump {
                target: merge_block,
            },
            IRType::Void,
            String::new(),
        );

        self.builder.set_insertion_block(merge_block);
        Ok(())
    }

    fn lower_while(&mut self, while_stmt: &WhileStmt) -> Result<(), IRGenError> {
        let before = self.builder.insertion_block();
        let check_block = self.builder.basic_block("whileCheck");
        self.builder.set_insertion_block(before);
        self.builder.inst(
            IRValueKind::Jump {
                target: check_block,
            },
            IRType::Void,
            String::new(),
        );

        self.builder.set_insertion_block(check_block);
        let condition = self.lower_expression(&while_stmt.condition, false)?;
        let placeholder = self.builder.insertion_block();
        let cond_jump = self.builder.inst(
            IRValueKind::CondJump {
                condition,
                true_target: placeholder,
                false_target: placeholder,
            },
            IRType::Void,
            String::new(),
        );

        let body_block = self.builder.basic_block("whileBody");
        self.patch_cond_jump(cond_jump, Some(body_block), None);
        self.lower_compound(&while_stmt.body)?;
        self.builder.inst(
            IRValueKind::Jump {
                target: check_block,
            },
            IRType::Void,
            String::new(),
        );

        let merge_block = self.builder.basic_block("whileMerge");
        self.patch_cond_jump(cond_jump, None, Some(merge_block));
        self.builder.set_insertion_block(merge_block);
        Ok(())
    }

    /********************************************************
     **** expressions ***************************************
     */

    /// Lower one expression to a value.
    ///
    /// With `want_pointer` the pointer of a variable is returned instead of
    /// a loaded value (assignment targets).
    fn lower_expression(
        &mut self,
        expr: &Expression,
        want_pointer: bool,
    ) -> Result<ValueId, IRGenError> {
        match &expr.kind {
            ExprKind::IntLiteral(value) => Ok(self.builder.inst(
                IRValueKind::ConstI32(*value),
                IRType::Builtin(BuiltinType::I32),
                String::new(),
            )),
            ExprKind::FloatLiteral(value) => Ok(self.builder.inst(
                IRValueKind::ConstF32(*value),
                IRType::Builtin(BuiltinType::F32),
                String::new(),
            )),
            ExprKind::BoolLiteral(value) => Ok(self.builder.inst(
                IRValueKind::ConstBool(*value),
                IRType::Builtin(BuiltinType::Bool),
                String::new(),
            )),
            ExprKind::StringLiteral(_) => Err(IRGenError::user(
                "str values are not supported in IR generation yet",
                expr.location,
            )),
            ExprKind::Variable(variable) => {
                let var_id = variable.resolved.ok_or_else(|| {
                    IRGenError::internal("unresolved variable expression", expr.location)
                })?;
                let pointer = *self.var_values.get(&var_id).ok_or_else(|| {
                    IRGenError::user(
                        "no variable allocation generated, can't load variable",
                        expr.location,
                    )
                })?;
                if want_pointer || expr.result_type.is_class() {
                    return Ok(pointer);
                }
                let loaded_type = self
                    .builder
                    .module()
                    .value(pointer)
                    .ty
                    .pointee()
                    .cloned()
                    .ok_or_else(|| {
                        IRGenError::internal(
                            "variable value is not a pointer",
                            expr.location,
                        )
                    })?;
                Ok(self.builder.inst(
                    IRValueKind::Load { source: pointer },
                    loaded_type,
                    String::new(),
                ))
            }
            ExprKind::MemberVariable(_) | ExprKind::MemberCall(_) => Err(IRGenError::user(
                "classes are not lowered to IR yet",
                expr.location,
            )),
            ExprKind::Call(call) => {
                let fun_id = call.resolved.ok_or_else(|| {
                    IRGenError::internal("unresolved call expression", expr.location)
                })?;
                let sig = self.symbols.function(fun_id);
                if sig.is_constructor {
                    return Err(IRGenError::user(
                        "classes are not lowered to IR yet",
                        expr.location,
                    ));
                }
                let return_type = lang_type_to_ir_type(&sig.return_type);
                let function = *self.fun_values.get(&fun_id).ok_or_else(|| {
                    IRGenError::user(
                        format!("function '{}' has no IR definition, can't call it", sig.name),
                        expr.location,
                    )
                })?;

                // the decorator has normalised the arguments to parameter order
                let mut arguments = Vec::with_capacity(call.args.len());
                for arg in &call.args {
                    arguments.push(self.lower_expression(&arg.expression, false)?);
                }
                Ok(self.builder.inst(
                    IRValueKind::Call {
                        function,
                        arguments,
                    },
                    return_type,
                    String::new(),
                ))
            }
            ExprKind::Unary(unary) => {
                let value = self.lower_expression(&unary.inner, false)?;
                Ok(self.builder.inst(
                    IRValueKind::LogicalNot { value },
                    IRType::Builtin(BuiltinType::Bool),
                    String::new(),
                ))
            }
            ExprKind::Binary(binary) => self.lower_binary(expr, binary),
        }
    }

    fn lower_binary(
        &mut self,
        expr: &Expression,
        binary: &BinaryExpr,
    ) -> Result<ValueId, IRGenError> {
        let operand_type = &binary.lhs.result_type;
        let result_type = &expr.result_type;
        if operand_type.as_builtin().is_none() {
            return Err(IRGenError::user(
                "only builtin types are supported for binary operations in IR",
                expr.location,
            ));
        }

        let lhs = self.lower_expression(&binary.lhs, false)?;
        let rhs = self.lower_expression(&binary.rhs, false)?;

        if operand_type.is_numeric() && result_type == operand_type {
            let op = match binary.op {
                BinaryOp::Plus => NumCalcOp::Add,
                BinaryOp::Minus => NumCalcOp::Sub,
                BinaryOp::Multiply => NumCalcOp::Mul,
                BinaryOp::Divide => NumCalcOp::Div,
                other => {
                    return Err(IRGenError::internal(
                        format!(
                            "incompatible binary operation '{}' for number calculation",
                            other
                        ),
                        expr.location,
                    ));
                }
            };
            return Ok(self.builder.inst(
                IRValueKind::NumCalcBinary { op, lhs, rhs },
                lang_type_to_ir_type(result_type),
                String::new(),
            ));
        }

        if operand_type.is_numeric() && result_type.is_bool() {
            let op = match binary.op {
                BinaryOp::Equals => NumCmpOp::Eq,
                BinaryOp::NotEquals => NumCmpOp::Ne,
                BinaryOp::GreaterThen => NumCmpOp::Gt,
                BinaryOp::GreaterEqualThen => NumCmpOp::Ge,
                BinaryOp::LessThen => NumCmpOp::Lt,
                BinaryOp::LessEqualThen => NumCmpOp::Le,
                other => {
                    return Err(IRGenError::internal(
                        format!(
                            "incompatible binary operation '{}' for number comparison",
                            other
                        ),
                        expr.location,
                    ));
                }
            };
            return Ok(self.builder.inst(
                IRValueKind::NumCmpBinary { op, lhs, rhs },
                IRType::Builtin(BuiltinType::Bool),
                String::new(),
            ));
        }

        if operand_type.is_bool() && result_type.is_bool() {
            let op = match binary.op {
                BinaryOp::LogicAnd => BoolOp::And,
                BinaryOp::LogicOr => BoolOp::Or,
                other => {
                    return Err(IRGenError::internal(
                        format!("incompatible binary boolean operation '{}'", other),
                        expr.location,
                    ));
                }
            };
            return Ok(self.builder.inst(
                IRValueKind::BoolBinary { op, lhs, rhs },
                IRType::Builtin(BuiltinType::Bool),
                String::new(),
            ));
        }

        Err(IRGenError::user(
            format!(
                "binary operations on operands of type '{}' are not supported in IR",
                self.symbols.type_name(operand_type)
            ),
            expr.location,
        ))
    }

    fn patch_cond_jump(
        &mut self,
        cond_jump: ValueId,
        true_block: Option<BlockId>,
        false_block: Option<BlockId>,
    ) {
        let value = self.builder.module_mut().value_mut(cond_jump);
        if let IRValueKind::CondJump {
            true_target,
            false_target,
            ..
        } = &mut value.kind
        {
            if let Some(block) = true_block {
                *true_target = block;
            }
            if let Some(block) = false_block {
                *false_target = block;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decorator::decorate;
    use crate::lexer::Lexer;
    use crate::parser::Parser;

    fn r#gen(source: &str) -> (IRModule, Diagnostics) {
        let tokens = Lexer::new(source).tokens().expect("lexing failed");
        let mut root = Parser::new(tokens).parse().expect("parsing failed");
        let mut diags = Diagnostics::new();
        let symbols = decorate(&mut root, &mut diags);
        assert!(
            !diags.has_errors(),
            "decoration failed: {:?}",
            diags.all().iter().map(|d| &d.title).collect::<Vec<_>>()
        );
        let module =
            generate(&root, &symbols, "test.malin", &mut diags).expect("internal IR error");
        (module, diags)
    }

    fn gen_ok(source: &str) -> IRModule {
        let (module, diags) = r#gen(source);
        assert!(
            !diags.has_errors(),
            "ir generation failed: {:?}",
            diags.all().iter().map(|d| &d.title).collect::<Vec<_>>()
        );
        module
    }

    fn find_function<'m>(module: &'m IRModule, name: &str) -> &'m IRFunction {
        module
            .functions
            .iter()
            .find(|f| f.name == name)
            .unwrap_or_else(|| panic!("function '{}' not generated", name))
    }

    fn block_kinds<'m>(module: &'m IRModule, block: BlockId) -> Vec<&'m IRValueKind> {
        module
            .block(block)
            .instructions
            .iter()
            .map(|&v| &module.value(v).kind)
            .collect()
    }

    #[test]
    fn test_simple_main() {
        let module = gen_ok("fun main(): i32 { let x = 1; return x; }");
        let main = find_function(&module, "main");
        assert!(!main.is_extern);
        assert_eq!(main.return_type, IRType::Builtin(BuiltinType::I32));

        let entry = main.blocks[0];
        let kinds = block_kinds(&module, entry);
        assert!(matches!(kinds[0], IRValueKind::AllocBuiltin(BuiltinType::I32)));
        assert!(matches!(kinds[1], IRValueKind::ConstI32(1)));
        assert!(matches!(kinds[2], IRValueKind::Store { .. }));
        assert!(matches!(kinds[3], IRValueKind::Load { .. }));
        assert!(matches!(kinds[4], IRValueKind::Return { value: Some(_) }));
    }

    #[test]
    fn test_alloca_has_pointer_type() {
        let module = gen_ok("fun main(): i32 { let x = 1; return x; }");
        let main = find_function(&module, "main");
        let alloc = module.block(main.blocks[0]).instructions[0];
        assert_eq!(
            module.value(alloc).ty,
            IRType::pointer_to(IRType::Builtin(BuiltinType::I32))
        );
        assert_eq!(module.value(alloc).name, "x");
    }

    #[test]
    fn test_global_with_const_init() {
        let module = gen_ok("let g: i32 = 42;\nfun main(): i32 { return 0; }");
        assert_eq!(module.globals.len(), 1);
        let global = module.value(module.globals[0]);
        assert_eq!(global.name, "g");
        assert_eq!(
            global.ty,
            IRType::pointer_to(IRType::Builtin(BuiltinType::I32))
        );
        let IRValueKind::GlobalVar { init: Some(init) } = &global.kind else {
            panic!("global without init value");
        };
        assert!(matches!(module.value(*init).kind, IRValueKind::ConstI32(42)));
        // the init was moved out of the holding block into the module
        assert!(module.const_inits.contains(init));
        assert!(module.blocks[0].instructions.is_empty());
    }

    #[test]
    fn test_global_with_computed_const_init() {
        let module = gen_ok("let g: i32 = 1 + 2 * 3;\nfun main(): i32 { return 0; }");
        let global = module.value(module.globals[0]);
        let IRValueKind::GlobalVar { init: Some(init) } = &global.kind else {
            panic!("global without init value");
        };
        assert!(matches!(
            module.value(*init).kind,
            IRValueKind::NumCalcBinary { op: NumCalcOp::Add, .. }
        ));
    }

    #[test]
    fn test_function_arguments_are_materialised() {
        let module = gen_ok("fun f(a: i32): i32 { return a; }\nfun main(): i32 { return f(1); }");
        let f = find_function(&module, "f");
        assert_eq!(f.params.len(), 1);
        let argument = module.value(f.params[0]);
        assert!(matches!(argument.kind, IRValueKind::FunctionArgument { .. }));
        assert_eq!(argument.name, "a");

        // entry starts with the argument slot alloca and store
        let kinds = block_kinds(&module, f.blocks[0]);
        assert!(matches!(kinds[0], IRValueKind::AllocBuiltin(BuiltinType::I32)));
        assert!(matches!(kinds[1], IRValueKind::Store { .. }));
    }

    #[test]
    fn test_call_arguments_in_parameter_order() {
        let module = gen_ok(
            "fun f(a: i32, b: i32 = 10): i32 { return a + b; }\nfun main(): i32 { return f(b = 2, a = 3); }",
        );
        let main = find_function(&module, "main");
        let kinds = block_kinds(&module, main.blocks[0]);
        let call = kinds
            .iter()
            .find_map(|k| match k {
                IRValueKind::Call { arguments, .. } => Some(arguments),
                _ => None,
            })
            .expect("call not generated");
        assert_eq!(call.len(), 2);
        assert!(matches!(module.value(call[0]).kind, IRValueKind::ConstI32(3)));
        assert!(matches!(module.value(call[1]).kind, IRValueKind::ConstI32(2)));
    }

    #[test]
    fn test_default_argument_value_is_held_as_const_init() {
        let module = gen_ok(
            "fun f(a: i32 = 7): i32 { return a; }\nfun main(): i32 { return f(); }",
        );
        let f = find_function(&module, "f");
        let argument = module.value(f.params[0]);
        let IRValueKind::FunctionArgument { default: Some(default) } = &argument.kind else {
            panic!("argument without default value");
        };
        assert!(matches!(module.value(*default).kind, IRValueKind::ConstI32(7)));
        assert!(module.const_inits.contains(default));
    }

    #[test]
    fn test_if_else_control_flow() {
        let module = gen_ok(
            "fun main(): i32 { let a = 1; if a > 0 { a = 2; } else { a = 3; } return a; }",
        );
        let main = find_function(&module, "main");
        let block_names: Vec<&str> = main
            .blocks
            .iter()
            .map(|&b| module.block(b).name.as_str())
            .collect();
        assert_eq!(block_names, vec!["entry", "ifThen", "ifElse", "ifMerge"]);

        // entry ends with the conditional jump into then/else
        let entry_kinds = block_kinds(&module, main.blocks[0]);
        let IRValueKind::CondJump {
            true_target,
            false_target,
            ..
        } = entry_kinds.last().unwrap()
        else {
            panic!("entry does not end in a conditional jump");
        };
        assert_eq!(*true_target, main.blocks[1]);
        assert_eq!(*false_target, main.blocks[2]);

        // both branches jump to the merge block
        for branch in [main.blocks[1], main.blocks[2]] {
            let kinds = block_kinds(&module, branch);
            assert!(
                matches!(kinds.last().unwrap(), IRValueKind::Jump { target } if *target == main.blocks[3])
            );
        }
    }

    #[test]
    fn test_if_without_else_falls_through_to_merge() {
        let module = gen_ok("fun main(): i32 { if true { } return 0; }");
        let main = find_function(&module, "main");
        let block_names: Vec<&str> = main
            .blocks
            .iter()
            .map(|&b| module.block(b).name.as_str())
            .collect();
        assert_eq!(block_names, vec!["entry", "ifThen", "ifMerge"]);

        let entry_kinds = block_kinds(&module, main.blocks[0]);
        let IRValueKind::CondJump { false_target, .. } = entry_kinds.last().unwrap() else {
            panic!("entry does not end in a conditional jump");
        };
        assert_eq!(*false_target, main.blocks[2]);
    }

    #[test]
    fn test_if_condition_gets_a_comment() {
        let module = gen_ok("fun main(): i32 { if true { } return 0; }");
        let main = find_function(&module, "main");
        let entry_kinds = block_kinds(&module, main.blocks[0]);
        assert!(entry_kinds.iter().any(
            |k| matches!(k, IRValueKind::Comment(text) if text.contains("condition for if"))
        ));
    }

    #[test]
    fn test_while_control_flow() {
        let module = gen_ok(
            "fun main(): i32 { let i = 0; while i < 3 { i = i + 1; } return i; }",
        );
        let main = find_function(&module, "main");
        let block_names: Vec<&str> = main
            .blocks
            .iter()
            .map(|&b| module.block(b).name.as_str())
            .collect();
        assert_eq!(
            block_names,
            vec!["entry", "whileCheck", "whileBody", "whileMerge"]
        );

        // entry jumps into the check, the body jumps back to the check
        let entry_kinds = block_kinds(&module, main.blocks[0]);
        assert!(
            matches!(entry_kinds.last().unwrap(), IRValueKind::Jump { target } if *target == main.blocks[1])
        );
        let body_kinds = block_kinds(&module, main.blocks[2]);
        assert!(
            matches!(body_kinds.last().unwrap(), IRValueKind::Jump { target } if *target == main.blocks[1])
        );
        // the check conditionally continues into body or merge
        let check_kinds = block_kinds(&module, main.blocks[1]);
        let IRValueKind::CondJump {
            true_target,
            false_target,
            ..
        } = check_kinds.last().unwrap()
        else {
            panic!("check does not end in a conditional jump");
        };
        assert_eq!(*true_target, main.blocks[2]);
        assert_eq!(*false_target, main.blocks[3]);
    }

    #[test]
    fn test_binary_kinds() {
        let module = gen_ok(
            "fun main(): i32 { let a = 1 + 2; let b = a < 3; let c = b && true; let d = !c; return a; }",
        );
        let main = find_function(&module, "main");
        let kinds = block_kinds(&module, main.blocks[0]);
        assert!(kinds
            .iter()
            .any(|k| matches!(k, IRValueKind::NumCalcBinary { op: NumCalcOp::Add, .. })));
        assert!(kinds
            .iter()
            .any(|k| matches!(k, IRValueKind::NumCmpBinary { op: NumCmpOp::Lt, .. })));
        assert!(kinds
            .iter()
            .any(|k| matches!(k, IRValueKind::BoolBinary { op: BoolOp::And, .. })));
        assert!(kinds.iter().any(|k| matches!(k, IRValueKind::LogicalNot { .. })));
    }

    #[test]
    fn test_extern_function_definition() {
        let module = gen_ok(
            "fun extern printNum(num: i32);\nfun main(): i32 { printNum(1); return 0; }",
        );
        let f = find_function(&module, "printNum");
        assert!(f.is_extern);
        assert_eq!(f.params.len(), 1);
    }

    #[test]
    fn test_classes_report_ir_error() {
        let (_, diags) = r#gen("class A { v: i32 = 0; }\nfun main(): i32 { return 0; }");
        assert!(diags.has_errors());
        assert!(diags.contains("classes are not lowered to IR yet"));
    }

    #[test]
    fn test_string_value_reports_ir_error() {
        let (_, diags) = r#gen("fun main(): i32 { let s = \"hi\"; return 0; }");
        assert!(diags.has_errors());
        assert!(diags.contains("str values are not supported"));
    }

    #[test]
    fn test_terminator_cleanup_runs() {
        // both branches return; the appended jumps to the merge block are
        // dropped by the cleanup pass
        let module = gen_ok(
            "fun main(): i32 { if true { return 1; } else { return 2; } }",
        );
        let main = find_function(&module, "main");
        for &block in &main.blocks {
            let instructions = &module.block(block).instructions;
            let mut seen_terminator = false;
            for &value in instructions {
                assert!(!seen_terminator, "instruction after a terminator survived");
                seen_terminator = module.value(value).is_terminator();
            }
        }
    }

    #[test]
    fn test_void_function_returns() {
        let module = gen_ok("fun f() { }\nfun main(): i32 { f(); return 0; }");
        let f = find_function(&module, "f");
        let kinds = block_kinds(&module, f.blocks[0]);
        assert!(matches!(kinds.last().unwrap(), IRValueKind::Return { value: None }));
    }
}
