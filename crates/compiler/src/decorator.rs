//! Decoration: name resolution and type checking
//!
//! Walks the AST three times so forward references resolve cleanly:
//!
//! - pass A registers all global names and resolves declaration signatures
//!   (class members, function parameters and return types, default values),
//! - pass B checks global initialisers under the isolated rules,
//! - pass C descends into function and method bodies.
//!
//! Errors are accumulated in the diagnostics sink; analysis continues where
//! possible so one run reports many independent mistakes. Any error prevents
//! IR generation.

use crate::ast::*;
use crate::diagnostics::Diagnostics;
use crate::lexer::{SrcLocation, SrcLocationRange};
use crate::names::NamesStack;

/// What kind of declaration a `VarId` refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarKind {
    Global,
    Local,
    Param,
    Member { class: ClassId },
    This,
}

/// DFS state for the class member-loop detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CycleState {
    Unvisited,
    InProgress,
    Done,
}

#[derive(Debug, Clone)]
pub struct VarInfo {
    pub name: String,
    pub ty: LangType,
    pub kind: VarKind,
    pub location: SrcLocationRange,
}

/// Signature of one function parameter, including the decorated default
/// expression that gets cloned into call sites.
#[derive(Debug, Clone)]
pub struct ParamSig {
    pub name: String,
    pub ty: LangType,
    pub var_id: VarId,
    pub default: Option<Expression>,
    pub location: SrcLocationRange,
}

#[derive(Debug, Clone)]
pub struct FunctionSig {
    pub name: String,
    pub params: Vec<ParamSig>,
    pub return_type: LangType,
    pub is_extern: bool,
    pub parent_class: Option<ClassId>,
    pub is_constructor: bool,
    pub location: SrcLocationRange,
}

#[derive(Debug, Clone)]
pub struct ClassInfo {
    pub name: String,
    pub members: Vec<VarId>,
    pub methods: Vec<FunId>,
    /// the synthesised `this` variable of the class
    pub this_var: VarId,
    /// the synthesised default constructor
    pub constructor: FunId,
    pub location: SrcLocationRange,
}

/// Symbol tables produced by decoration and consumed by the IR generator.
#[derive(Debug, Default)]
pub struct Symbols {
    pub vars: Vec<VarInfo>,
    pub functions: Vec<FunctionSig>,
    pub classes: Vec<ClassInfo>,
}

impl Symbols {
    pub fn var(&self, id: VarId) -> &VarInfo {
        &self.vars[id.0]
    }

    pub fn function(&self, id: FunId) -> &FunctionSig {
        &self.functions[id.0]
    }

    pub fn class(&self, id: ClassId) -> &ClassInfo {
        &self.classes[id.0]
    }

    fn add_var(&mut self, info: VarInfo) -> VarId {
        self.vars.push(info);
        VarId(self.vars.len() - 1)
    }

    fn add_function(&mut self, sig: FunctionSig) -> FunId {
        self.functions.push(sig);
        FunId(self.functions.len() - 1)
    }

    /// Human-readable name of a type, resolving class ids.
    pub fn type_name(&self, ty: &LangType) -> String {
        match ty {
            LangType::Invalid => "invalid".to_string(),
            LangType::Builtin(b) => b.to_string(),
            LangType::Class(id) => self.classes[id.0].name.clone(),
            LangType::Reference(inner) => format!("Reference<{}>", self.type_name(inner)),
        }
    }

    fn decl_location(&self, decl: DeclId) -> SrcLocationRange {
        match decl {
            DeclId::Var(id) => self.vars[id.0].location,
            DeclId::Function(id) => self.functions[id.0].location,
            DeclId::Class(id) => self.classes[id.0].location,
        }
    }
}

/// Run decoration over a parsed root.
///
/// Returns the symbol tables; the caller decides how to proceed based on
/// `diags.has_errors()`.
pub fn decorate(root: &mut Root, diags: &mut Diagnostics) -> Symbols {
    let mut decorator = Decorator {
        diags,
        symbols: Symbols::default(),
        names: NamesStack::new(),
        current_class: None,
    };
    decorator.run(root);
    decorator.symbols
}

struct Decorator<'d> {
    diags: &'d mut Diagnostics,
    symbols: Symbols,
    names: NamesStack,
    current_class: Option<ClassId>,
}

impl Decorator<'_> {
    fn run(&mut self, root: &mut Root) {
        // global scope lives for the whole decoration
        self.names.push_scope();

        self.register_global_names(root);
        self.resolve_class_members(root);
        self.resolve_function_signatures(root);
        self.check_class_cycles();

        // pass B: global initialisers
        for global in &mut root.globals {
            self.decorate_variable_decl(global, true, VarKind::Global);
        }

        // pass C: bodies
        for class_index in 0..root.classes.len() {
            let class_id = ClassId(class_index);
            self.enter_class_scope(class_id);
            for method in &mut root.classes[class_index].methods {
                self.check_function_body(method);
            }
            self.names.pop_scope();
            self.current_class = None;
        }
        for function in &mut root.functions {
            self.check_function_body(function);
        }

        self.check_main_function(root);
    }

    /********************************************************
     **** pass A ********************************************
     */

    /// Register every class, global variable and function name in the global
    /// scope. Classes get their synthesised `this` variable and default
    /// constructor here.
    fn register_global_names(&mut self, root: &mut Root) {
        for (index, class) in root.classes.iter().enumerate() {
            let class_id = ClassId(index);
            let this_var = self.symbols.add_var(VarInfo {
                name: "this".to_string(),
                ty: LangType::Class(class_id),
                kind: VarKind::This,
                location: class.location,
            });
            let constructor = self.symbols.add_function(FunctionSig {
                name: class.name.clone(),
                params: Vec::new(),
                return_type: LangType::Class(class_id),
                is_extern: false,
                parent_class: Some(class_id),
                is_constructor: true,
                location: class.location,
            });
            self.symbols.classes.push(ClassInfo {
                name: class.name.clone(),
                members: Vec::new(),
                methods: Vec::new(),
                this_var,
                constructor,
                location: class.location,
            });
            self.declare_global_name(&class.name, DeclId::Class(class_id), class.location);
        }

        for global in &mut root.globals {
            let var_id = self.symbols.add_var(VarInfo {
                name: global.name.clone(),
                ty: LangType::Invalid,
                kind: VarKind::Global,
                location: global.location,
            });
            global.var_id = Some(var_id);
            self.declare_global_name(&global.name, DeclId::Var(var_id), global.location);
        }

        for function in &mut root.functions {
            let fun_id = self.symbols.add_function(FunctionSig {
                name: function.name.clone(),
                params: Vec::new(),
                return_type: LangType::Invalid,
                is_extern: function.is_extern,
                parent_class: None,
                is_constructor: false,
                location: function.location,
            });
            function.fun_id = Some(fun_id);
            self.declare_global_name(&function.name, DeclId::Function(fun_id), function.location);
        }
    }

    fn declare_global_name(&mut self, name: &str, decl: DeclId, location: SrcLocationRange) {
        if !self.names.add_name(name, decl) {
            let previous = self
                .names
                .find_name(name)
                .map(|d| self.symbols.decl_location(d))
                .unwrap_or(location);
            self.diags
                .error(format!("name '{}' already declared", name), location)
                .note(format!("name '{}' previously declared here", name), previous);
        }
    }

    /// Resolve class member types and initialisers, register methods.
    fn resolve_class_members(&mut self, root: &mut Root) {
        for (index, class) in root.classes.iter_mut().enumerate() {
            let class_id = ClassId(index);
            let mut seen = std::collections::HashMap::new();

            for member in &mut class.members {
                if let Some(&previous) = seen.get(member.name.as_str()) {
                    self.diags
                        .error(
                            format!(
                                "member '{}' already declared in class '{}'",
                                member.name, class.name
                            ),
                            member.location,
                        )
                        .note(
                            format!("member '{}' previously declared here", member.name),
                            previous,
                        );
                    continue;
                }
                seen.insert(member.name.clone(), member.location);

                let ty = match &member.type_name {
                    Some(name) => self.make_type_for_name(name, member.location),
                    None => LangType::Invalid,
                };
                let var_id = self.symbols.add_var(VarInfo {
                    name: member.name.clone(),
                    ty: ty.clone(),
                    kind: VarKind::Member { class: class_id },
                    location: member.location,
                });
                member.var_id = Some(var_id);
                self.symbols.classes[index].members.push(var_id);

                // member initialisers are constant expressions
                if let Some(init) = &mut member.init {
                    let init_ok = self.check_expression(init, true);
                    if init_ok && !ty.is_invalid() && init.result_type != ty {
                        self.diags.error(
                            format!(
                                "specified type of member '{}' does not match the type of its init expression '{}'",
                                self.symbols.type_name(&ty),
                                self.symbols.type_name(&init.result_type)
                            ),
                            member.location,
                        );
                    }
                }
            }

            for method in &mut class.methods {
                if let Some(&previous) = seen.get(method.name.as_str()) {
                    self.diags
                        .error(
                            format!(
                                "member '{}' already declared in class '{}'",
                                method.name, class.name
                            ),
                            method.location,
                        )
                        .note(
                            format!("member '{}' previously declared here", method.name),
                            previous,
                        );
                    continue;
                }
                seen.insert(method.name.clone(), method.location);

                let fun_id = self.symbols.add_function(FunctionSig {
                    name: method.name.clone(),
                    params: Vec::new(),
                    return_type: LangType::Invalid,
                    is_extern: method.is_extern,
                    parent_class: Some(class_id),
                    is_constructor: false,
                    location: method.location,
                });
                method.fun_id = Some(fun_id);
                self.symbols.classes[index].methods.push(fun_id);
            }
        }
    }

    /// Resolve parameter and return types for every function and method,
    /// and check default-parameter expressions.
    fn resolve_function_signatures(&mut self, root: &mut Root) {
        for function in &mut root.functions {
            self.resolve_function_signature(function);
        }
        for class in &mut root.classes {
            for method in &mut class.methods {
                self.resolve_function_signature(method);
            }
        }
    }

    fn resolve_function_signature(&mut self, decl: &mut FunctionDecl) {
        let Some(fun_id) = decl.fun_id else {
            // a duplicate method that was skipped during registration
            return;
        };
        let return_type = self.make_type_for_name(&decl.return_type_name, decl.location);

        let mut params = Vec::new();
        for param in &mut decl.params {
            if params.iter().any(|p: &ParamSig| p.name == param.name) {
                self.diags.error(
                    format!(
                        "argument '{}' already declared for function '{}'",
                        param.name, decl.name
                    ),
                    param.location,
                );
                continue;
            }

            let ty = self.make_type_for_name(&param.type_name, param.location);
            let var_id = self.symbols.add_var(VarInfo {
                name: param.name.clone(),
                ty: ty.clone(),
                kind: VarKind::Param,
                location: param.location,
            });
            param.var_id = Some(var_id);

            // default values are checked like global initialisers
            if let Some(default) = &mut param.default {
                let default_ok = self.check_expression(default, true);
                if default_ok && !ty.is_invalid() && default.result_type != ty {
                    self.diags.error(
                        format!(
                            "default value of argument '{}' has type '{}' but the argument is declared as '{}'",
                            param.name,
                            self.symbols.type_name(&default.result_type),
                            self.symbols.type_name(&ty)
                        ),
                        param.location,
                    );
                }
            }

            params.push(ParamSig {
                name: param.name.clone(),
                ty,
                var_id,
                default: param.default.clone(),
                location: param.location,
            });
        }

        let sig = &mut self.symbols.functions[fun_id.0];
        sig.params = params;
        sig.return_type = return_type;
    }

    /// A class must not (transitively) contain a value of its own type.
    fn check_class_cycles(&mut self) {
        let class_count = self.symbols.classes.len();
        let mut states = vec![CycleState::Unvisited; class_count];
        let mut path: Vec<ClassId> = Vec::new();

        for start in 0..class_count {
            if states[start] != CycleState::Unvisited {
                continue;
            }
            self.class_cycle_dfs(ClassId(start), &mut states, &mut path);
        }
    }

    /// Depth-first walk over the value-typed members of a class. Revisiting
    /// a class that is still on the walk's path is a composition cycle; the
    /// diagnostic chains a note per class on the cycle.
    fn class_cycle_dfs(
        &mut self,
        class_id: ClassId,
        states: &mut [CycleState],
        path: &mut Vec<ClassId>,
    ) {
        states[class_id.0] = CycleState::InProgress;
        path.push(class_id);

        let members = self.symbols.classes[class_id.0].members.clone();
        for member in members {
            let Some(target) = self.symbols.vars[member.0].ty.as_class() else {
                continue;
            };
            match states[target.0] {
                CycleState::InProgress => {
                    let member_info = &self.symbols.vars[member.0];
                    let title = format!(
                        "cyclic class composition: member '{}' of class '{}' leads back to class '{}'",
                        member_info.name,
                        self.symbols.classes[class_id.0].name,
                        self.symbols.classes[target.0].name
                    );
                    let member_location = member_info.location;
                    let cycle_start = path.iter().position(|c| *c == target).unwrap_or(0);
                    let note_classes: Vec<ClassId> =
                        path[cycle_start..].iter().rev().copied().collect();
                    let mut scope = self.diags.error(title, member_location);
                    for class_on_path in note_classes {
                        scope = scope.note(
                            format!(
                                "previously referenced from class '{}'",
                                self.symbols.classes[class_on_path.0].name
                            ),
                            self.symbols.classes[class_on_path.0].location,
                        );
                    }
                }
                CycleState::Unvisited => {
                    self.class_cycle_dfs(target, states, path);
                }
                CycleState::Done => {}
            }
        }

        path.pop();
        states[class_id.0] = CycleState::Done;
    }

    /********************************************************
     **** passes B and C ************************************
     */

    /// Check a global or local variable declaration: init expression,
    /// declared-vs-inferred type, var table entry.
    fn decorate_variable_decl(&mut self, decl: &mut VariableDecl, isolated: bool, kind: VarKind) {
        let init_ok = match &mut decl.init {
            Some(init) => self.check_expression(init, isolated),
            None => {
                self.diags
                    .error("variables need an initial value", decl.location);
                false
            }
        };
        let init_type = decl
            .init
            .as_ref()
            .map(|e| e.result_type.clone())
            .unwrap_or(LangType::Invalid);

        let mut ty = LangType::Invalid;
        if let Some(type_name) = &decl.type_name {
            ty = self.make_type_for_name(type_name, decl.location);
            if kind == VarKind::Global && ty.is_class() {
                self.diags
                    .error("globals of class type are not supported", decl.location);
                ty = LangType::Invalid;
            }
            if init_ok && !ty.is_invalid() && init_type != ty {
                self.diags.error(
                    format!(
                        "specified type of variable '{}' does not match the type of its init expression '{}'",
                        self.symbols.type_name(&ty),
                        self.symbols.type_name(&init_type)
                    ),
                    decl.location,
                );
            }
        } else if init_ok {
            // infer from the init expression
            ty = init_type;
        }

        if ty.is_void() {
            self.diags.error(
                format!("variable '{}' can't be of type 'void'", decl.name),
                decl.location,
            );
            ty = LangType::Invalid;
        }

        match decl.var_id {
            // globals got their id during registration
            Some(var_id) => self.symbols.vars[var_id.0].ty = ty,
            None => {
                let var_id = self.symbols.add_var(VarInfo {
                    name: decl.name.clone(),
                    ty,
                    kind,
                    location: decl.location,
                });
                decl.var_id = Some(var_id);
            }
        }
    }

    fn enter_class_scope(&mut self, class_id: ClassId) {
        self.current_class = Some(class_id);
        self.names.push_scope();
        let info = self.symbols.classes[class_id.0].clone();
        for member in &info.members {
            let name = self.symbols.vars[member.0].name.clone();
            self.names.add_name(&name, DeclId::Var(*member));
        }
        for method in &info.methods {
            let name = self.symbols.functions[method.0].name.clone();
            self.names.add_name(&name, DeclId::Function(*method));
        }
        self.names.add_name("this", DeclId::Var(info.this_var));
    }

    fn check_function_body(&mut self, decl: &mut FunctionDecl) {
        let Some(fun_id) = decl.fun_id else {
            return;
        };
        let Some(body) = &mut decl.body else {
            // extern functions have no body
            return;
        };
        let return_type = self.symbols.functions[fun_id.0].return_type.clone();
        if return_type.is_invalid() {
            return;
        }

        // function scope with the parameters
        self.names.push_scope();
        for param in &decl.params {
            if let Some(var_id) = param.var_id {
                self.names.add_name(&param.name, DeclId::Var(var_id));
            }
        }

        let returns = self.check_compound(body, &return_type);
        self.names.pop_scope();

        if !returns {
            if return_type.is_void() {
                // append the implicit return of void functions
                body.statements.push(Statement::Return(ReturnStmt {
                    expression: None,
                    location: body.location,
                }));
            } else {
                self.diags
                    .error("non-void function must return on every path", decl.location)
                    .body(format!(
                        "function '{}' is declared to return '{}'",
                        decl.name,
                        self.symbols.type_name(&return_type)
                    ));
            }
        }
    }

    /// Check all statements of a compound. Returns whether the compound
    /// returns on every path. Statements after a returning statement are
    /// diagnosed as dead code and dropped.
    fn check_compound(&mut self, body: &mut CompoundStmt, return_type: &LangType) -> bool {
        self.names.push_scope();
        let mut returns = false;
        let mut cut_at = None;
        for index in 0..body.statements.len() {
            if returns {
                self.diags.warning(
                    "dead code, this statement is never reached",
                    body.statements[index].location(),
                );
                cut_at = Some(index);
                break;
            }
            self.check_statement(&mut body.statements[index], return_type);
            returns = returns || statement_returns(&body.statements[index]);
        }
        if let Some(index) = cut_at {
            body.statements.truncate(index);
        }
        self.names.pop_scope();
        returns
    }

    fn check_statement(&mut self, statement: &mut Statement, return_type: &LangType) {
        match statement {
            Statement::Compound(compound) => {
                self.check_compound(compound, return_type);
            }
            Statement::Return(ret) => match &mut ret.expression {
                Some(expr) => {
                    if self.check_expression(expr, false) {
                        if return_type.is_void() {
                            self.diags.error(
                                "function with return type 'void' can't return a value",
                                ret.location,
                            );
                        } else if expr.result_type != *return_type {
                            self.diags.error(
                                format!(
                                    "expected return type '{}' for function does not match given return type '{}'",
                                    self.symbols.type_name(return_type),
                                    self.symbols.type_name(&expr.result_type)
                                ),
                                ret.location,
                            );
                        }
                    }
                }
                None => {
                    if !return_type.is_void() {
                        self.diags.error(
                            format!(
                                "expected return type '{}' for function does not match given return type 'void'",
                                self.symbols.type_name(return_type)
                            ),
                            ret.location,
                        );
                    }
                }
            },
            Statement::If(if_stmt) => {
                if self.check_expression(&mut if_stmt.condition, false)
                    && !if_stmt.condition.result_type.is_bool()
                {
                    self.diags.error(
                        format!(
                            "condition of the if statement has to be of type 'bool' but is '{}'",
                            self.symbols.type_name(&if_stmt.condition.result_type)
                        ),
                        if_stmt.condition.location,
                    );
                }
                self.check_compound(&mut if_stmt.then_body, return_type);
                if let Some(else_body) = &mut if_stmt.else_body {
                    self.check_compound(else_body, return_type);
                }
            }
            Statement::While(while_stmt) => {
                if self.check_expression(&mut while_stmt.condition, false)
                    && !while_stmt.condition.result_type.is_bool()
                {
                    self.diags.error(
                        format!(
                            "condition of the while statement has to be of type 'bool' but is '{}'",
                            self.symbols.type_name(&while_stmt.condition.result_type)
                        ),
                        while_stmt.condition.location,
                    );
                }
                self.check_compound(&mut while_stmt.body, return_type);
            }
            Statement::Assign(assign) => {
                let target_ok = self.check_expression(&mut assign.target, false);
                let value_ok = self.check_expression(&mut assign.value, false);
                if target_ok
                    && value_ok
                    && assign.target.result_type != assign.value.result_type
                {
                    self.diags.error(
                        format!(
                            "type of the assigned value '{}' does not match the variable type '{}'",
                            self.symbols.type_name(&assign.value.result_type),
                            self.symbols.type_name(&assign.target.result_type)
                        ),
                        assign.location,
                    );
                }
            }
            Statement::Let(decl) => {
                // the name must be new before it enters the scope
                let previous = self.names.find_name_innermost(&decl.name);
                self.decorate_variable_decl(decl, false, VarKind::Local);
                match previous {
                    Some(previous_decl) => {
                        let previous_location = self.symbols.decl_location(previous_decl);
                        self.diags
                            .error(
                                format!("name '{}' already declared", decl.name),
                                decl.location,
                            )
                            .note(
                                format!("name '{}' previously declared here", decl.name),
                                previous_location,
                            );
                    }
                    None => {
                        if let Some(var_id) = decl.var_id {
                            self.names.add_name(&decl.name, DeclId::Var(var_id));
                        }
                    }
                }
            }
            Statement::Expr(expr) => {
                self.check_expression(expr, false);
            }
        }
    }

    /********************************************************
     **** expressions ***************************************
     */

    /// Check one expression and fill in its result type.
    ///
    /// `isolated` is true inside global, member and default-argument
    /// initialisers where variable references and function calls are
    /// forbidden.
    ///
    /// Returns false when the expression is erroneous; the error has then
    /// already been reported.
    fn check_expression(&mut self, expr: &mut Expression, isolated: bool) -> bool {
        let location = expr.location;

        // a bare member name inside a method body is rewritten in place to
        // an access through the implicit `this`
        if let ExprKind::Variable(variable) = &expr.kind {
            if !isolated {
                if let Some(DeclId::Var(var_id)) = self.names.find_name(&variable.name) {
                    if let VarKind::Member { class } = self.symbols.vars[var_id.0].kind {
                        if self.current_class == Some(class) {
                            let name = variable.name.clone();
                            let this = Expression::new(
                                ExprKind::Variable(VariableExpr {
                                    name: "this".to_string(),
                                    resolved: None,
                                }),
                                location,
                            );
                            *expr = Expression::new(
                                ExprKind::MemberVariable(MemberVariableExpr {
                                    parent: Box::new(this),
                                    name,
                                    resolved: None,
                                }),
                                location,
                            );
                        }
                    }
                }
            }
        }

        match &mut expr.kind {
            ExprKind::IntLiteral(_) => {
                expr.result_type = LangType::Builtin(BuiltinType::I32);
                true
            }
            ExprKind::FloatLiteral(_) => {
                expr.result_type = LangType::Builtin(BuiltinType::F32);
                true
            }
            ExprKind::BoolLiteral(_) => {
                expr.result_type = LangType::Builtin(BuiltinType::Bool);
                true
            }
            ExprKind::StringLiteral(_) => {
                expr.result_type = LangType::Builtin(BuiltinType::Str);
                true
            }
            ExprKind::Variable(variable) => {
                if isolated {
                    self.diags
                        .error("usage of other variables is not allowed here", location);
                    return false;
                }
                match self.names.find_name(&variable.name) {
                    None => {
                        self.diags.error(
                            format!("name '{}' not found in current scope", variable.name),
                            location,
                        );
                        false
                    }
                    Some(DeclId::Var(var_id)) => {
                        variable.resolved = Some(var_id);
                        let ty = self.symbols.vars[var_id.0].ty.clone();
                        let ok = !ty.is_invalid();
                        expr.result_type = ty;
                        ok
                    }
                    Some(_) => {
                        self.diags.error(
                            format!("'{}' is not a declared variable", variable.name),
                            location,
                        );
                        false
                    }
                }
            }
            ExprKind::MemberVariable(member) => {
                if !self.check_expression(&mut member.parent, isolated) {
                    return false;
                }
                let Some(class_id) = member.parent.result_type.as_class() else {
                    self.diags.error(
                        format!(
                            "type '{}' is not a class, can't access member '{}'",
                            self.symbols.type_name(&member.parent.result_type),
                            member.name
                        ),
                        location,
                    );
                    return false;
                };
                let member_var = self.symbols.classes[class_id.0]
                    .members
                    .iter()
                    .copied()
                    .find(|id| self.symbols.vars[id.0].name == member.name);
                match member_var {
                    None => {
                        self.diags.error(
                            format!(
                                "class '{}' has no member variable named '{}'",
                                self.symbols.classes[class_id.0].name, member.name
                            ),
                            location,
                        );
                        false
                    }
                    Some(var_id) => {
                        member.resolved = Some(var_id);
                        let ty = self.symbols.vars[var_id.0].ty.clone();
                        let ok = !ty.is_invalid();
                        expr.result_type = ty;
                        ok
                    }
                }
            }
            ExprKind::Call(call) => {
                if isolated {
                    self.diags
                        .error("usage of function calls is not allowed here", location);
                    return false;
                }
                let fun_id = match self.names.find_name(&call.name) {
                    None => {
                        self.diags.error(
                            format!("function with name '{}' not declared", call.name),
                            location,
                        );
                        return false;
                    }
                    Some(DeclId::Function(fun_id)) => fun_id,
                    // calling a class name invokes its constructor
                    Some(DeclId::Class(class_id)) => self.symbols.classes[class_id.0].constructor,
                    Some(DeclId::Var(_)) => {
                        self.diags.error(
                            format!("'{}' is not a function", call.name),
                            location,
                        );
                        return false;
                    }
                };
                if !self.bind_call_arguments(call, fun_id, location) {
                    return false;
                }
                let return_type = self.symbols.functions[fun_id.0].return_type.clone();
                let ok = !return_type.is_invalid();
                expr.result_type = return_type;
                ok
            }
            ExprKind::MemberCall(member_call) => {
                if isolated {
                    self.diags
                        .error("usage of function calls is not allowed here", location);
                    return false;
                }
                if !self.check_expression(&mut member_call.parent, isolated) {
                    return false;
                }
                let Some(class_id) = member_call.parent.result_type.as_class() else {
                    self.diags.error(
                        format!(
                            "type '{}' is not a class, can't call method '{}'",
                            self.symbols.type_name(&member_call.parent.result_type),
                            member_call.call.name
                        ),
                        location,
                    );
                    return false;
                };
                let method = self.symbols.classes[class_id.0]
                    .methods
                    .iter()
                    .copied()
                    .find(|id| self.symbols.functions[id.0].name == member_call.call.name);
                let Some(fun_id) = method else {
                    self.diags.error(
                        format!(
                            "class '{}' has no method named '{}'",
                            self.symbols.classes[class_id.0].name, member_call.call.name
                        ),
                        location,
                    );
                    return false;
                };
                if !self.bind_call_arguments(&mut member_call.call, fun_id, location) {
                    return false;
                }
                let return_type = self.symbols.functions[fun_id.0].return_type.clone();
                let ok = !return_type.is_invalid();
                expr.result_type = return_type;
                ok
            }
            ExprKind::Unary(unary) => {
                if !self.check_expression(&mut unary.inner, isolated) {
                    return false;
                }
                if !unary.inner.result_type.is_bool() {
                    self.diags.error(
                        format!(
                            "unary operator '{}' requires a 'bool' operand but got '{}'",
                            unary.op,
                            self.symbols.type_name(&unary.inner.result_type)
                        ),
                        location,
                    );
                    return false;
                }
                expr.result_type = LangType::Builtin(BuiltinType::Bool);
                true
            }
            ExprKind::Binary(binary) => {
                let lhs_ok = self.check_expression(&mut binary.lhs, isolated);
                let rhs_ok = self.check_expression(&mut binary.rhs, isolated);
                if !lhs_ok || !rhs_ok {
                    return false;
                }
                let lhs_type = binary.lhs.result_type.clone();
                let rhs_type = binary.rhs.result_type.clone();
                if lhs_type != rhs_type {
                    self.diags.error(
                        format!(
                            "types of binary expression do not match: lhs type '{}' and rhs type '{}'",
                            self.symbols.type_name(&lhs_type),
                            self.symbols.type_name(&rhs_type)
                        ),
                        location,
                    );
                    return false;
                }
                let result = binary_operation_result_type(&lhs_type, binary.op);
                if result.is_invalid() {
                    self.diags.error(
                        format!(
                            "binary operator '{}' is not supported for operands of type '{}'",
                            binary.op,
                            self.symbols.type_name(&lhs_type)
                        ),
                        location,
                    );
                    return false;
                }
                expr.result_type = result;
                true
            }
        }
    }

    /// Reconcile a call's argument list with the callee's parameters.
    ///
    /// 1. positional arguments fill the leading slots,
    /// 2. named arguments fill their parameter's slot,
    /// 3. remaining slots take the parameter's default value,
    /// 4. a slot that is still empty is an error for this call.
    ///
    /// On success the call has exactly one positional argument per
    /// parameter, in parameter order, and no named arguments.
    fn bind_call_arguments(
        &mut self,
        call: &mut CallExpr,
        fun_id: FunId,
        call_location: SrcLocationRange,
    ) -> bool {
        let sig = self.symbols.functions[fun_id.0].clone();
        let arity = sig.params.len();
        let mut slots: Vec<Option<CallArg>> = (0..arity).map(|_| None).collect();
        let mut ok = true;

        let positional = std::mem::take(&mut call.args);
        for (index, mut arg) in positional.into_iter().enumerate() {
            if index >= arity {
                self.diags.error(
                    format!(
                        "function '{}' has only {} arguments, but a {}. argument has been provided at the function call",
                        sig.name,
                        arity,
                        index + 1
                    ),
                    arg.location,
                );
                return false;
            }
            if self.check_expression(&mut arg.expression, false)
                && arg.expression.result_type != sig.params[index].ty
            {
                self.diags.error(
                    format!(
                        "argument '{}' of function '{}' expects type '{}' but the provided value has type '{}'",
                        sig.params[index].name,
                        sig.name,
                        self.symbols.type_name(&sig.params[index].ty),
                        self.symbols.type_name(&arg.expression.result_type)
                    ),
                    arg.location,
                );
                ok = false;
            }
            slots[index] = Some(arg);
        }

        let named = std::mem::take(&mut call.named_args);
        for mut arg in named.into_iter() {
            let arg_name = arg.name.clone().unwrap_or_default();
            let Some(index) = sig.params.iter().position(|p| p.name == arg_name) else {
                self.diags.error(
                    format!(
                        "function '{}' does not have an argument with name '{}'",
                        sig.name, arg_name
                    ),
                    arg.location,
                );
                ok = false;
                continue;
            };
            if let Some(first) = &slots[index] {
                self.diags
                    .error(
                        format!(
                            "function argument '{}' of function '{}' was already assigned by another argument before",
                            arg_name, sig.name
                        ),
                        arg.location,
                    )
                    .note(
                        format!("first assign of argument '{}'", arg_name),
                        first.location,
                    );
                ok = false;
                continue;
            }
            if self.check_expression(&mut arg.expression, false)
                && arg.expression.result_type != sig.params[index].ty
            {
                self.diags.error(
                    format!(
                        "argument '{}' of function '{}' expects type '{}' but the provided value has type '{}'",
                        arg_name,
                        sig.name,
                        self.symbols.type_name(&sig.params[index].ty),
                        self.symbols.type_name(&arg.expression.result_type)
                    ),
                    arg.location,
                );
                ok = false;
            }
            arg.name = None;
            slots[index] = Some(arg);
        }

        // fill remaining slots from the parameter defaults
        for (index, slot) in slots.iter_mut().enumerate() {
            if slot.is_some() {
                continue;
            }
            match &sig.params[index].default {
                Some(default) => {
                    *slot = Some(CallArg {
                        name: None,
                        expression: default.clone(),
                        location: call_location,
                    });
                }
                None => {
                    self.diags
                        .error(
                            format!(
                                "function argument '{}' of function '{}' is required but has not been provided at the function call",
                                sig.params[index].name, sig.name
                            ),
                            call_location,
                        )
                        .note(
                            format!("definition of argument '{}'", sig.params[index].name),
                            sig.params[index].location,
                        );
                    ok = false;
                }
            }
        }

        if !ok {
            return false;
        }

        call.args = slots.into_iter().flatten().collect();
        call.named_args.clear();
        call.resolved = Some(fun_id);
        true
    }

    /********************************************************
     **** helpers *******************************************
     */

    /// Resolve a declared type name to a type.
    /// Reports an error and returns `Invalid` when the name is unknown.
    fn make_type_for_name(&mut self, name: &str, location: SrcLocationRange) -> LangType {
        if let Some(builtin) = BuiltinType::from_type_name(name) {
            return LangType::Builtin(builtin);
        }
        if let Some(DeclId::Class(class_id)) = self.names.find_name(name) {
            return LangType::Class(class_id);
        }
        self.diags.error(
            format!(
                "type '{}' is not declared, only builtin types and declared classes can be used",
                name
            ),
            location,
        );
        LangType::Invalid
    }

    fn check_main_function(&mut self, root: &mut Root) {
        let required = LangType::Builtin(BuiltinType::I32);
        for function in &root.functions {
            if function.name != "main" {
                continue;
            }
            let Some(fun_id) = function.fun_id else {
                continue;
            };
            let sig = &self.symbols.functions[fun_id.0];
            if sig.params.is_empty() && sig.return_type == required {
                root.main_function = Some(fun_id);
            } else {
                self.diags.error(
                    "main function has wrong signature, it needs the signature 'fun main(): i32'",
                    function.location,
                );
            }
        }

        if root.main_function.is_none() {
            let location = root
                .location
                .unwrap_or(SrcLocationRange::at(SrcLocation::new(1, 1, 0)));
            self.diags.error(
                "no main function has been provided, the main function needs the signature 'fun main(): i32'",
                location,
            );
        }
    }
}

/// Result type of a binary operation over operands of equal type.
///
/// Arithmetic on numerics returns the operand type, compares on numerics
/// return `bool`, `&&`/`||` on `bool` return `bool`; everything else is
/// invalid and gets diagnosed by the caller.
pub fn binary_operation_result_type(operands_type: &LangType, operation: BinaryOp) -> LangType {
    if operands_type.is_numeric() {
        if operation.is_comparison() {
            return LangType::Builtin(BuiltinType::Bool);
        }
        if operation.is_arithmetic() {
            return operands_type.clone();
        }
        return LangType::Invalid;
    }
    if operands_type.is_bool() && operation.is_logical() {
        return LangType::Builtin(BuiltinType::Bool);
    }
    LangType::Invalid
}

/// Whether execution of the statement always ends in a return.
///
/// A compound returns when any of its statements returns, an `if` only
/// with a returning `else` branch as well, a `while` is conservatively
/// treated as non-returning.
pub fn statement_returns(statement: &Statement) -> bool {
    match statement {
        Statement::Return(_) => true,
        Statement::Compound(compound) => compound.statements.iter().any(statement_returns),
        Statement::If(if_stmt) => match &if_stmt.else_body {
            Some(else_body) => {
                if_stmt.then_body.statements.iter().any(statement_returns)
                    && else_body.statements.iter().any(statement_returns)
            }
            None => false,
        },
        _ => false,
    }
}
