//! IR printer
//!
//! Deterministic textual dump of an IR module. Global values and functions
//! live in an `@`-prefixed name scope, values within a function in a
//! `%`-prefixed one; both scopes de-duplicate names with a counter per base
//! name (`x`, `x1`, `x2`, …). Constant values print inline at their use
//! sites. Printing the same module twice yields identical strings.

use super::*;
use std::collections::HashMap;

/// Ensures uniqueness of the value names in one printer scope.
struct ValueNamesScope {
    sigil: char,
    last: HashMap<String, usize>,
    names: HashMap<ValueId, String>,
}

impl ValueNamesScope {
    fn new(sigil: char) -> Self {
        ValueNamesScope {
            sigil,
            last: HashMap::new(),
            names: HashMap::new(),
        }
    }

    /// Delete all stored value names.
    fn reset(&mut self) {
        self.last.clear();
        self.names.clear();
    }

    /// Register a value and return its unique display name. Unnamed values
    /// count up from `0`, named collisions get a numeric suffix.
    fn register(&mut self, value: ValueId, base: &str) -> String {
        let name = match self.last.get_mut(base) {
            None => {
                self.last.insert(base.to_string(), 0);
                if base.is_empty() {
                    "0".to_string()
                } else {
                    base.to_string()
                }
            }
            Some(counter) => {
                *counter += 1;
                format!("{}{}", base, counter)
            }
        };
        self.names.insert(value, name.clone());
        name
    }

    /// `"%name: type = "` for a new value, empty for void-typed values.
    fn decl_str(&mut self, module: &IRModule, value: ValueId) -> String {
        let v = module.value(value);
        if v.ty.is_void() {
            return String::new();
        }
        let name = self.register(value, &v.name);
        format!("{}{}: {} = ", self.sigil, name, v.ty)
    }

    /// `"type %name"` for a value used as an operand.
    fn value_str(&self, module: &IRModule, value: ValueId) -> Option<String> {
        let name = self.names.get(&value)?;
        Some(format!("{} {}{}", module.value(value).ty, self.sigil, name))
    }
}

/// Print a whole module.
pub fn print_module(module: &IRModule) -> String {
    IRPrinter {
        module,
        globals: ValueNamesScope::new('@'),
        locals: ValueNamesScope::new('%'),
        block_names: HashMap::new(),
    }
    .print()
}

struct IRPrinter<'m> {
    module: &'m IRModule,
    globals: ValueNamesScope,
    /// names within the current function or global initialiser
    locals: ValueNamesScope,
    /// display names of the current function's blocks
    block_names: HashMap<BlockId, String>,
}

impl IRPrinter<'_> {
    fn print(mut self) -> String {
        let mut items: Vec<String> = Vec::new();
        for index in 0..self.module.globals.len() {
            self.locals.reset();
            items.push(self.print_global(self.module.globals[index]));
        }
        for index in 0..self.module.functions.len() {
            self.locals.reset();
            items.push(self.print_function(FunctionId(index)));
        }
        items.join("\n")
    }

    fn print_global(&mut self, global: ValueId) -> String {
        let mut out = String::new();
        let init = match &self.module.value(global).kind {
            IRValueKind::GlobalVar { init } => *init,
            _ => None,
        };

        // computed initialisers print their instructions in a brace ahead
        // of the global itself
        if let Some(init) = init {
            let mut init_values = Vec::new();
            self.collect_init_values(init, &mut init_values);
            if !init_values.is_empty() {
                out.push_str("{\n");
                for value in init_values {
                    if let Some(line) = self.inst_str(value) {
                        out.push_str("    ");
                        out.push_str(&line);
                        out.push('\n');
                    }
                }
                out.push_str("}\n");
            }
        }

        out.push_str(&self.globals.decl_str(self.module, global));
        match init {
            Some(init) => out.push_str(&format!("globalVar( {} )\n", self.operand_str(init))),
            None => out.push_str("globalVar()\n"),
        }
        out
    }

    /// Post-order walk over an initialiser value tree, collecting every
    /// non-constant value so it can print inside the brace.
    fn collect_init_values(&self, value: ValueId, out: &mut Vec<ValueId>) {
        let v = self.module.value(value);
        match &v.kind {
            IRValueKind::NumCalcBinary { lhs, rhs, .. }
            | IRValueKind::NumCmpBinary { lhs, rhs, .. }
            | IRValueKind::BoolBinary { lhs, rhs, .. } => {
                self.collect_init_values(*lhs, out);
                self.collect_init_values(*rhs, out);
            }
            IRValueKind::LogicalNot { value: inner } => {
                self.collect_init_values(*inner, out);
            }
            _ => {}
        }
        if !v.is_const() {
            out.push(value);
        }
    }

    fn print_function(&mut self, function: FunctionId) -> String {
        let f = self.module.function(function);

        let params: Vec<String> = f
            .params
            .iter()
            .map(|&param| {
                let v = self.module.value(param);
                let name = self.locals.register(param, &v.name);
                let mut out = format!("%{}: {}", name, v.ty);
                if let IRValueKind::FunctionArgument {
                    default: Some(default),
                } = &v.kind
                {
                    out.push_str(&format!(" = {}", self.operand_str(*default)));
                }
                out
            })
            .collect();

        if f.is_extern {
            return format!(
                "function @{}({}): {}  [extern]\n",
                f.name,
                params.join(", "),
                f.return_type
            );
        }

        // assign the block display names first so forward jumps resolve
        self.block_names.clear();
        let mut last_block_names: HashMap<String, usize> = HashMap::new();
        for &block in &f.blocks {
            let base = &self.module.block(block).name;
            let display = match last_block_names.get_mut(base.as_str()) {
                None => {
                    last_block_names.insert(base.clone(), 0);
                    base.clone()
                }
                Some(counter) => {
                    *counter += 1;
                    format!("{}{}", base, counter)
                }
            };
            self.block_names.insert(block, display);
        }

        let mut out = format!(
            "function @{}({}): {} {{\n",
            f.name,
            params.join(", "),
            f.return_type
        );
        for &block in &f.blocks {
            out.push_str(&format!(" {}:\n", self.block_names[&block]));
            for &value in &self.module.block(block).instructions {
                if let Some(line) = self.inst_str(value) {
                    out.push_str("    ");
                    out.push_str(&line);
                    out.push('\n');
                }
            }
        }
        out.push_str("}\n");
        out
    }

    /// Render one instruction line. Constants return `None`, they print
    /// inline at their use sites.
    fn inst_str(&mut self, value: ValueId) -> Option<String> {
        let v = self.module.value(value);
        let line = match &v.kind {
            IRValueKind::ConstI32(_) | IRValueKind::ConstF32(_) | IRValueKind::ConstBool(_) => {
                return None;
            }
            IRValueKind::Comment(text) => format!("; {}", text),
            IRValueKind::Invalid => "invalid".to_string(),
            IRValueKind::AllocBuiltin(builtin) => {
                format!(
                    "{}allocBuildIn( {} )",
                    self.locals.decl_str(self.module, value),
                    builtin
                )
            }
            IRValueKind::Load { source } => {
                format!(
                    "{}load( {} )",
                    self.locals.decl_str(self.module, value),
                    self.operand_str(*source)
                )
            }
            IRValueKind::Store { dest, value: stored } => {
                format!(
                    "store( {}, {} )",
                    self.operand_str(*stored),
                    self.operand_str(*dest)
                )
            }
            IRValueKind::NumCalcBinary { op, lhs, rhs } => {
                format!(
                    "{}numCalcBinary( {}, {}, {} )",
                    self.locals.decl_str(self.module, value),
                    op,
                    self.operand_str(*lhs),
                    self.operand_str(*rhs)
                )
            }
            IRValueKind::NumCmpBinary { op, lhs, rhs } => {
                format!(
                    "{}numCmpBinary( {}, {}, {} )",
                    self.locals.decl_str(self.module, value),
                    op,
                    self.operand_str(*lhs),
                    self.operand_str(*rhs)
                )
            }
            IRValueKind::BoolBinary { op, lhs, rhs } => {
                format!(
                    "{}boolBinary( {}, {}, {} )",
                    self.locals.decl_str(self.module, value),
                    op,
                    self.operand_str(*lhs),
                    self.operand_str(*rhs)
                )
            }
            IRValueKind::LogicalNot { value: inner } => {
                format!(
                    "{}logicalNot( {} )",
                    self.locals.decl_str(self.module, value),
                    self.operand_str(*inner)
                )
            }
            IRValueKind::Return { value: None } => "return()".to_string(),
            IRValueKind::Return { value: Some(returned) } => {
                format!("return( {} )", self.operand_str(*returned))
            }
            IRValueKind::Jump { target } => format!("jump( {} )", self.block_str(*target)),
            IRValueKind::CondJump {
                condition,
                true_target,
                false_target,
            } => format!(
                "condJump( {}, {}, {} )",
                self.operand_str(*condition),
                self.block_str(*true_target),
                self.block_str(*false_target)
            ),
            IRValueKind::Call {
                function,
                arguments,
            } => {
                let mut parts = vec![format!("@{}", self.module.function(*function).name)];
                parts.extend(arguments.iter().map(|&arg| self.operand_str(arg)));
                format!(
                    "{}call( {} )",
                    self.locals.decl_str(self.module, value),
                    parts.join(", ")
                )
            }
            IRValueKind::FunctionArgument { .. } | IRValueKind::GlobalVar { .. } => {
                format!("; misplaced value '{}'", v.name)
            }
        };
        Some(line)
    }

    /// Render a value used as an operand: constants inline, everything else
    /// by its registered name.
    fn operand_str(&self, value: ValueId) -> String {
        let v = self.module.value(value);
        match &v.kind {
            IRValueKind::ConstI32(i) => format!("{} {}", v.ty, i),
            IRValueKind::ConstF32(f) => format!("{} {}", v.ty, f),
            IRValueKind::ConstBool(b) => format!("{} {}", v.ty, b),
            _ => self
                .locals
                .value_str(self.module, value)
                .or_else(|| self.globals.value_str(self.module, value))
                .unwrap_or_else(|| format!("{} <unnamed>", v.ty)),
        }
    }

    fn block_str(&self, block: BlockId) -> String {
        self.block_names
            .get(&block)
            .cloned()
            .unwrap_or_else(|| self.module.block(block).name.clone())
    }
}
