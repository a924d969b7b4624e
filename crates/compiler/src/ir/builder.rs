//! IR builder
//!
//! Creates functions, basic blocks and instructions for an `IRModule`. The
//! builder tracks the current function and the current basic block new
//! instructions are appended to.
//!
//! Besides the function blocks there is one holding block that belongs to
//! no function: the init expressions of global variables and the default
//! values of function arguments are lowered into it, then moved into the
//! module's constant-initialiser list. No emitted control flow can reach
//! the holding block.

use super::*;

pub struct IRBuilder {
    module: IRModule,
    current_function: Option<FunctionId>,
    current_block: Option<BlockId>,
    holding_block: BlockId,
}

impl IRBuilder {
    pub fn new(source_file_name: impl Into<String>) -> Self {
        let mut module = IRModule {
            source_file_name: source_file_name.into(),
            ..IRModule::default()
        };
        module.blocks.push(IRBasicBlock {
            name: "holding".to_string(),
            function: None,
            instructions: Vec::new(),
        });
        let holding_block = BlockId(0);
        IRBuilder {
            module,
            current_function: None,
            current_block: None,
            holding_block,
        }
    }

    pub fn module(&self) -> &IRModule {
        &self.module
    }

    /// Mutable module access, used by the generator to patch the targets of
    /// conditional jumps once the blocks exist.
    pub fn module_mut(&mut self) -> &mut IRModule {
        &mut self.module
    }

    pub fn finish(self) -> IRModule {
        self.module
    }

    /// Add a function to the module. An entry basic block is created and
    /// selected as insertion point.
    pub fn function(
        &mut self,
        name: impl Into<String>,
        return_type: IRType,
        is_extern: bool,
    ) -> FunctionId {
        self.module.functions.push(IRFunction {
            name: name.into(),
            return_type,
            is_extern,
            params: Vec::new(),
            blocks: Vec::new(),
        });
        let id = FunctionId(self.module.functions.len() - 1);
        self.current_function = Some(id);
        self.basic_block("entry");
        id
    }

    /// Add a formal argument value to a function.
    pub fn function_argument(
        &mut self,
        function: FunctionId,
        name: impl Into<String>,
        ty: IRType,
    ) -> ValueId {
        let value = self.add_value(IRValue {
            kind: IRValueKind::FunctionArgument { default: None },
            ty,
            name: name.into(),
        });
        self.module.functions[function.0].params.push(value);
        value
    }

    /// Add a global variable value to the module.
    pub fn global_var(&mut self, name: impl Into<String>, ty: IRType) -> ValueId {
        let value = self.add_value(IRValue {
            kind: IRValueKind::GlobalVar { init: None },
            ty,
            name: name.into(),
        });
        self.module.globals.push(value);
        value
    }

    /// Add a new basic block to the current function and select it; new
    /// instructions go there until another block is selected.
    ///
    /// Panics when no function has been created yet; the generator always
    /// creates functions first.
    pub fn basic_block(&mut self, name: impl Into<String>) -> BlockId {
        let function = self
            .current_function
            .expect("basic_block requires a current function");
        self.module.blocks.push(IRBasicBlock {
            name: name.into(),
            function: Some(function),
            instructions: Vec::new(),
        });
        let id = BlockId(self.module.blocks.len() - 1);
        self.module.functions[function.0].blocks.push(id);
        self.current_block = Some(id);
        id
    }

    /// Select the basic block subsequent instructions are appended to.
    /// This also switches the current function to the block's owner.
    pub fn set_insertion_block(&mut self, block: BlockId) {
        self.current_function = self.module.blocks[block.0].function;
        self.current_block = Some(block);
    }

    pub fn insertion_block(&self) -> BlockId {
        self.current_block
            .expect("no insertion block selected")
    }

    /// Select the holding block for lowering constant initialisers.
    pub fn select_holding_block(&mut self) {
        self.current_function = None;
        self.current_block = Some(self.holding_block);
    }

    /// Move everything lowered into the holding block to the module's
    /// constant-initialiser list, leaving the holding block empty.
    pub fn take_holding_values(&mut self) -> Vec<ValueId> {
        let values = std::mem::take(&mut self.module.blocks[self.holding_block.0].instructions);
        self.module.const_inits.extend(&values);
        values
    }

    /// Append an instruction to the current block.
    pub fn inst(&mut self, kind: IRValueKind, ty: IRType, name: impl Into<String>) -> ValueId {
        let block = self.insertion_block();
        let value = self.add_value(IRValue {
            kind,
            ty,
            name: name.into(),
        });
        self.module.blocks[block.0].instructions.push(value);
        value
    }

    fn add_value(&mut self, value: IRValue) -> ValueId {
        self.module.values.push(value);
        ValueId(self.module.values.len() - 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::BuiltinType;

    #[test]
    fn test_function_creates_and_selects_entry_block() {
        let mut builder = IRBuilder::new("test.malin");
        let function = builder.function("main", IRType::Builtin(BuiltinType::I32), false);
        let entry = builder.insertion_block();
        assert_eq!(builder.module().function(function).blocks, vec![entry]);
        assert_eq!(builder.module().block(entry).name, "entry");
        assert_eq!(builder.module().block(entry).function, Some(function));
    }

    #[test]
    fn test_instructions_go_to_selected_block() {
        let mut builder = IRBuilder::new("test.malin");
        builder.function("f", IRType::Void, false);
        let entry = builder.insertion_block();
        let second = builder.basic_block("next");

        let in_second = builder.inst(IRValueKind::ConstI32(1), IRType::Builtin(BuiltinType::I32), "");
        builder.set_insertion_block(entry);
        let in_entry = builder.inst(IRValueKind::ConstI32(2), IRType::Builtin(BuiltinType::I32), "");

        assert_eq!(builder.module().block(second).instructions, vec![in_second]);
        assert_eq!(builder.module().block(entry).instructions, vec![in_entry]);
    }

    #[test]
    fn test_holding_block_transfer() {
        let mut builder = IRBuilder::new("test.malin");
        builder.select_holding_block();
        let value = builder.inst(
            IRValueKind::ConstI32(42),
            IRType::Builtin(BuiltinType::I32),
            "",
        );
        let taken = builder.take_holding_values();
        assert_eq!(taken, vec![value]);

        let module = builder.finish();
        assert_eq!(module.const_inits, vec![value]);
        // the holding block is empty again and belongs to no function
        assert!(module.blocks[0].instructions.is_empty());
        assert_eq!(module.blocks[0].function, None);
    }

    #[test]
    fn test_globals_are_ordered() {
        let mut builder = IRBuilder::new("test.malin");
        let a = builder.global_var("a", IRType::pointer_to(IRType::Builtin(BuiltinType::I32)));
        let b = builder.global_var("b", IRType::pointer_to(IRType::Builtin(BuiltinType::F32)));
        assert_eq!(builder.module().globals, vec![a, b]);
    }
}
