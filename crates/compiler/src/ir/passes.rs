//! IR pass framework
//!
//! A pass visits the module's globals and functions; a basic-block pass
//! additionally descends into every block of a function. A user-chosen
//! parameter value is threaded through the whole visit, so passes stay
//! free of ambient state and new passes are cheap to add.

use super::*;

/// Visits the globals and functions of a module.
pub trait ModulePass {
    type Param: Copy;

    fn visit_global(&mut self, _module: &mut IRModule, _global: ValueId, _param: Self::Param) {}

    fn visit_function(&mut self, module: &mut IRModule, function: FunctionId, param: Self::Param);

    fn run(&mut self, module: &mut IRModule, param: Self::Param) {
        for index in 0..module.globals.len() {
            let global = module.globals[index];
            self.visit_global(module, global, param);
        }
        for index in 0..module.functions.len() {
            self.visit_function(module, FunctionId(index), param);
        }
    }
}

/// Visits every basic block of every function.
pub trait BasicBlockPass {
    type Param: Copy;

    fn visit_basic_block(&mut self, module: &mut IRModule, block: BlockId, param: Self::Param);
}

impl<P: BasicBlockPass> ModulePass for P {
    type Param = P::Param;

    fn visit_function(&mut self, module: &mut IRModule, function: FunctionId, param: Self::Param) {
        let blocks = module.function(function).blocks.clone();
        for block in blocks {
            self.visit_basic_block(module, block, param);
        }
    }
}

/// Truncates every basic block after its first terminator instruction, so
/// a block terminated by a return or jump carries no unreachable rest.
pub struct RemoveRedundantTerminatorsPass;

impl BasicBlockPass for RemoveRedundantTerminatorsPass {
    type Param = ();

    fn visit_basic_block(&mut self, module: &mut IRModule, block: BlockId, _param: ()) {
        let first_terminator = module
            .block(block)
            .instructions
            .iter()
            .position(|&value| module.value(value).is_terminator());
        if let Some(index) = first_terminator {
            module.block_mut(block).instructions.truncate(index + 1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::BuiltinType;
    use crate::ir::builder::IRBuilder;

    fn test_module() -> (IRModule, BlockId) {
        let mut builder = IRBuilder::new("test.malin");
        builder.function("f", IRType::Void, false);
        let entry = builder.insertion_block();
        (builder.finish(), entry)
    }

    fn push_inst(module: &mut IRModule, block: BlockId, kind: IRValueKind, ty: IRType) -> ValueId {
        module.values.push(IRValue {
            kind,
            ty,
            name: String::new(),
        });
        let id = ValueId(module.values.len() - 1);
        module.block_mut(block).instructions.push(id);
        id
    }

    #[test]
    fn test_instructions_after_terminator_are_removed() {
        let (mut module, entry) = test_module();
        let const_before =
            push_inst(&mut module, entry, IRValueKind::ConstI32(1), IRType::Builtin(BuiltinType::I32));
        let ret = push_inst(
            &mut module,
            entry,
            IRValueKind::Return { value: None },
            IRType::Void,
        );
        push_inst(&mut module, entry, IRValueKind::ConstI32(2), IRType::Builtin(BuiltinType::I32));
        push_inst(
            &mut module,
            entry,
            IRValueKind::Return { value: None },
            IRType::Void,
        );

        RemoveRedundantTerminatorsPass.run(&mut module, ());

        assert_eq!(module.block(entry).instructions, vec![const_before, ret]);
    }

    #[test]
    fn test_block_without_terminator_is_untouched() {
        let (mut module, entry) = test_module();
        push_inst(&mut module, entry, IRValueKind::ConstI32(1), IRType::Builtin(BuiltinType::I32));
        push_inst(&mut module, entry, IRValueKind::ConstI32(2), IRType::Builtin(BuiltinType::I32));

        RemoveRedundantTerminatorsPass.run(&mut module, ());

        assert_eq!(module.block(entry).instructions.len(), 2);
    }

    #[test]
    fn test_param_is_threaded_through_the_visit() {
        struct CountBlocksPass {
            blocks_seen: usize,
            offsets_seen: usize,
        }
        impl BasicBlockPass for CountBlocksPass {
            type Param = usize;
            fn visit_basic_block(&mut self, _: &mut IRModule, _: BlockId, param: usize) {
                self.blocks_seen += 1;
                self.offsets_seen += param;
            }
        }

        let (mut module, _) = test_module();
        let mut pass = CountBlocksPass {
            blocks_seen: 0,
            offsets_seen: 0,
        };
        pass.run(&mut module, 10);
        assert_eq!(pass.blocks_seen, 1);
        assert_eq!(pass.offsets_seen, 10);
    }
}
