//! Malin Compiler Library
//!
//! Compilation pipeline for `.malin` source files: lexing, parsing,
//! decoration (name resolution and type checking) and lowering to the
//! textual intermediate representation. The native code generator consumes
//! the IR and lives outside this crate.
//!
//! ```rust,ignore
//! let ir = malinc::compile_source_to_ir(source, "prog.malin")?;
//! println!("{}", ir);
//! ```

pub mod ast;
pub mod ast_printer;
pub mod config;
pub mod decorator;
pub mod diagnostics;
pub mod ir;
pub mod lexer;
pub mod names;
pub mod parser;
pub mod source;

pub use ast::Root;
pub use config::CompilerConfig;
pub use decorator::{Symbols, decorate};
pub use diagnostics::{Diagnostics, Severity, format_diagnostic, format_diagnostics};
pub use ir::IRModule;
pub use ir::generator::generate;
pub use ir::printer::print_module;
pub use lexer::Lexer;
pub use parser::Parser;
pub use source::SourceManager;

use std::path::Path;

/// Run the whole pipeline over a source string and return the printed IR.
///
/// Every failure comes back as a formatted diagnostic string, never as a
/// panic.
pub fn compile_source_to_ir(source: &str, file_name: &str) -> Result<String, String> {
    let sources = SourceManager::new(file_name, source);

    let tokens = Lexer::new(source)
        .tokens()
        .map_err(|e| format!("error while lexing: {}", e))?;

    let mut root = Parser::new(tokens).parse().map_err(|e| {
        let mut diags = Diagnostics::new();
        diags.error(e.message.clone(), e.token.location);
        format_diagnostics(diags.all(), &sources)
    })?;

    let mut diags = Diagnostics::new();
    let symbols = decorate(&mut root, &mut diags);
    if diags.has_errors() {
        return Err(format_diagnostics(diags.all(), &sources));
    }

    let module = generate(&root, &symbols, file_name, &mut diags).map_err(|e| {
        let mut internal = Diagnostics::new();
        internal.error(e.message().to_string(), e.location());
        format_diagnostics(internal.all(), &sources)
    })?;
    if diags.has_errors() {
        return Err(format_diagnostics(diags.all(), &sources));
    }

    Ok(print_module(&module))
}

/// Read a source file from disk and compile it to the printed IR.
pub fn compile_file_to_ir(path: &Path) -> Result<String, String> {
    let source = std::fs::read_to_string(path)
        .map_err(|e| format!("failed to read source file '{}': {}", path.display(), e))?;
    compile_source_to_ir(&source, &path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_minimal_program_compiles() {
        let ir = compile_source_to_ir("fun main(): i32 { return 1; }", "test.malin").unwrap();
        assert!(ir.contains("function @main(): i32 {"));
        assert!(ir.contains("return( i32 1 )"));
    }

    #[test]
    fn test_named_and_default_arguments_end_to_end() {
        let ir = compile_source_to_ir(
            "fun f(a: i32, b: i32 = 10): i32 { return a + b; }\nfun main(): i32 { return f(b = 2, a = 3); }",
            "test.malin",
        )
        .unwrap();
        // binding reorders to positional order [3, 2]
        assert!(ir.contains("call( @f, i32 3, i32 2 )"));
    }

    #[test]
    fn test_missing_main_reports_error() {
        let err =
            compile_source_to_ir("fun helper(): i32 { return 1; }", "test.malin").unwrap_err();
        assert!(err.contains("no main function"));
    }

    #[test]
    fn test_missing_return_path_reports_error() {
        let err = compile_source_to_ir(
            "fun g(): i32 { if true { return 1; } }\nfun main(): i32 { return 0; }",
            "test.malin",
        )
        .unwrap_err();
        assert!(err.contains("non-void function must return on every path"));
    }

    #[test]
    fn test_call_in_global_initialiser_reports_error() {
        let err = compile_source_to_ir(
            "fun f(): i32 { return 1; }\nlet g: i32 = 1 + f();\nfun main(): i32 { return 0; }",
            "test.malin",
        )
        .unwrap_err();
        assert!(err.contains("usage of function calls is not allowed here"));
    }

    #[test]
    fn test_class_cycle_reports_error_with_notes() {
        let err = compile_source_to_ir(
            "class A { x: i32; y: B; }\nclass B { a: A; }\nfun main(): i32 { return 0; }",
            "test.malin",
        )
        .unwrap_err();
        assert!(err.contains("cyclic class composition"));
        assert!(err.contains("previously referenced from"));
    }

    #[test]
    fn test_parse_error_is_formatted_with_location() {
        let err = compile_source_to_ir("fun main(): i32 { return 1 }", "test.malin").unwrap_err();
        assert!(err.contains("error"));
        assert!(err.contains("Semicolon"));
    }

    #[test]
    fn test_lex_error_is_reported() {
        let err = compile_source_to_ir("let s = \"unterminated;", "test.malin").unwrap_err();
        assert!(err.contains("error while lexing"));
    }

    #[test]
    fn test_compile_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "fun main(): i32 {{ return 42; }}").unwrap();
        let ir = compile_file_to_ir(file.path()).unwrap();
        assert!(ir.contains("return( i32 42 )"));
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let err = compile_file_to_ir(Path::new("/no/such/file.malin")).unwrap_err();
        assert!(err.contains("failed to read source file"));
    }

    #[test]
    fn test_full_pipeline_is_deterministic() {
        let source = "let g = 1 + 2;\nfun main(): i32 { let a = g; while a < 10 { a = a + 1; } return a; }";
        let first = compile_source_to_ir(source, "test.malin").unwrap();
        let second = compile_source_to_ir(source, "test.malin").unwrap();
        assert_eq!(first, second);
    }
}
