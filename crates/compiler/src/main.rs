//! Malin Compiler CLI
//!
//! Drives the pipeline stage by stage over one source file and prints the
//! dumps requested by the flags. Exit codes: 0 success, 1 compilation
//! errors, 2 explicitly unimplemented pathway.

use clap::Parser as ClapParser;
use malinc::ast_printer::{AstPrinter, root_as_code};
use malinc::config::CompilerConfig;
use malinc::diagnostics::{Diagnostics, format_diagnostics};
use malinc::ir::{generator, printer};
use malinc::source::SourceManager;
use malinc::{Lexer, Parser, decorate};
use std::path::PathBuf;
use std::process;

#[derive(ClapParser)]
#[command(name = "malinc")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "The malin language compiler", long_about = None)]
struct Cli {
    /// Source file to compile
    #[arg(short = 'f', long = "file", value_name = "FILE")]
    file: PathBuf,

    /// Show the token list output of the lexer
    #[arg(long)]
    show_lexer_output: bool,

    /// Show the parser ast output
    #[arg(long)]
    show_parser_output: bool,

    /// Show the ast after identifiers have been linked and types resolved
    #[arg(long)]
    show_decorator_output: bool,

    /// Show the decorated ast rendered as source code
    #[arg(long)]
    show_ast_as_code: bool,

    /// Save the decorated ast rendered as source code next to the input
    #[arg(long)]
    save_ast_as_code: bool,

    /// Show the generated LLVM IR (not implemented)
    #[arg(long)]
    show_llvm_ir: bool,

    /// Save the generated LLVM IR (not implemented)
    #[arg(long)]
    save_llvm_ir: bool,

    /// Skip creation of the object file
    #[arg(long)]
    not_create_object_file: bool,

    /// Render the control-flow graph of one function (not implemented)
    #[arg(long, value_name = "NAME")]
    view_function_graph: Option<String>,

    /// Run the produced executable after linking (not implemented)
    #[arg(long)]
    run: bool,

    /// Lower through the internal IR pipeline and print the dump
    #[arg(long)]
    use_ir: bool,

    /// Compiler configuration file (TOML)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

fn main() {
    let cli = Cli::parse();
    process::exit(run(&cli));
}

fn run(cli: &Cli) -> i32 {
    println!("The malin language compiler");
    println!("- will compile file '{}'", cli.file.display());
    println!();

    let config = match &cli.config {
        Some(path) => match CompilerConfig::load_file(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Error: {}", e);
                return 1;
            }
        },
        None => CompilerConfig::default(),
    };

    // -------------------------------
    // read file
    println!("- read file:");
    let source = match std::fs::read_to_string(&cli.file) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("Error while reading file '{}': {}", cli.file.display(), e);
            return 1;
        }
    };
    println!("-- file has {} characters", source.len());
    println!();
    let sources = SourceManager::new(&cli.file, &source);

    // -------------------------------
    // lexing
    println!("- lexing:");
    let tokens = match Lexer::new(&source).tokens() {
        Ok(tokens) => tokens,
        Err(e) => {
            eprintln!("Error while lexing: {}", e);
            return 1;
        }
    };
    if cli.show_lexer_output {
        println!("-- tokens:");
        for token in &tokens {
            println!(
                "{}:{}: {}",
                sources.path_string(),
                token.location.start,
                token
            );
        }
    }
    println!("-- lexing done");
    println!();

    // -------------------------------
    // parsing
    println!("- parsing:");
    let mut root = match Parser::new(tokens).parse() {
        Ok(root) => root,
        Err(e) => {
            let mut diags = Diagnostics::new();
            diags.error(e.message, e.token.location);
            eprint!("{}", format_diagnostics(diags.all(), &sources));
            return 1;
        }
    };
    if cli.show_parser_output {
        println!("-- ast:");
        print!("{}", AstPrinter::new().print(&root));
    }
    println!("-- parsing done");
    println!();

    // -------------------------------
    // decorate
    println!("- decorate ast:");
    let mut diags = Diagnostics::new();
    let symbols = decorate(&mut root, &mut diags);

    if cli.show_decorator_output {
        println!("-- ast:");
        print!("{}", AstPrinter::with_symbols(&symbols).print(&root));
    }
    if !diags.is_empty() {
        eprint!("{}", format_diagnostics(diags.all(), &sources));
    }
    if diags.has_errors() {
        eprintln!(
            "Compilation failed with {} error(s)",
            diags.error_count()
        );
        return 1;
    }
    if config.deny_warnings && diags.warning_count() > 0 {
        eprintln!(
            "Compilation failed, warnings are denied and there are {} warning(s)",
            diags.warning_count()
        );
        return 1;
    }
    println!("-- decorating done");
    println!();

    if cli.show_ast_as_code {
        println!("-- ast as code:");
        print!("{}", root_as_code(&root));
    }
    if cli.save_ast_as_code {
        let path = cli.file.with_extension("ast.malin");
        if let Err(e) = std::fs::write(&path, root_as_code(&root)) {
            eprintln!("Error writing '{}': {}", path.display(), e);
            return 1;
        }
        println!("-- ast as code saved to '{}'", path.display());
    }

    // -------------------------------
    // intermediate representation
    if cli.use_ir {
        println!("- generate ir:");
        let mut ir_diags = Diagnostics::new();
        let module = match generator::generate(&root, &symbols, &sources.path_string(), &mut ir_diags) {
            Ok(module) => module,
            Err(internal) => {
                let mut internal_diags = Diagnostics::new();
                internal_diags.error(internal.message().to_string(), internal.location());
                eprint!("{}", format_diagnostics(internal_diags.all(), &sources));
                return 1;
            }
        };
        if !ir_diags.is_empty() {
            eprint!("{}", format_diagnostics(ir_diags.all(), &sources));
        }
        if ir_diags.has_errors() {
            eprintln!(
                "IR generation failed with {} error(s)",
                ir_diags.error_count()
            );
            return 1;
        }
        println!("-- ir:");
        print!("{}", printer::print_module(&module));
        println!("-- ir generation done");
        println!();
    }

    // -------------------------------
    // pathways handled by the native backend
    if cli.show_llvm_ir || cli.save_llvm_ir {
        eprintln!("LLVM IR output is not implemented");
        return 2;
    }
    if let Some(name) = &cli.view_function_graph {
        eprintln!("function graph view for '{}' is not implemented", name);
        return 2;
    }
    if cli.run {
        eprintln!("running the produced executable is not implemented");
        return 2;
    }

    if config.create_object_file && !cli.not_create_object_file {
        println!(
            "- object file generation ('{}') not implemented -> skipping",
            config.output.display()
        );
        println!();
    }

    println!("   Compiled without errors");
    0
}
