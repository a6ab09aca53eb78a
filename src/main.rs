use std::{fmt::Display, path::PathBuf, process::ExitCode, time::Instant};

use clap::{error::ErrorKind, CommandFactory, Parser as ClapParser};
use colored::Colorize;
use flowc::{
    compiler::{
        backend::{Backend, BackendError},
        compiler::lower,
        ir::IrModule,
    },
    display_error,
    type_checker::type_checker::type_check,
    visitor::{recorder::EventRecorder, traversal::walk},
    SourceFile,
};

#[cfg(feature = "llvm")]
use flowc::compiler::llvm::LlvmBackend;

#[cfg(feature = "llvm")]
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
enum BackendKind {
    /// Built-in IR with an interpreter
    Ir,
    /// Native LLVM module
    Llvm,
}

#[derive(Debug, ClapParser)]
#[command(version, about = "Compiler with an information-flow type system", long_about = None)]
struct Args {
    /// Source file to compile
    file: PathBuf,

    /// Lower the program without type checking it first
    #[arg(long, conflicts_with = "typecheck_only")]
    skip_typecheck: bool,

    /// Stop after type checking
    #[arg(long)]
    typecheck_only: bool,

    /// Print the generated module
    #[arg(long)]
    emit_ir: bool,

    /// Print the traversal events of the parsed program
    #[arg(long)]
    dump_events: bool,

    /// Execute `main` and print the final value of every variable
    #[arg(long)]
    run: bool,

    /// Write the generated module to this path
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Trace both passes and print phase timings
    #[arg(short, long)]
    verbose: bool,

    #[cfg(feature = "llvm")]
    #[arg(long, value_enum, default_value_t = BackendKind::Ir)]
    backend: BackendKind,
}

fn main() -> ExitCode {
    let args = Args::parse();

    if !args.file.is_file() {
        Args::command()
            .error(
                ErrorKind::InvalidValue,
                format!("Source file '{}' does not exist!", args.file.display()),
            )
            .exit()
    }

    let start = Instant::now();

    let source = match SourceFile::read(&args.file) {
        Ok(source) => source,
        Err(error) => {
            eprintln!("{}: failed to read {}: {}", "error".red(), args.file.display(), error);
            return ExitCode::FAILURE;
        }
    };

    let parse_start = Instant::now();
    let root = match source.parse() {
        Ok(root) => root,
        Err(error) => {
            display_error(&error, Some(&source));
            return ExitCode::FAILURE;
        }
    };
    if args.verbose {
        println!("Parsed in {:?}", parse_start.elapsed());
    }

    if args.dump_events {
        let mut recorder = EventRecorder::new();
        walk(&root, &mut recorder);
        for line in recorder.lines() {
            println!("{}", line);
        }
    }

    if !args.skip_typecheck {
        let type_check_start = Instant::now();
        let (passed, diagnostics) = type_check(&root, args.verbose);
        if args.verbose {
            println!("Type checked in {:?}", type_check_start.elapsed());
        }

        for diagnostic in &diagnostics {
            display_error(diagnostic, Some(&source));
        }
        if !passed {
            return ExitCode::FAILURE;
        }
        if args.typecheck_only {
            println!("{}: {} type checks", "ok".green(), source.name);
            return ExitCode::SUCCESS;
        }
    }

    let compile_start = Instant::now();

    #[cfg(feature = "llvm")]
    let result = match args.backend {
        BackendKind::Ir => finish(lower(&root, IrModule::new(&source.name), args.verbose), &args),
        BackendKind::Llvm => {
            let context = inkwell::context::Context::create();
            let backend = LlvmBackend::new(&context, &source.name);
            finish(lower(&root, backend, args.verbose), &args)
        }
    };
    #[cfg(not(feature = "llvm"))]
    let result = finish(lower(&root, IrModule::new(&source.name), args.verbose), &args);

    if args.verbose {
        println!("Compiled in {:?}", compile_start.elapsed());
        println!("Total time: {:?}", start.elapsed());
    }

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("{}: {}", "error".red(), error);
            ExitCode::FAILURE
        }
    }
}

/// Verifies the lowered module, then prints, writes and runs it as asked.
fn finish<B: Backend + Display>(backend: B, args: &Args) -> Result<(), BackendError> {
    backend.verify()?;

    if args.emit_ir {
        print!("{}", backend);
    }

    if let Some(output) = &args.output {
        backend.serialize(output)?;
        if args.verbose {
            println!("Wrote {}", output.display());
        }
    }

    if args.run {
        let result = backend.execute()?;
        for (name, value) in &result.variables {
            println!("{} = {}", name, value);
        }
        println!("main returned {}", result.exit_code);
    }

    Ok(())
}
