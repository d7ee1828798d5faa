use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use tagwire_compiler::emitter::Emitter;
use tagwire_compiler::{check_schema, encode_binary_schema, CompileError};

#[derive(Parser)]
#[command(name = "tagwire")]
#[command(version, about = "Generate C++ sources from .tw schema files", long_about = None)]
struct Cli {
    /// Input `.tw` schema file
    input: PathBuf,

    /// Output directory for generated files
    #[arg(short, long, default_value = ".")]
    output: PathBuf,

    /// Base filename for generated files (without extension); defaults to
    /// the schema's namespace name
    #[arg(short, long)]
    filename: Option<String>,

    /// Also write the compact binary form of the schema as `<base>.tw.bin`
    #[arg(long)]
    binary_schema: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(CompileError::Invalid(diagnostics)) => {
            eprintln!("Validation errors:");
            for diagnostic in &diagnostics {
                eprintln!("  {}", diagnostic);
            }
            ExitCode::FAILURE
        }
        Err(err) => {
            eprintln!("Error: {}", err);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<(), CompileError> {
    if cli.verbose {
        println!("Reading input file: {}", cli.input.display());
    }
    let text = fs::read_to_string(&cli.input).map_err(CompileError::Io)?;

    if cli.verbose {
        println!("Parsing and validating...");
    }
    let schema = check_schema(&text)?;

    let base_name = cli
        .filename
        .clone()
        .unwrap_or_else(|| schema.namespace.clone());

    if cli.verbose {
        println!("Generating code...");
    }
    let emitter = Emitter::with_base_name(&schema, base_name.as_str());
    let header_content = emitter.generate_header();
    let source_content = emitter.generate_source();

    if !cli.output.exists() {
        if cli.verbose {
            println!("Creating output directory: {}", cli.output.display());
        }
        fs::create_dir_all(&cli.output).map_err(CompileError::Io)?;
    }

    let header_path = cli.output.join(format!("{}.hpp", base_name));
    let source_path = cli.output.join(format!("{}.cpp", base_name));

    if cli.verbose {
        println!("Writing header: {}", header_path.display());
    }
    fs::write(&header_path, &header_content).map_err(CompileError::Io)?;

    if cli.verbose {
        println!("Writing source: {}", source_path.display());
    }
    fs::write(&source_path, &source_content).map_err(CompileError::Io)?;

    println!("Successfully generated:");
    println!("  {}", header_path.display());
    println!("  {}", source_path.display());

    if cli.binary_schema {
        let binary_path = cli.output.join(format!("{}.tw.bin", base_name));
        let encoded = encode_binary_schema(&schema)?;
        fs::write(&binary_path, &encoded).map_err(CompileError::Io)?;
        println!("  {}", binary_path.display());
    }

    Ok(())
}
