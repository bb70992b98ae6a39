use clap::{Parser, Subcommand};
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use tracing::info;
use tracing_subscriber::EnvFilter;

use koinos_reflect::{compile_files, generate_to_dir, load_schema, schema_to_json};
use koinos_reflect_compiler::error::ReflectError;
use koinos_reflect_compiler::{read_sources, tokenize, CompileOptions, GeneratorRegistry};

#[derive(Parser)]
#[command(name = "kreflect")]
#[command(about = "Compile Koinos type IDL into a schema, or generate code from a schema", long_about = None)]
struct Cli {
    /// Log pipeline stages to stderr (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the raw token stream of the concatenated inputs, one JSON token per line
    Lex {
        /// Input IDL files, concatenated in order
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Output file (if omitted, prints to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print the parse tree of the concatenated inputs as JSON
    Parse {
        /// Input IDL files, concatenated in order
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Output file (if omitted, prints to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Analyze the concatenated inputs and emit the dependency-ordered schema JSON
    Schema {
        /// Input IDL files, concatenated in order
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Output `.json` file (if omitted, prints to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Longest dependency chain followed before reporting a cycle
        #[arg(long, default_value_t = CompileOptions::default().max_sort_depth)]
        max_sort_depth: usize,
    },

    /// Run a code generator over a schema JSON file
    Generate {
        /// Schema `.json` produced by the `schema` command
        #[arg(required_unless_present = "list_targets")]
        schema: Option<PathBuf>,

        /// Generator to run
        #[arg(short, long, default_value = "rust")]
        target: String,

        /// Output package name; files land in `<output>/<package>/`
        #[arg(short, long, required_unless_present = "list_targets")]
        package: Option<String>,

        /// Output directory
        #[arg(short, long, default_value = "build")]
        output: PathBuf,

        /// List the available generators and exit
        #[arg(long)]
        list_targets: bool,
    },
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn emit(output: &Option<PathBuf>, text: &str) -> Result<(), ReflectError> {
    match output {
        Some(path) => {
            fs::write(path, text)?;
            info!(path = %path.display(), "wrote output");
        }
        None => print!("{}", text),
    }
    Ok(())
}

fn run(cli: Cli) -> Result<(), ReflectError> {
    match cli.command {
        Commands::Lex { inputs, output } => {
            let text = read_sources(&inputs)?;
            let mut out = String::new();
            for token in tokenize(&text)? {
                out.push_str(&serde_json::to_string(&token)?);
                out.push('\n');
            }
            emit(&output, &out)
        }

        Commands::Parse { inputs, output } => {
            let text = read_sources(&inputs)?;
            let tree = koinos_reflect_compiler::parse(&text)?;
            let mut json = serde_json::to_string_pretty(&tree)?;
            json.push('\n');
            emit(&output, &json)
        }

        Commands::Schema { inputs, output, max_sort_depth } => {
            let schema = compile_files(&inputs, CompileOptions { max_sort_depth })?;
            let mut json = schema_to_json(&schema)?;
            json.push('\n');
            emit(&output, &json)
        }

        Commands::Generate { schema, target, package, output, list_targets } => {
            let registry = GeneratorRegistry::with_builtins();
            if list_targets {
                for generator in registry.iter() {
                    println!("{:<8} {}", generator.name(), generator.description());
                }
                return Ok(());
            }

            let (Some(schema_path), Some(package)) = (schema, package) else {
                return Err(ReflectError::CodegenError(
                    "a schema file and --package are required".into(),
                ));
            };
            let schema = load_schema(&schema_path)?;
            let written = generate_to_dir(&registry, &target, &schema, &package, &output)?;
            for path in written {
                println!("{}", path.display());
            }
            Ok(())
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("kreflect: {}", err);
            ExitCode::FAILURE
        }
    }
}
