use clap::{Parser as ClapParser, Subcommand};
use jqflow::cli::{self, CheckOptions, CheckResult, CliError, DrawOptions};
use jqflow::render::engines::DEFAULT_ENGINE;
use std::io::{self, Read};
use std::path::PathBuf;

#[derive(ClapParser)]
#[command(name = "jqflow")]
#[command(about = "jqflow - Draw jq pipeline queries as flow diagrams")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Draw a query to a .d2 or .svg file
    Draw {
        /// The query to draw (reads from stdin if not provided)
        query: Option<String>,

        /// Output file; the extension selects text (.d2) or image (.svg)
        #[arg(short, long)]
        output: PathBuf,

        /// Layout engine for image output
        #[arg(long, env = "JQFLOW_ENGINE", default_value = DEFAULT_ENGINE)]
        engine: String,

        /// Flow direction for image output
        #[arg(long, default_value = "right")]
        direction: String,
    },

    /// Print every stage with its id, label and output type
    Labels {
        /// The query to inspect
        query: String,
    },

    /// Validate a query
    Check {
        /// The query to validate
        query: String,

        /// Only validate syntax, don't build the diagram
        #[arg(long)]
        syntax_only: bool,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Draw {
            query,
            output,
            engine,
            direction,
        } => run_draw(query, output, engine, direction),
        Commands::Labels { query } => run_labels(&query),
        Commands::Check { query, syntax_only } => run_check(query, syntax_only),
    };

    if let Err(e) = result {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}

fn run_draw(
    query: Option<String>,
    output: PathBuf,
    engine: String,
    direction: String,
) -> Result<(), CliError> {
    let query = match query {
        Some(q) => q,
        None if !atty::is(atty::Stream::Stdin) => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer)?;
            buffer
        }
        None => return Err(CliError::NoInput),
    };

    let options = DrawOptions {
        query,
        output,
        engine,
        direction,
    };
    let result = cli::execute_draw(&options)?;
    println!("Wrote {}", result.path.display());
    Ok(())
}

fn run_labels(query: &str) -> Result<(), CliError> {
    for stage in cli::execute_labels(query)? {
        println!(
            "{}\t{}\t{}",
            stage.id,
            stage.label,
            stage.output.as_deref().unwrap_or("-")
        );
    }
    Ok(())
}

fn run_check(query: String, syntax_only: bool) -> Result<(), CliError> {
    let options = CheckOptions { query, syntax_only };
    match cli::execute_check(&options)? {
        CheckResult::SyntaxValid => println!("Syntax is valid"),
        CheckResult::Drawable { stages } => println!("Query is valid ({} stages)", stages),
    }
    Ok(())
}
