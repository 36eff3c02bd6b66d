use clap::{Parser as ClapParser, Subcommand};
use odata_query::{
    FunctionCatalog, ParserSettings,
    cli::{self, CheckOptions, CheckResult, CliError, OptionKind},
};
use std::io::{self, Read};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(ClapParser)]
#[command(name = "odq")]
#[command(
    about = "odq - parse and type-check OData $filter, $orderby, $select and $expand expressions"
)]
#[command(version)]
struct Cli {
    /// Log parser and binder activity to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse an option value and print its tree; bind it when a schema is given
    Check {
        /// The expression (reads from stdin if not provided)
        expression: Option<String>,

        /// Query option the expression belongs to
        #[arg(
            short,
            long,
            default_value = "filter",
            value_parser = ["filter", "orderby", "select", "expand"]
        )]
        option: String,

        /// JSON schema file to bind against
        #[arg(short, long)]
        schema: Option<PathBuf>,

        /// Full name of the entity type the query is applied to
        #[arg(short, long)]
        entity_type: Option<String>,

        /// Pretty-print the output
        #[arg(short, long)]
        pretty: bool,

        /// Only validate syntax, don't bind
        #[arg(long)]
        syntax_only: bool,

        /// Maximum expression nesting depth
        #[arg(long)]
        max_depth: Option<usize>,
    },

    /// Split a full query string and show each option
    Options {
        /// e.g. "$filter=Price gt 5&$top=10"
        query: String,

        /// Pretty-print the output
        #[arg(short, long)]
        pretty: bool,
    },

    /// List the built-in canonical functions
    Functions,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Check {
            expression,
            option,
            schema,
            entity_type,
            pretty,
            syntax_only,
            max_depth,
        } => run_check(
            expression,
            &option,
            schema,
            entity_type,
            pretty,
            syntax_only,
            max_depth,
        ),
        Commands::Options { query, pretty } => {
            cli::describe_options(&query, &ParserSettings::default())
                .and_then(|output| print_json(&output, pretty))
        }
        Commands::Functions => {
            for line in cli::describe_functions(FunctionCatalog::builtin()) {
                println!("{}", line);
            }
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if verbose { "odata_query=debug" } else { "warn" })
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn run_check(
    expression: Option<String>,
    option: &str,
    schema: Option<PathBuf>,
    entity_type: Option<String>,
    pretty: bool,
    syntax_only: bool,
    max_depth: Option<usize>,
) -> Result<(), CliError> {
    let expression = match expression {
        Some(s) => s,
        None if !atty::is(atty::Stream::Stdin) => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer)?;
            buffer.trim_end().to_string()
        }
        None => return Err(CliError::NoInput),
    };

    let mut settings = ParserSettings::default();
    if let Some(max_depth) = max_depth {
        settings = settings.with_max_depth(max_depth);
    }

    let options = CheckOptions {
        expression,
        option: OptionKind::from_name(option).unwrap_or_default(),
        model: schema.as_deref().map(cli::load_schema).transpose()?,
        entity_type,
        syntax_only,
        settings,
    };

    match cli::execute_check(&options)? {
        CheckResult::SyntaxValid => println!("Syntax is valid"),
        CheckResult::Parsed(output) | CheckResult::Bound(output) => print_json(&output, pretty)?,
    }
    Ok(())
}

fn print_json(output: &serde_json::Value, pretty: bool) -> Result<(), CliError> {
    let json = if pretty {
        serde_json::to_string_pretty(output)
    } else {
        serde_json::to_string(output)
    }?;
    println!("{}", json);
    Ok(())
}
