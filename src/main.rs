//! lambdakit - inspect, evaluate and combine stored quoted functions

use anyhow::{bail, Context, Result};
use clap::{Parser as ClapParser, Subcommand};
use lambdakit::codec;
use lambdakit::{coalesce, compose, Lambda, Predicate, PredicateBuilder, Value};
use std::path::{Path, PathBuf};

/// lambdakit - tools for stored quoted functions
#[derive(ClapParser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print a stored function
    Show { file: PathBuf },

    /// Apply a stored function to arguments
    Eval {
        file: PathBuf,
        /// One argument per parameter, parsed by the parameter's type
        args: Vec<String>,
    },

    /// AND of two predicates
    And {
        first: PathBuf,
        second: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// OR of two predicates
    Or {
        first: PathBuf,
        second: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Negation of a predicate
    Not {
        predicate: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Feed the result of the first function into the second
    Compose {
        first: PathBuf,
        second: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Replace NULL results of a function with a default
    Coalesce {
        function: PathBuf,
        /// Default value; the zero value of the return type if omitted
        #[arg(long)]
        default: Option<String>,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Re-encode a stored function
    Convert {
        input: PathBuf,
        output: PathBuf,
        /// Write the binary format instead of JSON
        #[arg(short, long)]
        binary: bool,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Set up logging
    let log_level = if args.debug { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    match args.command {
        Command::Show { file } => {
            let lambda = load(&file)?;
            println!("{}", lambda);
            println!("  returns {}", lambda.return_type());
        }
        Command::Eval { file, args } => {
            let lambda = load(&file)?;
            let values = parse_arguments(&lambda, &args)?;
            let result = lambda
                .invoke(&values)
                .with_context(|| format!("Failed to evaluate {}", lambda))?;
            println!("{}", result);
        }
        Command::And {
            first,
            second,
            output,
        } => {
            let result = PredicateBuilder::and(&load_predicate(&first)?, &load_predicate(&second)?)?;
            emit(&Lambda::from(result), output.as_deref())?;
        }
        Command::Or {
            first,
            second,
            output,
        } => {
            let result = PredicateBuilder::or(&load_predicate(&first)?, &load_predicate(&second)?)?;
            emit(&Lambda::from(result), output.as_deref())?;
        }
        Command::Not { predicate, output } => {
            let result = PredicateBuilder::not(&load_predicate(&predicate)?);
            emit(&Lambda::from(result), output.as_deref())?;
        }
        Command::Compose {
            first,
            second,
            output,
        } => {
            let result = compose(&load(&first)?, &load(&second)?)?;
            emit(&result, output.as_deref())?;
        }
        Command::Coalesce {
            function,
            default,
            output,
        } => {
            let lambda = load(&function)?;
            let default = default
                .map(|text| Value::parse_as(lambda.return_type(), &text))
                .transpose()
                .context("Invalid default value")?;
            let result = coalesce(&lambda, default)?;
            emit(&result, output.as_deref())?;
        }
        Command::Convert {
            input,
            output,
            binary,
        } => {
            let lambda = load(&input)?;
            let written = if binary {
                codec::save_binary(&lambda, &output)
            } else {
                codec::save_json(&lambda, &output)
            };
            written.with_context(|| format!("Failed to write {}", output.display()))?;
            log::info!("Wrote {}", output.display());
        }
    }

    Ok(())
}

fn load(path: &Path) -> Result<Lambda> {
    codec::load(path).with_context(|| format!("Failed to load {}", path.display()))
}

fn load_predicate(path: &Path) -> Result<Predicate> {
    let lambda = load(path)?;
    Predicate::new(lambda).with_context(|| format!("{} is not a predicate", path.display()))
}

fn parse_arguments(lambda: &Lambda, args: &[String]) -> Result<Vec<Value>> {
    if args.len() != lambda.arity() {
        bail!(
            "{} takes {} arguments, got {}",
            lambda,
            lambda.arity(),
            args.len()
        );
    }
    lambda
        .parameters()
        .iter()
        .zip(args)
        .map(|(param, text)| {
            Value::parse_as(&param.data_type, text)
                .with_context(|| format!("Invalid value for {}", param.name))
        })
        .collect()
}

/// Write `lambda` as JSON to `output`, or to stdout
fn emit(lambda: &Lambda, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            codec::save_json(lambda, path)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            log::info!("Wrote {}", path.display());
        }
        None => println!("{}", codec::to_json(lambda)?),
    }
    Ok(())
}
