use anyhow::Context as _;
use clap::Parser;
use shrike::{driver::Parser as Driver, grammar::Grammar};
use std::{fs, path::PathBuf, process, time::Instant};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// The path of grammar definition file.
    grammar: PathBuf,

    /// The path of an input program to run against the compiled grammar.
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// The name of the start rule [default: PROGRAM, or the first rule].
    #[arg(short, long)]
    start: Option<String>,

    /// Write the full state listing to this path.
    #[arg(long)]
    automaton: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(err) => {
            // usage errors exit with 1, `--help` and `--version` with 0.
            let code = if err.use_stderr() { 1 } else { 0 };
            let _ = err.print();
            process::exit(code);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    tracing::trace!("CLI args = {:?}", args);

    let started = Instant::now();
    let grammar = match &args.start {
        Some(start) => Grammar::from_file_with_start(&args.grammar, start),
        None => Grammar::from_file(&args.grammar),
    }
    .with_context(|| format!("failed to load grammar from {}", args.grammar.display()))?;
    tracing::info!("loaded grammar in {:?}", started.elapsed());

    let started = Instant::now();
    let automaton = shrike::compile(&grammar).context("the grammar has conflicts")?;
    tracing::info!(
        "built {} states in {:?}",
        automaton.len(),
        started.elapsed()
    );

    let start = automaton.node(automaton.start());
    println!("{}", start.display(&grammar));
    println!("## states");
    for node in automaton.nodes() {
        let suffix = if node.is_accept() { " (accept)" } else { "" };
        println!("{}: {} items{}", node.id(), node.items().len(), suffix);
    }

    if let Some(automaton_file) = &args.automaton {
        fs::write(automaton_file, automaton.display(&grammar).to_string()).with_context(|| {
            anyhow::anyhow!("failed to write the automaton to {}", automaton_file.display())
        })?;
    }

    let Some(input_file) = &args.input else {
        return Ok(());
    };
    let input = fs::read_to_string(input_file)
        .with_context(|| format!("failed to read input program {}", input_file.display()))?;

    let started = Instant::now();
    let outcome = Driver::new(&grammar, &automaton)
        .parse(&input)
        .with_context(|| format!("failed to parse {}", input_file.display()))?;
    tracing::info!("parsed input in {:?}", started.elapsed());

    println!("\n## trace");
    for step in &outcome.trace {
        println!("{}", step.display(&grammar));
    }
    println!();
    println!("{}", automaton.node(outcome.accept).display(&grammar));

    Ok(())
}
