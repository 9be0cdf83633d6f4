use std::io::Read;

use anyhow::{anyhow, bail, Context, Result};
use clap::{App, Arg};
use predictive_table::grammar::{pretty_print::Output, Analysis, AnalysisOptions, Grammar};

#[derive(Clone, Copy)]
enum OutputFormat {
    Plain,
    LaTeX,
    JSON,
}

fn print_output<T: Output>(t: &T, format: OutputFormat) -> Result<()> {
    println!(
        "{}",
        match format {
            OutputFormat::Plain => t.to_plaintext(),
            OutputFormat::LaTeX => t.to_latex(),
            OutputFormat::JSON => t.to_json()?,
        }
    );
    Ok(())
}

fn main() -> Result<()> {
    let matches = App::new("predictive-table")
        .version(clap::crate_version!())
        .author(clap::crate_authors!())
        .about("Computes FIRST and FOLLOW sets and the LL(1) parsing table of a grammar.")
        .arg(
            Arg::with_name("grammar")
                .help("Grammar file; read from stdin if absent")
                .takes_value(true)
                .conflicts_with("tinyjs"),
        )
        .arg(
            Arg::with_name("tinyjs")
                .long("tinyjs")
                .help("Analyze the built-in tinyjs expression grammar"),
        )
        .arg(
            Arg::with_name("json-input")
                .long("json-input")
                .help("Read the grammar in JSON instead of the text format"),
        )
        .arg(
            Arg::with_name("output")
                .short("o")
                .long("output")
                .help("Sections to print; all of them if omitted")
                .takes_value(true)
                .multiple(true)
                .use_delimiter(true)
                .possible_values(&["prod", "nff", "ll1", "conflicts", "unreachable"]),
        )
        .arg(
            Arg::with_name("format")
                .short("f")
                .long("format")
                .takes_value(true)
                .possible_values(&["plain", "latex", "json"])
                .default_value("plain"),
        )
        .arg(
            Arg::with_name("max-passes")
                .long("max-passes")
                .help("Cap on passes per fixed-point computation")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("deny-conflicts")
                .long("deny-conflicts")
                .help("Fail if the grammar is not LL(1)"),
        )
        .get_matches();

    env_logger::Builder::from_default_env()
        .format_timestamp(None)
        .init();

    let input = if matches.is_present("tinyjs") {
        predictive_table::grammar::TINYJS_GRAMMAR.to_string()
    } else if let Some(path) = matches.value_of("grammar") {
        std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path))?
    } else {
        let mut input = String::new();
        std::io::stdin()
            .read_to_string(&mut input)
            .context("failed to read stdin")?;
        input
    };

    let grammar = if matches.is_present("json-input") {
        Grammar::from_json(&input)?
    } else {
        Grammar::parse(&input)?
    };

    let options = AnalysisOptions {
        max_passes: matches
            .value_of("max-passes")
            .map(|n| {
                n.parse::<usize>()
                    .map_err(|e| anyhow!("invalid --max-passes {:?}: {}", n, e))
            })
            .transpose()?,
    };
    let analysis = Analysis::new(&grammar, options)?;

    let format = match matches.value_of("format") {
        Some("latex") => OutputFormat::LaTeX,
        Some("json") => OutputFormat::JSON,
        _ => OutputFormat::Plain,
    };

    match matches.values_of("output") {
        None => print_output(&analysis.to_report(), format)?,
        Some(outputs) => {
            for output in outputs {
                match output {
                    "prod" => print_output(&grammar.to_production_output_vec(), format)?,
                    "nff" => print_output(&analysis.to_non_terminal_output_vec(), format)?,
                    "ll1" => print_output(&analysis.to_ll1_parsing_table(), format)?,
                    "conflicts" => print_output(&analysis.to_conflict_output_vec(), format)?,
                    "unreachable" => print_output(&analysis.to_unreachable_output(), format)?,
                    other => bail!("unknown output {}", other),
                }
            }
        }
    }

    if matches.is_present("deny-conflicts") {
        let conflicts = analysis.table().conflicts().count();
        if conflicts > 0 {
            bail!("grammar is not LL(1): {} conflicting cells", conflicts);
        }
    }

    Ok(())
}
