//! Dotplot command - exact diagonal runs between two sequences.

use clap::Args;

use crate::cli::{OutputFormat, PairArgs};
use crate::core::diagonal::DiagonalRun;
use crate::dotplot::{build_dotplot, Dotplot, DEFAULT_MIN_RUN_LENGTH};
use crate::parsing::fasta::NamedSequence;
use crate::utils::validation::{check_matrix_size, DEFAULT_MAX_CELLS};

/// Arguments for the dotplot command
#[derive(Args)]
pub struct DotplotArgs {
    #[command(flatten)]
    pub pair: PairArgs,

    /// Minimum length of a reported run
    #[arg(short = 'l', long, default_value_t = DEFAULT_MIN_RUN_LENGTH)]
    pub min_run: usize,

    /// Report forward-strand runs only
    #[arg(long)]
    pub forward_only: bool,

    /// Refuse inputs whose match grid would exceed this many cells
    #[arg(long, default_value_t = DEFAULT_MAX_CELLS)]
    pub max_cells: u64,
}

pub fn run(args: DotplotArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    let (first, second) = args.pair.load("seq1", "seq2")?;
    check_matrix_size(first.sequence.len(), second.sequence.len(), args.max_cells)?;

    let mut plot = build_dotplot(&first.sequence, &second.sequence, args.min_run)?;
    if args.forward_only {
        plot.reverse.clear();
    }

    if verbose {
        eprintln!(
            "{} forward and {} reverse-complement runs of at least {} residues",
            plot.forward.len(),
            plot.reverse.len(),
            args.min_run
        );
        if !second.sequence.alphabet().is_nucleotide() && !args.forward_only {
            eprintln!("{} is not a nucleotide sequence; no reverse-complement runs", second.name);
        }
    }

    match format {
        OutputFormat::Text => print_text_result(&first, &second, &plot),
        OutputFormat::Json => print_json_result(&first, &second, &plot)?,
        OutputFormat::Tsv => print_tsv_result(&plot),
    }

    Ok(())
}

/// 1-based inclusive coordinates of a run on the forward strand of both sequences
fn forward_coordinates(run: &DiagonalRun, len2: usize) -> (usize, usize, usize, usize) {
    let range2 = run.forward_range2(len2);
    (run.start1 + 1, run.end1(), range2.start + 1, range2.end)
}

fn print_text_result(first: &NamedSequence, second: &NamedSequence, plot: &Dotplot) {
    println!("Dotplot Runs");
    println!("{}", "=".repeat(60));
    println!(
        "\n{} ({} residues) vs {} ({} residues)",
        first.name, plot.len1, second.name, plot.len2
    );

    if plot.forward.is_empty() && plot.reverse.is_empty() {
        println!("\nNo runs reached the minimum length.");
        return;
    }

    println!(
        "\n{:<6} {:>8} {:>16} {:>16} {:>9}",
        "Strand", "Length", "Seq1", "Seq2", "Diagonal"
    );
    println!("{}", "-".repeat(60));
    for run in plot.runs() {
        let (s1, e1, s2, e2) = forward_coordinates(run, plot.len2);
        println!(
            "{:<6} {:>8} {:>16} {:>16} {:>9}",
            run.orientation.to_string(),
            run.length,
            format!("{s1}..{e1}"),
            format!("{s2}..{e2}"),
            run.diagonal().to_string()
        );
    }

    if let Some(longest) = plot.longest() {
        let (s1, e1, s2, e2) = forward_coordinates(longest, plot.len2);
        println!(
            "\nLongest run: {} residues ({}, seq1 {s1}..{e1}, seq2 {s2}..{e2})",
            longest.length, longest.orientation
        );
    }
}

fn print_json_result(
    first: &NamedSequence,
    second: &NamedSequence,
    plot: &Dotplot,
) -> anyhow::Result<()> {
    let output = serde_json::json!({
        "seq1": first.name,
        "seq2": second.name,
        "len1": plot.len1,
        "len2": plot.len2,
        "forward": plot.forward,
        "reverse": plot.reverse,
        "longest": plot.longest(),
    });

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn print_tsv_result(plot: &Dotplot) {
    println!("strand\tstart1\tend1\tstart2\tend2\tlength\tdiagonal");
    for run in plot.runs() {
        let range2 = run.forward_range2(plot.len2);
        println!(
            "{}\t{}\t{}\t{}\t{}\t{}\t{}",
            run.orientation,
            run.start1,
            run.end1(),
            range2.start,
            range2.end,
            run.length,
            run.diagonal().0
        );
    }
}
