//! Global command - Gotoh end-to-end alignment of two sequences.

use clap::Args;

use crate::alignment::global::align_global;
use crate::alignment::result::AlignmentResult;
use crate::cli::{print_aligned_rows, OutputFormat, PairArgs, ScoringArgs};
use crate::parsing::fasta::NamedSequence;
use crate::utils::validation::{check_matrix_size, DEFAULT_MAX_CELLS};

/// Arguments for the global command
#[derive(Args)]
pub struct GlobalArgs {
    #[command(flatten)]
    pub pair: PairArgs,

    #[command(flatten)]
    pub scoring: ScoringArgs,

    /// Refuse inputs whose DP matrices would exceed this many cells
    #[arg(long, default_value_t = DEFAULT_MAX_CELLS)]
    pub max_cells: u64,

    /// Line width of the printed alignment
    #[arg(long, default_value = "60", value_parser = clap::value_parser!(u16).range(10..))]
    pub width: u16,
}

pub fn run(args: GlobalArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    let (first, second) = args.pair.load("seq1", "seq2")?;
    check_matrix_size(first.sequence.len(), second.sequence.len(), args.max_cells)?;
    let model = args.scoring.to_model()?;

    if verbose {
        eprintln!(
            "Aligning {} ({} residues, {}) against {} ({} residues, {}) with {}",
            first.name,
            first.sequence.len(),
            first.sequence.alphabet(),
            second.name,
            second.sequence.len(),
            second.sequence.alphabet(),
            model.matrix().name()
        );
    }

    let result = align_global(&first.sequence, &second.sequence, &model)?;

    match format {
        OutputFormat::Text => print_text_result(&first, &second, &result, args.width, verbose),
        OutputFormat::Json => print_json_result(&first, &second, &result)?,
        OutputFormat::Tsv => print_tsv_result(&first, &second, &result),
    }

    Ok(())
}

fn print_text_result(
    first: &NamedSequence,
    second: &NamedSequence,
    result: &AlignmentResult,
    width: u16,
    verbose: bool,
) {
    let stats = result.stats();

    println!("Global Alignment");
    println!("{}", "=".repeat(60));
    println!("\n{} vs {}", first.name, second.name);
    println!("  Score:      {}", result.score);
    println!("  Length:     {}", stats.columns);
    println!(
        "  Identity:   {}/{} ({:.1}%)",
        stats.matches, stats.columns, stats.identity
    );
    println!("  Mismatches: {}", stats.mismatches);
    println!("  Gaps:       {} in {} runs", stats.gaps, stats.gap_opens);
    println!();

    print_aligned_rows(
        &result.aligned1,
        &result.midline(),
        &result.aligned2,
        usize::from(width),
    );

    if verbose {
        println!("Columns");
        println!("{}", "-".repeat(60));
        for column in &result.columns {
            let terminal = if column.terminal { " (terminal)" } else { "" };
            println!(
                "  {:>5}  {} {}  {:>4}  {}{}",
                column.index, column.symbol1, column.symbol2, column.score, column.kind, terminal
            );
        }
    }
}

fn print_json_result(
    first: &NamedSequence,
    second: &NamedSequence,
    result: &AlignmentResult,
) -> anyhow::Result<()> {
    let output = serde_json::json!({
        "seq1": first.name,
        "seq2": second.name,
        "score": result.score,
        "aligned1": result.aligned1,
        "aligned2": result.aligned2,
        "stats": result.stats(),
        "blocks": result.blocks(),
        "columns": result.columns,
    });

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn print_tsv_result(first: &NamedSequence, second: &NamedSequence, result: &AlignmentResult) {
    let stats = result.stats();
    println!("seq1\tseq2\tscore\tlength\tmatches\tmismatches\tgaps\tgap_opens\tidentity\taligned1\taligned2");
    println!(
        "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{:.2}\t{}\t{}",
        first.name,
        second.name,
        result.score,
        stats.columns,
        stats.matches,
        stats.mismatches,
        stats.gaps,
        stats.gap_opens,
        stats.identity,
        result.aligned1,
        result.aligned2
    );
}
