//! Local command - every Smith-Waterman alignment above a threshold.

use clap::Args;

use crate::alignment::local::{
    find_local_alignments, LocalConfig, DEFAULT_LOCAL_GAP, DEFAULT_LOCAL_THRESHOLD,
};
use crate::alignment::result::LocalAlignment;
use crate::cli::{print_aligned_rows, OutputFormat, PairArgs, ScoringArgs};
use crate::parsing::fasta::NamedSequence;
use crate::utils::validation::{check_matrix_size, DEFAULT_MAX_CELLS};

/// Arguments for the local command
#[derive(Args)]
pub struct LocalArgs {
    #[command(flatten)]
    pub pair: PairArgs,

    #[command(flatten)]
    pub scoring: ScoringArgs,

    /// Linear gap score used by local alignment (zero or negative)
    #[arg(long, default_value_t = DEFAULT_LOCAL_GAP, allow_negative_numbers = true)]
    pub gap: i32,

    /// Minimum score of a reported alignment
    #[arg(short, long, default_value_t = DEFAULT_LOCAL_THRESHOLD)]
    pub threshold: i32,

    /// Report at most this many alignments
    #[arg(short = 'n', long)]
    pub max_alignments: Option<usize>,

    /// Refuse inputs whose DP matrices would exceed this many cells
    #[arg(long, default_value_t = DEFAULT_MAX_CELLS)]
    pub max_cells: u64,

    /// Line width of the printed alignments
    #[arg(long, default_value = "60", value_parser = clap::value_parser!(u16).range(10..))]
    pub width: u16,
}

pub fn run(args: LocalArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    let (first, second) = args.pair.load("seq1", "seq2")?;
    check_matrix_size(first.sequence.len(), second.sequence.len(), args.max_cells)?;
    let model = args.scoring.to_model()?;
    let config = LocalConfig {
        gap: args.gap,
        threshold: args.threshold,
    };

    let mut alignments = find_local_alignments(&first.sequence, &second.sequence, &model, &config)?;
    let total = alignments.len();
    if let Some(limit) = args.max_alignments {
        alignments.truncate(limit);
    }

    if verbose {
        eprintln!(
            "Found {total} local alignments scoring at least {} (gap {})",
            config.threshold, config.gap
        );
    }

    match format {
        OutputFormat::Text => print_text_results(&first, &second, &alignments, args.width),
        OutputFormat::Json => print_json_results(&first, &second, &config, &alignments)?,
        OutputFormat::Tsv => print_tsv_results(&first, &second, &alignments),
    }

    Ok(())
}

fn print_text_results(
    first: &NamedSequence,
    second: &NamedSequence,
    alignments: &[LocalAlignment],
    width: u16,
) {
    println!("Local Alignments");
    println!("{}", "=".repeat(60));
    println!("\n{} vs {}", first.name, second.name);

    if alignments.is_empty() {
        println!("\nNo alignment reached the score threshold.");
        return;
    }

    for (rank, alignment) in alignments.iter().enumerate() {
        println!(
            "\n#{}  score {}  identity {:.1}%",
            rank + 1,
            alignment.score,
            alignment.identity
        );
        println!(
            "  {}: {}..{}   {}: {}..{}",
            first.name,
            alignment.start1 + 1,
            alignment.end1,
            second.name,
            alignment.start2 + 1,
            alignment.end2
        );
        println!();
        print_aligned_rows(
            &alignment.aligned1,
            &alignment.midline(),
            &alignment.aligned2,
            usize::from(width),
        );
    }
}

fn print_json_results(
    first: &NamedSequence,
    second: &NamedSequence,
    config: &LocalConfig,
    alignments: &[LocalAlignment],
) -> anyhow::Result<()> {
    let output = serde_json::json!({
        "seq1": first.name,
        "seq2": second.name,
        "gap": config.gap,
        "threshold": config.threshold,
        "alignments": alignments,
    });

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn print_tsv_results(first: &NamedSequence, second: &NamedSequence, alignments: &[LocalAlignment]) {
    println!("rank\tseq1\tseq2\tscore\tstart1\tend1\tstart2\tend2\tidentity\taligned1\taligned2");
    for (i, a) in alignments.iter().enumerate() {
        println!(
            "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{:.2}\t{}\t{}",
            i + 1,
            first.name,
            second.name,
            a.score,
            a.start1,
            a.end1,
            a.start2,
            a.end2,
            a.identity,
            a.aligned1,
            a.aligned2
        );
    }
}
