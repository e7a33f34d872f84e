//! Search command - seed-and-extend search of a query in a database sequence.

use clap::Args;

use crate::cli::{OutputFormat, PairArgs, ScoringArgs};
use crate::parsing::fasta::NamedSequence;
use crate::search::extend::{Extension, ExtensionParams, DEFAULT_DROPOFF};
use crate::search::pipeline::{SearchParams, SearchPipeline, Stage, DEFAULT_KMER_LENGTH};
use crate::search::seed::{SeedParams, DEFAULT_DIAGONAL_TOLERANCE, DEFAULT_MIN_MATCHES};

/// Arguments for the search command
#[derive(Args)]
pub struct SearchArgs {
    /// Query and database sequences
    #[command(flatten)]
    pub pair: PairArgs,

    #[command(flatten)]
    pub scoring: ScoringArgs,

    /// k-mer length of the query index
    #[arg(short, long, default_value_t = DEFAULT_KMER_LENGTH)]
    pub kmer: usize,

    /// Minimum number of k-mer matches in a seed
    #[arg(long, default_value_t = DEFAULT_MIN_MATCHES)]
    pub min_matches: usize,

    /// Slack in residues allowed between matches of a seed
    #[arg(long, default_value_t = DEFAULT_DIAGONAL_TOLERANCE)]
    pub tolerance: usize,

    /// X-drop: stop extending once the score falls this far below its best
    #[arg(long, default_value_t = DEFAULT_DROPOFF, value_parser = clap::value_parser!(i32).range(0..))]
    pub dropoff: i32,

    /// Report at most this many hits
    #[arg(short = 'n', long)]
    pub max_hits: Option<usize>,
}

pub fn run(args: SearchArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    let (query, database) = args.pair.load("query", "database")?;
    let model = args.scoring.to_model()?;
    let params = SearchParams {
        kmer_length: args.kmer,
        seed: SeedParams {
            min_matches: args.min_matches,
            diagonal_tolerance: args.tolerance,
        },
        extension: ExtensionParams {
            dropoff: args.dropoff,
        },
    };

    let mut pipeline = SearchPipeline::new(
        query.sequence.clone(),
        database.sequence.clone(),
        model,
        params,
    )?;

    while let Some(stage) = pipeline.advance()? {
        if verbose {
            report_stage(&pipeline, stage);
        }
    }

    let mut hits = pipeline.into_extensions();
    if let Some(limit) = args.max_hits {
        hits.truncate(limit);
    }

    match format {
        OutputFormat::Text => print_text_results(&query, &database, &hits),
        OutputFormat::Json => print_json_results(&query, &database, &params, &hits)?,
        OutputFormat::Tsv => print_tsv_results(&query, &database, &hits),
    }

    Ok(())
}

fn report_stage(pipeline: &SearchPipeline, stage: Stage) {
    match stage {
        Stage::Index => {
            if let Some(index) = pipeline.index() {
                eprintln!(
                    "Indexed {} query {}-mers ({} distinct)",
                    index.len(),
                    index.k(),
                    index.distinct()
                );
            }
        }
        Stage::Match => {
            eprintln!(
                "Found {} exact k-mer matches",
                pipeline.matches().map_or(0, <[_]>::len)
            );
        }
        Stage::Seed => {
            eprintln!("Built {} seeds", pipeline.seeds().map_or(0, <[_]>::len));
        }
        Stage::Extend => {
            eprintln!(
                "Extended into {} hits",
                pipeline.extensions().map_or(0, <[_]>::len)
            );
        }
    }
}

fn print_text_results(query: &NamedSequence, database: &NamedSequence, hits: &[Extension]) {
    println!("Search Results");
    println!("{}", "=".repeat(60));
    println!(
        "\nQuery:    {} ({} residues)",
        query.name,
        query.sequence.len()
    );
    println!(
        "Database: {} ({} residues)",
        database.name,
        database.sequence.len()
    );

    if hits.is_empty() {
        println!("\nNo hits.");
        return;
    }

    println!(
        "\n{:<5} {:>6} {:>8} {:>14} {:>14}",
        "Rank", "Score", "Identity", "Query", "Database"
    );
    println!("{}", "-".repeat(60));
    for (rank, hit) in hits.iter().enumerate() {
        println!(
            "{:<5} {:>6} {:>7.1}% {:>14} {:>14}",
            rank + 1,
            hit.score,
            hit.identity,
            format!("{}..{}", hit.query_start + 1, hit.query_end),
            format!("{}..{}", hit.db_start + 1, hit.db_end)
        );
    }

    let best = &hits[0];
    println!("\nBest hit:");
    println!("  {}", best.query_aligned);
    println!("  {}", best.db_aligned);
}

fn print_json_results(
    query: &NamedSequence,
    database: &NamedSequence,
    params: &SearchParams,
    hits: &[Extension],
) -> anyhow::Result<()> {
    let output = serde_json::json!({
        "query": query.name,
        "database": database.name,
        "params": params,
        "hits": hits,
    });

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn print_tsv_results(query: &NamedSequence, database: &NamedSequence, hits: &[Extension]) {
    println!("rank\tquery\tdatabase\tscore\tseed_score\tleft_score\tright_score\tquery_start\tquery_end\tdb_start\tdb_end\tidentity");
    for (i, h) in hits.iter().enumerate() {
        println!(
            "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{:.2}",
            i + 1,
            query.name,
            database.name,
            h.score,
            h.seed_score,
            h.left_score,
            h.right_score,
            h.query_start,
            h.query_end,
            h.db_start,
            h.db_end,
            h.identity
        );
    }
}
