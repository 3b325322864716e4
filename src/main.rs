use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::{Parser, Subcommand};

use casebook::config::SearchConfig;
use casebook::expansion::handle_boolean_query;
use casebook::indexer::build_index;
use casebook::vsm::SearchContext;

#[derive(Parser)]
#[command(name = "casebook", about = "Legal case retrieval: SPIMI indexing and boolean VSM search with query expansion")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the dictionary and postings files from a directory of case documents
    Index {
        /// Directory of case documents
        #[arg(short = 'i', long = "input")]
        input: PathBuf,
        /// Dictionary output path
        #[arg(short = 'd', long = "dictionary")]
        dictionary: PathBuf,
        /// Postings output path
        #[arg(short = 'p', long = "postings")]
        postings: PathBuf,
    },
    /// Answer boolean queries against a built index
    Search {
        /// Dictionary path
        #[arg(short = 'd', long = "dictionary")]
        dictionary: PathBuf,
        /// Postings path
        #[arg(short = 'p', long = "postings")]
        postings: PathBuf,
        /// File of queries, one per line
        #[arg(short = 'q', long = "queries")]
        queries: PathBuf,
        /// Output file for the ranked document ids
        #[arg(short = 'o', long = "output")]
        output: PathBuf,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    match Cli::parse().command {
        Commands::Index {
            input,
            dictionary,
            postings,
        } => {
            let start = Instant::now();
            build_index(&input, &dictionary, &postings, Path::new("."))?;
            println!("Indexing took {:.2?}", start.elapsed());
            Ok(())
        }
        Commands::Search {
            dictionary,
            postings,
            queries,
            output,
        } => run_search(&dictionary, &postings, &queries, &output),
    }
}

fn run_search(
    dict_path: &Path,
    postings_path: &Path,
    queries_path: &Path,
    output_path: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = SearchConfig::load(Path::new("."))?;
    let mut ctx = SearchContext::open(&config, dict_path, postings_path)?;

    let mut result: Vec<u32> = Vec::new();
    for line in BufReader::new(File::open(queries_path)?).lines() {
        let line = line?;
        let query = line.trim();
        if query.is_empty() {
            continue;
        }
        println!("Query: {}", query);
        result = handle_boolean_query(&mut ctx, query)?;
        println!("  {} documents", result.len());
    }

    let ranked: Vec<String> = result.iter().map(u32::to_string).collect();
    fs::write(output_path, ranked.join(" "))?;
    Ok(())
}
