// src/bin/get_link.rs
//
// Loads the link table and prints the LaTeX citation fragment for the
// requested plot key. The typeset paper shells out to this during builds.

use std::error::Error;
use std::path::PathBuf;

use clap::Parser;

use mhd_analysis::config::AnalysisPaths;
use mhd_analysis::links::LinkTable;

#[derive(Parser)]
#[command(about = "Print the LaTeX link fragment for a plot key")]
struct Args {
    /// The key of the link to load
    key: String,

    /// Directory holding the link table
    #[arg(short = 'p', long)]
    in_path: Option<PathBuf>,

    /// Explicit link table path, overriding the default location
    #[arg(long)]
    table: Option<PathBuf>,
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    let args = Args::parse();
    let paths = AnalysisPaths::resolve(args.in_path.clone(), None);
    let table_path = args.table.unwrap_or_else(|| paths.link_table());

    let table = LinkTable::load(&table_path)?;
    match table.get(&args.key) {
        Some(url) => {
            println!("\\href{{{url}}}{{\\img{{../assets/github.png}}}}");
            Ok(())
        }
        None => Err(format!("no link recorded for key '{}'", args.key).into()),
    }
}
