use std::error::Error;
use std::path::Path;
use std::process::exit;

use clap::Parser;
use rusqlite::Connection;

use sales_explorer::{DEFAULT_MAX_RECORDS, SQLiteSalesStore, load_sales_csv};

/// A utility for importing a CSV export of sales into a SQLite database for
/// the sales explorer server.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to the CSV export of sales.
    #[arg(long, short)]
    csv_path: String,

    /// File path to save the SQLite database to.
    #[arg(long, short)]
    output_path: String,

    /// The maximum number of rows to read from the CSV file.
    #[arg(long, default_value_t = DEFAULT_MAX_RECORDS)]
    max_records: usize,
}

/// Create a sales database from a CSV export.
fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let output_path = Path::new(&args.output_path);

    if output_path
        .extension()
        .is_none_or(|extension| extension.is_empty())
    {
        eprintln!("Output path must include a file extension (e.g., 'sales.db').");
        exit(1);
    }

    if output_path.is_file() {
        eprintln!("File already exists at {output_path:#?}!");
        exit(1);
    }

    println!("Reading sales from {:#?}", args.csv_path);
    let transactions = load_sales_csv(Path::new(&args.csv_path), args.max_records)?;

    println!("Creating database at {output_path:#?}");
    let store = SQLiteSalesStore::new(Connection::open(output_path)?)?;

    let written = store.replace_all(&transactions)?;

    println!("Imported {written} sales. Success!");

    Ok(())
}
