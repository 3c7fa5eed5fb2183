//! Loads sales from CSV exports.
//!
//! The first row must name the columns. Column names are matched through the
//! aliases in [crate::normalize_record], so exports with either "Customer Name"
//! or "customer_name" style headers both work.

use std::{fs::File, io::Read, path::Path};

use csv::{ReaderBuilder, Trim};

use crate::{
    Error,
    transaction::{SourceRow, Transaction, normalize_record},
};

/// The number of rows read from a CSV file when no limit is configured.
pub const DEFAULT_MAX_RECORDS: usize = 200_000;

/// Read and normalize at most `max_records` sales from the CSV file at `path`.
///
/// # Errors
/// This function will return a:
/// - [Error::DataSourceUnavailable] if the file cannot be opened,
/// - or [Error::InvalidCSV] if the file is not valid CSV.
pub fn load_sales_csv(path: &Path, max_records: usize) -> Result<Vec<Transaction>, Error> {
    let file = File::open(path)
        .inspect_err(|error| tracing::error!("could not open {}: {error}", path.display()))
        .map_err(|error| Error::DataSourceUnavailable(format!("{}: {error}", path.display())))?;

    let transactions = read_sales_csv(file, max_records)?;

    tracing::info!(
        "Loaded {} sales from {}",
        transactions.len(),
        path.display()
    );

    Ok(transactions)
}

/// Read and normalize at most `max_records` sales from CSV text in `reader`.
///
/// Rows are numbered from zero in file order, which is used to create IDs
/// for rows without one. Rows may have fewer fields than the header, missing
/// fields are treated as empty. Blank lines are skipped.
///
/// # Errors
/// Returns [Error::InvalidCSV] if the header or a row cannot be parsed.
pub fn read_sales_csv<R: Read>(reader: R, max_records: usize) -> Result<Vec<Transaction>, Error> {
    let mut reader = ReaderBuilder::new()
        .flexible(true)
        .trim(Trim::All)
        .from_reader(reader);

    let headers: Vec<String> = reader
        .headers()
        .map_err(|error| Error::InvalidCSV(error.to_string()))?
        .iter()
        .map(|header| header.trim_start_matches('\u{feff}').to_owned())
        .collect();

    reader
        .records()
        .take(max_records)
        .enumerate()
        .map(|(index, record)| {
            let record = record
                .inspect_err(|error| tracing::error!("could not parse CSV row {index}: {error}"))
                .map_err(|error| Error::InvalidCSV(error.to_string()))?;

            let row: SourceRow = headers
                .iter()
                .cloned()
                .zip(record.iter().map(str::to_owned))
                .collect();

            Ok(normalize_record(&row, index))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use crate::Error;

    use super::{load_sales_csv, read_sales_csv};

    const SALES_CSV: &str = "\
Transaction ID,Date,Customer Name,Age,Tags,Quantity,Total Amount,Final Amount
T1,2023-03-15,Neha Yadav,34,\"clearance, sale\",2,\"1,000.50\",900
,2023-01-02,Sneha Rao,,new|gift,3,50,50

T3,2023-06-30,Amit Verma,67
";

    #[test]
    fn reads_and_normalizes_rows() {
        let got = read_sales_csv(SALES_CSV.as_bytes(), 100).unwrap();

        assert_eq!(got.len(), 3);
        assert_eq!(got[0].transaction_id, "T1");
        assert_eq!(got[0].tags, ["clearance", "sale"]);
        assert_eq!(got[0].total_amount, 1000.5);
        assert_eq!(got[0].final_amount, 900.0);
        assert_eq!(got[1].transaction_id, "TXN000002");
        assert_eq!(got[1].age, 0);
        assert_eq!(got[1].tags, ["new", "gift"]);
    }

    #[test]
    fn short_rows_have_empty_fields() {
        let got = read_sales_csv(SALES_CSV.as_bytes(), 100).unwrap();

        assert_eq!(got[2].customer_name, "Amit Verma");
        assert_eq!(got[2].age, 67);
        assert!(got[2].tags.is_empty());
        assert_eq!(got[2].quantity, 0);
    }

    #[test]
    fn stops_after_max_records() {
        let got = read_sales_csv(SALES_CSV.as_bytes(), 2).unwrap();

        assert_eq!(got.len(), 2);
    }

    #[test]
    fn accepts_snake_case_headers() {
        let csv = "transaction_id,customer_name,final_amount\nT9,Priya Singh,12.5\n";

        let got = read_sales_csv(csv.as_bytes(), 10).unwrap();

        assert_eq!(got[0].transaction_id, "T9");
        assert_eq!(got[0].customer_name, "Priya Singh");
        assert_eq!(got[0].final_amount, 12.5);
    }

    #[test]
    fn missing_file_is_unavailable() {
        let got = load_sales_csv(Path::new("/definitely/not/here.csv"), 10);

        assert!(matches!(got, Err(Error::DataSourceUnavailable(_))));
    }

    #[test]
    fn invalid_utf8_is_invalid_csv() {
        let mut bytes = b"Transaction ID,Customer Name\nT1,".to_vec();
        bytes.extend_from_slice(&[0xff, 0xfe, b'\n']);

        let got = read_sales_csv(bytes.as_slice(), 10);

        assert!(matches!(got, Err(Error::InvalidCSV(_))));
    }
}
