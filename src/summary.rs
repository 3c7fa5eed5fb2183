//! Aggregate totals over every transaction that matches a query.
//!
//! Totals are always computed over the whole filtered set, never over the page
//! that is returned, so changing the page never changes the summary.

use serde::{Deserialize, Serialize};

use crate::transaction::Transaction;

/// Running sums over a set of transactions.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Totals {
    /// The sum of [Transaction::quantity].
    pub units_sold: u64,
    /// The sum of [Transaction::total_amount].
    pub amount: f64,
    /// The sum of [Transaction::final_amount].
    pub final_amount: f64,
}

impl<'a> FromIterator<&'a Transaction> for Totals {
    fn from_iter<I: IntoIterator<Item = &'a Transaction>>(transactions: I) -> Self {
        let mut units_sold = 0;
        let mut amount = CompensatedSum::default();
        let mut final_amount = CompensatedSum::default();

        for transaction in transactions {
            units_sold += u64::from(transaction.quantity);
            amount.add(transaction.total_amount);
            final_amount.add(transaction.final_amount);
        }

        Self {
            units_sold,
            amount: amount.value(),
            final_amount: final_amount.value(),
        }
    }
}

/// A Kahan-Babuska-Neumaier sum, the same summation SQLite's `TOTAL` uses.
#[derive(Debug, Default)]
struct CompensatedSum {
    sum: f64,
    error: f64,
}

impl CompensatedSum {
    fn add(&mut self, value: f64) {
        let sum = self.sum + value;

        if self.sum.abs() > value.abs() {
            self.error += (self.sum - sum) + value;
        } else {
            self.error += (value - sum) + self.sum;
        }

        self.sum = sum;
    }

    fn value(&self) -> f64 {
        if self.error.is_finite() {
            self.sum + self.error
        } else {
            self.sum
        }
    }
}

/// The summary cards shown above the transactions table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    /// The number of units sold across the filtered set.
    pub total_units_sold: u64,
    /// The gross amount across the filtered set.
    pub total_amount: f64,
    /// The net amount across the filtered set.
    pub total_final_amount: f64,
    /// The gross amount minus the net amount.
    pub total_discount: f64,
    /// The number of transactions in the filtered set.
    pub record_count: u64,
}

impl Summary {
    /// Derive the summary from the `totals` of `record_count` transactions.
    pub fn new(totals: Totals, record_count: u64) -> Self {
        Self {
            total_units_sold: totals.units_sold,
            total_amount: totals.amount,
            total_final_amount: totals.final_amount,
            total_discount: totals.amount - totals.final_amount,
            record_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::transaction::Transaction;

    use super::{Summary, Totals};

    fn sale(quantity: u32, total_amount: f64, final_amount: f64) -> Transaction {
        Transaction {
            quantity,
            total_amount,
            final_amount,
            ..Default::default()
        }
    }

    #[test]
    fn sums_and_derives_discount() {
        let transactions = [sale(2, 100.0, 90.0), sale(3, 50.0, 50.0)];

        let got = Summary::new(transactions.iter().collect(), 2);

        assert_eq!(
            got,
            Summary {
                total_units_sold: 5,
                total_amount: 150.0,
                total_final_amount: 140.0,
                total_discount: 10.0,
                record_count: 2,
            }
        );
    }

    #[test]
    fn compensates_for_rounding_error() {
        let transactions = vec![sale(1, 0.1, 0.1); 10];

        let got: Totals = transactions.iter().collect();

        assert_eq!(got.amount, 1.0);
        assert_eq!(got.final_amount, 1.0);
        assert_eq!(got.units_sold, 10);
    }

    #[test]
    fn empty_set_is_all_zeros() {
        let got = Summary::new(Totals::default(), 0);

        assert_eq!(got.total_units_sold, 0);
        assert_eq!(got.total_amount, 0.0);
        assert_eq!(got.total_final_amount, 0.0);
        assert_eq!(got.total_discount, 0.0);
        assert_eq!(got.record_count, 0);
    }

    #[test]
    fn serializes_with_camel_case_names() {
        let json = serde_json::to_value(Summary::new(Totals::default(), 0)).unwrap();

        assert_eq!(json["totalUnitsSold"], 0);
        assert_eq!(json["recordCount"], 0);
        assert!(json.get("totalDiscount").is_some());
    }
}
