//! The combined search and filter predicate over transactions.

use time::Date;

use crate::transaction::Transaction;

use super::{
    SalesQuery, SearchTerms,
    request::{parse_age_bound, parse_date_bound, split_values},
};

/// Selects the transactions a sales query is about.
///
/// The same filter drives counting, summarizing and fetching rows, so the
/// three always agree. All constraints are ANDed together; an empty list or a
/// `None` bound places no constraint on that field.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SalesFilter {
    /// Free-text search over the searchable fields.
    pub search: SearchTerms,
    /// The customer region must be one of these.
    pub customer_regions: Vec<String>,
    /// The gender must be one of these.
    pub genders: Vec<String>,
    /// The product category must be one of these.
    pub product_categories: Vec<String>,
    /// The payment method must be one of these.
    pub payment_methods: Vec<String>,
    /// The transaction must have at least one of these tags.
    pub tags: Vec<String>,
    /// Inclusive lower bound on age.
    pub age_min: Option<i64>,
    /// Inclusive upper bound on age.
    pub age_max: Option<i64>,
    /// Inclusive lower bound on the sale date.
    pub date_from: Option<Date>,
    /// Inclusive upper bound on the sale date.
    pub date_to: Option<Date>,
}

impl SalesFilter {
    /// Build the filter for `query`.
    ///
    /// Unparsable age and date bounds are ignored rather than rejected.
    pub fn from_query(query: &SalesQuery) -> Self {
        Self {
            search: SearchTerms::parse(query.search.as_deref().unwrap_or_default()),
            customer_regions: split_values(query.customer_region.as_deref()),
            genders: split_values(query.gender.as_deref()),
            product_categories: split_values(query.product_category.as_deref()),
            payment_methods: split_values(query.payment_method.as_deref()),
            tags: split_values(query.tags.as_deref()),
            age_min: parse_age_bound(query.age_min.as_deref(), "ageMin"),
            age_max: parse_age_bound(query.age_max.as_deref(), "ageMax"),
            date_from: parse_date_bound(query.date_from.as_deref(), "dateFrom"),
            date_to: parse_date_bound(query.date_to.as_deref(), "dateTo"),
        }
    }

    /// Whether the filter has no constraints at all.
    pub fn is_unconstrained(&self) -> bool {
        *self == Self::default()
    }

    /// Check whether `transaction` satisfies the search and every filter.
    pub fn matches(&self, transaction: &Transaction) -> bool {
        self.search.matches(transaction)
            && is_member(&self.customer_regions, &transaction.customer_region)
            && is_member(&self.genders, &transaction.gender)
            && is_member(&self.product_categories, &transaction.product_category)
            && is_member(&self.payment_methods, &transaction.payment_method)
            && self.matches_tags(transaction)
            && self.matches_age(transaction)
            && self.matches_date(transaction)
    }

    fn matches_tags(&self, transaction: &Transaction) -> bool {
        self.tags.is_empty() || transaction.tags.iter().any(|tag| self.tags.contains(tag))
    }

    fn matches_age(&self, transaction: &Transaction) -> bool {
        let age = i64::from(transaction.age);

        self.age_min.is_none_or(|min| age >= min) && self.age_max.is_none_or(|max| age <= max)
    }

    fn matches_date(&self, transaction: &Transaction) -> bool {
        if self.date_from.is_none() && self.date_to.is_none() {
            return true;
        }

        // A transaction without a valid date can never satisfy a date bound.
        let Some(date) = transaction.sale_date() else {
            return false;
        };

        self.date_from.is_none_or(|from| date >= from) && self.date_to.is_none_or(|to| date <= to)
    }
}

fn is_member(allowed: &[String], value: &str) -> bool {
    allowed.is_empty() || allowed.iter().any(|allowed_value| allowed_value == value)
}

#[cfg(test)]
mod tests {
    use time::macros::date;

    use crate::{query::SalesQuery, transaction::Transaction};

    use super::SalesFilter;

    fn tagged(tags: &[&str]) -> Transaction {
        Transaction {
            tags: tags.iter().map(|tag| tag.to_string()).collect(),
            ..Default::default()
        }
    }

    fn dated(date: &str) -> Transaction {
        Transaction {
            date: date.to_owned(),
            ..Default::default()
        }
    }

    fn aged(age: u32) -> Transaction {
        Transaction {
            age,
            ..Default::default()
        }
    }

    #[test]
    fn empty_filter_matches_everything() {
        let filter = SalesFilter::from_query(&SalesQuery::default());

        assert!(filter.is_unconstrained());
        assert!(filter.matches(&Transaction::default()));
    }

    #[test]
    fn multi_select_requires_membership() {
        let filter = SalesFilter::from_query(&SalesQuery {
            customer_region: Some("North,East".to_owned()),
            ..Default::default()
        });
        let mut transaction = Transaction {
            customer_region: "East".to_owned(),
            ..Default::default()
        };

        assert!(filter.matches(&transaction));

        transaction.customer_region = "South".to_owned();
        assert!(!filter.matches(&transaction));
    }

    #[test]
    fn filters_are_anded() {
        let filter = SalesFilter {
            genders: vec!["Female".to_owned()],
            payment_methods: vec!["UPI".to_owned()],
            ..Default::default()
        };
        let mut transaction = Transaction {
            gender: "Female".to_owned(),
            payment_method: "Cash".to_owned(),
            ..Default::default()
        };

        assert!(!filter.matches(&transaction));

        transaction.payment_method = "UPI".to_owned();
        assert!(filter.matches(&transaction));
    }

    #[test]
    fn tags_filter_requires_a_common_tag() {
        let filter = SalesFilter {
            tags: vec!["sale".to_owned()],
            ..Default::default()
        };

        assert!(filter.matches(&tagged(&["clearance", "sale"])));
        assert!(!filter.matches(&tagged(&["new"])));
        assert!(!filter.matches(&tagged(&[])));
    }

    #[test]
    fn age_bounds_are_inclusive() {
        let filter = SalesFilter {
            age_min: Some(25),
            age_max: Some(30),
            ..Default::default()
        };

        assert!(!filter.matches(&aged(24)));
        assert!(filter.matches(&aged(25)));
        assert!(filter.matches(&aged(30)));
        assert!(!filter.matches(&aged(31)));
    }

    #[test]
    fn unparsable_bounds_are_ignored() {
        let filter = SalesFilter::from_query(&SalesQuery {
            age_min: Some("old".to_owned()),
            date_to: Some("someday".to_owned()),
            ..Default::default()
        });

        assert!(filter.is_unconstrained());
        assert!(filter.matches(&aged(3)));
    }

    #[test]
    fn date_to_covers_the_whole_day() {
        let filter = SalesFilter {
            date_from: Some(date!(2023 - 01 - 01)),
            date_to: Some(date!(2023 - 01 - 31)),
            ..Default::default()
        };

        assert!(filter.matches(&dated("2023-01-01")));
        assert!(filter.matches(&dated("2023-01-31T23:59:59")));
        assert!(!filter.matches(&dated("2023-02-01")));
        assert!(!filter.matches(&dated("2022-12-31T23:59:59")));
    }

    #[test]
    fn date_bound_excludes_undated_transactions() {
        let filter = SalesFilter {
            date_from: Some(date!(2023 - 01 - 01)),
            ..Default::default()
        };

        assert!(!filter.matches(&dated("")));
        assert!(!filter.matches(&dated("not a date")));
    }

    #[test]
    fn search_and_filters_combine() {
        let filter = SalesFilter::from_query(&SalesQuery {
            search: Some("neha".to_owned()),
            gender: Some("Female".to_owned()),
            ..Default::default()
        });
        let transaction = Transaction {
            customer_name: "Neha Yadav".to_owned(),
            gender: "Female".to_owned(),
            ..Default::default()
        };
        let other = Transaction {
            customer_name: "Sneha Rao".to_owned(),
            gender: "Female".to_owned(),
            ..Default::default()
        };

        assert!(filter.matches(&transaction));
        assert!(!filter.matches(&other));
    }
}
