use std::collections::BTreeMap;

use super::money::Money;
use super::transaction::Transaction;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryRow {
    pub category: String,
    pub total: Money,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Totals {
    pub income: Money,
    pub expenses: Money,
    pub net: Money,
}

/// Per-category sums of a view, smallest (most negative) total first.
/// Uncategorized rows are left out.
pub fn category_totals<'a, I>(transactions: I) -> Vec<SummaryRow>
where
    I: IntoIterator<Item = &'a Transaction>,
{
    let mut by_category: BTreeMap<&str, Money> = BTreeMap::new();
    for tx in transactions.into_iter().filter(|tx| tx.is_categorized()) {
        *by_category.entry(tx.category.as_str()).or_default() += tx.amount.coerced();
    }

    let mut rows: Vec<SummaryRow> = by_category
        .into_iter()
        .map(|(category, total)| SummaryRow {
            category: category.to_string(),
            total,
        })
        .collect();
    // Stable over the name-ordered map, so equal totals stay alphabetical.
    rows.sort_by(|a, b| a.total.cmp(&b.total));
    rows
}

/// Income, expenses and net over every row, categorized or not.
pub fn overall_totals<'a, I>(transactions: I) -> Totals
where
    I: IntoIterator<Item = &'a Transaction>,
{
    transactions
        .into_iter()
        .map(|tx| tx.amount.coerced())
        .fold(Totals::default(), |mut totals, amount| {
            if amount.is_positive() {
                totals.income += amount;
            } else if amount.is_negative() {
                totals.expenses += amount;
            }
            totals.net += amount;
            totals
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Amount;
    use crate::rules::{CategoryRules, RuleSet};
    use crate::table::WorkingTable;
    use crate::view::{filter, ViewFilter};

    fn tx(desc: &str, amount: &str, category: &str) -> Transaction {
        Transaction::new("2024-01-15", desc, Amount::parse(amount)).with_category(category)
    }

    fn cents(c: i64) -> Money {
        Money::from_cents(c)
    }

    fn sample() -> Vec<Transaction> {
        vec![
            tx("Salary", "1000", "Income"),
            tx("Groceries", "-200", "Food"),
            tx("Bonus", "500", "Income"),
            tx("Rent", "-800", "Housing"),
            tx("", "-50", ""),
        ]
    }

    #[test]
    fn totals_per_category_sorted_ascending() {
        let rows = category_totals(&sample());
        let flat: Vec<_> = rows.iter().map(|r| (r.category.as_str(), r.total)).collect();
        assert_eq!(
            flat,
            vec![
                ("Housing", cents(-80000)),
                ("Food", cents(-20000)),
                ("Income", cents(150000)),
            ]
        );
    }

    #[test]
    fn no_categorized_rows_gives_empty_summary() {
        let txs = vec![tx("A", "1", ""), tx("B", "-2", "")];
        assert!(category_totals(&txs).is_empty());
        assert!(category_totals(&Vec::new()).is_empty());
    }

    #[test]
    fn non_numeric_amounts_count_as_zero() {
        let txs = vec![tx("A", "abc", "Misc"), tx("B", "-2.50", "Misc")];
        assert_eq!(
            category_totals(&txs),
            vec![SummaryRow {
                category: "Misc".to_string(),
                total: cents(-250)
            }]
        );
        let totals = overall_totals(&txs);
        assert_eq!(totals.net, cents(-250));
        assert_eq!(totals.income, Money::zero());
    }

    #[test]
    fn equal_totals_are_ordered_by_name() {
        let txs = vec![tx("A", "-5", "Zeta"), tx("B", "-5", "Alpha")];
        let names: Vec<_> = category_totals(&txs).into_iter().map(|r| r.category).collect();
        assert_eq!(names, vec!["Alpha", "Zeta"]);
    }

    #[test]
    fn overall_totals_include_uncategorized() {
        let totals = overall_totals(&sample());
        assert_eq!(totals.income, cents(150000));
        assert_eq!(totals.expenses, cents(-105000));
        assert_eq!(totals.net, cents(45000));
    }

    #[test]
    fn net_is_income_plus_expenses() {
        let txs = vec![
            tx("A", "12.34", ""),
            tx("B", "-0.01", "X"),
            tx("C", "0", "Y"),
            tx("D", "oops", ""),
            tx("E", "(3.33)", "X"),
        ];
        let totals = overall_totals(&txs);
        let raw: Money = txs.iter().map(|t| t.amount.coerced()).sum();
        assert_eq!(totals.net, totals.income + totals.expenses);
        assert_eq!(totals.net, raw);
    }

    #[test]
    fn empty_view_is_all_zero() {
        assert_eq!(overall_totals(&Vec::new()), Totals::default());
    }

    #[test]
    fn groceries_scenario_end_to_end() {
        let mut rules = RuleSet::new();
        rules.insert(
            "Groceries",
            CategoryRules {
                exact: vec![],
                contains: vec!["MART".to_string()],
            },
        );
        let mut table = WorkingTable::from_transactions(vec![Transaction::new(
            "2024-02-02",
            "SUPER MART #4",
            Amount::parse("-42.10"),
        )]);
        table.classify(&rules);

        let view = filter(&table, &ViewFilter::default());
        assert_eq!(view.get(0).unwrap().transaction.category, "Groceries");
        assert_eq!(
            category_totals(view.transactions()),
            vec![SummaryRow {
                category: "Groceries".to_string(),
                total: cents(-4210)
            }]
        );
        assert_eq!(
            overall_totals(view.transactions()),
            Totals {
                income: Money::zero(),
                expenses: cents(-4210),
                net: cents(-4210),
            }
        );
    }

    #[test]
    fn huge_amounts_saturate_instead_of_panicking() {
        let max = "79228162514264337593543950335";
        let rows = vec![tx("Big", max, "Income"), tx("Bigger", max, "Income")];

        let totals = overall_totals(&rows);
        assert_eq!(totals.income, Money::new(rust_decimal::Decimal::MAX));
        assert_eq!(totals.net, totals.income);

        let by_category = category_totals(&rows);
        assert_eq!(by_category[0].total, Money::new(rust_decimal::Decimal::MAX));
    }
}
