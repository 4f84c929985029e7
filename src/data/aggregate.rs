use std::collections::BTreeMap;

use super::model::{Record, Value};

/// Sum of a measure column per distinct value of a grouping column.
///
/// Records whose group value is null are left out entirely. A record whose
/// measure is null or non-numeric still creates its group, contributing 0.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Aggregation {
    pub group_column: String,
    pub measure_column: String,
    sums: BTreeMap<Value, f64>,
}

impl Aggregation {
    /// Single pass over `records`, keeping a running sum per group.
    pub fn sum<'a, I>(records: I, group_column: &str, measure_column: &str) -> Self
    where
        I: IntoIterator<Item = &'a Record>,
    {
        let mut sums: BTreeMap<Value, f64> = BTreeMap::new();
        for rec in records {
            let key = rec.get(group_column);
            if key.is_null() {
                continue;
            }
            let amount = rec.get(measure_column).as_f64().unwrap_or(0.0);
            *sums.entry(key.clone()).or_insert(0.0) += amount;
        }
        Aggregation {
            group_column: group_column.to_string(),
            measure_column: measure_column.to_string(),
            sums,
        }
    }

    pub fn get(&self, group: &Value) -> Option<f64> {
        self.sums.get(group).copied()
    }

    pub fn len(&self) -> usize {
        self.sums.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sums.is_empty()
    }

    /// Groups in key order.
    pub fn by_key(&self) -> impl Iterator<Item = (&Value, f64)> {
        self.sums.iter().map(|(k, v)| (k, *v))
    }

    /// Groups by descending sum; ties fall back to key order.
    pub fn ranked(&self) -> Vec<(&Value, f64)> {
        let mut rows: Vec<(&Value, f64)> = self.by_key().collect();
        rows.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        rows
    }

    pub fn total(&self) -> f64 {
        self.sums.values().sum()
    }
}
