use std::collections::{BTreeMap, BTreeSet};

use thiserror::Error;

use super::aggregate::Aggregation;
use super::filter::FilterCriteria;
use super::model::{Record, Value};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("column not found: {0}")]
    ColumnNotFound(String),
    #[error("record store is not loaded yet")]
    NotReady,
    #[error("store is already loaded")]
    AlreadyLoaded,
    #[error("invalid source data: {0}")]
    LoadFailure(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

// ---------------------------------------------------------------------------
// RecordStore
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    Unloaded,
    Loaded,
}

/// The loaded table: declared columns plus rows in source order, with the
/// distinct non-null values of every column indexed at load time.
#[derive(Debug, Clone)]
struct Table {
    columns: Vec<String>,
    records: Vec<Record>,
    distinct: BTreeMap<String, BTreeSet<Value>>,
}

/// Holds the session's dataset and answers filter / aggregate queries.
///
/// Starts `Unloaded`; [`RecordStore::load`] moves it to `Loaded` once and
/// the data is immutable from then on. Every query on an unloaded store
/// fails with [`StoreError::NotReady`].
#[derive(Debug, Clone, Default)]
pub struct RecordStore {
    table: Option<Table>,
}

impl RecordStore {
    /// An empty, unloaded store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a loaded store in one step.
    pub fn from_records(columns: Vec<String>, records: Vec<Record>) -> StoreResult<Self> {
        let mut store = Self::new();
        store.load(columns, records)?;
        Ok(store)
    }

    /// Ingest the dataset. The store is left untouched when validation fails.
    pub fn load(&mut self, columns: Vec<String>, records: Vec<Record>) -> StoreResult<()> {
        if self.table.is_some() {
            return Err(StoreError::AlreadyLoaded);
        }

        let mut declared = BTreeSet::new();
        for col in &columns {
            if col.is_empty() {
                return Err(StoreError::LoadFailure("empty column name".into()));
            }
            if !declared.insert(col.as_str()) {
                return Err(StoreError::LoadFailure(format!("duplicate column: {col}")));
            }
        }

        let mut distinct: BTreeMap<String, BTreeSet<Value>> =
            columns.iter().map(|c| (c.clone(), BTreeSet::new())).collect();

        for (row, rec) in records.iter().enumerate() {
            if let Some(extra) = rec.columns().find(|c| !declared.contains(c.as_str())) {
                return Err(StoreError::LoadFailure(format!(
                    "row {row} has undeclared column {extra}"
                )));
            }
            for col in &columns {
                let val = rec.get(col);
                if !val.is_null() {
                    if let Some(set) = distinct.get_mut(col) {
                        set.insert(val.clone());
                    }
                }
            }
        }

        log::debug!(
            "record store loaded: {} rows, {} columns",
            records.len(),
            columns.len()
        );
        self.table = Some(Table {
            columns,
            records,
            distinct,
        });
        Ok(())
    }

    pub fn state(&self) -> LoadState {
        if self.table.is_some() {
            LoadState::Loaded
        } else {
            LoadState::Unloaded
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.state() == LoadState::Loaded
    }

    fn table(&self) -> StoreResult<&Table> {
        self.table.as_ref().ok_or(StoreError::NotReady)
    }

    fn require_column(&self, column: &str) -> StoreResult<&Table> {
        let table = self.table()?;
        if table.distinct.contains_key(column) {
            Ok(table)
        } else {
            Err(StoreError::ColumnNotFound(column.to_string()))
        }
    }

    /// Declared columns, in source order.
    pub fn columns(&self) -> StoreResult<&[String]> {
        Ok(&self.table()?.columns)
    }

    /// `Ok` when `column` is declared; otherwise `NotReady` or `ColumnNotFound`.
    pub fn check_column(&self, column: &str) -> StoreResult<()> {
        self.require_column(column).map(|_| ())
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.check_column(column).is_ok()
    }

    /// All records, in source order.
    pub fn records(&self) -> StoreResult<&[Record]> {
        Ok(&self.table()?.records)
    }

    pub fn len(&self) -> usize {
        self.table.as_ref().map_or(0, |t| t.records.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sorted non-null distinct values of `column`, for populating a
    /// selection widget.
    pub fn distinct_values(&self, column: &str) -> StoreResult<Vec<Value>> {
        let table = self.require_column(column)?;
        Ok(table
            .distinct
            .get(column)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default())
    }

    /// Positions of the records that satisfy `criteria`, in store order.
    ///
    /// Every constrained column must be declared; an unknown one is a
    /// configuration bug and yields [`StoreError::ColumnNotFound`].
    pub fn filter_indices(&self, criteria: &FilterCriteria) -> StoreResult<Vec<usize>> {
        let table = self.table()?;
        for col in criteria.columns() {
            self.require_column(col)?;
        }
        if criteria.is_empty() {
            return Ok((0..table.records.len()).collect());
        }
        Ok(table
            .records
            .iter()
            .enumerate()
            .filter(|(_, rec)| criteria.accepts(rec))
            .map(|(i, _)| i)
            .collect())
    }

    /// Records that satisfy `criteria`, in store order. Never mutates the
    /// store; the same criteria always give the same rows.
    pub fn filter(&self, criteria: &FilterCriteria) -> StoreResult<Vec<&Record>> {
        let table = self.table()?;
        let indices = self.filter_indices(criteria)?;
        Ok(indices.into_iter().map(|i| &table.records[i]).collect())
    }

    /// Records at the given positions, skipping any out of range.
    pub fn rows(&self, indices: &[usize]) -> StoreResult<Vec<&Record>> {
        let table = self.table()?;
        Ok(indices
            .iter()
            .filter_map(|&i| table.records.get(i))
            .collect())
    }

    /// Group `records` by `group_column` and sum `measure_column`.
    pub fn aggregate_sum(
        &self,
        records: &[&Record],
        group_column: &str,
        measure_column: &str,
    ) -> StoreResult<Aggregation> {
        self.require_column(group_column)?;
        self.require_column(measure_column)?;
        Ok(Aggregation::sum(
            records.iter().copied(),
            group_column,
            measure_column,
        ))
    }

    pub fn count(records: &[&Record]) -> usize {
        records.len()
    }
}
