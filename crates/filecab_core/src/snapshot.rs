//! Point-in-time record snapshots.
//!
//! A [`Snapshot`] owns a copy of every live record of a store at the instant
//! it was taken. It is the unit of bulk transfer:
//!
//! ```text
//! store --make_snapshot--> Snapshot --write_csv / write_xml--> file
//! file --load_csv / load_xml--> Snapshot --restore--> store
//! ```
//!
//! Import goes through the same [`Validator`] as the target store; rows that
//! fail to parse or validate are skipped and counted in an [`ImportReport`].

use crate::error::{StoreError, StoreResult};
use crate::record::{ParametersContainer, Record};
use crate::store::RestoreReport;
use crate::validation::Validator;
use chrono::{DateTime, Utc};
use tracing::warn;

/// An immutable ordered copy of records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    records: Vec<Record>,
    taken_at: DateTime<Utc>,
}

/// Counts produced by an import.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ImportReport {
    /// Rows that became snapshot records.
    pub imported: usize,
    /// Rows dropped because they failed to parse or validate.
    pub skipped: usize,
}

impl Snapshot {
    /// Wraps records captured from a store.
    #[must_use]
    pub fn new(records: Vec<Record>) -> Self {
        Self {
            records,
            taken_at: Utc::now(),
        }
    }

    /// Builds a snapshot from decoded rows, keeping only rows that parse and
    /// pass `validator`. Every row must carry a positive id.
    pub fn from_parameters<I>(rows: I, validator: &Validator) -> (Self, ImportReport)
    where
        I: IntoIterator<Item = StoreResult<ParametersContainer>>,
    {
        let mut report = ImportReport::default();
        let mut records = Vec::new();

        for (row, parsed) in rows.into_iter().enumerate() {
            match parsed.and_then(|params| accept_row(&params.normalized(), validator)) {
                Ok(record) => {
                    records.push(record);
                    report.imported += 1;
                }
                Err(err) => {
                    warn!(row = row + 1, error = %err, "skipping imported row");
                    report.skipped += 1;
                }
            }
        }

        (Self::new(records), report)
    }

    /// Returns the records in capture order.
    #[must_use]
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Iterates over the records in capture order.
    pub fn iter(&self) -> std::slice::Iter<'_, Record> {
        self.records.iter()
    }

    /// Returns the number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns whether the snapshot holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Returns when the snapshot was taken.
    #[must_use]
    pub fn taken_at(&self) -> DateTime<Utc> {
        self.taken_at
    }

    /// Consumes the snapshot, returning its records.
    #[must_use]
    pub fn into_records(self) -> Vec<Record> {
        self.records
    }

    /// Returns the records `validator` accepts, counting rejects in `report`.
    pub(crate) fn accepted<'a>(
        &'a self,
        validator: &Validator,
        report: &mut RestoreReport,
    ) -> Vec<&'a Record> {
        self.records
            .iter()
            .filter(|record| match validator.validate(&ParametersContainer::from(*record)) {
                Ok(()) => true,
                Err(err) => {
                    warn!(id = record.id(), error = %err, "skipping snapshot record");
                    report.skipped += 1;
                    false
                }
            })
            .collect()
    }
}

impl<'a> IntoIterator for &'a Snapshot {
    type Item = &'a Record;
    type IntoIter = std::slice::Iter<'a, Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

fn accept_row(params: &ParametersContainer, validator: &Validator) -> StoreResult<Record> {
    let id = match params.id {
        Some(id) if id >= 1 => id,
        _ => return Err(StoreError::invalid_argument("row has no positive id")),
    };
    validator.validate(params)?;
    Ok(Record::from_parameters(id, params))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::RuleSet;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    fn row(id: Option<i32>, first: &str) -> ParametersContainer {
        let params = ParametersContainer::new(
            first,
            "Semenov",
            NaiveDate::from_ymd_opt(1990, 1, 1).unwrap(),
            21,
            Decimal::new(110030, 2),
            'A',
        );
        match id {
            Some(id) => params.with_id(id),
            None => params,
        }
    }

    #[test]
    fn from_parameters_skips_bad_rows() {
        let validator = Validator::for_set(RuleSet::Custom);
        let rows = vec![
            Ok(row(Some(1), "Petro")),
            Ok(row(Some(2), "p")),
            Err(StoreError::invalid_argument("unparsable date")),
            Ok(row(None, "Pavlo")),
            Ok(row(Some(5), " Marko ")),
        ];

        let (snapshot, report) = Snapshot::from_parameters(rows, &validator);

        assert_eq!(report, ImportReport { imported: 2, skipped: 3 });
        let ids: Vec<i32> = snapshot.iter().map(Record::id).collect();
        assert_eq!(ids, vec![1, 5]);
        assert_eq!(snapshot.records()[1].first_name(), "Marko");
    }

    #[test]
    fn accepted_counts_rejects() {
        let wide = Validator::for_set(RuleSet::Default);
        let narrow = Validator::for_set(RuleSet::Custom);
        let (snapshot, _) =
            Snapshot::from_parameters(vec![Ok(row(Some(1), "Petro")), Ok(row(Some(2), "Ivan"))], &wide);

        let mut report = RestoreReport::default();
        let accepted = snapshot.accepted(&narrow, &mut report);

        assert_eq!(accepted.len(), 1);
        assert_eq!(report.skipped, 1);
    }

    #[test]
    fn snapshot_is_independent_copy() {
        let records = vec![Record::from_parameters(1, &row(None, "Petro"))];
        let snapshot = Snapshot::new(records.clone());
        drop(records);
        assert_eq!(snapshot.len(), 1);
        assert!(!snapshot.is_empty());
    }
}
