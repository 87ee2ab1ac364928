//! Record store over fixed-size slots.

use crate::error::{StoreError, StoreResult};
use crate::file::compaction::{self, CompactionResult};
use crate::file::slot::{self, slot_offset, RECORD_SIZE, STATUS_PENDING};
use crate::file::watermark::IdWatermark;
use crate::index::name_key;
use crate::record::{ParametersContainer, Record, RecordIter, STATUS_DELETED, STATUS_LIVE};
use crate::snapshot::Snapshot;
use crate::store::{require_insert_id, require_positive_id, RecordStore, RestoreReport, StoreStat};
use crate::validation::Validator;
use chrono::NaiveDate;
use filecab_storage::{FileBackend, StorageBackend};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info, warn};

/// A record store that keeps each record in a [`RECORD_SIZE`]-byte slot.
///
/// Removal flips the slot's status word; the bytes stay until
/// [`RecordStore::purge`] compacts the file. Live ids are mapped to slot
/// numbers in memory, rebuilt on open and after every purge.
///
/// Ids are never reused. A store opened with [`FileStore::open`] records
/// the highest issued id in an [`IdWatermark`] file after each purge, so a
/// purged top id stays retired across reopens. Stores built with
/// [`FileStore::with_backend`] have no watermark and only keep that
/// guarantee for their own lifetime.
///
/// Slots are written in two steps: the full slot with [`STATUS_PENDING`],
/// then the final status word. A slot interrupted between the steps decodes
/// as corrupt and is skipped by reads.
pub struct FileStore<B: StorageBackend = FileBackend> {
    backend: B,
    validator: Validator,
    slots: HashMap<i32, u64>,
    last_id: i32,
    sync_on_write: bool,
    watermark: Option<IdWatermark>,
}

impl FileStore<FileBackend> {
    /// Opens (or creates) a store file at `path`.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file or its id watermark cannot be read.
    pub fn open(path: impl AsRef<Path>, validator: Validator) -> StoreResult<Self> {
        let path = path.as_ref();
        let backend = FileBackend::open(path)?;
        let mut store = Self::with_backend(backend, validator)?;

        let watermark = IdWatermark::for_store(path);
        if let Some(last_id) = watermark.load()? {
            store.last_id = store.last_id.max(last_id);
        }
        store.watermark = Some(watermark);
        Ok(store)
    }

    /// Returns the path of the store file.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.backend.path()
    }
}

impl<B: StorageBackend> FileStore<B> {
    /// Wraps an existing backend, scanning it to build the id map.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the backend cannot be read.
    pub fn with_backend(backend: B, validator: Validator) -> StoreResult<Self> {
        let mut store = Self {
            backend,
            validator,
            slots: HashMap::new(),
            last_id: 0,
            sync_on_write: false,
            watermark: None,
        };
        store.reload()?;
        info!(
            live = store.slots.len(),
            slots = store.slot_count()?,
            "file store opened"
        );
        Ok(store)
    }

    /// Syncs the backend after every write when `enabled`.
    #[must_use]
    pub fn with_sync_on_write(mut self, enabled: bool) -> Self {
        self.sync_on_write = enabled;
        self
    }

    /// Returns the underlying backend.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Consumes the store, returning the backend.
    pub fn into_backend(self) -> B {
        self.backend
    }

    /// Returns the number of complete slots in the file.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the size cannot be read.
    pub fn slot_count(&self) -> StoreResult<u64> {
        Ok(self.backend.size()? / RECORD_SIZE as u64)
    }

    /// Compacts the file, returning detailed statistics.
    ///
    /// # Errors
    ///
    /// Returns a storage error if compaction fails, or an I/O error if the
    /// id watermark cannot be saved.
    pub fn compact(&mut self) -> StoreResult<CompactionResult> {
        let (slots, result) = compaction::compact(&mut self.backend)?;
        self.slots = slots;
        if let Some(watermark) = &self.watermark {
            if result.removed() > 0 {
                watermark.save(self.last_id)?;
            }
        }
        info!(
            removed = result.removed(),
            bytes_saved = result.bytes_saved,
            "file store purged"
        );
        Ok(result)
    }

    fn reload(&mut self) -> StoreResult<()> {
        self.slots.clear();
        for (index, decoded) in self.scan()? {
            match decoded {
                Ok(record) => {
                    self.last_id = self.last_id.max(record.id());
                    if record.is_deleted() {
                        continue;
                    }
                    if let Some(previous) = self.slots.insert(record.id(), index) {
                        warn!(id = record.id(), previous, slot = index, "duplicate live id");
                    }
                }
                Err(err) => warn!(slot = index, error = %err, "skipping corrupt slot"),
            }
        }
        Ok(())
    }

    /// Decodes every slot, a trailing partial one included.
    fn scan(&self) -> StoreResult<Vec<(u64, StoreResult<Record>)>> {
        let size = usize::try_from(self.backend.size()?)
            .map_err(|_| StoreError::invalid_argument("store file too large to scan"))?;
        let data = self.backend.read_at(0, size)?;

        Ok(data
            .chunks(RECORD_SIZE)
            .enumerate()
            .map(|(index, bytes)| (index as u64, slot::decode(index as u64, bytes)))
            .collect())
    }

    fn live_records(&self) -> StoreResult<Vec<Record>> {
        let mut records = Vec::with_capacity(self.slots.len());
        for (index, decoded) in self.scan()? {
            match decoded {
                Ok(record) if !record.is_deleted() => records.push(record),
                Ok(_) => {}
                Err(err) => warn!(slot = index, error = %err, "skipping corrupt slot"),
            }
        }
        Ok(records)
    }

    fn find(&self, predicate: impl Fn(&Record) -> bool) -> StoreResult<RecordIter> {
        let mut records = self.live_records()?;
        records.retain(|record| predicate(record));
        Ok(RecordIter::new(records))
    }

    fn next_id(&self) -> StoreResult<i32> {
        let slots = i32::try_from(self.slot_count()?)
            .map_err(|_| StoreError::invalid_argument("store file holds too many slots"))?;
        slots
            .max(self.last_id)
            .checked_add(1)
            .ok_or_else(|| StoreError::invalid_argument("record id space exhausted"))
    }

    fn write_slot(&mut self, index: u64, record: &Record) -> StoreResult<()> {
        let bytes = slot::encode(record, STATUS_PENDING)?;
        let offset = slot_offset(index);
        self.backend.write_at(offset, &bytes)?;
        self.backend.write_at(offset, &STATUS_LIVE.to_le_bytes())?;
        self.commit()
    }

    fn append_slot(&mut self, record: &Record) -> StoreResult<u64> {
        let index = self.slot_count()?;
        self.write_slot(index, record)?;
        self.slots.insert(record.id(), index);
        self.last_id = self.last_id.max(record.id());
        Ok(index)
    }

    fn commit(&mut self) -> StoreResult<()> {
        if self.sync_on_write {
            self.backend.sync()?;
        } else {
            self.backend.flush()?;
        }
        Ok(())
    }
}

impl<B: StorageBackend> RecordStore for FileStore<B> {
    fn create(&mut self, params: &ParametersContainer) -> StoreResult<i32> {
        let params = params.normalized();
        self.validator.validate(&params)?;

        let id = self.next_id()?;
        let index = self.append_slot(&Record::from_parameters(id, &params))?;

        debug!(id, slot = index, "record created");
        Ok(id)
    }

    fn edit(&mut self, id: i32, params: &ParametersContainer) -> StoreResult<()> {
        let index = *self.slots.get(&id).ok_or_else(|| StoreError::not_found(id))?;
        let params = params.normalized();
        self.validator.validate(&params)?;

        self.write_slot(index, &Record::from_parameters(id, &params))?;

        debug!(id, slot = index, "record edited");
        Ok(())
    }

    fn insert(&mut self, params: &ParametersContainer) -> StoreResult<bool> {
        let id = require_insert_id(params)?;
        if self.slots.contains_key(&id) {
            debug!(id, "insert rejected, id already present");
            return Ok(false);
        }
        let params = params.normalized();
        self.validator.validate(&params)?;

        let index = self.append_slot(&Record::from_parameters(id, &params))?;

        debug!(id, slot = index, "record inserted");
        Ok(true)
    }

    fn remove(&mut self, id: i32) -> StoreResult<()> {
        require_positive_id(id)?;
        let index = *self.slots.get(&id).ok_or_else(|| StoreError::not_found(id))?;

        self.backend
            .write_at(slot_offset(index), &STATUS_DELETED.to_le_bytes())?;
        self.commit()?;
        self.slots.remove(&id);

        debug!(id, slot = index, "record marked deleted");
        Ok(())
    }

    fn purge(&mut self) -> StoreResult<usize> {
        Ok(self.compact()?.removed())
    }

    fn get_records(&self) -> StoreResult<Vec<Record>> {
        self.live_records()
    }

    fn get_stat(&self) -> StoreResult<StoreStat> {
        let total = usize::try_from(self.slot_count()?)
            .map_err(|_| StoreError::invalid_argument("store file holds too many slots"))?;
        Ok(StoreStat {
            total,
            deleted: total.saturating_sub(self.slots.len()),
        })
    }

    fn find_by_first_name(&self, first_name: &str) -> StoreResult<RecordIter> {
        let key = name_key(first_name);
        self.find(|record| name_key(record.first_name()) == key)
    }

    fn find_by_last_name(&self, last_name: &str) -> StoreResult<RecordIter> {
        let key = name_key(last_name);
        self.find(|record| name_key(record.last_name()) == key)
    }

    fn find_by_date_of_birth(&self, date_of_birth: NaiveDate) -> StoreResult<RecordIter> {
        self.find(|record| record.date_of_birth() == date_of_birth)
    }

    fn find_by_working_hours(&self, working_hours: i16) -> StoreResult<RecordIter> {
        self.find(|record| record.working_hours_per_week() == working_hours)
    }

    fn find_by_annual_income(&self, annual_income: Decimal) -> StoreResult<RecordIter> {
        self.find(|record| record.annual_income() == annual_income)
    }

    fn find_by_driver_category(&self, category: char) -> StoreResult<RecordIter> {
        let category = category.to_ascii_uppercase();
        self.find(|record| record.driver_license_category() == category)
    }

    fn make_snapshot(&self) -> StoreResult<Snapshot> {
        Ok(Snapshot::new(self.live_records()?))
    }

    fn restore(&mut self, snapshot: &Snapshot) -> StoreResult<RestoreReport> {
        let mut report = RestoreReport::default();

        for record in snapshot.accepted(&self.validator, &mut report) {
            let record = record.clone().with_status(STATUS_LIVE);
            let written = match self.slots.get(&record.id()).copied() {
                Some(index) => self.write_slot(index, &record).map(|()| true),
                None => self.append_slot(&record).map(|_| false),
            };
            match written {
                Ok(true) => report.replaced += 1,
                Ok(false) => report.appended += 1,
                Err(err) if err.is_skippable() => {
                    warn!(id = record.id(), error = %err, "skipping snapshot record");
                    report.skipped += 1;
                }
                Err(err) => return Err(err),
            }
        }

        info!(
            replaced = report.replaced,
            appended = report.appended,
            skipped = report.skipped,
            "snapshot restored"
        );
        Ok(report)
    }

    fn validator(&self) -> &Validator {
        &self.validator
    }
}

impl<B: StorageBackend> std::fmt::Debug for FileStore<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileStore")
            .field("live", &self.slots.len())
            .field("last_id", &self.last_id)
            .field("sync_on_write", &self.sync_on_write)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Field;
    use crate::validation::{RuleSet, ValidationError};
    use filecab_storage::InMemoryBackend;
    use tempfile::tempdir;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn petro() -> ParametersContainer {
        ParametersContainer::new(
            "Petro",
            "Semenov",
            date(1990, 1, 1),
            21,
            Decimal::new(110030, 2),
            'A',
        )
    }

    fn ivan() -> ParametersContainer {
        ParametersContainer::new(
            "Ivanko",
            "Frankov",
            date(1985, 6, 15),
            25,
            Decimal::from(900),
            'B',
        )
    }

    fn store() -> FileStore<InMemoryBackend> {
        FileStore::with_backend(InMemoryBackend::new(), Validator::for_set(RuleSet::Custom)).unwrap()
    }

    #[test]
    fn create_appends_slot() {
        let mut store = store();

        assert_eq!(store.create(&petro()).unwrap(), 1);
        assert_eq!(store.create(&ivan()).unwrap(), 2);

        assert_eq!(store.backend().size().unwrap(), 2 * RECORD_SIZE as u64);
        let records = store.get_records().unwrap();
        assert_eq!(records[0].first_name(), "Petro");
        assert_eq!(records[1].id(), 2);
    }

    #[test]
    fn create_rejects_invalid_without_writing() {
        let mut store = store();
        let mut params = petro();
        params.first_name = "P".to_string();

        let err = store.create(&params).unwrap_err();

        assert!(matches!(
            err,
            StoreError::Validation(ValidationError::Length { .. })
        ));
        assert_eq!(store.backend().size().unwrap(), 0);
    }

    #[test]
    fn edit_rewrites_slot_in_place() {
        let mut store = store();
        store.create(&petro()).unwrap();
        store.create(&ivan()).unwrap();

        let mut params = petro();
        params.first_name = "Pavlo".to_string();
        store.edit(1, &params).unwrap();

        assert_eq!(store.slot_count().unwrap(), 2);
        let found: Vec<_> = store.find_by_first_name("pavlo").unwrap().collect();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id(), 1);
        assert_eq!(store.find_by_first_name("Petro").unwrap().count(), 0);
    }

    #[test]
    fn rejected_edit_leaves_slot_bytes() {
        let mut store = store();
        store.create(&petro()).unwrap();
        store.create(&ivan()).unwrap();
        let before = store.backend().data();

        let mut params = ivan();
        params.working_hours_per_week = 31;
        let err = store.edit(1, &params).unwrap_err();

        assert!(matches!(
            err,
            StoreError::Validation(ValidationError::OutOfRange {
                field: Field::WorkingHours,
                ..
            })
        ));
        assert_eq!(store.backend().data(), before);
    }

    #[test]
    fn partial_tail_slot_is_skipped() {
        let mut store = store();
        store.create(&petro()).unwrap();
        store.create(&ivan()).unwrap();
        let mut backend = store.into_backend();
        backend.append(&[0u8; 40]).unwrap();

        let mut store =
            FileStore::with_backend(backend, Validator::for_set(RuleSet::Custom)).unwrap();

        assert_eq!(store.get_records().unwrap().len(), 2);
        assert_eq!(store.get_stat().unwrap(), StoreStat { total: 2, deleted: 0 });

        assert_eq!(store.create(&petro()).unwrap(), 3);
        assert_eq!(store.backend().size().unwrap(), 3 * RECORD_SIZE as u64);
        assert_eq!(store.get_records().unwrap().len(), 3);
    }

    #[test]
    fn edit_missing_is_not_found() {
        let mut store = store();
        assert!(matches!(
            store.edit(3, &petro()),
            Err(StoreError::NotFound { id: 3 })
        ));
    }

    #[test]
    fn remove_marks_then_purge_reclaims() {
        let mut store = store();
        for _ in 0..3 {
            store.create(&petro()).unwrap();
        }

        store.remove(2).unwrap();
        assert_eq!(store.get_stat().unwrap(), StoreStat { total: 3, deleted: 1 });
        assert_eq!(store.get_records().unwrap().len(), 2);
        assert!(matches!(store.remove(2), Err(StoreError::NotFound { id: 2 })));

        assert_eq!(store.purge().unwrap(), 1);
        assert_eq!(store.get_stat().unwrap(), StoreStat { total: 2, deleted: 0 });
        let ids: Vec<i32> = store.get_records().unwrap().iter().map(Record::id).collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[test]
    fn edit_after_purge_hits_moved_slot() {
        let mut store = store();
        for _ in 0..3 {
            store.create(&petro()).unwrap();
        }
        store.remove(1).unwrap();
        store.purge().unwrap();

        store.edit(3, &ivan()).unwrap();

        let records = store.get_records().unwrap();
        assert_eq!(records[0].id(), 2);
        assert_eq!(records[0].first_name(), "Petro");
        assert_eq!(records[1].id(), 3);
        assert_eq!(records[1].first_name(), "Ivanko");
    }

    #[test]
    fn create_after_purge_never_reuses_id() {
        let mut store = store();
        for _ in 0..3 {
            store.create(&petro()).unwrap();
        }
        store.remove(3).unwrap();
        store.purge().unwrap();

        assert_eq!(store.create(&ivan()).unwrap(), 4);
    }

    #[test]
    fn remove_rejects_non_positive_id() {
        let mut store = store();
        assert!(matches!(
            store.remove(0),
            Err(StoreError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn insert_uses_given_id() {
        let mut store = store();
        assert!(store.insert(&petro().with_id(10)).unwrap());
        assert!(!store.insert(&ivan().with_id(10)).unwrap());
        assert_eq!(store.create(&ivan()).unwrap(), 11);
    }

    #[test]
    fn finds_scan_live_records() {
        let mut store = store();
        store.create(&petro()).unwrap();
        store.create(&ivan()).unwrap();
        store.create(&petro()).unwrap();
        store.remove(3).unwrap();

        assert_eq!(store.find_by_last_name("SEMENOV").unwrap().count(), 1);
        assert_eq!(store.find_by_date_of_birth(date(1985, 6, 15)).unwrap().count(), 1);
        assert_eq!(store.find_by_working_hours(21).unwrap().count(), 1);
        assert_eq!(store.find_by_annual_income(Decimal::new(9000, 1)).unwrap().count(), 1);
        assert_eq!(store.find_by_driver_category('b').unwrap().count(), 1);
        assert_eq!(store.find_by_driver_category('C').unwrap().count(), 0);
    }

    #[test]
    fn pending_slot_is_skipped() {
        let mut store = store();
        store.create(&petro()).unwrap();
        store.create(&ivan()).unwrap();
        let mut backend = store.into_backend();
        backend
            .write_at(slot_offset(1), &STATUS_PENDING.to_le_bytes())
            .unwrap();

        let store = FileStore::with_backend(backend, Validator::for_set(RuleSet::Custom)).unwrap();

        let records = store.get_records().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id(), 1);
        assert_eq!(store.get_stat().unwrap().deleted, 1);
    }

    #[test]
    fn restore_replaces_and_appends() {
        let mut source = store();
        source.create(&petro()).unwrap();
        source.create(&ivan()).unwrap();
        source.edit(2, &petro()).unwrap();
        let snapshot = source.make_snapshot().unwrap();

        let mut target = store();
        target.create(&ivan()).unwrap();
        let report = target.restore(&snapshot).unwrap();

        assert_eq!(report.replaced, 1);
        assert_eq!(report.appended, 1);
        let records = target.get_records().unwrap();
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| r.first_name() == "Petro"));
    }

    #[test]
    fn reopen_keeps_records_and_ids() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("cabinet.db");

        {
            let mut store = FileStore::open(&path, Validator::for_set(RuleSet::Custom)).unwrap();
            store.create(&petro()).unwrap();
            store.create(&ivan()).unwrap();
            store.remove(2).unwrap();
        }

        let mut store = FileStore::open(&path, Validator::for_set(RuleSet::Custom)).unwrap();
        assert_eq!(store.path(), path.as_path());
        assert_eq!(store.get_stat().unwrap(), StoreStat { total: 2, deleted: 1 });
        assert_eq!(store.create(&ivan()).unwrap(), 3);
        assert!(matches!(store.edit(2, &petro()), Err(StoreError::NotFound { id: 2 })));
    }

    #[test]
    fn purged_top_id_stays_retired_after_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("cabinet.db");

        {
            let mut store = FileStore::open(&path, Validator::for_set(RuleSet::Custom)).unwrap();
            for _ in 0..3 {
                store.create(&petro()).unwrap();
            }
            store.remove(3).unwrap();
            assert_eq!(store.purge().unwrap(), 1);
        }

        let mut store = FileStore::open(&path, Validator::for_set(RuleSet::Custom)).unwrap();
        assert_eq!(store.get_stat().unwrap(), StoreStat { total: 2, deleted: 0 });
        assert_eq!(store.create(&ivan()).unwrap(), 4);

        store.remove(4).unwrap();
        store.purge().unwrap();
        drop(store);

        let mut store = FileStore::open(&path, Validator::for_set(RuleSet::Custom)).unwrap();
        assert_eq!(store.create(&ivan()).unwrap(), 5);
    }

    #[test]
    fn purge_without_garbage_writes_no_watermark() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("cabinet.db");
        let mut store = FileStore::open(&path, Validator::for_set(RuleSet::Custom)).unwrap();
        store.create(&petro()).unwrap();

        assert_eq!(store.purge().unwrap(), 0);

        assert!(!IdWatermark::for_store(&path).path().exists());
    }
}
