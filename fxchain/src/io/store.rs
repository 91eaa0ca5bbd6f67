//! Configuration store boundary.
//!
//! A store offers [`STORAGE_SLOTS`] slots, each holding one specification
//! in the record wire layout. Slots are write-once: a written slot must be
//! erased before it can be written again. The engine passes store errors
//! through without interpreting them.

use core::fmt;

use crate::constants::{MAX_RECORDS, RECORD_FIELDS, STORAGE_SLOTS};
use crate::error::SpecFieldError;
use crate::graph::{RecordList, SpecRecord};

/// Index of one configuration store slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct StorageSlot(u8);

impl StorageSlot {
    /// Slot `index`, if the store has one.
    pub fn new(index: u8) -> Option<Self> {
        ((index as usize) < STORAGE_SLOTS).then_some(StorageSlot(index))
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// Every slot, in index order.
    pub fn all() -> impl Iterator<Item = StorageSlot> {
        (0..STORAGE_SLOTS as u8).map(StorageSlot)
    }
}

impl TryFrom<u8> for StorageSlot {
    type Error = SpecFieldError;

    fn try_from(index: u8) -> Result<Self, SpecFieldError> {
        StorageSlot::new(index).ok_or(SpecFieldError::InvalidSlot(index))
    }
}

impl fmt::Display for StorageSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Persistent storage for specifications.
pub trait ConfigStore {
    /// Storage failure, opaque to the engine.
    type Error: fmt::Debug;

    /// Records held in `slot`; an empty list if the slot was never written.
    fn load(&mut self, slot: StorageSlot) -> Result<RecordList, Self::Error>;

    /// Write `records` into `slot`.
    fn save(&mut self, slot: StorageSlot, records: &[SpecRecord]) -> Result<(), Self::Error>;
}

/// Failures of [`MemoryStore`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum MemoryStoreError {
    /// The slot was written since its last erase.
    #[error("slot {0} already written")]
    AlreadyWritten(StorageSlot),
    /// The records do not fit a slot.
    #[error(transparent)]
    Record(#[from] SpecFieldError),
}

#[derive(Clone, Copy)]
struct Page {
    words: [u16; MAX_RECORDS * RECORD_FIELDS],
    count: usize,
    written: bool,
}

impl Page {
    const ERASED: Page = Page {
        words: [0; MAX_RECORDS * RECORD_FIELDS],
        count: 0,
        written: false,
    };
}

/// RAM-backed store with flash-like write-once slots.
pub struct MemoryStore {
    pages: [Page; STORAGE_SLOTS],
}

impl MemoryStore {
    /// A store with every slot erased.
    pub const fn new() -> Self {
        MemoryStore {
            pages: [Page::ERASED; STORAGE_SLOTS],
        }
    }

    /// Erase one slot so it can be written again.
    pub fn erase(&mut self, slot: StorageSlot) {
        self.pages[slot.index()] = Page::ERASED;
    }

    /// Erase every slot.
    pub fn erase_all(&mut self) {
        self.pages = [Page::ERASED; STORAGE_SLOTS];
    }

    /// Whether `slot` has been written since its last erase.
    pub fn is_written(&self, slot: StorageSlot) -> bool {
        self.pages[slot.index()].written
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for MemoryStore {
    type Error = MemoryStoreError;

    fn load(&mut self, slot: StorageSlot) -> Result<RecordList, MemoryStoreError> {
        let page = &self.pages[slot.index()];
        Ok(RecordList::from_words(&page.words, page.count)?)
    }

    fn save(&mut self, slot: StorageSlot, records: &[SpecRecord]) -> Result<(), MemoryStoreError> {
        let page = &mut self.pages[slot.index()];
        if page.written {
            return Err(MemoryStoreError::AlreadyWritten(slot));
        }
        let list = RecordList::from_slice(records)?;
        page.count = list.write_words(&mut page.words)? / RECORD_FIELDS;
        page.written = true;
        Ok(())
    }
}
