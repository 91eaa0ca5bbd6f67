//! Specification records: the wire and persisted form of a graph.
//!
//! One record is eight `u16` words in this order:
//!
//! | Word | Field |
//! |------|-------|
//! | 0 | `function` (catalog index) |
//! | 1 | `id` |
//! | 2 | `next` successor id, 0 = none |
//! | 3 | `next2` successor id, 0 = none |
//! | 4-7 | `params[0..4]` |
//!
//! The same layout is used on the command link and in the configuration
//! store, so a [`RecordList`] read back from either can be re-applied as is.

use crate::catalog::FilterKind;
use crate::constants::{MAX_RECORDS, RECORD_FIELDS};
use crate::error::SpecFieldError;

use super::EdgeSlot;

/// One filter as declared in a specification.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SpecRecord {
    /// Catalog index. Kept raw so unknown indices survive until validation.
    pub function: u16,
    /// Id, unique within the specification.
    pub id: u16,
    /// First successor id, 0 for none.
    pub next: u16,
    /// Second successor id, 0 for none.
    pub next2: u16,
    /// Kind-specific parameters.
    pub params: [u16; 4],
}

impl SpecRecord {
    /// A record of `kind` with no successors and zero parameters.
    pub const fn new(kind: FilterKind, id: u16) -> Self {
        SpecRecord {
            function: kind as u16,
            id,
            next: 0,
            next2: 0,
            params: [0; 4],
        }
    }

    /// Set the first successor.
    pub const fn with_next(mut self, id: u16) -> Self {
        self.next = id;
        self
    }

    /// Set the second successor.
    pub const fn with_next2(mut self, id: u16) -> Self {
        self.next2 = id;
        self
    }

    /// Set all four parameters.
    pub const fn with_params(mut self, params: [u16; 4]) -> Self {
        self.params = params;
        self
    }

    /// Decode one record from its words.
    pub fn from_words(words: &[u16; RECORD_FIELDS]) -> Self {
        SpecRecord {
            function: words[0],
            id: words[1],
            next: words[2],
            next2: words[3],
            params: [words[4], words[5], words[6], words[7]],
        }
    }

    /// Encode this record as words.
    pub fn to_words(&self) -> [u16; RECORD_FIELDS] {
        let [p0, p1, p2, p3] = self.params;
        [self.function, self.id, self.next, self.next2, p0, p1, p2, p3]
    }

    /// The catalog entry `function` names, if any.
    pub fn kind(&self) -> Option<FilterKind> {
        FilterKind::from_index(self.function)
    }

    /// Successor id declared in `slot`, `None` when the field is 0.
    pub fn successor(&self, slot: EdgeSlot) -> Option<u16> {
        let id = match slot {
            EdgeSlot::Next => self.next,
            EdgeSlot::Next2 => self.next2,
        };
        (id != 0).then_some(id)
    }
}

/// A specification of up to [`MAX_RECORDS`] records in fixed storage.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RecordList {
    records: [SpecRecord; MAX_RECORDS],
    len: usize,
}

impl RecordList {
    /// An empty list.
    pub const fn new() -> Self {
        RecordList {
            records: [SpecRecord {
                function: 0,
                id: 0,
                next: 0,
                next2: 0,
                params: [0; 4],
            }; MAX_RECORDS],
            len: 0,
        }
    }

    /// Copy `records` into a list.
    pub fn from_slice(records: &[SpecRecord]) -> Result<Self, SpecFieldError> {
        if records.len() > MAX_RECORDS {
            return Err(SpecFieldError::TooManyRecords {
                count: records.len(),
                limit: MAX_RECORDS,
            });
        }
        let mut list = RecordList::new();
        list.records[..records.len()].copy_from_slice(records);
        list.len = records.len();
        Ok(list)
    }

    /// Decode `count` records from a flat word buffer. Words past
    /// `count * RECORD_FIELDS` are ignored.
    pub fn from_words(words: &[u16], count: usize) -> Result<Self, SpecFieldError> {
        if count > MAX_RECORDS {
            return Err(SpecFieldError::TooManyRecords {
                count,
                limit: MAX_RECORDS,
            });
        }
        let needed = count * RECORD_FIELDS;
        if words.len() < needed {
            return Err(SpecFieldError::Truncated {
                words: words.len(),
                count,
            });
        }
        let mut list = RecordList::new();
        for (slot, chunk) in list.records.iter_mut().zip(words[..needed].chunks_exact(RECORD_FIELDS)) {
            let mut record = [0; RECORD_FIELDS];
            record.copy_from_slice(chunk);
            *slot = SpecRecord::from_words(&record);
        }
        list.len = count;
        Ok(list)
    }

    /// Encode the list into `out`, returning the number of words written.
    pub fn write_words(&self, out: &mut [u16]) -> Result<usize, SpecFieldError> {
        let needed = self.len * RECORD_FIELDS;
        if out.len() < needed {
            return Err(SpecFieldError::Truncated {
                words: out.len(),
                count: self.len,
            });
        }
        for (chunk, record) in out.chunks_exact_mut(RECORD_FIELDS).zip(self.as_slice()) {
            chunk.copy_from_slice(&record.to_words());
        }
        Ok(needed)
    }

    /// All words of the list, record by record.
    pub fn words(&self) -> impl Iterator<Item = u16> + '_ {
        self.as_slice().iter().flat_map(|record| record.to_words())
    }

    /// The records.
    pub fn as_slice(&self) -> &[SpecRecord] {
        &self.records[..self.len]
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the list holds no records.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Drop every record.
    pub fn clear(&mut self) {
        self.len = 0;
    }
}

impl Default for RecordList {
    fn default() -> Self {
        Self::new()
    }
}

impl core::ops::Deref for RecordList {
    type Target = [SpecRecord];

    fn deref(&self) -> &[SpecRecord] {
        self.as_slice()
    }
}
