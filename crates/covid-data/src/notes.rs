//! Advisory notes joined to regions and provinces.

use covid_core::fields::{fold_text, Field, FieldValue};
use covid_core::models::NoteRecord;
use covid_core::{Result, SeriesError};

use crate::lookup::{position_first, position_last};

/// The published advisory-note table, in file order.
#[derive(Debug, Clone, Default)]
pub struct NoteTable {
    notes: Vec<NoteRecord>,
}

impl NoteTable {
    pub fn new(notes: Vec<NoteRecord>) -> Self {
        Self { notes }
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&NoteRecord> {
        self.notes.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &NoteRecord> {
        self.notes.iter()
    }

    /// Notes attached to `region`, compared case-insensitively.
    pub fn for_region(&self, region: &str) -> Vec<&NoteRecord> {
        let wanted = fold_text(region.trim());
        self.notes
            .iter()
            .filter(|n| fold_text(&n.region) == wanted)
            .collect()
    }

    /// Notes attached to `province`, compared case-insensitively.
    pub fn for_province(&self, province: &str) -> Vec<&NoteRecord> {
        let wanted = fold_text(province.trim());
        self.notes
            .iter()
            .filter(|n| fold_text(&n.province) == wanted)
            .collect()
    }

    /// Index of the first note whose `field` equals `value`.
    pub fn find_first(&self, field: Field, value: impl Into<FieldValue>) -> Result<usize> {
        let value = value.into();
        position_first(&self.notes, field, &value)?
            .ok_or_else(|| SeriesError::not_found(field, &value))
    }

    /// Index of the last note whose `field` equals `value`.
    pub fn find_last(&self, field: Field, value: impl Into<FieldValue>) -> Result<usize> {
        let value = value.into();
        position_last(&self.notes, field, &value)?
            .ok_or_else(|| SeriesError::not_found(field, &value))
    }
}
