// SPDX-FileCopyrightText: Copyright (c) 2018-2025 slowtec GmbH <post@slowtec.de>
// SPDX-License-Identifier: MIT OR Apache-2.0

use super::*;
use alloc::vec::Vec;

/// The ordered APDUs of a telegram (PDU).
///
/// The order of the units is the wire order. Lengths are always derived
/// from the current units, never cached.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnitBlock {
    units: Vec<DataUnit>,
}

impl UnitBlock {
    #[must_use]
    pub const fn new() -> Self {
        Self { units: Vec::new() }
    }

    /// Append a unit.
    pub fn add(&mut self, unit: DataUnit) {
        self.units.push(unit);
    }

    /// Remove the first unit equal to `unit`.
    pub fn remove(&mut self, unit: &DataUnit) -> Option<DataUnit> {
        let idx = self.units.iter().position(|u| u == unit)?;
        Some(self.units.remove(idx))
    }

    /// Remove the unit at `idx`.
    pub fn remove_at(&mut self, idx: usize) -> Option<DataUnit> {
        (idx < self.units.len()).then(|| self.units.remove(idx))
    }

    #[must_use]
    pub fn units(&self) -> &[DataUnit] {
        &self.units
    }

    /// Get a specific unit.
    #[must_use]
    pub fn get(&self, idx: usize) -> Option<&DataUnit> {
        self.units.get(idx)
    }

    pub fn iter(&self) -> core::slice::Iter<'_, DataUnit> {
        self.units.iter()
    }

    /// Number of units.
    #[must_use]
    pub fn len(&self) -> usize {
        self.units.len()
    }

    ///  Returns `true` if the block has no units.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Number of PDU bytes on the wire, APDU headers included.
    ///
    /// An optional trailing "request from slave" byte is not counted.
    #[must_use]
    pub fn total_len(&self) -> usize {
        self.units.iter().map(DataUnit::total_len).sum()
    }

    /// Upper bound of the PDU length of the reply to this block.
    #[must_use]
    pub fn reply_len_estimate(&self) -> usize {
        self.units.iter().map(DataUnit::reply_len_estimate).sum()
    }

    pub(crate) fn into_units(self) -> Vec<DataUnit> {
        self.units
    }
}

impl From<Vec<DataUnit>> for UnitBlock {
    fn from(units: Vec<DataUnit>) -> Self {
        Self { units }
    }
}

impl FromIterator<DataUnit> for UnitBlock {
    fn from_iter<I: IntoIterator<Item = DataUnit>>(iter: I) -> Self {
        Self {
            units: iter.into_iter().collect(),
        }
    }
}

impl Extend<DataUnit> for UnitBlock {
    fn extend<I: IntoIterator<Item = DataUnit>>(&mut self, iter: I) {
        self.units.extend(iter);
    }
}

impl IntoIterator for UnitBlock {
    type Item = DataUnit;
    type IntoIter = alloc::vec::IntoIter<DataUnit>;

    fn into_iter(self) -> Self::IntoIter {
        self.into_units().into_iter()
    }
}

impl<'b> IntoIterator for &'b UnitBlock {
    type Item = &'b DataUnit;
    type IntoIter = core::slice::Iter<'b, DataUnit>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
