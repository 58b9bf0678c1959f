use std::fmt;

use serde_derive::*;

use crate::error::Result;

/// outcome of comparing two buffers
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompareResult {
    are_equal: bool,
    first_difference_offset: usize,
    expected_value: u8,
    actual_value: u8,
    difference_count: usize,
}

impl Default for CompareResult {
    fn default() -> Self {
        Self::equal()
    }
}

impl CompareResult {
    pub fn equal() -> Self {
        Self {
            are_equal: true,
            first_difference_offset: 0,
            expected_value: 0,
            actual_value: 0,
            difference_count: 0,
        }
    }

    pub fn with_difference(offset: usize, expected: u8, actual: u8) -> Self {
        Self {
            are_equal: false,
            first_difference_offset: offset,
            expected_value: expected,
            actual_value: actual,
            difference_count: 1,
        }
    }

    /// The first call records the mismatch, later calls only count.
    pub fn add_difference(&mut self, offset: usize, expected: u8, actual: u8) {
        if self.are_equal {
            *self = Self::with_difference(offset, expected, actual);
        } else {
            self.difference_count += 1;
        }
    }

    pub fn are_equal(&self) -> bool {
        self.are_equal
    }

    pub fn first_difference_offset(&self) -> usize {
        self.first_difference_offset
    }

    pub fn expected_value(&self) -> u8 {
        self.expected_value
    }

    pub fn actual_value(&self) -> u8 {
        self.actual_value
    }

    pub fn difference_count(&self) -> usize {
        self.difference_count
    }

    /// JSON report for tooling that collects compare outcomes.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

impl fmt::Display for CompareResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.are_equal {
            return write!(f, "Buffers are equal");
        }
        write!(
            f,
            "Buffers are not equal. First difference at offset {}: expected 0x{:02X}, actual 0x{:02X}. Total differences: {}",
            self.first_difference_offset, self.expected_value, self.actual_value, self.difference_count
        )
    }
}
