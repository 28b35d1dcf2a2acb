//! Per-page state for the page-oriented tools.
//!
//! Both containers are created once the page count is known and are only
//! changed through the methods below. Page numbers are 1-based; numbers
//! outside `[1, total]` are ignored rather than rejected, so a stale click
//! after a document swap cannot fail.

use crate::config::PageSpec;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One boolean flag per page (`selected` for extract/split, `deleted` for delete).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageFlags {
    flags: Vec<bool>,
}

impl PageFlags {
    /// All pages unset.
    pub fn new(total: usize) -> Self {
        Self {
            flags: vec![false; total],
        }
    }

    /// Flags set for exactly the pages named by `spec`.
    pub fn from_spec(total: usize, spec: &PageSpec) -> Self {
        let mut flags = Self::new(total);
        for idx in spec.to_indices(total) {
            flags.flags[idx] = true;
        }
        flags
    }

    pub fn total(&self) -> usize {
        self.flags.len()
    }

    pub fn toggle(&mut self, page: usize) {
        if let Some(slot) = self.slot_mut(page) {
            *slot = !*slot;
        }
    }

    pub fn set(&mut self, page: usize, value: bool) {
        if let Some(slot) = self.slot_mut(page) {
            *slot = value;
        }
    }

    pub fn is_set(&self, page: usize) -> bool {
        page >= 1 && self.flags.get(page - 1).copied().unwrap_or(false)
    }

    pub fn select_all(&mut self) {
        self.flags.iter_mut().for_each(|f| *f = true);
    }

    pub fn reset_all(&mut self) {
        self.flags.iter_mut().for_each(|f| *f = false);
    }

    /// Marked page numbers in ascending order.
    pub fn marked(&self) -> Vec<usize> {
        self.flags
            .iter()
            .enumerate()
            .filter(|(_, &f)| f)
            .map(|(i, _)| i + 1)
            .collect()
    }

    /// Unmarked page numbers in ascending order.
    pub fn unmarked(&self) -> Vec<usize> {
        self.flags
            .iter()
            .enumerate()
            .filter(|(_, &f)| !f)
            .map(|(i, _)| i + 1)
            .collect()
    }

    pub fn count(&self) -> usize {
        self.flags.iter().filter(|&&f| f).count()
    }

    /// True when no page is marked.
    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    fn slot_mut(&mut self, page: usize) -> Option<&mut bool> {
        if page == 0 {
            return None;
        }
        self.flags.get_mut(page - 1)
    }
}

/// Clockwise quarter-turn rotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Rotation {
    #[default]
    R0,
    R90,
    R180,
    R270,
}

impl Rotation {
    pub fn degrees(self) -> i64 {
        match self {
            Rotation::R0 => 0,
            Rotation::R90 => 90,
            Rotation::R180 => 180,
            Rotation::R270 => 270,
        }
    }

    /// Normalise any multiple of 90 (negative included) to a rotation.
    pub fn from_degrees(deg: i64) -> Option<Self> {
        match deg.rem_euclid(360) {
            0 => Some(Rotation::R0),
            90 => Some(Rotation::R90),
            180 => Some(Rotation::R180),
            270 => Some(Rotation::R270),
            _ => None,
        }
    }

    pub fn clockwise(self) -> Self {
        match self {
            Rotation::R0 => Rotation::R90,
            Rotation::R90 => Rotation::R180,
            Rotation::R180 => Rotation::R270,
            Rotation::R270 => Rotation::R0,
        }
    }

    pub fn counter_clockwise(self) -> Self {
        match self {
            Rotation::R0 => Rotation::R270,
            Rotation::R90 => Rotation::R0,
            Rotation::R180 => Rotation::R90,
            Rotation::R270 => Rotation::R180,
        }
    }

    pub fn is_identity(self) -> bool {
        self == Rotation::R0
    }
}

impl fmt::Display for Rotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}°", self.degrees())
    }
}

/// Pending rotation per page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRotations {
    rotations: Vec<Rotation>,
}

impl PageRotations {
    pub fn new(total: usize) -> Self {
        Self {
            rotations: vec![Rotation::R0; total],
        }
    }

    pub fn total(&self) -> usize {
        self.rotations.len()
    }

    pub fn rotation(&self, page: usize) -> Rotation {
        if page == 0 {
            return Rotation::R0;
        }
        self.rotations.get(page - 1).copied().unwrap_or_default()
    }

    pub fn set(&mut self, page: usize, rotation: Rotation) {
        if let Some(slot) = self.slot_mut(page) {
            *slot = rotation;
        }
    }

    /// Same as [`rotate_clockwise`](Self::rotate_clockwise); the click action.
    pub fn toggle(&mut self, page: usize) {
        self.rotate_clockwise(page);
    }

    pub fn rotate_clockwise(&mut self, page: usize) {
        if let Some(slot) = self.slot_mut(page) {
            *slot = slot.clockwise();
        }
    }

    pub fn rotate_counter_clockwise(&mut self, page: usize) {
        if let Some(slot) = self.slot_mut(page) {
            *slot = slot.counter_clockwise();
        }
    }

    pub fn rotate_all_clockwise(&mut self) {
        self.rotations.iter_mut().for_each(|r| *r = r.clockwise());
    }

    pub fn reset_all(&mut self) {
        self.rotations.iter_mut().for_each(|r| *r = Rotation::R0);
    }

    pub fn any_rotated(&self) -> bool {
        self.rotations.iter().any(|r| !r.is_identity())
    }

    /// `(page, rotation)` for every page with a non-zero rotation.
    pub fn rotated_pages(&self) -> Vec<(usize, Rotation)> {
        self.rotations
            .iter()
            .enumerate()
            .filter(|(_, r)| !r.is_identity())
            .map(|(i, &r)| (i + 1, r))
            .collect()
    }

    fn slot_mut(&mut self, page: usize) -> Option<&mut Rotation> {
        if page == 0 {
            return None;
        }
        self.rotations.get_mut(page - 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_flags_are_clear() {
        let flags = PageFlags::new(4);
        assert_eq!(flags.total(), 4);
        assert!(flags.is_empty());
        assert_eq!(flags.unmarked(), vec![1, 2, 3, 4]);
    }

    #[test]
    fn toggle_twice_restores_flag() {
        let mut flags = PageFlags::new(3);
        flags.toggle(2);
        assert!(flags.is_set(2));
        flags.toggle(2);
        assert!(!flags.is_set(2));
    }

    #[test]
    fn out_of_range_toggle_is_ignored() {
        let mut flags = PageFlags::new(3);
        flags.toggle(0);
        flags.toggle(4);
        assert!(flags.is_empty());
        assert!(!flags.is_set(0));
        assert!(!flags.is_set(99));
    }

    #[test]
    fn select_all_then_reset_all() {
        let mut flags = PageFlags::new(5);
        flags.select_all();
        assert_eq!(flags.count(), 5);
        flags.reset_all();
        assert!(flags.is_empty());
    }

    #[test]
    fn marked_is_ascending() {
        let mut flags = PageFlags::new(6);
        flags.toggle(5);
        flags.toggle(1);
        flags.toggle(3);
        assert_eq!(flags.marked(), vec![1, 3, 5]);
    }

    #[test]
    fn flags_from_spec() {
        let flags = PageFlags::from_spec(5, &PageSpec::parse("2,4,9").unwrap());
        assert_eq!(flags.marked(), vec![2, 4]);
    }

    #[test]
    fn four_clockwise_turns_are_identity() {
        let mut rotations = PageRotations::new(2);
        for _ in 0..4 {
            rotations.toggle(1);
        }
        assert_eq!(rotations.rotation(1), Rotation::R0);
        assert!(!rotations.any_rotated());
    }

    #[test]
    fn counter_clockwise_wraps() {
        let mut rotations = PageRotations::new(1);
        rotations.rotate_counter_clockwise(1);
        assert_eq!(rotations.rotation(1), Rotation::R270);
        rotations.rotate_clockwise(1);
        assert_eq!(rotations.rotation(1), Rotation::R0);
    }

    #[test]
    fn rotate_all_then_reset() {
        let mut rotations = PageRotations::new(3);
        rotations.rotate_all_clockwise();
        rotations.rotate_clockwise(2);
        assert_eq!(
            rotations.rotated_pages(),
            vec![(1, Rotation::R90), (2, Rotation::R180), (3, Rotation::R90)]
        );
        rotations.reset_all();
        assert!(!rotations.any_rotated());
    }

    #[test]
    fn rotation_from_degrees_normalises() {
        assert_eq!(Rotation::from_degrees(-90), Some(Rotation::R270));
        assert_eq!(Rotation::from_degrees(450), Some(Rotation::R90));
        assert_eq!(Rotation::from_degrees(45), None);
    }
}
