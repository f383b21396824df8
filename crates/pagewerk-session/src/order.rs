// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page order model — the user-visible, freely reorderable sequence of pages.
//
// Records only reference the physical store by index. Every edit returns
// whether it changed anything; out-of-range input is a silent no-op.

use std::collections::HashMap;

use pagewerk_core::types::{FileGroup, FileId, PageRecord, Rotation, SourceFile};
use tracing::debug;

/// Ordered view of the session's pages.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageOrderModel {
    records: Vec<PageRecord>,
}

impl PageOrderModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&PageRecord> {
        self.records.get(index)
    }

    pub fn records(&self) -> &[PageRecord] {
        &self.records
    }

    /// Append one record per physical index, all attributed to `source`.
    pub fn append(&mut self, source: &SourceFile, physical: std::ops::Range<usize>) {
        self.records
            .extend(physical.map(|index| PageRecord::new(index, source)));
    }

    /// Remove the record at `from` and reinsert it at `to` in the shortened
    /// sequence.
    pub fn move_page(&mut self, from: usize, to: usize) -> bool {
        let len = self.records.len();
        if from >= len || to >= len || from == to {
            return false;
        }
        let record = self.records.remove(from);
        self.records.insert(to, record);
        debug!(from, to, "Page moved");
        true
    }

    /// Add `delta_degrees` to the page's rotation.
    ///
    /// Returns the physical index whose rendering changed, or `None` when
    /// nothing changed (bad index, non-quarter-turn delta, or a full turn).
    pub fn rotate(&mut self, index: usize, delta_degrees: i64) -> Option<usize> {
        let record = self.records.get_mut(index)?;
        let rotated = record.rotation.rotated_by(delta_degrees)?;
        if rotated == record.rotation {
            return None;
        }
        record.rotation = rotated;
        debug!(index, rotation = %rotated, "Page rotated");
        Some(record.physical_index)
    }

    /// Remove every listed position. Out-of-range and repeated positions are
    /// ignored. Returns how many records were removed.
    pub fn delete(&mut self, indices: &[usize]) -> usize {
        let len = self.records.len();
        let mut doomed: Vec<usize> = indices.iter().copied().filter(|&i| i < len).collect();
        doomed.sort_unstable_by(|a, b| b.cmp(a));
        doomed.dedup();
        for &index in &doomed {
            self.records.remove(index);
        }
        if !doomed.is_empty() {
            debug!(removed = doomed.len(), remaining = self.records.len(), "Pages deleted");
        }
        doomed.len()
    }

    /// Move every page of `file_id` as one block to group position
    /// `new_position` among the distinct files, keeping each file's internal
    /// page order.
    pub fn regroup_file(&mut self, file_id: FileId, new_position: usize) -> bool {
        let mut file_order: Vec<FileId> = self.files_in_order().into_iter().map(|g| g.file_id).collect();
        let Some(current) = file_order.iter().position(|id| *id == file_id) else {
            return false;
        };
        if new_position >= file_order.len() {
            return false;
        }
        let moved = file_order.remove(current);
        file_order.insert(new_position, moved);

        let mut by_file: HashMap<FileId, Vec<PageRecord>> = HashMap::new();
        for record in &self.records {
            by_file
                .entry(record.source_file_id)
                .or_default()
                .push(record.clone());
        }
        let regrouped: Vec<PageRecord> = file_order
            .iter()
            .filter_map(|id| by_file.remove(id))
            .flatten()
            .collect();

        let changed = regrouped != self.records;
        self.records = regrouped;
        debug!(%file_id, new_position, "File regrouped");
        changed
    }

    /// Distinct files in order of first appearance, with their current page
    /// counts.
    pub fn files_in_order(&self) -> Vec<FileGroup> {
        let mut groups: Vec<FileGroup> = Vec::new();
        let mut positions: HashMap<FileId, usize> = HashMap::new();
        for record in &self.records {
            match positions.get(&record.source_file_id) {
                Some(&slot) => groups[slot].page_count += 1,
                None => {
                    positions.insert(record.source_file_id, groups.len());
                    groups.push(FileGroup {
                        file_id: record.source_file_id,
                        name: record.source_file_name.clone(),
                        page_count: 1,
                    });
                }
            }
        }
        groups
    }

    /// Deep copy of the current sequence.
    pub fn snapshot(&self) -> Vec<PageRecord> {
        self.records.clone()
    }

    /// Replace the whole sequence.
    pub fn restore(&mut self, records: Vec<PageRecord>) {
        self.records = records;
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }
}

impl From<Vec<PageRecord>> for PageOrderModel {
    fn from(records: Vec<PageRecord>) -> Self {
        Self { records }
    }
}

/// Thumbnail cache key of a record.
pub fn cache_key(record: &PageRecord) -> (usize, Rotation) {
    (record.physical_index, record.rotation)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Order holding `a` pages of file A then `b` pages of file B.
    fn two_files(a: usize, b: usize) -> (PageOrderModel, SourceFile, SourceFile) {
        let file_a = SourceFile::new("a.pdf", a);
        let file_b = SourceFile::new("b.pdf", b);
        let mut order = PageOrderModel::new();
        order.append(&file_a, 0..a);
        order.append(&file_b, a..a + b);
        (order, file_a, file_b)
    }

    fn physical(order: &PageOrderModel) -> Vec<usize> {
        order.records().iter().map(|r| r.physical_index).collect()
    }

    #[test]
    fn move_uses_insert_before_in_shortened_sequence() {
        let (mut order, _, _) = two_files(3, 2);
        assert!(order.move_page(4, 0));
        assert_eq!(physical(&order), vec![4, 0, 1, 2, 3]);

        assert!(order.move_page(0, 4));
        assert_eq!(physical(&order), vec![0, 1, 2, 3, 4]);

        assert!(order.move_page(1, 3));
        assert_eq!(physical(&order), vec![0, 2, 3, 1, 4]);
    }

    #[test]
    fn move_out_of_range_is_noop() {
        let (mut order, _, _) = two_files(2, 1);
        let before = order.clone();
        assert!(!order.move_page(3, 0));
        assert!(!order.move_page(0, 3));
        assert_eq!(order, before);
    }

    #[test]
    fn rotate_normalises_and_reports_physical_page() {
        let (mut order, _, _) = two_files(2, 0);
        order.move_page(1, 0);
        assert_eq!(order.rotate(0, 450), Some(1));
        assert_eq!(order.get(0).unwrap().rotation.degrees(), 90);
        assert_eq!(order.rotate(0, -90), Some(1));
        assert_eq!(order.get(0).unwrap().rotation, Rotation::NONE);
    }

    #[test]
    fn rotate_rejects_bad_input() {
        let (mut order, _, _) = two_files(1, 0);
        assert_eq!(order.rotate(5, 90), None);
        assert_eq!(order.rotate(0, 45), None);
        assert_eq!(order.rotate(0, 360), None);
        assert_eq!(order.get(0).unwrap().rotation, Rotation::NONE);
    }

    #[test]
    fn delete_handles_unsorted_duplicate_and_stray_indices() {
        let (mut order, _, _) = two_files(3, 2);
        assert_eq!(order.delete(&[1, 4, 1, 99]), 2);
        assert_eq!(physical(&order), vec![0, 2, 3]);
        assert_eq!(order.delete(&[]), 0);
        assert_eq!(order.delete(&[10]), 0);
        assert_eq!(order.len(), 3);
    }

    #[test]
    fn regroup_moves_file_block_and_keeps_internal_order() {
        let (mut order, file_a, file_b) = two_files(3, 2);
        order.move_page(4, 0);
        order.move_page(2, 3);
        // B2 A1 A3 A2 B1
        assert_eq!(physical(&order), vec![4, 0, 2, 1, 3]);

        assert!(order.regroup_file(file_a.id, 0));
        assert_eq!(physical(&order), vec![0, 2, 1, 4, 3]);

        assert!(order.regroup_file(file_a.id, 1));
        assert_eq!(physical(&order), vec![4, 3, 0, 2, 1]);

        assert!(!order.regroup_file(file_b.id, 2));
        assert!(!order.regroup_file(FileId::new(), 0));
    }

    #[test]
    fn regroup_to_same_position_gathers_scattered_pages() {
        let (mut order, file_a, _) = two_files(2, 1);
        order.move_page(2, 1);
        // A1 B1 A2
        assert!(order.regroup_file(file_a.id, 0));
        assert_eq!(physical(&order), vec![0, 1, 2]);
        assert!(!order.regroup_file(file_a.id, 0));
    }

    #[test]
    fn files_in_order_counts_current_pages() {
        let (mut order, file_a, file_b) = two_files(3, 2);
        order.move_page(4, 0);
        let groups = order.files_in_order();
        assert_eq!(groups.len(), 2);
        assert_eq!((groups[0].file_id, groups[0].page_count), (file_b.id, 2));
        assert_eq!((groups[1].file_id, groups[1].page_count), (file_a.id, 3));
        assert_eq!(groups[0].name, "b.pdf");
    }
}
