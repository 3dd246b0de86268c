//! Linear searches over a single list level
//!
//! `prev` arguments resume a scan strictly after the given pair (`None`
//! starts at the head). A missing attribute is a normal `None` result.
//! Only the `delete_*` family mutates.

use crate::arena::{Arena, ListId, PairId};
use crate::dict::Attr;
use crate::pair::Pair;

impl Arena {
    fn scan<F>(&self, list: ListId, prev: Option<PairId>, mut matches: F) -> Option<PairId>
    where
        F: FnMut(&Pair) -> bool,
    {
        let mut cursor = self.list_next(list, prev);
        while let Some(id) = cursor {
            let p = self.pair(id).ok()?;
            if matches(p) {
                return Some(id);
            }
            cursor = p.next;
        }
        None
    }

    fn scan_nth<F>(&self, list: ListId, idx: usize, mut matches: F) -> Option<PairId>
    where
        F: FnMut(&Pair) -> bool,
    {
        self.iter(list)
            .filter(|id| self.pair(*id).is_ok_and(&mut matches))
            .nth(idx)
    }

    /// Next pair after `prev` whose attribute is exactly `da`
    pub fn find_by_da(&self, list: ListId, prev: Option<PairId>, da: &Attr) -> Option<PairId> {
        self.scan(list, prev, |p| p.da() == da)
    }

    /// The `idx`th (0-based) pair whose attribute is exactly `da`
    pub fn find_by_da_idx(&self, list: ListId, da: &Attr, idx: usize) -> Option<PairId> {
        self.scan_nth(list, idx, |p| p.da() == da)
    }

    /// Next pair after `prev` whose attribute is nested beneath `ancestor`
    ///
    /// `ancestor` itself does not match.
    pub fn find_by_ancestor(
        &self,
        list: ListId,
        prev: Option<PairId>,
        ancestor: &Attr,
    ) -> Option<PairId> {
        self.scan(list, prev, |p| ancestor.is_ancestor_of(p.da()))
    }

    pub fn find_by_ancestor_idx(&self, list: ListId, ancestor: &Attr, idx: usize) -> Option<PairId> {
        self.scan_nth(list, idx, |p| ancestor.is_ancestor_of(p.da()))
    }

    /// Next pair after `prev` that is child `number` of `parent`
    /// (`None` = top level)
    pub fn find_by_child_num(
        &self,
        list: ListId,
        prev: Option<PairId>,
        parent: Option<&Attr>,
        number: u32,
    ) -> Option<PairId> {
        self.scan(list, prev, |p| is_child(p, parent, number))
    }

    pub fn find_by_child_num_idx(
        &self,
        list: ListId,
        parent: Option<&Attr>,
        number: u32,
        idx: usize,
    ) -> Option<PairId> {
        self.scan_nth(list, idx, |p| is_child(p, parent, number))
    }

    pub fn count_by_da(&self, list: ListId, da: &Attr) -> usize {
        self.iter(list)
            .filter(|id| self.pair(*id).is_ok_and(|p| p.da() == da))
            .count()
    }

    /// Delete every pair whose attribute is exactly `da`
    pub fn delete_by_da(&mut self, list: ListId, da: &Attr) -> usize {
        self.delete_where(list, |p| p.da() == da)
    }

    pub fn delete_by_child_num(&mut self, list: ListId, parent: Option<&Attr>, number: u32) -> usize {
        self.delete_where(list, |p| is_child(p, parent, number))
    }

    fn delete_where<F>(&mut self, list: ListId, mut matches: F) -> usize
    where
        F: FnMut(&Pair) -> bool,
    {
        let doomed: Vec<PairId> = self
            .iter(list)
            .filter(|id| self.pair(*id).is_ok_and(&mut matches))
            .collect();
        for &id in &doomed {
            self.release_pair(id);
        }
        doomed.len()
    }
}

fn is_child(p: &Pair, parent: Option<&Attr>, number: u32) -> bool {
    p.da().number() == number && p.da().parent() == parent
}
