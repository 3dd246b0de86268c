//! Ordered pair lists
//!
//! Lists keep caller insertion order; nothing here sorts implicitly.
//! Duplicate attributes are legal. Positional accessors take `&self` and
//! treat a stale list handle as an empty list; operations that change a
//! list fail with `InvalidHandle` instead.

use crate::arena::{Arena, ListId, PairId, ScopeId};
use crate::dict::Attr;
use crate::error::{PairError, PairResult};
use crate::pair::{Pair, Payload};
use std::cmp::Ordering;

/// Iterator over the pair handles of one list, head to tail
pub struct Pairs<'a> {
    arena: &'a Arena,
    next: Option<PairId>,
}

impl Iterator for Pairs<'_> {
    type Item = PairId;

    fn next(&mut self) -> Option<PairId> {
        let current = self.next?;
        self.next = self.arena.pair(current).ok().and_then(|p| p.next);
        Some(current)
    }
}

/// Order pairs by attribute identity (definition order)
pub fn cmp_by_da(a: &Pair, b: &Pair) -> Ordering {
    a.da().id().cmp(&b.da().id())
}

/// Order pairs by their attribute number path, parents first
///
/// This is the canonical order used before comparing or encoding lists.
pub fn cmp_by_parent_num(a: &Pair, b: &Pair) -> Ordering {
    a.da().number_path().cmp(&b.da().number_path())
}

impl Arena {
    pub fn append(&mut self, list: ListId, pair: PairId) -> PairResult<()> {
        self.link_before(list, None, pair)
    }

    pub fn prepend(&mut self, list: ListId, pair: PairId) -> PairResult<()> {
        self.link_after(list, None, pair)
    }

    /// Link `pair` immediately after `anchor`, which must be in `list`
    pub fn insert_after(&mut self, list: ListId, anchor: PairId, pair: PairId) -> PairResult<()> {
        self.link_after(list, Some(anchor), pair)
    }

    /// Link `pair` immediately before `anchor`, which must be in `list`
    pub fn insert_before(&mut self, list: ListId, anchor: PairId, pair: PairId) -> PairResult<()> {
        self.link_before(list, Some(anchor), pair)
    }

    /// Put `new` in the position of `old` and free `old`
    ///
    /// # Panics
    ///
    /// Panics if `old` is not a member of `list` or `new` cannot be linked
    /// (already linked, stale, or an ancestor of `list`).
    pub fn replace(&mut self, list: ListId, old: PairId, new: PairId) {
        if let Err(e) = self.link_after(list, Some(old), new) {
            panic!("cannot replace {old:?} with {new:?} in {list:?}: {e}");
        }
        self.release_pair(old);
    }

    /// Unlink `pair` without freeing it, handing it back to the caller
    pub fn remove(&mut self, list: ListId, pair: PairId) -> PairResult<PairId> {
        self.member_of(list, pair)?;
        self.unlink(pair);
        Ok(pair)
    }

    /// Unlink and free `pair`
    pub fn delete(&mut self, list: ListId, pair: PairId) -> PairResult<()> {
        self.remove(list, pair)?;
        self.release_pair(pair);
        Ok(())
    }

    pub fn list_len(&self, list: ListId) -> usize {
        self.list_head_ref(list).map_or(0, |h| h.len)
    }

    pub fn list_is_empty(&self, list: ListId) -> bool {
        self.list_len(list) == 0
    }

    pub fn list_head(&self, list: ListId) -> Option<PairId> {
        self.list_head_ref(list).ok()?.head
    }

    pub fn list_tail(&self, list: ListId) -> Option<PairId> {
        self.list_head_ref(list).ok()?.tail
    }

    /// Successor of `pair` in `list`; `None` starts from the head
    pub fn list_next(&self, list: ListId, pair: Option<PairId>) -> Option<PairId> {
        match pair {
            None => self.list_head(list),
            Some(pair) => self.member_of(list, pair).ok()?.next,
        }
    }

    /// Predecessor of `pair` in `list`; `None` starts from the tail
    pub fn list_prev(&self, list: ListId, pair: Option<PairId>) -> Option<PairId> {
        match pair {
            None => self.list_tail(list),
            Some(pair) => self.member_of(list, pair).ok()?.prev,
        }
    }

    pub fn iter(&self, list: ListId) -> Pairs<'_> {
        Pairs {
            arena: self,
            next: self.list_head(list),
        }
    }

    /// Free every pair in `list` (children included), leaving it empty
    pub fn list_free(&mut self, list: ListId) -> PairResult<usize> {
        self.list_head_ref(list)?;
        Ok(self.release_list_contents(list))
    }

    /// Deep-copy every pair of `src` onto the tail of `dst`
    ///
    /// Either every copy is appended or, on failure, none are.
    pub fn list_copy(&mut self, scope: ScopeId, dst: ListId, src: ListId) -> PairResult<usize> {
        let sources: Vec<PairId> = self.iter(src).collect();
        self.copy_into(scope, dst, &sources)
    }

    /// Copy pairs whose attribute is exactly `da`, at most `max` (0 = all)
    pub fn list_copy_by_da(
        &mut self,
        scope: ScopeId,
        dst: ListId,
        src: ListId,
        da: &Attr,
        max: usize,
    ) -> PairResult<usize> {
        let sources = self.collect_matching(src, max, |p| p.da() == da);
        self.copy_into(scope, dst, &sources)
    }

    /// Copy pairs whose attribute is `ancestor` or nested beneath it,
    /// at most `max` (0 = all)
    pub fn list_copy_by_ancestor(
        &mut self,
        scope: ScopeId,
        dst: ListId,
        src: ListId,
        ancestor: &Attr,
        max: usize,
    ) -> PairResult<usize> {
        let sources = self.collect_matching(src, max, |p| ancestor.is_self_or_ancestor_of(p.da()));
        self.copy_into(scope, dst, &sources)
    }

    /// Copy `count` pairs (0 = through the tail) of `src` starting at `start`
    pub fn sublist_copy(
        &mut self,
        scope: ScopeId,
        dst: ListId,
        src: ListId,
        start: PairId,
        count: usize,
    ) -> PairResult<usize> {
        self.member_of(src, start)?;
        let mut sources = Vec::new();
        let mut cursor = Some(start);
        while let Some(pair) = cursor {
            if count != 0 && sources.len() == count {
                break;
            }
            sources.push(pair);
            cursor = self.pair(pair)?.next;
        }
        self.copy_into(scope, dst, &sources)
    }

    fn collect_matching(
        &self,
        list: ListId,
        max: usize,
        mut matches: impl FnMut(&Pair) -> bool,
    ) -> Vec<PairId> {
        let mut found = Vec::new();
        for id in self.iter(list) {
            if max != 0 && found.len() == max {
                break;
            }
            if self.pair(id).is_ok_and(&mut matches) {
                found.push(id);
            }
        }
        found
    }

    fn copy_into(&mut self, scope: ScopeId, dst: ListId, sources: &[PairId]) -> PairResult<usize> {
        self.list_head_ref(dst)?;
        self.check_capacity(sources.len())?;
        let mut copies = Vec::with_capacity(sources.len());
        for &src in sources {
            match self.pair_copy(scope, src) {
                Ok(copy) => copies.push(copy),
                Err(e) => {
                    for copy in copies {
                        self.release_pair(copy);
                    }
                    return Err(e);
                }
            }
        }
        for &copy in &copies {
            self.append(dst, copy)?;
        }
        Ok(copies.len())
    }

    /// Stable sort of `list` with a caller comparator
    pub fn list_sort<F>(&mut self, list: ListId, mut cmp: F) -> PairResult<()>
    where
        F: FnMut(&Pair, &Pair) -> Ordering,
    {
        self.list_head_ref(list)?;
        let mut ids: Vec<PairId> = self.iter(list).collect();
        ids.sort_by(|a, b| match (self.pair(*a), self.pair(*b)) {
            (Ok(a), Ok(b)) => cmp(a, b),
            _ => Ordering::Equal,
        });

        for (i, &id) in ids.iter().enumerate() {
            let prev = i.checked_sub(1).map(|j| ids[j]);
            let next = ids.get(i + 1).copied();
            let p = self.pair_mut(id)?;
            p.prev = prev;
            p.next = next;
        }
        let head = self.list_head_mut(list)?;
        head.head = ids.first().copied();
        head.tail = ids.last().copied();
        Ok(())
    }

    /// Lexicographic comparison of two lists
    ///
    /// Pairs are compared in order, first by attribute identity then by
    /// value (structural pairs by their children). When one list is a
    /// prefix of the other the shorter one sorts first.
    pub fn list_cmp(&self, a: ListId, b: ListId) -> PairResult<Ordering> {
        self.list_head_ref(a)?;
        self.list_head_ref(b)?;
        let mut left = self.iter(a);
        let mut right = self.iter(b);
        loop {
            match (left.next(), right.next()) {
                (None, None) => return Ok(Ordering::Equal),
                (None, Some(_)) => return Ok(Ordering::Less),
                (Some(_), None) => return Ok(Ordering::Greater),
                (Some(x), Some(y)) => {
                    let ordering = self.pair_order(x, y)?;
                    if ordering.is_ne() {
                        return Ok(ordering);
                    }
                }
            }
        }
    }

    fn pair_order(&self, a: PairId, b: PairId) -> PairResult<Ordering> {
        let (pa, pb) = (self.pair(a)?, self.pair(b)?);
        let ordering = cmp_by_da(pa, pb);
        if ordering.is_ne() {
            return Ok(ordering);
        }
        match (pa.payload(), pb.payload()) {
            (Payload::Value(x), Payload::Value(y)) => Ok(x.value().total_cmp(y.value())),
            (Payload::Children(x), Payload::Children(y)) => self.list_cmp(*x, *y),
            (Payload::Value(_), Payload::Children(_)) => Ok(Ordering::Less),
            (Payload::Children(_), Payload::Value(_)) => Ok(Ordering::Greater),
        }
    }

    /// Move every pair of `src` onto the tail of `dst`, leaving `src` empty
    pub fn list_append_list(&mut self, dst: ListId, src: ListId) -> PairResult<()> {
        self.merge(dst, src, true)
    }

    /// Move every pair of `src` onto the head of `dst`, leaving `src` empty
    pub fn list_prepend_list(&mut self, dst: ListId, src: ListId) -> PairResult<()> {
        self.merge(dst, src, false)
    }

    fn merge(&mut self, dst: ListId, src: ListId, at_tail: bool) -> PairResult<()> {
        self.list_head_ref(dst)?;
        let (src_head, src_tail, src_len) = {
            let h = self.list_head_ref(src)?;
            (h.head, h.tail, h.len)
        };
        if dst == src {
            return Err(PairError::Cycle);
        }
        let (Some(src_head), Some(src_tail)) = (src_head, src_tail) else {
            return Ok(());
        };
        let moving: Vec<PairId> = self.iter(src).collect();
        if moving.iter().any(|&p| self.list_is_beneath(dst, p)) {
            return Err(PairError::Cycle);
        }
        for &p in &moving {
            self.pair_mut(p)?.list = Some(dst);
        }

        let (dst_head, dst_tail) = {
            let h = self.list_head_ref(dst)?;
            (h.head, h.tail)
        };
        if at_tail {
            match dst_tail {
                Some(tail) => {
                    self.pair_mut(tail)?.next = Some(src_head);
                    self.pair_mut(src_head)?.prev = Some(tail);
                }
                None => self.list_head_mut(dst)?.head = Some(src_head),
            }
            self.list_head_mut(dst)?.tail = Some(src_tail);
        } else {
            match dst_head {
                Some(head) => {
                    self.pair_mut(head)?.prev = Some(src_tail);
                    self.pair_mut(src_tail)?.next = Some(head);
                }
                None => self.list_head_mut(dst)?.tail = Some(src_tail),
            }
            self.list_head_mut(dst)?.head = Some(src_head);
        }
        self.list_head_mut(dst)?.len += src_len;

        let h = self.list_head_mut(src)?;
        h.head = None;
        h.tail = None;
        h.len = 0;
        Ok(())
    }

    /// Allocate a pair for `da` in `scope` and append it to `list`
    pub fn append_by_da(&mut self, scope: ScopeId, list: ListId, da: &Attr) -> PairResult<PairId> {
        self.list_head_ref(list)?;
        let pair = self.pair_alloc(scope, da)?;
        self.append(list, pair)?;
        Ok(pair)
    }

    /// Allocate a pair for `da` in `scope` and prepend it to `list`
    pub fn prepend_by_da(&mut self, scope: ScopeId, list: ListId, da: &Attr) -> PairResult<PairId> {
        self.list_head_ref(list)?;
        let pair = self.pair_alloc(scope, da)?;
        self.prepend(list, pair)?;
        Ok(pair)
    }

    /// Return the `n`th instance of `da`, appending a new one if there
    /// are not that many
    ///
    /// The flag is `true` when the pair was created.
    pub fn update_by_da(
        &mut self,
        scope: ScopeId,
        list: ListId,
        da: &Attr,
        n: usize,
    ) -> PairResult<(PairId, bool)> {
        if let Some(existing) = self.find_by_da_idx(list, da, n) {
            return Ok((existing, false));
        }
        Ok((self.append_by_da(scope, list, da)?, true))
    }

    /// Mark every value in `list` tainted, descending into children
    pub fn list_tainted(&mut self, list: ListId) -> PairResult<()> {
        let ids: Vec<PairId> = self.iter(list).collect();
        for id in ids {
            let p = self.pair_mut(id)?;
            if let Some(vb) = p.value_mut() {
                vb.set_tainted(true);
            }
            if let Some(children) = p.children() {
                self.list_tainted(children)?;
            }
        }
        Ok(())
    }
}
