//! Filtered cursors over a pair list
//!
//! A cursor remembers the gap it last stepped over rather than an index:
//! `next` always resumes from the successor of the last pair it passed.
//! Edits made through the cursor move that gap with them, so a pair
//! present before the edit is never skipped and a removed pair is never
//! revisited. Edits made to the list behind the cursor's back are not
//! tracked.
//!
//! ```ignore
//! let mut cursor = arena.cursor_mut(list, PairFilter::ByDa(port.clone()));
//! while cursor.next().is_some() {
//!     cursor.delete()?;
//! }
//! ```

use crate::arena::{Arena, ListId, PairId};
use crate::dict::Attr;
use crate::error::{PairError, PairResult};
use crate::pair::Pair;
use crate::value::ValueBox;
use std::fmt;

/// Which pairs a cursor stops at
pub enum PairFilter<'f> {
    All,
    /// Attribute identical to the target
    ByDa(Attr),
    /// Attribute equal to or nested beneath the target
    ByAncestor(Attr),
    /// Caller test; any context is captured by the closure
    Predicate(Box<dyn Fn(&Pair) -> bool + 'f>),
}

impl<'f> PairFilter<'f> {
    pub fn predicate(test: impl Fn(&Pair) -> bool + 'f) -> Self {
        PairFilter::Predicate(Box::new(test))
    }

    pub fn matches(&self, pair: &Pair) -> bool {
        match self {
            PairFilter::All => true,
            PairFilter::ByDa(da) => pair.da() == da,
            PairFilter::ByAncestor(ancestor) => ancestor.is_self_or_ancestor_of(pair.da()),
            PairFilter::Predicate(test) => test(pair),
        }
    }
}

impl fmt::Debug for PairFilter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PairFilter::All => f.write_str("All"),
            PairFilter::ByDa(da) => write!(f, "ByDa({})", da),
            PairFilter::ByAncestor(da) => write!(f, "ByAncestor({})", da),
            PairFilter::Predicate(_) => f.write_str("Predicate(..)"),
        }
    }
}

enum Access<'a> {
    Shared(&'a Arena),
    Exclusive(&'a mut Arena),
}

/// Stateful, restartable iterator over the matching pairs of one list
pub struct PairCursor<'a, 'f> {
    access: Access<'a>,
    list: ListId,
    filter: PairFilter<'f>,
    /// Last pair stepped over; `None` is the gap before the head
    gap: Option<PairId>,
    current: Option<PairId>,
}

impl Arena {
    /// Read-only cursor; mutation calls fail with `ReadOnlyViolation`
    pub fn cursor<'a, 'f>(&'a self, list: ListId, filter: PairFilter<'f>) -> PairCursor<'a, 'f> {
        PairCursor::new(Access::Shared(self), list, filter)
    }

    /// Cursor that can insert and remove pairs as it goes
    pub fn cursor_mut<'a, 'f>(
        &'a mut self,
        list: ListId,
        filter: PairFilter<'f>,
    ) -> PairCursor<'a, 'f> {
        PairCursor::new(Access::Exclusive(self), list, filter)
    }
}

impl<'a, 'f> PairCursor<'a, 'f> {
    fn new(access: Access<'a>, list: ListId, filter: PairFilter<'f>) -> Self {
        PairCursor {
            access,
            list,
            filter,
            gap: None,
            current: None,
        }
    }

    pub fn arena(&self) -> &Arena {
        match &self.access {
            Access::Shared(arena) => *arena,
            Access::Exclusive(arena) => &**arena,
        }
    }

    fn arena_mut(&mut self) -> PairResult<&mut Arena> {
        match &mut self.access {
            Access::Shared(_) => Err(PairError::ReadOnlyViolation),
            Access::Exclusive(arena) => Ok(&mut **arena),
        }
    }

    pub fn list(&self) -> ListId {
        self.list
    }

    pub fn is_read_only(&self) -> bool {
        matches!(self.access, Access::Shared(_))
    }

    /// Pair the cursor is positioned on
    pub fn current(&self) -> Option<PairId> {
        self.current
    }

    pub fn current_pair(&self) -> Option<&Pair> {
        self.arena().pair(self.current?).ok()
    }

    /// Value of the current pair, for in-place updates
    pub fn value_mut(&mut self) -> PairResult<&mut ValueBox> {
        let current = self.current.ok_or(PairError::NotFound)?;
        self.arena_mut()?.value_mut(current)
    }

    /// Go back before the first pair
    pub fn rewind(&mut self) {
        self.gap = None;
        self.current = None;
    }

    /// Rewind and return the first match
    pub fn head(&mut self) -> Option<PairId> {
        self.rewind();
        self.next()
    }

    /// Next match without moving the cursor
    pub fn peek(&self) -> Option<PairId> {
        self.scan_from(self.gap).0
    }

    /// First match after `gap`, and the last pair examined
    fn scan_from(&self, gap: Option<PairId>) -> (Option<PairId>, Option<PairId>) {
        let arena = self.arena();
        let mut last = gap;
        let mut cursor = arena.list_next(self.list, gap);
        while let Some(id) = cursor {
            let Ok(pair) = arena.pair(id) else {
                break;
            };
            if self.filter.matches(pair) {
                return (Some(id), last);
            }
            last = Some(id);
            cursor = pair.next;
        }
        (None, last)
    }

    /// Link `pair` into the gap at the cursor, so the next step visits it
    /// when it matches the filter
    pub fn insert(&mut self, pair: PairId) -> PairResult<()> {
        let (list, gap) = (self.list, self.gap);
        self.arena_mut()?.link_after(list, gap, pair)
    }

    /// Link `pair` at the tail of the list
    pub fn append(&mut self, pair: PairId) -> PairResult<()> {
        let list = self.list;
        self.arena_mut()?.append(list, pair)
    }

    /// Link `pair` at the head of the list
    pub fn prepend(&mut self, pair: PairId) -> PairResult<()> {
        let list = self.list;
        let arena = self.arena_mut()?;
        arena.prepend(list, pair)
    }

    /// Unlink the current pair and hand it back; the cursor then sits in
    /// the gap it left
    pub fn remove(&mut self) -> PairResult<Option<PairId>> {
        let Some(current) = self.current else {
            return Ok(None);
        };
        self.remove_pair(current).map(Some)
    }

    /// Unlink and free the current pair
    pub fn delete(&mut self) -> PairResult<bool> {
        match self.remove()? {
            Some(pair) => {
                self.arena_mut()?.pair_free(pair)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Unlink any member of the list without disturbing the position
    pub fn remove_pair(&mut self, pair: PairId) -> PairResult<PairId> {
        let list = self.list;
        let prev = {
            let arena = self.arena_mut()?;
            let prev = arena.member_of(list, pair)?.prev;
            arena.remove(list, pair)?;
            prev
        };
        if self.gap == Some(pair) {
            self.gap = prev;
        }
        if self.current == Some(pair) {
            self.current = None;
        }
        Ok(pair)
    }

    /// Unlink and free any member of the list without disturbing the
    /// position
    pub fn delete_pair(&mut self, pair: PairId) -> PairResult<()> {
        self.remove_pair(pair)?;
        self.arena_mut()?.pair_free(pair)
    }

    /// Put `pair` in place of the current pair and return the old one
    /// unlinked; the cursor moves onto `pair`
    pub fn replace(&mut self, pair: PairId) -> PairResult<PairId> {
        let current = self.current.ok_or(PairError::NotFound)?;
        let list = self.list;
        {
            let arena = self.arena_mut()?;
            arena.link_after(list, Some(current), pair)?;
            arena.remove(list, current)?;
        }
        self.gap = Some(pair);
        self.current = Some(pair);
        Ok(current)
    }
}

impl Iterator for PairCursor<'_, '_> {
    type Item = PairId;

    fn next(&mut self) -> Option<PairId> {
        let (found, last) = self.scan_from(self.gap);
        match found {
            Some(id) => {
                self.gap = Some(id);
                self.current = Some(id);
            }
            None => {
                self.gap = last;
                self.current = None;
            }
        }
        found
    }
}

impl fmt::Debug for PairCursor<'_, '_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PairCursor")
            .field("list", &self.list)
            .field("filter", &self.filter)
            .field("current", &self.current)
            .field("read_only", &self.is_read_only())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::ScopeId;
    use crate::dict::{AttrDef, Dictionary};
    use crate::value::{Value, ValueType};

    struct Fixture {
        arena: Arena,
        scope: ScopeId,
        list: ListId,
        name: Attr,
        port: Attr,
        group: Attr,
        group_a: Attr,
    }

    fn fixture() -> Fixture {
        let mut dict = Dictionary::new();
        let name = dict
            .define(AttrDef::new("User-Name", 1, ValueType::String), None)
            .unwrap();
        let port = dict
            .define(AttrDef::new("Port", 5, ValueType::Uint32), None)
            .unwrap();
        let group = dict
            .define(AttrDef::new("Group", 241, ValueType::Group), None)
            .unwrap();
        let group_a = dict
            .define(AttrDef::new("A", 1, ValueType::Uint32), Some(&group))
            .unwrap();
        let mut arena = Arena::new();
        let scope = arena.new_scope(None).unwrap();
        let list = arena.new_list(scope).unwrap();
        Fixture {
            arena,
            scope,
            list,
            name,
            port,
            group,
            group_a,
        }
    }

    fn abc(f: &mut Fixture) -> (PairId, PairId, PairId) {
        let port = f.port.clone();
        let a = f.arena.append_by_da(f.scope, f.list, &port).unwrap();
        let b = f.arena.append_by_da(f.scope, f.list, &port).unwrap();
        let c = f.arena.append_by_da(f.scope, f.list, &port).unwrap();
        (a, b, c)
    }

    #[test]
    fn test_delete_ahead_of_cursor() {
        let mut f = fixture();
        let (a, b, c) = abc(&mut f);
        let mut cursor = f.arena.cursor_mut(f.list, PairFilter::All);
        assert_eq!(cursor.next(), Some(a));
        cursor.delete_pair(b).unwrap();
        assert_eq!(cursor.next(), Some(c));
        assert_eq!(cursor.next(), None);
    }

    #[test]
    fn test_delete_current_resumes_at_successor() {
        let mut f = fixture();
        let (a, b, c) = abc(&mut f);
        let mut cursor = f.arena.cursor_mut(f.list, PairFilter::All);
        assert_eq!(cursor.next(), Some(a));
        assert_eq!(cursor.next(), Some(b));
        assert!(cursor.delete().unwrap());
        assert_eq!(cursor.current(), None);
        assert_eq!(cursor.next(), Some(c));
        drop(cursor);
        assert!(!f.arena.contains_pair(b));
        assert_eq!(f.arena.iter(f.list).collect::<Vec<_>>(), vec![a, c]);
    }

    #[test]
    fn test_delete_all_matches() {
        let mut f = fixture();
        let (name, port) = (f.name.clone(), f.port.clone());
        f.arena.append_by_da(f.scope, f.list, &port).unwrap();
        let keep = f.arena.append_by_da(f.scope, f.list, &name).unwrap();
        f.arena.append_by_da(f.scope, f.list, &port).unwrap();

        let mut cursor = f.arena.cursor_mut(f.list, PairFilter::ByDa(port));
        let mut deleted = 0;
        while cursor.next().is_some() {
            cursor.delete().unwrap();
            deleted += 1;
        }
        assert_eq!(deleted, 2);
        assert_eq!(f.arena.iter(f.list).collect::<Vec<_>>(), vec![keep]);
    }

    #[test]
    fn test_insert_is_visited_next() {
        let mut f = fixture();
        let (a, b, _) = abc(&mut f);
        let port = f.port.clone();
        let new = f.arena.pair_alloc(f.scope, &port).unwrap();
        let mut cursor = f.arena.cursor_mut(f.list, PairFilter::All);
        assert_eq!(cursor.next(), Some(a));
        cursor.insert(new).unwrap();
        assert_eq!(cursor.next(), Some(new));
        assert_eq!(cursor.next(), Some(b));
    }

    #[test]
    fn test_insert_after_exhaustion_lands_at_tail() {
        let mut f = fixture();
        let (_, _, c) = abc(&mut f);
        let port = f.port.clone();
        let new = f.arena.pair_alloc(f.scope, &port).unwrap();
        let mut cursor = f.arena.cursor_mut(f.list, PairFilter::All);
        while cursor.next().is_some() {}
        cursor.insert(new).unwrap();
        assert_eq!(cursor.next(), Some(new));
        drop(cursor);
        assert_eq!(f.arena.list_prev(f.list, Some(new)), Some(c));
    }

    #[test]
    fn test_replace_current() {
        let mut f = fixture();
        let (a, b, c) = abc(&mut f);
        let port = f.port.clone();
        let new = f.arena.pair_alloc(f.scope, &port).unwrap();
        let mut cursor = f.arena.cursor_mut(f.list, PairFilter::All);
        cursor.next();
        cursor.next();
        assert_eq!(cursor.replace(new).unwrap(), b);
        assert_eq!(cursor.current(), Some(new));
        assert_eq!(cursor.next(), Some(c));
        drop(cursor);
        assert_eq!(f.arena.iter(f.list).collect::<Vec<_>>(), vec![a, new, c]);
        assert!(!f.arena.pair(b).unwrap().is_linked());
    }

    #[test]
    fn test_read_only_cursor_refuses_mutation() {
        let mut f = fixture();
        let (a, b, _) = abc(&mut f);
        let port = f.port.clone();
        let loose = f.arena.pair_alloc(f.scope, &port).unwrap();
        let mut cursor = f.arena.cursor(f.list, PairFilter::All);
        assert_eq!(cursor.next(), Some(a));
        assert_eq!(cursor.delete(), Err(PairError::ReadOnlyViolation));
        assert_eq!(cursor.insert(loose), Err(PairError::ReadOnlyViolation));
        assert_eq!(cursor.value_mut().err(), Some(PairError::ReadOnlyViolation));
        assert_eq!(cursor.next(), Some(b));
    }

    #[test]
    fn test_ancestor_filter_includes_ancestor() {
        let mut f = fixture();
        let (name, group, ga) = (f.name.clone(), f.group.clone(), f.group_a.clone());
        let g = f.arena.append_by_da(f.scope, f.list, &group).unwrap();
        f.arena.append_by_da(f.scope, f.list, &name).unwrap();
        let a = f.arena.append_by_da(f.scope, f.list, &ga).unwrap();

        let found: Vec<_> = f
            .arena
            .cursor(f.list, PairFilter::ByAncestor(group.clone()))
            .collect();
        assert_eq!(found, vec![g, a]);
        let leaf_only: Vec<_> = f
            .arena
            .cursor(f.list, PairFilter::ByAncestor(ga))
            .collect();
        assert_eq!(leaf_only, vec![a]);
        assert_eq!(f.arena.find_by_ancestor(f.list, None, &group), Some(a));
    }

    #[test]
    fn test_predicate_with_context() {
        let mut f = fixture();
        let port = f.port.clone();
        for n in [3u32, 8, 12] {
            let p = f.arena.append_by_da(f.scope, f.list, &port).unwrap();
            f.arena.value_mut(p).unwrap().set(Value::Uint32(n), false).unwrap();
        }
        let threshold = Value::Uint32(5);
        let cursor = f.arena.cursor(
            f.list,
            PairFilter::predicate(|p| {
                p.value()
                    .is_some_and(|v| v.value().total_cmp(&threshold).is_gt())
            }),
        );
        assert_eq!(cursor.count(), 2);
    }

    #[test]
    fn test_adapters_share_cursor_position() {
        let mut f = fixture();
        let (a, b, c) = abc(&mut f);
        let mut cursor = f.arena.cursor_mut(f.list, PairFilter::All);
        let first: Vec<_> = cursor.by_ref().take(2).collect();
        assert_eq!(first, vec![a, b]);
        assert_eq!(cursor.peek(), Some(c));
        assert_eq!(cursor.next(), Some(c));
        assert_eq!(cursor.next(), None);
    }

    #[test]
    fn test_head_restarts_and_value_mut() {
        let mut f = fixture();
        let (a, _, _) = abc(&mut f);
        let mut cursor = f.arena.cursor_mut(f.list, PairFilter::All);
        while cursor.next().is_some() {
            cursor.value_mut().unwrap().set(Value::Uint32(1), true).unwrap();
        }
        assert_eq!(cursor.head(), Some(a));
        assert_eq!(cursor.peek(), cursor.arena().list_next(f.list, Some(a)));
        assert!(cursor.current_pair().unwrap().is_tainted());
    }
}
