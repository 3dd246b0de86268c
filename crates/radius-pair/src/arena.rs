//! Pair arena and allocation scopes
//!
//! Pairs, lists and scopes live in generational slabs owned by an [`Arena`]
//! and are addressed by copyable handles. A handle to a freed entry never
//! aliases a later allocation: lookups through it fail with `InvalidHandle`.
//!
//! Scopes form a hierarchy. Freeing a scope frees its child scopes, the
//! lists it owns and the pairs it owns, structural children included.
//! Teardown only frees what the scope owns: a pair owned by another scope
//! (for example one stolen out of it) is unlinked from the dying lists and
//! left alive. Explicit bulk frees ([`Arena::list_free`],
//! [`Arena::pair_free`]) free everything linked beneath them regardless of
//! owner. Freeing a structural pair frees its child list depth first.

use crate::error::{PairError, PairResult};
use crate::pair::{Pair, Payload};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use tracing::trace;

#[derive(Clone, Copy, PartialEq, Eq, Hash)]
struct Key {
    index: u32,
    generation: u32,
}

macro_rules! handle {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash)]
        pub struct $name(Key);

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({}v{})", stringify!($name), self.0.index, self.0.generation)
            }
        }
    };
}

handle!(
    /// Handle to a pair in an [`Arena`]
    PairId
);
handle!(
    /// Handle to a pair list in an [`Arena`]
    ListId
);
handle!(
    /// Handle to an allocation scope in an [`Arena`]
    ScopeId
);

struct Slot<T> {
    generation: u32,
    value: Option<T>,
}

/// Generational slot storage with a free list
struct Slab<T> {
    slots: Vec<Slot<T>>,
    free: Vec<u32>,
    len: usize,
}

impl<T> Slab<T> {
    fn with_capacity(capacity: usize) -> Self {
        Slab {
            slots: Vec::with_capacity(capacity),
            free: Vec::new(),
            len: 0,
        }
    }

    fn insert(&mut self, value: T) -> Key {
        self.len += 1;
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.value = Some(value);
            return Key {
                index,
                generation: slot.generation,
            };
        }
        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            value: Some(value),
        });
        Key {
            index,
            generation: 0,
        }
    }

    fn get(&self, key: Key) -> Option<&T> {
        let slot = self.slots.get(key.index as usize)?;
        if slot.generation != key.generation {
            return None;
        }
        slot.value.as_ref()
    }

    fn get_mut(&mut self, key: Key) -> Option<&mut T> {
        let slot = self.slots.get_mut(key.index as usize)?;
        if slot.generation != key.generation {
            return None;
        }
        slot.value.as_mut()
    }

    fn remove(&mut self, key: Key) -> Option<T> {
        let slot = self.slots.get_mut(key.index as usize)?;
        if slot.generation != key.generation {
            return None;
        }
        let value = slot.value.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(key.index);
        self.len -= 1;
        Some(value)
    }
}

/// Who frees a list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ListOwner {
    Scope(ScopeId),
    /// Child list of a structural pair
    Pair(PairId),
}

pub(crate) struct ListHead {
    pub(crate) head: Option<PairId>,
    pub(crate) tail: Option<PairId>,
    pub(crate) len: usize,
    pub(crate) owner: ListOwner,
}

struct ScopeNode {
    parent: Option<ScopeId>,
    children: Vec<ScopeId>,
    pairs: HashSet<PairId>,
    lists: HashSet<ListId>,
}

/// Arena limits
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArenaConfig {
    /// Maximum number of live pairs; allocation beyond it fails
    #[serde(default)]
    pub max_pairs: Option<usize>,

    /// Slots reserved up front for pairs
    #[serde(default = "default_initial_capacity")]
    pub initial_capacity: usize,
}

fn default_initial_capacity() -> usize {
    64
}

impl Default for ArenaConfig {
    fn default() -> Self {
        ArenaConfig {
            max_pairs: None,
            initial_capacity: default_initial_capacity(),
        }
    }
}

/// Owner of every pair, list and scope
///
/// The arena is not internally synchronised: one request owns one arena
/// (or one scope tree) at a time, and independent arenas can be used on
/// different threads freely.
pub struct Arena {
    config: ArenaConfig,
    pairs: Slab<Pair>,
    lists: Slab<ListHead>,
    scopes: Slab<ScopeNode>,
}

impl Default for Arena {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Arena {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Arena")
            .field("pairs", &self.pairs.len)
            .field("lists", &self.lists.len)
            .field("scopes", &self.scopes.len)
            .finish()
    }
}

impl Arena {
    pub fn new() -> Self {
        Self::with_config(ArenaConfig::default())
    }

    pub fn with_config(config: ArenaConfig) -> Self {
        Arena {
            pairs: Slab::with_capacity(config.initial_capacity),
            lists: Slab::with_capacity(config.initial_capacity / 4),
            scopes: Slab::with_capacity(4),
            config,
        }
    }

    pub fn config(&self) -> &ArenaConfig {
        &self.config
    }

    /// Number of live pairs
    pub fn pair_count(&self) -> usize {
        self.pairs.len
    }

    pub fn list_count(&self) -> usize {
        self.lists.len
    }

    // ---- scopes ----

    /// Create a scope, nested under `parent` when given
    pub fn new_scope(&mut self, parent: Option<ScopeId>) -> PairResult<ScopeId> {
        if let Some(parent) = parent {
            self.scope(parent)?;
        }
        let id = ScopeId(self.scopes.insert(ScopeNode {
            parent,
            children: Vec::new(),
            pairs: HashSet::new(),
            lists: HashSet::new(),
        }));
        if let Some(parent) = parent {
            self.scope_mut(parent)?.children.push(id);
        }
        Ok(id)
    }

    pub fn scope_exists(&self, scope: ScopeId) -> bool {
        self.scopes.get(scope.0).is_some()
    }

    pub fn scope_parent(&self, scope: ScopeId) -> PairResult<Option<ScopeId>> {
        Ok(self.scope(scope)?.parent)
    }

    /// Whether `scope` currently owns `pair`
    pub fn scope_owns(&self, scope: ScopeId, pair: PairId) -> bool {
        self.scopes
            .get(scope.0)
            .is_some_and(|node| node.pairs.contains(&pair))
    }

    /// Free a scope with its child scopes, lists and pairs
    pub fn free_scope(&mut self, scope: ScopeId) -> PairResult<()> {
        let node = self.scope(scope)?;
        let children = node.children.clone();
        for child in children {
            self.free_scope(child)?;
        }

        let (lists, pairs, parent) = {
            let node = self.scope(scope)?;
            let lists: Vec<ListId> = node.lists.iter().copied().collect();
            let pairs: Vec<PairId> = node.pairs.iter().copied().collect();
            (lists, pairs, node.parent)
        };
        trace!(
            lists = lists.len(),
            pairs = pairs.len(),
            "Freeing allocation scope"
        );

        for list in lists {
            self.release_scope_list(list, scope);
        }
        for pair in pairs {
            self.release_scope_pair(pair, scope);
        }

        if let Some(parent) = parent {
            if let Some(node) = self.scopes.get_mut(parent.0) {
                node.children.retain(|c| *c != scope);
            }
        }
        self.scopes.remove(scope.0);
        Ok(())
    }

    /// Teardown of `list` on behalf of `scope`: pairs the scope owns are
    /// freed, all others are unlinked
    fn release_scope_list(&mut self, list: ListId, scope: ScopeId) {
        while let Some(head) = self.lists.get(list.0).and_then(|h| h.head) {
            self.release_scope_pair(head, scope);
        }
        self.release_list(list);
    }

    fn release_scope_pair(&mut self, pair: PairId, scope: ScopeId) {
        let Some(p) = self.pairs.get(pair.0) else {
            return;
        };
        if p.scope != scope {
            self.unlink(pair);
            return;
        }
        if let Some(children) = p.children() {
            self.release_scope_list(children, scope);
        }
        self.release_pair(pair);
    }

    fn scope(&self, scope: ScopeId) -> PairResult<&ScopeNode> {
        self.scopes
            .get(scope.0)
            .ok_or(PairError::InvalidHandle("scope"))
    }

    fn scope_mut(&mut self, scope: ScopeId) -> PairResult<&mut ScopeNode> {
        self.scopes
            .get_mut(scope.0)
            .ok_or(PairError::InvalidHandle("scope"))
    }

    // ---- lists ----

    /// Create an empty list owned by `scope`
    pub fn new_list(&mut self, scope: ScopeId) -> PairResult<ListId> {
        self.scope(scope)?;
        let list = self.insert_list(ListOwner::Scope(scope));
        self.scope_mut(scope)?.lists.insert(list);
        Ok(list)
    }

    pub fn list_exists(&self, list: ListId) -> bool {
        self.lists.get(list.0).is_some()
    }

    pub(crate) fn insert_list(&mut self, owner: ListOwner) -> ListId {
        ListId(self.lists.insert(ListHead {
            head: None,
            tail: None,
            len: 0,
            owner,
        }))
    }

    pub(crate) fn list_head_ref(&self, list: ListId) -> PairResult<&ListHead> {
        self.lists
            .get(list.0)
            .ok_or(PairError::InvalidHandle("list"))
    }

    pub(crate) fn list_head_mut(&mut self, list: ListId) -> PairResult<&mut ListHead> {
        self.lists
            .get_mut(list.0)
            .ok_or(PairError::InvalidHandle("list"))
    }

    pub(crate) fn set_list_owner(&mut self, list: ListId, owner: ListOwner) {
        if let Some(head) = self.lists.get_mut(list.0) {
            head.owner = owner;
        }
    }

    /// Free every pair in `list` and the list itself
    pub(crate) fn release_list(&mut self, list: ListId) {
        self.release_list_contents(list);
        if let Some(head) = self.lists.remove(list.0) {
            if let ListOwner::Scope(scope) = head.owner {
                if let Some(node) = self.scopes.get_mut(scope.0) {
                    node.lists.remove(&list);
                }
            }
        }
    }

    /// Free every pair linked into `list`, leaving the list empty
    pub(crate) fn release_list_contents(&mut self, list: ListId) -> usize {
        let mut freed = 0;
        while let Some(head) = self.lists.get(list.0).and_then(|h| h.head) {
            self.release_pair(head);
            freed += 1;
        }
        freed
    }

    // ---- pairs ----

    pub fn contains_pair(&self, pair: PairId) -> bool {
        self.pairs.get(pair.0).is_some()
    }

    pub fn pair(&self, pair: PairId) -> PairResult<&Pair> {
        self.pairs
            .get(pair.0)
            .ok_or(PairError::InvalidHandle("pair"))
    }

    /// Mutable access to a pair's metadata and value
    ///
    /// Linkage and the descriptor are not reachable through `&mut Pair`;
    /// use the list and reinitialisation operations for those.
    pub fn pair_mut(&mut self, pair: PairId) -> PairResult<&mut Pair> {
        self.pairs
            .get_mut(pair.0)
            .ok_or(PairError::InvalidHandle("pair"))
    }

    /// Store a new pair owned by `scope`, enforcing the pair limit
    pub(crate) fn insert_pair(&mut self, scope: ScopeId, pair: Pair) -> PairResult<PairId> {
        self.check_capacity(1)?;
        self.scope(scope)?;
        let id = PairId(self.pairs.insert(pair));
        self.scope_mut(scope)?.pairs.insert(id);
        Ok(id)
    }

    pub(crate) fn check_capacity(&self, additional: usize) -> PairResult<()> {
        if let Some(max) = self.config.max_pairs {
            if self.pairs.len + additional > max {
                return Err(PairError::AllocationFailure(max));
            }
        }
        Ok(())
    }

    /// Move `pair` and every pair nested beneath it into `scope`
    pub(crate) fn reparent_pair(&mut self, pair: PairId, scope: ScopeId) -> PairResult<()> {
        self.scope(scope)?;
        self.pair(pair)?;
        let mut pending = vec![pair];
        while let Some(id) = pending.pop() {
            let (old, children) = {
                let p = self.pair(id)?;
                (p.scope, p.children())
            };
            if let Some(node) = self.scopes.get_mut(old.0) {
                node.pairs.remove(&id);
            }
            self.scope_mut(scope)?.pairs.insert(id);
            self.pair_mut(id)?.scope = scope;
            if let Some(children) = children {
                pending.extend(self.iter(children));
            }
        }
        Ok(())
    }

    /// Unlink and free a pair, freeing its child list depth first
    pub(crate) fn release_pair(&mut self, pair: PairId) {
        if self.pairs.get(pair.0).is_none() {
            return;
        }
        self.unlink(pair);
        let Some(removed) = self.pairs.remove(pair.0) else {
            return;
        };
        if let Payload::Children(children) = removed.payload() {
            self.release_list(*children);
        }
        if let Some(node) = self.scopes.get_mut(removed.scope.0) {
            node.pairs.remove(&pair);
        }
    }

    // ---- linkage ----

    /// Link an unlinked `pair` into `list` right after `anchor`
    /// (`None` = at the head)
    pub(crate) fn link_after(
        &mut self,
        list: ListId,
        anchor: Option<PairId>,
        pair: PairId,
    ) -> PairResult<()> {
        self.check_linkable(list, pair)?;
        let next = match anchor {
            Some(anchor) => self.member_of(list, anchor)?.next,
            None => self.list_head_ref(list)?.head,
        };
        self.splice_in(list, anchor, next, pair)
    }

    /// Link an unlinked `pair` into `list` right before `anchor`
    /// (`None` = at the tail)
    pub(crate) fn link_before(
        &mut self,
        list: ListId,
        anchor: Option<PairId>,
        pair: PairId,
    ) -> PairResult<()> {
        self.check_linkable(list, pair)?;
        let prev = match anchor {
            Some(anchor) => self.member_of(list, anchor)?.prev,
            None => self.list_head_ref(list)?.tail,
        };
        self.splice_in(list, prev, anchor, pair)
    }

    fn splice_in(
        &mut self,
        list: ListId,
        prev: Option<PairId>,
        next: Option<PairId>,
        pair: PairId,
    ) -> PairResult<()> {
        {
            let p = self.pair_mut(pair)?;
            p.list = Some(list);
            p.prev = prev;
            p.next = next;
        }
        match prev {
            Some(prev) => self.pair_mut(prev)?.next = Some(pair),
            None => self.list_head_mut(list)?.head = Some(pair),
        }
        match next {
            Some(next) => self.pair_mut(next)?.prev = Some(pair),
            None => self.list_head_mut(list)?.tail = Some(pair),
        }
        self.list_head_mut(list)?.len += 1;
        Ok(())
    }

    /// Detach `pair` from whichever list holds it; no-op when unlinked
    pub(crate) fn unlink(&mut self, pair: PairId) {
        let Some(p) = self.pairs.get_mut(pair.0) else {
            return;
        };
        let Some(list) = p.list.take() else {
            return;
        };
        let prev = p.prev.take();
        let next = p.next.take();

        match prev.and_then(|id| self.pairs.get_mut(id.0)) {
            Some(prev_pair) => prev_pair.next = next,
            None => {
                if let Some(head) = self.lists.get_mut(list.0) {
                    head.head = next;
                }
            }
        }
        match next.and_then(|id| self.pairs.get_mut(id.0)) {
            Some(next_pair) => next_pair.prev = prev,
            None => {
                if let Some(head) = self.lists.get_mut(list.0) {
                    head.tail = prev;
                }
            }
        }
        if let Some(head) = self.lists.get_mut(list.0) {
            head.len -= 1;
        }
    }

    /// `pair` as a member of `list`, or `NotFound`
    pub(crate) fn member_of(&self, list: ListId, pair: PairId) -> PairResult<&Pair> {
        self.list_head_ref(list)?;
        let p = self.pair(pair)?;
        if p.list != Some(list) {
            return Err(PairError::NotFound);
        }
        Ok(p)
    }

    fn check_linkable(&self, list: ListId, pair: PairId) -> PairResult<()> {
        self.list_head_ref(list)?;
        if self.pair(pair)?.list.is_some() {
            return Err(PairError::AlreadyLinked);
        }
        if self.list_is_beneath(list, pair) {
            return Err(PairError::Cycle);
        }
        Ok(())
    }

    /// Whether `list` is `pair`'s child list or nested anywhere below it
    pub(crate) fn list_is_beneath(&self, list: ListId, pair: PairId) -> bool {
        let mut cursor = Some(list);
        while let Some(current) = cursor {
            let Some(head) = self.lists.get(current.0) else {
                return false;
            };
            match head.owner {
                ListOwner::Scope(_) => return false,
                ListOwner::Pair(owner) => {
                    if owner == pair {
                        return true;
                    }
                    cursor = self.pairs.get(owner.0).and_then(|p| p.list);
                }
            }
        }
        false
    }
}
