//! Pair entity and lifecycle
//!
//! A [`Pair`] couples a dictionary attribute with either a leaf value or a
//! child list, never both: the [`Payload`] enum makes the two states
//! exclusive. The descriptor only changes through [`Arena::pair_reinit`],
//! which rebuilds the payload for the new type.

use crate::arena::{Arena, ListId, ListOwner, PairId, ScopeId};
use crate::dict::Attr;
use crate::error::{PairError, PairResult};
use crate::token::Operator;
use crate::value::{ValueBox, ValueType};

/// Leaf value or nested child list
#[derive(Debug)]
pub enum Payload {
    Value(ValueBox),
    Children(ListId),
}

/// An attribute-value pair
#[derive(Debug)]
pub struct Pair {
    da: Attr,
    payload: Payload,
    op: Operator,
    xlat: Option<String>,
    is_root: bool,
    pub(crate) scope: ScopeId,
    pub(crate) list: Option<ListId>,
    pub(crate) prev: Option<PairId>,
    pub(crate) next: Option<PairId>,
}

impl Pair {
    fn new(da: Attr, payload: Payload, scope: ScopeId) -> Self {
        Pair {
            da,
            payload,
            op: Operator::default(),
            xlat: None,
            is_root: false,
            scope,
            list: None,
            prev: None,
            next: None,
        }
    }

    pub fn da(&self) -> &Attr {
        &self.da
    }

    pub fn value_type(&self) -> ValueType {
        self.da.value_type()
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    /// Leaf value, `None` for structural pairs
    pub fn value(&self) -> Option<&ValueBox> {
        match &self.payload {
            Payload::Value(vb) => Some(vb),
            Payload::Children(_) => None,
        }
    }

    pub fn value_mut(&mut self) -> Option<&mut ValueBox> {
        match &mut self.payload {
            Payload::Value(vb) => Some(vb),
            Payload::Children(_) => None,
        }
    }

    /// Child list, `None` for leaf pairs
    pub fn children(&self) -> Option<ListId> {
        match self.payload {
            Payload::Children(list) => Some(list),
            Payload::Value(_) => None,
        }
    }

    pub fn is_structural(&self) -> bool {
        matches!(self.payload, Payload::Children(_))
    }

    pub fn is_tainted(&self) -> bool {
        self.value().is_some_and(ValueBox::is_tainted)
    }

    pub fn op(&self) -> Operator {
        self.op
    }

    pub fn set_op(&mut self, op: Operator) {
        self.op = op;
    }

    /// Source text the value is lazily expanded from
    pub fn xlat(&self) -> Option<&str> {
        self.xlat.as_deref()
    }

    pub fn set_xlat(&mut self, xlat: Option<String>) {
        self.xlat = xlat;
    }

    /// Synthetic nesting anchor created by [`Arena::pair_alloc_root`]
    pub fn is_root(&self) -> bool {
        self.is_root
    }

    pub fn is_linked(&self) -> bool {
        self.list.is_some()
    }

    /// List this pair is currently linked into
    pub fn list(&self) -> Option<ListId> {
        self.list
    }

    pub fn scope(&self) -> ScopeId {
        self.scope
    }

    pub(crate) fn set_payload(&mut self, payload: Payload) {
        self.payload = payload;
    }

    pub(crate) fn set_da(&mut self, da: Attr) {
        self.da = da;
    }
}

impl Arena {
    /// Allocate an unlinked pair for `da` holding the type's zero value,
    /// or an empty child list for structural types
    pub fn pair_alloc(&mut self, scope: ScopeId, da: &Attr) -> PairResult<PairId> {
        self.check_capacity(1)?;
        let payload = match ValueBox::for_attr(da) {
            Some(vb) => Payload::Value(vb),
            None => Payload::Children(self.insert_list(ListOwner::Scope(scope))),
        };
        let children = match &payload {
            Payload::Children(list) => Some(*list),
            Payload::Value(_) => None,
        };
        let id = match self.insert_pair(scope, Pair::new(da.clone(), payload, scope)) {
            Ok(id) => id,
            Err(e) => {
                if let Some(list) = children {
                    self.release_list(list);
                }
                return Err(e);
            }
        };
        if let Some(list) = children {
            self.set_list_owner(list, ListOwner::Pair(id));
        }
        Ok(id)
    }

    /// Allocate a structural pair marked as a nesting anchor
    ///
    /// Roots hold whole trees for operations on "children of children";
    /// `da` must be structural.
    pub fn pair_alloc_root(&mut self, scope: ScopeId, da: &Attr) -> PairResult<PairId> {
        if !da.is_structural() {
            return Err(PairError::mismatch("structural type", da.value_type().name()));
        }
        let id = self.pair_alloc(scope, da)?;
        self.pair_mut(id)?.is_root = true;
        Ok(id)
    }

    /// Rebind `pair` to `da`, discarding its value or children
    ///
    /// The operator and expansion text are kept. Owned buffers and child
    /// pairs of the previous payload are freed.
    pub fn pair_reinit(&mut self, pair: PairId, da: &Attr) -> PairResult<()> {
        let old = self.pair(pair)?.children();
        let payload = match ValueBox::for_attr(da) {
            Some(vb) => Payload::Value(vb),
            None => Payload::Children(self.insert_list(ListOwner::Pair(pair))),
        };
        if let Some(old) = old {
            self.release_list(old);
        }
        let p = self.pair_mut(pair)?;
        p.set_da(da.clone());
        p.set_payload(payload);
        Ok(())
    }

    /// Deep-copy `src` into `scope`
    ///
    /// Values never share buffers with the source; structural pairs copy
    /// their whole child tree. The copy is unlinked.
    pub fn pair_copy(&mut self, scope: ScopeId, src: PairId) -> PairResult<PairId> {
        let (da, value, children, op, xlat, is_root) = {
            let p = self.pair(src)?;
            (
                p.da.clone(),
                p.value().map(ValueBox::deep_copy),
                p.children(),
                p.op,
                p.xlat.clone(),
                p.is_root,
            )
        };

        let copy = self.pair_alloc(scope, &da)?;
        {
            let p = self.pair_mut(copy)?;
            p.op = op;
            p.xlat = xlat;
            p.is_root = is_root;
            if let Some(value) = value {
                p.set_payload(Payload::Value(value));
            }
        }

        if let (Some(src_children), Some(dst_children)) = (children, self.pair(copy)?.children())
        {
            if let Err(e) = self.list_copy(scope, dst_children, src_children) {
                self.release_pair(copy);
                return Err(e);
            }
        }
        Ok(copy)
    }

    /// Move an unlinked pair into `scope` without copying
    pub fn pair_steal(&mut self, scope: ScopeId, pair: PairId) -> PairResult<()> {
        if self.pair(pair)?.is_linked() {
            return Err(PairError::StillLinked);
        }
        self.reparent_pair(pair, scope)
    }

    /// Steal `pair` into `scope` and append it to `list`
    pub fn pair_steal_append(
        &mut self,
        scope: ScopeId,
        list: ListId,
        pair: PairId,
    ) -> PairResult<()> {
        self.pair_steal(scope, pair)?;
        self.append(list, pair)
    }

    /// Steal `pair` into `scope` and prepend it to `list`
    pub fn pair_steal_prepend(
        &mut self,
        scope: ScopeId,
        list: ListId,
        pair: PairId,
    ) -> PairResult<()> {
        self.pair_steal(scope, pair)?;
        self.prepend(list, pair)
    }

    /// Unlink (if linked) and free a pair with all of its children
    pub fn pair_free(&mut self, pair: PairId) -> PairResult<()> {
        self.pair(pair)?;
        self.release_pair(pair);
        Ok(())
    }

    /// Child list of a structural pair
    pub fn children(&self, pair: PairId) -> PairResult<ListId> {
        let p = self.pair(pair)?;
        p.children()
            .ok_or_else(|| PairError::mismatch("structural type", p.value_type().name()))
    }

    /// Leaf value of a pair, for the typed setters on [`ValueBox`]
    pub fn value_mut(&mut self, pair: PairId) -> PairResult<&mut ValueBox> {
        let p = self.pair_mut(pair)?;
        let ty = p.value_type();
        p.value_mut()
            .ok_or_else(|| PairError::mismatch("leaf type", ty.name()))
    }

    pub fn value(&self, pair: PairId) -> PairResult<&ValueBox> {
        let p = self.pair(pair)?;
        p.value()
            .ok_or_else(|| PairError::mismatch("leaf type", p.value_type().name()))
    }

    /// Copy the value of `src` into `dst`; both must be leaves of one type
    pub fn value_copy(&mut self, dst: PairId, src: PairId) -> PairResult<()> {
        let value = self.value(src)?.clone();
        self.value_mut(dst)?.copy_from(&value)
    }
}
