//! Dictionary attribute handles
//!
//! Pairs refer to their attribute through an [`Attr`]: a cheap, cloneable
//! handle to an immutable [`DictAttr`]. Two handles are equal only when they
//! refer to the same definition. The hierarchy (for example `Group.A` nested
//! under `Group`) is a parent chain walked by the ancestor tests.
//!
//! Loading dictionaries from files is left to callers; [`Dictionary`] is an
//! in-memory registry they populate with [`Dictionary::define`].

use crate::error::{PairError, PairResult};
use crate::value::{Value, ValueType};
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::Deref;
use std::sync::Arc;

/// Immutable attribute definition
#[derive(Debug)]
pub struct DictAttr {
    id: u32,
    name: String,
    full_name: String,
    number: u32,
    vendor: u32,
    value_type: ValueType,
    parent: Option<Attr>,
    depth: u32,
    values: Vec<(String, Value)>,
}

impl DictAttr {
    /// Unique id assigned in definition order, used for identity ordering
    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Dotted path from the top level, e.g. `Group.A`
    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    pub fn number(&self) -> u32 {
        self.number
    }

    pub fn vendor(&self) -> u32 {
        self.vendor
    }

    pub fn value_type(&self) -> ValueType {
        self.value_type
    }

    pub fn parent(&self) -> Option<&Attr> {
        self.parent.as_ref()
    }

    /// Top-level attributes have depth 1
    pub fn depth(&self) -> u32 {
        self.depth
    }

    pub fn is_structural(&self) -> bool {
        self.value_type.is_structural()
    }

    pub fn has_enums(&self) -> bool {
        !self.values.is_empty()
    }

    /// Symbolic name defined for `value`
    pub fn enum_name(&self, value: &Value) -> Option<&str> {
        self.values
            .iter()
            .find(|(_, v)| v.total_cmp(value).is_eq())
            .map(|(name, _)| name.as_str())
    }

    /// Value defined for a symbolic name
    pub fn enum_value(&self, name: &str) -> Option<&Value> {
        self.values
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v)
    }

    pub fn enum_values(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(n, v)| (n.as_str(), v))
    }
}

/// Shared handle to a [`DictAttr`], compared by identity
#[derive(Clone)]
pub struct Attr(Arc<DictAttr>);

impl Attr {
    /// Whether `self` is a strict ancestor of `other` in the hierarchy
    pub fn is_ancestor_of(&self, other: &Attr) -> bool {
        if other.depth <= self.depth {
            return false;
        }
        let mut cursor = other.parent.as_ref();
        while let Some(parent) = cursor {
            if parent.depth == self.depth {
                return parent == self;
            }
            cursor = parent.parent.as_ref();
        }
        false
    }

    /// `self == other` or `self` is an ancestor of `other`
    pub fn is_self_or_ancestor_of(&self, other: &Attr) -> bool {
        self == other || self.is_ancestor_of(other)
    }

    /// Attribute numbers from the top level down to `self`
    pub fn number_path(&self) -> Vec<(u32, u32)> {
        let mut path = Vec::with_capacity(self.depth as usize);
        let mut cursor = Some(self);
        while let Some(attr) = cursor {
            path.push((attr.vendor, attr.number));
            cursor = attr.parent.as_ref();
        }
        path.reverse();
        path
    }
}

impl Deref for Attr {
    type Target = DictAttr;

    fn deref(&self) -> &DictAttr {
        &self.0
    }
}

impl PartialEq for Attr {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for Attr {}

impl Hash for Attr {
    fn hash<H: Hasher>(&self, state: &mut H) {
        (Arc::as_ptr(&self.0) as usize).hash(state);
    }
}

impl fmt::Debug for Attr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Attr({}: {})", self.full_name, self.value_type)
    }
}

impl fmt::Display for Attr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.full_name)
    }
}

/// Definition passed to [`Dictionary::define`]
#[derive(Debug, Clone)]
pub struct AttrDef {
    pub name: String,
    pub number: u32,
    pub value_type: ValueType,
    pub vendor: u32,
    pub values: Vec<(String, Value)>,
}

impl AttrDef {
    pub fn new(name: impl Into<String>, number: u32, value_type: ValueType) -> Self {
        AttrDef {
            name: name.into(),
            number,
            value_type,
            vendor: 0,
            values: Vec::new(),
        }
    }

    pub fn with_vendor(mut self, vendor: u32) -> Self {
        self.vendor = vendor;
        self
    }

    pub fn with_value(mut self, name: impl Into<String>, value: Value) -> Self {
        self.values.push((name.into(), value));
        self
    }
}

/// Read-only dictionary lookups used by parsers and consumers
pub trait DictionaryService {
    /// Resolve a dotted attribute path such as `Group.A`
    fn attr_by_name(&self, name: &str) -> Option<Attr>;

    /// Resolve a child by number; `None` parent means top level
    fn child_by_num(&self, parent: Option<&Attr>, vendor: u32, number: u32) -> Option<Attr>;
}

/// In-memory attribute registry
#[derive(Debug, Default)]
pub struct Dictionary {
    attrs: Vec<Attr>,
    by_name: HashMap<String, Attr>,
    by_num: HashMap<(u32, u32, u32), Attr>,
}

impl Dictionary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Define an attribute, nested under `parent` when given
    ///
    /// Parents must be structural, enum values must match the declared type,
    /// and names and numbers must be unique among siblings.
    pub fn define(&mut self, def: AttrDef, parent: Option<&Attr>) -> PairResult<Attr> {
        if let Some(parent) = parent {
            if !parent.is_structural() {
                return Err(PairError::mismatch(
                    "structural parent",
                    parent.value_type.name(),
                ));
            }
        }
        if def.value_type.is_structural() && !def.values.is_empty() {
            return Err(PairError::mismatch("leaf type", def.value_type.name()));
        }
        if let Some((_, bad)) = def
            .values
            .iter()
            .find(|(_, v)| v.value_type() != def.value_type)
        {
            return Err(PairError::mismatch(
                def.value_type.name(),
                bad.value_type().name(),
            ));
        }

        let full_name = match parent {
            Some(p) => format!("{}.{}", p.full_name, def.name),
            None => def.name.clone(),
        };
        let parent_id = parent.map_or(0, |p| p.id);
        let num_key = (parent_id, def.vendor, def.number);
        if self.by_name.contains_key(&full_name) || self.by_num.contains_key(&num_key) {
            return Err(PairError::DuplicateAttribute(full_name));
        }

        let attr = Attr(Arc::new(DictAttr {
            id: self.attrs.len() as u32 + 1,
            name: def.name,
            full_name: full_name.clone(),
            number: def.number,
            vendor: def.vendor,
            value_type: def.value_type,
            parent: parent.cloned(),
            depth: parent.map_or(1, |p| p.depth + 1),
            values: def.values,
        }));

        self.attrs.push(attr.clone());
        self.by_name.insert(full_name, attr.clone());
        self.by_num.insert(num_key, attr.clone());
        Ok(attr)
    }

    /// Look up by dotted path, failing with `UnknownAttribute`
    pub fn require(&self, name: &str) -> PairResult<Attr> {
        self.attr_by_name(name)
            .ok_or_else(|| PairError::UnknownAttribute(name.to_string()))
    }

    pub fn len(&self) -> usize {
        self.attrs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attrs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Attr> {
        self.attrs.iter()
    }
}

impl DictionaryService for Dictionary {
    fn attr_by_name(&self, name: &str) -> Option<Attr> {
        self.by_name.get(name).cloned()
    }

    fn child_by_num(&self, parent: Option<&Attr>, vendor: u32, number: u32) -> Option<Attr> {
        let parent_id = parent.map_or(0, |p| p.id);
        self.by_num.get(&(parent_id, vendor, number)).cloned()
    }
}
