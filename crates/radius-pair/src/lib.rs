//! Attribute-Value Pair Lists
//!
//! This crate provides the attribute-value pair (AVP) engine used to hold
//! the contents of RADIUS-style protocol messages: typed pairs bound to
//! dictionary attributes, kept in ordered lists that nest for structural
//! attributes.
//!
//! # Features
//!
//! - Arena-allocated pairs and lists addressed by generational handles
//! - Hierarchical allocation scopes with steal/copy ownership transfer
//! - Insertion-ordered lists with copy, merge, sort and comparison
//! - Filtered cursors that stay valid across their own edits
//! - Search by attribute, ancestor or child number
//! - Filter list validation with strict and relaxed modes
//! - Typed value setters with taint tracking and shared (pinned) buffers
//! - Legacy `Name op value` text records
//!
//! # Example
//!
//! ```rust
//! use radius_pair::{Arena, AttrDef, Dictionary, PairFilter, Value, ValueType};
//!
//! let mut dict = Dictionary::new();
//! let name = dict.define(AttrDef::new("User-Name", 1, ValueType::String), None).unwrap();
//! let port = dict.define(AttrDef::new("Port", 5, ValueType::Uint32), None).unwrap();
//!
//! let mut arena = Arena::new();
//! let request = arena.new_scope(None).unwrap();
//! let list = arena.new_list(request).unwrap();
//!
//! // Value from the wire is tainted
//! let user = arena.append_by_da(request, list, &name).unwrap();
//! arena.value_mut(user).unwrap().strdup("alice", true).unwrap();
//!
//! let nas_port = arena.append_by_da(request, list, &port).unwrap();
//! arena.value_mut(nas_port).unwrap().set(Value::Uint32(5), false).unwrap();
//!
//! let ports: Vec<_> = arena.cursor(list, PairFilter::ByDa(port.clone())).collect();
//! assert_eq!(ports, vec![nas_port]);
//!
//! // Everything allocated for the request goes away with its scope
//! arena.free_scope(request).unwrap();
//! assert_eq!(arena.pair_count(), 0);
//! ```

pub mod arena;
pub mod cursor;
pub mod dict;
pub mod error;
pub mod filter;
pub mod legacy;
pub mod list;
pub mod pair;
pub mod print;
pub mod search;
pub mod token;
pub mod value;

pub use arena::{Arena, ArenaConfig, ListId, PairId, ScopeId};
pub use cursor::{PairCursor, PairFilter};
pub use dict::{Attr, AttrDef, DictAttr, Dictionary, DictionaryService};
pub use error::{PairError, PairResult};
pub use filter::{Validation, ValidationFailure, ValidationMode};
pub use legacy::{MAX_LHS_LEN, MAX_RHS_LEN, RawPair};
pub use list::{Pairs, cmp_by_da, cmp_by_parent_num};
pub use pair::{Pair, Payload};
pub use token::{Operator, Quote};
pub use value::{Buffer, TimeDelta, UnixTime, Value, ValueBox, ValueType};
