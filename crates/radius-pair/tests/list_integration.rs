//! Pair List Integration Tests
//!
//! These tests drive the engine through its public API only, the way a
//! request pipeline would:
//! - Building request lists from dictionary attributes
//! - Ordering, copying and comparing lists
//! - Scope ownership and steal semantics
//! - Cursor iteration with edits made through the cursor
//! - Filter matching and list validation
//! - Taint tracking through value mutation
//! - Legacy text records in and out

use radius_pair::{
    Arena, Attr, AttrDef, Dictionary, ListId, Operator, PairError, PairFilter, PairId, ScopeId,
    Validation, ValidationFailure, ValidationMode, Value, ValueType, cmp_by_da,
};
use std::cmp::Ordering;
use std::sync::Arc;

struct Attrs {
    dict: Dictionary,
    user_name: Attr,
    port: Attr,
    class: Attr,
    group: Attr,
    group_a: Attr,
    group_b: Attr,
}

/// Helper to build the test dictionary
fn attrs() -> Attrs {
    let mut dict = Dictionary::new();
    let user_name = dict
        .define(AttrDef::new("User-Name", 1, ValueType::String), None)
        .expect("Failed to define User-Name");
    let port = dict
        .define(AttrDef::new("Port", 5, ValueType::Uint32), None)
        .expect("Failed to define Port");
    let class = dict
        .define(AttrDef::new("Class", 25, ValueType::String), None)
        .expect("Failed to define Class");
    let group = dict
        .define(AttrDef::new("Group", 241, ValueType::Group), None)
        .expect("Failed to define Group");
    let group_a = dict
        .define(AttrDef::new("A", 1, ValueType::Uint32), Some(&group))
        .expect("Failed to define Group.A");
    let group_b = dict
        .define(AttrDef::new("B", 2, ValueType::Uint32), Some(&group))
        .expect("Failed to define Group.B");
    Attrs {
        dict,
        user_name,
        port,
        class,
        group,
        group_a,
        group_b,
    }
}

/// Helper to append a leaf pair with a value
fn push(arena: &mut Arena, scope: ScopeId, list: ListId, da: &Attr, value: Value) -> PairId {
    let pair = arena
        .append_by_da(scope, list, da)
        .expect("Failed to append pair");
    arena
        .value_mut(pair)
        .expect("Pair is not a leaf")
        .set(value, false)
        .expect("Failed to set value");
    pair
}

fn setup() -> (Attrs, Arena, ScopeId, ListId) {
    let attrs = attrs();
    let mut arena = Arena::new();
    let scope = arena.new_scope(None).expect("Failed to create scope");
    let list = arena.new_list(scope).expect("Failed to create list");
    (attrs, arena, scope, list)
}

#[test]
fn test_append_order_is_iteration_order() {
    let (a, mut arena, scope, list) = setup();
    let pairs: Vec<PairId> = (0..5)
        .map(|n| push(&mut arena, scope, list, &a.port, Value::Uint32(n)))
        .collect();
    assert_eq!(arena.iter(list).collect::<Vec<_>>(), pairs);

    let reversed = arena.new_list(scope).unwrap();
    let mut prepended = Vec::new();
    for _ in 0..5 {
        let pair = arena.pair_alloc(scope, &a.port).unwrap();
        arena.prepend(reversed, pair).unwrap();
        prepended.push(pair);
    }
    prepended.reverse();
    assert_eq!(arena.iter(reversed).collect::<Vec<_>>(), prepended);
}

#[test]
fn test_insert_lands_adjacent_to_anchor() {
    let (a, mut arena, scope, list) = setup();
    let first = push(&mut arena, scope, list, &a.port, Value::Uint32(1));
    let last = push(&mut arena, scope, list, &a.port, Value::Uint32(3));

    let before = arena.pair_alloc(scope, &a.port).unwrap();
    arena.insert_before(list, last, before).unwrap();
    let after = arena.pair_alloc(scope, &a.port).unwrap();
    arena.insert_after(list, first, after).unwrap();

    assert_eq!(
        arena.iter(list).collect::<Vec<_>>(),
        vec![first, after, before, last]
    );
}

#[test]
fn test_copy_compares_equal_and_is_deep() {
    let (a, mut arena, scope, list) = setup();
    push(&mut arena, scope, list, &a.user_name, Value::string("bob"));
    let group = arena.append_by_da(scope, list, &a.group).unwrap();
    let children = arena.children(group).unwrap();
    let inner = push(&mut arena, scope, children, &a.group_a, Value::Uint32(7));

    let dst = arena.new_list(scope).unwrap();
    assert_eq!(arena.list_copy(scope, dst, list).unwrap(), 2);
    assert_eq!(arena.list_cmp(dst, list).unwrap(), Ordering::Equal);

    for (copy, orig) in arena.iter(dst).zip(arena.iter(list)) {
        assert_ne!(copy, orig);
    }
    let copy_group = arena.list_tail(dst).unwrap();
    let copy_children = arena.children(copy_group).unwrap();
    assert_ne!(copy_children, children);
    let copy_inner = arena.list_head(copy_children).unwrap();
    assert_ne!(copy_inner, inner);

    // Editing the copy leaves the source alone
    arena
        .value_mut(copy_inner)
        .unwrap()
        .set(Value::Uint32(8), false)
        .unwrap();
    assert_eq!(arena.value(inner).unwrap().value(), &Value::Uint32(7));
    assert_eq!(arena.list_cmp(dst, list).unwrap(), Ordering::Greater);
}

#[test]
fn test_copy_never_shares_buffers() {
    let (a, mut arena, scope, list) = setup();
    let source: Arc<str> = Arc::from("shared-source");
    let pair = arena.append_by_da(scope, list, &a.user_name).unwrap();
    arena
        .value_mut(pair)
        .unwrap()
        .strdup_shallow(Arc::clone(&source), false)
        .unwrap();
    assert!(!arena.value(pair).unwrap().value().is_owned());

    let copy = arena.pair_copy(scope, pair).unwrap();
    assert!(arena.value(copy).unwrap().value().is_owned());
    assert_eq!(Arc::strong_count(&source), 2);
}

#[test]
fn test_steal_outlives_original_scope() {
    let a = attrs();
    let mut arena = Arena::new();
    let original = arena.new_scope(None).unwrap();
    let keeper = arena.new_scope(None).unwrap();
    let pair = arena.pair_alloc(original, &a.port).unwrap();

    arena.pair_steal(keeper, pair).unwrap();
    arena.free_scope(original).unwrap();
    assert!(arena.contains_pair(pair));

    arena.free_scope(keeper).unwrap();
    assert!(!arena.contains_pair(pair));
    assert_eq!(arena.pair(pair).err(), Some(PairError::InvalidHandle("pair")));
}

#[test]
fn test_steal_keeps_children_and_list_membership() {
    let a = attrs();
    let mut arena = Arena::new();
    let request = arena.new_scope(None).unwrap();
    let keeper = arena.new_scope(None).unwrap();
    let reply = arena.new_list(keeper).unwrap();
    let scratch = arena.new_list(request).unwrap();

    // A group built in the request scope, then kept in the reply
    let group = arena.pair_alloc(request, &a.group).unwrap();
    let children = arena.children(group).unwrap();
    let inner = push(&mut arena, request, children, &a.group_a, Value::Uint32(7));
    arena.pair_steal_append(keeper, reply, group).unwrap();

    // A kept pair parked in a list of the request scope
    let parked = arena.pair_alloc(request, &a.port).unwrap();
    arena.pair_steal_append(keeper, scratch, parked).unwrap();
    let temp = push(&mut arena, request, scratch, &a.port, Value::Uint32(1));

    arena.free_scope(request).unwrap();
    assert!(!arena.contains_pair(temp));
    assert!(arena.contains_pair(parked));
    assert!(!arena.pair(parked).unwrap().is_linked());
    assert_eq!(arena.iter(reply).collect::<Vec<_>>(), vec![group]);
    assert_eq!(arena.iter(children).collect::<Vec<_>>(), vec![inner]);
    assert_eq!(arena.value(inner).unwrap().value(), &Value::Uint32(7));

    arena.free_scope(keeper).unwrap();
    assert_eq!(arena.pair_count(), 0);
}

#[test]
fn test_cursor_delete_ahead_then_next() {
    let (a, mut arena, scope, list) = setup();
    let pa = push(&mut arena, scope, list, &a.port, Value::Uint32(1));
    let pb = push(&mut arena, scope, list, &a.port, Value::Uint32(2));
    let pc = push(&mut arena, scope, list, &a.port, Value::Uint32(3));

    let mut cursor = arena.cursor_mut(list, PairFilter::All);
    assert_eq!(cursor.next(), Some(pa));
    cursor.delete_pair(pb).unwrap();
    assert_eq!(cursor.next(), Some(pc));
    assert_eq!(cursor.next(), None);
    drop(cursor);
    assert!(!arena.contains_pair(pb));
}

#[test]
fn test_cursor_edits_never_skip_or_revisit() {
    let (a, mut arena, scope, list) = setup();
    for n in 0..6 {
        push(&mut arena, scope, list, &a.port, Value::Uint32(n));
    }
    let mut markers: Vec<PairId> = (0..3)
        .map(|_| arena.pair_alloc(scope, &a.class).unwrap())
        .collect();

    // Drop odd values and insert a marker after each even one
    let mut seen = Vec::new();
    let mut cursor = arena.cursor_mut(list, PairFilter::ByDa(a.port.clone()));
    while let Some(pair) = cursor.next() {
        let Value::Uint32(n) = *cursor.arena().value(pair).unwrap().value() else {
            panic!("unexpected value type");
        };
        seen.push(n);
        if n % 2 == 1 {
            cursor.delete().unwrap();
        } else if let Some(marker) = markers.pop() {
            cursor.insert(marker).unwrap();
        }
    }
    drop(cursor);
    assert_eq!(seen, vec![0, 1, 2, 3, 4, 5]);
    assert_eq!(arena.list_len(list), 6);
    assert_eq!(arena.count_by_da(list, &a.port), 3);
    assert_eq!(arena.count_by_da(list, &a.class), 3);
}

#[test]
fn test_read_only_cursor() {
    let (a, mut arena, scope, list) = setup();
    push(&mut arena, scope, list, &a.port, Value::Uint32(1));
    let mut cursor = arena.cursor(list, PairFilter::All);
    assert!(cursor.next().is_some());
    assert_eq!(cursor.remove(), Err(PairError::ReadOnlyViolation));
}

#[test]
fn test_filter_by_da_exact() {
    let (a, mut arena, scope, list) = setup();
    push(&mut arena, scope, list, &a.user_name, Value::string("bob"));
    let port = push(&mut arena, scope, list, &a.port, Value::Uint32(5));

    let matches: Vec<_> = arena
        .cursor(list, PairFilter::ByDa(a.port.clone()))
        .collect();
    assert_eq!(matches, vec![port]);

    let none: Vec<_> = arena
        .cursor(list, PairFilter::ByDa(a.class.clone()))
        .collect();
    assert!(none.is_empty());
    assert_eq!(arena.find_by_da(list, None, &a.class), None);
}

#[test]
fn test_ancestor_matching() {
    let (a, mut arena, scope, list) = setup();
    let g = arena.append_by_da(scope, list, &a.group).unwrap();
    push(&mut arena, scope, list, &a.user_name, Value::string("bob"));
    let ga = push(&mut arena, scope, list, &a.group_a, Value::Uint32(1));
    let gb = push(&mut arena, scope, list, &a.group_b, Value::Uint32(2));

    let found: Vec<_> = arena
        .cursor(list, PairFilter::ByAncestor(a.group.clone()))
        .collect();
    assert_eq!(found, vec![g, ga, gb]);
    assert_eq!(arena.find_by_ancestor(list, None, &a.group), Some(ga));
    assert_eq!(arena.find_by_ancestor_idx(list, &a.group, 1), Some(gb));

    let dst = arena.new_list(scope).unwrap();
    assert_eq!(
        arena
            .list_copy_by_ancestor(scope, dst, list, &a.group, 0)
            .unwrap(),
        3
    );
}

#[test]
fn test_validate_strict_and_relaxed() {
    let (a, mut arena, scope, list) = setup();
    let filter = arena.new_list(scope).unwrap();
    let port_cond = push(&mut arena, scope, filter, &a.port, Value::Uint32(5));
    arena.pair_mut(port_cond).unwrap().set_op(Operator::CmpEq);
    let class_cond = push(&mut arena, scope, filter, &a.class, Value::string("x"));
    arena.pair_mut(class_cond).unwrap().set_op(Operator::CmpEq);
    push(&mut arena, scope, list, &a.port, Value::Uint32(5));

    assert_eq!(
        arena.validate(list, filter, ValidationMode::Strict).unwrap(),
        Validation::Failed(ValidationFailure {
            filter: class_cond,
            candidate: None,
        })
    );
    assert_eq!(
        arena.validate(list, filter, ValidationMode::Relaxed).unwrap(),
        Validation::Passed
    );
}

#[test]
fn test_taint_survives_untainted_append() {
    let (a, mut arena, scope, list) = setup();
    let pair = arena.append_by_da(scope, list, &a.user_name).unwrap();
    let value = arena.value_mut(pair).unwrap();
    value.strdup("from-wire", true).unwrap();
    value.str_append("@realm", false).unwrap();
    assert!(value.is_tainted());

    let copy = arena.pair_copy(scope, pair).unwrap();
    assert!(arena.value(copy).unwrap().is_tainted());
}

#[test]
fn test_list_compare_ordering() {
    let (a, mut arena, scope, _) = setup();
    let short = arena.new_list(scope).unwrap();
    push(&mut arena, scope, short, &a.group_a, Value::Uint32(1));

    let long = arena.new_list(scope).unwrap();
    push(&mut arena, scope, long, &a.group_a, Value::Uint32(1));
    push(&mut arena, scope, long, &a.group_b, Value::Uint32(2));

    let other = arena.new_list(scope).unwrap();
    push(&mut arena, scope, other, &a.group_a, Value::Uint32(1));
    push(&mut arena, scope, other, &a.group_b, Value::Uint32(3));

    assert_eq!(arena.list_cmp(short, long).unwrap(), Ordering::Less);
    assert_eq!(arena.list_cmp(long, short).unwrap(), Ordering::Greater);
    assert_eq!(arena.list_cmp(long, other).unwrap(), Ordering::Less);
}

#[test]
fn test_sort_then_compare_canonical() {
    let (a, mut arena, scope, list) = setup();
    push(&mut arena, scope, list, &a.port, Value::Uint32(5));
    push(&mut arena, scope, list, &a.user_name, Value::string("bob"));

    let other = arena.new_list(scope).unwrap();
    push(&mut arena, scope, other, &a.user_name, Value::string("bob"));
    push(&mut arena, scope, other, &a.port, Value::Uint32(5));

    assert_ne!(arena.list_cmp(list, other).unwrap(), Ordering::Equal);
    arena.list_sort(list, cmp_by_da).unwrap();
    arena.list_sort(other, cmp_by_da).unwrap();
    assert_eq!(arena.list_cmp(list, other).unwrap(), Ordering::Equal);
}

#[test]
fn test_legacy_text_round_trip() {
    let (a, mut arena, scope, list) = setup();
    let text = "User-Name = \"bob\"\nPort := 5\nGroup = { A = 1, B = 2 }\n";
    assert_eq!(arena.list_from_str(scope, &a.dict, list, text).unwrap(), 3);

    let printed: Vec<String> = arena
        .iter(list)
        .map(|pair| arena.pair_to_raw(pair).unwrap().to_string())
        .collect();
    assert_eq!(
        printed,
        vec![
            "User-Name = \"bob\"",
            "Port := 5",
            "Group = { A = 1, B = 2 }"
        ]
    );

    let reparsed = arena.new_list(scope).unwrap();
    arena
        .list_from_str(scope, &a.dict, reparsed, &printed.join("\n"))
        .unwrap();
    assert_eq!(arena.list_cmp(list, reparsed).unwrap(), Ordering::Equal);
}

#[test]
fn test_merge_then_free_list() {
    let (a, mut arena, scope, list) = setup();
    push(&mut arena, scope, list, &a.port, Value::Uint32(1));
    let src = arena.new_list(scope).unwrap();
    push(&mut arena, scope, src, &a.port, Value::Uint32(2));
    let group = arena.append_by_da(scope, src, &a.group).unwrap();
    let children = arena.children(group).unwrap();
    push(&mut arena, scope, children, &a.group_a, Value::Uint32(3));

    arena.list_append_list(list, src).unwrap();
    assert_eq!(arena.list_len(list), 3);
    assert!(arena.list_is_empty(src));
    assert_eq!(arena.pair_count(), 4);

    assert_eq!(arena.list_free(list).unwrap(), 3);
    assert_eq!(arena.pair_count(), 0);
}
