// Circular list: ordering, pointer movement, removal and dedup.

use ringkv::circular::codec::{self, CURRENT_KEY};
use ringkv::{CircularList, Current, DB, Error};

fn list_with(values: &[&[u8]]) -> CircularList {
    let db = DB::in_memory();
    let list = CircularList::create(&db, "ring").unwrap();
    for v in values {
        list.add(v).unwrap();
    }
    list
}

fn current(list: &CircularList) -> (Option<Vec<u8>>, usize, usize) {
    let Current { value, index, count } = list.current().unwrap();
    (value, index, count)
}

/// Write the pointer behind the list's back.
fn force_pointer(db: &DB, name: &str, pointer: u64) {
    db.update(|tx| tx.put(name, CURRENT_KEY.as_bytes(), &codec::encode_u64(pointer)))
        .unwrap();
}

// =============================================================================
// Test 1: Traversal follows insertion order and wraps
// =============================================================================
#[test]
fn next_visits_in_insertion_order_and_wraps() {
    let list = list_with(&[b"A", b"B", b"C"]);

    assert_eq!(current(&list), (Some(b"A".to_vec()), 0, 3));
    assert_eq!(list.next().unwrap(), Some(b"B".to_vec()));
    assert_eq!(list.next().unwrap(), Some(b"C".to_vec()));
    assert_eq!(list.next().unwrap(), Some(b"A".to_vec()));
    assert_eq!(current(&list), (Some(b"A".to_vec()), 0, 3));
}

// =============================================================================
// Test 2: Previous wraps from the first item to the last
// =============================================================================
#[test]
fn previous_wraps_backwards() {
    let list = list_with(&[b"A", b"B", b"C"]);

    assert_eq!(list.previous().unwrap(), Some(b"C".to_vec()));
    assert_eq!(list.previous().unwrap(), Some(b"B".to_vec()));
    assert_eq!(list.previous().unwrap(), Some(b"A".to_vec()));
    assert_eq!(current(&list), (Some(b"A".to_vec()), 0, 3));
}

// =============================================================================
// Test 3: n steps either way come back to the start
// =============================================================================
#[test]
fn full_lap_returns_to_start() {
    for n in 1..=7usize {
        let values: Vec<Vec<u8>> = (0..n).map(|i| vec![i as u8]).collect();
        let refs: Vec<&[u8]> = values.iter().map(Vec::as_slice).collect();
        let list = list_with(&refs);

        // start somewhere other than 0 when possible
        list.next().unwrap();
        let start = current(&list);

        for _ in 0..n {
            list.next().unwrap();
        }
        assert_eq!(current(&list), start, "next lap, n = {}", n);

        for _ in 0..n {
            list.previous().unwrap();
        }
        assert_eq!(current(&list), start, "previous lap, n = {}", n);
    }
}

// =============================================================================
// Test 4: add_nx adds once and reports the duplicate
// =============================================================================
#[test]
fn add_nx_dedups() {
    let list = list_with(&[b"A", b"B", b"C"]);

    assert!(!list.add_nx(b"B").unwrap());
    assert!(list.add_nx(b"E").unwrap());
    assert!(!list.add_nx(b"E").unwrap());

    assert_eq!(
        list.values().unwrap(),
        vec![b"A".to_vec(), b"B".to_vec(), b"C".to_vec(), b"E".to_vec()]
    );
    assert!(list.contains(b"E").unwrap());
    assert!(!list.contains(b"Z").unwrap());
}

// =============================================================================
// Test 5: add_nx compares whole payloads, empty payload included
// =============================================================================
#[test]
fn add_nx_is_byte_exact() {
    let list = list_with(&[b"ab"]);

    assert!(list.add_nx(b"a").unwrap());
    assert!(list.add_nx(b"abc").unwrap());
    assert!(list.add_nx(b"").unwrap());
    assert!(!list.add_nx(b"").unwrap());
    assert_eq!(list.len().unwrap(), 4);
}

// =============================================================================
// Test 6: Removing a middle item points at its successor
// =============================================================================
#[test]
fn remove_middle_advances_to_successor() {
    let list = list_with(&[b"A", b"B", b"C"]);
    list.next().unwrap(); // at B

    assert_eq!(list.remove().unwrap(), Some(b"B".to_vec()));
    assert_eq!(current(&list), (Some(b"C".to_vec()), 1, 2));
}

// =============================================================================
// Test 7: Removing the last item wraps the pointer to 0
// =============================================================================
#[test]
fn remove_last_wraps_to_first() {
    let list = list_with(&[b"A", b"B", b"C"]);
    list.previous().unwrap(); // at C

    assert_eq!(list.remove().unwrap(), Some(b"C".to_vec()));
    assert_eq!(current(&list), (Some(b"A".to_vec()), 0, 2));
}

// =============================================================================
// Test 8: Removing everything leaves an empty list with pointer 0
// =============================================================================
#[test]
fn remove_until_empty() {
    let list = list_with(&[b"A", b"B"]);
    list.next().unwrap();

    assert_eq!(list.remove().unwrap(), Some(b"B".to_vec()));
    assert_eq!(list.remove().unwrap(), Some(b"A".to_vec()));
    assert_eq!(list.remove().unwrap(), None);
    assert_eq!(current(&list), (None, 0, 0));
    assert!(list.is_empty().unwrap());
}

// =============================================================================
// Test 9: Empty list operations are harmless no-ops
// =============================================================================
#[test]
fn empty_list_is_safe() {
    let list = list_with(&[]);

    assert_eq!(current(&list), (None, 0, 0));
    assert_eq!(list.next().unwrap(), None);
    assert_eq!(list.previous().unwrap(), None);
    assert_eq!(list.remove().unwrap(), None);
    assert_eq!(current(&list), (None, 0, 0));
    assert_eq!(list.len().unwrap(), 0);
    assert!(list.values().unwrap().is_empty());
}

// =============================================================================
// Test 10: Add never moves the pointer
// =============================================================================
#[test]
fn add_does_not_move_pointer() {
    let list = list_with(&[b"A", b"B"]);
    list.next().unwrap();

    list.add(b"C").unwrap();
    assert_eq!(current(&list), (Some(b"B".to_vec()), 1, 3));
    assert_eq!(list.next().unwrap(), Some(b"C".to_vec()));
}

// =============================================================================
// Test 11: Keys are never reused after removals
// =============================================================================
#[test]
fn keys_keep_growing_after_removal() {
    let list = list_with(&[]);
    assert_eq!(list.add(b"A").unwrap(), 0);
    assert_eq!(list.add(b"B").unwrap(), 1);
    list.remove().unwrap();
    list.remove().unwrap();
    assert_eq!(list.add(b"C").unwrap(), 2);
    assert_eq!(current(&list), (Some(b"C".to_vec()), 0, 1));
}

// =============================================================================
// Test 12: Stale pointer is read as 0 and healed by the next move
// =============================================================================
#[test]
fn out_of_range_pointer_is_normalized() {
    let db = DB::in_memory();
    let list = CircularList::create(&db, "ring").unwrap();
    for v in [b"A", b"B", b"C"] {
        list.add(v).unwrap();
    }

    force_pointer(&db, "ring", 99);
    assert_eq!(current(&list), (Some(b"A".to_vec()), 0, 3));
    assert_eq!(list.next().unwrap(), Some(b"B".to_vec()));

    force_pointer(&db, "ring", 99);
    assert_eq!(list.remove().unwrap(), Some(b"A".to_vec()));
    assert_eq!(current(&list), (Some(b"B".to_vec()), 0, 2));
}

// =============================================================================
// Test 13: Items deleted by someone else shrink the ring safely
// =============================================================================
#[test]
fn external_deletion_is_tolerated() {
    let db = DB::in_memory();
    let list = CircularList::create(&db, "ring").unwrap();
    for v in [b"A", b"B", b"C"] {
        list.add(v).unwrap();
    }
    list.previous().unwrap(); // pointer 2

    db.update(|tx| {
        tx.delete("ring", &codec::item_key(1))?;
        tx.delete("ring", &codec::item_key(2))
    })
    .unwrap();

    assert_eq!(current(&list), (Some(b"A".to_vec()), 0, 1));
    assert_eq!(list.next().unwrap(), Some(b"A".to_vec()));
}

// =============================================================================
// Test 14: create wipes, open reuses
// =============================================================================
#[test]
fn create_wipes_and_open_reuses() {
    let db = DB::in_memory();
    let list = CircularList::create(&db, "ring").unwrap();
    list.add(b"A").unwrap();
    list.add(b"B").unwrap();
    list.next().unwrap();

    let reopened = CircularList::open(&db, "ring").unwrap();
    assert_eq!(current(&reopened), (Some(b"B".to_vec()), 1, 2));
    assert_eq!(reopened.add(b"C").unwrap(), 2);

    let fresh = CircularList::create(&db, "ring").unwrap();
    assert_eq!(current(&fresh), (None, 0, 0));
    assert_eq!(fresh.add(b"X").unwrap(), 0);
}

// =============================================================================
// Test 15: open on a missing namespace initializes it
// =============================================================================
#[test]
fn open_initializes_new_namespace() {
    let db = DB::in_memory();
    let list = CircularList::open(&db, "fresh").unwrap();
    assert_eq!(list.name(), "fresh");
    assert_eq!(current(&list), (None, 0, 0));
    assert_eq!(list.add(b"A").unwrap(), 0);
}

// =============================================================================
// Test 16: open resumes the counter past existing items if it is missing
// =============================================================================
#[test]
fn open_restores_missing_counter_without_reusing_keys() {
    let db = DB::in_memory();
    db.update(|tx| {
        tx.create_namespace("legacy")?;
        tx.put("legacy", &codec::item_key(4), b"old")
    })
    .unwrap();

    let list = CircularList::open(&db, "legacy").unwrap();
    assert_eq!(list.add(b"new").unwrap(), 5);
    assert_eq!(list.values().unwrap(), vec![b"old".to_vec(), b"new".to_vec()]);
}

// =============================================================================
// Test 17: Lists are isolated by namespace
// =============================================================================
#[test]
fn lists_do_not_share_items() {
    let db = DB::in_memory();
    let a = CircularList::create(&db, "a").unwrap();
    let b = CircularList::create(&db, "b").unwrap();
    a.add(b"x").unwrap();

    assert_eq!(a.len().unwrap(), 1);
    assert_eq!(b.len().unwrap(), 0);
    assert!(b.add_nx(b"x").unwrap());
}

// =============================================================================
// Test 18: Missing meta and missing namespace surface as errors
// =============================================================================
#[test]
fn broken_namespaces_are_errors() {
    let db = DB::in_memory();
    let list = CircularList::create(&db, "ring").unwrap();
    list.add(b"A").unwrap();

    db.update(|tx| tx.delete("ring", CURRENT_KEY.as_bytes())).unwrap();
    assert!(matches!(
        list.current(),
        Err(Error::MissingMeta { key: "__current__", .. })
    ));

    db.update(|tx| tx.drop_namespace("ring")).unwrap();
    assert!(matches!(list.next(), Err(Error::NamespaceNotFound(_))));
    assert!(matches!(list.add(b"B"), Err(Error::NamespaceNotFound(_))));
}
