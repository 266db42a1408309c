use super::*;

use proptest::prelude::*;
use proptest_derive::Arbitrary;
use std::collections::{HashMap, HashSet, VecDeque};

use crate::sort::{Order, SortConfig};

// =============================================================================
// Operation models
// =============================================================================

// Narrow key ranges keep tables small enough for long probe chains, removals
// of present keys, and repeated rehashing.

#[derive(Debug, Clone, Arbitrary)]
enum SetOp {
    #[proptest(weight = 50)]
    Add(#[proptest(strategy = "-64i32..64")] i32),
    #[proptest(weight = 25)]
    Remove(#[proptest(strategy = "-64i32..64")] i32),
    #[proptest(weight = 24)]
    Contains(#[proptest(strategy = "-64i32..64")] i32),
    #[proptest(weight = 1)]
    Clear,
}

#[derive(Debug, Clone, Arbitrary)]
enum IntLongOp {
    #[proptest(weight = 50)]
    Put(#[proptest(strategy = "0i32..96")] i32, i64),
    #[proptest(weight = 25)]
    Remove(#[proptest(strategy = "0i32..96")] i32),
    #[proptest(weight = 24)]
    Get(#[proptest(strategy = "0i32..96")] i32),
    #[proptest(weight = 1)]
    Clear,
}

#[derive(Debug, Clone)]
enum MapOp<K> {
    Put(K, i64),
    Remove(K),
    Get(K),
    Clear,
}

fn long_key_strategy() -> impl Strategy<Value = i64> + Clone {
    // Keys differing only above bit 32 must still spread.
    prop_oneof![
        3 => (-32i64..32).prop_map(|k| (k << 33) | 7),
        1 => any::<i64>(),
    ]
}

fn long_set_ops() -> impl Strategy<Value = Vec<MapOp<i64>>> {
    let key = long_key_strategy();
    let op = prop_oneof![
        50 => key.clone().prop_map(|k| MapOp::Put(k, 0)),
        25 => key.clone().prop_map(MapOp::Remove),
        24 => key.prop_map(MapOp::Get),
        1 => Just(MapOp::Clear),
    ];
    prop::collection::vec(op, 0..=2000)
}

fn string_map_ops() -> impl Strategy<Value = Vec<MapOp<String>>> {
    let key = "[a-d]{0,3}";
    let op = prop_oneof![
        50 => (key, any::<i64>()).prop_map(|(k, v)| MapOp::Put(k, v)),
        25 => key.prop_map(MapOp::Remove),
        24 => key.prop_map(MapOp::Get),
        1 => Just(MapOp::Clear),
    ];
    prop::collection::vec(op, 0..=1000)
}

fn long_object_ops() -> impl Strategy<Value = Vec<MapOp<i64>>> {
    let key = long_key_strategy();
    let op = prop_oneof![
        50 => (key.clone(), any::<i64>()).prop_map(|(k, v)| MapOp::Put(k, v)),
        25 => key.clone().prop_map(MapOp::Remove),
        24 => key.prop_map(MapOp::Get),
        1 => Just(MapOp::Clear),
    ];
    prop::collection::vec(op, 0..=2000)
}

#[derive(Debug, Clone, Arbitrary)]
enum QueueOp {
    #[proptest(weight = 3)]
    Put(i32),
    #[proptest(weight = 2)]
    Get,
    #[proptest(weight = 1)]
    Peek,
}

fn int_values() -> impl Strategy<Value = Vec<i32>> {
    prop_oneof![
        prop::collection::vec(any::<i32>(), 0..300),
        prop::collection::vec(0i32..1024, 0..300),
        prop::collection::vec((0i32..64).prop_map(|v| v << 10), 0..300),
        prop::collection::vec(-3i32..3, 0..300),
    ]
}

fn long_values() -> impl Strategy<Value = Vec<i64>> {
    prop_oneof![
        prop::collection::vec(any::<i64>(), 0..300),
        prop::collection::vec(0i64..(1 << 40), 0..300),
        prop::collection::vec((0i64..4096).prop_map(|v| v << 20), 0..300),
    ]
}

fn sort_config() -> impl Strategy<Value = SortConfig> {
    (0usize..16, 0usize..200).prop_map(|(insertion_max, radix_max)| SortConfig {
        insertion_max,
        radix_max,
    })
}

fn sorted<T: Ord>(mut v: Vec<T>) -> Vec<T> {
    v.sort_unstable();
    v
}

/// Keys must be in `order`, and `values` must still name each key's original
/// position.
fn check_paired<K: Ord + Copy + std::fmt::Debug>(
    original: &[K],
    keys: &[K],
    positions: &[i32],
    order: Order,
) -> std::result::Result<(), TestCaseError> {
    for w in keys.windows(2) {
        let in_order = match order {
            Order::Ascending => w[0] <= w[1],
            Order::Descending => w[0] >= w[1],
        };
        prop_assert!(in_order, "{:?} placed before {:?}", w[0], w[1]);
    }
    for (key, &pos) in keys.iter().zip(positions) {
        prop_assert_eq!(*key, original[pos as usize]);
    }
    let expected: Vec<i32> = (0..original.len() as i32).collect();
    prop_assert_eq!(sorted(positions.to_vec()), expected);
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        max_shrink_iters: 50_000,
        .. ProptestConfig::default()
    })]

    #[test]
    fn prop_set_int_equivalence(ops in prop::collection::vec(any::<SetOp>(), 0..=2000)) {
        let mut set = SetInt::with_capacity(4);
        let mut model = HashSet::new();

        for op in ops {
            match op {
                SetOp::Add(k) => {
                    prop_assert_eq!(set.add(k), model.insert(k));
                }
                SetOp::Remove(k) => {
                    prop_assert_eq!(set.remove(k), model.remove(&k));
                    set.validate();
                }
                SetOp::Contains(k) => {
                    prop_assert_eq!(set.contains(k), model.contains(&k));
                }
                SetOp::Clear => {
                    set.clear();
                    model.clear();
                }
            }
            prop_assert_eq!(set.len(), model.len());
        }

        set.validate();
        prop_assert_eq!(sorted(set.to_array()), sorted(model.into_iter().collect()));
    }

    #[test]
    fn prop_set_long_equivalence(ops in long_set_ops()) {
        let mut set = SetLong::new();
        let mut model = HashSet::new();

        for op in ops {
            match op {
                MapOp::Put(k, _) => {
                    prop_assert_eq!(set.add(k), model.insert(k));
                }
                MapOp::Remove(k) => {
                    prop_assert_eq!(set.remove(k), model.remove(&k));
                    set.validate();
                }
                MapOp::Get(k) => {
                    prop_assert_eq!(set.contains(k), model.contains(&k));
                }
                MapOp::Clear => {
                    set.clear();
                    model.clear();
                }
            }
            prop_assert_eq!(set.len(), model.len());
        }

        set.validate();
        prop_assert_eq!(sorted(set.iter().collect()), sorted(model.into_iter().collect()));
    }

    #[test]
    fn prop_int_long_map_equivalence(ops in prop::collection::vec(any::<IntLongOp>(), 0..=2000)) {
        let mut map = HashMapIntLong::with_capacity(1);
        let mut model = HashMap::new();

        for op in ops {
            match op {
                IntLongOp::Put(k, v) => {
                    prop_assert_eq!(map.put(k, v), model.insert(k, v));
                }
                IntLongOp::Remove(k) => {
                    prop_assert_eq!(map.remove(k), model.remove(&k));
                    map.validate();
                }
                IntLongOp::Get(k) => {
                    prop_assert_eq!(map.get(k).ok(), model.get(&k).copied());
                    prop_assert_eq!(map.contains_key(k), model.contains_key(&k));
                }
                IntLongOp::Clear => {
                    map.clear();
                    model.clear();
                }
            }
            prop_assert_eq!(map.len(), model.len());
        }

        map.validate();
        let snapshot: HashMap<i32, i64> = map
            .get_all_keys()
            .into_iter()
            .zip(map.get_all_values())
            .collect();
        prop_assert_eq!(snapshot, model);
    }

    #[test]
    fn prop_long_object_map_equivalence(ops in long_object_ops()) {
        let mut map: HashMapLongObject<String> = HashMapLongObject::new();
        let mut model: HashMap<i64, String> = HashMap::new();

        for op in ops {
            match op {
                MapOp::Put(k, v) => {
                    prop_assert_eq!(map.put(k, v.to_string()), model.insert(k, v.to_string()));
                }
                MapOp::Remove(k) => {
                    prop_assert_eq!(map.remove(k), model.remove(&k));
                    map.validate();
                }
                MapOp::Get(k) => {
                    prop_assert_eq!(map.get(k).ok(), model.get(&k));
                }
                MapOp::Clear => {
                    map.clear();
                    model.clear();
                }
            }
            prop_assert_eq!(map.len(), model.len());
        }

        map.validate();
        for (k, v) in map.iter() {
            prop_assert_eq!(Some(v), model.get(&k));
        }
    }

    #[test]
    fn prop_object_long_map_equivalence(ops in string_map_ops()) {
        let mut map: HashMapObjectLong<String> = HashMapObjectLong::new();
        let mut model: HashMap<String, i64> = HashMap::new();

        for op in ops {
            match op {
                MapOp::Put(k, v) => {
                    prop_assert_eq!(map.put(k.clone(), v), model.insert(k, v));
                }
                MapOp::Remove(k) => {
                    prop_assert_eq!(map.remove(k.as_str()), model.remove(&k));
                    map.validate();
                }
                MapOp::Get(k) => {
                    prop_assert_eq!(map.get(k.as_str()).ok(), model.get(&k).copied());
                }
                MapOp::Clear => {
                    map.clear();
                    model.clear();
                }
            }
            prop_assert_eq!(map.len(), model.len());
        }

        map.validate();
        let snapshot: HashMap<String, i64> = map.iter().map(|(k, v)| (k.clone(), v)).collect();
        prop_assert_eq!(snapshot, model);
    }

    #[test]
    fn prop_queue_fifo(
        initial in 0usize..4,
        ops in prop::collection::vec(any::<QueueOp>(), 0..=2000),
    ) {
        let mut queue = QueueInt::new(initial);
        let mut model = VecDeque::new();

        for op in ops {
            match op {
                QueueOp::Put(v) => {
                    queue.put(v);
                    model.push_back(v);
                }
                QueueOp::Get => {
                    prop_assert_eq!(queue.get().ok(), model.pop_front());
                }
                QueueOp::Peek => {
                    prop_assert_eq!(queue.peek().ok(), model.front().copied());
                }
            }
            prop_assert_eq!(queue.len(), model.len());
        }

        prop_assert!(queue.iter().eq(model.iter().copied()));
    }

    #[test]
    fn prop_compressed_int_roundtrip(values in int_values()) {
        let packed = ArrayIntCompressed::from_slice(&values);
        prop_assert_eq!(packed.len(), values.len());
        for (i, &v) in values.iter().enumerate() {
            prop_assert_eq!(packed.get(i).ok(), Some(v));
        }

        let decoded =
            ArrayIntCompressed::from_bytes_with_len(&packed.to_byte_array(), values.len());
        prop_assert!(decoded.is_ok());
        if let Ok(decoded) = decoded {
            prop_assert_eq!(decoded.layout(), packed.layout());
            prop_assert_eq!(decoded.iter().collect::<Vec<_>>(), values);
        }
    }

    #[test]
    fn prop_compressed_long_roundtrip(values in long_values()) {
        let packed = ArrayLongCompressed::from_slice(&values);
        prop_assert!(packed.layout().bits_per_element >= 1);
        prop_assert!(packed.iter().eq(values.iter().copied()));

        let decoded =
            ArrayLongCompressed::from_bytes_with_len(&packed.to_byte_array(), values.len());
        prop_assert!(decoded.is_ok());
        if let Ok(decoded) = decoded {
            prop_assert_eq!(decoded.iter().collect::<Vec<_>>(), values);
        }
    }

    #[test]
    fn prop_compressed_set_matches_vec(
        values in prop::collection::vec(0i32..1024, 1..200),
        writes in prop::collection::vec((any::<prop::sample::Index>(), 0i32..1024), 0..200),
    ) {
        let mut packed = ArrayIntCompressed::with_layout(values.len(), 10, 0)?;
        let mut model = vec![0i32; values.len()];
        for (i, &v) in values.iter().enumerate() {
            packed.set(i, v)?;
            model[i] = v;
        }
        for (index, v) in writes {
            let i = index.index(model.len());
            packed.set(i, v)?;
            model[i] = v;
        }
        prop_assert_eq!(packed.iter().collect::<Vec<_>>(), model);
    }

    #[test]
    fn prop_sort_ascending(
        keys in prop_oneof![
            prop::collection::vec(any::<i32>(), 0..600),
            prop::collection::vec(-8i32..8, 0..600),
        ],
        config in sort_config(),
    ) {
        let original = keys.clone();
        let mut keys = keys;
        let mut positions: Vec<i32> = (0..keys.len() as i32).collect();
        sort::sort_with(&mut keys, &mut positions, &config)?;
        check_paired(&original, &keys, &positions, Order::Ascending)?;
    }

    #[test]
    fn prop_sort_descending(
        keys in prop_oneof![
            prop::collection::vec(any::<i64>(), 0..600),
            prop::collection::vec(-8i64..8, 0..600),
        ],
        config in sort_config(),
    ) {
        let original = keys.clone();
        let mut keys = keys;
        let mut positions: Vec<i32> = (0..keys.len() as i32).collect();
        sort::sort_desc_with(&mut keys, &mut positions, &config)?;
        check_paired(&original, &keys, &positions, Order::Descending)?;
    }

    #[test]
    fn prop_bitfield_bools(bits in prop::collection::vec(any::<bool>(), 1..300)) {
        let field = ConcurrentBitField::from_bools(&bits)?;
        prop_assert_eq!(field.to_bools_non_atomic(), bits.clone());

        for (i, &b) in bits.iter().enumerate() {
            prop_assert!(field.compare_and_set(i, b, !b));
        }
        let flipped: Vec<bool> = bits.iter().map(|b| !b).collect();
        prop_assert_eq!(field.to_bools_non_atomic(), flipped);
    }
}

// =============================================================================
// Exhaustive orderings over a colliding key set
// =============================================================================

fn for_each_permutation<T: Clone>(items: &[T], mut f: impl FnMut(Vec<T>)) {
    fn rec<T: Clone>(items: &[T], used: &mut [bool], out: &mut Vec<T>, f: &mut impl FnMut(Vec<T>)) {
        if out.len() == items.len() {
            f(out.clone());
            return;
        }
        for i in 0..items.len() {
            if used[i] {
                continue;
            }
            used[i] = true;
            out.push(items[i].clone());
            rec(items, used, out, f);
            out.pop();
            used[i] = false;
        }
    }

    let mut used = vec![false; items.len()];
    let mut out = Vec::with_capacity(items.len());
    rec(items, &mut used, &mut out, &mut f);
}

// Capacity 11 holds up to 8 keys; every multiple of 11 shares home slot 0, the
// rest land in between and get displaced by the chain.
const COLLIDING: [i32; 7] = [0, 11, 22, 33, 3, 6, 44];

#[test]
fn exhaustive_insert_order_colliding_keys() {
    for_each_permutation(&COLLIDING, |order| {
        let mut set = SetInt::with_capacity(10);
        for &k in &order {
            assert!(set.add(k), "order {order:?}: {k} already present");
            set.validate();
        }
        assert_eq!(set.len(), COLLIDING.len());
        for k in COLLIDING {
            assert!(set.contains(k), "order {order:?}: lost {k}");
        }
        assert!(!set.contains(55));
    });
}

#[test]
fn exhaustive_remove_order_colliding_keys() {
    for_each_permutation(&COLLIDING, |order| {
        let mut map = HashMapIntLong::with_capacity(10);
        for k in COLLIDING {
            map.put(k, i64::from(k) * 100);
        }

        for (removed, &k) in order.iter().enumerate() {
            assert_eq!(map.remove(k), Some(i64::from(k) * 100), "order {order:?}");
            map.validate();
            assert_eq!(map.len(), COLLIDING.len() - removed - 1);
            for &rest in &order[removed + 1..] {
                assert_eq!(
                    map.get(rest).ok(),
                    Some(i64::from(rest) * 100),
                    "order {order:?}: lost {rest} after removing {k}"
                );
            }
            assert!(!map.contains_key(k));
        }
        assert!(map.is_empty());
    });
}
