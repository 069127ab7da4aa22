use std::cell::Cell;
use std::collections::BTreeMap;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::ops::Bound;
use std::rc::Rc;

use bstree::{BSTreeMap, Bounded, Error, InOrder, Natural, NodeAllocator, Plain, PreOrder};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

/// The number of operations to perform in each proptest case.
///
/// The tree is unbalanced, so sorted runs cost linear time per operation.
const TEST_SIZE: usize = 2_000;

/// Generates keys in a range small enough to cause collisions.
fn key_strategy() -> impl Strategy<Value = i64> {
    -1_000i64..1_000i64
}

fn value_strategy() -> impl Strategy<Value = i64> {
    any::<i64>()
}

fn sample() -> BSTreeMap<i32, i32> {
    [10, 5, 15, 3, 7].into_iter().map(|k| (k, k * 10)).collect()
}

fn in_order<V>(map: &BSTreeMap<i32, V>) -> Vec<i32> {
    map.keys().copied().collect()
}

fn pre_order<V>(map: &BSTreeMap<i32, V>) -> Vec<i32> {
    map.pre_order().map(|(k, _)| *k).collect()
}

/// Counts live nodes in one pool shared by every clone, up to a common limit.
#[derive(Clone, Debug)]
struct Pool {
    live: Rc<Cell<usize>>,
    limit: usize,
}

impl Pool {
    fn new(limit: usize) -> Self {
        Self {
            live: Rc::default(),
            limit,
        }
    }

    fn live(&self) -> usize {
        self.live.get()
    }
}

impl NodeAllocator for Pool {
    fn allocate(&mut self, count: usize) -> bstree::Result<()> {
        let live = self.live.get() + count;
        if live > self.limit {
            return Err(Error::AllocationFailed);
        }
        self.live.set(live);
        Ok(())
    }

    fn deallocate(&mut self, count: usize) {
        let live = self.live.get().checked_sub(count).expect("pool returned more nodes than it granted");
        self.live.set(live);
    }
}

type Pooled<K> = BSTreeMap<K, K, Natural, Plain, Pool>;

fn pooled<K: Ord + Copy>(pool: &Pool, keys: &[K]) -> Pooled<K> {
    let mut map = BSTreeMap::with_parts(Natural, pool.clone());
    map.try_extend(keys.iter().map(|&k| (k, k))).unwrap();
    map
}

// ─── Operations enum for driving randomized tests ────────────────────────────

#[derive(Debug, Clone)]
enum MapOp {
    Insert(i64, i64),
    InsertOrAssign(i64, i64),
    Erase(i64),
    Remove(i64),
    Get(i64),
    At(i64),
    LowerBound(i64),
    UpperBound(i64),
    FirstKeyValue,
    LastKeyValue,
    PopFirst,
    PopLast,
}

fn map_op_strategy() -> impl Strategy<Value = MapOp> {
    prop_oneof![
        4 => (key_strategy(), value_strategy()).prop_map(|(k, v)| MapOp::Insert(k, v)),
        2 => (key_strategy(), value_strategy()).prop_map(|(k, v)| MapOp::InsertOrAssign(k, v)),
        2 => key_strategy().prop_map(MapOp::Erase),
        2 => key_strategy().prop_map(MapOp::Remove),
        2 => key_strategy().prop_map(MapOp::Get),
        1 => key_strategy().prop_map(MapOp::At),
        1 => key_strategy().prop_map(MapOp::LowerBound),
        1 => key_strategy().prop_map(MapOp::UpperBound),
        1 => Just(MapOp::FirstKeyValue),
        1 => Just(MapOp::LastKeyValue),
        1 => Just(MapOp::PopFirst),
        1 => Just(MapOp::PopLast),
    ]
}

// ─── Core CRUD operations ────────────────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(20))]

    /// Replays a random sequence of operations on both BSTreeMap and BTreeMap
    /// and asserts identical results at every step.
    #[test]
    fn map_ops_match_btreemap(ops in proptest::collection::vec(map_op_strategy(), TEST_SIZE)) {
        let mut bs_map: BSTreeMap<i64, i64> = BSTreeMap::new();
        let mut bt_map: BTreeMap<i64, i64> = BTreeMap::new();

        for op in &ops {
            match op {
                MapOp::Insert(k, v) => {
                    let inserted = {
                        let (cursor, inserted) = bs_map.insert(*k, *v).unwrap();
                        prop_assert_eq!(cursor.key(), Ok(k));
                        inserted
                    };
                    let vacant = !bt_map.contains_key(k);
                    bt_map.entry(*k).or_insert(*v);
                    prop_assert_eq!(inserted, vacant, "insert({}, {})", k, v);
                }
                MapOp::InsertOrAssign(k, v) => {
                    let cursor = bs_map.insert_or_assign(*k, *v).unwrap();
                    prop_assert_eq!(cursor.get(), Ok((k, v)));
                    bt_map.insert(*k, *v);
                }
                MapOp::Erase(k) => {
                    let expected = usize::from(bt_map.remove(k).is_some());
                    prop_assert_eq!(bs_map.erase(k), expected, "erase({})", k);
                }
                MapOp::Remove(k) => {
                    prop_assert_eq!(bs_map.remove(k), bt_map.remove(k), "remove({})", k);
                }
                MapOp::Get(k) => {
                    prop_assert_eq!(bs_map.get(k), bt_map.get(k), "get({})", k);
                    prop_assert_eq!(bs_map.find(k).value().ok(), bt_map.get(k), "find({})", k);
                }
                MapOp::At(k) => {
                    prop_assert_eq!(bs_map.at(k), bt_map.get(k).ok_or(Error::KeyNotFound), "at({})", k);
                }
                MapOp::LowerBound(k) => {
                    let expected = bt_map.range(*k..).next().map(|(k, _)| k);
                    prop_assert_eq!(bs_map.lower_bound(k).key().ok(), expected, "lower_bound({})", k);
                }
                MapOp::UpperBound(k) => {
                    let expected = bt_map.range((Bound::Excluded(*k), Bound::Unbounded)).next().map(|(k, _)| k);
                    prop_assert_eq!(bs_map.upper_bound(k).key().ok(), expected, "upper_bound({})", k);
                }
                MapOp::FirstKeyValue => {
                    prop_assert_eq!(bs_map.first_key_value(), bt_map.first_key_value());
                }
                MapOp::LastKeyValue => {
                    prop_assert_eq!(bs_map.last_key_value(), bt_map.last_key_value());
                }
                MapOp::PopFirst => {
                    prop_assert_eq!(bs_map.pop_first(), bt_map.pop_first());
                }
                MapOp::PopLast => {
                    prop_assert_eq!(bs_map.pop_last(), bt_map.pop_last());
                }
            }
            prop_assert_eq!(bs_map.len(), bt_map.len());
            prop_assert_eq!(bs_map.is_empty(), bt_map.is_empty());
        }

        prop_assert!(bs_map.iter().eq(bt_map.iter()));
    }

    /// Iteration yields the same entries in the same order as BTreeMap, from both ends.
    #[test]
    fn iter_matches_btreemap(entries in proptest::collection::vec((key_strategy(), value_strategy()), 0..TEST_SIZE)) {
        let bs_map: BSTreeMap<i64, i64> = entries.iter().copied().collect();
        let bt_map: BTreeMap<i64, i64> = entries.iter().copied().collect();

        prop_assert_eq!(bs_map.iter().len(), bt_map.len());
        prop_assert!(bs_map.iter().eq(bt_map.iter()));
        prop_assert!(bs_map.iter().rev().eq(bt_map.iter().rev()));
        prop_assert!(bs_map.keys().eq(bt_map.keys()));
        prop_assert!(bs_map.values().eq(bt_map.values()));
        prop_assert!(bs_map.clone().into_iter().eq(bt_map.clone().into_iter()));
    }

    #[test]
    fn range_matches_btreemap(
        entries in proptest::collection::vec((key_strategy(), value_strategy()), 0..TEST_SIZE),
        a in key_strategy(),
        b in key_strategy(),
    ) {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        let bs_map: BSTreeMap<i64, i64> = entries.iter().copied().collect();
        let bt_map: BTreeMap<i64, i64> = entries.iter().copied().collect();

        prop_assert!(bs_map.range(lo..hi).eq(bt_map.range(lo..hi)));
        prop_assert!(bs_map.range(lo..=hi).eq(bt_map.range(lo..=hi)));
        prop_assert!(bs_map.range(lo..).rev().eq(bt_map.range(lo..).rev()));
        prop_assert!(bs_map.range(..hi).eq(bt_map.range(..hi)));
    }

    #[test]
    fn erase_range_matches_btreemap(
        entries in proptest::collection::vec((key_strategy(), value_strategy()), 0..TEST_SIZE),
        a in key_strategy(),
        b in key_strategy(),
    ) {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        let mut bs_map: BSTreeMap<i64, i64> = entries.iter().copied().collect();
        let mut bt_map: BTreeMap<i64, i64> = entries.iter().copied().collect();

        let expected = bt_map.range(lo..=hi).count();
        bt_map.retain(|k, _| !(lo..=hi).contains(k));
        prop_assert_eq!(bs_map.erase_range(lo..=hi), expected);
        prop_assert!(bs_map.iter().eq(bt_map.iter()));
    }

    #[test]
    fn retain_matches_btreemap(entries in proptest::collection::vec((key_strategy(), value_strategy()), 0..TEST_SIZE)) {
        let mut bs_map: BSTreeMap<i64, i64> = entries.iter().copied().collect();
        let mut bt_map: BTreeMap<i64, i64> = entries.iter().copied().collect();

        bs_map.retain(|k, v| { *v = v.wrapping_add(1); k % 3 != 0 });
        bt_map.retain(|k, v| { *v = v.wrapping_add(1); k % 3 != 0 });
        prop_assert!(bs_map.iter().eq(bt_map.iter()));
    }

    #[test]
    fn iter_mut_matches(entries in proptest::collection::vec((key_strategy(), value_strategy()), 0..TEST_SIZE)) {
        let mut bs_map: BSTreeMap<i64, i64> = entries.iter().copied().collect();
        let mut bt_map: BTreeMap<i64, i64> = entries.iter().copied().collect();

        for (k, v) in &mut bs_map {
            *v = v.wrapping_mul(*k);
        }
        for (k, v) in &mut bt_map {
            *v = v.wrapping_mul(*k);
        }
        for v in bs_map.values_mut().rev() {
            *v = v.wrapping_sub(1);
        }
        for v in bt_map.values_mut().rev() {
            *v = v.wrapping_sub(1);
        }
        prop_assert!(bs_map.iter().eq(bt_map.iter()));
    }

    /// Clearing releases every node back to the allocator.
    #[test]
    fn clear_returns_budget(keys in proptest::collection::vec(key_strategy(), 0..TEST_SIZE)) {
        let mut map = BSTreeMap::with_allocator(Bounded::new(TEST_SIZE));
        let inserted = map.try_extend(keys.iter().map(|&k| (k, ()))).unwrap();
        prop_assert_eq!(map.allocator().in_use(), inserted);

        map.clear();
        prop_assert!(map.is_empty());
        prop_assert_eq!(map.allocator().in_use(), 0);
        prop_assert_eq!(map.iter().next(), None);
    }

    #[test]
    fn pool_balances_across_clone_erase_and_drop(
        keys in proptest::collection::vec(key_strategy(), 0..TEST_SIZE),
        doomed in proptest::collection::vec(key_strategy(), 0..TEST_SIZE / 4),
    ) {
        let pool = Pool::new(usize::MAX / 2);
        let mut map = pooled(&pool, &keys);
        prop_assert_eq!(pool.live(), map.len());

        let copy = map.clone();
        for k in &doomed {
            map.remove(k);
        }
        prop_assert_eq!(pool.live(), map.len() + copy.len());

        let drained = copy.into_iter().count();
        prop_assert_eq!(pool.live(), map.len());
        prop_assert!(drained >= map.len());

        drop(map);
        prop_assert_eq!(pool.live(), 0);
    }

    #[test]
    fn hash_consistent_for_equal_maps(entries in proptest::collection::vec((key_strategy(), value_strategy()), 0..TEST_SIZE)) {
        let forward: BSTreeMap<i64, i64> = entries.iter().copied().collect();
        // Same contents, different shape.
        let mut sorted: Vec<_> = forward.iter().map(|(k, v)| (*k, *v)).collect();
        sorted.reverse();
        let backward: BSTreeMap<i64, i64> = sorted.into_iter().collect();

        let hash = |map: &BSTreeMap<i64, i64>| {
            let mut hasher = DefaultHasher::new();
            map.hash(&mut hasher);
            hasher.finish()
        };
        prop_assert_eq!(&forward, &backward);
        prop_assert_eq!(hash(&forward), hash(&backward));
    }
}

// ─── Worked examples ─────────────────────────────────────────────────────────

#[test]
fn insert_builds_expected_shape() {
    let map = sample();
    assert_eq!(in_order(&map), [3, 5, 7, 10, 15]);
    assert_eq!(pre_order(&map), [10, 5, 3, 7, 15]);
    assert_eq!(map.len(), 5);
}

#[test]
fn erase_two_child_node_promotes_successor() {
    let mut map = sample();
    let five = map.find(&5).handle().unwrap();
    let seven = map.find(&7).handle().unwrap();

    assert_eq!(map.erase(&5), 1);
    assert_eq!(in_order(&map), [3, 7, 10, 15]);
    assert_eq!(pre_order(&map), [10, 7, 3, 15]);
    assert_eq!(map.len(), 4);

    // The node that held 5 now holds 7 with its value; 7's old node is gone.
    assert_eq!(map.structure().key(five), Ok(&7));
    assert_eq!(map.structure().value(five), Ok(&70));
    assert_eq!(map.structure().key(seven), Err(Error::StaleHandle));
}

#[test]
fn erase_leaf() {
    let mut map = sample();
    assert_eq!(map.erase(&3), 1);
    assert_eq!(in_order(&map), [5, 7, 10, 15]);
    assert_eq!(map.len(), 4);
    assert_eq!(map.erase(&3), 0);
    assert_eq!(map.len(), 4);
}

#[test]
fn erase_root_with_one_child() {
    let mut map: BSTreeMap<i32, i32> = [1, 2, 3].into_iter().map(|k| (k, k)).collect();
    assert_eq!(map.remove(&1), Some(1));
    assert_eq!(pre_order(&map), [2, 3]);
    assert_eq!(map.remove(&2), Some(2));
    assert_eq!(map.remove(&3), Some(3));
    assert!(map.is_empty());
    assert_eq!(map.structure().root(), None);
}

#[test]
fn find_missing_is_end() {
    let map = sample();
    let cursor = map.find(&99);
    assert!(cursor.is_end());
    assert_eq!(cursor, map.cursor_end());
    assert_eq!(cursor.get(), Err(Error::OutOfRange));
    assert_eq!(cursor.depth(), None);
}

#[test]
fn at_reports_missing_keys() {
    let mut map = sample();
    assert_eq!(map.at(&7), Ok(&70));
    assert_eq!(map.at(&8), Err(Error::KeyNotFound));

    *map.at_mut(&7).unwrap() += 1;
    assert_eq!(map[&7], 71);
    assert_eq!(map.at_mut(&8), Err(Error::KeyNotFound));
}

#[test]
#[should_panic(expected = "no entry found for key")]
fn index_missing_key_panics() {
    let map = sample();
    let _ = map[&8];
}

#[test]
fn insert_keeps_existing_value() {
    let mut map = sample();
    let (mut cursor, inserted) = map.insert(5, 0).unwrap();
    assert!(!inserted);
    assert_eq!(cursor.get(), Ok((&5, &50)));
    *cursor.value_mut().unwrap() = 55;
    assert_eq!(map.get(&5), Some(&55));

    let cursor = map.insert_or_assign(5, 0).unwrap();
    assert_eq!(cursor.get(), Ok((&5, &0)));
    assert_eq!(map.len(), 5);
}

#[test]
fn cursor_mut_erases_in_order() {
    let mut map: BSTreeMap<i32, i32> = [50, 30, 70, 20, 40, 60, 80].into_iter().map(|k| (k, k)).collect();
    let mut cursor = map.cursor_first_mut::<InOrder>();
    let mut removed = Vec::new();
    while let Ok((key, _)) = cursor.get() {
        if key % 20 == 0 {
            removed.push(cursor.remove_current().unwrap());
        } else {
            cursor.move_next().unwrap();
        }
    }
    assert_eq!(cursor.remove_current(), Err(Error::OutOfRange));
    assert_eq!(removed, [(20, 20), (40, 40), (60, 60), (80, 80)]);
    assert_eq!(in_order(&map), [30, 50, 70]);
}

#[test]
fn allocation_failure_leaves_map_unchanged() {
    let mut map = BSTreeMap::with_allocator(Bounded::new(3));
    for key in [2, 1, 3] {
        map.insert(key, key).unwrap();
    }
    let shape: Vec<_> = map.traverse::<PreOrder>().map(|(k, v)| (*k, *v)).collect();

    assert_eq!(map.insert(4, 4).err(), Some(Error::AllocationFailed));
    assert_eq!(map.insert_or_assign(0, 0).err(), Some(Error::AllocationFailed));
    assert_eq!(map.len(), 3);
    assert_eq!(map.allocator().in_use(), 3);
    assert!(map.traverse::<PreOrder>().map(|(k, v)| (*k, *v)).eq(shape));

    // Existing keys need no allocation.
    assert!(map.insert_or_assign(1, 10).is_ok());
    assert_eq!(map.get(&1), Some(&10));
}

#[test]
#[should_panic(expected = "`BSTreeMap::extend()` - node allocation failed")]
fn extend_panics_on_allocation_failure() {
    let mut map = BSTreeMap::with_allocator(Bounded::new(1));
    map.extend([(1, ()), (2, ())]);
}

#[test]
fn extend_overwrites_like_btreemap() {
    let mut map = BSTreeMap::from([(1, 'a'), (2, 'b')]);
    map.extend([(2, 'x'), (3, 'c')]);
    map.extend([(&4, &'d')]);
    assert!(map.into_iter().eq([(1, 'a'), (2, 'x'), (3, 'c'), (4, 'd')]));
}

#[test]
fn swap_and_clear() {
    let mut a = sample();
    let mut b = BSTreeMap::from([(1, 1)]);
    a.swap(&mut b);
    assert_eq!(in_order(&a), [1]);
    assert_eq!(in_order(&b), [3, 5, 7, 10, 15]);

    b.clear();
    assert!(b.is_empty());
    assert_eq!(b.first_key_value(), None);
    b.insert(4, 4).unwrap();
    assert_eq!(in_order(&b), [4]);
}

#[test]
fn debug_and_ordering() {
    let map = BSTreeMap::from([(2, 'b'), (1, 'a')]);
    assert_eq!(format!("{map:?}"), "{1: 'a', 2: 'b'}");
    assert!(map < BSTreeMap::from([(1, 'a'), (3, 'a')]));
    assert_eq!(map.clone(), map);
    assert_eq!(BSTreeMap::<i32, i32>::default(), BSTreeMap::new());
}

#[test]
fn borrowed_key_lookups() {
    let mut map = BSTreeMap::new();
    map.insert(String::from("pear"), 1).unwrap();
    map.insert(String::from("apple"), 2).unwrap();
    assert_eq!(map.get("apple"), Some(&2));
    assert!(map.contains_key("pear"));
    assert_eq!(map.lower_bound("b").key().map(String::as_str), Ok("pear"));
    assert_eq!(map.remove_entry("pear"), Some((String::from("pear"), 1)));
}

// ─── Allocator accounting ────────────────────────────────────────────────────

#[test]
fn clone_is_charged_to_the_allocator() {
    let pool = Pool::new(16);
    let map = pooled(&pool, &[10, 5, 15, 3, 7]);
    assert_eq!(pool.live(), 5);

    let mut copy = map.clone();
    assert_eq!(pool.live(), 10);
    assert_eq!(copy, map);
    assert!(copy.pre_order().eq(map.pre_order()));

    drop(map);
    assert_eq!(pool.live(), 5);
    assert_eq!(copy.erase(&10), 1);
    assert_eq!(pool.live(), 4);
    copy.clear();
    assert_eq!(pool.live(), 0);
    drop(copy);
    assert_eq!(pool.live(), 0);
}

#[test]
fn try_clone_reports_refused_nodes() {
    let pool = Pool::new(8);
    let map = pooled(&pool, &[4, 2, 6, 1, 3]);
    assert_eq!(map.try_clone().err(), Some(Error::AllocationFailed));
    assert_eq!(pool.live(), 5);
    assert!(map.keys().copied().eq([1, 2, 3, 4, 6]));
}

#[test]
#[should_panic(expected = "`BSTreeMap::clone()` - ")]
fn clone_panics_when_allocator_refuses() {
    let pool = Pool::new(6);
    let map = pooled(&pool, &[1, 2, 3, 4]);
    let _copy = map.clone();
}

#[test]
fn bounded_clone_gets_its_own_budget() {
    let mut map = BSTreeMap::with_allocator(Bounded::new(3));
    map.try_extend([(2, 'b'), (1, 'a')]).unwrap();

    let mut copy = map.clone();
    assert_eq!(copy.allocator().in_use(), 2);
    copy.insert(3, 'c').unwrap();
    assert_eq!(copy.insert(4, 'd').err(), Some(Error::AllocationFailed));
    assert_eq!(map.allocator().in_use(), 2);
}

#[test]
fn drop_returns_every_node() {
    let pool = Pool::new(64);
    {
        let _map = pooled(&pool, &[8, 4, 12, 2, 6, 10, 14]);
        assert_eq!(pool.live(), 7);
    }
    assert_eq!(pool.live(), 0);

    let empty: Pooled<i32> = BSTreeMap::with_parts(Natural, pool.clone());
    drop(empty);
    assert_eq!(pool.live(), 0);
}

#[test]
fn into_iter_returns_every_node() {
    let pool = Pool::new(64);
    let map = pooled(&pool, &[2, 1, 3]);
    let mut iter = map.into_iter();
    assert_eq!(pool.live(), 0);
    assert_eq!(iter.next(), Some((1, 1)));
    drop(iter);
    assert_eq!(pool.live(), 0);
}

#[test]
fn swap_moves_allocators_with_contents() {
    let mut small = BSTreeMap::with_allocator(Bounded::new(2));
    let mut large = BSTreeMap::with_allocator(Bounded::new(8));
    small.insert(1, 'a').unwrap();
    large.try_extend([(5, 'e'), (6, 'f'), (7, 'g')]).unwrap();

    small.swap(&mut large);
    assert_eq!((small.allocator().limit(), small.allocator().in_use()), (8, 3));
    assert_eq!((large.allocator().limit(), large.allocator().in_use()), (2, 1));
    assert_eq!(large.insert(2, 'b').map(|(_, inserted)| inserted), Ok(true));
    assert_eq!(large.insert(3, 'c').err(), Some(Error::AllocationFailed));

    let pool = Pool::new(16);
    let mut one = pooled(&pool, &[1]);
    let mut two = pooled(&pool, &[2, 3]);
    one.swap(&mut two);
    drop(two);
    assert_eq!(pool.live(), 2);
    drop(one);
    assert_eq!(pool.live(), 0);
}

static_assertions::assert_impl_all!(BSTreeMap<i32, String>: Send, Sync, Clone, Default);
static_assertions::assert_impl_all!(bstree::IterMut<'static, i32, String>: Send);
