use std::collections::HashMap;
use std::sync::Arc;
use std::thread;

use keyset_query::cache::{Cache, KeyValueCache};
use keyset_query::evaluator::{EvalError, eval, eval_query};
use keyset_query::parser::parse_query;
use keyset_query::sets::{StringSet, UInt32Set};
use rstest::{fixture, rstest};

#[fixture]
fn cache() -> KeyValueCache {
    let cache = KeyValueCache::new();
    cache.update_uint32_value_set("A", &[1, 2, 3], 1);
    cache.update_uint32_value_set("B", &[2, 3, 4], 1);
    cache.update_uint32_value_set("C", &[3, 4, 5, 6], 1);
    cache.update_uint32_value_set("D", &[4, 6, 8], 1);
    cache.update_uint32_value_set("EMPTY", &[], 1);
    cache.update_value_set("A", &["1", "2", "3"], 1);
    cache.update_value_set("B", &["2", "3", "4"], 1);
    cache
}

fn eval_u32(cache: &KeyValueCache, text: &str) -> Result<Vec<u32>, EvalError> {
    let query = parse_query(text).unwrap();
    let mut sets = cache.get_uint32_value_sets(&query.keys());
    let result: UInt32Set = eval_query(&query, &mut sets)?;
    Ok(result.iter().collect())
}

fn eval_strings(cache: &KeyValueCache, text: &str) -> Result<Vec<String>, EvalError> {
    let query = parse_query(text).unwrap();
    let mut sets = cache.get_value_sets(&query.keys());
    let result: StringSet = eval_query(&query, &mut sets)?;
    let mut values: Vec<String> = result.into_iter().collect();
    values.sort();
    Ok(values)
}

// ============================================================================
// Basic operators
// ============================================================================

#[rstest]
#[case("A & B", vec![2, 3])]
#[case("A - B", vec![1])]
#[case("B - A", vec![4])]
#[case("A | B", vec![1, 2, 3, 4])]
#[case("A", vec![1, 2, 3])]
#[case("(A - B) | (C & D)", vec![1, 4, 6])]
#[case("A - B | C & D", vec![1, 4, 6])]
#[case("A | B & C", vec![1, 2, 3, 4])]
#[case("(A | B) & C", vec![3, 4])]
#[case("A - B - C", vec![1])]
#[case("A - (B - C)", vec![1, 3])]
#[case("A & EMPTY", vec![])]
#[case("A | EMPTY", vec![1, 2, 3])]
fn test_uint32_queries(cache: KeyValueCache, #[case] text: &str, #[case] expected: Vec<u32>) {
    assert_eq!(eval_u32(&cache, text).unwrap(), expected);
}

#[rstest]
fn test_string_queries(cache: KeyValueCache) {
    assert_eq!(eval_strings(&cache, "A & B").unwrap(), vec!["2", "3"]);
    assert_eq!(eval_strings(&cache, "A - B").unwrap(), vec!["1"]);
    assert_eq!(eval_strings(&cache, "A | B").unwrap(), vec!["1", "2", "3", "4"]);
}

// ============================================================================
// Missing keys
// ============================================================================

#[rstest]
fn test_missing_key_is_an_error(cache: KeyValueCache) {
    assert_eq!(
        eval_u32(&cache, "A | MISSING"),
        Err(EvalError::KeyNotFound("MISSING".to_string()))
    );
}

#[rstest]
fn test_empty_set_is_not_missing(cache: KeyValueCache) {
    assert_eq!(eval_u32(&cache, "EMPTY").unwrap(), Vec::<u32>::new());
}

#[rstest]
fn test_representations_are_independent(cache: KeyValueCache) {
    // C only exists as a u32 set.
    assert_eq!(
        eval_strings(&cache, "A & C"),
        Err(EvalError::KeyNotFound("C".to_string()))
    );
}

#[rstest]
fn test_missing_key_error_message(cache: KeyValueCache) {
    let err = eval_u32(&cache, "NOPE").unwrap_err();
    assert_eq!(err.to_string(), "Key not found: NOPE");
}

// ============================================================================
// Resolution order
// ============================================================================

#[test]
fn test_leaves_resolve_once_left_to_right() {
    let query = parse_query("(A - B) | (C & A)").unwrap();
    let mut seen = Vec::new();
    let result: UInt32Set = eval(query.root(), &mut |key: &str| -> Result<UInt32Set, EvalError> {
        seen.push(key.to_string());
        Ok(UInt32Set::from_iter([key.len() as u32]))
    })
    .unwrap();
    assert_eq!(seen, vec!["A", "B", "C", "A"]);
    assert_eq!(result.len(), 1);
}

#[test]
fn test_resolution_stops_at_first_failure() {
    let query = parse_query("A | B | C").unwrap();
    let mut calls = 0;
    let result: Result<UInt32Set, _> = eval(query.root(), &mut |key: &str| {
        calls += 1;
        match key {
            "B" => Err(EvalError::KeyNotFound(key.to_string())),
            _ => Ok(UInt32Set::new()),
        }
    });
    assert!(result.is_err());
    assert_eq!(calls, 2);
}

// ============================================================================
// Concurrent evaluation
// ============================================================================

#[test]
fn test_one_tree_many_resolvers() {
    let query = Arc::new(parse_query("A & B").unwrap());

    let handles: Vec<_> = (0..8u32)
        .map(|i| {
            let query = Arc::clone(&query);
            thread::spawn(move || {
                let data: HashMap<&str, UInt32Set> = HashMap::from([
                    ("A", UInt32Set::from_iter(0..=i)),
                    ("B", UInt32Set::from_iter(i..100)),
                ]);
                let result: UInt32Set = eval(query.root(), &mut |key: &str| {
                    data.get(key)
                        .cloned()
                        .ok_or_else(|| EvalError::KeyNotFound(key.to_string()))
                })
                .unwrap();
                (i, result.iter().collect::<Vec<_>>())
            })
        })
        .collect();

    for handle in handles {
        let (i, result) = handle.join().unwrap();
        assert_eq!(result, vec![i]);
    }
}
