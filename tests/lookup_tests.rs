use keyset_query::cache::{Cache, KeyValueCache};
use keyset_query::config::Config;
use keyset_query::evaluator::EvalError;
use keyset_query::lookup::{LocalLookup, LookupError, LookupResponse, SingleLookupResult};
use keyset_query::parser::{ParseError, parse_query};
use keyset_query::query_cache::QueryCache;
use rstest::{fixture, rstest};

#[fixture]
fn cache() -> KeyValueCache {
    let cache = KeyValueCache::new();
    cache.update_key_value("key1", "value1", 1);
    cache.update_key_value("key2", "value2", 1);
    cache.update_value_set("someset", &["value1", "value2"], 1);
    cache.update_value_set("other", &["value2", "value3"], 1);
    cache.update_value_set("emptyset", &[], 1);
    cache.update_uint32_value_set("A", &[10, 20, 30, 40, 50], 1);
    cache.update_uint32_value_set("B", &[20, 40, 60], 1);
    cache
}

fn not_found(key: &str) -> SingleLookupResult {
    SingleLookupResult::NotFound(format!("Key not found: {key}"))
}

// ============================================================================
// Key-value lookups
// ============================================================================

#[rstest]
fn test_get_key_values_found(cache: KeyValueCache) {
    let lookup = LocalLookup::new(&cache);
    let response = lookup.get_key_values(&["key1", "key2"]);

    let expected = LookupResponse::from([
        ("key1".to_string(), SingleLookupResult::Value("value1".into())),
        ("key2".to_string(), SingleLookupResult::Value("value2".into())),
    ]);
    assert_eq!(response, expected);
}

#[rstest]
fn test_get_key_values_duplicate_keys(cache: KeyValueCache) {
    let lookup = LocalLookup::new(&cache);
    let response = lookup.get_key_values(&["key1", "key1"]);
    assert_eq!(response.len(), 1);
    assert_eq!(response["key1"], SingleLookupResult::Value("value1".into()));
}

#[rstest]
fn test_get_key_values_missing_key(cache: KeyValueCache) {
    let lookup = LocalLookup::new(&cache);
    let response = lookup.get_key_values(&["key1", "missing"]);
    assert_eq!(response["key1"], SingleLookupResult::Value("value1".into()));
    assert_eq!(response["missing"], not_found("missing"));
}

#[rstest]
fn test_empty_requests(cache: KeyValueCache) {
    let lookup = LocalLookup::new(&cache);
    assert!(lookup.get_key_values(&[]).is_empty());
    assert!(lookup.get_key_value_set(&[]).is_empty());
    assert!(lookup.get_uint32_value_set(&[]).is_empty());
}

// ============================================================================
// Set lookups
// ============================================================================

#[rstest]
fn test_get_key_value_set_found(cache: KeyValueCache) {
    let lookup = LocalLookup::new(&cache);
    let response = lookup.get_key_value_set(&["someset"]);
    assert_eq!(
        response["someset"],
        SingleLookupResult::KeysetValues(vec!["value1".into(), "value2".into()])
    );
}

#[rstest]
#[case("emptyset")]
#[case("missing")]
fn test_get_key_value_set_empty_or_missing(cache: KeyValueCache, #[case] key: &str) {
    let lookup = LocalLookup::new(&cache);
    let response = lookup.get_key_value_set(&[key]);
    assert_eq!(response[key], not_found(key));
}

#[rstest]
fn test_get_uint32_value_set(cache: KeyValueCache) {
    let lookup = LocalLookup::new(&cache);
    let response = lookup.get_uint32_value_set(&["A", "someset"]);
    assert_eq!(
        response["A"],
        SingleLookupResult::UInt32SetValues(vec![10, 20, 30, 40, 50])
    );
    assert_eq!(response["someset"], not_found("someset"));
}

// ============================================================================
// Queries
// ============================================================================

#[rstest]
fn test_run_query_single_set(cache: KeyValueCache) {
    let lookup = LocalLookup::new(&cache);
    assert_eq!(lookup.run_query("someset").unwrap(), vec!["value1", "value2"]);
}

#[rstest]
#[case("someset | other", vec!["value1", "value2", "value3"])]
#[case("someset & other", vec!["value2"])]
#[case("someset - other", vec!["value1"])]
#[case("someset - emptyset", vec!["value1", "value2"])]
fn test_run_query_operators(
    cache: KeyValueCache,
    #[case] query: &str,
    #[case] expected: Vec<&str>,
) {
    let lookup = LocalLookup::new(&cache);
    assert_eq!(lookup.run_query(query).unwrap(), expected);
}

#[rstest]
fn test_run_query_parse_error(cache: KeyValueCache) {
    let lookup = LocalLookup::new(&cache);
    let err = lookup.run_query("someset|(").unwrap_err();
    assert!(matches!(
        err,
        LookupError::InvalidQuery(ParseError::UnmatchedOpenParen { .. })
    ));
}

#[rstest]
fn test_run_query_missing_key(cache: KeyValueCache) {
    let lookup = LocalLookup::new(&cache);
    assert_eq!(
        lookup.run_query("someset & nothing"),
        Err(LookupError::Evaluation(EvalError::KeyNotFound(
            "nothing".to_string()
        )))
    );
}

#[rstest]
fn test_run_set_query_int(cache: KeyValueCache) {
    let lookup = LocalLookup::new(&cache);
    assert_eq!(lookup.run_set_query_int("A").unwrap(), vec![10, 20, 30, 40, 50]);
    assert_eq!(lookup.run_set_query_int("A - B").unwrap(), vec![10, 30, 50]);
    assert_eq!(lookup.run_set_query_int("B - A").unwrap(), vec![60]);
}

#[rstest]
fn test_run_set_query_int_parse_error(cache: KeyValueCache) {
    let lookup = LocalLookup::new(&cache);
    assert!(matches!(
        lookup.run_set_query_int("someset|("),
        Err(LookupError::InvalidQuery(_))
    ));
}

#[rstest]
fn test_queries_see_later_updates(cache: KeyValueCache) {
    let lookup = LocalLookup::with_query_cache(&cache, QueryCache::new(8));
    assert_eq!(lookup.run_set_query_int("A & B").unwrap(), vec![20, 40]);

    cache.update_uint32_value_set("B", &[10], 2);
    assert_eq!(lookup.run_set_query_int("A & B").unwrap(), vec![10]);
}

#[rstest]
fn test_lookup_through_trait_object(cache: KeyValueCache) {
    let dyn_cache: &dyn Cache = &cache;
    let lookup = LocalLookup::new(dyn_cache);
    assert_eq!(lookup.run_set_query_int("A | B").unwrap().len(), 6);
}

#[rstest]
fn test_overly_deep_query_is_invalid(cache: KeyValueCache) {
    let lookup = LocalLookup::new(&cache);
    let chain = vec!["A"; 30_000].join(" | ");
    assert!(matches!(
        lookup.run_set_query_int(&chain),
        Err(LookupError::InvalidQuery(ParseError::TooDeep { .. }))
    ));

    let nested = format!("{}A{}", "(".repeat(3_000), ")".repeat(3_000));
    assert!(matches!(
        lookup.run_query(&nested),
        Err(LookupError::InvalidQuery(ParseError::TooDeep { .. }))
    ));
}

#[rstest]
fn test_query_depth_comes_from_config(cache: KeyValueCache) {
    let lookup = LocalLookup::from_config(&cache, &Config::default().with_max_query_depth(2));
    assert_eq!(lookup.run_set_query_int("A - B").unwrap(), vec![10, 30, 50]);
    assert!(matches!(
        lookup.run_set_query_int("A - B - A"),
        Err(LookupError::InvalidQuery(ParseError::TooDeep { .. }))
    ));
}

#[rstest]
fn test_run_parsed_queries(cache: KeyValueCache) {
    let lookup = LocalLookup::new(&cache);
    let query = parse_query("A & B").unwrap();
    assert_eq!(lookup.run_parsed_set_query_int(&query).unwrap(), vec![20, 40]);

    let query = parse_query("someset - other").unwrap();
    assert_eq!(lookup.run_parsed_query(&query).unwrap(), vec!["value1"]);
}
