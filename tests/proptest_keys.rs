//! Property-based tests for cache key construction.
//!
//! # Properties Tested
//!
//! 1. **Order Independence**: equal mappings built in any order give one key
//! 2. **Injectivity**: different mappings never share a key
//! 3. **Namespacing**: list keys of different entity types never collide
//! 4. **Shared Entry**: reordered parameters hit the same cache entry end to end

use catalog_cache::backend::InMemoryBackend;
use catalog_cache::key::CacheKeyBuilder;
use catalog_cache::models::{Film, Genre, Person};
use catalog_cache::observability::TtlPolicy;
use catalog_cache::params::{ParamValue, Scalar};
use catalog_cache::search::InMemorySearchBackend;
use catalog_cache::service::{Catalog, ServiceConfig};
use catalog_cache::QueryParams;
use proptest::prelude::*;
use serde_json::json;

// ============================================================================
// Strategies
// ============================================================================

fn arb_scalar() -> impl Strategy<Value = Scalar> {
    prop_oneof![
        any::<bool>().prop_map(Scalar::Bool),
        any::<i64>().prop_map(Scalar::Int),
        ".{0,12}".prop_map(Scalar::Str),
    ]
}

fn arb_value() -> impl Strategy<Value = ParamValue> {
    prop_oneof![
        arb_scalar().prop_map(ParamValue::Scalar),
        prop::collection::vec(arb_scalar(), 0..4).prop_map(ParamValue::List),
    ]
}

/// Distinct parameter entries, in an arbitrary order.
fn arb_entries() -> impl Strategy<Value = Vec<(String, ParamValue)>> {
    prop::collection::btree_map("[a-z_]{1,8}", arb_value(), 0..6)
        .prop_map(|map| map.into_iter().collect::<Vec<_>>())
}

/// The same entries twice: once as generated, once shuffled.
fn arb_entries_and_shuffle(
) -> impl Strategy<Value = (Vec<(String, ParamValue)>, Vec<(String, ParamValue)>)> {
    arb_entries().prop_flat_map(|entries| (Just(entries.clone()), Just(entries).prop_shuffle()))
}

fn build(entries: &[(String, ParamValue)]) -> QueryParams {
    let mut params = QueryParams::new();
    for (name, value) in entries {
        params.insert(name.clone(), value.clone());
    }
    params
}

// ============================================================================
// Property 1: Order Independence
// ============================================================================

proptest! {
    /// Property: insertion order never changes the list key
    #[test]
    fn prop_key_is_order_independent((entries, shuffled) in arb_entries_and_shuffle()) {
        let a = build(&entries);
        let b = build(&shuffled);

        prop_assert_eq!(&a, &b);
        prop_assert_eq!(
            CacheKeyBuilder::list::<Film>(&a).expect("key"),
            CacheKeyBuilder::list::<Film>(&b).expect("key")
        );
    }

    /// Property: reversed insertion gives the same canonical form
    #[test]
    fn prop_reverse_insertion(entries in arb_entries()) {
        let forward = build(&entries);
        let reversed: QueryParams = entries.iter().rev().cloned().collect();

        prop_assert_eq!(
            forward.canonical().expect("canonical"),
            reversed.canonical().expect("canonical")
        );
    }
}

// ============================================================================
// Property 2: Injectivity
// ============================================================================

proptest! {
    /// Property: distinct mappings produce distinct keys
    #[test]
    fn prop_distinct_params_distinct_keys(a in arb_entries(), b in arb_entries()) {
        let a = build(&a);
        let b = build(&b);

        let key_a = CacheKeyBuilder::list::<Genre>(&a).expect("key");
        let key_b = CacheKeyBuilder::list::<Genre>(&b).expect("key");

        prop_assert_eq!(a == b, key_a == key_b);
    }

    /// Property: the canonical form is a JSON object with the same entries
    #[test]
    fn prop_canonical_is_json_of_params(entries in arb_entries()) {
        let params = build(&entries);
        let canonical = params.canonical().expect("canonical");

        let decoded: QueryParams = serde_json::from_str(&canonical).expect("valid json");
        prop_assert_eq!(decoded, params);
    }
}

// ============================================================================
// Property 3: Namespacing
// ============================================================================

proptest! {
    /// Property: the same parameters under different indexes never collide
    #[test]
    fn prop_index_prefix_separates_types(entries in arb_entries()) {
        let params = build(&entries);

        let film = CacheKeyBuilder::list::<Film>(&params).expect("key");
        let genre = CacheKeyBuilder::list::<Genre>(&params).expect("key");
        let person = CacheKeyBuilder::list::<Person>(&params).expect("key");

        prop_assert!(film.starts_with("movies:"));
        prop_assert!(genre.starts_with("genres:"));
        prop_assert!(person.starts_with("persons:"));
        prop_assert_ne!(&film, &genre);
        prop_assert_ne!(&genre, &person);
    }
}

// ============================================================================
// Property 4: Shared Entry
// ============================================================================

fn arb_film_query() -> impl Strategy<Value = Vec<(String, ParamValue)>> {
    (
        prop::collection::vec(prop::sample::select(vec!["sci-fi", "drama", "horror"]), 0..3),
        0i64..5,
        1i64..5,
        prop::collection::btree_map("x_[a-z]{1,4}", arb_scalar(), 0..3),
    )
        .prop_map(|(genres, offset, limit, extra)| {
            let mut entries: Vec<(String, ParamValue)> = vec![
                ("offset".to_string(), offset.into()),
                ("limit".to_string(), limit.into()),
            ];
            if !genres.is_empty() {
                entries.push(("genres".to_string(), genres.into()));
            }
            entries.extend(
                extra
                    .into_iter()
                    .map(|(name, value)| (name, ParamValue::Scalar(value))),
            );
            entries
        })
        .prop_flat_map(|entries| (Just(entries.clone()), Just(entries).prop_shuffle()))
        .prop_map(|(entries, shuffled)| {
            let mut both = entries;
            both.extend(shuffled);
            both
        })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Property: two equal mappings built in different orders share one
    /// cache entry, so search is queried once (twice when nothing matches,
    /// since NotFound is never cached)
    #[test]
    fn prop_reordered_params_hit_same_entry(both in arb_film_query()) {
        let half = both.len() / 2;
        let p1 = build(&both[..half]);
        let p2 = build(&both[half..]);

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .expect("runtime");

        let (first, second, search_calls, cached_entries) = runtime.block_on(async {
            let search = InMemorySearchBackend::new();
            search.insert_document("movies", json!({"id": "f1", "title": "Dune", "genre": ["sci-fi", "drama"]}));
            search.insert_document("movies", json!({"id": "f2", "title": "Alien", "genre": ["sci-fi", "horror"]}));
            search.insert_document("movies", json!({"id": "f3", "title": "Heat", "genre": ["drama"]}));

            let cache = InMemoryBackend::new();
            let catalog = Catalog::new(
                cache.clone(),
                search.clone(),
                &TtlPolicy::default(),
                ServiceConfig::default(),
            );

            let first = catalog.films.get_by_params(&p1).await.expect("first");
            let second = catalog.films.get_by_params(&p2).await.expect("second");
            (first, second, search.search_calls(), cache.len())
        });

        prop_assert_eq!(&first, &second);
        prop_assert_eq!(search_calls, if first.is_found() { 1 } else { 2 });
        prop_assert_eq!(cached_entries, usize::from(first.is_found()));
    }
}
