//! Property-Based Tests for Policy Module
//!
//! Uses proptest to check classification and key canonicalisation over
//! generated paths and queries.

use proptest::prelude::*;

use crate::policy::{build_key, classify, collection_name, PathKind, BYPASS_PARAM};

// == Strategies ==
/// Generates a collection-style word
fn word_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z_][a-zA-Z0-9_]{0,15}".prop_map(|s| s)
}

/// Generates a query suffix (including the `?`), possibly empty
fn query_suffix_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        Just(String::new()),
        "[a-z]{1,6}=[a-z0-9]{0,6}".prop_map(|q| format!("?{q}")),
    ]
}

/// Generates a list of distinct query parameters, never the bypass one
fn params_strategy() -> impl Strategy<Value = Vec<(String, String)>> {
    prop::collection::btree_map("[a-z]{1,8}", "[a-z0-9]{0,8}", 0..6)
        .prop_map(|map| map.into_iter().collect())
}

fn encode(params: &[(String, String)]) -> String {
    params
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&")
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // `/api/<word>/<digits>` with any query is a resource.
    #[test]
    fn prop_api_resource_paths(word in word_strategy(), id in "[0-9]{1,9}", query in query_suffix_strategy()) {
        prop_assume!(word != "api");
        let path = format!("/api/{word}/{id}{query}");
        prop_assert_eq!(classify(&path), PathKind::Resource);
        prop_assert_eq!(collection_name(&path), word.as_str());
    }

    // Image paths with any nesting whose last segment has a digit are resources.
    #[test]
    fn prop_image_resource_paths(
        dirs in prop::collection::vec("[A-Za-z0-9_.-]{1,10}", 0..5),
        stem in "[a-z_-]{0,8}",
        digit in 0u8..10,
        query in query_suffix_strategy(),
    ) {
        let mut path = String::from("/images/");
        for dir in &dirs {
            path.push_str(dir);
            path.push('/');
        }
        path.push_str(&format!("{stem}{digit}.jpg{query}"));
        prop_assert_eq!(classify(&path), PathKind::Resource);
    }

    // `/api/<word>` with any query is a collection.
    #[test]
    fn prop_api_collection_paths(word in word_strategy(), query in query_suffix_strategy()) {
        let path = format!("/api/{word}{query}");
        prop_assert_eq!(classify(&path), PathKind::Collection);
    }

    // A doubled slash anywhere makes the path unclassifiable.
    #[test]
    fn prop_doubled_slash_is_other(word in word_strategy(), id in "[0-9]{1,6}") {
        prop_assert_eq!(classify(&format!("/api//{word}")), PathKind::Other);
        prop_assert_eq!(classify(&format!("/api/{word}//{id}")), PathKind::Other);
        prop_assert_eq!(classify(&format!("//api/{word}")), PathKind::Other);
    }

    // Parameter order and the bypass flag never change a collection key.
    #[test]
    fn prop_collection_key_is_canonical(word in word_strategy(), params in params_strategy()) {
        let path = format!("/api/{word}");
        let forward = encode(&params);

        let mut reversed = params.clone();
        reversed.reverse();
        let mut with_bypass = reversed.clone();
        with_bypass.insert(0, (BYPASS_PARAM.to_string(), "1".to_string()));

        let key = build_key(&path, Some(&forward));
        prop_assert_eq!(&key, &build_key(&path, Some(&encode(&reversed))));
        prop_assert_eq!(&key, &build_key(&path, Some(&encode(&with_bypass))));
        prop_assert_eq!(classify(&key), PathKind::Collection);
    }

    // Resource keys never carry a query.
    #[test]
    fn prop_resource_key_ignores_query(word in word_strategy(), id in "[0-9]{1,6}", params in params_strategy()) {
        let path = format!("/api/{word}/{id}");
        prop_assert_eq!(build_key(&path, Some(&encode(&params))), path);
    }
}
