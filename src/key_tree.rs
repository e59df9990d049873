// Copyright 2024 Google LLC
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Conversion between nested translation trees and flat maps keyed
//! by dotted paths.
//!
//! A translation file either looks like
//!
//! ```json
//! { "profile": { "bio": "Biography", "name": "Name" } }
//! ```
//!
//! or, in the flat convention, like
//!
//! ```json
//! { "profile.bio": "Biography", "profile.name": "Name" }
//! ```
//!
//! All functions here take their input by reference and build new
//! maps.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;

/// A translation mapping. Values are strings or nested mappings.
pub type Tree = Map<String, Value>;

/// Shape of the persisted translation files.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Structure {
    /// One level, keys are dotted paths sorted as whole strings.
    #[default]
    Flat,
    /// One mapping level per path segment, sorted at every level.
    Nested,
}

impl fmt::Display for Structure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Structure::Flat => write!(f, "flat"),
            Structure::Nested => write!(f, "nested"),
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum KeyTreeError {
    /// The same path is used for a value and for a group of keys,
    /// e.g. both `profile` and `profile.bio`.
    #[error("key {key:?} is used both as a value and as a group of keys")]
    StructuralConflict { key: String },
}

/// Flatten `tree` into a map from dotted paths to leaf values.
///
/// Mappings without any leaves disappear from the result.
///
/// # Examples
///
/// ```
/// use po_sync::key_tree::flatten;
/// use serde_json::json;
///
/// let tree = json!({"nested": {"hello": "Hello"}, "empty": {}, "welcome": "Welcome"});
/// let flat = flatten(tree.as_object().unwrap());
/// assert_eq!(
///     serde_json::Value::Object(flat),
///     json!({"nested.hello": "Hello", "welcome": "Welcome"})
/// );
/// ```
pub fn flatten(tree: &Tree) -> Tree {
    let mut flat = Tree::new();
    flatten_into(tree, "", &mut flat);
    flat
}

fn flatten_into(tree: &Tree, prefix: &str, flat: &mut Tree) {
    for (key, value) in tree {
        let path = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };
        match value {
            Value::Object(children) => flatten_into(children, &path, flat),
            _ => {
                flat.insert(path, value.clone());
            }
        }
    }
}

/// Expand dotted keys into nested mappings.
///
/// Sibling order follows the first appearance of each segment. A key
/// which is both a leaf and the prefix of another key is rejected
/// with [`KeyTreeError::StructuralConflict`].
pub fn unflatten(flat: &Tree) -> Result<Tree, KeyTreeError> {
    let paths = flat
        .iter()
        .map(|(key, value)| (key.as_str(), key.split('.').collect::<Vec<_>>(), value))
        .collect::<Vec<_>>();
    build_level(
        paths
            .iter()
            .map(|(key, segments, value)| (*key, segments.as_slice(), *value))
            .collect(),
    )
}

/// One pending entry: full key, remaining path segments and the leaf.
type PendingEntry<'a> = (&'a str, &'a [&'a str], &'a Value);

fn build_level(entries: Vec<PendingEntry<'_>>) -> Result<Tree, KeyTreeError> {
    let mut order = Vec::new();
    let mut leaves = HashMap::new();
    let mut branches: HashMap<&str, Vec<PendingEntry<'_>>> = HashMap::new();

    for (key, segments, value) in entries {
        let Some((head, rest)) = segments.split_first() else {
            continue;
        };
        if !leaves.contains_key(head) && !branches.contains_key(head) {
            order.push(*head);
        }
        if rest.is_empty() {
            leaves.insert(*head, (key, value));
        } else {
            branches.entry(*head).or_default().push((key, rest, value));
        }
    }

    let mut level = Tree::new();
    for segment in order {
        let value = match (leaves.remove(segment), branches.remove(segment)) {
            (Some((key, _)), Some(_)) => {
                return Err(KeyTreeError::StructuralConflict {
                    key: String::from(key),
                })
            }
            (Some((_, value)), None) => value.clone(),
            (None, Some(children)) => Value::Object(build_level(children)?),
            (None, None) => continue,
        };
        level.insert(String::from(segment), value);
    }
    Ok(level)
}

/// Sort keys at every level of `tree`.
///
/// # Examples
///
/// ```
/// use po_sync::key_tree::sort_recursive;
/// use serde_json::json;
///
/// let tree = json!({"zebra": "Z", "middle": {"zoo": "Z", "ant": "A"}, "apple": "A"});
/// let sorted = sort_recursive(tree.as_object().unwrap());
/// assert_eq!(sorted.keys().collect::<Vec<_>>(), ["apple", "middle", "zebra"]);
/// assert_eq!(
///     sorted["middle"].as_object().unwrap().keys().collect::<Vec<_>>(),
///     ["ant", "zoo"]
/// );
/// ```
pub fn sort_recursive(tree: &Tree) -> Tree {
    let mut entries = tree.iter().collect::<Vec<_>>();
    entries.sort_by(|(a, _), (b, _)| a.cmp(b));
    entries
        .into_iter()
        .map(|(key, value)| {
            let value = match value {
                Value::Object(children) => Value::Object(sort_recursive(children)),
                _ => value.clone(),
            };
            (key.clone(), value)
        })
        .collect()
}

/// Sort the top level of `tree` by key, leaving nested values as-is.
pub fn sort_keys(tree: &Tree) -> Tree {
    let mut entries = tree.iter().collect::<Vec<_>>();
    entries.sort_by(|(a, _), (b, _)| a.cmp(b));
    entries
        .into_iter()
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

/// Bring a flat map into the shape used for `structure`.
pub fn arrange(flat: &Tree, structure: Structure) -> Result<Tree, KeyTreeError> {
    match structure {
        Structure::Flat => Ok(sort_keys(flat)),
        Structure::Nested => Ok(sort_recursive(&unflatten(flat)?)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn tree(value: Value) -> Tree {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected an object, got {value}"),
        }
    }

    #[track_caller]
    fn assert_sorted_everywhere(tree: &Tree) {
        let keys = tree.keys().collect::<Vec<_>>();
        assert!(keys.windows(2).all(|pair| pair[0] < pair[1]), "{keys:?}");
        for value in tree.values() {
            if let Value::Object(children) = value {
                assert_sorted_everywhere(children);
            }
        }
    }

    #[test]
    fn test_flatten_nested() {
        let nested = tree(json!({
            "welcome": "Welcome",
            "nested": {"hello": "Hello World", "goodbye": "Goodbye"},
        }));
        assert_eq!(
            Value::Object(flatten(&nested)),
            json!({
                "welcome": "Welcome",
                "nested.hello": "Hello World",
                "nested.goodbye": "Goodbye",
            })
        );
    }

    #[test]
    fn test_flatten_keeps_non_string_leaves() {
        let nested = tree(json!({"a": null, "b": {"c": 1}, "d": {}}));
        assert_eq!(Value::Object(flatten(&nested)), json!({"a": null, "b.c": 1}));
    }

    #[test]
    fn test_flatten_already_flat() {
        let flat = tree(json!({"profile.bio": "Bio", "name": "Name"}));
        assert_eq!(flatten(&flat), flat);
    }

    #[test]
    fn test_flatten_does_not_mutate() {
        let nested = tree(json!({"a": {"b": "c"}}));
        let before = nested.clone();
        let _ = flatten(&nested);
        assert_eq!(nested, before);
    }

    #[test]
    fn test_unflatten_deep() {
        let flat = tree(json!({
            "settings.user.profile.name": "Nom",
            "settings.user.profile.email": "Email",
            "settings.user.security.password": "Mot de passe",
        }));
        assert_eq!(
            Value::Object(unflatten(&flat).unwrap()),
            json!({
                "settings": {
                    "user": {
                        "profile": {"name": "Nom", "email": "Email"},
                        "security": {"password": "Mot de passe"},
                    }
                }
            })
        );
    }

    #[test]
    fn test_unflatten_keeps_first_seen_order() {
        let flat = tree(json!({"b.x": "1", "a": "2", "b.y": "3"}));
        let nested = unflatten(&flat).unwrap();
        assert_eq!(nested.keys().collect::<Vec<_>>(), ["b", "a"]);
        assert_eq!(
            nested["b"].as_object().unwrap().keys().collect::<Vec<_>>(),
            ["x", "y"]
        );
    }

    #[test]
    fn test_unflatten_leaf_then_branch_conflict() {
        let flat = tree(json!({"a": "leaf", "a.b": "branch"}));
        assert_eq!(
            unflatten(&flat),
            Err(KeyTreeError::StructuralConflict {
                key: String::from("a")
            })
        );
    }

    #[test]
    fn test_unflatten_branch_then_leaf_conflict() {
        let flat = tree(json!({"x.a.b": "branch", "x.a": "leaf"}));
        assert_eq!(
            unflatten(&flat),
            Err(KeyTreeError::StructuralConflict {
                key: String::from("x.a")
            })
        );
    }

    #[test]
    fn test_round_trip() {
        let nested = tree(json!({
            "name": "Nom",
            "profile": {"bio": "Biographie", "links": {"site": "Site web"}},
        }));
        assert_eq!(unflatten(&flatten(&nested)).unwrap(), nested);
    }

    #[test]
    fn test_sort_recursive() {
        let unsorted = tree(json!({
            "zebra": "Zèbre",
            "profile": {"zoo": "Zoo", "ant": "Fourmi"},
            "apple": "Pomme",
            "settings": {"zebra": "Zèbre", "apple": {"b": "2", "a": "1"}},
        }));
        let sorted = sort_recursive(&unsorted);
        assert_eq!(
            sorted.keys().collect::<Vec<_>>(),
            ["apple", "profile", "settings", "zebra"]
        );
        assert_sorted_everywhere(&sorted);
        // The values themselves are unchanged.
        assert_eq!(Value::Object(sorted.clone()), Value::Object(unsorted));
    }

    #[test]
    fn test_sort_recursive_idempotent() {
        let unsorted = tree(json!({"b": {"d": "1", "c": "2"}, "a": "3"}));
        let once = sort_recursive(&unsorted);
        let twice = sort_recursive(&once);
        assert_eq!(
            serde_json::to_string(&once).unwrap(),
            serde_json::to_string(&twice).unwrap()
        );
    }

    #[test]
    fn test_sort_keys_only_top_level() {
        let unsorted = tree(json!({"b": {"z": "1", "y": "2"}, "a": "3"}));
        let sorted = sort_keys(&unsorted);
        assert_eq!(sorted.keys().collect::<Vec<_>>(), ["a", "b"]);
        assert_eq!(
            sorted["b"].as_object().unwrap().keys().collect::<Vec<_>>(),
            ["z", "y"]
        );
    }

    #[test]
    fn test_arrange_flat() {
        let flat = tree(json!({"profile.bio": "Bio", "name": "Name"}));
        let arranged = arrange(&flat, Structure::Flat).unwrap();
        assert_eq!(arranged.keys().collect::<Vec<_>>(), ["name", "profile.bio"]);
    }

    #[test]
    fn test_arrange_nested() {
        let flat = tree(json!({"zebra": "Z", "middle.zoo": "Z", "middle.ant": "A", "apple": "A"}));
        let arranged = arrange(&flat, Structure::Nested).unwrap();
        assert_eq!(
            serde_json::to_string(&arranged).unwrap(),
            r#"{"apple":"A","middle":{"ant":"A","zoo":"Z"},"zebra":"Z"}"#
        );
    }
}
