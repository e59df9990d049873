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

//! Splitting of dotted keys into translation groups.
//!
//! The group is the first segment of a key: `actions.save` belongs
//! to the `actions` group and is stored as `save` in that group.

use std::collections::BTreeMap;

/// Anything addressed by a dotted key.
pub trait Keyed {
    fn key(&self) -> &str;
}

impl<V> Keyed for (String, V) {
    fn key(&self) -> &str {
        &self.0
    }
}

/// Return the group name of `key`.
///
/// A key without a dot is its own group.
pub fn group_name(key: &str) -> &str {
    key.split_once('.').map_or(key, |(group, _)| group)
}

/// Return `key` without its group prefix.
///
/// A key without a dot is returned unchanged.
pub fn remainder(key: &str) -> &str {
    key.split_once('.').map_or(key, |(_, rest)| rest)
}

/// Partition `entries` by group name.
///
/// Entries keep their relative order inside each group.
///
/// # Examples
///
/// ```
/// use po_sync::groups::partition;
///
/// let entries = vec![
///     (String::from("actions.save"), "Save"),
///     (String::from("messages.welcome"), "Welcome"),
///     (String::from("actions.delete"), "Delete"),
/// ];
/// let groups = partition(entries);
/// assert_eq!(groups.keys().collect::<Vec<_>>(), ["actions", "messages"]);
/// assert_eq!(groups["actions"].len(), 2);
/// ```
pub fn partition<T: Keyed>(entries: impl IntoIterator<Item = T>) -> BTreeMap<String, Vec<T>> {
    let mut groups = BTreeMap::<String, Vec<T>>::new();
    for entry in entries {
        let group = group_name(entry.key());
        match groups.get_mut(group) {
            Some(members) => members.push(entry),
            None => {
                let group = String::from(group);
                groups.insert(group, vec![entry]);
            }
        }
    }
    groups
}

/// Pair each entry of `group` with its key relative to the group.
pub fn strip_group_prefix<'a, T: Keyed>(entries: &'a [T], group: &str) -> Vec<(&'a str, &'a T)> {
    entries
        .iter()
        .map(|entry| {
            let key = entry.key();
            let rest = key
                .strip_prefix(group)
                .and_then(|rest| rest.strip_prefix('.'))
                .unwrap_or_else(|| remainder(key));
            (rest, entry)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn entries(keys: &[&str]) -> Vec<(String, usize)> {
        keys.iter()
            .enumerate()
            .map(|(idx, key)| (String::from(*key), idx))
            .collect()
    }

    #[test]
    fn test_group_name() {
        assert_eq!(group_name("actions.save"), "actions");
        assert_eq!(group_name("user.profile.bio"), "user");
        assert_eq!(group_name("welcome"), "welcome");
    }

    #[test]
    fn test_remainder() {
        assert_eq!(remainder("actions.save"), "save");
        assert_eq!(remainder("user.profile.bio"), "profile.bio");
        assert_eq!(remainder("welcome"), "welcome");
    }

    #[test]
    fn test_partition() {
        let groups = partition(entries(&[
            "actions.save",
            "actions.delete",
            "messages.welcome",
        ]));
        assert_eq!(
            groups,
            BTreeMap::from([
                (
                    String::from("actions"),
                    vec![
                        (String::from("actions.save"), 0),
                        (String::from("actions.delete"), 1),
                    ]
                ),
                (
                    String::from("messages"),
                    vec![(String::from("messages.welcome"), 2)]
                ),
            ])
        );
    }

    #[test]
    fn test_partition_is_stable() {
        let groups = partition(entries(&["a.3", "b.1", "a.1", "a.2"]));
        let order = groups["a"].iter().map(|(_, idx)| *idx).collect::<Vec<_>>();
        assert_eq!(order, [0, 2, 3]);
    }

    #[test]
    fn test_partition_single_segment() {
        let groups = partition(entries(&["welcome"]));
        assert_eq!(groups["welcome"], [(String::from("welcome"), 0)]);
    }

    #[test]
    fn test_partition_empty() {
        assert!(partition(Vec::<(String, ())>::new()).is_empty());
    }

    #[test]
    fn test_strip_group_prefix() {
        let members = entries(&["user.name", "user.profile.bio"]);
        let stripped = strip_group_prefix(&members, "user")
            .into_iter()
            .map(|(rest, (_, idx))| (rest, *idx))
            .collect::<Vec<_>>();
        assert_eq!(stripped, [("name", 0), ("profile.bio", 1)]);
    }

    #[test]
    fn test_strip_group_prefix_single_segment() {
        let members = entries(&["welcome"]);
        let stripped = strip_group_prefix(&members, "welcome");
        assert_eq!(stripped[0].0, "welcome");
    }
}
