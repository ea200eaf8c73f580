//! Patch target list parsing and the accumulated target database.
//!
//! Target lists are plain text files with one addressable game object
//! per line as `group, instance`, optionally annotated with a name after
//! a `#` marker. A line consisting of `Flora:` switches the category of
//! all subsequent lines in that file from lots to flora.
//!
//! The database accumulates entries per output unit over one build run.
//! Entries are keyed by their (group, instance) address: referencing the
//! same address from several menus or files merges into one entry whose
//! menu set is the union.

use crate::menu::{parse_numeral, MenuId};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use thiserror::Error;

/// Section marker switching subsequent lines to the flora category.
pub const FLORA_MARKER: &str = "Flora:";

/// (group, instance) address of one patch target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TargetId {
    pub group: u32,
    pub instance: u32,
}

impl fmt::Display for TargetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:08x}, 0x{:08x}", self.group, self.instance)
    }
}

/// Which exemplar family a target belongs to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TargetCategory {
    #[default]
    Lots,
    Flora,
}

#[derive(Error, Debug, PartialEq)]
#[error("line {line}: cannot parse target `{text}`")]
pub struct ParseError {
    pub line: usize,
    pub text: String,
}

/// One line of a target list file.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedTarget {
    pub id: TargetId,
    pub category: TargetCategory,
    pub name: Option<String>,
}

/// Parse the contents of one target list file.
///
/// Blank lines and lines starting with `#` are skipped. Every other
/// line must split into exactly two numerals (decimal or hex) before
/// any `#` name annotation, or parsing fails for the whole file.
pub fn parse_targets(contents: &str) -> Result<Vec<ParsedTarget>, ParseError> {
    let mut targets = Vec::new();
    let mut category = TargetCategory::Lots;

    for (index, raw) in contents.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if line == FLORA_MARKER {
            category = TargetCategory::Flora;
            continue;
        }

        let error = || ParseError {
            line: index + 1,
            text: line.to_string(),
        };

        let (data, name) = match line.split_once('#') {
            Some((data, name)) => (data, Some(name.trim())),
            None => (line, None),
        };

        let mut numbers = data.split(',').map(str::trim);
        let (Some(group), Some(instance), None) =
            (numbers.next(), numbers.next(), numbers.next())
        else {
            return Err(error());
        };
        let (Some(group), Some(instance)) = (parse_numeral(group), parse_numeral(instance))
        else {
            return Err(error());
        };

        targets.push(ParsedTarget {
            id: TargetId { group, instance },
            category,
            name: name.filter(|n| !n.is_empty()).map(String::from),
        });
    }

    Ok(targets)
}

/// One deduplicated target with the set of menus referencing it.
#[derive(Debug, Clone, PartialEq)]
pub struct TargetEntry {
    pub id: TargetId,
    pub category: TargetCategory,
    /// First-seen name annotation; later annotations never overwrite it.
    pub name: Option<String>,
    pub menus: BTreeSet<MenuId>,
}

/// Targets sharing one exact referencing-menu set within one unit.
#[derive(Debug, Clone, PartialEq)]
pub struct PatchGroup {
    /// Sorted referencing menu ids.
    pub menus: Vec<MenuId>,
    pub lots: Vec<TargetId>,
    pub flora: Vec<TargetId>,
}

impl PatchGroup {
    /// Stable composite key of the menu set, independent of insertion order.
    pub fn key(&self) -> String {
        group_key(self.menus.iter().copied())
    }
}

fn group_key(menus: impl Iterator<Item = MenuId>) -> String {
    let ids: Vec<String> = menus.map(|m| m.to_string()).collect();
    ids.join("-")
}

/// In-memory accumulation table for one build run.
///
/// Keyed by output unit slug, then by target address. Never persisted;
/// dropped when the run finishes.
#[derive(Debug, Default)]
pub struct TargetDatabase {
    units: BTreeMap<String, BTreeMap<TargetId, TargetEntry>>,
}

impl TargetDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge the parsed lines of one file into the given unit for `menu`.
    pub fn collect(&mut self, unit: &str, menu: MenuId, targets: &[ParsedTarget]) {
        let entries = self.units.entry(unit.to_string()).or_default();
        for target in targets {
            let entry = entries.entry(target.id).or_insert_with(|| TargetEntry {
                id: target.id,
                category: target.category,
                name: None,
                menus: BTreeSet::new(),
            });
            entry.menus.insert(menu);
            if entry.name.is_none() {
                entry.name.clone_from(&target.name);
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Iterate units in sorted order.
    pub fn units(&self) -> impl Iterator<Item = (&str, &BTreeMap<TargetId, TargetEntry>)> {
        self.units.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Partition one unit's entries by their exact referencing-menu set.
    ///
    /// Groups come back in key order; entries inside a group stay in
    /// address order, so the result is deterministic regardless of how
    /// the entries were discovered.
    pub fn partition(entries: &BTreeMap<TargetId, TargetEntry>) -> Vec<PatchGroup> {
        let mut groups: BTreeMap<String, PatchGroup> = BTreeMap::new();
        for entry in entries.values() {
            let key = group_key(entry.menus.iter().copied());
            let group = groups.entry(key).or_insert_with(|| PatchGroup {
                menus: entry.menus.iter().copied().collect(),
                lots: Vec::new(),
                flora: Vec::new(),
            });
            match entry.category {
                TargetCategory::Lots => group.lots.push(entry.id),
                TargetCategory::Flora => group.flora.push(entry.id),
            }
        }
        groups.into_values().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(group: u32, instance: u32) -> TargetId {
        TargetId { group, instance }
    }

    #[test]
    fn test_parse_basic_lines() {
        let targets = parse_targets("1, 2\n0x3, 0x4\n").unwrap();
        assert_eq!(targets.len(), 2);
        assert_eq!(targets[0].id, id(1, 2));
        assert_eq!(targets[1].id, id(3, 4));
        assert!(targets.iter().all(|t| t.category == TargetCategory::Lots));
    }

    #[test]
    fn test_parse_name_annotation() {
        let targets = parse_targets("3, 4 # Beach House\n").unwrap();
        assert_eq!(targets[0].name.as_deref(), Some("Beach House"));
    }

    #[test]
    fn test_parse_skips_blanks_and_comments() {
        let targets = parse_targets("\n# only a comment\n1, 2\n\n").unwrap();
        assert_eq!(targets.len(), 1);
    }

    #[test]
    fn test_flora_marker_switches_category() {
        let targets = parse_targets("1,2\nFlora:\n3,4\n").unwrap();
        assert_eq!(targets[0].category, TargetCategory::Lots);
        assert_eq!(targets[1].category, TargetCategory::Flora);
        assert_eq!(targets[1].id, id(3, 4));
    }

    #[test]
    fn test_parse_rejects_wrong_arity() {
        let err = parse_targets("1, 2\n1, 2, 3\n").unwrap_err();
        assert_eq!(err.line, 2);

        assert!(parse_targets("justone\n").is_err());
        assert!(parse_targets("1, zzzz\n").is_err());
    }

    #[test]
    fn test_parse_is_idempotent() {
        let text = "1, 2 # a\nFlora:\n0x30, 0x40\n";
        assert_eq!(parse_targets(text).unwrap(), parse_targets(text).unwrap());
    }

    #[test]
    fn test_collect_merges_menu_sets() {
        let mut db = TargetDatabase::new();
        let targets = parse_targets("1, 2\n").unwrap();
        db.collect("unit", MenuId(0x20), &targets);
        db.collect("unit", MenuId(0x30), &targets);

        let (_, entries) = db.units().next().unwrap();
        assert_eq!(entries.len(), 1);
        let entry = entries.values().next().unwrap();
        assert_eq!(
            entry.menus.iter().copied().collect::<Vec<_>>(),
            vec![MenuId(0x20), MenuId(0x30)]
        );
    }

    #[test]
    fn test_first_seen_name_wins() {
        let mut db = TargetDatabase::new();
        db.collect("unit", MenuId(1), &parse_targets("1, 2 # first\n").unwrap());
        db.collect("unit", MenuId(2), &parse_targets("1, 2 # second\n").unwrap());

        let (_, entries) = db.units().next().unwrap();
        let entry = entries.values().next().unwrap();
        assert_eq!(entry.name.as_deref(), Some("first"));
    }

    #[test]
    fn test_partition_groups_by_menu_set() {
        let mut db = TargetDatabase::new();
        db.collect("unit", MenuId(1), &parse_targets("1,2\n3,4\n").unwrap());
        db.collect("unit", MenuId(2), &parse_targets("3,4\n5,6\n").unwrap());

        let (_, entries) = db.units().next().unwrap();
        let groups = TargetDatabase::partition(entries);
        assert_eq!(groups.len(), 3);

        let shared = groups
            .iter()
            .find(|g| g.menus == vec![MenuId(1), MenuId(2)])
            .unwrap();
        assert_eq!(shared.lots, vec![id(3, 4)]);
    }

    #[test]
    fn test_group_key_is_order_independent() {
        let mut forward = TargetDatabase::new();
        forward.collect("u", MenuId(1), &parse_targets("1,2\n").unwrap());
        forward.collect("u", MenuId(2), &parse_targets("1,2\n").unwrap());

        let mut reverse = TargetDatabase::new();
        reverse.collect("u", MenuId(2), &parse_targets("1,2\n").unwrap());
        reverse.collect("u", MenuId(1), &parse_targets("1,2\n").unwrap());

        let key_of = |db: &TargetDatabase| {
            let (_, entries) = db.units().next().unwrap();
            TargetDatabase::partition(entries)[0].key()
        };
        assert_eq!(key_of(&forward), key_of(&reverse));
        assert_eq!(key_of(&forward), "0x00000001-0x00000002");
    }

    #[test]
    fn test_partition_splits_categories() {
        let mut db = TargetDatabase::new();
        db.collect("u", MenuId(1), &parse_targets("1,2\nFlora:\n3,4\n").unwrap());

        let (_, entries) = db.units().next().unwrap();
        let groups = TargetDatabase::partition(entries);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].lots, vec![id(1, 2)]);
        assert_eq!(groups[0].flora, vec![id(3, 4)]);
    }
}
