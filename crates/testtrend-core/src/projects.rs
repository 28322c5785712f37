//! Selectable project levels derived from test class names.
//!
//! Every package prefix of every class name is a candidate level, e.g.
//! `com.acme.web.LoginTest` yields `com`, `com.acme` and `com.acme.web`.
//! The list is capped: when adding a prefix pushes it over the cap, the
//! deepest level collected so far is dropped as a whole and no deeper level is
//! collected afterwards. Shallow levels always win over deep ones.

use std::collections::BTreeSet;

use crate::model::BuildTestRecord;

pub const DEFAULT_PROJECT_CAP: usize = 50;

/// Sorted, duplicate-free package prefixes of `class_names`, at most `cap` entries.
pub fn project_list<'a, I>(class_names: I, cap: usize) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    // levels[i] holds prefixes with i + 1 segments
    let mut levels: Vec<BTreeSet<String>> = Vec::new();
    let mut count = 0usize;
    let mut max_levels = usize::MAX;

    for class_name in class_names {
        let segments: Vec<&str> = class_name.split('.').collect();
        let mut prefix = String::new();
        // the last segment is the class itself
        for (level, segment) in segments
            .iter()
            .take(segments.len().saturating_sub(1))
            .enumerate()
        {
            if level >= max_levels {
                break;
            }
            if !prefix.is_empty() {
                prefix.push('.');
            }
            prefix.push_str(segment);

            if levels.len() <= level {
                levels.push(BTreeSet::new());
            }
            if levels[level].insert(prefix.clone()) {
                count += 1;
            }
            if count > cap {
                if let Some(deepest) = levels.pop() {
                    count -= deepest.len();
                }
                max_levels = levels.len();
            }
        }
    }

    let mut list: Vec<String> = levels.into_iter().flatten().collect();
    list.sort();
    list
}

/// Project levels of every class seen in `record`, in failed, passed, skipped order.
pub fn record_projects(record: &BuildTestRecord, cap: usize) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    let classes: Vec<&str> = record
        .all_tests()
        .map(|t| t.class_name())
        .filter(|c| seen.insert(*c))
        .collect();
    project_list(classes, cap)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collects_every_package_level() {
        let list = project_list(
            [
                "com.salesforce.hadoop.LoadTest",
                "org.apache.hbase.QueryTest",
                "com.salesforce.phoenix.UITest",
            ],
            DEFAULT_PROJECT_CAP,
        );
        assert_eq!(
            list,
            vec![
                "com",
                "com.salesforce",
                "com.salesforce.hadoop",
                "com.salesforce.phoenix",
                "org",
                "org.apache",
                "org.apache.hbase",
            ]
        );
    }

    #[test]
    fn class_without_package_contributes_nothing() {
        assert!(project_list(["LoadTest"], 10).is_empty());
    }

    #[test]
    fn cap_evicts_deepest_level_first() {
        // a.x1.C, a.x2.C, a.x3.C: level 0 = {a}, level 1 = {a.x1, a.x2, a.x3}
        let list = project_list(["a.x1.C", "a.x2.C", "a.x3.C"], 3);
        // adding a.x3 makes 4 > 3, so level 1 is dropped and never refilled
        assert_eq!(list, vec!["a"]);

        let list = project_list(["a.x1.C", "a.x2.C", "b.y.C"], 3);
        assert_eq!(list, vec!["a", "b"]);
    }

    #[test]
    fn too_many_roots_empties_the_list() {
        let names: Vec<String> = (0..5).map(|i| format!("p{i}.C")).collect();
        let list = project_list(names.iter().map(String::as_str), 4);
        assert!(list.is_empty());
    }

    #[test]
    fn record_projects_deduplicates_classes() {
        let rec = BuildTestRecord::new(1)
            .fail("com.a.T1.one", 0.1)
            .pass("com.a.T1.two", 0.1)
            .skip("org.b.T2.three");
        assert_eq!(record_projects(&rec, 50), vec!["com", "com.a", "org", "org.b"]);
    }
}
