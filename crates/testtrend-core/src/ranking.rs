//! Top-K selection over scored test names.

use std::collections::HashMap;
use std::sync::Arc;

use crate::errors::Result;
use crate::filter::ProjectFilter;
use crate::model::BuildTestRecord;

/// Names sorted by score descending, then name ascending, truncated to `k`.
pub fn top_k<N, S, I>(candidates: I, k: usize) -> Vec<(String, S)>
where
    N: Into<String>,
    S: Ord,
    I: IntoIterator<Item = (N, S)>,
{
    let mut ranked: Vec<(String, S)> = candidates
        .into_iter()
        .map(|(name, score)| (name.into(), score))
        .collect();
    ranked.sort_by(|(an, a), (bn, b)| b.cmp(a).then_with(|| an.cmp(bn)));
    ranked.truncate(k);
    ranked
}

/// Like [`top_k`], names only.
pub fn top_k_names<N, S, I>(candidates: I, k: usize) -> Vec<String>
where
    N: Into<String>,
    S: Ord,
    I: IntoIterator<Item = (N, S)>,
{
    top_k(candidates, k).into_iter().map(|(n, _)| n).collect()
}

/// Tests failing most often over `chain`, with their fail counts.
pub fn most_failed<I>(chain: I, filter: &ProjectFilter, k: usize) -> Result<Vec<(String, u32)>>
where
    I: IntoIterator<Item = Result<Arc<BuildTestRecord>>>,
{
    let mut fails: HashMap<String, u32> = HashMap::new();
    for record in chain {
        let record = record?;
        for case in record
            .failed
            .iter()
            .filter(|c| filter.matches(&c.full_name))
        {
            *fails.entry(case.full_name.clone()).or_insert(0) += 1;
        }
    }
    Ok(top_k(fails, k))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn orders_by_score_then_name() {
        let ranked = top_k_names([("b", 2), ("a", 2), ("c", 5), ("d", 1)], 10);
        assert_eq!(ranked, vec!["c", "a", "b", "d"]);
    }

    #[test]
    fn truncates_to_k() {
        let ranked = top_k([("x", 1u32), ("y", 3), ("z", 2)], 2);
        assert_eq!(ranked, vec![("y".to_string(), 3), ("z".to_string(), 2)]);
        assert!(top_k(Vec::<(String, u32)>::new(), 5).is_empty());
        assert!(top_k_names([("x", 1)], 0).is_empty());
    }

    #[test]
    fn most_failed_counts_raw_failures() {
        let chain: Vec<Result<Arc<BuildTestRecord>>> = vec![
            BuildTestRecord::new(3).fail("a.T.x", 0.0).fail("a.T.y", 0.0),
            BuildTestRecord::new(2).fail("a.T.y", 0.0).fail("b.T.z", 0.0),
            BuildTestRecord::new(1).fail("a.T.y", 0.0),
        ]
        .into_iter()
        .map(|r| Ok(Arc::new(r)))
        .collect();
        let filter = ProjectFilter::new("a", crate::config::PrefixRule::Literal);
        let ranked = most_failed(chain, &filter, 20).unwrap();
        assert_eq!(
            ranked,
            vec![("a.T.y".to_string(), 3), ("a.T.x".to_string(), 1)]
        );
    }
}
