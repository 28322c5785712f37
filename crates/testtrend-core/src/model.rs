//! Build test records as the engine sees them.
//!
//! A [`BuildTestRecord`] is owned by whatever stores CI builds; the engine only
//! borrows it (through an `Arc`) while walking history and never mutates it.

use serde::{Deserialize, Serialize};

/// One test method's outcome in one build.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestCase {
    /// Dotted path; the last two segments are class and method.
    pub full_name: String,
    /// Short display name. Derived from `full_name` when empty.
    #[serde(default)]
    pub name: String,
    /// Execution time in seconds.
    #[serde(default)]
    pub duration: f64,
}

impl TestCase {
    pub fn new(full_name: impl Into<String>, duration: f64) -> Self {
        let full_name = full_name.into();
        let name = full_name
            .rsplit('.')
            .next()
            .unwrap_or(full_name.as_str())
            .to_string();
        Self {
            full_name,
            name,
            duration,
        }
    }

    pub fn short_name(&self) -> &str {
        if self.name.is_empty() {
            self.full_name.rsplit('.').next().unwrap_or(&self.full_name)
        } else {
            &self.name
        }
    }

    /// `full_name` without the method segment, e.g. `com.acme.FooTest`.
    pub fn class_name(&self) -> &str {
        match self.full_name.rfind('.') {
            Some(idx) => &self.full_name[..idx],
            None => &self.full_name,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Failed,
    Passed,
    Skipped,
}

/// Type tag of a test result. History walks only follow results of the same kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultKind {
    #[default]
    Junit,
    Aggregated,
}

/// Explicit counters for results that do not carry every case (e.g. aggregated downstream results).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counts {
    pub failed: usize,
    pub skipped: usize,
    pub total: usize,
}

/// One CI build's test report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildTestRecord {
    pub build_number: u32,
    #[serde(default)]
    pub kind: ResultKind,
    #[serde(default)]
    pub failed: Vec<TestCase>,
    #[serde(default)]
    pub passed: Vec<TestCase>,
    #[serde(default)]
    pub skipped: Vec<TestCase>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub counts: Option<Counts>,
}

impl BuildTestRecord {
    pub fn new(build_number: u32) -> Self {
        Self {
            build_number,
            kind: ResultKind::Junit,
            failed: Vec::new(),
            passed: Vec::new(),
            skipped: Vec::new(),
            counts: None,
        }
    }

    pub fn with_kind(mut self, kind: ResultKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_counts(mut self, counts: Counts) -> Self {
        self.counts = Some(counts);
        self
    }

    pub fn fail(mut self, full_name: &str, duration: f64) -> Self {
        self.failed.push(TestCase::new(full_name, duration));
        self
    }

    pub fn pass(mut self, full_name: &str, duration: f64) -> Self {
        self.passed.push(TestCase::new(full_name, duration));
        self
    }

    pub fn skip(mut self, full_name: &str) -> Self {
        self.skipped.push(TestCase::new(full_name, 0.0));
        self
    }

    pub fn tests(&self, outcome: Outcome) -> &[TestCase] {
        match outcome {
            Outcome::Failed => &self.failed,
            Outcome::Passed => &self.passed,
            Outcome::Skipped => &self.skipped,
        }
    }

    /// All cases in failed, passed, skipped order.
    pub fn all_tests(&self) -> impl Iterator<Item = &TestCase> {
        self.failed
            .iter()
            .chain(self.passed.iter())
            .chain(self.skipped.iter())
    }
}

/// Capability shared by every kind of test result: counters plus an identity.
pub trait ResultSummary {
    fn build_number(&self) -> u32;
    fn kind(&self) -> ResultKind;
    fn fail_count(&self) -> usize;
    fn skip_count(&self) -> usize {
        0
    }
    fn total_count(&self) -> usize;
}

impl ResultSummary for BuildTestRecord {
    fn build_number(&self) -> u32 {
        self.build_number
    }

    fn kind(&self) -> ResultKind {
        self.kind
    }

    fn fail_count(&self) -> usize {
        self.counts.map_or(self.failed.len(), |c| c.failed)
    }

    fn skip_count(&self) -> usize {
        self.counts.map_or(self.skipped.len(), |c| c.skipped)
    }

    fn total_count(&self) -> usize {
        self.counts.map_or(
            self.failed.len() + self.passed.len() + self.skipped.len(),
            |c| c.total,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_derived_from_full_name() {
        let tc = TestCase::new("com.acme.web.LoginTest.rejectsBadPassword", 0.2);
        assert_eq!(tc.short_name(), "rejectsBadPassword");
        assert_eq!(tc.class_name(), "com.acme.web.LoginTest");

        let bare: TestCase = serde_json::from_str(r#"{"full_name":"a.B.c"}"#).unwrap();
        assert_eq!(bare.short_name(), "c");
        assert_eq!(bare.duration, 0.0);
    }

    #[test]
    fn summary_counts_follow_lists_unless_overridden() {
        let rec = BuildTestRecord::new(4)
            .fail("a.B.x", 0.1)
            .pass("a.B.y", 0.1)
            .pass("a.B.z", 0.1)
            .skip("a.B.w");
        assert_eq!(rec.fail_count(), 1);
        assert_eq!(rec.skip_count(), 1);
        assert_eq!(rec.total_count(), 4);

        let agg = BuildTestRecord::new(5)
            .with_kind(ResultKind::Aggregated)
            .with_counts(Counts {
                failed: 3,
                skipped: 2,
                total: 40,
            });
        assert_eq!(agg.fail_count(), 3);
        assert_eq!(agg.total_count(), 40);
        assert_eq!(agg.kind(), ResultKind::Aggregated);
    }

    #[test]
    fn record_deserializes_with_defaults() {
        let rec: BuildTestRecord =
            serde_json::from_str(r#"{"build_number":7,"failed":[{"full_name":"x.Y.z"}]}"#)
                .unwrap();
        assert_eq!(rec.kind, ResultKind::Junit);
        assert_eq!(rec.tests(Outcome::Failed).len(), 1);
        assert!(rec.passed.is_empty());
        assert!(rec.counts.is_none());
    }
}
