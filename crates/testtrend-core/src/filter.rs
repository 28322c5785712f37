//! Project-level filtering of fully-qualified test names.

use crate::config::PrefixRule;

/// Project level that selects every test.
pub const ALL_PROJECTS: &str = "AllProjects";

/// Literal-prefix match; `AllProjects` matches everything.
pub fn matches(full_name: &str, project_level: &str) -> bool {
    project_level == ALL_PROJECTS || full_name.starts_with(project_level)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectFilter {
    level: Option<String>,
    rule: PrefixRule,
}

impl ProjectFilter {
    pub fn new(project_level: &str, rule: PrefixRule) -> Self {
        let level = (project_level != ALL_PROJECTS).then(|| project_level.to_string());
        Self { level, rule }
    }

    pub fn all() -> Self {
        Self {
            level: None,
            rule: PrefixRule::Literal,
        }
    }

    pub fn is_all(&self) -> bool {
        self.level.is_none()
    }

    pub fn level(&self) -> &str {
        self.level.as_deref().unwrap_or(ALL_PROJECTS)
    }

    pub fn matches(&self, full_name: &str) -> bool {
        let Some(level) = self.level.as_deref() else {
            return true;
        };
        match self.rule {
            PrefixRule::Literal => full_name.starts_with(level),
            PrefixRule::PackageBoundary => full_name
                .strip_prefix(level)
                .is_some_and(|rest| rest.is_empty() || rest.starts_with('.')),
        }
    }
}

impl Default for ProjectFilter {
    fn default() -> Self {
        Self::all()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_projects_matches_everything() {
        assert!(matches("org.b.T2.test", ALL_PROJECTS));
        assert!(ProjectFilter::new(ALL_PROJECTS, PrefixRule::PackageBoundary).matches("x"));
        assert!(ProjectFilter::all().is_all());
    }

    #[test]
    fn literal_prefix_is_not_package_aware() {
        assert!(matches("com.a.T1.test", "com"));
        assert!(matches("comX.Y.test", "com"));
        assert!(!matches("org.b.T2.test", "com"));

        let filter = ProjectFilter::new("com", PrefixRule::Literal);
        assert!(filter.matches("comX.Y.test"));
        assert_eq!(filter.level(), "com");
    }

    #[test]
    fn package_boundary_rule() {
        let filter = ProjectFilter::new("com", PrefixRule::PackageBoundary);
        assert!(filter.matches("com.a.T1.test"));
        assert!(filter.matches("com"));
        assert!(!filter.matches("comX.Y.test"));
        assert!(!filter.matches("org.com.T.test"));
    }
}
