//! Registry of per-host URL templates.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::domain::model::{LineRange, RevisionKind};

/// Registry key of the template set used for hosts without an entry of their own.
pub const SELF_HOSTED_KEY: &str = "self-hosted";

static BUILTIN_HOSTS: Lazy<BTreeMap<String, HostTemplateSet>> = Lazy::new(|| {
    BTreeMap::from([
        (
            "github.com".to_owned(),
            HostTemplateSet::new("https://{domain}/{user}/{repo}/blob/{revision}/{path}")
                .with_line("#L{line}")
                .with_line_range("#L{line}-L{line_end}"),
        ),
        (
            "bitbucket.org".to_owned(),
            HostTemplateSet::new("https://{domain}/{user}/{repo}/src/{revision}/{path}")
                .with_line("#lines-{line}")
                .with_line_range("#lines-{line}:{line_end}"),
        ),
        (
            "gitlab.com".to_owned(),
            HostTemplateSet::new("https://{domain}/{user}/{repo}/blob/{revision}/{path}")
                .with_line("#L{line}")
                .with_line_range("#L{line}-{line_end}"),
        ),
    ])
});

static BUILTIN_FALLBACK: Lazy<HostTemplateSet> = Lazy::new(|| {
    HostTemplateSet::new(
        "https://{domain}/projects/{user}/repos/{repo}/browse/{path}?at={revision}",
    )
    .with_branch_url(
        "https://{domain}/projects/{user}/repos/{repo}/browse/{path}?at=refs%2Fheads%2F{revision}",
    )
    .with_line("#{line}")
    .with_line_range("#{line}-{line_end}")
});

/// URL templates for one hosting service.
///
/// Templates use `{field}` placeholders named after [`RepoData`](crate::domain::model::RepoData)
/// fields plus `revision`, `line` and `line_end`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HostTemplateSet {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url_commit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url_branch: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_range: Option<String>,
}

impl HostTemplateSet {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            url_commit: None,
            url_branch: None,
            line: None,
            line_range: None,
        }
    }

    pub fn with_commit_url(mut self, template: impl Into<String>) -> Self {
        self.url_commit = Some(template.into());
        self
    }

    pub fn with_branch_url(mut self, template: impl Into<String>) -> Self {
        self.url_branch = Some(template.into());
        self
    }

    pub fn with_line(mut self, template: impl Into<String>) -> Self {
        self.line = Some(template.into());
        self
    }

    pub fn with_line_range(mut self, template: impl Into<String>) -> Self {
        self.line_range = Some(template.into());
        self
    }

    /// The URL template for `kind`, preferring the revision-specific variants.
    pub fn base_template(&self, kind: RevisionKind) -> &str {
        let specific = match kind {
            RevisionKind::CurrentCommit => self.url_commit.as_deref(),
            RevisionKind::CurrentBranch => self.url_branch.as_deref(),
            RevisionKind::DefaultBranch => None,
        };
        specific.unwrap_or(&self.url)
    }

    /// The anchor suffix for `lines`, if the host supports one.
    ///
    /// Multi-line ranges fall back to the single-line anchor when no range template exists.
    pub fn anchor_template(&self, lines: LineRange) -> Option<&str> {
        let range = if lines.is_single_line() {
            None
        } else {
            self.line_range.as_deref()
        };
        range.or(self.line.as_deref())
    }
}

/// Host template sets keyed by domain, with a fallback for unknown hosts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostRegistry {
    hosts: BTreeMap<String, HostTemplateSet>,
    fallback: HostTemplateSet,
}

impl Default for HostRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl HostRegistry {
    /// Registry with the built-in GitHub, Bitbucket, GitLab and self-hosted entries.
    pub fn builtin() -> Self {
        Self {
            hosts: BUILTIN_HOSTS.clone(),
            fallback: BUILTIN_FALLBACK.clone(),
        }
    }

    /// Merge user-supplied entries. Each entry replaces any existing one with the same key
    /// wholesale; [`SELF_HOSTED_KEY`] replaces the fallback.
    pub fn merge<I>(&mut self, entries: I)
    where
        I: IntoIterator<Item = (String, HostTemplateSet)>,
    {
        for (key, templates) in entries {
            if key == SELF_HOSTED_KEY {
                self.fallback = templates;
            } else {
                self.hosts.insert(key, templates);
            }
        }
    }

    pub fn with_entries<I>(mut self, entries: I) -> Self
    where
        I: IntoIterator<Item = (String, HostTemplateSet)>,
    {
        self.merge(entries);
        self
    }

    /// The registry key used for `domain`: the domain itself when registered, otherwise
    /// [`SELF_HOSTED_KEY`].
    pub fn resolve_key<'a>(&self, domain: &'a str) -> &'a str {
        if domain != SELF_HOSTED_KEY && self.hosts.contains_key(domain) {
            domain
        } else {
            SELF_HOSTED_KEY
        }
    }

    pub fn lookup(&self, domain: &str) -> &HostTemplateSet {
        self.hosts.get(domain).unwrap_or(&self.fallback)
    }

    /// All entries sorted by key, the fallback included under [`SELF_HOSTED_KEY`].
    pub fn entries(&self) -> BTreeMap<&str, &HostTemplateSet> {
        let mut entries: BTreeMap<&str, &HostTemplateSet> = self
            .hosts
            .iter()
            .map(|(key, templates)| (key.as_str(), templates))
            .collect();
        entries.insert(SELF_HOSTED_KEY, &self.fallback);
        entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_registry_covers_public_hosts() {
        let registry = HostRegistry::builtin();
        for domain in ["github.com", "bitbucket.org", "gitlab.com"] {
            assert_eq!(registry.resolve_key(domain), domain);
        }
        assert_eq!(registry.entries().len(), 4);
    }

    #[test]
    fn unknown_domain_uses_self_hosted_fallback() {
        let registry = HostRegistry::builtin();
        assert_eq!(registry.resolve_key("git.internal.example"), SELF_HOSTED_KEY);
        assert!(
            registry
                .lookup("git.internal.example")
                .url
                .contains("?at={revision}")
        );
    }

    #[test]
    fn user_entry_replaces_builtin_wholesale() {
        let registry = HostRegistry::builtin().with_entries([(
            "github.com".to_owned(),
            HostTemplateSet::new("https://mirror.example/{repo}/{path}"),
        )]);

        let github = registry.lookup("github.com");
        assert_eq!(github.url, "https://mirror.example/{repo}/{path}");
        assert_eq!(github.line, None);
        assert_eq!(github.line_range, None);
    }

    #[test]
    fn self_hosted_key_overrides_fallback() {
        let registry = HostRegistry::builtin().with_entries([(
            SELF_HOSTED_KEY.to_owned(),
            HostTemplateSet::new("https://{domain}/{user}/{repo}/-/blob/{revision}/{path}"),
        )]);

        let fallback = registry.lookup("code.corp.example");
        assert_eq!(
            fallback.url,
            "https://{domain}/{user}/{repo}/-/blob/{revision}/{path}"
        );
        assert_eq!(fallback.url_branch, None);
    }

    #[test]
    fn base_template_prefers_revision_specific_urls() {
        let templates = HostTemplateSet::new("default")
            .with_commit_url("commit")
            .with_branch_url("branch");

        assert_eq!(templates.base_template(RevisionKind::CurrentCommit), "commit");
        assert_eq!(templates.base_template(RevisionKind::CurrentBranch), "branch");
        assert_eq!(templates.base_template(RevisionKind::DefaultBranch), "default");
        assert_eq!(
            HostTemplateSet::new("default").base_template(RevisionKind::CurrentCommit),
            "default"
        );
    }

    #[test]
    fn anchor_template_falls_back_to_single_line() {
        let templates = HostTemplateSet::new("url").with_line("#L{line}");
        assert_eq!(
            templates.anchor_template(LineRange::new(3, 7)),
            Some("#L{line}")
        );

        let bare = HostTemplateSet::new("url");
        assert_eq!(bare.anchor_template(LineRange::single(3)), None);
    }
}
