//! Browse URL generation.

use crate::app::hosts::HostRegistry;
use crate::domain::model::{LineRange, RepoData, RevisionKind};

/// Fills host templates with repository data.
#[derive(Debug, Clone, Default)]
pub struct UrlGenerator {
    registry: HostRegistry,
}

impl UrlGenerator {
    pub fn new(registry: HostRegistry) -> Self {
        Self { registry }
    }

    /// Build the browse URL for `repo` at the revision selected by `kind`.
    ///
    /// With `lines`, the host's line or line-range anchor is appended when it defines one.
    /// Placeholders without a value are left in place.
    pub fn generate(
        &self,
        repo: &RepoData,
        kind: RevisionKind,
        lines: Option<LineRange>,
    ) -> String {
        let templates = self.registry.lookup(&repo.domain);
        tracing::debug!(
            domain = %repo.domain,
            key = self.registry.resolve_key(&repo.domain),
            revision_kind = %kind,
            "generating url"
        );

        let mut template = templates.base_template(kind).to_owned();
        if let Some(anchor) = lines.and_then(|lines| templates.anchor_template(lines)) {
            template.push_str(anchor);
        }

        substitute(&template, &template_fields(repo, kind, lines))
    }
}

fn template_fields(
    repo: &RepoData,
    kind: RevisionKind,
    lines: Option<LineRange>,
) -> Vec<(&'static str, String)> {
    let mut fields = vec![
        ("domain", repo.domain.clone()),
        ("user", repo.user.clone()),
        ("repo", repo.repo.clone()),
        ("path", repo.path.clone()),
        ("current_commit", repo.current_commit.clone()),
        ("current_branch", repo.current_branch.clone()),
        ("default_branch", repo.default_branch.clone()),
        ("revision", repo.revision(kind).to_owned()),
    ];
    if let Some(lines) = lines {
        fields.push(("line", lines.start.to_string()));
        fields.push(("line_end", lines.end.to_string()));
    }
    fields
}

/// Literal `{name}` replacement; unknown placeholders survive verbatim.
fn substitute(template: &str, fields: &[(&str, String)]) -> String {
    fields
        .iter()
        .fold(template.to_owned(), |rendered, (name, value)| {
            rendered.replace(&format!("{{{name}}}"), value)
        })
}
