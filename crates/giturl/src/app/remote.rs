//! Git remote URL parsing.
//!
//! Two remote grammars are recognized, tried in order:
//!
//! - transport-prefixed: `<scheme>://[<login>@]<host>/.../<user>/<repo>.git`
//! - scp-style: `<login>@<host>:.../<user>/<repo>.git`
//!
//! Any number of leading path segments is accepted; only the last two name the owner and the
//! repository.

use serde::Serialize;

/// Identity of a remote repository on its hosting service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RemoteOrigin {
    pub domain: String,
    pub user: String,
    pub repo: String,
}

impl RemoteOrigin {
    /// Parse a remote URL as reported by `git config`.
    ///
    /// Returns `None` when neither grammar matches. Remotes without a `.git` suffix are not
    /// recognized.
    pub fn parse(url: &str) -> Option<Self> {
        let url = url.trim();
        parse_transport(url).or_else(|| parse_scp(url))
    }
}

fn parse_transport(url: &str) -> Option<RemoteOrigin> {
    let (scheme, rest) = url.split_once("://")?;
    if scheme.is_empty() || scheme.contains(':') {
        return None;
    }

    let (authority, path) = rest.split_once('/')?;
    // userinfo never belongs in a browse url
    let host = authority
        .rsplit_once('@')
        .map_or(authority, |(_, host)| host);
    let host = if matches!(scheme, "http" | "https") {
        host
    } else {
        host.split_once(':').map_or(host, |(name, _port)| name)
    };
    if host.is_empty() {
        return None;
    }

    build(host, path)
}

fn parse_scp(url: &str) -> Option<RemoteOrigin> {
    let (login, rest) = url.split_once('@')?;
    if login.is_empty() {
        return None;
    }

    let (host, path) = rest.split_once(':')?;
    if host.is_empty() {
        return None;
    }

    build(host, path)
}

fn build(host: &str, path: &str) -> Option<RemoteOrigin> {
    let (user, repo) = owner_and_repo(path)?;
    Some(RemoteOrigin {
        domain: host.to_owned(),
        user: user.trim_start_matches('~').to_owned(),
        repo: repo.to_owned(),
    })
}

fn owner_and_repo(path: &str) -> Option<(&str, &str)> {
    let stem = path.strip_suffix(".git")?;
    let (leading, repo) = stem.rsplit_once('/')?;
    let user = leading.rsplit('/').next()?;
    if user.is_empty() || repo.is_empty() {
        return None;
    }
    Some((user, repo))
}
