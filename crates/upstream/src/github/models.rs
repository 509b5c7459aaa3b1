use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

use velo_common::types::{
    CodeReview, Commit, PullRequest, PullRequestStatus, Repository, ReviewState,
};

#[derive(Debug, Deserialize)]
struct RawRepository {
    id: u64,
    name: String,
    full_name: String,
}

#[derive(Debug, Deserialize)]
struct RawActor {
    login: String,
}

#[derive(Debug, Deserialize)]
struct RawGitAuthor {
    date: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct RawCommitDetail {
    message: String,
    author: Option<RawGitAuthor>,
}

#[derive(Debug, Deserialize)]
struct RawCommit {
    sha: String,
    commit: RawCommitDetail,
    author: Option<RawActor>,
}

#[derive(Debug, Deserialize)]
struct RawPullRequest {
    id: u64,
    number: u64,
    title: String,
    user: Option<RawActor>,
    state: String,
    created_at: DateTime<Utc>,
    merged_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct RawReview {
    id: u64,
    user: Option<RawActor>,
    state: String,
    submitted_at: Option<DateTime<Utc>>,
}

pub fn map_repository(raw: &Value) -> Option<Repository> {
    let repo: RawRepository = serde_json::from_value(raw.clone()).ok()?;
    Some(Repository {
        id: repo.id,
        name: repo.name,
        full_name: repo.full_name,
    })
}

pub fn map_commit(raw: &Value) -> Option<Commit> {
    let commit: RawCommit = serde_json::from_value(raw.clone()).ok()?;
    Some(Commit {
        sha: commit.sha,
        author_login: commit.author.map(|a| a.login),
        message: commit.commit.message,
        authored_at: commit.commit.author.and_then(|a| a.date),
    })
}

/// A pull request is `Merged` iff the host recorded a merge timestamp;
/// the raw `state` string only distinguishes open from closed.
pub fn map_pull_request(raw: &Value, repository: &str) -> Option<PullRequest> {
    let pr: RawPullRequest = serde_json::from_value(raw.clone()).ok()?;
    let status = if pr.merged_at.is_some() {
        PullRequestStatus::Merged
    } else if pr.state == "open" {
        PullRequestStatus::Open
    } else {
        PullRequestStatus::Closed
    };
    Some(PullRequest {
        id: pr.id,
        number: pr.number,
        title: pr.title,
        author_login: pr.user.map(|u| u.login),
        status,
        created_at: pr.created_at,
        merged_at: pr.merged_at,
        repository: repository.to_owned(),
    })
}

/// Reviews in states outside the model (PENDING, DISMISSED) are dropped.
pub fn map_review(raw: &Value) -> Option<CodeReview> {
    let review: RawReview = serde_json::from_value(raw.clone()).ok()?;
    let state = match review.state.as_str() {
        "APPROVED" => ReviewState::Approved,
        "CHANGES_REQUESTED" => ReviewState::ChangesRequested,
        "COMMENTED" => ReviewState::Commented,
        _ => return None,
    };
    Some(CodeReview {
        id: review.id,
        reviewer_login: review.user.map(|u| u.login),
        state,
        submitted_at: review.submitted_at,
    })
}

pub fn map_member_login(raw: &Value) -> Option<String> {
    raw.get("login")?.as_str().map(str::to_owned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn maps_repository() {
        let repo = map_repository(&json!({
            "id": 501,
            "name": "payments",
            "full_name": "acme/payments",
            "private": true
        }))
        .unwrap();
        assert_eq!(repo.id, 501);
        assert_eq!(repo.full_name, "acme/payments");
    }

    #[test]
    fn maps_commit_with_author() {
        let commit = map_commit(&json!({
            "sha": "abc123",
            "commit": {
                "message": "fix rounding",
                "author": { "name": "Alice", "date": "2026-02-10T08:30:00Z" }
            },
            "author": { "login": "alice" }
        }))
        .unwrap();
        assert_eq!(commit.sha, "abc123");
        assert_eq!(commit.author_login.as_deref(), Some("alice"));
        assert!(commit.authored_at.is_some());
    }

    #[test]
    fn commit_without_linked_account_keeps_no_login() {
        let commit = map_commit(&json!({
            "sha": "def456",
            "commit": { "message": "import history", "author": null },
            "author": null
        }))
        .unwrap();
        assert!(commit.author_login.is_none());
        assert!(commit.authored_at.is_none());
    }

    #[test]
    fn merged_pr_requires_merge_timestamp() {
        let merged = map_pull_request(
            &json!({
                "id": 1, "number": 10, "title": "feat", "user": { "login": "bob" },
                "state": "closed",
                "created_at": "2026-02-01T00:00:00Z",
                "merged_at": "2026-02-02T12:00:00Z"
            }),
            "payments",
        )
        .unwrap();
        assert_eq!(merged.status, PullRequestStatus::Merged);
        assert!(merged.merged_at.is_some());

        let closed = map_pull_request(
            &json!({
                "id": 2, "number": 11, "title": "wip", "user": null,
                "state": "closed",
                "created_at": "2026-02-01T00:00:00Z",
                "merged_at": null
            }),
            "payments",
        )
        .unwrap();
        assert_eq!(closed.status, PullRequestStatus::Closed);
    }

    #[test]
    fn open_pr_maps_to_open() {
        let pr = map_pull_request(
            &json!({
                "id": 3, "number": 12, "title": "draft", "user": { "login": "carol" },
                "state": "open",
                "created_at": "2026-02-01T00:00:00Z",
                "merged_at": null
            }),
            "payments",
        )
        .unwrap();
        assert_eq!(pr.status, PullRequestStatus::Open);
        assert_eq!(pr.repository, "payments");
    }

    #[test]
    fn maps_known_review_states() {
        let review = map_review(&json!({
            "id": 90, "user": { "login": "dave" },
            "state": "CHANGES_REQUESTED",
            "submitted_at": "2026-02-03T09:00:00Z"
        }))
        .unwrap();
        assert_eq!(review.state, ReviewState::ChangesRequested);
    }

    #[test]
    fn pending_review_is_dropped() {
        let raw = json!({ "id": 91, "user": null, "state": "PENDING", "submitted_at": null });
        assert!(map_review(&raw).is_none());
    }

    #[test]
    fn maps_member_login() {
        assert_eq!(
            map_member_login(&json!({ "login": "erin", "id": 7 })),
            Some("erin".to_owned())
        );
    }
}
