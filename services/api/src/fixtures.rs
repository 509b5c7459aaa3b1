//! Deterministic fixture payloads served when no upstream is configured.
//! Shapes mirror the real DTO serialization so the UI renders identically
//! in mock mode.

use serde_json::{json, Value};

pub fn teams(id: Option<&str>) -> Value {
    let all = json!([
        { "id": "1", "name": "Platform", "board_id": 1 },
        { "id": "2", "name": "Core Services", "board_id": 2 }
    ]);
    match id {
        Some(id) => all
            .as_array()
            .and_then(|teams| teams.iter().find(|t| t["id"] == id).cloned())
            .unwrap_or(json!({ "id": "1", "name": "Platform", "board_id": 1 })),
        None => all,
    }
}

fn team_stats(team_id: &str, team_name: &str) -> Value {
    json!({
        "team_id": team_id,
        "team_name": team_name,
        "sprint_id": null,
        "sprint_name": null,
        "total_story_points": 34.0,
        "completed_story_points": 21.0,
        "completion_percentage": 61.8,
        "members": [
            {
                "account_id": "mock-mia",
                "display_name": "Mia Krystof",
                "total_story_points": 13.0,
                "completed_story_points": 8.0,
                "completion_percentage": 61.5
            },
            {
                "account_id": "mock-noah",
                "display_name": "Noah Petit",
                "total_story_points": 21.0,
                "completed_story_points": 13.0,
                "completion_percentage": 61.9
            }
        ]
    })
}

pub fn member_stats() -> Value {
    json!({
        "account_id": "mock-mia",
        "display_name": "Mia Krystof",
        "total_story_points": 13.0,
        "completed_story_points": 8.0,
        "completion_percentage": 61.5
    })
}

pub fn stats(team_id: Option<&str>, member_id: Option<&str>) -> Value {
    if member_id.is_some() {
        return member_stats();
    }
    match team_id {
        Some(id) => team_stats(id, "Platform"),
        None => json!([team_stats("1", "Platform"), team_stats("2", "Core Services")]),
    }
}

pub fn repositories() -> Value {
    json!([
        { "id": 501, "name": "payments", "full_name": "acme/payments" },
        { "id": 502, "name": "billing", "full_name": "acme/billing" }
    ])
}

pub fn pull_requests() -> Value {
    json!([
        {
            "id": 9001,
            "number": 41,
            "title": "Add settlement retries",
            "author_login": "mock-mia",
            "status": "merged",
            "created_at": "2026-02-10T09:00:00Z",
            "merged_at": "2026-02-11T16:30:00Z",
            "repository": "payments"
        },
        {
            "id": 9002,
            "number": 42,
            "title": "Refactor invoice export",
            "author_login": "mock-noah",
            "status": "open",
            "created_at": "2026-02-12T10:00:00Z",
            "merged_at": null,
            "repository": "billing"
        }
    ])
}

fn team_git() -> Value {
    json!({
        "team_id": "1",
        "team_name": "Platform",
        "totals": {
            "commit_count": 57,
            "pr_count": 12,
            "merged_pr_count": 9,
            "avg_pr_time_to_merge_hours": 18.4,
            "review_count": 0,
            "avg_review_response_hours": 0.0,
            "lines_added": 0,
            "lines_removed": 0
        },
        "members": [],
        "repositories": repositories()
    })
}

pub fn integrated(metric_type: &str) -> Value {
    match metric_type {
        "member" => json!({
            "member_id": "mock-mia",
            "display_name": "Mia Krystof",
            "completion": member_stats(),
            "git": {
                "commit_count": 23,
                "pr_count": 5,
                "merged_pr_count": 4,
                "avg_pr_time_to_merge_hours": 12.0,
                "review_count": 0,
                "avg_review_response_hours": 0.0,
                "lines_added": 0,
                "lines_removed": 0
            },
            "correlation": {
                "story_point_to_commit_ratio": 1.8,
                "review_quality": 0.9,
                "contribution": 0.9,
                "velocity_index": 0.5
            }
        }),
        "insights" => json!([
            {
                "id": "00000000-0000-0000-0000-000000000001",
                "target_type": "team",
                "target_id": "1",
                "target_name": "Platform",
                "message": "Team Platform completed 61.8% of committed story points, below the 70% target",
                "metric_name": "Completion Rate",
                "metric_value": 61.8,
                "trend": "down",
                "trend_percentage": null,
                "severity": "warning",
                "generated_at": "2026-02-14T08:00:00Z"
            }
        ]),
        "overview" => json!({
            "team_count": 2,
            "total_story_points": 68.0,
            "completed_story_points": 42.0,
            "completion_percentage": 61.8,
            "total_commits": 114,
            "total_pull_requests": 24,
            "total_reviews": 0,
            "active_members": 4
        }),
        _ => json!({
            "team_id": "1",
            "team_name": "Platform",
            "completion": team_stats("1", "Platform"),
            "git": team_git(),
            "correlation": {
                "story_point_to_commit_ratio": 1.7,
                "planning_accuracy": 61.8,
                "velocity": 21.0,
                "consistency": 0.6
            }
        }),
    }
}
