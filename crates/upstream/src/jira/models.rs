use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

use velo_common::types::{Issue, IssueAssignee, Sprint, SprintState, StoryPoints, Team};

/// Paged envelope of the Agile API list endpoints (`values` array).
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValuesPage {
    #[serde(default)]
    pub start_at: u64,
    #[serde(default)]
    pub max_results: u64,
    pub total: Option<u64>,
    pub is_last: Option<bool>,
    #[serde(default)]
    pub values: Vec<Value>,
}

/// Paged envelope of the issue search endpoints (`issues` array).
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuesPage {
    #[serde(default)]
    pub start_at: u64,
    #[serde(default)]
    pub max_results: u64,
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub issues: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct RawBoard {
    id: u64,
    name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSprint {
    id: u64,
    name: String,
    state: String,
    start_date: Option<String>,
    end_date: Option<String>,
    origin_board_id: Option<u64>,
}

/// Map one board payload to a team. The board is the team's identity here:
/// its id doubles as the team id.
pub fn map_board(raw: &Value) -> Option<Team> {
    let board: RawBoard = serde_json::from_value(raw.clone()).ok()?;
    Some(Team {
        id: board.id.to_string(),
        name: board.name,
        board_id: board.id,
    })
}

pub fn map_sprint(raw: &Value) -> Option<Sprint> {
    let sprint: RawSprint = serde_json::from_value(raw.clone()).ok()?;
    let state = match sprint.state.to_lowercase().as_str() {
        "active" => SprintState::Active,
        "closed" => SprintState::Closed,
        "future" => SprintState::Future,
        other => {
            tracing::warn!(sprint_id = sprint.id, state = other, "unknown sprint state, skipping");
            return None;
        }
    };
    Some(Sprint {
        id: sprint.id,
        name: sprint.name,
        state,
        start_date: sprint.start_date.as_deref().and_then(parse_jira_datetime),
        end_date: sprint.end_date.as_deref().and_then(parse_jira_datetime),
        board_id: sprint.origin_board_id,
    })
}

/// The single untyped-to-typed seam for issues: everything downstream of
/// this function works with the `Issue` domain type, never raw JSON.
///
/// `story_point_field` is the tracker's custom-field id for estimates
/// (configurable, `customfield_10016` by default). Negative or non-numeric
/// estimates fail `StoryPoints` validation and are dropped with a warning
/// so they never reach a sum.
pub fn map_issue(raw: &Value, story_point_field: &str) -> Option<Issue> {
    let id = id_string(raw.get("id")?)?;
    let key = raw.get("key")?.as_str()?.to_owned();
    let fields = raw.get("fields")?;

    let summary = fields
        .get("summary")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_owned();
    let status = fields
        .pointer("/status/name")
        .and_then(Value::as_str)
        .unwrap_or("Unknown")
        .to_owned();

    let assignee = fields.get("assignee").and_then(|a| {
        let account_id = a.get("accountId")?.as_str()?.to_owned();
        let display_name = a
            .get("displayName")
            .and_then(Value::as_str)
            .unwrap_or(&account_id)
            .to_owned();
        Some(IssueAssignee {
            account_id,
            display_name,
        })
    });

    let story_points = fields
        .get(story_point_field)
        .and_then(Value::as_f64)
        .and_then(|points| match StoryPoints::new(points) {
            Ok(sp) => Some(sp),
            Err(err) => {
                tracing::warn!(issue = %key, points, %err, "rejecting invalid story point value");
                None
            }
        });

    Some(Issue {
        id,
        key,
        summary,
        status,
        story_points,
        assignee,
        board_id: None,
        sprint_id: fields.pointer("/sprint/id").and_then(Value::as_u64),
        resolved_at: fields
            .get("resolutiondate")
            .and_then(Value::as_str)
            .and_then(parse_jira_datetime),
    })
}

// The search API sends issue ids as strings, older agile endpoints as numbers.
fn id_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Jira timestamps come as RFC 3339 or the legacy `+0000` offset form.
pub fn parse_jira_datetime(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .ok()
        .or_else(|| DateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.3f%z").ok())
        .map(|dt| dt.with_timezone(&Utc))
}
