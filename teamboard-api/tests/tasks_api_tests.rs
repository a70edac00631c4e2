/// API tests for tasks, progress, analytics and the dashboard

mod common;

use axum::http::StatusCode;
use common::TestContext;
use serde_json::json;

/// alice owns, bob develops, carol views
async fn team(ctx: &TestContext) -> String {
    let id = ctx.create_project("alice", "Website relaunch").await;
    ctx.add_member(&id, "alice", "bob", "developer").await;
    ctx.add_member(&id, "alice", "carol", "viewer").await;
    id
}

#[tokio::test]
async fn test_progress_follows_task_status() {
    let ctx = TestContext::new();
    let p = team(&ctx).await;

    let (status, body) = ctx
        .post(
            &format!("/v1/projects/{}/tasks", p),
            "alice",
            json!({ "title": "T1", "assignee": "bob" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["project_progress"], 0);
    assert_eq!(body["task"]["status"], "todo");
    let t1 = body["task"]["id"].as_str().unwrap().to_string();
    let status_uri = format!("/v1/projects/{}/tasks/{}/status", p, t1);

    let (status, body) = ctx.patch(&status_uri, "bob", json!({ "status": "in_progress" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["project_progress"], 0);

    let (status, body) = ctx.patch(&status_uri, "bob", json!({ "status": "completed" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["project_progress"], 100);
    assert!(body["task"]["completed_at"].is_string());

    let (_, body) = ctx
        .post(&format!("/v1/projects/{}/tasks", p), "alice", json!({ "title": "T2" }))
        .await;
    assert_eq!(body["project_progress"], 50);

    let (_, body) = ctx.get(&format!("/v1/projects/{}", p), "carol").await;
    assert_eq!(body["progress"], 50);

    let (status, _) = ctx
        .post(&format!("/v1/projects/{}/tasks", p), "carol", json!({ "title": "T3" }))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_transition_scope() {
    let ctx = TestContext::new();
    let p = team(&ctx).await;
    ctx.add_member(&p, "alice", "dave", "developer").await;
    let t = ctx
        .create_task(&p, "alice", json!({ "title": "T", "assignee": "bob" }))
        .await;
    let uri = format!("/v1/projects/{}/tasks/{}/status", p, t);

    let (status, _) = ctx.patch(&uri, "dave", json!({ "status": "completed" })).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = ctx.patch(&uri, "carol", json!({ "status": "completed" })).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = ctx.patch(&uri, "mallory", json!({ "status": "completed" })).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = ctx.patch(&uri, "alice", json!({ "status": "completed" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["task"]["status"], "completed");
}

#[tokio::test]
async fn test_assignment_rules() {
    let ctx = TestContext::new();
    let p = team(&ctx).await;
    let t = ctx.create_task(&p, "alice", json!({ "title": "T" })).await;
    let uri = format!("/v1/projects/{}/tasks/{}/assignee", p, t);

    let (status, body) = ctx.put(&uri, "alice", json!({ "assignee": "stranger" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("stranger"));

    let (status, _) = ctx.put(&uri, "bob", json!({ "assignee": "bob" })).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = ctx.put(&uri, "alice", json!({ "assignee": "bob" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["assignee"], "bob");

    let (status, body) = ctx.put(&uri, "alice", json!({ "assignee": null })).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["assignee"].is_null());

    // A developer can create a task for themself but not for others
    let (status, _) = ctx
        .post(
            &format!("/v1/projects/{}/tasks", p),
            "bob",
            json!({ "title": "Mine", "assignee": "bob" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = ctx
        .post(
            &format!("/v1/projects/{}/tasks", p),
            "bob",
            json!({ "title": "Yours", "assignee": "alice" }),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_edit_list_and_delete_tasks() {
    let ctx = TestContext::new();
    let p = team(&ctx).await;
    let mine = ctx
        .create_task(&p, "alice", json!({ "title": "Mine", "assignee": "bob" }))
        .await;
    let other = ctx.create_task(&p, "alice", json!({ "title": "Other" })).await;
    let tasks = format!("/v1/projects/{}/tasks", p);

    let (status, body) = ctx
        .put(&format!("{}/{}", tasks, mine), "bob", json!({ "title": "Renamed", "priority": "high" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["task"]["title"], "Renamed");
    assert_eq!(body["task"]["priority"], "high");
    assert!(body.get("project_progress").is_none());

    let (status, _) = ctx
        .put(&format!("{}/{}", tasks, other), "bob", json!({ "title": "Hijack" }))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = ctx
        .put(&format!("{}/{}", tasks, mine), "bob", json!({ "status": "completed" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["project_progress"], 50);

    let (status, body) = ctx.get(&format!("{}?status=completed", tasks), "carol").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["tasks"].as_array().unwrap().len(), 1);

    let (_, body) = ctx.get(&format!("{}?assignee=bob", tasks), "carol").await;
    assert_eq!(body["tasks"].as_array().unwrap().len(), 1);

    let (status, _) = ctx.delete(&format!("{}/{}", tasks, other), "bob").await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = ctx.delete(&format!("{}/{}", tasks, other), "alice").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["project_progress"], 100);

    let (status, _) = ctx.get(&format!("{}/{}", tasks, other), "alice").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_forbidden_edit_leaves_task_unchanged() {
    let ctx = TestContext::new();
    let p = team(&ctx).await;
    let t = ctx
        .create_task(&p, "bob", json!({ "title": "Original", "assignee": "bob" }))
        .await;
    let uri = format!("/v1/projects/{}/tasks/{}", p, t);

    let (status, _) = ctx
        .put(&uri, "bob", json!({ "title": "Hijacked", "assignee": "alice" }))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = ctx.get(&uri, "bob").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "Original");
    assert_eq!(body["assignee"], "bob");
}

#[tokio::test]
async fn test_task_from_other_project_is_not_found() {
    let ctx = TestContext::new();
    let p1 = ctx.create_project("alice", "One").await;
    let p2 = ctx.create_project("alice", "Two").await;
    let t = ctx.create_task(&p1, "alice", json!({ "title": "T" })).await;

    let (status, _) = ctx.get(&format!("/v1/projects/{}/tasks/{}", p2, t), "alice").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_recompute_progress_endpoint() {
    let ctx = TestContext::new();
    let p = team(&ctx).await;

    let (status, body) = ctx
        .post(&format!("/v1/projects/{}/progress", p), "carol", json!({}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["progress"], 0);

    let (status, _) = ctx
        .post(&format!("/v1/projects/{}/progress", p), "mallory", json!({}))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_analytics_gating_and_content() {
    let ctx = TestContext::new();
    let p = team(&ctx).await;
    let t = ctx
        .create_task(&p, "alice", json!({ "title": "T", "assignee": "bob", "priority": "high" }))
        .await;
    ctx.create_task(&p, "alice", json!({ "title": "U", "assignee": "bob" }))
        .await;
    ctx.patch(
        &format!("/v1/projects/{}/tasks/{}/status", p, t),
        "bob",
        json!({ "status": "completed" }),
    )
    .await;
    let analytics = format!("/v1/projects/{}/analytics", p);

    let (status, _) = ctx.get(&analytics, "bob").await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = ctx.get(&analytics, "alice").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["project_name"], "Website relaunch");
    assert_eq!(body["total_tasks"], 2);
    assert_eq!(body["overall_progress"], 50);
    assert_eq!(body["team_size"], 3);
    assert_eq!(body["tasks_by_priority"]["high"], 1);
    let productivity = body["team_productivity"].as_array().unwrap();
    assert_eq!(productivity[0]["username"], "alice");
    let bob = productivity.iter().find(|m| m["username"] == "bob").unwrap();
    assert_eq!(bob["completion_rate"], 50.0);

    // Members can read their own numbers but nobody else's
    let (status, body) = ctx.get(&format!("{}/members/bob", analytics), "bob").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["tasks_assigned"], 2);
    assert_eq!(body["role"], "developer");

    let (status, _) = ctx.get(&format!("{}/members/alice", analytics), "bob").await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = ctx.get(&format!("{}/members/bob", analytics), "mallory").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_timeline_window() {
    let ctx = TestContext::new();
    let p = team(&ctx).await;
    ctx.create_task(&p, "alice", json!({ "title": "T" })).await;
    let timeline = format!("/v1/projects/{}/analytics/timeline", p);

    let (status, body) = ctx.get(&timeline, "alice").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["days"], 30);
    assert_eq!(body["timeline"].as_array().unwrap().len(), 30);

    let (status, body) = ctx.get(&format!("{}?days=7", timeline), "alice").await;
    assert_eq!(status, StatusCode::OK);
    let entries = body["timeline"].as_array().unwrap();
    assert_eq!(entries.len(), 7);
    assert_eq!(entries[6]["tasks_created"], 1);

    let (status, body) = ctx.get(&format!("{}?days=0", timeline), "alice").await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["details"][0]["field"], "days");

    let (status, _) = ctx.get(&format!("{}?days=366", timeline), "alice").await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, _) = ctx.get(&format!("{}?days=7", timeline), "carol").await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_dashboard_and_activity() {
    let ctx = TestContext::new();
    let p = team(&ctx).await;
    ctx.create_project("zed", "Elsewhere").await;
    let t = ctx
        .create_task(&p, "alice", json!({ "title": "T", "assignee": "bob" }))
        .await;
    ctx.create_task(&p, "alice", json!({ "title": "U", "assignee": "bob", "status": "in_progress" }))
        .await;
    ctx.create_task(&p, "alice", json!({ "title": "V" })).await;
    ctx.patch(
        &format!("/v1/projects/{}/tasks/{}/status", p, t),
        "bob",
        json!({ "status": "completed" }),
    )
    .await;

    let (status, body) = ctx.get("/v1/dashboard", "bob").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["statistics"]["total_projects"], 1);
    assert_eq!(body["statistics"]["total_assigned_tasks"], 2);
    assert_eq!(body["statistics"]["completed_tasks"], 1);
    assert_eq!(body["statistics"]["in_progress_tasks"], 1);
    assert_eq!(body["projects"][0]["user_role"], "developer");
    assert_eq!(body["projects"][0]["task_count"], 3);
    assert_eq!(body["my_tasks"][0]["project_name"], "Website relaunch");

    let (status, body) = ctx.get("/v1/dashboard/activity?limit=2", "bob").await;
    assert_eq!(status, StatusCode::OK);
    let activity = body["activity"].as_array().unwrap();
    assert_eq!(activity.len(), 2);
    assert_eq!(activity[0]["title"], "T");

    let (_, body) = ctx.get("/v1/dashboard/activity", "bob").await;
    assert_eq!(body["activity"].as_array().unwrap().len(), 3);

    let (status, _) = ctx.get("/v1/dashboard/activity?limit=0", "bob").await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}
