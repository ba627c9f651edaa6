mod common;

use actix_web::http::StatusCode;
use actix_web::test;
use pretty_assertions::assert_eq;
use serde_json::json;

use common::{authed, create_project, create_task, init_app, register, send};

#[actix_rt::test]
async fn test_project_crud_flow() {
    let (app, _repo) = init_app().await;
    let _admin = register(&app, "admin").await;
    let alice = register(&app, "alice").await;

    let project = create_project(&app, &alice, "Website").await;
    let id = project["id"].as_str().unwrap().to_string();
    assert_eq!(project["status"], "active");
    assert_eq!(project["priority"], "high");
    assert_eq!(project["owner_id"], alice.id);

    let (status, list) = send(&app, authed(test::TestRequest::get().uri("/api/projects"), &alice)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list.as_array().unwrap().len(), 1);

    let req = authed(test::TestRequest::put().uri(&format!("/api/projects/{}", id)), &alice)
        .set_json(json!({ "name": "Website v2", "status": "completed" }));
    let (status, updated) = send(&app, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["name"], "Website v2");
    assert_eq!(updated["status"], "completed");
    assert_eq!(updated["priority"], "high");
    assert_eq!(updated["created_at"], project["created_at"]);

    let (status, fetched) = send(
        &app,
        authed(test::TestRequest::get().uri(&format!("/api/projects/{}", id)), &alice),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["name"], "Website v2");

    let (status, _) = send(
        &app,
        authed(test::TestRequest::delete().uri(&format!("/api/projects/{}", id)), &alice),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(
        &app,
        authed(test::TestRequest::get().uri(&format!("/api/projects/{}", id)), &alice),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[actix_rt::test]
async fn test_project_validation() {
    let (app, _repo) = init_app().await;
    let alice = register(&app, "alice").await;

    let long_name = "x".repeat(101);
    let invalid = [
        json!({ "name": "" }),
        json!({ "name": long_name }),
        json!({ "name": "ok", "priority": "urgent" }),
        json!({ "name": "ok", "status": "paused" }),
    ];
    for payload in invalid {
        let req = authed(test::TestRequest::post().uri("/api/projects"), &alice).set_json(&payload);
        let (status, _) = send(&app, req).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "accepted {}", payload);
    }
}

#[actix_rt::test]
async fn test_only_owner_or_admin_can_modify_project() {
    let (app, _repo) = init_app().await;
    let admin = register(&app, "admin").await;
    let alice = register(&app, "alice").await;
    let mallory = register(&app, "mallory").await;

    let project = create_project(&app, &alice, "Private").await;
    let uri = format!("/api/projects/{}", project["id"].as_str().unwrap());

    let (status, body) = send(&app, authed(test::TestRequest::get().uri(&uri), &mallory)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(body["error"].is_string());

    let req = authed(test::TestRequest::put().uri(&uri), &mallory).set_json(json!({ "name": "Mine" }));
    let (status, _) = send(&app, req).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(&app, authed(test::TestRequest::delete().uri(&uri), &mallory)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let req = authed(test::TestRequest::put().uri(&uri), &admin).set_json(json!({ "name": "Moderated" }));
    let (status, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Moderated");
    assert_eq!(body["owner_id"], alice.id);
}

#[actix_rt::test]
async fn test_deleting_project_removes_its_tasks() {
    let (app, _repo) = init_app().await;
    let alice = register(&app, "alice").await;

    let doomed = create_project(&app, &alice, "Doomed").await;
    let kept = create_project(&app, &alice, "Kept").await;
    let doomed_task = create_task(&app, &alice, json!({ "title": "a", "project_id": doomed["id"] })).await;
    create_task(&app, &alice, json!({ "title": "b", "project_id": doomed["id"] })).await;
    create_task(&app, &alice, json!({ "title": "c", "project_id": kept["id"] })).await;

    let (status, tasks) = send(
        &app,
        authed(
            test::TestRequest::get().uri(&format!("/api/projects/{}/tasks", doomed["id"].as_str().unwrap())),
            &alice,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(tasks.as_array().unwrap().len(), 2);

    let (status, _) = send(
        &app,
        authed(
            test::TestRequest::delete().uri(&format!("/api/projects/{}", doomed["id"].as_str().unwrap())),
            &alice,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(
        &app,
        authed(
            test::TestRequest::get().uri(&format!("/api/tasks/{}", doomed_task["id"].as_str().unwrap())),
            &alice,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, remaining) = send(&app, authed(test::TestRequest::get().uri("/api/tasks"), &alice)).await;
    let remaining = remaining.as_array().unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0]["title"], "c");
}

#[actix_rt::test]
async fn test_unknown_project_is_not_found() {
    let (app, _repo) = init_app().await;
    let alice = register(&app, "alice").await;

    let uri = format!("/api/projects/{}", uuid::Uuid::new_v4());
    let (status, _) = send(&app, authed(test::TestRequest::get().uri(&uri), &alice)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
