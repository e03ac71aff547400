mod common;

use axum::http::StatusCode;
use serde_json::json;
use tower::ServiceExt;

use common::{
    authed_json_request, authed_request, json_request, login_token, response_json, seed_identity,
    setup_test_app,
};
use lektora::modules::enrollments::model::{ApplicationStatus, NewCourseApplication};
use lektora::modules::enrollments::service::EnrollmentService;
use lektora::modules::enrollments::store::CourseApplicationStore;
use lektora::modules::identity::model::{Principal, Role};
use lektora::testing::test_app_state;

#[tokio::test]
async fn listener_can_register_login_and_apply() {
    let (app, stores) = setup_test_app();

    let specialist_id =
        seed_identity(&stores, Role::Specialist, "owner@lektora.test", "password123").await;
    let course_id = stores.courses.add_course(specialist_id, 4, 2).await;

    // Full flow through the API: register, log in, apply.
    let request = json_request(
        "POST",
        "/api/auth/register/listener",
        &json!({ "email": "student@lektora.test", "password": "password123" }),
    );
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let token = login_token(&app, "student@lektora.test", "password123").await;

    let request = authed_json_request(
        "POST",
        "/api/enrollments",
        &token,
        &json!({ "course_id": course_id }),
    );
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let body = response_json(response).await;
    assert_eq!(body["application"]["status"], "approved");
    assert_eq!(body["application"]["course_id"].as_i64().unwrap(), course_id);
    assert_eq!(body["progress"]["lessons_completed"], 0);
    assert_eq!(body["progress"]["tests_passed"], 0);
    assert_eq!(body["progress"]["progress_percent"], 0.0);
}

#[tokio::test]
async fn applying_twice_for_the_same_course_conflicts() {
    let (app, stores) = setup_test_app();

    let specialist_id =
        seed_identity(&stores, Role::Specialist, "owner@lektora.test", "password123").await;
    let course_id = stores.courses.add_course(specialist_id, 1, 1).await;
    seed_identity(&stores, Role::Listener, "student@lektora.test", "password123").await;

    let token = login_token(&app, "student@lektora.test", "password123").await;
    let body = json!({ "course_id": course_id });

    let response = app
        .clone()
        .oneshot(authed_json_request("POST", "/api/enrollments", &token, &body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .oneshot(authed_json_request("POST", "/api/enrollments", &token, &body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn applying_to_a_missing_course_is_not_found() {
    let (app, stores) = setup_test_app();
    seed_identity(&stores, Role::Listener, "student@lektora.test", "password123").await;

    let token = login_token(&app, "student@lektora.test", "password123").await;
    let response = app
        .oneshot(authed_json_request(
            "POST",
            "/api/enrollments",
            &token,
            &json!({ "course_id": 999 }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn specialists_cannot_apply() {
    let (app, stores) = setup_test_app();
    let specialist_id =
        seed_identity(&stores, Role::Specialist, "owner@lektora.test", "password123").await;
    let course_id = stores.courses.add_course(specialist_id, 1, 1).await;

    let token = login_token(&app, "owner@lektora.test", "password123").await;
    let response = app
        .oneshot(authed_json_request(
            "POST",
            "/api/enrollments",
            &token,
            &json!({ "course_id": course_id }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn only_the_owning_specialist_can_set_status() {
    let (app, stores) = setup_test_app();

    let owner_id = seed_identity(&stores, Role::Specialist, "owner@lektora.test", "password123").await;
    seed_identity(&stores, Role::Specialist, "other@lektora.test", "password123").await;
    let listener_id =
        seed_identity(&stores, Role::Listener, "student@lektora.test", "password123").await;
    let course_id = stores.courses.add_course(owner_id, 3, 1).await;

    // Seed a pending application directly; the API auto-approves on apply.
    let application = stores
        .applications
        .insert(NewCourseApplication {
            listener_id,
            course_id,
            status: ApplicationStatus::Pending,
        })
        .await
        .unwrap();
    let uri = format!("/api/enrollments/{}/status", application.id);

    let other_token = login_token(&app, "other@lektora.test", "password123").await;
    let response = app
        .clone()
        .oneshot(authed_json_request(
            "PATCH",
            &uri,
            &other_token,
            &json!({ "status": "approved" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let owner_token = login_token(&app, "owner@lektora.test", "password123").await;
    let response = app
        .clone()
        .oneshot(authed_json_request(
            "PATCH",
            &uri,
            &owner_token,
            &json!({ "status": "approved" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = response_json(response).await;
    assert_eq!(body["status"], "approved");

    // Approval created the zeroed progress counters.
    let listener_token = login_token(&app, "student@lektora.test", "password123").await;
    let response = app
        .oneshot(authed_request(
            "GET",
            &format!("/api/enrollments/progress/{course_id}"),
            &listener_token,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["lessons_completed"], 0);
    assert_eq!(body["progress_percent"], 0.0);
}

#[tokio::test]
async fn listeners_cannot_set_status() {
    let (app, stores) = setup_test_app();

    let owner_id = seed_identity(&stores, Role::Specialist, "owner@lektora.test", "password123").await;
    let listener_id =
        seed_identity(&stores, Role::Listener, "student@lektora.test", "password123").await;
    let course_id = stores.courses.add_course(owner_id, 1, 1).await;
    let application = stores
        .applications
        .insert(NewCourseApplication {
            listener_id,
            course_id,
            status: ApplicationStatus::Pending,
        })
        .await
        .unwrap();

    let token = login_token(&app, "student@lektora.test", "password123").await;
    let response = app
        .oneshot(authed_json_request(
            "PATCH",
            &format!("/api/enrollments/{}/status", application.id),
            &token,
            &json!({ "status": "approved" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn resolved_applications_cannot_change_status() {
    let (app, stores) = setup_test_app();

    let owner_id = seed_identity(&stores, Role::Specialist, "owner@lektora.test", "password123").await;
    let listener_id =
        seed_identity(&stores, Role::Listener, "student@lektora.test", "password123").await;
    let course_id = stores.courses.add_course(owner_id, 1, 1).await;
    let application = stores
        .applications
        .insert(NewCourseApplication {
            listener_id,
            course_id,
            status: ApplicationStatus::Approved,
        })
        .await
        .unwrap();

    let token = login_token(&app, "owner@lektora.test", "password123").await;
    let uri = format!("/api/enrollments/{}/status", application.id);

    let response = app
        .clone()
        .oneshot(authed_json_request(
            "PATCH",
            &uri,
            &token,
            &json!({ "status": "rejected" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    // Re-asserting the current status stays a no-op.
    let response = app
        .oneshot(authed_json_request(
            "PATCH",
            &uri,
            &token,
            &json!({ "status": "approved" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn progress_percent_sums_lesson_and_test_halves() {
    let (app, stores) = setup_test_app();

    let specialist_id =
        seed_identity(&stores, Role::Specialist, "owner@lektora.test", "password123").await;
    let course_id = stores.courses.add_course(specialist_id, 4, 2).await;
    seed_identity(&stores, Role::Listener, "student@lektora.test", "password123").await;

    let token = login_token(&app, "student@lektora.test", "password123").await;
    let response = app
        .clone()
        .oneshot(authed_json_request(
            "POST",
            "/api/enrollments",
            &token,
            &json!({ "course_id": course_id }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let lessons_uri = format!("/api/enrollments/progress/{course_id}/lessons");
    let tests_uri = format!("/api/enrollments/progress/{course_id}/tests");

    for _ in 0..2 {
        let response = app
            .clone()
            .oneshot(authed_request("POST", &lessons_uri, &token))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
    let response = app
        .clone()
        .oneshot(authed_request("POST", &tests_uri, &token))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = response_json(response).await;
    assert_eq!(body["lessons_completed"], 2);
    assert_eq!(body["tests_passed"], 1);
    // 50 * 2/4 + 50 * 1/2
    assert_eq!(body["progress_percent"], 50.0);
}

#[tokio::test]
async fn progress_updates_require_an_enrollment() {
    let (app, stores) = setup_test_app();

    let specialist_id =
        seed_identity(&stores, Role::Specialist, "owner@lektora.test", "password123").await;
    let course_id = stores.courses.add_course(specialist_id, 1, 1).await;
    seed_identity(&stores, Role::Listener, "student@lektora.test", "password123").await;

    let token = login_token(&app, "student@lektora.test", "password123").await;
    let response = app
        .oneshot(authed_request(
            "POST",
            &format!("/api/enrollments/progress/{course_id}/lessons"),
            &token,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn concurrent_applies_for_one_pair_yield_one_application() {
    let (state, stores) = test_app_state();

    let specialist_id = 1;
    let course_id = stores.courses.add_course(specialist_id, 1, 1).await;
    let listener = Principal {
        subject_id: 7,
        role: Role::Listener,
    };

    let (first, second) = tokio::join!(
        EnrollmentService::apply(&state, &listener, course_id),
        EnrollmentService::apply(&state, &listener, course_id),
    );

    let successes = [&first, &second].iter().filter(|r| r.is_ok()).count();
    assert_eq!(successes, 1, "exactly one apply may succeed");

    let stored = stores
        .applications
        .find_by_pair(listener.subject_id, course_id)
        .await
        .unwrap();
    assert!(stored.is_some());
}

#[tokio::test]
async fn listeners_see_their_own_applications() {
    let (app, stores) = setup_test_app();

    let specialist_id =
        seed_identity(&stores, Role::Specialist, "owner@lektora.test", "password123").await;
    let first_course = stores.courses.add_course(specialist_id, 1, 1).await;
    let second_course = stores.courses.add_course(specialist_id, 1, 1).await;
    seed_identity(&stores, Role::Listener, "student@lektora.test", "password123").await;

    let token = login_token(&app, "student@lektora.test", "password123").await;
    for course_id in [first_course, second_course] {
        let response = app
            .clone()
            .oneshot(authed_json_request(
                "POST",
                "/api/enrollments",
                &token,
                &json!({ "course_id": course_id }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let response = app
        .oneshot(authed_request("GET", "/api/enrollments/mine", &token))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn course_application_listing_is_owner_only() {
    let (app, stores) = setup_test_app();

    let owner_id = seed_identity(&stores, Role::Specialist, "owner@lektora.test", "password123").await;
    seed_identity(&stores, Role::Specialist, "other@lektora.test", "password123").await;
    let listener_id =
        seed_identity(&stores, Role::Listener, "student@lektora.test", "password123").await;
    let course_id = stores.courses.add_course(owner_id, 1, 1).await;
    stores
        .applications
        .insert(NewCourseApplication {
            listener_id,
            course_id,
            status: ApplicationStatus::Approved,
        })
        .await
        .unwrap();

    let uri = format!("/api/enrollments/courses/{course_id}");

    let owner_token = login_token(&app, "owner@lektora.test", "password123").await;
    let response = app
        .clone()
        .oneshot(authed_request("GET", &uri, &owner_token))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body.as_array().unwrap().len(), 1);

    let other_token = login_token(&app, "other@lektora.test", "password123").await;
    let response = app
        .oneshot(authed_request("GET", &uri, &other_token))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}
