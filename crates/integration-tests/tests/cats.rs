//! Integration tests for cat CRUD and ownership scoping.

use axum::http::StatusCode;

use cat_collector_core::CatId;
use cat_collector_integration_tests::{TestApp, test_config, today};
use cat_collector_web::db::{CatRepository, ToyRepository};

// =============================================================================
// Login Required
// =============================================================================

#[tokio::test]
async fn test_cats_require_login_when_scoped() {
    let mut app = TestApp::new();

    let response = app.get("/cats").await;
    assert_eq!(response.status, StatusCode::SEE_OTHER);
    assert_eq!(response.location(), Some("/accounts/login?next=/cats"));

    let response = app.get("/cats/1").await;
    assert_eq!(response.location(), Some("/accounts/login?next=/cats/1"));
}

#[tokio::test]
async fn test_delete_without_login_is_unauthorized() {
    let mut app = TestApp::new();

    let response = app.delete("/toys/1").await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_unscoped_cats_need_no_login() {
    let mut app = TestApp::with_config(cat_collector_web::config::AppConfig {
        ownership_scoped: false,
        ..test_config()
    });

    let id = app.create_cat("Sachi", "calico", "2").await;
    let response = app.get("/cats").await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.contains("Sachi"));

    let cat = app.store.get_cat(id).await.unwrap().unwrap();
    assert_eq!(cat.owner, None);
}

// =============================================================================
// CRUD
// =============================================================================

#[tokio::test]
async fn test_create_and_show_cat() {
    let mut app = TestApp::new();
    app.signup("sylvia").await;

    let id = app.create_cat("Lolo", "tabby", "3").await;

    let response = app.get(&format!("/cats/{id}")).await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.contains("Lolo"));
    assert!(response.body.contains("Breed: tabby"));
    assert!(response.body.contains("Lolo might be hungry"));
    assert!(response.body.contains(&format!("value=\"{}\"", today())));

    let response = app.get("/cats").await;
    assert!(response.body.contains("Lolo"));
}

#[tokio::test]
async fn test_kitten_age_label() {
    let mut app = TestApp::new();
    app.signup("sylvia").await;

    let id = app.create_cat("Chunky Monkey", "long hair", "0").await;

    let response = app.get(&format!("/cats/{id}")).await;
    assert!(response.body.contains("Age: Kitten"));
}

#[tokio::test]
async fn test_invalid_cat_form_is_redisplayed() {
    let mut app = TestApp::new();
    app.signup("sylvia").await;

    let response = app
        .post_form(
            "/cats",
            &[("name", "Lolo"), ("breed", ""), ("description", "x"), ("age", "old")],
        )
        .await;

    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(response.body.contains("This field is required."));
    assert!(response.body.contains("value=\"Lolo\""));
}

#[tokio::test]
async fn test_update_keeps_name() {
    let mut app = TestApp::new();
    app.signup("sylvia").await;
    let id = app.create_cat("Lolo", "tabby", "3").await;

    let response = app
        .post_form(
            &format!("/cats/{id}"),
            &[
                ("name", "Renamed"),
                ("breed", "siamese"),
                ("description", "still a demon"),
                ("age", "4"),
            ],
        )
        .await;
    assert_eq!(response.location(), Some(format!("/cats/{id}").as_str()));

    let cat = app.store.get_cat(id).await.unwrap().unwrap();
    assert_eq!(cat.name, "Lolo");
    assert_eq!(cat.breed, "siamese");
    assert_eq!(cat.age, 4);
}

#[tokio::test]
async fn test_delete_cascades_but_keeps_toys() {
    let mut app = TestApp::new();
    app.signup("sylvia").await;
    let id = app.create_cat("Lolo", "tabby", "3").await;
    let toy_path = app.create_toy("Feather Wand", "rainbow").await;
    let toy_id = toy_path.trim_start_matches("/toys/");

    app.post_form(&format!("/cats/{id}/toys/{toy_id}"), &[]).await;
    let today = today();
    app.post_form(
        &format!("/cats/{id}/feedings"),
        &[("date", today.as_str()), ("meal", "B")],
    )
    .await;
    app.post_multipart(
        &format!("/cats/{id}/photos"),
        "photo-file",
        Some(("lolo.png", "image/png", b"png".as_slice())),
    )
    .await;

    let response = app.get(&format!("/cats/{id}/delete")).await;
    assert_eq!(response.status, StatusCode::OK);

    let response = app.post_form(&format!("/cats/{id}/delete"), &[]).await;
    assert_eq!(response.location(), Some("/cats"));

    assert!(app.store.get_cat(id).await.unwrap().is_none());
    assert!(app.store.list_feedings(id).await.unwrap().is_empty());
    assert!(app.store.list_photos(id).await.unwrap().is_empty());
    assert_eq!(app.store.list_toys().await.unwrap().len(), 1);

    let response = app.get(&toy_path).await;
    assert!(response.body.contains("No cats have this toy yet."));
}

#[tokio::test]
async fn test_missing_cat_is_not_found() {
    let mut app = TestApp::new();
    app.signup("sylvia").await;

    let response = app.get("/cats/999").await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);

    let response = app.post_form("/cats/999/delete", &[]).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

// =============================================================================
// Ownership
// =============================================================================

#[tokio::test]
async fn test_other_users_cat_is_forbidden() {
    let mut app = TestApp::new();
    app.signup("sylvia").await;
    let id = app.create_cat("Lolo", "tabby", "3").await;
    app.logout().await;

    app.signup("tom").await;

    let response = app.get(&format!("/cats/{id}")).await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);

    let response = app.post_form(&format!("/cats/{id}/delete"), &[]).await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);
    assert!(app.store.get_cat(id).await.unwrap().is_some());

    let response = app.get("/cats").await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(!response.body.contains("Lolo"));
}

#[tokio::test]
async fn test_cat_is_stamped_with_owner() {
    let mut app = TestApp::new();
    app.signup("sylvia").await;
    let id: CatId = app.create_cat("Lolo", "tabby", "3").await;

    let cat = app.store.get_cat(id).await.unwrap().unwrap();
    assert!(cat.owner.is_some());
}
