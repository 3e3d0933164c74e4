//! Integration tests for toys and the cat/toy association.

use axum::http::StatusCode;

use cat_collector_core::ToyId;
use cat_collector_integration_tests::TestApp;
use cat_collector_web::db::{CatRepository, ToyRepository};

fn toy_id(path: &str) -> ToyId {
    ToyId::new(path.trim_start_matches("/toys/").parse().unwrap())
}

#[tokio::test]
async fn test_toy_crud() {
    let mut app = TestApp::new();
    app.signup("sylvia").await;

    let path = app.create_toy("Catnip Mouse", "grey").await;
    let response = app.get("/toys").await;
    assert!(response.body.contains("Catnip Mouse"));

    let response = app
        .post_form(&path, &[("name", "Catnip Mouse"), ("color", "pink")])
        .await;
    assert_eq!(response.location(), Some(path.as_str()));
    let toy = app.store.get_toy(toy_id(&path)).await.unwrap().unwrap();
    assert_eq!(toy.color, "pink");

    let response = app.post_form("/toys", &[("name", ""), ("color", "pink")]).await;
    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);

    let response = app.delete(&path).await;
    assert_eq!(response.status, StatusCode::NO_CONTENT);
    assert!(app.store.list_toys().await.unwrap().is_empty());

    let response = app.delete(&path).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_available_toys_move_on_association() {
    let mut app = TestApp::new();
    app.signup("sylvia").await;
    let cat = app.create_cat("Lolo", "tabby", "3").await;
    let wand = toy_id(&app.create_toy("Feather Wand", "rainbow").await);
    let ball = toy_id(&app.create_toy("Crinkle Ball", "silver").await);

    let response = app.get(&format!("/cats/{cat}")).await;
    assert!(response.body.contains("Lolo doesn"));

    let response = app.post_form(&format!("/cats/{cat}/toys/{wand}"), &[]).await;
    assert_eq!(response.location(), Some(format!("/cats/{cat}").as_str()));
    // Giving the same toy twice is harmless
    app.post_form(&format!("/cats/{cat}/toys/{wand}"), &[]).await;

    let toys: Vec<_> = app.store.list_cat_toys(cat).await.unwrap();
    let available: Vec<_> = app.store.list_available_toys(cat).await.unwrap();
    assert_eq!(toys.iter().map(|t| t.id).collect::<Vec<_>>(), [wand]);
    assert_eq!(available.iter().map(|t| t.id).collect::<Vec<_>>(), [ball]);

    app.post_form(&format!("/cats/{cat}/toys/{ball}"), &[]).await;
    let response = app.get(&format!("/cats/{cat}")).await;
    assert!(response.body.contains("Lolo already has all the available toys"));

    let response = app.get(&format!("/toys/{wand}")).await;
    assert!(response.body.contains("Lolo"));
}

#[tokio::test]
async fn test_dissociate_toy() {
    let mut app = TestApp::new();
    app.signup("sylvia").await;
    let cat = app.create_cat("Lolo", "tabby", "3").await;
    let wand = toy_id(&app.create_toy("Feather Wand", "rainbow").await);
    app.post_form(&format!("/cats/{cat}/toys/{wand}"), &[]).await;

    let response = app.delete(&format!("/cats/{cat}/toys/{wand}")).await;
    assert_eq!(response.status, StatusCode::NO_CONTENT);
    assert!(app.store.list_cat_toys(cat).await.unwrap().is_empty());

    // Removing a toy the cat doesn't have is not an error
    let response = app
        .post_form(&format!("/cats/{cat}/toys/{wand}/remove"), &[])
        .await;
    assert_eq!(response.status, StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn test_associate_missing_toy_is_not_found() {
    let mut app = TestApp::new();
    app.signup("sylvia").await;
    let cat = app.create_cat("Lolo", "tabby", "3").await;

    let response = app.post_form(&format!("/cats/{cat}/toys/999"), &[]).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_deleting_toy_keeps_cats() {
    let mut app = TestApp::new();
    app.signup("sylvia").await;
    let cat = app.create_cat("Lolo", "tabby", "3").await;
    let path = app.create_toy("Laser Pointer", "red").await;
    app.post_form(&format!("/cats/{cat}/toys/{}", toy_id(&path)), &[])
        .await;

    let response = app.post_form(&format!("{path}/delete"), &[]).await;
    assert_eq!(response.location(), Some("/toys"));

    assert!(app.store.get_cat(cat).await.unwrap().is_some());
    assert!(app.store.list_cat_toys(cat).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_toy_detail_only_lists_own_cats() {
    let mut app = TestApp::new();
    app.signup("sylvia").await;
    let lolo = app.create_cat("Lolo", "tabby", "3").await;
    let path = app.create_toy("Feather Wand", "rainbow").await;
    app.post_form(&format!("/cats/{lolo}/toys/{}", toy_id(&path)), &[])
        .await;
    app.logout().await;

    app.signup("tom").await;
    let response = app.get(&path).await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(!response.body.contains("Lolo"));
}
