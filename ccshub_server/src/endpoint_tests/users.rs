use actix_web::{http::StatusCode, test::TestRequest, web, web::ServiceConfig};
use ccshub_engine::AccountApi;

use super::{
    helpers::{admin_token, send, user, user_token, with_token},
    mocks::MockAccountManager,
};
use crate::routes::{DeleteUserRoute, SyncUserRoute, UserByIdRoute, UsersRoute};

fn configure(accounts: MockAccountManager) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        cfg.service(UsersRoute::<MockAccountManager>::new())
            .service(SyncUserRoute::<MockAccountManager>::new())
            .service(UserByIdRoute::<MockAccountManager>::new())
            .service(DeleteUserRoute::<MockAccountManager>::new())
            .app_data(web::Data::new(AccountApi::new(accounts)));
    }
}

#[actix_web::test]
async fn list_users_with_keyword() {
    let _ = env_logger::try_init().ok();
    let mut accounts = MockAccountManager::new();
    accounts
        .expect_search_users()
        .withf(|keyword| keyword.map(|k| k.eq_ignore_ascii_case("ali")).unwrap_or(false))
        .times(1)
        .returning(|_| Ok(vec![user(1, "alice", "alice@example.com")]));
    let req = with_token(TestRequest::get().uri("/api/users?keyword=%20ali%20"), &user_token());
    let res = send(req, configure(accounts)).await;
    assert_eq!(res.status, StatusCode::OK);
    let body = res.json();
    assert_eq!(body.as_array().map(|a| a.len()), Some(1));
    assert_eq!(body[0]["userId"], 1);
    assert!(body[0].get("passwordHash").is_none());
}

#[actix_web::test]
async fn blank_keyword_lists_everyone() {
    let _ = env_logger::try_init().ok();
    let mut accounts = MockAccountManager::new();
    accounts.expect_search_users().withf(|keyword| keyword.is_none()).times(1).returning(|_| {
        Ok(vec![user(1, "alice", "alice@example.com"), user(2, "bob", "bob@example.com")])
    });
    let req = with_token(TestRequest::get().uri("/api/users?keyword="), &user_token());
    let res = send(req, configure(accounts)).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.json().as_array().map(|a| a.len()), Some(2));
}

#[actix_web::test]
async fn unknown_user_is_not_found() {
    let _ = env_logger::try_init().ok();
    let mut accounts = MockAccountManager::new();
    accounts.expect_fetch_user_by_id().returning(|_| Ok(None));
    let req = with_token(TestRequest::get().uri("/api/users/42"), &user_token());
    let res = send(req, configure(accounts)).await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
    assert_eq!(res.text(), r#"{"error":"User 42 not found"}"#);
}

#[actix_web::test]
async fn sync_uses_the_token_identity() {
    let _ = env_logger::try_init().ok();
    let mut accounts = MockAccountManager::new();
    accounts
        .expect_fetch_or_create_user()
        .withf(|u| u.email == "alice@example.com" && u.password_hash == "N/A")
        .times(1)
        .returning(|u| Ok(user(1, &u.username, &u.email)));
    let req = with_token(TestRequest::post().uri("/api/users/sync"), &user_token());
    let res = send(req, configure(accounts)).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.json()["email"], "alice@example.com");
}

#[actix_web::test]
async fn sync_needs_a_token() {
    let _ = env_logger::try_init().ok();
    let mut accounts = MockAccountManager::new();
    accounts.expect_fetch_or_create_user().times(0);
    let res = send(TestRequest::post().uri("/api/users/sync"), configure(accounts)).await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn delete_user() {
    let _ = env_logger::try_init().ok();
    let mut accounts = MockAccountManager::new();
    accounts.expect_delete_user().returning(|id| Ok(id == 7));
    let req = with_token(TestRequest::delete().uri("/api/users/delete/7"), &admin_token());
    let res = send(req, configure(accounts)).await;
    assert_eq!(res.status, StatusCode::NO_CONTENT);

    let mut accounts = MockAccountManager::new();
    accounts.expect_delete_user().returning(|_| Ok(false));
    let req = with_token(TestRequest::delete().uri("/api/users/delete/8"), &admin_token());
    let res = send(req, configure(accounts)).await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn users_cannot_delete_users() {
    let _ = env_logger::try_init().ok();
    let mut accounts = MockAccountManager::new();
    accounts.expect_delete_user().times(0);
    let req = with_token(TestRequest::delete().uri("/api/users/delete/7"), &user_token());
    let res = send(req, configure(accounts)).await;
    assert_eq!(res.status, StatusCode::FORBIDDEN);
}
