use actix_web::{http::StatusCode, test::TestRequest, web, web::ServiceConfig};
use ccshub_engine::{traits::AccountApiError, AccountApi, AdminApi};
use serde_json::json;

use super::{
    helpers::{admin, issuer, send, user},
    mocks::{MockAccountManager, MockAdminManager},
};
use crate::{
    passwords::hash_password,
    routes::{AdminLoginRoute, LoginRoute, RegisterRoute},
};

fn configure_accounts(accounts: MockAccountManager) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        cfg.service(RegisterRoute::<MockAccountManager>::new())
            .service(LoginRoute::<MockAccountManager>::new())
            .app_data(web::Data::new(AccountApi::new(accounts)));
    }
}

fn configure_admins(admins: MockAdminManager) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        cfg.service(AdminLoginRoute::<MockAdminManager>::new()).app_data(web::Data::new(AdminApi::new(admins)));
    }
}

#[actix_web::test]
async fn register_issues_a_token() {
    let _ = env_logger::try_init().ok();
    let mut accounts = MockAccountManager::new();
    accounts
        .expect_create_user()
        .withf(|u| u.email == "bob@example.com" && u.username == "bob" && u.password_hash.starts_with("$argon2"))
        .times(1)
        .returning(|u| Ok(user(5, &u.username, &u.email)));
    let req = TestRequest::post()
        .uri("/api/auth/register")
        .set_json(json!({"username": "bob", "email": "bob@example.com", "password": "hunter22"}));
    let res = send(req, configure_accounts(accounts)).await;
    assert_eq!(res.status, StatusCode::OK);
    let body = res.json();
    assert_eq!(body["user"]["userId"], 5);
    assert_eq!(body["user"]["email"], "bob@example.com");
    assert!(body["user"].get("passwordHash").is_none());
    let identity = issuer().validate(body["token"].as_str().unwrap()).expect("token should validate");
    assert_eq!(identity.subject, "bob@example.com");
    assert_eq!(identity.user_id, Some(5));
    assert_eq!(identity.roles, vec!["USER".to_string()]);
}

#[actix_web::test]
async fn register_duplicate_email() {
    let _ = env_logger::try_init().ok();
    let mut accounts = MockAccountManager::new();
    accounts.expect_create_user().returning(|_| Err(AccountApiError::EmailAlreadyRegistered));
    let req = TestRequest::post()
        .uri("/api/auth/register")
        .set_json(json!({"username": "bob", "email": "bob@example.com", "password": "hunter22"}));
    let res = send(req, configure_accounts(accounts)).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.text(), r#"{"error":"Email is already registered"}"#);
}

#[actix_web::test]
async fn register_rejects_bad_input() {
    let _ = env_logger::try_init().ok();
    let mut accounts = MockAccountManager::new();
    accounts.expect_create_user().times(0);
    let req = TestRequest::post()
        .uri("/api/auth/register")
        .set_json(json!({"username": "bob", "email": "not-an-email", "password": "hunter22"}));
    let res = send(req, configure_accounts(accounts)).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.text(), r#"{"error":"Invalid email address"}"#);
}

#[actix_web::test]
async fn login_with_the_right_password() {
    let _ = env_logger::try_init().ok();
    let hash = hash_password("hunter22").unwrap();
    let mut accounts = MockAccountManager::new();
    accounts.expect_fetch_user_by_email().withf(|e| e.eq_ignore_ascii_case("bob@example.com")).returning(move |_| {
        let mut u = user(5, "bob", "bob@example.com");
        u.password_hash = hash.clone();
        Ok(Some(u))
    });
    let req =
        TestRequest::post().uri("/api/auth/login").set_json(json!({"email": "bob@example.com", "password": "hunter22"}));
    let res = send(req, configure_accounts(accounts)).await;
    assert_eq!(res.status, StatusCode::OK);
    let body = res.json();
    assert_eq!(body["user"]["username"], "bob");
    assert!(issuer().validate(body["token"].as_str().unwrap()).is_some());
}

#[actix_web::test]
async fn login_failures_share_one_message() {
    let _ = env_logger::try_init().ok();
    let hash = hash_password("hunter22").unwrap();
    let mut accounts = MockAccountManager::new();
    accounts.expect_fetch_user_by_email().returning(move |email| {
        if email.eq_ignore_ascii_case("bob@example.com") {
            let mut u = user(5, "bob", "bob@example.com");
            u.password_hash = hash.clone();
            Ok(Some(u))
        } else {
            Ok(None)
        }
    });
    let configure = configure_accounts(accounts);
    let wrong_password =
        TestRequest::post().uri("/api/auth/login").set_json(json!({"email": "bob@example.com", "password": "nope"}));
    let res = send(wrong_password, configure).await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    assert_eq!(res.text(), r#"{"error":"Invalid email or password"}"#);

    let mut accounts = MockAccountManager::new();
    accounts.expect_fetch_user_by_email().returning(|_| Ok(None));
    let unknown =
        TestRequest::post().uri("/api/auth/login").set_json(json!({"email": "eve@example.com", "password": "nope"}));
    let res = send(unknown, configure_accounts(accounts)).await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    assert_eq!(res.text(), r#"{"error":"Invalid email or password"}"#);
}

#[actix_web::test]
async fn externally_created_accounts_cannot_log_in_locally() {
    let _ = env_logger::try_init().ok();
    let mut accounts = MockAccountManager::new();
    accounts.expect_fetch_user_by_email().returning(|_| Ok(Some(user(9, "Ada", "ada@example.com"))));
    let req = TestRequest::post().uri("/api/auth/login").set_json(json!({"email": "ada@example.com", "password": "N/A"}));
    let res = send(req, configure_accounts(accounts)).await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn admin_login() {
    let _ = env_logger::try_init().ok();
    let hash = hash_password("s3cret").unwrap();
    let mut admins = MockAdminManager::new();
    admins
        .expect_fetch_admin_by_username()
        .returning(move |name| Ok(name.eq_ignore_ascii_case("root").then(|| admin(1, "root", &hash))));
    let req = TestRequest::post().uri("/api/admins/login").set_json(json!({"username": "root", "password": "s3cret"}));
    let res = send(req, configure_admins(admins)).await;
    assert_eq!(res.status, StatusCode::OK);
    let body = res.json();
    assert_eq!(body["message"], "Login successful");
    assert_eq!(body["admin"]["username"], "root");
    assert!(body["admin"].get("passwordHash").is_none());
    let identity = issuer().validate(body["token"].as_str().unwrap()).unwrap();
    assert!(identity.is_admin());
    assert_eq!(identity.subject, "root");
}

#[actix_web::test]
async fn admin_login_failure() {
    let _ = env_logger::try_init().ok();
    let hash = hash_password("s3cret").unwrap();
    let mut admins = MockAdminManager::new();
    admins.expect_fetch_admin_by_username().returning(move |_| Ok(Some(admin(1, "root", &hash))));
    let req = TestRequest::post().uri("/api/admins/login").set_json(json!({"username": "root", "password": "guess"}));
    let res = send(req, configure_admins(admins)).await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    assert_eq!(res.text(), r#"{"error":"Invalid username or password"}"#);
}
