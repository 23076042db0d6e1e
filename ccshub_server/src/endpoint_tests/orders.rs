//! The order workflow over HTTP. The inventory rule is checked through the calls the backend receives.
use actix_web::{http::StatusCode, test::TestRequest, web, web::ServiceConfig};
use ccshub_engine::{
    db_types::{Approval, OrderStatus, OrderUpdate, PaymentStatus},
    traits::CatalogApiError,
    OrderFlowApi,
};
use serde_json::json;

use super::{
    helpers::{admin_token, multipart, order, send, user_token, with_token, Part},
    mocks::MockShopManager,
};
use crate::{
    helpers::MAX_FORM_FIELD_BYTES,
    routes::{
        CreateOrderRoute,
        DeleteOrderRoute,
        EditOrderRoute,
        ReceiptImageRoute,
        UpdateOrderRoute,
        UploadReceiptRoute,
        UserOrdersRoute,
    },
};

fn configure(shop: MockShopManager) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        cfg.service(CreateOrderRoute::<MockShopManager>::new())
            .service(UploadReceiptRoute::<MockShopManager>::new())
            .service(ReceiptImageRoute::<MockShopManager>::new())
            .service(UpdateOrderRoute::<MockShopManager>::new())
            .service(EditOrderRoute::<MockShopManager>::new())
            .service(UserOrdersRoute::<MockShopManager>::new())
            .service(DeleteOrderRoute::<MockShopManager>::new())
            .app_data(web::Data::new(OrderFlowApi::new(shop)));
    }
}

fn approved_update(id: i64, merchandise_id: Option<i64>) -> OrderUpdate {
    OrderUpdate { order: order(id, merchandise_id, PaymentStatus::Approved), approval: Some(Approval { merchandise_id }) }
}

#[actix_web::test]
async fn checkout_defaults_and_never_touches_stock() {
    let _ = env_logger::try_init().ok();
    let mut shop = MockShopManager::new();
    shop.expect_insert_order()
        .withf(|o| {
            o.user_id == 1 &&
                o.merchandise_id == Some(4) &&
                o.payment_status == Some(PaymentStatus::VerificationNeeded) &&
                o.order_status == Some(OrderStatus::Processing) &&
                o.order_date.is_some()
        })
        .times(1)
        .returning(|o| Ok(order(21, o.merchandise_id, PaymentStatus::VerificationNeeded)));
    shop.expect_decrement_stock().times(0);
    let req = TestRequest::post()
        .uri("/api/orders/create")
        .set_json(json!({"userId": 1, "merchandiseId": 4, "totalAmount": 25.0}));
    let res = send(req, configure(shop)).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.json(), json!({"orderId": 21, "message": "Order created successfully", "status": "success"}));
}

#[actix_web::test]
async fn checkout_as_approved_still_leaves_stock_alone() {
    let _ = env_logger::try_init().ok();
    let mut shop = MockShopManager::new();
    shop.expect_insert_order()
        .withf(|o| o.payment_status == Some(PaymentStatus::Approved))
        .returning(|o| Ok(order(22, o.merchandise_id, PaymentStatus::Approved)));
    shop.expect_decrement_stock().times(0);
    let req = TestRequest::post().uri("/api/orders/create").set_json(json!({
        "userId": 1,
        "merchandiseId": 4,
        "totalAmount": 25.0,
        "orderDate": "2024-10-20T09:30",
        "paymentStatus": "Approved"
    }));
    let res = send(req, configure(shop)).await;
    assert_eq!(res.status, StatusCode::OK);
}

#[actix_web::test]
async fn checkout_drops_an_unreadable_receipt() {
    let _ = env_logger::try_init().ok();
    let mut shop = MockShopManager::new();
    shop.expect_insert_order()
        .withf(|o| o.receipt_image.is_none())
        .times(1)
        .returning(|o| Ok(order(23, o.merchandise_id, PaymentStatus::VerificationNeeded)));
    let req = TestRequest::post().uri("/api/orders/create").set_json(json!({
        "userId": 1,
        "eventId": 2,
        "totalAmount": 10.0,
        "receiptImageBase64": "data:image/png;base64,***not base64***"
    }));
    let res = send(req, configure(shop)).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.json()["orderId"], 23);
}

#[actix_web::test]
async fn approving_a_merchandise_order_takes_one_unit() {
    let _ = env_logger::try_init().ok();
    let mut shop = MockShopManager::new();
    shop.expect_update_order()
        .withf(|id, changes| {
            *id == 5 && changes.payment_status == Some(PaymentStatus::Approved) && changes.order_status.is_none()
        })
        .times(1)
        .returning(|id, _| Ok(Some(approved_update(id, Some(4)))));
    shop.expect_decrement_stock().withf(|id| *id == 4).times(1).returning(|_| Ok(Some(9)));
    let req = with_token(TestRequest::post().uri("/api/orders/update/5"), &admin_token())
        .set_json(json!({"paymentStatus": "Approved"}));
    let res = send(req, configure(shop)).await;
    assert_eq!(res.status, StatusCode::OK);
    let body = res.json();
    assert_eq!(body["orderId"], 5);
    assert_eq!(body["paymentStatus"], "Approved");
}

#[actix_web::test]
async fn re_approving_does_not_take_stock_again() {
    let _ = env_logger::try_init().ok();
    let mut shop = MockShopManager::new();
    shop.expect_update_order().returning(|id, _| {
        Ok(Some(OrderUpdate { order: order(id, Some(4), PaymentStatus::Approved), approval: None }))
    });
    shop.expect_decrement_stock().times(0);
    let req = with_token(TestRequest::post().uri("/api/orders/update/5"), &admin_token())
        .set_json(json!({"paymentStatus": "Approved", "orderStatus": "Completed"}));
    let res = send(req, configure(shop)).await;
    assert_eq!(res.status, StatusCode::OK);
}

#[actix_web::test]
async fn approving_an_event_order_leaves_stock_alone() {
    let _ = env_logger::try_init().ok();
    let mut shop = MockShopManager::new();
    shop.expect_update_order().returning(|id, _| Ok(Some(approved_update(id, None))));
    shop.expect_decrement_stock().times(0);
    let req = with_token(TestRequest::post().uri("/api/orders/update/6"), &admin_token())
        .set_json(json!({"paymentStatus": "Approved"}));
    let res = send(req, configure(shop)).await;
    assert_eq!(res.status, StatusCode::OK);
}

#[actix_web::test]
async fn stock_failures_do_not_fail_the_update() {
    let _ = env_logger::try_init().ok();
    let mut shop = MockShopManager::new();
    shop.expect_update_order().returning(|id, _| Ok(Some(approved_update(id, Some(4)))));
    shop.expect_decrement_stock()
        .times(1)
        .returning(|_| Err(CatalogApiError::DatabaseError("database is locked".into())));
    let req = with_token(TestRequest::post().uri("/api/orders/update/5"), &admin_token())
        .set_json(json!({"paymentStatus": "Approved"}));
    let res = send(req, configure(shop)).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.json()["paymentStatus"], "Approved");
}

#[actix_web::test]
async fn updating_a_missing_order() {
    let _ = env_logger::try_init().ok();
    let mut shop = MockShopManager::new();
    shop.expect_update_order().returning(|_, _| Ok(None));
    shop.expect_decrement_stock().times(0);
    let req = with_token(TestRequest::post().uri("/api/orders/update/99"), &admin_token())
        .set_json(json!({"orderStatus": "Cancelled"}));
    let res = send(req, configure(shop)).await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
    assert_eq!(res.text(), r#"{"error":"Order 99 not found"}"#);
}

#[actix_web::test]
async fn edit_with_bad_receipt_is_rejected() {
    let _ = env_logger::try_init().ok();
    let mut shop = MockShopManager::new();
    shop.expect_update_order().times(0);
    let req = with_token(TestRequest::put().uri("/api/orders/edit/5"), &admin_token()).set_json(json!({
        "userId": 1,
        "merchandiseId": 4,
        "totalAmount": 25.0,
        "receiptImageBase64": "%%%"
    }));
    let res = send(req, configure(shop)).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn edit_overwrites_references() {
    let _ = env_logger::try_init().ok();
    let mut shop = MockShopManager::new();
    shop.expect_update_order()
        .withf(|_, c| {
            c.user_id == Some(2) &&
                c.merchandise_id == Some(None) &&
                c.event_id == Some(Some(3)) &&
                c.total_amount == Some(40.0) &&
                c.receipt_image.as_deref() == Some(b"hi".as_slice())
        })
        .times(1)
        .returning(|id, _| Ok(Some(OrderUpdate { order: order(id, None, PaymentStatus::Pending), approval: None })));
    let req = with_token(TestRequest::put().uri("/api/orders/edit/5"), &admin_token()).set_json(json!({
        "userId": 2,
        "eventId": 3,
        "totalAmount": 40.0,
        "receiptImageBase64": "data:image/jpeg;base64,aGk="
    }));
    let res = send(req, configure(shop)).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.json()["orderId"], 5);
}

#[actix_web::test]
async fn receipt_upload_goes_back_to_verification() {
    let _ = env_logger::try_init().ok();
    let mut shop = MockShopManager::new();
    shop.expect_fetch_order().returning(|id| Ok(Some(order(id, Some(4), PaymentStatus::Rejected))));
    shop.expect_update_order()
        .withf(|id, c| {
            *id == 5 &&
                c.payment_status == Some(PaymentStatus::VerificationNeeded) &&
                c.receipt_image.as_deref() == Some(b"\xff\xd8receipt".as_slice()) &&
                c.order_status.is_none()
        })
        .times(1)
        .returning(|id, _| {
            Ok(Some(OrderUpdate { order: order(id, Some(4), PaymentStatus::VerificationNeeded), approval: None }))
        });
    shop.expect_decrement_stock().times(0);
    let req = multipart(TestRequest::post().uri("/api/orders/upload-receipt/5"), &[Part::File(
        "receiptImage",
        b"\xff\xd8receipt",
    )]);
    let res = send(req, configure(shop)).await;
    assert_eq!(res.status, StatusCode::OK);
}

#[actix_web::test]
async fn receipt_upload_needs_the_file() {
    let _ = env_logger::try_init().ok();
    let mut shop = MockShopManager::new();
    shop.expect_fetch_order().returning(|id| Ok(Some(order(id, Some(4), PaymentStatus::Pending))));
    shop.expect_update_order().times(0);
    let req =
        multipart(TestRequest::post().uri("/api/orders/upload-receipt/5"), &[Part::Text("note", "see attached")]);
    let res = send(req, configure(shop)).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.text(), r#"{"error":"Missing form field 'receiptImage'"}"#);
}

#[actix_web::test]
async fn oversized_receipts_are_rejected() {
    let _ = env_logger::try_init().ok();
    let mut shop = MockShopManager::new();
    shop.expect_fetch_order().returning(|id| Ok(Some(order(id, Some(4), PaymentStatus::Pending))));
    shop.expect_update_order().times(0);
    let image = vec![0u8; MAX_FORM_FIELD_BYTES + 1];
    let req = multipart(TestRequest::post().uri("/api/orders/upload-receipt/5"), &[Part::File("receiptImage", &image)]);
    let res = send(req, configure(shop)).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert!(res.json()["error"].as_str().unwrap().contains("'receiptImage' is too large"));
}

#[actix_web::test]
async fn receipt_upload_for_missing_order() {
    let _ = env_logger::try_init().ok();
    let mut shop = MockShopManager::new();
    shop.expect_fetch_order().returning(|_| Ok(None));
    shop.expect_update_order().times(0);
    let req = multipart(TestRequest::post().uri("/api/orders/upload-receipt/77"), &[Part::File("receiptImage", b"x")]);
    let res = send(req, configure(shop)).await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn fetch_receipt_image() {
    let _ = env_logger::try_init().ok();
    let mut shop = MockShopManager::new();
    shop.expect_fetch_receipt_image().returning(|id| Ok((id == 5).then(|| b"\xff\xd8receipt".to_vec())));
    let res = send(TestRequest::get().uri("/api/orders/receipt-image/5"), configure(shop)).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.header("content-type").as_deref(), Some("image/jpeg"));
    assert_eq!(res.body, b"\xff\xd8receipt".to_vec());

    let mut shop = MockShopManager::new();
    shop.expect_fetch_receipt_image().returning(|_| Ok(None));
    let res = send(TestRequest::get().uri("/api/orders/receipt-image/6"), configure(shop)).await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn user_order_history() {
    let _ = env_logger::try_init().ok();
    let mut shop = MockShopManager::new();
    shop.expect_fetch_orders_for_user()
        .withf(|id| *id == 1)
        .returning(|_| Ok(vec![order(5, Some(4), PaymentStatus::Pending), order(6, None, PaymentStatus::Approved)]));
    let req = with_token(TestRequest::get().uri("/api/orders/user/1"), &user_token());
    let res = send(req, configure(shop)).await;
    assert_eq!(res.status, StatusCode::OK);
    let body = res.json();
    assert_eq!(body.as_array().map(|a| a.len()), Some(2));
    assert_eq!(body[0]["merchandiseName"], "Hoodie");
}

#[actix_web::test]
async fn delete_order() {
    let _ = env_logger::try_init().ok();
    let mut shop = MockShopManager::new();
    shop.expect_delete_order().withf(|id| *id == 5).times(1).returning(|_| Ok(true));
    let req = with_token(TestRequest::delete().uri("/api/orders/delete/5"), &admin_token());
    let res = send(req, configure(shop)).await;
    assert_eq!(res.status, StatusCode::NO_CONTENT);
}

#[actix_web::test]
async fn malformed_json_is_a_bad_request() {
    let _ = env_logger::try_init().ok();
    let mut shop = MockShopManager::new();
    shop.expect_insert_order().times(0);
    let req = TestRequest::post()
        .uri("/api/orders/create")
        .insert_header(("Content-Type", "application/json"))
        .set_payload("{not json");
    let res = send(req, configure(shop)).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.header("content-type").as_deref(), Some("application/json"));
    assert!(res.json()["error"].as_str().unwrap().starts_with("Invalid JSON body."));
}

#[actix_web::test]
async fn non_numeric_order_ids_are_a_bad_request() {
    let _ = env_logger::try_init().ok();
    let mut shop = MockShopManager::new();
    shop.expect_fetch_order().times(0);
    shop.expect_update_order().times(0);
    let req = with_token(TestRequest::put().uri("/api/orders/edit/abc"), &admin_token())
        .set_json(json!({ "userId": 1, "merchandiseId": 4, "totalAmount": 25.0 }));
    let res = send(req, configure(shop)).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.header("content-type").as_deref(), Some("application/json"));
    assert!(res.json()["error"].as_str().unwrap().starts_with("Could not read request path"));
}
