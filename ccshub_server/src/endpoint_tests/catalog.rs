use actix_web::{http::StatusCode, test::TestRequest, web, web::ServiceConfig};
use ccshub_engine::{
    db_types::{Event, Merchandise},
    traits::CatalogApiError,
    EventApi,
    MerchandiseApi,
};
use chrono::NaiveDate;

use super::{
    helpers::{admin_token, multipart, send, user_token, with_token, Part},
    mocks::{MockEventManager, MockShopManager},
};
use crate::routes::{
    CreateEventRoute,
    CreateMerchandiseRoute,
    DeleteEventRoute,
    DeleteMerchandiseRoute,
    EditMerchandiseRoute,
    EventByIdRoute,
    EventImageRoute,
    EventsRoute,
    MerchandiseByIdRoute,
    MerchandiseImageRoute,
    MerchandisesRoute,
    SearchMerchandiseRoute,
    UpdateEventRoute,
};

fn hoodie(id: i64, stock: i64) -> Merchandise {
    Merchandise {
        id,
        name: "Hoodie".into(),
        description: "Club hoodie".into(),
        price: 35.5,
        stock,
        has_image: true,
    }
}

fn meetup(id: i64) -> Event {
    Event {
        id,
        title: "Autumn meetup".into(),
        description: "Talks and snacks".into(),
        location: "Hall B".into(),
        event_date: NaiveDate::from_ymd_opt(2024, 11, 2).unwrap(),
        has_image: false,
    }
}

fn configure_merchandise(shop: MockShopManager) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        cfg.service(MerchandisesRoute::<MockShopManager>::new())
            .service(SearchMerchandiseRoute::<MockShopManager>::new())
            .service(MerchandiseByIdRoute::<MockShopManager>::new())
            .service(MerchandiseImageRoute::<MockShopManager>::new())
            .service(CreateMerchandiseRoute::<MockShopManager>::new())
            .service(EditMerchandiseRoute::<MockShopManager>::new())
            .service(DeleteMerchandiseRoute::<MockShopManager>::new())
            .app_data(web::Data::new(MerchandiseApi::new(shop)));
    }
}

fn configure_events(events: MockEventManager) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        cfg.service(EventsRoute::<MockEventManager>::new())
            .service(EventByIdRoute::<MockEventManager>::new())
            .service(EventImageRoute::<MockEventManager>::new())
            .service(CreateEventRoute::<MockEventManager>::new())
            .service(UpdateEventRoute::<MockEventManager>::new())
            .service(DeleteEventRoute::<MockEventManager>::new())
            .app_data(web::Data::new(EventApi::new(events)));
    }
}

//----------------------------------------------   Merchandise  ----------------------------------------------------

#[actix_web::test]
async fn browsing_merchandise_is_public() {
    let _ = env_logger::try_init().ok();
    let mut shop = MockShopManager::new();
    shop.expect_search_merchandise().withf(|k| k.is_none()).returning(|_| Ok(vec![hoodie(1, 3)]));
    shop.expect_fetch_merchandise().returning(|id| Ok((id == 1).then(|| hoodie(1, 3))));
    let configure = configure_merchandise(shop);
    let res = send(TestRequest::get().uri("/api/merchandises"), configure).await;
    assert_eq!(res.status, StatusCode::OK);
    let body = res.json();
    assert_eq!(body[0]["name"], "Hoodie");
    assert_eq!(body[0]["stock"], 3);

    let mut shop = MockShopManager::new();
    shop.expect_fetch_merchandise().returning(|id| Ok((id == 1).then(|| hoodie(1, 3))));
    let res = send(TestRequest::get().uri("/api/merchandises/2"), configure_merchandise(shop)).await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn search_merchandise() {
    let _ = env_logger::try_init().ok();
    let mut shop = MockShopManager::new();
    shop.expect_search_merchandise()
        .withf(|k| k.map(|k| k.eq_ignore_ascii_case("hood")).unwrap_or(false))
        .times(1)
        .returning(|_| Ok(vec![hoodie(1, 3)]));
    let res = send(TestRequest::get().uri("/api/merchandises/search?keyword=hood"), configure_merchandise(shop)).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.json().as_array().map(|a| a.len()), Some(1));
}

#[actix_web::test]
async fn create_merchandise_from_a_form() {
    let _ = env_logger::try_init().ok();
    let mut shop = MockShopManager::new();
    shop.expect_create_merchandise()
        .withf(|m| {
            m.name == "Hoodie" &&
                m.description == "Club hoodie" &&
                m.price == 35.5 &&
                m.stock == 10 &&
                m.image.as_deref() == Some(b"\xff\xd8jpeg".as_slice())
        })
        .times(1)
        .returning(|m| Ok(hoodie(8, m.stock)));
    let req = multipart(with_token(TestRequest::post().uri("/api/merchandises/create"), &admin_token()), &[
        Part::Text("name", "Hoodie"),
        Part::Text("description", "Club hoodie"),
        Part::Text("price", "35.5"),
        Part::Text("stock", "10"),
        Part::File("imageFile", b"\xff\xd8jpeg"),
    ]);
    let res = send(req, configure_merchandise(shop)).await;
    assert_eq!(res.status, StatusCode::OK);
    let body = res.json();
    assert_eq!(body["id"], 8);
    assert_eq!(body["stock"], 10);
}

#[actix_web::test]
async fn creating_merchandise_needs_an_admin() {
    let _ = env_logger::try_init().ok();
    let mut shop = MockShopManager::new();
    shop.expect_create_merchandise().times(0);
    let parts = [Part::Text("name", "Hoodie"), Part::Text("price", "35.5"), Part::Text("stock", "10")];
    let req = multipart(with_token(TestRequest::post().uri("/api/merchandises/create"), &user_token()), &parts);
    let res = send(req, configure_merchandise(shop)).await;
    assert_eq!(res.status, StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn rejected_merchandise() {
    let _ = env_logger::try_init().ok();
    let mut shop = MockShopManager::new();
    shop.expect_create_merchandise()
        .returning(|_| Err(CatalogApiError::InvalidItem("Stock cannot be negative".into())));
    let req = multipart(with_token(TestRequest::post().uri("/api/merchandises/create"), &admin_token()), &[
        Part::Text("name", "Hoodie"),
        Part::Text("price", "35.5"),
        Part::Text("stock", "-1"),
    ]);
    let res = send(req, configure_merchandise(shop)).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.text(), r#"{"error":"Stock cannot be negative"}"#);
}

#[actix_web::test]
async fn unparseable_price_is_a_bad_request() {
    let _ = env_logger::try_init().ok();
    let mut shop = MockShopManager::new();
    shop.expect_create_merchandise().times(0);
    let req = multipart(with_token(TestRequest::post().uri("/api/merchandises/create"), &admin_token()), &[
        Part::Text("name", "Hoodie"),
        Part::Text("price", "cheap"),
        Part::Text("stock", "1"),
    ]);
    let res = send(req, configure_merchandise(shop)).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn editing_without_an_image_keeps_it() {
    let _ = env_logger::try_init().ok();
    let mut shop = MockShopManager::new();
    shop.expect_update_merchandise()
        .withf(|id, m| *id == 8 && m.image.is_none() && m.stock == 4)
        .times(1)
        .returning(|id, m| Ok(Some(hoodie(id, m.stock))));
    let req = multipart(with_token(TestRequest::put().uri("/api/merchandises/edit/8"), &admin_token()), &[
        Part::Text("name", "Hoodie"),
        Part::Text("description", "Club hoodie"),
        Part::Text("price", "35.5"),
        Part::Text("stock", "4"),
        Part::File("imageFile", b""),
    ]);
    let res = send(req, configure_merchandise(shop)).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.json()["stock"], 4);
}

#[actix_web::test]
async fn merchandise_images() {
    let _ = env_logger::try_init().ok();
    let mut shop = MockShopManager::new();
    shop.expect_fetch_merchandise_image().returning(|id| Ok((id == 1).then(|| b"\xff\xd8jpeg".to_vec())));
    let res = send(TestRequest::get().uri("/api/merchandises/image/1"), configure_merchandise(shop)).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.header("content-type").as_deref(), Some("image/jpeg"));
    assert_eq!(res.body, b"\xff\xd8jpeg".to_vec());

    let mut shop = MockShopManager::new();
    shop.expect_fetch_merchandise_image().returning(|_| Ok(None));
    let res = send(TestRequest::get().uri("/api/merchandises/image/2"), configure_merchandise(shop)).await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn delete_merchandise() {
    let _ = env_logger::try_init().ok();
    let mut shop = MockShopManager::new();
    shop.expect_delete_merchandise().returning(|id| Ok(id == 8));
    let req = with_token(TestRequest::delete().uri("/api/merchandises/delete/8"), &admin_token());
    let res = send(req, configure_merchandise(shop)).await;
    assert_eq!(res.status, StatusCode::NO_CONTENT);
}

//----------------------------------------------   Events  ----------------------------------------------------

#[actix_web::test]
async fn browsing_events_is_public() {
    let _ = env_logger::try_init().ok();
    let mut events = MockEventManager::new();
    events.expect_search_events().returning(|_| Ok(vec![meetup(1)]));
    let res = send(TestRequest::get().uri("/api/events"), configure_events(events)).await;
    assert_eq!(res.status, StatusCode::OK);
    let body = res.json();
    assert_eq!(body[0]["eventId"], 1);
    assert_eq!(body[0]["eventDate"], "2024-11-02");

    let mut events = MockEventManager::new();
    events.expect_fetch_event().returning(|id| Ok(Some(meetup(id))));
    let res = send(TestRequest::get().uri("/api/events/3"), configure_events(events)).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.json()["title"], "Autumn meetup");
}

#[actix_web::test]
async fn create_event_from_a_form() {
    let _ = env_logger::try_init().ok();
    let mut events = MockEventManager::new();
    events
        .expect_create_event()
        .withf(|e| {
            e.title == "Autumn meetup" &&
                e.location == "Hall B" &&
                e.event_date == NaiveDate::from_ymd_opt(2024, 11, 2).unwrap() &&
                e.image.is_none()
        })
        .times(1)
        .returning(|_| Ok(meetup(4)));
    let req = multipart(with_token(TestRequest::post().uri("/api/events/create"), &admin_token()), &[
        Part::Text("title", "Autumn meetup"),
        Part::Text("description", "Talks and snacks"),
        Part::Text("location", "Hall B"),
        Part::Text("eventDate", "2024-11-02"),
    ]);
    let res = send(req, configure_events(events)).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.json()["eventId"], 4);
}

#[actix_web::test]
async fn event_with_a_bad_date() {
    let _ = env_logger::try_init().ok();
    let mut events = MockEventManager::new();
    events.expect_create_event().times(0);
    let req = multipart(with_token(TestRequest::post().uri("/api/events/create"), &admin_token()), &[
        Part::Text("title", "Autumn meetup"),
        Part::Text("eventDate", "next tuesday"),
    ]);
    let res = send(req, configure_events(events)).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn creating_events_needs_a_token() {
    let _ = env_logger::try_init().ok();
    let mut events = MockEventManager::new();
    events.expect_create_event().times(0);
    let req = multipart(TestRequest::post().uri("/api/events/create"), &[Part::Text("title", "Autumn meetup")]);
    let res = send(req, configure_events(events)).await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn update_and_delete_events() {
    let _ = env_logger::try_init().ok();
    let mut events = MockEventManager::new();
    events
        .expect_update_event()
        .withf(|id, e| *id == 4 && e.image.as_deref() == Some(b"png".as_slice()))
        .returning(|id, _| Ok(Some(meetup(id))));
    let req = multipart(with_token(TestRequest::put().uri("/api/events/update/4"), &admin_token()), &[
        Part::Text("title", "Autumn meetup"),
        Part::Text("eventDate", "2024-11-02"),
        Part::File("image", b"png"),
    ]);
    let res = send(req, configure_events(events)).await;
    assert_eq!(res.status, StatusCode::OK);

    let mut events = MockEventManager::new();
    events.expect_delete_event().returning(|_| Ok(false));
    let req = with_token(TestRequest::delete().uri("/api/events/delete/5"), &admin_token());
    let res = send(req, configure_events(events)).await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn event_images() {
    let _ = env_logger::try_init().ok();
    let mut events = MockEventManager::new();
    events.expect_fetch_event_image().returning(|_| Ok(None));
    let res = send(TestRequest::get().uri("/api/events/image/1"), configure_events(events)).await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
    assert_eq!(res.text(), r#"{"error":"No image found for event 1"}"#);
}
