//! Request handler definitions
//!
//! Define each route and its handler here. Access control is not done here: the
//! [`crate::middleware::AccessControlFactory`] wrapped around the app applies the [`crate::policy::AccessPolicy`] table
//! before any handler runs. Handlers that need the caller take an [`Identity`] argument.
//!
//! A note about performance:
//! Since each worker thread processes its requests sequentially, handlers which block the current thread will cause the
//! current worker to stop processing new requests. Any long, non-cpu-bound operation (e.g. I/O, database operations,
//! etc.) should be expressed as futures or asynchronous functions, which don't block execution.
use actix_multipart::Multipart;
use actix_web::{get, http::header, web, HttpRequest, HttpResponse, Responder};
use ccshub_engine::{
    db_types::{NewAdmin, NewEvent, NewMerchandise, NewUser, Role},
    traits::{AccountManagement, AdminManagement, EventManagement, MerchandiseManagement, OrderManagement},
    AccountApi,
    AdminApi,
    EventApi,
    MerchandiseApi,
    OrderFlowApi,
};
use chrono::NaiveDate;
use log::*;

use crate::{
    auth::{Identity, TokenIssuer, TokenSubject},
    config::{FrontendConfig, OidcConfig},
    data_objects::{
        is_valid_email,
        AdminLoginRequest,
        AdminLoginResponse,
        AdminRequest,
        AuthResponse,
        LoginRequest,
        OrderCreatedResponse,
        OrderRequest,
        RegisterRequest,
        SearchParams,
        StatusUpdateRequest,
    },
    errors::{AuthError, ServerError},
    helpers::{request_host, FormFields},
    oidc::{
        callback_url,
        complete_login,
        expired_login_state_cookie,
        login_state_cookie,
        logout_url,
        new_login_state,
        CallbackParams,
        IdentityProvider,
        EXTERNAL_ACCOUNT_PASSWORD,
    },
    passwords::{hash_password, verify_password},
};

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
//
// * `route!(name => Get "/path")` for handlers without type parameters.
// * `route!(name => Get "/path" impl A + B)` for handlers with one backend type parameter carrying all the bounds.
// * `route!(name => Get "/path" impl A, B)` for handlers with one type parameter per bound, in that order.
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal) => {
        paste::paste! { pub struct [<$name:camel Route>];}
        paste::paste! {
            impl [<$name:camel Route>] {
                #[allow(clippy::new_without_default)]
                pub fn new() -> Self { Self }
            }
        }
        paste::paste! {
            impl actix_web::dev::HttpServiceFactory for [<$name:camel Route>] {
                fn register(self, config: &mut actix_web::dev::AppService) {
                    let res = actix_web::Resource::new($path)
                        .name(stringify!($name))
                        .guard(actix_web::guard::$method())
                        .to($name);
                    actix_web::dev::HttpServiceFactory::register(res, config);
                }
            }
        }
    };

    ($name:ident => $method:ident $path:literal impl $first:ident $(+ $rest:ident)+) => {
        paste::paste! { pub struct [<$name:camel Route>]<B>(core::marker::PhantomData<fn() -> B>);}
        paste::paste! { impl<B> [<$name:camel Route>]<B> {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self(core::marker::PhantomData::<fn() -> B>)
            }
        }}
        paste::paste! { impl<B> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<B>
        where
            B: $first $(+ $rest)+ + 'static,
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::<B>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };

    ($name:ident => $method:ident $path:literal impl $($bounds:ident),+) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

const IMAGE_CONTENT_TYPE: &str = "image/jpeg";

fn image_response(image: Option<Vec<u8>>, what: String) -> Result<HttpResponse, ServerError> {
    let image = image.ok_or_else(|| ServerError::NoRecordFound(format!("No image found for {what}")))?;
    Ok(HttpResponse::Ok().content_type(IMAGE_CONTENT_TYPE).body(image))
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------   Auth  ----------------------------------------------------
route!(register => Post "/api/auth/register" impl AccountManagement);
/// Registers a local account and logs the new user straight in.
pub async fn register<B: AccountManagement>(
    body: web::Json<RegisterRequest>,
    api: web::Data<AccountApi<B>>,
    issuer: web::Data<TokenIssuer>,
) -> Result<HttpResponse, ServerError> {
    let req = body.into_inner();
    let email = req.email.trim().to_string();
    trace!("💻️ Received registration request for {email}");
    if !is_valid_email(&email) {
        return Err(ServerError::InvalidRequestBody("Invalid email address".into()));
    }
    if req.username.trim().is_empty() || req.password.is_empty() {
        return Err(ServerError::InvalidRequestBody("A username and password are required".into()));
    }
    let password_hash = hash_password(&req.password)?;
    let user = api.register(NewUser::new(req.username.trim().to_string(), email, password_hash)).await?;
    let token = issuer.issue_token(&TokenSubject::from(&user), &[Role::User.to_string()])?;
    Ok(HttpResponse::Ok().json(AuthResponse { token, user }))
}

route!(login => Post "/api/auth/login" impl AccountManagement);
pub async fn login<B: AccountManagement>(
    body: web::Json<LoginRequest>,
    api: web::Data<AccountApi<B>>,
    issuer: web::Data<TokenIssuer>,
) -> Result<HttpResponse, ServerError> {
    let req = body.into_inner();
    trace!("💻️ Received login request for {}", req.email);
    let invalid = || ServerError::from(AuthError::InvalidCredentials("Invalid email or password".into()));
    let user = api.user_by_email(req.email.trim()).await?.ok_or_else(invalid)?;
    if !verify_password(&req.password, &user.password_hash) {
        debug!("💻️ Wrong password for user #{}", user.id);
        return Err(invalid());
    }
    let token = issuer.issue_token(&TokenSubject::from(&user), &[Role::User.to_string()])?;
    info!("💻️ User #{} logged in", user.id);
    Ok(HttpResponse::Ok().json(AuthResponse { token, user }))
}

route!(admin_login => Post "/api/admins/login" impl AdminManagement);
pub async fn admin_login<B: AdminManagement>(
    body: web::Json<AdminLoginRequest>,
    api: web::Data<AdminApi<B>>,
    issuer: web::Data<TokenIssuer>,
) -> Result<HttpResponse, ServerError> {
    let req = body.into_inner();
    trace!("💻️ Received admin login request for {}", req.username);
    let invalid = || ServerError::from(AuthError::InvalidCredentials("Invalid username or password".into()));
    let admin = api.admin_by_username(req.username.trim()).await?.ok_or_else(invalid)?;
    if !verify_password(&req.password, &admin.password_hash) {
        debug!("💻️ Wrong password for admin #{}", admin.id);
        return Err(invalid());
    }
    let token = issuer.issue_token(&TokenSubject::from(&admin), &admin.roles())?;
    info!("💻️ Admin {} logged in", admin.username);
    Ok(HttpResponse::Ok().json(AdminLoginResponse { message: "Login successful".into(), token, admin }))
}

//----------------------------------------------   External login  ---------------------------------------------------
fn check_registration(registration: &str, oidc: &OidcConfig) -> Result<(), ServerError> {
    if registration == oidc.registration_id {
        Ok(())
    } else {
        Err(ServerError::NoRecordFound(format!("Unknown login provider: {registration}")))
    }
}

route!(oauth2_authorization => Get "/oauth2/authorization/{registration}" impl IdentityProvider);
/// Starts a browser login with the identity provider.
pub async fn oauth2_authorization<P: IdentityProvider>(
    req: HttpRequest,
    path: web::Path<String>,
    provider: web::Data<P>,
    oidc: web::Data<OidcConfig>,
) -> Result<HttpResponse, ServerError> {
    check_registration(&path.into_inner(), &oidc)?;
    let state = new_login_state();
    let location = provider.authorization_url(&state, &callback_url(&req, &oidc));
    debug!("💻️ Sending browser to the identity provider");
    Ok(HttpResponse::Found()
        .cookie(login_state_cookie(&state, oidc.secure_cookies))
        .insert_header((header::LOCATION, location))
        .finish())
}

route!(oauth2_callback => Get "/login/oauth2/code/{registration}" impl AccountManagement, IdentityProvider);
/// The identity provider sends the browser back here after a login.
#[allow(clippy::too_many_arguments)]
pub async fn oauth2_callback<B: AccountManagement, P: IdentityProvider>(
    req: HttpRequest,
    path: web::Path<String>,
    params: web::Query<CallbackParams>,
    accounts: web::Data<AccountApi<B>>,
    provider: web::Data<P>,
    issuer: web::Data<TokenIssuer>,
    oidc: web::Data<OidcConfig>,
    frontend: web::Data<FrontendConfig>,
) -> Result<HttpResponse, ServerError> {
    check_registration(&path.into_inner(), &oidc)?;
    let location =
        complete_login(&req, params.into_inner(), &accounts, provider.as_ref(), &issuer, &oidc, &frontend).await?;
    Ok(HttpResponse::Found()
        .cookie(expired_login_state_cookie())
        .insert_header((header::LOCATION, location))
        .finish())
}

route!(logout => Get "/logout" impl IdentityProvider);
pub async fn logout<P: IdentityProvider>(
    req: HttpRequest,
    provider: web::Data<P>,
    frontend: web::Data<FrontendConfig>,
) -> HttpResponse {
    let host = request_host(&req);
    let location = logout_url(&host, provider.end_session_endpoint().as_deref(), &frontend);
    debug!("💻️ Logging out. Redirecting to {location}");
    HttpResponse::Found().cookie(expired_login_state_cookie()).insert_header((header::LOCATION, location)).finish()
}

route!(logout_post => Post "/logout" impl IdentityProvider);
pub async fn logout_post<P: IdentityProvider>(
    req: HttpRequest,
    provider: web::Data<P>,
    frontend: web::Data<FrontendConfig>,
) -> HttpResponse {
    logout::<P>(req, provider, frontend).await
}

//----------------------------------------------   Users  ----------------------------------------------------
route!(users => Get "/api/users" impl AccountManagement);
pub async fn users<B: AccountManagement>(
    query: web::Query<SearchParams>,
    api: web::Data<AccountApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let users = api.search_users(query.keyword()).await?;
    Ok(HttpResponse::Ok().json(users))
}

route!(user_by_id => Get "/api/users/{id:\\d+}" impl AccountManagement);
pub async fn user_by_id<B: AccountManagement>(
    path: web::Path<i64>,
    api: web::Data<AccountApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let id = path.into_inner();
    let user = api.user_by_id(id).await?.ok_or_else(|| ServerError::NoRecordFound(format!("User {id} not found")))?;
    Ok(HttpResponse::Ok().json(user))
}

route!(sync_user => Post "/api/users/sync" impl AccountManagement);
/// Returns the account for the caller's token, creating it on first sight.
pub async fn sync_user<B: AccountManagement>(
    identity: Identity,
    api: web::Data<AccountApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ Syncing account for {}", identity.email);
    let email = if identity.email.trim().is_empty() { identity.subject.clone() } else { identity.email.clone() };
    let username = if identity.name.trim().is_empty() { email.clone() } else { identity.name.clone() };
    let user = api.fetch_or_create(NewUser::new(username, email, EXTERNAL_ACCOUNT_PASSWORD.to_string())).await?;
    Ok(HttpResponse::Ok().json(user))
}

route!(delete_user => Delete "/api/users/delete/{id}" impl AccountManagement);
pub async fn delete_user<B: AccountManagement>(
    identity: Identity,
    path: web::Path<i64>,
    api: web::Data<AccountApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let id = path.into_inner();
    if !api.delete_user(id).await? {
        return Err(ServerError::NoRecordFound(format!("User {id} not found")));
    }
    info!("💻️ User #{id} deleted by {}", identity.subject);
    Ok(HttpResponse::NoContent().finish())
}

//----------------------------------------------   Admins  ----------------------------------------------------
route!(admins => Get "/api/admins" impl AdminManagement);
pub async fn admins<B: AdminManagement>(api: web::Data<AdminApi<B>>) -> Result<HttpResponse, ServerError> {
    let admins = api.admins().await?;
    Ok(HttpResponse::Ok().json(admins))
}

route!(admin_by_id => Get "/api/admins/{id}" impl AdminManagement);
pub async fn admin_by_id<B: AdminManagement>(
    path: web::Path<i64>,
    api: web::Data<AdminApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let admin =
        api.admin_by_id(path.into_inner()).await?.ok_or_else(|| ServerError::NoRecordFound("Admin not found".into()))?;
    Ok(HttpResponse::Ok().json(admin))
}

route!(create_admin => Post "/api/admins" impl AdminManagement);
pub async fn create_admin<B: AdminManagement>(
    body: web::Json<AdminRequest>,
    api: web::Data<AdminApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let req = body.into_inner();
    if req.username.trim().is_empty() || req.password.is_empty() {
        return Err(ServerError::InvalidRequestBody("A username and password are required".into()));
    }
    let admin = NewAdmin {
        username: req.username.trim().to_string(),
        role: admin_role(req.role),
        password_hash: hash_password(&req.password)?,
    };
    api.create_admin(admin).await?;
    Ok(HttpResponse::Created().body("Admin created successfully"))
}

route!(update_admin => Put "/api/admins/{id}" impl AdminManagement);
/// Replaces an admin. A blank password keeps the current one.
pub async fn update_admin<B: AdminManagement>(
    path: web::Path<i64>,
    body: web::Json<AdminRequest>,
    api: web::Data<AdminApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let id = path.into_inner();
    let req = body.into_inner();
    let existing = api.admin_by_id(id).await?.ok_or_else(|| ServerError::NoRecordFound("Admin not found".into()))?;
    let password_hash =
        if req.password.is_empty() { existing.password_hash } else { hash_password(&req.password)? };
    let admin = NewAdmin { username: req.username.trim().to_string(), role: admin_role(req.role), password_hash };
    api.update_admin(id, admin).await?.ok_or_else(|| ServerError::NoRecordFound("Admin not found".into()))?;
    Ok(HttpResponse::Ok().body("Admin updated successfully"))
}

route!(delete_admin => Delete "/api/admins/{id}" impl AdminManagement);
pub async fn delete_admin<B: AdminManagement>(
    path: web::Path<i64>,
    api: web::Data<AdminApi<B>>,
) -> Result<HttpResponse, ServerError> {
    if !api.delete_admin(path.into_inner()).await? {
        return Err(ServerError::NoRecordFound("Admin not found".into()));
    }
    Ok(HttpResponse::Ok().body("Admin deleted successfully"))
}

fn admin_role(role: Option<String>) -> String {
    role.map(|r| r.trim().to_ascii_uppercase()).filter(|r| !r.is_empty()).unwrap_or_else(|| Role::Admin.to_string())
}

//----------------------------------------------   Merchandise  ----------------------------------------------------
route!(merchandises => Get "/api/merchandises" impl MerchandiseManagement);
pub async fn merchandises<B: MerchandiseManagement>(
    api: web::Data<MerchandiseApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let items = api.search(None).await?;
    Ok(HttpResponse::Ok().json(items))
}

route!(search_merchandise => Get "/api/merchandises/search" impl MerchandiseManagement);
pub async fn search_merchandise<B: MerchandiseManagement>(
    query: web::Query<SearchParams>,
    api: web::Data<MerchandiseApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let items = api.search(query.keyword()).await?;
    Ok(HttpResponse::Ok().json(items))
}

route!(merchandise_by_id => Get "/api/merchandises/{id:\\d+}" impl MerchandiseManagement);
pub async fn merchandise_by_id<B: MerchandiseManagement>(
    path: web::Path<i64>,
    api: web::Data<MerchandiseApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let id = path.into_inner();
    let item =
        api.merchandise(id).await?.ok_or_else(|| ServerError::NoRecordFound(format!("Merchandise {id} not found")))?;
    Ok(HttpResponse::Ok().json(item))
}

route!(merchandise_image => Get "/api/merchandises/image/{id}" impl MerchandiseManagement);
pub async fn merchandise_image<B: MerchandiseManagement>(
    path: web::Path<i64>,
    api: web::Data<MerchandiseApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let id = path.into_inner();
    image_response(api.image(id).await?, format!("merchandise {id}"))
}

async fn merchandise_form(payload: Multipart) -> Result<NewMerchandise, ServerError> {
    let mut form = FormFields::read(payload).await?;
    Ok(NewMerchandise {
        name: form.required_text("name")?,
        description: form.text("description").unwrap_or_default(),
        price: form.parse("price")?,
        stock: form.parse("stock")?,
        image: form.file("imageFile"),
    })
}

route!(create_merchandise => Post "/api/merchandises/create" impl MerchandiseManagement);
pub async fn create_merchandise<B: MerchandiseManagement>(
    payload: Multipart,
    api: web::Data<MerchandiseApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let item = api.create(merchandise_form(payload).await?).await?;
    Ok(HttpResponse::Ok().json(item))
}

route!(edit_merchandise => Put "/api/merchandises/edit/{id}" impl MerchandiseManagement);
pub async fn edit_merchandise<B: MerchandiseManagement>(
    path: web::Path<i64>,
    payload: Multipart,
    api: web::Data<MerchandiseApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let id = path.into_inner();
    let item = api
        .update(id, merchandise_form(payload).await?)
        .await?
        .ok_or_else(|| ServerError::NoRecordFound(format!("Merchandise {id} not found")))?;
    Ok(HttpResponse::Ok().json(item))
}

route!(delete_merchandise => Delete "/api/merchandises/delete/{id}" impl MerchandiseManagement);
pub async fn delete_merchandise<B: MerchandiseManagement>(
    path: web::Path<i64>,
    api: web::Data<MerchandiseApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let id = path.into_inner();
    if !api.delete(id).await? {
        return Err(ServerError::NoRecordFound(format!("Merchandise {id} not found")));
    }
    Ok(HttpResponse::NoContent().finish())
}

//----------------------------------------------   Events  ----------------------------------------------------
route!(events => Get "/api/events" impl EventManagement);
pub async fn events<B: EventManagement>(
    query: web::Query<SearchParams>,
    api: web::Data<EventApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let events = api.search(query.keyword()).await?;
    Ok(HttpResponse::Ok().json(events))
}

route!(event_by_id => Get "/api/events/{id:\\d+}" impl EventManagement);
pub async fn event_by_id<B: EventManagement>(
    path: web::Path<i64>,
    api: web::Data<EventApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let id = path.into_inner();
    let event = api.event(id).await?.ok_or_else(|| ServerError::NoRecordFound(format!("Event {id} not found")))?;
    Ok(HttpResponse::Ok().json(event))
}

route!(event_image => Get "/api/events/image/{id}" impl EventManagement);
pub async fn event_image<B: EventManagement>(
    path: web::Path<i64>,
    api: web::Data<EventApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let id = path.into_inner();
    image_response(api.image(id).await?, format!("event {id}"))
}

async fn event_form(payload: Multipart) -> Result<NewEvent, ServerError> {
    let mut form = FormFields::read(payload).await?;
    Ok(NewEvent {
        title: form.required_text("title")?,
        description: form.text("description").unwrap_or_default(),
        location: form.text("location").unwrap_or_default(),
        event_date: form.parse::<NaiveDate>("eventDate")?,
        image: form.file("image"),
    })
}

route!(create_event => Post "/api/events/create" impl EventManagement);
pub async fn create_event<B: EventManagement>(
    payload: Multipart,
    api: web::Data<EventApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let event = api.create(event_form(payload).await?).await?;
    Ok(HttpResponse::Ok().json(event))
}

route!(update_event => Put "/api/events/update/{id}" impl EventManagement);
pub async fn update_event<B: EventManagement>(
    path: web::Path<i64>,
    payload: Multipart,
    api: web::Data<EventApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let id = path.into_inner();
    let event = api
        .update(id, event_form(payload).await?)
        .await?
        .ok_or_else(|| ServerError::NoRecordFound(format!("Event {id} not found")))?;
    Ok(HttpResponse::Ok().json(event))
}

route!(delete_event => Delete "/api/events/delete/{id}" impl EventManagement);
pub async fn delete_event<B: EventManagement>(
    path: web::Path<i64>,
    api: web::Data<EventApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let id = path.into_inner();
    if !api.delete(id).await? {
        return Err(ServerError::NoRecordFound(format!("Event {id} not found")));
    }
    Ok(HttpResponse::NoContent().finish())
}

//----------------------------------------------   Orders  ----------------------------------------------------
fn order_not_found(id: i64) -> ServerError {
    ServerError::NoRecordFound(format!("Order {id} not found"))
}

route!(orders => Get "/api/orders" impl OrderManagement + MerchandiseManagement);
pub async fn orders<B: OrderManagement + MerchandiseManagement>(
    query: web::Query<SearchParams>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let orders = api.orders(query.keyword()).await?;
    Ok(HttpResponse::Ok().json(orders))
}

route!(create_order => Post "/api/orders/create" impl OrderManagement + MerchandiseManagement);
/// Checkout. Never touches inventory, whatever status the order is created with.
pub async fn create_order<B: OrderManagement + MerchandiseManagement>(
    body: web::Json<OrderRequest>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let order = api.create_order(body.into_inner().into_new_order()).await?;
    Ok(HttpResponse::Ok().json(OrderCreatedResponse::new(order.id)))
}

route!(upload_receipt => Post "/api/orders/upload-receipt/{id}" impl OrderManagement + MerchandiseManagement);
/// Stores the payment receipt and sends the order back for verification.
pub async fn upload_receipt<B: OrderManagement + MerchandiseManagement>(
    path: web::Path<i64>,
    payload: Multipart,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let id = path.into_inner();
    if api.order(id).await?.is_none() {
        return Err(order_not_found(id));
    }
    let mut form = FormFields::read(payload).await?;
    let image = form
        .file("receiptImage")
        .ok_or_else(|| ServerError::InvalidRequestBody("Missing form field 'receiptImage'".into()))?;
    api.upload_receipt(id, image).await?.ok_or_else(|| order_not_found(id))?;
    Ok(HttpResponse::Ok().finish())
}

route!(receipt_image => Get "/api/orders/receipt-image/{id}" impl OrderManagement + MerchandiseManagement);
pub async fn receipt_image<B: OrderManagement + MerchandiseManagement>(
    path: web::Path<i64>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let id = path.into_inner();
    image_response(api.receipt_image(id).await?, format!("order {id}"))
}

route!(update_order => Post "/api/orders/update/{id}" impl OrderManagement + MerchandiseManagement);
/// Partial status change. Approving a merchandise order takes one unit of stock, once.
pub async fn update_order<B: OrderManagement + MerchandiseManagement>(
    path: web::Path<i64>,
    body: web::Json<StatusUpdateRequest>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let id = path.into_inner();
    let req = body.into_inner();
    let outcome = api.update_status(id, req.payment_status, req.order_status).await?.ok_or_else(|| order_not_found(id))?;
    debug!("💻️ Order #{id} updated. Inventory: {:?}", outcome.inventory);
    Ok(HttpResponse::Ok().json(outcome.order))
}

route!(edit_order => Put "/api/orders/edit/{id}" impl OrderManagement + MerchandiseManagement);
pub async fn edit_order<B: OrderManagement + MerchandiseManagement>(
    path: web::Path<i64>,
    body: web::Json<OrderRequest>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let id = path.into_inner();
    let edit = body.into_inner().try_into_edit()?;
    let outcome = api.edit_order(id, edit).await?.ok_or_else(|| order_not_found(id))?;
    debug!("💻️ Order #{id} edited. Inventory: {:?}", outcome.inventory);
    Ok(HttpResponse::Ok().json(outcome.order))
}

route!(user_orders => Get "/api/orders/user/{user_id}" impl OrderManagement + MerchandiseManagement);
pub async fn user_orders<B: OrderManagement + MerchandiseManagement>(
    path: web::Path<i64>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let orders = api.orders_for_user(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(orders))
}

route!(delete_order => Delete "/api/orders/delete/{id}" impl OrderManagement + MerchandiseManagement);
pub async fn delete_order<B: OrderManagement + MerchandiseManagement>(
    path: web::Path<i64>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    api.delete_order(path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}
