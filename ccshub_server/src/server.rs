use std::{sync::Arc, time::Duration};

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, web::ServiceConfig, App, HttpServer};
use ccshub_engine::{
    traits::{AccountManagement, AdminManagement, EventManagement, MerchandiseManagement, OrderManagement},
    AccountApi,
    AdminApi,
    EventApi,
    MerchandiseApi,
    OrderFlowApi,
    SqliteDatabase,
};

use log::debug;

use crate::{
    auth::TokenIssuer,
    config::ServerConfig,
    errors::ServerError,
    middleware::AccessControlFactory,
    oidc::{HttpIdentityProvider, IdentityProvider},
    policy::AccessPolicy,
    routes::*,
};

const MAX_DB_CONNECTIONS: u32 = 25;

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, MAX_DB_CONNECTIONS)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let srv = create_server_instance(config, db)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

pub fn create_server_instance(config: ServerConfig, db: SqliteDatabase) -> Result<Server, ServerError> {
    let policy = Arc::new(AccessPolicy::default());
    let srv = HttpServer::new(move || {
        let issuer = TokenIssuer::new(&config.auth);
        let provider = HttpIdentityProvider::new(config.oidc.clone());
        App::new()
            .wrap(AccessControlFactory::new(Arc::clone(&policy), issuer.clone()))
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("ccshub::access_log"))
            .app_data(web::Data::new(AccountApi::new(db.clone())))
            .app_data(web::Data::new(AdminApi::new(db.clone())))
            .app_data(web::Data::new(MerchandiseApi::new(db.clone())))
            .app_data(web::Data::new(EventApi::new(db.clone())))
            .app_data(web::Data::new(OrderFlowApi::new(db.clone())))
            .app_data(web::Data::new(issuer))
            .app_data(web::Data::new(provider))
            .app_data(web::Data::new(config.oidc.clone()))
            .app_data(web::Data::new(config.frontend.clone()))
            .configure(configure_routes::<SqliteDatabase, HttpIdentityProvider>)
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((config.host.as_str(), config.port))?
    .run();
    Ok(srv)
}

/// Makes the JSON, path and query extractors fail with the same `{"error": ...}` bodies as the handlers do.
pub fn configure_extractors(cfg: &mut ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(|err, req| {
        debug!("💻️ Unreadable JSON body on {}. {err}", req.path());
        ServerError::InvalidRequestBody(format!("Invalid JSON body. {err}")).into()
    }))
    .app_data(web::PathConfig::default().error_handler(|err, req| {
        debug!("💻️ Unreadable path parameters on {}. {err}", req.path());
        ServerError::InvalidRequestPath(err.to_string()).into()
    }))
    .app_data(web::QueryConfig::default().error_handler(|err, req| {
        debug!("💻️ Unreadable query string on {}. {err}", req.path());
        ServerError::InvalidRequestBody(format!("Invalid query string. {err}")).into()
    }));
}

/// Registers every route. `B` is the storage backend and `P` the external identity provider.
pub fn configure_routes<B, P>(cfg: &mut ServiceConfig)
where
    B: AccountManagement + AdminManagement + MerchandiseManagement + EventManagement + OrderManagement + 'static,
    P: IdentityProvider + 'static,
{
    configure_extractors(cfg);
    cfg.service(health)
        // Auth
        .service(RegisterRoute::<B>::new())
        .service(LoginRoute::<B>::new())
        .service(AdminLoginRoute::<B>::new())
        .service(Oauth2AuthorizationRoute::<P>::new())
        .service(Oauth2CallbackRoute::<B, P>::new())
        .service(LogoutRoute::<P>::new())
        .service(LogoutPostRoute::<P>::new())
        // Users
        .service(UsersRoute::<B>::new())
        .service(SyncUserRoute::<B>::new())
        .service(UserByIdRoute::<B>::new())
        .service(DeleteUserRoute::<B>::new())
        // Admins
        .service(AdminsRoute::<B>::new())
        .service(CreateAdminRoute::<B>::new())
        .service(AdminByIdRoute::<B>::new())
        .service(UpdateAdminRoute::<B>::new())
        .service(DeleteAdminRoute::<B>::new())
        // Merchandise
        .service(MerchandisesRoute::<B>::new())
        .service(SearchMerchandiseRoute::<B>::new())
        .service(MerchandiseByIdRoute::<B>::new())
        .service(MerchandiseImageRoute::<B>::new())
        .service(CreateMerchandiseRoute::<B>::new())
        .service(EditMerchandiseRoute::<B>::new())
        .service(DeleteMerchandiseRoute::<B>::new())
        // Events
        .service(EventsRoute::<B>::new())
        .service(EventByIdRoute::<B>::new())
        .service(EventImageRoute::<B>::new())
        .service(CreateEventRoute::<B>::new())
        .service(UpdateEventRoute::<B>::new())
        .service(DeleteEventRoute::<B>::new())
        // Orders
        .service(OrdersRoute::<B>::new())
        .service(CreateOrderRoute::<B>::new())
        .service(UploadReceiptRoute::<B>::new())
        .service(ReceiptImageRoute::<B>::new())
        .service(UpdateOrderRoute::<B>::new())
        .service(EditOrderRoute::<B>::new())
        .service(UserOrdersRoute::<B>::new())
        .service(DeleteOrderRoute::<B>::new());
}
