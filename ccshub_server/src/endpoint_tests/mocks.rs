use ccshub_engine::{
    db_types::{
        Admin,
        Event,
        Merchandise,
        NewAdmin,
        NewEvent,
        NewMerchandise,
        NewOrder,
        NewUser,
        Order,
        OrderChanges,
        OrderUpdate,
        User,
    },
    traits::{
        AccountApiError,
        AccountManagement,
        AdminManagement,
        CatalogApiError,
        EventManagement,
        MerchandiseManagement,
        OrderFlowError,
        OrderManagement,
    },
};
use mockall::mock;

use crate::{
    errors::ServerError,
    oidc::{IdentityProvider, ProviderClaims, ProviderTokens},
};

mock! {
    pub AccountManager {}
    impl AccountManagement for AccountManager {
        async fn fetch_user_by_id(&self, user_id: i64) -> Result<Option<User>, AccountApiError>;
        async fn fetch_user_by_email(&self, email: &str) -> Result<Option<User>, AccountApiError>;
        async fn search_users<'a>(&self, keyword: Option<&'a str>) -> Result<Vec<User>, AccountApiError>;
        async fn create_user(&self, user: NewUser) -> Result<User, AccountApiError>;
        async fn fetch_or_create_user(&self, user: NewUser) -> Result<User, AccountApiError>;
        async fn delete_user(&self, user_id: i64) -> Result<bool, AccountApiError>;
    }
}

mock! {
    pub AdminManager {}
    impl AdminManagement for AdminManager {
        async fn fetch_admins(&self) -> Result<Vec<Admin>, AccountApiError>;
        async fn fetch_admin_by_id(&self, admin_id: i64) -> Result<Option<Admin>, AccountApiError>;
        async fn fetch_admin_by_username(&self, username: &str) -> Result<Option<Admin>, AccountApiError>;
        async fn create_admin(&self, admin: NewAdmin) -> Result<Admin, AccountApiError>;
        async fn update_admin(&self, admin_id: i64, admin: NewAdmin) -> Result<Option<Admin>, AccountApiError>;
        async fn delete_admin(&self, admin_id: i64) -> Result<bool, AccountApiError>;
    }
}

mock! {
    pub EventManager {}
    impl EventManagement for EventManager {
        async fn search_events<'a>(&self, keyword: Option<&'a str>) -> Result<Vec<Event>, CatalogApiError>;
        async fn fetch_event(&self, id: i64) -> Result<Option<Event>, CatalogApiError>;
        async fn fetch_event_image(&self, id: i64) -> Result<Option<Vec<u8>>, CatalogApiError>;
        async fn create_event(&self, event: NewEvent) -> Result<Event, CatalogApiError>;
        async fn update_event(&self, id: i64, event: NewEvent) -> Result<Option<Event>, CatalogApiError>;
        async fn delete_event(&self, id: i64) -> Result<bool, CatalogApiError>;
    }
}

// Orders and merchandise share one mock, since the order workflow needs both from the same backend.
mock! {
    pub ShopManager {}
    impl OrderManagement for ShopManager {
        async fn search_orders<'a>(&self, keyword: Option<&'a str>) -> Result<Vec<Order>, OrderFlowError>;
        async fn fetch_order(&self, order_id: i64) -> Result<Option<Order>, OrderFlowError>;
        async fn fetch_orders_for_user(&self, user_id: i64) -> Result<Vec<Order>, OrderFlowError>;
        async fn fetch_receipt_image(&self, order_id: i64) -> Result<Option<Vec<u8>>, OrderFlowError>;
        async fn insert_order(&self, order: NewOrder) -> Result<Order, OrderFlowError>;
        async fn update_order(&self, order_id: i64, changes: OrderChanges) -> Result<Option<OrderUpdate>, OrderFlowError>;
        async fn delete_order(&self, order_id: i64) -> Result<bool, OrderFlowError>;
    }
    impl MerchandiseManagement for ShopManager {
        async fn search_merchandise<'a>(&self, keyword: Option<&'a str>) -> Result<Vec<Merchandise>, CatalogApiError>;
        async fn fetch_merchandise(&self, id: i64) -> Result<Option<Merchandise>, CatalogApiError>;
        async fn fetch_merchandise_image(&self, id: i64) -> Result<Option<Vec<u8>>, CatalogApiError>;
        async fn create_merchandise(&self, item: NewMerchandise) -> Result<Merchandise, CatalogApiError>;
        async fn update_merchandise(&self, id: i64, item: NewMerchandise) -> Result<Option<Merchandise>, CatalogApiError>;
        async fn delete_merchandise(&self, id: i64) -> Result<bool, CatalogApiError>;
        async fn decrement_stock(&self, id: i64) -> Result<Option<i64>, CatalogApiError>;
    }
}

mock! {
    pub Provider {}
    impl IdentityProvider for Provider {
        fn authorization_url(&self, state: &str, redirect_uri: &str) -> String;
        async fn exchange_code(&self, code: &str, redirect_uri: &str) -> Result<ProviderTokens, ServerError>;
        async fn fetch_claims(&self, access_token: &str) -> Result<ProviderClaims, ServerError>;
        fn end_session_endpoint(&self) -> Option<String>;
    }
}
