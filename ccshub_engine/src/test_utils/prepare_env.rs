use log::*;
use sqlx::{migrate::MigrateDatabase, Sqlite};

use crate::{
    db_types::{NewMerchandise, NewUser},
    AccountManagement,
    MerchandiseManagement,
    SqliteDatabase,
};

/// Sets up logging and a fresh, migrated database at `url`.
pub async fn prepare_test_env(url: &str) -> SqliteDatabase {
    dotenvy::from_filename(".env.test").ok();
    let _ = env_logger::try_init();
    debug!("🚀️ Logging initialised");
    create_database(url).await;
    let db = SqliteDatabase::new_with_url(url, 25).await.expect("Error creating connection to database");
    info!("🚀️ Migrations complete");
    db
}

/// A database file in the system temp directory. Burst tests need a real file so that several pool connections
/// share one database.
pub fn random_db_path() -> String {
    let dir = std::env::temp_dir();
    format!("sqlite://{}/ccshub_test_{}.db", dir.display(), rand::random::<u64>())
}

pub async fn create_database(url: &str) {
    if let Err(e) = Sqlite::drop_database(url).await {
        warn!("🚀️ Error dropping database {url}: {e:?}");
    }
    Sqlite::create_database(url).await.expect("Error creating database");
    info!("🚀️ Created Sqlite database {url}");
}

pub async fn drop_database(url: &str) {
    if let Err(e) = Sqlite::drop_database(url).await {
        warn!("🚀️ Error dropping database {url}: {e:?}");
    }
}

/// Inserts a customer and a merchandise item with the given stock. Returns `(user_id, merchandise_id)`.
pub async fn seed_customer_and_item(db: &SqliteDatabase, stock: i64) -> (i64, i64) {
    let user = db
        .create_user(NewUser::new("alice", "alice@example.com", "N/A"))
        .await
        .expect("Error creating test user");
    let item = NewMerchandise {
        name: "Hoodie".into(),
        description: "CCS hoodie".into(),
        price: 750.0,
        stock,
        image: None,
    };
    let item = db.create_merchandise(item).await.expect("Error creating test merchandise");
    (user.id, item.id)
}
