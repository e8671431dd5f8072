use crate::models::{Campaign, SosRequest, User};
use mongodb::bson::doc;
use mongodb::options::IndexOptions;
use mongodb::{Client, Collection, Database, IndexModel};
use std::error::Error;

pub const USERS: &str = "users";
pub const CAMPAIGNS: &str = "campaigns";
pub const REQUESTS: &str = "requests";

#[derive(Clone)]
pub struct MongoDB {
    db: Database,
}

impl MongoDB {
    pub async fn new(uri: &str, db_name: &str) -> Result<Self, Box<dyn Error>> {
        let mut client_options = mongodb::options::ClientOptions::parse(uri).await?;

        client_options.app_name = Some("hemolink-service".to_string());
        client_options.max_pool_size = Some(20);
        client_options.min_pool_size = Some(2);
        client_options.max_idle_time = Some(std::time::Duration::from_secs(300));
        client_options.connect_timeout = Some(std::time::Duration::from_secs(5));
        client_options.server_selection_timeout = Some(std::time::Duration::from_secs(5));

        let client = Client::with_options(client_options)?;
        let db = client.database(db_name);

        // Test connection
        db.list_collection_names().await?;

        let mongodb = Self { db };
        mongodb.ensure_indexes().await?;

        Ok(mongodb)
    }

    async fn ensure_indexes(&self) -> Result<(), Box<dyn Error>> {
        log::info!("🔧 Creating database indexes...");

        let unique = IndexOptions::builder().unique(true).build();
        let email_index = IndexModel::builder()
            .keys(doc! { "email": 1 })
            .options(unique)
            .build();

        match self.users().create_index(email_index).await {
            Ok(_) => log::info!("   ✅ Index created: users(email) unique"),
            Err(e) => log::warn!("   ⚠️  users(email) index not created: {}", e),
        }

        // SOS matching and leaderboard both scan donors
        let donor_index = IndexModel::builder()
            .keys(doc! { "isDonor": 1, "bloodGroup": 1 })
            .build();

        match self.users().create_index(donor_index).await {
            Ok(_) => log::info!("   ✅ Index created: users(isDonor, bloodGroup)"),
            Err(e) => log::debug!("   ℹ️  Index already exists: {}", e),
        }

        let status_index = IndexModel::builder().keys(doc! { "status": 1 }).build();
        match self.campaigns().create_index(status_index).await {
            Ok(_) => log::info!("   ✅ Index created: campaigns(status)"),
            Err(e) => log::debug!("   ℹ️  Index already exists: {}", e),
        }

        let created_index = IndexModel::builder().keys(doc! { "createdAt": -1 }).build();
        match self.campaigns().create_index(created_index).await {
            Ok(_) => log::info!("   ✅ Index created: campaigns(createdAt)"),
            Err(e) => log::debug!("   ℹ️  Index already exists: {}", e),
        }

        let requests_index = IndexModel::builder().keys(doc! { "createdAt": -1 }).build();
        match self.requests().create_index(requests_index).await {
            Ok(_) => log::info!("   ✅ Index created: requests(createdAt)"),
            Err(e) => log::debug!("   ℹ️  Index already exists: {}", e),
        }

        log::info!("✅ Database indexes ready");

        Ok(())
    }

    pub fn collection<T: Send + Sync>(&self, name: &str) -> Collection<T> {
        self.db.collection(name)
    }

    pub fn users(&self) -> Collection<User> {
        self.collection(USERS)
    }

    pub fn campaigns(&self) -> Collection<Campaign> {
        self.collection(CAMPAIGNS)
    }

    pub fn requests(&self) -> Collection<SosRequest> {
        self.collection(REQUESTS)
    }

    pub async fn health_check(&self) -> Result<bool, mongodb::error::Error> {
        self.db.run_command(doc! { "ping": 1 }).await?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    #[ignore] // Requires MongoDB to be running
    async fn test_mongodb_connection() {
        dotenv::dotenv().ok();
        let uri = std::env::var("MONGODB_URI")
            .unwrap_or_else(|_| "mongodb://localhost:27017".to_string());

        let db = MongoDB::new(&uri, "hemolink_test").await;
        assert!(db.is_ok());
        assert!(db.unwrap().health_check().await.unwrap());
    }
}
