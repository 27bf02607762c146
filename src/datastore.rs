//! Direct datastore access, bypassing the backend API.

use crate::error::ProbeResult;
use crate::models::{CollectionCounts, ConversationRecord};
use async_trait::async_trait;
use mongodb::bson::{doc, Document};
use mongodb::options::{ClientOptions, FindOneOptions};
use mongodb::{Client, Database};
use std::time::Duration;

pub const USERS: &str = "users";
pub const CONVERSATIONS: &str = "conversations";
pub const MESSAGES: &str = "messages";

/// Read-only view of the chat datastore.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn ping(&self) -> ProbeResult<()>;

    async fn collection_counts(&self) -> ProbeResult<CollectionCounts>;

    /// Lookup by natural key (`user_id`).
    async fn user_exists(&self, user_id: &str) -> ProbeResult<bool>;

    /// Fetch by natural key (`conversation_id`).
    async fn find_conversation(
        &self,
        conversation_id: &str,
    ) -> ProbeResult<Option<ConversationRecord>>;
}

/// MongoDB-backed store
///
/// The driver rediscovers the server after it restarts, so one client serves
/// the whole run. Server selection is kept short so a down server surfaces
/// as an error instead of a 30 second stall.
#[derive(Clone)]
pub struct MongoStore {
    client: Client,
    db_name: String,
}

impl MongoStore {
    pub async fn connect(url: &str, db_name: &str) -> ProbeResult<Self> {
        let mut options = ClientOptions::parse(url).await?;
        options.app_name = Some("persistence-probe".to_string());
        options.server_selection_timeout = Some(Duration::from_secs(5));
        options.connect_timeout = Some(Duration::from_secs(5));

        let client = Client::with_options(options)?;

        Ok(Self {
            client,
            db_name: db_name.to_string(),
        })
    }

    /// Underlying client, for sharing with a readiness check.
    pub fn client(&self) -> &Client {
        &self.client
    }

    fn db(&self) -> Database {
        self.client.database(&self.db_name)
    }

    async fn count(&self, collection: &str) -> ProbeResult<u64> {
        let count = self
            .db()
            .collection::<Document>(collection)
            .count_documents(doc! {}, None)
            .await?;
        Ok(count)
    }
}

#[async_trait]
impl DocumentStore for MongoStore {
    async fn ping(&self) -> ProbeResult<()> {
        self.db().run_command(doc! { "ping": 1 }, None).await?;
        Ok(())
    }

    async fn collection_counts(&self) -> ProbeResult<CollectionCounts> {
        Ok(CollectionCounts {
            users: self.count(USERS).await?,
            conversations: self.count(CONVERSATIONS).await?,
            messages: self.count(MESSAGES).await?,
        })
    }

    async fn user_exists(&self, user_id: &str) -> ProbeResult<bool> {
        let found = self
            .db()
            .collection::<Document>(USERS)
            .find_one(
                doc! { "user_id": user_id },
                FindOneOptions::builder()
                    .projection(doc! { "_id": 1 })
                    .build(),
            )
            .await?;
        Ok(found.is_some())
    }

    async fn find_conversation(
        &self,
        conversation_id: &str,
    ) -> ProbeResult<Option<ConversationRecord>> {
        let found = self
            .db()
            .collection::<Document>(CONVERSATIONS)
            .find_one(
                doc! { "conversation_id": conversation_id },
                FindOneOptions::builder()
                    .projection(doc! { "conversation_id": 1, "user_id": 1, "messages": 1 })
                    .build(),
            )
            .await?;

        Ok(found.as_ref().and_then(ConversationRecord::from_document))
    }
}
