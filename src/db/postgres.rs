//! PostgreSQL storage for users and strategies

use async_trait::async_trait;
use backon::{ExponentialBuilder, Retryable};
use chrono::{DateTime, Utc};
use std::time::Duration;
use tokio_postgres::{Client, NoTls, Row};
use tracing::{info, warn};

use crate::db::{DbResult, StrategyRepository, UserRepository};
use crate::models::strategy::{Condition, StrategyDraft, StrategyRecord, StrategyStatus};
use crate::models::user::User;

const CONNECT_ATTEMPTS: usize = 5;

const STRATEGY_COLUMNS: &str = "id, name, description, asset_type, buy_conditions, sell_conditions, status, user_id, created_at, updated_at";

fn db_error(context: &str, e: impl std::fmt::Display) -> Box<dyn std::error::Error + Send + Sync> {
    Box::new(std::io::Error::other(format!("{}: {}", context, e)))
}

pub struct PostgresDatabase {
    client: Client,
}

impl PostgresDatabase {
    /// Connect (retrying with exponential backoff) and create the schema
    pub async fn connect(database_url: &str) -> DbResult<Self> {
        let (client, connection) = (|| tokio_postgres::connect(database_url, NoTls))
            .retry(ExponentialBuilder::default().with_max_times(CONNECT_ATTEMPTS))
            .notify(|e: &tokio_postgres::Error, delay: Duration| {
                warn!(error = %e, delay_ms = delay.as_millis() as u64, "Postgres connection failed, retrying");
            })
            .await
            .map_err(|e| {
                Box::new(std::io::Error::new(
                    std::io::ErrorKind::ConnectionRefused,
                    format!("Failed to connect to Postgres: {}", e),
                )) as Box<dyn std::error::Error + Send + Sync>
            })?;

        tokio::spawn(async move {
            if let Err(e) = connection.await {
                tracing::error!(error = %e, "Postgres connection error");
            }
        });

        let db = Self { client };
        db.init_schema().await?;
        info!("Postgres schema ready");

        Ok(db)
    }

    async fn init_schema(&self) -> DbResult<()> {
        self.client
            .batch_execute(
                "CREATE TABLE IF NOT EXISTS users (
                    id BIGSERIAL PRIMARY KEY,
                    username VARCHAR(100) UNIQUE NOT NULL,
                    password VARCHAR(200) NOT NULL
                );
                CREATE TABLE IF NOT EXISTS strategies (
                    id BIGSERIAL PRIMARY KEY,
                    name VARCHAR(100) NOT NULL,
                    description VARCHAR(200) NOT NULL,
                    asset_type VARCHAR(50) NOT NULL,
                    buy_conditions TEXT NOT NULL,
                    sell_conditions TEXT NOT NULL,
                    status VARCHAR(20) NOT NULL,
                    user_id BIGINT NOT NULL REFERENCES users(id),
                    created_at TIMESTAMPTZ NOT NULL,
                    updated_at TIMESTAMPTZ NOT NULL
                );
                CREATE INDEX IF NOT EXISTS strategies_user_id_idx ON strategies (user_id);",
            )
            .await
            .map_err(|e| db_error("Failed to create schema", e))
    }

    fn strategy_from_row(row: &Row) -> DbResult<StrategyRecord> {
        let buy_json: String = row.get(4);
        let sell_json: String = row.get(5);
        let status: String = row.get(6);

        let buy_conditions: Condition = serde_json::from_str(&buy_json)
            .map_err(|e| db_error("Failed to deserialize buy conditions", e))?;
        let sell_conditions: Condition = serde_json::from_str(&sell_json)
            .map_err(|e| db_error("Failed to deserialize sell conditions", e))?;
        let status = StrategyStatus::parse(&status)
            .ok_or_else(|| db_error("Unknown strategy status", &status))?;

        Ok(StrategyRecord {
            id: row.get(0),
            name: row.get(1),
            description: row.get(2),
            asset_type: row.get(3),
            buy_conditions,
            sell_conditions,
            status,
            user_id: row.get(7),
            created_at: row.get::<_, DateTime<Utc>>(8),
            updated_at: row.get::<_, DateTime<Utc>>(9),
        })
    }

    fn conditions_json(draft: &StrategyDraft) -> DbResult<(String, String)> {
        let buy = serde_json::to_string(&draft.buy_conditions)
            .map_err(|e| db_error("Failed to serialize buy conditions", e))?;
        let sell = serde_json::to_string(&draft.sell_conditions)
            .map_err(|e| db_error("Failed to serialize sell conditions", e))?;
        Ok((buy, sell))
    }
}

#[async_trait]
impl UserRepository for PostgresDatabase {
    async fn create_user(&self, username: &str, password_hash: &str) -> DbResult<Option<i64>> {
        let row = self
            .client
            .query_opt(
                "INSERT INTO users (username, password) VALUES ($1, $2)
                 ON CONFLICT (username) DO NOTHING
                 RETURNING id",
                &[&username, &password_hash],
            )
            .await
            .map_err(|e| db_error("Failed to create user", e))?;

        Ok(row.map(|r| r.get(0)))
    }

    async fn find_user_by_username(&self, username: &str) -> DbResult<Option<User>> {
        let row = self
            .client
            .query_opt(
                "SELECT id, username, password FROM users WHERE username = $1",
                &[&username],
            )
            .await
            .map_err(|e| db_error("Failed to query user", e))?;

        Ok(row.map(|r| User {
            id: r.get(0),
            username: r.get(1),
            password_hash: r.get(2),
        }))
    }
}

#[async_trait]
impl StrategyRepository for PostgresDatabase {
    async fn create_strategy(&self, user_id: i64, draft: &StrategyDraft) -> DbResult<i64> {
        let (buy_json, sell_json) = Self::conditions_json(draft)?;
        let now = Utc::now();

        let row = self
            .client
            .query_one(
                "INSERT INTO strategies (name, description, asset_type, buy_conditions, sell_conditions, status, user_id, created_at, updated_at)
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $8)
                 RETURNING id",
                &[
                    &draft.name,
                    &draft.description,
                    &draft.asset_type,
                    &buy_json,
                    &sell_json,
                    &draft.status.as_str(),
                    &user_id,
                    &now,
                ],
            )
            .await
            .map_err(|e| db_error("Failed to create strategy", e))?;

        Ok(row.get(0))
    }

    async fn get_strategy(&self, id: i64) -> DbResult<Option<StrategyRecord>> {
        let query = format!("SELECT {} FROM strategies WHERE id = $1", STRATEGY_COLUMNS);
        let row = self
            .client
            .query_opt(&query, &[&id])
            .await
            .map_err(|e| db_error("Failed to query strategy", e))?;

        row.as_ref().map(Self::strategy_from_row).transpose()
    }

    async fn get_strategies_for_user(&self, user_id: i64) -> DbResult<Vec<StrategyRecord>> {
        let query = format!(
            "SELECT {} FROM strategies WHERE user_id = $1 ORDER BY id",
            STRATEGY_COLUMNS
        );
        let rows = self
            .client
            .query(&query, &[&user_id])
            .await
            .map_err(|e| db_error("Failed to query strategies", e))?;

        rows.iter().map(Self::strategy_from_row).collect()
    }

    async fn update_strategy(&self, id: i64, draft: &StrategyDraft) -> DbResult<bool> {
        let (buy_json, sell_json) = Self::conditions_json(draft)?;
        let now = Utc::now();

        let rows_affected = self
            .client
            .execute(
                "UPDATE strategies
                 SET name = $1, description = $2, asset_type = $3, buy_conditions = $4,
                     sell_conditions = $5, status = $6, updated_at = $7
                 WHERE id = $8",
                &[
                    &draft.name,
                    &draft.description,
                    &draft.asset_type,
                    &buy_json,
                    &sell_json,
                    &draft.status.as_str(),
                    &now,
                    &id,
                ],
            )
            .await
            .map_err(|e| db_error("Failed to update strategy", e))?;

        Ok(rows_affected > 0)
    }

    async fn delete_strategy(&self, id: i64) -> DbResult<bool> {
        let rows_affected = self
            .client
            .execute("DELETE FROM strategies WHERE id = $1", &[&id])
            .await
            .map_err(|e| db_error("Failed to delete strategy", e))?;

        Ok(rows_affected > 0)
    }
}
