//! Repository for the `cars` table.

use ridepool_core::types::DbId;
use sqlx::PgPool;

use crate::models::car::{Car, UpsertCar};

/// Every `cars` column, in the order the model expects.
const COLUMNS: &str = "id, user_id, model, color, reg_number, created_at, updated_at";

/// Lookup and upsert for the one-car-per-user table.
pub struct CarRepo;

impl CarRepo {
    /// Find the car owned by a user, if any.
    pub async fn find_by_user(pool: &PgPool, user_id: DbId) -> Result<Option<Car>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM cars WHERE user_id = $1");
        sqlx::query_as::<_, Car>(&query)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    /// Create or replace a user's car (one car per user).
    pub async fn upsert(
        pool: &PgPool,
        user_id: DbId,
        input: &UpsertCar,
    ) -> Result<Car, sqlx::Error> {
        let query = format!(
            "INSERT INTO cars (user_id, model, color, reg_number) \
             VALUES ($1, $2, $3, $4) \
             ON CONFLICT (user_id) DO UPDATE SET \
                model = EXCLUDED.model, \
                color = EXCLUDED.color, \
                reg_number = EXCLUDED.reg_number \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Car>(&query)
            .bind(user_id)
            .bind(&input.model)
            .bind(&input.color)
            .bind(&input.reg_number)
            .fetch_one(pool)
            .await
    }
}
