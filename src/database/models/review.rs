use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Review {
    pub id: Uuid,
    pub bootcamp_id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub text: String,
    /// 1 to 10, enforced by a table constraint
    pub rating: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct NewReview {
    pub title: String,
    pub text: String,
    pub rating: i32,
}

#[derive(Debug, Deserialize)]
pub struct ReviewPatch {
    pub title: Option<String>,
    pub text: Option<String>,
    pub rating: Option<i32>,
}

impl Review {
    pub async fn find(id: Uuid, pool: &PgPool) -> Result<Option<Review>, sqlx::Error> {
        sqlx::query_as::<_, Review>("SELECT * FROM reviews WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// One review per user per bootcamp; the unique index turns a second
    /// attempt into a duplicate-key error.
    pub async fn create(
        bootcamp_id: Uuid,
        author: Uuid,
        new: &NewReview,
        pool: &PgPool,
    ) -> Result<Review, sqlx::Error> {
        let review = sqlx::query_as::<_, Review>(
            "INSERT INTO reviews (bootcamp_id, user_id, title, text, rating) \
             VALUES ($1, $2, $3, $4, $5) RETURNING *",
        )
        .bind(bootcamp_id)
        .bind(author)
        .bind(&new.title)
        .bind(&new.text)
        .bind(new.rating)
        .fetch_one(pool)
        .await?;

        Self::recalc_average_rating(bootcamp_id, pool).await?;
        Ok(review)
    }

    pub async fn update(
        id: Uuid,
        patch: &ReviewPatch,
        pool: &PgPool,
    ) -> Result<Review, sqlx::Error> {
        let review = sqlx::query_as::<_, Review>(
            "UPDATE reviews SET \
             title = COALESCE($2, title), \
             text = COALESCE($3, text), \
             rating = COALESCE($4, rating) \
             WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(&patch.title)
        .bind(&patch.text)
        .bind(patch.rating)
        .fetch_one(pool)
        .await?;

        Self::recalc_average_rating(review.bootcamp_id, pool).await?;
        Ok(review)
    }

    pub async fn delete(&self, pool: &PgPool) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM reviews WHERE id = $1")
            .bind(self.id)
            .execute(pool)
            .await?;
        Self::recalc_average_rating(self.bootcamp_id, pool).await?;
        Ok(())
    }

    pub async fn recalc_average_rating(
        bootcamp_id: Uuid,
        pool: &PgPool,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE bootcamps SET average_rating = \
             (SELECT AVG(rating) FROM reviews WHERE bootcamp_id = $1) \
             WHERE id = $1",
        )
        .bind(bootcamp_id)
        .execute(pool)
        .await?;
        Ok(())
    }
}
