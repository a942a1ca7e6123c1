use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Bootcamp {
    pub id: Uuid,
    /// Owner; non-admins may only mutate their own bootcamp
    pub user_id: Uuid,
    pub name: String,
    pub description: String,
    pub website: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub careers: Vec<String>,
    pub housing: bool,
    pub job_assistance: bool,
    pub job_guarantee: bool,
    pub accept_gi: bool,
    pub average_rating: Option<f64>,
    pub average_cost: Option<f64>,
    pub photo: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Create payload; unspecified flags default to false
#[derive(Debug, Deserialize)]
pub struct NewBootcamp {
    pub name: String,
    pub description: String,
    pub website: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    #[serde(default)]
    pub careers: Vec<String>,
    #[serde(default)]
    pub housing: bool,
    #[serde(default)]
    pub job_assistance: bool,
    #[serde(default)]
    pub job_guarantee: bool,
    #[serde(default)]
    pub accept_gi: bool,
}

/// Update payload; absent fields keep their stored values
#[derive(Debug, Deserialize)]
pub struct BootcampPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub website: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub careers: Option<Vec<String>>,
    pub housing: Option<bool>,
    pub job_assistance: Option<bool>,
    pub job_guarantee: Option<bool>,
    pub accept_gi: Option<bool>,
}

impl Bootcamp {
    pub async fn find(id: Uuid, pool: &PgPool) -> Result<Option<Bootcamp>, sqlx::Error> {
        sqlx::query_as::<_, Bootcamp>("SELECT * FROM bootcamps WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// The singleton rule check: does this user already own a bootcamp?
    pub async fn find_by_owner(
        user_id: Uuid,
        pool: &PgPool,
    ) -> Result<Option<Bootcamp>, sqlx::Error> {
        sqlx::query_as::<_, Bootcamp>("SELECT * FROM bootcamps WHERE user_id = $1 LIMIT 1")
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    pub async fn create(
        owner: Uuid,
        new: &NewBootcamp,
        pool: &PgPool,
    ) -> Result<Bootcamp, sqlx::Error> {
        sqlx::query_as::<_, Bootcamp>(
            "INSERT INTO bootcamps \
             (user_id, name, description, website, phone, email, address, latitude, longitude, \
              careers, housing, job_assistance, job_guarantee, accept_gi) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14) RETURNING *",
        )
        .bind(owner)
        .bind(&new.name)
        .bind(&new.description)
        .bind(&new.website)
        .bind(&new.phone)
        .bind(&new.email)
        .bind(&new.address)
        .bind(new.latitude)
        .bind(new.longitude)
        .bind(&new.careers)
        .bind(new.housing)
        .bind(new.job_assistance)
        .bind(new.job_guarantee)
        .bind(new.accept_gi)
        .fetch_one(pool)
        .await
    }

    pub async fn update(
        id: Uuid,
        patch: &BootcampPatch,
        pool: &PgPool,
    ) -> Result<Bootcamp, sqlx::Error> {
        sqlx::query_as::<_, Bootcamp>(
            "UPDATE bootcamps SET \
             name = COALESCE($2, name), \
             description = COALESCE($3, description), \
             website = COALESCE($4, website), \
             phone = COALESCE($5, phone), \
             email = COALESCE($6, email), \
             address = COALESCE($7, address), \
             latitude = COALESCE($8, latitude), \
             longitude = COALESCE($9, longitude), \
             careers = COALESCE($10, careers), \
             housing = COALESCE($11, housing), \
             job_assistance = COALESCE($12, job_assistance), \
             job_guarantee = COALESCE($13, job_guarantee), \
             accept_gi = COALESCE($14, accept_gi) \
             WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(&patch.name)
        .bind(&patch.description)
        .bind(&patch.website)
        .bind(&patch.phone)
        .bind(&patch.email)
        .bind(&patch.address)
        .bind(patch.latitude)
        .bind(patch.longitude)
        .bind(&patch.careers)
        .bind(patch.housing)
        .bind(patch.job_assistance)
        .bind(patch.job_guarantee)
        .bind(patch.accept_gi)
        .fetch_one(pool)
        .await
    }

    /// Courses and reviews go with it via FK cascade
    pub async fn delete(id: Uuid, pool: &PgPool) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM bootcamps WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }

    pub async fn set_photo(id: Uuid, filename: &str, pool: &PgPool) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE bootcamps SET photo = $2 WHERE id = $1")
            .bind(id)
            .bind(filename)
            .execute(pool)
            .await?;
        Ok(())
    }

    /// Great-circle radius search. `radius_radians` is the angular radius
    /// (distance / Earth radius); zero matches only the exact coordinate.
    pub async fn within_radius(
        latitude: f64,
        longitude: f64,
        radius_radians: f64,
        pool: &PgPool,
    ) -> Result<Vec<Bootcamp>, sqlx::Error> {
        sqlx::query_as::<_, Bootcamp>(
            "SELECT * FROM bootcamps \
             WHERE latitude IS NOT NULL AND longitude IS NOT NULL \
             AND acos(LEAST(1.0, GREATEST(-1.0, \
                 sin(radians($1)) * sin(radians(latitude)) + \
                 cos(radians($1)) * cos(radians(latitude)) * \
                 cos(radians(longitude) - radians($2))))) <= $3 \
             ORDER BY created_at DESC",
        )
        .bind(latitude)
        .bind(longitude)
        .bind(radius_radians)
        .fetch_all(pool)
        .await
    }
}
