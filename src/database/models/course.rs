use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "skill_level", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum SkillLevel {
    Beginner,
    Intermediate,
    Advanced,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Course {
    pub id: Uuid,
    pub bootcamp_id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub description: String,
    pub weeks: i32,
    pub tuition: f64,
    pub minimum_skill: SkillLevel,
    pub scholarship_available: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct NewCourse {
    pub title: String,
    pub description: String,
    pub weeks: i32,
    pub tuition: f64,
    pub minimum_skill: SkillLevel,
    #[serde(default)]
    pub scholarship_available: bool,
}

#[derive(Debug, Deserialize)]
pub struct CoursePatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub weeks: Option<i32>,
    pub tuition: Option<f64>,
    pub minimum_skill: Option<SkillLevel>,
    pub scholarship_available: Option<bool>,
}

impl Course {
    pub async fn find(id: Uuid, pool: &PgPool) -> Result<Option<Course>, sqlx::Error> {
        sqlx::query_as::<_, Course>("SELECT * FROM courses WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn create(
        bootcamp_id: Uuid,
        owner: Uuid,
        new: &NewCourse,
        pool: &PgPool,
    ) -> Result<Course, sqlx::Error> {
        let course = sqlx::query_as::<_, Course>(
            "INSERT INTO courses \
             (bootcamp_id, user_id, title, description, weeks, tuition, minimum_skill, \
              scholarship_available) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING *",
        )
        .bind(bootcamp_id)
        .bind(owner)
        .bind(&new.title)
        .bind(&new.description)
        .bind(new.weeks)
        .bind(new.tuition)
        .bind(new.minimum_skill)
        .bind(new.scholarship_available)
        .fetch_one(pool)
        .await?;

        Self::recalc_average_cost(bootcamp_id, pool).await?;
        Ok(course)
    }

    pub async fn update(
        id: Uuid,
        patch: &CoursePatch,
        pool: &PgPool,
    ) -> Result<Course, sqlx::Error> {
        let course = sqlx::query_as::<_, Course>(
            "UPDATE courses SET \
             title = COALESCE($2, title), \
             description = COALESCE($3, description), \
             weeks = COALESCE($4, weeks), \
             tuition = COALESCE($5, tuition), \
             minimum_skill = COALESCE($6, minimum_skill), \
             scholarship_available = COALESCE($7, scholarship_available) \
             WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(&patch.title)
        .bind(&patch.description)
        .bind(patch.weeks)
        .bind(patch.tuition)
        .bind(patch.minimum_skill)
        .bind(patch.scholarship_available)
        .fetch_one(pool)
        .await?;

        Self::recalc_average_cost(course.bootcamp_id, pool).await?;
        Ok(course)
    }

    pub async fn delete(&self, pool: &PgPool) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM courses WHERE id = $1")
            .bind(self.id)
            .execute(pool)
            .await?;
        Self::recalc_average_cost(self.bootcamp_id, pool).await?;
        Ok(())
    }

    /// Keep the parent bootcamp's average_cost in sync with its courses.
    /// NULL when the last course goes away.
    pub async fn recalc_average_cost(bootcamp_id: Uuid, pool: &PgPool) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE bootcamps SET average_cost = \
             (SELECT CEIL(AVG(tuition)) FROM courses WHERE bootcamp_id = $1) \
             WHERE id = $1",
        )
        .bind(bootcamp_id)
        .execute(pool)
        .await?;
        Ok(())
    }
}
