//! PostgreSQL store implementation for FlowSchool.
//!
//! One [`PostgresStore`] implements every store trait from
//! `flowschool-core` against the tables created by `migrations/`. Queries
//! are runtime-checked (`sqlx::query` with explicit binds) so the workspace
//! builds without a live `DATABASE_URL`; rows are mapped into the core's
//! typed structs at this boundary, and out-of-range values are rejected as
//! store errors rather than passed through.
//!
//! # Example
//!
//! ```no_run
//! use flowschool_postgres::PostgresStore;
//! use sqlx::PgPool;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let pool = PgPool::connect("postgresql://localhost/flowschool").await?;
//! let store = PostgresStore::new(pool);
//! store.migrate().await?;
//! # Ok(())
//! # }
//! ```

#![deny(missing_docs)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

use chrono::{DateTime, Utc};
use flowschool_core::error::{CoreError, Result};
use flowschool_core::stores::{CourseCatalog, EnrollmentStore, LessonProgressStore, PurchaseStore};
use flowschool_core::types::{
    Course, CourseId, CoursePurchase, EnrolledCourse, Enrollment, LessonId, LessonProgress, UserId,
};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use std::future::Future;
use uuid::Uuid;

/// PostgreSQL-backed store for enrollments, lesson progress, purchases and
/// the course catalog.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Create a new store over an existing connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Run database migrations.
    ///
    /// # Errors
    ///
    /// Returns error if migrations fail.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| CoreError::Store(format!("Migration failed: {e}")))?;
        tracing::info!("database migrations applied");
        Ok(())
    }
}

fn store_err(context: &str, error: sqlx::Error) -> CoreError {
    CoreError::Store(format!("{context}: {error}"))
}

fn column_err(error: sqlx::Error) -> CoreError {
    CoreError::Store(format!("malformed row: {error}"))
}

fn map_enrollment(row: &PgRow) -> Result<Enrollment> {
    let percentage: i16 = row.try_get("progress_percentage").map_err(column_err)?;
    Ok(Enrollment {
        user_id: UserId(row.try_get::<Uuid, _>("user_id").map_err(column_err)?),
        course_id: CourseId(row.try_get::<Uuid, _>("course_id").map_err(column_err)?),
        enrolled_at: row.try_get("enrolled_at").map_err(column_err)?,
        progress_percentage: u8::try_from(percentage)
            .map_err(|_| CoreError::Store("progress_percentage out of range".to_string()))?,
        last_accessed_at: row.try_get("last_accessed_at").map_err(column_err)?,
        completed_at: row.try_get("completed_at").map_err(column_err)?,
    })
}

fn map_course(row: &PgRow, prefix: &str) -> Result<Course> {
    let col = |name: &str| format!("{prefix}{name}");
    let duration: i32 = row.try_get(col("duration_minutes").as_str()).map_err(column_err)?;
    let total: i32 = row.try_get(col("total_lessons").as_str()).map_err(column_err)?;
    Ok(Course {
        id: CourseId(row.try_get::<Uuid, _>(col("id").as_str()).map_err(column_err)?),
        title: row.try_get(col("title").as_str()).map_err(column_err)?,
        description: row.try_get(col("description").as_str()).map_err(column_err)?,
        thumbnail_url: row.try_get(col("thumbnail_url").as_str()).map_err(column_err)?,
        instructor_id: row
            .try_get::<Option<Uuid>, _>(col("instructor_id").as_str())
            .map_err(column_err)?
            .map(UserId),
        duration_minutes: u32::try_from(duration)
            .map_err(|_| CoreError::Store("duration_minutes out of range".to_string()))?,
        total_lessons: u32::try_from(total)
            .map_err(|_| CoreError::Store("total_lessons out of range".to_string()))?,
        price_minor: row.try_get(col("price_minor").as_str()).map_err(column_err)?,
        level: row.try_get(col("level").as_str()).map_err(column_err)?,
        tags: row.try_get(col("tags").as_str()).map_err(column_err)?,
        rating: row.try_get(col("rating").as_str()).map_err(column_err)?,
        is_free: row.try_get(col("is_free").as_str()).map_err(column_err)?,
        is_premium: row.try_get(col("is_premium").as_str()).map_err(column_err)?,
    })
}

fn map_lesson_progress(row: &PgRow) -> Result<LessonProgress> {
    Ok(LessonProgress {
        user_id: UserId(row.try_get::<Uuid, _>("user_id").map_err(column_err)?),
        lesson_id: LessonId(row.try_get::<Uuid, _>("lesson_id").map_err(column_err)?),
        course_id: CourseId(row.try_get::<Uuid, _>("course_id").map_err(column_err)?),
        is_completed: row.try_get("is_completed").map_err(column_err)?,
        completed_at: row.try_get("completed_at").map_err(column_err)?,
        last_watched_at: row.try_get("last_watched_at").map_err(column_err)?,
    })
}

impl CourseCatalog for PostgresStore {
    fn get_course(&self, course_id: CourseId) -> impl Future<Output = Result<Course>> + Send {
        let pool = self.pool.clone();

        async move {
            let row = sqlx::query(
                r"
                SELECT id, title, description, thumbnail_url, instructor_id,
                       duration_minutes, total_lessons, price_minor, level,
                       tags, rating, is_free, is_premium
                FROM courses
                WHERE id = $1
                ",
            )
            .bind(course_id.0)
            .fetch_optional(&pool)
            .await
            .map_err(|e| store_err("Failed to get course", e))?
            .ok_or(CoreError::CourseNotFound)?;

            map_course(&row, "")
        }
    }

    fn count_lessons(&self, course_id: CourseId) -> impl Future<Output = Result<u32>> + Send {
        let pool = self.pool.clone();

        async move {
            let row = sqlx::query("SELECT COUNT(*) FROM lessons WHERE course_id = $1")
                .bind(course_id.0)
                .fetch_one(&pool)
                .await
                .map_err(|e| store_err("Failed to count lessons", e))?;

            let count: i64 = row.try_get(0).map_err(column_err)?;
            u32::try_from(count)
                .map_err(|_| CoreError::Store("lesson count out of range".to_string()))
        }
    }
}

impl EnrollmentStore for PostgresStore {
    fn find_enrollment(
        &self,
        user_id: UserId,
        course_id: CourseId,
    ) -> impl Future<Output = Result<Option<Enrollment>>> + Send {
        let pool = self.pool.clone();

        async move {
            let row = sqlx::query(
                r"
                SELECT user_id, course_id, enrolled_at, progress_percentage,
                       last_accessed_at, completed_at
                FROM enrollments
                WHERE user_id = $1 AND course_id = $2
                ",
            )
            .bind(user_id.0)
            .bind(course_id.0)
            .fetch_optional(&pool)
            .await
            .map_err(|e| store_err("Failed to get enrollment", e))?;

            row.as_ref().map(map_enrollment).transpose()
        }
    }

    fn insert_enrollment(
        &self,
        enrollment: &Enrollment,
    ) -> impl Future<Output = Result<bool>> + Send {
        let pool = self.pool.clone();
        let enrollment = enrollment.clone();

        async move {
            // Conflict on the (user_id, course_id) key is the no-op case:
            // the uniqueness constraint, not a prior read, holds the
            // one-enrollment invariant.
            let result = sqlx::query(
                r"
                INSERT INTO enrollments
                    (user_id, course_id, enrolled_at, progress_percentage,
                     last_accessed_at, completed_at)
                VALUES ($1, $2, $3, $4, $5, $6)
                ON CONFLICT (user_id, course_id) DO NOTHING
                ",
            )
            .bind(enrollment.user_id.0)
            .bind(enrollment.course_id.0)
            .bind(enrollment.enrolled_at)
            .bind(i16::from(enrollment.progress_percentage))
            .bind(enrollment.last_accessed_at)
            .bind(enrollment.completed_at)
            .execute(&pool)
            .await
            .map_err(|e| store_err("Failed to insert enrollment", e))?;

            Ok(result.rows_affected() == 1)
        }
    }

    fn set_progress(
        &self,
        user_id: UserId,
        course_id: CourseId,
        percentage: u8,
        accessed_at: DateTime<Utc>,
    ) -> impl Future<Output = Result<()>> + Send {
        let pool = self.pool.clone();

        async move {
            let result = sqlx::query(
                r"
                UPDATE enrollments
                SET progress_percentage = $3,
                    last_accessed_at = $4
                WHERE user_id = $1 AND course_id = $2
                ",
            )
            .bind(user_id.0)
            .bind(course_id.0)
            .bind(i16::from(percentage))
            .bind(accessed_at)
            .execute(&pool)
            .await
            .map_err(|e| store_err("Failed to update enrollment progress", e))?;

            if result.rows_affected() == 0 {
                return Err(CoreError::EnrollmentNotFound);
            }
            Ok(())
        }
    }

    fn complete_enrollment(
        &self,
        user_id: UserId,
        course_id: CourseId,
        completed_at: DateTime<Utc>,
    ) -> impl Future<Output = Result<()>> + Send {
        let pool = self.pool.clone();

        async move {
            let result = sqlx::query(
                r"
                UPDATE enrollments
                SET progress_percentage = 100,
                    completed_at = $3,
                    last_accessed_at = $3
                WHERE user_id = $1 AND course_id = $2
                ",
            )
            .bind(user_id.0)
            .bind(course_id.0)
            .bind(completed_at)
            .execute(&pool)
            .await
            .map_err(|e| store_err("Failed to complete enrollment", e))?;

            if result.rows_affected() == 0 {
                return Err(CoreError::EnrollmentNotFound);
            }
            Ok(())
        }
    }

    fn list_enrollments(
        &self,
        user_id: UserId,
    ) -> impl Future<Output = Result<Vec<EnrolledCourse>>> + Send {
        let pool = self.pool.clone();

        async move {
            let rows = sqlx::query(
                r"
                SELECT e.user_id, e.course_id, e.enrolled_at,
                       e.progress_percentage, e.last_accessed_at, e.completed_at,
                       c.id            AS course_id_joined,
                       c.title         AS course_title,
                       c.description   AS course_description,
                       c.thumbnail_url AS course_thumbnail_url,
                       c.instructor_id AS course_instructor_id,
                       c.duration_minutes AS course_duration_minutes,
                       c.total_lessons AS course_total_lessons,
                       c.price_minor   AS course_price_minor,
                       c.level         AS course_level,
                       c.tags          AS course_tags,
                       c.rating        AS course_rating,
                       c.is_free       AS course_is_free,
                       c.is_premium    AS course_is_premium
                FROM enrollments e
                JOIN courses c ON c.id = e.course_id
                WHERE e.user_id = $1
                ORDER BY e.enrolled_at DESC
                ",
            )
            .bind(user_id.0)
            .fetch_all(&pool)
            .await
            .map_err(|e| store_err("Failed to list enrollments", e))?;

            rows.iter()
                .map(|row| {
                    Ok(EnrolledCourse {
                        enrollment: map_enrollment(row)?,
                        course: map_joined_course(row)?,
                    })
                })
                .collect()
        }
    }

    fn count_enrollments(&self, user_id: UserId) -> impl Future<Output = Result<u64>> + Send {
        let pool = self.pool.clone();

        async move {
            let row = sqlx::query("SELECT COUNT(*) FROM enrollments WHERE user_id = $1")
                .bind(user_id.0)
                .fetch_one(&pool)
                .await
                .map_err(|e| store_err("Failed to count enrollments", e))?;

            let count: i64 = row.try_get(0).map_err(column_err)?;
            u64::try_from(count)
                .map_err(|_| CoreError::Store("enrollment count out of range".to_string()))
        }
    }
}

/// Map the `course_*`-aliased half of a joined enrollment row.
fn map_joined_course(row: &PgRow) -> Result<Course> {
    let duration: i32 = row.try_get("course_duration_minutes").map_err(column_err)?;
    let total: i32 = row.try_get("course_total_lessons").map_err(column_err)?;
    Ok(Course {
        id: CourseId(row.try_get::<Uuid, _>("course_id_joined").map_err(column_err)?),
        title: row.try_get("course_title").map_err(column_err)?,
        description: row.try_get("course_description").map_err(column_err)?,
        thumbnail_url: row.try_get("course_thumbnail_url").map_err(column_err)?,
        instructor_id: row
            .try_get::<Option<Uuid>, _>("course_instructor_id")
            .map_err(column_err)?
            .map(UserId),
        duration_minutes: u32::try_from(duration)
            .map_err(|_| CoreError::Store("duration_minutes out of range".to_string()))?,
        total_lessons: u32::try_from(total)
            .map_err(|_| CoreError::Store("total_lessons out of range".to_string()))?,
        price_minor: row.try_get("course_price_minor").map_err(column_err)?,
        level: row.try_get("course_level").map_err(column_err)?,
        tags: row.try_get("course_tags").map_err(column_err)?,
        rating: row.try_get("course_rating").map_err(column_err)?,
        is_free: row.try_get("course_is_free").map_err(column_err)?,
        is_premium: row.try_get("course_is_premium").map_err(column_err)?,
    })
}

impl LessonProgressStore for PostgresStore {
    fn upsert_lesson_progress(
        &self,
        progress: &LessonProgress,
    ) -> impl Future<Output = Result<()>> + Send {
        let pool = self.pool.clone();
        let progress = progress.clone();

        async move {
            sqlx::query(
                r"
                INSERT INTO lesson_progress
                    (user_id, lesson_id, course_id, is_completed,
                     completed_at, last_watched_at)
                VALUES ($1, $2, $3, $4, $5, $6)
                ON CONFLICT (user_id, lesson_id) DO UPDATE
                SET is_completed = EXCLUDED.is_completed,
                    completed_at = EXCLUDED.completed_at,
                    last_watched_at = EXCLUDED.last_watched_at
                ",
            )
            .bind(progress.user_id.0)
            .bind(progress.lesson_id.0)
            .bind(progress.course_id.0)
            .bind(progress.is_completed)
            .bind(progress.completed_at)
            .bind(progress.last_watched_at)
            .execute(&pool)
            .await
            .map_err(|e| store_err("Failed to upsert lesson progress", e))?;

            Ok(())
        }
    }

    fn list_lesson_progress(
        &self,
        user_id: UserId,
        course_id: CourseId,
    ) -> impl Future<Output = Result<Vec<LessonProgress>>> + Send {
        let pool = self.pool.clone();

        async move {
            let rows = sqlx::query(
                r"
                SELECT user_id, lesson_id, course_id, is_completed,
                       completed_at, last_watched_at
                FROM lesson_progress
                WHERE user_id = $1 AND course_id = $2
                ",
            )
            .bind(user_id.0)
            .bind(course_id.0)
            .fetch_all(&pool)
            .await
            .map_err(|e| store_err("Failed to list lesson progress", e))?;

            rows.iter().map(map_lesson_progress).collect()
        }
    }

    fn find_lesson_progress(
        &self,
        user_id: UserId,
        lesson_id: LessonId,
    ) -> impl Future<Output = Result<Option<LessonProgress>>> + Send {
        let pool = self.pool.clone();

        async move {
            let row = sqlx::query(
                r"
                SELECT user_id, lesson_id, course_id, is_completed,
                       completed_at, last_watched_at
                FROM lesson_progress
                WHERE user_id = $1 AND lesson_id = $2
                ",
            )
            .bind(user_id.0)
            .bind(lesson_id.0)
            .fetch_optional(&pool)
            .await
            .map_err(|e| store_err("Failed to get lesson progress", e))?;

            row.as_ref().map(map_lesson_progress).transpose()
        }
    }

    fn count_completed_lessons(
        &self,
        user_id: UserId,
        course_id: CourseId,
    ) -> impl Future<Output = Result<u32>> + Send {
        let pool = self.pool.clone();

        async move {
            let row = sqlx::query(
                r"
                SELECT COUNT(*)
                FROM lesson_progress
                WHERE user_id = $1 AND course_id = $2 AND is_completed = TRUE
                ",
            )
            .bind(user_id.0)
            .bind(course_id.0)
            .fetch_one(&pool)
            .await
            .map_err(|e| store_err("Failed to count completed lessons", e))?;

            let count: i64 = row.try_get(0).map_err(column_err)?;
            u32::try_from(count)
                .map_err(|_| CoreError::Store("completed count out of range".to_string()))
        }
    }
}

impl PurchaseStore for PostgresStore {
    fn record_purchase(
        &self,
        purchase: &CoursePurchase,
    ) -> impl Future<Output = Result<()>> + Send {
        let pool = self.pool.clone();
        let purchase = purchase.clone();

        async move {
            insert_purchase(&pool, &purchase).await
        }
    }

    fn record_paid_purchase_and_enroll(
        &self,
        purchase: &CoursePurchase,
        enrollment: &Enrollment,
    ) -> impl Future<Output = Result<bool>> + Send {
        let pool = self.pool.clone();
        let purchase = purchase.clone();
        let enrollment = enrollment.clone();

        async move {
            // Financial record and access grant commit or roll back
            // together; a crash between the two writes cannot leave a paid
            // purchase without its enrollment.
            let mut tx = pool
                .begin()
                .await
                .map_err(|e| store_err("Failed to begin purchase transaction", e))?;

            sqlx::query(
                r"
                INSERT INTO course_purchases
                    (user_id, course_id, payment_id, order_id, signature,
                     amount_minor, status, created_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                ",
            )
            .bind(purchase.user_id.0)
            .bind(purchase.course_id.0)
            .bind(&purchase.payment_id)
            .bind(&purchase.order_id)
            .bind(&purchase.signature)
            .bind(purchase.amount_minor)
            .bind(purchase.status.as_str())
            .bind(purchase.created_at)
            .execute(&mut *tx)
            .await
            .map_err(|e| store_err("Failed to record paid purchase", e))?;

            let result = sqlx::query(
                r"
                INSERT INTO enrollments
                    (user_id, course_id, enrolled_at, progress_percentage,
                     last_accessed_at, completed_at)
                VALUES ($1, $2, $3, $4, $5, $6)
                ON CONFLICT (user_id, course_id) DO NOTHING
                ",
            )
            .bind(enrollment.user_id.0)
            .bind(enrollment.course_id.0)
            .bind(enrollment.enrolled_at)
            .bind(i16::from(enrollment.progress_percentage))
            .bind(enrollment.last_accessed_at)
            .bind(enrollment.completed_at)
            .execute(&mut *tx)
            .await
            .map_err(|e| store_err("Failed to enroll after purchase", e))?;

            tx.commit()
                .await
                .map_err(|e| store_err("Failed to commit purchase transaction", e))?;

            Ok(result.rows_affected() == 1)
        }
    }
}

async fn insert_purchase(pool: &PgPool, purchase: &CoursePurchase) -> Result<()> {
    sqlx::query(
        r"
        INSERT INTO course_purchases
            (user_id, course_id, payment_id, order_id, signature,
             amount_minor, status, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        ",
    )
    .bind(purchase.user_id.0)
    .bind(purchase.course_id.0)
    .bind(&purchase.payment_id)
    .bind(&purchase.order_id)
    .bind(&purchase.signature)
    .bind(purchase.amount_minor)
    .bind(purchase.status.as_str())
    .bind(purchase.created_at)
    .execute(pool)
    .await
    .map_err(|e| store_err("Failed to record purchase", e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use flowschool_core::types::PurchaseStatus;

    #[test]
    fn purchase_status_round_trips_through_its_store_form() {
        assert_eq!(PurchaseStatus::Paid.as_str(), "paid");
        assert_eq!(PurchaseStatus::Failed.as_str(), "failed");
    }
}
