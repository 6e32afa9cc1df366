use std::str::FromStr;

use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{FromRow, Pool, Sqlite, SqliteConnection};

use crate::{
    models::{
        AggregateStats, Car, CarChanges, CompletedTaskSummary, Mechanic, MechanicStats, NewCar,
        NewTask, Task, TaskChanges, TaskFilter, TopMechanic,
    },
    Error, Result,
};
use pitstop_core::accounting::{
    completion_adjustment, removal_adjustment, PointAdjustment, TaskState,
};
use pitstop_core::TaskStatus;

/// Every task read joins the owning car's headline fields.
const TASK_SELECT: &str = r#"
    SELECT t.id, t.car_id, t.title, t.description, t.assigned_mechanic,
           t.points, t.status, t.created_at, t.updated_at, t.completed_at,
           c.brand, c.model, c.year
    FROM tasks t
    LEFT JOIN cars c ON t.car_id = c.id
"#;

/// A bare task row, used inside write transactions where the join is noise.
#[derive(Debug, Clone, FromRow)]
struct TaskRow {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub assigned_mechanic: Option<String>,
    pub points: i64,
    pub status: String,
    pub completed_at: Option<chrono::DateTime<Utc>>,
}

#[derive(Clone)]
pub struct Database {
    pool: Pool<Sqlite>,
}

impl Database {
    /// Create new database connection
    pub async fn new(database_url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)
            .map_err(sqlx::Error::from)?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        Ok(Self { pool })
    }

    /// In-memory database for tests. A single pinned connection, since every
    /// SQLite `:memory:` connection is its own database.
    pub async fn in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .map_err(sqlx::Error::from)?
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        Ok(Self { pool })
    }

    /// Initialize database schema
    pub async fn init_schema(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS cars (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                brand TEXT NOT NULL,
                model TEXT NOT NULL,
                year INTEGER NOT NULL,
                repair_time TEXT,
                start_date TEXT,
                status TEXT NOT NULL DEFAULT 'pending'
                    CHECK (status IN ('pending', 'in_progress', 'completed', 'delivered')),
                created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS mechanics (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL UNIQUE,
                total_points INTEGER NOT NULL DEFAULT 0,
                total_tasks INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS tasks (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                car_id INTEGER NOT NULL REFERENCES cars(id),
                title TEXT NOT NULL,
                description TEXT,
                assigned_mechanic TEXT REFERENCES mechanics(name),
                points INTEGER NOT NULL DEFAULT 1,
                status TEXT NOT NULL DEFAULT 'pending'
                    CHECK (status IN ('pending', 'in_progress', 'completed')),
                created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
                completed_at TEXT
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        // Create indexes
        sqlx::query("CREATE INDEX IF NOT EXISTS idx_cars_status ON cars(status)")
            .execute(&self.pool)
            .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_tasks_status ON tasks(status)")
            .execute(&self.pool)
            .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_tasks_car ON tasks(car_id)")
            .execute(&self.pool)
            .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_tasks_mechanic ON tasks(assigned_mechanic)")
            .execute(&self.pool)
            .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_mechanics_points ON mechanics(total_points DESC)",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Seed the fixed mechanic roster. Idempotent; existing rows keep their
    /// accumulated scores.
    pub async fn seed_mechanics(&self, names: &[&str]) -> Result<()> {
        let now = Utc::now();
        for &name in names {
            sqlx::query(
                "INSERT OR IGNORE INTO mechanics (name, created_at, updated_at) VALUES (?, ?, ?)",
            )
            .bind(name)
            .bind(now)
            .bind(now)
            .execute(&self.pool)
            .await?;
        }
        tracing::debug!(count = names.len(), "mechanic roster seeded");
        Ok(())
    }

    // ========================================================================
    // Car Operations
    // ========================================================================

    pub async fn list_cars(&self, status: Option<&str>) -> Result<Vec<Car>> {
        let cars = match status {
            Some(status) => {
                sqlx::query_as::<_, Car>(
                    "SELECT * FROM cars WHERE status = ? ORDER BY created_at DESC, id DESC",
                )
                .bind(status)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, Car>("SELECT * FROM cars ORDER BY created_at DESC, id DESC")
                    .fetch_all(&self.pool)
                    .await?
            }
        };

        Ok(cars)
    }

    pub async fn get_car(&self, id: i64) -> Result<Option<Car>> {
        let car = sqlx::query_as::<_, Car>("SELECT * FROM cars WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(car)
    }

    pub async fn create_car(&self, new_car: &NewCar) -> Result<Car> {
        let now = Utc::now();
        let result = sqlx::query(
            r#"
            INSERT INTO cars (brand, model, year, repair_time, start_date, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&new_car.brand)
        .bind(&new_car.model)
        .bind(new_car.year)
        .bind(&new_car.repair_time)
        .bind(&new_car.start_date)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        let car = sqlx::query_as::<_, Car>("SELECT * FROM cars WHERE id = ?")
            .bind(result.last_insert_rowid())
            .fetch_one(&self.pool)
            .await?;

        Ok(car)
    }

    /// Apply an allow-listed partial update. Returns the reloaded row, or
    /// `None` when the car does not exist.
    pub async fn update_car(&self, id: i64, changes: &CarChanges) -> Result<Option<Car>> {
        let mut tx = self.pool.begin().await?;

        let old = sqlx::query_as::<_, Car>("SELECT * FROM cars WHERE id = ?")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
        let Some(old) = old else {
            return Ok(None);
        };

        let brand = changes.brand.clone().unwrap_or(old.brand);
        let model = changes.model.clone().unwrap_or(old.model);
        let year = changes.year.unwrap_or(old.year);
        let repair_time = match &changes.repair_time {
            Some(value) => value.clone(),
            None => old.repair_time,
        };
        let start_date = match &changes.start_date {
            Some(value) => value.clone(),
            None => old.start_date,
        };
        let status = changes.status.clone().unwrap_or(old.status);

        sqlx::query(
            r#"
            UPDATE cars
            SET brand = ?, model = ?, year = ?, repair_time = ?, start_date = ?,
                status = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&brand)
        .bind(&model)
        .bind(year)
        .bind(&repair_time)
        .bind(&start_date)
        .bind(&status)
        .bind(Utc::now())
        .bind(id)
        .execute(&mut *tx)
        .await?;

        let car = sqlx::query_as::<_, Car>("SELECT * FROM cars WHERE id = ?")
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(Some(car))
    }

    /// Delete a car and all of its tasks in one transaction. Completed
    /// assigned tasks give their points back before the rows go.
    pub async fn delete_car(&self, id: i64) -> Result<bool> {
        let mut tx = self.pool.begin().await?;

        let exists: Option<i64> = sqlx::query_scalar("SELECT id FROM cars WHERE id = ?")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
        if exists.is_none() {
            return Ok(false);
        }

        let tasks = sqlx::query_as::<_, TaskRow>(
            "SELECT id, title, description, assigned_mechanic, points, status, completed_at FROM tasks WHERE car_id = ?",
        )
        .bind(id)
        .fetch_all(&mut *tx)
        .await?;

        let now = Utc::now();
        for task in &tasks {
            if let Some(adjustment) = removal_adjustment(TaskState {
                status: TaskStatus::parse(&task.status),
                mechanic: task.assigned_mechanic.as_deref(),
                points: task.points,
            }) {
                apply_adjustment(&mut tx, &adjustment, now).await?;
            }
        }

        sqlx::query("DELETE FROM tasks WHERE car_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM cars WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(true)
    }

    // ========================================================================
    // Task Operations
    // ========================================================================

    pub async fn list_tasks(&self, filter: &TaskFilter) -> Result<Vec<Task>> {
        let mut sql = String::from(TASK_SELECT);
        let mut conditions = Vec::new();

        if filter.status.is_some() {
            conditions.push("t.status = ?");
        }
        if filter.car_id.is_some() {
            conditions.push("t.car_id = ?");
        }
        if !conditions.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&conditions.join(" AND "));
        }
        sql.push_str(" ORDER BY t.created_at DESC, t.id DESC");

        let mut query = sqlx::query_as::<_, Task>(&sql);
        if let Some(status) = &filter.status {
            query = query.bind(status);
        }
        if let Some(car_id) = filter.car_id {
            query = query.bind(car_id);
        }

        Ok(query.fetch_all(&self.pool).await?)
    }

    pub async fn get_task(&self, id: i64) -> Result<Option<Task>> {
        let sql = format!("{} WHERE t.id = ?", TASK_SELECT);
        let task = sqlx::query_as::<_, Task>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(task)
    }

    /// Create a task against an existing car. Fails with [`Error::CarMissing`]
    /// when the referenced car is gone; nothing is persisted in that case.
    pub async fn create_task(&self, new_task: &NewTask) -> Result<Task> {
        let mut tx = self.pool.begin().await?;

        let car: Option<i64> = sqlx::query_scalar("SELECT id FROM cars WHERE id = ?")
            .bind(new_task.car_id)
            .fetch_optional(&mut *tx)
            .await?;
        if car.is_none() {
            return Err(Error::CarMissing);
        }

        let now = Utc::now();
        let result = sqlx::query(
            r#"
            INSERT INTO tasks (car_id, title, description, assigned_mechanic, points,
                               created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(new_task.car_id)
        .bind(&new_task.title)
        .bind(&new_task.description)
        .bind(&new_task.assigned_mechanic)
        .bind(new_task.points)
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        let sql = format!("{} WHERE t.id = ?", TASK_SELECT);
        let task = sqlx::query_as::<_, Task>(&sql)
            .bind(result.last_insert_rowid())
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(task)
    }

    /// Apply an allow-listed partial update, maintaining `completed_at` and
    /// the mechanic aggregates in the same transaction as the row mutation.
    /// Returns the reloaded joined row, or `None` when the task is absent.
    pub async fn update_task(&self, id: i64, changes: &TaskChanges) -> Result<Option<Task>> {
        let mut tx = self.pool.begin().await?;

        let old = sqlx::query_as::<_, TaskRow>(
            "SELECT id, title, description, assigned_mechanic, points, status, completed_at FROM tasks WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;
        let Some(old) = old else {
            return Ok(None);
        };

        let title = changes.title.clone().unwrap_or(old.title);
        let description = match &changes.description {
            Some(value) => value.clone(),
            None => old.description,
        };
        let assigned_mechanic = match &changes.assigned_mechanic {
            Some(value) => value.clone(),
            None => old.assigned_mechanic.clone(),
        };
        let points = changes.points.unwrap_or(old.points);
        let status = changes.status.clone().unwrap_or_else(|| old.status.clone());

        let now = Utc::now();
        let completed_at = if status != old.status {
            if status == "completed" {
                Some(now)
            } else {
                None
            }
        } else {
            old.completed_at
        };

        sqlx::query(
            r#"
            UPDATE tasks
            SET title = ?, description = ?, assigned_mechanic = ?, points = ?,
                status = ?, completed_at = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&title)
        .bind(&description)
        .bind(&assigned_mechanic)
        .bind(points)
        .bind(&status)
        .bind(completed_at)
        .bind(now)
        .bind(id)
        .execute(&mut *tx)
        .await?;

        // Completion credits the post-update row; un-completion reclaims
        // from the pre-update row.
        if let Some(adjustment) = completion_adjustment(
            TaskState {
                status: TaskStatus::parse(&old.status),
                mechanic: old.assigned_mechanic.as_deref(),
                points: old.points,
            },
            TaskState {
                status: TaskStatus::parse(&status),
                mechanic: assigned_mechanic.as_deref(),
                points,
            },
        ) {
            apply_adjustment(&mut tx, &adjustment, now).await?;
        }

        let sql = format!("{} WHERE t.id = ?", TASK_SELECT);
        let task = sqlx::query_as::<_, Task>(&sql)
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(Some(task))
    }

    /// Delete a task, reclaiming its points when it was completed and
    /// assigned. Returns `false` when the task does not exist.
    pub async fn delete_task(&self, id: i64) -> Result<bool> {
        let mut tx = self.pool.begin().await?;

        let old = sqlx::query_as::<_, TaskRow>(
            "SELECT id, title, description, assigned_mechanic, points, status, completed_at FROM tasks WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;
        let Some(old) = old else {
            return Ok(false);
        };

        if let Some(adjustment) = removal_adjustment(TaskState {
            status: TaskStatus::parse(&old.status),
            mechanic: old.assigned_mechanic.as_deref(),
            points: old.points,
        }) {
            apply_adjustment(&mut tx, &adjustment, Utc::now()).await?;
        }

        sqlx::query("DELETE FROM tasks WHERE id = ?")
            .bind(old.id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(true)
    }

    // ========================================================================
    // Mechanic Operations
    // ========================================================================

    /// Full roster, best score first, name breaking ties.
    pub async fn list_mechanics(&self) -> Result<Vec<Mechanic>> {
        let mechanics = sqlx::query_as::<_, Mechanic>(
            "SELECT * FROM mechanics ORDER BY total_points DESC, name ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(mechanics)
    }

    /// Mechanics with at least one point, best score first.
    pub async fn leaderboard(&self, limit: i64) -> Result<Vec<Mechanic>> {
        let mechanics = sqlx::query_as::<_, Mechanic>(
            r#"
            SELECT * FROM mechanics
            WHERE total_points > 0
            ORDER BY total_points DESC, name ASC
            LIMIT ?
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(mechanics)
    }

    pub async fn get_mechanic(&self, name: &str) -> Result<Option<Mechanic>> {
        let mechanic = sqlx::query_as::<_, Mechanic>("SELECT * FROM mechanics WHERE name = ?")
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;

        Ok(mechanic)
    }

    pub async fn mechanic_exists(&self, name: &str) -> Result<bool> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM mechanics WHERE name = ?")
            .bind(name)
            .fetch_one(&self.pool)
            .await?;

        Ok(count > 0)
    }

    /// A mechanic's most recently completed tasks, joined with car details.
    pub async fn mechanic_recent_tasks(
        &self,
        name: &str,
        limit: i64,
    ) -> Result<Vec<CompletedTaskSummary>> {
        let tasks = sqlx::query_as::<_, CompletedTaskSummary>(
            r#"
            SELECT t.id, t.title, t.points, t.completed_at, c.brand, c.model, c.year
            FROM tasks t
            LEFT JOIN cars c ON t.car_id = c.id
            WHERE t.assigned_mechanic = ? AND t.status = 'completed'
            ORDER BY t.completed_at DESC
            LIMIT ?
            "#,
        )
        .bind(name)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(tasks)
    }

    pub async fn mechanic_stats(&self) -> Result<(MechanicStats, Option<TopMechanic>)> {
        let stats = sqlx::query_as::<_, MechanicStats>(
            r#"
            SELECT
                COUNT(*) as total_mechanics,
                COALESCE(SUM(total_points), 0) as total_points_awarded,
                COALESCE(SUM(total_tasks), 0) as total_tasks_completed,
                AVG(total_points) as avg_points_per_mechanic,
                COALESCE(MAX(total_points), 0) as highest_score
            FROM mechanics
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        let top = sqlx::query_as::<_, TopMechanic>(
            r#"
            SELECT name, total_points FROM mechanics
            ORDER BY total_points DESC, name ASC
            LIMIT 1
            "#,
        )
        .fetch_optional(&self.pool)
        .await?;

        Ok((stats, top))
    }

    // ========================================================================
    // Aggregate Statistics
    // ========================================================================

    pub async fn aggregate_stats(&self) -> Result<AggregateStats> {
        let stats = sqlx::query_as::<_, AggregateStats>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM cars) as total_cars,
                COUNT(*) as total_tasks,
                COUNT(CASE WHEN status = 'completed' THEN 1 END) as completed_tasks,
                COUNT(CASE WHEN status = 'pending' THEN 1 END) as pending_tasks,
                COUNT(CASE WHEN status = 'in_progress' THEN 1 END) as in_progress_tasks
            FROM tasks
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(stats)
    }
}

/// Apply a score adjustment inside the caller's transaction.
async fn apply_adjustment(
    tx: &mut sqlx::Transaction<'_, Sqlite>,
    adjustment: &PointAdjustment<'_>,
    now: chrono::DateTime<Utc>,
) -> Result<()> {
    let conn: &mut SqliteConnection = &mut *tx;
    sqlx::query(
        r#"
        UPDATE mechanics
        SET total_points = total_points + ?, total_tasks = total_tasks + ?, updated_at = ?
        WHERE name = ?
        "#,
    )
    .bind(adjustment.points_delta)
    .bind(adjustment.tasks_delta)
    .bind(now)
    .bind(adjustment.mechanic)
    .execute(conn)
    .await?;

    Ok(())
}
