use tracing::{debug, info};

use super::manager::{timestamp, Backend, Database, DatabaseError};

/// One versioned schema step. Statements run in order inside a single transaction.
pub struct Migration {
    pub version: i64,
    pub name: &'static str,
    sqlite: &'static [&'static str],
    postgres: &'static [&'static str],
}

impl Migration {
    fn statements(&self, backend: Backend) -> &'static [&'static str] {
        match backend {
            Backend::Sqlite => self.sqlite,
            Backend::Postgres => self.postgres,
        }
    }
}

pub const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "create_funds",
        sqlite: &[r#"
            CREATE TABLE IF NOT EXISTS funds (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL CHECK (length(name) > 0),
                description TEXT,
                photo_url TEXT,
                target_amount REAL NOT NULL DEFAULT 0 CHECK (target_amount >= 0),
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
        "#],
        postgres: &[r#"
            CREATE TABLE IF NOT EXISTS funds (
                id BIGSERIAL PRIMARY KEY,
                name TEXT NOT NULL CHECK (length(name) > 0),
                description TEXT,
                photo_url TEXT,
                target_amount DOUBLE PRECISION NOT NULL DEFAULT 0 CHECK (target_amount >= 0),
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
        "#],
    },
    Migration {
        version: 2,
        name: "create_donations",
        sqlite: &[
            r#"
            CREATE TABLE IF NOT EXISTS donations (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                fund_id INTEGER NOT NULL REFERENCES funds(id) ON DELETE CASCADE,
                donor_name TEXT NOT NULL CHECK (length(donor_name) > 0),
                amount REAL NOT NULL CHECK (amount > 0),
                created_at TEXT NOT NULL
            )
            "#,
            "CREATE INDEX IF NOT EXISTS idx_donations_fund ON donations(fund_id)",
        ],
        postgres: &[
            r#"
            CREATE TABLE IF NOT EXISTS donations (
                id BIGSERIAL PRIMARY KEY,
                fund_id BIGINT NOT NULL REFERENCES funds(id) ON DELETE CASCADE,
                donor_name TEXT NOT NULL CHECK (length(donor_name) > 0),
                amount DOUBLE PRECISION NOT NULL CHECK (amount > 0),
                created_at TEXT NOT NULL
            )
            "#,
            "CREATE INDEX IF NOT EXISTS idx_donations_fund ON donations(fund_id)",
        ],
    },
    Migration {
        version: 3,
        name: "create_accounts",
        sqlite: &[r#"
            CREATE TABLE IF NOT EXISTS accounts (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                bank_name TEXT NOT NULL,
                account_number TEXT NOT NULL,
                beneficiary_name TEXT NOT NULL,
                created_at TEXT NOT NULL
            )
        "#],
        postgres: &[r#"
            CREATE TABLE IF NOT EXISTS accounts (
                id BIGSERIAL PRIMARY KEY,
                bank_name TEXT NOT NULL,
                account_number TEXT NOT NULL,
                beneficiary_name TEXT NOT NULL,
                created_at TEXT NOT NULL
            )
        "#],
    },
];

const CREATE_LEDGER: &str = r#"
    CREATE TABLE IF NOT EXISTS schema_migrations (
        version BIGINT PRIMARY KEY,
        name TEXT NOT NULL,
        applied_at TEXT NOT NULL
    )
"#;

/// Highest version any known migration reaches
pub fn latest_version() -> i64 {
    MIGRATIONS.iter().map(|m| m.version).max().unwrap_or(0)
}

impl Database {
    /// Highest migration version recorded in the ledger, 0 on a fresh store.
    pub async fn schema_version(&self) -> Result<i64, DatabaseError> {
        sqlx::query(CREATE_LEDGER).execute(self.pool()).await?;
        let version: i64 =
            sqlx::query_scalar("SELECT COALESCE(MAX(version), 0) FROM schema_migrations")
                .fetch_one(self.pool())
                .await?;
        Ok(version)
    }

    /// Apply every migration newer than the recorded version. Returns how many ran.
    pub async fn migrate(&self) -> Result<usize, DatabaseError> {
        let current = self.schema_version().await?;
        let mut applied = 0;

        for migration in MIGRATIONS.iter().filter(|m| m.version > current) {
            self.apply(migration)
                .await
                .map_err(|source| DatabaseError::Migration {
                    version: migration.version,
                    name: migration.name,
                    source,
                })?;
            info!("Applied migration {} ({})", migration.version, migration.name);
            applied += 1;
        }

        if applied == 0 {
            debug!("Schema up to date at version {}", current);
        }
        Ok(applied)
    }

    async fn apply(&self, migration: &Migration) -> Result<(), sqlx::Error> {
        let mut tx = self.pool().begin().await?;
        for statement in migration.statements(self.backend()) {
            sqlx::query(statement).execute(&mut *tx).await?;
        }
        sqlx::query("INSERT INTO schema_migrations (version, name, applied_at) VALUES ($1, $2, $3)")
            .bind(migration.version)
            .bind(migration.name)
            .bind(timestamp())
            .execute(&mut *tx)
            .await?;
        tx.commit().await
    }
}
