//! Startup sequencing: storage must be migrated (and seeded outside production)
//! before any request touches it.
//!
//! `Uninitialized -> Syncing -> Ready | Failed`. Both end states are terminal.

use std::sync::Arc;
use tokio::sync::watch;
use tracing::{error, info};

use crate::config::AppConfig;
use crate::database::manager::{Database, DatabaseError};
use crate::database::seed;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BootState {
    Uninitialized,
    Syncing,
    Ready,
    Failed(String),
}

impl BootState {
    pub fn as_str(&self) -> &'static str {
        match self {
            BootState::Uninitialized => "uninitialized",
            BootState::Syncing => "syncing",
            BootState::Ready => "ready",
            BootState::Failed(_) => "failed",
        }
    }

    fn is_settled(&self) -> bool {
        matches!(self, BootState::Ready | BootState::Failed(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BootError {
    #[error("storage bootstrap failed: {0}")]
    Failed(String),
    #[error("storage bootstrap was abandoned")]
    Abandoned,
}

/// Shared handle; clones observe the same state.
#[derive(Debug, Clone)]
pub struct Bootstrap {
    tx: Arc<watch::Sender<BootState>>,
}

impl Default for Bootstrap {
    fn default() -> Self {
        Self::new()
    }
}

impl Bootstrap {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(BootState::Uninitialized);
        Self { tx: Arc::new(tx) }
    }

    pub fn state(&self) -> BootState {
        self.tx.borrow().clone()
    }

    /// Resolve once the sequencer settles. Requests call this before touching storage.
    pub async fn wait_ready(&self) -> Result<(), BootError> {
        let mut rx = self.tx.subscribe();
        let settled = rx
            .wait_for(BootState::is_settled)
            .await
            .map_err(|_| BootError::Abandoned)?
            .clone();

        match settled {
            BootState::Failed(reason) => Err(BootError::Failed(reason)),
            _ => Ok(()),
        }
    }

    /// Resolve with the failure reason if the sequencer ever fails. Pending forever otherwise.
    pub async fn failed(&self) -> String {
        let mut rx = self.tx.subscribe();
        let reason = match rx.wait_for(|s| matches!(s, BootState::Failed(_))).await {
            Ok(state) => match &*state {
                BootState::Failed(reason) => Some(reason.clone()),
                _ => None,
            },
            Err(_) => None,
        };

        match reason {
            Some(reason) => reason,
            None => std::future::pending().await,
        }
    }

    /// Bring storage up. Only the first caller does the work; later callers wait for its outcome.
    pub async fn run(&self, db: &Database, config: &AppConfig) -> Result<(), BootError> {
        let started = self.tx.send_if_modified(|state| {
            if *state == BootState::Uninitialized {
                *state = BootState::Syncing;
                true
            } else {
                false
            }
        });
        if !started {
            return self.wait_ready().await;
        }
        info!("Bootstrap: syncing storage");

        match sync(db, config).await {
            Ok(()) => {
                self.tx.send_replace(BootState::Ready);
                info!("Bootstrap: storage ready");
                Ok(())
            }
            Err(e) => {
                let reason = e.to_string();
                error!("Bootstrap: storage failed: {}", reason);
                self.tx.send_replace(BootState::Failed(reason.clone()));
                Err(BootError::Failed(reason))
            }
        }
    }
}

async fn sync(db: &Database, config: &AppConfig) -> Result<(), DatabaseError> {
    let applied = db.migrate().await?;
    if applied > 0 {
        info!("Bootstrap: applied {} migration(s)", applied);
    }

    if !config.is_production() {
        seed::seed(db, config.fund.active_fund_id).await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AppConfig, DatabaseConfig};
    use crate::database::service;
    use std::time::Duration;

    fn database(url: &str) -> Database {
        Database::connect_lazy(&DatabaseConfig {
            url: url.to_string(),
            max_connections: 1,
            connection_timeout: 2,
        })
        .unwrap()
    }

    #[tokio::test]
    async fn waiters_are_released_once_ready() {
        let boot = Bootstrap::new();
        assert_eq!(boot.state(), BootState::Uninitialized);

        let waiter = {
            let boot = boot.clone();
            tokio::spawn(async move { boot.wait_ready().await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        let db = database("sqlite::memory:");
        boot.run(&db, &AppConfig::development()).await.unwrap();

        assert_eq!(boot.state(), BootState::Ready);
        assert_eq!(waiter.await.unwrap(), Ok(()));
    }

    #[tokio::test]
    async fn development_seeds_the_active_fund() {
        let mut config = AppConfig::development();
        config.fund.active_fund_id = 5;
        let db = database("sqlite::memory:");

        Bootstrap::new().run(&db, &config).await.unwrap();
        assert!(service::fund_exists(&db, 5).await.unwrap());
    }

    #[tokio::test]
    async fn production_migrates_without_seeding() {
        let mut config = AppConfig::production();
        config.security.admin_secret = Some("s3cret".into());
        let db = database("sqlite::memory:");

        Bootstrap::new().run(&db, &config).await.unwrap();
        assert!(!service::fund_exists(&db, 1).await.unwrap());
        assert!(service::list_donations(&db, 1).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn unreachable_store_fails_and_stays_failed() {
        let boot = Bootstrap::new();
        let db = database("sqlite:///nonexistent-dir/for/fund-tracker.sqlite?mode=ro");

        let err = boot.run(&db, &AppConfig::development()).await.unwrap_err();
        assert!(matches!(err, BootError::Failed(_)));
        assert_eq!(boot.state().as_str(), "failed");
        assert!(matches!(boot.wait_ready().await, Err(BootError::Failed(_))));

        let reason = tokio::time::timeout(Duration::from_secs(1), boot.failed())
            .await
            .unwrap();
        assert!(!reason.is_empty());
    }

    #[tokio::test]
    async fn second_run_reuses_first_outcome() {
        let boot = Bootstrap::new();
        let db = database("sqlite::memory:");
        boot.run(&db, &AppConfig::development()).await.unwrap();
        boot.run(&db, &AppConfig::development()).await.unwrap();
        assert_eq!(boot.state(), BootState::Ready);
    }
}
