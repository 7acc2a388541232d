use crate::database::manager::{timestamp, Database, DatabaseError};
use crate::database::models::{Account, Donation, Fund, NewDonation, FUND_COLUMNS};

/// Find a fund by id
pub async fn find_fund(db: &Database, fund_id: i64) -> Result<Option<Fund>, DatabaseError> {
    let sql = format!("SELECT {} FROM funds WHERE id = $1", FUND_COLUMNS);
    let fund = sqlx::query_as::<_, Fund>(&sql)
        .bind(fund_id)
        .fetch_optional(db.pool())
        .await?;

    Ok(fund)
}

pub async fn fund_exists(db: &Database, fund_id: i64) -> Result<bool, DatabaseError> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM funds WHERE id = $1")
        .bind(fund_id)
        .fetch_one(db.pool())
        .await?;

    Ok(count > 0)
}

/// Insert a fund with a fixed id unless one already exists. Returns true when a row was written.
pub async fn insert_fund_if_absent(
    db: &Database,
    fund_id: i64,
    name: &str,
    description: Option<&str>,
    photo_url: Option<&str>,
    target_amount: f64,
) -> Result<bool, DatabaseError> {
    let now = timestamp();
    let result = sqlx::query(
        "INSERT INTO funds (id, name, description, photo_url, target_amount, created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7)
         ON CONFLICT (id) DO NOTHING",
    )
    .bind(fund_id)
    .bind(name)
    .bind(description.filter(|s| !s.is_empty()).map(str::to_string))
    .bind(photo_url.filter(|s| !s.is_empty()).map(str::to_string))
    .bind(target_amount)
    .bind(now.clone())
    .bind(now)
    .execute(db.pool())
    .await?;

    Ok(result.rows_affected() > 0)
}

/// All donations of a fund in insertion order
pub async fn list_donations(db: &Database, fund_id: i64) -> Result<Vec<Donation>, DatabaseError> {
    let donations = sqlx::query_as::<_, Donation>(
        "SELECT id, fund_id, donor_name, amount, created_at
         FROM donations
         WHERE fund_id = $1
         ORDER BY id ASC",
    )
    .bind(fund_id)
    .fetch_all(db.pool())
    .await?;

    Ok(donations)
}

pub async fn insert_donation(db: &Database, donation: &NewDonation) -> Result<Donation, DatabaseError> {
    let created = sqlx::query_as::<_, Donation>(
        "INSERT INTO donations (fund_id, donor_name, amount, created_at)
         VALUES ($1, $2, $3, $4)
         RETURNING id, fund_id, donor_name, amount, created_at",
    )
    .bind(donation.fund_id)
    .bind(donation.donor_name.clone())
    .bind(donation.amount)
    .bind(timestamp())
    .fetch_one(db.pool())
    .await?;

    Ok(created)
}

/// Delete a donation. Returns false when no row had that id.
pub async fn delete_donation(db: &Database, donation_id: i64) -> Result<bool, DatabaseError> {
    let result = sqlx::query("DELETE FROM donations WHERE id = $1")
        .bind(donation_id)
        .execute(db.pool())
        .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn list_accounts(db: &Database) -> Result<Vec<Account>, DatabaseError> {
    let accounts = sqlx::query_as::<_, Account>(
        "SELECT id, bank_name, account_number, beneficiary_name
         FROM accounts
         ORDER BY id ASC",
    )
    .fetch_all(db.pool())
    .await?;

    Ok(accounts)
}

pub async fn insert_account_if_absent(
    db: &Database,
    account_id: i64,
    bank_name: &str,
    account_number: &str,
    beneficiary_name: &str,
) -> Result<bool, DatabaseError> {
    let result = sqlx::query(
        "INSERT INTO accounts (id, bank_name, account_number, beneficiary_name, created_at)
         VALUES ($1, $2, $3, $4, $5)
         ON CONFLICT (id) DO NOTHING",
    )
    .bind(account_id)
    .bind(bank_name)
    .bind(account_number)
    .bind(beneficiary_name)
    .bind(timestamp())
    .execute(db.pool())
    .await?;

    Ok(result.rows_affected() > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DatabaseConfig;

    async fn migrated_db() -> Database {
        let db = Database::connect_lazy(&DatabaseConfig {
            url: "sqlite::memory:".to_string(),
            max_connections: 1,
            connection_timeout: 5,
        })
        .unwrap();
        db.migrate().await.unwrap();
        db
    }

    #[tokio::test]
    async fn fund_insert_is_idempotent() {
        let db = migrated_db().await;
        assert!(insert_fund_if_absent(&db, 1, "School roof", None, None, 2000.0).await.unwrap());
        assert!(!insert_fund_if_absent(&db, 1, "Other", None, None, 10.0).await.unwrap());

        let fund = find_fund(&db, 1).await.unwrap().unwrap();
        assert_eq!(fund.name, "School roof");
        assert_eq!(fund.target_amount, 2000.0);
        assert!(fund.description.is_none());
        assert!(fund.photo_url.is_none());
        assert!(find_fund(&db, 2).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn fund_optional_fields_read_back() {
        let db = migrated_db().await;
        insert_fund_if_absent(&db, 1, "School roof", Some("New tiles"), None, 2000.0)
            .await
            .unwrap();
        insert_fund_if_absent(&db, 2, "Library", Some(""), Some("https://img.example/lib.png"), 50.0)
            .await
            .unwrap();

        let roof = find_fund(&db, 1).await.unwrap().unwrap();
        assert_eq!(roof.description.as_deref(), Some("New tiles"));
        assert_eq!(roof.photo_url, None);

        let library = find_fund(&db, 2).await.unwrap().unwrap();
        assert_eq!(library.description, None);
        assert_eq!(library.photo_url.as_deref(), Some("https://img.example/lib.png"));
    }

    #[tokio::test]
    async fn donations_round_trip_in_order() {
        let db = migrated_db().await;
        insert_fund_if_absent(&db, 1, "School roof", Some("desc"), None, 2000.0)
            .await
            .unwrap();

        let first = insert_donation(
            &db,
            &NewDonation { fund_id: 1, donor_name: "Ana".into(), amount: 500.0 },
        )
        .await
        .unwrap();
        let second = insert_donation(
            &db,
            &NewDonation { fund_id: 1, donor_name: "Luis".into(), amount: 12.5 },
        )
        .await
        .unwrap();
        assert!(second.id > first.id);

        let listed = list_donations(&db, 1).await.unwrap();
        assert_eq!(listed, vec![first.clone(), second]);

        assert!(delete_donation(&db, first.id).await.unwrap());
        assert!(!delete_donation(&db, first.id).await.unwrap());
        assert_eq!(list_donations(&db, 1).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn donation_for_missing_fund_is_rejected_by_foreign_key() {
        let db = migrated_db().await;
        let err = insert_donation(
            &db,
            &NewDonation { fund_id: 42, donor_name: "Ana".into(), amount: 5.0 },
        )
        .await
        .unwrap_err();
        assert!(err.is_foreign_key_violation(), "unexpected error: {err}");
    }

    #[tokio::test]
    async fn deleting_a_fund_cascades_to_its_donations() {
        let db = migrated_db().await;
        insert_fund_if_absent(&db, 1, "School roof", None, None, 2000.0).await.unwrap();
        insert_fund_if_absent(&db, 2, "Library", None, None, 100.0).await.unwrap();
        for (fund_id, amount) in [(1, 10.0), (1, 20.0), (2, 30.0)] {
            insert_donation(
                &db,
                &NewDonation { fund_id, donor_name: "Ana".into(), amount },
            )
            .await
            .unwrap();
        }

        sqlx::query("DELETE FROM funds WHERE id = $1")
            .bind(1_i64)
            .execute(db.pool())
            .await
            .unwrap();

        assert!(list_donations(&db, 1).await.unwrap().is_empty());
        assert_eq!(list_donations(&db, 2).await.unwrap().len(), 1);
        assert!(!fund_exists(&db, 1).await.unwrap());
    }

    #[tokio::test]
    async fn schema_rejects_non_positive_amounts() {
        let db = migrated_db().await;
        insert_fund_if_absent(&db, 1, "School roof", None, None, 2000.0).await.unwrap();
        let err = insert_donation(
            &db,
            &NewDonation { fund_id: 1, donor_name: "Ana".into(), amount: -1.0 },
        )
        .await;
        assert!(err.is_err());
    }

    #[tokio::test]
    async fn accounts_are_listed() {
        let db = migrated_db().await;
        assert!(list_accounts(&db).await.unwrap().is_empty());
        insert_account_if_absent(&db, 1, "Example Bank", "1234", "Example Org").await.unwrap();
        insert_account_if_absent(&db, 1, "Other Bank", "9999", "Other").await.unwrap();

        let accounts = list_accounts(&db).await.unwrap();
        assert_eq!(accounts.len(), 1);
        assert_eq!(accounts[0].bank_name, "Example Bank");
    }
}
