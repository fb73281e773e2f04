//! # Cash Drawer Session Repository
//!
//! Opens, closes and audits cashier till sessions.
//!
//! ## State Machine
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Cash Drawer Session Lifecycle                        │
//! │                                                                         │
//! │   open(user, float)                                                    │
//! │       │  INSERT ... end_time NULL                                      │
//! │       │  partial unique index: one NULL end_time per user              │
//! │       ▼                                                                 │
//! │   ┌────────┐   checkout (cash)   accumulated_cash += total             │
//! │   │  OPEN  │   return (cash)     accumulated_cash -= refund            │
//! │   └────┬───┘                                                            │
//! │        │ close(ending_balance, notes)                                  │
//! │        │  UPDATE ... WHERE end_time IS NULL                            │
//! │        ▼                                                                │
//! │   ┌────────┐                                                            │
//! │   │ CLOSED │  terminal: closing again is a conflict                    │
//! │   └────────┘                                                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::repository::generate_id;
use ferre_core::validation::validate_drawer_amount;
use ferre_core::{CashDrawerSession, CoreError, Money, PaymentMethod, SessionSummary};

const SESSION_COLUMNS: &str = "id, user_id, start_time, end_time, opening_float_cents, \
     accumulated_cash_cents, ending_balance_cents, notes";

/// Repository for cash-drawer sessions.
#[derive(Debug, Clone)]
pub struct SessionRepository {
    pool: SqlitePool,
}

impl SessionRepository {
    pub fn new(pool: SqlitePool) -> Self {
        SessionRepository { pool }
    }

    /// Opens a session for `user_id` with the counted opening float.
    ///
    /// ## Errors
    /// - `Domain(Validation)` for a negative float
    /// - `SessionAlreadyOpen` if the user already has an open session,
    ///   including when a concurrent open wins the race
    /// - `NotFound` for an unknown user
    pub async fn open(&self, user_id: &str, opening_float: Money) -> DbResult<CashDrawerSession> {
        validate_drawer_amount("opening_float", opening_float)?;

        if self.active_for(user_id).await?.is_some() {
            return Err(CoreError::SessionAlreadyOpen {
                user_id: user_id.to_string(),
            }
            .into());
        }

        let session = CashDrawerSession {
            id: generate_id(),
            user_id: user_id.to_string(),
            start_time: Utc::now(),
            end_time: None,
            opening_float_cents: opening_float.cents(),
            accumulated_cash_cents: 0,
            ending_balance_cents: None,
            notes: String::new(),
        };

        sqlx::query(
            r#"
            INSERT INTO cash_drawer_sessions (
                id, user_id, start_time, end_time,
                opening_float_cents, accumulated_cash_cents, ending_balance_cents, notes
            ) VALUES (?1, ?2, ?3, NULL, ?4, 0, NULL, '')
            "#,
        )
        .bind(&session.id)
        .bind(&session.user_id)
        .bind(session.start_time)
        .bind(session.opening_float_cents)
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { .. } => DbError::Domain(CoreError::SessionAlreadyOpen {
                user_id: user_id.to_string(),
            }),
            DbError::ForeignKeyViolation { .. } => DbError::not_found("User", user_id),
            other => other,
        })?;

        info!(
            session_id = %session.id,
            user_id = %user_id,
            opening_float = %opening_float,
            "Cash drawer session opened"
        );

        Ok(session)
    }

    /// Closes an open session with the counted ending balance.
    ///
    /// The caller is expected to end the user's authenticated context
    /// afterwards (forced logout).
    ///
    /// ## Errors
    /// - `NotFound` for an unknown session
    /// - `SessionClosed` if it was already closed
    pub async fn close(
        &self,
        session_id: &str,
        ending_balance: Money,
        notes: &str,
    ) -> DbResult<CashDrawerSession> {
        validate_drawer_amount("ending_balance", ending_balance)?;

        let result = sqlx::query(
            r#"
            UPDATE cash_drawer_sessions
            SET end_time = ?2, ending_balance_cents = ?3, notes = ?4
            WHERE id = ?1 AND end_time IS NULL
            "#,
        )
        .bind(session_id)
        .bind(Utc::now())
        .bind(ending_balance.cents())
        .bind(notes.trim())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return match self.get_by_id(session_id).await? {
                None => Err(DbError::not_found("CashDrawerSession", session_id)),
                Some(_) => Err(CoreError::SessionClosed {
                    session_id: session_id.to_string(),
                }
                .into()),
            };
        }

        let session = self.require(session_id).await?;

        info!(
            session_id = %session_id,
            ending_balance = %ending_balance,
            difference = ?session.difference().map(|d| d.cents()),
            "Cash drawer session closed"
        );

        Ok(session)
    }

    /// The user's open session, if any.
    pub async fn active_for(&self, user_id: &str) -> DbResult<Option<CashDrawerSession>> {
        let mut conn = self.pool.acquire().await?;
        active_in(&mut conn, user_id).await
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<CashDrawerSession>> {
        let sql = format!(
            "SELECT {} FROM cash_drawer_sessions WHERE id = ?1",
            SESSION_COLUMNS
        );
        let session = sqlx::query_as::<_, CashDrawerSession>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(session)
    }

    pub async fn require(&self, id: &str) -> DbResult<CashDrawerSession> {
        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("CashDrawerSession", id))
    }

    /// Sum of the cash sales recorded against the session.
    ///
    /// Compensating sales are not cash sales and do not count here.
    pub async fn expected_cash_balance(&self, session_id: &str) -> DbResult<Money> {
        let cents = self.total_for(session_id, PaymentMethod::Cash).await?;
        Ok(Money::from_cents(cents))
    }

    /// Admin audit view: per-method totals, ledger and counted difference.
    pub async fn summary(&self, session_id: &str) -> DbResult<SessionSummary> {
        let session = self.require(session_id).await?;

        let cash_sales_cents = self.total_for(session_id, PaymentMethod::Cash).await?;
        let card_sales_cents = self.total_for(session_id, PaymentMethod::Card).await?;
        let refunds_cents = -self.total_for(session_id, PaymentMethod::Return).await?;

        Ok(SessionSummary {
            cash_sales_cents,
            card_sales_cents,
            refunds_cents,
            ledger_balance_cents: session.ledger_balance().cents(),
            difference_cents: session.difference().map(|d| d.cents()),
            session,
        })
    }

    /// Recent sessions, newest first, optionally for one user.
    pub async fn list(&self, user_id: Option<&str>, limit: u32) -> DbResult<Vec<CashDrawerSession>> {
        let sql = format!(
            r#"
            SELECT {}
            FROM cash_drawer_sessions
            WHERE ?1 IS NULL OR user_id = ?1
            ORDER BY start_time DESC
            LIMIT ?2
            "#,
            SESSION_COLUMNS
        );
        let sessions = sqlx::query_as::<_, CashDrawerSession>(&sql)
            .bind(user_id)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(sessions)
    }

    /// Deletes a session that no sale references.
    ///
    /// ## Errors
    /// - `SessionHasSales` when sales still point at the session
    /// - `NotFound` for an unknown session
    pub async fn delete(&self, session_id: &str) -> DbResult<()> {
        let has_sales = || {
            DbError::Domain(CoreError::SessionHasSales {
                session_id: session_id.to_string(),
            })
        };

        let sales: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sales WHERE session_id = ?1")
            .bind(session_id)
            .fetch_one(&self.pool)
            .await?;
        if sales > 0 {
            return Err(has_sales());
        }

        let result = sqlx::query("DELETE FROM cash_drawer_sessions WHERE id = ?1")
            .bind(session_id)
            .execute(&self.pool)
            .await
            .map_err(|e| match DbError::from(e) {
                DbError::ForeignKeyViolation { .. } => has_sales(),
                other => other,
            })?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("CashDrawerSession", session_id));
        }

        debug!(session_id = %session_id, "Cash drawer session deleted");
        Ok(())
    }

    async fn total_for(&self, session_id: &str, method: PaymentMethod) -> DbResult<i64> {
        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COALESCE(SUM(total_cents), 0)
            FROM sales
            WHERE session_id = ?1 AND payment_method = ?2
            "#,
        )
        .bind(session_id)
        .bind(method)
        .fetch_one(&self.pool)
        .await?;

        Ok(total)
    }
}

// =============================================================================
// Transaction Helpers
// =============================================================================

pub(crate) async fn active_in(
    conn: &mut SqliteConnection,
    user_id: &str,
) -> DbResult<Option<CashDrawerSession>> {
    let sql = format!(
        "SELECT {} FROM cash_drawer_sessions WHERE user_id = ?1 AND end_time IS NULL",
        SESSION_COLUMNS
    );
    let session = sqlx::query_as::<_, CashDrawerSession>(&sql)
        .bind(user_id)
        .fetch_optional(&mut *conn)
        .await?;

    Ok(session)
}

/// Moves the drawer's accumulated cash by `delta` (negative for refunds).
pub(crate) async fn adjust_cash(
    conn: &mut SqliteConnection,
    session_id: &str,
    delta: Money,
) -> DbResult<()> {
    let result = sqlx::query(
        r#"
        UPDATE cash_drawer_sessions
        SET accumulated_cash_cents = accumulated_cash_cents + ?2
        WHERE id = ?1 AND end_time IS NULL
        "#,
    )
    .bind(session_id)
    .bind(delta.cents())
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(CoreError::SessionClosed {
            session_id: session_id.to_string(),
        }
        .into());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::{cashier, test_db};

    #[tokio::test]
    async fn test_open_and_active_for() {
        let db = test_db().await;
        let user = cashier(&db, "ana").await;

        let session = db
            .sessions()
            .open(&user.id, Money::from_cents(10_000))
            .await
            .unwrap();
        assert!(session.is_open());

        let active = db.sessions().active_for(&user.id).await.unwrap().unwrap();
        assert_eq!(active.id, session.id);
        assert_eq!(active.ledger_balance(), Money::from_cents(10_000));
    }

    #[tokio::test]
    async fn test_second_open_is_a_conflict() {
        let db = test_db().await;
        let user = cashier(&db, "ana").await;
        db.sessions().open(&user.id, Money::zero()).await.unwrap();

        let err = db.sessions().open(&user.id, Money::zero()).await.unwrap_err();
        assert!(matches!(err, DbError::Domain(ref e) if e.is_conflict()));
    }

    #[tokio::test]
    async fn test_unique_index_backs_the_precheck() {
        let db = test_db().await;
        let user = cashier(&db, "ana").await;
        db.sessions().open(&user.id, Money::zero()).await.unwrap();

        // Same insert a racing request would issue after passing the pre-check.
        let result = sqlx::query(
            r#"
            INSERT INTO cash_drawer_sessions (id, user_id, start_time, opening_float_cents)
            VALUES (?1, ?2, ?3, 0)
            "#,
        )
        .bind(generate_id())
        .bind(&user.id)
        .bind(Utc::now())
        .execute(db.pool())
        .await;

        let err = DbError::from(result.unwrap_err());
        assert!(err.is_unique_violation());
    }

    #[tokio::test]
    async fn test_negative_float_is_rejected() {
        let db = test_db().await;
        let user = cashier(&db, "ana").await;

        let err = db
            .sessions()
            .open(&user.id, Money::from_cents(-1))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::Validation(_))));
        assert!(db.sessions().active_for(&user.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_open_for_unknown_user() {
        let db = test_db().await;
        let err = db.sessions().open("ghost", Money::zero()).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_close_is_terminal() {
        let db = test_db().await;
        let user = cashier(&db, "ana").await;
        let session = db
            .sessions()
            .open(&user.id, Money::from_cents(10_000))
            .await
            .unwrap();

        let closed = db
            .sessions()
            .close(&session.id, Money::from_cents(9_500), " short 5 ")
            .await
            .unwrap();
        assert!(!closed.is_open());
        assert_eq!(closed.notes, "short 5");
        assert_eq!(closed.difference(), Some(Money::from_cents(-500)));
        assert!(db.sessions().active_for(&user.id).await.unwrap().is_none());

        let err = db
            .sessions()
            .close(&session.id, Money::zero(), "")
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::SessionClosed { .. })));

        let err = db.sessions().close("missing", Money::zero(), "").await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_reopen_after_close() {
        let db = test_db().await;
        let user = cashier(&db, "ana").await;

        for _ in 0..3 {
            let session = db.sessions().open(&user.id, Money::zero()).await.unwrap();
            db.sessions().close(&session.id, Money::zero(), "").await.unwrap();
        }
        db.sessions().open(&user.id, Money::zero()).await.unwrap();

        let open: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM cash_drawer_sessions WHERE user_id = ?1 AND end_time IS NULL",
        )
        .bind(&user.id)
        .fetch_one(db.pool())
        .await
        .unwrap();
        assert_eq!(open, 1);

        let history = db.sessions().list(Some(&user.id), 10).await.unwrap();
        assert_eq!(history.len(), 4);
        assert!(history[0].is_open());
        assert_eq!(db.sessions().list(None, 2).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_adjust_cash_moves_ledger() {
        let db = test_db().await;
        let user = cashier(&db, "ana").await;
        let session = db
            .sessions()
            .open(&user.id, Money::from_cents(10_000))
            .await
            .unwrap();

        let mut conn = db.pool().acquire().await.unwrap();
        adjust_cash(&mut conn, &session.id, Money::from_cents(3_000)).await.unwrap();
        adjust_cash(&mut conn, &session.id, Money::from_cents(-500)).await.unwrap();
        drop(conn);

        let summary = db.sessions().summary(&session.id).await.unwrap();
        assert_eq!(summary.ledger_balance_cents, 12_500);
        assert_eq!(summary.difference_cents, None);
    }

    #[tokio::test]
    async fn test_delete_unused_session() {
        let db = test_db().await;
        let user = cashier(&db, "ana").await;
        let session = db.sessions().open(&user.id, Money::zero()).await.unwrap();

        db.sessions().delete(&session.id).await.unwrap();
        assert!(db.sessions().get_by_id(&session.id).await.unwrap().is_none());

        let err = db.sessions().delete(&session.id).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }
}
