//! [`SqliteStore`] — the SQLite implementation of [`SubscriptionStore`].

use std::{
  path::Path,
  sync::{Arc, Mutex, PoisonError},
  time::Duration,
};

use chrono::Utc;
use rusqlite::{InterruptHandle, OptionalExtension as _, TransactionBehavior};
use uuid::Uuid;

use subtrack_core::{
  Month,
  billing::{BillablePeriod, BillingWindow},
  filter::SubscriptionFilter,
  store::{ListQuery, SubscriptionStore},
  subscription::{NewSubscription, Subscription},
};

use crate::{
  Result,
  encode::{
    RawBillable, RawSubscription, SUBSCRIPTION_COLUMNS, encode_dt, encode_month,
    encode_uuid,
  },
  query::SqlWhere,
  schema::SCHEMA,
};

/// How long a statement waits on a locked database before failing.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

// ─── Store ───────────────────────────────────────────────────────────────────

/// A subscription store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
///
/// Dropping an operation's future abandons it: a call still queued for the
/// connection thread is skipped, a running statement is interrupted, and a
/// write that has not committed yet is rolled back.
#[derive(Clone)]
pub struct SqliteStore {
  conn:      tokio_rusqlite::Connection,
  interrupt: Arc<InterruptHandle>,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    Self::init(conn).await
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    Self::init(conn).await
  }

  async fn init(conn: tokio_rusqlite::Connection) -> Result<Self> {
    let interrupt = conn
      .call(|conn| {
        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.execute_batch(SCHEMA)?;
        Ok(conn.get_interrupt_handle())
      })
      .await?;
    Ok(Self { conn, interrupt: Arc::new(interrupt) })
  }

  /// Run `op` on the connection thread, tied to the lifetime of the returned
  /// future.
  async fn run<R, F>(&self, op: F) -> Result<R>
  where
    R: Send + 'static,
    F: FnOnce(&mut rusqlite::Connection, &CallState) -> rusqlite::Result<R>
      + Send
      + 'static,
  {
    let state = Arc::new(CallState::default());
    let _guard = AbandonOnDrop {
      state:     Arc::clone(&state),
      interrupt: Arc::clone(&self.interrupt),
    };

    let out = self
      .conn
      .call(move |conn| {
        state.begin()?;
        let out = op(conn, state.as_ref());
        state.finish();
        Ok(out?)
      })
      .await?;
    Ok(out)
  }
}

// ─── Cancellation ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
  Queued,
  Running,
  Done,
  Abandoned,
}

/// Progress of one call, shared between the connection thread and the
/// caller's future.
struct CallState {
  phase: Mutex<Phase>,
}

impl Default for CallState {
  fn default() -> Self { Self { phase: Mutex::new(Phase::Queued) } }
}

impl CallState {
  fn phase(&self) -> std::sync::MutexGuard<'_, Phase> {
    self.phase.lock().unwrap_or_else(PoisonError::into_inner)
  }

  fn begin(&self) -> rusqlite::Result<()> {
    let mut phase = self.phase();
    if *phase == Phase::Abandoned {
      return Err(interrupted());
    }
    *phase = Phase::Running;
    Ok(())
  }

  /// Fails once the caller has stopped waiting.
  fn ensure_wanted(&self) -> rusqlite::Result<()> {
    if *self.phase() == Phase::Abandoned {
      return Err(interrupted());
    }
    Ok(())
  }

  fn finish(&self) {
    let mut phase = self.phase();
    if *phase == Phase::Running {
      *phase = Phase::Done;
    }
  }
}

/// Marks the call abandoned when the caller's future is dropped early. The
/// interrupt is only issued while the call itself is running, so it can never
/// land on a later call.
struct AbandonOnDrop {
  state:     Arc<CallState>,
  interrupt: Arc<InterruptHandle>,
}

impl Drop for AbandonOnDrop {
  fn drop(&mut self) {
    let mut phase = self.state.phase();
    match *phase {
      Phase::Queued => *phase = Phase::Abandoned,
      Phase::Running => {
        *phase = Phase::Abandoned;
        tracing::debug!("interrupting abandoned store call");
        self.interrupt.interrupt();
      }
      Phase::Done | Phase::Abandoned => {}
    }
  }
}

fn interrupted() -> rusqlite::Error {
  rusqlite::Error::SqliteFailure(
    rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_INTERRUPT),
    Some("store call abandoned by its caller".to_owned()),
  )
}

/// Run `f` inside an `IMMEDIATE` transaction and commit only if the caller is
/// still waiting once the write lock is held.
fn write<R>(
  conn: &mut rusqlite::Connection,
  call: &CallState,
  f:    impl FnOnce(&rusqlite::Transaction<'_>) -> rusqlite::Result<R>,
) -> rusqlite::Result<R> {
  let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
  call.ensure_wanted()?;
  let out = f(&tx)?;
  call.ensure_wanted()?;
  tx.commit()?;
  Ok(out)
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

/// Owned column values for an INSERT or UPDATE, ready to move into the
/// connection thread.
struct WriteParams {
  service_name: String,
  price:        i64,
  user_id:      String,
  start_date:   String,
  end_date:     Option<String>,
}

impl From<&NewSubscription> for WriteParams {
  fn from(input: &NewSubscription) -> Self {
    Self {
      service_name: input.service_name.clone(),
      price:        input.price,
      user_id:      encode_uuid(input.user_id),
      start_date:   encode_month(input.start_date),
      end_date:     input.end_date.map(encode_month),
    }
  }
}

fn sql_count(n: usize) -> i64 { i64::try_from(n).unwrap_or(i64::MAX) }

#[cfg(test)]
impl SqliteStore {
  /// Ids of every row matched by `predicate` as rendered into SQL.
  pub(crate) async fn ids_matching(
    &self,
    predicate: &subtrack_core::filter::Predicate,
  ) -> Result<Vec<Uuid>> {
    let filter = SqlWhere::from_predicate(predicate);
    let sql = format!("SELECT id FROM subscriptions {}", filter.clause());
    let params = filter.into_params();

    let raw: Vec<String> = self
      .run(move |conn, _| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(params), |row| row.get(0))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raw.iter().map(|s| crate::encode::decode_uuid(s)).collect()
  }
}

// ─── SubscriptionStore impl ──────────────────────────────────────────────────

impl SubscriptionStore for SqliteStore {
  type Error = crate::Error;

  async fn create(&self, input: NewSubscription) -> Result<Subscription> {
    input.validate()?;

    let now = Utc::now();
    let subscription = Subscription {
      id:           Uuid::new_v4(),
      service_name: input.service_name.clone(),
      price:        input.price,
      user_id:      input.user_id,
      start_date:   input.start_date,
      end_date:     input.end_date,
      created_at:   now,
      updated_at:   now,
    };

    let w      = WriteParams::from(&input);
    let id_str = encode_uuid(subscription.id);
    let at_str = encode_dt(now);

    self
      .run(move |conn, call| {
        write(conn, call, |tx| {
          tx.execute(
            "INSERT INTO subscriptions (
               id, service_name, price, user_id, start_date, end_date,
               created_at, updated_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)",
            rusqlite::params![
              id_str,
              w.service_name,
              w.price,
              w.user_id,
              w.start_date,
              w.end_date,
              at_str,
            ],
          )
        })
      })
      .await?;

    tracing::debug!(id = %subscription.id, service = %subscription.service_name, "created subscription");
    Ok(subscription)
  }

  async fn get(&self, id: Uuid) -> Result<Option<Subscription>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawSubscription> = self
      .run(move |conn, _| {
        conn
          .query_row(
            &format!("SELECT {SUBSCRIPTION_COLUMNS} FROM subscriptions WHERE id = ?1"),
            rusqlite::params![id_str],
            RawSubscription::from_row,
          )
          .optional()
      })
      .await?;

    raw.map(RawSubscription::into_subscription).transpose()
  }

  async fn update(&self, id: Uuid, input: NewSubscription) -> Result<bool> {
    input.validate()?;

    let w      = WriteParams::from(&input);
    let id_str = encode_uuid(id);
    let at_str = encode_dt(Utc::now());

    let changed = self
      .run(move |conn, call| {
        write(conn, call, |tx| {
          tx.execute(
            "UPDATE subscriptions
             SET service_name = ?1, price = ?2, user_id = ?3,
                 start_date = ?4, end_date = ?5, updated_at = ?6
             WHERE id = ?7",
            rusqlite::params![
              w.service_name,
              w.price,
              w.user_id,
              w.start_date,
              w.end_date,
              at_str,
              id_str,
            ],
          )
        })
      })
      .await?;

    tracing::debug!(%id, found = changed == 1, "updated subscription");
    Ok(changed == 1)
  }

  async fn delete(&self, id: Uuid) -> Result<bool> {
    let id_str = encode_uuid(id);

    let removed = self
      .run(move |conn, call| {
        write(conn, call, |tx| {
          tx.execute(
            "DELETE FROM subscriptions WHERE id = ?1",
            rusqlite::params![id_str],
          )
        })
      })
      .await?;

    tracing::debug!(%id, found = removed == 1, "deleted subscription");
    Ok(removed == 1)
  }

  async fn list(&self, query: &ListQuery) -> Result<Vec<Subscription>> {
    let mut filter = SqlWhere::from_predicate(&query.filter.predicate());
    let limit      = filter.bind(sql_count(query.effective_limit()));
    let offset     = filter.bind(sql_count(query.offset));

    // rowid breaks ties between rows created within the same instant.
    let sql = format!(
      "SELECT {SUBSCRIPTION_COLUMNS}
       FROM subscriptions
       {where_clause}
       ORDER BY created_at DESC, rowid DESC
       LIMIT {limit} OFFSET {offset}",
      where_clause = filter.clause(),
    );
    let params = filter.into_params();

    let raws: Vec<RawSubscription> = self
      .run(move |conn, _| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(params), RawSubscription::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawSubscription::into_subscription).collect()
  }

  async fn summary(
    &self,
    from:   Month,
    to:     Month,
    filter: &SubscriptionFilter,
  ) -> Result<i64> {
    let window = BillingWindow::new(from, to)?;

    // SQLite narrows to the candidates that overlap the window; the arithmetic
    // itself stays in `BillingWindow`.
    let candidates = SqlWhere::from_predicate(&filter.predicate().active_within(window));
    let sql = format!(
      "SELECT price, start_date, end_date FROM subscriptions {}",
      candidates.clause()
    );
    let params = candidates.into_params();

    let raws: Vec<RawBillable> = self
      .run(move |conn, _| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(params), |row| {
            Ok(RawBillable {
              price:      row.get(0)?,
              start_date: row.get(1)?,
              end_date:   row.get(2)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    let periods: Vec<BillablePeriod> = raws
      .into_iter()
      .map(RawBillable::into_period)
      .collect::<Result<_>>()?;

    let total = window.total(&periods);
    tracing::debug!(%from, %to, candidates = periods.len(), total, "computed summary");
    Ok(total)
  }

  async fn ping(&self) -> Result<()> {
    self
      .run(|conn, _| conn.query_row("SELECT 1", [], |_| Ok(())))
      .await
  }
}
