//! Optional-criteria filters shared by listing and billing.
//!
//! Callers describe *what* to match with a [`SubscriptionFilter`]; backends
//! receive a [`Predicate`], an ordered conjunction of typed [`Term`]s, and
//! render each term into their own query language. `list` and `summary` both
//! start from the same `SubscriptionFilter::predicate`, so the set of records
//! listed and the set of records billed can never disagree for equal
//! criteria.

use uuid::Uuid;

use crate::{billing::BillingWindow, subscription::Subscription};

// ─── Filter ──────────────────────────────────────────────────────────────────

/// Equality criteria; every `Some` narrows the match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubscriptionFilter {
  pub user_id:      Option<Uuid>,
  /// Exact, case-sensitive match against the stored (trimmed) name.
  pub service_name: Option<String>,
}

impl SubscriptionFilter {
  pub fn new() -> Self { Self::default() }

  pub fn user(mut self, user_id: Uuid) -> Self {
    self.user_id = Some(user_id);
    self
  }

  pub fn service(mut self, service_name: impl Into<String>) -> Self {
    self.service_name = Some(service_name.into());
    self
  }

  /// The plain predicate used for listing.
  pub fn predicate(&self) -> Predicate {
    let mut predicate = Predicate::default();
    if let Some(user_id) = self.user_id {
      predicate.push(Term::UserId(user_id));
    }
    if let Some(name) = &self.service_name {
      predicate.push(Term::ServiceName(name.clone()));
    }
    predicate
  }
}

// ─── Predicate ───────────────────────────────────────────────────────────────

/// A single typed condition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Term {
  UserId(Uuid),
  ServiceName(String),
  /// The subscription's active range intersects the window.
  ActiveWithin(BillingWindow),
}

impl Term {
  pub fn matches(&self, sub: &Subscription) -> bool {
    match self {
      Term::UserId(id) => sub.user_id == *id,
      Term::ServiceName(name) => sub.service_name == *name,
      Term::ActiveWithin(window) => window.intersects(sub.start_date, sub.end_date),
    }
  }
}

/// A conjunction of terms. Empty matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Predicate {
  terms: Vec<Term>,
}

impl Predicate {
  pub fn push(&mut self, term: Term) { self.terms.push(term); }

  /// Intersect with the window-overlap condition, for billing.
  pub fn active_within(mut self, window: BillingWindow) -> Self {
    self.push(Term::ActiveWithin(window));
    self
  }

  pub fn terms(&self) -> &[Term] { &self.terms }

  pub fn is_empty(&self) -> bool { self.terms.is_empty() }

  /// In-memory evaluation. Backend renderings must agree with this.
  pub fn matches(&self, sub: &Subscription) -> bool {
    self.terms.iter().all(|t| t.matches(sub))
  }
}
