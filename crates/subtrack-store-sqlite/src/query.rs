//! Rendering of [`Predicate`]s into SQLite `WHERE` clauses.
//!
//! Every value goes through [`SqlWhere::bind`], which pushes the parameter and
//! hands back its numbered placeholder in one step, so the clause text and the
//! parameter vector cannot fall out of step no matter which terms are present.

use rusqlite::types::Value;
use subtrack_core::filter::{Predicate, Term};

use crate::encode::{encode_month, encode_uuid};

#[derive(Debug, Default)]
pub struct SqlWhere {
  conditions: Vec<String>,
  params:     Vec<Value>,
}

impl SqlWhere {
  pub fn from_predicate(predicate: &Predicate) -> Self {
    let mut sql = Self::default();
    for term in predicate.terms() {
      let condition = match term {
        Term::UserId(id) => {
          let p = sql.bind(encode_uuid(*id));
          format!("user_id = {p}")
        }
        Term::ServiceName(name) => {
          let p = sql.bind(name.clone());
          format!("service_name = {p}")
        }
        Term::ActiveWithin(window) => {
          let to = sql.bind(encode_month(window.to()));
          let from = sql.bind(encode_month(window.from()));
          format!("start_date <= {to} AND (end_date IS NULL OR end_date >= {from})")
        }
      };
      sql.conditions.push(condition);
    }
    sql
  }

  /// Register a parameter and return its placeholder (`?N`).
  pub fn bind(&mut self, value: impl Into<Value>) -> String {
    self.params.push(value.into());
    format!("?{}", self.params.len())
  }

  /// `WHERE a AND (b)`, or an empty string when there are no conditions.
  pub fn clause(&self) -> String {
    if self.conditions.is_empty() {
      return String::new();
    }
    let joined = self
      .conditions
      .iter()
      .map(|c| format!("({c})"))
      .collect::<Vec<_>>()
      .join(" AND ");
    format!("WHERE {joined}")
  }

  pub fn into_params(self) -> Vec<Value> { self.params }
}
