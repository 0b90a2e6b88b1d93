//! Pure downtime state machine.
//!
//! Folds a new [`Check`]'s `available` flag and the target's current open
//! [`DowntimeWindow`] (queried once under the same transaction as the check
//! insert) into a [`DowntimeAction`] describing the window mutation, if any.
//! The store applies the action; this module never touches storage.

use chrono::{DateTime, Utc};

use mon_domain::types::{DowntimeAction, DowntimeWindow};

/// Decide what the target's open downtime window should become given a
/// new check outcome.
///
/// | open window | available | action |
/// |---|---|---|
/// | no  | false | `Open`  |
/// | no  | true  | `NoOp`  |
/// | yes | false | `NoOp`  |
/// | yes | true  | `Close` |
pub fn apply(open_window: Option<&DowntimeWindow>, available: bool) -> DowntimeAction {
    match (open_window, available) {
        (None, false) => DowntimeAction::Open,
        (None, true) => DowntimeAction::NoOp,
        (Some(_), false) => DowntimeAction::NoOp,
        (Some(_), true) => DowntimeAction::Close,
    }
}

/// Duration of a window at read time, clamped to zero if clock skew made
/// `ended_at` precede `started_at`. Thin wrapper kept alongside `apply` so
/// SLA computations and tests share one definition.
pub fn window_duration(window: &DowntimeWindow, now: DateTime<Utc>) -> chrono::Duration {
    window.duration(now)
}
