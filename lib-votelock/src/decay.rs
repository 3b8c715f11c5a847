//! Decay Replay
//!
//! Advances a [`Point`] through time one week boundary at a time, applying the
//! scheduled slope changes it crosses. Replay cost is bounded by the number of
//! weeks elapsed, which is why slope changes only ever land on week
//! boundaries.

use lib_types::Timestamp;

use crate::errors::{VoteLockError, VoteLockResult};
use crate::point::Point;
use crate::schedule::SlopeSchedule;
use crate::WEEK;

/// Round a timestamp down to its week boundary
pub fn round_to_week(ts: Timestamp) -> Timestamp {
    ts / WEEK * WEEK
}

/// `max(bias - slope * elapsed, 0)`
pub fn decay_bias(bias: i128, slope: i128, elapsed: Timestamp) -> VoteLockResult<i128> {
    let elapsed = i128::from(elapsed);
    let decayed = slope
        .checked_mul(elapsed)
        .and_then(|loss| bias.checked_sub(loss))
        .ok_or(VoteLockError::Overflow)?;
    Ok(decayed.max(0))
}

/// Add a slope delta, failing if the slope would turn negative
pub fn apply_slope_change(slope: i128, delta: i128, at: Timestamp) -> VoteLockResult<i128> {
    let updated = slope.checked_add(delta).ok_or(VoteLockError::Overflow)?;
    if updated < 0 {
        tracing::error!(
            "Negative slope {} after applying change {} at {}",
            updated,
            delta,
            at
        );
        return Err(VoteLockError::DataConsistency(format!(
            "slope would become {} at {}",
            updated, at
        )));
    }
    Ok(updated)
}

/// Replay `point` forward to `target`, returning the point at `target`
pub fn replay(point: Point, schedule: &SlopeSchedule, target: Timestamp) -> VoteLockResult<Point> {
    replay_with(point, schedule, target, |_| {})
}

/// Replay `point` forward to `target`, reporting every intermediate week
/// boundary point (strictly before `target`) to `on_week`
///
/// The returned point has `timestamp == target`; its `block` is left as the
/// starting point's block for the caller to assign.
pub fn replay_with<F>(
    point: Point,
    schedule: &SlopeSchedule,
    target: Timestamp,
    mut on_week: F,
) -> VoteLockResult<Point>
where
    F: FnMut(Point),
{
    if target < point.timestamp {
        return Err(VoteLockError::DataConsistency(format!(
            "replay target {} precedes checkpoint at {}",
            target, point.timestamp
        )));
    }

    let mut current = point;
    let mut boundary = round_to_week(current.timestamp);
    loop {
        boundary = boundary.checked_add(WEEK).ok_or(VoteLockError::Overflow)?;
        let (t, delta) = if boundary > target {
            (target, 0)
        } else {
            (boundary, schedule.get(boundary))
        };

        current.bias = decay_bias(current.bias, current.slope, t - current.timestamp)?;
        current.slope = apply_slope_change(current.slope, delta, t)?;
        current.timestamp = t;

        if t == target {
            break;
        }
        on_week(current);
    }

    Ok(current)
}
