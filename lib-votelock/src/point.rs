//! Checkpoint Points
//!
//! A [`Point`] is a linear voting-power function anchored at a block:
//! `power(t) = max(bias - slope * (t - timestamp), 0)`.
//!
//! [`PointHistory`] is the append-only sequence of points for one owner
//! (an account, or the global aggregate). Epoch 0 is the origin point;
//! each checkpoint appends the next epoch.

use serde::{Deserialize, Serialize};

use lib_types::{BlockHeight, BlockStamp, Timestamp};

/// A (bias, slope) checkpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Point {
    /// Voting power at `timestamp`
    pub bias: i128,
    /// Power lost per second
    pub slope: i128,
    pub timestamp: Timestamp,
    pub block: BlockHeight,
}

impl Point {
    /// Zero-power point anchored at `stamp`
    pub fn zero_at(stamp: BlockStamp) -> Self {
        Self {
            bias: 0,
            slope: 0,
            timestamp: stamp.timestamp,
            block: stamp.height,
        }
    }

    /// True if the point carries no power and no decay
    pub fn is_zero(&self) -> bool {
        self.bias == 0 && self.slope == 0
    }
}

/// Append-only sequence of points for one owner
///
/// Timestamps and block heights are non-decreasing; the epoch index strictly
/// increases with every push.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointHistory {
    origin: Point,
    points: Vec<Point>,
}

impl PointHistory {
    /// Start a history at `origin` (epoch 0)
    pub fn with_origin(origin: Point) -> Self {
        Self {
            origin,
            points: Vec::new(),
        }
    }

    /// Index of the latest point
    pub fn epoch(&self) -> u64 {
        self.points.len() as u64
    }

    pub fn origin(&self) -> &Point {
        &self.origin
    }

    /// Most recent point (the origin if nothing was pushed yet)
    pub fn last(&self) -> &Point {
        self.points.last().unwrap_or(&self.origin)
    }

    /// Point at `epoch`, if recorded
    pub fn get(&self, epoch: u64) -> Option<&Point> {
        if epoch == 0 {
            return Some(&self.origin);
        }
        usize::try_from(epoch - 1)
            .ok()
            .and_then(|i| self.points.get(i))
    }

    /// Append a point, returning its epoch
    pub fn push(&mut self, point: Point) -> u64 {
        debug_assert!(point.timestamp >= self.last().timestamp);
        debug_assert!(point.block >= self.last().block);
        self.points.push(point);
        self.epoch()
    }

    /// Latest epoch whose point has `timestamp <= ts`
    pub fn find_by_timestamp(&self, ts: Timestamp) -> Option<u64> {
        if ts < self.origin.timestamp {
            return None;
        }
        Some(self.points.partition_point(|p| p.timestamp <= ts) as u64)
    }

    /// Epoch anchoring block `height`
    ///
    /// The first point recorded in that block when there is one, otherwise
    /// the latest point before it. Points interpolated between checkpoints
    /// can share a height with an earlier checkpoint; the checkpoint is the
    /// one carrying the block's own timestamp.
    pub fn find_by_block(&self, height: BlockHeight) -> Option<u64> {
        if height < self.origin.block {
            return None;
        }
        if height == self.origin.block {
            return Some(0);
        }
        let below = self.points.partition_point(|p| p.block < height);
        match self.points.get(below) {
            Some(p) if p.block == height => Some(below as u64 + 1),
            _ => Some(below as u64),
        }
    }

    /// All points, origin first
    pub fn iter(&self) -> impl Iterator<Item = &Point> {
        std::iter::once(&self.origin).chain(self.points.iter())
    }
}

impl Default for PointHistory {
    fn default() -> Self {
        Self::with_origin(Point::default())
    }
}
