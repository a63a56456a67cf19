use ballast_types::{BallHash, BallRecord, UnitHash};
use serde_json::{Map, Value};

use crate::canonical::{base64_hash, CanonicalResult};

/// Ball hash computation.
///
/// A ball commits to a stable unit's hash and to the balls of its parents,
/// optionally to skip-list balls further back and to a non-serial flag:
/// the base64 hash of `{unit, parent_balls?, skiplist_balls?, is_nonserial?}`
/// where empty lists and a false flag are omitted. The lists are hashed in
/// the order given.
pub struct BallHasher;

impl BallHasher {
    /// Compute a ball hash.
    pub fn ball_hash(
        unit: &UnitHash,
        parent_balls: &[BallHash],
        skiplist_balls: &[BallHash],
        is_nonserial: bool,
    ) -> CanonicalResult<BallHash> {
        let mut ball = Map::new();
        ball.insert("unit".into(), Value::String(unit.to_string()));
        if !parent_balls.is_empty() {
            ball.insert("parent_balls".into(), string_list(parent_balls));
        }
        if !skiplist_balls.is_empty() {
            ball.insert("skiplist_balls".into(), string_list(skiplist_balls));
        }
        if is_nonserial {
            ball.insert("is_nonserial".into(), Value::Bool(true));
        }
        base64_hash(&Value::Object(ball))
    }

    /// Recompute the ball of a proof record.
    pub fn record_hash(record: &BallRecord) -> CanonicalResult<BallHash> {
        Self::ball_hash(
            &record.unit,
            &record.parent_balls,
            &record.skiplist_balls,
            record.is_nonserial,
        )
    }

    /// Returns `true` if the record's declared ball is correct.
    pub fn verify_record(record: &BallRecord) -> CanonicalResult<bool> {
        Ok(Self::record_hash(record)? == record.ball)
    }
}

fn string_list(hashes: &[BallHash]) -> Value {
    Value::Array(
        hashes
            .iter()
            .map(|h| Value::String(h.to_string()))
            .collect(),
    )
}
