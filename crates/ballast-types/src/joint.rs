use serde::{Deserialize, Serialize};

use crate::hash::{BallHash, UnitHash};
use crate::unit::Unit;

/// A unit paired with its ball, once the unit is stable.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Joint {
    pub unit: Unit,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ball: Option<BallHash>,
}

impl Joint {
    pub fn new(unit: Unit) -> Self {
        Self { unit, ball: None }
    }

    pub fn with_ball(unit: Unit, ball: BallHash) -> Self {
        Self {
            unit,
            ball: Some(ball),
        }
    }

    /// The unit's declared hash.
    pub fn unit_hash(&self) -> &UnitHash {
        &self.unit.unit
    }
}

/// One link of a ball-chain proof.
///
/// `parent_balls` and `skiplist_balls` are hashed in the order given; the
/// producer emits them sorted ascending by their base64 text.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BallRecord {
    pub unit: UnitHash,
    pub ball: BallHash,
    #[serde(default)]
    pub parent_balls: Vec<BallHash>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skiplist_balls: Vec<BallHash>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_nonserial: bool,
}

impl BallRecord {
    /// Every ancestor ball this record vouches for.
    pub fn referenced_balls(&self) -> impl Iterator<Item = &BallHash> {
        self.parent_balls.iter().chain(self.skiplist_balls.iter())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn ball_record_wire_format() {
        let raw = json!({
            "unit": "J9s98BJvW4SgS4ectpa1h3cQ9EJN3gtdv31mmRlM6HU=",
            "ball": "OwHR2mSXgwmcTcagG0Jutm5x5/6fkkSbkyIWX+TEm7E=",
            "parent_balls": ["bxApGP0z6bSFbVbp/qAbHXsrk/ZuhtdJrre3/tPeFwc="],
            "skiplist_balls": ["rSlG2LJ4HABx/nvEgsCqt2CXkZgByzPzvAC0E7uxXS0="]
        });
        let record: BallRecord = serde_json::from_value(raw.clone()).unwrap();
        assert!(!record.is_nonserial);
        assert_eq!(record.referenced_balls().count(), 2);
        assert_eq!(serde_json::to_value(&record).unwrap(), raw);
    }

    #[test]
    fn skiplist_is_optional() {
        let record: BallRecord = serde_json::from_value(json!({
            "unit": "l/Hfua7hAbCIdIL83nxsf4xXyi80dMp5NgUtlVHBhjs=",
            "ball": "lsC49OVxAU2d/Y7wr80LDPScq/MpNT8EuWLBQhXU514=",
            "parent_balls": ["afHf32n8vkXhtY7Y/Io7h55MyBakX3eOJ/1mxodHIRM="]
        }))
        .unwrap();
        assert!(record.skiplist_balls.is_empty());
    }
}
