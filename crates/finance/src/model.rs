use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use contentmart_core::{Entity, OrderId, PackageId, ProfileId, UserId};

/// Financial account of one user.
///
/// Balances are in the smallest currency unit. They are signed: a purchase the
/// caller failed to pre-check can drive a balance below zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: ProfileId,
    pub user_id: UserId,
    pub balance: i64,
}

impl Entity for UserProfile {
    type Id = ProfileId;

    fn id(&self) -> ProfileId {
        self.id
    }
}

/// A completed purchase of a package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub profile_id: ProfileId,
    pub package_id: PackageId,
    /// Price at the time of purchase.
    pub price: i64,
    pub placed_at: DateTime<Utc>,
}

impl Entity for Order {
    type Id = OrderId;

    fn id(&self) -> OrderId {
        self.id
    }
}
