use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{ContainerId, UserId};

/// コマンド：容器を貸し出す
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BorrowContainer {
    pub user_id: UserId,
    pub container_id: ContainerId,
    pub borrowed_at: DateTime<Utc>,
}

/// コマンド：容器を返却する（APIでは "reset"）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReturnContainer {
    pub container_id: ContainerId,
    pub returned_at: DateTime<Utc>,
}
