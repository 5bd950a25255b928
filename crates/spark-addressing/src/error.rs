//! # error 模块说明
//!
//! ## 角色定位（Why）
//! - 寻址核心唯一的领域错误是 [`IllegalLocationAssignment`]：试图为客户端记录一个其层级结构上
//!   不可能拥有的位置。它属于本地编程错误，寻址层既不重试也不恢复；
//! - 目录与配置清单在此之上各有一层包装错误，保留原始错误以便调用方按类型匹配。
//!
//! ## 设计要求（What）
//! - 全部使用 `thiserror::Error` 派生，错误信息为小写英文并携带足够定位的上下文；
//! - 错误信息必须同时点名槽位与客户端层级，无需查阅层级规则表即可诊断。

use std::path::PathBuf;

use thiserror::Error;

use crate::{tier::Tier, uid::Uid};

/// 写入或清除了客户端层级不允许的槽位。
///
/// # 教案式说明
/// - **意图 (Why)**：以类型化结果取代“抛出通用异常”，调用方可以直接读取层级、槽位与被拒绝的身份；
/// - **契约 (What)**：
///   - `tier`：客户端所在层级；
///   - `slot`：被拒绝的槽位；当 `slot == tier` 时表示试图改写客户端自身的位置；
///   - `attempted`：写入被拒绝时为本次写入的位置身份；清除（`forget`）被拒绝时为 `None`；
/// - **风险 (Trade-offs)**：该错误永远不应被重试，调用方必须停止为该层级记录此祖先。
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
#[error("{}: {}", self.action(), self.reason())]
pub struct IllegalLocationAssignment {
    tier: Tier,
    slot: Tier,
    attempted: Option<Uid>,
}

impl IllegalLocationAssignment {
    pub(crate) fn assign(tier: Tier, slot: Tier, attempted: Uid) -> Self {
        Self {
            tier,
            slot,
            attempted: Some(attempted),
        }
    }

    pub(crate) fn forget(tier: Tier, slot: Tier) -> Self {
        Self {
            tier,
            slot,
            attempted: None,
        }
    }

    /// 客户端层级。
    pub fn tier(&self) -> Tier {
        self.tier
    }

    /// 被拒绝的槽位。
    pub fn slot(&self) -> Tier {
        self.slot
    }

    /// 被拒绝写入的位置身份；清除操作被拒绝时为 `None`。
    pub fn attempted(&self) -> Option<Uid> {
        self.attempted
    }

    /// 被拒绝的是否为清除操作。
    pub fn is_forget(&self) -> bool {
        self.attempted.is_none()
    }

    /// 是否触及客户端自身的位置。
    pub fn targets_own_slot(&self) -> bool {
        self.tier == self.slot
    }

    fn action(&self) -> String {
        match self.attempted {
            Some(uid) => format!(
                "cannot assign a {} location to a {} client (uid {uid})",
                self.slot, self.tier
            ),
            None => format!(
                "cannot forget the {} location of a {} client",
                self.slot, self.tier
            ),
        }
    }

    fn reason(&self) -> String {
        if self.targets_own_slot() {
            format!(
                "the {} slot is the client's own location and is fixed at construction",
                self.slot
            )
        } else {
            format!(
                "this client points to a {}, it never holds a {} location",
                self.tier, self.slot
            )
        }
    }
}

/// [`TierClient::build`](crate::TierClient::build) 失败。
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum TierBuildError {
    /// 构造器中提供了本层级不允许的祖先。
    #[error(transparent)]
    Illegal(#[from] IllegalLocationAssignment),

    /// 构造器的层级与目标类型不一致。
    #[error("builder produced a {actual} client, expected a {expected} client")]
    TierMismatch { expected: Tier, actual: Tier },
}

/// 客户端目录错误。
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    /// 同一身份的客户端已经登记。
    #[error("a client with uid {id} is already registered")]
    AlreadyRegistered { id: Uid },

    /// 目标客户端未登记。
    #[error("no client registered under uid {id}")]
    NotFound { id: Uid },

    /// 目录转发的槽位写入被层级规则拒绝。
    #[error(transparent)]
    Illegal(#[from] IllegalLocationAssignment),
}

/// 客户端清单加载或装配失败。
#[derive(Debug, Error)]
pub enum ManifestError {
    /// 无法读取清单文件。
    #[error("failed to read client manifest `{}`", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// TOML 语法或字段类型错误。
    #[error("malformed client manifest: {0}")]
    Parse(#[from] toml::de::Error),

    /// 清单为某个客户端声明了其层级不允许的祖先。
    #[error("client `{client}` in manifest is inconsistent with the tier hierarchy")]
    Illegal {
        client: String,
        #[source]
        source: IllegalLocationAssignment,
    },

    /// 清单中出现重复的客户端身份。
    #[error("client manifest declares uid {id} more than once")]
    DuplicateClient { id: Uid },
}
