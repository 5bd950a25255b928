//! # 层级与槽位合法性策略
//!
//! ## 核心意图（Why）
//! - 节点按 `network ⊃ domain ⊃ device ⊃ vm` 严格包含；客户端对自身所在层级的“祖先”可以逐步获知，
//!   对同层或下层则在结构上不可能有合法取值；
//! - 将“某层级的客户端允许记录哪些槽位”集中在一张静态表 [`SLOT_POLICY`] 中，所有访问器查表，
//!   规则只在一处声明，便于审计。
//!
//! ## 状态约束（What）
//! - 自身层级的槽位为 [`SlotState::Own`]，构造后只读；
//! - 位于自身层级之上的槽位为 [`SlotState::LegalOptional`]，可缺省、可在获知后写入；
//! - 其余槽位为 [`SlotState::Illegal`]，永远为空，任何写入都会被拒绝；
//! - vm 只隶属于唯一的 device，因此 device 客户端的 vm 槽位同样非法。

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// 节点在包含层级中的位置，同时也用来命名客户端的四个槽位。
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    /// 最外层容器，没有任何祖先。
    Network,
    /// 隶属于某个 network。
    Domain,
    /// 隶属于某个 domain。
    Device,
    /// 隶属于某个 device 的虚拟机。
    Vm,
}

impl Tier {
    /// 按包含顺序（由外到内）排列的全部层级。
    pub const ALL: [Tier; 4] = [Tier::Network, Tier::Domain, Tier::Device, Tier::Vm];

    /// 包含深度：network 为 0，vm 为 3。
    #[must_use]
    pub const fn depth(self) -> usize {
        match self {
            Tier::Network => 0,
            Tier::Domain => 1,
            Tier::Device => 2,
            Tier::Vm => 3,
        }
    }

    /// 槽位名，用于错误信息与日志字段。
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Tier::Network => "network",
            Tier::Domain => "domain",
            Tier::Device => "device",
            Tier::Vm => "vm",
        }
    }

    /// 客户端诊断标签中使用的层级名。
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Tier::Network => "Network",
            Tier::Domain => "Domain",
            Tier::Device => "Device",
            Tier::Vm => "VM",
        }
    }

    /// 查询本层级客户端的 `slot` 槽位状态。
    #[must_use]
    pub const fn slot_state(self, slot: Tier) -> SlotState {
        SLOT_POLICY[self.depth()][slot.depth()]
    }

    /// `self` 是否严格包含 `other`。
    #[must_use]
    pub const fn contains(self, other: Tier) -> bool {
        self.depth() < other.depth()
    }

    /// 本层级客户端可以记录的祖先槽位，由外到内排列。
    pub fn legal_slots(self) -> impl Iterator<Item = Tier> {
        Self::slots_in(self, SlotState::LegalOptional)
    }

    /// 本层级客户端永远不能记录的槽位。
    pub fn illegal_slots(self) -> impl Iterator<Item = Tier> {
        Self::slots_in(self, SlotState::Illegal)
    }

    fn slots_in(self, state: SlotState) -> impl Iterator<Item = Tier> {
        Tier::ALL
            .into_iter()
            .filter(move |slot| self.slot_state(*slot) == state)
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Tier {
    type Err = UnknownTier;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Tier::ALL
            .into_iter()
            .find(|tier| tier.label().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownTier(s.to_owned()))
    }
}

/// 无法识别的层级名。
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("unknown tier `{0}`, expected one of network, domain, device, vm")]
pub struct UnknownTier(pub String);

/// 某层级客户端上单个槽位的状态。
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SlotState {
    /// 客户端自身的位置：始终已解析，构造后只读。
    Own,
    /// 位于客户端之上的祖先：可缺省，获知后可写入。
    LegalOptional,
    /// 结构上不可能存在的位置：始终为空，写入一律拒绝。
    Illegal,
}

use SlotState::{Illegal, LegalOptional, Own};

/// 槽位合法性表，按 `[客户端层级][槽位]` 索引，行列顺序均为 network、domain、device、vm。
pub const SLOT_POLICY: [[SlotState; 4]; 4] = [
    // network 客户端：位于顶层，没有祖先。
    [Own, Illegal, Illegal, Illegal],
    // domain 客户端
    [LegalOptional, Own, Illegal, Illegal],
    // device 客户端
    [LegalOptional, LegalOptional, Own, Illegal],
    // vm 客户端
    [LegalOptional, LegalOptional, LegalOptional, Own],
];
