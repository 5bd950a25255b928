use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{location::SpecificLocation, tier::Tier, uid::Uid};

/// 随出站消息一起传递的地址快照。
///
/// # 教案式说明
/// - **意图 (Why)**：客户端对目标节点及其祖先的部分认知需要写入每条出站消息，
///   由下游的分发与传输层据此选择转发路径；快照与客户端解耦，之后对客户端的写入不会影响已生成的地址；
/// - **契约 (What)**：四个槽位各自独立可缺省，`None` 表示发送方不知道该层级；
/// - **风险 (Trade-offs)**：快照本身不校验层级一致性，一致性由产生它的 [`Client`](crate::Client) 保证。
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network: Option<SpecificLocation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<SpecificLocation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device: Option<SpecificLocation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vm: Option<SpecificLocation>,
}

impl Address {
    /// 读取指定层级的位置。
    pub fn get(&self, tier: Tier) -> Option<&SpecificLocation> {
        match tier {
            Tier::Network => self.network.as_ref(),
            Tier::Domain => self.domain.as_ref(),
            Tier::Device => self.device.as_ref(),
            Tier::Vm => self.vm.as_ref(),
        }
    }

    /// 最具体的已知位置的身份：依次尝试 vm、device、domain、network。
    pub fn target_id(&self) -> Option<Uid> {
        Tier::ALL
            .into_iter()
            .rev()
            .find_map(|tier| self.get(tier))
            .map(SpecificLocation::id)
    }

    /// 已知的层级，由外到内排列。
    pub fn known_tiers(&self) -> impl Iterator<Item = Tier> + '_ {
        Tier::ALL
            .into_iter()
            .filter(move |tier| self.get(*tier).is_some())
    }

    /// 四个槽位均未知。
    pub fn is_empty(&self) -> bool {
        self.known_tiers().next().is_none()
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, tier) in Tier::ALL.into_iter().enumerate() {
            if index > 0 {
                f.write_str("/")?;
            }
            match self.get(tier) {
                Some(location) => write!(f, "{}", location.id())?,
                None => f.write_str("?")?,
            }
        }
        Ok(())
    }
}
