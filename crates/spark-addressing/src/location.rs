//! 位置抽象：能够报告稳定身份的节点引用。
//!
//! # 设计动机（Why）
//! - 客户端的四个槽位（network/domain/device/vm）只关心“这个位置是谁”，因此 [`Location`]
//!   只暴露读取身份的能力，没有任何可变接口；
//! - [`SpecificLocation`] 是“已解析”的位置，用于客户端自身的地址以及已经获知的祖先地址。
//!
//! # 契约说明（What）
//! - 位置一旦构造即不可变，可在多个客户端之间只读共享而无需同步；
//! - `SpecificLocation` 以 `Arc<str>` 保存可选标签，克隆只增加引用计数。

use std::{fmt, sync::Arc};

use serde::{Deserialize, Serialize};

use crate::uid::Uid;

/// 位置能力：报告稳定的身份令牌。
///
/// - **前置条件**：实现者保证在引用的整个生命周期内 `id()` 返回同一值；
/// - **扩展点**：`name()` 默认返回 `None`，带人类可读标签的实现可覆盖。
pub trait Location: fmt::Debug + Send + Sync {
    /// 返回位置的身份。
    fn id(&self) -> Uid;

    /// 位置的可读标签，仅用于诊断。
    fn name(&self) -> Option<&str> {
        None
    }
}

impl<L: Location + ?Sized> Location for &L {
    fn id(&self) -> Uid {
        (**self).id()
    }

    fn name(&self) -> Option<&str> {
        (**self).name()
    }
}

impl<L: Location + ?Sized> Location for Arc<L> {
    fn id(&self) -> Uid {
        (**self).id()
    }

    fn name(&self) -> Option<&str> {
        (**self).name()
    }
}

impl<L: Location + ?Sized> Location for Box<L> {
    fn id(&self) -> Uid {
        (**self).id()
    }

    fn name(&self) -> Option<&str> {
        (**self).name()
    }
}

/// 始终已解析的位置。
///
/// # 教案式说明
/// - **意图 (Why)**：客户端自身槽位必须总是已知，祖先槽位一旦获知也以同一类型存放，
///   这样读取方永远只面对“存在/未知”两种状态，而不是一个带歧义的空引用；
/// - **契约 (What)**：`id` 构造后不变；`name` 可选，仅参与展示与相等性比较；
/// - **风险 (Trade-offs)**：相等性同时比较标签，若只关心身份请比较 [`SpecificLocation::id`]。
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SpecificLocation {
    id: Uid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<Arc<str>>,
}

impl SpecificLocation {
    /// 以身份构造未命名的位置。
    #[must_use]
    pub fn new(id: Uid) -> Self {
        Self { id, name: None }
    }

    /// 以身份与标签构造位置。
    #[must_use]
    pub fn named(id: Uid, name: impl Into<Arc<str>>) -> Self {
        Self {
            id,
            name: Some(name.into()),
        }
    }

    /// 将任意 [`Location`] 固化为已解析的位置，捕获其身份与标签。
    #[must_use]
    pub fn resolve<L: Location + ?Sized>(location: &L) -> Self {
        Self {
            id: location.id(),
            name: location.name().map(Arc::from),
        }
    }

    /// 位置身份。
    #[must_use]
    pub fn id(&self) -> Uid {
        self.id
    }

    /// 位置标签。
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

impl Location for SpecificLocation {
    fn id(&self) -> Uid {
        self.id
    }

    fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

impl From<Uid> for SpecificLocation {
    fn from(id: Uid) -> Self {
        Self::new(id)
    }
}

impl fmt::Display for SpecificLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "<SpecificLocation:{name}:{}>", self.id),
            None => write!(f, "<SpecificLocation:{}>", self.id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Beacon(u128);

    impl Location for Beacon {
        fn id(&self) -> Uid {
            Uid::from_u128(self.0)
        }

        fn name(&self) -> Option<&str> {
            Some("beacon")
        }
    }

    #[test]
    fn resolve_captures_identity_and_label() {
        let shared = Arc::new(Beacon(42));
        let resolved = SpecificLocation::resolve(&shared);
        assert_eq!(resolved.id(), Uid::from_u128(42));
        assert_eq!(resolved.name(), Some("beacon"));
    }

    #[test]
    fn display_includes_label_when_present() {
        let plain = SpecificLocation::new(Uid::from_u128(1));
        let named = SpecificLocation::named(Uid::from_u128(1), "grid");
        assert_eq!(
            plain.to_string(),
            "<SpecificLocation:00000000000000000000000000000001>"
        );
        assert_eq!(
            named.to_string(),
            "<SpecificLocation:grid:00000000000000000000000000000001>"
        );
    }
}
