//! # 按层级特化的客户端句柄
//!
//! ## 定位（Why）
//! - [`Client`] 以运行时层级标签表达层级差异；在调用方已经静态知道目标层级时，
//!   [`TierClient<T>`] 把层级固定在类型上，构造签名即要求提供该层级自身的位置；
//! - 读取与写入委托给内部 [`Client`]，仍然经过同一张策略表，因此非法槽位的写入照样被拒绝。
//!
//! ## 契约（What）
//! - [`NetworkClient`]：自身槽位为 network，domain/device/vm 全部非法；
//! - [`DomainClient`]：可记录 network，device/vm 非法；
//! - [`DeviceClient`]：可记录 network/domain，vm 非法；
//! - [`VmClient`]：可记录 network/domain/device。

use std::{
    fmt,
    marker::PhantomData,
    ops::{Deref, DerefMut},
    sync::Arc,
};

use crate::{
    client::{Client, ClientBuilder},
    error::TierBuildError,
    location::SpecificLocation,
    route::Route,
    tier::Tier,
};

mod sealed {
    pub trait Sealed {}
}

/// 层级的类型级标记，仅由本 crate 实现。
pub trait TierMarker: sealed::Sealed + fmt::Debug + Send + Sync + 'static {
    /// 标记对应的运行时层级。
    const TIER: Tier;
}

macro_rules! tier_marker {
    ($(#[$meta:meta])* $marker:ident => $tier:expr) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
        pub struct $marker;

        impl sealed::Sealed for $marker {}

        impl TierMarker for $marker {
            const TIER: Tier = $tier;
        }
    };
}

tier_marker!(
    /// network 层级标记。
    Network => Tier::Network
);
tier_marker!(
    /// domain 层级标记。
    Domain => Tier::Domain
);
tier_marker!(
    /// device 层级标记。
    Device => Tier::Device
);
tier_marker!(
    /// vm 层级标记。
    Vm => Tier::Vm
);

/// 层级固定在类型上的客户端。
///
/// # 教案式说明
/// - **意图 (Why)**：调用方拿到 `DeviceClient` 时即可确定 `id()` 是 device 的身份，无需再检查层级；
/// - **契约 (What)**：内部 [`Client`] 的层级恒等于 `T::TIER`；通过 `Deref`/`DerefMut`
///   暴露全部读写接口，写入结果与 [`Client`] 完全一致；
/// - **风险 (Trade-offs)**：非法槽位的写入仍在运行时拒绝，而不是在编译期消除对应方法，
///   以便分发层可以统一以 `&mut Client` 处理所有层级。
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TierClient<T: TierMarker> {
    inner: Client,
    _tier: PhantomData<T>,
}

/// 指向 network 节点的客户端。
pub type NetworkClient = TierClient<Network>;
/// 指向 domain 节点的客户端。
pub type DomainClient = TierClient<Domain>;
/// 指向 device 节点的客户端。
pub type DeviceClient = TierClient<Device>;
/// 指向 vm 节点的客户端。
pub type VmClient = TierClient<Vm>;
/// [`VmClient`] 的别名，与其余节点类型的命名保持一致。
pub type VMClient = VmClient;

impl<T: TierMarker> TierClient<T> {
    /// 以自身位置构造，祖先槽位为空。
    pub fn new(name: impl Into<Arc<str>>, routes: Vec<Route>, own: SpecificLocation) -> Self {
        Self {
            inner: Client::new(T::TIER, name, routes, own),
            _tier: PhantomData,
        }
    }

    /// 创建构造器；构造完成后用 [`TierClient::from_client`] 收窄类型，或直接调用
    /// [`TierClient::build`]。
    pub fn builder(name: impl Into<Arc<str>>, own: SpecificLocation) -> ClientBuilder {
        Client::builder(T::TIER, name, own)
    }

    /// 完成构造器并固定层级。
    pub fn build(builder: ClientBuilder) -> Result<Self, TierBuildError> {
        let client = builder.build()?;
        Self::from_client(client).map_err(|client| TierBuildError::TierMismatch {
            expected: T::TIER,
            actual: client.tier(),
        })
    }

    /// 将运行时客户端收窄为本层级；层级不符时原样返回。
    pub fn from_client(client: Client) -> Result<Self, Client> {
        if client.tier() == T::TIER {
            Ok(Self {
                inner: client,
                _tier: PhantomData,
            })
        } else {
            Err(client)
        }
    }

    /// 取回内部的运行时客户端。
    pub fn into_inner(self) -> Client {
        self.inner
    }
}

impl<T: TierMarker> Deref for TierClient<T> {
    type Target = Client;

    fn deref(&self) -> &Client {
        &self.inner
    }
}

impl<T: TierMarker> DerefMut for TierClient<T> {
    fn deref_mut(&mut self) -> &mut Client {
        &mut self.inner
    }
}

impl<T: TierMarker> From<TierClient<T>> for Client {
    fn from(client: TierClient<T>) -> Self {
        client.inner
    }
}

impl<T: TierMarker> fmt::Display for TierClient<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.inner, f)
    }
}
