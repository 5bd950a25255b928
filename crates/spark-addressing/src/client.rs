//! # 客户端寻址句柄（Client）
//!
//! ## 核心意图（Why）
//! - 消息分发层向某个节点发送消息时持有的调用方句柄：必须精确知道目标节点自身的身份，
//!   并可以额外记录零到多个已获知的祖先容器；
//! - 无论目标位于哪一层级，分发层都通过同一个 [`Client`] 类型访问四个槽位，层级差异完全由
//!   [`SLOT_POLICY`](crate::tier::SLOT_POLICY) 决定，而不是靠四套重复的访问器。
//!
//! ## 教案式使用指南（How）
//! 1. 通过 [`Client::new`] 或 [`Client::builder`] 构造，提供名称、传输路由、自身位置与已知祖先；
//! 2. 通过带外发现获知新的祖先后，调用 `set_network`/`set_domain`/`set_device`/`set_vm`；
//!    若该槽位对本层级不合法，返回 [`IllegalLocationAssignment`]；
//! 3. 发送消息前调用 [`Client::address`] 取得地址快照。
//!
//! ## 并发约束（What）
//! - 单一逻辑所有者负责构造与后续写入；跨线程共享需由调用方加锁或使用
//!   [`ClientRegistry`](crate::registry::ClientRegistry)；
//! - 所有操作都是同步的内存状态变更，不阻塞、不做 I/O。

use std::{fmt, sync::Arc};

use tracing::{debug, warn};

use crate::{
    address::Address,
    error::IllegalLocationAssignment,
    location::{Location, SpecificLocation},
    route::Route,
    tier::{SlotState, Tier},
    uid::Uid,
};

/// 面向单个节点的寻址句柄。
///
/// # 教案式说明
/// - **意图 (Why)**：以“层级标签 + 策略表”表达层级一致性，替代按层级覆写访问器的做法；
/// - **契约 (What)**：
///   - `tier`：目标节点的层级，构造后不变；
///   - `name`：展示用名称，不要求唯一；
///   - `routes`：按偏好排序的传输描述符，由客户端独占；
///   - `own`：自身槽位，始终已解析；
///   - `ancestors`：按 network、domain、device、vm 排列，只有合法可选槽位可能为 `Some`；
/// - **风险 (Trade-offs)**：`id` 不单独存储，始终从自身槽位派生，避免两份身份不一致。
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Client {
    tier: Tier,
    name: Arc<str>,
    routes: Vec<Route>,
    own: SpecificLocation,
    ancestors: [Option<SpecificLocation>; 4],
}

impl Client {
    /// 以自身位置构造客户端，所有祖先槽位为空。
    ///
    /// - **契约 (What)**：`own` 即目标节点的已解析位置，写入 `tier` 对应的槽位；
    /// - **后置条件**：`id()` 返回 `own.id()`，该值在对象生命周期内不变。
    pub fn new(
        tier: Tier,
        name: impl Into<Arc<str>>,
        routes: Vec<Route>,
        own: SpecificLocation,
    ) -> Self {
        Self {
            tier,
            name: name.into(),
            routes,
            own,
            ancestors: Default::default(),
        }
    }

    /// 创建构造器，以便在构造阶段一并提供已知祖先。
    pub fn builder(tier: Tier, name: impl Into<Arc<str>>, own: SpecificLocation) -> ClientBuilder {
        ClientBuilder {
            tier,
            name: name.into(),
            own,
            routes: Vec::new(),
            ancestors: Vec::new(),
        }
    }

    /// 目标节点的身份，即自身槽位的身份。
    pub fn id(&self) -> Uid {
        self.own_location().id()
    }

    /// 目标节点层级。
    pub fn tier(&self) -> Tier {
        self.tier
    }

    /// 展示用名称。
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 目标节点自身的已解析位置。
    pub fn own_location(&self) -> &SpecificLocation {
        &self.own
    }

    /// 读取任意槽位：已获知时返回位置，未获知或非法时返回 `None`。
    pub fn location(&self, slot: Tier) -> Option<&SpecificLocation> {
        if slot == self.tier {
            Some(&self.own)
        } else {
            self.ancestors[slot.depth()].as_ref()
        }
    }

    /// network 槽位。
    pub fn network(&self) -> Option<&SpecificLocation> {
        self.location(Tier::Network)
    }

    /// domain 槽位。
    pub fn domain(&self) -> Option<&SpecificLocation> {
        self.location(Tier::Domain)
    }

    /// device 槽位。
    pub fn device(&self) -> Option<&SpecificLocation> {
        self.location(Tier::Device)
    }

    /// vm 槽位。
    pub fn vm(&self) -> Option<&SpecificLocation> {
        self.location(Tier::Vm)
    }

    /// 槽位是否持有已解析的位置。
    pub fn knows(&self, slot: Tier) -> bool {
        self.location(slot).is_some()
    }

    /// 记录新获知的祖先位置。
    ///
    /// # 教案式注释
    /// - **意图 (Why)**：带外发现祖先后保存下来，后续发出的消息地址即可携带该信息；
    /// - **契约 (What)**：
    ///   - 槽位为 [`SlotState::LegalOptional`] 时写入并覆盖旧值（槽位是单值的，不会累积）；
    ///   - 自身槽位或非法槽位一律返回 [`IllegalLocationAssignment`]，状态保持不变；
    /// - **执行 (How)**：查询 `tier.slot_state(slot)` 后分支，拒绝时输出 `warn` 级事件。
    pub fn set_location<L: Location>(
        &mut self,
        slot: Tier,
        location: L,
    ) -> Result<(), IllegalLocationAssignment> {
        self.check_writable(slot, Some(location.id()))?;
        let resolved = SpecificLocation::resolve(&location);
        debug!(
            client = %self,
            tier = %self.tier,
            slot = %slot,
            uid = %resolved.id(),
            "recorded ancestor location"
        );
        self.ancestors[slot.depth()] = Some(resolved);
        Ok(())
    }

    /// 写入 network 槽位。
    pub fn set_network<L: Location>(
        &mut self,
        location: L,
    ) -> Result<(), IllegalLocationAssignment> {
        self.set_location(Tier::Network, location)
    }

    /// 写入 domain 槽位。
    pub fn set_domain<L: Location>(
        &mut self,
        location: L,
    ) -> Result<(), IllegalLocationAssignment> {
        self.set_location(Tier::Domain, location)
    }

    /// 写入 device 槽位。
    pub fn set_device<L: Location>(
        &mut self,
        location: L,
    ) -> Result<(), IllegalLocationAssignment> {
        self.set_location(Tier::Device, location)
    }

    /// 写入 vm 槽位。
    pub fn set_vm<L: Location>(
        &mut self,
        location: L,
    ) -> Result<(), IllegalLocationAssignment> {
        self.set_location(Tier::Vm, location)
    }

    /// 清除已获知的祖先，返回旧值。
    ///
    /// - **契约 (What)**：只作用于合法可选槽位；自身槽位与非法槽位返回
    ///   [`IllegalLocationAssignment`]，其 `attempted()` 为 `None`，`is_forget()` 为真。
    pub fn forget(
        &mut self,
        slot: Tier,
    ) -> Result<Option<SpecificLocation>, IllegalLocationAssignment> {
        self.check_writable(slot, None)?;
        Ok(self.ancestors[slot.depth()].take())
    }

    /// `attempted` 为 `None` 表示清除操作。
    fn check_writable(
        &self,
        slot: Tier,
        attempted: Option<Uid>,
    ) -> Result<(), IllegalLocationAssignment> {
        match self.tier.slot_state(slot) {
            SlotState::LegalOptional => Ok(()),
            SlotState::Own | SlotState::Illegal => {
                let err = match attempted {
                    Some(uid) => IllegalLocationAssignment::assign(self.tier, slot, uid),
                    None => IllegalLocationAssignment::forget(self.tier, slot),
                };
                warn!(
                    client = %self,
                    tier = %self.tier,
                    slot = %slot,
                    uid = ?attempted,
                    "rejected location change: {err}"
                );
                Err(err)
            }
        }
    }

    /// 按偏好顺序排列的传输路由。
    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    /// 路由序列的可变视图，调用方可重新排序或删除。
    pub fn routes_mut(&mut self) -> &mut Vec<Route> {
        &mut self.routes
    }

    /// 追加一条最低优先级的路由。
    pub fn push_route(&mut self, route: Route) {
        self.routes.push(route);
    }

    /// 插入一条最高优先级的路由。
    pub fn prefer_route(&mut self, route: Route) {
        self.routes.insert(0, route);
    }

    /// 生成发往目标节点的地址快照。
    pub fn address(&self) -> Address {
        Address {
            network: self.network().cloned(),
            domain: self.domain().cloned(),
            device: self.device().cloned(),
            vm: self.vm().cloned(),
        }
    }
}

impl fmt::Display for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}:{}>", self.tier.display_name(), self.name)
    }
}

/// [`Client`] 构造器，在构造阶段校验已知祖先。
///
/// # 教案式说明
/// - **意图 (Why)**：构造时提供的祖先与事后写入遵循同一条层级规则，不能绕过；
/// - **契约 (What)**：`build` 逐个校验祖先，第一个违规的槽位即返回
///   [`IllegalLocationAssignment`]；同一槽位多次提供时以最后一次为准。
#[derive(Clone, Debug)]
#[must_use]
pub struct ClientBuilder {
    tier: Tier,
    name: Arc<str>,
    own: SpecificLocation,
    routes: Vec<Route>,
    ancestors: Vec<(Tier, SpecificLocation)>,
}

impl ClientBuilder {
    /// 追加一条路由。
    pub fn route(mut self, route: impl Into<Route>) -> Self {
        self.routes.push(route.into());
        self
    }

    /// 追加一组路由，保持给定顺序。
    pub fn routes<I>(mut self, routes: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Route>,
    {
        self.routes.extend(routes.into_iter().map(Into::into));
        self
    }

    /// 提供已知的祖先位置。
    pub fn ancestor<L: Location>(mut self, slot: Tier, location: L) -> Self {
        self.ancestors.push((slot, SpecificLocation::resolve(&location)));
        self
    }

    /// 提供已知的 network 位置。
    pub fn network<L: Location>(self, location: L) -> Self {
        self.ancestor(Tier::Network, location)
    }

    /// 提供已知的 domain 位置。
    pub fn domain<L: Location>(self, location: L) -> Self {
        self.ancestor(Tier::Domain, location)
    }

    /// 提供已知的 device 位置。
    pub fn device<L: Location>(self, location: L) -> Self {
        self.ancestor(Tier::Device, location)
    }

    /// 提供已知的 vm 位置。
    pub fn vm<L: Location>(self, location: L) -> Self {
        self.ancestor(Tier::Vm, location)
    }

    /// 校验并生成客户端。
    pub fn build(self) -> Result<Client, IllegalLocationAssignment> {
        let mut client = Client::new(self.tier, self.name, self.routes, self.own);
        for (slot, location) in self.ancestors {
            client.set_location(slot, location)?;
        }
        Ok(client)
    }
}

#[cfg(test)]
mod tests {
    use tracing_test::traced_test;

    use super::*;

    fn loc(id: u128) -> SpecificLocation {
        SpecificLocation::new(Uid::from_u128(id))
    }

    #[test]
    fn own_slot_is_resolved_and_drives_id() {
        let client = Client::new(Tier::Domain, "clinic", Vec::new(), loc(2));
        assert_eq!(client.id(), Uid::from_u128(2));
        assert_eq!(client.domain().map(SpecificLocation::id), Some(Uid::from_u128(2)));
        assert!(client.knows(Tier::Domain));
        assert!(!client.knows(Tier::Network));
    }

    #[test]
    fn legal_write_replaces_previous_value() {
        let mut client = Client::new(Tier::Vm, "worker", Vec::new(), loc(4));
        client.set_device(loc(30)).unwrap();
        client.set_device(loc(31)).unwrap();
        assert_eq!(client.device(), Some(&loc(31)));
    }

    #[test]
    fn own_slot_cannot_be_rewritten_or_forgotten() {
        let mut client = Client::new(Tier::Device, "edge", Vec::new(), loc(3));
        let err = client.set_device(loc(99)).unwrap_err();
        assert!(err.targets_own_slot());
        assert!(client.forget(Tier::Device).is_err());
        assert_eq!(client.id(), Uid::from_u128(3));
    }

    #[test]
    fn rejected_forget_reports_no_attempted_uid() {
        let mut client = Client::new(Tier::Network, "grid", Vec::new(), loc(1));
        let err = client.forget(Tier::Domain).unwrap_err();
        assert!(err.is_forget());
        assert_eq!(err.attempted(), None);
        assert_eq!((err.tier(), err.slot()), (Tier::Network, Tier::Domain));
        assert!(err.to_string().starts_with("cannot forget"), "{err}");
    }

    #[test]
    fn forget_clears_legal_slot() {
        let mut client = Client::builder(Tier::Device, "edge", loc(3))
            .domain(loc(2))
            .build()
            .unwrap();
        assert_eq!(client.forget(Tier::Domain).unwrap(), Some(loc(2)));
        assert!(client.domain().is_none());
        assert_eq!(client.forget(Tier::Domain).unwrap(), None);
    }

    #[test]
    fn builder_rejects_illegal_ancestor() {
        let err = Client::builder(Tier::Domain, "clinic", loc(2))
            .network(loc(1))
            .device(loc(3))
            .build()
            .unwrap_err();
        assert_eq!(err.tier(), Tier::Domain);
        assert_eq!(err.slot(), Tier::Device);
        assert_eq!(err.attempted(), Some(Uid::from_u128(3)));
    }

    #[test]
    fn route_order_is_preference_order() {
        let mut client = Client::builder(Tier::Network, "grid", loc(1))
            .routes(["tcp://a", "tcp://b"])
            .build()
            .unwrap();
        client.prefer_route(Route::new("loopback"));
        client.push_route(Route::new("tcp://c"));
        let order: Vec<&str> = client.routes().iter().map(Route::as_str).collect();
        assert_eq!(order, ["loopback", "tcp://a", "tcp://b", "tcp://c"]);
    }

    #[test]
    fn display_is_tier_qualified() {
        let client = Client::new(Tier::Vm, "alice", Vec::new(), loc(9));
        assert_eq!(client.to_string(), "<VM:alice>");
    }

    #[test]
    #[traced_test]
    fn rejected_write_is_logged() {
        let mut client = Client::new(Tier::Network, "grid", Vec::new(), loc(1));
        assert!(client.set_vm(loc(5)).is_err());
        assert!(logs_contain("rejected location change"));
    }
}
