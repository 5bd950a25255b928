use std::sync::Arc;

use dashmap::{
    DashMap,
    mapref::{
        entry::Entry,
        one::{Ref, RefMut},
    },
};
use tracing::{debug, info};

use crate::{
    address::Address,
    client::Client,
    error::{ManifestError, RegistryError},
    location::Location,
    manifest::ClientManifest,
    tier::Tier,
    uid::Uid,
};

/// `ClientRegistry` 充当节点本地的客户端目录。
///
/// # 教案式解读
/// - **意图（Why）**：
///   - 分发层按目标身份查找客户端，并在带外发现祖先时把新位置写回同一个客户端；
///   - [`Client`] 本身不为并发写入设计，目录以 `DashMap` 的分片锁充当调用方提供的外部锁。
/// - **作用域（Where）**：可被多个分发任务共享；克隆只复制内部 `Arc`。
/// - **实现策略（How）**：内部持有 `Arc<DashMap<Uid, Client>>`，以客户端自身身份为键。
///
/// # 契约说明
/// - **前置条件**：同一身份只登记一次；需要覆盖时显式调用 [`ClientRegistry::replace`]；
/// - **后置条件**：[`ClientRegistry::learn`] 与 [`Client::set_location`] 的判定完全一致；
/// - **风险提示**：`get`/`get_mut` 返回的 guard 持有期间会阻塞同分片写入，应尽快释放。
#[derive(Debug, Clone, Default)]
pub struct ClientRegistry {
    inner: Arc<DashMap<Uid, Client>>,
}

impl ClientRegistry {
    /// 构造空目录。
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// 按清单装配全部客户端并登记。
    pub fn from_manifest(manifest: &ClientManifest) -> Result<Self, ManifestError> {
        let registry = Self::new();
        for client in manifest.build()? {
            let id = client.id();
            registry
                .register(client)
                .map_err(|_| ManifestError::DuplicateClient { id })?;
        }
        info!(clients = registry.len(), "client registry loaded from manifest");
        Ok(registry)
    }

    /// 登记新客户端；同一身份已存在时返回 [`RegistryError::AlreadyRegistered`]。
    pub fn register(&self, client: Client) -> Result<(), RegistryError> {
        let id = client.id();
        match self.inner.entry(id) {
            Entry::Occupied(_) => Err(RegistryError::AlreadyRegistered { id }),
            Entry::Vacant(vacant) => {
                debug!(client = %client, uid = %id, "client registered");
                vacant.insert(client);
                Ok(())
            }
        }
    }

    /// 登记或覆盖客户端，返回被替换的旧值。
    pub fn replace(&self, client: Client) -> Option<Client> {
        self.inner.insert(client.id(), client)
    }

    /// 按身份获取只读 guard。
    pub fn get(&self, id: &Uid) -> Option<ClientRef<'_>> {
        self.inner.get(id)
    }

    /// 按身份获取可写 guard。
    pub fn get_mut(&self, id: &Uid) -> Option<ClientRefMut<'_>> {
        self.inner.get_mut(id)
    }

    /// 移除并返回客户端。
    pub fn remove(&self, id: &Uid) -> Option<Client> {
        self.inner.remove(id).map(|(_, client)| client)
    }

    /// 把带外发现的祖先写入目标客户端。
    ///
    /// - **错误**：目标未登记返回 [`RegistryError::NotFound`]；槽位对目标层级不合法返回
    ///   [`RegistryError::Illegal`]，客户端状态保持不变。
    pub fn learn<L: Location>(
        &self,
        target: &Uid,
        slot: Tier,
        location: L,
    ) -> Result<(), RegistryError> {
        let mut client = self
            .inner
            .get_mut(target)
            .ok_or(RegistryError::NotFound { id: *target })?;
        client.set_location(slot, location)?;
        Ok(())
    }

    /// 目标客户端当前的地址快照。
    pub fn address_of(&self, target: &Uid) -> Option<Address> {
        self.inner.get(target).map(|client| client.address())
    }

    /// 已登记的全部身份，按身份排序。
    pub fn ids(&self) -> Vec<Uid> {
        let mut ids: Vec<Uid> = self.inner.iter().map(|entry| *entry.key()).collect();
        ids.sort_unstable();
        ids
    }

    /// 已登记的客户端数量。
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// 目录是否为空。
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

/// `DashMap` 读锁的类型别名。
pub type ClientRef<'a> = Ref<'a, Uid, Client>;
/// `DashMap` 写锁的类型别名。
pub type ClientRefMut<'a> = RefMut<'a, Uid, Client>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location::SpecificLocation;

    fn loc(id: u128) -> SpecificLocation {
        SpecificLocation::new(Uid::from_u128(id))
    }

    fn device(id: u128) -> Client {
        Client::new(Tier::Device, "edge", Vec::new(), loc(id))
    }

    #[test]
    fn register_rejects_duplicate_identity() {
        let registry = ClientRegistry::new();
        registry.register(device(3)).unwrap();
        assert_eq!(
            registry.register(device(3)),
            Err(RegistryError::AlreadyRegistered {
                id: Uid::from_u128(3)
            })
        );
        assert_eq!(registry.len(), 1);
        assert!(registry.replace(device(3)).is_some());
    }

    #[test]
    fn learn_updates_shared_client() {
        let registry = ClientRegistry::new();
        let shared = registry.clone();
        registry.register(device(3)).unwrap();

        shared.learn(&Uid::from_u128(3), Tier::Domain, loc(2)).unwrap();
        let address = registry.address_of(&Uid::from_u128(3)).unwrap();
        assert_eq!(address.domain, Some(loc(2)));
        assert_eq!(address.target_id(), Some(Uid::from_u128(3)));
    }

    #[test]
    fn learn_reports_missing_and_illegal_targets() {
        let registry = ClientRegistry::new();
        registry.register(device(3)).unwrap();

        assert_eq!(
            registry.learn(&Uid::from_u128(9), Tier::Domain, loc(2)),
            Err(RegistryError::NotFound {
                id: Uid::from_u128(9)
            })
        );
        let err = registry
            .learn(&Uid::from_u128(3), Tier::Vm, loc(4))
            .unwrap_err();
        assert!(matches!(err, RegistryError::Illegal(inner) if inner.slot() == Tier::Vm));
        assert!(registry.address_of(&Uid::from_u128(3)).unwrap().vm.is_none());
    }

    #[test]
    fn ids_are_sorted() {
        let registry = ClientRegistry::new();
        registry.register(device(7)).unwrap();
        registry.register(device(3)).unwrap();
        assert_eq!(registry.ids(), [Uid::from_u128(3), Uid::from_u128(7)]);
        assert!(registry.remove(&Uid::from_u128(3)).is_some());
        assert!(registry.get(&Uid::from_u128(3)).is_none());
    }
}
