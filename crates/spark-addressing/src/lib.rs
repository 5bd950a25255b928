#![deny(unsafe_code)]

//! # spark-addressing
//!
//! ## 定位与职责（Why）
//! - 为 network ⊃ domain ⊃ device ⊃ vm 四层包含结构中的节点提供寻址模型：调用方持有的
//!   [`Client`] 必须精确知道目标节点自身的身份，并可记录已获知的祖先容器；
//! - 层级一致性只在一张静态策略表 [`SLOT_POLICY`] 中声明，所有读写访问器查表判定，
//!   违规写入以类型化的 [`IllegalLocationAssignment`] 报告。
//!
//! ## 架构嵌入（Where）
//! - `uid`/`location`/`route`：身份、位置与传输描述符等不透明原语；
//! - `tier`：层级枚举与槽位策略表；
//! - `client`/`specialization`：运行时层级客户端与类型级层级客户端；
//! - `address`：随出站消息传递的地址快照；
//! - `registry`/`manifest`：客户端目录与 TOML 清单。
//!
//! ## 边界（Trade-offs）
//! - 本 crate 不做网络 I/O、不解析路由、不生成身份，也不负责消息序列化；
//! - 日志只通过 `tracing` 门面输出事件，从不安装 Subscriber。

pub mod address;
pub mod client;
pub mod error;
pub mod location;
pub mod manifest;
pub mod registry;
pub mod route;
pub mod specialization;
pub mod tier;
pub mod uid;

pub use address::Address;
pub use client::{Client, ClientBuilder};
pub use error::{IllegalLocationAssignment, ManifestError, RegistryError, TierBuildError};
pub use location::{Location, SpecificLocation};
pub use manifest::{AncestorEntry, ClientEntry, ClientManifest};
pub use registry::{ClientRef, ClientRefMut, ClientRegistry};
pub use route::Route;
pub use specialization::{
    DeviceClient, DomainClient, NetworkClient, TierClient, TierMarker, VMClient, VmClient,
};
pub use tier::{SLOT_POLICY, SlotState, Tier, UnknownTier};
pub use uid::{Uid, UidParseError};
