//! 客户端清单：以 TOML 声明节点本地已知的客户端。
//!
//! # 设计动机（Why）
//! - 部署时已知的目标节点及其祖先通常来自配置而不是运行期发现，清单让这部分知识可审阅、可版本化；
//! - 清单中的祖先与运行期写入走同一个 [`ClientBuilder`](crate::ClientBuilder)，层级规则不会被配置绕过。
//!
//! # 文件格式（What）
//! ```toml
//! [[client]]
//! name = "alice"
//! tier = "device"
//! id = "00000000000000000000000000000003"
//! routes = ["tcp://10.0.0.3:7000"]
//!
//! [client.domain]
//! id = "00000000000000000000000000000002"
//! label = "hospital"
//! ```
//! - `tier` 取值 `network`/`domain`/`device`/`vm`；
//! - `label` 为位置的可选标签，自身位置与祖先子表使用同一个键；
//! - `network`/`domain`/`device`/`vm` 子表为已知祖先，只接受 `id` 与 `label`；
//! - `routes` 按偏好顺序排列，原样交给客户端；
//! - 任何层级出现未知键（例如把 `[[client]]` 误写为 `[[clients]]`）都按解析错误拒绝，
//!   不会静默得到一个缺项的清单。

use std::{collections::HashSet, fs, path::Path};

use serde::{Deserialize, Serialize};

use crate::{
    client::Client,
    error::ManifestError,
    location::SpecificLocation,
    route::Route,
    tier::Tier,
    uid::Uid,
};

/// 清单根结构。
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClientManifest {
    #[serde(default, rename = "client")]
    pub clients: Vec<ClientEntry>,
}

/// 清单中的单个客户端声明。
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClientEntry {
    pub name: String,
    pub tier: Tier,
    pub id: Uid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default)]
    pub routes: Vec<Route>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network: Option<AncestorEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<AncestorEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device: Option<AncestorEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vm: Option<AncestorEntry>,
}

/// 清单中声明的已知祖先。
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AncestorEntry {
    pub id: Uid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl AncestorEntry {
    /// 转换为已解析的位置。
    pub fn location(&self) -> SpecificLocation {
        labelled_location(self.id, self.label.as_deref())
    }
}

fn labelled_location(id: Uid, label: Option<&str>) -> SpecificLocation {
    match label {
        Some(label) => SpecificLocation::named(id, label),
        None => SpecificLocation::new(id),
    }
}

impl ClientManifest {
    /// 解析 TOML 文本。
    pub fn from_toml_str(text: &str) -> Result<Self, ManifestError> {
        Ok(toml::from_str(text)?)
    }

    /// 读取并解析清单文件。
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ManifestError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ManifestError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// 按声明顺序装配全部客户端。
    ///
    /// - **错误**：身份重复返回 [`ManifestError::DuplicateClient`]；祖先违反层级规则返回
    ///   [`ManifestError::Illegal`]，并点名出错的客户端。
    pub fn build(&self) -> Result<Vec<Client>, ManifestError> {
        let mut seen = HashSet::with_capacity(self.clients.len());
        self.clients
            .iter()
            .map(|entry| {
                if !seen.insert(entry.id) {
                    return Err(ManifestError::DuplicateClient { id: entry.id });
                }
                entry.build()
            })
            .collect()
    }
}

impl ClientEntry {
    /// 自身位置：清单中的 `id` 与可选 `label`。
    pub fn own_location(&self) -> SpecificLocation {
        labelled_location(self.id, self.label.as_deref())
    }

    /// 装配单个客户端，祖先逐一经过层级校验。
    pub fn build(&self) -> Result<Client, ManifestError> {
        let mut builder = Client::builder(self.tier, self.name.as_str(), self.own_location())
            .routes(self.routes.iter().cloned());
        for (slot, location) in self.ancestors() {
            builder = builder.ancestor(slot, location);
        }
        builder.build().map_err(|source| ManifestError::Illegal {
            client: self.name.clone(),
            source,
        })
    }

    fn ancestors(&self) -> impl Iterator<Item = (Tier, SpecificLocation)> {
        [
            (Tier::Network, self.network.as_ref()),
            (Tier::Domain, self.domain.as_ref()),
            (Tier::Device, self.device.as_ref()),
            (Tier::Vm, self.vm.as_ref()),
        ]
        .into_iter()
        .filter_map(|(slot, entry)| entry.map(|entry| (slot, entry.location())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOSPITAL: &str = r#"
[[client]]
name = "alice"
tier = "device"
id = "00000000000000000000000000000003"
label = "bedside-monitor"
routes = ["tcp://10.0.0.3:7000", "loopback"]

[client.domain]
id = "00000000000000000000000000000002"
label = "hospital"

[[client]]
name = "grid"
tier = "network"
id = "00000000000000000000000000000001"
"#;

    #[test]
    fn builds_clients_in_declaration_order() {
        let manifest = ClientManifest::from_toml_str(HOSPITAL).unwrap();
        let clients = manifest.build().unwrap();
        assert_eq!(clients.len(), 2);

        let alice = &clients[0];
        assert_eq!(alice.to_string(), "<Device:alice>");
        assert_eq!(alice.own_location().name(), Some("bedside-monitor"));
        assert_eq!(alice.domain().and_then(SpecificLocation::name), Some("hospital"));
        assert_eq!(alice.routes()[0].as_str(), "tcp://10.0.0.3:7000");
        assert!(alice.network().is_none());

        assert_eq!(clients[1].tier(), Tier::Network);
    }

    #[test]
    fn illegal_ancestor_names_the_client() {
        let text = r#"
[[client]]
name = "grid"
tier = "network"
id = "00000000000000000000000000000001"

[client.domain]
id = "00000000000000000000000000000002"
"#;
        let err = ClientManifest::from_toml_str(text)
            .unwrap()
            .build()
            .unwrap_err();
        match err {
            ManifestError::Illegal { client, source } => {
                assert_eq!(client, "grid");
                assert_eq!(source.slot(), Tier::Domain);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn duplicate_identity_is_rejected() {
        let text = r#"
[[client]]
name = "a"
tier = "vm"
id = "00000000000000000000000000000004"

[[client]]
name = "b"
tier = "vm"
id = "00000000000000000000000000000004"
"#;
        let err = ClientManifest::from_toml_str(text)
            .unwrap()
            .build()
            .unwrap_err();
        assert!(matches!(err, ManifestError::DuplicateClient { .. }));
    }

    #[test]
    fn malformed_uid_is_a_parse_error() {
        let text = r#"
[[client]]
name = "a"
tier = "vm"
id = "not-a-uid"
"#;
        assert!(matches!(
            ClientManifest::from_toml_str(text),
            Err(ManifestError::Parse(_))
        ));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = ClientManifest::load("/nonexistent/spark-addressing/clients.toml").unwrap_err();
        assert!(matches!(err, ManifestError::Io { .. }));
    }

    #[test]
    fn misspelled_client_array_is_rejected() {
        let text = r#"
[[clients]]
name = "grid"
tier = "network"
id = "00000000000000000000000000000001"
"#;
        assert!(matches!(
            ClientManifest::from_toml_str(text),
            Err(ManifestError::Parse(_))
        ));
    }

    #[test]
    fn ancestor_table_rejects_unknown_keys() {
        let text = r#"
[[client]]
name = "alice"
tier = "device"
id = "00000000000000000000000000000003"

[client.domain]
id = "00000000000000000000000000000002"
name = "hospital"
"#;
        assert!(matches!(
            ClientManifest::from_toml_str(text),
            Err(ManifestError::Parse(_))
        ));
    }

    #[test]
    fn ancestor_label_uses_the_same_key_as_own_label() {
        let text = r#"
[[client]]
name = "alice"
tier = "device"
id = "00000000000000000000000000000003"
label = "bedside-monitor"

[client.domain]
id = "00000000000000000000000000000002"
label = "hospital"
"#;
        let clients = ClientManifest::from_toml_str(text).unwrap().build().unwrap();
        assert_eq!(clients[0].own_location().name(), Some("bedside-monitor"));
        assert_eq!(clients[0].domain().and_then(SpecificLocation::name), Some("hospital"));
    }
}
