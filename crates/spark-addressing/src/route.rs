use std::{fmt, sync::Arc};

use serde::{Deserialize, Serialize};

/// 不透明的传输描述符。
///
/// 寻址核心只负责按偏好顺序保存与转交，从不解析其内容；具体含义由下层传输实现约定
/// （例如 `tcp://10.0.0.3:7000`、`loopback` 或任意编码后的句柄）。
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Route(Arc<str>);

impl Route {
    /// 包装传输层提供的描述符。
    pub fn new(descriptor: impl Into<Arc<str>>) -> Self {
        Self(descriptor.into())
    }

    /// 原样返回描述符。
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Route {
    fn from(descriptor: &str) -> Self {
        Self::new(descriptor)
    }
}

impl From<String> for Route {
    fn from(descriptor: String) -> Self {
        Self::new(descriptor)
    }
}
