//! 节点身份标识契约。
//!
//! # 设计动机（Why）
//! - 寻址核心只需要“可比较、可哈希、可打印”的身份令牌，身份的生成由外部身份服务负责；
//! - 以 128 位定长新类型承载，避免“字符串即 ID”带来的隐式耦合。
//!
//! # 集成方式（How）
//! - 外部生成器（UUID、雪花算法等）产出字节后调用 [`Uid::from_bytes`] 或 [`Uid::from_u128`]；
//! - 文本形式为 32 位小写十六进制；解析时同时接受带连字符的 8-4-4-4-12 UUID 写法。

use std::{fmt, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize, Serializer, de};
use thiserror::Error;

/// 节点的全局唯一身份。
///
/// # 契约定义（What）
/// - **不透明**：寻址核心从不解释其中的比特位，只做相等性比较、排序与格式化；
/// - **稳定**：`Copy` 语义，任何位置引用持有的身份在其生命周期内不会改变；
/// - **序列化**：serde 以文本形式读写，清单文件与诊断输出使用同一表示。
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Uid([u8; 16]);

impl Uid {
    /// 十六进制文本长度。
    pub const TEXT_LEN: usize = 32;

    /// 由外部生成器提供的原始字节构造身份。
    #[must_use]
    pub const fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }

    /// 以大端序解释 `u128`，便于测试与确定性夹具。
    #[must_use]
    pub const fn from_u128(value: u128) -> Self {
        Self(value.to_be_bytes())
    }

    /// 返回底层字节。
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }

    /// 以 `u128` 形式读取身份。
    #[must_use]
    pub const fn as_u128(&self) -> u128 {
        u128::from_be_bytes(self.0)
    }

    /// 解析文本形式的身份。
    ///
    /// - **输入**：32 位十六进制，或带连字符的 UUID 写法，大小写不敏感；
    /// - **错误**：长度、连字符位置或字符非法时返回 [`UidParseError`]，并保留原始输入便于排障。
    pub fn parse(input: &str) -> Result<Self, UidParseError> {
        let compact = strip_uuid_hyphens(input)?;
        if compact.len() != Self::TEXT_LEN {
            return Err(UidParseError::new(input, "expected 32 hexadecimal digits"));
        }

        let mut bytes = [0u8; 16];
        hex::decode_to_slice(&compact, &mut bytes)
            .map_err(|err| UidParseError::new(input, err.to_string()))?;
        Ok(Self(bytes))
    }
}

/// 去掉 UUID 写法中的连字符；仅允许出现在 8-4-4-4-12 的分组边界上。
fn strip_uuid_hyphens(input: &str) -> Result<String, UidParseError> {
    if !input.contains('-') {
        return Ok(input.to_owned());
    }

    let groups: Vec<&str> = input.split('-').collect();
    let lengths: Vec<usize> = groups.iter().map(|group| group.len()).collect();
    if lengths != [8, 4, 4, 4, 12] {
        return Err(UidParseError::new(
            input,
            "hyphenated form must follow the 8-4-4-4-12 grouping",
        ));
    }
    Ok(groups.concat())
}

impl fmt::Display for Uid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl fmt::Debug for Uid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Uid({self})")
    }
}

impl FromStr for Uid {
    type Err = UidParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<[u8; 16]> for Uid {
    fn from(bytes: [u8; 16]) -> Self {
        Self::from_bytes(bytes)
    }
}

impl Serialize for Uid {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Uid {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Uid::parse(&text).map_err(de::Error::custom)
    }
}

/// 身份文本解析失败。
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("invalid uid `{input}`: {reason}")]
pub struct UidParseError {
    input: String,
    reason: String,
}

impl UidParseError {
    fn new(input: &str, reason: impl Into<String>) -> Self {
        Self {
            input: input.to_owned(),
            reason: reason.into(),
        }
    }

    /// 触发错误的原始输入。
    pub fn input(&self) -> &str {
        &self.input
    }
}
