use std::{env, path::PathBuf, process::ExitCode};

use spark_addressing::{ClientManifest, ClientRegistry};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// 诊断入口：加载客户端清单，输出每个客户端的标签、地址与路由。
///
/// # 教案式说明（Why）
/// - 在部署前核对清单中的祖先声明是否满足层级规则，违规时以非零状态退出；
/// - 日志级别默认 `info`，可通过 `RUST_LOG` 覆盖（例如 `RUST_LOG=spark_addressing=debug`）。
///
/// # 契约定义（What）
/// - 参数：唯一的位置参数为清单路径；
/// - 输出：每行一个客户端，格式为 `<Tier:name> address routes`。
fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let Some(path) = env::args_os().nth(1).map(PathBuf::from) else {
        eprintln!("usage: addressing_inspect <clients.toml>");
        return ExitCode::from(2);
    };

    let registry = match ClientManifest::load(&path).and_then(|m| ClientRegistry::from_manifest(&m))
    {
        Ok(registry) => registry,
        Err(err) => {
            error!(path = %path.display(), "{err}");
            return ExitCode::FAILURE;
        }
    };

    info!(path = %path.display(), clients = registry.len(), "manifest verified");
    for id in registry.ids() {
        if let Some(client) = registry.get(&id) {
            let routes: Vec<&str> = client.routes().iter().map(|route| route.as_str()).collect();
            println!("{} {} [{}]", *client, client.address(), routes.join(", "));
        }
    }
    ExitCode::SUCCESS
}
