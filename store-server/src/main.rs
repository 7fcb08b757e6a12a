use store_server::{setup_environment, Config, Server};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. 设置环境 (dotenv, 日志)
    setup_environment()?;

    tracing::info!("Store server starting...");

    // 2. 加载配置
    let config = Config::from_env();

    // 3. 启动 HTTP 服务器 (Server::run 会自动启动后台任务)
    let server = Server::new(config);

    if let Err(e) = server.run().await {
        tracing::error!("Server error: {}", e);
        return Err(e.into());
    }

    Ok(())
}
