use crate::payment::PaymentConfig;

/// 服务器配置
///
/// # 环境变量
///
/// 所有配置项都可以通过环境变量覆盖：
///
/// | 环境变量 | 默认值 | 说明 |
/// |----------|--------|------|
/// | WORK_DIR | /var/lib/store | 工作目录 |
/// | HTTP_PORT | 3000 | HTTP 服务端口 |
/// | ORDER_EXPIRY_MINUTES | 30 | 待支付订单过期窗口（分钟）|
/// | SWEEP_INTERVAL_SECONDS | 60 | 过期清扫周期（秒）|
/// | FRONTEND_BASE_URL | http://localhost:5173 | 支付完成跳转的前端地址 |
/// | PAYMENT_APP_ID | dev-app | 支付网关应用 ID |
/// | PAYMENT_MERCHANT_SECRET | dev-secret | 支付签名密钥 |
/// | PAYMENT_GATEWAY_URL | https://pay.example.com/gateway | 网关支付页地址 |
/// | PAYMENT_NOTIFY_URL | http://localhost:3000/api/orders/notify | 异步通知地址 |
/// | PAYMENT_RETURN_URL | http://localhost:3000/api/orders/return | 同步跳转地址 |
///
/// # 示例
///
/// ```ignore
/// WORK_DIR=/data/store HTTP_PORT=8080 cargo run
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// 工作目录，存储数据库文件和日志
    pub work_dir: String,
    /// HTTP API 服务端口
    pub http_port: u16,
    /// 待支付订单过期窗口（分钟）
    pub order_expiry_minutes: u64,
    /// 过期清扫周期（秒）
    pub sweep_interval_seconds: u64,
    /// 前端地址（支付成功页跳转）
    pub frontend_base_url: String,
    /// 支付网关配置
    pub payment: PaymentConfig,
}

impl Config {
    /// 从环境变量加载配置
    ///
    /// 如果环境变量未设置，使用默认值
    pub fn from_env() -> Self {
        Self {
            work_dir: std::env::var("WORK_DIR").unwrap_or_else(|_| "/var/lib/store".into()),
            http_port: std::env::var("HTTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            order_expiry_minutes: std::env::var("ORDER_EXPIRY_MINUTES")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(30),
            sweep_interval_seconds: std::env::var("SWEEP_INTERVAL_SECONDS")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(60),
            frontend_base_url: std::env::var("FRONTEND_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:5173".into()),
            payment: PaymentConfig {
                app_id: std::env::var("PAYMENT_APP_ID").unwrap_or_else(|_| "dev-app".into()),
                merchant_secret: std::env::var("PAYMENT_MERCHANT_SECRET")
                    .unwrap_or_else(|_| "dev-secret".into()),
                gateway_url: std::env::var("PAYMENT_GATEWAY_URL")
                    .unwrap_or_else(|_| "https://pay.example.com/gateway".into()),
                notify_url: std::env::var("PAYMENT_NOTIFY_URL")
                    .unwrap_or_else(|_| "http://localhost:3000/api/orders/notify".into()),
                return_url: std::env::var("PAYMENT_RETURN_URL")
                    .unwrap_or_else(|_| "http://localhost:3000/api/orders/return".into()),
            },
        }
    }

    /// 数据库目录: work_dir/database
    pub fn database_dir(&self) -> std::path::PathBuf {
        std::path::Path::new(&self.work_dir).join("database")
    }

    /// 确保工作目录结构存在
    pub fn ensure_work_dir_structure(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(self.database_dir())?;
        std::fs::create_dir_all(std::path::Path::new(&self.work_dir).join("logs"))?;
        Ok(())
    }
}
