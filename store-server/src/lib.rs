//! Store Server - 订单生命周期与库存预定服务
//!
//! # 架构概述
//!
//! 本服务负责电商后端中真正需要并发正确性的部分：
//!
//! - **订单状态机** (`orders/actions`): PENDING → PAID / CANCELLED / TIMEOUT
//! - **库存账本** (`orders/ledger`): 原子化的 reserve / release / commit
//! - **结算编排** (`orders/manager`): 购物车选择 → 订单 + N 个预定，全有或全无
//! - **支付对账** (`payment` + `orders/manager`): 异步回调恰好生效一次
//! - **过期清扫** (`orders/sweeper`): 周期性回收超时未付订单的预定
//!
//! # 模块结构
//!
//! ```text
//! store-server/src/
//! ├── core/          # 配置、状态、服务器、后台任务
//! ├── api/           # HTTP 路由和处理器
//! ├── db/            # 协作数据（商品目录、购物车）
//! ├── orders/        # 订单核心（存储、账本、动作、清扫）
//! ├── payment/       # 支付网关边界
//! └── utils/         # 日志等工具
//! ```

pub mod api;
pub mod core;
pub mod db;
pub mod orders;
pub mod payment;
pub mod utils;

// Re-export 公共类型
pub use crate::core::{Config, Server, ServerState};
pub use orders::{OrderManager, OrderStore};
pub use utils::{ApiResponse, AppError, AppResult, ErrorCode};

// Re-export logger functions
pub use utils::logger::{init_logger, init_logger_with_file};

/// 设置运行环境 (dotenv + 日志)
pub fn setup_environment() -> Result<(), Box<dyn std::error::Error>> {
    let _ = dotenv::dotenv();
    init_logger();
    Ok(())
}
