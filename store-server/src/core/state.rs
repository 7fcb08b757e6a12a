use std::sync::Arc;
use std::time::Duration;

use surrealdb::engine::local::Db;
use surrealdb::Surreal;

use crate::core::{BackgroundTasks, Config, TaskKind};
use crate::db::DbService;
use crate::orders::{ExpirySweeper, OrderManager, OrderStore};
use crate::payment::PaymentGateway;

/// 服务器状态 - 持有所有服务的共享引用
///
/// 使用 Arc 实现浅拷贝，克隆成本极低。
///
/// # 服务组件
///
/// | 字段 | 类型 | 说明 |
/// |------|------|------|
/// | config | Config | 配置项 (不可变) |
/// | db | Surreal<Db> | 协作数据（商品目录、购物车）|
/// | orders | Arc<OrderManager> | 订单核心（订单 + 库存账本）|
/// | payment | Arc<PaymentGateway> | 支付网关边界 |
#[derive(Clone)]
pub struct ServerState {
    /// 服务器配置
    pub config: Config,
    /// 协作数据存储 (SurrealDB)
    pub db: Surreal<Db>,
    /// 订单管理器
    pub orders: Arc<OrderManager>,
    /// 支付网关
    pub payment: Arc<PaymentGateway>,
}

impl ServerState {
    /// 初始化服务器状态
    ///
    /// 按顺序初始化：
    /// 1. 工作目录结构
    /// 2. 协作数据存储 (work_dir/database/store.db)
    /// 3. 订单存储 (work_dir/database/orders.redb)
    /// 4. 订单管理器与支付网关
    ///
    /// # Panics
    ///
    /// 任一存储初始化失败时 panic：没有存储就没有可运行的服务。
    pub async fn initialize(config: &Config) -> Self {
        config
            .ensure_work_dir_structure()
            .expect("Failed to create work directory structure");

        let db_dir = config.database_dir();

        let db_path = db_dir.join("store.db");
        let db_service = DbService::new(&db_path.to_string_lossy())
            .await
            .expect("Failed to initialize database");
        let db = db_service.db;

        let order_store =
            OrderStore::open(db_dir.join("orders.redb")).expect("Failed to open order store");

        let orders = Arc::new(OrderManager::new(order_store, db.clone()));
        let payment = Arc::new(PaymentGateway::new(config.payment.clone()));

        Self {
            config: config.clone(),
            db,
            orders,
            payment,
        }
    }

    /// 启动后台任务
    ///
    /// 必须在 `Server::run()` 中调用；返回的管理器负责 graceful shutdown。
    pub fn start_background_tasks(&self) -> BackgroundTasks {
        let mut tasks = BackgroundTasks::new();

        let sweeper = ExpirySweeper::new(
            self.orders.clone(),
            Duration::from_secs(self.config.sweep_interval_seconds),
            Duration::from_secs(self.config.order_expiry_minutes * 60),
            tasks.shutdown_token(),
        );
        tasks.spawn("expiry_sweeper", TaskKind::Periodic, sweeper.run());

        tasks
    }
}
