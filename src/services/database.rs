use crate::config::Config;
use crate::error::Result;
use serde::Serialize;
use surrealdb::engine::any::{connect, Any};
use surrealdb::opt::auth::Root;
use surrealdb::{Response, Surreal};
use tracing::{debug, error, info};

/// 数据库服务
///
/// Record ids are application-generated uuid strings carried in an `id` field
/// on every row, so reads always project `meta::id(id) AS id` to get the raw
/// string back instead of a record pointer.
#[derive(Clone)]
pub struct Database {
    client: Surreal<Any>,
    pub config: Config,
}

impl Database {
    /// 创建新的数据库实例
    pub async fn new(config: &Config) -> Result<Self> {
        info!("Initializing database connection to {}", config.database_url);

        let client = connect(&config.database_url).await?;

        // 内存引擎无需登录
        if !config.database_username.is_empty() && !config.database_url.starts_with("mem") {
            client
                .signin(Root {
                    username: &config.database_username,
                    password: &config.database_password,
                })
                .await?;
        }

        client
            .use_ns(&config.database_namespace)
            .use_db(&config.database_name)
            .await?;

        Ok(Self {
            client,
            config: config.clone(),
        })
    }

    /// 验证数据库连接
    pub async fn verify_connection(&self) -> Result<()> {
        match self.client.query("INFO FOR DB").await {
            Ok(_) => {
                info!("Database connection verified successfully");
                Ok(())
            }
            Err(e) => {
                error!("Failed to verify database connection: {}", e);
                Err(e.into())
            }
        }
    }

    /// 执行原始SQL查询
    pub async fn query(&self, sql: &str) -> Result<Response> {
        let response = self.client.query(sql).await?.check()?;
        Ok(response)
    }

    /// 执行带参数的查询
    pub async fn query_with_params<P>(&self, sql: &str, params: P) -> Result<Response>
    where
        P: Serialize,
    {
        debug!("Executing query: {}", sql);
        let response = self.client.query(sql).bind(params).await?.check()?;
        Ok(response)
    }

    /// 创建记录。`data` 里的 `id` 字段会成为记录ID，调用方负责保证唯一
    pub async fn create<T>(&self, table: &str, data: T) -> Result<T>
    where
        T: Serialize + Send + Sync,
    {
        self.client
            .query("CREATE type::table($table) CONTENT $data RETURN NONE")
            .bind(("table", table))
            .bind(("data", &data))
            .await?
            .check()?;
        Ok(data)
    }
}
