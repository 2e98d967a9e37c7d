use config::{Config, Environment, File};

use super::AppConfig;
use crate::errors::{AttendanceError, Result};

impl AppConfig {
    /// 加载配置
    ///
    /// 数据库 URL 缺失或无法识别时直接返回配置错误，启动流程应立即退出。
    pub fn load() -> Result<Self> {
        let mut builder = Config::builder()
            // 首先加载默认配置文件
            .add_source(File::with_name("config").required(false))
            // 然后根据环境加载特定配置文件
            .add_source(
                File::with_name(&format!(
                    "config.{}",
                    std::env::var("APP_ENV").unwrap_or_else(|_| "development".into())
                ))
                .required(false),
            )
            // 最后加载环境变量覆盖
            .add_source(
                Environment::with_prefix("ATTENDANCE")
                    .separator("__")
                    .try_parsing(true),
            );

        // 支持从环境变量加载
        builder = builder
            .set_override_option("app.environment", std::env::var("APP_ENV").ok())?
            .set_override_option("app.log_level", std::env::var("RUST_LOG").ok())?
            .set_override_option("server.host", std::env::var("SERVER_HOST").ok())?
            .set_override_option("server.port", std::env::var("SERVER_PORT").ok())?
            .set_override_option("server.workers", std::env::var("CPU_COUNT").ok())?
            .set_override_option(
                "database.url",
                std::env::var("ATTENDANCE_DATABASE_URL")
                    .or_else(|_| std::env::var("DATABASE_URL"))
                    .ok(),
            )?;

        let config = builder.build()?;
        let mut app_config: AppConfig = config.try_deserialize()?;

        // 处理工作线程数
        if app_config.server.workers == 0 {
            app_config.server.workers = num_cpus::get().min(app_config.server.max_workers);
        }

        app_config.validate()?;
        Ok(app_config)
    }

    /// 校验启动必需的配置项
    pub fn validate(&self) -> Result<()> {
        if self.database.url.trim().is_empty() {
            return Err(AttendanceError::configuration(
                "database.url is not set (use ATTENDANCE_DATABASE_URL or DATABASE_URL)",
            ));
        }
        crate::storage::sea_orm_storage::SeaOrmStorage::build_database_url(&self.database.url)?;

        if self.database.pool_size == 0 {
            return Err(AttendanceError::configuration(
                "database.pool_size must be at least 1",
            ));
        }
        Ok(())
    }

    /// 检查是否为生产环境
    pub fn is_production(&self) -> bool {
        self.app.environment == "production"
    }

    /// 检查是否为开发环境
    pub fn is_development(&self) -> bool {
        self.app.environment == "development"
    }

    /// 获取服务器绑定地址
    pub fn server_bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with_url(url: &str) -> AppConfig {
        let mut config = AppConfig::default();
        config.database.url = url.to_string();
        config
    }

    #[test]
    fn test_missing_database_url_is_fatal() {
        let err = config_with_url("  ").validate().unwrap_err();
        assert!(matches!(err, AttendanceError::Configuration(_)));
    }

    #[test]
    fn test_unknown_scheme_is_rejected() {
        let err = config_with_url("oracle://db/school").validate().unwrap_err();
        assert!(matches!(err, AttendanceError::Configuration(_)));
    }

    #[test]
    fn test_server_url_without_host_or_database_is_rejected() {
        for url in ["postgres://", "mysql://localhost"] {
            let err = config_with_url(url).validate().unwrap_err();
            assert!(matches!(err, AttendanceError::Configuration(_)), "{url}");
        }
    }

    #[test]
    fn test_valid_urls_pass() {
        assert!(
            config_with_url("postgres://att:pw@localhost:5432/attendance")
                .validate()
                .is_ok()
        );
        assert!(config_with_url("app.db").validate().is_ok());
    }

    #[test]
    fn test_zero_pool_size_is_rejected() {
        let mut config = config_with_url("sqlite::memory:");
        config.database.pool_size = 0;
        assert!(config.validate().is_err());
    }
}
