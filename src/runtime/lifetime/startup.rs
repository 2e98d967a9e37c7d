use crate::config::AppConfig;
use crate::errors::{AttendanceError, Result};
use crate::models::users::entities::{User, UserRole};
use crate::models::users::requests::CreateUserRequest;
use crate::storage::Storage;
use crate::utils::password::{generate_random_password, hash_password};
use crate::utils::validate::{validate_email, validate_password, validate_username};
use std::sync::Arc;
use tracing::{debug, info, warn};

pub struct StartupContext {
    pub storage: Arc<dyn Storage>,
}

/// 默认管理员账号参数
#[derive(Debug, Clone)]
pub struct AdminSeed {
    pub username: String,
    pub email: Option<String>,
}

impl Default for AdminSeed {
    fn default() -> Self {
        Self {
            username: "admin".to_string(),
            email: None,
        }
    }
}

/// 安装 rustls 加密后端，重复安装时忽略
pub fn install_crypto_provider() {
    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        debug!("rustls crypto provider already installed");
    }
}

/// 初始化默认管理员账号
/// 如果数据库中没有任何用户，则创建一个 admin 账号，返回新建的用户
pub async fn seed_admin(
    storage: &Arc<dyn Storage>,
    config: &AppConfig,
    seed: &AdminSeed,
) -> Result<Option<User>> {
    // 检查是否已有用户
    let count = storage.count_users().await?;
    if count > 0 {
        debug!(
            "Database already has {} user(s), skipping admin seed",
            count
        );
        return Ok(None);
    }
    info!("No users found in database, creating default admin account...");

    validate_username(&seed.username).map_err(AttendanceError::validation)?;
    if let Some(email) = &seed.email {
        validate_email(email).map_err(AttendanceError::validation)?;
    }

    // 获取密码：优先从环境变量，否则生成随机密码
    let password = match std::env::var("ADMIN_PASSWORD") {
        Ok(pwd) => {
            let check = validate_password(&pwd);
            if !check.is_valid {
                warn!("ADMIN_PASSWORD is weak: {}", check.error_message());
            }
            pwd
        }
        Err(_) => {
            let pwd = generate_random_password(16);
            warn!("==========================================================");
            warn!("  ADMIN PASSWORD NOT SET - USING GENERATED PASSWORD");
            warn!("  Generated admin password: {}", pwd);
            warn!("  Please save this password or set ADMIN_PASSWORD env var");
            warn!("==========================================================");
            pwd
        }
    };

    let password_hash = hash_password(&password, &config.argon2)?;

    let admin_request = CreateUserRequest {
        username: seed.username.clone(),
        email: seed.email.clone(),
        password: password_hash,
        role: UserRole::Admin,
        national_id: None,
    };

    let user = storage.create_user(admin_request).await?;
    info!(
        "Default admin account created successfully (ID: {}, username: {})",
        user.id, user.username
    );
    Ok(Some(user))
}

/// 准备服务器启动的上下文
/// 包括存储连接、结构初始化和默认管理员
pub async fn prepare_server_startup(config: &AppConfig) -> Result<StartupContext> {
    install_crypto_provider();

    let storage = crate::storage::create_storage(&config.database).await?;
    warn!("Storage backend initialized and migrations completed");

    // 初始化默认管理员账号（如果需要），失败不阻止启动
    if let Err(e) = seed_admin(&storage, config, &AdminSeed::default()).await {
        warn!("Failed to seed admin account: {}", e);
    }

    Ok(StartupContext { storage })
}
