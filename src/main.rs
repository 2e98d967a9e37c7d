use std::process::ExitCode;
use std::sync::Arc;

use actix_cors::Cors;
use actix_web::middleware::{Compress, DefaultHeaders};
use actix_web::{App, HttpServer, web};
use clap::{Parser, Subcommand};
use dotenv::dotenv;
use human_panic::setup_panic;
use tracing::{debug, error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;

// 从 lib.rs 导入模块
use rust_attendance_system::config::AppConfig;
use rust_attendance_system::errors::{AttendanceError, Result};
use rust_attendance_system::routes;
use rust_attendance_system::runtime::lifetime;
use rust_attendance_system::runtime::lifetime::startup::{AdminSeed, install_crypto_provider};
use rust_attendance_system::storage::{self, Storage, sea_orm_storage::SeaOrmStorage};
use rust_attendance_system::transfer;
use rust_attendance_system::utils::{json_error_handler, path_error_handler, query_error_handler};

/// 学校考勤管理系统
#[derive(Parser, Debug)]
#[command(name = "rust-attendance-system")]
#[command(about = "School attendance tracking backend", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// 初始化数据库结构并启动 HTTP 服务（默认）
    Serve,
    /// 创建数据表和索引并打印索引检查结果，可重复执行
    Init,
    /// 从旧版 SQLite 数据库导入数据，可重复执行
    Transfer {
        /// 旧数据库文件路径或 sqlite: URL
        #[arg(short, long, env = "LEGACY_DATABASE")]
        source: String,
    },
    /// 数据库中没有任何用户时创建管理员账号
    SeedAdmin {
        /// 管理员用户名
        #[arg(long, default_value = "admin")]
        username: String,
        /// 管理员邮箱
        #[arg(long)]
        email: Option<String>,
    },
}

/// 初始化日志：开发环境输出带文件行号的文本，其他环境输出 JSON
fn init_tracing(config: &AppConfig) -> WorkerGuard {
    let (non_blocking_writer, guard) = tracing_appender::non_blocking(std::io::stdout());
    let filter = tracing_subscriber::EnvFilter::new(&config.app.log_level);
    let tracing_format = tracing_subscriber::fmt::format()
        .with_level(true)
        .with_ansi(config.is_development());

    let tracing_builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(non_blocking_writer)
        .event_format(tracing_format);

    if config.is_development() {
        tracing_builder
            .with_file(true)
            .with_line_number(true)
            .init();
    } else {
        tracing_builder.json().init();
    }
    guard
}

#[actix_web::main]
async fn main() -> ExitCode {
    dotenv().ok();
    setup_panic!();

    let cli = Cli::parse();

    // 配置不完整时在连接数据库之前退出
    let config = match AppConfig::load() {
        Ok(config) => config,
        Err(e) => {
            #[cfg(debug_assertions)]
            eprintln!("{}", e.format_colored());
            #[cfg(not(debug_assertions))]
            eprintln!("{}", e.format_simple());
            return ExitCode::FAILURE;
        }
    };

    let _guard = init_tracing(&config);
    install_crypto_provider();

    warn!(
        "Starting {} v{} ({})",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION"),
        config.app.system_name
    );

    let outcome = match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config).await,
        Command::Init => init(&config).await,
        Command::Transfer { source } => run_transfer(&config, &source).await,
        Command::SeedAdmin { username, email } => {
            seed_admin(&config, AdminSeed { username, email }).await
        }
    };

    match outcome {
        Ok(code) => code,
        Err(e) => {
            error!("{}", e.format_simple());
            ExitCode::FAILURE
        }
    }
}

async fn init(config: &AppConfig) -> Result<ExitCode> {
    let storage = storage::create_storage(&config.database).await?;
    let report = storage.verify_schema().await?;

    for index in &report.indexes {
        println!(
            "{:<32} {:<18} {}",
            index.name,
            index.table,
            if index.present { "ok" } else { "MISSING" }
        );
    }
    println!(
        "{:<32} {:<18} {}",
        migration::ATTENDANCE_DEDUP_INDEX,
        "attendance",
        if report.dedup_index_present {
            "ok"
        } else {
            "MISSING"
        }
    );

    if report.is_complete() {
        info!("Schema initialized, all indexes present");
        Ok(ExitCode::SUCCESS)
    } else {
        error!("Schema incomplete, {} index(es) missing", report.missing().len());
        Ok(ExitCode::FAILURE)
    }
}

async fn run_transfer(config: &AppConfig, source: &str) -> Result<ExitCode> {
    let target = SeaOrmStorage::connect(&config.database).await?;
    let report = transfer::run(source, &target).await?;

    println!("{report}");
    Ok(if report.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

async fn seed_admin(config: &AppConfig, seed: AdminSeed) -> Result<ExitCode> {
    let storage = storage::create_storage(&config.database).await?;

    match lifetime::startup::seed_admin(&storage, config, &seed).await? {
        Some(user) => println!("created admin '{}' (id {})", user.username, user.id),
        None => println!("store already has users, nothing to do"),
    }
    Ok(ExitCode::SUCCESS)
}

fn build_cors(config: &AppConfig) -> Cors {
    let cors = if config.cors.allowed_origins.is_empty() {
        Cors::default().allow_any_origin()
    } else {
        config
            .cors
            .allowed_origins
            .iter()
            .fold(Cors::default(), |cors, origin| cors.allowed_origin(origin))
    };
    cors.allow_any_method()
        .allow_any_header()
        .max_age(config.cors.max_age)
}

async fn serve(config: AppConfig) -> Result<ExitCode> {
    let started = chrono::Utc::now();

    let startup = lifetime::startup::prepare_server_startup(&config).await?;
    let storage: Arc<dyn Storage> = startup.storage;

    debug!(
        "Pre-startup processing completed in {} ms",
        chrono::Utc::now()
            .signed_duration_since(started)
            .num_milliseconds()
    );

    warn!("Using {} CPU cores for the server", config.server.workers);

    let bind_address = config.server_bind_address();
    let workers = config.server.workers;
    let keep_alive = config.server.timeouts.keep_alive;
    let client_request = config.server.timeouts.client_request;
    let client_disconnect = config.server.timeouts.client_disconnect;

    let server = HttpServer::new(move || {
        App::new()
            .wrap(build_cors(&config))
            .wrap(Compress::default())
            .wrap(
                DefaultHeaders::new()
                    .add(("Connection", "keep-alive"))
                    .add((
                        "Keep-Alive",
                        format!("timeout={}, max=1000", config.server.timeouts.keep_alive),
                    ))
                    .add(("Cache-Control", "no-cache, no-store, must-revalidate")),
            )
            .app_data(web::QueryConfig::default().error_handler(query_error_handler))
            .app_data(web::JsonConfig::default().error_handler(json_error_handler))
            .app_data(web::PathConfig::default().error_handler(path_error_handler))
            .app_data(web::Data::new(storage.clone()))
            .app_data(web::PayloadConfig::new(
                config.server.limits.max_payload_size,
            ))
            .configure(routes::configure_attendance_routes)
            .configure(routes::configure_system_routes)
    })
    .keep_alive(std::time::Duration::from_secs(keep_alive))
    .client_request_timeout(std::time::Duration::from_millis(client_request))
    .client_disconnect_timeout(std::time::Duration::from_millis(client_disconnect))
    .workers(workers);

    warn!("Starting server at http://{}", bind_address);
    let server = server
        .bind(&bind_address)
        .map_err(|e| AttendanceError::configuration(format!("无法绑定 {bind_address}: {e}")))?
        .run();

    tokio::select! {
        res = server => {
            res.map_err(|e| AttendanceError::connection(format!("HTTP 服务异常退出: {e}")))?;
        }
        _ = lifetime::shutdown::listen_for_shutdown() => {
            warn!("Graceful shutdown: all tasks completed");
        }
    }

    Ok(ExitCode::SUCCESS)
}
