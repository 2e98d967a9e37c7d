//! 学校考勤管理系统后端
//!
//! 基于 Actix Web 与 SeaORM 的考勤记录服务，支持 SQLite、PostgreSQL 和 MySQL。
//!
//! # 架构
//! - `config`: 配置管理
//! - `entity`: SeaORM 数据库实体
//! - `errors`: 统一错误处理
//! - `models`: 数据模型定义
//! - `routes`: API 路由层
//! - `runtime`: 运行时生命周期管理
//! - `services`: 业务逻辑层
//! - `storage`: 数据存储层（SeaORM）
//! - `transfer`: 旧版 SQLite 数据导入
//! - `utils`: 工具函数

pub mod config;
pub mod entity;
pub mod errors;
pub mod models;
pub mod routes;
pub mod runtime;
pub mod services;
pub mod storage;
pub mod transfer;
pub mod utils;
