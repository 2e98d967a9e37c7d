//! 统一错误处理模块
//!
//! 使用宏自动生成错误类型，支持错误代码和类型名称。
//! 存储层把数据库错误翻译成这里的分类，由路由层决定返回给用户的内容。

use std::fmt;

use sea_orm::{DbErr, SqlErr};

/// 定义错误类型的宏
///
/// 自动生成：
/// - enum 定义
/// - code() 方法 - 返回错误代码
/// - error_type() 方法 - 返回错误类型名称
/// - message() 方法 - 返回错误详情
/// - 便捷构造函数
macro_rules! define_attendance_errors {
    ($(
        $variant:ident($code:literal, $type_name:literal)
    ),* $(,)?) => {
        #[derive(Debug, Clone, PartialEq, Eq)]
        pub enum AttendanceError {
            $($variant(String),)*
        }

        impl AttendanceError {
            /// 获取错误代码
            pub fn code(&self) -> &'static str {
                match self {
                    $(AttendanceError::$variant(_) => $code,)*
                }
            }

            /// 获取错误类型名称
            pub fn error_type(&self) -> &'static str {
                match self {
                    $(AttendanceError::$variant(_) => $type_name,)*
                }
            }

            /// 获取错误详情
            pub fn message(&self) -> &str {
                match self {
                    $(AttendanceError::$variant(msg) => msg,)*
                }
            }

            /// 保留错误类别，在详情前加上操作说明
            pub fn with_context(self, context: &str) -> Self {
                match self {
                    $(AttendanceError::$variant(msg) => {
                        AttendanceError::$variant(format!("{context}: {msg}"))
                    })*
                }
            }
        }

        // 生成便捷构造函数
        paste::paste! {
            impl AttendanceError {
                $(
                    pub fn [<$variant:snake>]<T: Into<String>>(msg: T) -> Self {
                        AttendanceError::$variant(msg.into())
                    }
                )*
            }
        }
    };
}

define_attendance_errors! {
    Configuration("E001", "Configuration Error"),
    Connection("E002", "Connection Error"),
    Conflict("E003", "Conflict Error"),
    NotFound("E004", "Resource Not Found"),
    Timeout("E005", "Timeout Error"),
    Validation("E006", "Validation Error"),
    DatabaseOperation("E007", "Database Operation Error"),
    Serialization("E008", "Serialization Error"),
    DateParse("E009", "Date Parse Error"),
    FileOperation("E010", "File Operation Error"),
}

impl AttendanceError {
    /// 只读查询遇到连接类错误时可以重试，写操作从不自动重试
    pub fn is_transient(&self) -> bool {
        matches!(self, AttendanceError::Connection(_))
    }

    /// 格式化为彩色输出（用于开发环境）
    #[cfg(debug_assertions)]
    pub fn format_colored(&self) -> String {
        format!(
            "\x1b[1;31m[ERROR]\x1b[0m \x1b[33m{}\x1b[0m \x1b[31m{}\x1b[0m\n  {}",
            self.code(),
            self.error_type(),
            self.message()
        )
    }

    /// 格式化为简洁输出
    pub fn format_simple(&self) -> String {
        format!("{}: {}", self.error_type(), self.message())
    }
}

impl fmt::Display for AttendanceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_simple())
    }
}

impl std::error::Error for AttendanceError {}

// 数据库错误按类别翻译
impl From<DbErr> for AttendanceError {
    fn from(err: DbErr) -> Self {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(msg)) => {
                return AttendanceError::Conflict(format!("唯一约束冲突: {msg}"));
            }
            Some(SqlErr::ForeignKeyConstraintViolation(msg)) => {
                return AttendanceError::Conflict(format!("外键约束冲突: {msg}"));
            }
            _ => {}
        }

        match err {
            DbErr::ConnectionAcquire(e) => {
                AttendanceError::Connection(format!("无法获取数据库连接: {e}"))
            }
            DbErr::Conn(e) => AttendanceError::Connection(format!("数据库连接失败: {e}")),
            DbErr::RecordNotFound(msg) => AttendanceError::NotFound(msg),
            other => AttendanceError::DatabaseOperation(other.to_string()),
        }
    }
}

impl From<config::ConfigError> for AttendanceError {
    fn from(err: config::ConfigError) -> Self {
        AttendanceError::Configuration(err.to_string())
    }
}

impl From<std::io::Error> for AttendanceError {
    fn from(err: std::io::Error) -> Self {
        AttendanceError::FileOperation(err.to_string())
    }
}

impl From<serde_json::Error> for AttendanceError {
    fn from(err: serde_json::Error) -> Self {
        AttendanceError::Serialization(err.to_string())
    }
}

impl From<chrono::ParseError> for AttendanceError {
    fn from(err: chrono::ParseError) -> Self {
        AttendanceError::DateParse(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AttendanceError>;

/// 用于 `map_err`：按类别翻译数据库错误并附上操作说明
pub fn db_error(context: &'static str) -> impl FnOnce(DbErr) -> AttendanceError {
    move |err| AttendanceError::from(err).with_context(context)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(AttendanceError::configuration("test").code(), "E001");
        assert_eq!(AttendanceError::conflict("test").code(), "E003");
        assert_eq!(AttendanceError::not_found("test").code(), "E004");
        assert_eq!(AttendanceError::timeout("test").code(), "E005");
    }

    #[test]
    fn test_error_types() {
        assert_eq!(
            AttendanceError::connection("test").error_type(),
            "Connection Error"
        );
        assert_eq!(
            AttendanceError::validation("test").error_type(),
            "Validation Error"
        );
    }

    #[test]
    fn test_format_simple() {
        let err = AttendanceError::not_found("attendance 7");
        let formatted = err.format_simple();
        assert!(formatted.contains("Resource Not Found"));
        assert!(formatted.contains("attendance 7"));
    }

    #[test]
    fn test_only_connection_errors_are_transient() {
        assert!(AttendanceError::connection("pool closed").is_transient());
        assert!(!AttendanceError::timeout("slow").is_transient());
        assert!(!AttendanceError::conflict("dup").is_transient());
    }

    #[test]
    fn test_db_err_translation() {
        let err: AttendanceError = DbErr::RecordNotFound("attendance 9".into()).into();
        assert_eq!(err, AttendanceError::not_found("attendance 9"));

        let err: AttendanceError = DbErr::Custom("boom".into()).into();
        assert!(matches!(err, AttendanceError::DatabaseOperation(_)));
    }

    #[test]
    fn test_db_error_keeps_category() {
        let err = db_error("更新考勤备注失败")(DbErr::RecordNotFound("attendance 9".into()));
        assert_eq!(
            err,
            AttendanceError::not_found("更新考勤备注失败: attendance 9")
        );
    }
}
