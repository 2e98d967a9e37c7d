use serde::{Deserialize, Serialize};

// 用户角色
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Admin,   // 管理员
    Staff,   // 教务人员
    Teacher, // 教师
}

impl UserRole {
    pub const ADMIN: &'static str = "admin";
    pub const STAFF: &'static str = "staff";
    pub const TEACHER: &'static str = "teacher";

    pub fn all_roles() -> &'static [&'static UserRole] {
        &[&Self::Admin, &Self::Staff, &Self::Teacher]
    }
}

impl<'de> Deserialize<'de> for UserRole {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse::<UserRole>().map_err(|_| {
            serde::de::Error::custom(format!(
                "无效的用户角色: '{s}'. 支持的角色: admin, staff, teacher"
            ))
        })
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UserRole::Admin => write!(f, "{}", UserRole::ADMIN),
            UserRole::Staff => write!(f, "{}", UserRole::STAFF),
            UserRole::Teacher => write!(f, "{}", UserRole::TEACHER),
        }
    }
}

impl std::str::FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            UserRole::ADMIN => Ok(UserRole::Admin),
            UserRole::STAFF => Ok(UserRole::Staff),
            UserRole::TEACHER => Ok(UserRole::Teacher),
            _ => Err(format!("Invalid user role: {s}")),
        }
    }
}

// 用户实体
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: Option<String>,
    #[serde(skip_serializing, default)] // 不序列化到JSON响应中
    pub password_hash: String,
    pub role: UserRole,
    pub national_id: Option<String>,
    pub is_active: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl User {
    /// 教师且未被停用时才能登记考勤
    pub fn can_take_attendance(&self) -> bool {
        self.role == UserRole::Teacher && self.is_active
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_round_trip_through_str() {
        for role in UserRole::all_roles() {
            assert_eq!(role.to_string().parse::<UserRole>().unwrap(), **role);
        }
        assert!("user".parse::<UserRole>().is_err());
    }

    #[test]
    fn test_role_deserialize_rejects_unknown() {
        let err = serde_json::from_str::<UserRole>("\"principal\"").unwrap_err();
        assert!(err.to_string().contains("无效的用户角色"));
        let role: UserRole = serde_json::from_str("\"staff\"").unwrap();
        assert_eq!(role, UserRole::Staff);
    }
}
