use once_cell::sync::Lazy;
use regex::Regex;

static USERNAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("Invalid username regex"));

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$").expect("Invalid email regex")
});

/// 备注和说明的最大字符数
pub const MAX_NOTE_CHARS: usize = 500;

pub fn validate_username(username: &str) -> Result<(), &'static str> {
    // 用户名长度校验：3 <= x <= 32
    if username.len() < 3 || username.len() > 32 {
        return Err("Username length must be between 3 and 32 characters");
    }
    // 只能包含字母、数字、下划线或连字符
    if !USERNAME_RE.is_match(username) {
        return Err("Username must contain only letters, numbers, underscores or hyphens");
    }
    Ok(())
}

pub fn validate_email(email: &str) -> Result<(), &'static str> {
    if !EMAIL_RE.is_match(email) {
        return Err("Email format is invalid");
    }
    Ok(())
}

/// 备注/说明长度校验，None 表示清空
pub fn validate_note(text: Option<&str>) -> Result<(), String> {
    match text {
        Some(text) if text.chars().count() > MAX_NOTE_CHARS => Err(format!(
            "Text must be at most {MAX_NOTE_CHARS} characters"
        )),
        _ => Ok(()),
    }
}

/// 密码策略验证结果
#[derive(Debug, Clone)]
pub struct PasswordValidationResult {
    pub is_valid: bool,
    pub errors: Vec<&'static str>,
}

impl PasswordValidationResult {
    pub fn error_message(&self) -> String {
        self.errors.join("; ")
    }
}

/// 验证密码是否符合安全策略
///
/// 策略要求：
/// - 最小长度：8 字符
/// - 必须包含：大写字母 + 小写字母 + 数字
pub fn validate_password(password: &str) -> PasswordValidationResult {
    let mut errors = Vec::new();

    if password.len() < 8 {
        errors.push("Password must be at least 8 characters long");
    }
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        errors.push("Password must contain at least one uppercase letter");
    }
    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        errors.push("Password must contain at least one lowercase letter");
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        errors.push("Password must contain at least one digit");
    }

    // 常见弱密码
    let weak_passwords = ["password1", "admin1234", "qwerty123", "abcd1234", "school123"];
    if weak_passwords
        .iter()
        .any(|&weak| password.eq_ignore_ascii_case(weak))
    {
        errors.push("Password is too common, please choose a stronger password");
    }

    PasswordValidationResult {
        is_valid: errors.is_empty(),
        errors,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_username_rules() {
        assert!(validate_username("admin").is_ok());
        assert!(validate_username("t_wang-3").is_ok());
        assert!(validate_username("ab").is_err());
        assert!(validate_username("wang li").is_err());
    }

    #[test]
    fn test_email_rules() {
        assert!(validate_email("office@school.edu").is_ok());
        assert!(validate_email("office@school").is_err());
    }

    #[test]
    fn test_note_length() {
        assert!(validate_note(None).is_ok());
        assert!(validate_note(Some("left early")).is_ok());
        let long = "迟".repeat(MAX_NOTE_CHARS + 1);
        assert!(validate_note(Some(&long)).is_err());
    }

    #[test]
    fn test_valid_password() {
        assert!(validate_password("SecurePass123").is_valid);
    }

    #[test]
    fn test_weak_password() {
        let result = validate_password("abcd1234");
        assert!(!result.is_valid);
        assert!(
            result
                .errors
                .contains(&"Password must contain at least one uppercase letter")
        );
        assert!(
            result
                .errors
                .contains(&"Password is too common, please choose a stronger password")
        );
    }
}
