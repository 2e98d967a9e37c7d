use crate::config::Argon2Config;
use crate::errors::AttendanceError;
use argon2::password_hash::{SaltString, rand_core::OsRng};
use argon2::{Algorithm, Argon2, Params, PasswordHasher, Version};

/// 哈希密码
pub fn hash_password(password: &str, config: &Argon2Config) -> Result<String, AttendanceError> {
    let params = Params::new(
        config.memory_cost,
        config.time_cost,
        config.parallelism,
        None,
    )
    .map_err(|e| AttendanceError::configuration(format!("Argon2 参数错误: {e}")))?;

    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);
    let salt = SaltString::generate(&mut OsRng);
    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AttendanceError::validation(format!("密码哈希失败: {e}")))?;
    Ok(hash.to_string())
}

/// 生成随机密码
pub fn generate_random_password(length: usize) -> String {
    use rand::Rng;
    const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789!@#$%";
    let mut rng = rand::rng();
    (0..length)
        .map(|_| {
            let idx = rng.random_range(0..CHARSET.len());
            CHARSET[idx] as char
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use argon2::{PasswordHash, PasswordVerifier};

    fn verify_password(password: &str, hash: &str) -> bool {
        match PasswordHash::new(hash) {
            Ok(parsed) => Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok(),
            Err(_) => false,
        }
    }

    fn fast_params() -> Argon2Config {
        Argon2Config {
            memory_cost: 1024,
            time_cost: 1,
            parallelism: 1,
        }
    }

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("Attendance2024", &fast_params()).unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("Attendance2024", &hash));
        assert!(!verify_password("attendance2024", &hash));
    }

    #[test]
    fn test_verify_rejects_malformed_hash() {
        assert!(!verify_password("whatever", "not-a-hash"));
    }

    #[test]
    fn test_invalid_params_are_configuration_errors() {
        let config = Argon2Config {
            memory_cost: 1,
            time_cost: 0,
            parallelism: 0,
        };
        assert!(matches!(
            hash_password("x", &config),
            Err(AttendanceError::Configuration(_))
        ));
    }

    #[test]
    fn test_generated_password_length() {
        let pwd = generate_random_password(16);
        assert_eq!(pwd.chars().count(), 16);
        assert_ne!(pwd, generate_random_password(16));
    }
}
