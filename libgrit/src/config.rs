use crate::commit::Identity;
use crate::error::{GritError, GritResult};

fn required_env(name: &str) -> GritResult<String> {
    std::env::var(name).map_err(|_| GritError::MissingEnv(name.to_owned()))
}

/// author identity for `commit` when no `-a` override is given; reads
/// `AUTHOR_NAME`/`AUTHOR_EMAIL` (§6).
pub fn author_identity() -> GritResult<Identity> {
    Ok(Identity { name: required_env("AUTHOR_NAME")?, email: required_env("AUTHOR_EMAIL")? })
}

/// basic-auth username for `push` when no `-u` override is given; reads
/// `USERNAME` (§6).
pub fn push_username() -> GritResult<String> {
    required_env("USERNAME")
}

/// basic-auth password for `push` when no `-p` override is given; reads
/// `PASSWORD` (§6).
pub fn push_password() -> GritResult<String> {
    required_env("PASSWORD")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn missing_author_name_is_missing_env() {
        let _guard = ENV_LOCK.lock().unwrap();
        std::env::remove_var("AUTHOR_NAME");
        std::env::remove_var("AUTHOR_EMAIL");
        assert!(matches!(author_identity(), Err(GritError::MissingEnv(name)) if name == "AUTHOR_NAME"));
    }

    #[test]
    fn reads_both_author_fields() {
        let _guard = ENV_LOCK.lock().unwrap();
        std::env::set_var("AUTHOR_NAME", "Ada");
        std::env::set_var("AUTHOR_EMAIL", "ada@example.com");
        let identity = author_identity().unwrap();
        assert_eq!(identity.name, "Ada");
        assert_eq!(identity.email, "ada@example.com");
        std::env::remove_var("AUTHOR_NAME");
        std::env::remove_var("AUTHOR_EMAIL");
    }
}
