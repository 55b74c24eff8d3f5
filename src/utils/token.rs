use rand::{distributions::Alphanumeric, thread_rng, Rng};

pub const TEMP_PASSWORD_LEN: usize = 16;

/// Password for accounts an admin creates without choosing one.
pub fn generate_temp_password(length: usize) -> String {
    thread_rng()
        .sample_iter(&Alphanumeric)
        .take(length)
        .map(char::from)
        .collect()
}
