//! Prints an argon2 hash for a `[[users]]` entry in the server config.

use std::io::{self, Write};

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHasher, SaltString},
    Argon2,
};

fn main() -> anyhow::Result<()> {
    let username = std::env::args().nth(1).unwrap_or_else(|| "admin".to_string());

    eprint!("Password for {username}: ");
    io::stderr().flush()?;

    let mut password = String::new();
    io::stdin().read_line(&mut password)?;
    let password = password.trim();

    if password.is_empty() {
        anyhow::bail!("Password cannot be empty");
    }

    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {e}"))?;

    println!("[[users]]");
    println!("username = \"{username}\"");
    println!("password_hash = \"{hash}\"");
    println!("role = \"admin\"");

    Ok(())
}
