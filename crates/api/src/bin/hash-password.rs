//! Password hashing utility for Herodex
//!
//! Generates Argon2id hashes for seeding accounts (e.g. the first admin)
//! without handling plaintext passwords in SQL.
//!
//! Usage:
//!   cargo run --bin hash-password
//!   cargo run --bin hash-password "MySecurePassword123!"

use std::env;
use std::io::{self, Write};

use herodex_api::auth::{hash_password, validate_password};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let password = if let Some(pwd) = env::args().nth(1) {
        pwd
    } else {
        // Reading from stdin keeps the password out of the process list
        print!("Enter password to hash: ");
        io::stdout().flush()?;

        let mut password = String::new();
        io::stdin().read_line(&mut password)?;
        password.trim().to_string()
    };

    if let Err(e) = validate_password(&password) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }

    let hash = hash_password(&password).map_err(|e| format!("Password hashing failed: {e}"))?;

    println!("{hash}");
    println!();
    println!("Store this in the password_hash column, e.g.:");
    println!("UPDATE users SET password_hash = '{hash}' WHERE email = 'admin@example.com';");

    Ok(())
}
