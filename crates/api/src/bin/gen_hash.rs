use jobportal_api::password::hash_password;
use std::process::ExitCode;

/// Print an Argon2id hash for seeding accounts by hand, e.g. the first admin
fn main() -> ExitCode {
    let Some(password) = std::env::args().nth(1) else {
        eprintln!("usage: gen_hash <password>");
        return ExitCode::FAILURE;
    };

    match hash_password(&password) {
        Ok(hash) => {
            println!("{}", hash);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("failed to hash password: {}", e);
            ExitCode::FAILURE
        }
    }
}
