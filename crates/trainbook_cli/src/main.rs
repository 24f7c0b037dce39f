//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `trainbook_core` linkage.
//! - Report the migrated schema version of a scratch database.

use trainbook_core::db::migrations::schema_version;
use trainbook_core::db::open_db_in_memory;

fn main() {
    println!("trainbook_core ping={}", trainbook_core::ping());
    println!("trainbook_core version={}", trainbook_core::core_version());
    let schema = open_db_in_memory()
        .map_err(|err| err.to_string())
        .and_then(|conn| schema_version(&conn).map_err(|err| err.to_string()));
    match schema {
        Ok(version) => println!("trainbook_core schema_version={version}"),
        Err(err) => {
            eprintln!("trainbook_core schema_version error={err}");
            std::process::exit(1);
        }
    }
}
