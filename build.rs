//! Build script for embedded migrations.
//!
//! `sqlx::migrate!` embeds data/sql/sqlite at compile time, so a changed or
//! added migration must trigger a rebuild.

fn main() {
    println!("cargo:rerun-if-changed=data/sql/sqlite");
}
