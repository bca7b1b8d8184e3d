// Embedded migrations are compiled in by `sqlx::migrate!`, so a new migration
// file has to trigger a rebuild.
fn main() {
    println!("cargo:rerun-if-changed=migrations");
}
