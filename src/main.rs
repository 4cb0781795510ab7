use std::process;

#[tokio::main]
async fn main() {
    if let Err(e) = mrpack_installer_lib::run().await {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}
