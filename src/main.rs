#[tokio::main]
async fn main() {
    if let Err(e) = medlink_lib::run().await {
        eprintln!("medlink: {e}");
        std::process::exit(1);
    }
}
