#[tokio::main]
async fn main() {
    if let Err(error) = trading_socket_lib::run().await {
        eprintln!("trading-socket failed: {error}");
        std::process::exit(1);
    }
}
