#[tokio::main]
async fn main() -> anyhow::Result<()> {
    footscan_lib::run().await
}
