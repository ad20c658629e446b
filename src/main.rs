use rask_remote_logger::app;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    app::main().await
}
