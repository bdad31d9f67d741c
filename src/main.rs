#[tokio::main]
async fn main() -> anyhow::Result<()> {
    domestika_dl_lib::run().await
}
