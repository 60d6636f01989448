#[tokio::main]
async fn main() -> anyhow::Result<()> {
    rms_admin_lib::run().await
}
