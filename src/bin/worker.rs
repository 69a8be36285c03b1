#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = quizdesk::run_worker().await {
        eprintln!("quizdesk-worker fatal: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}
