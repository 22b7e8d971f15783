use anyhow::Result;
use oprun::cli::App;

#[tokio::main]
async fn main() -> Result<()> {
    let mut app = App::from_args()?;
    let args = oprun::cli::Args::parse_args();

    app.run(args).await?;

    Ok(())
}
