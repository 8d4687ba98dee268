use color_eyre::Result;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    color_eyre::install()?;
    pretty_env_logger::init();
    avatar_gen::run_batch(avatar_gen::catalogs::AVATARS).await?;
    Ok(())
}
