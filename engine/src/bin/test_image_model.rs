use clap::Parser;
use color_eyre::Result;
use engine::image_model::{
    AspectRatio, GenerationParams, ImageModel, Imagen, ImagenConfig, Model, SafetyLevel,
};

#[derive(clap::Parser)]
struct Arg {
    project: String,
    access_token: String,
    description: String,
    #[arg(long, default_value = "us-central1")]
    location: String,
    #[arg(long, value_enum, default_value_t)]
    model: Model,
    #[arg(long, value_enum, default_value_t)]
    aspect_ratio: AspectRatio,
    #[arg(long, value_enum, default_value_t)]
    safety_level: SafetyLevel,
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    pretty_env_logger::init();
    let Arg {
        project,
        access_token,
        description,
        location,
        model,
        aspect_ratio,
        safety_level,
    } = Arg::parse();

    let imagen = Imagen::new(ImagenConfig {
        project,
        location,
        model,
        access_token,
        endpoint: None,
    });
    let params = GenerationParams {
        aspect_ratio,
        safety_level,
        ..Default::default()
    };

    let images = imagen.generate(&description, &params).await?;
    let Some(image) = images.first() else {
        println!("No image returned");
        return Ok(());
    };
    let path = image.file_name("output");
    std::fs::write(&path, &image.data)?;
    println!("Saved {path}, {} bytes", image.data.len());

    Ok(())
}
