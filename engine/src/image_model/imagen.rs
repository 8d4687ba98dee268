use std::pin::Pin;

use color_eyre::Result;
use log::debug;

use crate::image_model::{GenerationParams, Image, ImageModel, Model};

pub mod imagen_api;
use imagen_api::PredictRequest;

/// Everything needed to address the predict endpoint of one Vertex AI project.
#[derive(Debug, Clone)]
pub struct ImagenConfig {
    pub project: String,
    pub location: String,
    pub model: Model,
    pub access_token: String,
    /// Defaults to the regional `aiplatform.googleapis.com` host
    pub endpoint: Option<String>,
}

#[derive(Clone)]
pub struct Imagen {
    config: ImagenConfig,
    url: String,
    client: reqwest::Client,
}

impl Imagen {
    pub fn new(config: ImagenConfig) -> Self {
        let base = config
            .endpoint
            .clone()
            .unwrap_or_else(|| format!("https://{}-aiplatform.googleapis.com", config.location));
        let url = format!(
            "{}/v1/projects/{}/locations/{}/publishers/google/models/{}:predict",
            base.trim_end_matches('/'),
            config.project,
            config.location,
            config.model,
        );

        Self {
            config,
            url,
            client: reqwest::Client::new(),
        }
    }

    pub fn predict_url(&self) -> &str {
        &self.url
    }
}

impl ImageModel for Imagen {
    fn generate<'a>(
        &'a self,
        prompt: &'a str,
        params: &'a GenerationParams,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<Image>>> + Send + 'a>> {
        Box::pin(async move {
            let body = PredictRequest::new(prompt, params);
            debug!("Predict request to {}: {body:#?}", self.url);
            let response =
                imagen_api::predict(&self.url, &self.config.access_token, &body, &self.client)
                    .await?;
            debug!("Got {} predictions", response.predictions.len());
            imagen_api::decode_images(response)
        })
    }

    fn model(&self) -> Model {
        self.config.model
    }
}

#[cfg(test)]
mod tests {
    use base64::prelude::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::image_model::ImageFormat;

    const PREDICT_PATH: &str =
        "/v1/projects/test-project/locations/us-central1/publishers/google/models/imagen-3.0-generate-002:predict";

    fn client_for(server: &MockServer) -> Imagen {
        Imagen::new(ImagenConfig {
            project: "test-project".into(),
            location: "us-central1".into(),
            model: Model::Imagen3,
            access_token: "test-token".into(),
            endpoint: Some(server.uri()),
        })
    }

    #[test]
    fn default_endpoint_is_regional() {
        let imagen = Imagen::new(ImagenConfig {
            project: "p".into(),
            location: "europe-west4".into(),
            model: Model::Imagen3Fast,
            access_token: "t".into(),
            endpoint: None,
        });
        assert_eq!(
            imagen.predict_url(),
            "https://europe-west4-aiplatform.googleapis.com/v1/projects/p/locations/europe-west4/publishers/google/models/imagen-3.0-fast-generate-001:predict"
        );
    }

    #[tokio::test]
    async fn returns_decoded_image() -> Result<()> {
        let server = MockServer::start().await;
        let png = b"\x89PNG fake image".to_vec();

        Mock::given(method("POST"))
            .and(path(PREDICT_PATH))
            .and(header("authorization", "Bearer test-token"))
            .and(body_json(json!({
                "instances": [{"prompt": "a red fox"}],
                "parameters": {
                    "sampleCount": 1,
                    "aspectRatio": "1:1",
                    "safetySetting": "block_few",
                    "personGeneration": "allow_adult",
                },
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "predictions": [{
                    "bytesBase64Encoded": BASE64_STANDARD.encode(&png),
                    "mimeType": "image/png",
                }],
            })))
            .expect(1)
            .mount(&server)
            .await;

        let imagen = client_for(&server);
        let images = imagen
            .generate("a red fox", &GenerationParams::default())
            .await?;

        assert_eq!(images.len(), 1);
        assert_eq!(images[0].data, png);
        assert_eq!(images[0].format, ImageFormat::Png);
        Ok(())
    }

    #[tokio::test]
    async fn empty_predictions_yield_no_images() -> Result<()> {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(PREDICT_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .mount(&server)
            .await;

        let images = client_for(&server)
            .generate("anything", &GenerationParams::default())
            .await?;
        assert!(images.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn quota_error_is_described() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(PREDICT_PATH))
            .respond_with(ResponseTemplate::new(429).set_body_json(json!({
                "error": {
                    "code": 429,
                    "message": "Quota exceeded for aiplatform.googleapis.com",
                    "status": "RESOURCE_EXHAUSTED",
                },
            })))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .generate("anything", &GenerationParams::default())
            .await
            .unwrap_err();

        assert!(err.downcast_ref::<imagen_api::ImagenApiError>().is_some());
        assert_eq!(
            err.to_string(),
            "Quota exhausted (429): Quota exceeded for aiplatform.googleapis.com"
        );
    }

    #[tokio::test]
    async fn unparsable_error_body_is_kept() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(PREDICT_PATH))
            .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .generate("anything", &GenerationParams::default())
            .await
            .unwrap_err();

        let msg = err.to_string();
        assert!(msg.contains("502"), "{msg}");
        assert!(msg.contains("bad gateway"), "{msg}");
    }
}
