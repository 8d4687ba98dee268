use base64::prelude::*;
use color_eyre::{
    Result,
    eyre::{WrapErr as _, bail},
};
use log::{debug, warn};
use serde::{Deserialize, Serialize};

mod error;
pub use error::ImagenApiError;

use crate::image_model::{AspectRatio, GenerationParams, Image, ImageFormat, SafetyLevel};

#[derive(Debug, Serialize)]
pub struct PredictRequest<'a> {
    pub instances: Vec<Instance<'a>>,
    pub parameters: Parameters,
}

#[derive(Debug, Serialize)]
pub struct Instance<'a> {
    pub prompt: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Parameters {
    pub sample_count: u32,
    pub aspect_ratio: AspectRatio,
    pub safety_setting: SafetyLevel,
    pub person_generation: PersonGeneration,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PersonGeneration {
    DontAllow,
    AllowAdult,
}

impl<'a> PredictRequest<'a> {
    pub fn new(prompt: &'a str, params: &GenerationParams) -> Self {
        Self {
            instances: vec![Instance { prompt }],
            parameters: Parameters {
                sample_count: params.image_count,
                aspect_ratio: params.aspect_ratio,
                safety_setting: params.safety_level,
                person_generation: if params.allow_adult_subjects {
                    PersonGeneration::AllowAdult
                } else {
                    PersonGeneration::DontAllow
                },
            },
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct PredictResponse {
    /// Absent when every sample was filtered
    #[serde(default)]
    pub predictions: Vec<Prediction>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Prediction {
    pub bytes_base64_encoded: Option<String>,
    pub mime_type: Option<String>,
    pub rai_filtered_reason: Option<String>,
}

/// Sends a single predict call and returns the raw response
pub async fn predict(
    url: &str,
    access_token: &str,
    body: &PredictRequest<'_>,
    client: &reqwest::Client,
) -> Result<PredictResponse> {
    let resp = client
        .post(url)
        .bearer_auth(access_token)
        .header("accept", "application/json")
        .json(body)
        .send()
        .await?;

    let status = resp.status();
    let text = resp.text().await?;

    if !status.is_success() {
        match serde_json::from_str::<error::ErrorEnvelope>(&text) {
            Ok(envelope) => return Err(ImagenApiError::from(envelope).into()),
            Err(_) => bail!("Imagen predict failed: {status} - {text}"),
        }
    }

    serde_json::from_str(&text).wrap_err("Couldn't decode Imagen predict response")
}

/// Decodes every prediction that carries image bytes. Filtered samples are skipped.
pub fn decode_images(response: PredictResponse) -> Result<Vec<Image>> {
    let mut images = Vec::with_capacity(response.predictions.len());
    for prediction in response.predictions {
        let Some(encoded) = prediction.bytes_base64_encoded else {
            warn!(
                "Prediction without image data, filter reason: {}",
                prediction.rai_filtered_reason.as_deref().unwrap_or("none")
            );
            continue;
        };
        let data = BASE64_STANDARD
            .decode(encoded.as_bytes())
            .wrap_err("Prediction contained invalid base64")?;
        debug!(
            "Decoded {} bytes of {:?}",
            data.len(),
            prediction.mime_type
        );
        images.push(Image {
            data,
            format: ImageFormat::from_mime(prediction.mime_type.as_deref()),
        });
    }
    Ok(images)
}

#[cfg(test)]
mod test {
    use expect_test::expect;

    use super::*;

    #[test]
    fn request_serialization() {
        let body = PredictRequest::new("A lighthouse", &GenerationParams::default());

        let expect = expect![[r#"{"instances":[{"prompt":"A lighthouse"}],"parameters":{"sampleCount":1,"aspectRatio":"1:1","safetySetting":"block_few","personGeneration":"allow_adult"}}"#]];
        expect.assert_eq(&serde_json::to_string(&body).unwrap());
    }

    #[test]
    fn adult_subjects_can_be_disallowed() {
        let params = GenerationParams {
            allow_adult_subjects: false,
            ..Default::default()
        };
        let body = PredictRequest::new("x", &params);
        assert_eq!(
            body.parameters.person_generation,
            PersonGeneration::DontAllow
        );
    }

    #[test]
    fn filtered_predictions_are_skipped() -> Result<()> {
        let response: PredictResponse = serde_json::from_str(
            r#"{"predictions":[
                {"raiFilteredReason":"blocked"},
                {"bytesBase64Encoded":"AQID","mimeType":"image/jpeg"}
            ]}"#,
        )?;
        let images = decode_images(response)?;
        assert_eq!(
            images,
            vec![Image {
                data: vec![1, 2, 3],
                format: ImageFormat::Jpeg
            }]
        );
        Ok(())
    }

    #[test]
    fn missing_predictions_means_no_images() -> Result<()> {
        let response: PredictResponse = serde_json::from_str("{}")?;
        assert!(decode_images(response)?.is_empty());
        Ok(())
    }

    #[test]
    fn error_envelope_maps_to_status() {
        let envelope: error::ErrorEnvelope = serde_json::from_str(
            r#"{"error":{"code":429,"message":"Quota exceeded","status":"RESOURCE_EXHAUSTED"}}"#,
        )
        .unwrap();
        let err = ImagenApiError::from(envelope);
        assert_eq!(err.to_string(), "Quota exhausted (429): Quota exceeded");
    }
}
