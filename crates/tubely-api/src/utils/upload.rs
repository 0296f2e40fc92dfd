//! Multipart helpers shared by the upload handlers

use axum::extract::multipart::Field;
use axum::extract::Multipart;
use tubely_core::models::{MediaBlob, UploadKind};
use tubely_processing::{MediaValidator, ValidationError};

/// Read the file part for `kind` into a [`MediaBlob`].
///
/// The declared content type is checked before any bytes are read, and the
/// field is streamed so at most `max + 1` chunk is buffered for an oversized
/// upload. Other fields are skipped; the matching one must be a file part.
pub async fn read_upload_field(
    mut multipart: Multipart,
    kind: UploadKind,
    rules: &MediaValidator,
) -> Result<MediaBlob, ValidationError> {
    let field_name = kind.field_name();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ValidationError::MalformedMultipart(e.body_text()))?
    {
        if field.name() != Some(field_name) {
            continue;
        }
        if field.file_name().is_none() {
            return Err(ValidationError::NotAFile(field_name.to_string()));
        }

        let media_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        rules.validate_content_type(&media_type)?;

        let data = read_capped(field, rules.max_file_size()).await?;
        tracing::debug!(
            kind = %kind,
            media_type = %media_type,
            size_bytes = data.len(),
            "Upload field read"
        );
        return Ok(MediaBlob::new(data, media_type));
    }

    Err(ValidationError::MissingField(field_name.to_string()))
}

async fn read_capped(mut field: Field<'_>, max: usize) -> Result<Vec<u8>, ValidationError> {
    let mut data = Vec::new();
    while let Some(chunk) = field
        .chunk()
        .await
        .map_err(|e| ValidationError::MalformedMultipart(e.body_text()))?
    {
        data.extend_from_slice(&chunk);
        if data.len() > max {
            return Err(ValidationError::FileTooLarge {
                size: data.len(),
                max,
            });
        }
    }
    Ok(data)
}
