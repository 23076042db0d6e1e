use std::{collections::HashMap, str::FromStr};

use actix_multipart::Multipart;
use actix_web::HttpRequest;
use futures::TryStreamExt;
use log::{debug, trace, warn};

use crate::errors::ServerError;

/// The host the client addressed, as given by the `Forwarded`/`X-Forwarded-Host` or `Host` headers, falling back to
/// the server's own address.
pub fn request_host(req: &HttpRequest) -> String {
    let host = req.connection_info().host().to_string();
    trace!("Request host: {host}");
    host
}

/// `scheme://host` of the incoming request.
pub fn request_origin(req: &HttpRequest) -> String {
    let info = req.connection_info();
    format!("{}://{}", info.scheme(), info.host())
}

/// The largest single field (usually an image) accepted in a form upload.
pub const MAX_FORM_FIELD_BYTES: usize = 5 * 1024 * 1024;
/// The largest form upload accepted, all fields included.
pub const MAX_FORM_BYTES: usize = 8 * 1024 * 1024;

/// The fields of a `multipart/form-data` body, read fully into memory.
#[derive(Debug, Default)]
pub struct FormFields {
    fields: HashMap<String, Vec<u8>>,
}

impl FormFields {
    /// Reads the whole form, failing with [`ServerError::InvalidRequestBody`] as soon as a field grows past
    /// [`MAX_FORM_FIELD_BYTES`] or the form past [`MAX_FORM_BYTES`].
    pub async fn read(payload: Multipart) -> Result<Self, ServerError> {
        Self::read_with_limits(payload, MAX_FORM_FIELD_BYTES, MAX_FORM_BYTES).await
    }

    pub async fn read_with_limits(
        mut payload: Multipart,
        field_limit: usize,
        total_limit: usize,
    ) -> Result<Self, ServerError> {
        let mut fields = HashMap::new();
        let mut total = 0usize;
        while let Some(mut field) = payload.try_next().await.map_err(multipart_error)? {
            let name = match field.content_disposition().get_name() {
                Some(name) => name.to_string(),
                None => continue,
            };
            let mut data = Vec::new();
            while let Some(chunk) = field.try_next().await.map_err(multipart_error)? {
                total += chunk.len();
                if data.len() + chunk.len() > field_limit {
                    warn!("Rejected form upload. Field '{name}' is larger than {field_limit} bytes");
                    return Err(ServerError::InvalidRequestBody(format!(
                        "Form field '{name}' is too large. The limit is {field_limit} bytes."
                    )));
                }
                if total > total_limit {
                    warn!("Rejected form upload larger than {total_limit} bytes");
                    return Err(ServerError::InvalidRequestBody(format!(
                        "The form data is too large. The limit is {total_limit} bytes."
                    )));
                }
                data.extend_from_slice(&chunk);
            }
            debug!("Read multipart field '{name}' ({} bytes)", data.len());
            fields.insert(name, data);
        }
        Ok(Self { fields })
    }

    pub fn text(&self, name: &str) -> Option<String> {
        self.fields.get(name).map(|v| String::from_utf8_lossy(v).trim().to_string())
    }

    pub fn required_text(&self, name: &str) -> Result<String, ServerError> {
        self.text(name).ok_or_else(|| ServerError::InvalidRequestBody(format!("Missing form field '{name}'")))
    }

    pub fn parse<T>(&self, name: &str) -> Result<T, ServerError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        let value = self.required_text(name)?;
        value.parse::<T>().map_err(|e| ServerError::InvalidRequestBody(format!("Invalid value for '{name}'. {e}")))
    }

    /// The bytes of an uploaded file. Empty uploads count as absent.
    pub fn file(&mut self, name: &str) -> Option<Vec<u8>> {
        self.fields.remove(name).filter(|data| !data.is_empty())
    }
}

fn multipart_error(e: actix_multipart::MultipartError) -> ServerError {
    ServerError::InvalidRequestBody(format!("Could not read the form data. {e}"))
}
