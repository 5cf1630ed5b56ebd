use std::fmt;

/// Error type for orchd operations.
/// Implements Clone so per-model failures can be copied into results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error
{   /// No provider registered under this identifier
    UnknownProvider(String)
  , /// API key is missing for a provider (carries the provider label)
    MissingApiKey(String)
  , /// Transport-level HTTP failure
    HttpError(String)
  , /// Provider answered with an error envelope or failure status
    ApiError(String)
  , /// Failed to parse a provider response
    ParseError(String)
  , /// Provider answered without any text (carries the provider id)
    NoContentInResponse(String)
  , /// The shared deadline elapsed
    Timeout
  , /// The shared scope was cancelled by the caller
    Cancelled
  , /// Reading input or writing output failed
    Io(String)
  , /// Request or response (de)serialization failed
    Json(String)
  , /// Generic error
    Other(String)
}

impl fmt::Display for Error
{   fn fmt(&self, f: &mut fmt::Formatter<'_>)
      -> fmt::Result
    {   match self
        {   Error::UnknownProvider(id) => {
              write!(f, "unknown provider: {}", id)
            }
          , Error::MissingApiKey(provider) => {
              write!(f, "missing {} API key", provider)
            }
          , Error::HttpError(msg) => {
              write!(f, "http error: {}", msg)
            }
          , Error::ApiError(msg) => {
              write!(f, "{}", msg)
            }
          , Error::ParseError(msg) => {
              write!(f, "parse error: {}", msg)
            }
          , Error::NoContentInResponse(provider) => {
              write!(f, "{}: no content in response", provider)
            }
          , Error::Timeout => {
              write!(f, "deadline exceeded")
            }
          , Error::Cancelled => {
              write!(f, "request cancelled")
            }
          , Error::Io(msg) => {
              write!(f, "i/o error: {}", msg)
            }
          , Error::Json(msg) => {
              write!(f, "json error: {}", msg)
            }
          , Error::Other(msg) => {
              write!(f, "{}", msg)
            }
        }
    }
}

impl std::error::Error for Error {}

impl From<String> for Error
{   fn from(s: String) -> Self
    {   Error::Other(s)
    }
}

impl From<&str> for Error
{   fn from(s: &str) -> Self
    {   Error::Other(s.to_string())
    }
}

impl From<std::io::Error> for Error
{   fn from(e: std::io::Error) -> Self
    {   Error::Io(e.to_string())
    }
}

impl From<serde_json::Error> for Error
{   fn from(e: serde_json::Error) -> Self
    {   Error::Json(e.to_string())
    }
}

impl From<reqwest::Error> for Error
{   fn from(e: reqwest::Error) -> Self
    {   if e.is_timeout()
        {   Error::HttpError(format!("request timed out: {}", e))
        } else
        {   Error::HttpError(e.to_string())
        }
    }
}
