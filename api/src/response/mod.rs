use serde::Serialize;

/// JSON envelope returned by every `/api` endpoint.
///
/// ```json
/// { "success": true, "data": { ... }, "message": "Session created" }
/// ```
///
/// Error responses carry `T::default()` in `data` (usually [`Empty`]).
/// A soft conflict such as a repeated scan is still `success: true`; the
/// HTTP status tells the two outcomes apart.
#[derive(Serialize)]
pub struct ApiResponse<T>
where
    T: Serialize,
{
    pub success: bool,
    pub data: T,
    pub message: String,
}

impl<T> ApiResponse<T>
where
    T: Serialize,
{
    pub fn success(data: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            data,
            message: message.into(),
        }
    }

    /// Error response with default `data`.
    pub fn error(message: impl Into<String>) -> Self
    where
        T: Default,
    {
        Self {
            success: false,
            data: T::default(),
            message: message.into(),
        }
    }
}

/// Serializes as `{}`.
#[derive(Serialize, Default, Debug)]
pub struct Empty {}
