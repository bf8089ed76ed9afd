use axum::http::StatusCode;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthFailure {
    InvalidCredentials,
    SessionExpired,
}

/// Failures of a single remote API call.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ApiError {
    #[error("authentication failed: {0:?}")]
    Auth(AuthFailure),
    #[error("unexpected response from hours API: {0}")]
    Protocol(String),
    #[error("could not reach hours API: {0}")]
    Network(String),
    #[error("hours API returned {status}: {message}")]
    Server { status: u16, message: String },
}

impl ApiError {
    pub fn is_session_expired(&self) -> bool {
        matches!(self, ApiError::Auth(AuthFailure::SessionExpired))
    }

    /// Text shown to the operator in the page region that triggered the call.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Auth(AuthFailure::InvalidCredentials) => "分院代號或密碼錯誤".to_string(),
            ApiError::Auth(AuthFailure::SessionExpired) => "登入已過期，請重新登入".to_string(),
            ApiError::Protocol(_) => "伺服器回應格式錯誤".to_string(),
            ApiError::Network(_) => "無法連線到伺服器，請檢查網路".to_string(),
            ApiError::Server { status, .. } => format!("伺服器錯誤 ({status})"),
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ApiError::Protocol(err.to_string())
        } else {
            ApiError::Network(err.to_string())
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum FormError {
    #[error("row {row}: hours must be a number, got {value:?}")]
    InvalidHours { row: usize, value: String },
    #[error("row {row}: {field} is required")]
    MissingField { row: usize, field: &'static str },
    #[error("registrar is required")]
    MissingCreator,
    #[error("a submission is already in progress")]
    AlreadySubmitting,
}

impl FormError {
    pub fn user_message(&self) -> String {
        match self {
            FormError::InvalidHours { row, value } => {
                format!("第 {} 列的時數必須是數字（輸入：{value}）", row + 1)
            }
            FormError::MissingField { row, field } => {
                format!("第 {} 列缺少{}", row + 1, field_label(field))
            }
            FormError::MissingCreator => "請填寫登記人".to_string(),
            FormError::AlreadySubmitting => "資料送出中，請稍候".to_string(),
        }
    }
}

fn field_label(field: &str) -> &'static str {
    match field {
        "volunteer_name" => "義工姓名",
        "chapter" => "分院",
        "unit" => "服務單位",
        _ => "欄位",
    }
}

#[derive(Debug, Error)]
pub enum ActionError {
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Form(#[from] FormError),
    #[error("no active session")]
    NoSession,
    #[error("another request of this kind is still pending")]
    Busy,
    #[error("failed to persist session: {0}")]
    Persist(#[from] std::io::Error),
}

#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            message: message.into(),
        }
    }
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        (self.status, self.message).into_response()
    }
}
