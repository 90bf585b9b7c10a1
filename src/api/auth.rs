use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::http::ApiClient;

pub const SIGNUP: &str = "/auths/signup/";
pub const LOGIN: &str = "/auths/login/";
pub const SEND_OTP: &str = "/auths/send-otp/";
pub const VERIFY_OTP: &str = "/auths/verify-otp/";

#[derive(Debug, Clone, Serialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub token: String,
}

#[derive(Debug, Serialize)]
struct OtpRequest<'a> {
    otp: &'a str,
}

/// Signup, login and OTP verification. Persisting the returned token is left
/// to the caller.
pub struct AuthApi {
    client: ApiClient,
}

impl AuthApi {
    pub fn new(client: ApiClient) -> Self {
        AuthApi { client }
    }

    pub async fn signup(&self, credentials: &Credentials) -> Result<TokenResponse, ApiError> {
        log::info!("Signing up {}", credentials.email);
        self.client.post(SIGNUP, credentials, None).await
    }

    pub async fn login(&self, credentials: &Credentials) -> Result<TokenResponse, ApiError> {
        log::info!("Logging in {}", credentials.email);
        self.client.post(LOGIN, credentials, None).await
    }

    pub async fn send_otp(&self) -> Result<(), ApiError> {
        self.client.post_empty(SEND_OTP, None).await
    }

    pub async fn verify_otp(&self, otp: &str) -> Result<(), ApiError> {
        self.client
            .post_discarding(VERIFY_OTP, &OtpRequest { otp: otp.trim() }, None)
            .await
    }
}
