//! Test data consumed by the scenarios
//!
//! Loaded from JSON or YAML with the storefront's camelCase keys:
//!
//! ```json
//! {
//!   "applicationUrl": "https://shop.example.com/client",
//!   "loginCredentials": { "email": "...", "password": "..." },
//!   "products": { "zaraCoat": "ZARA COAT 3", "iPhone": "IPHONE 13 PRO" },
//!   "paymentDetails": { "cvv": "123", "cardholderName": "Jane Doe" },
//!   "couponCode": "SAVE10",
//!   "country": "India",
//!   "orderConfirmationProduct": "ZARA COAT 3"
//! }
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{E2eError, E2eResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestData {
    pub application_url: String,
    pub login_credentials: Credentials,
    /// Product key to catalog display name.
    pub products: BTreeMap<String, String>,
    pub payment_details: PaymentDetails,
    pub coupon_code: String,
    pub country: String,
    pub order_confirmation_product: String,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentDetails {
    pub cvv: String,
    pub cardholder_name: String,
}

impl fmt::Debug for PaymentDetails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PaymentDetails")
            .field("cvv", &"<redacted>")
            .field("cardholder_name", &self.cardholder_name)
            .finish()
    }
}

impl TestData {
    pub fn from_json(json: &str) -> E2eResult<Self> {
        serde_json::from_str(json).map_err(|e| E2eError::TestData(e.to_string()))
    }

    pub fn from_yaml(yaml: &str) -> E2eResult<Self> {
        serde_yaml::from_str(yaml).map_err(|e| E2eError::TestData(e.to_string()))
    }

    /// Load test data, choosing the format by file extension.
    pub fn from_file(path: &Path) -> E2eResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let data = match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => Self::from_yaml(&content),
            _ => Self::from_json(&content),
        };
        data.map_err(|e| E2eError::TestData(format!("{}: {}", path.display(), e)))
    }

    /// Display name of the product stored under `key`.
    pub fn product(&self, key: &str) -> E2eResult<&str> {
        self.products
            .get(key)
            .map(String::as_str)
            .ok_or_else(|| E2eError::TestData(format!("no product under key '{}'", key)))
    }

    /// Replace credentials with values supplied outside the data file.
    pub fn with_credentials(mut self, email: Option<String>, password: Option<String>) -> Self {
        if let Some(email) = email {
            self.login_credentials.email = email;
        }
        if let Some(password) = password {
            self.login_credentials.password = password;
        }
        self
    }
}
