//! Payment gateway: pay-form construction and webhook verification
//!
//! Requests to the provider and notifications from it share one signature
//! scheme: SHA-256 over the canonically-ordered parameter string with the
//! merchant secret appended, hex-encoded. The digest is not a secret-key MAC
//! in the cryptographic sense, but it matches what the provider's server-side
//! SDK computes and verifies.

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use sha2::{Digest, Sha256};
use shared::error::{AppError, ErrorCode};
use shared::order::{Order, PaymentForm, PaymentNotice};
use std::collections::BTreeMap;
use thiserror::Error;

/// Provider wall-clock format for `gmt_payment`
const GMT_PAYMENT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Payment boundary errors
#[derive(Debug, Error)]
pub enum PaymentError {
    #[error("Notification signature invalid")]
    InvalidSignature,

    #[error("Notification missing field: {0}")]
    MissingField(&'static str),

    #[error("Malformed notification: {0}")]
    Malformed(String),
}

impl From<PaymentError> for AppError {
    fn from(err: PaymentError) -> Self {
        match err {
            PaymentError::InvalidSignature => AppError::new(ErrorCode::PaymentSignatureInvalid),
            PaymentError::MissingField(field) => AppError::with_message(
                ErrorCode::InvalidRequest,
                format!("Payment notification missing field: {field}"),
            ),
            PaymentError::Malformed(msg) => AppError::with_message(
                ErrorCode::InvalidRequest,
                format!("Malformed payment notification: {msg}"),
            ),
        }
    }
}

/// Gateway configuration
#[derive(Debug, Clone)]
pub struct PaymentConfig {
    /// Merchant application id at the provider
    pub app_id: String,
    /// Shared secret appended to the canonical string before hashing
    pub merchant_secret: String,
    /// Provider page-pay endpoint the client form submits to
    pub gateway_url: String,
    /// Our asynchronous callback URL
    pub notify_url: String,
    /// Our synchronous browser-return URL
    pub return_url: String,
}

/// Payment gateway
#[derive(Clone)]
pub struct PaymentGateway {
    config: PaymentConfig,
}

impl PaymentGateway {
    pub fn new(config: PaymentConfig) -> Self {
        Self { config }
    }

    /// Canonical signature: sorted `k=v` pairs joined by `&`, secret
    /// appended, SHA-256, lowercase hex. Empty values and the `sign`
    /// parameter itself are excluded.
    fn sign(&self, params: &BTreeMap<String, String>) -> String {
        let canonical: Vec<String> = params
            .iter()
            .filter(|(k, v)| k.as_str() != "sign" && !v.is_empty())
            .map(|(k, v)| format!("{k}={v}"))
            .collect();
        let payload = format!("{}&key={}", canonical.join("&"), self.config.merchant_secret);

        let mut hasher = Sha256::new();
        hasher.update(payload.as_bytes());
        hex::encode(hasher.finalize())
    }

    /// Build the auto-submit pay form for a pending order
    pub fn create_pay_form(&self, order: &Order) -> PaymentForm {
        let mut params = BTreeMap::new();
        params.insert("app_id".to_string(), self.config.app_id.clone());
        params.insert("out_trade_no".to_string(), order.id.to_string());
        params.insert("subject".to_string(), format!("Store order {}", order.id));
        params.insert(
            "total_amount".to_string(),
            order.total_amount.to_string(),
        );
        params.insert("notify_url".to_string(), self.config.notify_url.clone());
        params.insert("return_url".to_string(), self.config.return_url.clone());
        params.insert("nonce".to_string(), uuid::Uuid::new_v4().to_string());

        let sign = self.sign(&params);
        params.insert("sign".to_string(), sign);

        let mut form = format!(
            "<form id=\"pay\" action=\"{}\" method=\"POST\">\n",
            self.config.gateway_url
        );
        for (name, value) in &params {
            form.push_str(&format!(
                "  <input type=\"hidden\" name=\"{name}\" value=\"{value}\"/>\n"
            ));
        }
        form.push_str("</form>\n<script>document.forms['pay'].submit();</script>");

        tracing::debug!(order_id = order.id, "Pay form generated");

        PaymentForm {
            order_id: order.id,
            total_amount: order.total_amount,
            payment_method: order.payment_method,
            form_html: form,
        }
    }

    /// Verify and decode an asynchronous notification
    ///
    /// Signature first: an unsigned or tampered payload never reaches the
    /// reconciliation logic. The reported status string is decoded but not
    /// gated here; reconciliation's own PENDING and amount checks are
    /// authoritative.
    pub fn verify_notice(
        &self,
        params: &BTreeMap<String, String>,
    ) -> Result<PaymentNotice, PaymentError> {
        let provided_sign = params
            .get("sign")
            .ok_or(PaymentError::MissingField("sign"))?;
        if *provided_sign != self.sign(params) {
            return Err(PaymentError::InvalidSignature);
        }

        let out_trade_no = params
            .get("out_trade_no")
            .ok_or(PaymentError::MissingField("out_trade_no"))?;
        let order_id: i64 = out_trade_no
            .parse()
            .map_err(|_| PaymentError::Malformed(format!("out_trade_no: {out_trade_no}")))?;

        let trade_no = params
            .get("trade_no")
            .ok_or(PaymentError::MissingField("trade_no"))?
            .clone();

        let status = params
            .get("trade_status")
            .ok_or(PaymentError::MissingField("trade_status"))?
            .clone();

        let amount_str = params
            .get("total_amount")
            .ok_or(PaymentError::MissingField("total_amount"))?;
        let total_amount: Decimal = amount_str
            .parse()
            .map_err(|_| PaymentError::Malformed(format!("total_amount: {amount_str}")))?;

        let payment_time = match params.get("gmt_payment") {
            Some(raw) if !raw.is_empty() => {
                let parsed = NaiveDateTime::parse_from_str(raw, GMT_PAYMENT_FORMAT)
                    .map_err(|_| PaymentError::Malformed(format!("gmt_payment: {raw}")))?;
                Some(parsed.and_utc().timestamp_millis())
            }
            _ => None,
        };

        Ok(PaymentNotice {
            order_id,
            trade_no,
            status,
            total_amount,
            payment_time,
        })
    }

    /// Frontend URL the browser is redirected to after paying
    pub fn success_redirect(&self, frontend_base_url: &str, order_id: &str) -> String {
        format!("{frontend_base_url}/orders/success?orderId={order_id}")
    }
}
