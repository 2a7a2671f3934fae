//! Decoding of Twilio messaging webhooks.
//!
//! Twilio posts `application/x-www-form-urlencoded` bodies. Decoding happens
//! in two steps: [`parse_form`] turns the raw body into a key to values map,
//! and [`TwilioRequest::from_form`] maps that onto the fixed field set. The
//! second step cannot fail; every value stays a string, including numeric
//! ones such as `NumMedia`.

use crate::errors::{BridgeError, BridgeResult};
use std::borrow::Cow;
use std::collections::HashMap;

/// Form keys mapped to every value they were sent with, in arrival order.
pub type FormValues = HashMap<String, Vec<String>>;

macro_rules! define_request_fields {
    ($( $field:ident => $key:literal ),* $(,)?) => {
        /// One inbound SMS/MMS notification.
        ///
        /// Keys are matched case-sensitively. Fields absent from the form stay
        /// empty; unrecognized keys are ignored.
        #[derive(Debug, Clone, Default, PartialEq, Eq)]
        pub struct TwilioRequest {
            $(pub $field: String,)*
        }

        /// All form keys the decoder recognizes.
        pub const FIELD_NAMES: &[&str] = &[$($key),*];

        impl TwilioRequest {
            /// Map a parsed form onto the request. When a key repeats, the last
            /// value wins.
            pub fn from_form(form: &FormValues) -> Self {
                let mut request = Self::default();
                $(
                    if let Some(value) = form.get($key).and_then(|values| values.last()) {
                        request.$field.clone_from(value);
                    }
                )*
                request
            }

            /// Look up a field by its wire name.
            pub fn get(&self, key: &str) -> Option<&str> {
                match key {
                    $($key => Some(self.$field.as_str()),)*
                    _ => None,
                }
            }
        }
    };
}

define_request_fields! {
    // Routing
    from                => "From",
    to                  => "To",
    body                => "Body",
    // First media attachment; later ones are not relayed
    num_media           => "NumMedia",
    media_url0          => "MediaUrl0",
    media_content_type0 => "MediaContentType0",
    // Provider metadata
    num_segments        => "NumSegments",
    message_sid         => "MessageSid",
    sms_message_sid     => "SmsMessageSid",
    sms_sid             => "SmsSid",
    sms_status          => "SmsStatus",
    account_sid         => "AccountSid",
    api_version         => "ApiVersion",
    // Geo lookups for both numbers
    from_city           => "FromCity",
    from_state          => "FromState",
    from_zip            => "FromZip",
    from_country        => "FromCountry",
    to_city             => "ToCity",
    to_state            => "ToState",
    to_zip              => "ToZip",
    to_country          => "ToCountry",
}

impl TwilioRequest {
    /// Whether the notification references a media attachment.
    pub fn has_media(&self) -> bool {
        !self.media_url0.is_empty()
    }
}

/// Parse a URL-encoded form body.
///
/// `+` decodes to a space. Empty pairs are skipped and a key without `=` gets
/// an empty value. Fails when the body, or a percent-decoded component, is not
/// valid UTF-8, or when a `%` is not followed by two hex digits.
pub fn parse_form(body: &[u8]) -> BridgeResult<FormValues> {
    let text = std::str::from_utf8(body)
        .map_err(|e| BridgeError::Decode(format!("form body is not valid UTF-8: {}", e)))?;

    let mut form = FormValues::new();
    for pair in text.split('&').filter(|p| !p.is_empty()) {
        let (raw_key, raw_value) = pair.split_once('=').unwrap_or((pair, ""));
        let key = decode_component(raw_key)?;
        let value = decode_component(raw_value)?;
        form.entry(key).or_default().push(value);
    }
    Ok(form)
}

fn decode_component(raw: &str) -> BridgeResult<String> {
    check_escapes(raw)?;
    let spaced = raw.replace('+', " ");
    urlencoding::decode(&spaced)
        .map(Cow::into_owned)
        .map_err(|e| BridgeError::Decode(format!("invalid percent-encoding in {:?}: {}", raw, e)))
}

fn check_escapes(raw: &str) -> BridgeResult<()> {
    let bytes = raw.as_bytes();
    for (i, _) in raw.match_indices('%') {
        let valid = bytes
            .get(i + 1..i + 3)
            .is_some_and(|hex| hex.iter().all(u8::is_ascii_hexdigit));
        if !valid {
            return Err(BridgeError::Decode(format!(
                "invalid URL escape at byte {} in {:?}",
                i, raw
            )));
        }
    }
    Ok(())
}

/// Decode a raw webhook body into a [`TwilioRequest`].
pub fn decode_request(body: &[u8]) -> BridgeResult<TwilioRequest> {
    let form = parse_form(body)?;
    Ok(TwilioRequest::from_form(&form))
}
