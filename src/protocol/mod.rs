//! Wire protocol between the preferences page and the host process.
//!
//! The host can only observe outbound request URLs and answer each with a
//! single JSON value, so the protocol is:
//!
//! ## Requests (page → host)
//! - a URL per call: resource path plus arguments in the query string
//!   (`encoding`), optionally carrying the request id under the callback key
//!
//! ## Replies (host → page)
//! - script tags: the host invokes `window[<request id>](data, error)`
//! - fetch: the body is `[payload, error]` (`response`)
//!
//! ## Pushes (host → page, unsolicited)
//! - `onNotification(eventName, data)` (`notification`)
//!
//! # Module Structure
//!
//! - `args`: call arguments (named, positional)
//! - `encoding`: URL encoders and host-side decoders, one per `EncodingKind`
//! - `response`: reply decoding, error-slot truthiness
//! - `notification`: push classification

mod args;
mod encoding;
mod notification;
mod response;

pub use args::Args;
pub use encoding::{
    decode_component, encode_component, encoder_for, ArgsArrayEncoder, B64JsonEncoder,
    DecodedRequest, JsonQueryEncoder, RequestEncoder,
};
pub use notification::{
    classify, legacy_value, HotkeyCapture, Notification, PushKind, FILE_SELECT_EVENT,
    HOTKEY_CAPTURED_EVENT,
};
pub use response::{
    decode_reply_body, encode_reply_body, is_truthy, log_preview, settlement_from_callback,
};
