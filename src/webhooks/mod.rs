//! Webhook ingestion: signature verification, classification, and payload
//! normalization.
//!
//! This module provides:
//! - Signature verification for webhook payloads (HMAC, scheme-prefixed)
//! - Category and desirability classification
//! - Parsing of raw payloads into normalized, typed events

pub mod classify;
pub mod events;
pub mod parser;
pub mod signature;

pub use classify::{EventCategory, is_desirable_issue_event};
pub use events::{
    IssueAction, IssueEvent, LabelAction, LabelEvent, MilestoneAction, MilestoneEvent,
};
pub use parser::{
    Changes, ParseError, parse_issue_event, parse_label_event, parse_milestone_event,
};
pub use signature::{
    SignatureScheme, compute_signature, format_signature_header, parse_signature_header,
    verify_signature,
};
