//! Renders an announcement into the outbound text payload.

use chrono::NaiveDate;

use crate::pipeline::types::Announcement;
use crate::store::Observation;

/// Shown when no expiry is known.
pub const UNKNOWN_EXPIRY: &str = "unbekannt";

/// Combine the extracted fields with the ledger's prior values.
///
/// Expiry: extracted if present, else prior. VIP: extracted OR prior.
pub fn resolve(
    code: &str,
    extracted_expiry: Option<NaiveDate>,
    extracted_vip: bool,
    observation: &Observation,
) -> Announcement {
    Announcement {
        code: code.to_string(),
        expiry: extracted_expiry.or(observation.prior_expiry),
        is_vip: extracted_vip || observation.prior_vip,
        recurring: !observation.is_new,
    }
}

pub fn format_expiry(expiry: Option<NaiveDate>) -> String {
    match expiry {
        Some(date) => date.format("%Y/%m/%d").to_string(),
        None => UNKNOWN_EXPIRY.to_string(),
    }
}

/// Render the text payload for an announcement.
pub fn compose(announcement: &Announcement) -> String {
    let header = if announcement.recurring {
        "Recurring gift code!"
    } else {
        "New gift code!"
    };
    let mut lines = vec![format!(
        "{header} `{}` — redeem until {}",
        announcement.code,
        format_expiry(announcement.expiry)
    )];
    if announcement.is_vip {
        lines.push(format!("VIP12 gift code: `{}`", announcement.code));
    }
    lines.join("\n")
}

impl Announcement {
    /// The rendered text payload.
    pub fn payload(&self) -> String {
        compose(self)
    }
}
