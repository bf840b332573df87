//! Read-time correction of stale image flags.
//!
//! Records stored before image detection existed may carry `is_image ==
//! false` for content that is plainly an image. Reads correct the returned
//! copies; stored records are never touched.

use crate::domain::ClipboardRecord;

use super::preview::detect_image;

/// Correct the image flag on one fetched record. Returns true if it flipped.
pub fn reconcile_record(record: &mut ClipboardRecord) -> bool {
    if record.is_image {
        return false;
    }

    let flagged = record.value.as_text().and_then(detect_image).is_some();
    if flagged {
        record.is_image = true;
    }
    flagged
}

/// Correct a page of fetched records
pub fn reconcile(mut records: Vec<ClipboardRecord>) -> Vec<ClipboardRecord> {
    for record in &mut records {
        reconcile_record(record);
    }
    records
}
