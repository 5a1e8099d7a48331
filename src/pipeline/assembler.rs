//! Flattens an inbound event into one plain-text blob.
//!
//! Order: body, then every embed (title, description, fields, footer,
//! author name), then every file (description, filename). Blank fragments
//! are skipped.

use crate::pipeline::types::{Attachment, InboundEvent, TextFragment};

/// Collect the text fragments of an event in assembly order.
pub fn fragments(event: &InboundEvent) -> Vec<TextFragment<'_>> {
    let mut out = vec![TextFragment::Body(&event.content)];

    for attachment in &event.attachments {
        if let Attachment::Embed {
            title,
            description,
            fields,
            footer,
            author_name,
        } = attachment
        {
            if let Some(title) = title {
                out.push(TextFragment::AttachmentTitle(title));
            }
            if let Some(description) = description {
                out.push(TextFragment::AttachmentDescription(description));
            }
            for field in fields {
                out.push(TextFragment::FieldPair {
                    name: &field.name,
                    value: &field.value,
                });
            }
            if let Some(footer) = footer {
                out.push(TextFragment::Footer(footer));
            }
            if let Some(author_name) = author_name {
                out.push(TextFragment::AuthorName(author_name));
            }
        }
    }

    for attachment in &event.attachments {
        if let Attachment::File {
            filename,
            description,
        } = attachment
        {
            if let Some(description) = description {
                out.push(TextFragment::AttachmentDescription(description));
            }
            if let Some(filename) = filename {
                out.push(TextFragment::Filename(filename));
            }
        }
    }

    out
}

/// Join all non-blank fragments of an event with newlines.
pub fn assemble(event: &InboundEvent) -> String {
    fragments(event)
        .iter()
        .flat_map(TextFragment::texts)
        .collect::<Vec<_>>()
        .join("\n")
}
