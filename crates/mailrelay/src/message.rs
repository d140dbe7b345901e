//! The message being delivered and its wire form.

use serde::{Deserialize, Serialize};

/// An email to deliver.
///
/// Built once and then only read: every layer of a pipeline sees the same
/// content. Recipients are kept in the order given and are not validated.
///
/// ```
/// use mailrelay::Message;
///
/// let message = Message::new("Welcome", "<p>Hello</p>", ["ada@example.com"], "noreply@example.com")
///     .with_cc(["ops@example.com"])
///     .html();
///
/// assert_eq!(message.to(), ["ada@example.com"]);
/// assert!(message.is_html());
/// assert!(message.bcc().is_empty());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    subject: String,
    body: String,
    to: Vec<String>,
    from: String,
    cc: Vec<String>,
    bcc: Vec<String>,
    attachments: Vec<String>,
    links: Vec<String>,
    is_html: bool,
}

impl Message {
    /// Creates a plain-text message with no cc, bcc, attachments or links.
    pub fn new<I, S>(
        subject: impl Into<String>,
        body: impl Into<String>,
        to: I,
        from: impl Into<String>,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            subject: subject.into(),
            body: body.into(),
            to: collect(to),
            from: from.into(),
            cc: Vec::new(),
            bcc: Vec::new(),
            attachments: Vec::new(),
            links: Vec::new(),
            is_html: false,
        }
    }

    /// Sets the cc list.
    pub fn with_cc<I, S>(mut self, cc: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.cc = collect(cc);
        self
    }

    /// Sets the bcc list.
    pub fn with_bcc<I, S>(mut self, bcc: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.bcc = collect(bcc);
        self
    }

    /// Sets the attachment references.
    pub fn with_attachments<I, S>(mut self, attachments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.attachments = collect(attachments);
        self
    }

    /// Sets the links.
    pub fn with_links<I, S>(mut self, links: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.links = collect(links);
        self
    }

    /// Marks the body as HTML.
    pub fn html(mut self) -> Self {
        self.is_html = true;
        self
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn to(&self) -> &[String] {
        &self.to
    }

    pub fn sender(&self) -> &str {
        &self.from
    }

    pub fn cc(&self) -> &[String] {
        &self.cc
    }

    pub fn bcc(&self) -> &[String] {
        &self.bcc
    }

    pub fn attachments(&self) -> &[String] {
        &self.attachments
    }

    pub fn links(&self) -> &[String] {
        &self.links
    }

    pub fn is_html(&self) -> bool {
        self.is_html
    }
}

fn collect<I, S>(items: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    items.into_iter().map(Into::into).collect()
}

/// The JSON shape of a message on the queue and at the HTTP boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageDto {
    pub subject: String,
    pub body: String,
    pub to: Vec<String>,
    pub from_email: String,
}

impl From<MessageDto> for Message {
    fn from(dto: MessageDto) -> Self {
        Message::new(dto.subject, dto.body, dto.to, dto.from_email)
    }
}

impl From<&Message> for MessageDto {
    fn from(message: &Message) -> Self {
        MessageDto {
            subject: message.subject.clone(),
            body: message.body.clone(),
            to: message.to.clone(),
            from_email: message.from.clone(),
        }
    }
}
