use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::newsletter::{body::Body, title::Title, NewNewsletter, Newsletter};

#[derive(Deserialize)]
pub struct CreateNewsletterBody {
    pub title: String,
    pub body: String,
}

impl TryFrom<CreateNewsletterBody> for NewNewsletter {
    type Error = String;
    fn try_from(value: CreateNewsletterBody) -> Result<Self, Self::Error> {
        let title = Title::try_from(value.title)?;
        let body = Body::try_from(value.body)?;
        Ok(Self { title, body })
    }
}

/// The partial-update allow-list: only the fields named here can be
/// rewritten by clients. Unknown field names are rejected at
/// deserialization time, which keeps `id` and `published_at` out of reach.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateNewsletterBody {
    pub title: Option<String>,
    pub body: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct NewsletterResponseBody {
    pub title: String,
    pub published_at: DateTime<Utc>,
    pub url: ResourceLinks,
}

/// Hyperlinks to the record's own endpoint and to the collection it
/// belongs to.
#[derive(Debug, Serialize)]
pub struct ResourceLinks {
    #[serde(rename = "self")]
    pub this: String,
    pub collection: String,
}

impl NewsletterResponseBody {
    /// The public JSON projection of a stored newsletter.
    ///
    /// `id` and `body` are deliberately withheld; clients address the
    /// record through the `self` hyperlink instead.
    pub fn from_record(record: Newsletter, base_url: &str) -> Self {
        Self {
            title: record.title,
            published_at: record.published_at,
            url: ResourceLinks {
                this: format!("{}/newsletters/{}", base_url, record.id),
                collection: format!("{}/newsletters", base_url),
            },
        }
    }
}

#[derive(Serialize)]
pub struct DeleteNewsletterResponseBody {
    pub message: String,
}
