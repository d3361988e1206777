use serde::{Deserialize, Serialize};

use super::lead::LeadInfo;

/// One page of the Graph `me/messages` listing.
#[derive(Debug, Clone, Deserialize)]
pub struct MessagePage {
    #[serde(default)]
    pub value: Vec<Message>,
    #[serde(rename = "@odata.nextLink")]
    pub next_link: Option<String>,
}

/// Mailbox message snapshot, as selected from Graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub body_preview: String,
    #[serde(default)]
    pub received_date_time: Option<String>,
    #[serde(default)]
    pub is_read: bool,
    #[serde(default)]
    pub from: Option<Recipient>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recipient {
    pub email_address: EmailAddress,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmailAddress {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

impl Message {
    pub fn subject(&self) -> &str {
        self.subject.as_deref().unwrap_or_default()
    }

    pub fn sender_address(&self) -> Option<&str> {
        self.from
            .as_ref()
            .and_then(|r| r.email_address.address.as_deref())
    }
}

/// A fetched message with its classification attached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessedMessage {
    #[serde(flatten)]
    pub message: Message,
    pub lead_info: LeadInfo,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn page_deserializes_graph_shape() {
        let page: MessagePage = serde_json::from_value(json!({
            "@odata.context": "https://graph.microsoft.com/v1.0/$metadata#users('me')/messages",
            "value": [{
                "id": "AAMk1",
                "subject": "Wedding in June",
                "bodyPreview": "Hi there",
                "receivedDateTime": "2024-05-01T10:00:00Z",
                "isRead": false,
                "from": { "emailAddress": { "name": "Jane Doe", "address": "jane@x.com" } }
            }],
            "@odata.nextLink": "https://graph.microsoft.com/v1.0/me/messages?$skip=50"
        }))
        .unwrap();

        assert_eq!(page.value.len(), 1);
        assert_eq!(page.value[0].sender_address(), Some("jane@x.com"));
        assert_eq!(
            page.next_link.as_deref(),
            Some("https://graph.microsoft.com/v1.0/me/messages?$skip=50")
        );
    }

    #[test]
    fn processed_message_flattens_message_fields() {
        let processed = ProcessedMessage {
            message: Message {
                id: "m1".to_string(),
                subject: None,
                body_preview: "hello".to_string(),
                received_date_time: None,
                is_read: true,
                from: None,
            },
            lead_info: LeadInfo::not_a_lead(),
        };
        let v = serde_json::to_value(&processed).unwrap();
        assert_eq!(v["id"], "m1");
        assert_eq!(v["bodyPreview"], "hello");
        assert_eq!(v["leadInfo"]["isLead"], false);
    }
}
