use serde::{ Serialize, Deserialize };

/// Author of a message. Serialized lowercase, matching the transcript
/// format the widget exchanges with its host page.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub role: Role,
    pub content: String,
    pub timestamp: i64,
}

/// One atomic observation of a session: the transcript so far plus the
/// in-flight flag. Rendering layers consume this and nothing else.
#[derive(Clone, Debug, Serialize)]
pub struct SessionView {
    pub messages: Vec<Message>,
    pub pending: bool,
}
