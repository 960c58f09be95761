/// Body Mailgun returns for an accepted message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendMessageResponse {
    /// Message id, e.g. `<20230315132348.b667e195e4fa57fc@mail.example.com>`.
    pub id: Option<String>,
    /// Human readable status, e.g. `Queued. Thank you.`.
    pub message: Option<String>,
}
