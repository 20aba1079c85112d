/// One outbound completion message.
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub title: String,
    pub body: String,
    pub tags: &'static str,
    pub priority: u8,
}
