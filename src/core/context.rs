use crate::core::message::Message;

/// Build the message sequence submitted for the next turn.
///
/// The whole prior history is replayed in order, followed by the new user
/// input. Nothing is truncated or summarized, so request size grows with
/// the conversation until the provider rejects it.
pub fn assemble(history: &[Message], new_user_text: &str) -> Vec<Message> {
    let mut context = Vec::with_capacity(history.len() + 1);
    context.extend_from_slice(history);
    context.push(Message::user(new_user_text));
    context
}
