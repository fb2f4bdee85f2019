/// JSON body the chat service returns for a successful exchange.
pub fn chat_response_fixture(text: &str) -> String {
    return serde_json::json!({ "response": text }).to_string();
}

/// Drafts that trim down to nothing and must never be sent.
pub fn blank_input_fixtures() -> Vec<&'static str> {
    return vec!["", " ", "   ", "\t", "\n", "\r\n", " \t\n  "];
}

/// An address nothing listens on, for exercising transport failures.
pub fn unreachable_url() -> String {
    return "http://127.0.0.1:1".to_string();
}
