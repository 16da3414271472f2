//! Escalation flow vocabulary: consent parsing, CC parsing, and the email
//! the owner receives. The state machine itself lives in the router.

use doppel_core::relay::OutboundEmail;

pub(crate) const DECLINE_REPLY: &str = "Okay, I won't send an email.";

pub(crate) const CC_PROMPT: &str =
    "Optional: What's your email to CC on the message? Reply with your address or 'skip'.";

pub(crate) const NOT_CONFIGURED_REPLY: &str = "Email not configured on server.";

pub(crate) const EMAIL_SUBJECT: &str = "Question escalated by the agent";

/// Only an explicit yes counts as consent.
pub(crate) fn is_consent(reply: &str) -> bool {
    matches!(reply.trim().to_lowercase().as_str(), "yes" | "y")
}

/// "skip" or an empty reply means no CC.
pub(crate) fn parse_cc(reply: &str) -> Option<String> {
    let reply = reply.trim();
    if reply.is_empty() || reply.eq_ignore_ascii_case("skip") {
        None
    } else {
        Some(reply.to_string())
    }
}

pub(crate) fn compose_email(
    owner_name: &str,
    to: &str,
    question: &str,
    cc: Option<String>,
) -> OutboundEmail {
    OutboundEmail {
        to: to.to_string(),
        subject: EMAIL_SUBJECT.to_string(),
        body: format!(
            "Hi {owner_name},\n\n\
             The agent could not confidently answer this question:\n\n\
             {question}\n\n\
             Please reply to this thread. The user will be CC'd if they provided an address.\n\n\
             -- Your Agent"
        ),
        cc,
    }
}

pub(crate) fn sent_reply(owner_name: &str) -> String {
    format!("Email sent to {owner_name}. I'll keep an eye out for the reply.")
}

pub(crate) fn send_failed_reply(error: &impl std::fmt::Display) -> String {
    format!("Failed to send email: {error}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn consent_requires_explicit_yes() {
        assert!(is_consent("yes"));
        assert!(is_consent("  Y "));
        assert!(is_consent("YES"));
        assert!(!is_consent("sure"));
        assert!(!is_consent("no"));
        assert!(!is_consent(""));
        assert!(!is_consent("yes please"));
    }

    #[test]
    fn cc_skip_and_empty_mean_none() {
        assert_eq!(parse_cc("skip"), None);
        assert_eq!(parse_cc(" SKIP "), None);
        assert_eq!(parse_cc(""), None);
        assert_eq!(parse_cc("me@example.com"), Some("me@example.com".into()));
    }

    #[test]
    fn composed_email_carries_question_and_cc() {
        let email = compose_email(
            "Aayushmaan",
            "owner@example.com",
            "When were you born?",
            Some("asker@example.com".into()),
        );
        assert_eq!(email.to, "owner@example.com");
        assert_eq!(email.subject, EMAIL_SUBJECT);
        assert!(email.body.contains("When were you born?"));
        assert!(email.body.contains("Hi Aayushmaan"));
        assert_eq!(email.cc.as_deref(), Some("asker@example.com"));
    }
}
