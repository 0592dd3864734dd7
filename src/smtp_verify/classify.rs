use phf::phf_set;

/// What a server reply means for the handshake script.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Signal {
    /// Positive reply, send the next command.
    Continue,
    /// Permanent mailbox error.
    Rejected,
    NotExists,
    Spf,
    Greylist,
    /// Nothing usable in the reply; abort.
    Inconclusive,
}

impl Signal {
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Continue)
    }
}

const UNKNOWN_RECIPIENT: &str =
    "Recipient address rejected: User unknown in virtual mailbox table";
const SPF_FAIL: &str = "Message rejected due to: SPF fail - not authorized";
const GREYLIST: &str = "Greylist";

const PERMANENT_MAILBOX_CODES: phf::Set<u16> = phf_set! {
    510u16, 511u16, 513u16, 550u16, 551u16, 553u16,
};

/// Classify one server reply. Pure; first matching rule wins:
/// known MTA phrases, then permanent mailbox codes (unless the text talks
/// about junk/spam), then absence of any `220`/`250` marker.
pub fn classify(reply: &str) -> Signal {
    if reply.contains(UNKNOWN_RECIPIENT) {
        return Signal::NotExists;
    }
    if reply.contains(SPF_FAIL) {
        return Signal::Spf;
    }
    if reply.contains(GREYLIST) {
        return Signal::Greylist;
    }
    if is_permanent_mailbox_error(reply) {
        return Signal::Rejected;
    }
    if !reply.contains("220") && !reply.contains("250") {
        return Signal::Inconclusive;
    }
    Signal::Continue
}

pub fn classify_bytes(reply: &[u8]) -> Signal {
    classify(&String::from_utf8_lossy(reply))
}

fn is_permanent_mailbox_error(reply: &str) -> bool {
    let Some(code) = leading_code(reply) else {
        return false;
    };
    if !PERMANENT_MAILBOX_CODES.contains(&code) {
        return false;
    }
    let lower = reply.to_ascii_lowercase();
    !(lower.contains("junk") || lower.contains("spam"))
}

fn leading_code(reply: &str) -> Option<u16> {
    let digits = reply.get(..3)?;
    if !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn greeting_and_ok_continue() {
        assert_eq!(classify("220 mx.example.com ESMTP Postfix"), Signal::Continue);
        assert_eq!(classify("250 2.1.0 Ok"), Signal::Continue);
        assert_eq!(
            classify("250-mx.example.com\n250-PIPELINING\n250 8BITMIME"),
            Signal::Continue
        );
    }

    #[test]
    fn mailbox_unavailable_is_rejected() {
        assert_eq!(
            classify("550 5.1.1 <bob@example.com>: mailbox unavailable"),
            Signal::Rejected
        );
        for code in ["510", "511", "513", "551", "553"] {
            assert_eq!(classify(&format!("{code} no such user")), Signal::Rejected);
        }
    }

    #[test]
    fn spam_mentions_downgrade_rejection() {
        assert_eq!(
            classify("550 5.7.1 mailbox unavailable, possible spam"),
            Signal::Inconclusive
        );
        assert_eq!(
            classify("553 Message flagged as JUNK"),
            Signal::Inconclusive
        );
    }

    #[test]
    fn spam_mention_with_ok_marker_continues() {
        // Not a hard error, and a 250 appears in the text.
        assert_eq!(
            classify("550 spam filter: retry via relay 250"),
            Signal::Continue
        );
    }

    #[test]
    fn other_permanent_codes_are_not_mailbox_errors() {
        assert_eq!(classify("554 5.7.1 Relay access denied"), Signal::Inconclusive);
        assert_eq!(classify("421 Service not available"), Signal::Inconclusive);
    }

    #[test]
    fn known_phrases_take_precedence() {
        assert_eq!(
            classify(
                "550 5.1.1 <x@example.com>: Recipient address rejected: User unknown in virtual mailbox table"
            ),
            Signal::NotExists
        );
        assert_eq!(
            classify("550 Message rejected due to: SPF fail - not authorized"),
            Signal::Spf
        );
        assert_eq!(
            classify("451 4.7.1 Greylisting in action, please come back later"),
            Signal::Greylist
        );
    }

    #[test]
    fn phrase_matching_is_case_sensitive() {
        assert_eq!(classify("451 greylisted"), Signal::Inconclusive);
    }

    #[test]
    fn code_must_lead_the_reply() {
        assert_eq!(classify(" 550 mailbox unavailable"), Signal::Inconclusive);
        assert_eq!(classify(""), Signal::Inconclusive);
        assert_eq!(classify("55"), Signal::Inconclusive);
    }

    #[test]
    fn bytes_are_decoded_lossily() {
        assert_eq!(classify_bytes(b"250 ok \xff"), Signal::Continue);
    }

    #[test]
    fn only_continue_is_non_terminal() {
        assert!(!Signal::Continue.is_terminal());
        assert!(Signal::Rejected.is_terminal());
        assert!(Signal::Inconclusive.is_terminal());
    }

    proptest! {
        #[test]
        fn classification_is_idempotent(reply in ".*") {
            prop_assert_eq!(classify(&reply), classify(&reply));
        }

        #[test]
        fn mailbox_codes_with_spam_are_never_rejected(
            code in prop::sample::select(vec!["510", "511", "513", "550", "551", "553"]),
            text in "[a-z ]{0,20}",
        ) {
            let reply = format!("{code} {text} possible spam");
            prop_assert_ne!(classify(&reply), Signal::Rejected);
        }
    }
}
