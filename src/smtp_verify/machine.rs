//! Sans-IO probe state machine.
//!
//! The machine only decides; [`probe_mailbox`](super::probe_mailbox) owns the
//! socket and the deadline and feeds events in. Whatever the interleaving of
//! data and timer events, exactly one [`Step::Resolved`] is ever returned.

use super::classify::classify;
use super::types::{Inconclusive, ProbeOutcome};

/// Commands of the partial handshake, in sending order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptStep {
    Helo,
    MailFrom,
    RcptTo,
}

impl ScriptStep {
    fn next(self) -> Option<Self> {
        match self {
            Self::Helo => Some(Self::MailFrom),
            Self::MailFrom => Some(Self::RcptTo),
            Self::RcptTo => None,
        }
    }
}

/// The three command lines sent to the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Script {
    pub helo: String,
    pub mail_from: String,
    pub rcpt_to: String,
}

impl Script {
    pub fn new(helo_domain: &str, sender: &str, recipient: &str) -> Self {
        Self {
            helo: format!("HELO {helo_domain}"),
            mail_from: format!("MAIL FROM: <{sender}>"),
            rcpt_to: format!("RCPT TO: <{recipient}>"),
        }
    }

    pub fn command(&self, step: ScriptStep) -> &str {
        match step {
            ScriptStep::Helo => &self.helo,
            ScriptStep::MailFrom => &self.mail_from,
            ScriptStep::RcptTo => &self.rcpt_to,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeState {
    /// Waiting for the server greeting.
    Connecting,
    /// `step` was sent, waiting for its reply.
    Scripted(ScriptStep),
    Resolved(ProbeOutcome),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// One complete server reply.
    Data(String),
    /// The handshake deadline fired.
    Timeout,
    /// Socket-level failure. Does not resolve the probe by itself.
    ConnectionError,
}

/// What the driver must do after an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Write this command line and keep reading.
    Send(String),
    /// First resolution: send `QUIT`, close, report the outcome.
    Resolved(ProbeOutcome),
    /// Nothing to do (already resolved, or a swallowed connection error).
    Ignored,
}

#[derive(Debug, Clone)]
pub struct Probe {
    script: Script,
    state: ProbeState,
    sent: usize,
}

impl Probe {
    pub fn new(script: Script) -> Self {
        Self {
            script,
            state: ProbeState::Connecting,
            sent: 0,
        }
    }

    pub fn state(&self) -> &ProbeState {
        &self.state
    }

    pub fn outcome(&self) -> Option<ProbeOutcome> {
        match self.state {
            ProbeState::Resolved(outcome) => Some(outcome),
            _ => None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self.state, ProbeState::Resolved(_))
    }

    /// Script commands handed out so far (never more than three).
    pub fn commands_sent(&self) -> usize {
        self.sent
    }

    pub fn handle(&mut self, event: Event) -> Step {
        match event {
            Event::Data(reply) => self.on_data(&reply),
            Event::Timeout => self.expire(Inconclusive::TimedOut),
            Event::ConnectionError => {
                log_trace!("connection error swallowed (resolved: {})", self.is_resolved());
                Step::Ignored
            }
        }
    }

    pub fn on_data(&mut self, reply: &str) -> Step {
        let awaiting = match self.state {
            ProbeState::Resolved(_) => {
                log_trace!("reply after resolution ignored");
                return Step::Ignored;
            }
            ProbeState::Connecting => None,
            ProbeState::Scripted(step) => Some(step),
        };

        let signal = classify(reply);
        if let Some(outcome) = ProbeOutcome::from_signal(signal) {
            return self.resolve(outcome);
        }

        let next = match awaiting {
            None => Some(ScriptStep::Helo),
            Some(step) => step.next(),
        };
        match next {
            Some(step) => {
                self.state = ProbeState::Scripted(step);
                self.sent += 1;
                Step::Send(self.script.command(step).to_string())
            }
            None => self.resolve(ProbeOutcome::Accepted),
        }
    }

    /// Resolve as inconclusive unless already resolved. Used by the timer and
    /// by a driver whose socket can no longer deliver events.
    pub fn expire(&mut self, reason: Inconclusive) -> Step {
        self.resolve(ProbeOutcome::Unknown(reason))
    }

    fn resolve(&mut self, outcome: ProbeOutcome) -> Step {
        if self.is_resolved() {
            return Step::Ignored;
        }
        log_debug!("probe resolved: {outcome}");
        self.state = ProbeState::Resolved(outcome);
        Step::Resolved(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn probe() -> Probe {
        Probe::new(Script::new(
            "verify-email.org",
            "bob@example.com",
            "bob@example.com",
        ))
    }

    fn data(reply: &str) -> Event {
        Event::Data(reply.to_string())
    }

    #[test]
    fn full_script_is_accepted() {
        let mut p = probe();
        assert_eq!(
            p.handle(data("220 mx.example.com ESMTP")),
            Step::Send("HELO verify-email.org".into())
        );
        assert_eq!(p.state(), &ProbeState::Scripted(ScriptStep::Helo));
        assert_eq!(
            p.handle(data("250 mx.example.com")),
            Step::Send("MAIL FROM: <bob@example.com>".into())
        );
        assert_eq!(
            p.handle(data("250 2.1.0 Ok")),
            Step::Send("RCPT TO: <bob@example.com>".into())
        );
        assert_eq!(
            p.handle(data("250 2.1.5 Ok")),
            Step::Resolved(ProbeOutcome::Accepted)
        );
        assert_eq!(p.commands_sent(), 3);
        assert_eq!(p.outcome(), Some(ProbeOutcome::Accepted));
    }

    #[test]
    fn rejection_on_rcpt_resolves_false() {
        let mut p = probe();
        p.handle(data("220 ready"));
        p.handle(data("250 hello"));
        p.handle(data("250 sender ok"));
        assert_eq!(
            p.handle(data("550 5.1.1 mailbox unavailable")),
            Step::Resolved(ProbeOutcome::Rejected)
        );
    }

    #[test]
    fn bad_greeting_aborts_before_helo() {
        let mut p = probe();
        assert_eq!(
            p.handle(data("554 no SMTP service here")),
            Step::Resolved(ProbeOutcome::Unknown(Inconclusive::UnexpectedReply))
        );
        assert_eq!(p.commands_sent(), 0);
    }

    #[test]
    fn greylist_on_mail_from() {
        let mut p = probe();
        p.handle(data("220 ready"));
        p.handle(data("250 hello"));
        assert_eq!(
            p.handle(data("451 Greylisted, try again")),
            Step::Resolved(ProbeOutcome::Greylist)
        );
        assert_eq!(p.commands_sent(), 2);
    }

    #[test]
    fn timeout_resolves_unknown() {
        let mut p = probe();
        assert_eq!(
            p.handle(Event::Timeout),
            Step::Resolved(ProbeOutcome::Unknown(Inconclusive::TimedOut))
        );
    }

    #[test]
    fn late_events_are_ignored() {
        let mut p = probe();
        p.handle(data("220 ready"));
        p.handle(data("250 hello"));
        p.handle(data("250 ok"));
        p.handle(data("250 ok"));
        assert_eq!(p.handle(Event::Timeout), Step::Ignored);
        assert_eq!(p.handle(data("550 too late")), Step::Ignored);
        assert_eq!(p.outcome(), Some(ProbeOutcome::Accepted));
    }

    #[test]
    fn connection_errors_do_not_resolve() {
        let mut p = probe();
        p.handle(data("220 ready"));
        assert_eq!(p.handle(Event::ConnectionError), Step::Ignored);
        assert!(!p.is_resolved());
        assert_eq!(
            p.expire(Inconclusive::ConnectionLost),
            Step::Resolved(ProbeOutcome::Unknown(Inconclusive::ConnectionLost))
        );
    }

    fn event_strategy() -> impl Strategy<Value = Event> {
        prop_oneof![
            4 => prop::sample::select(vec![
                "220 ready",
                "250 ok",
                "550 mailbox unavailable",
                "550 possible spam",
                "451 Greylisted",
                "421 closing",
            ])
            .prop_map(|reply| Event::Data(reply.to_string())),
            1 => Just(Event::Timeout),
            1 => Just(Event::ConnectionError),
        ]
    }

    proptest! {
        #[test]
        fn resolves_exactly_once(events in prop::collection::vec(event_strategy(), 0..16)) {
            let mut p = probe();
            let mut resolutions = 0;
            for event in events.into_iter().chain(std::iter::once(Event::Timeout)) {
                if let Step::Resolved(_) = p.handle(event) {
                    resolutions += 1;
                }
                prop_assert!(p.commands_sent() <= 3);
            }
            prop_assert_eq!(resolutions, 1);
            prop_assert!(p.outcome().is_some());
        }
    }
}
