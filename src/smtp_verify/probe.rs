use std::time::Instant;

use crate::address::Address;
use crate::smtp_verify::error::SmtpVerifyError;
use crate::smtp_verify::machine::{Event, Probe, Script, Step};
use crate::smtp_verify::options::ProbeOptions;
use crate::smtp_verify::session::SmtpSession;
use crate::smtp_verify::types::{Inconclusive, ProbeOutcome, ProbeReport};

/// Seam used by the verifier to run a probe; [`SmtpProber`] is the real one.
pub trait ProbeMailbox {
    fn probe(&self, address: &Address, exchanges: &[String], options: &ProbeOptions)
    -> ProbeReport;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SmtpProber;

impl ProbeMailbox for SmtpProber {
    fn probe(
        &self,
        address: &Address,
        exchanges: &[String],
        options: &ProbeOptions,
    ) -> ProbeReport {
        probe_mailbox(address, exchanges, options)
    }
}

/// Run the partial SMTP handshake for `address` against the first (highest
/// priority) exchange. Other exchanges are never tried.
///
/// The timeout bounds the whole dialogue, connection included. Whatever
/// happens, the connection is closed (`QUIT` + shutdown) before returning.
pub fn probe_mailbox(address: &Address, exchanges: &[String], options: &ProbeOptions) -> ProbeReport {
    let Some(host) = exchanges.first() else {
        return ProbeReport::without_connection(None, Inconclusive::NoMailServer);
    };
    if options.host_filter.should_skip(host) {
        log_debug!("{host} is excluded from probing ({:?})", options.host_filter);
        return ProbeReport::without_connection(Some(host.as_str()), Inconclusive::SkippedHost);
    }

    let deadline = Instant::now() + options.timeout();
    let recipient = address.to_string();
    let sender = options.sender(&recipient);
    let mut machine = Probe::new(Script::new(options.helo_domain(), &sender, &recipient));

    let mut session = match SmtpSession::connect(host, options.port, deadline) {
        Ok(session) => session,
        Err(err) => {
            log_debug!("probe of {host} could not connect: {err}");
            let reason = match err {
                SmtpVerifyError::DeadlineExceeded => Inconclusive::TimedOut,
                _ => Inconclusive::ConnectFailed,
            };
            return ProbeReport::new(
                Some(host.clone()),
                ProbeOutcome::Unknown(reason),
                vec![format!("[{host}] !: {err}")],
            );
        }
    };
    log_debug!("probing {recipient} via {host}:{}", options.port);

    let outcome = loop {
        let step = match session.read_reply() {
            Ok(Some(reply)) => machine.handle(Event::Data(reply)),
            Ok(None) => machine.handle(Event::Timeout),
            Err(SmtpVerifyError::ReplyTooLong) => {
                session.record("!", &SmtpVerifyError::ReplyTooLong.to_string());
                machine.expire(Inconclusive::UnexpectedReply)
            }
            Err(err) => connection_lost(&mut machine, &mut session, &err.to_string()),
        };
        match step {
            Step::Send(command) => {
                if let Err(err) = session.send_command(&command) {
                    if let Step::Resolved(outcome) =
                        connection_lost(&mut machine, &mut session, &err.to_string())
                    {
                        break outcome;
                    }
                }
            }
            Step::Resolved(outcome) => break outcome,
            Step::Ignored => {}
        }
    };

    let transcript = session.quit();
    ProbeReport::new(Some(host.clone()), outcome, transcript)
}

/// The socket is dead: no reply can arrive any more, so the deadline is the
/// only thing left to wait for. Expire now instead of idling until then.
fn connection_lost(machine: &mut Probe, session: &mut SmtpSession, message: &str) -> Step {
    session.record("!", message);
    machine.handle(Event::ConnectionError);
    machine.expire(Inconclusive::ConnectionLost)
}
