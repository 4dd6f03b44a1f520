//! Step-by-step protocol scenarios.
//!
//! Each test drives agents and the authority by hand, with scripted or
//! reliable channels, and checks every intermediate message and log.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;

use synclog::core::{CatchUpResponse, Message, ProtocolError, RecordGenerator};
use synclog::sync::round::sync_round_over;
use synclog::sync::{
    sync_round, verify_authorship, verify_convergence, ConvergenceResult, ReconcileOutcome,
    SyncError, Transport,
};
use synclog::{SimError, SyncAuthority};
use synclog_testkit::{
    reliable_agent, scripted_agent, FixedClock, ScriptedChannel, SequentialGenerator, TestNetwork,
};

fn sequential() -> Arc<SequentialGenerator> {
    Arc::new(SequentialGenerator::frozen())
}

#[test]
fn single_agent_lossless() {
    let authority = SyncAuthority::new();
    // Generates in round 1 only; probes and receives always.
    let mut a = scripted_agent(
        0,
        sequential(),
        ScriptedChannel::new([true, false], false),
        ScriptedChannel::always(true),
        ScriptedChannel::always(true),
    );

    // Round 1
    let r1 = a.generate_record().unwrap();
    for field in ["a", "b", "c"] {
        assert!(!r1.field(field).unwrap().is_empty());
    }
    let probe = a.emit_probe().unwrap();
    assert_eq!(probe.from, 0);

    assert_eq!(authority.handle(Some(Message::Record(r1.clone()))).unwrap(), None);
    assert_eq!(authority.snapshot(), vec![r1.clone()]);

    let response = authority.handle(Some(Message::Probe(probe))).unwrap().unwrap();
    assert_eq!(response, CatchUpResponse::new(0, vec![r1.clone()]));
    assert!(a.reconcile(Some(&response)).is_applied());
    assert_eq!(a.local_log(), &[r1.clone()]);

    // Round 2: no new record
    assert!(a.generate_record().is_none());
    let probe = a.emit_probe().unwrap();
    assert_eq!(probe.from, 1);

    let response = authority.handle(Some(Message::Probe(probe))).unwrap().unwrap();
    assert_eq!(response, CatchUpResponse::new(1, vec![]));
    a.reconcile(Some(&response));
    assert_eq!(a.local_log(), &[r1]);
}

#[test]
fn two_agents_follow_global_order() {
    let authority = SyncAuthority::new();
    let generator = sequential();
    let mut a = reliable_agent(0, generator.clone());
    let mut b = reliable_agent(1, generator);

    // A generates R1 and probes before B ever interacts.
    let r1 = a.generate_record().unwrap();
    authority.handle(Some(Message::Record(r1.clone()))).unwrap();
    let response = authority
        .handle(a.emit_probe().map(Message::Probe))
        .unwrap()
        .unwrap();
    assert_eq!(response.records, vec![r1.clone()]);
    a.reconcile(Some(&response));

    // B generates R2.
    let r2 = b.generate_record().unwrap();
    authority.handle(Some(Message::Record(r2.clone()))).unwrap();
    assert_eq!(authority.snapshot(), vec![r1.clone(), r2.clone()]);

    // A probes again at from=1.
    let probe = a.emit_probe().unwrap();
    assert_eq!(probe.from, 1);
    let response = authority.handle(Some(Message::Probe(probe))).unwrap().unwrap();
    assert_eq!(response, CatchUpResponse::new(1, vec![r2.clone()]));

    a.reconcile(Some(&response));
    assert_eq!(a.local_log(), &[r1, r2]);
}

#[test]
fn pending_record_is_reread_in_authority_order() {
    // B's record lands before A's, so A's own record moves to index 1.
    let authority = SyncAuthority::new();
    let generator = sequential();
    let mut a = reliable_agent(0, generator.clone());
    let mut b = reliable_agent(1, generator);

    let ra = a.generate_record().unwrap();
    let rb = b.generate_record().unwrap();
    authority.handle(Some(Message::Record(rb.clone()))).unwrap();
    authority.handle(Some(Message::Record(ra.clone()))).unwrap();

    assert_eq!(a.emit_probe().unwrap().from, 0);
    let response = authority.handle(a.emit_probe().map(Message::Probe)).unwrap();
    let outcome = a.reconcile(response.as_ref());

    assert_eq!(
        outcome,
        ReconcileOutcome::Applied {
            kept: 0,
            replaced: 1,
            appended: 2
        }
    );
    assert_eq!(a.local_log(), &[rb, ra]);
}

#[test]
fn unforwarded_record_is_truncated() {
    // The response was produced before A generated its record, and A
    // applies it before forwarding the record. Truncation drops it locally.
    let authority = SyncAuthority::new();
    let generator = sequential();
    let mut a = reliable_agent(0, generator.clone());
    let mut b = reliable_agent(1, generator);

    sync_round(&mut b, &authority).unwrap();
    let response = authority.handle(a.emit_probe().map(Message::Probe)).unwrap();

    let unforwarded = a.generate_record().unwrap();
    a.reconcile(response.as_ref());

    assert_eq!(a.local_log(), &authority.snapshot()[..]);
    assert!(!a.local_log().contains(&unforwarded));
    assert_eq!(a.sent_log(), &[unforwarded.clone()]);

    // Never forwarded: the authority cannot account for it.
    let agents = [a, b];
    let result = verify_authorship(&authority.snapshot(), &agents);
    assert!(matches!(result, ConvergenceResult::AuthorshipMismatch { .. }));

    // Forwarding it later restores it through the next update.
    let [mut a, b] = agents;
    authority.handle(Some(Message::Record(unforwarded.clone()))).unwrap();
    let response = authority.handle(a.emit_probe().map(Message::Probe)).unwrap();
    a.reconcile(response.as_ref());

    assert!(a.local_log().contains(&unforwarded));
    let agents = [a, b];
    assert!(verify_authorship(&authority.snapshot(), &agents).is_converged());
}

#[test]
fn stale_and_repeated_updates() {
    let mut network = TestNetwork::new(1);
    let authority = &network.authority;
    let agent = &mut network.agents[0];

    sync_round(agent, authority).unwrap();
    let before = agent.local_log().to_vec();

    // An update from beyond the local log is discarded.
    let stale = CatchUpResponse::new(5, authority.snapshot());
    assert!(agent.reconcile(Some(&stale)).is_stale());
    assert_eq!(agent.local_log(), &before[..]);

    // The same update twice is the same as once.
    let update = authority.catch_up(0);
    agent.reconcile(Some(&update));
    agent.reconcile(Some(&update));
    assert_eq!(agent.local_log(), &before[..]);
}

#[test]
fn constant_timestamps_keep_records_distinct() {
    let clock = Arc::new(FixedClock::new(1_700_000_000_000_000));
    let generator = Arc::new(SequentialGenerator::new(clock));
    let mut agents: Vec<_> = (0..4)
        .map(|n| reliable_agent(n, generator.clone()))
        .collect();
    let authority = SyncAuthority::new();

    for _ in 0..6 {
        for agent in &mut agents {
            sync_round(agent, &authority).unwrap();
        }
    }

    let log = authority.snapshot();
    assert_eq!(log.len(), 24);
    assert!(log.iter().all(|r| r.created_at() == 1_700_000_000_000_000));

    let digests: HashSet<_> = log.iter().map(|r| r.digest()).collect();
    assert_eq!(digests.len(), log.len());

    let last = &agents[3];
    assert_eq!(last.local_log(), &log[..]);
    assert!(verify_authorship(&log, &agents).is_converged());
}

#[test]
fn identical_author_and_timestamp_differ_by_payload() {
    let generator = SequentialGenerator::frozen();
    let author = synclog::AgentId::indexed(0);
    let r1 = generator.next(&author);
    let r2 = generator.next(&author);

    assert_eq!(r1.author_id(), r2.author_id());
    assert_eq!(r1.created_at(), r2.created_at());
    assert_ne!(r1, r2);
}

#[test]
fn convergence_checks_report_the_lagging_agent() {
    let mut network = TestNetwork::new(2);
    for agent in &mut network.agents {
        sync_round(agent, &network.authority).unwrap();
    }

    let log = network.authority.snapshot();
    let result = verify_convergence(&log, &network.agents);
    assert_eq!(
        result,
        ConvergenceResult::NotConverged {
            agent: synclog::AgentId::indexed(0),
            reason: "length mismatch: local=1, authority=2".into(),
        }
    );
}

/// Hands every message to the authority as if it were an update.
struct MisroutingTransport {
    authority: SyncAuthority,
}

#[async_trait]
impl Transport for MisroutingTransport {
    async fn send(&self, message: Message) -> synclog::sync::Result<Option<CatchUpResponse>> {
        let from = match &message {
            Message::Probe(probe) => probe.from,
            _ => 0,
        };
        let misrouted = Message::Update(CatchUpResponse::new(from, vec![]));
        Ok(self.authority.handle(Some(misrouted))?)
    }
}

#[tokio::test]
async fn protocol_error_aborts_round() {
    let transport = MisroutingTransport {
        authority: SyncAuthority::new(),
    };
    let mut agent = reliable_agent(0, sequential());

    let err = sync_round_over(&mut agent, &transport).await.unwrap_err();
    assert!(matches!(
        err,
        SyncError::Protocol(ProtocolError::UnexpectedKind { .. })
    ));

    let err: SimError = err.into();
    assert!(err.to_string().contains("protocol error"));
}
