//! Connection lifecycle: open, retry scheduling, give-up, and close.

mod support;

use relink::{
    Link, LinkConfig, LinkError, LinkEvent, LinkState, MemoryTransport, TokioProviders,
};
use support::{ms, run_paused, settle, RecordingSink};
use tokio::time::Instant;

#[test]
fn auto_connect_opens_immediately() {
    run_paused(async {
        let (transport, mut acceptor) = MemoryTransport::new();
        let sink = RecordingSink::new();
        let link = Link::new(
            transport,
            LinkConfig::new("mem://server"),
            TokioProviders::new(),
            sink.clone(),
        );

        let attempt = acceptor.next_open().await.expect("open attempt");
        assert_eq!(attempt.url(), "mem://server");
        let _endpoint = attempt.accept();
        settle().await;

        assert!(link.is_open());
        assert_eq!(sink.events(), vec![LinkEvent::Open]);
        let metrics = link.metrics();
        assert_eq!(metrics.connection_attempts, 1);
        assert_eq!(metrics.connections_established, 1);
    });
}

#[test]
fn manual_connect_waits_for_the_call() {
    run_paused(async {
        let (transport, mut acceptor) = MemoryTransport::new();
        let sink = RecordingSink::new();
        let link = Link::new(
            transport,
            LinkConfig::new("mem://server").manual_connect(),
            TokioProviders::new(),
            sink.clone(),
        );

        settle().await;
        assert!(acceptor.try_next_open().is_none());
        assert_eq!(link.state(), LinkState::Closed);
        assert!(sink.events().is_empty());

        link.connect();
        let _endpoint = acceptor.next_open().await.expect("open attempt").accept();
        settle().await;
        assert!(link.is_open());
    });
}

#[test]
fn retry_delays_follow_exponential_backoff() {
    run_paused(async {
        let (transport, mut acceptor) = MemoryTransport::new();
        let sink = RecordingSink::new();
        let config = LinkConfig::new("mem://server").with_backoff(ms(10), ms(40));
        let _link = Link::new(transport, config, TokioProviders::new(), sink.clone());

        let mut stamps = Vec::new();
        for _ in 0..5 {
            let attempt = acceptor.next_open().await.expect("open attempt");
            stamps.push(Instant::now());
            attempt.refuse("connection refused");
        }

        let gaps: Vec<_> = stamps.windows(2).map(|pair| pair[1] - pair[0]).collect();
        assert_eq!(gaps, vec![ms(10), ms(20), ms(40), ms(40)]);

        let failures = sink
            .events()
            .iter()
            .filter(|event| matches!(event, LinkEvent::Error(LinkError::OpenFailed { .. })))
            .count();
        assert!(failures >= 4);
    });
}

#[test]
fn exhausted_retry_budget_parks_the_link() {
    run_paused(async {
        let (transport, mut acceptor) = MemoryTransport::new();
        let sink = RecordingSink::new();
        let config = LinkConfig::new("mem://server")
            .with_backoff(ms(10), ms(40))
            .with_max_attempts(2);
        let link = Link::new(transport, config, TokioProviders::new(), sink.clone());

        // Initial attempt plus the two budgeted retries.
        for _ in 0..3 {
            acceptor
                .next_open()
                .await
                .expect("open attempt")
                .refuse("connection refused");
        }
        settle().await;

        let exhausted: Vec<_> = sink
            .events()
            .into_iter()
            .filter(|event| matches!(event, LinkEvent::Error(LinkError::RetryExhausted { .. })))
            .collect();
        assert_eq!(
            exhausted,
            vec![LinkEvent::Error(LinkError::RetryExhausted { attempts: 2 })]
        );
        assert_eq!(link.state(), LinkState::Closed);

        // Parked: no further attempts no matter how long we wait.
        tokio::time::sleep(ms(500)).await;
        assert!(acceptor.try_next_open().is_none());

        // An explicit connect re-arms the loop with one immediate attempt;
        // the attempt count was not reset, so failure exhausts it again.
        sink.take();
        link.connect();
        acceptor
            .next_open()
            .await
            .expect("open attempt")
            .refuse("connection refused");
        settle().await;
        assert!(sink
            .events()
            .contains(&LinkEvent::Error(LinkError::RetryExhausted { attempts: 2 })));
    });
}

#[test]
fn close_cancels_a_scheduled_retry() {
    run_paused(async {
        let (transport, mut acceptor) = MemoryTransport::new();
        let sink = RecordingSink::new();
        let config = LinkConfig::new("mem://server").with_backoff(ms(10), ms(40));
        let link = Link::new(transport, config, TokioProviders::new(), sink.clone());

        acceptor
            .next_open()
            .await
            .expect("open attempt")
            .refuse("connection refused");
        settle().await;

        link.close();
        link.closed().await;

        tokio::time::sleep(ms(500)).await;
        assert!(acceptor.try_next_open().is_none());
        // Nothing was ever open, so no Close is emitted.
        assert_eq!(
            sink.events(),
            vec![LinkEvent::Error(LinkError::OpenFailed {
                reason: "connection refused".to_string()
            })]
        );
    });
}

#[test]
fn remote_close_reconnects_after_the_initial_delay() {
    run_paused(async {
        let (transport, mut acceptor) = MemoryTransport::new();
        let sink = RecordingSink::new();
        let config = LinkConfig::new("mem://server").with_backoff(ms(10), ms(40));
        let link = Link::new(transport, config, TokioProviders::new(), sink.clone());

        let endpoint = acceptor.next_open().await.expect("open attempt").accept();
        settle().await;
        assert!(link.is_open());

        endpoint.close();
        settle().await;
        let before = Instant::now();
        let attempt = acceptor.next_open().await.expect("reconnect attempt");
        assert_eq!(Instant::now() - before, ms(10));
        let _endpoint = attempt.accept();
        settle().await;

        assert_eq!(
            sink.events(),
            vec![LinkEvent::Open, LinkEvent::Close, LinkEvent::Open]
        );
        assert_eq!(link.metrics().connections_established, 2);
    });
}

#[test]
fn connection_error_surfaces_then_reconnects() {
    run_paused(async {
        let (transport, mut acceptor) = MemoryTransport::new();
        let sink = RecordingSink::new();
        let config = LinkConfig::new("mem://server").with_backoff(ms(10), ms(40));
        let _link = Link::new(transport, config, TokioProviders::new(), sink.clone());

        let endpoint = acceptor.next_open().await.expect("open attempt").accept();
        settle().await;
        endpoint.fail("wire torn");
        settle().await;

        let events = sink.events();
        assert_eq!(events[0], LinkEvent::Open);
        assert!(matches!(
            events[1],
            LinkEvent::Error(LinkError::ConnectionLost { .. })
        ));
        assert_eq!(events[2], LinkEvent::Close);

        let _attempt = acceptor.next_open().await.expect("reconnect attempt");
    });
}

#[test]
fn explicit_close_tears_down_an_open_session() {
    run_paused(async {
        let (transport, mut acceptor) = MemoryTransport::new();
        let sink = RecordingSink::new();
        let link = Link::new(
            transport,
            LinkConfig::new("mem://server"),
            TokioProviders::new(),
            sink.clone(),
        );

        let _endpoint = acceptor.next_open().await.expect("open attempt").accept();
        settle().await;
        assert!(link.is_open());

        link.close();
        link.closed().await;

        assert_eq!(link.state(), LinkState::Closed);
        assert_eq!(sink.events(), vec![LinkEvent::Open, LinkEvent::Close]);
        assert!(acceptor.try_next_open().is_none());
    });
}

#[test]
fn unanswered_open_attempt_times_out_and_retries() {
    run_paused(async {
        let (transport, mut acceptor) = MemoryTransport::new();
        let sink = RecordingSink::new();
        let config = LinkConfig::new("mem://server")
            .with_backoff(ms(10), ms(40))
            .with_connect_timeout(ms(50));
        let link = Link::new(transport, config, TokioProviders::new(), sink.clone());

        // Hold the attempt open without answering it.
        let pending = acceptor.next_open().await.expect("open attempt");
        let stamp = Instant::now();

        let retry = acceptor.next_open().await.expect("retry attempt");
        assert_eq!(Instant::now() - stamp, ms(60)); // 50ms timeout + 10ms delay
        drop(pending);

        let events = sink.events();
        assert!(matches!(
            &events[0],
            LinkEvent::Error(LinkError::OpenFailed { reason }) if reason.contains("50ms")
        ));

        let _endpoint = retry.accept();
        settle().await;
        assert!(link.is_open());
    });
}

#[test]
fn connect_during_teardown_is_latched() {
    run_paused(async {
        let (transport, mut acceptor) = MemoryTransport::new();
        let sink = RecordingSink::new();
        let link = Link::new(
            transport,
            LinkConfig::new("mem://server"),
            TokioProviders::new(),
            sink.clone(),
        );

        let _endpoint = acceptor.next_open().await.expect("open attempt").accept();
        settle().await;
        assert!(link.is_open());

        // The close has not been carried out yet, so this lands while
        // the state is still Closing; the worker must honor it once the
        // teardown completes.
        link.close();
        assert_eq!(link.state(), LinkState::Closing);
        link.connect();

        let _endpoint = acceptor.next_open().await.expect("reconnect attempt").accept();
        settle().await;

        assert!(link.is_open());
        assert_eq!(
            sink.events(),
            vec![LinkEvent::Open, LinkEvent::Close, LinkEvent::Open]
        );
    });
}

#[test]
fn open_racing_an_explicit_close_is_discarded() {
    run_paused(async {
        let (transport, mut acceptor) = MemoryTransport::new();
        let sink = RecordingSink::new();
        let link = Link::new(
            transport,
            LinkConfig::new("mem://server"),
            TokioProviders::new(),
            sink.clone(),
        );

        let attempt = acceptor.next_open().await.expect("open attempt");
        link.close();
        // Acceptance lands after the close was requested; the connection
        // never becomes the live session.
        let endpoint = attempt.accept();
        settle().await;
        endpoint.deliver(b"late".to_vec());
        link.closed().await;

        assert_eq!(link.state(), LinkState::Closed);
        assert!(sink.events().is_empty());
    });
}
