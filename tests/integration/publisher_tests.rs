//! Scheduler and direction task feeding the report queue, drained by the
//! publisher side into a QoS 1 broker.

use weatherstation::adapters::discovery::{WIND_DIRECTION, entity_for};
use weatherstation::adapters::report_queue::{Publisher, QueueSink, REPORT_DEPTH, ReportQueue};
use weatherstation::app::events::WindowId;
use weatherstation::app::ports::ReportSink;
use weatherstation::config::StationConfig;
use weatherstation::error::CommsError;
use weatherstation::scheduler::{FlushScheduler, ReportTopics};
use weatherstation::sensors::{EdgeDispatcher, SensorCounters, WindVane};
use weatherstation::tasks::sample_direction;

use crate::mock_hw::{ManualClock, MockBroker, ScriptedAdc};

fn same_period_config() -> StationConfig {
    StationConfig {
        wind_report_period_secs: 5,
        rain_report_period_secs: 5,
        ..StationConfig::default()
    }
}

#[test]
fn reports_flow_through_the_queue_to_the_broker() {
    let queue = ReportQueue::new();
    let cfg = same_period_config();
    let d = EdgeDispatcher::new(14, 15, SensorCounters::from_config(&cfg));
    let wind_topic = entity_for(WindowId::Wind).state_topic();
    let rain_topic = entity_for(WindowId::Rain).state_topic();
    let dir_topic = WIND_DIRECTION.state_topic();

    let mut s = FlushScheduler::new(
        0,
        &d,
        &cfg,
        ReportTopics {
            wind: &wind_topic,
            rain: &rain_topic,
        },
    );
    let mut clock = ManualClock::new(0);
    let mut producer = QueueSink::new(&queue);

    d.on_edge(14, 1_000_000);
    let reports = s.run_once(&mut clock, &mut producer);
    assert!(reports.iter().all(|r| r.published()));

    let mut vane = WindVane::new(ScriptedAdc::new([Ok(1616)]));
    sample_direction(&mut vane, &mut producer, &dir_topic).unwrap();

    let watched = [wind_topic.as_str(), rain_topic.as_str()];
    let mut broker = MockBroker::reachable();
    let delivered = Publisher::new(&queue, &watched).drain_pending(&mut broker);

    assert_eq!(delivered, 2);
    assert_eq!(
        broker.topics(),
        vec![wind_topic.as_str(), rain_topic.as_str(), dir_topic.as_str()]
    );
    assert_eq!(broker.payloads_for(&dir_topic), vec!["SE"]);
}

#[test]
fn unreachable_broker_never_confirms_delivery() {
    let queue = ReportQueue::new();
    let cfg = same_period_config();
    let d = EdgeDispatcher::new(14, 15, SensorCounters::from_config(&cfg));
    let topics = ReportTopics {
        wind: "w",
        rain: "r",
    };
    let mut s = FlushScheduler::new(0, &d, &cfg, topics);
    let mut clock = ManualClock::new(0);
    let mut producer = QueueSink::new(&queue);

    let watched = ["w", "r"];
    let mut publisher = Publisher::new(&queue, &watched);
    let mut broker = MockBroker::unreachable();
    let mut feeds = 0;

    for _ in 0..3 {
        s.run_once(&mut clock, &mut producer);
        // The client outbox takes every report; no PUBACK comes back.
        feeds += publisher.drain_pending(&mut broker);
    }
    assert_eq!(broker.outbox.len(), 6);
    assert_eq!(feeds, 0);

    broker.reachable = true;
    s.run_once(&mut clock, &mut producer);
    assert_eq!(publisher.drain_pending(&mut broker), 2);
}

#[test]
fn direction_reports_alone_do_not_confirm_liveness() {
    let queue = ReportQueue::new();
    let dir_topic = WIND_DIRECTION.state_topic();
    let mut producer = QueueSink::new(&queue);
    let mut vane = WindVane::new(ScriptedAdc::new([Ok(3716), Ok(936), Ok(2195)]));
    for _ in 0..3 {
        sample_direction(&mut vane, &mut producer, &dir_topic).unwrap();
    }

    let wind_topic = entity_for(WindowId::Wind).state_topic();
    let watched = [wind_topic.as_str()];
    let mut broker = MockBroker::reachable();
    assert_eq!(Publisher::new(&queue, &watched).drain_pending(&mut broker), 0);
    assert_eq!(broker.payloads_for(&dir_topic), vec!["N", "E", "S"]);
}

#[test]
fn full_queue_surfaces_as_a_failed_report() {
    let queue = ReportQueue::new();
    let mut producer = QueueSink::new(&queue);
    for _ in 0..REPORT_DEPTH {
        producer.publish("t", "0.000000").unwrap();
    }

    let cfg = StationConfig::default();
    let d = EdgeDispatcher::new(14, 15, SensorCounters::from_config(&cfg));
    let mut s = FlushScheduler::new(
        0,
        &d,
        &cfg,
        ReportTopics {
            wind: "w",
            rain: "r",
        },
    );
    let mut clock = ManualClock::new(0);

    let reports = s.run_once(&mut clock, &mut producer);
    assert_eq!(reports[0].result, Err(CommsError::QueueFull));
    assert_eq!(s.publish_failures(), 1);
    assert!(s.window(WindowId::Wind).next_deadline_us() > clock.now);
}

#[test]
fn rejected_send_is_dropped_and_the_queue_keeps_draining() {
    let queue = ReportQueue::new();
    let mut producer = QueueSink::new(&queue);
    producer.publish("w", "1.000000").unwrap();
    producer.publish("w", "2.000000").unwrap();

    let watched = ["w"];
    let mut publisher = Publisher::new(&queue, &watched);
    let mut broker = MockBroker::reachable();
    broker.rejecting = true;

    assert_eq!(publisher.step(&mut broker), 0);
    assert_eq!(publisher.outstanding(), 0);

    broker.rejecting = false;
    assert_eq!(publisher.step(&mut broker), 1);
    assert!(queue.is_empty());
    assert_eq!(broker.payloads_for("w"), vec!["2.000000"]);
}
