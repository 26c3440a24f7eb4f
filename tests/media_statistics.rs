//! Integration tests for virtual media sessions and transfer statistics

mod common;

use std::path::PathBuf;
use std::sync::Arc;

use tokio::time::Instant;

use common::{at, timing, transport_config, Call, FakeProvider, NullTransportFactory, Recorder};
use redirect_console::config::RedirectionMode;
use redirect_console::engine::MediaSources;
use redirect_console::error::EngineError;
use redirect_console::session::{
    DeviceClass, Encoding, HostNotification, IoDirection, SessionController, SessionHandle,
    SessionState, StatisticsSnapshot,
};

const READ: u8 = 1;
const WRITE: u8 = 2;
const FLOPPY: u8 = 0;
const CDROM: u8 = 1;

fn media_session() -> (
    Arc<Recorder>,
    SessionHandle,
    tokio::sync::mpsc::UnboundedReceiver<HostNotification>,
) {
    let recorder = Arc::new(Recorder::default());
    let (controller, notifications) = SessionController::builder(
        transport_config(RedirectionMode::Media),
        Arc::new(FakeProvider(Arc::clone(&recorder))),
        Arc::new(NullTransportFactory),
    )
    .timing(timing())
    .media(MediaSources {
        optical: Some(PathBuf::from("/images/install.iso")),
        floppy: None,
    })
    .build();
    let (handle, _task) = SessionHandle::spawn(controller);
    (recorder, handle, notifications)
}

fn last_statistics(
    notifications: &mut tokio::sync::mpsc::UnboundedReceiver<HostNotification>,
) -> Option<StatisticsSnapshot> {
    let mut last = None;
    while let Ok(notification) = notifications.try_recv() {
        if let HostNotification::StatisticsUpdated(snapshot) = notification {
            last = Some(snapshot);
        }
    }
    last
}

#[tokio::test(start_paused = true)]
async fn test_media_session_uses_ider_relay() {
    let (recorder, handle, _notifications) = media_session();
    let t0 = Instant::now();

    handle.connection_trigger(true).await.unwrap();
    at(t0, 4001).await;
    assert_eq!(handle.snapshot().await.unwrap().state, SessionState::Active);

    match &recorder.calls()[1] {
        Call::Start { url, encoding, .. } => {
            assert!(url.ends_with("mode=ider"));
            assert_eq!(*encoding, None);
        }
        other => panic!("expected start, got {:?}", other),
    }
}

#[tokio::test(start_paused = true)]
async fn test_sector_counters_accumulate_by_device_and_direction() {
    let (recorder, handle, mut notifications) = media_session();
    let t0 = Instant::now();

    handle.connection_trigger(true).await.unwrap();
    at(t0, 4001).await;
    let sink = recorder.sink(0);

    sink.sector_operation(READ, FLOPPY, 2880, 0, 4);
    sink.sector_operation(READ, FLOPPY, 2880, 4, 6);
    sink.sector_operation(WRITE, FLOPPY, 2880, 10, 1);
    sink.sector_operation(READ, CDROM, 300_000, 16, 3);
    sink.sector_operation(WRITE, CDROM, 300_000, 0, 2);

    let snapshot = handle.snapshot().await.unwrap();
    let statistics = snapshot.statistics.unwrap();
    assert_eq!(statistics.floppy_read, 512 * 10);
    assert_eq!(statistics.floppy_write, 512);
    assert_eq!(statistics.cdrom_read, 2048 * 3);
    assert_eq!(statistics.cdrom_write, 2048 * 2);
    assert_eq!(
        statistics.bytes(DeviceClass::Optical, IoDirection::Read),
        6144
    );

    assert_eq!(last_statistics(&mut notifications), Some(statistics));
}

#[tokio::test(start_paused = true)]
async fn test_counters_reset_with_new_session() {
    let (recorder, handle, mut notifications) = media_session();
    let t0 = Instant::now();

    handle.connection_trigger(true).await.unwrap();
    at(t0, 4001).await;
    recorder.sink(0).sector_operation(READ, CDROM, 1000, 0, 8);
    handle.snapshot().await.unwrap();
    assert_eq!(last_statistics(&mut notifications).unwrap().cdrom_read, 2048 * 8);

    recorder
        .sink(0)
        .error(EngineError::TransportClosed("relay dropped".into()));
    let snapshot = handle.snapshot().await.unwrap();
    assert_eq!(snapshot.statistics, Some(StatisticsSnapshot::default()));

    // Operations reported by the old engine are not counted
    recorder.sink(0).sector_operation(READ, CDROM, 1000, 8, 8);
    at(t0, 8002).await;
    recorder.sink(1).sector_operation(WRITE, FLOPPY, 2880, 0, 2);

    let statistics = handle.snapshot().await.unwrap().statistics.unwrap();
    assert_eq!(statistics.cdrom_read, 0);
    assert_eq!(statistics.floppy_write, 1024);
}

#[tokio::test(start_paused = true)]
async fn test_encoding_trigger_ignored_for_media() {
    let (recorder, handle, _notifications) = media_session();
    let t0 = Instant::now();

    handle.connection_trigger(true).await.unwrap();
    at(t0, 4001).await;
    handle.encoding_trigger(2).await.unwrap();

    let snapshot = handle.snapshot().await.unwrap();
    assert_eq!(snapshot.state, SessionState::Active);
    assert_eq!(snapshot.encoding, Encoding::Rle8);
    assert!(recorder.stops().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_stop_discards_statistics() {
    let (recorder, handle, _notifications) = media_session();
    let t0 = Instant::now();

    handle.connection_trigger(true).await.unwrap();
    at(t0, 4001).await;
    recorder.sink(0).sector_operation(READ, FLOPPY, 2880, 0, 1);
    handle.connection_trigger(false).await.unwrap();

    let snapshot = handle.snapshot().await.unwrap();
    assert_eq!(snapshot.state, SessionState::Idle);
    assert_eq!(snapshot.statistics, None);
    assert_eq!(recorder.stops().len(), 1);
}
