use std::time::Duration;

use tokio::time::Instant;

use gymtrack_backend::workout::rest_timer::{RestCountdown, RestEnd, RestTimer};

#[test]
fn countdown_expires_exactly_once() {
    let mut countdown = RestCountdown::new(10);

    let expirations = (0..10).filter_map(|_| countdown.tick()).collect::<Vec<_>>();

    assert_eq!(expirations, vec![RestEnd::Expired]);
    assert_eq!(countdown.remaining_secs, 0);
    assert_eq!(countdown.tick(), None);
    assert_eq!(countdown.skip(), None);
}

#[tokio::test(start_paused = true)]
async fn timer_reaches_zero_after_target_ticks() {
    let started = Instant::now();
    let timer = RestTimer::start(10, Duration::from_secs(1));
    let mut updates = timer.subscribe();

    let ended = updates
        .wait_for(RestCountdown::is_finished)
        .await
        .expect("Timer channel closed")
        .ended;

    assert_eq!(ended, Some(RestEnd::Expired));
    assert_eq!(started.elapsed(), Duration::from_secs(10));
    assert_eq!(timer.snapshot().remaining_secs, 0);
}

#[tokio::test(start_paused = true)]
async fn skip_freezes_the_countdown() {
    let timer = RestTimer::start(10, Duration::from_secs(1));

    tokio::time::sleep(Duration::from_millis(3_500)).await;
    assert_eq!(timer.snapshot().remaining_secs, 7);

    assert!(timer.skip());
    assert!(!timer.skip());

    tokio::time::sleep(Duration::from_secs(10)).await;
    let countdown = timer.snapshot();
    assert_eq!(countdown.remaining_secs, 7);
    assert_eq!(countdown.ended, Some(RestEnd::Skipped));
}

#[tokio::test(start_paused = true)]
async fn cancelled_timer_closes_the_channel_without_ending() {
    let timer = RestTimer::start(10, Duration::from_secs(1));
    let mut updates = timer.subscribe();

    timer.cancel();

    assert!(updates.wait_for(RestCountdown::is_finished).await.is_err());
}
