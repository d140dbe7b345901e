use mailrelay_core::ManualClock;
use mailrelay_ratelimiter::RateLimiter;
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[test]
fn listeners_see_window_occupancy_and_wait_time() {
    let clock = ManualClock::new();
    let acquired = Arc::new(Mutex::new(Vec::new()));
    let rejected = Arc::new(Mutex::new(Vec::new()));
    let a = Arc::clone(&acquired);
    let r = Arc::clone(&rejected);

    let mut rl = RateLimiter::builder()
        .max_calls(2)
        .window(Duration::from_secs(10))
        .clock(clock.clone())
        .on_permit_acquired(move |in_window| a.lock().unwrap().push(in_window))
        .on_permit_rejected(move |retry_after| r.lock().unwrap().push(retry_after))
        .build();

    rl.execute(|| Ok(())).unwrap();
    clock.advance(Duration::from_secs(3));
    rl.execute(|| Ok(())).unwrap();
    let _ = rl.execute(|| Ok(()));

    assert_eq!(*acquired.lock().unwrap(), vec![1, 2]);
    assert_eq!(*rejected.lock().unwrap(), vec![Duration::from_secs(7)]);
}
