use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use crate::call::CallState;

use super::scenario::Scenario;

#[test]
fn clone_created() {
    let scenario = Scenario::builder()
        .post("https://q.test/items")
        .header("x-foo", "bar")
        .build();

    let call = scenario.call;
    let clone = call.clone();

    assert_eq!(clone.state(), CallState::Created);
    assert_eq!(clone.request().method(), call.request().method());
    assert_eq!(clone.request().uri(), call.request().uri());
    assert_eq!(clone.request().headers(), call.request().headers());
    // The request is shared, not copied.
    assert!(std::ptr::eq(clone.request(), call.request()));
}

#[test]
fn clone_after_execute() {
    let scenario = Scenario::builder()
        .get("https://q.test/poll")
        .respond(200, b"again")
        .build();

    let call = scenario.call;
    call.execute().unwrap();

    let clone = call.clone();
    assert!(!clone.is_executed());
    assert!(!clone.is_canceled());

    let res = clone.execute().unwrap();
    assert_eq!(res.body().map(String::as_str), Some("again"));

    assert_eq!(scenario.record.exchanges(), 2);
    assert_eq!(
        *scenario.record.uris.lock(),
        vec![
            "https://q.test/poll".to_string(),
            "https://q.test/poll".to_string()
        ]
    );
}

#[test]
fn clone_after_cancel() {
    let scenario = Scenario::builder().respond(200, b"retry").build();

    let call = scenario.call;
    call.cancel();
    assert!(call.execute().unwrap_err().is_canceled());

    let clone = call.clone();
    assert!(!clone.is_canceled());
    assert!(!clone.is_executed());

    let res = clone.execute().unwrap();
    assert_eq!(res.body().map(String::as_str), Some("retry"));

    // The original is untouched by the clone's execution.
    assert_eq!(call.state(), CallState::Failed);
    assert!(call.is_canceled());
}

#[test]
fn clone_while_executing() {
    let scenario = Scenario::builder()
        .delay(Duration::from_secs(10))
        .respect_abort()
        .build();

    let call = scenario.call;
    let (tx, rx) = mpsc::channel();

    call.enqueue(move |r| {
        tx.send(r).unwrap();
    })
    .unwrap();

    let clone = call.clone();
    assert_eq!(clone.state(), CallState::Created);

    // Canceling the original doesn't reach the clone.
    call.cancel();
    assert!(!clone.is_canceled());

    let outcome = rx.recv_timeout(Duration::from_secs(5)).unwrap();
    assert!(outcome.unwrap_err().is_canceled());
    assert_eq!(clone.state(), CallState::Created);
}

#[test]
fn clones_run_concurrently() {
    let scenario = Scenario::builder()
        .delay(Duration::from_millis(20))
        .respond(200, b"parallel")
        .build();

    let call = scenario.call;

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let clone = call.clone();
            thread::spawn(move || {
                let res = clone.execute();
                (res, clone.state())
            })
        })
        .collect();

    for h in handles {
        let (res, state) = h.join().unwrap();
        assert_eq!(res.unwrap().body().map(String::as_str), Some("parallel"));
        assert_eq!(state, CallState::Completed);
    }

    assert_eq!(call.state(), CallState::Created);
    assert_eq!(scenario.record.exchanges(), 4);
    assert_eq!(scenario.record.submissions(), 4);
}
